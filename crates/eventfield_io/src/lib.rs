//! # EVENTFIELD IO
//!
//! Reading and writing event stores.
//!
//! ## Formats
//!
//! - **Binary** ([`binary`]): magic, version, packed little-endian records.
//! - **Text** ([`text`]): commented header, count line, one record per line.
//!
//! ## Detection
//!
//! [`read_events`] sniffs the first four bytes. A file starting with the
//! binary magic is decoded as binary and only as binary; everything else
//! goes to the text decoder. A binary file is never misparsed as text.
//!
//! ## Example
//!
//! ```rust,ignore
//! use eventfield_io::{read_events, write_events, EventFileFormat};
//!
//! write_events(source.store(), "spikes.events", EventFileFormat::Binary)?;
//! let summary = read_events(other.store_mut(), "spikes.events")?;
//! assert_eq!(summary.format, EventFileFormat::Binary);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::perf)]

pub mod binary;
pub mod error;
pub mod text;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use eventfield_core::EventStore;
use tracing::info;

pub use error::{CodecError, CodecResult};

/// On-disk representation of an event file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventFileFormat {
    /// Packed little-endian records behind a magic number.
    Binary,
    /// Human-readable records.
    Text,
}

impl EventFileFormat {
    /// Picks the decoder for `bytes` from its leading magic number.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Self {
        if binary::has_magic(bytes) {
            Self::Binary
        } else {
            Self::Text
        }
    }
}

/// Outcome of a successful read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadSummary {
    /// Format the file was decoded as.
    pub format: EventFileFormat,
    /// Number of events in the store afterwards.
    pub events: usize,
}

/// Decodes an in-memory event file into `store`.
///
/// On error the store contents are unspecified and should be discarded.
///
/// # Errors
///
/// - [`CodecError::Empty`] for an empty buffer
/// - any error of [`binary::decode`] or [`text::decode`], depending on the
///   detected format
pub fn decode_events(store: &mut EventStore, bytes: &[u8]) -> CodecResult<ReadSummary> {
    if bytes.is_empty() {
        return Err(CodecError::Empty);
    }

    let format = EventFileFormat::detect(bytes);
    let events = match format {
        EventFileFormat::Binary => binary::decode(store, bytes)?,
        EventFileFormat::Text => text::decode(store, bytes)?,
    };
    Ok(ReadSummary { format, events })
}

/// Reads the event file at `path` into `store`.
///
/// On error the store contents are unspecified and should be discarded.
///
/// # Errors
///
/// [`CodecError::Io`] if the file cannot be read, otherwise as
/// [`decode_events`].
pub fn read_events(store: &mut EventStore, path: impl AsRef<Path>) -> CodecResult<ReadSummary> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let summary = decode_events(store, &bytes)?;
    info!(
        events = summary.events,
        format = ?summary.format,
        path = %path.display(),
        "loaded events"
    );
    Ok(summary)
}

/// Writes `store` to `path` in `format`.
///
/// # Errors
///
/// Returns [`CodecError::Io`] if the file cannot be created or written.
pub fn write_events(
    store: &EventStore,
    path: impl AsRef<Path>,
    format: EventFileFormat,
) -> CodecResult<()> {
    let path = path.as_ref();
    match format {
        EventFileFormat::Binary => binary::write_file(store, path)?,
        EventFileFormat::Text => text::encode(store, BufWriter::new(File::create(path)?))?,
    }
    info!(events = store.len(), ?format, path = %path.display(), "events file written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(EventFileFormat::detect(&binary::MAGIC.to_le_bytes()), EventFileFormat::Binary);
        assert_eq!(EventFileFormat::detect(b"Number of events: 1"), EventFileFormat::Text);
        assert_eq!(EventFileFormat::detect(&[0xbf]), EventFileFormat::Text);
    }

    #[test]
    fn test_empty_input() {
        let err = decode_events(&mut EventStore::new(), &[]).unwrap_err();
        assert!(matches!(err, CodecError::Empty));
    }

    #[test]
    fn test_wrong_magic_goes_to_text() {
        let mut store = EventStore::new();
        let summary = decode_events(&mut store, b"Number of events: 1\n0 0 0 1 3\n").unwrap();
        assert_eq!(summary, ReadSummary { format: EventFileFormat::Text, events: 1 });
        assert_eq!(store.values(), &[3.0]);
    }

    #[test]
    fn test_binary_error_not_retried_as_text() {
        let mut bytes = binary::MAGIC.to_le_bytes().to_vec();
        bytes.extend_from_slice(&7u32.to_le_bytes());
        let err = decode_events(&mut EventStore::new(), &bytes).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedVersion(7)));
    }
}
