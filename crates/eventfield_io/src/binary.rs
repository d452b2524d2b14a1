//! # Binary Event Files
//!
//! ## Format
//!
//! ```text
//! [4 bytes: magic 0xfebf]
//! [4 bytes: version]
//!
//! Record format, repeated until end of file:
//! [4 bytes: x] [4 bytes: y] [4 bytes: z] [4 bytes: radius] [4 bytes: value]
//! ```
//!
//! All fields are little-endian; floats are IEEE-754 single precision.
//! The radius is the physical radius, not the in-memory inverse.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use eventfield_core::{EventStore, Vec3};

use crate::error::{CodecError, CodecResult};

/// Magic number identifying a binary event file.
pub const MAGIC: u32 = 0xfebf;

/// Current binary format version.
pub const VERSION: u32 = 1;

/// Header size in bytes (magic + version).
pub const HEADER_SIZE: usize = 2 * std::mem::size_of::<u32>();

/// Size of one record in bytes.
pub const RECORD_SIZE: usize = 5 * std::mem::size_of::<f32>();

/// Exact size of a binary file holding `num_events` events.
#[must_use]
pub const fn binary_size(num_events: usize) -> usize {
    num_events * RECORD_SIZE + HEADER_SIZE
}

/// Returns true if `bytes` starts with the binary magic number.
#[must_use]
pub fn has_magic(bytes: &[u8]) -> bool {
    bytes.get(..4) == Some(MAGIC.to_le_bytes().as_slice())
}

/// Decodes a complete binary file into `store`, replacing its events.
///
/// Returns the number of events read.
///
/// # Errors
///
/// - [`CodecError::Empty`] for an empty buffer
/// - [`CodecError::Truncated`] if the header is incomplete or the body is
///   not a whole number of records
/// - [`CodecError::UnsupportedVersion`] for any version but [`VERSION`]
/// - [`CodecError::Store`] if the store cannot grow
pub fn decode(store: &mut EventStore, bytes: &[u8]) -> CodecResult<usize> {
    if bytes.is_empty() {
        return Err(CodecError::Empty);
    }
    if bytes.len() < HEADER_SIZE {
        return Err(CodecError::Truncated { len: bytes.len() });
    }

    let header: [[u8; 4]; 2] = bytemuck::pod_read_unaligned(&bytes[..HEADER_SIZE]);
    let version = u32::from_le_bytes(header[1]);
    if version != VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let body = &bytes[HEADER_SIZE..];
    if body.len() % RECORD_SIZE != 0 {
        return Err(CodecError::Truncated { len: bytes.len() });
    }

    let num_events = body.len() / RECORD_SIZE;
    store.resize(num_events)?;
    for (i, record) in body.chunks_exact(RECORD_SIZE).enumerate() {
        let fields: [[u8; 4]; 5] = bytemuck::pod_read_unaligned(record);
        let [x, y, z, radius, value] = fields.map(f32::from_le_bytes);
        store.update(i, Vec3::new(x, y, z), radius, value);
    }
    Ok(num_events)
}

/// Encodes `store` into `writer`.
///
/// # Errors
///
/// Returns [`CodecError::Io`] if writing or flushing fails.
pub fn encode(store: &EventStore, mut writer: impl Write) -> CodecResult<()> {
    let header: [[u8; 4]; 2] = [MAGIC.to_le_bytes(), VERSION.to_le_bytes()];
    writer.write_all(bytemuck::bytes_of(&header))?;

    for i in 0..store.len() {
        let record: [[u8; 4]; 5] = [
            store.positions_x()[i].to_le_bytes(),
            store.positions_y()[i].to_le_bytes(),
            store.positions_z()[i].to_le_bytes(),
            store.radius(i).unwrap_or(0.0).to_le_bytes(),
            store.values()[i].to_le_bytes(),
        ];
        writer.write_all(bytemuck::bytes_of(&record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `store` to `path`, sizing the file up front.
///
/// # Errors
///
/// Returns [`CodecError::Io`] if the file cannot be created, sized or
/// written.
pub fn write_file(store: &EventStore, path: &Path) -> CodecResult<()> {
    let file = File::create(path)?;
    file.set_len(binary_size(store.len()) as u64)?;
    encode(store, BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> EventStore {
        let mut store = EventStore::with_len(2).unwrap();
        store.update(0, Vec3::new(1.0, 2.0, 3.0), 4.0, 5.0);
        store.update(1, Vec3::new(-1.0, 0.5, 0.25), 0.0, -2.0);
        store
    }

    #[test]
    fn test_encoded_layout() {
        let mut bytes = Vec::new();
        encode(&sample_store(), &mut bytes).unwrap();

        assert_eq!(bytes.len(), binary_size(2));
        assert_eq!(&bytes[..4], &[0xbf, 0xfe, 0, 0]);
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
        // physical radius on disk
        assert_eq!(&bytes[20..24], &4.0f32.to_le_bytes());
        assert!(has_magic(&bytes));
    }

    #[test]
    fn test_decode_roundtrip() {
        let mut bytes = Vec::new();
        encode(&sample_store(), &mut bytes).unwrap();

        let mut store = EventStore::new();
        assert_eq!(decode(&mut store, &bytes).unwrap(), 2);
        assert_eq!(store.position(0), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(store.radii(), &[0.25, 0.0]);
        assert_eq!(store.radius(1), Some(0.0));
        assert_eq!(store.values(), &[5.0, -2.0]);
    }

    #[test]
    fn test_header_only_is_empty_store() {
        let mut bytes = Vec::new();
        encode(&EventStore::new(), &mut bytes).unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE);

        let mut store = EventStore::new();
        assert_eq!(decode(&mut store, &bytes).unwrap(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_header_only_into_indexed_store() {
        let mut bytes = Vec::new();
        encode(&EventStore::new(), &mut bytes).unwrap();

        let mut store = sample_store();
        store.build_index();
        assert_eq!(decode(&mut store, &bytes).unwrap(), 0);
        assert!(!store.is_indexed());
        assert!(store
            .find_events(&eventfield_core::Aabb::around(Vec3::ZERO, 10.0))
            .is_empty());
    }

    #[test]
    fn test_bad_version() {
        let mut bytes = Vec::new();
        encode(&sample_store(), &mut bytes).unwrap();
        bytes[4..8].copy_from_slice(&2u32.to_le_bytes());

        let err = decode(&mut EventStore::new(), &bytes).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedVersion(2)));
    }

    #[test]
    fn test_truncated() {
        let mut bytes = Vec::new();
        encode(&sample_store(), &mut bytes).unwrap();
        bytes.pop();

        let err = decode(&mut EventStore::new(), &bytes).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { len } if len == binary_size(2) - 1));

        let err = decode(&mut EventStore::new(), &bytes[..6]).unwrap_err();
        assert!(matches!(err, CodecError::Truncated { len: 6 }));
    }

    #[test]
    fn test_magic_check() {
        assert!(!has_magic(b""));
        assert!(!has_magic(b"\xbf\xfe"));
        assert!(!has_magic(b"# Events"));
        assert!(has_magic(&[0xbf, 0xfe, 0, 0, 9]));
    }
}
