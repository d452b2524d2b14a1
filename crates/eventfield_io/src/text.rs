//! # Text Event Files
//!
//! ## Format
//!
//! ```text
//! # free-form comment lines
//! Number of events: 2
//! x y z radius value
//! x y z radius value
//! ```
//!
//! Blank lines and `#` lines are skipped. The count line is recognized by
//! its marker and its last whitespace-separated token is the count. Every
//! other line must hold exactly five numbers; anything else aborts the read.

use std::io::{BufRead, Write};

use eventfield_core::{EventStore, Vec3};
use tracing::warn;

use crate::error::{CodecError, CodecResult};

/// Marker of the line declaring the number of events.
pub const COUNT_MARKER: &str = "Number of events";

/// Version written into the text header.
pub const TEXT_VERSION: u32 = 1;

fn parse_number<T: std::str::FromStr>(token: &str, line: usize) -> CodecResult<T> {
    token
        .parse()
        .map_err(|_| CodecError::InvalidNumber { line, token: token.to_string() })
}

/// Decodes a text event stream into `store`.
///
/// Returns the declared number of events.
///
/// # Errors
///
/// - [`CodecError::Io`] if reading fails or the stream is not UTF-8
/// - [`CodecError::InvalidNumber`] for an unparseable count or field
/// - [`CodecError::NoEvents`] for a record before a non-zero count
/// - [`CodecError::MalformedRecord`] for a record without exactly five fields
/// - [`CodecError::Store`] if the declared count cannot be allocated
pub fn decode(store: &mut EventStore, reader: impl BufRead) -> CodecResult<usize> {
    let mut index = 0;

    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = n + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if trimmed.contains(COUNT_MARKER) {
            let token = trimmed.split_whitespace().last().unwrap_or_default();
            store.resize(parse_number(token, line_no)?)?;
            continue;
        }

        if store.is_empty() {
            warn!(
                line = line_no,
                "no events to load, check that the number of events in the file is > 0"
            );
            return Err(CodecError::NoEvents);
        }

        let mut fields = [0.0_f32; 5];
        let mut tokens = 0;
        for token in trimmed.split_whitespace() {
            if let Some(field) = fields.get_mut(tokens) {
                *field = parse_number(token, line_no)?;
            }
            tokens += 1;
        }
        if tokens != fields.len() {
            warn!(
                line = line_no,
                event = index,
                events = store.len(),
                "ill-formed event record"
            );
            return Err(CodecError::MalformedRecord { line: line_no, tokens });
        }

        let [x, y, z, radius, value] = fields;
        store.update(index, Vec3::new(x, y, z), radius, value);
        index += 1;
    }

    Ok(store.len())
}

/// Encodes `store` as text into `writer`.
///
/// # Errors
///
/// Returns [`CodecError::Io`] if writing or flushing fails.
pub fn encode(store: &EventStore, mut writer: impl Write) -> CodecResult<()> {
    writeln!(
        writer,
        "# EVENTFIELD events (3D position, radius and value), in the following format:"
    )?;
    writeln!(writer, "#     posX posY posZ radius value")?;
    writeln!(writer, "# File version: {TEXT_VERSION}")?;
    writeln!(writer, "# Library version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(writer, "{COUNT_MARKER}: {}", store.len())?;

    for i in 0..store.len() {
        writeln!(
            writer,
            "{} {} {} {} {}",
            store.positions_x()[i],
            store.positions_y()[i],
            store.positions_z()[i],
            store.radius(i).unwrap_or(0.0),
            store.values()[i],
        )?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_with_comments() {
        let input = "# some comment\n\
                     # another\n\
                     \n\
                     Number of events: 2\n\
                     1 2 3 4 5\n\
                     -1.5 0 0.25 0 7\n";
        let mut store = EventStore::new();
        assert_eq!(decode(&mut store, input.as_bytes()).unwrap(), 2);
        assert_eq!(store.position(1), Some(Vec3::new(-1.5, 0.0, 0.25)));
        assert_eq!(store.radii(), &[0.25, 0.0]);
        assert_eq!(store.values(), &[5.0, 7.0]);
    }

    #[test]
    fn test_short_record_is_fatal() {
        let input = "Number of events: 2\n1 2 3 4 5\n1 2 3 4\n";
        let err = decode(&mut EventStore::new(), input.as_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::MalformedRecord { line: 3, tokens: 4 }));
    }

    #[test]
    fn test_long_record_is_fatal() {
        let input = "Number of events: 1\n1 2 3 4 5 6\n";
        let err = decode(&mut EventStore::new(), input.as_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::MalformedRecord { line: 2, tokens: 6 }));
    }

    #[test]
    fn test_records_without_count() {
        let err = decode(&mut EventStore::new(), "1 2 3 4 5\n".as_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::NoEvents));

        let input = "Number of events: 0\n1 2 3 4 5\n";
        let err = decode(&mut EventStore::new(), input.as_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::NoEvents));
    }

    #[test]
    fn test_zero_count_into_indexed_store() {
        let mut store = EventStore::with_len(1).unwrap();
        store.update(0, Vec3::ZERO, 1.0, 1.0);
        store.build_index();

        assert_eq!(decode(&mut store, "Number of events: 0\n".as_bytes()).unwrap(), 0);
        assert!(!store.is_indexed());
        assert!(store
            .find_events(&eventfield_core::Aabb::around(Vec3::ZERO, 1.0))
            .is_empty());
    }

    #[test]
    fn test_unallocatable_count() {
        let input = format!("Number of events: {}\n1 2 3 4 5\n", 1_usize << 60);
        let err = decode(&mut EventStore::new(), input.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Store(eventfield_core::EventError::Allocation { .. })
        ));
    }

    #[test]
    fn test_invalid_tokens() {
        let input = "Number of events: 1\n1 2 x 4 5\n";
        let err = decode(&mut EventStore::new(), input.as_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::InvalidNumber { line: 2, ref token } if token == "x"));

        let err = decode(&mut EventStore::new(), "Number of events: many\n".as_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::InvalidNumber { line: 1, .. }));
    }

    #[test]
    fn test_extra_records_ignored() {
        let input = "Number of events: 1\n1 2 3 4 5\n6 7 8 9 10\n";
        let mut store = EventStore::new();
        assert_eq!(decode(&mut store, input.as_bytes()).unwrap(), 1);
        assert_eq!(store.values(), &[5.0]);
    }

    #[test]
    fn test_comment_only_stream() {
        let mut store = EventStore::new();
        assert_eq!(decode(&mut store, "# nothing here\n".as_bytes()).unwrap(), 0);
    }

    #[test]
    fn test_encode_decode() {
        let mut store = EventStore::with_len(2).unwrap();
        store.update(0, Vec3::new(0.1, 0.2, 0.3), 3.0, 1e-7);
        store.update(1, Vec3::new(-5.0, 1e6, 2.5), 0.0, 42.0);

        let mut text = Vec::new();
        encode(&store, &mut text).unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.starts_with("# EVENTFIELD events"));
        assert!(text.contains("Number of events: 2\n"));

        let mut decoded = EventStore::new();
        assert_eq!(decode(&mut decoded, text.as_bytes()).unwrap(), 2);
        assert_eq!(decoded.positions_y(), store.positions_y());
        assert_eq!(decoded.values(), store.values());
        assert_eq!(decoded.radius(1), Some(0.0));
        assert!((decoded.radius(0).unwrap() - 3.0).abs() < 1e-6);
    }
}
