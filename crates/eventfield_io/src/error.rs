//! # Codec Error Types
//!
//! All errors that can occur while reading or writing event files.

use eventfield_core::EventError;
use thiserror::Error;

/// Errors that can occur in the event file codecs.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The underlying file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file has no content.
    #[error("event file is empty")]
    Empty,

    /// A binary file carries a version this build cannot read.
    #[error("unsupported binary event file version {0}")]
    UnsupportedVersion(u32),

    /// A binary file size does not match a whole number of records.
    #[error("binary event file of {len} bytes is truncated or corrupt")]
    Truncated {
        /// File size in bytes.
        len: usize,
    },

    /// A text file has records but declares no events.
    #[error("no events to load, the declared number of events must be > 0")]
    NoEvents,

    /// A text record does not have exactly five fields.
    #[error("line {line}: expected 5 fields (x y z radius value), found {tokens}")]
    MalformedRecord {
        /// 1-based line number.
        line: usize,
        /// Number of whitespace-separated fields found.
        tokens: usize,
    },

    /// A text field or count is not a number.
    #[error("line {line}: invalid number {token:?}")]
    InvalidNumber {
        /// 1-based line number.
        line: usize,
        /// The offending token.
        token: String,
    },

    /// The event store refused to grow.
    #[error(transparent)]
    Store(#[from] EventError),
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
