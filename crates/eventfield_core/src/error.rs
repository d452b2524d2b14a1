//! # Core Error Types
//!
//! All errors that can occur while populating, indexing or framing events.

use thiserror::Error;

use crate::time::FrameRange;

/// Errors that can occur in the event core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventError {
    /// A chunked load was requested with zero chunks.
    #[error("invalid argument: number of chunks must be > 0")]
    InvalidChunkCount,

    /// A chunked load window extends past the loader's chunk count.
    #[error("chunk window {first}..{first}+{count} out of range: source has {total} chunks")]
    ChunkOutOfRange {
        /// First requested chunk.
        first: usize,
        /// Number of requested chunks.
        count: usize,
        /// Chunks available from the loader.
        total: usize,
    },

    /// The event buffer could not be allocated.
    #[error("failed to allocate {bytes} bytes for event buffer")]
    Allocation {
        /// Requested size in bytes.
        bytes: usize,
    },

    /// A frame outside the source's frame range was selected.
    #[error("frame {frame} outside frame range [{}, {})", range.start, range.end)]
    FrameOutOfRange {
        /// The rejected frame.
        frame: u32,
        /// The valid range at the time of the call.
        range: FrameRange,
    },

    /// Invalid configuration value or file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The concrete loader failed to produce events.
    #[error("loader failed: {0}")]
    Load(String),
}

/// Result type for core operations.
pub type EventResult<T> = Result<T, EventError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EventError::ChunkOutOfRange { first: 3, count: 2, total: 4 };
        assert_eq!(
            err.to_string(),
            "chunk window 3..3+2 out of range: source has 4 chunks"
        );

        let err = EventError::FrameOutOfRange {
            frame: 4,
            range: FrameRange { start: 0, end: 4 },
        };
        assert_eq!(err.to_string(), "frame 4 outside frame range [0, 4)");
    }
}
