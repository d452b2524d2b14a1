//! # Chunked Loader Contract
//!
//! Source-specific loading strategy, injected into an
//! [`EventSource`](crate::EventSource).
//!
//! A loader splits its input into opaque chunks. The core only checks that
//! a requested chunk window lies inside `0..chunk_count()` before
//! delegating; what a chunk means is up to the loader.

use crate::error::EventResult;
use crate::store::EventStore;
use crate::time::{SourceKind, TimeRange, Timing};

/// Capability interface implemented by concrete event loaders.
///
/// # Example
///
/// ```rust,ignore
/// struct SpikeReport { spikes: Vec<(f32, u32)>, cells: Vec<Vec3> }
///
/// impl EventLoader for SpikeReport {
///     fn chunk_count(&self) -> usize { 1 }
///     fn time_range(&self) -> TimeRange { TimeRange::new(0.0, 1000.0) }
///     fn kind(&self) -> SourceKind { SourceKind::Event }
///     fn load_chunks(&mut self, store: &mut EventStore, timing: &Timing,
///                    first: usize, count: usize) -> EventResult<usize> {
///         // fill `store` with the spikes inside the current window
///     }
/// }
/// ```
pub trait EventLoader: Send + Sync {
    /// Total number of chunks the source is split into.
    fn chunk_count(&self) -> usize;

    /// Time interval covered by the source data.
    fn time_range(&self) -> TimeRange;

    /// Frame semantics of the source.
    fn kind(&self) -> SourceKind;

    /// Loads chunks `first..first + count` into `store`.
    ///
    /// Called only with a validated, non-empty window. Returns the number of
    /// events loaded.
    fn load_chunks(
        &mut self,
        store: &mut EventStore,
        timing: &Timing,
        first: usize,
        count: usize,
    ) -> EventResult<usize>;

    /// Runs once before a generation pass, e.g. to materialize the events
    /// of the frame at `timing.current_time`.
    fn before_generate(&mut self, store: &mut EventStore, timing: &Timing) -> EventResult<()> {
        let _ = (store, timing);
        Ok(())
    }
}

/// Loader for stores populated up front, e.g. from an event file.
///
/// Exposes a single chunk; loading it reports the events already present.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StaticEvents {
    time_range: TimeRange,
    kind: SourceKind,
}

impl StaticEvents {
    /// Creates a static loader covering `time_range`.
    #[must_use]
    pub const fn new(time_range: TimeRange, kind: SourceKind) -> Self {
        Self { time_range, kind }
    }
}

impl Default for StaticEvents {
    fn default() -> Self {
        Self::new(TimeRange::default(), SourceKind::Frame)
    }
}

impl EventLoader for StaticEvents {
    fn chunk_count(&self) -> usize {
        1
    }

    fn time_range(&self) -> TimeRange {
        self.time_range
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn load_chunks(
        &mut self,
        store: &mut EventStore,
        _timing: &Timing,
        _first: usize,
        _count: usize,
    ) -> EventResult<usize> {
        Ok(store.len())
    }
}
