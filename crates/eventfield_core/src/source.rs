//! # Event Source
//!
//! An [`EventStore`] together with its timing state and the loader that
//! fills it.
//!
//! The source owns the store outright; loaders get `&mut EventStore` only
//! for the duration of a load or pre-generation call.

use tracing::info;

use crate::config::EventSourceConfig;
use crate::error::{EventError, EventResult};
use crate::loader::EventLoader;
use crate::store::EventStore;
use crate::time::{frame_range, FrameRange, SourceKind, TimeRange, Timing};

/// A loadable, frame-addressable collection of events.
pub struct EventSource {
    store: EventStore,
    timing: Timing,
    loader: Box<dyn EventLoader>,
}

impl std::fmt::Debug for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSource")
            .field("store", &self.store)
            .field("timing", &self.timing)
            .field("chunks", &self.loader.chunk_count())
            .finish_non_exhaustive()
    }
}

impl EventSource {
    /// Creates an empty source from a parameter set and a loader.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: EventSourceConfig, loader: impl EventLoader + 'static) -> EventResult<Self> {
        config.validate()?;
        Ok(Self {
            store: EventStore::new(),
            timing: Timing {
                dt: config.dt,
                duration: config.duration,
                cutoff_distance: config.cutoff_distance,
                current_time: -1.0,
            },
            loader: Box::new(loader),
        })
    }

    /// The event storage.
    #[inline]
    #[must_use]
    pub const fn store(&self) -> &EventStore {
        &self.store
    }

    /// Mutable event storage, for codecs and custom readers.
    #[inline]
    pub fn store_mut(&mut self) -> &mut EventStore {
        &mut self.store
    }

    /// Current timing state.
    #[inline]
    #[must_use]
    pub const fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Number of events.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if the source holds no events.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Time per frame.
    #[inline]
    #[must_use]
    pub const fn dt(&self) -> f32 {
        self.timing.dt
    }

    /// Changes the time per frame.
    pub fn set_dt(&mut self, dt: f32) {
        self.timing.dt = dt;
    }

    /// Temporal support of one event.
    #[inline]
    #[must_use]
    pub const fn duration(&self) -> f32 {
        self.timing.duration
    }

    /// Sampling cutoff distance.
    #[inline]
    #[must_use]
    pub const fn cutoff_distance(&self) -> f32 {
        self.timing.cutoff_distance
    }

    /// Time of the selected frame; `-1` until one is selected.
    #[inline]
    #[must_use]
    pub const fn current_time(&self) -> f32 {
        self.timing.current_time
    }

    /// Sets the current time directly.
    pub fn set_time(&mut self, time: f32) {
        self.timing.current_time = time;
    }

    /// Interval covered by the loader's data.
    #[must_use]
    pub fn time_range(&self) -> TimeRange {
        self.loader.time_range()
    }

    /// Frame semantics of the loader.
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        self.loader.kind()
    }

    /// Valid frames for the current `dt` and `duration`.
    #[must_use]
    pub fn frame_range(&self) -> FrameRange {
        frame_range(
            self.loader.kind(),
            self.loader.time_range(),
            self.timing.dt,
            self.timing.duration,
        )
    }

    /// Returns true if `frame` lies in [`frame_range`](Self::frame_range).
    #[must_use]
    pub fn is_in_frame_range(&self, frame: u32) -> bool {
        self.frame_range().contains(frame)
    }

    /// Selects `frame`, setting the current time to
    /// `time_range.start + dt * frame`.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::FrameOutOfRange`] and leaves the current time
    /// untouched if `frame` is not in the frame range.
    pub fn set_frame(&mut self, frame: u32) -> EventResult<()> {
        let range = self.frame_range();
        if !range.contains(frame) {
            return Err(EventError::FrameOutOfRange { frame, range });
        }
        self.timing.current_time = self.timing.frame_time(self.loader.time_range(), frame);
        Ok(())
    }

    /// Total chunks exposed by the loader.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.loader.chunk_count()
    }

    /// Loads the whole source in one call.
    ///
    /// # Errors
    ///
    /// Same as [`load_chunks`](Self::load_chunks); a loader exposing no
    /// chunks yields [`EventError::InvalidChunkCount`].
    pub fn load(&mut self) -> EventResult<usize> {
        let count = self.chunk_count();
        self.load_chunks(0, count)
    }

    /// Loads chunks `first..first + count`.
    ///
    /// # Errors
    ///
    /// - [`EventError::InvalidChunkCount`] if `count == 0`
    /// - [`EventError::ChunkOutOfRange`] if the window ends past
    ///   [`chunk_count`](Self::chunk_count)
    /// - whatever the loader reports
    pub fn load_chunks(&mut self, first: usize, count: usize) -> EventResult<usize> {
        if count == 0 {
            return Err(EventError::InvalidChunkCount);
        }
        let total = self.loader.chunk_count();
        if first.checked_add(count).map_or(true, |end| end > total) {
            return Err(EventError::ChunkOutOfRange { first, count, total });
        }

        let loaded = self.loader.load_chunks(&mut self.store, &self.timing, first, count)?;
        info!(first, count, total, loaded, "loaded event chunks");
        Ok(loaded)
    }

    /// Prepares the source for a generation pass.
    ///
    /// Runs the loader's hook and builds the spatial index. Must complete
    /// before any sampling thread starts.
    ///
    /// # Errors
    ///
    /// Propagates the error of the loader's hook; the index is not built in
    /// that case.
    pub fn before_generate(&mut self) -> EventResult<()> {
        self.loader.before_generate(&mut self.store, &self.timing)?;
        self.store.build_index();
        Ok(())
    }
}
