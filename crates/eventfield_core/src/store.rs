//! # Event Store
//!
//! Structure-of-arrays storage for point events.
//!
//! Each event is `(x, y, z, radius, value)`, stored column-wise in one
//! aligned buffer. The radius column holds `1 / radius` so per-voxel
//! sampling code multiplies instead of dividing; a zero radius is never
//! inverted and the slot keeps its previous value (zero when fresh).
//!
//! ## Lifecycle
//!
//! 1. A loader or codec calls [`EventStore::resize`] and then
//!    [`EventStore::update`] for every index.
//! 2. [`EventStore::build_index`] packs an R-tree over the positions.
//! 3. Sampling threads read columns and call [`EventStore::find_events`]
//!    concurrently through `&EventStore`.
//!
//! Any `update` drops the index, so a query never sees stale positions.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::{debug, warn};

use crate::error::EventResult;
use crate::math::{Aabb, Vec3};
use crate::memory::AlignedColumns;
use crate::spatial::{IndexedPoint, RTree};

/// Values returned by a range query.
pub type EventValues = Vec<f32>;

/// Column layout of the event buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
enum Column {
    PositionX = 0,
    PositionY,
    PositionZ,
    InverseRadius,
    Value,
}

/// Number of float columns per event.
pub const EVENT_COLUMNS: usize = 5;

/// Owned, growable event storage with a lazily built spatial index.
///
/// # Thread Safety
///
/// Mutation takes `&mut self`, so the borrow checker keeps it apart from
/// sampling. Everything reachable through `&self` is safe to share across
/// sampling threads.
#[derive(Default)]
pub struct EventStore {
    /// Column buffer; stride is the allocated capacity.
    columns: AlignedColumns,
    /// Logical event count.
    num_events: usize,
    /// Events the buffer can hold without reallocating.
    alloc_size: usize,
    /// Merged extent of every position ever written.
    bounding_box: Aabb,
    /// Range-query index; `None` until built, cleared on mutation.
    index: Option<RTree>,
    /// Largest hit count seen so far, used to pre-size query results.
    max_hits: AtomicUsize,
    /// Set once the "no index" diagnostic has been emitted.
    unindexed_warned: AtomicBool,
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStore")
            .field("len", &self.num_events)
            .field("capacity", &self.alloc_size)
            .field("bounding_box", &self.bounding_box)
            .field("indexed", &self.index.is_some())
            .finish_non_exhaustive()
    }
}

impl EventStore {
    /// Creates an empty store. No memory is allocated until [`resize`].
    ///
    /// [`resize`]: Self::resize
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store sized for `num_events` zeroed events.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Allocation`](crate::EventError::Allocation) if
    /// the buffer cannot be allocated.
    pub fn with_len(num_events: usize) -> EventResult<Self> {
        let mut store = Self::new();
        store.resize(num_events)?;
        Ok(store)
    }

    /// Number of addressable events.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.num_events
    }

    /// Returns true if the store holds no events.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.num_events == 0
    }

    /// Events the current buffer can hold without reallocating.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.alloc_size
    }

    /// Sets the logical event count.
    ///
    /// Growing past the capacity allocates a new zeroed buffer and copies the
    /// retained events across. Shrinking never frees memory; events past the
    /// new length stay in the buffer and reappear if the store grows back
    /// within capacity. Changing the count drops the spatial index.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Allocation`](crate::EventError::Allocation) if a
    /// larger buffer is needed and cannot be allocated. The store is left
    /// unchanged in that case.
    pub fn resize(&mut self, num_events: usize) -> EventResult<()> {
        if num_events > self.alloc_size {
            let mut columns = AlignedColumns::try_new(EVENT_COLUMNS, num_events)?;
            columns.copy_prefix_from(&self.columns, self.alloc_size);
            self.columns = columns;
            self.alloc_size = num_events;
            debug!(capacity = num_events, "event buffer grown");
        }
        if num_events != self.num_events {
            self.index = None;
        }
        self.num_events = num_events;
        Ok(())
    }

    /// Writes the event at `index`.
    ///
    /// Out-of-range indices are logged and ignored. `radius` is stored
    /// inverted unless it is zero (within `f32::EPSILON`), in which case the
    /// previous inverse radius is kept. Drops the spatial index.
    pub fn update(&mut self, index: usize, position: Vec3, radius: f32, value: f32) {
        if index >= self.num_events {
            warn!(
                index,
                len = self.num_events,
                "the specified index is not valid, event not added"
            );
            return;
        }

        self.bounding_box.merge_point(position);
        self.columns.column_mut(Column::PositionX as usize)[index] = position.x;
        self.columns.column_mut(Column::PositionY as usize)[index] = position.y;
        self.columns.column_mut(Column::PositionZ as usize)[index] = position.z;
        if radius.abs() > f32::EPSILON {
            self.columns.column_mut(Column::InverseRadius as usize)[index] = radius.recip();
        }
        self.columns.column_mut(Column::Value as usize)[index] = value;

        self.index = None;
    }

    #[inline]
    fn column(&self, column: Column) -> &[f32] {
        &self.columns.column(column as usize)[..self.num_events]
    }

    /// X coordinates, one per event.
    #[inline]
    #[must_use]
    pub fn positions_x(&self) -> &[f32] {
        self.column(Column::PositionX)
    }

    /// Y coordinates, one per event.
    #[inline]
    #[must_use]
    pub fn positions_y(&self) -> &[f32] {
        self.column(Column::PositionY)
    }

    /// Z coordinates, one per event.
    #[inline]
    #[must_use]
    pub fn positions_z(&self) -> &[f32] {
        self.column(Column::PositionZ)
    }

    /// Inverse radii (`1 / radius`), one per event. Zero marks an event
    /// without falloff.
    #[inline]
    #[must_use]
    pub fn radii(&self) -> &[f32] {
        self.column(Column::InverseRadius)
    }

    /// Event values.
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[f32] {
        self.column(Column::Value)
    }

    /// Mutable access to one event value.
    ///
    /// Only the value changes, so the spatial index stays valid.
    #[inline]
    pub fn value_mut(&mut self, index: usize) -> Option<&mut f32> {
        if index >= self.num_events {
            return None;
        }
        self.columns.column_mut(Column::Value as usize).get_mut(index)
    }

    /// Position of event `index`.
    #[must_use]
    pub fn position(&self, index: usize) -> Option<Vec3> {
        Some(Vec3::new(
            *self.positions_x().get(index)?,
            *self.positions_y().get(index)?,
            *self.positions_z().get(index)?,
        ))
    }

    /// Physical radius of event `index`; `0.0` for the no-falloff marker.
    #[must_use]
    pub fn radius(&self, index: usize) -> Option<f32> {
        let inverse = *self.radii().get(index)?;
        Some(if inverse == 0.0 { 0.0 } else { inverse.recip() })
    }

    /// Merged extent of all written positions. Empty until the first
    /// [`update`](Self::update).
    #[inline]
    #[must_use]
    pub const fn bounding_box(&self) -> &Aabb {
        &self.bounding_box
    }

    /// Replaces the bounding box, e.g. with a circuit-wide extent known to
    /// the loader.
    pub fn set_bounding_box(&mut self, bounding_box: Aabb) {
        self.bounding_box = bounding_box;
    }

    /// Returns true if a range query would use the spatial index.
    #[inline]
    #[must_use]
    pub const fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    /// Builds the spatial index from the current positions.
    ///
    /// A no-op if the index is already built.
    pub fn build_index(&mut self) {
        if self.index.is_some() {
            return;
        }

        debug!(events = self.num_events, "building spatial index");
        let points = (0..self.num_events)
            .filter_map(|index| {
                self.position(index)
                    .map(|position| IndexedPoint { position, index })
            })
            .collect();
        self.index = Some(RTree::bulk_load(points));
        debug!(events = self.num_events, "spatial index built");
    }

    /// Values of all events whose position lies in `area` (faces inclusive).
    ///
    /// Without a built index this returns an empty result and warns once per
    /// store.
    #[must_use]
    pub fn find_events(&self, area: &Aabb) -> EventValues {
        let Some(index) = &self.index else {
            if !self.unindexed_warned.swap(true, Ordering::Relaxed) {
                warn!("spatial index not available for find_events, no events will be returned");
            }
            return EventValues::new();
        };

        let values = self.values();
        let mut hits = EventValues::with_capacity(self.max_hits.load(Ordering::Relaxed));
        index.query(area, |i| hits.push(values[i]));
        self.max_hits.fetch_max(hits.len(), Ordering::Relaxed);
        hits
    }
}
