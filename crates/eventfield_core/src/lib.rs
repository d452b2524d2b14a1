//! # EVENTFIELD Core
//!
//! Turns sparse, time-varying point events into per-voxel samples:
//! - Structure-of-arrays event storage on aligned columns
//! - Lazily built R-tree for range queries
//! - Frame/time model for event- and frame-kind sources
//! - The sampling functor contract with type-aware pixel scaling
//!
//! ## Architecture Rules
//!
//! 1. **Mutation and sampling never overlap** - `&mut` for loading,
//!    `&` for the parallel generation pass
//! 2. **Index is a cache** - any store mutation drops it
//! 3. **No allocations in the sampling path** beyond query results
//!
//! ## Example
//!
//! ```rust,ignore
//! use eventfield_core::{EventSource, EventSourceConfig, StaticEvents, Vec3};
//!
//! let mut source = EventSource::new(EventSourceConfig::default(), StaticEvents::default())?;
//! source.store_mut().resize(1)?;
//! source.store_mut().update(0, Vec3::ZERO, 2.0, 1.0);
//! source.before_generate()?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod functor;
pub mod loader;
pub mod math;
pub mod memory;
pub mod source;
pub mod spatial;
pub mod store;
pub mod time;

pub use config::EventSourceConfig;
pub use error::{EventError, EventResult};
pub use functor::{ClampStats, EventFunctor, Pixel, PixelScaler};
pub use loader::{EventLoader, StaticEvents};
pub use math::{Aabb, Vec3};
pub use source::EventSource;
pub use store::{EventStore, EventValues, EVENT_COLUMNS};
pub use time::{frame_range, FrameRange, SourceKind, TimeRange, Timing};
