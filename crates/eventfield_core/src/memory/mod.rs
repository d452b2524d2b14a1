//! # Memory Management
//!
//! Aligned column storage for the event store.
//!
//! ## Design Philosophy
//!
//! Memory is allocated when a loader sizes the store. During sampling:
//! - No heap allocations
//! - Columns start on 32-byte boundaries for vectorized reads

mod aligned;

pub use aligned::{AlignedColumns, ALIGNMENT, LANE_WIDTH};
