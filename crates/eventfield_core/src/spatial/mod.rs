//! # Spatial Index
//!
//! Range-query acceleration over event positions.
//!
//! The index is a derived cache: it is bulk-built from a snapshot of the
//! store's positions and thrown away on any mutation. Rebuilding from
//! scratch keeps the structure packed and the code small; incremental
//! insert/delete is not supported.

mod rtree;

pub use rtree::{IndexedPoint, RTree, MAX_NODE_ENTRIES};
