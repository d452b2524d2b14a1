//! # Aligned Columns
//!
//! A zero-initialized, structure-of-arrays float buffer whose columns all
//! begin on a 32-byte boundary.
//!
//! The buffer comes from a zeroed allocation, so pages of a large store are
//! not touched until events are written to them.

use bytemuck::{Pod, Zeroable};

use crate::error::{EventError, EventResult};

/// Alignment of every column in bytes.
pub const ALIGNMENT: usize = 32;

/// Floats per aligned lane.
pub const LANE_WIDTH: usize = ALIGNMENT / std::mem::size_of::<f32>();

/// One 32-byte aligned block of floats.
#[repr(C, align(32))]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct Lane([f32; LANE_WIDTH]);

/// Fixed-capacity column storage.
///
/// The buffer holds `columns` columns of `stride` floats each, laid out one
/// after another. `stride` is the requested capacity rounded up to a whole
/// number of lanes, so each column starts on an aligned lane.
///
/// # Example
///
/// ```rust,ignore
/// let mut columns = AlignedColumns::try_new(5, 1000)?;
/// columns.column_mut(0)[42] = 1.5;
/// assert_eq!(columns.column(0).as_ptr() as usize % ALIGNMENT, 0);
/// ```
#[derive(Clone, Default)]
pub struct AlignedColumns {
    /// Backing storage.
    lanes: Box<[Lane]>,
    /// Number of columns.
    columns: usize,
    /// Floats per column.
    stride: usize,
}

impl AlignedColumns {
    /// Allocates zeroed storage for `columns` columns of at least `capacity`
    /// floats each.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Allocation`] if the allocator refuses the
    /// request.
    pub fn try_new(columns: usize, capacity: usize) -> EventResult<Self> {
        let lanes_per_column = capacity.div_ceil(LANE_WIDTH);
        let total = lanes_per_column.saturating_mul(columns);
        let bytes = total.saturating_mul(ALIGNMENT);

        let lanes = bytemuck::allocation::try_zeroed_slice_box::<Lane>(total)
            .map_err(|()| EventError::Allocation { bytes })?;

        Ok(Self {
            lanes,
            columns,
            stride: lanes_per_column * LANE_WIDTH,
        })
    }

    /// Floats available per column.
    #[inline]
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Number of columns.
    #[inline]
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// The whole buffer as a flat float slice.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        bytemuck::cast_slice(&self.lanes[..])
    }

    /// Full column `index`, `stride` floats long.
    ///
    /// Returns an empty slice for a column that does not exist.
    #[inline]
    #[must_use]
    pub fn column(&self, index: usize) -> &[f32] {
        let start = index * self.stride;
        self.as_slice().get(start..start + self.stride).unwrap_or(&[])
    }

    /// Mutable full column `index`.
    #[inline]
    pub fn column_mut(&mut self, index: usize) -> &mut [f32] {
        let start = index * self.stride;
        let stride = self.stride;
        let floats: &mut [f32] = bytemuck::cast_slice_mut(&mut self.lanes[..]);
        floats.get_mut(start..start + stride).unwrap_or(&mut [])
    }

    /// Copies the first `len` floats of every column from `other`.
    ///
    /// `len` is clamped to the smaller stride; columns missing on either
    /// side are skipped.
    pub fn copy_prefix_from(&mut self, other: &Self, len: usize) {
        let len = len.min(self.stride).min(other.stride);
        for column in 0..self.columns.min(other.columns) {
            self.column_mut(column)[..len].copy_from_slice(&other.column(column)[..len]);
        }
    }
}

impl std::fmt::Debug for AlignedColumns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedColumns")
            .field("columns", &self.columns)
            .field("stride", &self.stride)
            .finish_non_exhaustive()
    }
}
