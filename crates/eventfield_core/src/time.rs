//! # Frame/Time Model
//!
//! Maps discrete frames to simulation time.
//!
//! Two kinds of sources exist:
//!
//! - [`SourceKind::Event`]: events have finite temporal support
//!   (`duration`). The last frame is the last one whose whole window still
//!   fits before the end of the data.
//! - [`SourceKind::Frame`]: data is already framed externally; every frame
//!   that overlaps the time range is valid.
//!
//! Frame ranges are right-open: `[start, end)`.

use serde::{Deserialize, Serialize};

/// How a source's time range translates into frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Instantaneous events with a decay window.
    #[default]
    Event,
    /// Externally framed data, no decay window.
    Frame,
}

/// Continuous time interval `[start, end]` covered by a source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    /// First available time.
    pub start: f32,
    /// Last available time.
    pub end: f32,
}

impl TimeRange {
    /// Creates a time range.
    #[must_use]
    pub const fn new(start: f32, end: f32) -> Self {
        Self { start, end }
    }
}

/// Right-open frame interval `[start, end)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRange {
    /// First valid frame.
    pub start: u32,
    /// One past the last valid frame.
    pub end: u32,
}

impl FrameRange {
    /// The empty range `[0, 0)`.
    pub const EMPTY: Self = Self { start: 0, end: 0 };

    /// Half-open membership test.
    #[inline]
    #[must_use]
    pub const fn contains(&self, frame: u32) -> bool {
        frame >= self.start && frame < self.end
    }

    /// Number of frames in the range.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if no frame is valid.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Computes the valid frames for a source.
///
/// `dt` is the time per frame and `duration` the support window of a single
/// event (only used for [`SourceKind::Event`]).
#[must_use]
pub fn frame_range(kind: SourceKind, interval: TimeRange, dt: f32, duration: f32) -> FrameRange {
    match kind {
        SourceKind::Event => {
            let end_time = interval.end - duration;
            if end_time < interval.start {
                return FrameRange::EMPTY;
            }
            // frame floor(end_time / dt) is complete; +1 because the range
            // is open on the right
            FrameRange {
                start: (interval.start / dt).floor() as u32,
                end: (end_time / dt).floor() as u32 + 1,
            }
        }
        SourceKind::Frame => FrameRange {
            start: (interval.start / dt).floor() as u32,
            end: (interval.end / dt).ceil() as u32,
        },
    }
}

/// Mutable timing state of an event source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
    /// Time per frame.
    pub dt: f32,
    /// Temporal support of one event.
    pub duration: f32,
    /// Sampling cutoff distance.
    pub cutoff_distance: f32,
    /// Time of the frame currently being generated; `-1` before any frame
    /// is selected.
    pub current_time: f32,
}

impl Timing {
    /// Time of `frame` relative to `interval`.
    #[inline]
    #[must_use]
    pub fn frame_time(&self, interval: TimeRange, frame: u32) -> f32 {
        interval.start + self.dt * frame as f32
    }
}
