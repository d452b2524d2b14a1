//! # Sampling Functor
//!
//! The per-voxel sampling contract and the numeric scaling from an
//! accumulated `f32` into the output pixel type.
//!
//! ## Generation pass
//!
//! ```text
//!   consumer thread          worker threads (many)
//!   ───────────────          ─────────────────────
//!   before_generate(&mut)
//!          │
//!          ├──────────────► sample(&self, point, spacing)
//!          │                sample(&self, point, spacing)
//!          │                ...
//!          ▼
//!   scaler().take_stats()
//! ```
//!
//! `before_generate` takes `&mut self` and `sample` takes `&self`, so the
//! borrow checker enforces that no mutation overlaps a pass.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use tracing::info;

use crate::error::EventResult;
use crate::math::Vec3;
use crate::source::EventSource;

/// Numeric representation of an output pixel.
pub trait Pixel: Copy + Send + Sync + 'static {
    /// True for floating-point pixels, which bypass clamping.
    const IS_FLOAT: bool;

    /// Largest representable value, as `f32`.
    const MAX: f32;

    /// Converts an already scaled value. Integer conversions saturate, so
    /// signed pixels only use their non-negative half.
    fn from_f32(value: f32) -> Self;
}

macro_rules! impl_float_pixel {
    ($($ty:ty),*) => {$(
        impl Pixel for $ty {
            const IS_FLOAT: bool = true;
            const MAX: f32 = f32::MAX;

            #[inline]
            fn from_f32(value: f32) -> Self {
                value.into()
            }
        }
    )*};
}

macro_rules! impl_integer_pixel {
    ($($ty:ty),*) => {$(
        impl Pixel for $ty {
            const IS_FLOAT: bool = false;
            const MAX: f32 = <$ty>::MAX as f32;

            #[inline]
            fn from_f32(value: f32) -> Self {
                value as $ty
            }
        }
    )*};
}

impl_float_pixel!(f32, f64);
impl_integer_pixel!(u8, u16, u32, u64, i8, i16, i32);

/// Clamp counts collected during a generation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClampStats {
    /// Samples clamped down to 1.
    pub high: u64,
    /// Samples clamped up to 0.
    pub low: u64,
}

/// Scales raw samples into pixels, reporting out-of-range values without
/// flooding the log.
///
/// For integer pixels, values are clamped to `[0, 1]` and multiplied by the
/// type's maximum. A high value is logged only when it exceeds every high
/// value logged before (the watermark, starting at 1). A negative value is
/// logged once per watermark state. Both are atomics, so one scaler can be
/// shared by all sampling threads.
#[derive(Debug)]
pub struct PixelScaler {
    /// Bits of the largest high value reported so far. Only ever holds
    /// positive floats, whose bit patterns order like their values.
    high_watermark: AtomicU32,
    /// Set once a negative value has been reported for this watermark.
    low_reported: AtomicBool,
    high_count: AtomicU64,
    low_count: AtomicU64,
}

impl Default for PixelScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl PixelScaler {
    /// Creates a scaler with the watermark at 1.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            high_watermark: AtomicU32::new(0x3f80_0000), // 1.0f32
            low_reported: AtomicBool::new(false),
            high_count: AtomicU64::new(0),
            low_count: AtomicU64::new(0),
        }
    }

    /// Largest out-of-range value reported so far (1 if none).
    #[must_use]
    pub fn watermark(&self) -> f32 {
        f32::from_bits(self.high_watermark.load(Ordering::Relaxed))
    }

    /// Converts a raw sample into a pixel.
    #[inline]
    pub fn scale<P: Pixel>(&self, value: f32) -> P {
        if P::IS_FLOAT {
            return P::from_f32(value);
        }

        if value > 1.0 {
            self.high_count.fetch_add(1, Ordering::Relaxed);
            let bits = value.to_bits();
            if self.high_watermark.fetch_max(bits, Ordering::Relaxed) < bits {
                self.low_reported.store(false, Ordering::Relaxed);
                info!(value, "clamping sampled value to 1");
            }
        } else if value < 0.0 {
            self.low_count.fetch_add(1, Ordering::Relaxed);
            if !self.low_reported.swap(true, Ordering::Relaxed) {
                info!(value, "clamping sampled value to 0");
            }
        }

        P::from_f32(value.clamp(0.0, 1.0) * P::MAX)
    }

    /// Returns the clamp counts since the last call and resets them.
    ///
    /// Meant for the single-threaded phase after a pass.
    pub fn take_stats(&self) -> ClampStats {
        ClampStats {
            high: self.high_count.swap(0, Ordering::Relaxed),
            low: self.low_count.swap(0, Ordering::Relaxed),
        }
    }
}

/// Samples the events of a source into one voxel.
///
/// Implementors hold an [`EventSource`] and a [`PixelScaler`] and provide
/// the aggregation formula in [`sample`](Self::sample).
///
/// # Example
///
/// ```rust,ignore
/// struct Density { source: EventSource, scaler: PixelScaler }
///
/// impl EventFunctor for Density {
///     type Pixel = u8;
///     fn source(&self) -> &EventSource { &self.source }
///     fn source_mut(&mut self) -> &mut EventSource { &mut self.source }
///     fn scaler(&self) -> &PixelScaler { &self.scaler }
///     fn sample(&self, point: Vec3, spacing: Vec3) -> u8 {
///         let area = Aabb::around(point, spacing.x * 0.5);
///         let sum: f32 = self.source.store().find_events(&area).iter().sum();
///         self.scaler.scale(sum)
///     }
/// }
/// ```
pub trait EventFunctor: Send + Sync {
    /// Output pixel type.
    type Pixel: Pixel;

    /// The sampled source.
    fn source(&self) -> &EventSource;

    /// Mutable access to the sampled source, outside generation passes.
    fn source_mut(&mut self) -> &mut EventSource;

    /// Scaling state shared by all sampling threads.
    fn scaler(&self) -> &PixelScaler;

    /// Called once before threads start sampling.
    fn before_generate(&mut self) -> EventResult<()> {
        self.source_mut().before_generate()
    }

    /// Computes the pixel for the voxel at `point` with size `spacing`.
    fn sample(&self, point: Vec3, spacing: Vec3) -> Self::Pixel;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_passthrough() {
        let scaler = PixelScaler::new();
        assert_eq!(scaler.scale::<f32>(3.5), 3.5);
        assert_eq!(scaler.scale::<f64>(-2.0), -2.0);
        assert_eq!(scaler.take_stats(), ClampStats::default());
    }

    #[test]
    fn test_integer_scaling() {
        let scaler = PixelScaler::new();
        assert_eq!(scaler.scale::<u8>(0.0), 0);
        assert_eq!(scaler.scale::<u8>(1.0), 255);
        assert_eq!(scaler.scale::<u8>(0.5), 127);
        assert_eq!(scaler.scale::<u16>(1.0), u16::MAX);
        assert_eq!(scaler.scale::<u32>(1.0), u32::MAX);
    }

    #[test]
    fn test_wide_and_signed_scaling() {
        let scaler = PixelScaler::new();
        assert_eq!(scaler.scale::<u64>(1.0), u64::MAX);
        assert_eq!(scaler.scale::<u64>(0.0), 0);
        assert_eq!(scaler.scale::<i8>(1.0), i8::MAX);
        assert_eq!(scaler.scale::<i8>(0.5), 63);
        assert_eq!(scaler.scale::<i16>(-4.0), 0);
        assert_eq!(scaler.scale::<i32>(2.0), i32::MAX);
        assert_eq!(scaler.take_stats(), ClampStats { high: 1, low: 1 });
    }

    #[test]
    fn test_integer_clamping() {
        let scaler = PixelScaler::new();
        assert_eq!(scaler.scale::<u8>(7.0), 255);
        assert_eq!(scaler.scale::<u8>(-3.0), 0);
        assert_eq!(scaler.take_stats(), ClampStats { high: 1, low: 1 });
        assert_eq!(scaler.take_stats(), ClampStats::default());
    }

    #[test]
    fn test_watermark_only_rises() {
        let scaler = PixelScaler::new();
        assert_eq!(scaler.watermark(), 1.0);

        scaler.scale::<u8>(2.0);
        assert_eq!(scaler.watermark(), 2.0);
        scaler.scale::<u8>(1.5);
        assert_eq!(scaler.watermark(), 2.0);
        scaler.scale::<u8>(4.0);
        assert_eq!(scaler.watermark(), 4.0);
    }

    #[test]
    fn test_low_report_resets_with_watermark() {
        let scaler = PixelScaler::new();
        scaler.scale::<u8>(-1.0);
        assert!(scaler.low_reported.load(Ordering::Relaxed));

        scaler.scale::<u8>(3.0);
        assert!(!scaler.low_reported.load(Ordering::Relaxed));
    }

    #[test]
    fn test_nan_maps_to_zero() {
        let scaler = PixelScaler::new();
        assert_eq!(scaler.scale::<u8>(f32::NAN), 0);
    }

    #[test]
    fn test_concurrent_watermark() {
        let scaler = PixelScaler::new();
        std::thread::scope(|s| {
            for t in 0..8 {
                let scaler = &scaler;
                s.spawn(move || {
                    for i in 0..1000 {
                        let _: u16 = scaler.scale(1.0 + (t * 1000 + i) as f32);
                    }
                });
            }
        });
        assert_eq!(scaler.watermark(), 8000.0);
        assert_eq!(scaler.take_stats().high, 8000);
    }
}
