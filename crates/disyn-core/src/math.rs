//! Mathematical utility functions for the voice.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] - Convert a dB value to linear gain
//!
//! # Waveshaping
//!
//! | Function | Character | Use |
//! |----------|-----------|-----|
//! | [`soft_clip`] | Smooth, odd harmonics | Output stage, pre-fold shaping |
//! | [`foldback`] | Complex, synthy | Wavefolder core |
//!
//! # Parameter Mapping
//!
//! Normalized controls arrive in `[0, 1]`. Controls heard logarithmically
//! (indices, ratios, rates) go through [`expo_map`], the rest through [`lerp`].

use libm::{powf, tanhf};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use disyn_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(6.02) - 2.0).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    powf(10.0, db / 20.0)
}

/// Soft clipping using hyperbolic tangent.
///
/// Output is always in `(-1, 1)`.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    tanhf(x)
}

/// Foldback distortion.
///
/// Reflects the signal back toward zero each time it crosses `threshold`.
/// Iterative so arbitrarily large inputs terminate without recursion.
///
/// # Arguments
/// * `x` - Input sample
/// * `threshold` - Fold threshold (must be > 0)
#[inline]
pub fn foldback(x: f32, threshold: f32) -> f32 {
    if !x.is_finite() || threshold <= 0.0 {
        return 0.0;
    }
    let mut y = x;
    // Each pass reduces |y| by at least the excess; 16 passes cover |x| < 32·threshold.
    for _ in 0..16 {
        if y.abs() <= threshold {
            return y;
        }
        let sign = y.signum();
        let excess = y.abs() - threshold;
        y = sign * (threshold - excess);
    }
    y.clamp(-threshold, threshold)
}

/// Flush values that would become denormal to zero.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Linear interpolation from `min` to `max` by `t`.
#[inline]
pub fn lerp(min: f32, max: f32, t: f32) -> f32 {
    min + (max - min) * t
}

/// Clamp a normalized control to `[0, 1]`; NaN maps to 0.
#[inline]
pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Exponential mapping `min * (max / min)^t` with `t` clamped to `[0, 1]`.
///
/// `min` and `max` must both be positive.
///
/// # Example
/// ```rust
/// use disyn_core::expo_map;
///
/// assert!((expo_map(0.5, 1.0, 100.0) - 10.0).abs() < 1e-3);
/// ```
#[inline]
pub fn expo_map(t: f32, min: f32, max: f32) -> f32 {
    min * powf(max / min, clamp01(t))
}

/// Clamp to `[-limit, limit]`.
#[inline]
pub fn clamp_abs(value: f32, limit: f32) -> f32 {
    value.clamp(-limit, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_to_linear() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_foldback_passes_small_signals() {
        assert_eq!(foldback(0.5, 1.0), 0.5);
        assert_eq!(foldback(-0.9, 1.0), -0.9);
    }

    #[test]
    fn test_foldback_reflects() {
        assert!((foldback(1.5, 1.0) - 0.5).abs() < 1e-6);
        assert!((foldback(-1.25, 1.0) + 0.75).abs() < 1e-6);
        // Double fold: 3.5 -> -1.5 -> -0.5
        assert!((foldback(3.5, 1.0) + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_foldback_bounded_for_large_input() {
        for x in [10.0, -50.0, 1e6, f32::NAN, f32::INFINITY] {
            let y = foldback(x, 1.0);
            assert!(y.abs() <= 1.0, "foldback({}) = {}", x, y);
        }
    }

    #[test]
    fn test_expo_map_endpoints() {
        assert!((expo_map(0.0, 0.05, 5.0) - 0.05).abs() < 1e-6);
        assert!((expo_map(1.0, 0.05, 5.0) - 5.0).abs() < 1e-4);
        assert!((expo_map(2.0, 0.05, 5.0) - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_clamp01_handles_nan() {
        assert_eq!(clamp01(f32::NAN), 0.0);
        assert_eq!(clamp01(-0.2), 0.0);
        assert_eq!(clamp01(1.7), 1.0);
    }

    #[test]
    fn test_soft_clip_bounded() {
        assert!(soft_clip(100.0) <= 1.0);
        assert!(soft_clip(-100.0) >= -1.0);
        assert!((soft_clip(0.0)).abs() < 1e-9);
    }
}
