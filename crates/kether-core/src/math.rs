//! Mathematical utility functions for DSP.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! # Level Conversions
//!
//! - [`linear_to_db`] - Linear gain to decibels, for peak metering
//!
//! # Saturation
//!
//! - [`soft_clip`] - `tanh` saturation, used by the warmth and purity stages
//!
//! # Utilities
//!
//! - [`wet_dry_mix`] - Linear crossfade
//! - [`flush_denormal`] - Zero out subnormal-range values in feedback paths
//! - [`ms_to_samples`] - Time conversion
//! - [`octaves_to_ratio`] - Exponential pitch/cutoff scaling

use libm::{exp2f, logf, tanhf};

/// Convert linear gain to decibels.
///
/// Inputs at or below `1e-10` are treated as `1e-10` (-200 dB).
///
/// # Example
/// ```rust
/// use kether_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Soft clip using hyperbolic tangent.
///
/// Smooth saturation that approaches ±1 asymptotically.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    tanhf(x)
}

/// Flush values in the subnormal range to zero.
///
/// Recirculating buffers (delay feedback, comb filters, filter integrators)
/// decay toward zero and would otherwise spend a long time in the subnormal
/// range, which is very slow on most CPUs.
#[inline]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Crossfade between dry and wet signals: `dry * (1 - mix) + wet * mix`.
///
/// # Example
/// ```rust
/// use kether_core::wet_dry_mix;
///
/// assert_eq!(wet_dry_mix(1.0, 0.0, 0.0), 1.0);
/// assert_eq!(wet_dry_mix(1.0, 0.0, 1.0), 0.0);
/// ```
#[inline]
pub fn wet_dry_mix(dry: f32, wet: f32, mix: f32) -> f32 {
    dry * (1.0 - mix) + wet * mix
}

/// Convert milliseconds to a (fractional) sample count.
#[inline]
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> f32 {
    ms * sample_rate / 1000.0
}

/// Frequency ratio for an offset in octaves: `2^octaves`.
#[inline]
pub fn octaves_to_ratio(octaves: f32) -> f32 {
    exp2f(octaves)
}
