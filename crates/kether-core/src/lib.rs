//! Kether Core - DSP primitives for the kether synthesizer
//!
//! This crate provides the building blocks the synthesis engine is assembled
//! from, designed for real-time audio processing with zero allocation in the
//! audio path.
//!
//! # Core Abstractions
//!
//! - [`Effect`] - Object-safe trait for per-channel sample processors
//! - [`EffectExt`] / [`Chain`] - Static-dispatch effect chaining
//!
//! ## Filters
//!
//! - [`StateVariableFilter`] - Chamberlin 2-pole resonant SVF (low/band/high taps)
//! - [`CombFilter`] - Feedback comb filter for Schroeder reverbs
//! - [`AllpassFilter`] - Schroeder allpass for diffusion
//!
//! ## Delay Lines
//!
//! - [`DelayLine`] - Fixed-capacity ring buffer
//!
//! ## Modulation
//!
//! - [`Lfo`] - Low-frequency oscillator (6 waveforms, bipolar or unipolar)
//!
//! ## Utilities
//!
//! - Math functions: [`soft_clip`], [`wet_dry_mix`], [`linear_to_db`], etc.
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! kether-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use kether_core::{CombFilter, Effect, EffectExt, StateVariableFilter};
//!
//! let mut chain = StateVariableFilter::new(44100.0).chain(CombFilter::new(1557));
//!
//! let mut buffer = [0.0f32; 64];
//! buffer[0] = 1.0;
//! chain.process_block_inplace(&mut buffer);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod allpass;
pub mod comb;
pub mod delay;
pub mod effect;
pub mod lfo;
pub mod math;
pub mod svf;

pub use allpass::AllpassFilter;
pub use comb::CombFilter;
pub use delay::DelayLine;
pub use effect::{Chain, Effect, EffectExt};
pub use lfo::{Lfo, LfoPolarity, LfoWaveform};
pub use math::{
    flush_denormal, linear_to_db, ms_to_samples, octaves_to_ratio, soft_clip,
    wet_dry_mix,
};
pub use svf::StateVariableFilter;
