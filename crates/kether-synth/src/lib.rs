//! Kether Synth - Polyphonic synthesis engine for the kether synthesizer
//!
//! Sixteen pre-allocated voices tuned to pentatonic just-intonation scales,
//! a block-rate modulation matrix, five post-mix character controls, and a
//! per-channel feedback delay and Schroeder reverb.
//!
//! # Core Components
//!
//! ## Tuning
//!
//! - [`Scale`] - Nine five-degree just-intonation scales
//! - [`ScaleSystem`] - Maps note numbers onto the active scale
//!
//! ```rust
//! use kether_synth::{BASE_FREQUENCY, Scale, ScaleSystem};
//!
//! let mut scales = ScaleSystem::new();
//! scales.set_scale(Scale::Celtic);
//! let f = scales.frequency_for_note(12, BASE_FREQUENCY);
//! assert!((f - BASE_FREQUENCY * 2.0).abs() < 1e-3);
//! ```
//!
//! ## Voices
//!
//! - [`Oscillator`] - PolyBLEP sine, saw, square and triangle
//! - [`AdsrEnvelope`] - Linear attack-decay-sustain-release
//! - [`Voice`] - Oscillator → low-pass SVF → envelope
//! - [`VoicePool`] - Fixed pool, first free voice, no stealing
//!
//! ## Modulation
//!
//! - [`ModulationMatrix`] - Eight routing slots evaluated once per block
//! - [`ModSource`] / [`ModDestination`] - Routing endpoints
//!
//! ## Bus Processing
//!
//! - [`CharacterControls`] - Brilliance, motion, space, warmth, purity
//! - [`BusShaper`] / [`PostMixShaper`] - Applies the controls to the mix
//! - [`EffectsChain`] - [`FeedbackDelay`] → [`SchroederReverb`] per channel
//!
//! ## Engine
//!
//! - [`Engine`] - Block processor owning all of the above
//! - [`Command`] - Events and parameter changes applied between blocks
//! - [`SynthParam`] - Parameter table with ranges and string ids
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! kether-synth = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use kether_synth::{Command, Engine, SynthParam};
//!
//! let mut engine = Engine::new(48000.0, 256).unwrap();
//! engine.set_param(SynthParam::ReverbMix, 0.3);
//!
//! let commands = [
//!     Command::NoteOn { note: 48, velocity: 100 },
//!     Command::NoteOn { note: 52, velocity: 100 },
//! ];
//!
//! let mut left = [0.0f32; 256];
//! let mut right = [0.0f32; 256];
//! engine.process_block_with(&commands, &mut [&mut left[..], &mut right[..]]);
//! assert_eq!(engine.active_voice_count(), 2);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod character;
pub mod command;
pub mod effects;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod mod_matrix;
pub mod oscillator;
pub mod params;
pub mod scale;
pub mod voice;
pub mod voice_pool;

pub use character::{BusShaper, CharacterControls, PostMixShaper};
pub use command::{CC_MOD_WHEEL, Command};
pub use effects::{
    BYPASS_THRESHOLD, ChannelEffects, EffectsChain, FeedbackDelay, SchroederReverb,
};
pub use engine::Engine;
pub use envelope::{AdsrEnvelope, EnvelopeState};
pub use error::EngineError;
pub use kether_core::LfoWaveform;
pub use mod_matrix::{
    MOD_SLOTS, ModAccumulators, ModDestination, ModSource, ModulationMatrix, ModulationSlot,
    ModulationValues,
};
pub use oscillator::{Oscillator, Waveform};
pub use params::{ParamSpec, ParamUnit, SynthParam};
pub use scale::{BASE_FREQUENCY, Scale, ScaleSystem};
pub use voice::{Voice, VoiceSettings};
pub use voice_pool::{MAX_VOICES, NoteOnOutcome, VoicePool};
