//! Patch management for the kether synthesizer.
//!
//! A patch is a TOML file holding parameter values keyed by their string ids
//! and, optionally, the modulation routing. Patches are validated against the
//! engine's parameter table before anything is applied.
//!
//! # Features
//!
//! - **Patch files**: Load and save [`PatchConfig`] as TOML
//! - **Validation**: Unknown ids, out-of-range values and bad choice names
//!   are reported as [`ConfigError`]
//! - **Engine bridge**: Apply a patch to an [`Engine`](kether_synth::Engine)
//!   or capture one from it
//! - **Factory patches**: Built-in starting points
//!
//! # Example
//!
//! ```rust
//! use kether_config::{ModSlotConfig, PatchConfig};
//! use kether_synth::{Engine, ModDestination, ModSource, Scale};
//!
//! let patch = PatchConfig::new("Drone")
//!     .with_param("scale", "mongolian_throat")
//!     .with_param("filter_cutoff", 900.0f32)
//!     .with_modulation(ModSlotConfig::new(
//!         ModSource::Lfo1,
//!         ModDestination::FilterCutoff,
//!         0.25,
//!     ));
//!
//! let mut engine = Engine::new(48000.0, 256).unwrap();
//! patch.apply_to(&mut engine).unwrap();
//! assert_eq!(engine.scale(), Scale::MongolianThroat);
//!
//! let text = patch.to_toml().unwrap();
//! assert_eq!(PatchConfig::from_toml(&text).unwrap(), patch);
//! ```

mod error;
mod patch;

/// Factory patches bundled with the library.
pub mod factory;

pub use error::ConfigError;
pub use factory::{FACTORY_PATCH_NAMES, factory_patch, factory_patches, find_patch};
pub use patch::{ModSlotConfig, ParamValue, PatchConfig, ResolvedPatch, choice_names};
