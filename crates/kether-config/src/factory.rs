//! Factory patches bundled with the library.
//!
//! These are embedded at compile time and always available without any
//! files on disk.

use std::path::Path;

use crate::error::ConfigError;
use crate::patch::PatchConfig;

/// Identifiers of the factory patches.
pub static FACTORY_PATCH_NAMES: &[&str] = &["init", "temple_bells", "steppe_drone", "aurora_pad"];

static FACTORY_PATCHES_TOML: &[(&str, &str)] = &[
    ("init", INIT_PATCH),
    ("temple_bells", TEMPLE_BELLS_PATCH),
    ("steppe_drone", STEPPE_DRONE_PATCH),
    ("aurora_pad", AURORA_PAD_PATCH),
];

/// Engine defaults.
const INIT_PATCH: &str = r#"
name = "Init"
description = "Engine defaults"

[params]
"#;

const TEMPLE_BELLS_PATCH: &str = r#"
name = "Temple Bells"
description = "Struck triangle tones in the Yo scale with a long reverb tail"

[params]
scale = "japanese_yo"
waveform = "triangle"
attack = 2.0
decay = 800.0
sustain = 0.0
release = 1200.0
delay_time = 375.0
delay_feedback = 0.3
delay_mix = 0.15
reverb_mix = 0.35
brilliance = 0.7
purity = 1.0
"#;

const STEPPE_DRONE_PATCH: &str = r#"
name = "Steppe Drone"
description = "Slow filtered saw drone over the throat-singing scale"

[params]
scale = "mongolian_throat"
waveform = "saw"
filter_cutoff = 900.0
filter_resonance = 0.4
attack = 400.0
sustain = 0.9
release = 2000.0
lfo1_rate = 0.2
motion = 0.6
warmth = 0.8
voices = 6

[[modulation]]
source = "mod_wheel"
destination = "filter_cutoff"
depth = 0.5

[[modulation]]
source = "lfo1"
destination = "filter_cutoff"
depth = 0.25
"#;

const AURORA_PAD_PATCH: &str = r#"
name = "Aurora Pad"
description = "Wide square-wave pad with echoes and a shimmering filter"

[params]
scale = "nordic_aurora"
waveform = "square"
filter_cutoff = 2500.0
attack = 800.0
sustain = 0.8
release = 3000.0
delay_time = 400.0
delay_feedback = 0.4
delay_mix = 0.25
reverb_mix = 0.5
lfo2_rate = 0.7
lfo2_waveform = "triangle"
space = 0.8

[[modulation]]
source = "lfo1"
destination = "filter_cutoff"
depth = 0.15

[[modulation]]
source = "lfo2"
destination = "filter_resonance"
depth = 0.2
"#;

/// All factory patches, in [`FACTORY_PATCH_NAMES`] order.
pub fn factory_patches() -> Vec<PatchConfig> {
    FACTORY_PATCHES_TOML
        .iter()
        .filter_map(|(_, toml)| PatchConfig::from_toml(toml).ok())
        .collect()
}

/// Look up a factory patch by identifier or display name, ignoring case.
///
/// ```rust
/// use kether_config::factory_patch;
///
/// let patch = factory_patch("Steppe Drone").unwrap();
/// assert_eq!(patch.name.as_deref(), Some("Steppe Drone"));
/// assert!(factory_patch("lead").is_none());
/// ```
pub fn factory_patch(name: &str) -> Option<PatchConfig> {
    let name_lower = name.to_lowercase();

    FACTORY_PATCHES_TOML.iter().find_map(|(id, toml)| {
        let patch = PatchConfig::from_toml(toml).ok()?;
        let display = patch.name.as_deref().map(str::to_lowercase);
        (*id == name_lower || display.as_deref() == Some(name_lower.as_str())).then_some(patch)
    })
}

/// Load a patch from a file path, falling back to the factory patches.
pub fn find_patch(name_or_path: &str) -> Result<PatchConfig, ConfigError> {
    let path = Path::new(name_or_path);
    if path.is_file() {
        return PatchConfig::load(path);
    }

    factory_patch(name_or_path).ok_or_else(|| ConfigError::PatchNotFound(name_or_path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kether_synth::{Engine, Scale, SynthParam, Waveform};

    #[test]
    fn test_all_factory_patches_valid() {
        for (name, toml) in FACTORY_PATCHES_TOML {
            let patch = PatchConfig::from_toml(toml)
                .unwrap_or_else(|e| panic!("factory patch '{name}' should parse: {e}"));
            assert!(patch.name.is_some(), "{name} has no name");
            assert!(patch.description.is_some(), "{name} has no description");
            patch
                .validate()
                .unwrap_or_else(|e| panic!("factory patch '{name}' invalid: {e}"));
        }
        assert_eq!(factory_patches().len(), FACTORY_PATCH_NAMES.len());
    }

    #[test]
    fn test_names_match_table() {
        let ids: Vec<_> = FACTORY_PATCHES_TOML.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, FACTORY_PATCH_NAMES);
    }

    #[test]
    fn test_factory_patch_lookup() {
        assert!(factory_patch("init").is_some());
        assert!(factory_patch("TEMPLE_BELLS").is_some());
        assert!(factory_patch("aurora pad").is_some());
        assert!(factory_patch("nonexistent").is_none());
    }

    #[test]
    fn test_delay_loops_stay_below_unity() {
        for patch in factory_patches() {
            let mut engine = Engine::new(48000.0, 256).unwrap();
            patch.apply_to(&mut engine).unwrap();
            let fx = engine.param(SynthParam::DelayMix) + engine.param(SynthParam::DelayFeedback);
            assert!(fx < 1.0, "{:?}", patch.name);
        }
    }

    #[test]
    fn test_steppe_drone_applies() {
        let mut engine = Engine::new(48000.0, 256).unwrap();
        factory_patch("steppe_drone")
            .unwrap()
            .apply_to(&mut engine)
            .unwrap();

        assert_eq!(engine.scale(), Scale::MongolianThroat);
        assert_eq!(engine.waveform(), Waveform::Saw);
        assert_eq!(engine.param(SynthParam::VoiceCount), 6.0);
        assert_eq!(engine.mod_matrix().slots()[1].depth, 0.25);
        assert!(!engine.mod_matrix().slots()[2].enabled);
    }

    #[test]
    fn test_find_patch_missing() {
        assert!(matches!(
            find_patch("/no/such/patch.toml"),
            Err(ConfigError::PatchNotFound(_))
        ));
        assert!(find_patch("init").is_ok());
    }
}
