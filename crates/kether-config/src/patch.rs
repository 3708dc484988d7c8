//! Patch file format and operations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use kether_synth::{
    BusShaper, Command, Engine, LfoWaveform, MOD_SLOTS, ModDestination, ModSource,
    ModulationSlot, ParamUnit, Scale, SynthParam, Waveform,
};

use crate::error::ConfigError;

/// A parameter value as written in a patch file.
///
/// Numbers set the plain value directly. Enum-valued parameters (waveforms,
/// scale) also accept a name such as `"saw"` or `"mongolian_throat"`, and
/// the MPE flag accepts a boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Whole number
    Integer(i64),
    /// Floating-point number
    Float(f64),
    /// Boolean
    Bool(bool),
    /// Choice name
    Text(String),
}

impl ParamValue {
    /// Interpret a command-line string: integer, then float, then boolean,
    /// falling back to a choice name.
    ///
    /// ```rust
    /// use kether_config::ParamValue;
    ///
    /// assert_eq!(ParamValue::parse("6"), ParamValue::Integer(6));
    /// assert_eq!(ParamValue::parse("0.25"), ParamValue::Float(0.25));
    /// assert_eq!(ParamValue::parse("true"), ParamValue::Bool(true));
    /// assert_eq!(ParamValue::parse("saw"), ParamValue::Text("saw".into()));
    /// ```
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if let Ok(i) = s.parse::<i64>() {
            ParamValue::Integer(i)
        } else if let Ok(f) = s.parse::<f64>() {
            ParamValue::Float(f)
        } else if let Ok(b) = s.parse::<bool>() {
            ParamValue::Bool(b)
        } else {
            ParamValue::Text(s.to_string())
        }
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Float(tidy(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// One `[[modulation]]` entry.
///
/// Without an explicit `slot`, an entry fills the slot matching its position
/// in the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModSlotConfig {
    /// Target slot index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<usize>,
    /// Source id (`lfo1`, `lfo2`, `amp_env`, `velocity`, `mod_wheel`).
    pub source: String,
    /// Destination id (`pitch`, `filter_cutoff`, `filter_resonance`,
    /// `amplitude`, `pan`).
    pub destination: String,
    /// Signed depth.
    pub depth: f64,
    /// Whether the slot contributes.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ModSlotConfig {
    /// Create an enabled entry.
    pub fn new(source: ModSource, destination: ModDestination, depth: f32) -> Self {
        Self {
            slot: None,
            source: source.id().to_string(),
            destination: destination.id().to_string(),
            depth: tidy(depth),
            enabled: true,
        }
    }

    /// Pin the entry to a slot index.
    pub fn at_slot(mut self, index: usize) -> Self {
        self.slot = Some(index);
        self
    }

    /// Mark the entry disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Convert to an engine slot, validating both ids.
    pub fn to_slot(&self) -> Result<ModulationSlot, ConfigError> {
        let source = ModSource::from_id(&self.source)
            .ok_or_else(|| ConfigError::UnknownModSource(self.source.clone()))?;
        let destination = ModDestination::from_id(&self.destination)
            .ok_or_else(|| ConfigError::UnknownModDestination(self.destination.clone()))?;
        Ok(ModulationSlot {
            source,
            destination,
            depth: self.depth as f32,
            enabled: self.enabled,
        })
    }
}

/// A synth patch: parameter values and, optionally, the modulation routing.
///
/// Parameters not listed keep whatever value the engine already has. When a
/// `modulation` list is present it defines the whole matrix; slots it does
/// not mention are cleared.
///
/// # TOML Format
///
/// ```toml
/// name = "Steppe Drone"
///
/// [params]
/// scale = "mongolian_throat"
/// waveform = "saw"
/// filter_cutoff = 900.0
/// voices = 6
///
/// [[modulation]]
/// source = "lfo1"
/// destination = "filter_cutoff"
/// depth = 0.25
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchConfig {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Parameter values keyed by string id.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,

    /// Modulation routing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modulation: Option<Vec<ModSlotConfig>>,
}

/// A validated patch, ready to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPatch {
    /// Plain values in parameter id order.
    pub params: Vec<(SynthParam, f32)>,
    /// Complete matrix, when the patch defines one.
    pub modulation: Option<[ModulationSlot; MOD_SLOTS]>,
}

impl ResolvedPatch {
    /// Commands that apply this patch through [`Engine::apply`].
    pub fn commands(&self) -> Vec<Command> {
        let params = self
            .params
            .iter()
            .map(|&(param, value)| Command::SetParam { param, value });
        let slots = self.modulation.iter().flat_map(|slots| {
            slots
                .iter()
                .enumerate()
                .map(|(index, &slot)| Command::SetModSlot { index, slot })
        });
        params.chain(slots).collect()
    }

    /// Apply every value to `engine`.
    pub fn apply_to<B: BusShaper>(&self, engine: &mut Engine<B>) {
        for command in self.commands() {
            engine.apply(command);
        }
    }
}

impl PatchConfig {
    /// Create an empty patch.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Add a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set a parameter by string id.
    pub fn with_param(mut self, id: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(id.into(), value.into());
        self
    }

    /// Append a modulation entry.
    pub fn with_modulation(mut self, slot: ModSlotConfig) -> Self {
        self.modulation.get_or_insert_with(Vec::new).push(slot);
        self
    }

    /// Load a patch from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading patch");
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse a patch from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the patch to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::debug!(path = %path.display(), "saved patch");
        Ok(())
    }

    /// Serialize the patch to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate every entry and convert to engine values.
    pub fn resolve(&self) -> Result<ResolvedPatch, ConfigError> {
        let params = self
            .params
            .iter()
            .map(|(id, value)| resolve_param(id, value))
            .collect::<Result<Vec<_>, _>>()?;

        let modulation = match &self.modulation {
            Some(entries) => {
                let mut slots = [ModulationSlot::EMPTY; MOD_SLOTS];
                for (position, entry) in entries.iter().enumerate() {
                    let index = entry.slot.unwrap_or(position);
                    let slot = slots.get_mut(index).ok_or(ConfigError::SlotIndex {
                        index,
                        max: MOD_SLOTS - 1,
                    })?;
                    *slot = entry.to_slot()?;
                }
                Some(slots)
            }
            None => None,
        };

        Ok(ResolvedPatch { params, modulation })
    }

    /// Check the patch without applying it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolve().map(|_| ())
    }

    /// Validate, then apply to `engine`. Nothing is applied when any entry
    /// is invalid.
    pub fn apply_to<B: BusShaper>(&self, engine: &mut Engine<B>) -> Result<(), ConfigError> {
        let resolved = self.resolve()?;
        resolved.apply_to(engine);
        tracing::info!(
            name = self.name.as_deref().unwrap_or("untitled"),
            params = resolved.params.len(),
            modulation = resolved.modulation.is_some(),
            "applied patch"
        );
        Ok(())
    }

    /// Capture every parameter and the full modulation matrix of `engine`.
    pub fn from_engine<B: BusShaper>(name: impl Into<String>, engine: &Engine<B>) -> Self {
        let params = SynthParam::ALL
            .iter()
            .map(|&param| (param.id().to_string(), capture_param(param, engine.param(param))))
            .collect();

        let modulation = engine
            .mod_matrix()
            .slots()
            .iter()
            .enumerate()
            .filter(|(_, slot)| **slot != ModulationSlot::EMPTY)
            .map(|(index, slot)| ModSlotConfig {
                slot: Some(index),
                source: slot.source.id().to_string(),
                destination: slot.destination.id().to_string(),
                depth: tidy(slot.depth),
                enabled: slot.enabled,
            })
            .collect();

        Self {
            name: Some(name.into()),
            description: None,
            params,
            modulation: Some(modulation),
        }
    }
}

fn resolve_param(id: &str, value: &ParamValue) -> Result<(SynthParam, f32), ConfigError> {
    let param = SynthParam::from_id(id).ok_or_else(|| ConfigError::UnknownParam(id.to_string()))?;
    let spec = param.spec();

    let plain = match value {
        ParamValue::Integer(i) => *i as f32,
        ParamValue::Float(f) => *f as f32,
        ParamValue::Bool(b) => {
            if spec.unit != ParamUnit::Toggle {
                return Err(ConfigError::invalid_value(id, "expected a number"));
            }
            if *b { 1.0 } else { 0.0 }
        }
        ParamValue::Text(name) => {
            let choices = choice_names(param)
                .ok_or_else(|| ConfigError::invalid_value(id, "expected a number"))?;
            let wanted = normalize(name);
            let index = choices
                .iter()
                .position(|choice| normalize(choice) == wanted)
                .ok_or_else(|| ConfigError::UnknownChoice {
                    param: id.to_string(),
                    value: name.clone(),
                })?;
            index as f32
        }
    };

    if !plain.is_finite() || !spec.contains(plain) {
        return Err(ConfigError::OutOfRange {
            param: id.to_string(),
            value: plain,
            min: spec.min,
            max: spec.max,
        });
    }
    if spec.stepped && plain.fract() != 0.0 {
        return Err(ConfigError::invalid_value(id, "expected a whole number"));
    }

    Ok((param, plain))
}

/// Display names of an enum-valued parameter's choices, in index order.
pub fn choice_names(param: SynthParam) -> Option<Vec<&'static str>> {
    match param {
        SynthParam::Waveform => Some(Waveform::ALL.iter().map(|w| w.name()).collect()),
        SynthParam::Lfo1Waveform | SynthParam::Lfo2Waveform => {
            Some(LfoWaveform::ALL.iter().map(|w| w.name()).collect())
        }
        SynthParam::Scale => Some(Scale::ALL.iter().map(|s| s.name()).collect()),
        _ => None,
    }
}

fn capture_param(param: SynthParam, value: f32) -> ParamValue {
    if let Some(choices) = choice_names(param)
        && let Some(name) = choices.get(value as usize)
    {
        return ParamValue::Text(normalize(name));
    }
    match param.spec().unit {
        ParamUnit::Toggle => ParamValue::Bool(value >= 0.5),
        ParamUnit::Count => ParamValue::Integer(value as i64),
        _ => ParamValue::from(value),
    }
}

/// Lowercase snake-case form used to match choice names.
fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

/// Widen an `f32` to the shortest `f64` that prints the same.
fn tidy(value: f32) -> f64 {
    value.to_string().parse().unwrap_or(f64::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_value_types() {
        let patch = PatchConfig::from_toml(
            r#"
            name = "Mixed"

            [params]
            filter_cutoff = 1200
            sustain = 0.5
            scale = "Mongolian Throat"
            waveform = "saw"
            mpe = true
            "#,
        )
        .unwrap();

        assert_eq!(patch.name.as_deref(), Some("Mixed"));
        assert_eq!(patch.params["filter_cutoff"], ParamValue::Integer(1200));
        assert_eq!(patch.params["mpe"], ParamValue::Bool(true));

        let resolved = patch.resolve().unwrap();
        assert!(resolved.params.contains(&(SynthParam::FilterCutoff, 1200.0)));
        assert!(resolved.params.contains(&(SynthParam::Scale, 5.0)));
        assert!(resolved.params.contains(&(SynthParam::Waveform, 1.0)));
        assert!(resolved.params.contains(&(SynthParam::MpeEnabled, 1.0)));
        assert_eq!(resolved.modulation, None);
    }

    #[test]
    fn test_scale_by_id_or_index() {
        let by_id = PatchConfig::new("a").with_param("scale", "nordic_aurora");
        let by_index = PatchConfig::new("b").with_param("scale", 8i64);
        assert_eq!(
            by_id.resolve().unwrap().params,
            by_index.resolve().unwrap().params
        );
    }

    #[test]
    fn test_unknown_param_rejected() {
        let patch = PatchConfig::new("x").with_param("cutoff", 100.0f32);
        assert!(matches!(patch.validate(), Err(ConfigError::UnknownParam(id)) if id == "cutoff"));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let patch = PatchConfig::new("x").with_param("delay_feedback", 0.99f32);
        assert!(matches!(
            patch.validate(),
            Err(ConfigError::OutOfRange { ref param, max, .. }) if param == "delay_feedback" && max == 0.95
        ));
    }

    #[test]
    fn test_choice_errors() {
        let unknown = PatchConfig::new("x").with_param("waveform", "pulse");
        assert!(matches!(
            unknown.validate(),
            Err(ConfigError::UnknownChoice { .. })
        ));

        let text_for_number = PatchConfig::new("x").with_param("gain", "loud");
        assert!(matches!(
            text_for_number.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        let fractional = PatchConfig::new("x").with_param("voices", 2.5f32);
        assert!(matches!(
            fractional.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));

        let bool_for_number = PatchConfig::new("x").with_param("sustain", true);
        assert!(matches!(
            bool_for_number.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_lfo_waveform_names() {
        let patch = PatchConfig::new("x")
            .with_param("lfo1_waveform", "saw_up")
            .with_param("lfo2_waveform", "Random");
        let params = patch.resolve().unwrap().params;
        assert!(params.contains(&(SynthParam::Lfo1Waveform, 2.0)));
        assert!(params.contains(&(SynthParam::Lfo2Waveform, 5.0)));
    }

    #[test]
    fn test_modulation_positions_and_slots() {
        let patch = PatchConfig::new("mod")
            .with_modulation(ModSlotConfig::new(
                ModSource::Lfo1,
                ModDestination::FilterCutoff,
                0.25,
            ))
            .with_modulation(
                ModSlotConfig::new(ModSource::ModWheel, ModDestination::Pan, -0.5)
                    .at_slot(6)
                    .disabled(),
            );
        let slots = patch.resolve().unwrap().modulation.unwrap();

        assert_eq!(
            slots[0],
            ModulationSlot::new(ModSource::Lfo1, ModDestination::FilterCutoff, 0.25)
        );
        assert_eq!(slots[1], ModulationSlot::EMPTY);
        assert_eq!(
            slots[6],
            ModulationSlot::new(ModSource::ModWheel, ModDestination::Pan, -0.5).disabled()
        );
    }

    #[test]
    fn test_modulation_errors() {
        let bad_slot = PatchConfig::new("x").with_modulation(
            ModSlotConfig::new(ModSource::Lfo1, ModDestination::Pitch, 0.1).at_slot(MOD_SLOTS),
        );
        assert!(matches!(
            bad_slot.validate(),
            Err(ConfigError::SlotIndex { index: 8, max: 7 })
        ));

        let bad_source = PatchConfig::from_toml(
            r#"
            [[modulation]]
            source = "aftertouch"
            destination = "pitch"
            depth = 0.1
            "#,
        )
        .unwrap();
        assert!(matches!(
            bad_source.validate(),
            Err(ConfigError::UnknownModSource(s)) if s == "aftertouch"
        ));
    }

    #[test]
    fn test_empty_modulation_list_clears_matrix() {
        let patch = PatchConfig::from_toml("modulation = []").unwrap();
        let slots = patch.resolve().unwrap().modulation.unwrap();
        assert!(slots.iter().all(|s| *s == ModulationSlot::EMPTY));
    }

    #[test]
    fn test_commands_cover_params_and_all_slots() {
        let patch = PatchConfig::new("x")
            .with_param("gain", 0.8f32)
            .with_modulation(ModSlotConfig::new(
                ModSource::Lfo2,
                ModDestination::FilterResonance,
                0.2,
            ));
        let commands = patch.resolve().unwrap().commands();
        assert_eq!(commands.len(), 1 + MOD_SLOTS);
        assert_eq!(
            commands[0],
            Command::SetParam {
                param: SynthParam::Gain,
                value: 0.8
            }
        );
    }

    #[test]
    fn test_to_toml_is_tidy() {
        let patch = PatchConfig::new("Tidy").with_param("sustain", 0.1f32);
        let text = patch.to_toml().unwrap();
        assert!(text.contains("sustain = 0.1\n"), "{text}");
    }

    #[test]
    fn test_toml_round_trip() {
        let patch = PatchConfig::new("Round Trip")
            .with_description("every value type")
            .with_param("scale", "celtic")
            .with_param("voices", 4i64)
            .with_param("mpe", false)
            .with_param("release", 650.0f32)
            .with_modulation(ModSlotConfig::new(
                ModSource::Lfo1,
                ModDestination::FilterCutoff,
                0.3,
            ));
        let parsed = PatchConfig::from_toml(&patch.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, patch);
    }
}
