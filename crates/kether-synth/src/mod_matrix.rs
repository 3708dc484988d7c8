//! Block-rate modulation matrix.
//!
//! A fixed table of [`MOD_SLOTS`] routings, each `(source, destination,
//! depth, enabled)`. The matrix is evaluated once per audio block: every
//! enabled slot with a block-rate source adds `source × depth` to its
//! destination's accumulator.
//!
//! Velocity and the amplitude envelope are per-voice sources. They have
//! routable slots and value fields, but block-rate evaluation skips them;
//! summing them per voice is not implemented.

/// Number of slots in the matrix.
pub const MOD_SLOTS: usize = 8;

/// Modulation source identifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModSource {
    /// Unrouted slot.
    #[default]
    None,
    /// LFO 1 (-1 to 1)
    Lfo1,
    /// LFO 2 (-1 to 1)
    Lfo2,
    /// Amplitude envelope (0 to 1, per voice)
    AmpEnv,
    /// Note velocity (0 to 1, per voice)
    Velocity,
    /// Mod wheel, CC1 (0 to 1)
    ModWheel,
}

impl ModSource {
    /// All sources in index order.
    pub const ALL: [ModSource; 6] = [
        ModSource::None,
        ModSource::Lfo1,
        ModSource::Lfo2,
        ModSource::AmpEnv,
        ModSource::Velocity,
        ModSource::ModWheel,
    ];

    /// Whether the source has one value per block (as opposed to one per
    /// voice).
    pub fn is_block_rate(self) -> bool {
        matches!(self, ModSource::Lfo1 | ModSource::Lfo2 | ModSource::ModWheel)
    }

    /// Stable identifier, used by patch files.
    pub fn id(self) -> &'static str {
        match self {
            ModSource::None => "none",
            ModSource::Lfo1 => "lfo1",
            ModSource::Lfo2 => "lfo2",
            ModSource::AmpEnv => "amp_env",
            ModSource::Velocity => "velocity",
            ModSource::ModWheel => "mod_wheel",
        }
    }

    /// Look a source up by its [`id`](Self::id).
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.id() == id)
    }
}

/// Modulation destination identifiers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModDestination {
    /// Unrouted slot.
    #[default]
    None,
    /// Oscillator pitch (accumulated, not applied)
    Pitch,
    /// Filter cutoff, ±4 octaves at full scale
    FilterCutoff,
    /// Filter resonance, additive
    FilterResonance,
    /// Voice amplitude (accumulated, not applied)
    Amplitude,
    /// Stereo position (accumulated, not applied)
    Pan,
}

impl ModDestination {
    /// All destinations in index order.
    pub const ALL: [ModDestination; 6] = [
        ModDestination::None,
        ModDestination::Pitch,
        ModDestination::FilterCutoff,
        ModDestination::FilterResonance,
        ModDestination::Amplitude,
        ModDestination::Pan,
    ];

    /// Stable identifier, used by patch files.
    pub fn id(self) -> &'static str {
        match self {
            ModDestination::None => "none",
            ModDestination::Pitch => "pitch",
            ModDestination::FilterCutoff => "filter_cutoff",
            ModDestination::FilterResonance => "filter_resonance",
            ModDestination::Amplitude => "amplitude",
            ModDestination::Pan => "pan",
        }
    }

    /// Look a destination up by its [`id`](Self::id).
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.id() == id)
    }
}

/// One row of the matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ModulationSlot {
    /// Where the value comes from
    pub source: ModSource,
    /// What it modulates
    pub destination: ModDestination,
    /// Signed scale applied to the source value
    pub depth: f32,
    /// Disabled slots contribute nothing
    pub enabled: bool,
}

impl ModulationSlot {
    /// An unrouted, disabled slot.
    pub const EMPTY: ModulationSlot = ModulationSlot {
        source: ModSource::None,
        destination: ModDestination::None,
        depth: 0.0,
        enabled: false,
    };

    /// Create an enabled slot.
    pub fn new(source: ModSource, destination: ModDestination, depth: f32) -> Self {
        Self {
            source,
            destination,
            depth,
            enabled: true,
        }
    }

    /// Same slot with `enabled` cleared.
    pub fn disabled(self) -> Self {
        Self {
            enabled: false,
            ..self
        }
    }

    /// Whether the slot can contribute to any destination.
    pub fn is_routed(&self) -> bool {
        self.enabled && self.source != ModSource::None && self.destination != ModDestination::None
    }
}

/// Current source values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModulationValues {
    /// LFO 1 value (-1 to 1)
    pub lfo1: f32,
    /// LFO 2 value (-1 to 1)
    pub lfo2: f32,
    /// Amplitude envelope (0 to 1, reserved)
    pub amp_env: f32,
    /// Velocity (0 to 1, reserved)
    pub velocity: f32,
    /// Mod wheel (0 to 1)
    pub mod_wheel: f32,
}

impl ModulationValues {
    /// Value for a specific source. [`ModSource::None`] reads as 0.
    pub fn get(&self, source: ModSource) -> f32 {
        match source {
            ModSource::None => 0.0,
            ModSource::Lfo1 => self.lfo1,
            ModSource::Lfo2 => self.lfo2,
            ModSource::AmpEnv => self.amp_env,
            ModSource::Velocity => self.velocity,
            ModSource::ModWheel => self.mod_wheel,
        }
    }

    /// Set value for a specific source. Setting [`ModSource::None`] is ignored.
    pub fn set(&mut self, source: ModSource, value: f32) {
        match source {
            ModSource::None => {}
            ModSource::Lfo1 => self.lfo1 = value,
            ModSource::Lfo2 => self.lfo2 = value,
            ModSource::AmpEnv => self.amp_env = value,
            ModSource::Velocity => self.velocity = value,
            ModSource::ModWheel => self.mod_wheel = value,
        }
    }
}

/// Per-destination sums produced by one evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModAccumulators {
    /// Pitch accumulator
    pub pitch: f32,
    /// Filter cutoff accumulator, in octaves / 4
    pub filter_cutoff: f32,
    /// Filter resonance accumulator
    pub filter_resonance: f32,
    /// Amplitude accumulator
    pub amplitude: f32,
    /// Pan accumulator
    pub pan: f32,
}

impl ModAccumulators {
    /// Accumulated value for a destination.
    pub fn get(&self, destination: ModDestination) -> f32 {
        match destination {
            ModDestination::None => 0.0,
            ModDestination::Pitch => self.pitch,
            ModDestination::FilterCutoff => self.filter_cutoff,
            ModDestination::FilterResonance => self.filter_resonance,
            ModDestination::Amplitude => self.amplitude,
            ModDestination::Pan => self.pan,
        }
    }

    fn add(&mut self, destination: ModDestination, amount: f32) {
        match destination {
            ModDestination::None => {}
            ModDestination::Pitch => self.pitch += amount,
            ModDestination::FilterCutoff => self.filter_cutoff += amount,
            ModDestination::FilterResonance => self.filter_resonance += amount,
            ModDestination::Amplitude => self.amplitude += amount,
            ModDestination::Pan => self.pan += amount,
        }
    }
}

/// Fixed-size modulation routing table.
///
/// # Example
///
/// ```rust
/// use kether_synth::{ModDestination, ModSource, ModulationMatrix, ModulationSlot, ModulationValues};
///
/// let mut matrix = ModulationMatrix::empty();
/// matrix.set_slot(0, ModulationSlot::new(ModSource::Lfo1, ModDestination::FilterCutoff, 0.5));
///
/// let values = ModulationValues { lfo1: 1.0, ..Default::default() };
/// let mods = matrix.evaluate(&values);
/// assert_eq!(mods.filter_cutoff, 0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ModulationMatrix {
    slots: [ModulationSlot; MOD_SLOTS],
}

impl Default for ModulationMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl ModulationMatrix {
    /// Default routings installed at reset.
    ///
    /// | Slot | Source | Destination | Depth | Enabled |
    /// |------|--------|-------------|-------|---------|
    /// | 0 | Mod wheel | Filter cutoff | 0.5 | yes |
    /// | 1 | LFO 1 | Filter cutoff | 0.1 | yes |
    /// | 2 | LFO 2 | Pitch | 0.05 | no |
    /// | 3 | Velocity | Amplitude | 1.0 | yes (per-voice, skipped) |
    /// | 4-7 | none | none | 0 | no |
    pub const DEFAULT_SLOTS: [ModulationSlot; MOD_SLOTS] = [
        ModulationSlot {
            source: ModSource::ModWheel,
            destination: ModDestination::FilterCutoff,
            depth: 0.5,
            enabled: true,
        },
        ModulationSlot {
            source: ModSource::Lfo1,
            destination: ModDestination::FilterCutoff,
            depth: 0.1,
            enabled: true,
        },
        ModulationSlot {
            source: ModSource::Lfo2,
            destination: ModDestination::Pitch,
            depth: 0.05,
            enabled: false,
        },
        ModulationSlot {
            source: ModSource::Velocity,
            destination: ModDestination::Amplitude,
            depth: 1.0,
            enabled: true,
        },
        ModulationSlot::EMPTY,
        ModulationSlot::EMPTY,
        ModulationSlot::EMPTY,
        ModulationSlot::EMPTY,
    ];

    /// Matrix populated with [`DEFAULT_SLOTS`](Self::DEFAULT_SLOTS).
    pub fn new() -> Self {
        Self {
            slots: Self::DEFAULT_SLOTS,
        }
    }

    /// Matrix with every slot empty.
    pub fn empty() -> Self {
        Self {
            slots: [ModulationSlot::EMPTY; MOD_SLOTS],
        }
    }

    /// Restore the default routings.
    pub fn reset(&mut self) {
        self.slots = Self::DEFAULT_SLOTS;
    }

    /// Replace a slot. Returns `false` (and changes nothing) when `index` is
    /// out of range.
    pub fn set_slot(&mut self, index: usize, slot: ModulationSlot) -> bool {
        match self.slots.get_mut(index) {
            Some(existing) => {
                *existing = slot;
                true
            }
            None => false,
        }
    }

    /// Slot at `index`.
    pub fn slot(&self, index: usize) -> Option<&ModulationSlot> {
        self.slots.get(index)
    }

    /// All slots in order.
    pub fn slots(&self) -> &[ModulationSlot; MOD_SLOTS] {
        &self.slots
    }

    /// Sum block-rate contributions per destination.
    pub fn evaluate(&self, values: &ModulationValues) -> ModAccumulators {
        let mut acc = ModAccumulators::default();
        for slot in &self.slots {
            if !slot.is_routed() || !slot.source.is_block_rate() {
                continue;
            }
            acc.add(slot.destination, values.get(slot.source) * slot.depth);
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> ModulationValues {
        ModulationValues {
            lfo1: 0.5,
            lfo2: -1.0,
            amp_env: 1.0,
            velocity: 1.0,
            mod_wheel: 0.25,
        }
    }

    #[test]
    fn test_defaults() {
        let matrix = ModulationMatrix::new();
        let mods = matrix.evaluate(&values());
        // mod wheel 0.25 × 0.5 + lfo1 0.5 × 0.1
        assert!((mods.filter_cutoff - 0.175).abs() < 1e-6);
        assert_eq!(mods.pitch, 0.0, "LFO2 → pitch is disabled by default");
        assert_eq!(mods.amplitude, 0.0, "velocity is a per-voice source");
    }

    #[test]
    fn test_disabled_and_unrouted_slots_contribute_nothing() {
        let mut matrix = ModulationMatrix::empty();
        matrix.set_slot(
            0,
            ModulationSlot::new(ModSource::Lfo1, ModDestination::Pan, 1.0).disabled(),
        );
        matrix.set_slot(1, ModulationSlot::new(ModSource::None, ModDestination::Pan, 1.0));
        matrix.set_slot(2, ModulationSlot::new(ModSource::Lfo1, ModDestination::None, 1.0));
        assert_eq!(matrix.evaluate(&values()), ModAccumulators::default());
    }

    #[test]
    fn test_per_voice_sources_are_skipped() {
        let mut matrix = ModulationMatrix::empty();
        matrix.set_slot(0, ModulationSlot::new(ModSource::AmpEnv, ModDestination::FilterCutoff, 1.0));
        matrix.set_slot(1, ModulationSlot::new(ModSource::Velocity, ModDestination::Pitch, 1.0));
        assert_eq!(matrix.evaluate(&values()), ModAccumulators::default());
        assert!(!ModSource::AmpEnv.is_block_rate());
        assert!(ModSource::ModWheel.is_block_rate());
    }

    #[test]
    fn test_contributions_sum_per_destination() {
        let mut matrix = ModulationMatrix::empty();
        matrix.set_slot(0, ModulationSlot::new(ModSource::Lfo1, ModDestination::FilterResonance, 0.4));
        matrix.set_slot(1, ModulationSlot::new(ModSource::Lfo2, ModDestination::FilterResonance, 0.2));
        matrix.set_slot(7, ModulationSlot::new(ModSource::ModWheel, ModDestination::Pan, -2.0));
        let mods = matrix.evaluate(&values());
        assert!((mods.filter_resonance - 0.0).abs() < 1e-6);
        assert!((mods.pan - (-0.5)).abs() < 1e-6);
        assert_eq!(mods.get(ModDestination::Pan), mods.pan);
    }

    #[test]
    fn test_set_slot_out_of_range() {
        let mut matrix = ModulationMatrix::new();
        assert!(!matrix.set_slot(MOD_SLOTS, ModulationSlot::EMPTY));
        assert_eq!(matrix, ModulationMatrix::new());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut matrix = ModulationMatrix::new();
        matrix.set_slot(0, ModulationSlot::EMPTY);
        matrix.reset();
        assert_eq!(matrix.slots(), &ModulationMatrix::DEFAULT_SLOTS);
    }

    #[test]
    fn test_ids_round_trip() {
        for s in ModSource::ALL {
            assert_eq!(ModSource::from_id(s.id()), Some(s));
        }
        for d in ModDestination::ALL {
            assert_eq!(ModDestination::from_id(d.id()), Some(d));
        }
        assert_eq!(ModSource::from_id("aftertouch"), None);
    }

    #[test]
    fn test_values_get_set() {
        let mut v = ModulationValues::default();
        v.set(ModSource::ModWheel, 0.8);
        v.set(ModSource::None, 5.0);
        assert_eq!(v.get(ModSource::ModWheel), 0.8);
        assert_eq!(v.get(ModSource::None), 0.0);
    }
}
