//! Parameter table for the engine's tunables.
//!
//! Every setter on [`Engine`](crate::Engine) has a [`SynthParam`] entry with
//! a [`ParamSpec`] describing its range, default and a stable string id.
//! Hosts and patch files address parameters through this table with plain
//! `f32` values; enum-valued parameters carry their index.

/// Unit type for formatting a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamUnit {
    /// Hertz
    Hertz,
    /// Milliseconds
    Milliseconds,
    /// Normalized 0.0 to 1.0 amount
    Amount,
    /// Index into a list of choices
    Choice,
    /// Plain count
    Count,
    /// Off / on
    Toggle,
}

impl ParamUnit {
    /// Unit suffix for display.
    pub fn suffix(self) -> &'static str {
        match self {
            ParamUnit::Hertz => " Hz",
            ParamUnit::Milliseconds => " ms",
            _ => "",
        }
    }
}

/// Static description of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Display name.
    pub name: &'static str,
    /// Stable snake-case identifier for presets and patch files.
    pub string_id: &'static str,
    /// Value unit.
    pub unit: ParamUnit,
    /// Minimum plain value.
    pub min: f32,
    /// Maximum plain value.
    pub max: f32,
    /// Value after reset.
    pub default: f32,
    /// Whether only whole-number values are meaningful.
    pub stepped: bool,
}

impl ParamSpec {
    const fn continuous(
        name: &'static str,
        string_id: &'static str,
        unit: ParamUnit,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            string_id,
            unit,
            min,
            max,
            default,
            stepped: false,
        }
    }

    const fn stepped(
        name: &'static str,
        string_id: &'static str,
        unit: ParamUnit,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            string_id,
            unit,
            min: 0.0,
            max,
            default,
            stepped: true,
        }
    }

    /// Whether `value` lies within `[min, max]`.
    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Clamp `value` into `[min, max]`.
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

/// Every engine tunable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SynthParam {
    /// Oscillator waveform index (Sine, Saw, Square, Triangle)
    Waveform,
    /// Pitch offset for new notes, -1 to 1 (ratio `2^(shift × 0.1)`)
    TimbreShift,
    /// Filter cutoff in Hz
    FilterCutoff,
    /// Filter resonance
    FilterResonance,
    /// Envelope attack in ms
    Attack,
    /// Envelope decay in ms
    Decay,
    /// Envelope sustain level
    Sustain,
    /// Envelope release in ms
    Release,
    /// Delay time in ms
    DelayTime,
    /// Delay feedback
    DelayFeedback,
    /// Delay wet/dry mix
    DelayMix,
    /// Reverb wet/dry mix
    ReverbMix,
    /// LFO 1 rate in Hz
    Lfo1Rate,
    /// LFO 1 waveform index
    Lfo1Waveform,
    /// LFO 2 rate in Hz
    Lfo2Rate,
    /// LFO 2 waveform index
    Lfo2Waveform,
    /// Character: brilliance
    Brilliance,
    /// Character: motion
    Motion,
    /// Character: space
    Space,
    /// Character: warmth
    Warmth,
    /// Character: purity
    Purity,
    /// Number of scanned voices
    VoiceCount,
    /// Scale index
    Scale,
    /// Master gain
    Gain,
    /// MPE flag (accepted, not used by the DSP)
    MpeEnabled,
}

impl SynthParam {
    /// Number of parameters.
    pub const COUNT: usize = 25;

    /// All parameters in index order.
    pub const ALL: [SynthParam; Self::COUNT] = [
        SynthParam::Waveform,
        SynthParam::TimbreShift,
        SynthParam::FilterCutoff,
        SynthParam::FilterResonance,
        SynthParam::Attack,
        SynthParam::Decay,
        SynthParam::Sustain,
        SynthParam::Release,
        SynthParam::DelayTime,
        SynthParam::DelayFeedback,
        SynthParam::DelayMix,
        SynthParam::ReverbMix,
        SynthParam::Lfo1Rate,
        SynthParam::Lfo1Waveform,
        SynthParam::Lfo2Rate,
        SynthParam::Lfo2Waveform,
        SynthParam::Brilliance,
        SynthParam::Motion,
        SynthParam::Space,
        SynthParam::Warmth,
        SynthParam::Purity,
        SynthParam::VoiceCount,
        SynthParam::Scale,
        SynthParam::Gain,
        SynthParam::MpeEnabled,
    ];

    /// Parameter at `index`, or `None` when out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Look a parameter up by its string id.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.spec().string_id == id)
    }

    /// Stable string id.
    pub fn id(self) -> &'static str {
        self.spec().string_id
    }

    /// Range, default and metadata.
    pub fn spec(self) -> ParamSpec {
        use ParamUnit::{Amount, Choice, Count, Hertz, Milliseconds, Toggle};
        match self {
            SynthParam::Waveform => ParamSpec::stepped("Waveform", "waveform", Choice, 3.0, 0.0),
            SynthParam::TimbreShift => {
                ParamSpec::continuous("Timbre Shift", "timbre_shift", Amount, -1.0, 1.0, 0.0)
            }
            SynthParam::FilterCutoff => {
                ParamSpec::continuous("Filter Cutoff", "filter_cutoff", Hertz, 20.0, 20000.0, 20000.0)
            }
            SynthParam::FilterResonance => {
                ParamSpec::continuous("Filter Resonance", "filter_resonance", Amount, 0.0, 1.0, 0.0)
            }
            SynthParam::Attack => {
                ParamSpec::continuous("Attack", "attack", Milliseconds, 1.0, 5000.0, 10.0)
            }
            SynthParam::Decay => {
                ParamSpec::continuous("Decay", "decay", Milliseconds, 1.0, 5000.0, 50.0)
            }
            SynthParam::Sustain => {
                ParamSpec::continuous("Sustain", "sustain", Amount, 0.0, 1.0, 0.7)
            }
            SynthParam::Release => {
                ParamSpec::continuous("Release", "release", Milliseconds, 1.0, 5000.0, 200.0)
            }
            SynthParam::DelayTime => {
                ParamSpec::continuous("Delay Time", "delay_time", Milliseconds, 0.0, 2000.0, 250.0)
            }
            SynthParam::DelayFeedback => {
                ParamSpec::continuous("Delay Feedback", "delay_feedback", Amount, 0.0, 0.95, 0.3)
            }
            SynthParam::DelayMix => {
                ParamSpec::continuous("Delay Mix", "delay_mix", Amount, 0.0, 1.0, 0.2)
            }
            SynthParam::ReverbMix => {
                ParamSpec::continuous("Reverb Mix", "reverb_mix", Amount, 0.0, 1.0, 0.0)
            }
            SynthParam::Lfo1Rate => {
                ParamSpec::continuous("LFO 1 Rate", "lfo1_rate", Hertz, 0.01, 20.0, 1.0)
            }
            SynthParam::Lfo1Waveform => {
                ParamSpec::stepped("LFO 1 Waveform", "lfo1_waveform", Choice, 5.0, 0.0)
            }
            SynthParam::Lfo2Rate => {
                ParamSpec::continuous("LFO 2 Rate", "lfo2_rate", Hertz, 0.01, 20.0, 2.0)
            }
            SynthParam::Lfo2Waveform => {
                ParamSpec::stepped("LFO 2 Waveform", "lfo2_waveform", Choice, 5.0, 0.0)
            }
            SynthParam::Brilliance => {
                ParamSpec::continuous("Brilliance", "brilliance", Amount, 0.0, 1.0, 0.5)
            }
            SynthParam::Motion => ParamSpec::continuous("Motion", "motion", Amount, 0.0, 1.0, 0.3),
            SynthParam::Space => ParamSpec::continuous("Space", "space", Amount, 0.0, 1.0, 0.4),
            SynthParam::Warmth => ParamSpec::continuous("Warmth", "warmth", Amount, 0.0, 1.0, 0.6),
            SynthParam::Purity => ParamSpec::continuous("Purity", "purity", Amount, 0.0, 1.0, 0.8),
            SynthParam::VoiceCount => ParamSpec {
                min: 1.0,
                ..ParamSpec::stepped("Voices", "voices", Count, 16.0, 8.0)
            },
            SynthParam::Scale => ParamSpec::stepped("Scale", "scale", Choice, 8.0, 0.0),
            SynthParam::Gain => ParamSpec::continuous("Gain", "gain", Amount, 0.0, 1.0, 0.5),
            SynthParam::MpeEnabled => ParamSpec::stepped("MPE", "mpe", Toggle, 1.0, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_unique_and_round_trip() {
        for (i, p) in SynthParam::ALL.iter().enumerate() {
            assert_eq!(SynthParam::from_id(p.id()), Some(*p));
            assert_eq!(SynthParam::from_index(i), Some(*p));
            for q in &SynthParam::ALL[i + 1..] {
                assert_ne!(p.id(), q.id());
            }
        }
        assert_eq!(SynthParam::from_id("cutoff"), None);
        assert_eq!(SynthParam::from_index(SynthParam::COUNT), None);
    }

    #[test]
    fn test_defaults_within_range() {
        for p in SynthParam::ALL {
            let spec = p.spec();
            assert!(spec.min < spec.max, "{}", spec.name);
            assert!(spec.contains(spec.default), "{} default out of range", spec.name);
        }
    }

    #[test]
    fn test_stepped_choices_match_enums() {
        assert_eq!(SynthParam::Waveform.spec().max as usize + 1, crate::Waveform::ALL.len());
        assert_eq!(SynthParam::Scale.spec().max as usize + 1, crate::Scale::COUNT);
        assert_eq!(
            SynthParam::Lfo1Waveform.spec().max as usize + 1,
            kether_core::LfoWaveform::ALL.len()
        );
        assert_eq!(SynthParam::VoiceCount.spec().min, 1.0);
        assert_eq!(SynthParam::VoiceCount.spec().max as usize, crate::MAX_VOICES);
    }

    #[test]
    fn test_clamp() {
        let spec = SynthParam::DelayFeedback.spec();
        assert_eq!(spec.clamp(2.0), 0.95);
        assert_eq!(ParamUnit::Hertz.suffix(), " Hz");
    }
}
