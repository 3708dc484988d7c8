//! Linear ADSR envelope generator.
//!
//! Every stage is a straight-line ramp over a whole number of samples, so the
//! envelope reaches each target exactly and its release is monotonic.

use kether_core::ms_to_samples;

/// ADSR envelope states
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeState {
    /// Envelope is inactive, output is zero.
    #[default]
    Idle,
    /// Ramping 0 → 1.
    Attack,
    /// Ramping 1 → sustain level.
    Decay,
    /// Holding the sustain level while the gate is held.
    Sustain,
    /// Ramping from the level at release down to 0.
    Release,
}

/// Level at or below which a releasing envelope is considered silent.
pub const SILENCE_THRESHOLD: f32 = 0.001;

/// Linear ADSR envelope.
///
/// ## Parameters
/// - `attack_ms`: 0 to any positive value, default 10
/// - `decay_ms`: 0 to any positive value, default 50
/// - `sustain`: 0.0 to 1.0, default 0.7
/// - `release_ms`: 0 to any positive value, default 200
///
/// Stage lengths are `max(1, ms × sample_rate / 1000)` samples.
///
/// # Example
///
/// ```rust
/// use kether_synth::{AdsrEnvelope, EnvelopeState};
///
/// let mut env = AdsrEnvelope::new(48000.0);
/// env.set_attack_ms(5.0);
/// env.gate_on();
///
/// for _ in 0..240 {
///     env.advance();
/// }
/// assert_eq!(env.state(), EnvelopeState::Decay);
///
/// env.gate_off();
/// assert_eq!(env.state(), EnvelopeState::Release);
/// ```
#[derive(Debug, Clone)]
pub struct AdsrEnvelope {
    state: EnvelopeState,
    level: f32,
    sample_rate: f32,

    attack_ms: f32,
    decay_ms: f32,
    sustain: f32,
    release_ms: f32,

    // Stage lengths in samples
    attack_samples: f32,
    decay_samples: f32,
    release_samples: f32,

    /// Samples elapsed in the current stage
    stage_pos: f32,
    /// Level captured at gate off
    release_start: f32,
}

impl Default for AdsrEnvelope {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl AdsrEnvelope {
    /// Create an envelope with 10 ms attack, 50 ms decay, 0.7 sustain and
    /// 200 ms release.
    pub fn new(sample_rate: f32) -> Self {
        let mut env = Self {
            state: EnvelopeState::Idle,
            level: 0.0,
            sample_rate,
            attack_ms: 10.0,
            decay_ms: 50.0,
            sustain: 0.7,
            release_ms: 200.0,
            attack_samples: 1.0,
            decay_samples: 1.0,
            release_samples: 1.0,
            stage_pos: 0.0,
            release_start: 0.0,
        };
        env.recalculate_lengths();
        env
    }

    /// Set attack time in milliseconds.
    pub fn set_attack_ms(&mut self, ms: f32) {
        self.attack_ms = ms.max(0.0);
        self.attack_samples = self.stage_length(self.attack_ms);
    }

    /// Attack time in milliseconds.
    pub fn attack_ms(&self) -> f32 {
        self.attack_ms
    }

    /// Set decay time in milliseconds.
    pub fn set_decay_ms(&mut self, ms: f32) {
        self.decay_ms = ms.max(0.0);
        self.decay_samples = self.stage_length(self.decay_ms);
    }

    /// Decay time in milliseconds.
    pub fn decay_ms(&self) -> f32 {
        self.decay_ms
    }

    /// Set sustain level (0.0 to 1.0).
    pub fn set_sustain(&mut self, level: f32) {
        self.sustain = level.clamp(0.0, 1.0);
    }

    /// Sustain level.
    pub fn sustain(&self) -> f32 {
        self.sustain
    }

    /// Set release time in milliseconds.
    pub fn set_release_ms(&mut self, ms: f32) {
        self.release_ms = ms.max(0.0);
        self.release_samples = self.stage_length(self.release_ms);
    }

    /// Release time in milliseconds.
    pub fn release_ms(&self) -> f32 {
        self.release_ms
    }

    /// Set sample rate, keeping stage times in milliseconds.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_lengths();
    }

    /// Start (or restart) the attack from zero.
    pub fn gate_on(&mut self) {
        self.state = EnvelopeState::Attack;
        self.level = 0.0;
        self.stage_pos = 0.0;
    }

    /// Enter release from the current level. No-op while idle.
    pub fn gate_off(&mut self) {
        if self.state != EnvelopeState::Idle {
            self.state = EnvelopeState::Release;
            self.release_start = self.level;
            self.stage_pos = 0.0;
        }
    }

    /// Force the envelope to idle.
    pub fn reset(&mut self) {
        self.state = EnvelopeState::Idle;
        self.level = 0.0;
        self.stage_pos = 0.0;
        self.release_start = 0.0;
    }

    /// Current state.
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Current level without advancing.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Whether the envelope is producing (or about to produce) sound.
    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle
    }

    /// Advance one sample and return the new level.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        match self.state {
            EnvelopeState::Idle => {
                self.level = 0.0;
            }

            EnvelopeState::Attack => {
                self.stage_pos += 1.0;
                if self.stage_pos >= self.attack_samples {
                    self.level = 1.0;
                    self.enter(EnvelopeState::Decay);
                } else {
                    self.level = self.stage_pos / self.attack_samples;
                }
            }

            EnvelopeState::Decay => {
                self.stage_pos += 1.0;
                if self.stage_pos >= self.decay_samples {
                    self.level = self.sustain;
                    self.enter(EnvelopeState::Sustain);
                } else {
                    let t = self.stage_pos / self.decay_samples;
                    self.level = 1.0 - (1.0 - self.sustain) * t;
                }
            }

            EnvelopeState::Sustain => {
                self.level = self.sustain;
            }

            EnvelopeState::Release => {
                self.stage_pos += 1.0;
                let t = (self.stage_pos / self.release_samples).min(1.0);
                self.level = self.release_start * (1.0 - t);
                if self.level <= SILENCE_THRESHOLD {
                    self.level = 0.0;
                    self.enter(EnvelopeState::Idle);
                }
            }
        }

        self.level
    }

    fn enter(&mut self, state: EnvelopeState) {
        self.state = state;
        self.stage_pos = 0.0;
    }

    fn stage_length(&self, ms: f32) -> f32 {
        ms_to_samples(ms, self.sample_rate).max(1.0)
    }

    fn recalculate_lengths(&mut self) {
        self.attack_samples = self.stage_length(self.attack_ms);
        self.decay_samples = self.stage_length(self.decay_ms);
        self.release_samples = self.stage_length(self.release_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_1k() -> AdsrEnvelope {
        // 1 sample per ms keeps the arithmetic readable
        let mut env = AdsrEnvelope::new(1000.0);
        env.set_attack_ms(10.0);
        env.set_decay_ms(20.0);
        env.set_sustain(0.5);
        env.set_release_ms(40.0);
        env
    }

    #[test]
    fn test_envelope_idle_state() {
        let mut env = AdsrEnvelope::new(48000.0);
        assert_eq!(env.state(), EnvelopeState::Idle);
        for _ in 0..100 {
            assert_eq!(env.advance(), 0.0);
        }
        assert!(!env.is_active());
    }

    #[test]
    fn test_attack_is_linear() {
        let mut env = env_1k();
        env.gate_on();
        for n in 1..10 {
            let level = env.advance();
            assert!((level - n as f32 / 10.0).abs() < 1e-6, "n={n}: {level}");
        }
        assert_eq!(env.advance(), 1.0);
        assert_eq!(env.state(), EnvelopeState::Decay);
    }

    #[test]
    fn test_decay_to_sustain() {
        let mut env = env_1k();
        env.gate_on();
        for _ in 0..10 {
            env.advance();
        }
        let halfway = (0..10).map(|_| env.advance()).last().unwrap();
        assert!((halfway - 0.75).abs() < 1e-6);
        for _ in 0..10 {
            env.advance();
        }
        assert_eq!(env.state(), EnvelopeState::Sustain);
        assert_eq!(env.level(), 0.5);
        for _ in 0..1000 {
            assert_eq!(env.advance(), 0.5);
        }
    }

    #[test]
    fn test_release_from_sustain_is_monotonic() {
        let mut env = env_1k();
        env.gate_on();
        for _ in 0..100 {
            env.advance();
        }
        env.gate_off();
        assert_eq!(env.state(), EnvelopeState::Release);

        let mut prev = env.level();
        let mut samples = 0;
        while env.is_active() {
            let level = env.advance();
            assert!(level <= prev, "release went up: {prev} -> {level}");
            prev = level;
            samples += 1;
            assert!(samples <= 40);
        }
        assert_eq!(env.level(), 0.0);
        assert!(samples >= 39);
    }

    #[test]
    fn test_release_during_attack_starts_from_current_level() {
        let mut env = env_1k();
        env.gate_on();
        for _ in 0..4 {
            env.advance();
        }
        env.gate_off();
        let first = env.advance();
        assert!((first - 0.4 * (1.0 - 1.0 / 40.0)).abs() < 1e-6);
    }

    #[test]
    fn test_immediate_release_goes_idle() {
        let mut env = env_1k();
        env.gate_on();
        env.gate_off();
        assert_eq!(env.advance(), 0.0);
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn test_retrigger_restarts_attack() {
        let mut env = env_1k();
        env.gate_on();
        for _ in 0..15 {
            env.advance();
        }
        env.gate_on();
        assert_eq!(env.state(), EnvelopeState::Attack);
        assert!((env.advance() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_zero_times_take_one_sample() {
        let mut env = AdsrEnvelope::new(44100.0);
        env.set_attack_ms(0.0);
        env.set_decay_ms(0.0);
        env.set_sustain(0.3);
        env.gate_on();
        assert_eq!(env.advance(), 1.0);
        assert!((env.advance() - 0.3).abs() < 1e-6);
        assert_eq!(env.state(), EnvelopeState::Sustain);
    }

    #[test]
    fn test_gate_off_while_idle_is_ignored() {
        let mut env = env_1k();
        env.gate_off();
        assert_eq!(env.state(), EnvelopeState::Idle);
    }

    #[test]
    fn test_sample_rate_rescales_stages() {
        let mut env = env_1k();
        env.set_sample_rate(2000.0);
        env.gate_on();
        for _ in 0..19 {
            env.advance();
        }
        assert_eq!(env.state(), EnvelopeState::Attack);
        env.advance();
        assert_eq!(env.state(), EnvelopeState::Decay);
        assert_eq!(env.attack_ms(), 10.0);
    }
}
