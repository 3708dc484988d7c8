//! Low Frequency Oscillator for modulation sources.
//!
//! Free-running phase accumulator producing six waveform shapes, with a
//! bipolar or unipolar output range.

use core::f32::consts::PI;
use libm::sinf;

/// Lowest supported LFO rate in Hz.
pub const MIN_RATE_HZ: f32 = 0.01;

/// Highest supported LFO rate in Hz.
pub const MAX_RATE_HZ: f32 = 20.0;

/// LFO waveform type
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LfoWaveform {
    /// Smooth sinusoid.
    #[default]
    Sine,
    /// Linear up/down ramps.
    Triangle,
    /// Rising ramp with an abrupt reset.
    SawUp,
    /// Falling ramp with an abrupt reset.
    SawDown,
    /// Binary high/low.
    Square,
    /// A new random value on every cycle, held until the next.
    SampleAndHold,
}

impl LfoWaveform {
    /// All waveforms in index order.
    pub const ALL: [LfoWaveform; 6] = [
        LfoWaveform::Sine,
        LfoWaveform::Triangle,
        LfoWaveform::SawUp,
        LfoWaveform::SawDown,
        LfoWaveform::Square,
        LfoWaveform::SampleAndHold,
    ];

    /// Waveform for a parameter index, or `None` when out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Parameter index of this waveform.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            LfoWaveform::Sine => "Sine",
            LfoWaveform::Triangle => "Triangle",
            LfoWaveform::SawUp => "Saw Up",
            LfoWaveform::SawDown => "Saw Down",
            LfoWaveform::Square => "Square",
            LfoWaveform::SampleAndHold => "Random",
        }
    }
}

/// Output range of an [`Lfo`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LfoPolarity {
    /// Output in [-1.0, 1.0].
    #[default]
    Bipolar,
    /// Output rescaled to [0.0, 1.0].
    Unipolar,
}

/// Low Frequency Oscillator for generating modulation signals.
///
/// Rate is clamped to [`MIN_RATE_HZ`, `MAX_RATE_HZ`]. The sample-and-hold
/// shape draws from an internal xorshift generator exactly when the phase
/// wraps, so a given seed always produces the same sequence.
///
/// # Example
///
/// ```rust
/// use kether_core::{Lfo, LfoWaveform};
///
/// let mut lfo = Lfo::new(44100.0, 2.0);
/// lfo.set_waveform(LfoWaveform::Triangle);
///
/// // Per sample
/// let value = lfo.next();
///
/// // Or once per 512-sample block
/// let block_value = lfo.advance(512);
/// ```
#[derive(Debug, Clone)]
pub struct Lfo {
    /// Current phase position [0.0, 1.0)
    phase: f32,
    /// Phase increment per sample
    phase_inc: f32,
    sample_rate: f32,
    rate_hz: f32,
    waveform: LfoWaveform,
    polarity: LfoPolarity,
    /// Sample & hold: current held value
    sh_value: f32,
    rng_state: u32,
}

const RNG_SEED: u32 = 0x2545_F491;

impl Default for Lfo {
    fn default() -> Self {
        Self::new(48000.0, 1.0)
    }
}

impl Lfo {
    /// Create a new LFO with the given sample rate and rate in Hz.
    pub fn new(sample_rate: f32, rate_hz: f32) -> Self {
        let mut lfo = Self {
            phase: 0.0,
            phase_inc: 0.0,
            sample_rate,
            rate_hz: 1.0,
            waveform: LfoWaveform::Sine,
            polarity: LfoPolarity::Bipolar,
            sh_value: 0.0,
            rng_state: RNG_SEED,
        };
        lfo.set_rate(rate_hz);
        lfo
    }

    /// Set rate in Hz, clamped to [`MIN_RATE_HZ`, `MAX_RATE_HZ`].
    pub fn set_rate(&mut self, rate_hz: f32) {
        self.rate_hz = rate_hz.clamp(MIN_RATE_HZ, MAX_RATE_HZ);
        self.phase_inc = self.rate_hz / self.sample_rate;
    }

    /// Current rate in Hz.
    pub fn rate(&self) -> f32 {
        self.rate_hz
    }

    /// Set waveform.
    pub fn set_waveform(&mut self, waveform: LfoWaveform) {
        self.waveform = waveform;
    }

    /// Current waveform.
    pub fn waveform(&self) -> LfoWaveform {
        self.waveform
    }

    /// Set output polarity.
    pub fn set_polarity(&mut self, polarity: LfoPolarity) {
        self.polarity = polarity;
    }

    /// Current output polarity.
    pub fn polarity(&self) -> LfoPolarity {
        self.polarity
    }

    /// Set sample rate, keeping the rate in Hz.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.phase_inc = self.rate_hz / sample_rate;
    }

    /// Reset phase, held value and random sequence.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.sh_value = 0.0;
        self.rng_state = RNG_SEED;
    }

    /// Set phase directly (0.0 - 1.0).
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase.clamp(0.0, 1.0) % 1.0;
    }

    /// Current phase (0.0 - 1.0).
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Output at the current phase without advancing.
    #[inline]
    pub fn value(&self) -> f32 {
        let p = self.phase;
        let bipolar = match self.waveform {
            LfoWaveform::Sine => sinf(p * 2.0 * PI),
            LfoWaveform::Triangle => {
                if p < 0.5 {
                    4.0 * p - 1.0
                } else {
                    3.0 - 4.0 * p
                }
            }
            LfoWaveform::SawUp => 2.0 * p - 1.0,
            LfoWaveform::SawDown => 1.0 - 2.0 * p,
            LfoWaveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            LfoWaveform::SampleAndHold => self.sh_value,
        };

        match self.polarity {
            LfoPolarity::Bipolar => bipolar,
            LfoPolarity::Unipolar => (bipolar + 1.0) * 0.5,
        }
    }

    /// Get the current value, then advance one sample.
    #[inline]
    pub fn next(&mut self) -> f32 {
        self.advance(1)
    }

    /// Get the current value, then advance the phase by `samples` steps.
    ///
    /// Used at block rate: one call per audio block keeps the LFO running at
    /// its rate in Hz regardless of block size.
    pub fn advance(&mut self, samples: usize) -> f32 {
        let output = self.value();

        self.phase += self.phase_inc * samples as f32;
        if self.phase >= 1.0 {
            self.phase -= libm::floorf(self.phase);
            self.sh_value = self.next_random();
        }

        output
    }

    /// Uniform random value in [-1.0, 1.0] (xorshift32).
    fn next_random(&mut self) -> f32 {
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng_state = x;
        (x as i32 as f32) / (i32::MAX as f32)
    }
}
