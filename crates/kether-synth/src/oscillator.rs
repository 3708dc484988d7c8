//! Audio-rate oscillator with PolyBLEP anti-aliasing.
//!
//! Sine is generated directly. Saw and square start from their naive closed
//! forms and are corrected with a polynomial band-limited step at each
//! discontinuity. Triangle is the corrected square run through a leaky
//! integrator whose coefficient equals the phase increment.

use core::f32::consts::PI;
use libm::{floorf, powf, sinf};

/// Largest phase increment the PolyBLEP window is allowed to span.
///
/// Above half a cycle per sample the rising and falling windows would
/// overlap; clamping keeps the corrected output inside [-1, 1].
const MAX_BLEP_WIDTH: f32 = 0.5;

/// Scale that restores the leaky integrator's triangle to unit amplitude.
const TRIANGLE_GAIN: f32 = 4.0;

/// Oscillator waveform types
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Waveform {
    /// Sine waveform, pure fundamental tone.
    #[default]
    Sine,
    /// Sawtooth waveform, all harmonics.
    Saw,
    /// Square waveform (50% duty cycle), odd harmonics.
    Square,
    /// Triangle waveform, odd harmonics rolling off at 12 dB/oct.
    Triangle,
}

impl Waveform {
    /// All waveforms in parameter index order.
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Saw,
        Waveform::Square,
        Waveform::Triangle,
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
            Waveform::Sine => "Sine",
            Waveform::Saw => "Saw",
            Waveform::Square => "Square",
            Waveform::Triangle => "Triangle",
        }
    }
}

/// Band-limited oscillator.
///
/// # Example
///
/// ```rust
/// use kether_synth::{Oscillator, Waveform};
///
/// let mut osc = Oscillator::new(48000.0);
/// osc.set_frequency(440.0);
/// osc.set_waveform(Waveform::Saw);
///
/// let sample = osc.advance();
/// assert!(sample.abs() <= 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Oscillator {
    /// Current phase position [0.0, 1.0)
    phase: f32,
    /// Phase increment per sample
    phase_inc: f32,
    sample_rate: f32,
    frequency: f32,
    waveform: Waveform,
    /// Leaky integrator state for the triangle
    integrator: f32,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl Oscillator {
    /// Create a new oscillator at 440 Hz.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: 440.0 / sample_rate,
            sample_rate,
            frequency: 440.0,
            waveform: Waveform::Sine,
            integrator: 0.0,
        }
    }

    /// Set frequency in Hz. Negative values are treated as 0.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.frequency = freq_hz.max(0.0);
        self.phase_inc = self.frequency / self.sample_rate;
    }

    /// Current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Phase advanced per sample (`frequency / sample_rate`).
    pub fn phase_increment(&self) -> f32 {
        self.phase_inc
    }

    /// Set waveform type.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Current waveform.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Set sample rate and recalculate the phase increment.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.phase_inc = self.frequency / sample_rate;
    }

    /// Set phase directly (0.0 to 1.0).
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase.clamp(0.0, 1.0) % 1.0;
    }

    /// Current phase.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Reset phase to 0 and settle the triangle integrator.
    ///
    /// The integrator starts at the trough of its steady-state cycle for the
    /// current frequency, so the first period has the same amplitude as every
    /// later one.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.integrator = triangle_trough(self.phase_inc.min(1.0));
    }

    /// Generate the next sample.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        let output = self.generate();
        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= floorf(self.phase);
        }
        output
    }

    #[inline]
    fn generate(&mut self) -> f32 {
        let t = self.phase;
        let dt = self.phase_inc.min(MAX_BLEP_WIDTH);
        match self.waveform {
            Waveform::Sine => sinf(t * 2.0 * PI),
            Waveform::Saw => 2.0 * t - 1.0 - poly_blep(t, dt),
            Waveform::Square => blep_square(t, dt),
            Waveform::Triangle => {
                let leak = self.phase_inc.min(1.0);
                self.integrator = leak * blep_square(t, dt) + (1.0 - leak) * self.integrator;
                self.integrator * TRIANGLE_GAIN
            }
        }
    }
}

#[inline]
fn blep_square(t: f32, dt: f32) -> f32 {
    let naive = if t < 0.5 { 1.0 } else { -1.0 };
    let mut falling = t + 0.5;
    if falling >= 1.0 {
        falling -= 1.0;
    }
    naive + poly_blep(t, dt) - poly_blep(falling, dt)
}

/// 2nd-order PolyBLEP residual for a unit upward step at phase 0.
///
/// Non-zero only within one sample either side of the discontinuity.
#[inline]
fn poly_blep(t: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        0.0
    } else if t < dt {
        let x = t / dt;
        2.0 * x - x * x - 1.0
    } else if t > 1.0 - dt {
        let x = (t - 1.0) / dt;
        x * x + 2.0 * x + 1.0
    } else {
        0.0
    }
}

/// Low point of the integrator's steady-state cycle for a unit square at
/// phase increment `dt`.
fn triangle_trough(dt: f32) -> f32 {
    if dt <= 0.0 {
        return 0.0;
    }
    // Decay of the integrator over half a period
    let half_decay = powf(1.0 - dt, 0.5 / dt);
    -(1.0 - half_decay) / (1.0 + half_decay)
}
