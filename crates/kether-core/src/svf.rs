//! State Variable Filter implementation.
//!
//! A 2-pole resonant filter producing lowpass, bandpass and highpass taps
//! from one shared recurrence. The voice path uses the lowpass tap.
//!
//! # Topology
//!
//! Chamberlin's digital state-variable filter (Chamberlin, "Musical
//! Applications of Microprocessors", 1985):
//!
//! ```text
//! low  += f * band
//! high  = input - low - q * band
//! band += f * high
//! ```
//!
//! with `f = 2 sin(π fc / fs)` and `q = 1 / Q`.
//!
//! # Stability
//!
//! The plain Chamberlin recurrence goes unstable once `f² + 2fq ≥ 4`, which
//! happens well below Nyquist at low Q. Two measures keep it bounded across
//! the whole cutoff range:
//!
//! - The recurrence runs twice per input sample (2× oversampling with a
//!   held input), halving the normalized frequency seen by `f`.
//! - `f` is capped at a fraction of the stability limit
//!   `sqrt(q² + 4) - q` for the current damping.

use core::f32::consts::PI;
use libm::{sinf, sqrtf};

use crate::Effect;
use crate::flush_denormal;

/// Lowest Q reached at resonance 0.
pub const MIN_Q: f32 = 0.5;

/// Highest Q reached at resonance 1.
pub const MAX_Q: f32 = 10.0;

const OVERSAMPLE: usize = 2;

/// Fraction of the stability limit that `f` may reach.
const STABILITY_MARGIN: f32 = 0.95;

/// State Variable Filter (2-pole, 12 dB/oct), Chamberlin topology.
///
/// ## Parameters
///
/// - `cutoff`: Cutoff frequency in Hz (20.0 to sr×0.49, default 1000.0)
/// - `resonance`: Normalized resonance (0.0 to 1.0, default 0.0), mapped
///   linearly onto Q in [`MIN_Q`, `MAX_Q`]
///
/// # Example
///
/// ```rust
/// use kether_core::{Effect, StateVariableFilter};
///
/// let mut svf = StateVariableFilter::new(44100.0);
/// svf.set_cutoff(1000.0);
/// svf.set_resonance(0.3);
///
/// let low = svf.process(0.5);
/// ```
#[derive(Debug, Clone)]
pub struct StateVariableFilter {
    // Running state
    low: f32,
    band: f32,
    high: f32,

    // Coefficients
    f: f32,
    q: f32,

    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
}

impl Default for StateVariableFilter {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl StateVariableFilter {
    /// Create a new filter with cutoff 1000 Hz and resonance 0.
    pub fn new(sample_rate: f32) -> Self {
        let mut svf = Self {
            low: 0.0,
            band: 0.0,
            high: 0.0,
            f: 0.0,
            q: 1.0 / MIN_Q,
            sample_rate,
            cutoff: 1000.0,
            resonance: 0.0,
        };
        svf.update_coefficients();
        svf
    }

    /// Set cutoff frequency in Hz.
    ///
    /// Range: 20.0 to `sample_rate × 0.49`. Values are clamped.
    pub fn set_cutoff(&mut self, freq: f32) {
        self.cutoff = freq.clamp(20.0, self.sample_rate * 0.49);
        self.update_coefficients();
    }

    /// Get current cutoff frequency in Hz.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Set normalized resonance.
    ///
    /// Range: 0.0 to 1.0. Values are clamped. 0.0 maps to Q = 0.5,
    /// 1.0 maps to Q = 10.
    pub fn set_resonance(&mut self, resonance: f32) {
        self.resonance = resonance.clamp(0.0, 1.0);
        self.update_coefficients();
    }

    /// Get current normalized resonance.
    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    /// Set cutoff and resonance with a single coefficient update.
    pub fn set_params(&mut self, cutoff: f32, resonance: f32) {
        self.cutoff = cutoff.clamp(20.0, self.sample_rate * 0.49);
        self.resonance = resonance.clamp(0.0, 1.0);
        self.update_coefficients();
    }

    /// Frequency coefficient `f` currently in use.
    pub fn frequency_coefficient(&self) -> f32 {
        self.f
    }

    /// Damping coefficient `q = 1 / Q` currently in use.
    pub fn damping(&self) -> f32 {
        self.q
    }

    /// Lowpass tap from the most recent sample.
    pub fn low(&self) -> f32 {
        self.low
    }

    /// Bandpass tap from the most recent sample.
    pub fn band(&self) -> f32 {
        self.band
    }

    /// Highpass tap from the most recent sample.
    pub fn high(&self) -> f32 {
        self.high
    }

    fn update_coefficients(&mut self) {
        let q_factor = MIN_Q + self.resonance * (MAX_Q - MIN_Q);
        self.q = 1.0 / q_factor;

        let oversampled_rate = self.sample_rate * OVERSAMPLE as f32;
        let f = 2.0 * sinf(PI * self.cutoff / oversampled_rate);
        let f_max = STABILITY_MARGIN * (sqrtf(self.q * self.q + 4.0) - self.q);
        self.f = f.min(f_max);
    }
}

impl Effect for StateVariableFilter {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        for _ in 0..OVERSAMPLE {
            self.low += self.f * self.band;
            self.high = input - self.low - self.q * self.band;
            self.band += self.f * self.high;
        }
        self.low = flush_denormal(self.low);
        self.band = flush_denormal(self.band);
        self.low
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.cutoff = self.cutoff.clamp(20.0, sample_rate * 0.49);
        self.update_coefficients();
    }

    fn reset(&mut self) {
        self.low = 0.0;
        self.band = 0.0;
        self.high = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_rms_through(svf: &mut StateVariableFilter, freq: f32, sr: f32) -> f32 {
        // Settle, then measure
        for i in 0..4000 {
            svf.process(sinf(2.0 * PI * freq * i as f32 / sr));
        }
        let mut sum = 0.0;
        let n = 4000;
        for i in 4000..4000 + n {
            let y = svf.process(sinf(2.0 * PI * freq * i as f32 / sr));
            sum += y * y;
        }
        sqrtf(sum / n as f32)
    }

    #[test]
    fn test_dc_passes_lowpass() {
        let mut svf = StateVariableFilter::new(44100.0);
        svf.set_cutoff(500.0);

        let mut out = 0.0;
        for _ in 0..20000 {
            out = svf.process(1.0);
        }
        assert!((out - 1.0).abs() < 0.01, "DC gain should be 1, got {out}");
    }

    #[test]
    fn test_attenuates_above_cutoff() {
        let sr = 44100.0;
        let mut svf = StateVariableFilter::new(sr);
        svf.set_cutoff(300.0);

        let low = sine_rms_through(&mut svf, 100.0, sr);
        svf.reset();
        let high = sine_rms_through(&mut svf, 5000.0, sr);

        assert!(
            high < low * 0.1,
            "5 kHz should be strongly attenuated: low={low}, high={high}"
        );
    }

    #[test]
    fn test_resonance_boosts_cutoff_region() {
        let sr = 44100.0;
        let mut flat = StateVariableFilter::new(sr);
        flat.set_params(1000.0, 0.0);
        let mut peaky = StateVariableFilter::new(sr);
        peaky.set_params(1000.0, 1.0);

        let flat_rms = sine_rms_through(&mut flat, 1000.0, sr);
        let peak_rms = sine_rms_through(&mut peaky, 1000.0, sr);
        assert!(peak_rms > flat_rms * 2.0, "flat={flat_rms}, resonant={peak_rms}");
    }

    #[test]
    fn test_clamps_parameters() {
        let mut svf = StateVariableFilter::new(44100.0);
        svf.set_cutoff(1.0);
        assert_eq!(svf.cutoff(), 20.0);
        svf.set_cutoff(100_000.0);
        assert!((svf.cutoff() - 44100.0 * 0.49).abs() < 0.01);
        svf.set_resonance(-1.0);
        assert_eq!(svf.resonance(), 0.0);
        svf.set_resonance(3.0);
        assert_eq!(svf.resonance(), 1.0);
    }

    #[test]
    fn test_q_mapping() {
        let mut svf = StateVariableFilter::new(44100.0);
        svf.set_resonance(0.0);
        assert!((svf.damping() - 2.0).abs() < 1e-6);
        svf.set_resonance(1.0);
        assert!((svf.damping() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_stable_at_extremes() {
        for &(cutoff, res) in &[(21609.0, 0.0), (21609.0, 1.0), (20.0, 1.0), (10000.0, 0.5)] {
            let mut svf = StateVariableFilter::new(44100.0);
            svf.set_params(cutoff, res);
            let mut peak = 0.0f32;
            for i in 0..20000 {
                let x = if i % 2 == 0 { 1.0 } else { -1.0 };
                let y = svf.process(x);
                assert!(y.is_finite());
                peak = peak.max(y.abs());
            }
            assert!(peak < 100.0, "cutoff={cutoff} res={res} peak={peak}");
        }
    }

    #[test]
    fn test_reset_clears_state() {
        let mut svf = StateVariableFilter::new(44100.0);
        for _ in 0..100 {
            svf.process(1.0);
        }
        svf.reset();
        assert_eq!(svf.low(), 0.0);
        assert_eq!(svf.band(), 0.0);
        assert_eq!(svf.high(), 0.0);
        assert_eq!(svf.process(0.0), 0.0);
    }

    #[test]
    fn test_sample_rate_change_reclamps_cutoff() {
        let mut svf = StateVariableFilter::new(96000.0);
        svf.set_cutoff(40000.0);
        svf.set_sample_rate(44100.0);
        assert!(svf.cutoff() <= 44100.0 * 0.49);
    }
}
