//! Feedback comb filter for reverb algorithms.
//!
//! The tail-density stage of a Schroeder reverb: a delay line whose output is
//! fed back into its input with a fixed gain.

use crate::DelayLine;
use crate::Effect;
use crate::flush_denormal;

/// Feedback comb filter.
///
/// ```text
/// y[n] = x[n - D] + g · y[n - D]
/// ```
///
/// Stable for `|g| < 1`; the impulse response is a train of echoes every
/// `D` samples decaying by `g` per echo.
///
/// # Example
///
/// ```rust
/// use kether_core::{CombFilter, Effect};
///
/// let mut comb = CombFilter::new(1557);
/// comb.set_feedback(0.84);
///
/// let output = comb.process(1.0);
/// ```
#[derive(Debug, Clone)]
pub struct CombFilter {
    delay: DelayLine,
    feedback: f32,
}

impl CombFilter {
    /// Create a comb filter with the given delay length in samples.
    pub fn new(delay_samples: usize) -> Self {
        Self {
            delay: DelayLine::new(delay_samples),
            feedback: 0.5,
        }
    }

    /// Set the feedback gain. Clamped to ±0.99 to stay stable.
    #[inline]
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(-0.99, 0.99);
    }

    /// Current feedback gain.
    #[inline]
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Delay length in samples.
    pub fn delay_samples(&self) -> usize {
        self.delay.capacity()
    }
}

impl Effect for CombFilter {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.delay.read_oldest();
        self.delay
            .write(flush_denormal(input + output * self.feedback));
        output
    }

    fn set_sample_rate(&mut self, _sample_rate: f32) {
        // Length is fixed at construction; the owner rebuilds on rate changes.
    }

    fn reset(&mut self) {
        self.delay.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comb_first_echo() {
        let mut comb = CombFilter::new(100);
        comb.set_feedback(0.5);

        assert_eq!(comb.process(1.0), 0.0);
        for _ in 0..99 {
            assert_eq!(comb.process(0.0), 0.0);
        }
        assert_eq!(comb.process(0.0), 1.0);
    }

    #[test]
    fn test_comb_echo_train_decays_by_gain() {
        let mut comb = CombFilter::new(10);
        comb.set_feedback(0.84);

        comb.process(1.0);
        let mut echoes = [0.0f32; 5];
        let mut idx = 0;
        for n in 1..=50 {
            let out = comb.process(0.0);
            if n % 10 == 0 {
                echoes[idx] = out;
                idx += 1;
            }
        }
        for k in 1..5 {
            assert!((echoes[k] / echoes[k - 1] - 0.84).abs() < 1e-5);
        }
    }

    #[test]
    fn test_comb_reset() {
        let mut comb = CombFilter::new(10);
        for _ in 0..20 {
            comb.process(1.0);
        }
        comb.reset();
        for _ in 0..20 {
            assert_eq!(comb.process(0.0), 0.0);
        }
    }

    #[test]
    fn test_feedback_clamped() {
        let mut comb = CombFilter::new(10);
        comb.set_feedback(2.0);
        assert_eq!(comb.feedback(), 0.99);
        assert_eq!(comb.delay_samples(), 10);
    }
}
