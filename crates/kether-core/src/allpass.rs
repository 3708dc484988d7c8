//! Allpass filter for reverb diffusion.
//!
//! A Schroeder allpass passes all frequencies at equal magnitude but smears
//! their phase, turning the comb bank's discrete echoes into a denser tail.

use crate::DelayLine;
use crate::Effect;
use crate::flush_denormal;

/// Schroeder allpass filter.
///
/// ```text
/// w[n] = x[n] + g · w[n - D]
/// y[n] = w[n - D] - g · w[n]
/// ```
///
/// # Example
///
/// ```rust
/// use kether_core::{AllpassFilter, Effect};
///
/// let mut allpass = AllpassFilter::new(225);
/// allpass.set_gain(0.5);
///
/// let output = allpass.process(1.0);
/// ```
#[derive(Debug, Clone)]
pub struct AllpassFilter {
    delay: DelayLine,
    gain: f32,
}

impl AllpassFilter {
    /// Create an allpass filter with the given delay length in samples.
    pub fn new(delay_samples: usize) -> Self {
        Self {
            delay: DelayLine::new(delay_samples),
            gain: 0.5,
        }
    }

    /// Set the allpass gain. Stable for |gain| < 1; clamped to ±0.99.
    #[inline]
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(-0.99, 0.99);
    }

    /// Current allpass gain.
    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Delay length in samples.
    pub fn delay_samples(&self) -> usize {
        self.delay.capacity()
    }
}

impl Effect for AllpassFilter {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.delay.read_oldest();
        let w = flush_denormal(input + self.gain * delayed);
        self.delay.write(w);
        delayed - self.gain * w
    }

    fn set_sample_rate(&mut self, _sample_rate: f32) {
        // Length is fixed at construction; the owner rebuilds on rate changes.
    }

    fn reset(&mut self) {
        self.delay.clear();
    }
}
