//! The five character controls applied to the mixed voice bus.
//!
//! Brilliance, motion, space, warmth and purity shape the summed signal of
//! all voices, one sample per channel, before master gain and the effects.
//! Because the saturating stages see the whole mix rather than each voice,
//! chords pick up intermodulation products. [`BusShaper`] is the seam where a
//! different (for example per-voice) implementation can be substituted;
//! [`PostMixShaper`] is the post-mix one the engine uses by default.

use core::f32::consts::TAU;
use kether_core::soft_clip;
use libm::sinf;

/// Control values, each 0.0 to 1.0.
///
/// Defaults: brilliance 0.5, motion 0.3, space 0.4, warmth 0.6, purity 0.8.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterControls {
    brilliance: f32,
    motion: f32,
    space: f32,
    warmth: f32,
    purity: f32,
}

impl Default for CharacterControls {
    fn default() -> Self {
        Self {
            brilliance: 0.5,
            motion: 0.3,
            space: 0.4,
            warmth: 0.6,
            purity: 0.8,
        }
    }
}

impl CharacterControls {
    /// Controls at their default positions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Controls that leave the signal untouched.
    pub fn neutral() -> Self {
        Self {
            brilliance: 0.5,
            motion: 0.0,
            space: 0.0,
            warmth: 0.0,
            purity: 1.0,
        }
    }

    /// Set brilliance (0.0 to 1.0).
    pub fn set_brilliance(&mut self, value: f32) {
        self.brilliance = value.clamp(0.0, 1.0);
    }

    /// Brilliance.
    pub fn brilliance(&self) -> f32 {
        self.brilliance
    }

    /// Set motion (0.0 to 1.0).
    pub fn set_motion(&mut self, value: f32) {
        self.motion = value.clamp(0.0, 1.0);
    }

    /// Motion.
    pub fn motion(&self) -> f32 {
        self.motion
    }

    /// Set space (0.0 to 1.0).
    pub fn set_space(&mut self, value: f32) {
        self.space = value.clamp(0.0, 1.0);
    }

    /// Space.
    pub fn space(&self) -> f32 {
        self.space
    }

    /// Set warmth (0.0 to 1.0).
    pub fn set_warmth(&mut self, value: f32) {
        self.warmth = value.clamp(0.0, 1.0);
    }

    /// Warmth.
    pub fn warmth(&self) -> f32 {
        self.warmth
    }

    /// Set purity (0.0 to 1.0).
    pub fn set_purity(&mut self, value: f32) {
        self.purity = value.clamp(0.0, 1.0);
    }

    /// Purity.
    pub fn purity(&self) -> f32 {
        self.purity
    }
}

/// Shapes the mixed bus one frame at a time.
///
/// The block processor calls [`begin_frame`](Self::begin_frame) once per
/// frame, then [`shape`](Self::shape) once per channel of that frame.
/// Per-frame state such as the motion phase therefore advances at the sample
/// rate regardless of channel count, and every channel of a frame sees the
/// same motion gain.
pub trait BusShaper {
    /// Advance any per-frame state. Called exactly once per frame.
    fn begin_frame(&mut self, controls: &CharacterControls);

    /// Shape one sample of `channel` out of `channels`.
    fn shape(
        &mut self,
        controls: &CharacterControls,
        sample: f32,
        channel: usize,
        channels: usize,
    ) -> f32;

    /// Clear running state.
    fn reset(&mut self);
}

/// Post-mix character stage.
///
/// Applied in this order:
///
/// 1. **Brilliance**: above 0.5 boosts by `1 + (b - 0.5) × 2`, otherwise
///    scales by `b × 2`.
/// 2. **Motion**: tremolo `1 + sin(phase) × m × 0.1`, the phase advancing
///    `0.01 × m` per frame and persisting across blocks.
/// 3. **Space**: right channel (index 1 of ≥ 2) boosted by `1 + s × 0.3`.
/// 4. **Warmth**: above 0.1, `tanh(x (1 + a)) / (1 + a/2)` with `a = w/2`.
/// 5. **Purity**: below 0.9, `tanh(x (1 + d))` with `d = (1 - p) × 0.2`.
///
/// # Example
///
/// ```rust
/// use kether_synth::{BusShaper, CharacterControls, PostMixShaper};
///
/// let mut controls = CharacterControls::neutral();
/// controls.set_space(1.0);
///
/// let mut shaper = PostMixShaper::default();
/// shaper.begin_frame(&controls);
/// let left = shaper.shape(&controls, 0.5, 0, 2);
/// let right = shaper.shape(&controls, 0.5, 1, 2);
/// assert!(right > left);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PostMixShaper {
    motion_phase: f32,
    /// Tremolo factor for the current frame
    motion_gain: f32,
}

impl Default for PostMixShaper {
    fn default() -> Self {
        Self {
            motion_phase: 0.0,
            motion_gain: 1.0,
        }
    }
}

impl PostMixShaper {
    /// Current motion phase in radians, wrapped to [0, 2π).
    pub fn motion_phase(&self) -> f32 {
        self.motion_phase
    }
}

impl BusShaper for PostMixShaper {
    #[inline]
    fn begin_frame(&mut self, controls: &CharacterControls) {
        self.motion_phase += 0.01 * controls.motion;
        if self.motion_phase >= TAU {
            self.motion_phase -= TAU;
        }
        self.motion_gain = 1.0 + sinf(self.motion_phase) * controls.motion * 0.1;
    }

    #[inline]
    fn shape(
        &mut self,
        controls: &CharacterControls,
        sample: f32,
        channel: usize,
        channels: usize,
    ) -> f32 {
        let mut x = sample;

        x *= if controls.brilliance > 0.5 {
            1.0 + (controls.brilliance - 0.5) * 2.0
        } else {
            controls.brilliance * 2.0
        };

        x *= self.motion_gain;

        if channel == 1 && channels > 1 {
            x *= 1.0 + controls.space * 0.3;
        }

        if controls.warmth > 0.1 {
            let amount = controls.warmth * 0.5;
            x = soft_clip(x * (1.0 + amount)) / (1.0 + amount * 0.5);
        }

        if controls.purity < 0.9 {
            let distortion = (1.0 - controls.purity) * 0.2;
            x = soft_clip(x * (1.0 + distortion));
        }

        x
    }

    fn reset(&mut self) {
        self.motion_phase = 0.0;
        self.motion_gain = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libm::tanhf;

    fn shaped(controls: &CharacterControls, x: f32, channel: usize, channels: usize) -> f32 {
        let mut shaper = PostMixShaper::default();
        shaper.begin_frame(controls);
        shaper.shape(controls, x, channel, channels)
    }

    #[test]
    fn test_neutral_is_identity() {
        let c = CharacterControls::neutral();
        for x in [-0.8, -0.1, 0.0, 0.3, 0.9] {
            assert_eq!(shaped(&c, x, 0, 2), x);
            assert_eq!(shaped(&c, x, 1, 2), x);
        }
    }

    #[test]
    fn test_brilliance_boost_and_cut() {
        let mut c = CharacterControls::neutral();
        c.set_brilliance(1.0);
        assert!((shaped(&c, 0.25, 0, 1) - 0.5).abs() < 1e-6);
        c.set_brilliance(0.25);
        assert!((shaped(&c, 0.25, 0, 1) - 0.125).abs() < 1e-6);
        c.set_brilliance(0.0);
        assert_eq!(shaped(&c, 0.25, 0, 1), 0.0);
    }

    #[test]
    fn test_space_only_touches_right_channel() {
        let mut c = CharacterControls::neutral();
        c.set_space(1.0);
        assert_eq!(shaped(&c, 0.5, 0, 2), 0.5);
        assert!((shaped(&c, 0.5, 1, 2) - 0.65).abs() < 1e-6);
        // Mono output: nothing is widened
        assert_eq!(shaped(&c, 0.5, 0, 1), 0.5);
    }

    #[test]
    fn test_motion_phase_advances_per_frame() {
        let mut c = CharacterControls::neutral();
        c.set_motion(1.0);
        let mut shaper = PostMixShaper::default();
        for _ in 0..100 {
            shaper.begin_frame(&c);
            // Channels within a frame share the tremolo factor
            let l = shaper.shape(&c, 0.5, 0, 2);
            let r = shaper.shape(&c, 0.5, 1, 2);
            assert_eq!(l, r);
        }
        assert!((shaper.motion_phase() - 1.0).abs() < 1e-4);
        let expected = 0.5 * (1.0 + sinf(shaper.motion_phase()) * 0.1);
        assert!((shaper.shape(&c, 0.5, 0, 2) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_motion_phase_wraps_and_resets() {
        let mut c = CharacterControls::neutral();
        c.set_motion(1.0);
        let mut shaper = PostMixShaper::default();
        for _ in 0..1000 {
            shaper.begin_frame(&c);
        }
        assert!((0.0..TAU).contains(&shaper.motion_phase()));
        shaper.reset();
        assert_eq!(shaper, PostMixShaper::default());
    }

    #[test]
    fn test_warmth_saturates() {
        let mut c = CharacterControls::neutral();
        c.set_warmth(1.0);
        let expected = tanhf(0.5 * 1.5) / 1.25;
        assert!((shaped(&c, 0.5, 0, 1) - expected).abs() < 1e-6);
        assert!(shaped(&c, 100.0, 0, 1) <= 1.0 / 1.25 + 1e-6);

        c.set_warmth(0.1);
        assert_eq!(shaped(&c, 0.5, 0, 1), 0.5);
    }

    #[test]
    fn test_purity_distortion() {
        let mut c = CharacterControls::neutral();
        c.set_purity(0.0);
        assert!((shaped(&c, 0.5, 0, 1) - tanhf(0.6)).abs() < 1e-6);
        c.set_purity(0.9);
        assert_eq!(shaped(&c, 0.5, 0, 1), 0.5);
    }

    #[test]
    fn test_setters_clamp() {
        let mut c = CharacterControls::new();
        c.set_brilliance(2.0);
        c.set_purity(-1.0);
        assert_eq!(c.brilliance(), 1.0);
        assert_eq!(c.purity(), 0.0);
        assert_eq!(CharacterControls::default().warmth(), 0.6);
    }
}
