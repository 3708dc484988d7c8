//! Post-mix effects: feedback delay and Schroeder reverb.
//!
//! Each output channel owns an independent `delay → reverb` chain built with
//! [`EffectExt::chain`]. Both effects pass audio through untouched, and write
//! nothing into their buffers, while their mix is at or below
//! [`BYPASS_THRESHOLD`].

use kether_core::{
    AllpassFilter, Chain, CombFilter, DelayLine, Effect, EffectExt, flush_denormal, wet_dry_mix,
};

/// Mix level at or below which an effect is bypassed.
pub const BYPASS_THRESHOLD: f32 = 0.01;

/// Delay buffer length in seconds.
pub const MAX_DELAY_SECONDS: f32 = 2.0;

/// Sample rate the reverb tuning constants are defined at.
pub const REVERB_REFERENCE_RATE: f32 = 44100.0;

/// Comb delay lengths at [`REVERB_REFERENCE_RATE`].
pub const COMB_LENGTHS: [usize; 4] = [1557, 1617, 1491, 1422];

/// Allpass delay lengths at [`REVERB_REFERENCE_RATE`].
pub const ALLPASS_LENGTHS: [usize; 2] = [225, 341];

/// Comb feedback gain.
pub const COMB_GAIN: f32 = 0.84;

/// Allpass gain.
pub const ALLPASS_GAIN: f32 = 0.5;

/// Feedback delay over a ring buffer holding [`MAX_DELAY_SECONDS`].
///
/// ```text
/// delayed = buffer[write - delay_samples]
/// out     = in × (1 - mix) + delayed × mix
/// buffer[write] = out + delayed × feedback
/// ```
///
/// Feedback is injected after the dry/wet mix point, so the recirculating
/// signal carries the dry path as well. The loop gain is `mix + feedback`;
/// settings where that exceeds 1 grow without bound.
///
/// ## Parameters
/// - `time_ms`: 0 to 2000, default 250
/// - `feedback`: 0.0 to 0.95, default 0.3
/// - `mix`: 0.0 to 1.0, default 0.2
#[derive(Debug, Clone)]
pub struct FeedbackDelay {
    line: DelayLine,
    sample_rate: f32,
    time_ms: f32,
    delay_samples: usize,
    feedback: f32,
    mix: f32,
}

impl FeedbackDelay {
    /// Create a delay with default settings.
    pub fn new(sample_rate: f32) -> Self {
        let mut delay = Self {
            line: DelayLine::from_time(sample_rate, MAX_DELAY_SECONDS),
            sample_rate,
            time_ms: 250.0,
            delay_samples: 0,
            feedback: 0.3,
            mix: 0.2,
        };
        delay.update_delay_samples();
        delay
    }

    /// Set delay time in milliseconds. Clamped to the buffer capacity.
    pub fn set_time_ms(&mut self, ms: f32) {
        self.time_ms = ms.max(0.0);
        self.update_delay_samples();
    }

    /// Delay time in milliseconds.
    pub fn time_ms(&self) -> f32 {
        self.time_ms
    }

    /// Delay in whole samples after clamping.
    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    /// Set feedback gain (0.0 to 0.95).
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.95);
    }

    /// Feedback gain.
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Set wet/dry mix (0.0 to 1.0).
    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    /// Wet/dry mix.
    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// Buffer capacity in samples.
    pub fn capacity(&self) -> usize {
        self.line.capacity()
    }

    fn update_delay_samples(&mut self) {
        let samples = (self.time_ms / 1000.0 * self.sample_rate) as usize;
        self.delay_samples = samples.min(self.line.capacity() - 1);
    }
}

impl Effect for FeedbackDelay {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        if self.mix <= BYPASS_THRESHOLD {
            return input;
        }
        let delayed = self.line.read(self.delay_samples);
        let output = wet_dry_mix(input, delayed, self.mix);
        self.line
            .write(flush_denormal(output + delayed * self.feedback));
        output
    }

    /// Reallocates the buffer. Never call from the audio path.
    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.line = DelayLine::from_time(sample_rate, MAX_DELAY_SECONDS);
        self.update_delay_samples();
    }

    fn reset(&mut self) {
        self.line.clear();
    }
}

/// Schroeder reverb: four parallel combs, averaged, into two serial
/// allpasses.
///
/// Delay lengths are [`COMB_LENGTHS`] and [`ALLPASS_LENGTHS`] scaled by
/// `sample_rate / 44100`.
///
/// ## Parameters
/// - `mix`: 0.0 to 1.0, default 0.0
#[derive(Debug, Clone)]
pub struct SchroederReverb {
    combs: [CombFilter; 4],
    allpasses: [AllpassFilter; 2],
    mix: f32,
}

impl SchroederReverb {
    /// Create a reverb tuned for `sample_rate`, fully dry.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            combs: core::array::from_fn(|i| {
                let mut comb = CombFilter::new(scaled_length(COMB_LENGTHS[i], sample_rate));
                comb.set_feedback(COMB_GAIN);
                comb
            }),
            allpasses: core::array::from_fn(|i| {
                let mut allpass =
                    AllpassFilter::new(scaled_length(ALLPASS_LENGTHS[i], sample_rate));
                allpass.set_gain(ALLPASS_GAIN);
                allpass
            }),
            mix: 0.0,
        }
    }

    /// Set wet/dry mix (0.0 to 1.0).
    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    /// Wet/dry mix.
    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// Comb delay lengths in samples.
    pub fn comb_lengths(&self) -> [usize; 4] {
        core::array::from_fn(|i| self.combs[i].delay_samples())
    }

    /// Allpass delay lengths in samples.
    pub fn allpass_lengths(&self) -> [usize; 2] {
        core::array::from_fn(|i| self.allpasses[i].delay_samples())
    }

    /// Wet signal for one input sample, without the dry mix.
    #[inline]
    pub fn process_wet(&mut self, input: f32) -> f32 {
        let mut wet = 0.0;
        for comb in &mut self.combs {
            wet += comb.process(input);
        }
        wet *= 0.25;
        for allpass in &mut self.allpasses {
            wet = allpass.process(wet);
        }
        wet
    }
}

impl Effect for SchroederReverb {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        if self.mix <= BYPASS_THRESHOLD {
            return input;
        }
        let wet = self.process_wet(input);
        wet_dry_mix(input, wet, self.mix)
    }

    /// Rebuilds every buffer. Never call from the audio path.
    fn set_sample_rate(&mut self, sample_rate: f32) {
        let mix = self.mix;
        *self = Self::new(sample_rate);
        self.mix = mix;
    }

    fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.reset();
        }
        for allpass in &mut self.allpasses {
            allpass.reset();
        }
    }
}

fn scaled_length(reference: usize, sample_rate: f32) -> usize {
    let scaled = libm::roundf(reference as f32 * sample_rate / REVERB_REFERENCE_RATE);
    (scaled as usize).max(1)
}

/// One channel's `delay → reverb` chain.
pub type ChannelEffects = Chain<FeedbackDelay, SchroederReverb>;

/// Number of independent effect chains (left, right).
pub const EFFECT_CHANNELS: usize = 2;

/// Per-channel effect chains sharing one set of settings.
///
/// Channel 0 uses the left chain and channel 1 the right chain. Channels
/// beyond those pass through dry, so the stereo chains never see their audio.
#[derive(Debug, Clone)]
pub struct EffectsChain {
    channels: [ChannelEffects; EFFECT_CHANNELS],
}

impl EffectsChain {
    /// Create chains for `sample_rate` with default settings.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            channels: core::array::from_fn(|_| {
                FeedbackDelay::new(sample_rate).chain(SchroederReverb::new(sample_rate))
            }),
        }
    }

    /// Process one sample of `channel`.
    #[inline]
    pub fn process(&mut self, channel: usize, input: f32) -> f32 {
        match self.channels.get_mut(channel) {
            Some(chain) => chain.process(input),
            None => input,
        }
    }

    /// Reallocate buffers for a new sample rate, keeping settings.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        for chain in &mut self.channels {
            chain.set_sample_rate(sample_rate);
        }
    }

    /// Clear all delay and reverb buffers.
    pub fn reset(&mut self) {
        for chain in &mut self.channels {
            chain.reset();
        }
    }

    /// Set delay time in milliseconds.
    pub fn set_delay_time_ms(&mut self, ms: f32) {
        self.each_delay(|d| d.set_time_ms(ms));
    }

    /// Set delay feedback.
    pub fn set_delay_feedback(&mut self, feedback: f32) {
        self.each_delay(|d| d.set_feedback(feedback));
    }

    /// Set delay mix.
    pub fn set_delay_mix(&mut self, mix: f32) {
        self.each_delay(|d| d.set_mix(mix));
    }

    /// Set reverb mix.
    pub fn set_reverb_mix(&mut self, mix: f32) {
        for chain in &mut self.channels {
            chain.second_mut().set_mix(mix);
        }
    }

    /// The left channel's delay (settings are identical on every channel).
    pub fn delay(&self) -> &FeedbackDelay {
        self.channels[0].first()
    }

    /// The left channel's reverb.
    pub fn reverb(&self) -> &SchroederReverb {
        self.channels[0].second()
    }

    fn each_delay(&mut self, mut f: impl FnMut(&mut FeedbackDelay)) {
        for chain in &mut self.channels {
            f(chain.first_mut());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_echo_position() {
        let mut delay = FeedbackDelay::new(1000.0);
        delay.set_time_ms(10.0);
        delay.set_feedback(0.0);
        delay.set_mix(0.5);
        assert_eq!(delay.delay_samples(), 10);

        let mut out = [0.0f32; 25];
        for (i, o) in out.iter_mut().enumerate() {
            *o = delay.process(if i == 0 { 1.0 } else { 0.0 });
        }
        assert_eq!(out[0], 0.5);
        // The dry half recirculates through the write point, then emerges
        // scaled by the mix again
        assert!((out[10] - 0.25).abs() < 1e-6);
        assert!((out[20] - 0.125).abs() < 1e-6);
        assert!(out[1..10].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_delay_feedback_injection_point() {
        let mut delay = FeedbackDelay::new(1000.0);
        delay.set_time_ms(5.0);
        delay.set_feedback(0.5);
        delay.set_mix(0.3);

        let mut out = [0.0f32; 11];
        for (i, o) in out.iter_mut().enumerate() {
            *o = delay.process(if i == 0 { 1.0 } else { 0.0 });
        }
        // written[0] = 0.7; out[5] = 0.7 × 0.3; written[5] = 0.21 + 0.7 × 0.5
        assert!((out[5] - 0.21).abs() < 1e-6);
        assert!((out[10] - 0.56 * 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_delay_time_clamped_to_capacity() {
        let mut delay = FeedbackDelay::new(1000.0);
        delay.set_time_ms(10_000.0);
        assert_eq!(delay.capacity(), 2000);
        assert_eq!(delay.delay_samples(), 1999);
        delay.set_time_ms(-5.0);
        assert_eq!(delay.delay_samples(), 0);
    }

    #[test]
    fn test_delay_bypass_below_threshold() {
        let mut delay = FeedbackDelay::new(1000.0);
        delay.set_mix(0.01);
        for i in 0..100 {
            let x = i as f32 * 0.01;
            assert_eq!(delay.process(x), x);
        }
        // Nothing was written while bypassed
        delay.set_mix(1.0);
        delay.set_time_ms(50.0);
        for _ in 0..100 {
            assert_eq!(delay.process(0.0), 0.0);
        }
    }

    #[test]
    fn test_delay_parameter_clamps() {
        let mut delay = FeedbackDelay::new(44100.0);
        delay.set_feedback(1.5);
        delay.set_mix(-1.0);
        assert_eq!(delay.feedback(), 0.95);
        assert_eq!(delay.mix(), 0.0);
    }

    #[test]
    fn test_reverb_lengths_scale_with_rate() {
        let reverb = SchroederReverb::new(44100.0);
        assert_eq!(reverb.comb_lengths(), COMB_LENGTHS);
        assert_eq!(reverb.allpass_lengths(), ALLPASS_LENGTHS);

        let doubled = SchroederReverb::new(88200.0);
        assert_eq!(doubled.comb_lengths(), [3114, 3234, 2982, 2844]);
        assert_eq!(doubled.allpass_lengths(), [450, 682]);
    }

    #[test]
    fn test_reverb_impulse_response_is_long_and_decays() {
        let mut reverb = SchroederReverb::new(44100.0);
        let response: Vec<f32> = (0..44100 * 3)
            .map(|i| reverb.process_wet(if i == 0 { 1.0 } else { 0.0 }))
            .collect();

        let longest = *COMB_LENGTHS.iter().max().unwrap();
        let last_nonzero = response.iter().rposition(|&x| x != 0.0).unwrap();
        assert!(last_nonzero >= longest);

        let early: f32 = response[..4410].iter().map(|x| x.abs()).fold(0.0, f32::max);
        let late: f32 = response[44100 * 2..].iter().map(|x| x.abs()).fold(0.0, f32::max);
        assert!(late < early * 0.01, "early={early}, late={late}");
        assert!(response.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_reverb_bypass_when_dry() {
        let mut reverb = SchroederReverb::new(44100.0);
        assert_eq!(reverb.mix(), 0.0);
        assert_eq!(reverb.process(0.7), 0.7);
    }

    #[test]
    fn test_reverb_sample_rate_keeps_mix() {
        let mut reverb = SchroederReverb::new(44100.0);
        reverb.set_mix(0.4);
        reverb.set_sample_rate(48000.0);
        assert_eq!(reverb.mix(), 0.4);
        assert_eq!(reverb.comb_lengths()[0], 1695);
    }

    #[test]
    fn test_chain_channels_are_independent() {
        let mut fx = EffectsChain::new(1000.0);
        fx.set_delay_time_ms(3.0);
        fx.set_delay_mix(1.0);
        fx.set_delay_feedback(0.0);
        fx.set_reverb_mix(0.0);

        fx.process(0, 1.0);
        let mut right = 0.0;
        for _ in 0..5 {
            right += fx.process(1, 0.0).abs();
        }
        assert_eq!(right, 0.0);
        assert_eq!(fx.delay().delay_samples(), 3);
        assert_eq!(fx.reverb().mix(), 0.0);
    }

    #[test]
    fn test_channels_beyond_stereo_pass_dry() {
        let mut fx = EffectsChain::new(1000.0);
        fx.set_delay_time_ms(3.0);
        fx.set_delay_mix(1.0);
        fx.set_delay_feedback(0.0);
        fx.set_reverb_mix(0.0);

        assert_eq!(fx.process(2, 1.0), 1.0);
        assert_eq!(fx.process(7, -0.5), -0.5);

        let right: Vec<f32> = (0..5).map(|_| fx.process(1, 0.0)).collect();
        assert!(right.iter().all(|&x| x == 0.0), "{right:?}");
    }
}
