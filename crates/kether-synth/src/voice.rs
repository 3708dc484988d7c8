//! A single synthesizer voice.
//!
//! Oscillator → state-variable low-pass → linear ADSR × per-note gain,
//! accumulated into every output channel at a fixed attenuation.

use crate::envelope::AdsrEnvelope;
use crate::oscillator::{Oscillator, Waveform};
use kether_core::{Effect, StateVariableFilter};

/// Fixed attenuation applied to every voice before summing, leaving headroom
/// for several voices on the mixed bus.
pub const VOICE_OUTPUT_SCALE: f32 = 0.3;

/// Settings copied into a voice when it is triggered.
///
/// Waveform and envelope times apply to newly triggered notes; cutoff and
/// resonance are also pushed to sounding voices once per block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceSettings {
    /// Oscillator waveform.
    pub waveform: Waveform,
    /// Filter cutoff in Hz.
    pub cutoff: f32,
    /// Filter resonance (0.0 to 1.0).
    pub resonance: f32,
    /// Attack time in milliseconds.
    pub attack_ms: f32,
    /// Decay time in milliseconds.
    pub decay_ms: f32,
    /// Sustain level (0.0 to 1.0).
    pub sustain: f32,
    /// Release time in milliseconds.
    pub release_ms: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            cutoff: 20000.0,
            resonance: 0.0,
            attack_ms: 10.0,
            decay_ms: 50.0,
            sustain: 0.7,
            release_ms: 200.0,
        }
    }
}

/// One sounding note.
///
/// A voice is *busy* while its envelope is not idle. The note number is held
/// only while busy; once the release reaches silence the voice reports no
/// note and is free to be claimed again.
///
/// # Example
///
/// ```rust
/// use kether_synth::{Voice, VoiceSettings};
///
/// let mut voice = Voice::new(48000.0);
/// voice.start(60, 100, 261.6, 0.8, &VoiceSettings::default());
/// assert!(voice.is_playing(60));
///
/// let mut left = [0.0f32; 64];
/// let mut right = [0.0f32; 64];
/// voice.render_accumulating(&mut [&mut left[..], &mut right[..]], 64);
/// assert_eq!(left, right);
/// ```
#[derive(Debug, Clone)]
pub struct Voice {
    oscillator: Oscillator,
    filter: StateVariableFilter,
    envelope: AdsrEnvelope,

    note: Option<u8>,
    velocity: u8,
    gain: f32,
}

impl Default for Voice {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl Voice {
    /// Create an idle voice.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            oscillator: Oscillator::new(sample_rate),
            filter: StateVariableFilter::new(sample_rate),
            envelope: AdsrEnvelope::new(sample_rate),
            note: None,
            velocity: 0,
            gain: 0.0,
        }
    }

    /// Set sample rate for all components.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.oscillator.set_sample_rate(sample_rate);
        self.filter.set_sample_rate(sample_rate);
        self.envelope.set_sample_rate(sample_rate);
    }

    /// Claim the voice for a note.
    ///
    /// Oscillator phase, triangle integrator and filter state are always
    /// reset, including when the same note is struck again, so a note always
    /// starts from the same state.
    pub fn start(
        &mut self,
        note: u8,
        velocity: u8,
        frequency: f32,
        gain: f32,
        settings: &VoiceSettings,
    ) {
        self.note = Some(note);
        self.velocity = velocity;
        self.gain = gain;

        self.oscillator.set_waveform(settings.waveform);
        self.oscillator.set_frequency(frequency);
        self.oscillator.reset();

        self.filter.set_params(settings.cutoff, settings.resonance);
        self.filter.reset();

        self.envelope.set_attack_ms(settings.attack_ms);
        self.envelope.set_decay_ms(settings.decay_ms);
        self.envelope.set_sustain(settings.sustain);
        self.envelope.set_release_ms(settings.release_ms);
        self.envelope.gate_on();
    }

    /// Enter the release stage.
    pub fn release(&mut self) {
        self.envelope.gate_off();
    }

    /// Silence the voice immediately and free it.
    pub fn kill(&mut self) {
        self.envelope.reset();
        self.note = None;
    }

    /// Return to the freshly constructed state.
    pub fn reset(&mut self) {
        self.kill();
        self.velocity = 0;
        self.gain = 0.0;
        self.oscillator.reset();
        self.filter.reset();
    }

    /// Whether the envelope is producing sound.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.envelope.is_active()
    }

    /// Whether the voice is busy with `note`.
    #[inline]
    pub fn is_playing(&self, note: u8) -> bool {
        self.is_busy() && self.note == Some(note)
    }

    /// Note held by the voice, `None` when free.
    pub fn note(&self) -> Option<u8> {
        self.note
    }

    /// Velocity of the current (or last) note.
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// Per-note gain.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Oscillator frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.oscillator.frequency()
    }

    /// The voice's oscillator.
    pub fn oscillator(&self) -> &Oscillator {
        &self.oscillator
    }

    /// The voice's filter.
    pub fn filter(&self) -> &StateVariableFilter {
        &self.filter
    }

    /// The voice's amplitude envelope.
    pub fn envelope(&self) -> &AdsrEnvelope {
        &self.envelope
    }

    /// Update filter cutoff and resonance (block-rate modulation target).
    #[inline]
    pub fn set_filter(&mut self, cutoff: f32, resonance: f32) {
        self.filter.set_params(cutoff, resonance);
    }

    /// Generate one sample, before output attenuation.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let osc = self.oscillator.advance();
        let filtered = self.filter.process(osc);
        let level = self.envelope.advance();
        filtered * level * self.gain
    }

    /// Add `frames` samples into every channel of `outputs`.
    ///
    /// Frames beyond the shortest channel are not rendered. The voice frees
    /// itself if its envelope reaches idle.
    pub fn render_accumulating(&mut self, outputs: &mut [&mut [f32]], frames: usize) {
        let frames = outputs
            .iter()
            .map(|ch| ch.len())
            .min()
            .map_or(frames, |len| len.min(frames));

        for i in 0..frames {
            if !self.is_busy() {
                break;
            }
            let sample = self.next_sample() * VOICE_OUTPUT_SCALE;
            for channel in outputs.iter_mut() {
                channel[i] += sample;
            }
        }

        if !self.is_busy() {
            self.note = None;
        }
    }
}
