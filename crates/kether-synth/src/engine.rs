//! Block processor: the complete polyphonic engine.
//!
//! Per block, in order:
//!
//! 1. Zero every output channel.
//! 2. Advance both LFOs by the block length and evaluate the modulation
//!    matrix once.
//! 3. Render every busy voice with the modulated filter settings, summed
//!    into all channels.
//! 4. Per frame, per channel: character shaping, master gain, then that
//!    channel's `delay → reverb` chain.
//!
//! Nothing in [`Engine::process_block`] allocates or locks.

use crate::character::{BusShaper, CharacterControls, PostMixShaper};
use crate::command::{CC_MOD_WHEEL, Command};
use crate::effects::EffectsChain;
use crate::error::EngineError;
use crate::mod_matrix::{ModAccumulators, ModulationMatrix, ModulationSlot, ModulationValues};
use crate::oscillator::Waveform;
use crate::params::SynthParam;
use crate::scale::{BASE_FREQUENCY, Scale, ScaleSystem};
use crate::voice::{Voice, VoiceSettings};
use crate::voice_pool::{NoteOnOutcome, VoicePool};
use kether_core::{Lfo, LfoWaveform, octaves_to_ratio};
use libm::roundf;

/// Polyphonic synthesis engine.
///
/// Owns every voice, the modulation state, the character stage and the
/// effects. All parameter setters clamp to the ranges published by
/// [`SynthParam::spec`].
///
/// # Example
///
/// ```rust
/// use kether_synth::Engine;
///
/// let mut engine = Engine::new(44100.0, 512).unwrap();
/// engine.note_on(60, 100);
///
/// let mut left = vec![0.0f32; 512];
/// let mut right = vec![0.0f32; 512];
/// engine.process_block(&mut [&mut left[..], &mut right[..]]);
///
/// assert!(left.iter().any(|&s| s != 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct Engine<B: BusShaper = PostMixShaper> {
    sample_rate: f32,
    /// Largest block the host announced at reset (informational)
    block_size: usize,

    pool: VoicePool,
    /// Copied into each voice at note-on
    settings: VoiceSettings,
    scales: ScaleSystem,

    matrix: ModulationMatrix,
    mod_values: ModulationValues,
    /// Accumulators from the most recent block
    last_mods: ModAccumulators,
    lfo1: Lfo,
    lfo2: Lfo,

    character: CharacterControls,
    shaper: B,
    effects: EffectsChain,

    timbre_shift: f32,
    gain: f32,
    mpe_enabled: bool,
}

impl Engine {
    /// Create an engine with the post-mix character stage.
    pub fn new(sample_rate: f32, block_size: usize) -> Result<Self, EngineError> {
        Self::with_shaper(sample_rate, block_size, PostMixShaper::default())
    }
}

impl<B: BusShaper> Engine<B> {
    /// Create an engine with a custom bus shaper.
    pub fn with_shaper(
        sample_rate: f32,
        block_size: usize,
        shaper: B,
    ) -> Result<Self, EngineError> {
        validate(sample_rate, block_size)?;

        let mut lfo1 = Lfo::new(sample_rate, SynthParam::Lfo1Rate.spec().default);
        lfo1.set_waveform(LfoWaveform::Sine);
        let mut lfo2 = Lfo::new(sample_rate, SynthParam::Lfo2Rate.spec().default);
        lfo2.set_waveform(LfoWaveform::Sine);

        #[cfg(feature = "tracing")]
        tracing::debug!("engine_new: {sample_rate} Hz, block {block_size}");

        Ok(Self {
            sample_rate,
            block_size,
            pool: VoicePool::new(sample_rate),
            settings: VoiceSettings::default(),
            scales: ScaleSystem::new(),
            matrix: ModulationMatrix::new(),
            mod_values: ModulationValues::default(),
            last_mods: ModAccumulators::default(),
            lfo1,
            lfo2,
            character: CharacterControls::default(),
            shaper,
            effects: EffectsChain::new(sample_rate),
            timbre_shift: SynthParam::TimbreShift.spec().default,
            gain: SynthParam::Gain.spec().default,
            mpe_enabled: false,
        })
    }

    /// Prepare for a (possibly new) sample rate and clear all running state.
    ///
    /// Voices are freed, delay and reverb buffers are reallocated and
    /// cleared, LFO and motion phases restart, and the modulation routings
    /// return to their defaults. Parameters and the scale are kept. On error
    /// nothing is changed.
    ///
    /// Allocates; call only while audio is stopped.
    pub fn reset(&mut self, sample_rate: f32, block_size: usize) -> Result<(), EngineError> {
        validate(sample_rate, block_size)?;

        self.sample_rate = sample_rate;
        self.block_size = block_size;

        self.pool.set_sample_rate(sample_rate);
        self.pool.reset();
        self.lfo1.set_sample_rate(sample_rate);
        self.lfo1.reset();
        self.lfo2.set_sample_rate(sample_rate);
        self.lfo2.reset();
        self.effects.set_sample_rate(sample_rate);
        self.effects.reset();
        self.shaper.reset();
        self.matrix.reset();

        self.mod_values = ModulationValues::default();
        self.last_mods = ModAccumulators::default();

        #[cfg(feature = "tracing")]
        tracing::debug!("engine_reset: {sample_rate} Hz, block {block_size}");

        Ok(())
    }

    // Audio

    /// Render one block into `outputs`.
    ///
    /// Every channel is overwritten. The block length is the shortest
    /// channel; an empty channel list renders nothing. With a single channel
    /// no stereo widening is applied.
    pub fn process_block(&mut self, outputs: &mut [&mut [f32]]) {
        for channel in outputs.iter_mut() {
            channel.fill(0.0);
        }
        let frames = outputs.iter().map(|c| c.len()).min().unwrap_or(0);
        if frames == 0 {
            return;
        }

        self.mod_values.lfo1 = self.lfo1.advance(frames);
        self.mod_values.lfo2 = self.lfo2.advance(frames);
        self.last_mods = self.matrix.evaluate(&self.mod_values);

        let (cutoff, resonance) = self.modulated_filter();
        self.pool.render(outputs, frames, cutoff, resonance);

        let channels = outputs.len();
        for frame in 0..frames {
            self.shaper.begin_frame(&self.character);
            for (channel, buffer) in outputs.iter_mut().enumerate() {
                let shaped = self
                    .shaper
                    .shape(&self.character, buffer[frame], channel, channels);
                buffer[frame] = self.effects.process(channel, shaped * self.gain);
            }
        }
    }

    /// Apply `commands` in order, then render one block.
    pub fn process_block_with(&mut self, commands: &[Command], outputs: &mut [&mut [f32]]) {
        for command in commands {
            self.apply(*command);
        }
        self.process_block(outputs);
    }

    /// Apply a single command.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::NoteOn { note, velocity } => {
                self.note_on(note, velocity);
            }
            Command::NoteOff { note } => {
                self.note_off(note);
            }
            Command::ControlChange { controller, value } => {
                self.control_change(controller, value);
            }
            Command::SetParam { param, value } => self.set_param(param, value),
            Command::SetModSlot { index, slot } => {
                self.set_mod_slot(index, slot);
            }
            Command::AllNotesOff => self.all_notes_off(),
        }
    }

    // Events

    /// Start a note.
    ///
    /// The frequency comes from the active scale, shifted by the timbre
    /// shift; the voice gain is `velocity / 127 × (0.5 + warmth / 2)`.
    /// Velocity 0 releases the note instead and returns `None`.
    pub fn note_on(&mut self, note: u8, velocity: u8) -> Option<NoteOnOutcome> {
        if velocity == 0 {
            self.note_off(note);
            return None;
        }
        let velocity = velocity.min(127);

        let frequency = self.scales.frequency_for_note(note, BASE_FREQUENCY)
            * octaves_to_ratio(self.timbre_shift * 0.1);
        let gain = f32::from(velocity) / 127.0 * (0.5 + self.character.warmth() * 0.5);

        let outcome = self
            .pool
            .note_on(note, velocity, frequency, gain, &self.settings);

        #[cfg(feature = "tracing")]
        if outcome == NoteOnOutcome::Dropped {
            tracing::trace!("note_on: dropped note {note}, all voices busy");
        }

        Some(outcome)
    }

    /// Release a note. Returns how many voices were released.
    pub fn note_off(&mut self, note: u8) -> usize {
        self.pool.note_off(note)
    }

    /// Handle a MIDI control change. Only the mod wheel (CC1) is used.
    pub fn control_change(&mut self, controller: u8, value: u8) {
        if controller == CC_MOD_WHEEL {
            self.mod_values.mod_wheel = f32::from(value.min(127)) / 127.0;
        } else {
            #[cfg(feature = "tracing")]
            tracing::trace!("control_change: ignoring CC{controller}");
        }
    }

    /// Silence and free every voice immediately.
    pub fn all_notes_off(&mut self) {
        self.pool.all_notes_off();
    }

    // Parameters by id

    /// Set a parameter from a plain value, clamped to its range. Choice
    /// parameters round to the nearest index.
    pub fn set_param(&mut self, param: SynthParam, value: f32) {
        let value = param.spec().clamp(value);
        let index = roundf(value) as usize;
        match param {
            SynthParam::Waveform => self.set_waveform_index(index),
            SynthParam::TimbreShift => self.set_timbre_shift(value),
            SynthParam::FilterCutoff => self.set_filter_cutoff(value),
            SynthParam::FilterResonance => self.set_filter_resonance(value),
            SynthParam::Attack => self.set_attack_ms(value),
            SynthParam::Decay => self.set_decay_ms(value),
            SynthParam::Sustain => self.set_sustain(value),
            SynthParam::Release => self.set_release_ms(value),
            SynthParam::DelayTime => self.set_delay_time_ms(value),
            SynthParam::DelayFeedback => self.set_delay_feedback(value),
            SynthParam::DelayMix => self.set_delay_mix(value),
            SynthParam::ReverbMix => self.set_reverb_mix(value),
            SynthParam::Lfo1Rate => self.set_lfo1_rate(value),
            SynthParam::Lfo1Waveform => self.set_lfo1_waveform_index(index),
            SynthParam::Lfo2Rate => self.set_lfo2_rate(value),
            SynthParam::Lfo2Waveform => self.set_lfo2_waveform_index(index),
            SynthParam::Brilliance => self.set_brilliance(value),
            SynthParam::Motion => self.set_motion(value),
            SynthParam::Space => self.set_space(value),
            SynthParam::Warmth => self.set_warmth(value),
            SynthParam::Purity => self.set_purity(value),
            SynthParam::VoiceCount => self.set_voice_count(index),
            SynthParam::Scale => self.set_scale_index(index),
            SynthParam::Gain => self.set_gain(value),
            SynthParam::MpeEnabled => self.set_mpe_enabled(value >= 0.5),
        }
    }

    /// Current plain value of a parameter.
    pub fn param(&self, param: SynthParam) -> f32 {
        match param {
            SynthParam::Waveform => self.settings.waveform.index() as f32,
            SynthParam::TimbreShift => self.timbre_shift,
            SynthParam::FilterCutoff => self.settings.cutoff,
            SynthParam::FilterResonance => self.settings.resonance,
            SynthParam::Attack => self.settings.attack_ms,
            SynthParam::Decay => self.settings.decay_ms,
            SynthParam::Sustain => self.settings.sustain,
            SynthParam::Release => self.settings.release_ms,
            SynthParam::DelayTime => self.effects.delay().time_ms(),
            SynthParam::DelayFeedback => self.effects.delay().feedback(),
            SynthParam::DelayMix => self.effects.delay().mix(),
            SynthParam::ReverbMix => self.effects.reverb().mix(),
            SynthParam::Lfo1Rate => self.lfo1.rate(),
            SynthParam::Lfo1Waveform => self.lfo1.waveform().index() as f32,
            SynthParam::Lfo2Rate => self.lfo2.rate(),
            SynthParam::Lfo2Waveform => self.lfo2.waveform().index() as f32,
            SynthParam::Brilliance => self.character.brilliance(),
            SynthParam::Motion => self.character.motion(),
            SynthParam::Space => self.character.space(),
            SynthParam::Warmth => self.character.warmth(),
            SynthParam::Purity => self.character.purity(),
            SynthParam::VoiceCount => self.pool.voice_count() as f32,
            SynthParam::Scale => self.scales.scale().index() as f32,
            SynthParam::Gain => self.gain,
            SynthParam::MpeEnabled => {
                if self.mpe_enabled {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    // Voice settings

    /// Set the waveform used by subsequent notes.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.settings.waveform = waveform;
    }

    /// Set the waveform by index. Out-of-range indices are ignored.
    pub fn set_waveform_index(&mut self, index: usize) {
        match Waveform::from_index(index) {
            Some(waveform) => self.settings.waveform = waveform,
            None => rejected_index("waveform", index),
        }
    }

    /// Waveform used by subsequent notes.
    pub fn waveform(&self) -> Waveform {
        self.settings.waveform
    }

    /// Set timbre shift (-1.0 to 1.0); new notes are pitched by
    /// `2^(shift × 0.1)`.
    pub fn set_timbre_shift(&mut self, shift: f32) {
        self.timbre_shift = SynthParam::TimbreShift.spec().clamp(shift);
    }

    /// Set base filter cutoff in Hz (20 to 20000).
    pub fn set_filter_cutoff(&mut self, cutoff: f32) {
        self.settings.cutoff = SynthParam::FilterCutoff.spec().clamp(cutoff);
    }

    /// Set base filter resonance (0.0 to 1.0).
    pub fn set_filter_resonance(&mut self, resonance: f32) {
        self.settings.resonance = SynthParam::FilterResonance.spec().clamp(resonance);
    }

    /// Set attack time for subsequent notes.
    pub fn set_attack_ms(&mut self, ms: f32) {
        self.settings.attack_ms = SynthParam::Attack.spec().clamp(ms);
    }

    /// Set decay time for subsequent notes.
    pub fn set_decay_ms(&mut self, ms: f32) {
        self.settings.decay_ms = SynthParam::Decay.spec().clamp(ms);
    }

    /// Set sustain level for subsequent notes.
    pub fn set_sustain(&mut self, level: f32) {
        self.settings.sustain = SynthParam::Sustain.spec().clamp(level);
    }

    /// Set release time for subsequent notes.
    pub fn set_release_ms(&mut self, ms: f32) {
        self.settings.release_ms = SynthParam::Release.spec().clamp(ms);
    }

    /// Settings copied into voices at note-on.
    pub fn voice_settings(&self) -> &VoiceSettings {
        &self.settings
    }

    // Effects

    /// Set delay time in milliseconds.
    pub fn set_delay_time_ms(&mut self, ms: f32) {
        self.effects
            .set_delay_time_ms(SynthParam::DelayTime.spec().clamp(ms));
    }

    /// Set delay feedback.
    pub fn set_delay_feedback(&mut self, feedback: f32) {
        self.effects.set_delay_feedback(feedback);
    }

    /// Set delay wet/dry mix.
    pub fn set_delay_mix(&mut self, mix: f32) {
        self.effects.set_delay_mix(mix);
    }

    /// Set reverb wet/dry mix.
    pub fn set_reverb_mix(&mut self, mix: f32) {
        self.effects.set_reverb_mix(mix);
    }

    /// Delay and reverb chains.
    pub fn effects(&self) -> &EffectsChain {
        &self.effects
    }

    // LFOs

    /// Set LFO 1 rate in Hz.
    pub fn set_lfo1_rate(&mut self, rate_hz: f32) {
        self.lfo1.set_rate(rate_hz);
    }

    /// Set LFO 1 waveform.
    pub fn set_lfo1_waveform(&mut self, waveform: LfoWaveform) {
        self.lfo1.set_waveform(waveform);
    }

    /// Set LFO 1 waveform by index. Out-of-range indices are ignored.
    pub fn set_lfo1_waveform_index(&mut self, index: usize) {
        match LfoWaveform::from_index(index) {
            Some(waveform) => self.lfo1.set_waveform(waveform),
            None => rejected_index("lfo1_waveform", index),
        }
    }

    /// Set LFO 2 rate in Hz.
    pub fn set_lfo2_rate(&mut self, rate_hz: f32) {
        self.lfo2.set_rate(rate_hz);
    }

    /// Set LFO 2 waveform.
    pub fn set_lfo2_waveform(&mut self, waveform: LfoWaveform) {
        self.lfo2.set_waveform(waveform);
    }

    /// Set LFO 2 waveform by index. Out-of-range indices are ignored.
    pub fn set_lfo2_waveform_index(&mut self, index: usize) {
        match LfoWaveform::from_index(index) {
            Some(waveform) => self.lfo2.set_waveform(waveform),
            None => rejected_index("lfo2_waveform", index),
        }
    }

    // Character

    /// Set brilliance.
    pub fn set_brilliance(&mut self, value: f32) {
        self.character.set_brilliance(value);
    }

    /// Set motion.
    pub fn set_motion(&mut self, value: f32) {
        self.character.set_motion(value);
    }

    /// Set space.
    pub fn set_space(&mut self, value: f32) {
        self.character.set_space(value);
    }

    /// Set warmth. Also scales the gain of subsequent notes.
    pub fn set_warmth(&mut self, value: f32) {
        self.character.set_warmth(value);
    }

    /// Set purity.
    pub fn set_purity(&mut self, value: f32) {
        self.character.set_purity(value);
    }

    /// Current character control values.
    pub fn character(&self) -> &CharacterControls {
        &self.character
    }

    /// The bus shaper.
    pub fn shaper(&self) -> &B {
        &self.shaper
    }

    // Global

    /// Set how many voices are scanned (1 to 16).
    pub fn set_voice_count(&mut self, count: usize) {
        self.pool.set_voice_count(count);
    }

    /// Select the tuning scale for subsequent notes.
    pub fn set_scale(&mut self, scale: Scale) {
        self.scales.set_scale(scale);
    }

    /// Select the scale by index. Out-of-range indices are ignored.
    pub fn set_scale_index(&mut self, index: usize) {
        match Scale::from_index(index) {
            Some(scale) => self.scales.set_scale(scale),
            None => rejected_index("scale", index),
        }
    }

    /// Active scale.
    pub fn scale(&self) -> Scale {
        self.scales.scale()
    }

    /// Set master gain (0.0 to 1.0).
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = SynthParam::Gain.spec().clamp(gain);
    }

    /// Master gain.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Record the MPE flag. Stored only; no DSP reads it.
    pub fn set_mpe_enabled(&mut self, enabled: bool) {
        self.mpe_enabled = enabled;
    }

    /// MPE flag.
    pub fn mpe_enabled(&self) -> bool {
        self.mpe_enabled
    }

    // Modulation

    /// Replace a modulation slot. Returns `false` when `index` is out of
    /// range.
    pub fn set_mod_slot(&mut self, index: usize, slot: ModulationSlot) -> bool {
        self.matrix.set_slot(index, slot)
    }

    /// The modulation matrix.
    pub fn mod_matrix(&self) -> &ModulationMatrix {
        &self.matrix
    }

    /// Source values used by the most recent block.
    pub fn mod_values(&self) -> &ModulationValues {
        &self.mod_values
    }

    /// Accumulators produced by the most recent block.
    pub fn last_modulation(&self) -> &ModAccumulators {
        &self.last_mods
    }

    // State

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Block size announced at the last reset.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Every voice in the pool.
    pub fn voices(&self) -> &[Voice] {
        self.pool.voices()
    }

    /// Number of busy scanned voices.
    pub fn active_voice_count(&self) -> usize {
        self.pool.active_voice_count()
    }

    /// Filter cutoff and resonance after block-rate modulation.
    ///
    /// Cutoff moves by `2^(mod × 4)` (±4 octaves at full scale), resonance
    /// adds linearly.
    fn modulated_filter(&self) -> (f32, f32) {
        let cutoff = (self.settings.cutoff * octaves_to_ratio(self.last_mods.filter_cutoff * 4.0))
            .clamp(20.0, 20000.0);
        let resonance = (self.settings.resonance + self.last_mods.filter_resonance).clamp(0.0, 1.0);
        (cutoff, resonance)
    }
}

fn validate(sample_rate: f32, block_size: usize) -> Result<(), EngineError> {
    let result = if !(sample_rate.is_finite() && sample_rate > 0.0) {
        Err(EngineError::InvalidSampleRate(sample_rate))
    } else if block_size == 0 {
        Err(EngineError::InvalidBlockSize(block_size))
    } else {
        Ok(())
    };

    #[cfg(feature = "tracing")]
    if let Err(e) = &result {
        tracing::debug!("engine_validate: {e}");
    }

    result
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn rejected_index(param: &str, index: usize) {
    #[cfg(feature = "tracing")]
    tracing::trace!("set_param: ignoring {param} index {index}");
}
