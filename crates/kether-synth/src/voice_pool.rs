//! Fixed-capacity voice pool.
//!
//! All [`MAX_VOICES`] voices are allocated once. Note-on claims the first
//! free voice in index order and never steals; when every scanned voice is
//! busy the note is dropped. Only the first `voice_count` voices are ever
//! scanned or rendered.

use crate::voice::{Voice, VoiceSettings};

/// Number of voices in the pool.
pub const MAX_VOICES: usize = 16;

/// Result of a note-on request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteOnOutcome {
    /// A free voice was claimed.
    Claimed(usize),
    /// A busy voice already playing the note was restarted.
    Retriggered(usize),
    /// Every scanned voice was busy; the note is not sounded.
    Dropped,
}

/// Arena of pre-allocated voices with first-free allocation.
///
/// # Example
///
/// ```rust
/// use kether_synth::{NoteOnOutcome, VoicePool, VoiceSettings};
///
/// let mut pool = VoicePool::new(48000.0);
/// pool.set_voice_count(1);
///
/// let settings = VoiceSettings::default();
/// assert_eq!(pool.note_on(60, 100, 261.6, 0.5, &settings), NoteOnOutcome::Claimed(0));
/// assert_eq!(pool.note_on(64, 100, 327.0, 0.5, &settings), NoteOnOutcome::Dropped);
/// ```
#[derive(Debug, Clone)]
pub struct VoicePool {
    voices: [Voice; MAX_VOICES],
    voice_count: usize,
}

impl VoicePool {
    /// Create a pool with 8 scanned voices.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: core::array::from_fn(|_| Voice::new(sample_rate)),
            voice_count: 8,
        }
    }

    /// Set sample rate for all voices.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        for voice in &mut self.voices {
            voice.set_sample_rate(sample_rate);
        }
    }

    /// Return every voice to its initial free state.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.reset();
        }
    }

    /// Set how many voices are scanned and rendered (1 to [`MAX_VOICES`]).
    ///
    /// Voices above a lowered count are silenced and freed, so raising the
    /// count again never resurrects a stale note.
    pub fn set_voice_count(&mut self, count: usize) {
        let count = count.clamp(1, MAX_VOICES);
        for voice in &mut self.voices[count..] {
            voice.kill();
        }
        self.voice_count = count;
    }

    /// Number of scanned voices.
    pub fn voice_count(&self) -> usize {
        self.voice_count
    }

    /// Total pool capacity.
    pub fn capacity(&self) -> usize {
        MAX_VOICES
    }

    /// All voices, including those beyond the scanned range.
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Busy voices within the scanned range.
    pub fn active_voice_count(&self) -> usize {
        self.scanned().iter().filter(|v| v.is_busy()).count()
    }

    /// Start a note.
    ///
    /// A busy voice already holding `note` is restarted in place, so a note
    /// number is never claimed by two busy voices. Otherwise the first free
    /// voice is claimed.
    pub fn note_on(
        &mut self,
        note: u8,
        velocity: u8,
        frequency: f32,
        gain: f32,
        settings: &VoiceSettings,
    ) -> NoteOnOutcome {
        let voices = &mut self.voices[..self.voice_count];

        if let Some(index) = voices.iter().position(|v| v.is_playing(note)) {
            voices[index].start(note, velocity, frequency, gain, settings);
            return NoteOnOutcome::Retriggered(index);
        }

        match voices.iter().position(|v| !v.is_busy()) {
            Some(index) => {
                voices[index].start(note, velocity, frequency, gain, settings);
                NoteOnOutcome::Claimed(index)
            }
            None => NoteOnOutcome::Dropped,
        }
    }

    /// Release every busy voice holding `note`. Returns how many were
    /// released.
    pub fn note_off(&mut self, note: u8) -> usize {
        let mut released = 0;
        for voice in self.scanned_mut() {
            if voice.is_playing(note) {
                voice.release();
                released += 1;
            }
        }
        released
    }

    /// Silence and free every voice immediately.
    pub fn all_notes_off(&mut self) {
        for voice in &mut self.voices {
            voice.kill();
        }
    }

    /// Render every busy scanned voice into `outputs`.
    ///
    /// `cutoff` and `resonance` are the block's modulated filter settings and
    /// are applied to each voice before it renders.
    pub fn render(
        &mut self,
        outputs: &mut [&mut [f32]],
        frames: usize,
        cutoff: f32,
        resonance: f32,
    ) {
        for voice in self.scanned_mut() {
            if voice.is_busy() {
                voice.set_filter(cutoff, resonance);
                voice.render_accumulating(outputs, frames);
            }
        }
    }

    fn scanned(&self) -> &[Voice] {
        &self.voices[..self.voice_count]
    }

    fn scanned_mut(&mut self) -> &mut [Voice] {
        &mut self.voices[..self.voice_count]
    }
}
