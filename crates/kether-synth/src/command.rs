//! Events and parameter changes applied to the engine between blocks.
//!
//! A host collects [`Command`]s from its control and MIDI threads and hands
//! them to [`Engine::process_block_with`](crate::Engine::process_block_with),
//! which applies them in order on the audio thread before rendering. The
//! engine itself is never shared.

use crate::mod_matrix::ModulationSlot;
use crate::params::SynthParam;

/// MIDI controller number of the mod wheel.
pub const CC_MOD_WHEEL: u8 = 1;

/// One state change for the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Start a note. Velocity 0 is treated as a note-off.
    NoteOn {
        /// MIDI note number
        note: u8,
        /// MIDI velocity (0 to 127)
        velocity: u8,
    },
    /// Release a note.
    NoteOff {
        /// MIDI note number
        note: u8,
    },
    /// MIDI control change.
    ControlChange {
        /// Controller number
        controller: u8,
        /// Controller value (0 to 127)
        value: u8,
    },
    /// Set a parameter to a plain value.
    SetParam {
        /// Parameter to change
        param: SynthParam,
        /// Plain value in the parameter's own unit
        value: f32,
    },
    /// Replace a modulation slot.
    SetModSlot {
        /// Slot index
        index: usize,
        /// New routing
        slot: ModulationSlot,
    },
    /// Silence every voice immediately.
    AllNotesOff,
}

impl Command {
    /// Decode a three-byte channel voice message.
    ///
    /// Note-on, note-off and control change are recognized on any channel;
    /// everything else returns `None`. Data bytes are masked to 7 bits.
    ///
    /// ```rust
    /// use kether_synth::Command;
    ///
    /// assert_eq!(
    ///     Command::from_midi([0x90, 60, 100]),
    ///     Some(Command::NoteOn { note: 60, velocity: 100 })
    /// );
    /// assert_eq!(Command::from_midi([0xE0, 0, 64]), None);
    /// ```
    pub fn from_midi(bytes: [u8; 3]) -> Option<Self> {
        let data1 = bytes[1] & 0x7F;
        let data2 = bytes[2] & 0x7F;
        match bytes[0] & 0xF0 {
            0x80 => Some(Command::NoteOff { note: data1 }),
            0x90 => Some(Command::NoteOn {
                note: data1,
                velocity: data2,
            }),
            0xB0 => Some(Command::ControlChange {
                controller: data1,
                value: data2,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_midi_any_channel() {
        assert_eq!(
            Command::from_midi([0x83, 64, 0]),
            Some(Command::NoteOff { note: 64 })
        );
        assert_eq!(
            Command::from_midi([0x9F, 72, 1]),
            Some(Command::NoteOn {
                note: 72,
                velocity: 1
            })
        );
        assert_eq!(
            Command::from_midi([0xB0, CC_MOD_WHEEL, 127]),
            Some(Command::ControlChange {
                controller: 1,
                value: 127
            })
        );
    }

    #[test]
    fn test_from_midi_ignores_other_status() {
        assert_eq!(Command::from_midi([0xA0, 60, 10]), None);
        assert_eq!(Command::from_midi([0xF8, 0, 0]), None);
        assert_eq!(Command::from_midi([0x40, 60, 100]), None);
    }

    #[test]
    fn test_from_midi_masks_data_bytes() {
        assert_eq!(
            Command::from_midi([0x90, 0xBC, 0xFF]),
            Some(Command::NoteOn {
                note: 60,
                velocity: 127
            })
        );
    }
}
