//! Just-intonation pentatonic scale system.
//!
//! Nine built-in five-degree tunings, each a row of small-integer frequency
//! ratios relative to the tonic. Chromatic note numbers are folded onto the
//! five degrees by snapping every out-of-scale semitone down to the nearest
//! lower degree, then octaves are applied multiplicatively per five-degree
//! cycle.
//!
//! ```text
//! octave      = note / 12
//! degree      = CHROMATIC_TO_DEGREE[note % 12]
//! scale_index = octave * 5 + degree
//! freq        = base * ratio[scale_index % 5] * 2^(scale_index / 5)
//! ```

use libm::ldexpf;

/// Tonic frequency the engine feeds to [`ScaleSystem::frequency_for_note`]
/// (middle C, 261.6256 Hz).
pub const BASE_FREQUENCY: f32 = 261.6256;

/// Number of degrees in every scale.
pub const DEGREES_PER_OCTAVE: usize = 5;

/// Chromatic semitone (0-11) to scale degree (0-4), snapping down.
pub const CHROMATIC_TO_DEGREE: [usize; 12] = [0, 0, 1, 1, 2, 2, 2, 3, 3, 4, 4, 4];

const SCALE_RATIOS: [[f32; DEGREES_PER_OCTAVE]; 9] = [
    [1.0, 9.0 / 8.0, 4.0 / 3.0, 3.0 / 2.0, 5.0 / 3.0],
    [1.0, 9.0 / 8.0, 5.0 / 4.0, 3.0 / 2.0, 5.0 / 3.0],
    [1.0, 9.0 / 8.0, 4.0 / 3.0, 3.0 / 2.0, 16.0 / 9.0],
    [1.0, 9.0 / 8.0, 6.0 / 5.0, 3.0 / 2.0, 5.0 / 3.0],
    [1.0, 9.0 / 8.0, 4.0 / 3.0, 3.0 / 2.0, 27.0 / 16.0],
    [1.0, 6.0 / 5.0, 4.0 / 3.0, 3.0 / 2.0, 9.0 / 5.0],
    [1.0, 10.0 / 9.0, 5.0 / 4.0, 3.0 / 2.0, 5.0 / 3.0],
    [1.0, 7.0 / 6.0, 4.0 / 3.0, 3.0 / 2.0, 7.0 / 4.0],
    [1.0, 10.0 / 9.0, 4.0 / 3.0, 3.0 / 2.0, 5.0 / 3.0],
];

/// Built-in pentatonic tunings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Scale {
    /// 1, 9/8, 4/3, 3/2, 5/3
    #[default]
    JapaneseYo,
    /// 1, 9/8, 5/4, 3/2, 5/3
    ChineseGong,
    /// 1, 9/8, 4/3, 3/2, 16/9
    Celtic,
    /// 1, 9/8, 6/5, 3/2, 5/3
    IndonesianSlendro,
    /// 1, 9/8, 4/3, 3/2, 27/16
    ScottishHighland,
    /// 1, 6/5, 4/3, 3/2, 9/5 (minor pentatonic)
    MongolianThroat,
    /// 1, 10/9, 5/4, 3/2, 5/3
    EgyptianSacred,
    /// 1, 7/6, 4/3, 3/2, 7/4 (septimal)
    NativeAmerican,
    /// 1, 10/9, 4/3, 3/2, 5/3
    NordicAurora,
}

impl Scale {
    /// Number of built-in scales.
    pub const COUNT: usize = 9;

    /// All scales in index order.
    pub const ALL: [Scale; Self::COUNT] = [
        Scale::JapaneseYo,
        Scale::ChineseGong,
        Scale::Celtic,
        Scale::IndonesianSlendro,
        Scale::ScottishHighland,
        Scale::MongolianThroat,
        Scale::EgyptianSacred,
        Scale::NativeAmerican,
        Scale::NordicAurora,
    ];

    /// Scale for a parameter index, or `None` when out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Parameter index of this scale.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Scale::JapaneseYo => "Japanese Yo",
            Scale::ChineseGong => "Chinese Gong",
            Scale::Celtic => "Celtic",
            Scale::IndonesianSlendro => "Indonesian Slendro",
            Scale::ScottishHighland => "Scottish Highland",
            Scale::MongolianThroat => "Mongolian Throat",
            Scale::EgyptianSacred => "Egyptian Sacred",
            Scale::NativeAmerican => "Native American",
            Scale::NordicAurora => "Nordic Aurora",
        }
    }

    /// Stable snake-case identifier, used by patch files.
    pub fn id(self) -> &'static str {
        match self {
            Scale::JapaneseYo => "japanese_yo",
            Scale::ChineseGong => "chinese_gong",
            Scale::Celtic => "celtic",
            Scale::IndonesianSlendro => "indonesian_slendro",
            Scale::ScottishHighland => "scottish_highland",
            Scale::MongolianThroat => "mongolian_throat",
            Scale::EgyptianSacred => "egyptian_sacred",
            Scale::NativeAmerican => "native_american",
            Scale::NordicAurora => "nordic_aurora",
        }
    }

    /// Look a scale up by its [`id`](Self::id).
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.id() == id)
    }

    /// Frequency ratios of the five degrees, tonic first.
    pub fn ratios(self) -> &'static [f32; DEGREES_PER_OCTAVE] {
        &SCALE_RATIOS[self.index()]
    }
}

/// Maps note numbers to frequencies under the selected [`Scale`].
///
/// # Example
///
/// ```rust
/// use kether_synth::{Scale, ScaleSystem, BASE_FREQUENCY};
///
/// let mut scales = ScaleSystem::new();
/// scales.set_scale(Scale::MongolianThroat);
///
/// // Octave 0, degree 1
/// let f = scales.scale_note(1, BASE_FREQUENCY);
/// assert!((f - BASE_FREQUENCY * 6.0 / 5.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScaleSystem {
    scale: Scale,
}

impl ScaleSystem {
    /// Create a scale system tuned to [`Scale::JapaneseYo`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the active scale.
    pub fn set_scale(&mut self, scale: Scale) {
        self.scale = scale;
    }

    /// Active scale.
    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// Scale degree (0-4) for a chromatic semitone.
    ///
    /// Only the semitone class matters, so any value is reduced modulo 12.
    #[inline]
    pub fn map_chromatic_to_degree(semitone: u8) -> usize {
        CHROMATIC_TO_DEGREE[usize::from(semitone % 12)]
    }

    /// Frequency of an internal scale index: degree `index % 5` of octave
    /// `index / 5` above `base_freq`.
    #[inline]
    pub fn scale_note(&self, scale_index: u32, base_freq: f32) -> f32 {
        let ratio = self.scale.ratios()[scale_index as usize % DEGREES_PER_OCTAVE];
        let octave = (scale_index / DEGREES_PER_OCTAVE as u32) as i32;
        // Exact power-of-two scaling keeps octaves bit-identical multiples.
        ldexpf(base_freq * ratio, octave)
    }

    /// Frequency for a note number (0-127).
    #[inline]
    pub fn frequency_for_note(&self, note: u8, base_freq: f32) -> f32 {
        self.scale_note(Self::scale_index(note), base_freq)
    }

    /// Internal scale index of a note number.
    #[inline]
    pub fn scale_index(note: u8) -> u32 {
        let octave = u32::from(note / 12);
        let degree = Self::map_chromatic_to_degree(note) as u32;
        octave * DEGREES_PER_OCTAVE as u32 + degree
    }
}
