//! Engine errors.
//!
//! Only (re)initialization can fail. Everything on the audio path clamps or
//! ignores bad input instead.

/// Errors returned by [`Engine::new`](crate::Engine::new) and
/// [`Engine::reset`](crate::Engine::reset).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineError {
    /// Sample rate was zero, negative, NaN or infinite.
    InvalidSampleRate(f32),
    /// Block size was zero.
    InvalidBlockSize(usize),
}

impl core::fmt::Display for EngineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidSampleRate(sr) => {
                write!(f, "sample rate must be positive and finite, got {sr}")
            }
            Self::InvalidBlockSize(n) => write!(f, "block size must be at least 1, got {n}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EngineError {}
