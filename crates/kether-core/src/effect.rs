//! Core Effect trait and related types.
//!
//! The [`Effect`] trait is the seam between the block processor and every
//! per-channel, sample-by-sample processor in the post-mix chain (filters,
//! delay, reverb).
//!
//! ## Design Decisions
//!
//! - **Mono processing**: Single `f32` input/output. Stereo processing is
//!   built from one instance per channel so left and right keep fully
//!   independent state.
//!
//! - **Object-safe**: `dyn Effect` works for runtime chains, while
//!   [`EffectExt::chain`] gives static dispatch for fixed chains.
//!
//! - **No allocations**: All methods are callable from the audio path.

/// Core trait for all audio effects.
///
/// # Example
///
/// ```rust
/// use kether_core::Effect;
///
/// struct Gain {
///     gain: f32,
/// }
///
/// impl Effect for Gain {
///     fn process(&mut self, input: f32) -> f32 {
///         input * self.gain
///     }
///
///     fn set_sample_rate(&mut self, _sample_rate: f32) {}
///
///     fn reset(&mut self) {}
/// }
/// ```
pub trait Effect {
    /// Process a single sample.
    fn process(&mut self, input: f32) -> f32;

    /// Process a block of samples in-place.
    fn process_block_inplace(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Update the sample rate.
    ///
    /// Effects recalculate any sample-rate-dependent coefficients here.
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Reset internal state (delay lines, filter history) without changing
    /// parameters.
    fn reset(&mut self);
}

/// Extension trait for chaining effects.
pub trait EffectExt: Effect + Sized {
    /// Chain this effect with another. The output of `self` feeds `next`.
    ///
    /// # Example
    /// ```rust,ignore
    /// let chain = delay.chain(reverb);
    /// ```
    fn chain<E: Effect>(self, next: E) -> Chain<Self, E> {
        Chain {
            first: self,
            second: next,
        }
    }
}

impl<T: Effect> EffectExt for T {}

/// Two effects chained in series.
///
/// Created by [`EffectExt::chain`].
#[derive(Debug, Clone)]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A: Effect, B: Effect> Effect for Chain<A, B> {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let mid = self.first.process(input);
        self.second.process(mid)
    }

    fn process_block_inplace(&mut self, buffer: &mut [f32]) {
        self.first.process_block_inplace(buffer);
        self.second.process_block_inplace(buffer);
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.first.set_sample_rate(sample_rate);
        self.second.set_sample_rate(sample_rate);
    }

    fn reset(&mut self) {
        self.first.reset();
        self.second.reset();
    }
}

impl<A, B> Chain<A, B> {
    /// Get a reference to the first effect in the chain.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// Get a mutable reference to the first effect in the chain.
    pub fn first_mut(&mut self) -> &mut A {
        &mut self.first
    }

    /// Get a reference to the second effect in the chain.
    pub fn second(&self) -> &B {
        &self.second
    }

    /// Get a mutable reference to the second effect in the chain.
    pub fn second_mut(&mut self) -> &mut B {
        &mut self.second
    }
}
