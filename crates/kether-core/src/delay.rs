//! Ring-buffer delay line.
//!
//! The fundamental storage for the feedback delay effect and for the comb and
//! allpass filters of the reverb. The buffer is allocated once at
//! construction and never reallocates; reads and writes are O(1) and never
//! allocate.
//!
//! # Cursor convention
//!
//! [`DelayLine::read`] is called before [`DelayLine::write`] for the same
//! sample. `read(d)` returns the value written `d` samples ago for
//! `1 <= d < capacity`. A delay of 0 reads the slot about to be overwritten,
//! which holds the value written `capacity` samples ago.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Fixed-capacity ring buffer with a single write cursor.
///
/// # Example
///
/// ```rust
/// use kether_core::DelayLine;
///
/// let mut line = DelayLine::new(4);
/// line.write(1.0);
/// assert_eq!(line.read(1), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Create a delay line holding `capacity` samples.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Delay size must be > 0");

        Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
        }
    }

    /// Create a delay line long enough for `max_seconds` at `sample_rate`.
    pub fn from_time(sample_rate: f32, max_seconds: f32) -> Self {
        let samples = (sample_rate * max_seconds) as usize;
        Self::new(samples.max(1))
    }

    /// Read the sample `delay_samples` behind the write cursor.
    ///
    /// Requests beyond the buffer are clamped to `capacity - 1`.
    #[inline]
    pub fn read(&self, delay_samples: usize) -> f32 {
        let len = self.buffer.len();
        let delay = delay_samples.min(len - 1);
        let read_pos = (self.write_pos + len - delay) % len;
        self.buffer[read_pos]
    }

    /// Read the oldest sample in the line (written `capacity` samples ago).
    #[inline]
    pub fn read_oldest(&self) -> f32 {
        self.buffer[self.write_pos]
    }

    /// Write a sample at the cursor and advance it.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }
    }

    /// Current write cursor.
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Zero the buffer and rewind the cursor.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Capacity in samples.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_after_write() {
        let mut line = DelayLine::new(8);
        line.write(1.0);
        line.write(2.0);
        line.write(3.0);
        assert_eq!(line.read(1), 3.0);
        assert_eq!(line.read(2), 2.0);
        assert_eq!(line.read(3), 1.0);
        assert_eq!(line.read(4), 0.0);
    }

    #[test]
    fn test_delay_of_n_samples() {
        let mut line = DelayLine::new(100);
        let delay = 10;
        let mut outputs = [0.0f32; 30];
        for (i, out) in outputs.iter_mut().enumerate() {
            *out = line.read(delay);
            line.write(if i == 0 { 1.0 } else { 0.0 });
        }
        assert_eq!(outputs[10], 1.0);
        assert_eq!(outputs.iter().filter(|&&x| x != 0.0).count(), 1);
    }

    #[test]
    fn test_wraparound() {
        let mut line = DelayLine::new(4);
        for i in 0..10 {
            line.write(i as f32);
        }
        assert_eq!(line.write_pos(), 2);
        assert_eq!(line.read(1), 9.0);
        assert_eq!(line.read(3), 7.0);
        assert_eq!(line.read_oldest(), 6.0);
    }

    #[test]
    fn test_oversized_delay_is_clamped() {
        let mut line = DelayLine::new(4);
        for i in 1..=4 {
            line.write(i as f32);
        }
        assert_eq!(line.read(1000), line.read(3));
    }

    #[test]
    fn test_zero_delay_reads_oldest() {
        let mut line = DelayLine::new(3);
        line.write(5.0);
        line.write(6.0);
        line.write(7.0);
        assert_eq!(line.read(0), 5.0);
        assert_eq!(line.read(0), line.read_oldest());
    }

    #[test]
    fn test_clear() {
        let mut line = DelayLine::new(16);
        for _ in 0..20 {
            line.write(1.0);
        }
        line.clear();
        assert_eq!(line.write_pos(), 0);
        for d in 0..16 {
            assert_eq!(line.read(d), 0.0);
        }
    }

    #[test]
    fn test_from_time() {
        let line = DelayLine::from_time(44100.0, 2.0);
        assert_eq!(line.capacity(), 88200);
    }

    #[test]
    #[should_panic]
    fn test_zero_capacity_panics() {
        let _ = DelayLine::new(0);
    }
}
