//! # Delay Line (Ring Buffer)
//!
//! A delay line stores audio samples so they can be played back later.
//! It is the building block of every delay, echo and reverb effect.
//!
//! ## Block-Based Ring Buffer
//!
//! Picture a circular tape loop of fixed length. The host hands us audio
//! in blocks (typically 64–1024 samples), so instead of moving one sample
//! at a time we copy whole blocks onto the tape:
//!
//! ```text
//!            cursor                         capacity
//!   ┌──────────┬──────────────────┬────────────┐
//!   │   old    │  current block   │    old     │
//!   └──────────┴──────────────────┴────────────┘
//! ```
//!
//! When a block runs past the end of the tape, the operation is split in
//! two contiguous pieces: `[cursor, capacity)` and then `[0, rest)`.
//!
//! ```text
//!   ┌────┬─────────────────────────────┬────────┐
//!   │rest│            old              │ head   │
//!   └────┴─────────────────────────────┴────────┘
//!    ▲ second piece                     ▲ first piece (cursor..capacity)
//! ```
//!
//! This line owns no cursor. The engine keeps a single write cursor shared
//! by every channel and passes positions in explicitly.
//!
//! ## Gain Ramps
//!
//! The additive operations take a start and an end gain. Sample `i` of an
//! `n`-sample operation is scaled by
//!
//! ```text
//! gain(i) = start + (end - start) * i / n
//! ```
//!
//! With `start == end` this is a constant gain.

use std::collections::TryReserveError;
use std::ops::Range;

use nih_plug::nih_debug_assert;

/// A fixed-capacity circular sample buffer for one audio channel.
///
/// The buffer is allocated once, in the engine's configure step, so no
/// memory allocation ever happens while processing audio.
pub struct DelayLine {
    /// The ring. All values start at 0.0 (silence).
    samples: Vec<f32>,
}

impl DelayLine {
    /// Allocate a silent delay line holding `capacity` samples.
    ///
    /// Uses `try_reserve_exact` so an out-of-memory condition (or an
    /// absurd capacity) comes back as an error instead of aborting the
    /// host process.
    pub fn try_new(capacity: usize) -> Result<Self, TryReserveError> {
        let mut samples = Vec::new();
        samples.try_reserve_exact(capacity)?;
        samples.resize(capacity, 0.0);
        Ok(Self { samples })
    }

    /// Number of samples the ring can hold.
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Overwrite `source.len()` samples starting at `cursor`.
    pub fn write_replace(&mut self, cursor: usize, source: &[f32]) {
        let (head, tail) = self.spans(cursor, source.len());
        let split = head.len();

        self.samples[head].copy_from_slice(&source[..split]);
        self.samples[tail].copy_from_slice(&source[split..]);
    }

    /// Add `source[i] * gain(i)` into the ring at `cursor + i`.
    pub fn write_add_ramped(
        &mut self,
        cursor: usize,
        source: &[f32],
        gain_start: f32,
        gain_end: f32,
    ) {
        let ramp = Ramp::new(gain_start, gain_end, source.len());
        let (head, tail) = self.spans(cursor, source.len());
        let split = head.len();

        for (i, (slot, sample)) in self.samples[head].iter_mut().zip(source).enumerate() {
            *slot += sample * ramp.at(i);
        }
        for (i, (slot, sample)) in self.samples[tail]
            .iter_mut()
            .zip(&source[split..])
            .enumerate()
        {
            *slot += sample * ramp.at(split + i);
        }
    }

    /// Read `destination.len()` samples starting at `cursor` and add them,
    /// scaled by the ramp, into `destination`.
    ///
    /// To start writing at an offset into a larger buffer, pass the
    /// sub-slice `&mut buffer[offset..offset + len]`.
    pub fn read_add_ramped(
        &self,
        destination: &mut [f32],
        cursor: usize,
        gain_start: f32,
        gain_end: f32,
    ) {
        let ramp = Ramp::new(gain_start, gain_end, destination.len());
        let (head, tail) = self.spans(cursor, destination.len());
        let split = head.len();

        let (dest_head, dest_tail) = destination.split_at_mut(split);
        for (i, (out, sample)) in dest_head.iter_mut().zip(&self.samples[head]).enumerate() {
            *out += sample * ramp.at(i);
        }
        for (i, (out, sample)) in dest_tail.iter_mut().zip(&self.samples[tail]).enumerate() {
            *out += sample * ramp.at(split + i);
        }
    }

    /// Feed the ring back into itself: for `i` in `0..length`, add
    /// `ring[cursor + i - delay] * gain(i)` into `ring[cursor + i]`.
    ///
    /// Samples are visited in ascending order, so when `delay < length`
    /// the source of a later sample may be a slot this same call already
    /// fed back into. That is exactly the recursion of a feedback delay,
    /// `y[t] = x[t] + g * y[t - delay]`, and it keeps short delays correct
    /// even when they are shorter than the block.
    pub fn recirculate_ramped(
        &mut self,
        cursor: usize,
        delay: usize,
        length: usize,
        gain_start: f32,
        gain_end: f32,
    ) {
        let capacity = self.capacity();
        nih_debug_assert!(length <= capacity);
        nih_debug_assert!(delay < capacity);

        let ramp = Ramp::new(gain_start, gain_end, length);
        let mut write = cursor % capacity;
        let mut read = (write + capacity - delay % capacity) % capacity;

        for i in 0..length {
            let fed_back = self.samples[read] * ramp.at(i);
            self.samples[write] += fed_back;

            write += 1;
            if write == capacity {
                write = 0;
            }
            read += 1;
            if read == capacity {
                read = 0;
            }
        }
    }

    /// Clear the ring to silence.
    ///
    /// Called from the plugin's `reset()` so stale echoes don't bleed into
    /// the next playback.
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
    }

    /// Split a `length`-sample span starting at `cursor` into the part
    /// before the end of the ring and the part wrapped to the start. The
    /// second range is empty when nothing wraps.
    fn spans(&self, cursor: usize, length: usize) -> (Range<usize>, Range<usize>) {
        let capacity = self.capacity();
        nih_debug_assert!(length <= capacity);
        nih_debug_assert!(cursor < capacity);

        let cursor = cursor % capacity;
        let to_end = capacity - cursor;
        if length <= to_end {
            (cursor..cursor + length, 0..0)
        } else {
            (cursor..capacity, 0..length - to_end)
        }
    }
}

/// Linear gain ramp across an `n`-sample span.
#[derive(Clone, Copy)]
struct Ramp {
    start: f32,
    step: f32,
}

impl Ramp {
    fn new(start: f32, end: f32, length: usize) -> Self {
        let step = if length == 0 {
            0.0
        } else {
            (end - start) / length as f32
        };
        Self { start, step }
    }

    #[inline]
    fn at(&self, i: usize) -> f32 {
        self.start + self.step * i as f32
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn line_with(values: &[f32]) -> DelayLine {
        let mut dl = DelayLine::try_new(values.len()).unwrap();
        dl.write_replace(0, values);
        dl
    }

    #[test]
    fn test_new_line_is_silent() {
        let dl = DelayLine::try_new(64).unwrap();
        assert_eq!(dl.capacity(), 64);

        let mut out = [0.0; 64];
        dl.read_add_ramped(&mut out, 0, 1.0, 1.0);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_absurd_capacity_fails_to_allocate() {
        assert!(DelayLine::try_new(usize::MAX).is_err());
    }

    #[test]
    fn test_write_replace_without_wrap() {
        let mut dl = DelayLine::try_new(8).unwrap();
        dl.write_replace(2, &[1.0, 2.0, 3.0]);
        assert_eq!(dl.samples, [0.0, 0.0, 1.0, 2.0, 3.0, 0.0, 0.0, 0.0]);
    }

    /// A 4-sample write at position 6 of an 8-sample ring fills slots 6, 7
    /// and then wraps to 0, 1.
    #[test]
    fn test_write_replace_wraps() {
        let mut dl = DelayLine::try_new(8).unwrap();
        dl.write_replace(6, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(dl.samples, [3.0, 4.0, 0.0, 0.0, 0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_write_replace_full_capacity() {
        let mut dl = DelayLine::try_new(4).unwrap();
        dl.write_replace(3, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(dl.samples, [2.0, 3.0, 4.0, 1.0]);
    }

    #[test]
    fn test_write_add_constant_gain() {
        let mut dl = line_with(&[1.0, 1.0, 1.0, 1.0]);
        dl.write_add_ramped(3, &[2.0, 4.0], 0.5, 0.5);
        assert_eq!(dl.samples, [3.0, 1.0, 1.0, 2.0]);
    }

    /// The ramp keeps counting across the wrap: sample 2 of 4 gets gain
    /// 0.5 even though it lands at the start of the ring.
    #[test]
    fn test_write_add_ramp_continues_across_wrap() {
        let mut dl = DelayLine::try_new(6).unwrap();
        dl.write_add_ramped(4, &[1.0, 1.0, 1.0, 1.0], 0.0, 1.0);

        let expected = [0.5, 0.75, 0.0, 0.0, 0.0, 0.25];
        for (got, want) in dl.samples.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "Expected {want}, got {got}");
        }
    }

    #[test]
    fn test_read_add_accumulates_into_destination() {
        let dl = line_with(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut out = [10.0, 10.0];
        dl.read_add_ramped(&mut out, 1, 2.0, 2.0);
        assert_eq!(out, [14.0, 16.0]);
    }

    #[test]
    fn test_read_add_wraps() {
        let dl = line_with(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut out = [0.0; 4];
        dl.read_add_ramped(&mut out, 3, 1.0, 1.0);
        assert_eq!(out, [4.0, 5.0, 1.0, 2.0]);
    }

    /// Writing into a sub-slice is how a destination offset is expressed.
    #[test]
    fn test_read_add_into_sub_slice() {
        let dl = line_with(&[1.0, 2.0, 3.0]);
        let mut out = [0.0; 5];
        dl.read_add_ramped(&mut out[2..4], 0, 1.0, 1.0);
        assert_eq!(out, [0.0, 0.0, 1.0, 2.0, 0.0]);
    }

    /// With delay 2 and gain 0.5, an impulse at slot 0 recirculates into
    /// slot 2 (0.5) and then, within the same call, into slot 4 (0.25).
    #[test]
    fn test_recirculate_is_recursive_within_a_call() {
        let mut dl = line_with(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        dl.recirculate_ramped(2, 2, 4, 0.5, 0.5);

        let expected = [1.0, 0.0, 0.5, 0.0, 0.25, 0.0, 0.0, 0.0];
        for (got, want) in dl.samples.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "Expected {want}, got {got}");
        }
    }

    #[test]
    fn test_recirculate_reads_behind_the_wrap() {
        let mut dl = line_with(&[0.0, 0.0, 0.0, 0.0, 0.0, 2.0]);
        // Slot 1 reads slot (1 - 2) mod 6 = 5.
        dl.recirculate_ramped(0, 2, 3, 0.5, 0.5);
        assert!((dl.samples[1] - 1.0).abs() < 1e-6);
        assert_eq!(dl.samples[0], 0.0);
        assert_eq!(dl.samples[2], 0.0);
    }

    #[test]
    fn test_zero_gain_recirculation_is_a_no_op() {
        let mut dl = line_with(&[1.0, 2.0, 3.0, 4.0]);
        dl.recirculate_ramped(1, 1, 4, 0.0, 0.0);
        assert_eq!(dl.samples, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_clear() {
        let mut dl = line_with(&[0.5, -0.5, 0.25]);
        dl.clear();
        assert!(dl.samples.iter().all(|s| *s == 0.0));
        assert_eq!(dl.capacity(), 3);
    }
}
