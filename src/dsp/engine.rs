//! # Delay Engine
//!
//! Drives one [`DelayLine`] per channel through the per-block sequence:
//!
//! ```text
//!  input ──► 1. FILL ─────► ring[w .. w+B] = x
//!            2. FEEDBACK ─► ring[t] += g * ring[t - d]      (t in block)
//!            3. READ ─────► out[i] += wet * ring[w + i - d]
//!  after all channels:
//!            4. ADVANCE ──► w = (w + B) mod capacity
//! ```
//!
//! `w` is the write cursor. It is shared by all channels and advanced
//! exactly once per block, after every channel has been read, so all
//! channels of a block see the same pre-advance value.
//!
//! The output is the dry input with the delayed signal *added* on top;
//! the dry part is never attenuated.
//!
//! ## Lifecycle
//!
//! The engine starts unconfigured and refuses to process. `configure()`
//! sizes every ring to a 2-second horizon (at least one maximum block)
//! and zeroes the cursor. Nothing allocates after that.

use nih_plug::nih_debug_assert;

use super::delay_line::DelayLine;
use super::error::EngineError;
use super::snapshot::{ms_to_samples, ParameterSnapshot};

/// Seconds of audio each ring can hold.
pub const HORIZON_SECONDS: f32 = 2.0;

/// Echo level (relative to the first repeat) treated as inaudible when
/// computing the tail: -60 dB.
const TAIL_FLOOR_LOG10: f32 = -3.0;

#[derive(Default)]
pub struct DelayEngine {
    /// One ring per channel. Empty while unconfigured.
    lines: Vec<DelayLine>,

    sample_rate: f32,

    max_block_size: usize,

    /// Where the start of the current block is written, in
    /// `[0, capacity)`.
    write_cursor: usize,
}

impl DelayEngine {
    /// Create an unconfigured engine. Call [`configure()`](Self::configure)
    /// before processing.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_configured(&self) -> bool {
        !self.lines.is_empty()
    }

    /// (Re)allocate the rings for a new sample rate, block size or channel
    /// count, and reset the write cursor.
    ///
    /// All new rings are allocated before any state is touched. If an
    /// allocation fails the engine keeps its previous configuration (or
    /// stays unconfigured).
    pub fn configure(
        &mut self,
        sample_rate: f32,
        max_block_size: usize,
        num_channels: usize,
    ) -> Result<(), EngineError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(EngineError::InvalidSampleRate(sample_rate));
        }
        if max_block_size == 0 {
            return Err(EngineError::InvalidConfig("maximum block size must be non-zero"));
        }
        if num_channels == 0 {
            return Err(EngineError::InvalidConfig("channel count must be non-zero"));
        }

        let capacity = Self::capacity_for(sample_rate, max_block_size);
        let lines = (0..num_channels)
            .map(|_| DelayLine::try_new(capacity))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| EngineError::Allocation { capacity, source })?;

        self.lines = lines;
        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.write_cursor = 0;

        Ok(())
    }

    /// Ring size for a configuration: the 2-second horizon, but never less
    /// than one maximum block.
    pub fn capacity_for(sample_rate: f32, max_block_size: usize) -> usize {
        let horizon = (sample_rate * HORIZON_SECONDS).round();
        // Float-to-int casts saturate, so absurd rates become usize::MAX
        // and fail in the allocator rather than wrapping.
        (horizon as usize).max(max_block_size)
    }

    /// Silence every ring and rewind the cursor without reallocating.
    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
        self.write_cursor = 0;
    }

    /// Ring capacity in samples, or 0 while unconfigured.
    pub fn capacity(&self) -> usize {
        self.lines.first().map_or(0, DelayLine::capacity)
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn num_channels(&self) -> usize {
        self.lines.len()
    }

    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    /// Process one block in place.
    ///
    /// `channels` holds one slice per channel, all of the same length `B`.
    /// On return each slice contains dry + wet audio and the write cursor
    /// has moved forward by `B`.
    pub fn process(
        &mut self,
        channels: &mut [&mut [f32]],
        snapshot: &ParameterSnapshot,
    ) -> Result<(), EngineError> {
        if !self.is_configured() {
            return Err(EngineError::Unconfigured);
        }
        if channels.len() > self.lines.len() {
            return Err(EngineError::TooManyChannels {
                got: channels.len(),
                configured: self.lines.len(),
            });
        }

        let block_len = channels.first().map_or(0, |c| c.len());
        if let Some((channel, samples)) = channels
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != block_len)
        {
            return Err(EngineError::RaggedBlock {
                channel,
                len: samples.len(),
                expected: block_len,
            });
        }

        let capacity = self.capacity();
        if block_len > capacity {
            return Err(EngineError::BlockTooLong {
                block_len,
                capacity,
            });
        }

        let params = snapshot.sanitized();
        let feedback = params.feedback_gain;
        let wet = params.wet_gain();
        let cursor = self.write_cursor;

        for (channel, (samples, line)) in channels.iter_mut().zip(&mut self.lines).enumerate() {
            let delay = Self::clamp_delay(
                params.channel_delay_samples(channel, self.sample_rate),
                capacity,
                block_len,
            );
            let read_cursor = Self::wrap_behind(cursor, delay, capacity);

            // 1. Capture the dry input where it will later be read back.
            line.write_replace(cursor, &samples[..]);

            // 2. Feed the delayed signal back on top of it.
            line.recirculate_ramped(cursor, delay, block_len, feedback, feedback);

            // 3. Blend the delayed signal onto the (still dry) output.
            line.read_add_ramped(&mut samples[..], read_cursor, wet, wet);
        }

        // 4. Advance once, after every channel has read.
        self.write_cursor = (cursor + block_len) % capacity;

        Ok(())
    }

    /// Ring index a channel reads from for a block starting at the
    /// current write cursor.
    pub fn read_cursor(&self, channel: usize, snapshot: &ParameterSnapshot, block_len: usize) -> usize {
        let capacity = self.capacity();
        if capacity == 0 {
            return 0;
        }

        let delay = Self::clamp_delay(
            snapshot
                .sanitized()
                .channel_delay_samples(channel, self.sample_rate),
            capacity,
            block_len,
        );
        Self::wrap_behind(self.write_cursor, delay, capacity)
    }

    /// How long, in samples, the effect keeps ringing after the input goes
    /// silent: enough repeats of the longest channel delay for the
    /// feedback loop to decay by 60 dB, or one delay period without
    /// feedback.
    pub fn tail_samples(&self, snapshot: &ParameterSnapshot) -> u32 {
        let params = snapshot.sanitized();
        let longest_ms = params.channel_delay_ms(self.lines.len().saturating_sub(1));
        let delay = ms_to_samples(longest_ms, self.sample_rate) as f32;

        let feedback = params.feedback_gain;
        if feedback >= 1.0 {
            return u32::MAX;
        }

        let repeats = if feedback > 0.001 {
            1.0 + TAIL_FLOOR_LOG10 / feedback.log10()
        } else {
            1.0
        };

        // Saturating cast.
        (repeats * delay) as u32
    }

    /// Keep a delay inside `[1, capacity - block_len]`.
    ///
    /// Longer delays would read slots this block has just overwritten,
    /// i.e. "the future". A zero delay would read the block being written.
    fn clamp_delay(delay: usize, capacity: usize, block_len: usize) -> usize {
        let longest = capacity.saturating_sub(block_len.max(1)).max(1);
        delay.clamp(1, longest)
    }

    /// `(cursor - delay) mod capacity`, always in `[0, capacity)`.
    fn wrap_behind(cursor: usize, delay: usize, capacity: usize) -> usize {
        nih_debug_assert!(cursor < capacity);
        (cursor + capacity - delay % capacity) % capacity
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
