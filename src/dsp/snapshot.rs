//! # Parameter Snapshot
//!
//! The host and the UI can change parameters at any time from other
//! threads. The audio thread must never lock to read them, so instead it
//! takes a *snapshot* once at the start of every block: four scalar reads,
//! each an atomic load on the parameter side. Within a block every channel
//! sees exactly the same values; a change that lands mid-block is simply
//! picked up by the next block.
//!
//! ## Units
//!
//! | field              | range      | unit                          |
//! |--------------------|------------|-------------------------------|
//! | `dry_wet_percent`  | 0 – 100    | percent of wet signal added   |
//! | `delay_time_ms`    | 0.5 – 500  | milliseconds (left channel)   |
//! | `feedback_gain`    | 0 – 1      | linear gain per repeat        |
//! | `stereo_offset_ms` | 0 – 400    | ms added to the right channel |

use std::ops::RangeInclusive;

pub const DRY_WET_RANGE: RangeInclusive<f32> = 0.0..=100.0;
pub const DELAY_TIME_RANGE: RangeInclusive<f32> = 0.5..=500.0;
pub const FEEDBACK_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const STEREO_OFFSET_RANGE: RangeInclusive<f32> = 0.0..=400.0;

/// An immutable per-block read of the four control values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSnapshot {
    pub dry_wet_percent: f32,
    pub delay_time_ms: f32,
    pub feedback_gain: f32,
    pub stereo_offset_ms: f32,
}

impl Default for ParameterSnapshot {
    /// Fully dry, shortest delay, no feedback, no spread.
    fn default() -> Self {
        Self {
            dry_wet_percent: *DRY_WET_RANGE.start(),
            delay_time_ms: *DELAY_TIME_RANGE.start(),
            feedback_gain: *FEEDBACK_RANGE.start(),
            stereo_offset_ms: *STEREO_OFFSET_RANGE.start(),
        }
    }
}

impl ParameterSnapshot {
    /// Return a copy with every field forced into its valid range.
    ///
    /// Host parameters are already range-checked, but the engine is also a
    /// library and must never turn a stray value into NaN/Inf output. NaN
    /// becomes the range minimum; infinities clamp like any other value.
    pub fn sanitized(&self) -> Self {
        Self {
            dry_wet_percent: clamp_to(self.dry_wet_percent, DRY_WET_RANGE),
            delay_time_ms: clamp_to(self.delay_time_ms, DELAY_TIME_RANGE),
            feedback_gain: clamp_to(self.feedback_gain, FEEDBACK_RANGE),
            stereo_offset_ms: clamp_to(self.stereo_offset_ms, STEREO_OFFSET_RANGE),
        }
    }

    /// The gain applied to the delayed signal before it is added onto the
    /// dry signal: `dry_wet_percent / 100`.
    ///
    /// The dry signal itself is never attenuated, so at 100% the output is
    /// dry + full wet rather than a crossfade.
    pub fn wet_gain(&self) -> f32 {
        self.dry_wet_percent / 100.0
    }

    /// Delay time in ms for a channel. Channel 0 (left) uses the base time;
    /// every other channel adds the stereo offset.
    pub fn channel_delay_ms(&self, channel: usize) -> f32 {
        if channel == 0 {
            self.delay_time_ms
        } else {
            self.delay_time_ms + self.stereo_offset_ms
        }
    }

    /// Delay for a channel in whole samples.
    ///
    /// The base time and the stereo offset are rounded separately, so the
    /// right channel always sits exactly `ms_to_samples(stereo_offset_ms)`
    /// samples behind the left one.
    pub fn channel_delay_samples(&self, channel: usize, sample_rate: f32) -> usize {
        let base = ms_to_samples(self.delay_time_ms, sample_rate);
        if channel == 0 {
            base
        } else {
            base + ms_to_samples(self.stereo_offset_ms, sample_rate)
        }
    }
}

/// Convert a duration in milliseconds into a whole number of samples.
///
/// ```text
/// samples = round(ms * sample_rate / 1000)
/// ```
///
/// Rounds to nearest with ties away from zero. Negative or NaN input
/// yields 0.
pub fn ms_to_samples(ms: f32, sample_rate: f32) -> usize {
    let samples = (ms * sample_rate / 1000.0).round();
    if samples.is_nan() || samples <= 0.0 {
        0
    } else {
        samples as usize
    }
}

fn clamp_to(value: f32, range: RangeInclusive<f32>) -> f32 {
    if value.is_nan() {
        *range.start()
    } else {
        value.clamp(*range.start(), *range.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fully_dry() {
        let snapshot = ParameterSnapshot::default();
        assert_eq!(snapshot.wet_gain(), 0.0);
        assert_eq!(snapshot.feedback_gain, 0.0);
        assert_eq!(snapshot.delay_time_ms, 0.5);
    }

    #[test]
    fn test_sanitized_clamps_every_field() {
        let wild = ParameterSnapshot {
            dry_wet_percent: 250.0,
            delay_time_ms: -3.0,
            feedback_gain: f32::INFINITY,
            stereo_offset_ms: f32::NAN,
        };
        let clean = wild.sanitized();

        assert_eq!(clean.dry_wet_percent, 100.0);
        assert_eq!(clean.delay_time_ms, 0.5);
        assert_eq!(clean.feedback_gain, 1.0);
        assert_eq!(clean.stereo_offset_ms, 0.0);
    }

    #[test]
    fn test_in_range_values_pass_through() {
        let snapshot = ParameterSnapshot {
            dry_wet_percent: 42.0,
            delay_time_ms: 123.4,
            feedback_gain: 0.6,
            stereo_offset_ms: 17.0,
        };
        assert_eq!(snapshot.sanitized(), snapshot);
    }

    #[test]
    fn test_wet_gain_maps_percent() {
        let snapshot = ParameterSnapshot {
            dry_wet_percent: 25.0,
            ..Default::default()
        };
        assert!((snapshot.wet_gain() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_right_channel_adds_offset() {
        let snapshot = ParameterSnapshot {
            delay_time_ms: 100.0,
            stereo_offset_ms: 30.0,
            ..Default::default()
        };
        assert_eq!(snapshot.channel_delay_ms(0), 100.0);
        assert_eq!(snapshot.channel_delay_ms(1), 130.0);

        assert_eq!(snapshot.channel_delay_samples(0, 48000.0), 4800);
        assert_eq!(snapshot.channel_delay_samples(1, 48000.0), 4800 + 1440);
    }

    /// 10.01 ms at 44.1 kHz is 441.441 samples; rounding to nearest gives 441.
    #[test]
    fn test_ms_to_samples_rounds() {
        assert_eq!(ms_to_samples(10.01, 44100.0), 441);
        assert_eq!(ms_to_samples(0.5, 44100.0), 22);
        assert_eq!(ms_to_samples(500.0, 44100.0), 22050);
    }

    #[test]
    fn test_ms_to_samples_never_negative() {
        assert_eq!(ms_to_samples(-10.0, 44100.0), 0);
        assert_eq!(ms_to_samples(f32::NAN, 44100.0), 0);
    }
}
