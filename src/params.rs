//! # Plugin Parameters
//!
//! The four knobs the host sees. Each has a stable string ID
//! (`#[id = "..."]`) used by the host to save and recall presets, so
//! these IDs must never change once published.
//!
//! ## No Smoothers
//!
//! The engine reads every parameter once per block and holds the value
//! for the whole block. `FloatParam::value()` is a single atomic load, so
//! taking the snapshot never blocks the audio thread, no matter what the
//! UI or host automation is doing at the same moment.

use nih_plug::prelude::*;

use crate::dsp::snapshot::{
    ParameterSnapshot, DELAY_TIME_RANGE, DRY_WET_RANGE, FEEDBACK_RANGE, STEREO_OFFSET_RANGE,
};

#[derive(Params)]
pub struct FractureParams {
    /// **Dry/Wet**: How much delayed signal is added on top of the dry
    /// signal, 0–100%. The dry signal always passes at full level.
    #[id = "drywet"]
    pub dry_wet: FloatParam,

    /// **Delay Time**: Left-channel delay in ms, 0.5–500.
    #[id = "delay"]
    pub delay_time: FloatParam,

    /// **Feedback**: Level of each repeat relative to the previous one.
    /// At 0 there is exactly one echo; at 1 the echoes never decay.
    #[id = "fdbk"]
    pub feedback: FloatParam,

    /// **Stereo**: Extra delay for the right channel in ms, 0–400.
    #[id = "stereo"]
    pub stereo_offset: FloatParam,
}

impl Default for FractureParams {
    fn default() -> Self {
        Self {
            dry_wet: FloatParam::new(
                "Dry/Wet",
                0.0,
                linear(DRY_WET_RANGE),
            )
            .with_unit(" %")
            .with_step_size(0.1),

            // The range minimum is the effective default: a 0 ms default
            // lies outside the range and any host clamps it to 0.5 ms.
            delay_time: FloatParam::new(
                "Delay",
                *DELAY_TIME_RANGE.start(),
                linear(DELAY_TIME_RANGE),
            )
            .with_unit(" ms")
            .with_step_size(0.1),

            feedback: FloatParam::new("Feedback", 0.0, linear(FEEDBACK_RANGE))
                .with_unit("%")
                // Display as percentage: 0.40 → "40.0%"
                .with_value_to_string(formatters::v2s_f32_percentage(1))
                .with_string_to_value(formatters::s2v_f32_percentage()),

            stereo_offset: FloatParam::new(
                "Stereo",
                0.0,
                linear(STEREO_OFFSET_RANGE),
            )
            .with_unit(" ms")
            .with_step_size(0.1),
        }
    }
}

impl FractureParams {
    /// Read all four values for the coming block.
    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            dry_wet_percent: self.dry_wet.value(),
            delay_time_ms: self.delay_time.value(),
            feedback_gain: self.feedback.value(),
            stereo_offset_ms: self.stereo_offset.value(),
        }
    }
}

fn linear(range: std::ops::RangeInclusive<f32>) -> FloatRange {
    FloatRange::Linear {
        min: *range.start(),
        max: *range.end(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot_is_fully_dry() {
        let params = FractureParams::default();
        let snapshot = params.snapshot();

        assert_eq!(snapshot, ParameterSnapshot::default());
        assert_eq!(snapshot.wet_gain(), 0.0);
    }

    #[test]
    fn test_ranges_match_snapshot_ranges() {
        let params = FractureParams::default();

        // Normalized 1.0 maps to the top of each range.
        let tops = [
            (params.dry_wet.preview_plain(1.0), 100.0),
            (params.delay_time.preview_plain(1.0), 500.0),
            (params.feedback.preview_plain(1.0), 1.0),
            (params.stereo_offset.preview_plain(1.0), 400.0),
            (params.delay_time.preview_plain(0.0), 0.5),
        ];
        for (got, want) in tops {
            assert!((got - want).abs() < 1e-3, "Expected {want}, got {got}");
        }
    }

    #[test]
    fn test_param_ids_are_stable() {
        let params = FractureParams::default();
        let ids: Vec<String> = params.param_map().into_iter().map(|(id, _, _)| id).collect();

        for id in ["drywet", "delay", "fdbk", "stereo"] {
            assert!(ids.iter().any(|i| i == id), "missing parameter id {id}");
        }
    }
}
