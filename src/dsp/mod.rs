//! # DSP (Digital Signal Processing) Core
//!
//! Everything the audio thread touches, free of any host types so it can
//! be driven and tested as a plain library:
//!
//! - **`delay_line`**: a fixed-capacity ring buffer with wrap-aware bulk
//!   copy, ramped add, ramped read and self-feedback.
//!
//! - **`snapshot`**: the per-block read of the four control values and
//!   the ms → samples conversion.
//!
//! - **`engine`**: the per-block fill → feedback → read → advance
//!   sequence over one delay line per channel, plus configure/reset.
//!
//! - **`error`**: the ways the engine refuses to run.

pub mod delay_line;
pub mod engine;
pub mod error;
pub mod snapshot;

pub use delay_line::DelayLine;
pub use engine::DelayEngine;
pub use error::EngineError;
pub use snapshot::ParameterSnapshot;
