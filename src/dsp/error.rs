//! # Engine Errors
//!
//! The delay engine does no I/O, so the only ways it can fail are a host
//! calling it in the wrong state (or with a block it was never sized for)
//! and running out of memory while allocating the ring buffers.
//!
//! None of the variants own heap data: an `EngineError` may be created on
//! the audio thread without allocating.

use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// `process()` was called before a successful `configure()`.
    #[error("delay engine used before it was configured")]
    Unconfigured,

    /// The sample rate must be a finite number greater than zero.
    #[error("invalid sample rate {0} Hz")]
    InvalidSampleRate(f32),

    /// A zero maximum block size or zero channels were requested.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// The block holds more samples per channel than the ring can store.
    #[error("block of {block_len} samples exceeds ring capacity of {capacity}")]
    BlockTooLong { block_len: usize, capacity: usize },

    /// More channels were supplied than delay lines were configured.
    #[error("got {got} channels but only {configured} are configured")]
    TooManyChannels { got: usize, configured: usize },

    /// Channel slices within one block must all have the same length.
    #[error("channel {channel} holds {len} samples, expected {expected}")]
    RaggedBlock {
        channel: usize,
        len: usize,
        expected: usize,
    },

    /// Allocating a ring buffer failed. The previous configuration is kept.
    #[error("failed to allocate a {capacity}-sample delay line: {source}")]
    Allocation {
        capacity: usize,
        source: TryReserveError,
    },
}

impl EngineError {
    /// A static description suitable for `ProcessStatus::Error`, which only
    /// accepts `&'static str` (formatting would allocate on the audio
    /// thread).
    pub fn as_static_str(&self) -> &'static str {
        match self {
            EngineError::Unconfigured => "delay engine is not configured",
            EngineError::InvalidSampleRate(_) => "invalid sample rate",
            EngineError::InvalidConfig(reason) => *reason,
            EngineError::BlockTooLong { .. } => "block exceeds delay line capacity",
            EngineError::TooManyChannels { .. } => "more channels than configured",
            EngineError::RaggedBlock { .. } => "channels differ in block length",
            EngineError::Allocation { .. } => "delay line allocation failed",
        }
    }
}
