//! Error types shared by the movers, kernels and blob I/O.

use std::time::Duration;
use thiserror::Error;

/// Errors reported by the head pipeline.
#[derive(Debug, Error)]
pub enum HeadError {
    /// An input source is shorter than the configured length.
    #[error("{what}: have {have} elements, need {need}")]
    Truncated {
        what: String,
        have: usize,
        need: usize,
    },

    /// A mover range does not fit inside its buffer.
    #[error("range [{start}, {start}+{count}) exceeds buffer of length {len}")]
    OutOfBounds {
        start: usize,
        count: usize,
        len: usize,
    },

    /// A blocking read saw no data for the whole timeout.
    #[error("channel '{channel}' starved after {after} values (no data for {timeout:?})")]
    Starved {
        channel: String,
        after: u64,
        timeout: Duration,
    },

    /// The writer terminated and the channel is drained.
    #[error("channel '{channel}' closed by producer after {after} values")]
    ProducerGone { channel: String, after: u64 },

    /// The reader terminated; nothing will consume further writes.
    #[error("channel '{channel}' closed by consumer")]
    ConsumerGone { channel: String },

    /// Invalid head geometry or runtime parameter.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A text stream token that is not an integer.
    #[error("line {line}: cannot parse '{text}' as an integer")]
    Parse { line: usize, text: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type for head pipeline operations.
pub type Result<T> = std::result::Result<T, HeadError>;
