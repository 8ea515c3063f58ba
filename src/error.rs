//! Error types for graph construction, configuration and decoding.
//!
//! Only recoverable conditions live here. Broken internal invariants (reading
//! an inactive cell, asking for the root's parent) panic instead.

use crate::utils::StateId;
use thiserror::Error;

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Per-utterance decoding failure.
///
/// The session stays usable after any of these; the caller may widen the
/// beams and retry or move on to the next utterance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Every hypothesis was pruned or unreachable at this frame.
    #[error("search failed: no active states after frame {frame}")]
    SearchFailed { frame: usize },

    /// The search survived to the end but no final state is active.
    #[error("no final state active after {frames} frames")]
    NoFinalState { frames: usize },

    /// The graph has no states to start from.
    #[error("decoding graph has no states")]
    EmptyGraph,

    /// A frame has fewer score columns than the graph's arcs reference.
    #[error("frame {frame} has {columns} score columns, graph needs {required}")]
    ScoreShape {
        frame: usize,
        columns: usize,
        required: usize,
    },
}

/// Rejected decoder configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("log-probability beam must be a non-negative number, got {0}")]
    InvalidBeam(f64),

    #[error("acoustic weight must be a non-negative finite number, got {0}")]
    InvalidAcousticWeight(f64),

    #[error("retry policy invalid: {0}")]
    InvalidRetry(String),
}

/// Rejected graph input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("state {state} out of range for graph with {count} states")]
    StateOutOfRange { state: StateId, count: usize },

    /// Epsilon arcs must point to a strictly higher state index so a single
    /// ascending sweep closes each frame.
    #[error("epsilon arc {src} -> {dst} does not increase the state index")]
    EpsilonOrder { src: StateId, dst: StateId },

    #[error("graph must contain at least one state")]
    NoStates,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_frame() {
        let err = DecodeError::SearchFailed { frame: 17 };
        assert_eq!(err.to_string(), "search failed: no active states after frame 17");
        let err = GraphError::EpsilonOrder { src: 4, dst: 2 };
        assert!(err.to_string().contains("4 -> 2"));
    }
}
