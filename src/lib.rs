//! Beam-pruned frame-synchronous Viterbi search
//!
//! This crate is the search core of a Viterbi decoder: given a decoding graph
//! (an HMM composed with a word grammar) and a matrix of per-frame acoustic
//! log-likelihoods, it finds the best word sequence through the graph.
//!
//! ## Core idea
//! 1. Keep one sparse [`FrameChart`] of active states per frame, and only
//!    two of them alive at a time.
//! 2. Advance frame by frame with [`ViterbiStepper`]: close the frame under
//!    epsilon arcs in ascending state order, expand emitting arcs into the next
//!    frame, then prune with a score beam and a rank beam.
//! 3. Carry word histories as nodes of a shared [`WordHistoryTree`] (token
//!    passing), so the final words come from one parent-pointer walk instead
//!    of a per-frame backpointer table.
//!
//! ## Quick start
//! ```
//! use beam_viterbi::{DecoderBuilder, Graph, Transition};
//!
//! let mut graph = Graph::new(3).unwrap();
//! graph
//!     .add_arc(0, Transition::emitting(1, 0.5f64.ln()).with_word(5)).unwrap()
//!     .add_arc(1, Transition::emitting(2, 0.5f64.ln()).with_word(7)).unwrap()
//!     .set_final(2, 0.0).unwrap();
//!
//! let mut decoder = DecoderBuilder::new(graph)
//!     .with_log_prob_beam(10.0)
//!     .build()
//!     .unwrap();
//! let out = decoder
//!     .decode(&vec![vec![0.0, -1.0, -100.0], vec![-100.0, 0.0, -1.0]])
//!     .unwrap();
//! assert_eq!(out.words, vec![5, 7]);
//! assert!((out.log_prob - 0.25f64.ln()).abs() < 1e-9);
//! ```
//!
//! ## Features
//! - `parallel`: [`decode_batch`] spreads utterances over a rayon pool, one
//!   private decoder per worker.
//! - `tracing`: spans per utterance and per frame, with pruning events.
//! - `serde`: serialisation for configuration, graphs and results.

pub mod backtrace;
pub mod beam;
pub mod builder;
pub mod chart;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod history;
pub mod scores;
pub mod stepper;
pub mod traits;
pub mod utils;

pub use crate::backtrace::Backtrace;
pub use crate::beam::{PruneStats, Pruner};
pub use crate::builder::DecoderBuilder;
pub use crate::chart::{FrameCell, FrameChart};
pub use crate::config::{BeamConfig, DecoderConfig, RetryPolicy};
pub use crate::engine::{decode_batch, Decoded, DecoderStats, ViterbiDecoder};
pub use crate::error::{ConfigError, DecodeError, DecodeResult, GraphError};
pub use crate::graph::{Emission, Graph, Transition};
pub use crate::history::{NodeId, WordHistoryTree};
pub use crate::scores::ScoreMatrix;
pub use crate::stepper::ViterbiStepper;
pub use crate::traits::{AcousticScores, DecodingGraph};
pub use crate::utils::{StateId, WordId, ZERO_LOG_PROB};
