//! Provider seams consumed by the search.
//!
//! The decoder never builds a graph or computes acoustic likelihoods itself.
//! It reads both through these two traits:
//! - [`DecodingGraph`]: states, outgoing arcs, start and final states.
//! - [`AcousticScores`]: one row of log-likelihoods per frame.
//!
//! [`crate::graph::Graph`] and [`crate::scores::ScoreMatrix`] are the in-memory
//! implementations; anything else (a compiled FST, a memory-mapped matrix)
//! can be plugged in by implementing the trait.

use crate::graph::Transition;
use crate::utils::StateId;

/// Read-only decoding graph (an HMM composed with a word grammar).
///
/// Contract:
/// - States are numbered `0..state_count()`.
/// - Every epsilon arc goes from a lower to a strictly higher state index.
/// - `final_states()` is sorted by ascending state index.
pub trait DecodingGraph {
    /// Number of states.
    fn state_count(&self) -> usize;

    /// State every utterance starts in.
    fn start_state(&self) -> StateId;

    /// Outgoing arcs of `state`.
    fn arcs(&self, state: StateId) -> &[Transition];

    /// Final states paired with their final log-probability, ascending by state.
    fn final_states(&self) -> &[(StateId, f64)];

    /// Minimum number of score columns a frame must provide for the
    /// emitting arcs of this graph.
    fn emission_columns(&self) -> usize;
}

/// Per-utterance acoustic log-likelihoods.
///
/// Row `t` holds the scores of frame `t`, indexed by state or by emission
/// class depending on how the graph's arcs address them.
pub trait AcousticScores {
    /// Number of frames; fixed before search begins.
    fn num_frames(&self) -> usize;

    /// Scores of one frame.
    fn frame(&self, t: usize) -> &[f64];
}

impl AcousticScores for Vec<Vec<f64>> {
    fn num_frames(&self) -> usize {
        self.len()
    }

    fn frame(&self, t: usize) -> &[f64] {
        &self[t]
    }
}

impl AcousticScores for [Vec<f64>] {
    fn num_frames(&self) -> usize {
        self.len()
    }

    fn frame(&self, t: usize) -> &[f64] {
        &self[t]
    }
}

impl<T: AcousticScores + ?Sized> AcousticScores for &T {
    fn num_frames(&self) -> usize {
        (**self).num_frames()
    }

    fn frame(&self, t: usize) -> &[f64] {
        (**self).frame(t)
    }
}

impl<G: DecodingGraph + ?Sized> DecodingGraph for &G {
    fn state_count(&self) -> usize {
        (**self).state_count()
    }
    fn start_state(&self) -> StateId {
        (**self).start_state()
    }
    fn arcs(&self, state: StateId) -> &[Transition] {
        (**self).arcs(state)
    }
    fn final_states(&self) -> &[(StateId, f64)] {
        (**self).final_states()
    }
    fn emission_columns(&self) -> usize {
        (**self).emission_columns()
    }
}

impl<G: DecodingGraph + ?Sized> DecodingGraph for std::sync::Arc<G> {
    fn state_count(&self) -> usize {
        (**self).state_count()
    }
    fn start_state(&self) -> StateId {
        (**self).start_state()
    }
    fn arcs(&self, state: StateId) -> &[Transition] {
        (**self).arcs(state)
    }
    fn final_states(&self) -> &[(StateId, f64)] {
        (**self).final_states()
    }
    fn emission_columns(&self) -> usize {
        (**self).emission_columns()
    }
}
