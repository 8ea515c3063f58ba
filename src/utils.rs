//! Log-domain helpers shared by the chart, the beams and the stepper.
//!
//! All scores are natural-log probabilities. Path extension is addition and
//! path selection is `max`, so no log-add is ever needed here.

use std::cmp::Ordering;

/// Index of a state in the decoding graph.
pub type StateId = u32;

/// Index of a word label.
pub type WordId = u32;

/// Log-probability of an impossible path.
///
/// Adding any finite value yields the sentinel again and it compares below
/// every real score.
pub const ZERO_LOG_PROB: f64 = f64::NEG_INFINITY;

/// Returns true if `score` denotes a reachable path.
///
/// Rejects the zero sentinel and NaN.
#[inline]
pub fn is_live(score: f64) -> bool {
    score > ZERO_LOG_PROB
}

/// Ranking order for `(state, score)` pairs: higher score first, then lower
/// state index.
///
/// Total over NaN-free scores, which makes rank pruning deterministic when
/// several cells tie at the cut.
#[inline]
pub fn rank_order(a: (StateId, f64), b: (StateId, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}
