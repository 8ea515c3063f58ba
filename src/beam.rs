//! Beam pruning of a frame chart.
//!
//! Two independent policies, applied together:
//! - score beam: drop cells below `best - log_prob_beam`;
//! - rank beam: keep at most `rank_beam` cells, chosen with
//!   `select_nth_unstable_by` (average linear time, no full sort).
//!
//! Zero-probability cells never survive either way.

use crate::chart::FrameChart;
use crate::config::BeamConfig;
use crate::utils::{is_live, rank_order, StateId, ZERO_LOG_PROB};
use std::cmp::Ordering;

/// What one pruning pass did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PruneStats {
    /// Cells before pruning.
    pub before: usize,
    /// Cells after pruning.
    pub after: usize,
    /// Best score in the chart, or [`ZERO_LOG_PROB`] if nothing was live.
    pub best: f64,
    /// Score cut-off applied by the score beam.
    pub threshold: f64,
}

/// Reusable pruning state.
///
/// Holds the scratch buffer for rank selection so pruning does not allocate
/// once the buffer has grown to the widest frame.
#[derive(Clone, Debug, Default)]
pub struct Pruner {
    scratch: Vec<(StateId, f64)>,
}

impl Pruner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply both beams to `chart`, physically removing pruned cells.
    pub fn prune(&mut self, chart: &mut FrameChart, beam: &BeamConfig) -> PruneStats {
        let before = chart.len();
        let best = chart
            .iter()
            .map(|(_, c)| c.score)
            .fold(ZERO_LOG_PROB, f64::max);

        if !is_live(best) {
            chart.clear();
            return PruneStats {
                before,
                after: 0,
                best: ZERO_LOG_PROB,
                threshold: ZERO_LOG_PROB,
            };
        }

        let threshold = best - beam.effective_log_prob_beam();
        let passes = |score: f64| is_live(score) && score >= threshold;

        // Worst (state, score) still inside the rank beam, if it binds.
        let mut cut: Option<(StateId, f64)> = None;
        if beam.rank_beam > 0 && chart.len() > beam.rank_beam {
            self.scratch.clear();
            self.scratch.extend(
                chart
                    .iter()
                    .filter(|(_, c)| passes(c.score))
                    .map(|(s, c)| (s, c.score)),
            );
            let k = beam.rank_beam;
            if self.scratch.len() > k {
                let (_, nth, _) = self.scratch.select_nth_unstable_by(k - 1, |a, b| rank_order(*a, *b));
                cut = Some(*nth);
            }
        }

        chart.retain(|state, cell| {
            passes(cell.score)
                && cut.map_or(true, |c| rank_order((state, cell.score), c) != Ordering::Greater)
        });

        PruneStats {
            before,
            after: chart.len(),
            best,
            threshold,
        }
    }
}
