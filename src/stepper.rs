//! One frame of frame-synchronous Viterbi search.
//!
//! A step takes the pruned chart of frame `t` and produces the pruned chart of
//! frame `t + 1`:
//! 1. visit the active states of `t` in ascending order, relaxing epsilon arcs
//!    back into `t` (the destinations have higher indices, so they are queued
//!    for the same pass);
//! 2. from each visited state, relax emitting arcs into `t + 1`, adding the
//!    weighted acoustic score of frame `t`;
//! 3. prune `t + 1`.
//!
//! Both relaxations happen in a single pass: when a state is dequeued every
//! epsilon predecessor has a lower index and was already visited, so its cell
//! is final.
//!
//! Updates are strict: on an exact score tie the cell keeps the path that
//! reached it first in ascending processing order.

use crate::beam::{PruneStats, Pruner};
use crate::chart::FrameChart;
use crate::config::BeamConfig;
use crate::error::{DecodeError, DecodeResult};
use crate::graph::{Emission, Transition};
use crate::history::{NodeId, WordHistoryTree};
use crate::traits::DecodingGraph;
use crate::utils::{is_live, StateId, WordId};

/// Frame expansion over a fixed graph.
///
/// Holds no per-utterance state; charts and the history tree are passed in.
pub struct ViterbiStepper<'g, G: DecodingGraph + ?Sized> {
    graph: &'g G,
    acoustic_weight: f64,
}

/// Offer `score` (reached with history `history`, crossing an arc labelled
/// `word`) to `state` in `chart`.
#[inline]
fn relax(
    chart: &mut FrameChart,
    tree: &mut WordHistoryTree,
    state: StateId,
    score: f64,
    history: NodeId,
    word: Option<WordId>,
) {
    if !is_live(score) {
        return;
    }
    let cell = chart.insert_or_get(state);
    if score > cell.score {
        let node = match word {
            Some(w) => tree.extend(history, w),
            None => history,
        };
        cell.assign(score, node);
    }
}

impl<'g, G: DecodingGraph + ?Sized> ViterbiStepper<'g, G> {
    pub fn new(graph: &'g G, acoustic_weight: f64) -> Self {
        Self {
            graph,
            acoustic_weight,
        }
    }

    #[inline]
    fn acoustic(&self, frame: &[f64], src: StateId, arc: &Transition) -> f64 {
        let column = match arc.emission {
            Emission::Source => src as usize,
            Emission::Class(c) => c as usize,
            Emission::Epsilon => return 0.0,
        };
        if self.acoustic_weight == 0.0 {
            // keeps 0 * -inf from turning into NaN
            0.0
        } else {
            self.acoustic_weight * frame[column]
        }
    }

    /// Close `chart` under epsilon arcs, in place.
    ///
    /// Used on the last frame, where there is no next frame to expand into.
    pub fn epsilon_closure(&self, chart: &mut FrameChart, tree: &mut WordHistoryTree) {
        chart.reset_iteration();
        while let Some(src) = chart.next_state() {
            let from = *chart.cell(src);
            for arc in self.graph.arcs(src) {
                if arc.emission.is_epsilon() {
                    relax(chart, tree, arc.dst, from.score + arc.log_prob, from.history, arc.word);
                }
            }
        }
    }

    /// Close `cur` under epsilon arcs and expand its emitting arcs into
    /// `next` using the scores of `frame`. `next` is cleared first and is
    /// left unpruned.
    pub fn expand(
        &self,
        frame: &[f64],
        cur: &mut FrameChart,
        next: &mut FrameChart,
        tree: &mut WordHistoryTree,
    ) {
        next.clear();
        cur.reset_iteration();
        while let Some(src) = cur.next_state() {
            let from = *cur.cell(src);
            for arc in self.graph.arcs(src) {
                if arc.emission.is_epsilon() {
                    relax(cur, tree, arc.dst, from.score + arc.log_prob, from.history, arc.word);
                } else {
                    let score = from.score + self.acoustic(frame, src, arc) + arc.log_prob;
                    relax(next, tree, arc.dst, score, from.history, arc.word);
                }
            }
        }
    }

    /// Full transition from frame `t` (in `cur`) to frame `t + 1` (in `next`),
    /// including pruning.
    ///
    /// Fails with [`DecodeError::SearchFailed`] if nothing survives, and with
    /// [`DecodeError::ScoreShape`] if `frame` is too narrow for the graph.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &self,
        t: usize,
        frame: &[f64],
        cur: &mut FrameChart,
        next: &mut FrameChart,
        tree: &mut WordHistoryTree,
        pruner: &mut Pruner,
        beam: &BeamConfig,
    ) -> DecodeResult<PruneStats> {
        #[cfg(feature = "tracing")]
        let span = tracing::trace_span!("frame_step", frame = t, active = cur.len());
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let required = self.graph.emission_columns();
        if frame.len() < required {
            return Err(DecodeError::ScoreShape {
                frame: t,
                columns: frame.len(),
                required,
            });
        }

        self.expand(frame, cur, next, tree);
        let stats = pruner.prune(next, beam);

        #[cfg(feature = "tracing")]
        tracing::trace!(
            frame = t,
            before = stats.before,
            after = stats.after,
            best = stats.best,
            "pruned"
        );

        if next.is_empty() {
            return Err(DecodeError::SearchFailed { frame: t });
        }
        Ok(stats)
    }
}
