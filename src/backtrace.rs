//! Recovering the decoded words from the last frame.
//!
//! Only the winning cell's history node is needed: walking parent pointers to
//! the root yields the words in reverse, in time proportional to the number of
//! words rather than the number of frames.

use crate::chart::FrameChart;
use crate::history::WordHistoryTree;
use crate::traits::DecodingGraph;
use crate::utils::{is_live, StateId, WordId, ZERO_LOG_PROB};

/// Best complete hypothesis of an utterance.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Backtrace {
    /// Decoded words, in order.
    pub words: Vec<WordId>,
    /// Cell score plus the final state's final log-probability.
    pub log_prob: f64,
    /// Final state the hypothesis ends in.
    pub final_state: StateId,
}

/// Active final state with the best total score.
///
/// Ties go to the lowest state index. Returns `None` if no final state is
/// active (or every active one has zero probability).
pub fn best_final<G>(graph: &G, chart: &FrameChart) -> Option<(StateId, f64)>
where
    G: DecodingGraph + ?Sized,
{
    let mut best: Option<(StateId, f64)> = None;
    let mut best_score = ZERO_LOG_PROB;
    for &(state, final_log_prob) in graph.final_states() {
        let Some(cell) = chart.get(state) else {
            continue;
        };
        let total = cell.score + final_log_prob;
        if is_live(total) && total > best_score {
            best_score = total;
            best = Some((state, total));
        }
    }
    best
}

/// Pick the best final cell of `chart` and spell out its word history.
pub fn backtrace<G>(graph: &G, chart: &FrameChart, tree: &WordHistoryTree) -> Option<Backtrace>
where
    G: DecodingGraph + ?Sized,
{
    let (final_state, log_prob) = best_final(graph, chart)?;
    let mut node = chart.cell(final_state).history;
    let mut words = Vec::new();
    while node != tree.root() {
        words.push(tree.word_of(node));
        node = tree.parent_of(node);
    }
    words.reverse();
    Some(Backtrace {
        words,
        log_prob,
        final_state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    fn two_final_graph(w1: f64, w3: f64) -> Graph {
        let mut g = Graph::new(4).unwrap();
        g.set_final(1, w1).unwrap().set_final(3, w3).unwrap();
        g
    }

    #[test]
    fn walks_history_in_order() {
        let g = two_final_graph(0.0, 0.0);
        let mut tree = WordHistoryTree::new();
        let a = tree.extend(tree.root(), 4);
        let b = tree.extend(a, 2);
        let c = tree.extend(b, 9);
        let mut chart = FrameChart::new(4);
        chart.insert_or_get(3).assign(-2.0, c);
        chart.insert_or_get(0).assign(0.0, a);
        let out = backtrace(&g, &chart, &tree).unwrap();
        assert_eq!(out.words, vec![4, 2, 9]);
        assert_eq!(out.final_state, 3);
        assert_eq!(out.log_prob, -2.0);
    }

    #[test]
    fn final_weights_count() {
        let g = two_final_graph(-5.0, 0.0);
        let tree = WordHistoryTree::new();
        let mut chart = FrameChart::new(4);
        chart.insert_or_get(1).assign(-1.0, 0);
        chart.insert_or_get(3).assign(-3.0, 0);
        assert_eq!(best_final(&g, &chart), Some((3, -3.0)));
        assert!(backtrace(&g, &chart, &tree).unwrap().words.is_empty());
    }

    #[test]
    fn ties_prefer_lowest_state() {
        let g = two_final_graph(0.0, 0.0);
        let mut chart = FrameChart::new(4);
        chart.insert_or_get(3).assign(-1.0, 0);
        chart.insert_or_get(1).assign(-1.0, 0);
        assert_eq!(best_final(&g, &chart), Some((1, -1.0)));
    }

    #[test]
    fn no_active_final_state() {
        let g = two_final_graph(0.0, 0.0);
        let tree = WordHistoryTree::new();
        let mut chart = FrameChart::new(4);
        chart.insert_or_get(0).assign(0.0, 0);
        chart.insert_or_get(2).assign(0.0, 0);
        assert!(backtrace(&g, &chart, &tree).is_none());

        // impossible final weight counts as inactive
        let g = two_final_graph(f64::NEG_INFINITY, f64::NEG_INFINITY);
        chart.insert_or_get(1).assign(0.0, 0);
        assert!(best_final(&g, &chart).is_none());
    }
}
