//! Sparse per-frame DP chart.
//!
//! A [`FrameChart`] holds one [`FrameCell`] per *active* state of a frame.
//! Storage is proportional to the number of active states:
//! - `states` / `cells`: parallel arrays of active states and their cells,
//!   in insertion order (the "unordered" view used for pruning).
//! - `slot`: dense per-state position into `cells`, or `INACTIVE`.
//! - `pending`: min-heap of states not yet visited by the current ascending
//!   pass (see [`FrameChart::reset_iteration`]).
//!
//! `clear` keeps every allocation, so a pair of charts swapped frame to frame
//! stops allocating once it has seen the widest frame of an utterance.

use crate::history::NodeId;
use crate::utils::{StateId, ZERO_LOG_PROB};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

const INACTIVE: u32 = u32::MAX;

/// Best path into one state at one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameCell {
    /// Viterbi log-probability; [`ZERO_LOG_PROB`] until assigned.
    pub score: f64,
    /// Word history of that path.
    pub history: NodeId,
}

impl Default for FrameCell {
    fn default() -> Self {
        Self {
            score: ZERO_LOG_PROB,
            history: 0,
        }
    }
}

impl FrameCell {
    #[inline]
    pub fn assign(&mut self, score: f64, history: NodeId) {
        self.score = score;
        self.history = history;
    }
}

/// Active cells of one frame.
#[derive(Clone, Debug)]
pub struct FrameChart {
    states: Vec<StateId>,
    cells: Vec<FrameCell>,
    slot: Vec<u32>,
    pending: BinaryHeap<Reverse<StateId>>,
    iterating: bool,
    /// Last state handed out by `next_state` in the current pass.
    last: Option<StateId>,
}

impl FrameChart {
    /// Empty chart for a graph with `state_count` states.
    pub fn new(state_count: usize) -> Self {
        assert!(
            state_count < INACTIVE as usize,
            "state count {state_count} exceeds chart capacity"
        );
        Self {
            states: Vec::new(),
            cells: Vec::new(),
            slot: vec![INACTIVE; state_count],
            pending: BinaryHeap::new(),
            iterating: false,
            last: None,
        }
    }

    /// Number of active cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of states in the graph this chart was sized for.
    #[inline]
    pub fn state_count(&self) -> usize {
        self.slot.len()
    }

    #[inline]
    fn position(&self, state: StateId) -> u32 {
        assert!(
            (state as usize) < self.slot.len(),
            "state {state} out of range for chart of {} states",
            self.slot.len()
        );
        self.slot[state as usize]
    }

    /// Whether `state` is active.
    #[inline]
    pub fn has_cell(&self, state: StateId) -> bool {
        self.position(state) != INACTIVE
    }

    /// Cell of an active state.
    ///
    /// # Panics
    /// Panics if `state` is inactive or out of range.
    #[inline]
    pub fn cell(&self, state: StateId) -> &FrameCell {
        let pos = self.position(state);
        assert!(pos != INACTIVE, "state {state} has no active cell");
        &self.cells[pos as usize]
    }

    /// Cell of `state` if active.
    #[inline]
    pub fn get(&self, state: StateId) -> Option<&FrameCell> {
        match self.position(state) {
            INACTIVE => None,
            pos => Some(&self.cells[pos as usize]),
        }
    }

    /// Cell of `state`, activating it with a zero-probability cell if needed.
    ///
    /// During an ascending pass a newly activated state is queued for the
    /// same pass iff its index is above the state last dequeued.
    pub fn insert_or_get(&mut self, state: StateId) -> &mut FrameCell {
        let pos = self.position(state);
        if pos != INACTIVE {
            return &mut self.cells[pos as usize];
        }
        let pos = self.cells.len();
        self.states.push(state);
        self.cells.push(FrameCell::default());
        self.slot[state as usize] = pos as u32;
        if self.iterating && self.last.map_or(true, |last| state > last) {
            self.pending.push(Reverse(state));
        }
        &mut self.cells[pos]
    }

    /// Cell at position `idx` of the unordered view.
    #[inline]
    pub fn cell_at(&self, idx: usize) -> &FrameCell {
        &self.cells[idx]
    }

    /// State at position `idx` of the unordered view. Positions change when
    /// the chart is mutated.
    #[inline]
    pub fn state_at(&self, idx: usize) -> StateId {
        self.states[idx]
    }

    /// Active `(state, cell)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (StateId, &FrameCell)> + '_ {
        self.states.iter().copied().zip(self.cells.iter())
    }

    /// Start an ascending pass over every active state.
    pub fn reset_iteration(&mut self) {
        self.pending.clear();
        self.pending.extend(self.states.iter().copied().map(Reverse));
        self.iterating = true;
        self.last = None;
    }

    /// Lowest active state not yet visited in this pass.
    pub fn next_state(&mut self) -> Option<StateId> {
        debug_assert!(self.iterating, "next_state called outside a pass");
        match self.pending.pop() {
            Some(Reverse(state)) => {
                self.last = Some(state);
                Some(state)
            }
            None => {
                self.iterating = false;
                None
            }
        }
    }

    /// Keep only cells for which `keep` returns true. Ends any pass in
    /// progress.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(StateId, &FrameCell) -> bool,
    {
        let mut write = 0;
        for read in 0..self.cells.len() {
            let state = self.states[read];
            if keep(state, &self.cells[read]) {
                self.states[write] = state;
                self.cells[write] = self.cells[read];
                self.slot[state as usize] = write as u32;
                write += 1;
            } else {
                self.slot[state as usize] = INACTIVE;
            }
        }
        self.states.truncate(write);
        self.cells.truncate(write);
        self.pending.clear();
        self.iterating = false;
        self.last = None;
    }

    /// Deactivate every state, keeping allocated storage.
    pub fn clear(&mut self) {
        for &state in &self.states {
            debug_assert_ne!(self.slot[state as usize], INACTIVE);
            self.slot[state as usize] = INACTIVE;
        }
        self.states.clear();
        self.cells.clear();
        self.pending.clear();
        self.iterating = false;
        self.last = None;
    }

    /// Exchange contents with `other`.
    pub fn swap(&mut self, other: &mut FrameChart) {
        std::mem::swap(self, other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_creates_zero_cell_once() {
        let mut chart = FrameChart::new(8);
        assert!(!chart.has_cell(3));
        let cell = chart.insert_or_get(3);
        assert_eq!(cell.score, ZERO_LOG_PROB);
        cell.assign(-1.5, 4);
        let again = chart.insert_or_get(3);
        assert_eq!(again.score, -1.5);
        assert_eq!(chart.len(), 1);
        assert_eq!(chart.cell(3).history, 4);
        assert!(chart.get(2).is_none());
    }

    #[test]
    fn ascending_pass_sorts_active_states() {
        let mut chart = FrameChart::new(10);
        for s in [7, 2, 9, 0, 4] {
            chart.insert_or_get(s);
        }
        chart.reset_iteration();
        let mut seen = Vec::new();
        while let Some(s) = chart.next_state() {
            seen.push(s);
        }
        assert_eq!(seen, vec![0, 2, 4, 7, 9]);
    }

    #[test]
    fn inserts_during_pass_are_visited_in_order_once() {
        let mut chart = FrameChart::new(10);
        chart.insert_or_get(1);
        chart.insert_or_get(5);
        chart.reset_iteration();
        let mut seen = Vec::new();
        while let Some(s) = chart.next_state() {
            seen.push(s);
            if s == 1 {
                chart.insert_or_get(3);
                chart.insert_or_get(8);
                // already queued; must not be visited twice
                chart.insert_or_get(5);
            }
            if s == 5 {
                // behind the cursor: activated but not visited in this pass
                chart.insert_or_get(2);
                chart.insert_or_get(6);
            }
        }
        assert_eq!(seen, vec![1, 3, 5, 6, 8]);
        assert!(chart.has_cell(2));
        assert_eq!(chart.len(), 6);
    }

    #[test]
    fn unordered_view_matches_insertion() {
        let mut chart = FrameChart::new(6);
        chart.insert_or_get(4).assign(-1.0, 0);
        chart.insert_or_get(1).assign(-2.0, 0);
        assert_eq!(chart.state_at(0), 4);
        assert_eq!(chart.cell_at(1).score, -2.0);
        let pairs: Vec<_> = chart.iter().map(|(s, c)| (s, c.score)).collect();
        assert_eq!(pairs, vec![(4, -1.0), (1, -2.0)]);
    }

    #[test]
    fn retain_compacts_and_updates_lookup() {
        let mut chart = FrameChart::new(6);
        for (s, score) in [(0, -1.0), (3, -9.0), (5, -2.0), (2, -8.0)] {
            chart.insert_or_get(s).assign(score, 0);
        }
        chart.retain(|_, c| c.score > -5.0);
        assert_eq!(chart.len(), 2);
        assert!(!chart.has_cell(3));
        assert!(!chart.has_cell(2));
        assert_eq!(chart.cell(5).score, -2.0);
        assert_eq!(chart.cell(0).score, -1.0);
    }

    #[test]
    fn clear_and_swap() {
        let mut a = FrameChart::new(4);
        let mut b = FrameChart::new(4);
        a.insert_or_get(2).assign(0.0, 0);
        a.swap(&mut b);
        assert!(a.is_empty());
        assert!(b.has_cell(2));
        b.clear();
        assert!(b.is_empty());
        assert!(!b.has_cell(2));
        assert_eq!(b.state_count(), 4);
    }

    #[test]
    #[should_panic(expected = "has no active cell")]
    fn reading_inactive_cell_panics() {
        let chart = FrameChart::new(4);
        let _ = chart.cell(1);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_state_panics() {
        let mut chart = FrameChart::new(4);
        chart.insert_or_get(4);
    }
}
