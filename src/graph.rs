//! In-memory decoding graph.
//!
//! States are dense indices; each state owns its outgoing arcs. Arcs are
//! either epsilon (closed within a frame) or emitting (consume one frame).

use crate::error::GraphError;
use crate::traits::DecodingGraph;
use crate::utils::{StateId, WordId};

/// Where an arc takes its acoustic score from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Emission {
    /// Non-emitting; traversed inside a frame without an acoustic score.
    Epsilon,
    /// Emitting; scored by the source state's column of the frame.
    Source,
    /// Emitting; scored by an explicit emission-class column.
    Class(u32),
}

impl Emission {
    #[inline]
    pub fn is_epsilon(self) -> bool {
        matches!(self, Emission::Epsilon)
    }
}

/// One outgoing arc.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transition {
    /// Destination state.
    pub dst: StateId,
    /// Transition log-probability.
    pub log_prob: f64,
    /// Word emitted on traversal, if any.
    pub word: Option<WordId>,
    /// Acoustic scoring of the arc.
    pub emission: Emission,
}

impl Transition {
    /// Non-emitting arc.
    pub fn epsilon(dst: StateId, log_prob: f64) -> Self {
        Self {
            dst,
            log_prob,
            word: None,
            emission: Emission::Epsilon,
        }
    }

    /// Emitting arc scored by its source state.
    pub fn emitting(dst: StateId, log_prob: f64) -> Self {
        Self {
            dst,
            log_prob,
            word: None,
            emission: Emission::Source,
        }
    }

    /// Attach a word label.
    pub fn with_word(mut self, word: WordId) -> Self {
        self.word = Some(word);
        self
    }

    /// Score this (emitting) arc by emission class `class` instead of by its
    /// source state.
    pub fn with_class(mut self, class: u32) -> Self {
        self.emission = Emission::Class(class);
        self
    }
}

/// Adjacency-list graph implementing [`DecodingGraph`].
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Graph {
    /// arcs[s] = outgoing arcs of state s
    arcs: Vec<Vec<Transition>>,
    start: StateId,
    /// Sorted by state.
    finals: Vec<(StateId, f64)>,
    emission_columns: usize,
}

impl Graph {
    /// Graph with `state_count` states, no arcs, start state 0 and no final
    /// states.
    pub fn new(state_count: usize) -> Result<Self, GraphError> {
        if state_count == 0 {
            return Err(GraphError::NoStates);
        }
        Ok(Self {
            arcs: vec![Vec::new(); state_count],
            start: 0,
            finals: Vec::new(),
            emission_columns: 0,
        })
    }

    fn check(&self, state: StateId) -> Result<(), GraphError> {
        if (state as usize) < self.arcs.len() {
            Ok(())
        } else {
            Err(GraphError::StateOutOfRange {
                state,
                count: self.arcs.len(),
            })
        }
    }

    pub fn set_start(&mut self, state: StateId) -> Result<&mut Self, GraphError> {
        self.check(state)?;
        self.start = state;
        Ok(self)
    }

    /// Mark `state` final with final log-probability `log_prob`.
    /// Marking an already-final state replaces its weight.
    pub fn set_final(&mut self, state: StateId, log_prob: f64) -> Result<&mut Self, GraphError> {
        self.check(state)?;
        match self.finals.binary_search_by_key(&state, |&(s, _)| s) {
            Ok(pos) => self.finals[pos].1 = log_prob,
            Err(pos) => self.finals.insert(pos, (state, log_prob)),
        }
        Ok(self)
    }

    /// Add an arc leaving `src`.
    ///
    /// Epsilon arcs must strictly increase the state index.
    pub fn add_arc(&mut self, src: StateId, arc: Transition) -> Result<&mut Self, GraphError> {
        self.check(src)?;
        self.check(arc.dst)?;
        match arc.emission {
            Emission::Epsilon if arc.dst <= src => {
                return Err(GraphError::EpsilonOrder { src, dst: arc.dst });
            }
            Emission::Epsilon => {}
            Emission::Source => {
                self.emission_columns = self.emission_columns.max(self.arcs.len());
            }
            Emission::Class(c) => {
                self.emission_columns = self.emission_columns.max(c as usize + 1);
            }
        }
        self.arcs[src as usize].push(arc);
        Ok(self)
    }

    /// Total number of arcs.
    pub fn arc_count(&self) -> usize {
        self.arcs.iter().map(Vec::len).sum()
    }

    /// Final log-probability of `state`, or `None` if it is not final.
    pub fn final_log_prob(&self, state: StateId) -> Option<f64> {
        self.finals
            .binary_search_by_key(&state, |&(s, _)| s)
            .ok()
            .map(|pos| self.finals[pos].1)
    }
}

impl DecodingGraph for Graph {
    fn state_count(&self) -> usize {
        self.arcs.len()
    }

    fn start_state(&self) -> StateId {
        self.start
    }

    fn arcs(&self, state: StateId) -> &[Transition] {
        &self.arcs[state as usize]
    }

    fn final_states(&self) -> &[(StateId, f64)] {
        &self.finals
    }

    fn emission_columns(&self) -> usize {
        self.emission_columns
    }
}
