//! Utterance-level decoding session.
//!
//! [`ViterbiDecoder`] owns everything that lives across frames of one
//! utterance (the word-history tree, the two swapped frame charts and the
//! pruning scratch buffer) and reuses it across utterances, so decoding a
//! stream of utterances settles into a steady state with no per-frame heap
//! allocation.
//!
//! The decoder is completely generic over implementations of
//! [`DecodingGraph`] and [`AcousticScores`].

use crate::backtrace::backtrace;
use crate::beam::Pruner;
use crate::chart::FrameChart;
use crate::config::{BeamConfig, DecoderConfig};
use crate::error::{ConfigError, DecodeError, DecodeResult};
use crate::history::WordHistoryTree;
use crate::stepper::ViterbiStepper;
use crate::traits::{AcousticScores, DecodingGraph};
use crate::utils::{StateId, WordId};

/// Result of decoding one utterance.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Decoded {
    /// Best word sequence.
    pub words: Vec<WordId>,
    /// Total log-probability of the best path, final weight included.
    pub log_prob: f64,
    /// Frames consumed.
    pub frames: usize,
    /// Final state of the best path.
    pub final_state: StateId,
    /// Beams in force on the successful attempt.
    pub beam: BeamConfig,
}

/// Running totals over the utterances a decoder has seen.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecoderStats {
    /// Utterances decoded successfully.
    pub decoded: usize,
    /// Utterances that failed to decode.
    pub failed: usize,
    /// Frames of the successfully decoded utterances.
    pub frames: usize,
    /// Summed log-probability of the successfully decoded utterances.
    pub log_prob: f64,
}

impl DecoderStats {
    /// Average log-probability per decoded frame, if any frame was decoded.
    pub fn log_prob_per_frame(&self) -> Option<f64> {
        (self.frames > 0).then(|| self.log_prob / self.frames as f64)
    }
}

/// Beam-pruned Viterbi decoder over a graph `G`.
///
/// Typical usage:
/// ```
/// use beam_viterbi::{Graph, Transition, ViterbiDecoder, DecoderConfig};
///
/// let mut graph = Graph::new(3).unwrap();
/// graph
///     .add_arc(0, Transition::emitting(1, 0.5f64.ln()).with_word(5)).unwrap()
///     .add_arc(1, Transition::emitting(2, 0.5f64.ln()).with_word(7)).unwrap()
///     .set_final(2, 0.0).unwrap();
///
/// let scores = vec![vec![0.0, -1.0, -100.0], vec![-100.0, 0.0, -1.0]];
/// let mut decoder = ViterbiDecoder::new(graph, DecoderConfig::default()).unwrap();
/// let out = decoder.decode(&scores).unwrap();
/// assert_eq!(out.words, vec![5, 7]);
/// ```
pub struct ViterbiDecoder<G> {
    graph: G,
    config: DecoderConfig,
    tree: WordHistoryTree,
    cur: FrameChart,
    next: FrameChart,
    pruner: Pruner,
    stats: DecoderStats,
}

impl<G: DecodingGraph> ViterbiDecoder<G> {
    /// Create a decoder after validating `config`.
    pub fn new(graph: G, config: DecoderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_parts(graph, config))
    }

    fn from_parts(graph: G, config: DecoderConfig) -> Self {
        let n = graph.state_count();
        Self {
            graph,
            config,
            tree: WordHistoryTree::new(),
            cur: FrameChart::new(n),
            next: FrameChart::new(n),
            pruner: Pruner::new(),
            stats: DecoderStats::default(),
        }
    }

    /// Expose the underlying graph.
    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Replace the configuration; rejected configurations leave the decoder
    /// unchanged.
    pub fn set_config(&mut self, config: DecoderConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = DecoderStats::default();
    }

    /// Word-history tree of the most recent utterance.
    pub fn history(&self) -> &WordHistoryTree {
        &self.tree
    }

    /// Decode one utterance with the configured beams.
    pub fn decode<S>(&mut self, scores: &S) -> DecodeResult<Decoded>
    where
        S: AcousticScores + ?Sized,
    {
        let beam = self.config.beam;
        let result = self.search(scores, &beam);
        self.record(&result);
        result
    }

    /// Decode one utterance, widening the beams after each search failure
    /// as configured by [`crate::RetryPolicy`].
    ///
    /// Only the final outcome is counted in [`DecoderStats`].
    pub fn decode_with_retry<S>(&mut self, scores: &S) -> DecodeResult<Decoded>
    where
        S: AcousticScores + ?Sized,
    {
        let retry = self.config.retry;
        let mut beam = self.config.beam;
        let mut attempt = 1;
        loop {
            let result = self.search(scores, &beam);
            let retryable = matches!(
                result,
                Err(DecodeError::SearchFailed { .. }) | Err(DecodeError::NoFinalState { .. })
            );
            if !retryable || attempt >= retry.max_attempts || !beam.is_enabled() {
                self.record(&result);
                return result;
            }
            #[cfg(feature = "tracing")]
            tracing::debug!(attempt, factor = retry.widen_factor, "widening beams after failure");
            beam = beam.widened(retry.widen_factor);
            attempt += 1;
        }
    }

    fn record(&mut self, result: &DecodeResult<Decoded>) {
        match result {
            Ok(out) => {
                self.stats.decoded += 1;
                self.stats.frames += out.frames;
                self.stats.log_prob += out.log_prob;
            }
            Err(_err) => {
                self.stats.failed += 1;
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_err, "utterance failed to decode");
            }
        }
    }

    /// Reset per-utterance buffers, keeping their allocations.
    fn reset(&mut self, state_count: usize) {
        self.tree.clear();
        if self.cur.state_count() == state_count {
            self.cur.clear();
            self.next.clear();
        } else {
            self.cur = FrameChart::new(state_count);
            self.next = FrameChart::new(state_count);
        }
    }

    fn search<S>(&mut self, scores: &S, beam: &BeamConfig) -> DecodeResult<Decoded>
    where
        S: AcousticScores + ?Sized,
    {
        let frames = scores.num_frames();
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!("decode_utterance", frames);
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let state_count = self.graph.state_count();
        if state_count == 0 {
            return Err(DecodeError::EmptyGraph);
        }
        self.reset(state_count);

        let root = self.tree.root();
        self.cur
            .insert_or_get(self.graph.start_state())
            .assign(0.0, root);

        let stepper = ViterbiStepper::new(&self.graph, self.config.acoustic_weight);
        for t in 0..frames {
            stepper.step(
                t,
                scores.frame(t),
                &mut self.cur,
                &mut self.next,
                &mut self.tree,
                &mut self.pruner,
                beam,
            )?;
            self.cur.swap(&mut self.next);
        }
        stepper.epsilon_closure(&mut self.cur, &mut self.tree);

        let best = backtrace(&self.graph, &self.cur, &self.tree)
            .ok_or(DecodeError::NoFinalState { frames })?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            words = best.words.len(),
            log_prob = best.log_prob,
            history_nodes = self.tree.len(),
            "utterance decoded"
        );

        Ok(Decoded {
            words: best.words,
            log_prob: best.log_prob,
            frames,
            final_state: best.final_state,
            beam: *beam,
        })
    }
}

/// Decode independent utterances against one graph.
///
/// With the `parallel` feature, utterances are spread over the rayon pool and
/// every worker owns a private decoder; results come back in input order.
/// Each utterance goes through [`ViterbiDecoder::decode_with_retry`].
#[cfg(feature = "parallel")]
pub fn decode_batch<G, S>(
    graph: &G,
    config: &DecoderConfig,
    utterances: &[S],
) -> Result<Vec<DecodeResult<Decoded>>, ConfigError>
where
    G: DecodingGraph + Sync + ?Sized,
    S: AcousticScores + Sync,
{
    use rayon::prelude::*;

    config.validate()?;
    Ok(utterances
        .par_iter()
        .map_init(
            || ViterbiDecoder::from_parts(graph, *config),
            |decoder, scores| decoder.decode_with_retry(scores),
        )
        .collect())
}

/// Decode independent utterances against one graph, sequentially with a
/// single reused decoder. Each utterance goes through
/// [`ViterbiDecoder::decode_with_retry`].
#[cfg(not(feature = "parallel"))]
pub fn decode_batch<G, S>(
    graph: &G,
    config: &DecoderConfig,
    utterances: &[S],
) -> Result<Vec<DecodeResult<Decoded>>, ConfigError>
where
    G: DecodingGraph + ?Sized,
    S: AcousticScores,
{
    config.validate()?;
    let mut decoder = ViterbiDecoder::from_parts(graph, *config);
    Ok(utterances
        .iter()
        .map(|scores| decoder.decode_with_retry(scores))
        .collect())
}
