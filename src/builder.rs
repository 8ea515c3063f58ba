use crate::config::{BeamConfig, DecoderConfig, RetryPolicy};
use crate::error::ConfigError;
use crate::traits::DecodingGraph;
use crate::ViterbiDecoder;

pub struct DecoderBuilder<G: DecodingGraph> {
    graph: G,
    config: DecoderConfig,
}

impl<G: DecodingGraph> DecoderBuilder<G> {
    pub fn new(graph: G) -> Self {
        Self {
            graph,
            config: DecoderConfig::default(),
        }
    }
    pub fn with_config(mut self, config: DecoderConfig) -> Self {
        self.config = config;
        self
    }
    pub fn with_acoustic_weight(mut self, weight: f64) -> Self {
        self.config.acoustic_weight = weight;
        self
    }
    pub fn with_log_prob_beam(mut self, beam: f64) -> Self {
        self.config.beam.log_prob_beam = beam;
        self
    }
    pub fn with_rank_beam(mut self, limit: usize) -> Self {
        self.config.beam.rank_beam = limit;
        self
    }
    pub fn with_beam(mut self, beam: BeamConfig) -> Self {
        self.config.beam = beam;
        self
    }
    pub fn with_retry(mut self, max_attempts: u32, widen_factor: f64) -> Self {
        self.config.retry = RetryPolicy {
            max_attempts,
            widen_factor,
        };
        self
    }
    pub fn build(self) -> Result<ViterbiDecoder<G>, ConfigError> {
        ViterbiDecoder::new(self.graph, self.config)
    }
}
