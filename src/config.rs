//! Decoder configuration.
//!
//! Three knobs drive the search (acoustic weight, score beam, rank beam);
//! a fourth, [`RetryPolicy`], controls how [`crate::ViterbiDecoder::decode_with_retry`]
//! widens the beams after a failed utterance.

use crate::error::ConfigError;

/// Beam-pruning parameters.
///
/// A value of zero disables the corresponding beam.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeamConfig {
    /// Cells scoring below `best - log_prob_beam` are dropped (natural log).
    pub log_prob_beam: f64,
    /// At most this many cells survive a frame.
    pub rank_beam: usize,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

impl BeamConfig {
    /// No pruning at all.
    pub const fn disabled() -> Self {
        Self {
            log_prob_beam: 0.0,
            rank_beam: 0,
        }
    }

    pub fn new(log_prob_beam: f64, rank_beam: usize) -> Self {
        Self {
            log_prob_beam,
            rank_beam,
        }
    }

    /// Beam width actually applied; infinite when score pruning is off.
    #[inline]
    pub fn effective_log_prob_beam(&self) -> f64 {
        if self.log_prob_beam > 0.0 {
            self.log_prob_beam
        } else {
            f64::INFINITY
        }
    }

    /// Whether either beam prunes anything.
    pub fn is_enabled(&self) -> bool {
        self.effective_log_prob_beam().is_finite() || self.rank_beam > 0
    }

    /// Both beams scaled by `factor`; disabled beams stay disabled.
    pub fn widened(&self, factor: f64) -> Self {
        Self {
            log_prob_beam: self.log_prob_beam * factor,
            rank_beam: if self.rank_beam == 0 {
                0
            } else {
                ((self.rank_beam as f64) * factor).ceil() as usize
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_prob_beam.is_nan() || self.log_prob_beam < 0.0 {
            return Err(ConfigError::InvalidBeam(self.log_prob_beam));
        }
        Ok(())
    }
}

/// How failed utterances are retried with wider beams.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryPolicy {
    /// Total attempts per utterance, including the first one.
    pub max_attempts: u32,
    /// Multiplier applied to both beams before each further attempt.
    pub widen_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            widen_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidRetry(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_attempts > 1 && !(self.widen_factor.is_finite() && self.widen_factor > 1.0) {
            return Err(ConfigError::InvalidRetry(format!(
                "widen_factor must be a finite number above 1, got {}",
                self.widen_factor
            )));
        }
        Ok(())
    }
}

/// Full decoder configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecoderConfig {
    /// Multiplier on acoustic log-likelihoods relative to graph weights.
    pub acoustic_weight: f64,
    pub beam: BeamConfig,
    pub retry: RetryPolicy,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            acoustic_weight: 1.0,
            beam: BeamConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl DecoderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.acoustic_weight.is_finite() && self.acoustic_weight >= 0.0) {
            return Err(ConfigError::InvalidAcousticWeight(self.acoustic_weight));
        }
        self.beam.validate()?;
        self.retry.validate()
    }
}
