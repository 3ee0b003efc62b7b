//! Mining thresholds and resource limits

use crate::error::{MiningError, MiningResult};

/// Configuration for a single mining run.
///
/// All values are passed in explicitly; nothing is read from process-wide
/// state. Call [`MiningConfig::validate`] (or let [`crate::mine`] do it)
/// before any work starts.
#[derive(Debug, Clone, PartialEq)]
pub struct MiningConfig {
    /// Minimum fraction of transactions an itemset must appear in, in (0, 1]
    pub min_support: f64,
    /// Minimum rule confidence, in [0, 1]
    pub min_confidence: f64,
    /// Minimum rule lift, >= 0
    pub min_lift: f64,
    /// Largest itemset size to mine; `None` mines until no candidates remain
    pub max_itemset_size: Option<usize>,
    /// Abort once this many candidates have been generated across all levels
    pub candidate_ceiling: Option<usize>,
    /// Number of threads used for support counting
    pub threads: usize,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            min_support: 0.01,
            min_confidence: 0.5,
            min_lift: 0.0,
            max_itemset_size: None,
            candidate_ceiling: None,
            threads: 1,
        }
    }
}

impl MiningConfig {
    /// Creates a configuration with the three rule thresholds and no limits.
    pub fn new(min_support: f64, min_confidence: f64, min_lift: f64) -> Self {
        Self {
            min_support,
            min_confidence,
            min_lift,
            ..Self::default()
        }
    }

    pub fn with_max_itemset_size(mut self, size: usize) -> Self {
        self.max_itemset_size = Some(size);
        self
    }

    pub fn with_candidate_ceiling(mut self, ceiling: usize) -> Self {
        self.candidate_ceiling = Some(ceiling);
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Check every threshold and limit against its valid range.
    pub fn validate(&self) -> MiningResult<()> {
        if !self.min_support.is_finite() || self.min_support <= 0.0 || self.min_support > 1.0 {
            return Err(MiningError::config(format!(
                "min_support must be in (0, 1], got {}",
                self.min_support
            )));
        }
        if !self.min_confidence.is_finite() || !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(MiningError::config(format!(
                "min_confidence must be in [0, 1], got {}",
                self.min_confidence
            )));
        }
        if !self.min_lift.is_finite() || self.min_lift < 0.0 {
            return Err(MiningError::config(format!(
                "min_lift must be a finite value >= 0, got {}",
                self.min_lift
            )));
        }
        if self.max_itemset_size == Some(0) {
            return Err(MiningError::config("max_itemset_size must be at least 1"));
        }
        if self.candidate_ceiling == Some(0) {
            return Err(MiningError::config("candidate_ceiling must be at least 1"));
        }
        if self.threads == 0 {
            return Err(MiningError::config("threads must be at least 1"));
        }
        Ok(())
    }
}
