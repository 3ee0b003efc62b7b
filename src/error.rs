//! Error types for basket building and rule mining.

use thiserror::Error;

/// Result type for mining operations.
pub type MiningResult<T> = std::result::Result<T, MiningError>;

/// Errors that can end a mining run.
///
/// A run that fails never exposes partial itemsets or rules. An empty
/// transaction set is not an error: it completes with an empty rule list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MiningError {
    /// Thresholds or limits outside their valid range.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A raw transaction row could not be used.
    #[error("Malformed transaction row {row}: {reason}")]
    Ingest {
        /// Zero-based position of the offending row in the input.
        row: usize,
        reason: String,
    },

    /// Candidate growth passed the configured safety limit.
    #[error("Resource limit exceeded: {0}")]
    ResourceExceeded(String),

    /// The run was cancelled at a level boundary.
    #[error("Mining run cancelled")]
    Cancelled,
}

impl MiningError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an ingestion error for the row at `row`.
    pub fn ingest(row: usize, reason: impl Into<String>) -> Self {
        Self::Ingest {
            row,
            reason: reason.into(),
        }
    }

    /// Creates a resource error with the given message.
    pub fn resource_exceeded(msg: impl Into<String>) -> Self {
        Self::ResourceExceeded(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_failure() {
        assert_eq!(
            MiningError::config("min_support must be in (0, 1], got 1.5").to_string(),
            "Invalid configuration: min_support must be in (0, 1], got 1.5"
        );
        assert_eq!(
            MiningError::ingest(3, "empty item_label").to_string(),
            "Malformed transaction row 3: empty item_label"
        );
        assert_eq!(MiningError::Cancelled.to_string(), "Mining run cancelled");
    }
}
