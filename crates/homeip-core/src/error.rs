//! Error types for homeip
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for homeip operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for homeip
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (missing file, malformed YAML, failed validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// DNS provider call failed (listing zones, listing records, updating a record)
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Public IP resolution failed
    #[error("Network error: {0}")]
    Network(String),

    /// No zone matched the configured domain
    #[error("No zone matches domain '{domain}'")]
    ZoneNotFound {
        /// Configured domain
        domain: String,
    },

    /// No record in the zone matched the configured name fragment
    #[error("No record in zone '{zone}' matches '{name}'")]
    RecordNotFound {
        /// Zone name searched
        zone: String,
        /// Configured name fragment
        name: String,
    },

    /// One or more entries failed during a reconciliation cycle
    #[error("{} of {total} entries failed ({skipped} skipped)", .failures.len())]
    Cycle {
        /// Number of configured entries in the cycle
        total: usize,
        /// Entries never attempted because the cycle aborted
        skipped: usize,
        /// Per-entry failures, in processing order
        failures: Vec<EntryFailure>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// A single entry's failure inside a cycle
#[derive(Debug)]
pub struct EntryFailure {
    /// Configured domain of the failing entry
    pub domain: String,
    /// Configured name fragment of the failing entry
    pub name: String,
    /// What went wrong
    pub error: Error,
}

impl std::fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}: {}", self.domain, self.name, self.error)
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// True for the absent-zone / absent-record variants
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ZoneNotFound { .. } | Self::RecordNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_display_counts_failures() {
        let err = Error::Cycle {
            total: 3,
            skipped: 1,
            failures: vec![EntryFailure {
                domain: "example.com".to_string(),
                name: "home".to_string(),
                error: Error::ZoneNotFound {
                    domain: "example.com".to_string(),
                },
            }],
        };

        assert_eq!(err.to_string(), "1 of 3 entries failed (1 skipped)");
    }

    #[test]
    fn test_not_found_is_distinct_from_provider() {
        let missing = Error::ZoneNotFound {
            domain: "example.com".to_string(),
        };
        let provider = Error::provider("cloudflare", "HTTP 500");

        assert!(missing.is_not_found());
        assert!(!provider.is_not_found());
    }
}
