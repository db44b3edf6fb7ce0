//! Error types for CLI operations.

use std::path::Path;

use contracts::ContractError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration could not be loaded or failed validation
    #[error("Failed to load configuration from {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: ContractError,
    },

    /// The registry has no record for this bus number
    #[error("Bus '{bus_number}' is not sharing its position")]
    BusNotFound { bus_number: String },

    /// Registry unreachable or answered with an error
    #[error("Registry request to {endpoint} failed: {source}")]
    Registry {
        endpoint: String,
        #[source]
        source: ContractError,
    },
}

impl CliError {
    pub fn config(path: Option<&Path>, source: ContractError) -> Self {
        Self::Config {
            path: path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<defaults>".to_string()),
            source,
        }
    }

    /// Classify a transport error for `bus_number`
    pub fn registry(endpoint: impl Into<String>, bus_number: &str, source: ContractError) -> Self {
        if source.is_not_found() {
            Self::BusNotFound {
                bus_number: bus_number.to_string(),
            }
        } else {
            Self::Registry {
                endpoint: endpoint.into(),
                source,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_classified() {
        let err = CliError::registry("http://localhost:10000", "42", ContractError::not_found("42"));
        assert!(matches!(err, CliError::BusNotFound { ref bus_number } if bus_number == "42"));
        assert_eq!(err.to_string(), "Bus '42' is not sharing its position");

        let err = CliError::registry("http://x", "42", ContractError::transport("timeout"));
        assert!(matches!(err, CliError::Registry { .. }));
    }

    #[test]
    fn test_config_without_path_mentions_defaults() {
        let err = CliError::config(None, ContractError::config_validation("server.port", "must be > 0"));
        assert!(err.to_string().contains("<defaults>"));
    }
}
