//! Reporter error types

use contracts::ContractError;
use thiserror::Error;

/// Reporter-specific errors
#[derive(Debug, Error)]
pub enum ReporterError {
    /// Platform capability (location permission) not granted
    #[error("capability denied: {capability}")]
    CapabilityDenied { capability: &'static str },

    /// Caller-supplied argument rejected
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Contract-level error
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl ReporterError {
    pub fn location_denied() -> Self {
        Self::CapabilityDenied {
            capability: "location",
        }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn is_capability_denied(&self) -> bool {
        matches!(
            self,
            Self::CapabilityDenied { .. } | Self::Contract(ContractError::CapabilityDenied { .. })
        )
    }
}
