//! Layered error definitions
//!
//! Categorized by source: config / protocol / transport / capability

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Protocol Errors =====
    /// Missing or out-of-range field in a sample or request
    #[error("invalid field '{field}': {message}")]
    Validation { field: String, message: String },

    /// Identifier unknown to the registry
    #[error("no position shared for bus '{bus_number}'")]
    NotFound { bus_number: String },

    // ===== Transport Errors =====
    /// Network failure, timeout or non-2xx response
    #[error("transport error: {message}")]
    Transport { message: String },

    // ===== Capability Errors =====
    /// Platform capability (location permission) not granted
    #[error("capability denied: {capability}")]
    CapabilityDenied { capability: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create field validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create not-found error
    pub fn not_found(bus_number: impl Into<String>) -> Self {
        Self::NotFound {
            bus_number: bus_number.into(),
        }
    }

    /// Create transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create location permission denial
    pub fn location_denied() -> Self {
        Self::CapabilityDenied {
            capability: "location".to_string(),
        }
    }

    /// Whether the error means "no record for this identifier"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
