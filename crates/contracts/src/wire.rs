//! HTTP/JSON wire format shared by the registry and the reporter

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::{BusNumber, ContractError, PositionRecord, PositionSample};

/// Update endpoint (POST); reads append `/{busNumber}` (GET)
pub const POSITION_PATH: &str = "/api/position";
/// Stop-sharing endpoint (POST)
pub const STOP_SHARING_PATH: &str = "/api/stopSharing";
/// Line geometry lookup (GET); append `/{code}`
pub const LINE_PATH: &str = "/api/line";

pub const MSG_POSITION_SAVED: &str = "Position enregistrée";
pub const ERR_MISSING_DATA: &str = "Données manquantes";
pub const ERR_MISSING_BUS_NUMBER: &str = "Numéro de bus manquant";
pub const ERR_INVALID_COORDINATES: &str = "Coordonnées invalides";
pub const ERR_BUS_NOT_FOUND: &str = "Bus introuvable";
pub const ERR_INVALID_LINE_CODE: &str = "Code ligne invalide";
pub const ERR_LINE_NOT_FOUND: &str = "Ligne non trouvée";
pub const ERR_INTERNAL: &str = "Erreur interne";

/// Acknowledgement message for a stopped session
pub fn sharing_stopped_message(bus_number: &str) -> String {
    format!("Partage arrêté pour le bus {bus_number}")
}

/// Body of `POST /api/position`.
///
/// Fields are optional so that missing and `null` values reach validation
/// instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdateRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bus_number: Option<BusNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl From<&PositionSample> for PositionUpdateRequest {
    fn from(sample: &PositionSample) -> Self {
        Self {
            bus_number: Some(sample.bus_number().clone()),
            latitude: Some(sample.latitude()),
            longitude: Some(sample.longitude()),
        }
    }
}

/// Body of `POST /api/stopSharing`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopSharingRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bus_number: Option<BusNumber>,
}

impl StopSharingRequest {
    pub fn new(bus_number: BusNumber) -> Self {
        Self {
            bus_number: Some(bus_number),
        }
    }
}

/// Body of a successful `GET /api/position/{busNumber}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionResponse {
    pub latitude: f64,
    pub longitude: f64,
    /// Milliseconds since epoch at which the registry accepted the write
    pub timestamp: i64,
}

impl From<&PositionRecord> for PositionResponse {
    fn from(record: &PositionRecord) -> Self {
        Self {
            latitude: record.latitude,
            longitude: record.longitude,
            timestamp: record.received_at.timestamp_millis(),
        }
    }
}

impl TryFrom<PositionResponse> for PositionRecord {
    type Error = ContractError;

    fn try_from(resp: PositionResponse) -> Result<Self, Self::Error> {
        let received_at = DateTime::from_timestamp_millis(resp.timestamp).ok_or_else(|| {
            ContractError::validation("timestamp", format!("out of range: {}", resp.timestamp))
        })?;
        Ok(Self {
            latitude: resp.latitude,
            longitude: resp.longitude,
            received_at,
        })
    }
}

/// `{"message": ...}` acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{"error": ..., "field": ...}` failure body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Offending request field, for validation failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            field: None,
        }
    }

    pub fn with_field(error: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            field: Some(field.into()),
        }
    }
}
