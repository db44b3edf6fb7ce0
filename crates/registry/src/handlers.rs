//! HTTP handlers for the position protocol

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::{info, instrument, warn};

use contracts::{
    sharing_stopped_message, ErrorResponse, MessageResponse, PositionResponse,
    PositionUpdateRequest, StopSharingRequest, ERR_MISSING_BUS_NUMBER, ERR_MISSING_DATA,
    MSG_POSITION_SAVED,
};
use geojson::Feature;

use crate::error::RegistryError;
use crate::lines::LineCatalog;
use crate::state::AppState;
use crate::store::PositionStore;

pub type SharedStore = Arc<PositionStore>;
pub type SharedLines = Arc<LineCatalog>;

/// `GET /` - service index
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "message": "API de suivi de bus en temps réel",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "active",
        "active_buses": state.store.len(),
        "lines": state.lines.len(),
        "endpoints": {
            "get_position": "GET /api/position/{busNumber}",
            "post_position": "POST /api/position",
            "stop_sharing": "POST /api/stopSharing",
            "get_line": "GET /api/line/{code}"
        }
    }))
}

/// `POST /api/position` - record the latest position of a bus
#[instrument(name = "http_save_position", skip_all)]
pub async fn save_position(
    State(store): State<SharedStore>,
    payload: Result<Json<PositionUpdateRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, RegistryError> {
    let Json(req) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected position update body");
        RegistryError::malformed_body(ERR_MISSING_DATA, rejection.body_text())
    })?;

    let bus_number = req
        .bus_number
        .ok_or_else(|| RegistryError::missing("busNumber"))?;

    let record = store
        .upsert(&bus_number, req.latitude, req.longitude)
        .inspect_err(|e| warn!(bus_number = %bus_number, error = %e, "Position update rejected"))?;

    observability::record_position_upserted();
    info!(
        bus_number = %bus_number,
        latitude = record.latitude,
        longitude = record.longitude,
        "Position enregistrée"
    );

    Ok(Json(MessageResponse::new(MSG_POSITION_SAVED)))
}

/// `GET /api/position/{busNumber}` - current position of a bus
#[instrument(name = "http_get_position", skip(store))]
pub async fn get_position(
    State(store): State<SharedStore>,
    Path(bus_number): Path<String>,
) -> Result<Json<PositionResponse>, RegistryError> {
    let result = store.read(&bus_number);
    observability::record_position_read(result.is_ok());

    let record = result?;
    info!(bus_number = %bus_number, "Position demandée");
    Ok(Json(PositionResponse::from(&record)))
}

/// `POST /api/stopSharing` - discard the position of a bus
#[instrument(name = "http_stop_sharing", skip_all)]
pub async fn stop_sharing(
    State(store): State<SharedStore>,
    payload: Result<Json<StopSharingRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, RegistryError> {
    let Json(req) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "Rejected stop-sharing body");
        RegistryError::malformed_body(ERR_MISSING_BUS_NUMBER, rejection.body_text())
    })?;

    let bus_number = match req.bus_number {
        Some(bus_number) if !bus_number.is_blank() => bus_number,
        _ => {
            return Err(RegistryError::Validation {
                reason: ERR_MISSING_BUS_NUMBER,
                field: Some("busNumber".to_string()),
                detail: "missing field 'busNumber'".to_string(),
            })
        }
    };

    let result = store.delete(&bus_number);
    observability::record_sharing_stopped(result.is_ok());
    result?;

    info!(bus_number = %bus_number, "Partage arrêté");
    Ok(Json(MessageResponse::new(sharing_stopped_message(
        bus_number.trim(),
    ))))
}

/// `GET /api/line/{code}` - GeoJSON feature of a bus line
#[instrument(name = "http_get_line", skip(lines))]
pub async fn get_line(
    State(lines): State<SharedLines>,
    Path(code): Path<String>,
) -> Result<Json<Feature>, RegistryError> {
    let code = code
        .parse::<i64>()
        .map_err(|_| RegistryError::invalid_line_code(&code))?;
    let feature = lines
        .find(code)
        .ok_or(RegistryError::LineNotFound { code })?;

    info!(code, "Ligne demandée");
    Ok(Json(feature.clone()))
}

/// Unknown route
pub async fn fallback() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("Route introuvable")),
    )
}
