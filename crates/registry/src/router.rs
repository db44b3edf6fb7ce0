//! Router assembly: routes, CORS, tracing and panic isolation

use std::any::Any;

use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use contracts::{LINE_PATH, POSITION_PATH, STOP_SHARING_PATH};

use crate::error::RegistryError;
use crate::handlers;
use crate::state::AppState;

/// Build the registry router around injected state
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AnyOrigin);

    Router::new()
        .route("/", get(handlers::index))
        .route(POSITION_PATH, post(handlers::save_position))
        .route(
            &format!("{POSITION_PATH}/{{bus_number}}"),
            get(handlers::get_position),
        )
        .route(STOP_SHARING_PATH, post(handlers::stop_sharing))
        .route(&format!("{LINE_PATH}/{{code}}"), get(handlers::get_line))
        .fallback(handlers::fallback)
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

// One panicking request must not take the process down or leak state.
fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    RegistryError::Internal(format!("handler panicked: {detail}")).into_response()
}
