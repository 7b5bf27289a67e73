//! Application setup and router wiring.

use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::progress::ProgressHub;
use crate::routes::{health_handler, progress_ws_handler, valuation_handler};
use crate::workflow::ValuationService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub hub: ProgressHub,
    pub valuations: Arc<ValuationService>,
}

/// Build the Axum application router.
pub fn build_app(
    hub: ProgressHub,
    valuations: Arc<ValuationService>,
    allowed_origins: &[String],
) -> Router {
    let state = AppState { hub, valuations };

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "skipping unparseable CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/api/valuations", post(valuation_handler))
        .route("/ws/:session_id", get(progress_ws_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
