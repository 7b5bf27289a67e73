//! Valuation endpoint.
//!
//! POST /api/valuations
//!
//! Runs the full appraisal workflow synchronously and returns the
//! result. Interim status is pushed over the progress channel when the
//! request carries a `session_id` with an open WebSocket (see
//! [`crate::routes::progress_ws`]).

use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::error::ApiError;
use crate::workflow::{ValuationRequest, ValuationResponse};

pub async fn valuation_handler(
    State(state): State<AppState>,
    Json(request): Json<ValuationRequest>,
) -> Result<Json<ValuationResponse>, ApiError> {
    let response = state.valuations.appraise(request).await?;
    Ok(Json(response))
}
