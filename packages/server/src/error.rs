//! API error type mapped onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::plate::PlateLookupError;
use crate::regression::RegressionError;
use scrape_pipeline::PipelineError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Client sent an invalid valuation request.
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Plate(#[from] PlateLookupError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Regression(#[from] RegressionError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Plate(PlateLookupError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Plate(_) => StatusCode::BAD_GATEWAY,
            ApiError::Pipeline(_) | ApiError::Regression(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "valuation failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
