//! Typed errors for the scrape pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can
//! match on failure modes instead of string-parsing.

use thiserror::Error;

/// Errors that can occur while running the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A renderer collaborator call failed
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    /// Collaborator payload could not be decoded
    #[error("payload decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A collaborator call exceeded its deadline
    #[error("collaborator call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The request was cancelled before the fetch completed
    #[error("operation cancelled")]
    Cancelled,
}

/// Errors from the page-rendering/automation collaborator.
#[derive(Debug, Error)]
pub enum RenderError {
    /// HTTP transport failure talking to the rendering service
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The rendering service answered with a non-success status
    #[error("rendering service returned {status} for {url}")]
    Status { status: u16, url: String },

    /// The rendering service returned no extracted content
    #[error("no extracted content for {url}")]
    EmptyContent { url: String },
}

/// Why a single source-B record was skipped during coercion.
///
/// Missing or malformed fields are expected data, not exceptional
/// control flow: one bad record never aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` has no digits: {value:?}")]
    NotNumeric { field: &'static str, value: String },
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
