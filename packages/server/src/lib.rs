//! Used-vehicle valuation service.
//!
//! HTTP API around the [`scrape_pipeline`] crate: accepts a vehicle
//! (by plate or by explicit attributes), gathers comparable listings
//! from two marketplace origins, and computes an estimated price and a
//! purchase offer. Clients can follow the staged workflow live over a
//! per-session WebSocket.

pub mod app;
pub mod config;
pub mod error;
pub mod plate;
pub mod progress;
pub mod regression;
pub mod routes;
pub mod workflow;

pub use app::{build_app, AppState};
pub use config::Config;
pub use error::ApiError;
pub use progress::{ProgressEvent, ProgressHub};
pub use workflow::{
    PricingRules, ValuationRequest, ValuationResponse, ValuationService, VehicleData,
    WorkflowPlan,
};
