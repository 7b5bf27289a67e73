//! Valuation workflow: the request-level sequencer.
//!
//! One valuation is a linear pass through an enumerated plan of named
//! stages. The plan is computed once at request start (its length
//! depends only on whether a mileage adjustment runs), so the total
//! step count communicated to the client is fixed before the first
//! progress event and percentages are monotonic and deterministic.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::plate::PlateLookup;
use crate::progress::{ProgressEvent, ProgressHub};
use crate::regression::LinearModel;
use scrape_pipeline::{ListingRecord, ScrapePipeline};

/// Explicit vehicle attributes, the alternative to a plate lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleData {
    pub brand: String,
    pub model: String,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValuationRequest {
    /// Lookup by plate...
    #[serde(default)]
    pub plate: Option<String>,

    /// ...or by explicit vehicle attributes. Exactly one must be set.
    #[serde(default)]
    pub vehicle: Option<VehicleData>,

    #[serde(default)]
    pub mileage_km: Option<i64>,

    /// Correlates the request with an open progress channel. Generated
    /// server-side when absent (the client then gets no progress).
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValuationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<VehicleData>,
    pub estimated_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage_km: Option<i64>,
    pub message: String,
    pub session_id: String,
}

/// Named stages of the valuation workflow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ValidateInput,
    QueryPrices,
    FetchListings,
    FilterListings,
    ComputeBase,
    AnalyzeMileage,
    FitDepreciation,
    MileageAdjusted,
    PrepareOffer,
    Complete,
}

/// The ordered stage list for one request, fixed at request start.
#[derive(Debug, Clone)]
pub struct WorkflowPlan {
    stages: Vec<Stage>,
}

impl WorkflowPlan {
    /// Build the plan for a request shape: 10 stages when a mileage
    /// adjustment runs, 7 otherwise.
    pub fn for_request(adjust_mileage: bool) -> Self {
        let mut stages = vec![
            Stage::ValidateInput,
            Stage::QueryPrices,
            Stage::FetchListings,
            Stage::FilterListings,
            Stage::ComputeBase,
        ];
        if adjust_mileage {
            stages.extend([
                Stage::AnalyzeMileage,
                Stage::FitDepreciation,
                Stage::MileageAdjusted,
            ]);
        }
        stages.extend([Stage::PrepareOffer, Stage::Complete]);
        Self { stages }
    }

    pub fn total_steps(&self) -> u32 {
        self.stages.len() as u32
    }

    /// 1-based step index of a stage, `None` when the stage is not in
    /// this plan.
    pub fn step_of(&self, stage: Stage) -> Option<u32> {
        self.stages
            .iter()
            .position(|&s| s == stage)
            .map(|i| i as u32 + 1)
    }
}

/// Emits one progress event per entered stage, keyed by the plan.
struct StageReporter {
    hub: ProgressHub,
    session_id: String,
    plan: WorkflowPlan,
}

impl StageReporter {
    fn new(hub: ProgressHub, session_id: &str, plan: WorkflowPlan) -> Self {
        Self {
            hub,
            session_id: session_id.to_string(),
            plan,
        }
    }

    async fn enter(&self, stage: Stage, message: impl Into<String>) {
        let Some(step) = self.plan.step_of(stage) else {
            debug!(?stage, "stage not in plan, no event");
            return;
        };
        self.hub
            .emit(ProgressEvent::new(
                &self.session_id,
                step,
                self.plan.total_steps(),
                message,
            ))
            .await;
    }
}

/// Keep records with a price and the exact requested year, dropping
/// exact duplicates while preserving first-occurrence order.
///
/// Pure function of record equality, so reapplying it is a no-op.
pub fn filter_comparables(records: &[ListingRecord], year: i32) -> Vec<ListingRecord> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|record| record.price.is_some() && record.year == Some(year))
        .filter(|record| seen.insert((*record).clone()))
        .cloned()
        .collect()
}

/// Bracketed step-function discount used when there is too little
/// mileage data for a regression.
fn bracket_discount(base_price: f64, mileage_km: i64) -> f64 {
    if mileage_km <= 50_000 {
        base_price
    } else if mileage_km <= 100_000 {
        base_price * 0.9
    } else if mileage_km <= 150_000 {
        base_price * 0.8
    } else {
        base_price * 0.7
    }
}

fn mileage_pairs(comparables: &[ListingRecord]) -> Vec<(f64, f64)> {
    comparables
        .iter()
        .filter(|record| record.has_price_and_mileage())
        .map(|record| {
            (
                record.mileage_km.unwrap() as f64,
                record.price.unwrap() as f64,
            )
        })
        .collect()
}

/// Pricing business rules, configurable per deployment.
#[derive(Debug, Clone)]
pub struct PricingRules {
    /// Estimate used when no comparable listings exist.
    pub default_base_price: f64,

    /// Purchase offer = estimate * margin - fee.
    pub offer_margin: f64,
    pub offer_fee: f64,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            default_base_price: 10_000_000.0,
            offer_margin: 0.9,
            offer_fee: 1_000_000.0,
        }
    }
}

impl PricingRules {
    fn purchase_offer(&self, estimated_price: f64) -> f64 {
        estimated_price * self.offer_margin - self.offer_fee
    }
}

/// Runs the staged valuation workflow for one request.
pub struct ValuationService {
    pipeline: Arc<ScrapePipeline>,
    hub: ProgressHub,
    plates: Arc<dyn PlateLookup>,
    pricing: PricingRules,
}

impl ValuationService {
    pub fn new(
        pipeline: Arc<ScrapePipeline>,
        hub: ProgressHub,
        plates: Arc<dyn PlateLookup>,
        pricing: PricingRules,
    ) -> Self {
        Self {
            pipeline,
            hub,
            plates,
            pricing,
        }
    }

    /// Appraise a vehicle: validate, fetch, filter, adjust, finalize.
    ///
    /// Progress events are best-effort side channel traffic; the
    /// computation runs to completion even with no listener.
    pub async fn appraise(&self, request: ValuationRequest) -> Result<ValuationResponse, ApiError> {
        let session_id = request
            .session_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let plan = WorkflowPlan::for_request(request.mileage_km.is_some());
        let reporter = StageReporter::new(self.hub.clone(), &session_id, plan);

        // Exactly one of plate / vehicle data; invalid shapes fail
        // before the first progress event.
        let vehicle = match (&request.plate, &request.vehicle) {
            (Some(_), Some(_)) => {
                return Err(ApiError::InvalidInput(
                    "provide either a plate or vehicle data, not both".to_string(),
                ))
            }
            (None, None) => {
                return Err(ApiError::InvalidInput(
                    "either a plate or vehicle data is required".to_string(),
                ))
            }
            (Some(plate), None) => {
                reporter
                    .enter(Stage::ValidateInput, "Validating plate...")
                    .await;
                self.plates.lookup(plate).await?
            }
            (None, Some(vehicle)) => {
                reporter
                    .enter(Stage::ValidateInput, "Validating vehicle data...")
                    .await;
                vehicle.clone()
            }
        };

        let brand = vehicle.brand.to_lowercase();
        let model = vehicle.model.to_lowercase();

        reporter
            .enter(
                Stage::QueryPrices,
                format!("Querying prices for {} {}...", brand, model),
            )
            .await;
        reporter
            .enter(Stage::FetchListings, "Scraping marketplace listings...")
            .await;

        let cancel = CancellationToken::new();
        let records = self
            .pipeline
            .run(&brand, &model, vehicle.year, &cancel)
            .await?;

        reporter
            .enter(Stage::FilterListings, "Filtering comparable listings...")
            .await;
        let comparables = filter_comparables(&records, vehicle.year);
        info!(
            raw = records.len(),
            comparable = comparables.len(),
            year = vehicle.year,
            "listings filtered"
        );

        reporter
            .enter(Stage::ComputeBase, "Computing base price...")
            .await;
        let prices: Vec<f64> = comparables
            .iter()
            .filter_map(|record| record.price)
            .map(|price| price as f64)
            .collect();
        let base_price = if prices.is_empty() {
            self.pricing.default_base_price
        } else {
            prices.iter().sum::<f64>() / prices.len() as f64
        };

        let (estimated_price, message) = match request.mileage_km {
            None => (
                base_price,
                "Base price (no mileage adjustment)".to_string(),
            ),
            Some(mileage_km) => {
                let adjusted = self
                    .adjust_by_mileage(&reporter, &comparables, mileage_km)
                    .await?;
                (
                    adjusted,
                    format!("Price adjusted for mileage ({mileage_km} km)"),
                )
            }
        };

        reporter
            .enter(Stage::PrepareOffer, "Preparing purchase offer...")
            .await;
        let offer_price = self.pricing.purchase_offer(estimated_price);

        reporter.enter(Stage::Complete, "Valuation complete").await;

        Ok(ValuationResponse {
            plate: request.plate.map(|plate| plate.to_uppercase()),
            vehicle: request.vehicle,
            estimated_price,
            offer_price: Some(offer_price),
            mileage_km: request.mileage_km,
            message,
            session_id,
        })
    }

    /// Depreciation adjustment by mileage.
    ///
    /// With fewer than 3 (price, mileage) pairs the bracket discount
    /// applies to the mean observed price; otherwise a least-squares
    /// fit predicts at the requested mileage, floored at the minimum
    /// observed price so one steep sample cannot produce a giveaway.
    async fn adjust_by_mileage(
        &self,
        reporter: &StageReporter,
        comparables: &[ListingRecord],
        mileage_km: i64,
    ) -> Result<f64, ApiError> {
        reporter
            .enter(Stage::AnalyzeMileage, "Analyzing mileage data...")
            .await;

        let pairs = mileage_pairs(comparables);

        let adjusted = if pairs.len() < 3 {
            reporter
                .enter(
                    Stage::FitDepreciation,
                    "Not enough mileage data, using standard discount...",
                )
                .await;

            let base = if pairs.is_empty() {
                self.pricing.default_base_price
            } else {
                pairs.iter().map(|(_, price)| price).sum::<f64>() / pairs.len() as f64
            };
            bracket_discount(base, mileage_km)
        } else {
            reporter
                .enter(Stage::FitDepreciation, "Fitting depreciation model...")
                .await;

            let model = LinearModel::fit(&pairs)?;
            let predicted = model.predict(mileage_km as f64);
            let min_price = pairs.iter().map(|(_, price)| *price).fold(f64::MAX, f64::min);
            predicted.max(min_price)
        };

        reporter
            .enter(Stage::MileageAdjusted, "Mileage adjustment complete")
            .await;

        Ok(adjusted)
    }
}
