// Main entry point for the valuation API server

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scrape_pipeline::{HttpRenderer, PipelineConfig, ScrapePipeline};
use server_core::plate::StaticPlateLookup;
use server_core::workflow::{PricingRules, ValuationService};
use server_core::{build_app, Config, ProgressHub};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,scrape_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting vehicle valuation API");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    let renderer = Arc::new(
        HttpRenderer::new(&config.renderer_url).context("Failed to create renderer client")?,
    );
    let pipeline_config = PipelineConfig::default()
        .with_max_pages(config.max_search_pages)
        .with_call_timeout(config.scrape_call_timeout);
    let pipeline = Arc::new(ScrapePipeline::new(renderer, pipeline_config));

    let hub = ProgressHub::new();
    let pricing = PricingRules {
        default_base_price: config.default_base_price,
        offer_margin: config.offer_margin,
        offer_fee: config.offer_fee,
    };
    let valuations = Arc::new(ValuationService::new(
        pipeline,
        hub.clone(),
        Arc::new(StaticPlateLookup::new()),
        pricing,
    ));

    let app = build_app(hub, valuations, &config.allowed_origins);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
