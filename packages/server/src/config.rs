use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,

    /// Base URL of the page-rendering sidecar service.
    pub renderer_url: String,

    /// CORS origin allowlist for the frontend.
    pub allowed_origins: Vec<String>,

    /// Search-result pages requested per valuation.
    pub max_search_pages: usize,

    /// Deadline for each rendering collaborator call.
    pub scrape_call_timeout: Duration,

    /// Estimated price used when no comparable listings are found.
    pub default_base_price: f64,

    /// Purchase-offer haircut: offer = estimate * margin - fee.
    /// Business rule with no documented rationale; kept configurable.
    pub offer_margin: f64,
    pub offer_fee: f64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            renderer_url: env::var("RENDERER_URL")
                .context("RENDERER_URL must be set")?,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| {
                    "http://localhost:3000,http://localhost:5173".to_string()
                })
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            max_search_pages: env::var("MAX_SEARCH_PAGES")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("MAX_SEARCH_PAGES must be a valid number")?,
            scrape_call_timeout: Duration::from_secs(
                env::var("SCRAPE_CALL_TIMEOUT_SECONDS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("SCRAPE_CALL_TIMEOUT_SECONDS must be a valid number")?,
            ),
            default_base_price: env::var("DEFAULT_BASE_PRICE")
                .unwrap_or_else(|_| "10000000".to_string())
                .parse()
                .context("DEFAULT_BASE_PRICE must be a valid number")?,
            offer_margin: env::var("OFFER_MARGIN")
                .unwrap_or_else(|_| "0.9".to_string())
                .parse()
                .context("OFFER_MARGIN must be a valid number")?,
            offer_fee: env::var("OFFER_FEE")
                .unwrap_or_else(|_| "1000000".to_string())
                .parse()
                .context("OFFER_FEE must be a valid number")?,
        })
    }
}
