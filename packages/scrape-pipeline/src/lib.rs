//! Scrape-aggregate-extract pipeline for used-vehicle listings.
//!
//! Aggregates listing data from two heterogeneous marketplace origins:
//!
//! - **Source A** (listing site via a site-restricted search engine
//!   query): free-text description blobs, segmented on a delimiter
//!   heuristic and parsed by regex extraction.
//! - **Source B** (marketplace search UI): structured per-item
//!   extraction with string-typed numeric fields, coerced record by
//!   record.
//!
//! Page rendering and CSS extraction are delegated to an external
//! rendering service behind the [`renderer::PageRenderer`] trait; the
//! pipeline owns query construction, parsing and the concurrent
//! fan-out/merge.
//!
//! # Usage
//!
//! ```rust,ignore
//! use scrape_pipeline::{HttpRenderer, PipelineConfig, ScrapePipeline};
//! use tokio_util::sync::CancellationToken;
//!
//! let renderer = std::sync::Arc::new(HttpRenderer::new("http://localhost:9222")?);
//! let pipeline = ScrapePipeline::new(renderer, PipelineConfig::default());
//!
//! let records = pipeline
//!     .run("honda", "civic", 2016, &CancellationToken::new())
//!     .await?;
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod renderer;
pub mod segment;
pub mod sources;
pub mod types;

pub use config::PipelineConfig;
pub use error::{PipelineError, RenderError, SkipReason};
pub use extract::extract;
pub use pipeline::ScrapePipeline;
pub use renderer::{ExtractionSchema, HttpRenderer, MockRenderer, PageRenderer, RenderRequest};
pub use segment::segment;
pub use types::{ListingRecord, RawListing, SearchQuery};
