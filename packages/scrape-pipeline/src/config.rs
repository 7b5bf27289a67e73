//! Pipeline configuration.

use std::time::Duration;

/// Configuration for the scrape pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Search-result pages requested from source A. Default: 5.
    pub max_pages: usize,

    /// Marketplace domain used in the `site:` query restriction.
    pub listing_domain: String,

    /// Search engine base URL for source A.
    pub search_base_url: String,

    /// Marketplace landing URL for source B.
    pub marketplace_url: String,

    /// Deadline applied to every collaborator call. A stalled call
    /// degrades that page to an empty result instead of hanging the
    /// whole request.
    pub call_timeout: Duration,

    /// Delimiter for splitting description blobs into fragments.
    pub segment_delimiter: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_pages: 5,
            listing_domain: "chileautos.cl".to_string(),
            search_base_url: "https://www.google.com/search".to_string(),
            marketplace_url: "https://www.mercadolibre.cl/".to_string(),
            call_timeout: Duration::from_secs(30),
            segment_delimiter: ";".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_listing_domain(mut self, domain: impl Into<String>) -> Self {
        self.listing_domain = domain.into();
        self
    }
}
