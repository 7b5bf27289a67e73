//! Source adapter A: search-engine-backed listing source.
//!
//! Listings are discovered through a general search engine with a
//! `site:` restriction to the marketplace domain. The rendering
//! collaborator performs the CSS extraction; this adapter owns only
//! query/URL construction and payload decoding, returning one
//! free-text description blob per result item.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::renderer::{ExtractionSchema, PageRenderer, RenderRequest};

/// One extracted search-result item.
#[derive(Debug, Deserialize)]
struct SearchItem {
    description: Option<String>,
}

pub struct ChileautosSource {
    renderer: Arc<dyn PageRenderer>,
    search_base_url: String,
    listing_domain: String,
}

impl ChileautosSource {
    pub fn new(renderer: Arc<dyn PageRenderer>, config: &PipelineConfig) -> Self {
        Self {
            renderer,
            search_base_url: config.search_base_url.clone(),
            listing_domain: config.listing_domain.clone(),
        }
    }

    /// Build the search URL for one result page.
    ///
    /// The site-restricted query is percent-encoded and the page index
    /// drives the engine's `start` offset.
    fn page_url(&self, query: &str, page_index: usize) -> String {
        let restricted = format!("{} site:{}", query, self.listing_domain);
        let encoded = urlencoding::encode(&restricted);
        format!("{}?q={}&start={}", self.search_base_url, encoded, page_index)
    }

    fn schema() -> ExtractionSchema {
        ExtractionSchema::new("Available cars", "#rso > div")
            .with_field("description", "span:has(em)")
    }

    /// Fetch one page of results for the query.
    ///
    /// Returns an empty sequence when the page has no results; the
    /// caller decides whether that stops pagination.
    pub async fn fetch_page(&self, query: &str, page_index: usize) -> Result<Vec<String>> {
        let url = self.page_url(query, page_index);
        debug!(%url, page_index, "fetching listing search page");

        let payload = self
            .renderer
            .render(RenderRequest::new(url, Self::schema()))
            .await?;

        let items: Vec<SearchItem> = serde_json::from_str(&payload)?;
        let blobs: Vec<String> = items.into_iter().filter_map(|item| item.description).collect();

        debug!(page_index, count = blobs.len(), "listing search page decoded");
        Ok(blobs)
    }

    /// Sequential sibling of the parallel page fan-out: fetches pages
    /// in order and stops at the first empty one.
    ///
    /// The parallel mode (driven by the pipeline orchestrator) always
    /// requests all pages even after an empty one; the asymmetry is
    /// deliberate there to keep the fan-out simple, and this mode
    /// exists for callers that prefer fewer wasted requests over
    /// latency.
    pub async fn fetch_pages_serial(&self, query: &str, max_pages: usize) -> Result<Vec<String>> {
        let mut blobs = Vec::new();

        for page_index in 0..max_pages {
            let page = self.fetch_page(query, page_index).await?;
            if page.is_empty() {
                info!(page_index, "empty search page, stopping serial pagination");
                break;
            }
            blobs.extend(page);
        }

        Ok(blobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::MockRenderer;

    fn source_with(renderer: MockRenderer) -> ChileautosSource {
        ChileautosSource::new(Arc::new(renderer), &PipelineConfig::default())
    }

    fn page_url(page: usize) -> String {
        format!(
            "https://www.google.com/search?q=honda%20civic%202016%20site%3Achileautos.cl&start={page}"
        )
    }

    #[test]
    fn page_url_encodes_site_restricted_query() {
        let source = source_with(MockRenderer::new());
        let url = source.page_url("honda civic 2016", 3);
        assert_eq!(url, page_url(3));
    }

    #[tokio::test]
    async fn fetch_page_decodes_description_blobs() {
        let renderer = MockRenderer::new().with_payload(
            &page_url(0),
            r#"[{"description":"Honda Civic 2016 $8.000.000"},{"description":null},{"description":"Honda Civic 2016 $8.500.000"}]"#,
        );
        let source = source_with(renderer);

        let blobs = source.fetch_page("honda civic 2016", 0).await.unwrap();
        assert_eq!(blobs.len(), 2);
        assert!(blobs[0].contains("$8.000.000"));
    }

    #[tokio::test]
    async fn serial_mode_stops_at_first_empty_page() {
        let renderer = MockRenderer::new()
            .with_payload(&page_url(0), r#"[{"description":"Honda Civic 2016"}]"#)
            .with_payload(&page_url(1), "[]")
            .with_payload(&page_url(2), r#"[{"description":"never reached"}]"#);
        let source = source_with(renderer);

        let blobs = source
            .fetch_pages_serial("honda civic 2016", 5)
            .await
            .unwrap();
        assert_eq!(blobs, vec!["Honda Civic 2016".to_string()]);
    }
}
