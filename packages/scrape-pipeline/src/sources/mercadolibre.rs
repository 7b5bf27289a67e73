//! Source adapter B: marketplace search UI.
//!
//! The marketplace has no stable query URL worth scraping, so the
//! rendering collaborator drives the page itself: an in-page script
//! types the query into the site's search box and submits the form,
//! then the CSS schema extracts one structured item per result card.
//! Numeric fields come back string-typed as scraped; coercion happens
//! in the orchestrator. Single page, no pagination.

use std::sync::Arc;

use tracing::debug;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::renderer::{ExtractionSchema, PageRenderer, RenderRequest};
use crate::types::RawListing;

pub struct MercadolibreSource {
    renderer: Arc<dyn PageRenderer>,
    marketplace_url: String,
}

impl MercadolibreSource {
    pub fn new(renderer: Arc<dyn PageRenderer>, config: &PipelineConfig) -> Self {
        Self {
            renderer,
            marketplace_url: config.marketplace_url.clone(),
        }
    }

    fn schema() -> ExtractionSchema {
        ExtractionSchema::new("Available cars", "ol.ui-search-layout > li.ui-search-layout__item")
            .with_field("model", "a.poly-component__title")
            .with_field("price", "span.andes-money-amount__fraction")
            .with_field("year", "ul.poly-attributes_list > li:first-child")
            .with_field("km", "ul.poly-attributes_list > li:last-child")
    }

    fn search_scripts(query: &str) -> Vec<String> {
        // The query lands in a JS string literal; escape accordingly.
        let escaped = query.replace('\\', "\\\\").replace('\'', "\\'");
        vec![
            format!(
                "const input = document.querySelector('input.nav-search-input');\n\
                 if (input) {{ input.value = '{escaped}'; }}"
            ),
            "document.querySelector('form.nav-search').submit();".to_string(),
        ]
    }

    /// Run the query through the marketplace's own search and return
    /// the per-item extraction for the resulting page.
    pub async fn fetch_listings(&self, query: &str) -> Result<Vec<RawListing>> {
        debug!(%query, "driving marketplace search");

        let mut request = RenderRequest::new(self.marketplace_url.clone(), Self::schema());
        for script in Self::search_scripts(query) {
            request = request.with_script(script);
        }

        let payload = self.renderer.render(request).await?;
        let listings: Vec<RawListing> = serde_json::from_str(&payload)?;

        debug!(count = listings.len(), "marketplace search decoded");
        Ok(listings)
    }
}
