//! Pipeline orchestrator: concurrent fan-out over both sources,
//! merged into one normalized dataset.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::extract::extract;
use crate::renderer::PageRenderer;
use crate::segment::segment;
use crate::sources::{ChileautosSource, MercadolibreSource};
use crate::types::{ListingRecord, SearchQuery};

/// Drives both source adapters concurrently and merges their outputs.
///
/// Source A (listing site via search engine) contributes free-text
/// blobs that are segmented and run through the text extractor; source
/// B (marketplace search UI) contributes string-typed records that are
/// coerced field by field. Results concatenate in A-then-B order. No
/// relevance filtering happens here; that is the caller's concern.
pub struct ScrapePipeline {
    listings: ChileautosSource,
    marketplace: MercadolibreSource,
    config: PipelineConfig,
}

impl ScrapePipeline {
    pub fn new(renderer: Arc<dyn PageRenderer>, config: PipelineConfig) -> Self {
        Self {
            listings: ChileautosSource::new(renderer.clone(), &config),
            marketplace: MercadolibreSource::new(renderer, &config),
            config,
        }
    }

    /// Fetch, extract and merge listings for a vehicle.
    ///
    /// All of source A's pages and source B's single call run
    /// concurrently and are joined once both complete. The page
    /// fan-out always requests every page even when an earlier page
    /// came back empty; this intentionally differs from
    /// [`ChileautosSource::fetch_pages_serial`], trading wasted calls
    /// for recall and parallelism.
    ///
    /// A failed or timed-out collaborator call degrades to an empty
    /// result for that page (no retries); only cancellation aborts the
    /// whole run.
    pub async fn run(
        &self,
        brand: &str,
        model: &str,
        year: i32,
        cancel: &CancellationToken,
    ) -> Result<Vec<ListingRecord>> {
        let query = SearchQuery::new(brand, model, year);
        let listing_query = query.with_year();
        let marketplace_query = query.without_year();

        info!(%listing_query, %marketplace_query, "starting scrape pipeline");

        let pages = join_all(
            (0..self.config.max_pages)
                .map(|page| self.guarded(cancel, self.listings.fetch_page(&listing_query, page))),
        );
        let marketplace = self.guarded(cancel, self.marketplace.fetch_listings(&marketplace_query));

        let (page_results, marketplace_result) = tokio::join!(pages, marketplace);

        let mut records = Vec::new();

        // Source A: segment each description blob, extract per fragment.
        for (page, result) in page_results.into_iter().enumerate() {
            let blobs = match result {
                Ok(blobs) => blobs,
                Err(PipelineError::Cancelled) => return Err(PipelineError::Cancelled),
                Err(e) => {
                    warn!(page, error = %e, "listing page fetch failed, continuing without it");
                    Vec::new()
                }
            };

            for blob in blobs {
                for fragment in segment(&blob, &self.config.segment_delimiter) {
                    records.push(extract(brand, model, &fragment));
                }
            }
        }
        let listing_count = records.len();

        // Source B: typed coercion, one bad record never aborts the batch.
        let raw_listings = match marketplace_result {
            Ok(raw) => raw,
            Err(PipelineError::Cancelled) => return Err(PipelineError::Cancelled),
            Err(e) => {
                warn!(error = %e, "marketplace fetch failed, continuing without it");
                Vec::new()
            }
        };

        for raw in raw_listings {
            match raw.into_record(brand) {
                Ok(record) => records.push(record),
                Err(reason) => debug!(%reason, "skipping marketplace record"),
            }
        }

        info!(
            listing_records = listing_count,
            marketplace_records = records.len() - listing_count,
            "scrape pipeline complete"
        );

        Ok(records)
    }

    /// Wrap a collaborator call with the per-call deadline and the
    /// request's cancellation token.
    async fn guarded<T>(
        &self,
        cancel: &CancellationToken,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::select! {
            // Check cancellation first so an already-cancelled request
            // never starts new collaborator work.
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            outcome = tokio::time::timeout(self.config.call_timeout, call) => match outcome {
                Ok(result) => result,
                Err(_) => Err(PipelineError::Timeout {
                    seconds: self.config.call_timeout.as_secs(),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::renderer::{MockRenderer, RenderRequest};
    use async_trait::async_trait;
    use std::time::Duration;

    const MARKETPLACE_URL: &str = "https://www.mercadolibre.cl/";

    fn listing_page_url(page: usize) -> String {
        format!(
            "https://www.google.com/search?q=honda%20civic%202016%20site%3Achileautos.cl&start={page}"
        )
    }

    /// Mock with every listing page empty unless overridden.
    fn base_renderer() -> MockRenderer {
        let mut renderer = MockRenderer::new().with_payload(MARKETPLACE_URL, "[]");
        for page in 0..5 {
            renderer = renderer.with_payload(&listing_page_url(page), "[]");
        }
        renderer
    }

    fn pipeline_with(renderer: MockRenderer) -> ScrapePipeline {
        ScrapePipeline::new(Arc::new(renderer), PipelineConfig::default())
    }

    #[tokio::test]
    async fn merges_sources_in_a_then_b_order() {
        let renderer = base_renderer()
            .with_payload(
                &listing_page_url(0),
                r#"[{"description":"Honda Civic 2016 · $8.000.000 · 60.000 km"}]"#,
            )
            .with_payload(
                MARKETPLACE_URL,
                r#"[{"model":"Honda Civic EX","price":"8.990.000","year":"2016","km":"95.000 Km"}]"#,
            );
        let pipeline = pipeline_with(renderer);

        let records = pipeline
            .run("honda", "civic", 2016, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        // Source A first: brand/model copied from the query.
        assert_eq!(records[0].model, "civic");
        assert_eq!(records[0].price, Some(8_000_000));
        // Source B second: model taken from the scraped title.
        assert_eq!(records[1].model, "Honda Civic EX");
        assert_eq!(records[1].mileage_km, Some(95_000));
    }

    #[tokio::test]
    async fn parallel_fetch_does_not_stop_at_empty_page() {
        // Page 1 is empty but page 3 still contributes.
        let renderer = base_renderer().with_payload(
            &listing_page_url(3),
            r#"[{"description":"Honda Civic 2016 · $7.500.000"}]"#,
        );
        let pipeline = pipeline_with(renderer);

        let records = pipeline
            .run("honda", "civic", 2016, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].price, Some(7_500_000));
    }

    #[tokio::test]
    async fn bad_marketplace_record_is_skipped_not_fatal() {
        let renderer = base_renderer().with_payload(
            MARKETPLACE_URL,
            r#"[{"model":"Honda Civic","price":"8.990.000","year":"2016","km":"95.000 Km"},
               {"model":"Honda Civic sin precio","year":"2015","km":"120.000 Km"},
               {"model":"Honda Civic LX","price":"6.990.000","year":"2014","km":"140.000 Km"}]"#,
        );
        let pipeline = pipeline_with(renderer);

        let records = pipeline
            .run("honda", "civic", 2016, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.price.is_some()));
    }

    #[tokio::test]
    async fn failed_page_degrades_to_empty_result() {
        // Only page 2 is registered; every other call errors.
        let renderer = MockRenderer::new()
            .with_payload(
                &listing_page_url(2),
                r#"[{"description":"Honda Civic 2016 · $8.200.000"}]"#,
            )
            .with_payload(MARKETPLACE_URL, "[]");
        let pipeline = pipeline_with(renderer);

        let records = pipeline
            .run("honda", "civic", 2016, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].price, Some(8_200_000));
    }

    #[tokio::test]
    async fn cancellation_aborts_the_run() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let pipeline = pipeline_with(base_renderer());
        let err = pipeline
            .run("honda", "civic", 2016, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Cancelled));
    }

    /// Renderer that never answers, for deadline tests.
    struct StalledRenderer;

    #[async_trait]
    impl crate::renderer::PageRenderer for StalledRenderer {
        async fn render(&self, _request: RenderRequest) -> Result<String, RenderError> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn stalled_collaborator_hits_deadline_instead_of_hanging() {
        let config = PipelineConfig::default().with_call_timeout(Duration::from_millis(50));
        let pipeline = ScrapePipeline::new(Arc::new(StalledRenderer), config);

        let records = pipeline
            .run("honda", "civic", 2016, &CancellationToken::new())
            .await
            .unwrap();

        // Every call timed out and degraded to an empty page.
        assert!(records.is_empty());
    }
}
