//! Page-rendering/automation collaborator.
//!
//! Listing pages are JavaScript-heavy, so fetching and CSS-based
//! extraction are delegated to an external rendering service. The
//! pipeline hands it a URL (optionally with an in-page script to run
//! first) and a declarative extraction schema, and gets back the
//! extracted items as JSON text. The payload is treated as opaque
//! here; each source adapter decodes its own shape.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::RenderError;

/// One field of a declarative CSS extraction schema.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaField {
    pub name: String,
    pub selector: String,
}

/// Declarative extraction schema sent to the rendering service.
///
/// `base_selector` matches one element per result item; each field
/// selector is evaluated relative to it and its text content becomes
/// the field value.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionSchema {
    pub name: String,
    pub base_selector: String,
    pub fields: Vec<SchemaField>,
}

impl ExtractionSchema {
    pub fn new(name: impl Into<String>, base_selector: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_selector: base_selector.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, selector: impl Into<String>) -> Self {
        self.fields.push(SchemaField {
            name: name.into(),
            selector: selector.into(),
        });
        self
    }
}

/// A rendering request: navigate, optionally run scripts, extract.
#[derive(Debug, Clone, Serialize)]
pub struct RenderRequest {
    pub url: String,

    /// In-page JavaScript snippets run in order before extraction
    /// (used to type a query into a search box and submit it).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub js_code: Vec<String>,

    pub schema: ExtractionSchema,
}

impl RenderRequest {
    pub fn new(url: impl Into<String>, schema: ExtractionSchema) -> Self {
        Self {
            url: url.into(),
            js_code: Vec::new(),
            schema,
        }
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.js_code.push(script.into());
        self
    }
}

/// Abstraction over the rendering service.
///
/// Implementations render the page headlessly, apply the CSS schema
/// and return the extracted items as a JSON array string.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, request: RenderRequest) -> Result<String, RenderError>;
}

/// Client for an HTTP rendering sidecar service.
///
/// POSTs the render request as JSON to the sidecar's `/render`
/// endpoint and returns its extracted-content body.
pub struct HttpRenderer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRenderer {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RenderError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, request: RenderRequest) -> Result<String, RenderError> {
        let endpoint = format!("{}/render", self.base_url.trim_end_matches('/'));

        let response = self.client.post(&endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status {
                status: status.as_u16(),
                url: request.url,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(RenderError::EmptyContent { url: request.url });
        }

        Ok(body)
    }
}

/// Mock renderer for tests: canned payloads keyed by URL.
#[derive(Default)]
pub struct MockRenderer {
    payloads: std::sync::RwLock<std::collections::HashMap<String, String>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the payload returned for a URL.
    pub fn with_payload(self, url: &str, payload: &str) -> Self {
        self.payloads
            .write()
            .unwrap()
            .insert(url.to_string(), payload.to_string());
        self
    }
}

#[async_trait]
impl PageRenderer for MockRenderer {
    async fn render(&self, request: RenderRequest) -> Result<String, RenderError> {
        self.payloads
            .read()
            .unwrap()
            .get(&request.url)
            .cloned()
            .ok_or(RenderError::EmptyContent { url: request.url })
    }
}
