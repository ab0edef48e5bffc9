//! HTTP gateway against the catalog REST API
//!
//! Endpoint layout mirrors the backend:
//! - `GET  {prefix}/enterprise-hierarchy`
//! - `GET  {prefix}/enterprise-hierarchy/{id}/software-effort`
//! - `PUT  {prefix}/enterprise-hierarchy/{id}/software-effort`
//! - `DELETE {prefix}/enterprise-hierarchy/delete-software-effort/{uuid}`
//! - `GET  {prefix}/current-user`
//!
//! Every response is decoded through the `{success, data}` envelope; CSRF
//! and endpoint prefixing live here, never in the store.

use crate::error::{GatewayError, GatewayResult};
use crate::user::CurrentUser;
use crate::CatalogGateway;
use async_trait::async_trait;
use catalog_model::{EffortUuid, Envelope, ProgramId, ProgramNode, SoftwareEffort};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// HTTP gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Scheme + host, no trailing slash required
    pub base_url: String,
    /// Path prefix between host and endpoint
    pub prefix: String,
    /// Django CSRF token, sent as `X-CSRFToken` on every request
    pub csrf_token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl GatewayConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With a CSRF token
    #[inline]
    #[must_use]
    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    /// With a request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            prefix: "ui/program-catalog".to_string(),
            csrf_token: None,
            timeout_secs: 30,
        }
    }
}

/// The hierarchy endpoint answers a single root or a forest of roots
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HierarchyData {
    Many(Vec<ProgramNode>),
    One(Box<ProgramNode>),
}

impl From<HierarchyData> for Vec<ProgramNode> {
    fn from(data: HierarchyData) -> Self {
        match data {
            HierarchyData::Many(roots) => roots,
            HierarchyData::One(root) => vec![*root],
        }
    }
}

/// reqwest-backed [`CatalogGateway`]
#[derive(Debug)]
pub struct HttpGateway {
    config: GatewayConfig,
    client: Client,
}

impl HttpGateway {
    /// Build the gateway and its underlying client
    ///
    /// # Errors
    /// Returns [`GatewayError::Config`] for an unusable CSRF token value or
    /// an unbuildable client.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = config.csrf_token {
            let value = header::HeaderValue::from_str(token)
                .map_err(|e| GatewayError::Config(format!("invalid CSRF token: {e}")))?;
            headers.insert("X-CSRFToken", value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Gateway configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.prefix.trim_matches('/'),
            path
        )
    }

    async fn get_enveloped<T: DeserializeOwned>(&self, url: &str) -> GatewayResult<T> {
        tracing::debug!(%url, "gateway GET");
        let response = self.client.get(url).send().await?;
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.into_result()?)
    }
}

#[async_trait]
impl CatalogGateway for HttpGateway {
    async fn fetch_hierarchy(&self) -> GatewayResult<Vec<ProgramNode>> {
        let url = self.url("enterprise-hierarchy");
        let data: HierarchyData = self.get_enveloped(&url).await?;
        Ok(data.into())
    }

    async fn fetch_efforts(&self, program: &ProgramId) -> GatewayResult<Vec<SoftwareEffort>> {
        let url = self.url(&format!("enterprise-hierarchy/{program}/software-effort"));
        self.get_enveloped(&url).await
    }

    async fn save_effort(
        &self,
        program: &ProgramId,
        effort: &SoftwareEffort,
    ) -> GatewayResult<SoftwareEffort> {
        let url = self.url(&format!("enterprise-hierarchy/{program}/software-effort"));
        tracing::debug!(%url, effort = %effort.uuid, "gateway PUT");
        let response = self.client.put(&url).json(effort).send().await?;
        let envelope: Envelope<SoftwareEffort> = response.json().await?;
        Ok(envelope.into_result()?)
    }

    async fn delete_effort(&self, uuid: &EffortUuid) -> GatewayResult<()> {
        let url = self.url(&format!(
            "enterprise-hierarchy/delete-software-effort/{uuid}"
        ));
        tracing::debug!(%url, "gateway DELETE");
        let response = self.client.delete(&url).send().await?;
        let envelope: Envelope<serde_json::Value> = response.json().await?;
        Ok(envelope.into_unit_result()?)
    }

    async fn current_user(&self) -> GatewayResult<CurrentUser> {
        let url = self.url("current-user");
        self.get_enveloped(&url).await
    }
}
