//! Service client
//!
//! [`AnalysisApi`] is the seam the workflow code depends on;
//! [`HttpApiClient`] is the reqwest implementation.

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::models::{
    AnalysisReport, AnalysisStatusResponse, CheckAnalysisResponse, GenerateAnalysisResponse,
    StockSuggestion,
};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use episteme_utils::ConfigError;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Endpoint paths, relative to the base URL
pub mod endpoints {
    pub const STOCK_QUERY: &str = "stock-query";
    pub const CHECK_ANALYSIS: &str = "check-analysis";
    pub const GENERATE_ANALYSIS: &str = "generate-analysis";
    pub const ANALYSIS_STATUS: &str = "analysis-status";
    pub const RETRIEVE_ANALYSIS: &str = "retrieve-analysis";
}

/// Operations offered by the analysis service
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    /// Ticker suggestions for a free-text query
    async fn stock_query(&self, query: &str) -> Result<Vec<StockSuggestion>>;

    /// Whether an analysis is already stored for `ticker`
    async fn check_analysis(&self, ticker: &str) -> Result<CheckAnalysisResponse>;

    /// Ask the server to start a new analysis task
    async fn generate_analysis(&self, ticker: &str) -> Result<GenerateAnalysisResponse>;

    /// Current state of a running task
    async fn analysis_status(&self, task_id: &str) -> Result<AnalysisStatusResponse>;

    /// The stored report. `only_database` skips any live refresh server-side.
    async fn retrieve_analysis(
        &self,
        ticker: &str,
        timezone: &str,
        only_database: bool,
    ) -> Result<AnalysisReport>;
}

/// reqwest-backed implementation of [`AnalysisApi`]
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    http: reqwest::Client,
    base_url: Option<Url>,
    retry_policy: RetryPolicy,
}

impl HttpApiClient {
    /// Create a client with the static headers from `config`.
    ///
    /// A missing base URL or API key only logs a warning; calls made without
    /// a base URL fail with [`ApiError::Transport`].
    pub fn new(config: &ApiConfig) -> Result<Self> {
        config.warn_if_incomplete();

        let base_url = config
            .base_url
            .as_deref()
            .map(parse_base_url)
            .transpose()?;

        let http = reqwest::Client::builder()
            .default_headers(build_headers(config.api_key.as_deref())?)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            retry_policy: config.retry.clone(),
        })
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self
            .base_url
            .as_ref()
            .ok_or_else(|| ApiError::Transport("API base URL is not configured".to_string()))?;
        base.join(path)
            .map_err(|e| ApiError::Transport(format!("invalid endpoint '{path}': {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.endpoint(path)?;
        self.retry_policy
            .execute(path, || self.send_once(url.clone(), query))
            .await
    }

    async fn send_once<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> Result<T> {
        debug!("GET {url} {query:?}");

        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Error").to_string(),
                body: serde_json::from_str(&text).ok(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl AnalysisApi for HttpApiClient {
    #[instrument(skip(self))]
    async fn stock_query(&self, query: &str) -> Result<Vec<StockSuggestion>> {
        let results: Option<Vec<StockSuggestion>> =
            self.get(endpoints::STOCK_QUERY, &[("q", query)]).await?;
        Ok(results.unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn check_analysis(&self, ticker: &str) -> Result<CheckAnalysisResponse> {
        self.get(endpoints::CHECK_ANALYSIS, &[("ticker", ticker)])
            .await
    }

    #[instrument(skip(self))]
    async fn generate_analysis(&self, ticker: &str) -> Result<GenerateAnalysisResponse> {
        self.get(endpoints::GENERATE_ANALYSIS, &[("ticker", ticker)])
            .await
    }

    #[instrument(skip(self))]
    async fn analysis_status(&self, task_id: &str) -> Result<AnalysisStatusResponse> {
        self.get(endpoints::ANALYSIS_STATUS, &[("task_id", task_id)])
            .await
    }

    #[instrument(skip(self))]
    async fn retrieve_analysis(
        &self,
        ticker: &str,
        timezone: &str,
        only_database: bool,
    ) -> Result<AnalysisReport> {
        let mut query = vec![("ticker", ticker), ("timezone", timezone)];
        if only_database {
            query.push(("only_database", "true"));
        }
        self.get(endpoints::RETRIEVE_ANALYSIS, &query).await
    }
}

/// Parse the base URL so that relative endpoint paths join beneath it
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|e| ConfigError::Invalid {
        key: crate::config::BASE_URL_ENV.to_string(),
        reason: e.to_string(),
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn build_headers(api_key: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    if let Some(key) = api_key {
        let mut value = HeaderValue::from_str(key).map_err(|e| ConfigError::Invalid {
            key: crate::config::API_KEY_ENV.to_string(),
            reason: e.to_string(),
        })?;
        value.set_sensitive(true);
        headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
    }

    Ok(headers)
}
