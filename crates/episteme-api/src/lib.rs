//! HTTP client for the episteme analysis service
//!
//! The service exposes five GET endpoints:
//!
//! - `/stock-query` - ticker suggestions for a search string
//! - `/check-analysis` - whether an analysis already exists for a ticker
//! - `/generate-analysis` - start a new analysis task
//! - `/analysis-status` - progress of a running task
//! - `/retrieve-analysis` - the finished report
//!
//! Everything above the transport talks to the [`AnalysisApi`] trait so that
//! workflow code can be exercised against mocks.
//!
//! # Example
//!
//! ```rust,no_run
//! use episteme_api::{AnalysisApi, ApiConfig, HttpApiClient};
//!
//! # async fn run() -> episteme_api::Result<()> {
//! let config = ApiConfig::builder()
//!     .base_url("https://api.example.com")
//!     .api_key("secret")
//!     .build()?;
//! let client = HttpApiClient::new(&config)?;
//!
//! for suggestion in client.stock_query("AAP").await? {
//!     println!("{} - {}", suggestion.ticker, suggestion.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod retry;

pub use client::{AnalysisApi, HttpApiClient, endpoints};
#[cfg(any(test, feature = "mock"))]
pub use client::MockAnalysisApi;
pub use config::{ApiConfig, ApiConfigBuilder};
pub use error::{ApiError, Result};
pub use models::{
    AnalysisReport, AnalysisStatusResponse, ArgumentPoint, CheckAnalysisResponse, Company,
    Criticism, GenerateAnalysisResponse, StockSuggestion,
};
pub use retry::RetryPolicy;
