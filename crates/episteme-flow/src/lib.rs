//! Analysis acquisition workflow
//!
//! This crate holds the client-side state machines that take a user from a
//! search box to a finished sentiment report:
//!
//! - [`SearchResolver`]: debounced ticker suggestions with stale-result guarding
//! - [`ExistenceChecker`]: asks whether an analysis is already stored
//! - [`PromptState`] / [`PromptChoice`]: the reuse / generate / dismiss decision
//! - [`AnalysisGenerator`]: starts a server-side analysis task
//! - [`TaskPoller`]: polls the task until it completes or fails
//! - [`AcquisitionFlow`]: wires the prompt to the generator and navigation
//! - [`ReportLoader`] and [`FavoritesRepository`]: the report view and the
//!   locally persisted favorites list
//!
//! Views are plain data published through `tokio::sync::watch` channels and
//! navigation is delegated to a [`Navigator`], so every component can run
//! headless under test.
//!
//! # Example
//!
//! ```rust,no_run
//! use episteme_api::{ApiConfig, HttpApiClient};
//! use episteme_flow::{AcquisitionFlow, PromptChoice, RecordingNavigator, Ticker};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let api = Arc::new(HttpApiClient::new(&ApiConfig::from_env()?)?);
//! let navigator = Arc::new(RecordingNavigator::default());
//! let flow = AcquisitionFlow::new(api, navigator.clone());
//!
//! let prompt = flow.open(&Ticker::parse("TSLA")?).await;
//! println!("{}", prompt.message);
//! flow.resolve(PromptChoice::GenerateNew).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod existence;
pub mod favorites;
pub mod flow;
pub mod generator;
pub mod navigation;
pub mod poller;
pub mod prompt;
pub mod report;
pub mod search;
pub mod ticker;

#[cfg(test)]
mod testing;

pub use config::{FlowConfig, FlowConfigBuilder};
pub use error::{FlowError, Result};
pub use existence::{ExistenceCheckResult, ExistenceChecker, humanize_timestamp};
pub use favorites::{
    FAVORITES_KEY, Favorite, FavoritesRepository, FileStore, KeyValueStore, MemoryStore,
};
pub use flow::{AcquisitionFlow, FlowOutcome};
pub use generator::{AnalysisGenerator, GenerationTask, LaunchError};
pub use navigation::{ChannelNavigator, Navigator, RecordingNavigator, Route};
pub use poller::{PollHandle, PollMachine, PollPhase, PollStep, PollView, TaskPoller, clamp_progress};
pub use prompt::{PromptChoice, PromptMode, PromptState};
pub use report::{FavoriteSummary, Report, ReportLoader, ReportView, SentimentBand};
pub use search::{SearchResolver, SearchView};
pub use ticker::{TaskId, Ticker};
