//! Starting server-side analysis tasks

use crate::ticker::{TaskId, Ticker};
use episteme_api::AnalysisApi;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

const NOT_STARTED: &str = "Failed to start analysis task. Please try again.";
const LAUNCH_FAILED: &str = "An error occurred while starting the analysis.";

/// A task the server accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTask {
    pub task_id: TaskId,
    pub ticker: Ticker,
}

/// Why a task could not be started, as text for the prompt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LaunchError {
    pub message: String,
}

impl LaunchError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Issues the generate request. It neither polls nor navigates.
#[derive(Clone)]
pub struct AnalysisGenerator {
    api: Arc<dyn AnalysisApi>,
}

impl AnalysisGenerator {
    pub fn new(api: Arc<dyn AnalysisApi>) -> Self {
        Self { api }
    }

    pub async fn generate(&self, ticker: &Ticker) -> Result<GenerationTask, LaunchError> {
        let response = match self.api.generate_analysis(ticker.as_str()).await {
            Ok(response) => response,
            Err(err) => {
                warn!("generate-analysis for {ticker} failed: {err}");
                return Err(LaunchError::new(
                    err.first_body_field(&["detail", "message"])
                        .unwrap_or_else(|| LAUNCH_FAILED.to_string()),
                ));
            }
        };

        match response.started_task_id().map(TaskId::parse) {
            Some(Ok(task_id)) => {
                info!("Analysis task {task_id} started for {ticker}");
                Ok(GenerationTask {
                    task_id,
                    ticker: ticker.clone(),
                })
            }
            _ => {
                warn!(
                    "generate-analysis for {ticker} did not start a task: status={:?}",
                    response.status
                );
                Err(LaunchError::new(
                    response
                        .message
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| NOT_STARTED.to_string()),
                ))
            }
        }
    }
}
