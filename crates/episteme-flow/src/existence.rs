//! Analysis existence check

use crate::ticker::Ticker;
use chrono::NaiveDateTime;
use episteme_api::AnalysisApi;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{info, warn};

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2})\s(\d{2}:\d{2}:\d{2})(\.\d+)?").expect("valid timestamp regex")
});

/// Outcome of an existence check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistenceCheckResult {
    /// `None` when the check itself failed
    pub exists: Option<bool>,
    /// Server message, or a generic failure message
    pub message: String,
}

impl ExistenceCheckResult {
    /// Message with the embedded timestamp made readable, when an analysis exists
    pub fn display_message(&self) -> String {
        if self.exists == Some(true) {
            humanize_timestamp(&self.message)
        } else {
            self.message.clone()
        }
    }
}

/// Asks the service whether an analysis is already stored for a ticker
#[derive(Clone)]
pub struct ExistenceChecker {
    api: Arc<dyn AnalysisApi>,
}

impl ExistenceChecker {
    pub fn new(api: Arc<dyn AnalysisApi>) -> Self {
        Self { api }
    }

    /// Never fails: service errors become an unknown result with a message
    pub async fn check(&self, ticker: &Ticker) -> ExistenceCheckResult {
        match self.api.check_analysis(ticker.as_str()).await {
            Ok(response) => {
                info!(
                    "check-analysis for {ticker}: existing={:?}",
                    response.existing_analysis
                );
                ExistenceCheckResult {
                    exists: response.existing_analysis,
                    message: response.message.unwrap_or_default(),
                }
            }
            Err(err) => {
                warn!("Failed to check analysis for {ticker}: {err}");
                ExistenceCheckResult {
                    exists: None,
                    message: err.first_body_field(&["message"]).unwrap_or_else(|| {
                        format!("Error checking analysis for {ticker}. Please try again.")
                    }),
                }
            }
        }
    }
}

/// Rewrite the first `YYYY-MM-DD HH:MM:SS[.fff]` in `message` as
/// e.g. `May 1, 2024 at 10:00 AM`. Unparseable dates are left untouched.
pub fn humanize_timestamp(message: &str) -> String {
    let Some(captures) = TIMESTAMP.captures(message) else {
        return message.to_string();
    };
    let (Some(whole), Some(date), Some(time)) = (captures.get(0), captures.get(1), captures.get(2))
    else {
        return message.to_string();
    };

    let raw = format!("{} {}", date.as_str(), time.as_str());
    match NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S") {
        Ok(parsed) => {
            let readable = parsed.format("%B %-d, %Y at %-I:%M %p").to_string();
            message.replacen(whole.as_str(), &readable, 1)
        }
        Err(_) => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use episteme_api::{ApiError, CheckAnalysisResponse, MockAnalysisApi};
    use serde_json::json;

    fn checker(mock: MockAnalysisApi) -> ExistenceChecker {
        ExistenceChecker::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_existing_analysis() {
        let mut mock = MockAnalysisApi::new();
        mock.expect_check_analysis()
            .withf(|ticker| ticker == "TSLA")
            .times(1)
            .returning(|_| {
                Ok(CheckAnalysisResponse {
                    existing_analysis: Some(true),
                    message: Some("Analysis found from 2024-05-01 10:00:00".to_string()),
                })
            });

        let result = checker(mock).check(&Ticker::parse("TSLA").unwrap()).await;
        assert_eq!(result.exists, Some(true));
        assert_eq!(result.message, "Analysis found from 2024-05-01 10:00:00");
        assert_eq!(
            result.display_message(),
            "Analysis found from May 1, 2024 at 10:00 AM"
        );
    }

    #[tokio::test]
    async fn test_missing_analysis_keeps_raw_message() {
        let mut mock = MockAnalysisApi::new();
        mock.expect_check_analysis().returning(|_| {
            Ok(CheckAnalysisResponse {
                existing_analysis: Some(false),
                message: Some("Ticker IBM was not yet analyzed".to_string()),
            })
        });

        let result = checker(mock).check(&Ticker::parse("IBM").unwrap()).await;
        assert_eq!(result.exists, Some(false));
        assert_eq!(result.display_message(), "Ticker IBM was not yet analyzed");
    }

    #[tokio::test]
    async fn test_transport_failure_is_unknown_with_generic_message() {
        let mut mock = MockAnalysisApi::new();
        mock.expect_check_analysis()
            .returning(|_| Err(ApiError::Transport("connection refused".to_string())));

        let result = checker(mock).check(&Ticker::parse("amd").unwrap()).await;
        assert_eq!(result.exists, None);
        assert_eq!(
            result.message,
            "Error checking analysis for AMD. Please try again."
        );
    }

    #[tokio::test]
    async fn test_server_failure_prefers_body_message() {
        let mut mock = MockAnalysisApi::new();
        mock.expect_check_analysis().returning(|_| {
            Err(ApiError::Status {
                status: 503,
                reason: "Service Unavailable".to_string(),
                body: Some(json!({"message": "Database is warming up"})),
            })
        });

        let result = checker(mock).check(&Ticker::parse("AMD").unwrap()).await;
        assert_eq!(result.exists, None);
        assert_eq!(result.message, "Database is warming up");
    }

    #[test]
    fn test_humanize_timestamp_variants() {
        assert_eq!(
            humanize_timestamp("last analyzed on 2024-11-05 18:07:42.123456"),
            "last analyzed on November 5, 2024 at 6:07 PM"
        );
        assert_eq!(humanize_timestamp("no date here"), "no date here");
        assert_eq!(
            humanize_timestamp("bogus 2024-13-45 10:00:00"),
            "bogus 2024-13-45 10:00:00"
        );
    }
}
