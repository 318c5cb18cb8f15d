//! Wire models for the analysis service
//!
//! The service is loose about types (numbers sometimes arrive as strings,
//! field names mix `snake_case` and `camelCase`), so numeric fields go
//! through [`lenient_number`] and the report models accept both spellings.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One entry of `/stock-query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSuggestion {
    pub ticker: String,
    #[serde(default)]
    pub title: String,
}

/// Response of `/check-analysis`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckAnalysisResponse {
    #[serde(default)]
    pub existing_analysis: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `/generate-analysis`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateAnalysisResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl GenerateAnalysisResponse {
    /// The task id, if the server reports the task as started
    pub fn started_task_id(&self) -> Option<&str> {
        if self.status.as_deref() != Some("started") {
            return None;
        }
        self.task_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Response of `/analysis-status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStatusResponse {
    /// Human readable step description
    #[serde(default)]
    pub status: Option<String>,
    /// Completed steps out of [`PROGRESS_STEPS`](crate::models::PROGRESS_STEPS)
    #[serde(default, deserialize_with = "lenient_number")]
    pub progress: Option<f64>,
    /// Set when the task failed server-side
    #[serde(default)]
    pub error: Option<String>,
    /// Ticker the task was started for
    #[serde(default)]
    pub ticker: Option<String>,
}

impl AnalysisStatusResponse {
    /// Server-reported error, ignoring blank strings
    pub fn reported_error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.trim().is_empty())
    }
}

/// Number of progress steps of an analysis task. Shared with the server.
pub const PROGRESS_STEPS: u8 = 10;

/// Response of `/retrieve-analysis`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Absent when the ticker has no stored analysis
    #[serde(default)]
    pub company: Option<Company>,
    #[serde(default)]
    pub points: Vec<ArgumentPoint>,
    /// Set by the server instead of `company` for unknown tickers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Company profile and headline metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "sentiment_score", deserialize_with = "lenient_number")]
    pub sentiment_score: Option<f64>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: Option<f64>,
    #[serde(default)]
    pub exchange_short_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub mkt_cap: Option<f64>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub earnings_call_date: Option<String>,
    #[serde(default)]
    pub analyst_rating: Option<Value>,
    #[serde(default, rename = "forwardPE", deserialize_with = "lenient_number")]
    pub forward_pe: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub dcf: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub beta: Option<f64>,
}

/// A bullish or bearish argument extracted from a post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentPoint {
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "sentiment_score", deserialize_with = "lenient_number")]
    pub sentiment_score: Option<f64>,
    #[serde(default, alias = "post_url")]
    pub post_url: Option<String>,
    #[serde(default, alias = "post_title")]
    pub post_title: Option<String>,
    #[serde(default, alias = "post_source")]
    pub post_source: Option<String>,
    #[serde(default, alias = "post_date")]
    pub post_date: Option<String>,
    #[serde(default, alias = "post_author")]
    pub post_author: Option<String>,
    #[serde(default, alias = "post_image_url")]
    pub post_image_url: Option<String>,
    #[serde(default)]
    pub criticisms: Vec<Criticism>,
}

/// A crowd criticism attached to an argument point
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criticism {
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "validity_score", deserialize_with = "lenient_number")]
    pub validity_score: Option<f64>,
    #[serde(default, alias = "comment_url")]
    pub comment_url: Option<String>,
}

/// Accept a JSON number or a numeric string; anything else becomes `None`
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_started_task_id_requires_started_and_id() {
        let response: GenerateAnalysisResponse =
            serde_json::from_value(json!({"status": "started", "task_id": "abc"})).unwrap();
        assert_eq!(response.started_task_id(), Some("abc"));

        let response: GenerateAnalysisResponse =
            serde_json::from_value(json!({"status": "started"})).unwrap();
        assert_eq!(response.started_task_id(), None);

        let response: GenerateAnalysisResponse =
            serde_json::from_value(json!({"status": "started", "task_id": "  "})).unwrap();
        assert_eq!(response.started_task_id(), None);

        let response: GenerateAnalysisResponse =
            serde_json::from_value(json!({"status": "queued", "task_id": "abc"})).unwrap();
        assert_eq!(response.started_task_id(), None);
    }

    #[test]
    fn test_status_progress_is_lenient() {
        let status: AnalysisStatusResponse =
            serde_json::from_value(json!({"progress": "7"})).unwrap();
        assert_eq!(status.progress, Some(7.0));

        let status: AnalysisStatusResponse =
            serde_json::from_value(json!({"progress": null})).unwrap();
        assert_eq!(status.progress, None);

        let status: AnalysisStatusResponse =
            serde_json::from_value(json!({"progress": "soon", "status": "Scraping"})).unwrap();
        assert_eq!(status.progress, None);
        assert_eq!(status.status.as_deref(), Some("Scraping"));
    }

    #[test]
    fn test_reported_error_ignores_blank() {
        let status: AnalysisStatusResponse =
            serde_json::from_value(json!({"error": ""})).unwrap();
        assert_eq!(status.reported_error(), None);

        let status: AnalysisStatusResponse =
            serde_json::from_value(json!({"error": "LLM quota exceeded"})).unwrap();
        assert_eq!(status.reported_error(), Some("LLM quota exceeded"));
    }

    #[test]
    fn test_report_accepts_mixed_field_names() {
        let report: AnalysisReport = serde_json::from_value(json!({
            "company": {
                "ticker": "AAPL",
                "title": "Apple Inc.",
                "sentiment_score": 72,
                "mktCap": "3400000000000",
                "forwardPE": 28.1,
                "analystRating": "Buy"
            },
            "points": [{
                "content": "Services margin keeps expanding",
                "sentiment_score": 81,
                "post_url": "https://example.com/p/1",
                "criticism_exists": true,
                "criticisms": [{"content": "Regulatory risk", "validity_score": 6, "comment_url": null}]
            }]
        }))
        .unwrap();

        let company = report.company.unwrap();
        assert_eq!(company.sentiment_score, Some(72.0));
        assert_eq!(company.mkt_cap, Some(3_400_000_000_000.0));
        assert_eq!(company.forward_pe, Some(28.1));

        let point = &report.points[0];
        assert_eq!(point.post_url.as_deref(), Some("https://example.com/p/1"));
        assert_eq!(point.criticisms[0].validity_score, Some(6.0));
    }

    #[test]
    fn test_report_without_company() {
        let report: AnalysisReport =
            serde_json::from_value(json!({"error": "Ticker not found"})).unwrap();
        assert!(report.company.is_none());
        assert!(report.points.is_empty());
        assert_eq!(report.error.as_deref(), Some("Ticker not found"));
    }
}
