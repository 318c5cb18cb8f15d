//! Report view and favorites overview

use crate::config::FlowConfig;
use crate::error::Result;
use crate::favorites::Favorite;
use crate::ticker::Ticker;
use episteme_api::{AnalysisApi, AnalysisReport, ApiError, ArgumentPoint, Company};
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

const UNKNOWN_COMPANY: &str = "Unknown Company";
const NO_RESPONSE: &str = "Network Error: No response received from server.";

/// Points scoring at least this much are bullish
const BULLISH_POINT_THRESHOLD: f64 = 50.0;

/// Coarse reading of a sentiment score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentBand {
    Bullish,
    Neutral,
    Bearish,
    Unknown,
}

impl SentimentBand {
    pub fn from_score(score: Option<f64>) -> Self {
        match score {
            Some(s) if s > 60.0 => Self::Bullish,
            Some(s) if s >= 40.0 => Self::Neutral,
            Some(_) => Self::Bearish,
            None => Self::Unknown,
        }
    }
}

impl fmt::Display for SentimentBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Bullish => "Bullish",
            Self::Neutral => "Neutral",
            Self::Bearish => "Bearish",
            Self::Unknown => "N/A",
        };
        f.write_str(label)
    }
}

/// A loaded report with its scored points split by sentiment
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub company: Company,
    pub bullish: Vec<ArgumentPoint>,
    pub bearish: Vec<ArgumentPoint>,
}

impl Report {
    /// `None` when the payload has no company
    pub fn from_analysis(analysis: AnalysisReport) -> Option<Self> {
        let company = analysis.company?;
        let (bullish, bearish) = analysis
            .points
            .into_iter()
            .filter(|point| point.sentiment_score.is_some())
            .partition(|point| {
                point
                    .sentiment_score
                    .is_some_and(|score| score >= BULLISH_POINT_THRESHOLD)
            });
        Some(Self {
            company,
            bullish,
            bearish,
        })
    }

    pub fn sentiment(&self) -> SentimentBand {
        SentimentBand::from_score(self.company.sentiment_score)
    }
}

/// What the report screen shows
#[derive(Debug, Clone, PartialEq)]
pub enum ReportView {
    Loaded(Box<Report>),
    /// The service answered but has no analysis for the ticker
    NotFound { ticker: Ticker },
    Failed(String),
}

/// One row of the favorites overview
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteSummary {
    pub ticker: String,
    pub title: String,
    pub sentiment_score: Option<f64>,
    pub logo: Option<String>,
}

impl FavoriteSummary {
    pub fn sentiment(&self) -> SentimentBand {
        SentimentBand::from_score(self.sentiment_score)
    }
}

/// Fetches stored reports
#[derive(Clone)]
pub struct ReportLoader {
    api: Arc<dyn AnalysisApi>,
    timezone: String,
}

impl ReportLoader {
    pub fn new(api: Arc<dyn AnalysisApi>, config: &FlowConfig) -> Self {
        Self {
            api,
            timezone: config.timezone.clone(),
        }
    }

    /// Raw report payload
    pub async fn fetch(&self, ticker: &str, only_database: bool) -> Result<AnalysisReport> {
        Ok(self
            .api
            .retrieve_analysis(ticker, &self.timezone, only_database)
            .await?)
    }

    pub async fn load(&self, ticker: &Ticker) -> ReportView {
        match self
            .api
            .retrieve_analysis(ticker.as_str(), &self.timezone, false)
            .await
        {
            Ok(analysis) => match Report::from_analysis(analysis) {
                Some(report) => {
                    info!(
                        "Loaded report for {ticker}: {} bullish, {} bearish points",
                        report.bullish.len(),
                        report.bearish.len()
                    );
                    ReportView::Loaded(Box::new(report))
                }
                None => ReportView::NotFound {
                    ticker: ticker.clone(),
                },
            },
            Err(err) => {
                warn!("Failed to load report for {ticker}: {err}");
                ReportView::Failed(failure_message(&err))
            }
        }
    }

    /// Summaries of the stored analyses of `favorites`, fetched concurrently.
    /// Favorites whose fetch fails or has no company are left out.
    pub async fn favorites_overview(&self, favorites: &[Favorite]) -> Vec<FavoriteSummary> {
        let fetches = favorites.iter().map(|favorite| async move {
            match self.fetch(&favorite.ticker, true).await {
                Ok(analysis) => analysis.company.map(|company| summarize(favorite, company)),
                Err(err) => {
                    warn!("Skipping favorite {}: {err}", favorite.ticker);
                    None
                }
            }
        });

        join_all(fetches).await.into_iter().flatten().collect()
    }
}

fn summarize(favorite: &Favorite, company: Company) -> FavoriteSummary {
    FavoriteSummary {
        ticker: company
            .ticker
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| favorite.ticker.clone()),
        title: company
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_COMPANY.to_string()),
        sentiment_score: company.sentiment_score,
        logo: company.logo.or_else(|| favorite.logo.clone()),
    }
}

fn failure_message(err: &ApiError) -> String {
    match err {
        ApiError::Status { status, reason, .. } => {
            let text = err
                .first_body_field(&["message", "detail"])
                .or_else(|| Some(reason.clone()).filter(|r| !r.is_empty()))
                .unwrap_or_else(|| "Error".to_string());
            format!("API Error: {status} - {text}")
        }
        ApiError::Transport(_) => NO_RESPONSE.to_string(),
        other => format!("Error: {other}"),
    }
}
