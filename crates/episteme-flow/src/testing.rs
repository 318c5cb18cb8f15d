//! Scripted service fake for timing-sensitive tests

use async_trait::async_trait;
use episteme_api::{
    AnalysisApi, AnalysisReport, AnalysisStatusResponse, ApiError, CheckAnalysisResponse,
    GenerateAnalysisResponse, StockSuggestion,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

type Scripted<T> = Mutex<VecDeque<episteme_api::Result<T>>>;
type Hook = Box<dyn Fn() + Send + Sync>;

/// Replays queued responses; the last status response repeats once the
/// queue is down to one entry. Optional latency simulates slow requests.
#[derive(Default)]
pub struct ScriptedApi {
    statuses: Scripted<AnalysisStatusResponse>,
    suggestions: Mutex<Vec<(String, Duration, Vec<StockSuggestion>)>>,
    check: Mutex<Option<CheckAnalysisResponse>>,
    launch: Mutex<Option<(Duration, GenerateAnalysisResponse)>>,
    launch_calls: AtomicUsize,
    on_answer: Mutex<Option<Hook>>,
    pub status_calls: Mutex<Vec<(String, Instant)>>,
    pub query_calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedApi {
    pub fn with_statuses(statuses: Vec<episteme_api::Result<AnalysisStatusResponse>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Default::default()
        }
    }

    /// Answer `query` after `latency` with `results`
    pub fn suggest(self, query: &str, latency: Duration, results: &[(&str, &str)]) -> Self {
        let results = results
            .iter()
            .map(|(ticker, title)| StockSuggestion {
                ticker: (*ticker).to_string(),
                title: (*title).to_string(),
            })
            .collect();
        self.suggestions
            .lock()
            .unwrap()
            .push((query.to_string(), latency, results));
        self
    }

    /// Answer every existence check with `exists` and `message`
    pub fn existing(self, exists: bool, message: &str) -> Self {
        *self.check.lock().unwrap() = Some(CheckAnalysisResponse {
            existing_analysis: Some(exists),
            message: Some(message.to_string()),
        });
        self
    }

    /// Answer every generate request after `latency`
    pub fn launch(self, latency: Duration, status: &str, task_id: Option<&str>) -> Self {
        *self.launch.lock().unwrap() = Some((
            latency,
            GenerateAnalysisResponse {
                status: Some(status.to_string()),
                task_id: task_id.map(str::to_string),
                message: None,
            },
        ));
        self
    }

    /// Run `hook` as a status or ticker query is answered, after its
    /// latency and before the caller sees the response
    pub fn on_answer(self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        *self.on_answer.lock().unwrap() = Some(Box::new(hook));
        self
    }

    fn answered(&self) {
        if let Some(hook) = self.on_answer.lock().unwrap().as_ref() {
            hook();
        }
    }

    pub fn launch_count(&self) -> usize {
        self.launch_calls.load(Ordering::SeqCst)
    }

    pub fn status_call_count(&self) -> usize {
        self.status_calls.lock().unwrap().len()
    }

    pub fn queries(&self) -> Vec<String> {
        self.query_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(q, _)| q.clone())
            .collect()
    }
}

pub fn progress(value: f64, status: &str) -> episteme_api::Result<AnalysisStatusResponse> {
    Ok(AnalysisStatusResponse {
        status: Some(status.to_string()),
        progress: Some(value),
        ..Default::default()
    })
}

#[async_trait]
impl AnalysisApi for ScriptedApi {
    async fn stock_query(&self, query: &str) -> episteme_api::Result<Vec<StockSuggestion>> {
        self.query_calls
            .lock()
            .unwrap()
            .push((query.to_string(), Instant::now()));
        let scripted = self
            .suggestions
            .lock()
            .unwrap()
            .iter()
            .find(|(q, _, _)| q == query)
            .map(|(_, latency, results)| (*latency, results.clone()));
        match scripted {
            Some((latency, results)) => {
                tokio::time::sleep(latency).await;
                self.answered();
                Ok(results)
            }
            None => {
                self.answered();
                Ok(Vec::new())
            }
        }
    }

    async fn check_analysis(&self, _ticker: &str) -> episteme_api::Result<CheckAnalysisResponse> {
        self.check
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ApiError::Transport("not scripted".to_string()))
    }

    async fn generate_analysis(
        &self,
        _ticker: &str,
    ) -> episteme_api::Result<GenerateAnalysisResponse> {
        self.launch_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.launch.lock().unwrap().clone();
        match scripted {
            Some((latency, response)) => {
                tokio::time::sleep(latency).await;
                Ok(response)
            }
            None => Err(ApiError::Transport("not scripted".to_string())),
        }
    }

    async fn analysis_status(&self, task_id: &str) -> episteme_api::Result<AnalysisStatusResponse> {
        self.status_calls
            .lock()
            .unwrap()
            .push((task_id.to_string(), Instant::now()));
        self.answered();
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            return statuses
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Transport("not scripted".to_string())));
        }
        match statuses.front() {
            Some(Ok(status)) => Ok(status.clone()),
            Some(Err(_)) => statuses
                .pop_front()
                .unwrap_or_else(|| Err(ApiError::Transport("not scripted".to_string()))),
            None => Err(ApiError::Transport("not scripted".to_string())),
        }
    }

    async fn retrieve_analysis(
        &self,
        _ticker: &str,
        _timezone: &str,
        _only_database: bool,
    ) -> episteme_api::Result<AnalysisReport> {
        Err(ApiError::Transport("not scripted".to_string()))
    }
}
