//! Analysis task polling
//!
//! [`PollMachine`] is the pure state machine: it consumes status snapshots
//! and query failures and says what to do next. [`TaskPoller`] drives one
//! machine per task on a tokio interval, publishes each [`PollView`] through
//! a `watch` channel and performs the single completion navigation.
//!
//! ```text
//! Initializing ──► Polling ──► Completed
//!      │              │
//!      └──────────────┴──► Failed        (any non-terminal) ──► Cancelled
//! ```

use crate::config::FlowConfig;
use crate::error::FlowError;
use crate::navigation::{Navigator, Route};
use crate::ticker::{TaskId, Ticker};
use episteme_api::models::PROGRESS_STEPS;
use episteme_api::{AnalysisApi, AnalysisStatusResponse, ApiError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const INITIAL_STATUS: &str = "Initializing analysis...";
const DEFAULT_STATUS: &str = "Processing...";
const STATUS_FETCH_FAILED: &str = "Failed to fetch status.";
const NO_TICKER: &str = "Analysis finished but no ticker is known.";

/// Lifecycle of one poll sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Initializing,
    Polling,
    Completed,
    Failed,
    Cancelled,
}

impl PollPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// What the loading view shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollView {
    pub phase: PollPhase,
    pub status_text: String,
    /// Completed steps, `0..=10`
    pub progress: u8,
    pub error: Option<String>,
}

impl Default for PollView {
    fn default() -> Self {
        Self {
            phase: PollPhase::Initializing,
            status_text: INITIAL_STATUS.to_string(),
            progress: 0,
            error: None,
        }
    }
}

impl PollView {
    /// Progress as a percentage, `0..=100`
    pub fn percent(&self) -> u8 {
        self.progress.min(PROGRESS_STEPS) * (100 / PROGRESS_STEPS)
    }
}

/// Result of feeding the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    /// Keep polling
    Continue,
    /// Done; navigate to the report exactly once
    Completed(Route),
    /// Stop polling; the view carries the error
    Failed,
    /// The machine is already terminal and nothing changed
    Ignored,
}

/// Clamp a reported progress value into whole steps `0..=10`.
/// Missing or non-finite values count as zero.
pub fn clamp_progress(progress: Option<f64>) -> u8 {
    progress
        .filter(|p| p.is_finite())
        .map_or(0, |p| p.clamp(0.0, f64::from(PROGRESS_STEPS)).floor() as u8)
}

/// Pure poll state machine for one task
#[derive(Debug, Clone)]
pub struct PollMachine {
    view: PollView,
    launch_ticker: Option<Ticker>,
}

impl PollMachine {
    /// `launch_ticker` wins over any ticker echoed by the server
    pub fn new(launch_ticker: Option<Ticker>) -> Self {
        Self {
            view: PollView::default(),
            launch_ticker,
        }
    }

    pub fn view(&self) -> &PollView {
        &self.view
    }

    pub fn phase(&self) -> PollPhase {
        self.view.phase
    }

    /// The sequence cannot start without a task id
    pub fn missing_task_id(&mut self) -> PollStep {
        if self.view.phase.is_terminal() {
            return PollStep::Ignored;
        }
        self.fail(FlowError::MissingTaskId.to_string())
    }

    /// Apply one status snapshot
    pub fn apply(&mut self, snapshot: &AnalysisStatusResponse) -> PollStep {
        if self.view.phase.is_terminal() {
            return PollStep::Ignored;
        }

        if let Some(error) = snapshot.reported_error() {
            self.view.progress = 0;
            self.view.status_text.clear();
            return self.fail(error.to_string());
        }

        self.view.progress = clamp_progress(snapshot.progress);
        self.view.status_text = snapshot
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_STATUS)
            .to_string();
        self.view.error = None;

        if self.view.progress < PROGRESS_STEPS {
            self.view.phase = PollPhase::Polling;
            return PollStep::Continue;
        }

        let route = match &self.launch_ticker {
            Some(ticker) => Some(Route::stock(ticker)),
            None => snapshot.ticker.as_deref().and_then(Route::stock_from_raw),
        };
        match route {
            Some(route) => {
                self.view.phase = PollPhase::Completed;
                PollStep::Completed(route)
            }
            None => self.fail(NO_TICKER.to_string()),
        }
    }

    /// Apply a failed status query
    pub fn apply_error(&mut self, err: &ApiError) -> PollStep {
        if self.view.phase.is_terminal() {
            return PollStep::Ignored;
        }

        let text = err
            .first_body_field(&["detail", "error"])
            .or_else(|| match err {
                ApiError::Transport(message) | ApiError::Decode(message)
                    if !message.trim().is_empty() =>
                {
                    Some(message.clone())
                }
                _ => None,
            })
            .unwrap_or_else(|| STATUS_FETCH_FAILED.to_string());
        self.view.progress = 0;
        self.view.status_text.clear();
        self.fail(format!("Error checking status: {text}"))
    }

    /// Teardown; a terminal machine stays as it is
    pub fn cancel(&mut self) -> PollStep {
        if self.view.phase.is_terminal() {
            return PollStep::Ignored;
        }
        self.view.phase = PollPhase::Cancelled;
        PollStep::Failed
    }

    fn fail(&mut self, error: String) -> PollStep {
        self.view.phase = PollPhase::Failed;
        self.view.error = Some(error);
        PollStep::Failed
    }
}

/// Spawns poll sequences against the service
#[derive(Clone)]
pub struct TaskPoller {
    api: Arc<dyn AnalysisApi>,
    navigator: Arc<dyn Navigator>,
    interval: Duration,
}

impl TaskPoller {
    pub fn new(api: Arc<dyn AnalysisApi>, navigator: Arc<dyn Navigator>, config: &FlowConfig) -> Self {
        Self {
            api,
            navigator,
            interval: config.poll_interval,
        }
    }

    /// Start polling `task_id`. Must be called inside a tokio runtime.
    ///
    /// The sequence runs until it completes, fails, or the returned handle
    /// is cancelled or dropped.
    pub fn spawn(&self, task_id: Option<TaskId>, launch_ticker: Option<Ticker>) -> PollHandle {
        let (tx, rx) = watch::channel(PollView::default());
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run_sequence(
            Arc::clone(&self.api),
            Arc::clone(&self.navigator),
            self.interval,
            task_id,
            PollMachine::new(launch_ticker),
            tx,
            cancel.clone(),
        ));

        PollHandle {
            view: rx,
            cancel,
            task: Some(task),
        }
    }
}

async fn run_sequence(
    api: Arc<dyn AnalysisApi>,
    navigator: Arc<dyn Navigator>,
    interval: Duration,
    task_id: Option<TaskId>,
    mut machine: PollMachine,
    tx: watch::Sender<PollView>,
    cancel: CancellationToken,
) {
    let Some(task_id) = task_id else {
        warn!("Poll requested without a task id");
        machine.missing_task_id();
        tx.send_replace(machine.view().clone());
        return;
    };

    info!("Polling analysis task {task_id} every {interval:?}");
    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = timer.tick() => {}
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = api.analysis_status(task_id.as_str()) => result,
        };
        if cancel.is_cancelled() {
            break;
        }

        let step = match result {
            Ok(snapshot) => {
                debug!(
                    "Task {task_id}: progress={:?} status={:?}",
                    snapshot.progress, snapshot.status
                );
                machine.apply(&snapshot)
            }
            Err(err) => {
                warn!("Status query for task {task_id} failed: {err}");
                machine.apply_error(&err)
            }
        };
        tx.send_replace(machine.view().clone());

        match step {
            PollStep::Continue | PollStep::Ignored => {}
            PollStep::Completed(route) => {
                info!("Analysis task {task_id} completed, opening {}", route.path());
                navigator.navigate(route);
                return;
            }
            PollStep::Failed => {
                info!(
                    "Analysis task {task_id} failed: {}",
                    machine.view().error.as_deref().unwrap_or_default()
                );
                return;
            }
        }
    }

    machine.cancel();
    debug!("Polling of task {task_id} cancelled");
}

/// Owner of a running poll sequence. Dropping it cancels the sequence.
#[derive(Debug)]
pub struct PollHandle {
    view: watch::Receiver<PollView>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Latest view. A cancelled, unfinished sequence reports `Cancelled`.
    pub fn view(&self) -> PollView {
        let mut view = self.view.borrow().clone();
        if self.cancel.is_cancelled() && !view.phase.is_terminal() {
            view.phase = PollPhase::Cancelled;
        }
        view
    }

    /// Receiver notified on every published view
    pub fn subscribe(&self) -> watch::Receiver<PollView> {
        self.view.clone()
    }

    /// Stop polling; no update or navigation is applied afterwards
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the sequence to end and return its final view
    pub async fn wait(mut self) -> PollView {
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!("Poll task ended abnormally: {err}");
            }
        }
        self.view()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
