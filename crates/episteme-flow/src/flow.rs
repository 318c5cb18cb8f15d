//! Prompt resolution
//!
//! [`AcquisitionFlow`] owns the open prompt and turns a [`PromptChoice`]
//! into at most one side effect: a navigation, a launch, or nothing.

use crate::existence::ExistenceChecker;
use crate::generator::AnalysisGenerator;
use crate::navigation::{Navigator, Route};
use crate::prompt::{PromptChoice, PromptState};
use crate::ticker::Ticker;
use episteme_api::AnalysisApi;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// What resolving a choice did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Navigated to the report or the loading view; the prompt is closed
    Navigated(Route),
    /// The launch failed; the prompt stays open showing this message
    LaunchFailed(String),
    /// The prompt was closed without side effects
    Dismissed,
    /// A launch is in flight; the choice was ignored
    Busy,
    /// The choice is not offered by the current prompt
    Rejected,
    /// No prompt is open
    NoPrompt,
}

/// Existence check → prompt → launch → navigation
pub struct AcquisitionFlow {
    checker: ExistenceChecker,
    generator: AnalysisGenerator,
    navigator: Arc<dyn Navigator>,
    prompt: Mutex<Option<PromptState>>,
}

impl AcquisitionFlow {
    pub fn new(api: Arc<dyn AnalysisApi>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            checker: ExistenceChecker::new(Arc::clone(&api)),
            generator: AnalysisGenerator::new(api),
            navigator,
            prompt: Mutex::new(None),
        }
    }

    /// Run the existence check for `ticker` and open the prompt
    pub async fn open(&self, ticker: &Ticker) -> PromptState {
        let result = self.checker.check(ticker).await;
        let prompt = PromptState::from_check(ticker, &result);
        debug!("Prompt for {ticker}: {:?}", prompt.mode);
        *self.slot() = Some(prompt.clone());
        prompt
    }

    /// The open prompt, if any
    pub fn prompt(&self) -> Option<PromptState> {
        self.slot().clone()
    }

    pub async fn resolve(&self, choice: PromptChoice) -> FlowOutcome {
        let ticker = {
            let mut slot = self.slot();
            let Some(prompt) = slot.as_mut() else {
                return FlowOutcome::NoPrompt;
            };
            if prompt.is_generating {
                debug!("Ignoring {choice:?} while a launch is in flight");
                return FlowOutcome::Busy;
            }
            if !prompt.allows(choice) {
                return FlowOutcome::Rejected;
            }

            let ticker = prompt.ticker.clone();
            match choice {
                PromptChoice::GenerateNew if ticker.is_none() => return FlowOutcome::Rejected,
                PromptChoice::GenerateNew => prompt.is_generating = true,
                PromptChoice::Reuse | PromptChoice::Dismiss => *slot = None,
            }
            ticker
        };

        match (choice, ticker) {
            (PromptChoice::Dismiss, _) => FlowOutcome::Dismissed,
            (PromptChoice::Reuse, Some(ticker)) => {
                info!("Reusing stored analysis for {ticker}");
                self.navigate(Route::stock(&ticker))
            }
            (PromptChoice::GenerateNew, Some(ticker)) => self.launch(&ticker).await,
            (_, None) => FlowOutcome::Rejected,
        }
    }

    async fn launch(&self, ticker: &Ticker) -> FlowOutcome {
        let result = self.generator.generate(ticker).await;

        let mut slot = self.slot();
        match result {
            Ok(task) => {
                *slot = None;
                drop(slot);
                self.navigate(Route::loading(task.task_id, task.ticker))
            }
            Err(err) => {
                if let Some(prompt) = slot.as_mut() {
                    prompt.message.clone_from(&err.message);
                    prompt.is_generating = false;
                }
                FlowOutcome::LaunchFailed(err.message)
            }
        }
    }

    fn navigate(&self, route: Route) -> FlowOutcome {
        self.navigator.navigate(route.clone());
        FlowOutcome::Navigated(route)
    }

    fn slot(&self) -> MutexGuard<'_, Option<PromptState>> {
        self.prompt.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
