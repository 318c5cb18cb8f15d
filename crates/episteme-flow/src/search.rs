//! Debounced ticker search
//!
//! Every keystroke restarts the debounce timer and bumps a generation
//! counter. A response is applied only if its generation is still the
//! current one, so results always belong to the latest text.

use crate::config::FlowConfig;
use crate::error::Result;
use crate::ticker::Ticker;
use episteme_api::{AnalysisApi, StockSuggestion};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// State of the search box and its dropdown
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchView {
    pub text: String,
    pub results: Vec<StockSuggestion>,
    /// Whether the dropdown is shown
    pub visible: bool,
    pub loading: bool,
    /// Query the current `results` answer; `None` when nothing was resolved
    pub results_for: Option<String>,
}

struct Shared {
    view: watch::Sender<SearchView>,
    generation: AtomicU64,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

/// Resolves search text into ticker suggestions
pub struct SearchResolver {
    api: Arc<dyn AnalysisApi>,
    debounce: Duration,
    shared: Arc<Shared>,
    root: CancellationToken,
    pending: Mutex<CancellationToken>,
}

impl SearchResolver {
    pub fn new(api: Arc<dyn AnalysisApi>, config: &FlowConfig) -> Self {
        let root = CancellationToken::new();
        Self {
            api,
            debounce: config.debounce,
            shared: Arc::new(Shared {
                view: watch::Sender::new(SearchView::default()),
                generation: AtomicU64::new(0),
            }),
            pending: Mutex::new(root.child_token()),
            root,
        }
    }

    pub fn view(&self) -> SearchView {
        self.shared.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.shared.view.subscribe()
    }

    /// New search text. Must be called inside a tokio runtime.
    pub fn input(&self, text: &str) {
        let (generation, token) = self.restart();
        let query = text.trim().to_string();

        self.shared.view.send_modify(|view| {
            view.text = text.to_string();
            if query.is_empty() {
                view.results.clear();
                view.results_for = None;
                view.visible = false;
                view.loading = false;
            }
        });
        if query.is_empty() {
            return;
        }

        let api = Arc::clone(&self.api);
        let shared = Arc::clone(&self.shared);
        let debounce = self.debounce;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => return,
                () = tokio::time::sleep(debounce) => {}
            }
            if !shared.is_current(generation) {
                return;
            }

            shared.view.send_modify(|view| view.loading = true);
            debug!("Searching tickers for '{query}'");

            let result = tokio::select! {
                biased;
                () = token.cancelled() => return,
                result = api.stock_query(&query) => result,
            };

            shared.view.send_if_modified(|view| {
                if !shared.is_current(generation) {
                    debug!("Discarding stale results for '{query}'");
                    return false;
                }
                view.loading = false;
                view.results_for = Some(query.clone());
                match result {
                    Ok(results) => {
                        view.results = results;
                        view.visible = true;
                    }
                    Err(err) => {
                        warn!("Ticker search for '{query}' failed: {err}");
                        view.results.clear();
                    }
                }
                true
            });
        });
    }

    /// Hide the dropdown, keeping the text
    pub fn dismiss(&self) {
        self.shared.view.send_modify(|view| view.visible = false);
    }

    /// Show the dropdown again if there is text
    pub fn focus(&self) {
        self.shared
            .view
            .send_modify(|view| view.visible = !view.text.trim().is_empty());
    }

    /// Pick a suggestion: clears the box and hands back the ticker
    pub fn select(&self, ticker: &str) -> Result<Ticker> {
        self.restart();
        self.shared.view.send_modify(|view| {
            view.text.clear();
            view.results.clear();
            view.results_for = None;
            view.visible = false;
            view.loading = false;
        });
        Ticker::parse(ticker)
    }

    /// Cancel any pending debounce or query and start a new generation
    fn restart(&self) -> (u64, CancellationToken) {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = self.root.child_token();
        let previous = std::mem::replace(
            &mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner),
            token.clone(),
        );
        previous.cancel();
        (generation, token)
    }
}

impl Drop for SearchResolver {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
