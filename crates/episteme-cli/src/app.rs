//! Command implementations

use crate::console::Console;
use crate::render;
use anyhow::{Context, Result, bail};
use episteme_api::{AnalysisApi, ApiConfig, HttpApiClient};
use episteme_flow::{
    AcquisitionFlow, ChannelNavigator, FavoritesRepository, FileStore, FlowConfig, FlowOutcome,
    PollPhase, PromptChoice, ReportLoader, ReportView, Route, SearchResolver, TaskId, TaskPoller,
    Ticker,
};
use episteme_utils::Config;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

pub struct App {
    api: Arc<dyn AnalysisApi>,
    flow_config: FlowConfig,
    favorites: FavoritesRepository,
    reports: ReportLoader,
}

impl App {
    pub fn new(api_config: &ApiConfig, flow_config: FlowConfig, config: &Config) -> Result<Self> {
        let api: Arc<dyn AnalysisApi> = Arc::new(HttpApiClient::new(api_config)?);
        let store = FileStore::new(config.favorites_path());
        debug!("Favorites stored in {}", store.path().display());

        Ok(Self {
            reports: ReportLoader::new(Arc::clone(&api), &flow_config),
            favorites: FavoritesRepository::new(Arc::new(store)),
            api,
            flow_config,
        })
    }

    pub async fn search(&self, text: &str) -> Result<()> {
        let query = text.trim().to_string();
        if query.is_empty() {
            bail!("search text is empty");
        }

        let resolver = SearchResolver::new(Arc::clone(&self.api), &self.flow_config);
        let mut views = resolver.subscribe();
        resolver.input(text);

        let view = views
            .wait_for(|view| view.results_for.as_deref() == Some(query.as_str()))
            .await
            .context("search was interrupted")?
            .clone();
        println!("{}", render::suggestions(&view.results));
        Ok(())
    }

    pub async fn analyze(&self, raw_ticker: &str, preset: Option<PromptChoice>) -> Result<()> {
        let ticker = Ticker::parse(raw_ticker)?;
        let (navigator, mut routes) = ChannelNavigator::channel();
        let flow = AcquisitionFlow::new(Arc::clone(&self.api), Arc::new(navigator.clone()));

        let mut prompt = flow.open(&ticker).await;
        let mut console = Console::stdin();

        loop {
            println!("{}", render::prompt(&prompt));
            let choice = match preset {
                Some(choice) => choice,
                None => console
                    .ask_choice(prompt.available_choices())
                    .await?
                    .unwrap_or(PromptChoice::Dismiss),
            };

            match flow.resolve(choice).await {
                FlowOutcome::Navigated(_) => break,
                FlowOutcome::Dismissed | FlowOutcome::NoPrompt => return Ok(()),
                FlowOutcome::LaunchFailed(message) if preset.is_some() => bail!(message),
                FlowOutcome::LaunchFailed(message) => eprintln!("{}", render::error(&message)),
                FlowOutcome::Rejected if preset.is_some() => {
                    bail!("'{choice:?}' is not available for {ticker}")
                }
                FlowOutcome::Rejected | FlowOutcome::Busy => {
                    println!("That option is not available right now.");
                }
            }

            match flow.prompt() {
                Some(next) => prompt = next,
                None => return Ok(()),
            }
        }

        self.follow(&navigator, &mut routes).await
    }

    pub async fn poll(&self, task_id: Option<&str>, ticker: Option<&str>) -> Result<()> {
        let task_id = task_id.and_then(|raw| TaskId::parse(raw).ok());
        let ticker = ticker.and_then(|raw| Ticker::parse(raw).ok());

        let (navigator, mut routes) = ChannelNavigator::channel();
        self.watch_task(&navigator, task_id, ticker).await?;
        self.follow(&navigator, &mut routes).await
    }

    pub async fn report(&self, raw_ticker: &str, json: bool) -> Result<()> {
        let ticker = Ticker::parse(raw_ticker)?;
        if json {
            let analysis = self.reports.fetch(ticker.as_str(), false).await?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
            return Ok(());
        }
        self.show_report(&ticker).await
    }

    pub async fn list_favorites(&self) -> Result<()> {
        let favorites = self.favorites.load()?;
        if favorites.is_empty() {
            println!("No favorites yet. Add one with `episteme favorites add <TICKER>`.");
            return Ok(());
        }

        let summaries = self.reports.favorites_overview(&favorites).await;
        println!("{}", render::favorites(&summaries));
        if summaries.len() < favorites.len() {
            println!(
                "{} favorite(s) have no stored analysis yet.",
                favorites.len() - summaries.len()
            );
        }
        Ok(())
    }

    pub fn add_favorite(&self, raw_ticker: &str, logo: Option<&str>) -> Result<()> {
        let ticker = Ticker::parse(raw_ticker)?;
        self.favorites.add(&ticker.display(), logo)?;
        println!("{ticker} is in your favorites.");
        Ok(())
    }

    pub fn remove_favorite(&self, raw_ticker: &str) -> Result<()> {
        let ticker = Ticker::parse(raw_ticker)?;
        if self.favorites.remove(&ticker.display())? {
            println!("Removed {ticker} from your favorites.");
        } else {
            println!("{ticker} was not a favorite.");
        }
        Ok(())
    }

    /// Act on the routes requested so far until none is left
    async fn follow(
        &self,
        navigator: &ChannelNavigator,
        routes: &mut UnboundedReceiver<Route>,
    ) -> Result<()> {
        while let Ok(route) = routes.try_recv() {
            info!("Opening {}", route.path());
            match route {
                Route::Loading { task_id, ticker } => {
                    self.watch_task(navigator, Some(task_id), Some(ticker))
                        .await?;
                }
                Route::Stock { ticker } => self.show_report(&Ticker::parse(&ticker)?).await?,
                Route::Home | Route::Favorites | Route::Back => {}
            }
        }
        Ok(())
    }

    async fn watch_task(
        &self,
        navigator: &ChannelNavigator,
        task_id: Option<TaskId>,
        ticker: Option<Ticker>,
    ) -> Result<()> {
        let poller = TaskPoller::new(
            Arc::clone(&self.api),
            Arc::new(navigator.clone()),
            &self.flow_config,
        );
        let handle = poller.spawn(task_id, ticker);
        let mut views = handle.subscribe();
        let mut stdout = std::io::stdout();

        print!("{}", render::progress_line(&handle.view()));
        stdout.flush()?;

        loop {
            tokio::select! {
                changed = views.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = views.borrow_and_update().clone();
                    print!("{}", render::progress_line(&view));
                    stdout.flush()?;
                    if view.phase.is_terminal() {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    handle.cancel();
                    break;
                }
            }
        }

        let view = handle.wait().await;
        println!();
        match view.phase {
            PollPhase::Completed => println!("Analysis complete."),
            PollPhase::Cancelled => println!("Stopped following the analysis task."),
            PollPhase::Failed => bail!(view.error.unwrap_or_default()),
            PollPhase::Initializing | PollPhase::Polling => {}
        }
        Ok(())
    }

    async fn show_report(&self, ticker: &Ticker) -> Result<()> {
        match self.reports.load(ticker).await {
            ReportView::Loaded(report) => {
                let favorite = self.favorites.contains(&ticker.display())?;
                println!("{}", render::report(&report, favorite));
                Ok(())
            }
            ReportView::NotFound { ticker } => {
                println!("No analysis found for {ticker}.");
                Ok(())
            }
            ReportView::Failed(message) => bail!(message),
        }
    }
}
