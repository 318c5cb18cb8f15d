//! Command-line interface for episteme
//!
//! ```bash
//! export EPISTEME_API_BASE_URL="https://api.example.com"
//! export EPISTEME_API_KEY="..."
//!
//! episteme search appl
//! episteme analyze AAPL
//! episteme favorites list
//! ```

mod app;
mod console;
mod render;

use anyhow::Context;
use app::App;
use clap::{Parser, Subcommand, ValueEnum};
use episteme_api::ApiConfig;
use episteme_flow::{FlowConfig, PromptChoice};
use episteme_utils::Config;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "episteme")]
#[command(about = "Crowd-sentiment stock analysis from the terminal", long_about = None)]
struct Cli {
    /// Service base URL (overrides EPISTEME_API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// API key (overrides EPISTEME_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Timezone for report timestamps (overrides EPISTEME_TIMEZONE)
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Directory for local state such as favorites (overrides EPISTEME_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Seconds between two task status queries
    #[arg(long, global = true, value_name = "SECS")]
    poll_interval: Option<u64>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Suggest tickers for a search text
    Search { text: String },

    /// Check for a stored analysis, then open it or generate a new one
    Analyze {
        ticker: String,

        /// Answer the prompt without asking
        #[arg(long, value_enum)]
        choice: Option<ChoiceArg>,
    },

    /// Follow a running analysis task
    Poll {
        task_id: Option<String>,

        /// Ticker the task was started for
        #[arg(long)]
        ticker: Option<String>,
    },

    /// Show the stored report of a ticker
    Report {
        ticker: String,

        /// Print the raw payload
        #[arg(long)]
        json: bool,
    },

    /// Manage the favorites list
    Favorites {
        #[command(subcommand)]
        action: FavoritesCommand,
    },
}

#[derive(Subcommand, Debug)]
enum FavoritesCommand {
    /// Show favorites with their latest sentiment
    List,
    /// Add a ticker
    Add {
        ticker: String,
        #[arg(long)]
        logo: Option<String>,
    },
    /// Remove a ticker
    Remove { ticker: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ChoiceArg {
    Reuse,
    New,
    Dismiss,
}

impl From<ChoiceArg> for PromptChoice {
    fn from(choice: ChoiceArg) -> Self {
        match choice {
            ChoiceArg::Reuse => Self::Reuse,
            ChoiceArg::New => Self::GenerateNew,
            ChoiceArg::Dismiss => Self::Dismiss,
        }
    }
}

fn log_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn,episteme_api=info,episteme_flow=info,episteme=info",
        1 => "info,episteme_api=debug,episteme_flow=debug,episteme=debug",
        _ => "trace",
    }
}

fn build_app(cli: &Cli) -> anyhow::Result<App> {
    let mut config = Config::from_env();
    if let Some(dir) = &cli.data_dir {
        config.data_dir.clone_from(dir);
    }

    let mut api = ApiConfig::builder();
    if let Some(url) = &cli.base_url {
        api = api.base_url(url);
    }
    if let Some(key) = &cli.api_key {
        api = api.api_key(key);
    }
    let api_config = api
        .with_env()
        .build()
        .context("invalid service configuration")?;

    let mut flow = FlowConfig::builder();
    if let Some(timezone) = &cli.timezone {
        flow = flow.timezone(timezone);
    }
    if let Some(secs) = cli.poll_interval {
        flow = flow.poll_interval(Duration::from_secs(secs));
    }
    let flow_config = flow
        .with_env()
        .build()
        .context("invalid workflow configuration")?;

    App::new(&api_config, flow_config, &config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    episteme_utils::init_tracing_with(log_directive(cli.verbose));

    info!("Starting episteme");
    let app = build_app(&cli)?;

    match cli.command {
        Command::Search { text } => app.search(&text).await,
        Command::Analyze { ticker, choice } => app.analyze(&ticker, choice.map(Into::into)).await,
        Command::Poll { task_id, ticker } => app.poll(task_id.as_deref(), ticker.as_deref()).await,
        Command::Report { ticker, json } => app.report(&ticker, json).await,
        Command::Favorites { action } => match action {
            FavoritesCommand::List => app.list_favorites().await,
            FavoritesCommand::Add { ticker, logo } => app.add_favorite(&ticker, logo.as_deref()),
            FavoritesCommand::Remove { ticker } => app.remove_favorite(&ticker),
        },
    }
}
