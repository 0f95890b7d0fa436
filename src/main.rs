use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tably_core::{AnalysisClient, Config};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser, Debug)]
#[command(name = "tably")]
#[command(version, about = "Chat with your sales data from the terminal")]
struct Cli {
    /// Base URL of the analysis service
    #[arg(long, env = "TABLY_API_URL")]
    api_url: Option<String>,

    /// Request timeout in seconds (0 disables it)
    #[arg(long)]
    timeout: Option<u64>,

    /// Loader animation interval in milliseconds
    #[arg(long)]
    loader_interval: Option<u64>,

    /// Where to write the log file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Flags win over the config file
    fn apply(&self, mut config: Config) -> Config {
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(secs) = self.timeout {
            config.request_timeout_secs = secs;
        }
        if let Some(ms) = self.loader_interval {
            config.loader_interval_ms = ms;
        }
        config
    }
}

fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::config_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tably")
        .join("tably.log")
}

/// The terminal owns stderr, so logs go to a file. Filter with `RUST_LOG`.
fn init_logging(path: &Path) -> Result<WorkerGuard> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .context("Log file path has no file name")?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tably=info,tably_core=info")),
        )
        .init();

    Ok(guard)
}

fn build_client(config: &Config) -> Result<AnalysisClient> {
    match config.request_timeout() {
        Some(timeout) => AnalysisClient::with_timeout(&config.api_url, timeout)
            .context("Failed to build HTTP client"),
        None => Ok(AnalysisClient::new(&config.api_url)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = cli.log_file.clone().unwrap_or_else(default_log_path);
    let _guard = init_logging(&log_path)?;

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Falling back to default config: {:#}", e);
            Config::new()
        }
    };
    let config = cli.apply(config);
    tracing::info!(api_url = %config.api_url, "Starting Tably");

    let client = build_client(&config)?;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(client, events.sender(), config.loader_interval());

    let res = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        tracing::error!("Exited with error: {:#}", err);
    }
    res
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}
