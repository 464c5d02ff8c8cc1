use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use p3_core::{AnalysisBackend, AnalysisClient, Config, MockAnalyst, Role};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui, TICK_RATE};

#[derive(Parser, Debug)]
#[command(name = "p3", version)]
#[command(about = "P3 - Peak Productivity Partner: role-based analysis of Confluence pages and PDFs")]
struct Cli {
    /// Answer from the built-in offline analyst instead of the remote service
    #[arg(long)]
    offline: bool,

    /// Starting role: developer, pm or qa
    #[arg(short, long)]
    role: Option<String>,

    /// Endpoint for URL analysis
    #[arg(long)]
    analyze_endpoint: Option<String>,

    /// Endpoint for follow-up questions
    #[arg(long)]
    improve_endpoint: Option<String>,

    /// Endpoint for PDF analysis
    #[arg(long)]
    document_endpoint: Option<String>,

    /// Seed for the offline analyst's reply selection
    #[arg(long)]
    seed: Option<u64>,

    /// Write the effective settings back to the config file
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(role) = &self.role {
            Role::from_str(role).ok_or_else(|| anyhow!("Unknown role '{}' (expected developer, pm or qa)", role))?;
            config.default_role = Some(role.clone());
        }
        if self.offline {
            config.offline = true;
        }
        if let Some(endpoint) = &self.analyze_endpoint {
            config.analyze_endpoint = Some(endpoint.clone());
        }
        if let Some(endpoint) = &self.improve_endpoint {
            config.improve_endpoint = Some(endpoint.clone());
        }
        if let Some(endpoint) = &self.document_endpoint {
            config.document_endpoint = Some(endpoint.clone());
        }
        Ok(())
    }
}

fn log_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("p3").join("p3.log"))
}

/// Logs go to a file; the terminal belongs to the TUI.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file = log_path().and_then(|path| {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok()?;
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    if let Some(file) = file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
            .init();
    }
}

fn build_backend(config: &Config, seed: Option<u64>) -> Arc<dyn AnalysisBackend> {
    let latency = Duration::from_millis(config.mock_latency_ms());
    let analyst = match seed {
        Some(seed) => MockAnalyst::with_seed(seed).with_latency(latency),
        None => MockAnalyst::from_config(config),
    };

    if config.offline {
        tracing::info!("using offline analyst");
        Arc::new(analyst)
    } else {
        tracing::info!(
            analyze = config.analyze_endpoint(),
            improve = config.improve_endpoint(),
            "using analysis service"
        );
        Arc::new(AnalysisClient::from_config(config).with_offline_analyst(analyst))
    }
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let mut config = Config::load().unwrap_or_else(|err| {
        tracing::warn!("failed to load config, using defaults: {}", err);
        Config::new()
    });
    cli.apply(&mut config)?;

    if cli.save_config {
        config.save().context("Failed to save config")?;
        tracing::info!("config saved");
    }

    let backend = build_backend(&config, cli.seed);
    let mut app = App::new(config.role(), backend, config.offline);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(TICK_RATE);

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}
