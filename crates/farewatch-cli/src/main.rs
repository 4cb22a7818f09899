mod monitor;

use std::path::PathBuf;

use clap::Parser;
use farewatch_core::config::DEFAULT_CONFIG_PATH;
use farewatch_core::{AppConfig, SourceKind};
use farewatch_notify::{Notifier, RenderOptions};
use farewatch_scraper::{DomScraper, SearchFlowScraper, SerpApiClient, WebDriverClient};
use farewatch_store::HistoryStore;
use tracing_subscriber::EnvFilter;

use crate::monitor::{run, PriceMonitor, ReminderMonitor, RunOptions};

/// Per-date results listed in an API alert.
const API_ALERT_LIMIT: usize = 5;

#[derive(Debug, Parser)]
#[command(name = "farewatch")]
#[command(about = "Watches airline fares and alerts when they drop below a threshold")]
struct Cli {
    /// Config file read when no credentials are set in the environment.
    #[arg(long, env = "FAREWATCH_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Price source: dom, search, api or reminder.
    #[arg(long, env = "FAREWATCH_SOURCE")]
    source: Option<SourceKind>,

    /// Run a single check and exit.
    #[arg(long, env = "FAREWATCH_ONCE")]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // `.env` is already loaded above so clap's `env` fallbacks see it too.
    let (mut config, origin) = farewatch_core::load_app_config_from_env(&cli.config)?;
    if let Some(source) = cli.source {
        config.source = source;
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(
        origin = ?origin,
        source = %config.source,
        route = %format!("{} → {}", config.origin, config.destination),
        dates = config.queries().len(),
        threshold = %config.price_threshold,
        interval_minutes = config.check_interval_minutes,
        "farewatch starting"
    );

    let notifier = Notifier::from_config(&config)?;
    let options = RunOptions::from_config(&config, cli.once);

    match config.source {
        SourceKind::Reminder => {
            let mut monitor = ReminderMonitor::new(&config);
            run(&mut monitor, &notifier, &config, options, shutdown_signal()).await
        }
        SourceKind::Api => {
            let source =
                SerpApiClient::new(config.serpapi_key().map(str::to_string), config.request_timeout_secs)?;
            let render = RenderOptions::lowest(API_ALERT_LIMIT).with_threshold(config.price_threshold);
            run_prices(source, render, &notifier, &config, options).await
        }
        SourceKind::Dom => {
            let driver = WebDriverClient::new(&config.webdriver_url, config.request_timeout_secs)?;
            let source = DomScraper::new(driver).with_debug_dump_dir(".");
            let render = RenderOptions::in_order().with_threshold(config.price_threshold);
            run_prices(source, render, &notifier, &config, options).await
        }
        SourceKind::SearchFlow => {
            let driver = WebDriverClient::new(&config.webdriver_url, config.request_timeout_secs)?;
            let source = SearchFlowScraper::new(driver);
            let render = RenderOptions::in_order().with_threshold(config.price_threshold);
            run_prices(source, render, &notifier, &config, options).await
        }
    }
}

async fn run_prices<S: farewatch_scraper::PriceSource>(
    source: S,
    render: RenderOptions,
    notifier: &Notifier,
    config: &AppConfig,
    options: RunOptions,
) -> anyhow::Result<()> {
    let store = HistoryStore::new(&config.history_path);
    let history = store.load().await?;
    let mut monitor = PriceMonitor::new(config, source, store, history, render);
    run(&mut monitor, notifier, config, options, shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping monitor");
}
