//! Binary entry point: load configuration, start file logging, open the
//! preferences store, and drive the Ratatui event loop until the user exits.
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use manga_recommender::{
    detect_system_theme, ensure_schema, run_app, App, Config, HttpApi, RecommendationApi,
};

/// Log to a daily file; the terminal itself belongs to the UI.
fn init_tracing(config: &Config) -> anyhow::Result<WorkerGuard> {
    let log_dir = config.log_dir()?;
    std::fs::create_dir_all(&log_dir).context("failed to create log directory")?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "manga-recommender.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("manga_recommender=info"));
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_ansi(false)
        .init();

    Ok(guard)
}

fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let _guard = init_tracing(&config)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        api_url = %config.api_url,
        "starting manga recommender"
    );

    let conn = ensure_schema(&config.data_dir()?)?;
    let api: Arc<dyn RecommendationApi> =
        Arc::new(HttpApi::new(&config).context("failed to build HTTP client")?);

    let mut app = App::new(conn, &config, detect_system_theme())?;
    run_app(&mut app, api)
}
