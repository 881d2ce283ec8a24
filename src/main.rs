use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod domain;
mod infra;
mod platform;
mod ui;
mod usecase;


use crate::config::{default_webview_data_dir, AppConfig};

fn setup_tracing(default_filter: &str) -> Result<()> {
    let env_filter = EnvFilter::builder().parse_lossy(
        std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| default_filter.to_string()),
    );
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|err| anyhow!(err))
}

fn main() -> Result<()> {
    let config = AppConfig::load()?;
    setup_tracing(&config.log_filter)?;
    tracing::info!(
        page_size = config.default_page_size,
        database = ?config.database_path,
        "starting"
    );

    let webview_data_dir = default_webview_data_dir()?;

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(dioxus::desktop::WindowBuilder::new().with_title("Records"))
                .with_data_directory(webview_data_dir),
        )
        .with_context(config)
        .launch(app::App);
    Ok(())
}
