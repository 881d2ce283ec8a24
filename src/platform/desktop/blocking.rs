use anyhow::{Context, Result};

/// Runs a blocking store call on tokio's blocking pool so the UI loop keeps
/// rendering while SQLite works.
pub async fn run_blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("blocking task did not complete")
}
