use anyhow::{anyhow, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "portfolio-chat.log";

/// Send logs to a file in `log_dir`; the terminal belongs to the UI.
///
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // RUST_LOG=debug to see everything
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("portfolio_chat_core=info,portfolio_chat_tui=info")
        }))
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {e}"))?;

    Ok(guard)
}
