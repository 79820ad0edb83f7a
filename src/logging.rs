// ABOUTME: Tracing subscriber setup for the migrator CLI
// ABOUTME: Writes structured logs to stderr or appends them to a log file

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG`, when set, takes precedence over `level`.
pub fn init(level: &str, file: Option<&Path>) -> Result<()> {
    let filter = build_filter(level, std::env::var("RUST_LOG").ok().as_deref())?;

    match file {
        Some(path) => {
            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

fn build_filter(level: &str, rust_log: Option<&str>) -> Result<EnvFilter> {
    let directives = rust_log.filter(|v| !v.is_empty()).unwrap_or(level);
    EnvFilter::try_new(directives).with_context(|| format!("Invalid log level '{}'", directives))
}
