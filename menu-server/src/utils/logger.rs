//! Logging Infrastructure
//!
//! `RUST_LOG` takes precedence over the configured level. With a log
//! directory, output goes to a daily rolling file instead of stdout.

use std::path::Path;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// File name prefix for rolling log files
pub const LOG_FILE_PREFIX: &str = "menu-server";

fn build_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the logger with defaults (info, plain text, stdout)
pub fn init_logger() -> anyhow::Result<()> {
    init_logger_with_file(None, false, None)
}

/// Initialize the logger with optional JSON output and file output
pub fn init_logger_with_file(
    log_level: Option<&str>,
    json: bool,
    log_dir: Option<&str>,
) -> anyhow::Result<()> {
    let filter = build_filter(log_level.unwrap_or("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    let result = match log_dir {
        Some(dir) => {
            let log_path = Path::new(dir);
            std::fs::create_dir_all(log_path)
                .with_context(|| format!("creating log directory {}", log_path.display()))?;
            let file_appender = tracing_appender::rolling::daily(log_path, LOG_FILE_PREFIX);
            let builder = builder.with_ansi(false).with_writer(file_appender);
            if json {
                builder.json().try_init()
            } else {
                builder.try_init()
            }
        }
        None if json => builder.json().try_init(),
        None => builder.try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("logger already initialized: {}", e))
}
