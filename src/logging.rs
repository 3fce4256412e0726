//! Logging configuration for the DSA coach

use std::path::Path;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::{
    self,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::config::LoggingConfig;
use crate::Result;

const LOG_DIR: &str = "logs";
const LOG_FILE_PREFIX: &str = "dsacoach.log";

/// Initialize logging from configuration, or from `RUST_LOG` when none is given
pub fn init_logging_with_config(config: Option<&crate::config::AppConfig>) -> Result<()> {
    let env_filter = if let Some(config) = config {
        filter_for_level(&config.logging.level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,dsacoach=debug"))
    };

    let level = config.map_or("info", |c| c.logging.level.as_str());
    install(env_filter, level)
}

/// Initialize logging with custom log level
pub fn init_logging_with_level(level: &str) -> Result<()> {
    install(filter_for_level(level), level)
}

/// Initialize simple console-only logging for testing
pub fn init_simple_logging() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();

    Ok(())
}

/// Enable `RUST_BACKTRACE` when the config asks for it and the environment
/// has not already decided
pub fn apply_backtrace_setting(config: &LoggingConfig) {
    let current = std::env::var("RUST_BACKTRACE").ok();
    if let Some(value) = backtrace_override(config.backtrace, current.as_deref()) {
        std::env::set_var("RUST_BACKTRACE", value);
    }
}

fn backtrace_override(enabled: bool, current: Option<&str>) -> Option<&'static str> {
    (enabled && current.is_none()).then_some("1")
}

fn filter_for_level(level: &str) -> EnvFilter {
    EnvFilter::new(format!("{level},dsacoach={level}"))
}

fn install(env_filter: EnvFilter, level: &str) -> Result<()> {
    let logs_dir = Path::new(LOG_DIR);
    if !logs_dir.exists() {
        std::fs::create_dir_all(logs_dir)?;
    }

    let file_appender = tracing_appender::rolling::daily(LOG_DIR, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking)
        .with_ansi(false); // No colors in file

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!("Logging initialized with level: {level} - console and file output enabled");
    tracing::info!("Log files will be saved to: {LOG_DIR}/{LOG_FILE_PREFIX}.YYYY-MM-DD");

    // The writer must outlive every span, so the guard lives for the process
    std::mem::forget(guard);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_initialization() {
        // Repeated initialization across tests must not panic
        assert!(init_simple_logging().is_ok());
        assert!(init_simple_logging().is_ok());
    }

    #[test]
    fn test_backtrace_override() {
        assert_eq!(backtrace_override(true, None), Some("1"));
        assert_eq!(backtrace_override(true, Some("0")), None);
        assert_eq!(backtrace_override(false, None), None);
    }
}
