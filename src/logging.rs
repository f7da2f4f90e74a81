//! File logging. The terminal belongs to the UI, so log lines go to
//! `hrviz.log` in the cache directory.

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the configured log filter.
pub const LOG_ENV: &str = "HRVIZ_LOG";

/// Filter from `HRVIZ_LOG`, falling back to `default_level`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Append log lines to `path`. Safe to call once per process; later calls
/// leave the first subscriber in place.
pub fn init_file_logging(path: &Path, default_level: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("Failed to open log file {}", path.display()))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "logging started");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_level_falls_back() {
        // A bogus directive must not panic or fail initialization.
        let filter = env_filter("not a [valid filter");
        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn log_file_is_created() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("hrviz.log");
        init_file_logging(&path, "debug").expect("init");
        assert!(path.exists());
    }
}
