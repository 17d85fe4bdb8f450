//! Logging Setup
//!
//! Initializes the `tracing` subscriber with a console layer and, when
//! enabled, an append-mode file layer (`logs/trading.log` by default).
//!
//! # Configuration
//!
//! - `RUST_LOG`: overrides the filter entirely
//! - `[LOGGING]` section of `config.ini`: level, directory, file name
//!
//! # Usage
//!
//! ```rust,ignore
//! use futures_executor::telemetry::init_logging;
//!
//! init_logging(&settings.logging)?;
//! tracing::info!("ready");
//! ```

use std::fs::{File, OpenOptions};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingSettings;

/// Logging initialization errors.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The log directory or file could not be opened.
    #[error("Failed to open log file '{path}': {source}")]
    LogFile {
        /// File path.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// A global subscriber is already installed.
    #[error("Failed to install tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Filter used when `RUST_LOG` is unset.
#[must_use]
pub fn default_filter(settings: &LoggingSettings) -> String {
    format!("warn,futures_executor={}", settings.level)
}

/// Initialize console (and optionally file) logging.
///
/// # Errors
///
/// Returns `TelemetryError` if the log file cannot be opened or a global
/// subscriber is already set.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(settings)));

    let file_layer = if settings.file_enabled {
        let file = open_log_file(settings)?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
    } else {
        None
    };

    let console_layer = tracing_subscriber::fmt::layer().with_target(false);

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    if settings.file_enabled {
        tracing::debug!(path = %settings.file_path().display(), "File logging enabled");
    }
    Ok(())
}

fn open_log_file(settings: &LoggingSettings) -> Result<File, TelemetryError> {
    let path = settings.file_path();
    let wrap = |source| TelemetryError::LogFile {
        path: path.display().to_string(),
        source,
    };

    std::fs::create_dir_all(&settings.directory).map_err(wrap)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(wrap)
}
