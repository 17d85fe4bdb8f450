//! Configuration module for the futures executor.
//!
//! Loads two INI files, interpolates environment variables, and validates
//! the result into typed settings.
//!
//! # Usage
//!
//! ```rust,ignore
//! use futures_executor::config::load_settings;
//!
//! // Load from the default paths (settings/config.ini, settings/parameter.ini)
//! let settings = load_settings(None, None)?;
//!
//! println!("Trading {} at {}x", settings.trading.symbol, settings.trading.leverage);
//! ```
//!
//! # Files
//!
//! `config.ini` holds the `[BINANCE]` credentials section and an optional
//! `[LOGGING]` section. `parameter.ini` holds the `[TRADING]` section.
//! Values may reference `${VAR}` or `${VAR:-default}`.

mod exchange;
mod logging;
mod trading;

use config::{Config, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

pub use exchange::{Credentials, ExchangeEnvironment, ExchangeSettings};
pub use logging::LoggingSettings;
pub use trading::{RunMode, TradingSettings};

/// Default path of the credentials file.
pub const DEFAULT_CONFIG_PATH: &str = "settings/config.ini";

/// Default path of the trading parameters file.
pub const DEFAULT_PARAMETER_PATH: &str = "settings/parameter.ini";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse INI configuration.
    #[error("Failed to parse config INI: {0}")]
    ParseError(#[from] config::ConfigError),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Exchange connection.
    pub exchange: ExchangeSettings,
    /// Workflow parameters.
    pub trading: TradingSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(alias = "BINANCE")]
    binance: exchange::ExchangeSection,
    #[serde(default, alias = "LOGGING")]
    logging: logging::LoggingSection,
}

#[derive(Debug, Deserialize)]
struct ParameterFile {
    #[serde(alias = "TRADING")]
    trading: trading::TradingSection,
}

// ============================================
// Configuration Loading
// ============================================

/// Load settings from the two INI files with environment variable
/// interpolation.
///
/// # Arguments
///
/// * `config_path` - Credentials file. Defaults to [`DEFAULT_CONFIG_PATH`].
/// * `parameter_path` - Trading parameters file. Defaults to
///   [`DEFAULT_PARAMETER_PATH`].
///
/// # Errors
///
/// Returns a `ConfigError` if a file cannot be read, parsed, or validated.
pub fn load_settings(
    config_path: Option<&str>,
    parameter_path: Option<&str>,
) -> Result<Settings, ConfigError> {
    let config_ini = read_file(config_path.unwrap_or(DEFAULT_CONFIG_PATH))?;
    let parameter_ini = read_file(parameter_path.unwrap_or(DEFAULT_PARAMETER_PATH))?;
    load_settings_from_strings(&config_ini, &parameter_ini)
}

/// Load settings from INI strings (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the INI cannot be parsed or validated.
pub fn load_settings_from_strings(
    config_ini: &str,
    parameter_ini: &str,
) -> Result<Settings, ConfigError> {
    let credentials: CredentialsFile = parse_ini(config_ini)?;
    let parameters: ParameterFile = parse_ini(parameter_ini)?;

    let settings = Settings {
        exchange: credentials.binance.into_settings()?,
        trading: parameters.trading.into_settings()?,
        logging: credentials.logging.into_settings(),
    };
    validate_settings(&settings)?;
    Ok(settings)
}

fn read_file(path: &str) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })
}

fn parse_ini<T: for<'de> Deserialize<'de>>(contents: &str) -> Result<T, ConfigError> {
    let interpolated = interpolate_env_vars(contents);
    let parsed = Config::builder()
        .add_source(File::from_str(&interpolated, FileFormat::Ini))
        .build()?
        .try_deserialize()?;
    Ok(parsed)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is a compile-time constant
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Cross-section checks.
fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    let exchange = &settings.exchange;
    if exchange.environment.requires_credentials() && !exchange.credentials.is_complete() {
        return Err(ConfigError::ValidationError(format!(
            "BINANCE.API_KEY and BINANCE.API_SECRET are required for {}",
            exchange.environment
        )));
    }
    if settings.logging.file_enabled && settings.logging.file_name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "LOGGING.FILE_NAME must not be empty when file logging is enabled".to_string(),
        ));
    }
    Ok(())
}
