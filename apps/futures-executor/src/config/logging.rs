//! Log output settings (optional `[LOGGING]` section).

use std::path::PathBuf;

use serde::Deserialize;

/// Default filter when neither `RUST_LOG` nor `LOGGING.LEVEL` is set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Level for this crate's targets (`RUST_LOG` overrides).
    pub level: String,
    /// Directory for the log file.
    pub directory: PathBuf,
    /// Log file name inside `directory`.
    pub file_name: String,
    /// Also append to the log file.
    pub file_enabled: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            directory: PathBuf::from("logs"),
            file_name: "trading.log".to_string(),
            file_enabled: true,
        }
    }
}

impl LoggingSettings {
    /// Full path of the log file.
    #[must_use]
    pub fn file_path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct LoggingSection {
    #[serde(default, alias = "LEVEL")]
    level: Option<String>,
    #[serde(default, alias = "DIRECTORY")]
    directory: Option<String>,
    #[serde(default, alias = "FILE_NAME")]
    file_name: Option<String>,
    #[serde(default, alias = "FILE_ENABLED")]
    file_enabled: Option<bool>,
}

impl LoggingSection {
    pub(super) fn into_settings(self) -> LoggingSettings {
        let defaults = LoggingSettings::default();
        let non_empty = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        LoggingSettings {
            level: non_empty(self.level).unwrap_or(defaults.level),
            directory: non_empty(self.directory).map_or(defaults.directory, PathBuf::from),
            file_name: non_empty(self.file_name).unwrap_or(defaults.file_name),
            file_enabled: self.file_enabled.unwrap_or(defaults.file_enabled),
        }
    }
}
