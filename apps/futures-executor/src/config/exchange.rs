//! Exchange connection settings (`[BINANCE]` section).

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use super::ConfigError;
use crate::infrastructure::exchange::{BinanceConfig, BinanceEnvironment};

/// Where orders go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeEnvironment {
    /// Binance futures testnet.
    Testnet,
    /// Binance futures production. Real funds.
    Mainnet,
    /// In-memory exchange, no network access.
    Simulated,
}

impl ExchangeEnvironment {
    /// Parse `TESTNET`, `MAINNET` or `SIMULATED` (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "TESTNET" => Some(Self::Testnet),
            "MAINNET" => Some(Self::Mainnet),
            "SIMULATED" => Some(Self::Simulated),
            _ => None,
        }
    }

    /// Returns true if orders move real funds.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Mainnet)
    }

    /// Returns true if the environment talks to a real exchange.
    #[must_use]
    pub const fn requires_credentials(&self) -> bool {
        !matches!(self, Self::Simulated)
    }
}

impl fmt::Display for ExchangeEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Testnet => write!(f, "TESTNET"),
            Self::Mainnet => write!(f, "MAINNET"),
            Self::Simulated => write!(f, "SIMULATED"),
        }
    }
}

/// API key pair. `Debug` never prints the values.
#[derive(Clone, Default)]
pub struct Credentials {
    api_key: String,
    api_secret: String,
}

impl Credentials {
    /// Create a key pair.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// API secret.
    #[must_use]
    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }

    /// Returns true if both halves are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Validated exchange settings.
#[derive(Debug, Clone)]
pub struct ExchangeSettings {
    /// API key pair (may be empty for SIMULATED).
    pub credentials: Credentials,
    /// Target environment.
    pub environment: ExchangeEnvironment,
    /// REST base URL override.
    pub base_url: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// `recvWindow` sent with signed requests.
    pub recv_window_ms: u64,
    /// How long symbol rules may be reused. Zero disables caching.
    pub rules_cache_ttl: Duration,
}

impl ExchangeSettings {
    /// Binance client configuration, or `None` for SIMULATED.
    #[must_use]
    pub fn binance_config(&self) -> Option<BinanceConfig> {
        let environment = match self.environment {
            ExchangeEnvironment::Testnet => BinanceEnvironment::Testnet,
            ExchangeEnvironment::Mainnet => BinanceEnvironment::Mainnet,
            ExchangeEnvironment::Simulated => return None,
        };

        let mut config = BinanceConfig::new(
            self.credentials.api_key(),
            self.credentials.api_secret(),
            environment,
        )
        .with_timeout(self.timeout);
        config.recv_window_ms = self.recv_window_ms;
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url.clone());
        }
        Some(config)
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ExchangeSection {
    #[serde(default, alias = "API_KEY")]
    api_key: String,
    #[serde(default, alias = "API_SECRET")]
    api_secret: String,
    #[serde(default = "default_environment", alias = "ENVIRONMENT")]
    environment: String,
    #[serde(default, alias = "BASE_URL")]
    base_url: Option<String>,
    #[serde(default = "default_timeout_secs", alias = "TIMEOUT_SECS")]
    timeout_secs: u64,
    #[serde(default = "default_recv_window_ms", alias = "RECV_WINDOW_MS")]
    recv_window_ms: u64,
    #[serde(default, alias = "RULES_CACHE_TTL_SECS")]
    rules_cache_ttl_secs: u64,
}

impl ExchangeSection {
    pub(super) fn into_settings(self) -> Result<ExchangeSettings, ConfigError> {
        let environment = ExchangeEnvironment::parse(&self.environment).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "BINANCE.ENVIRONMENT must be one of TESTNET, MAINNET, SIMULATED (got '{}')",
                self.environment
            ))
        })?;
        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "BINANCE.TIMEOUT_SECS must be positive".to_string(),
            ));
        }
        if self.recv_window_ms == 0 || self.recv_window_ms > 60_000 {
            return Err(ConfigError::ValidationError(
                "BINANCE.RECV_WINDOW_MS must be between 1 and 60000".to_string(),
            ));
        }

        Ok(ExchangeSettings {
            credentials: Credentials::new(self.api_key.trim(), self.api_secret.trim()),
            environment,
            base_url: self
                .base_url
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
            timeout: Duration::from_secs(self.timeout_secs),
            recv_window_ms: self.recv_window_ms,
            rules_cache_ttl: Duration::from_secs(self.rules_cache_ttl_secs),
        })
    }
}

fn default_environment() -> String {
    "TESTNET".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_recv_window_ms() -> u64 {
    5000
}
