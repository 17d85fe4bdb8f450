//! Binance adapter configuration.

use std::fmt;
use std::time::Duration;

/// Binance USDⓈ-M futures environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinanceEnvironment {
    /// Futures testnet (no real funds).
    Testnet,
    /// Production (real money).
    Mainnet,
}

impl BinanceEnvironment {
    /// Get the REST base URL.
    #[must_use]
    pub const fn base_url(&self) -> &'static str {
        match self {
            Self::Testnet => "https://testnet.binancefuture.com",
            Self::Mainnet => "https://fapi.binance.com",
        }
    }

    /// Check if orders move real funds.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Mainnet)
    }
}

impl fmt::Display for BinanceEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Testnet => write!(f, "TESTNET"),
            Self::Mainnet => write!(f, "MAINNET"),
        }
    }
}

/// Configuration for the Binance gateway.
#[derive(Clone)]
pub struct BinanceConfig {
    /// API key, sent in `X-MBX-APIKEY`.
    pub api_key: String,
    /// API secret used to sign requests.
    pub api_secret: String,
    /// Trading environment.
    pub environment: BinanceEnvironment,
    /// Overrides the environment's base URL (tests, proxies).
    pub base_url: Option<String>,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// `recvWindow` sent with signed requests, in milliseconds.
    pub recv_window_ms: u64,
    /// Retry policy for idempotent requests.
    pub retry: RetryConfig,
}

impl fmt::Debug for BinanceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinanceConfig")
            .field("api_key", &"***")
            .field("api_secret", &"***")
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("recv_window_ms", &self.recv_window_ms)
            .field("retry", &self.retry)
            .finish()
    }
}

impl BinanceConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        environment: BinanceEnvironment,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            environment,
            base_url: None,
            timeout: Duration::from_secs(10),
            recv_window_ms: 5_000,
            retry: RetryConfig::default(),
        }
    }

    /// Send requests to `base_url` instead of the environment's URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Get the effective base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(self.environment.base_url())
            .trim_end_matches('/')
    }
}

/// Retry configuration for idempotent requests.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
    /// Random fraction added to or removed from each delay (0.0 to 1.0).
    pub jitter: f64,
}

impl RetryConfig {
    /// A policy that never retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            multiplier: 1.0,
            jitter: 0.0,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
            jitter: 0.2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_urls() {
        assert!(BinanceEnvironment::Testnet.base_url().contains("testnet"));
        assert_eq!(
            BinanceEnvironment::Mainnet.base_url(),
            "https://fapi.binance.com"
        );
        assert!(BinanceEnvironment::Mainnet.is_live());
        assert!(!BinanceEnvironment::Testnet.is_live());
    }

    #[test]
    fn base_url_override_drops_trailing_slash() {
        let config = BinanceConfig::new("k", "s", BinanceEnvironment::Mainnet)
            .with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn debug_redacts_credentials() {
        let config = BinanceConfig::new("my-key", "my-secret", BinanceEnvironment::Testnet);
        let debug = format!("{config:?}");
        assert!(!debug.contains("my-key"));
        assert!(!debug.contains("my-secret"));
    }

    #[test]
    fn environment_display() {
        assert_eq!(BinanceEnvironment::Testnet.to_string(), "TESTNET");
        assert_eq!(BinanceEnvironment::Mainnet.to_string(), "MAINNET");
    }
}
