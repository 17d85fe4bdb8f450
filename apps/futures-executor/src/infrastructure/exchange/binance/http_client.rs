//! HTTP client wrapper with signing and retry logic.
//!
//! Only idempotent requests are retried. Order placement and cancellation
//! are sent once; their failures are classified so the caller can tell a
//! request that never left from one whose outcome is unknown.

use std::time::Duration;

use rand::Rng;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;

use super::api_types::BinanceErrorResponse;
use super::config::{BinanceConfig, RetryConfig};
use super::error::{
    BinanceError, CODE_BACKEND_TIMEOUT, CODE_INVALID_SYMBOL, CODE_NO_SUCH_ORDER,
    CODE_UNKNOWN_ORDER,
};
use super::signer::{RequestSigner, build_query_string};
use crate::observability::record_gateway_retry;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Whether a request may be repeated without side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idempotency {
    /// Safe to retry.
    Idempotent,
    /// Sent at most once.
    SendOnce,
}

/// Whether a request needs a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Public,
    Signed,
}

/// HTTP client for the Binance futures REST API.
#[derive(Debug, Clone)]
pub struct BinanceHttpClient {
    client: Client,
    api_key: String,
    signer: RequestSigner,
    base_url: String,
    recv_window_ms: u64,
    retry_config: RetryConfig,
}

impl BinanceHttpClient {
    /// Create a new HTTP client from config.
    pub fn new(config: &BinanceConfig) -> Result<Self, BinanceError> {
        if config.api_key.is_empty() || config.api_secret.is_empty() {
            return Err(BinanceError::AuthenticationFailed(
                "API key and secret are required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BinanceError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            signer: RequestSigner::new(config.api_secret.clone()),
            base_url: config.base_url().to_string(),
            recv_window_ms: config.recv_window_ms,
            retry_config: config.retry.clone(),
        })
    }

    /// Unsigned GET (market data).
    pub async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, BinanceError> {
        self.request(Method::GET, path, params, Auth::Public, Idempotency::Idempotent)
            .await
    }

    /// Signed GET (account data).
    pub async fn get_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, BinanceError> {
        self.request(Method::GET, path, params, Auth::Signed, Idempotency::Idempotent)
            .await
    }

    /// Signed POST.
    pub async fn post_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        idempotency: Idempotency,
    ) -> Result<T, BinanceError> {
        self.request(Method::POST, path, params, Auth::Signed, idempotency)
            .await
    }

    /// Signed DELETE. Never retried.
    pub async fn delete_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, BinanceError> {
        self.request(Method::DELETE, path, params, Auth::Signed, Idempotency::SendOnce)
            .await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        auth: Auth,
        idempotency: Idempotency,
    ) -> Result<T, BinanceError> {
        let retry_config = match idempotency {
            Idempotency::Idempotent => self.retry_config.clone(),
            Idempotency::SendOnce => RetryConfig::no_retry(),
        };
        let mut backoff = ExponentialBackoff::new(&retry_config);

        loop {
            match self.send_once(&method, path, params, auth).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !is_retryable(&err) {
                        return Err(err);
                    }
                    let delay = match &err {
                        BinanceError::RateLimited { retry_after_secs } if *retry_after_secs > 0 => {
                            backoff.next_attempt().map(|_| Duration::from_secs(*retry_after_secs))
                        }
                        _ => backoff.next_backoff(),
                    };
                    let Some(delay) = delay else {
                        if backoff.attempt <= 1 {
                            return Err(err);
                        }
                        return Err(BinanceError::MaxRetriesExceeded {
                            attempts: backoff.attempt,
                            last_error: err.to_string(),
                        });
                    };
                    tracing::warn!(
                        method = %method,
                        path,
                        error = %err,
                        delay_ms = delay.as_millis(),
                        attempt = backoff.attempt,
                        "Request failed, retrying"
                    );
                    record_gateway_retry(path, retry_reason(&err));
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: &Method,
        path: &str,
        params: &[(&str, String)],
        auth: Auth,
    ) -> Result<T, BinanceError> {
        // Signed requests get a fresh timestamp on every attempt.
        let query = match auth {
            Auth::Public => build_query_string(params),
            Auth::Signed => self.signer.sign(
                params,
                self.recv_window_ms,
                chrono::Utc::now().timestamp_millis(),
            )?,
        };
        let url = if query.is_empty() {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}{path}?{query}", self.base_url)
        };

        let mut request = self.client.request(method.clone(), &url);
        if auth == Auth::Signed {
            request = request.header(API_KEY_HEADER, &self.api_key);
        }

        let response = request.send().await.map_err(classify_transport_error)?;
        let status = response.status();

        if status.is_success() {
            let text = response
                .text()
                .await
                .map_err(|e| BinanceError::Timeout(e.to_string()))?;
            return serde_json::from_str(&text).map_err(|e| BinanceError::JsonParse(e.to_string()));
        }

        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();

        Err(classify_error_response(status, &body, retry_after, params))
    }
}

/// Map a reqwest failure to "never sent" or "outcome unknown".
fn classify_transport_error(err: reqwest::Error) -> BinanceError {
    if err.is_connect() || err.is_builder() {
        BinanceError::Network(err.to_string())
    } else {
        BinanceError::Timeout(err.to_string())
    }
}

/// Map a non-2xx response to an adapter error.
fn classify_error_response(
    status: StatusCode,
    body: &str,
    retry_after: Option<u64>,
    params: &[(&str, String)],
) -> BinanceError {
    let api_error = serde_json::from_str::<BinanceErrorResponse>(body).ok();

    // Send status unknown: the exchange may still execute the request.
    if status == StatusCode::REQUEST_TIMEOUT
        || api_error
            .as_ref()
            .is_some_and(|e| e.code == CODE_BACKEND_TIMEOUT)
    {
        return BinanceError::Timeout(api_error.map_or_else(|| body.to_string(), |e| e.msg));
    }

    match status.as_u16() {
        429 | 418 => {
            return BinanceError::RateLimited {
                retry_after_secs: retry_after.unwrap_or(0),
            };
        }
        401 | 403 => {
            return BinanceError::AuthenticationFailed(
                api_error.map_or_else(|| body.to_string(), |e| e.msg),
            );
        }
        500..=599 => {
            return BinanceError::Server {
                status: status.as_u16(),
                message: api_error.map_or_else(|| body.to_string(), |e| e.msg),
            };
        }
        _ => {}
    }

    let Some(api_error) = api_error else {
        return BinanceError::Api {
            status: status.as_u16(),
            code: i64::from(status.as_u16()),
            message: body.to_string(),
        };
    };

    match api_error.code {
        CODE_INVALID_SYMBOL => BinanceError::InvalidSymbol {
            symbol: params
                .iter()
                .find(|(k, _)| *k == "symbol")
                .map(|(_, v)| v.clone())
                .unwrap_or_default(),
        },
        CODE_NO_SUCH_ORDER | CODE_UNKNOWN_ORDER => BinanceError::OrderNotFound {
            message: api_error.msg,
        },
        // Invalid API key, signature or permissions
        -1022 | -2014 | -2015 => BinanceError::AuthenticationFailed(api_error.msg),
        // Too many requests
        -1003 | -1015 => BinanceError::RateLimited {
            retry_after_secs: retry_after.unwrap_or(0),
        },
        code => BinanceError::Api {
            status: status.as_u16(),
            code,
            message: api_error.msg,
        },
    }
}

const fn is_retryable(err: &BinanceError) -> bool {
    matches!(
        err,
        BinanceError::Network(_)
            | BinanceError::Timeout(_)
            | BinanceError::Server { .. }
            | BinanceError::RateLimited { .. }
    )
}

const fn retry_reason(err: &BinanceError) -> &'static str {
    match err {
        BinanceError::Network(_) => "network",
        BinanceError::Timeout(_) => "timeout",
        BinanceError::RateLimited { .. } => "rate_limited",
        _ => "server_error",
    }
}

/// Exponential backoff calculator with jitter.
struct ExponentialBackoff {
    attempt: u32,
    max_attempts: u32,
    current_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
    jitter: f64,
}

impl ExponentialBackoff {
    const fn new(config: &RetryConfig) -> Self {
        Self {
            attempt: 1,
            max_attempts: config.max_attempts,
            current_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            multiplier: config.multiplier,
            jitter: config.jitter,
        }
    }

    /// Count an attempt without computing a delay.
    fn next_attempt(&mut self) -> Option<u32> {
        if self.attempt >= self.max_attempts {
            return None;
        }
        self.attempt += 1;
        Some(self.attempt)
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        self.next_attempt()?;

        let base = self.current_backoff;
        self.current_backoff = Duration::from_secs_f64(
            (self.current_backoff.as_secs_f64() * self.multiplier)
                .min(self.max_backoff.as_secs_f64()),
        );

        if self.jitter <= 0.0 || base.is_zero() {
            return Some(base);
        }
        let jitter = self.jitter.min(1.0);
        let factor = rand::rng().random_range((1.0 - jitter)..=(1.0 + jitter));
        Some(Duration::from_secs_f64(base.as_secs_f64() * factor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Vec<(&'static str, String)> {
        vec![("symbol", "FOOBAR".to_string())]
    }

    #[test]
    fn invalid_symbol_code_carries_symbol() {
        let err = classify_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"code":-1121,"msg":"Invalid symbol."}"#,
            None,
            &params(),
        );
        assert_eq!(
            err,
            BinanceError::InvalidSymbol {
                symbol: "FOOBAR".to_string()
            }
        );
    }

    #[test]
    fn business_rejection_keeps_code_and_message() {
        let err = classify_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"code":-4028,"msg":"Leverage 999 is not valid"}"#,
            None,
            &params(),
        );
        assert_eq!(
            err,
            BinanceError::Api {
                status: 400,
                code: -4028,
                message: "Leverage 999 is not valid".to_string()
            }
        );
    }

    #[test]
    fn auth_statuses() {
        let err = classify_error_response(
            StatusCode::UNAUTHORIZED,
            r#"{"code":-2015,"msg":"Invalid API-key, IP, or permissions for action."}"#,
            None,
            &params(),
        );
        assert!(matches!(err, BinanceError::AuthenticationFailed(_)));

        let err = classify_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"code":-1022,"msg":"Signature for this request is not valid."}"#,
            None,
            &params(),
        );
        assert!(matches!(err, BinanceError::AuthenticationFailed(_)));
    }

    #[test]
    fn rate_limit_statuses_honour_retry_after() {
        for status in [StatusCode::TOO_MANY_REQUESTS, StatusCode::IM_A_TEAPOT] {
            let err = classify_error_response(status, "", Some(7), &params());
            assert_eq!(err, BinanceError::RateLimited { retry_after_secs: 7 });
        }
    }

    #[test]
    fn server_errors() {
        let err = classify_error_response(StatusCode::BAD_GATEWAY, "<html>", None, &params());
        assert!(matches!(err, BinanceError::Server { status: 502, .. }));
        assert!(is_retryable(&err));
    }

    #[test]
    fn backend_timeout_is_outcome_unknown() {
        let body = r#"{"code":-1007,"msg":"Timeout waiting for response from backend server. Send status unknown; execution status unknown."}"#;
        for status in [StatusCode::REQUEST_TIMEOUT, StatusCode::BAD_REQUEST] {
            let err = classify_error_response(status, body, None, &params());
            assert!(matches!(err, BinanceError::Timeout(ref msg) if msg.starts_with("Timeout waiting")));
            assert!(err.outcome_unknown());
        }

        let err = classify_error_response(StatusCode::REQUEST_TIMEOUT, "", None, &params());
        assert!(err.outcome_unknown());
    }

    #[test]
    fn unknown_order_is_not_found() {
        let err = classify_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"code":-2013,"msg":"Order does not exist."}"#,
            None,
            &params(),
        );
        assert!(matches!(err, BinanceError::OrderNotFound { .. }));
    }

    #[test]
    fn backoff_without_jitter_doubles_and_caps() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(300),
            multiplier: 2.0,
            jitter: 0.0,
        };
        let mut backoff = ExponentialBackoff::new(&config);

        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(100)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(200)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(300)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(300)));
        assert_eq!(backoff.next_backoff(), None);
    }

    #[test]
    fn backoff_jitter_stays_in_band() {
        let config = RetryConfig {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: 0.2,
        };
        let mut backoff = ExponentialBackoff::new(&config);
        let delay = backoff.next_backoff().unwrap();

        assert!(delay >= Duration::from_millis(800));
        assert!(delay <= Duration::from_millis(1200));
    }

    #[test]
    fn send_once_policy_never_retries() {
        let mut backoff = ExponentialBackoff::new(&RetryConfig::no_retry());
        assert_eq!(backoff.next_backoff(), None);
    }
}
