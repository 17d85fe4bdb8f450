//! HMAC-SHA256 request signing.
//!
//! Signed endpoints take `timestamp` and `recvWindow` in the query string,
//! then a `signature` parameter holding the hex HMAC of everything before it.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::error::BinanceError;

type HmacSha256 = Hmac<Sha256>;

/// Signs query strings with the account's API secret.
#[derive(Clone)]
pub struct RequestSigner {
    api_secret: String,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("api_secret", &"***")
            .finish()
    }
}

impl RequestSigner {
    /// Create a signer.
    #[must_use]
    pub fn new(api_secret: impl Into<String>) -> Self {
        Self {
            api_secret: api_secret.into(),
        }
    }

    /// Compute the hex signature of `payload`.
    pub fn signature(&self, payload: &str) -> Result<String, BinanceError> {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .map_err(|e| BinanceError::AuthenticationFailed(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Append `recvWindow`, `timestamp` and `signature` to `params` and
    /// return the final query string.
    pub fn sign(
        &self,
        params: &[(&str, String)],
        recv_window_ms: u64,
        timestamp_ms: i64,
    ) -> Result<String, BinanceError> {
        let mut query = build_query_string(params);
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(&format!(
            "recvWindow={recv_window_ms}&timestamp={timestamp_ms}"
        ));
        let signature = self.signature(&query)?;
        query.push_str("&signature=");
        query.push_str(&signature);
        Ok(query)
    }
}

/// Join parameters as `k1=v1&k2=v2`, in the given order.
///
/// Values are symbols, enums, decimals and client order ids, none of which
/// need percent-encoding.
#[must_use]
pub fn build_query_string(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}
