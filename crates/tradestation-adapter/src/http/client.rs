/*
[INPUT]:  HTTP configuration (environment, base URL override, timeouts)
[OUTPUT]: Configured reqwest client and endpoint URLs
[POS]:    HTTP layer - core client configuration
[UPDATE]: When adding connection options or changing client behavior
*/

use std::time::Duration;

use reqwest::header::HeaderValue;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::http::{Result, TradestationError};

/// Base URLs for the TradeStation API
const LIVE_BASE_URL: &str = "https://api.tradestation.com";
const SIM_BASE_URL: &str = "https://sim-api.tradestation.com";

/// Trading environment the client talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Live,
    Sim,
}

impl Environment {
    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Live => LIVE_BASE_URL,
            Environment::Sim => SIM_BASE_URL,
        }
    }
}

/// HTTP client configuration
///
/// `request_timeout` applies to plain REST calls only. Streaming responses stay
/// open indefinitely, so the shared client carries no overall timeout.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub environment: Environment,
    pub base_url: Option<String>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Live,
            base_url: None,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Configuration targeting the simulator environment
    pub fn sim() -> Self {
        Self {
            environment: Environment::Sim,
            ..Self::default()
        }
    }

    /// Override the API base URL (mock servers, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Resolve the API base URL, always ending in `/` so joins append
    pub fn base_url(&self) -> Result<Url> {
        let raw = self
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
            .trim();
        if raw.is_empty() {
            return Err(TradestationError::Config("base URL is empty".to_string()));
        }
        if raw.ends_with('/') {
            Ok(Url::parse(raw)?)
        } else {
            Ok(Url::parse(&format!("{raw}/"))?)
        }
    }

    /// Build the shared HTTP client
    pub fn build_http_client(&self) -> Result<Client> {
        let client = Client::builder()
            .connect_timeout(self.connect_timeout)
            .build()?;
        Ok(client)
    }
}

/// Join a relative endpoint path onto a base URL
pub(crate) fn endpoint_url(base_url: &Url, path: &str) -> Result<Url> {
    Ok(base_url.join(path.trim_start_matches('/'))?)
}

/// Join `path` onto a base URL, then append each value as one
/// percent-encoded path segment
pub(crate) fn endpoint_url_with_segments(base_url: &Url, path: &str, segments: &[&str]) -> Result<Url> {
    let mut url = endpoint_url(base_url, path)?;
    url.path_segments_mut()
        .map_err(|_| TradestationError::Config(format!("base URL {base_url} cannot take path segments")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// `Bearer <token>` header value, marked sensitive
pub(crate) fn bearer_header(token: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))?;
    value.set_sensitive(true);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_are_encoded_whole() {
        let base = ClientConfig::default().with_base_url("https://proxy.local/ts").base_url().unwrap();

        let url = endpoint_url_with_segments(&base, "v3/marketdata/stream/quotes", &["AAPL,BRK/B"]).unwrap();
        assert_eq!(url.as_str(), "https://proxy.local/ts/v3/marketdata/stream/quotes/AAPL,BRK%2FB");

        let url = endpoint_url_with_segments(&base, "v3/brokerage/accounts", &["1?x#y", "balances"]).unwrap();
        assert_eq!(url.path(), "/ts/v3/brokerage/accounts/1%3Fx%23y/balances");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_environment_base_urls() {
        assert_eq!(
            ClientConfig::default().base_url().unwrap().as_str(),
            "https://api.tradestation.com/"
        );
        assert_eq!(
            ClientConfig::sim().base_url().unwrap().as_str(),
            "https://sim-api.tradestation.com/"
        );
    }

    #[test]
    fn test_base_url_override_keeps_path_prefix() {
        let config = ClientConfig::default().with_base_url("http://127.0.0.1:8080/proxy");
        let base = config.base_url().unwrap();
        let url = endpoint_url(&base, "/v3/brokerage/accounts").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/proxy/v3/brokerage/accounts");
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let config = ClientConfig::default().with_base_url("  ");
        assert!(matches!(config.base_url(), Err(TradestationError::Config(_))));
    }

    #[test]
    fn test_bearer_header_is_sensitive() {
        let value = bearer_header("abc").unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer abc");
        assert!(value.is_sensitive());
    }
}
