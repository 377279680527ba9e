/*
[INPUT]:  Client configuration, stream settings and a token provider
[OUTPUT]: Brokerage and market data stream handles sharing one HTTP client
[POS]:    Crate root - TradeStation client facade
[UPDATE]: When adding endpoint groups or changing shared wiring
*/

use std::fmt;
use std::sync::Arc;

use reqwest::{Client, Url};

use crate::auth::TokenProvider;
use crate::http::{Brokerage, ClientConfig, RequestExecutor, Result};
use crate::stream::{MarketDataStream, StreamConfig, StreamController, StreamSession};

/// Entry point for the TradeStation API.
///
/// Cheap to clone; every handle it creates shares the same connection pool
/// and token provider.
#[derive(Clone)]
pub struct TradestationClient {
    config: ClientConfig,
    stream_config: StreamConfig,
    base_url: Url,
    http: Client,
    tokens: Arc<dyn TokenProvider>,
    executor: RequestExecutor,
}

impl fmt::Debug for TradestationClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TradestationClient")
            .field("config", &self.config)
            .field("stream_config", &self.stream_config)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl TradestationClient {
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let base_url = config.base_url()?;
        let http = config.build_http_client()?;
        let executor = RequestExecutor::new(http.clone(), tokens.clone(), config.request_timeout);

        Ok(Self {
            config,
            stream_config: StreamConfig::default(),
            base_url,
            http,
            tokens,
            executor,
        })
    }

    /// Reconnect settings for streams created afterwards
    pub fn with_stream_config(mut self, stream_config: StreamConfig) -> Self {
        self.stream_config = stream_config;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    pub fn token_provider(&self) -> Arc<dyn TokenProvider> {
        self.tokens.clone()
    }

    pub fn brokerage(&self) -> Brokerage {
        Brokerage::new(self.executor.clone(), self.base_url.clone())
    }

    /// A fresh stream handle with its own stop signal.
    ///
    /// Stopping one handle never affects another, and a stopped handle cannot
    /// be restarted, so call this again for each new stream.
    pub fn market_data_stream(&self) -> MarketDataStream {
        let session = StreamSession::new(
            self.http.clone(),
            self.tokens.clone(),
            self.stream_config.clone(),
        );
        MarketDataStream::new(
            self.base_url.clone(),
            self.tokens.clone(),
            StreamController::new(session),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::auth::StaticTokenProvider;

    #[test]
    fn test_stream_handles_are_independent() {
        let client = TradestationClient::new(
            ClientConfig::sim(),
            Arc::new(StaticTokenProvider::new("tok")),
        )
        .unwrap();
        assert_eq!(client.base_url().as_str(), "https://sim-api.tradestation.com/");

        let first = client.market_data_stream();
        let second = client.market_data_stream();
        first.stop();

        assert!(first.controller().is_stopped());
        assert!(!second.controller().is_stopped());
    }

    #[test]
    fn test_stream_config_is_carried_into_sessions() {
        let client = TradestationClient::new(
            ClientConfig::default().with_base_url("http://127.0.0.1:8080"),
            Arc::new(StaticTokenProvider::new("tok")),
        )
        .unwrap()
        .with_stream_config(StreamConfig {
            max_reconnects: 9,
            ..StreamConfig::default()
        });

        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:8080/");
        assert!(format!("{:?}", client.market_data_stream()).contains("max_reconnects: 9"));
    }
}
