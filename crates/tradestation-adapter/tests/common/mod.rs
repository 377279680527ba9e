/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for tradestation-adapter tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tradestation_adapter::{ClientConfig, Result, StreamConfig, TokenProvider, TradestationClient};
use wiremock::MockServer;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Token provider that hands out `initial`, then `fresh-1`, `fresh-2`, ... on refresh
#[derive(Debug, Default)]
pub struct CountingTokenProvider {
    gets: AtomicUsize,
    refreshes: AtomicUsize,
}

#[allow(dead_code)]
impl CountingTokenProvider {
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for CountingTokenProvider {
    async fn get_token(&self) -> Result<String> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok("initial".to_string())
    }

    async fn refresh_token(&self) -> Result<String> {
        let n = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("fresh-{n}"))
    }
}

/// Stream settings with short delays so reconnect tests stay fast
#[allow(dead_code)]
pub fn fast_stream_config() -> StreamConfig {
    StreamConfig {
        reconnect_delay: Duration::from_millis(20),
        ..StreamConfig::default()
    }
}

/// Client pointed at `base_url` with a fresh counting token provider
pub fn client_for(
    base_url: &str,
    stream_config: StreamConfig,
) -> (TradestationClient, Arc<CountingTokenProvider>) {
    let tokens = Arc::new(CountingTokenProvider::default());
    let client = TradestationClient::new(
        ClientConfig::default().with_base_url(base_url),
        tokens.clone(),
    )
    .expect("client builds")
    .with_stream_config(stream_config);
    (client, tokens)
}

/// Newline-delimited JSON body
#[allow(dead_code)]
pub fn ndjson(messages: &[serde_json::Value]) -> String {
    messages.iter().map(|message| format!("{message}\n")).collect()
}
