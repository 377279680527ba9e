/*
[INPUT]:  Bearer tokens from whatever acquires them
[OUTPUT]: Current and force-refreshed tokens for outgoing requests
[POS]:    Auth layer - token supply contract shared by REST and streams
[UPDATE]: When the token contract changes
*/

use async_trait::async_trait;

use crate::http::{Result, TradestationError};

/// Supplies bearer tokens.
///
/// Implementations are shared across requests and streams, so both methods
/// must be safe to call concurrently.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current token, refreshing first if the cached one is unusable
    async fn get_token(&self) -> Result<String>;

    /// Force a refresh and return the new token
    async fn refresh_token(&self) -> Result<String>;
}

/// Provider for a token obtained elsewhere. Refreshing is a no-op.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> Result<String> {
        if self.token.trim().is_empty() {
            return Err(TradestationError::Token("static token is empty".to_string()));
        }
        Ok(self.token.clone())
    }

    async fn refresh_token(&self) -> Result<String> {
        self.get_token().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_returns_token() {
        let provider = StaticTokenProvider::new("tok");
        assert_eq!(provider.get_token().await.unwrap(), "tok");
        assert_eq!(provider.refresh_token().await.unwrap(), "tok");
    }

    #[tokio::test]
    async fn test_static_provider_rejects_empty_token() {
        let provider = StaticTokenProvider::new("   ");
        let err = provider.get_token().await.unwrap_err();
        assert!(err.is_auth_error());
    }
}
