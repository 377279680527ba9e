/*
[INPUT]:  Access tokens and their lifetimes
[OUTPUT]: Token retrieval and expiration status
[POS]:    Auth layer - in-memory token cache
[UPDATE]: When changing expiry handling or cached metadata
*/

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, PoisonError, RwLock};

/// Tokens this close to expiry are treated as expired
const EXPIRY_MARGIN_SECONDS: i64 = 60;

/// Stored token data with metadata
#[derive(Debug, Clone)]
pub struct TokenData {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Thread-safe access token cache
#[derive(Debug, Clone, Default)]
pub struct TokenCache {
    data: Arc<RwLock<Option<TokenData>>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new token with its lifetime in seconds
    pub fn set_token(&self, access_token: String, expires_in_seconds: u64) {
        let token_data = TokenData {
            access_token,
            expires_at: expiry_after(expires_in_seconds),
        };

        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(token_data);
    }

    /// The cached token unless it is missing or about to expire
    pub fn get_token(&self) -> Option<String> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|data| !expires_soon(data))
            .map(|data| data.access_token.clone())
    }

    /// Check if token is missing or about to expire
    pub fn is_expired(&self) -> bool {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().is_none_or(expires_soon)
    }

    pub fn token_data(&self) -> Option<TokenData> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    pub fn clear(&self) {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}

/// `now + seconds`, clamped to the latest representable instant
fn expiry_after(seconds: u64) -> DateTime<Utc> {
    i64::try_from(seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn expires_soon(data: &TokenData) -> bool {
    Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECONDS) >= data.expires_at
}
