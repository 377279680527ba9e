/*
[INPUT]:  OAuth client credentials and a refresh token
[OUTPUT]: Cached access tokens, refreshed on demand
[POS]:    Auth layer - refresh-token grant against the TradeStation sign-in service
[UPDATE]: When the token endpoint or grant parameters change
*/

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::{TokenCache, TokenProvider};
use crate::http::{Result, TradestationError};

const SIGNIN_BASE_URL: &str = "https://signin.tradestation.com";
const TOKEN_PATH: &str = "oauth/token";
/// Lifetime assumed when the token response omits `expires_in`
const DEFAULT_EXPIRES_SECONDS: u64 = 1200;

/// Credentials for the refresh-token grant
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub refresh_token: String,
}

/// Response from the token endpoint
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Refreshes and caches access tokens.
///
/// Refreshes are serialized so concurrent streams sharing one manager do not
/// stampede the token endpoint.
#[derive(Debug)]
pub struct TokenManager {
    http: Client,
    token_url: Url,
    client_id: String,
    client_secret: Option<String>,
    refresh_token: RwLock<String>,
    cache: TokenCache,
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    pub fn new(http: Client, credentials: OAuthCredentials) -> Result<Self> {
        Self::with_signin_url(http, credentials, SIGNIN_BASE_URL)
    }

    /// Use an alternative sign-in host (mock servers)
    pub fn with_signin_url(
        http: Client,
        credentials: OAuthCredentials,
        signin_url: &str,
    ) -> Result<Self> {
        if credentials.client_id.trim().is_empty() {
            return Err(TradestationError::Config("client_id is empty".to_string()));
        }
        if credentials.refresh_token.trim().is_empty() {
            return Err(TradestationError::Config("refresh_token is empty".to_string()));
        }

        let base = Url::parse(&format!("{}/", signin_url.trim_end_matches('/')))?;
        Ok(Self {
            http,
            token_url: base.join(TOKEN_PATH)?,
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
            refresh_token: RwLock::new(credentials.refresh_token),
            cache: TokenCache::new(),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Seed the cache with an access token obtained elsewhere
    pub fn with_access_token(self, access_token: impl Into<String>, expires_in_seconds: u64) -> Self {
        self.cache.set_token(access_token.into(), expires_in_seconds);
        self
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    async fn request_token(&self) -> Result<TokenResponse> {
        let refresh_token = self
            .refresh_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut form = vec![
            ("grant_type", "refresh_token".to_string()),
            ("client_id", self.client_id.clone()),
            ("refresh_token", refresh_token),
        ];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.clone()));
        }

        let response = self.http.post(self.token_url.clone()).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %self.token_url, status = status.as_u16(), "token refresh rejected");
            return Err(TradestationError::request_failed(status, body));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl TokenProvider for TokenManager {
    async fn get_token(&self) -> Result<String> {
        if let Some(token) = self.cache.get_token() {
            return Ok(token);
        }
        debug!("cached access token missing or expiring; refreshing");
        self.refresh_token().await
    }

    async fn refresh_token(&self) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        let response = self.request_token().await?;
        let expires_in = response.expires_in.unwrap_or(DEFAULT_EXPIRES_SECONDS);

        if let Some(rotated) = response.refresh_token.filter(|token| !token.is_empty()) {
            let mut guard = self
                .refresh_token
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *guard = rotated;
        }

        self.cache.set_token(response.access_token.clone(), expires_in);
        info!(expires_in, "access token refreshed");

        Ok(response.access_token)
    }
}
