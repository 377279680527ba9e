/*
[INPUT]:  YAML configuration file, environment and CLI credential overrides
[OUTPUT]: Client configuration, stream settings and a token provider
[POS]:    Configuration layer - CLI setup
[UPDATE]: When adding new configuration options
*/

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use tradestation_adapter::{
    ClientConfig, Environment, OAuthCredentials, StaticTokenProvider, StreamConfig, TokenManager,
    TokenProvider,
};

/// Top-level configuration for the stream CLI
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CliConfig {
    /// `live` or `sim`
    #[serde(default)]
    pub environment: Environment,
    /// Overrides the environment's API host
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub stream: StreamSettings,
}

/// OAuth application credentials and tokens
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Short-lived access token; used as-is when no refresh token is configured
    #[serde(default)]
    pub access_token: Option<String>,
    /// Remaining lifetime of `access_token` when seeding a refreshing provider
    #[serde(default = "default_access_token_ttl_secs")]
    pub access_token_ttl_secs: u64,
}

/// Reconnect behavior for streams
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamSettings {
    #[serde(default = "default_max_auth_retries")]
    pub max_auth_retries: u32,
    #[serde(default = "default_max_reconnects")]
    pub max_reconnects: u32,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    #[serde(default)]
    pub detect_auth_payload: bool,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            max_auth_retries: default_max_auth_retries(),
            max_reconnects: default_max_reconnects(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            detect_auth_payload: false,
        }
    }
}

fn default_access_token_ttl_secs() -> u64 {
    1200
}

fn default_max_auth_retries() -> u32 {
    StreamConfig::default().max_auth_retries
}

fn default_max_reconnects() -> u32 {
    StreamConfig::default().max_reconnects
}

fn default_reconnect_delay_ms() -> u64 {
    StreamConfig::default().reconnect_delay.as_millis() as u64
}

/// Credential values from the environment or command line; set fields win
#[derive(Debug, Clone, Default)]
pub struct CredentialOverrides {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub access_token: Option<String>,
}

impl CliConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: CredentialOverrides) {
        let credentials = &mut self.credentials;
        if overrides.client_id.is_some() {
            credentials.client_id = overrides.client_id;
        }
        if overrides.client_secret.is_some() {
            credentials.client_secret = overrides.client_secret;
        }
        if overrides.refresh_token.is_some() {
            credentials.refresh_token = overrides.refresh_token;
        }
        if overrides.access_token.is_some() {
            credentials.access_token = overrides.access_token;
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig {
            environment: self.environment,
            ..ClientConfig::default()
        };
        match &self.base_url {
            Some(base_url) => config.with_base_url(base_url.clone()),
            None => config,
        }
    }

    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            max_auth_retries: self.stream.max_auth_retries,
            max_reconnects: self.stream.max_reconnects,
            reconnect_delay: Duration::from_millis(self.stream.reconnect_delay_ms),
            detect_auth_payload: self.stream.detect_auth_payload,
            ..StreamConfig::default()
        }
    }

    /// Refreshing provider when a refresh token is configured, else a fixed access token
    pub fn token_provider(&self) -> anyhow::Result<Arc<dyn TokenProvider>> {
        let credentials = &self.credentials;
        let access_token = non_blank(&credentials.access_token);

        if let Some(refresh_token) = non_blank(&credentials.refresh_token) {
            let client_id = non_blank(&credentials.client_id)
                .context("client_id is required when refresh_token is set")?;
            let http = self
                .client_config()
                .build_http_client()
                .context("build token http client")?;
            let oauth = OAuthCredentials {
                client_id: client_id.to_string(),
                client_secret: non_blank(&credentials.client_secret).map(str::to_string),
                refresh_token: refresh_token.to_string(),
            };

            let mut manager = TokenManager::new(http, oauth).context("create token manager")?;
            if let Some(token) = access_token {
                manager = manager.with_access_token(token, credentials.access_token_ttl_secs);
            }
            return Ok(Arc::new(manager));
        }

        match access_token {
            Some(token) => Ok(Arc::new(StaticTokenProvider::new(token))),
            None => bail!("no credentials configured: set refresh_token or access_token"),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    #[test]
    fn test_from_file_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "environment: sim\ncredentials:\n  access_token: abc\nstream:\n  reconnect_delay_ms: 250\n"
        )
        .unwrap();

        let config = CliConfig::from_file(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.environment, Environment::Sim);
        assert_eq!(
            config.client_config().base_url().unwrap().as_str(),
            "https://sim-api.tradestation.com/"
        );

        let stream = config.stream_config();
        assert_eq!(stream.reconnect_delay, Duration::from_millis(250));
        assert_eq!(stream.max_auth_retries, 3);
        assert_eq!(stream.max_reconnects, 5);
        assert!(!stream.detect_auth_payload);
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config = CliConfig::default();
        config.credentials.client_id = Some("from-file".to_string());
        config.credentials.refresh_token = Some("file-refresh".to_string());

        config.apply_overrides(CredentialOverrides {
            client_id: Some("from-env".to_string()),
            ..CredentialOverrides::default()
        });

        assert_eq!(config.credentials.client_id.as_deref(), Some("from-env"));
        assert_eq!(config.credentials.refresh_token.as_deref(), Some("file-refresh"));
    }

    #[tokio::test]
    async fn test_static_token_provider_from_access_token() {
        let mut config = CliConfig::default();
        config.credentials.access_token = Some(" tok ".to_string());

        let provider = tokio_test::assert_ok!(config.token_provider());
        assert_eq!(provider.get_token().await.unwrap(), "tok");
    }

    #[tokio::test]
    async fn test_refresh_credentials_seeded_with_access_token() {
        let mut config = CliConfig::default();
        config.credentials.client_id = Some("client".to_string());
        config.credentials.refresh_token = Some("refresh".to_string());
        config.credentials.access_token = Some("seeded".to_string());

        let provider = config.token_provider().unwrap();
        assert_eq!(provider.get_token().await.unwrap(), "seeded");
    }

    #[tokio::test]
    async fn test_oversized_access_token_ttl_is_accepted() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "credentials:\n  client_id: client\n  refresh_token: refresh\n  access_token: seeded\n  access_token_ttl_secs: 18446744073709551615\n"
        )
        .unwrap();

        let config = CliConfig::from_file(file.path().to_str().unwrap()).unwrap();
        let provider = tokio_test::assert_ok!(config.token_provider());
        assert_eq!(provider.get_token().await.unwrap(), "seeded");
    }

    #[test]
    fn test_missing_credentials_are_rejected() {
        let config = CliConfig::default();
        assert!(config.token_provider().is_err());

        let mut config = CliConfig::default();
        config.credentials.refresh_token = Some("refresh".to_string());
        let err = config.token_provider().err().unwrap();
        assert!(err.to_string().contains("client_id"));
    }
}
