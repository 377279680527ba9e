/*
[INPUT]:  Error sources (HTTP, API status, serialization, tokens, stream lifecycle)
[OUTPUT]: Structured error types with context and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use reqwest::header::InvalidHeaderValue;
use thiserror::Error;

/// Main error type for the TradeStation adapter
#[derive(Error, Debug)]
pub enum TradestationError {
    /// Transport-level failure (DNS, connect, reset, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Request failed (status {status}): {body}")]
    RequestFailed { status: u16, body: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Header value could not be encoded
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    /// Caller supplied arguments that cannot be sent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Token provider could not supply a token
    #[error("Token error: {0}")]
    Token(String),

    /// `start` called while a stream is already running
    #[error("Stream is already running")]
    AlreadyRunning,

    /// `start` called after `stop`; the controller cannot be restarted
    #[error("Stream was stopped and cannot be restarted")]
    StreamStopped,

    /// Consecutive authorization failures exceeded the configured bound
    #[error("Gave up after {attempts} consecutive authorization failures")]
    AuthRetriesExhausted { attempts: u32 },

    /// Consecutive reconnects without any message exceeded the configured bound
    #[error("Gave up after {attempts} consecutive reconnects without data")]
    ReconnectsExhausted { attempts: u32 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TradestationError {
    /// Create a request error from status code and response body
    pub fn request_failed(status: StatusCode, body: impl Into<String>) -> Self {
        TradestationError::RequestFailed {
            status: status.as_u16(),
            body: body.into(),
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            TradestationError::RequestFailed { status, .. } => Some(*status),
            TradestationError::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Check if error indicates authentication failure
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            TradestationError::RequestFailed { status: 401, .. }
                | TradestationError::AuthRetriesExhausted { .. }
                | TradestationError::Token(_)
        )
    }

    /// Check if the error is worth retrying by the caller
    pub fn is_retryable(&self) -> bool {
        match self {
            TradestationError::Http(err) => err.is_timeout() || err.is_connect(),
            TradestationError::RequestFailed { status, .. } => *status == 429 || *status >= 500,
            TradestationError::ReconnectsExhausted { .. } => true,
            _ => false,
        }
    }
}

/// Result type alias for TradeStation operations
pub type Result<T> = std::result::Result<T, TradestationError>;
