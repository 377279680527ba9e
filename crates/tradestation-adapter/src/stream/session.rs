/*
[INPUT]:  Stream request, shared token provider, stop signal
[OUTPUT]: Handler invocations per message; connection state notifications
[POS]:    Stream layer - long-lived HTTP stream with token-aware reconnect
[UPDATE]: When changing reconnect bounds, framing, or stop semantics
*/

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{AUTHORIZATION, HeaderMap};
use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::auth::TokenProvider;
use crate::http::client::bearer_header;
use crate::http::{Result, TradestationError};
use crate::stream::decoder::{DEFAULT_MAX_LINE_BYTES, DecodedLine, LineDecoder};
use crate::stream::{MessageHandler, StreamRequest};
use crate::types::StreamStatus;

const DEFAULT_MAX_AUTH_RETRIES: u32 = 3;
const DEFAULT_MAX_RECONNECTS: u32 = 5;
const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);
const PARSE_FAIL_LOG_LIMIT: u64 = 3;
const RAW_LOG_MAX_BYTES: usize = 1024;

/// Lifecycle of a stream session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Streaming,
    Reconnecting,
    Stopped,
    Failed,
}

/// Reconnect bounds and decoding limits for a stream session
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Consecutive authorization failures tolerated before giving up
    pub max_auth_retries: u32,
    /// Consecutive reconnects after a clean end of stream that delivered nothing
    pub max_reconnects: u32,
    /// Fixed pause before reconnecting after a clean end of stream
    pub reconnect_delay: Duration,
    /// Treat `{"Error": "Unauthorized" | "TokenExpired"}` messages as auth failures
    pub detect_auth_payload: bool,
    pub max_line_bytes: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_auth_retries: DEFAULT_MAX_AUTH_RETRIES,
            max_reconnects: DEFAULT_MAX_RECONNECTS,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            detect_auth_payload: false,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

/// Why a single connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitReason {
    Stopped,
    Unauthorized,
    Ended,
    GoAway,
}

#[derive(Debug, Clone, Copy)]
struct ConnectionExit {
    reason: ExitReason,
    delivered: u64,
}

impl ConnectionExit {
    fn new(reason: ExitReason, delivered: u64) -> Self {
        Self { reason, delivered }
    }
}

enum Connect {
    Opened(Response),
    Unauthorized,
    Cancelled,
}

/// Owns one streaming connection at a time and reconnects it as needed.
pub struct StreamSession {
    http: Client,
    tokens: Arc<dyn TokenProvider>,
    config: StreamConfig,
    shutdown: CancellationToken,
    state: watch::Sender<ConnectionState>,
    parse_failures: u64,
}

impl fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSession")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("stopped", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl StreamSession {
    pub fn new(http: Client, tokens: Arc<dyn TokenProvider>, config: StreamConfig) -> Self {
        let (state, _rx) = watch::channel(ConnectionState::Idle);
        Self {
            http,
            tokens,
            config,
            shutdown: CancellationToken::new(),
            state,
            parse_failures: 0,
        }
    }

    /// Use an externally owned stop signal
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Stop signal observed by the run loop
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the stream until stopped or an unrecoverable error occurs.
    ///
    /// Authorization failures refresh the token and reconnect, up to
    /// `max_auth_retries` in a row. A clean end of stream reconnects with the
    /// current headers. Transport errors and non-401 error statuses end the
    /// run.
    pub async fn run(&mut self, request: StreamRequest) -> Result<()> {
        let (url, mut headers, handler) = request.into_parts();
        let Some(mut handler) = handler else {
            return Err(TradestationError::InvalidArgument(
                "stream request has no message handler".to_string(),
            ));
        };

        let mut auth_failures: u32 = 0;
        let mut idle_reconnects: u32 = 0;

        loop {
            if self.shutdown.is_cancelled() {
                self.finish_stopped(&url);
                return Ok(());
            }

            self.set_state(ConnectionState::Connecting);
            let connected = match self.connect(&url, &headers).await {
                Ok(connected) => connected,
                Err(err) => return Err(self.fail(&url, err)),
            };

            let exit = match connected {
                Connect::Cancelled => ConnectionExit::new(ExitReason::Stopped, 0),
                Connect::Unauthorized => ConnectionExit::new(ExitReason::Unauthorized, 0),
                Connect::Opened(response) => {
                    self.set_state(ConnectionState::Streaming);
                    info!(url = %url, "stream connected");
                    match self.consume(&url, response, handler.as_mut()).await {
                        Ok(exit) => exit,
                        Err(err) => return Err(self.fail(&url, err)),
                    }
                }
            };

            if exit.delivered > 0 {
                auth_failures = 0;
                idle_reconnects = 0;
            }

            match exit.reason {
                ExitReason::Stopped => {
                    self.finish_stopped(&url);
                    return Ok(());
                }
                ExitReason::Unauthorized => {
                    auth_failures += 1;
                    if auth_failures > self.config.max_auth_retries {
                        let err = TradestationError::AuthRetriesExhausted {
                            attempts: auth_failures,
                        };
                        return Err(self.fail(&url, err));
                    }

                    self.set_state(ConnectionState::Reconnecting);
                    warn!(
                        url = %url,
                        attempt = auth_failures,
                        max_attempts = self.config.max_auth_retries,
                        "stream unauthorized; refreshing token and reconnecting"
                    );
                    let token = match self.tokens.refresh_token().await {
                        Ok(token) => token,
                        Err(err) => return Err(self.fail(&url, err)),
                    };
                    match bearer_header(&token) {
                        Ok(value) => {
                            headers.insert(AUTHORIZATION, value);
                        }
                        Err(err) => return Err(self.fail(&url, err)),
                    }
                }
                ExitReason::Ended | ExitReason::GoAway => {
                    idle_reconnects += 1;
                    if idle_reconnects > self.config.max_reconnects {
                        let err = TradestationError::ReconnectsExhausted {
                            attempts: idle_reconnects,
                        };
                        return Err(self.fail(&url, err));
                    }

                    self.set_state(ConnectionState::Reconnecting);
                    if exit.reason == ExitReason::GoAway {
                        info!(url = %url, "server requested reconnect");
                        continue;
                    }

                    warn!(
                        url = %url,
                        attempt = idle_reconnects,
                        delay_ms = self.config.reconnect_delay.as_millis() as u64,
                        "stream ended; reconnecting"
                    );
                    tokio::select! {
                        _ = self.shutdown.cancelled() => {
                            self.finish_stopped(&url);
                            return Ok(());
                        }
                        _ = tokio::time::sleep(self.config.reconnect_delay) => {}
                    }
                }
            }
        }
    }

    async fn connect(&self, url: &Url, headers: &HeaderMap) -> Result<Connect> {
        debug!(url = %url, "opening stream");
        let send = self.http.get(url.clone()).headers(headers.clone()).send();

        let response = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return Ok(Connect::Cancelled),
            response = send => response?,
        };

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(url = %url, status = status.as_u16(), "stream rejected as unauthorized");
            return Ok(Connect::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TradestationError::request_failed(status, body));
        }

        Ok(Connect::Opened(response))
    }

    async fn consume(
        &mut self,
        url: &Url,
        response: Response,
        handler: &mut dyn MessageHandler,
    ) -> Result<ConnectionExit> {
        let mut decoder = LineDecoder::with_max_line_bytes(self.config.max_line_bytes);
        let mut body = response.bytes_stream();
        let mut delivered: u64 = 0;

        loop {
            let chunk = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    return Ok(ConnectionExit::new(ExitReason::Stopped, delivered));
                }
                chunk = body.next() => chunk,
            };

            let (lines, ended) = match chunk {
                Some(Ok(bytes)) => (decoder.push(&bytes), false),
                Some(Err(err)) => return Err(err.into()),
                None => (decoder.finish(), true),
            };

            for line in lines {
                if self.shutdown.is_cancelled() {
                    return Ok(ConnectionExit::new(ExitReason::Stopped, delivered));
                }

                let message = match line {
                    DecodedLine::Message(message) => message,
                    DecodedLine::Malformed { error, raw } => {
                        self.log_parse_failure(url, &error, &raw);
                        continue;
                    }
                };

                if self.config.detect_auth_payload && is_auth_error_payload(&message) {
                    warn!(url = %url, message = %message, "auth error received in stream");
                    return Ok(ConnectionExit::new(ExitReason::Unauthorized, delivered));
                }
                if StreamStatus::from_message(&message) == Some(StreamStatus::GoAway) {
                    return Ok(ConnectionExit::new(ExitReason::GoAway, delivered));
                }

                handler.on_message(message);
                delivered += 1;
            }

            if ended {
                debug!(url = %url, delivered, "stream body ended");
                return Ok(ConnectionExit::new(ExitReason::Ended, delivered));
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    fn finish_stopped(&self, url: &Url) {
        self.set_state(ConnectionState::Stopped);
        info!(url = %url, "stream stopped");
    }

    fn fail(&self, url: &Url, err: TradestationError) -> TradestationError {
        self.set_state(ConnectionState::Failed);
        error!(url = %url, status = ?err.status(), error = %err, "stream failed");
        err
    }

    fn log_parse_failure(&mut self, url: &Url, error: &str, raw: &str) {
        self.parse_failures += 1;
        let preview = truncate_for_log(raw, RAW_LOG_MAX_BYTES);
        if self.parse_failures <= PARSE_FAIL_LOG_LIMIT {
            debug!(
                url = %url,
                sample_index = self.parse_failures,
                sample_limit = PARSE_FAIL_LOG_LIMIT,
                error,
                bytes = raw.len(),
                message = %preview,
                "stream message parse failed; skipping"
            );
        } else {
            trace!(url = %url, error, message = %preview, "stream message parse failed; skipping");
        }
    }
}

/// In-stream authorization error, e.g. `{"Error": "Unauthorized", ...}`
fn is_auth_error_payload(message: &Value) -> bool {
    message
        .get("Error")
        .and_then(Value::as_str)
        .is_some_and(|error| {
            error.eq_ignore_ascii_case("unauthorized") || error.eq_ignore_ascii_case("tokenexpired")
        })
}

fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut cut = max_len;
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = String::with_capacity(cut + 3);
    out.push_str(&value[..cut]);
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::auth::StaticTokenProvider;

    #[test]
    fn test_auth_error_payload_detection() {
        assert!(is_auth_error_payload(&serde_json::json!({"Error": "Unauthorized"})));
        assert!(is_auth_error_payload(&serde_json::json!({"Error": "TOKENEXPIRED", "Message": "x"})));
        assert!(!is_auth_error_payload(&serde_json::json!({"Error": "BadSymbol"})));
        assert!(!is_auth_error_payload(&serde_json::json!({"Symbol": "AAPL"})));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        assert_eq!(truncate_for_log("short", 10), "short");
        assert_eq!(truncate_for_log("abcdef", 3), "abc...");
        assert_eq!(truncate_for_log("ééé", 3), "é...");
    }

    #[tokio::test]
    async fn test_new_session_is_idle() {
        let session = StreamSession::new(
            Client::new(),
            Arc::new(StaticTokenProvider::new("tok")),
            StreamConfig::default(),
        );
        assert_eq!(session.state(), ConnectionState::Idle);
        assert_eq!(session.config().max_auth_retries, 3);
    }

    #[tokio::test]
    async fn test_run_without_handler_is_rejected() {
        let mut session = StreamSession::new(
            Client::new(),
            Arc::new(StaticTokenProvider::new("tok")),
            StreamConfig::default(),
        );
        let request = StreamRequest::new(Url::parse("http://127.0.0.1:9/").unwrap());

        let err = session.run(request).await.unwrap_err();
        assert!(matches!(err, TradestationError::InvalidArgument(_)));
        assert_eq!(session.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn test_run_after_stop_returns_immediately() {
        let mut session = StreamSession::new(
            Client::new(),
            Arc::new(StaticTokenProvider::new("tok")),
            StreamConfig::default(),
        );
        session.shutdown_token().cancel();

        let request = StreamRequest::new(Url::parse("http://127.0.0.1:9/").unwrap())
            .on_message(|_msg: Value| {});
        session.run(request).await.unwrap();
        assert_eq!(session.state(), ConnectionState::Stopped);
    }
}
