/*
[INPUT]:  Stream requests from endpoint wrappers; stop requests from any task
[OUTPUT]: Start/stop surface over a single stream session
[POS]:    Stream layer - public lifecycle control
[UPDATE]: When changing start/stop semantics or handler defaults
*/

use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::http::{Result, TradestationError};
use crate::stream::{ConnectionState, DefaultMessageHandler, StreamRequest, StreamSession};

/// Cloneable handle that stops a running stream.
///
/// Stopping is one-way: once stopped, the owning controller cannot start again.
#[derive(Debug, Clone)]
pub struct StopHandle {
    shutdown: CancellationToken,
}

impl StopHandle {
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

/// Start/stop surface over one [`StreamSession`].
///
/// `start` completes only when the session ends, so callers that need to do
/// other work run it on its own task and keep a [`StopHandle`].
#[derive(Debug)]
pub struct StreamController {
    session: Mutex<StreamSession>,
    shutdown: CancellationToken,
    state: watch::Receiver<ConnectionState>,
}

impl StreamController {
    pub fn new(session: StreamSession) -> Self {
        let shutdown = session.shutdown_token();
        let state = session.subscribe_state();
        Self {
            session: Mutex::new(session),
            shutdown,
            state,
        }
    }

    /// Run `request` until stopped or failed.
    ///
    /// Fails fast with `AlreadyRunning` when a stream is active and with
    /// `StreamStopped` once `stop` has been called.
    pub async fn start(&self, request: StreamRequest) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(TradestationError::StreamStopped);
        }

        let mut session = self
            .session
            .try_lock()
            .map_err(|_| TradestationError::AlreadyRunning)?;

        let request = if request.has_handler() {
            request
        } else {
            request.on_message(DefaultMessageHandler)
        };

        info!(url = %request.url(), "starting stream");
        session.run(request).await
    }

    /// Fail with `StreamStopped` or `AlreadyRunning` where `start` would
    pub fn ensure_startable(&self) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(TradestationError::StreamStopped);
        }
        if self.is_running() {
            return Err(TradestationError::AlreadyRunning);
        }
        Ok(())
    }

    /// Request termination at the session's next check point
    pub fn stop(&self) {
        if !self.shutdown.is_cancelled() {
            info!("stream stop requested");
        }
        self.shutdown.cancel();
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shutdown: self.shutdown.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.try_lock().is_err()
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }
}
