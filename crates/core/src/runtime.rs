//! Session runtime: a single tokio task owns the [`DeviceSession`] and
//! processes host commands and inbound reports one message at a time.
//!
//! Each message runs to completion before the next is taken, so the cache
//! and activity flag are never observed half-updated. A wake transition
//! queues a separate `Refresh` message; a failed refresh is logged and the
//! dispatcher keeps going.

use crate::cache::ColorCache;
use crate::error::{Error, Result};
use crate::session::DeviceSession;
use crate::surface::DrawProps;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info_span, warn, Instrument};

enum SessionMessage {
    Report(Vec<u8>),
    HardwareError(Error),
    Refresh,
    Init(oneshot::Sender<Result<()>>),
    Blank(oneshot::Sender<Result<()>>),
    Draw(DrawProps, oneshot::Sender<Result<()>>),
    SetBrightness(u8),
    State(oneshot::Sender<SessionState>),
    Close(oneshot::Sender<()>),
}

/// Snapshot of a session's software-side state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub active: bool,
    pub cache: ColorCache,
}

/// Feeds inbound reports and handle errors into a running session.
///
/// Holds only a weak sender: a live reader never keeps the session task
/// running once every [`SessionHandle`] is gone.
#[derive(Clone)]
pub struct ReportSink {
    tx: mpsc::WeakUnboundedSender<SessionMessage>,
}

impl ReportSink {
    fn send(&self, message: SessionMessage) -> bool {
        self.tx
            .upgrade()
            .is_some_and(|tx| tx.send(message).is_ok())
    }

    /// Queue a raw inbound report. Returns `false` once the session is gone.
    pub fn report(&self, data: Vec<u8>) -> bool {
        self.send(SessionMessage::Report(data))
    }

    /// Report a fatal error raised by the HID handle.
    pub fn hardware_error(&self, error: Error) -> bool {
        self.send(SessionMessage::HardwareError(error))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.upgrade().map_or(true, |tx| tx.is_closed())
    }
}

/// Host-side handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    surface_id: Arc<str>,
    tx: mpsc::UnboundedSender<SessionMessage>,
}

/// Move a session into its own task.
pub fn spawn_session(session: DeviceSession) -> (SessionHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let surface_id: Arc<str> = Arc::from(session.surface_id());
    let span = info_span!("instance", surface_id = %surface_id);

    let task = tokio::spawn(run(session, rx, tx.downgrade()).instrument(span));
    (SessionHandle { surface_id, tx }, task)
}

async fn run(
    mut session: DeviceSession,
    mut rx: mpsc::UnboundedReceiver<SessionMessage>,
    self_tx: mpsc::WeakUnboundedSender<SessionMessage>,
) {
    debug!("Session task started");

    while let Some(message) = rx.recv().await {
        match message {
            SessionMessage::Report(data) => {
                if session.handle_report(&data).needs_refresh() {
                    // Runs as its own step, after whatever is already queued
                    let queued = self_tx
                        .upgrade()
                        .is_some_and(|tx| tx.send(SessionMessage::Refresh).is_ok());
                    if !queued {
                        debug!("Session shutting down, refresh dropped");
                    }
                }
            }
            SessionMessage::HardwareError(e) => session.handle_hardware_error(&e),
            SessionMessage::Refresh => {
                if let Err(e) = session.refresh_panel() {
                    error!(error = %e, "Failed to refresh panel");
                }
            }
            SessionMessage::Init(reply) => {
                let _ = reply.send(session.init());
            }
            SessionMessage::Blank(reply) => {
                let _ = reply.send(session.blank());
            }
            SessionMessage::Draw(props, reply) => {
                let result = session.draw(&props.control_id, props.color.as_deref());
                let _ = reply.send(result);
            }
            SessionMessage::SetBrightness(percent) => session.set_brightness(percent),
            SessionMessage::State(reply) => {
                let _ = reply.send(SessionState {
                    active: session.is_active(),
                    cache: session.cache().clone(),
                });
            }
            SessionMessage::Close(reply) => {
                session.close();
                let _ = reply.send(());
                debug!("Session closed");
                return;
            }
        }
    }

    // Every handle dropped without an explicit close
    session.close();
    debug!("Session task finished");
}

impl SessionHandle {
    pub fn surface_id(&self) -> &str {
        &self.surface_id
    }

    /// Sink for the reader feeding this session.
    pub fn report_sink(&self) -> ReportSink {
        ReportSink {
            tx: self.tx.downgrade(),
        }
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> SessionMessage,
    ) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(message(reply))
            .map_err(|_| Error::SessionClosed)?;
        response.await.map_err(|_| Error::SessionClosed)
    }

    pub async fn init(&self) -> Result<()> {
        self.request(SessionMessage::Init).await?
    }

    pub async fn blank(&self) -> Result<()> {
        self.request(SessionMessage::Blank).await?
    }

    pub async fn draw(&self, props: DrawProps) -> Result<()> {
        self.request(|reply| SessionMessage::Draw(props, reply))
            .await?
    }

    /// Fire-and-forget; transport failures are logged by the session.
    pub fn set_brightness(&self, percent: u8) {
        if self.tx.send(SessionMessage::SetBrightness(percent)).is_err() {
            warn!(surface_id = %self.surface_id, "Brightness dropped, session closed");
        }
    }

    pub async fn state(&self) -> Result<SessionState> {
        self.request(SessionMessage::State).await
    }

    /// Blank and release the device. Never fails; a second call is a no-op.
    pub async fn close(&self) {
        if self.request(SessionMessage::Close).await.is_err() {
            debug!(surface_id = %self.surface_id, "Session already closed");
        }
    }

    pub async fn ready(&self) {
        // Nothing to do
    }

    pub fn update_capabilities(&self, _capabilities: &serde_json::Value) {
        // Not used
    }

    pub async fn show_status(&self) {
        // Not used
    }
}
