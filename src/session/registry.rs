use anyhow::{Context, Result};
use base64::Engine;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};

use super::events::{ClientEvent, LanguageMode, SessionEvent};
use super::session::SessionTask;
use crate::config::StreamingConfig;
use crate::transcribe::TranscriptionGateway;

/// Mailbox depth per session. Audio producers back off (await) when a
/// session falls this far behind.
const MAILBOX_CAPACITY: usize = 64;

/// Cheap handle to a running session task.
///
/// All methods feed the session's mailbox; sends to a session that already
/// shut down are silently ignored (late audio after close is not an error).
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    tx: mpsc::Sender<SessionEvent>,
    closed: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the session has finished its final flush.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Deliver raw PCM bytes to the session.
    pub async fn audio(&self, bytes: Vec<u8>) {
        let _ = self.tx.send(SessionEvent::Audio(bytes)).await;
    }

    /// Deliver a base64-encoded PCM payload, for transports that carry audio
    /// as text frames.
    pub async fn audio_base64(&self, payload: &str) -> Result<()> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .context("Invalid base64 audio payload")?;
        self.audio(bytes).await;
        Ok(())
    }

    /// Request an orderly stop: final flush, then `stopped`.
    pub async fn stop(&self) {
        let _ = self.tx.send(SessionEvent::Stop).await;
    }

    /// Connection dropped without an explicit stop; same teardown as stop.
    pub async fn disconnect(&self) {
        let _ = self.tx.send(SessionEvent::Disconnect).await;
    }
}

/// Keyed collection of live sessions, driven by connection lifecycle events.
///
/// The registry is the only structure shared across sessions; everything
/// else is owned by the per-session task.
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
    gateway: Arc<TranscriptionGateway>,
    config: Arc<StreamingConfig>,
}

impl SessionRegistry {
    pub fn new(gateway: Arc<TranscriptionGateway>, config: Arc<StreamingConfig>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            gateway,
            config,
        }
    }

    /// Create a session and spawn its task. Outbound events go to
    /// `outbound`, which the transport layer drains toward the client.
    ///
    /// A duplicate create replaces the prior session, which is shut down.
    pub async fn create(
        &self,
        id: &str,
        mode: LanguageMode,
        outbound: mpsc::Sender<ClientEvent>,
    ) -> SessionHandle {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let closed = Arc::new(AtomicBool::new(false));

        let task = SessionTask::new(
            id.to_string(),
            mode,
            outbound,
            Arc::clone(&self.gateway),
            Arc::clone(&self.config),
            Arc::clone(&closed),
        );
        tokio::spawn(task.run(rx));

        let handle = SessionHandle {
            id: id.to_string(),
            tx,
            closed,
        };

        let prior = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(id.to_string(), handle.clone())
        };

        if let Some(old) = prior {
            warn!("Replacing existing session {}", id);
            old.disconnect().await;
        }

        info!("Session {} registered", id);
        handle
    }

    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Remove and shut down a session. Removing an unknown id is a no-op.
    pub async fn remove(&self, id: &str) {
        let removed = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(id)
        };

        if let Some(handle) = removed {
            handle.disconnect().await;
            info!("Session {} removed", id);
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
