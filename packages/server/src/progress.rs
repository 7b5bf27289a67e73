//! Session registry for progress reporting.
//!
//! Maps a session id to the one open progress channel for that
//! session. The hub is explicitly owned state injected into whatever
//! reports progress; it is created at server start and nothing
//! persists across restarts.
//!
//! Delivery is best-effort and at-most-once: a send onto a closed
//! channel silently drops the session, and the valuation computation
//! never waits on (or fails because of) the reporting path.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// A staged status update pushed to the client during a valuation.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub session_id: String,
    pub step: u32,
    pub total_steps: u32,
    pub percentage: f64,
    pub message: String,
}

impl ProgressEvent {
    pub fn new(session_id: &str, step: u32, total_steps: u32, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.to_string(),
            step,
            total_steps,
            percentage: 100.0 * f64::from(step) / f64::from(total_steps),
            message: message.into(),
        }
    }
}

/// Registry mapping session id -> open progress channel.
///
/// Thread-safe, cloneable. At most one channel per session id: a
/// second registration with the same id overwrites the entry
/// (last-write-wins, no multiplexing), which orphans the previous
/// receiver and ends its socket task.
#[derive(Clone)]
pub struct ProgressHub {
    sessions: Arc<RwLock<HashMap<String, mpsc::Sender<ProgressEvent>>>>,
    capacity: usize,
}

impl ProgressHub {
    /// Create a new hub with default per-session buffering (32 events).
    pub fn new() -> Self {
        Self::with_capacity(32)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Open a progress channel for a session.
    ///
    /// Returns the receiver to drain into the client connection plus a
    /// sender handle identifying the registration (used by
    /// [`ProgressHub::unregister`] so a stale connection cannot evict
    /// its replacement).
    pub async fn register(
        &self,
        session_id: &str,
    ) -> (mpsc::Sender<ProgressEvent>, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(self.capacity);
        let mut sessions = self.sessions.write().await;
        if sessions.insert(session_id.to_string(), tx.clone()).is_some() {
            debug!(session_id, "replacing existing progress channel");
        }
        (tx, rx)
    }

    /// Remove a session's channel, but only if `tx` still identifies
    /// the registered one.
    pub async fn unregister(&self, session_id: &str, tx: &mpsc::Sender<ProgressEvent>) {
        let mut sessions = self.sessions.write().await;
        let is_current = sessions
            .get(session_id)
            .is_some_and(|current| current.same_channel(tx));
        if is_current {
            sessions.remove(session_id);
        }
    }

    /// Emit one progress event to a session. No-op when the session
    /// has no channel; a closed channel drops the session entry.
    pub async fn emit(&self, event: ProgressEvent) {
        let session_id = event.session_id.clone();

        let closed = {
            let sessions = self.sessions.read().await;
            let Some(tx) = sessions.get(&session_id) else {
                return;
            };
            match tx.try_send(event) {
                Ok(()) => false,
                Err(TrySendError::Full(_)) => {
                    // Slow client: drop this event, keep the session.
                    warn!(%session_id, "progress channel full, dropping event");
                    false
                }
                Err(TrySendError::Closed(_)) => true,
            }
        };

        if closed {
            let mut sessions = self.sessions.write().await;
            // Re-check under the write lock: a new channel may have
            // been registered for this id in the meantime.
            let still_closed = sessions
                .get(&session_id)
                .is_some_and(|current| current.is_closed());
            if still_closed {
                sessions.remove(&session_id);
                warn!(%session_id, "client disconnected, dropping progress session");
            }
        }
    }

    /// Whether a session currently has a registered channel.
    pub async fn is_registered(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }
}

impl Default for ProgressHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_receive_roundtrip() {
        let hub = ProgressHub::new();
        let (_tx, mut rx) = hub.register("session-1").await;

        hub.emit(ProgressEvent::new("session-1", 1, 7, "Validating..."))
            .await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.step, 1);
        assert_eq!(event.total_steps, 7);
        assert!((event.percentage - 100.0 / 7.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_emit_without_session_is_noop() {
        let hub = ProgressHub::new();
        // Should not panic or block
        hub.emit(ProgressEvent::new("nobody", 1, 7, "dropped")).await;
    }

    #[tokio::test]
    async fn test_closed_channel_drops_session() {
        let hub = ProgressHub::new();
        let (_tx, rx) = hub.register("session-1").await;
        drop(rx);

        hub.emit(ProgressEvent::new("session-1", 1, 7, "hello")).await;

        assert!(!hub.is_registered("session-1").await);

        // Subsequent emits stay silent no-ops.
        hub.emit(ProgressEvent::new("session-1", 2, 7, "again")).await;
    }

    #[tokio::test]
    async fn test_second_registration_overwrites_first() {
        let hub = ProgressHub::new();
        let (old_tx, mut old_rx) = hub.register("session-1").await;
        let (_new_tx, mut new_rx) = hub.register("session-1").await;

        hub.emit(ProgressEvent::new("session-1", 3, 10, "fetching"))
            .await;

        assert_eq!(new_rx.recv().await.unwrap().step, 3);
        assert!(old_rx.try_recv().is_err());

        // The stale registration cannot evict its replacement.
        hub.unregister("session-1", &old_tx).await;
        assert!(hub.is_registered("session-1").await);
    }

    #[tokio::test]
    async fn test_replacement_closes_weakly_held_channel() {
        // A socket task holds only a weak identity so the hub's map
        // entry is the one strong sender.
        let hub = ProgressHub::new();
        let (old_tx, mut old_rx) = hub.register("session-1").await;
        let identity = old_tx.downgrade();
        drop(old_tx);

        let (_new_tx, _new_rx) = hub.register("session-1").await;

        // Replacing the entry dropped the old sender: the old receiver
        // sees end-of-stream and the weak identity no longer upgrades.
        assert!(old_rx.recv().await.is_none());
        assert!(identity.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_unregister_removes_current_channel() {
        let hub = ProgressHub::new();
        let (tx, _rx) = hub.register("session-1").await;

        hub.unregister("session-1", &tx).await;
        assert!(!hub.is_registered("session-1").await);
    }

    #[test]
    fn test_percentage_is_step_over_total() {
        let event = ProgressEvent::new("s", 5, 10, "halfway");
        assert!((event.percentage - 50.0).abs() < f64::EPSILON);
    }
}
