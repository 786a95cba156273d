//! BroadcastHub : diffusion des deltas d'état à toutes les sessions

use crate::model::{PlaybackState, StateDelta};
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Identifiant d'une session connectée
pub type SessionId = Uuid;

/// Extrémité d'envoi vers l'unique writer d'une session
pub type SessionSender = mpsc::UnboundedSender<String>;

struct HubInner {
    state: PlaybackState,
    sessions: HashMap<SessionId, SessionSender>,
}

/// Hub de diffusion
///
/// Possède l'état canonique [`PlaybackState`] et l'ensemble des sessions.
/// `publish` replie le delta dans l'état puis le met en file sur le canal de
/// chaque session sous le même verrou : l'ordre des trames par destinataire
/// est donc l'ordre des publications. Les canaux sont non bloquants ; les
/// écritures socket ont lieu dans la tâche writer de chaque session, jamais
/// sous le verrou. Un envoi en échec désinscrit la session fautive sans
/// toucher aux autres.
#[derive(Default)]
pub struct BroadcastHub {
    inner: Mutex<HubInner>,
}

impl Default for HubInner {
    fn default() -> Self {
        Self {
            state: PlaybackState::default(),
            sessions: HashMap::new(),
        }
    }
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inscrit une session et lui envoie immédiatement l'état complet
    ///
    /// L'état complet (pas un simple delta) part en première trame pour que
    /// les sessions tardives soient cohérentes.
    pub fn register(&self, id: SessionId, tx: SessionSender) {
        let mut inner = self.inner.lock();
        if let Ok(frame) = serde_json::to_string(&inner.state) {
            let _ = tx.send(frame);
        }
        inner.sessions.insert(id, tx);
        debug!(session=%id, count = inner.sessions.len(), "Session registered");
    }

    /// Désinscrit une session ; idempotent, inoffensif si inconnue
    pub fn unregister(&self, id: SessionId) {
        let mut inner = self.inner.lock();
        if inner.sessions.remove(&id).is_some() {
            debug!(session=%id, count = inner.sessions.len(), "Session unregistered");
        }
    }

    /// Replie un delta dans l'état canonique puis le diffuse à tout le monde
    pub fn publish(&self, delta: &StateDelta) {
        let frame = match serde_json::to_string(delta) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error=%e, "Cannot serialize state delta");
                return;
            }
        };

        let mut inner = self.inner.lock();
        inner.state.apply(delta);
        inner.sessions.retain(|id, tx| {
            let alive = tx.send(frame.clone()).is_ok();
            if !alive {
                debug!(session=%id, "Dropping dead session");
            }
            alive
        });
    }

    /// Copie de l'état canonique
    pub fn snapshot(&self) -> PlaybackState {
        self.inner.lock().state.clone()
    }

    /// Nombre de sessions inscrites
    pub fn session_count(&self) -> usize {
        self.inner.lock().sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlaybackPhase;
    use mesixstore::Track;

    #[tokio::test]
    async fn test_register_sends_full_state_first() {
        let hub = BroadcastHub::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.register(Uuid::new_v4(), tx);

        let first = rx.recv().await.unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&first).unwrap(),
            serde_json::json!({"playing": false, "current": null})
        );
    }

    #[tokio::test]
    async fn test_publish_folds_and_fans_out() {
        let hub = BroadcastHub::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.register(Uuid::new_v4(), tx);
        let _ = rx.recv().await; // état initial

        hub.publish(&StateDelta::now_playing(Track::new("/a.mp3")));

        let frame: serde_json::Value =
            serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame["playing"], serde_json::json!(true));
        assert_eq!(frame["current"]["path"], serde_json::json!("/a.mp3"));

        let state = hub.snapshot();
        assert_eq!(state.phase, PlaybackPhase::Playing);
    }

    #[tokio::test]
    async fn test_dead_session_is_dropped_not_fatal() {
        let hub = BroadcastHub::new();

        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        let (live_tx, mut live_rx) = mpsc::unbounded_channel();
        hub.register(Uuid::new_v4(), dead_tx);
        hub.register(Uuid::new_v4(), live_tx);
        drop(dead_rx);

        hub.publish(&StateDelta::playing(false));

        assert_eq!(hub.session_count(), 1);
        let _ = live_rx.recv().await.unwrap(); // état initial
        let frame = live_rx.recv().await.unwrap();
        assert!(frame.contains("playing"));
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let hub = BroadcastHub::new();
        let id = Uuid::new_v4();
        let (tx, _rx) = mpsc::unbounded_channel();
        hub.register(id, tx);

        hub.unregister(id);
        hub.unregister(id);
        hub.unregister(Uuid::new_v4()); // jamais inscrite
        assert_eq!(hub.session_count(), 0);
    }
}
