//! PlaybackController : machine à états {Idle, Playing, Paused}

use crate::hub::BroadcastHub;
use crate::model::{PlaybackPhase, StateDelta};
use crate::player::{PlayerProcess, PlayerSpawner};
use crate::{Error, Result};
use mesixstore::Track;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

struct ControllerInner {
    phase: PlaybackPhase,
    current: Option<Track>,
    player: Option<Box<dyn PlayerProcess>>,
}

/// Contrôleur de lecture
///
/// Détient au plus un processus externe à la fois. Toutes les transitions
/// passent par un unique mutex async, tenu y compris pendant les awaits de
/// terminate/spawn : l'enchaînement « arrêt avant nouveau play » est donc
/// atomique et deux processus ne peuvent jamais coexister.
///
/// Machine à états : Idle --play--> Playing ; Playing --pause--> Paused ;
/// Paused --pause--> Playing ; {Playing, Paused} --stop--> Idle ;
/// {Playing, Paused} --play--> (arrêt implicite) --> Playing.
pub struct PlaybackController {
    inner: Mutex<ControllerInner>,
    hub: Arc<BroadcastHub>,
    spawner: Arc<dyn PlayerSpawner>,
}

impl PlaybackController {
    pub fn new(hub: Arc<BroadcastHub>, spawner: Arc<dyn PlayerSpawner>) -> Self {
        Self {
            inner: Mutex::new(ControllerInner {
                phase: PlaybackPhase::Idle,
                current: None,
                player: None,
            }),
            hub,
            spawner,
        }
    }

    /// Démarre la lecture d'un morceau résolu par la bibliothèque
    ///
    /// Si un processus est déjà vivant il est d'abord arrêté (jamais deux
    /// processus en vie). En cas d'échec du spawn le contrôleur reste ou
    /// retombe en Idle et l'erreur est remontée à l'appelant.
    pub async fn play(&self, track: Track) -> Result<()> {
        let mut inner = self.inner.lock().await;

        let was_active = self.teardown_locked(&mut inner).await;

        match self.spawner.spawn(&track.path).await {
            Ok(player) => {
                inner.player = Some(player);
                inner.phase = PlaybackPhase::Playing;
                inner.current = Some(track.clone());
                info!(path=%track.path, "Playing");
                self.hub.publish(&StateDelta::now_playing(track));
                Ok(())
            }
            Err(e) => {
                warn!(path=%track.path, error=%e, "Cannot start external player");
                if was_active {
                    // Le morceau précédent a déjà été arrêté : rendre la
                    // retombée en Idle visible aux sessions
                    self.hub.publish(&StateDelta::stopped());
                }
                Err(e)
            }
        }
    }

    /// Bascule Playing <-> Paused
    ///
    /// Erreur `InvalidState` quand le contrôleur est Idle ; la couche de
    /// dispatch l'avale en no-op.
    pub async fn pause(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if !inner.phase.is_active() {
            return Err(Error::InvalidState("pause"));
        }

        let player = inner
            .player
            .as_mut()
            .ok_or(Error::InvalidState("pause"))?;
        player.send_command("pause").await?;

        inner.phase = match inner.phase {
            PlaybackPhase::Playing => PlaybackPhase::Paused,
            _ => PlaybackPhase::Playing,
        };
        self.hub
            .publish(&StateDelta::playing(inner.phase == PlaybackPhase::Playing));
        Ok(())
    }

    /// Arrête la lecture et libère le processus externe
    ///
    /// Idempotent : arrêter un contrôleur déjà Idle ne publie rien et n'est
    /// pas une erreur.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        if self.teardown_locked(&mut inner).await {
            info!("Stopped");
            self.hub.publish(&StateDelta::stopped());
        }
    }

    /// Point d'entrée de récupération quand le processus externe meurt seul
    ///
    /// Force le retour en Idle et diffuse le delta correspondant ; ce n'est
    /// pas une erreur fatale.
    pub async fn notify_process_exited(&self) {
        let mut inner = self.inner.lock().await;
        if self.teardown_locked(&mut inner).await {
            warn!("External player exited unexpectedly, back to idle");
            self.hub.publish(&StateDelta::stopped());
        }
    }

    /// Arrêt interne sous verrou ; vrai si un processus était vivant
    async fn teardown_locked(&self, inner: &mut ControllerInner) -> bool {
        let Some(player) = inner.player.take() else {
            return false;
        };
        player.terminate().await;
        inner.phase = PlaybackPhase::Idle;
        inner.current = None;
        true
    }

    /// Phase courante (pour instrumentation et tests)
    pub async fn phase(&self) -> PlaybackPhase {
        self.inner.lock().await.phase
    }
}
