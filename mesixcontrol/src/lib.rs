//! # mesixcontrol - Moteur de lecture et synchronisation d'état
//!
//! Cette crate est le cœur de Mesix :
//! - **PlaybackController** : machine à états {Idle, Playing, Paused} qui
//!   pilote le processus de rendu externe
//! - **PlayerSpawner / PlayerProcess** : pilotage du processus mplayer en
//!   mode esclave (commandes texte ligne à ligne sur stdin)
//! - **BroadcastHub** : état canonique + diffusion des deltas à toutes les
//!   sessions, sans qu'une session lente ne bloque les autres
//! - **Gatekeeper** : table de dispatch fermée des opérations accessibles
//!   depuis une session
//! - **session** : endpoint WebSocket, un reader et un writer par session
//!
//! # Flux de données
//!
//! session -> gatekeeper -> controller (mutation d'état) -> hub -> toutes
//! les sessions, y compris l'émettrice.
//!
//! # Exemple
//!
//! ```no_run
//! use mesixcontrol::{BroadcastHub, Gatekeeper, PlaybackController, SlaveSpawner};
//! use mesixstore::MediaStore;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> mesixcontrol::Result<()> {
//! let hub = Arc::new(BroadcastHub::new());
//! let spawner = Arc::new(SlaveSpawner::new_configured());
//! let controller = Arc::new(PlaybackController::new(hub.clone(), spawner));
//! let store = Arc::new(MediaStore::new_configured());
//! let gatekeeper = Gatekeeper::new(controller.clone(), store);
//!
//! if let Some(track) = /* résolu par la bibliothèque */
//! #   Some(mesixstore::Track::new("/music/a.mp3"))
//! {
//!     controller.play(track).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod controller;
mod errors;
mod gatekeeper;
mod hub;
mod model;
mod player;
pub mod session;

// Réexports publics
pub use controller::PlaybackController;
pub use errors::{Error, Result};
pub use gatekeeper::{Gatekeeper, Operation};
pub use hub::{BroadcastHub, SessionId, SessionSender};
pub use model::{PlaybackPhase, PlaybackState, StateDelta};
pub use player::{PlayerProcess, PlayerSpawner, SlaveSpawner};
pub use session::SessionContext;
