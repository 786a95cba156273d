//! # mesixstore - Bibliothèque musicale en mémoire
//!
//! Cette crate fournit la bibliothèque musicale de Mesix :
//! - Index en mémoire des morceaux, clé = chemin du fichier
//! - Scan récursif de répertoires avec extraction des tags (lofty)
//! - Requêtes : lookup, bibliothèque complète, filtre par champ
//! - Notifications de changement via un canal broadcast
//!
//! # Exemple
//!
//! ```no_run
//! use mesixstore::MediaStore;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> mesixstore::Result<()> {
//! let store = Arc::new(MediaStore::new("/srv/music", vec!["mp3".into(), "flac".into()]));
//!
//! // Scanner la bibliothèque (thread bloquant)
//! let count = store.add_folder(None).await?;
//! println!("{count} tracks indexed");
//!
//! // Retrouver un morceau
//! if let Some(track) = store.lookup("/srv/music/a.mp3") {
//!     println!("Found: {:?}", track.title);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod store;
mod track;

// Réexports publics
pub use error::{Error, Result};
pub use store::{MediaStore, StoreEvent};
pub use track::Track;
