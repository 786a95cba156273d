//! # mesixserver - Serveur web haut niveau basé sur Axum
//!
//! Abstraction du serveur HTTP de Mesix : enregistrement de routes JSON,
//! de handlers à état (WebSocket de contrôle, SSE de logs) et de
//! sous-routers, démarrage sur le port configuré, arrêt propre sur Ctrl+C.
//!
//! La crate est organisée en deux modules :
//!
//! - [`server`] : le serveur et son cycle de vie
//! - [`logs`] : buffer circulaire d'entrées de log, flux SSE temps réel et
//!   changement dynamique du niveau de log
//!
//! ## Exemple
//!
//! ```rust,no_run
//! use mesixserver::Server;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut server = Server::new_configured();
//!     server.init_logging().await;
//!
//!     server.add_route("/info", || async {
//!         serde_json::json!({"status": "online"})
//!     }).await;
//!
//!     server.start().await;
//!     server.wait().await;
//! }
//! ```

pub mod logs;
pub mod server;

pub use logs::{LogState, SseLayer, log_dump, log_sse};
pub use server::{Server, ServerInfo};
