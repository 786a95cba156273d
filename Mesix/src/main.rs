use mesixcontrol::{BroadcastHub, Gatekeeper, PlaybackController, SessionContext, SlaveSpawner};
use mesixcontrol::{StateDelta, session::player_ws};
use mesixserver::Server;
use mesixstore::{MediaStore, StoreEvent};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ========== PHASE 1 : Infrastructure ==========

    let mut server = Server::new_configured();
    server.init_logging().await;

    server
        .add_route("/info", || async {
            serde_json::json!({"version": env!("CARGO_PKG_VERSION")})
        })
        .await;

    // ========== PHASE 2 : Moteur de lecture ==========

    info!("Indexing media library...");
    let store = Arc::new(MediaStore::new_configured());
    {
        // Scan initial en tâche de fond, le serveur démarre sans attendre
        let store = store.clone();
        tokio::spawn(async move {
            match store.add_folder(None).await {
                Ok(count) => info!(count, "Initial library scan complete"),
                Err(e) => warn!(error=%e, "Initial library scan failed"),
            }
        });
    }

    let hub = Arc::new(BroadcastHub::new());
    let spawner = Arc::new(SlaveSpawner::new_configured());
    let controller = Arc::new(PlaybackController::new(hub.clone(), spawner));
    let gatekeeper = Arc::new(Gatekeeper::new(controller.clone(), store.clone()));

    // Pont bibliothèque -> sessions : chaque track indexé devient un delta
    {
        let hub = hub.clone();
        let mut events = store.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(StoreEvent::TrackUpserted(track)) => {
                        hub.publish(&StateDelta::metadata(track));
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Library event stream lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    let context = SessionContext {
        hub: hub.clone(),
        gatekeeper,
    };
    server
        .add_handler_with_state("/player", player_ws, context)
        .await;

    // ========== PHASE 3 : Démarrage du serveur ==========

    info!("Starting HTTP server...");
    server.start().await;

    info!("Mesix is ready!");
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    Ok(())
}
