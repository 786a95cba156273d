//! SessionEndpoint : handler WebSocket d'une session connectée

use crate::gatekeeper::Gatekeeper;
use crate::hub::BroadcastHub;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Etat partagé des handlers de session
#[derive(Clone)]
pub struct SessionContext {
    pub hub: Arc<BroadcastHub>,
    pub gatekeeper: Arc<Gatekeeper>,
}

/// Trame entrante d'une session
#[derive(Debug, Deserialize)]
struct Request {
    function: String,
    #[serde(default)]
    args: Option<Map<String, Value>>,
}

/// Handler WebSocket monté sur `/player`
pub async fn player_ws(
    ws: WebSocketUpgrade,
    State(ctx): State<SessionContext>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_session(socket, ctx))
}

/// Boucle d'une session : un reader, un writer, un seul écrivain par socket
///
/// Le writer draine le canal alimenté par le hub (diffusions) et par le
/// dispatch (réponses à cette session) : l'ordre relatif des deux flux est
/// préservé. Une écriture socket en échec termine le writer ; le prochain
/// publish du hub constate le canal fermé et désinscrit la session.
async fn handle_session(socket: WebSocket, ctx: SessionContext) {
    let id = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // L'inscription met l'état complet en première trame
    ctx.hub.register(id, tx.clone());
    info!(session=%id, "Session connected");

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => {
                if let Some(response) = handle_frame(&ctx, text.as_str()).await {
                    if tx.send(response).is_err() {
                        break;
                    }
                }
            }
            Message::Close(_) => break,
            // Ping/pong gérés par axum, frames binaires ignorées
            _ => {}
        }
    }

    ctx.hub.unregister(id);
    drop(tx);
    let _ = writer.await;
    info!(session=%id, "Session disconnected");
}

/// Décode une trame texte et la passe au gatekeeper
///
/// Une trame indécodable produit une trame d'erreur pour cette session
/// seulement ; la connexion reste ouverte.
async fn handle_frame(ctx: &SessionContext, text: &str) -> Option<String> {
    let request: Request = match serde_json::from_str(text) {
        Ok(request) => request,
        Err(e) => {
            debug!(error=%e, "Malformed session frame");
            return Some(json!({"message": format!("invalid request frame: {e}")}).to_string());
        }
    };

    debug!(function=%request.function, "Session request");
    ctx.gatekeeper
        .dispatch(&request.function, request.args.as_ref())
        .await
        .map(|value| value.to_string())
}
