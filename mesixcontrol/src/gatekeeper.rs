//! Gatekeeper : table de dispatch fermée des opérations accessibles aux sessions

use crate::controller::PlaybackController;
use crate::Error;
use mesixstore::MediaStore;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Opérations atteignables depuis une session
///
/// Ensemble fermé : c'est l'unique frontière d'autorisation du système,
/// aucune introspection, rien d'autre n'est joignable depuis le réseau.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Play,
    Pause,
    AddFolder,
    Library,
    Filter,
}

impl Operation {
    /// Résout un nom d'opération déclaré par le client
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "play" => Some(Operation::Play),
            "pause" => Some(Operation::Pause),
            "add_folder" => Some(Operation::AddFolder),
            "library" => Some(Operation::Library),
            "filter" => Some(Operation::Filter),
            _ => None,
        }
    }
}

/// Routeur de messages entrants d'une session
///
/// Mappe un nom d'opération sur exactement une méthode autorisée du
/// contrôleur ou de la bibliothèque. Les échecs synchrones des opérations
/// cibles deviennent une payload d'erreur renvoyée à la session émettrice
/// uniquement ; ils ne sont jamais diffusés et ne tuent pas la boucle.
pub struct Gatekeeper {
    controller: Arc<PlaybackController>,
    store: Arc<MediaStore>,
}

impl Gatekeeper {
    pub fn new(controller: Arc<PlaybackController>, store: Arc<MediaStore>) -> Self {
        Self { controller, store }
    }

    /// Traite un message `{"function": ..., "args": ...}`
    ///
    /// Retourne la payload à renvoyer à la session émettrice, ou `None`
    /// quand il n'y a rien à répondre (opération inconnue, ou résultat
    /// diffusé via le hub).
    pub async fn dispatch(
        &self,
        function: &str,
        args: Option<&Map<String, Value>>,
    ) -> Option<Value> {
        let Some(operation) = Operation::from_name(function) else {
            // Réponse vide pour préserver la vivacité des clients qui
            // sondent des opérations non supportées
            debug!(function, "Ignoring unknown operation");
            return None;
        };

        match operation {
            Operation::Play => self.play(args).await,
            Operation::Pause => self.pause().await,
            Operation::AddFolder => self.add_folder(args),
            Operation::Library => Some(json!({"library": self.store.library()})),
            Operation::Filter => self.filter(args),
        }
    }

    async fn play(&self, args: Option<&Map<String, Value>>) -> Option<Value> {
        let Some(path) = args.and_then(|a| a.get("path")).and_then(Value::as_str) else {
            return Some(bad_arguments("play requires a string 'path' argument"));
        };

        let Some(track) = self.store.lookup(path) else {
            return Some(json!({"error": Error::TrackUnavailable(path.to_string()).to_string()}));
        };

        match self.controller.play(track).await {
            Ok(()) => None,
            Err(e) => {
                warn!(path, error=%e, "play failed");
                Some(json!({"message": e.to_string()}))
            }
        }
    }

    async fn pause(&self) -> Option<Value> {
        match self.controller.pause().await {
            Ok(()) => None,
            // Pause sur un contrôleur Idle : no-op silencieux
            Err(Error::InvalidState(_)) => None,
            Err(e) => {
                warn!(error=%e, "pause failed");
                Some(json!({"message": e.to_string()}))
            }
        }
    }

    fn add_folder(&self, args: Option<&Map<String, Value>>) -> Option<Value> {
        let path = match args.and_then(|a| a.get("path")) {
            None => None,
            Some(Value::String(s)) => Some(std::path::PathBuf::from(s)),
            Some(_) => {
                return Some(bad_arguments("add_folder 'path' must be a string"));
            }
        };

        // Le scan tourne en tâche de fond, la session n'attend pas
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(e) = store.add_folder(path).await {
                warn!(error=%e, "Folder scan failed");
            }
        });
        None
    }

    fn filter(&self, args: Option<&Map<String, Value>>) -> Option<Value> {
        let Some(key) = args.and_then(|a| a.get("key")).and_then(Value::as_str) else {
            return Some(bad_arguments("filter requires a string 'key' argument"));
        };

        let empty = Map::new();
        let query = match args.and_then(|a| a.get("query")) {
            None => &empty,
            Some(Value::Object(map)) => map,
            Some(_) => return Some(bad_arguments("filter 'query' must be a mapping")),
        };

        let all = match args.and_then(|a| a.get("all")) {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => return Some(bad_arguments("filter 'all' must be a boolean")),
        };

        let value = self.store.filter(key, query, all);
        Some(json!({"filter": {key: value}}))
    }
}

fn bad_arguments(description: &str) -> Value {
    json!({"message": description})
}
