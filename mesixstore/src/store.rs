//! MediaStore : index en mémoire de la bibliothèque musicale

use crate::{Error, Result, Track};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Evènement de changement de la bibliothèque
///
/// Consommé par le hub de diffusion qui le convertit en delta
/// `{"metadata": track}` pour les sessions connectées.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// Un track a été ajouté ou mis à jour
    TrackUpserted(Track),
}

/// Index en mémoire de la bibliothèque, clé = chemin du fichier
///
/// Toutes les opérations sont thread-safe ; les scans de répertoires se font
/// sur un thread bloquant pour ne pas geler l'exécuteur.
pub struct MediaStore {
    music_path: PathBuf,
    extensions: Vec<String>,
    tracks: RwLock<HashMap<String, Track>>,
    events: broadcast::Sender<StoreEvent>,
}

impl MediaStore {
    /// Crée un store vide
    ///
    /// # Arguments
    ///
    /// * `music_path` - Répertoire scanné par défaut par [`add_folder`](Self::add_folder)
    /// * `extensions` - Extensions de fichiers reconnues (sans le point)
    pub fn new(music_path: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            music_path: music_path.into(),
            extensions: extensions.into_iter().map(|e| e.to_lowercase()).collect(),
            tracks: RwLock::new(HashMap::new()),
            events: broadcast::channel(256).0,
        }
    }

    /// Crée un store depuis la configuration globale
    pub fn new_configured() -> Self {
        let config = mesixconfig::get_config();
        Self::new(config.get_music_path(), config.get_media_extensions())
    }

    /// S'abonne aux évènements de changement de la bibliothèque
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Retrouve un morceau par son chemin
    pub fn lookup(&self, path: &str) -> Option<Track> {
        self.tracks.read().unwrap().get(path).cloned()
    }

    /// Nombre de morceaux indexés
    pub fn len(&self) -> usize {
        self.tracks.read().unwrap().len()
    }

    /// Vrai si la bibliothèque est vide
    pub fn is_empty(&self) -> bool {
        self.tracks.read().unwrap().is_empty()
    }

    /// La bibliothèque complète, triée par chemin
    pub fn library(&self) -> Vec<Track> {
        let tracks = self.tracks.read().unwrap();
        let mut all: Vec<Track> = tracks.values().cloned().collect();
        all.sort_by(|a, b| a.path.cmp(&b.path));
        all
    }

    /// Filtre la bibliothèque par critères d'égalité
    ///
    /// * `key` - Champ dont on veut les valeurs
    /// * `query` - Critères d'égalité appliqués aux tracks (vide = tous)
    /// * `all` - Si vrai, retourne les tracks complets au lieu des valeurs
    ///   uniques de `key`
    pub fn filter(&self, key: &str, query: &Map<String, Value>, all: bool) -> Value {
        let tracks = self.tracks.read().unwrap();
        let matching = tracks.values().filter(|t| t.matches(query));

        if all {
            let mut full: Vec<&Track> = matching.collect();
            full.sort_by(|a, b| a.path.cmp(&b.path));
            serde_json::to_value(full).unwrap_or(Value::Array(Vec::new()))
        } else {
            let mut values: Vec<Value> = matching.filter_map(|t| t.field(key)).collect();
            values.sort_by_key(|v| v.to_string());
            values.dedup();
            Value::Array(values)
        }
    }

    /// Insère ou remplace un morceau et notifie les abonnés
    pub fn upsert(&self, track: Track) {
        {
            let mut tracks = self.tracks.write().unwrap();
            tracks.insert(track.path.clone(), track.clone());
        }
        let _ = self.events.send(StoreEvent::TrackUpserted(track));
    }

    /// Lit les tags d'un fichier et l'indexe
    pub fn add_file(&self, path: &Path) {
        let track = Track::from_file(path);
        debug!(path=%track.path, title=?track.title, "Indexed media file");
        self.upsert(track);
    }

    /// Scanne récursivement un répertoire sur un thread bloquant
    ///
    /// Sans argument, scanne le répertoire musical configuré. Retourne le
    /// nombre de fichiers indexés.
    pub async fn add_folder(self: &Arc<Self>, path: Option<PathBuf>) -> Result<usize> {
        let folder = path.unwrap_or_else(|| self.music_path.clone());
        if !folder.is_dir() {
            return Err(Error::FolderNotFound(folder.display().to_string()));
        }

        info!(folder=%folder.display(), "Scanning media folder");
        let store = Arc::clone(self);
        let count = tokio::task::spawn_blocking(move || store.scan_folder(&folder))
            .await
            .map_err(|e| Error::ScanFailed(e.to_string()))??;

        info!(count, "Media folder scan finished");
        Ok(count)
    }

    /// Scan récursif synchrone ; les sous-répertoires illisibles sont ignorés
    fn scan_folder(&self, folder: &Path) -> Result<usize> {
        let mut count = 0;

        for entry in std::fs::read_dir(folder)?.flatten() {
            let path = entry.path();
            if path.is_dir() {
                match self.scan_folder(&path) {
                    Ok(n) => count += n,
                    Err(e) => warn!(folder=%path.display(), error=%e, "Skipping unreadable folder"),
                }
            } else if self.is_media_file(&path) {
                self.add_file(&path);
                count += 1;
            }
        }

        Ok(count)
    }

    fn is_media_file(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }
}
