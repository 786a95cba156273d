//! Track : snapshot des métadonnées d'un fichier de la bibliothèque

use lofty::config::ParseOptions;
use lofty::prelude::*;
use lofty::probe::Probe;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

/// Un morceau de la bibliothèque
///
/// Snapshot opaque retourné par le [`MediaStore`](crate::MediaStore) : le
/// moteur de lecture n'interprète que `path`, tout le reste est diffusé tel
/// quel aux sessions connectées.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Chemin du fichier, clé primaire de la bibliothèque
    pub path: String,

    /// Titre de la piste
    pub title: Option<String>,

    /// Artiste de la piste
    pub artist: Option<String>,

    /// Album de la piste
    pub album: Option<String>,

    /// Genre musical
    pub genre: Option<String>,

    /// Durée en secondes
    pub duration: Option<u64>,

    /// Métadonnées libres supplémentaires
    #[serde(flatten, default)]
    pub extra: Map<String, Value>,
}

impl Track {
    /// Crée un track vide pour un chemin donné
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: None,
            artist: None,
            album: None,
            genre: None,
            duration: None,
            extra: Map::new(),
        }
    }

    /// Extrait les métadonnées d'un fichier audio
    ///
    /// Les fichiers illisibles ou sans tags sont quand même indexés : le nom
    /// du fichier sert alors de titre.
    pub fn from_file(path: &Path) -> Self {
        let mut track = Self::new(path.to_string_lossy());

        match Probe::open(path).and_then(|p| p.options(ParseOptions::new()).read()) {
            Ok(tagged_file) => {
                track.duration = Some(tagged_file.properties().duration().as_secs());

                if let Some(tag) = tagged_file
                    .primary_tag()
                    .or_else(|| tagged_file.first_tag())
                {
                    track.title = tag.title().map(|s| s.to_string());
                    track.artist = tag.artist().map(|s| s.to_string());
                    track.album = tag.album().map(|s| s.to_string());
                    track.genre = tag.genre().map(|s| s.to_string());
                }
            }
            Err(e) => {
                debug!(path=%path.display(), error=%e, "Cannot read audio tags");
            }
        }

        if track.title.is_none() {
            track.title = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().to_string());
        }

        track
    }

    /// Retourne la valeur d'un champ par son nom, sous forme JSON
    pub fn field(&self, key: &str) -> Option<Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.get(key).cloned(),
            _ => None,
        }
    }

    /// Vrai si le track satisfait tous les critères d'égalité de `query`
    pub fn matches(&self, query: &Map<String, Value>) -> bool {
        query
            .iter()
            .all(|(key, expected)| self.field(key).as_ref() == Some(expected))
    }
}
