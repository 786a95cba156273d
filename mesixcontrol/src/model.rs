//! Modèle d'état de lecture : phase, état canonique et deltas diffusés

use mesixstore::Track;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Phase du contrôleur de lecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Playing,
    Paused,
}

impl PlaybackPhase {
    /// Vrai quand un processus externe est censé être vivant
    pub fn is_active(&self) -> bool {
        !matches!(self, PlaybackPhase::Idle)
    }
}

/// Etat canonique de lecture, unique dans tout le processus
///
/// Invariant : `current` est `None` si et seulement si `phase == Idle`.
///
/// Sérialisé sur le fil comme `{"playing": bool, "current": Track|null}` ;
/// `playing` ne vaut `true` que pendant la phase `Playing`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    pub phase: PlaybackPhase,
    pub current: Option<Track>,
}

impl PlaybackState {
    /// Applique un delta ; replier tous les deltas publiés dans l'ordre
    /// reproduit l'état canonique.
    pub fn apply(&mut self, delta: &StateDelta) {
        match &delta.current {
            Some(Some(track)) => self.current = Some(track.clone()),
            Some(None) => {
                self.current = None;
                self.phase = PlaybackPhase::Idle;
            }
            None => {}
        }

        match delta.playing {
            Some(true) => self.phase = PlaybackPhase::Playing,
            Some(false) => {
                self.phase = if self.current.is_some() {
                    PlaybackPhase::Paused
                } else {
                    PlaybackPhase::Idle
                };
            }
            None => {}
        }
        // delta.metadata est une notification bibliothèque, pas un champ d'état
    }
}

impl Serialize for PlaybackState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("playing", &matches!(self.phase, PlaybackPhase::Playing))?;
        map.serialize_entry("current", &self.current)?;
        map.end()
    }
}

/// Patch partiel de l'état, diffusé tel quel à toutes les sessions
///
/// Seuls les champs présents sont sérialisés ; `current: Some(None)` produit
/// un `"current": null` explicite.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StateDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playing: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<Option<Track>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Track>,
}

impl StateDelta {
    /// Delta émis quand un nouveau morceau démarre
    pub fn now_playing(track: Track) -> Self {
        Self {
            playing: Some(true),
            current: Some(Some(track)),
            metadata: None,
        }
    }

    /// Delta émis par pause/reprise
    pub fn playing(playing: bool) -> Self {
        Self {
            playing: Some(playing),
            current: None,
            metadata: None,
        }
    }

    /// Delta émis par un arrêt (explicite ou sur mort du processus)
    pub fn stopped() -> Self {
        Self {
            playing: Some(false),
            current: Some(None),
            metadata: None,
        }
    }

    /// Delta émis quand la bibliothèque change
    pub fn metadata(track: Track) -> Self {
        Self {
            playing: None,
            current: None,
            metadata: Some(track),
        }
    }
}
