//! Types d'erreurs pour mesixcontrol

use thiserror::Error;

/// Erreurs du moteur de lecture
#[derive(Error, Debug)]
pub enum Error {
    // Le chemin demandé n'est pas dans la bibliothèque. Renvoyée à la
    // session émettrice uniquement, jamais diffusée.
    #[error("Song does not exist in database")]
    TrackUnavailable(String),

    #[error("Operation '{0}' is not valid while the player is idle")]
    InvalidState(&'static str),

    #[error("Cannot start external player: {0}")]
    SpawnFailed(String),

    #[error("External player I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

/// Type Result spécialisé pour mesixcontrol
pub type Result<T> = std::result::Result<T, Error>;
