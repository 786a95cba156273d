//! Types d'erreurs pour mesixstore

/// Erreurs de la bibliothèque musicale
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Scan task failed: {0}")]
    ScanFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Type Result spécialisé pour mesixstore
pub type Result<T> = std::result::Result<T, Error>;
