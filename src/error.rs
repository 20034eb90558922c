use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file type: {}. Please choose a markdown file (.md, .markdown, .txt)", .0.display())]
    UnsupportedFile(PathBuf),

    #[error("Syntax highlighting failed: {0}")]
    Highlight(#[from] syntect::Error),

    #[error("Failed to serialize outline: {0}")]
    Json(#[from] serde_json::Error),
}

impl ViewerError {
    /// Classify an I/O failure on `path` the way the UI reports it
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source },
        }
    }
}

pub type Result<T, E = ViewerError> = std::result::Result<T, E>;
