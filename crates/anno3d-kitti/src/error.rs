use std::path::PathBuf;

/// Error types for the KITTI module.
#[derive(Debug, thiserror::Error)]
pub enum KittiError {
    /// Error reading or writing a file.
    #[error("Failed to read or write {0}. {1}")]
    Io(PathBuf, #[source] std::io::Error),

    /// Malformed or incomplete calibration / label content.
    #[error("Parse error {0}")]
    ParseError(String),

    /// The scene description is missing required information.
    #[error("Invalid scene configuration: {0}")]
    ConfigurationError(String),

    /// Error encoding or decoding JSON.
    #[error("Invalid JSON. {0}")]
    Json(#[from] serde_json::Error),
}

impl KittiError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |e| Self::Io(path, e)
    }
}
