use thiserror::Error;

/// Errors surfaced by the editing session and its collaborators
#[derive(Debug, Error)]
pub enum EditorError {
    /// No identity, or the caller does not own the record
    #[error("Access denied: {0}")]
    Auth(String),

    /// Referenced project or object is missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Snapshot blob is corrupt or from an incompatible format
    #[error("Failed to load snapshot: {0}")]
    Deserialize(String),

    /// A plan limit was reached (project count or monthly exports)
    #[error("Plan limit reached: {0}")]
    QuotaExceeded(String),

    /// Upload, search, or transformation service failure
    #[error("External service failed: {0}")]
    ExternalService(String),

    /// The operation is not valid in the current editor state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Failed to encode export: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for EditorError {
    fn from(error: serde_json::Error) -> Self {
        EditorError::Deserialize(error.to_string())
    }
}

impl EditorError {
    /// True for errors the user should see as an upgrade prompt rather than a failure
    pub fn is_upgrade_prompt(&self) -> bool {
        matches!(self, EditorError::QuotaExceeded(_))
    }

    /// True when the user may simply try the operation again
    pub fn is_retriable(&self) -> bool {
        matches!(self, EditorError::ExternalService(_))
    }
}

/// Result type for editor operations
pub type EditorResult<T> = Result<T, EditorError>;
