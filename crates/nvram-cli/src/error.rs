//! Error types for nvram-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from nvram-core
    #[error(transparent)]
    Core(#[from] nvram_core::Error),

    /// Interactive prompt error
    #[error("Interactive prompt error: {0}")]
    Dialoguer(#[from] dialoguer::Error),

    /// JSON output error
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}

impl From<nvram_core::MatchError> for CliError {
    fn from(e: nvram_core::MatchError) -> Self {
        Self::Core(e.into())
    }
}

impl From<nvram_core::EditError> for CliError {
    fn from(e: nvram_core::EditError) -> Self {
        Self::Core(e.into())
    }
}

impl From<nvram_core::IoError> for CliError {
    fn from(e: nvram_core::IoError) -> Self {
        Self::Core(e.into())
    }
}
