//! Error types for jotpad-core

use thiserror::Error;

/// Result type alias using jotpad-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in jotpad-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Update/delete referenced a note id that does not exist
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Remote note store or auth provider could not be reached
    #[error("Backing store unavailable: {0}")]
    BackingStoreUnavailable(String),

    /// Operation invoked without an established session mode
    #[error("Mode mismatch: {0}")]
    ModeMismatch(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Durable key-value slot could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Remote store rejected the request
    #[error("Remote API error: {0}")]
    Api(String),

    /// Authentication failed
    #[error("Authentication error: {0}")]
    Auth(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A user-facing failure message wrapping the underlying error
    #[error("{message}")]
    Operation {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap `self` with a user-facing message, keeping it as the source.
    #[must_use]
    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self::Operation {
            message: message.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error beneath any `Operation` wrappers.
    pub fn root_cause(&self) -> &Self {
        let mut current = self;
        while let Self::Operation { source, .. } = current {
            current = source;
        }
        current
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root_cause(), Self::NotFound(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self.root_cause(), Self::BackingStoreUnavailable(_))
    }
}
