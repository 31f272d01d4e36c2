use std::error::Error;
use thiserror::Error;

/// Result alias for question-set provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Error raised by question-set providers regardless of the backing source.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("question sets unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    #[error("question set catalog is malformed: {message}")]
    Malformed {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProviderError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        ProviderError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
