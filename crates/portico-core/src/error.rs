use thiserror::Error;

/// Top-level error type for portico.
#[derive(Debug, Error)]
pub enum PorticoError {
    /// Error from the language-model provider.
    #[error("provider error: {0}")]
    Provider(String),

    /// Error from the chat platform API.
    #[error("channel error: {0}")]
    Channel(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Error from the backend store (auth or row access).
    #[error("store error: {0}")]
    Store(String),

    /// Error delivering to a downstream service.
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
