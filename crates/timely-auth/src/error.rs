//! Error types for the session store.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while talking to the proxy, the provider or storage.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Network/HTTP error (includes timeouts).
    #[error("Network error: {0}")]
    Network(String),

    /// The proxy or provider rejected the request.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Network error for a failed `what` request, naming timeouts.
    pub(crate) fn network(what: &str, e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            AuthError::Network(format!("{} request timed out: {}", what, e))
        } else {
            AuthError::Network(format!("{} request failed: {}", what, e))
        }
    }
}
