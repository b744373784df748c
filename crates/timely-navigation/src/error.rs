//! Navigation error types.

/// Result type alias for navigation.
pub type Result<T> = std::result::Result<T, NavigationError>;

/// Why a navigation did not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    /// A redirect named a route that is not in the table.
    #[error("unknown route '{0}'")]
    UnknownRoute(String),

    /// Guards kept redirecting past the hop limit.
    #[error("too many redirects navigating to '{path}' ({hops} hops)")]
    RedirectLoop { path: String, hops: usize },

    /// The navigation was cancelled before it committed.
    #[error("navigation cancelled")]
    Cancelled,
}
