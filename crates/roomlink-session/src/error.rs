//! Error types for the session layer.

/// Errors raised while obtaining or validating session keys.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The bootstrap service refused the identity/token pair.
    #[error("can't get the keys: {0}")]
    BootstrapRejected(String),

    /// The bootstrap service reported internal error step 2, which means
    /// the game is in maintenance.
    #[error("the game might be in maintenance mode")]
    Maintenance,

    /// The bootstrap service reported any other internal error step.
    #[error("bootstrap internal error at step {0}")]
    BootstrapInternal(i64),

    /// The response claimed success but the key material is unusable.
    #[error("invalid session keys: {0}")]
    InvalidKeys(String),

    /// The response body is not valid bootstrap JSON.
    #[error("malformed bootstrap response: {0}")]
    BadResponse(#[from] serde_json::Error),

    /// The bootstrap source could not be reached at all.
    #[error("bootstrap unavailable: {0}")]
    Unavailable(String),
}
