use thiserror::Error;

/// Errors returned by the TFC/TFE HTTP API.
///
/// SECURITY: Error messages must NEVER contain sensitive data like API tokens.
#[derive(Debug, Error)]
pub enum TfeError {
    /// Token rejected (invalid, expired or lacking access)
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// API returned an error response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network-level error (connection failed, timeout, etc.)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("not found: {message}")]
    NotFound { message: String },

    /// Lock/unlock conflicts and similar state clashes
    #[error("conflict: {message}")]
    Conflict { message: String },
}

impl From<TfeError> for crate::workspaces::WorkspaceError {
    fn from(err: TfeError) -> Self {
        crate::workspaces::WorkspaceError::Tfe(err.to_string())
    }
}
