use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// Bad login.
    #[error("{0}")]
    Authentication(String),
    /// A write was attempted without a session user.
    #[error("Authentication required")]
    AuthenticationRequired,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("malformed data under key '{key}': {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification so callers need not match on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    AuthorizationRequired,
    Validation,
    NotFound,
    Storage,
}

impl TrackerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrackerError::Authentication(_) => ErrorKind::Authentication,
            TrackerError::AuthenticationRequired => ErrorKind::AuthorizationRequired,
            TrackerError::Validation(_) => ErrorKind::Validation,
            TrackerError::NotFound(_) => ErrorKind::NotFound,
            TrackerError::Storage(_)
            | TrackerError::Malformed { .. }
            | TrackerError::Serialization(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn project_not_found() -> Self {
        TrackerError::NotFound("Project not found".to_string())
    }

    pub(crate) fn issue_not_found() -> Self {
        TrackerError::NotFound("Issue not found".to_string())
    }
}
