use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Poll not found: {0}")]
    NotFound(String),

    #[error("Already voted")]
    DuplicateVote,

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Coarse error taxonomy surfaced to callers.
///
/// `InvalidOption` folds into [`ErrorKind::InvalidRequest`] at the transport
/// boundary while staying distinct inside the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    Conflict,
    Storage,
}

impl PollError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PollError::InvalidRequest(_) | PollError::InvalidOption(_) => {
                ErrorKind::InvalidRequest
            }
            PollError::NotFound(_) => ErrorKind::NotFound,
            PollError::DuplicateVote => ErrorKind::Conflict,
            PollError::Storage(_) => ErrorKind::Storage,
        }
    }
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for PollError {
    fn from(err: sqlx::Error) -> Self {
        PollError::Storage(err.to_string())
    }
}

#[cfg(feature = "database")]
impl From<sqlx::migrate::MigrateError> for PollError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        PollError::Storage(format!("Migration failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, PollError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_option_is_reported_as_invalid_request() {
        assert_eq!(
            PollError::InvalidOption("C".into()).kind(),
            ErrorKind::InvalidRequest
        );
        assert_eq!(PollError::DuplicateVote.kind(), ErrorKind::Conflict);
        assert_eq!(
            PollError::Storage("timeout".into()).kind(),
            ErrorKind::Storage
        );
    }
}
