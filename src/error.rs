use thiserror::Error;

/// Failure reaching one of the guard's collaborators.
///
/// Negative verdicts (no session, unverified email, missing role) are not
/// errors; only transport, decoding and storage failures end up here.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{url} - {status}, {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },
    #[error("invalid json: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid url: {0}")]
    Url(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
}

/// Misuse of an [`AccessGuard`](crate::guard::AccessGuard).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuardError {
    /// Another activation of the same guard still holds the subscription.
    #[error("guard is already active")]
    AlreadyActive,
}

impl StoreError {
    /// Returns the HTTP status for backend rejections.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StoreError;

    #[test]
    fn status_error_formats_like_backend_errors() {
        let err = StoreError::Status {
            url: "https://api.terraguard.dev/rest/v1/user_roles".to_string(),
            status: 503,
            message: "upstream unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "https://api.terraguard.dev/rest/v1/user_roles - 503, upstream unavailable"
        );
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn non_status_errors_have_no_status() {
        let err = StoreError::Unavailable("role store offline".to_string());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "unavailable: role store offline");
    }
}
