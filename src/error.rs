//! Error types surfaced by the adapter

use thiserror::Error;

/// Errors returned by adapter operations
///
/// A cache miss is not an error; lookups return `Option`.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Bad credentials or no active session
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Rejected input such as a wrong registration code or a taken username
    #[error("validation failed: {0}")]
    Validation(String),

    /// The backend answered with a non-success status, could not be reached,
    /// or sent a body that does not decode
    #[error("service unavailable: {0}")]
    RemoteUnavailable(String),

    /// The local storage medium failed
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// A value could not be encoded for storage
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AdapterError {
    pub fn is_remote_unavailable(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_))
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(e: reqwest::Error) -> Self {
        Self::RemoteUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AdapterError::Auth("wrong username or password".to_string());
        assert_eq!(
            err.to_string(),
            "authentication failed: wrong username or password"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: AdapterError = io_err.into();
        assert!(matches!(err, AdapterError::Storage(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err: AdapterError = json_err.into();
        assert!(matches!(err, AdapterError::Serialization(_)));
    }

    #[test]
    fn test_is_remote_unavailable() {
        assert!(AdapterError::RemoteUnavailable("HTTP 502".into()).is_remote_unavailable());
        assert!(!AdapterError::Validation("bad code".into()).is_remote_unavailable());
    }
}
