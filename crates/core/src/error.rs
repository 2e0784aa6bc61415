//! Error types for dlk-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for dlk-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for dlk-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid remote path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid argument to an operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication or authorization failure
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Connection-level failure (retryable)
    #[error("Network error: {0}")]
    Network(String),

    /// Conflict with remote state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Remote rejection not covered by a more specific variant
    #[error("Remote error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    /// Response lacked a header the operation depends on
    #[error("Response is missing header '{0}'")]
    MissingHeader(String),

    /// Malformed property header content
    #[error("Invalid properties header: {0}")]
    InvalidProperties(String),

    /// Operation was cancelled before completion
    #[error("Operation interrupted")]
    Interrupted,

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_) | Error::InvalidArgument(_) => 2, // UsageError
            Error::Config(_) => 2,                                  // UsageError
            Error::Network(_) | Error::Remote { .. } => 3,          // NetworkError
            Error::Auth(_) => 4,                                    // AuthError
            Error::NotFound(_) => 5,                                // NotFound
            Error::Conflict(_) => 6,                                // Conflict
            Error::Interrupted => 130,                              // Interrupted
            _ => 1,                                                 // GeneralError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::InvalidPath("test".into()).exit_code(), 2);
        assert_eq!(Error::InvalidArgument("test".into()).exit_code(), 2);
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::Network("test".into()).exit_code(), 3);
        assert_eq!(
            Error::Remote {
                status: 500,
                message: "test".into()
            }
            .exit_code(),
            3
        );
        assert_eq!(Error::Auth("test".into()).exit_code(), 4);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::Conflict("test".into()).exit_code(), 6);
        assert_eq!(Error::Interrupted.exit_code(), 130);
        assert_eq!(Error::MissingHeader("x-ms-acl".into()).exit_code(), 1);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("sandbox/logs/run.txt".into());
        assert_eq!(err.to_string(), "Not found: sandbox/logs/run.txt");

        let err = Error::Remote {
            status: 412,
            message: "precondition failed".into(),
        };
        assert_eq!(
            err.to_string(),
            "Remote error (HTTP 412): precondition failed"
        );

        let err = Error::MissingHeader("x-ms-acl".into());
        assert_eq!(err.to_string(), "Response is missing header 'x-ms-acl'");
    }
}
