//! Error types for ru-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for ru-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// A required transfer parameter that was absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingParameter {
    RegionOrEndpoint,
    Bucket,
    Key,
    Acl,
}

impl std::fmt::Display for MissingParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            MissingParameter::RegionOrEndpoint => "S3 region or endpoint not provided.",
            MissingParameter::Bucket => "S3 bucket not provided.",
            MissingParameter::Key => "S3 key not provided.",
            MissingParameter::Acl => "S3 ACL not provided.",
        };
        f.write_str(msg)
    }
}

/// Error types for ru-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invocation mode other than the supported one
    #[error("Action {action} can be only run in {expected} mode, you provided: {provided}.")]
    UnsupportedMode {
        action: &'static str,
        expected: &'static str,
        provided: String,
    },

    /// A required transfer parameter is missing
    #[error("{0}")]
    MissingParameter(MissingParameter),

    /// Storage provider known not to work with the URI parser
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed object URI
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// Credential resolution failed
    #[error("Credentials error: {0}")]
    Credentials(String),

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

    /// Remote object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport failure
    #[error("Network error: {0}")]
    Network(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::MissingParameter(_)
            | Error::Config(_)
            | Error::InvalidUri(_)
            | Error::InvalidUrl(_)
            | Error::TomlParse(_) => 2, // UsageError
            Error::Network(_) => 3,        // NetworkError
            Error::Credentials(_) => 4,    // AuthError
            Error::NotFound(_) => 5,       // NotFound
            Error::UnsupportedMode { .. } | Error::UnsupportedProvider(_) => 7, // Unsupported
            _ => 1,                        // GeneralError
        }
    }
}

impl From<MissingParameter> for Error {
    fn from(missing: MissingParameter) -> Self {
        Error::MissingParameter(missing)
    }
}
