//! Error types for sc-core
//!
//! One error type is shared by every crate in the workspace so that the
//! storage adapter and the CLI can classify failures without knowing which
//! backend produced them.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::operation::Operation;

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for scdn operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration (including credentials)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid composite path or object key
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The auth endpoint rejected the handshake
    #[error("Authentication error ({status}): {message}")]
    Auth { status: u16, message: String },

    /// An object request returned a status outside its expected set
    #[error("{operation} {url} failed ({status}): {message}")]
    Api {
        operation: Operation,
        url: String,
        status: u16,
        message: String,
        headers: BTreeMap<String, String>,
    },

    /// Transport-level failure (connect, timeout, broken body)
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered, but the response could not be interpreted
    #[error("Malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    /// Local I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Auth { status, .. } | Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether an object request was rejected because the token is no longer valid
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Api { status: 401, .. })
    }

    /// Whether the object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api { status: 404, .. })
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(format!("failed to parse config: {err}"))
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(format!("failed to serialize config: {err}"))
    }
}
