//! Process exit codes
//!
//! Scripts rely on these values, so they must stay stable.

use sc_core::Error;

/// Exit status of an `scdn` invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// Bad arguments, names or configuration
    UsageError = 2,
    NetworkError = 3,
    /// Rejected credentials or token
    AuthError = 4,
    NotFound = 5,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Classify a library error
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::Config(_) | Error::InvalidPath(_) => ExitCode::UsageError,
            Error::Network(_) => ExitCode::NetworkError,
            Error::Auth { .. } | Error::Api { status: 401 | 403, .. } => ExitCode::AuthError,
            Error::Api { status: 404, .. } => ExitCode::NotFound,
            Error::Api { .. } | Error::MalformedResponse { .. } | Error::Io(_) | Error::General(_) => {
                ExitCode::GeneralError
            }
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}
