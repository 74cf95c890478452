//! Object operation names used in logs and errors

use std::fmt;

/// An object operation performed against the storage endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    GetStream,
    Put,
    Remove,
    Exists,
    Size,
    Url,
}

impl Operation {
    /// Name used in log lines and error messages
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::Get => "GET",
            Operation::GetStream => "GET_STREAM",
            Operation::Put => "PUT",
            Operation::Remove => "REMOVE",
            Operation::Exists => "EXISTS",
            Operation::Size => "SIZE",
            Operation::Url => "URL",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
