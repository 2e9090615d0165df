use std::fmt;
use std::io;

/// Unified error type for rendering and sanitisation
#[derive(Debug)]
pub enum Error {
    /// I/O error while draining a rendered buffer into a sink
    Io(io::Error),

    /// Content matched a disallowed pattern
    Rejected(String),

    /// Sanitisation was asked to inspect an absent node
    NilComponent,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Rejected(reason) => write!(f, "content contains disallowed pattern: {}", reason),
            Error::NilComponent => write!(f, "component is nil"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

/// Result type alias for fluent operations
pub type Result<T> = std::result::Result<T, Error>;
