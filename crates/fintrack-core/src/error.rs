//! Error types for fintrack

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed user input, caught before any network call
    #[error("{0}")]
    Validation(String),

    /// No session present, or credentials rejected
    #[error("{0}")]
    Auth(String),

    /// Transport unreachable or timed out
    #[error("Server not reachable: {0}")]
    Network(String),

    /// Envelope status was not "success"
    #[error("{0}")]
    Server(String),

    /// Response body could not be decoded as the expected envelope
    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Classify this error into the client-facing taxonomy
    ///
    /// Local persistence failures (`Io`, `Config`) never come from the remote
    /// service, so they are reported as validation-side problems of this client.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) | Error::Io(_) | Error::Config(_) => ErrorKind::Validation,
            Error::Auth(_) => ErrorKind::Auth,
            Error::Network(_) => ErrorKind::Network,
            Error::Server(_) => ErrorKind::Server,
            Error::Decode(_) => ErrorKind::Decode,
        }
    }

    pub fn not_logged_in() -> Self {
        Error::Auth("Please login".to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Decode(e.to_string())
        } else {
            Error::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e.to_string())
    }
}

/// The five failure kinds a client operation can end in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Auth,
    Network,
    Server,
    Decode,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Auth => "auth",
            Self::Network => "network",
            Self::Server => "server",
            Self::Decode => "decode",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
