pub mod app;
pub mod config;
pub mod core;
pub mod exchange;
pub mod models;

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network failure, timeout or a body that could not be decoded.
    Transport,
    /// Keys or signature refused while opening the session.
    Auth,
    /// The exchange answered with an error code.
    Rejected,
    /// Missing or unusable configuration, unknown symbol, unresolved account.
    Config,
    /// Bad operator input or an impossible computation.
    Invalid,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Invalid, message)
    }

    pub fn with_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Transport, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Auth, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Rejected, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Config, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
