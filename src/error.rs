//! Error types for relnotes
//!
//! Lookup failures are data, not control flow: they end up in the rendered
//! document. Input and configuration errors are fatal for the run.

use std::fmt;

/// Why a single issue lookup failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    #[error("timeout")]
    Timeout,
    #[error("not-found")]
    NotFound,
    #[error("auth-error")]
    AuthError,
    #[error("malformed-response")]
    MalformedResponse,
    #[error("http-error {0}")]
    HttpStatus(u16),
    #[error("transport-error")]
    Transport,
}

impl FetchFailure {
    /// Maps a non-success HTTP status to a failure reason
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            401 | 403 => Self::AuthError,
            408 | 504 => Self::Timeout,
            other => Self::HttpStatus(other),
        }
    }

    /// True when the request never got an answer from the tracker
    pub const fn is_transport_level(&self) -> bool {
        matches!(self, Self::Timeout | Self::Transport)
    }
}

/// Errors reading or splitting the commit stream
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Separator token must not be empty")]
    EmptySeparator,
    #[error("Failed to read commit log from stdin: {0}")]
    Read(#[from] std::io::Error),
}

/// Configuration errors, always fatal
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingEnv(&'static str),
    #[error("Invalid issue tracker URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("Concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("Timeout must be at least 1 second")]
    ZeroTimeout,
}

/// A chunk of the log stream that could not be turned into a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedChunk {
    pub first_line: String,
}

impl fmt::Display for MalformedChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no commit hash in chunk starting with '{}'", self.first_line)
    }
}
