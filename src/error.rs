//! Error taxonomy.
//!
//! Configuration problems ([`ConfigError`]) are deployment faults and are never
//! retried. Validation problems ([`ValidationError`]) mean the dialog file is not
//! in a state a reply can be requested for. [`BackendError`] covers everything
//! that can go wrong talking to a model provider, and [`AppendError`] wraps the
//! failures of the write-back phase.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Malformed or missing registry/default data.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} '{name}' in {} is malformed: {source}", path.display())]
    InvalidEntry {
        path: PathBuf,
        kind: &'static str,
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} '{name}' has no '{field}' field")]
    MissingField {
        kind: &'static str,
        name: String,
        field: &'static str,
    },

    #[error("default {kind} '{name}' is not present in the registry")]
    InvalidDefault { kind: &'static str, name: String },

    #[error("cannot determine provider for model '{0}'")]
    UnknownProvider(String),
}

/// Reasons a dialog document is unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("dialog file has no 'model:' line")]
    MissingModel,

    #[error("model '{0}' is not supported")]
    UnsupportedModel(String),

    #[error("dialog file has no 'behavior:' line")]
    MissingBehavior,

    #[error("behavior '{0}' is not supported")]
    UnsupportedBehavior(String),

    #[error("behavior '{0}' is missing its description or temperature")]
    CorruptBehaviorData(String),

    #[error("the last Human turn is empty or missing")]
    EmptyOrMissingFinalTurn,
}

/// Failures of the store and parse phases.
#[derive(Debug, Error)]
pub enum DialogError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl DialogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The validation failure behind this error, if that is what it is.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}

/// Failures reported by a model provider.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("authentication failed ({status}): {message}")]
    Authentication { status: StatusCode, message: String },

    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("invalid request ({status}): {message}")]
    InvalidRequest { status: StatusCode, message: String },

    #[error("HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("stream failed: {0}")]
    Stream(String),

    #[error("failed to decode stream event: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BackendError {
    /// Classify a non-success HTTP response.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status.as_u16() {
            401 | 403 => Self::Authentication { status, message },
            429 => Self::RateLimited(message),
            400..=499 => Self::InvalidRequest { status, message },
            _ => Self::Status { status, message },
        }
    }
}

/// Failures of the write-back phase.
#[derive(Debug, Error)]
pub enum AppendError {
    #[error("I/O error appending to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("backend failed mid-response: {0}")]
    Backend(#[from] BackendError),
}
