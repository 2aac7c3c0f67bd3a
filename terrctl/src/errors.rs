//! Error types for terrctl

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// The waiting phase a timeout belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPhase {
    /// Waiting for the remote build to finish
    Deployment,

    /// Waiting for the instance to answer its health check
    Health,
}

impl fmt::Display for WaitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitPhase::Deployment => f.write_str("deployment"),
            WaitPhase::Health => f.write_str("health check"),
        }
    }
}

/// Main error type for terrctl
///
/// The variant is chosen where the failure is detected.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Timeout waiting for {phase} after {}s", limit.as_secs())]
    Timeout { phase: WaitPhase, limit: Duration },

    #[error("Deployment cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Language error: {0}")]
    Language(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeployError {
    /// Whether this is a wait timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, DeployError::Timeout { .. })
    }
}

impl From<reqwest::Error> for DeployError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DeployError::Protocol(err.to_string())
        } else {
            DeployError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DeployError {
    fn from(err: serde_json::Error) -> Self {
        DeployError::Protocol(err.to_string())
    }
}

impl From<url::ParseError> for DeployError {
    fn from(err: url::ParseError) -> Self {
        DeployError::Config(err.to_string())
    }
}
