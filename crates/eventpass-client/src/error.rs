//! Client error types.

use std::fmt;

use eventpass_core::{FeatureKind, ScheduleError};

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// IO error.
    Io(std::io::Error),
    /// A request or response failed.
    Fetch(String),
    /// Normalization, filtering or token validation failed.
    Schedule(ScheduleError),
    /// The event does not offer the feature.
    FeatureMissing(FeatureKind),
    /// The operation needs an access token and none was supplied.
    NotLoggedIn,
}

impl ClientError {
    /// Returns true if retrying with different user input can succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Schedule(err) => err.is_recoverable(),
            Self::NotLoggedIn => true,
            _ => false,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Fetch(msg) => write!(f, "fetch failed: {}", msg),
            Self::Schedule(err) => write!(f, "{}", err),
            Self::FeatureMissing(kind) => write!(f, "this event has no {} feature", kind),
            Self::NotLoggedIn => write!(
                f,
                "no access token (pass --token or set EVENTPASS_TOKEN)"
            ),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Schedule(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ScheduleError> for ClientError {
    fn from(err: ScheduleError) -> Self {
        Self::Schedule(err)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Fetch("request timeout".to_string())
        } else if err.is_connect() {
            Self::Fetch(format!("connection failed: {}", err))
        } else if err.is_decode() {
            Self::Fetch(format!("invalid response body: {}", err))
        } else {
            Self::Fetch(format!("request failed: {}", err))
        }
    }
}
