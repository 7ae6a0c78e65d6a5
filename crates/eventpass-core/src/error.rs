//! Error types for feed decoding, normalization and filtering.
//!
//! Every normalization failure is fatal to the fetch that produced the feed:
//! a [`Schedule`](crate::schedule::Schedule) is either fully built or not
//! built at all. Only [`ScheduleError::InvalidToken`] is something the user
//! can fix by retrying with different input.

use std::fmt;

use thiserror::Error;

/// The auxiliary entity category an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityCategory {
    Speaker,
    Room,
    Tag,
    SessionType,
}

impl EntityCategory {
    /// Returns the feed key this category is published under.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Speaker => "speakers",
            Self::Room => "rooms",
            Self::Tag => "tags",
            Self::SessionType => "session_types",
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which timestamp of a session failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampField {
    Start,
    End,
}

impl fmt::Display for TimestampField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::End => write!(f, "end"),
        }
    }
}

/// Reasons a feed is structurally unusable.
#[derive(Debug, Error)]
pub enum MalformedFeed {
    /// The document is not valid JSON or does not match the feed shape.
    #[error("invalid feed document: {0}")]
    Json(#[from] serde_json::Error),

    /// A session timestamp could not be parsed.
    #[error("session {session_id:?}: cannot parse {field} time {value:?}")]
    Timestamp {
        session_id: String,
        field: TimestampField,
        value: String,
    },

    /// A session ends before it starts.
    #[error("session {session_id:?}: ends at {end} before it starts at {start}")]
    EndBeforeStart {
        session_id: String,
        start: String,
        end: String,
    },

    /// The declared default timezone is not a known IANA identifier.
    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),
}

/// Errors produced by the schedule core.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The feed could not be turned into a schedule.
    #[error("malformed feed: {0}")]
    MalformedFeed(#[from] MalformedFeed),

    /// Two entries of the same category share an identifier.
    #[error("duplicate identifier {id:?} in {category}")]
    DuplicateIdentifier { category: EntityCategory, id: String },

    /// A filter was requested for a day the schedule does not have.
    #[error("day index {index} out of range (schedule has {days} days)")]
    DayIndexOutOfRange { index: usize, days: usize },

    /// The access token is empty or contains disallowed characters.
    #[error("invalid access token")]
    InvalidToken,

    /// A feature is declared without a base URL.
    #[error("feature {0} has no url")]
    MissingFeatureUrl(String),

    /// A base URL could not be parsed.
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl ScheduleError {
    /// Returns true if the user can recover by supplying different input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidToken)
    }
}

/// A specialized Result type for schedule operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;
