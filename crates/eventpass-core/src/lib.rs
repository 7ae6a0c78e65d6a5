//! Core types: feed decoding, normalization, schedule model, filters, access

pub mod access;
pub mod error;
pub mod fastpass;
pub mod feed;
pub mod filter;
pub mod normalize;
pub mod schedule;
pub mod settings;
pub mod time;
pub mod tracing;

pub use access::{AccessToken, DEFAULT_PORTAL_URL, Endpoint, Portal, is_valid_token};
pub use error::{EntityCategory, MalformedFeed, ScheduleError, ScheduleResult, TimestampField};
pub use fastpass::{Announcement, Scenario, ScenarioState, ScenarioStatus, decode_announcements};
pub use feed::{EntityRef, FeedShape, RawCollection, RawEntity, RawFeed, RawSession, RawSpeaker};
pub use filter::{
    FavoriteSet, NoFavorites, ParseFilterError, ScheduleFilter, SlotView, apply, search,
};
pub use normalize::{NormalizeOptions, normalize, normalize_slice};
pub use schedule::{
    Day, Entity, EntityMap, EntityText, Language, Localized, ResourceKind, Resources, Schedule,
    Session, SessionText, Speaker, SpeakerText, TimeSlot,
};
pub use settings::{EventSettings, EventSummary, Feature, FeatureKind, WifiNetwork, feature};
pub use time::{SessionTime, parse_session_time};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
