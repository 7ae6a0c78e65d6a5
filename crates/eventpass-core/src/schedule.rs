//! The canonical schedule model.
//!
//! A [`Schedule`] is built once by the normalizer and never mutated
//! afterwards: fields are private and only read accessors are exposed. The
//! surrounding application replaces the whole value when a new feed arrives.
//!
//! - [`Session`]: one talk or event slot
//! - [`Day`]: sessions sharing a calendar date, grouped into [`TimeSlot`]s
//! - [`EntityMap`]: identifier-keyed speakers, rooms, tags and session types

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::time::SessionTime;

/// Display language for bilingual feed text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// Traditional Chinese.
    Zh,
    /// English, also used for any language the feed does not carry.
    #[default]
    En,
}

impl Language {
    /// Maps a BCP 47 style tag (`zh-TW`, `zh_Hant`, `en-US`, ...) to a feed
    /// language. Unknown tags fall back to the default language.
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "zh" => Self::Zh,
            _ => Self::default(),
        }
    }
}

/// A pair of values, one per feed language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Localized<T> {
    #[serde(default, alias = "zh-TW")]
    pub zh: T,
    #[serde(default, alias = "en-US")]
    pub en: T,
}

impl<T> Localized<T> {
    /// Creates a pair from both language values.
    pub fn new(zh: T, en: T) -> Self {
        Self { zh, en }
    }

    /// Returns the value for the given language.
    pub fn get(&self, language: Language) -> &T {
        match language {
            Language::Zh => &self.zh,
            Language::En => &self.en,
        }
    }

    /// Iterates over both language values.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        [&self.zh, &self.en].into_iter()
    }
}

/// Title and description of a session in one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionText {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Name and biography of a speaker in one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerText {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: String,
}

/// Name and optional description of a room, tag or session type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityText {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A speaker record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    /// Avatar image URL; may be empty.
    pub avatar: String,
    #[serde(flatten)]
    pub text: Localized<SpeakerText>,
}

impl Speaker {
    /// Returns the speaker's name in the given language.
    pub fn name(&self, language: Language) -> &str {
        &self.text.get(language).name
    }
}

/// A room, tag or session-type record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(flatten)]
    pub text: Localized<EntityText>,
}

impl Entity {
    /// Returns the entity's name in the given language.
    pub fn name(&self, language: Language) -> &str {
        &self.text.get(language).name
    }
}

/// Records indexed by identifier.
///
/// Lookups for unknown identifiers return `None`; callers display the raw
/// identifier instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityMap<T> {
    entries: BTreeMap<String, T>,
}

impl<T> Default for EntityMap<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> EntityMap<T> {
    pub(crate) fn from_entries(entries: BTreeMap<String, T>) -> Self {
        Self { entries }
    }

    /// Looks up an entry.
    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.get(id)
    }

    /// Returns true if the identifier is known.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over identifiers in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates over `(id, entry)` pairs in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }
}

/// The kind of an optional per-session resource link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Live stream.
    Live,
    /// Collaborative note document.
    Pad,
    /// Recording of the session.
    Record,
    /// Slide deck.
    Slide,
    /// Q&A board.
    Qa,
}

impl ResourceKind {
    /// Returns a human-readable label.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Live => "Live",
            Self::Pad => "Co-write",
            Self::Record => "Record",
            Self::Slide => "Slide",
            Self::Qa => "Q&A",
        }
    }
}

/// Optional resource links attached to a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pad: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qa: Option<String>,
}

impl Resources {
    /// Returns the links that are present, in display order.
    pub fn links(&self) -> Vec<(ResourceKind, &str)> {
        [
            (ResourceKind::Live, &self.live),
            (ResourceKind::Pad, &self.pad),
            (ResourceKind::Record, &self.record),
            (ResourceKind::Slide, &self.slide),
            (ResourceKind::Qa, &self.qa),
        ]
        .into_iter()
        .filter_map(|(kind, url)| url.as_deref().map(|url| (kind, url)))
        .collect()
    }
}

/// One talk or event slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub start: SessionTime,
    pub end: SessionTime,
    /// Room identifier; may not exist in the room map.
    pub room: String,
    /// Session-type identifier; may not exist in the type map.
    #[serde(rename = "type")]
    pub session_type: Option<String>,
    /// Additional rooms the session is streamed into.
    #[serde(default)]
    pub broadcast: Vec<String>,
    /// Free-form spoken language label.
    pub language: Option<String>,
    /// Speaker identifiers in feed order, duplicates preserved.
    pub speakers: Vec<String>,
    /// Tag identifiers in feed order, duplicates preserved.
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub text: Localized<SessionText>,
    #[serde(flatten)]
    pub resources: Resources,
}

impl Session {
    /// Returns the title in the given language.
    pub fn title(&self, language: Language) -> &str {
        &self.text.get(language).title
    }

    /// Returns the description in the given language.
    pub fn description(&self, language: Language) -> &str {
        &self.text.get(language).description
    }

    /// Returns the length of the session in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end.to_utc() - self.start.to_utc()).num_minutes()
    }

    /// Returns true if the session has ended at the given instant.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.end.is_at_or_before(now)
    }

    /// Returns true if the session is running at the given instant.
    pub fn is_ongoing_at(&self, now: DateTime<Utc>) -> bool {
        self.start.to_utc() <= now && now < self.end.to_utc()
    }
}

/// Sessions sharing one exact start time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    start: SessionTime,
    sessions: Vec<Session>,
}

impl TimeSlot {
    pub(crate) fn new(start: SessionTime, sessions: Vec<Session>) -> Self {
        Self { start, sessions }
    }

    /// The start time shared by every session in this slot.
    pub fn start(&self) -> SessionTime {
        self.start
    }

    /// Sessions in encounter order.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }
}

/// Sessions sharing a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Day {
    date: NaiveDate,
    slots: Vec<TimeSlot>,
}

impl Day {
    pub(crate) fn new(date: NaiveDate, slots: Vec<TimeSlot>) -> Self {
        Self { date, slots }
    }

    /// The calendar date of every session start in this day.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Time slots in ascending start order.
    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    /// Iterates over every session of the day in slot order.
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.slots.iter().flat_map(|slot| slot.sessions.iter())
    }

    /// Number of sessions in the day.
    pub fn session_count(&self) -> usize {
        self.slots.iter().map(|slot| slot.sessions.len()).sum()
    }
}

/// A normalized, immutable schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schedule {
    days: Vec<Day>,
    speakers: EntityMap<Speaker>,
    rooms: EntityMap<Entity>,
    tags: EntityMap<Entity>,
    types: EntityMap<Entity>,
}

impl Schedule {
    pub(crate) fn new(
        days: Vec<Day>,
        speakers: EntityMap<Speaker>,
        rooms: EntityMap<Entity>,
        tags: EntityMap<Entity>,
        types: EntityMap<Entity>,
    ) -> Self {
        Self {
            days,
            speakers,
            rooms,
            tags,
            types,
        }
    }

    /// Days in ascending date order.
    pub fn days(&self) -> &[Day] {
        &self.days
    }

    /// Returns the day at `index`, if any.
    pub fn day(&self, index: usize) -> Option<&Day> {
        self.days.get(index)
    }

    pub fn speakers(&self) -> &EntityMap<Speaker> {
        &self.speakers
    }

    pub fn rooms(&self) -> &EntityMap<Entity> {
        &self.rooms
    }

    pub fn tags(&self) -> &EntityMap<Entity> {
        &self.tags
    }

    pub fn types(&self) -> &EntityMap<Entity> {
        &self.types
    }

    /// Returns true if the schedule has no sessions.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Total number of sessions across all days.
    pub fn session_count(&self) -> usize {
        self.days.iter().map(Day::session_count).sum()
    }

    /// Iterates over every session in chronological order.
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.days.iter().flat_map(Day::sessions)
    }

    /// Finds a session by identifier.
    pub fn session(&self, id: &str) -> Option<&Session> {
        self.sessions().find(|session| session.id == id)
    }

    /// Returns the index of the day whose date is `today`, or 0.
    pub fn default_day_index(&self, today: NaiveDate) -> usize {
        self.days
            .iter()
            .position(|day| day.date == today)
            .unwrap_or(0)
    }

    /// Returns the room name, or the raw identifier if the room is unknown.
    pub fn room_name<'a>(&'a self, id: &'a str, language: Language) -> &'a str {
        self.rooms.get(id).map_or(id, |room| room.name(language))
    }

    /// Returns the speaker name, or the raw identifier if unknown.
    pub fn speaker_name<'a>(&'a self, id: &'a str, language: Language) -> &'a str {
        self.speakers
            .get(id)
            .map_or(id, |speaker| speaker.name(language))
    }

    /// Returns the tag name, or the raw identifier if unknown.
    pub fn tag_name<'a>(&'a self, id: &'a str, language: Language) -> &'a str {
        self.tags.get(id).map_or(id, |tag| tag.name(language))
    }

    /// Returns the session-type name, or the raw identifier if unknown.
    pub fn type_name<'a>(&'a self, id: &'a str, language: Language) -> &'a str {
        self.types.get(id).map_or(id, |kind| kind.name(language))
    }
}
