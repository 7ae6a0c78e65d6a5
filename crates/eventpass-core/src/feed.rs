//! Raw schedule feed types.
//!
//! This module defines [`RawFeed`], the wire shape of a schedule document as
//! organizers publish it, before normalization. Nothing here is validated:
//! timestamps stay strings and identifiers may repeat. The
//! [normalizer](crate::normalize) turns a `RawFeed` into a
//! [`Schedule`](crate::schedule::Schedule).
//!
//! Feeds come in two shapes for their auxiliary collections (speakers, rooms,
//! tags, session types):
//! - listed: a JSON array of objects, each carrying an `id`
//! - indexed: a JSON object keyed by identifier
//!
//! Both decode into the same [`RawCollection`], which keeps every entry in
//! document order so duplicates can be reported instead of silently merged.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, DeserializeOwned, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::schedule::{EntityText, Localized, Resources, SessionText, SpeakerText};

/// The document shape an auxiliary collection was published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedShape {
    /// A list of objects carrying an `id` field.
    Listed,
    /// An object keyed by identifier.
    Indexed,
}

impl fmt::Display for FeedShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Listed => write!(f, "listed"),
            Self::Indexed => write!(f, "indexed"),
        }
    }
}

/// A top-level schedule document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFeed {
    #[serde(default)]
    pub sessions: Vec<RawSession>,
    #[serde(default)]
    pub speakers: RawCollection<RawSpeaker>,
    #[serde(default)]
    pub rooms: RawCollection<RawEntity>,
    #[serde(default)]
    pub tags: RawCollection<RawEntity>,
    #[serde(default)]
    pub session_types: RawCollection<RawEntity>,
    /// IANA timezone used for timestamps published without an offset.
    #[serde(default)]
    pub timezone: Option<String>,
}

impl RawFeed {
    /// Decodes a feed from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Returns the shape of the auxiliary collections, if any were present.
    ///
    /// Feeds are expected to use one shape throughout; the first non-empty
    /// collection decides.
    pub fn shape(&self) -> Option<FeedShape> {
        [
            self.speakers.shape(),
            self.rooms.shape(),
            self.tags.shape(),
            self.session_types.shape(),
        ]
        .into_iter()
        .flatten()
        .next()
    }
}

/// A session as published.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSession {
    pub id: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub room: String,
    #[serde(default, rename = "type")]
    pub session_type: Option<String>,
    #[serde(default)]
    pub broadcast: Option<Vec<String>>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub speakers: Vec<EntityRef>,
    #[serde(default)]
    pub tags: Vec<EntityRef>,
    #[serde(flatten)]
    pub text: Localized<SessionText>,
    #[serde(flatten)]
    pub resources: Resources,
}

/// A reference from a session to a speaker or tag.
///
/// Older feeds embed the whole record; newer ones only the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Id(String),
    Embedded { id: String },
}

impl EntityRef {
    /// Returns the referenced identifier.
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) | Self::Embedded { id } => id,
        }
    }

    pub fn into_id(self) -> String {
        match self {
            Self::Id(id) | Self::Embedded { id } => id,
        }
    }
}

/// A speaker record without its identifier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSpeaker {
    #[serde(default)]
    pub avatar: String,
    #[serde(flatten)]
    pub text: Localized<SpeakerText>,
}

/// A room, tag or session-type record without its identifier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntity {
    #[serde(flatten)]
    pub text: Localized<EntityText>,
}

/// An auxiliary collection in either feed shape.
///
/// Entries are kept in document order, duplicates included.
#[derive(Debug, Clone)]
pub struct RawCollection<T> {
    shape: Option<FeedShape>,
    entries: Vec<(String, T)>,
}

impl<T> Default for RawCollection<T> {
    fn default() -> Self {
        Self {
            shape: None,
            entries: Vec::new(),
        }
    }
}

impl<T> RawCollection<T> {
    /// Creates a listed collection from `(id, entry)` pairs.
    pub fn listed(entries: Vec<(String, T)>) -> Self {
        Self {
            shape: Some(FeedShape::Listed),
            entries,
        }
    }

    /// Returns the shape the collection was published in, or `None` if it was
    /// absent or null.
    pub fn shape(&self) -> Option<FeedShape> {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(id, entry)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(id, entry)| (id.as_str(), entry))
    }

    pub fn into_entries(self) -> Vec<(String, T)> {
        self.entries
    }
}

/// A listed entry: the record with its `id` alongside.
#[derive(Deserialize)]
struct Identified<T> {
    id: String,
    #[serde(flatten)]
    inner: T,
}

struct CollectionVisitor<T>(PhantomData<T>);

impl<'de, T> Visitor<'de> for CollectionVisitor<T>
where
    T: DeserializeOwned,
{
    type Value = RawCollection<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a list of objects with an `id` or an object keyed by id")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(RawCollection::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(RawCollection::default())
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(Identified { id, inner }) = seq.next_element::<Identified<T>>()? {
            entries.push((id, inner));
        }
        Ok(RawCollection {
            shape: Some(FeedShape::Listed),
            entries,
        })
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        // Collected as pairs rather than a map so repeated keys survive.
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((id, entry)) = map.next_entry::<String, T>()? {
            entries.push((id, entry));
        }
        Ok(RawCollection {
            shape: Some(FeedShape::Indexed),
            entries,
        })
    }
}

impl<'de, T> Deserialize<'de> for RawCollection<T>
where
    T: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(CollectionVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(json: &str) -> RawFeed {
        RawFeed::from_slice(json.as_bytes()).unwrap()
    }

    mod sessions {
        use super::*;

        #[test]
        fn full_session_decodes() {
            let f = feed(
                r#"{
                    "sessions": [{
                        "id": "S1",
                        "type": "K",
                        "room": "R0",
                        "broadcast": ["R1", "R2"],
                        "start": "2024-03-01T09:00:00+08:00",
                        "end": "2024-03-01T09:40:00+08:00",
                        "language": "漢語",
                        "zh": {"title": "開幕", "description": "歡迎"},
                        "en": {"title": "Opening", "description": "Welcome"},
                        "speakers": ["alice", "bob"],
                        "tags": ["intro"],
                        "slide": "https://slides.example/s1",
                        "qa": null
                    }]
                }"#,
            );
            let s = &f.sessions[0];
            assert_eq!(s.id, "S1");
            assert_eq!(s.session_type.as_deref(), Some("K"));
            assert_eq!(s.broadcast.as_deref(), Some(&["R1".to_string(), "R2".to_string()][..]));
            assert_eq!(s.text.en.title, "Opening");
            assert_eq!(s.text.zh.description, "歡迎");
            assert_eq!(s.resources.slide.as_deref(), Some("https://slides.example/s1"));
            assert!(s.resources.qa.is_none());
            let speakers: Vec<&str> = s.speakers.iter().map(EntityRef::id).collect();
            assert_eq!(speakers, vec!["alice", "bob"]);
        }

        #[test]
        fn optional_fields_default() {
            let f = feed(
                r#"{"sessions": [{"id": "S1", "start": "2024-03-01T09:00:00Z", "end": "2024-03-01T10:00:00Z"}]}"#,
            );
            let s = &f.sessions[0];
            assert_eq!(s.room, "");
            assert!(s.session_type.is_none());
            assert!(s.speakers.is_empty());
            assert!(s.text.zh.title.is_empty());
        }

        #[test]
        fn embedded_references_reduce_to_ids() {
            let f = feed(
                r#"{"sessions": [{
                    "id": "S1",
                    "start": "2024-03-01T09:00:00Z",
                    "end": "2024-03-01T10:00:00Z",
                    "speakers": [{"id": "alice", "avatar": "a.png"}, "bob"],
                    "tags": [{"id": "rust", "zh": {"name": "Rust"}}]
                }]}"#,
            );
            let s = &f.sessions[0];
            assert_eq!(s.speakers[0], EntityRef::Embedded { id: "alice".to_string() });
            assert_eq!(s.speakers[1], EntityRef::Id("bob".to_string()));
            assert_eq!(s.tags[0].clone().into_id(), "rust");
        }

        #[test]
        fn missing_start_is_an_error() {
            let result = RawFeed::from_slice(br#"{"sessions": [{"id": "S1", "end": "x"}]}"#);
            assert!(result.is_err());
        }
    }

    mod collections {
        use super::*;

        #[test]
        fn listed_shape() {
            let f = feed(
                r#"{"rooms": [
                    {"id": "R0", "zh": {"name": "國際會議廳"}, "en": {"name": "Main Hall"}},
                    {"id": "R1", "en": {"name": "Room 1", "description": "2F"}}
                ]}"#,
            );
            assert_eq!(f.rooms.shape(), Some(FeedShape::Listed));
            assert_eq!(f.shape(), Some(FeedShape::Listed));
            let ids: Vec<&str> = f.rooms.iter().map(|(id, _)| id).collect();
            assert_eq!(ids, vec!["R0", "R1"]);
            let (_, r1) = f.rooms.iter().nth(1).unwrap();
            assert_eq!(r1.text.en.description.as_deref(), Some("2F"));
        }

        #[test]
        fn indexed_shape() {
            let f = feed(
                r#"{"speakers": {
                    "alice": {"avatar": "a.png", "zh": {"name": "愛麗絲"}, "en": {"name": "Alice", "bio": "Rustacean"}}
                }}"#,
            );
            assert_eq!(f.speakers.shape(), Some(FeedShape::Indexed));
            let (id, alice) = f.speakers.iter().next().unwrap();
            assert_eq!(id, "alice");
            assert_eq!(alice.avatar, "a.png");
            assert_eq!(alice.text.en.bio, "Rustacean");
            assert_eq!(alice.text.zh.name, "愛麗絲");
        }

        #[test]
        fn indexed_duplicates_are_kept() {
            let f = feed(r#"{"tags": {"rust": {}, "go": {}, "rust": {}}}"#);
            let ids: Vec<&str> = f.tags.iter().map(|(id, _)| id).collect();
            assert_eq!(ids, vec!["rust", "go", "rust"]);
        }

        #[test]
        fn listed_duplicates_are_kept() {
            let f = feed(r#"{"session_types": [{"id": "K"}, {"id": "K"}]}"#);
            assert_eq!(f.session_types.len(), 2);
        }

        #[test]
        fn null_and_absent_are_empty() {
            let f = feed(r#"{"rooms": null}"#);
            assert!(f.rooms.is_empty());
            assert_eq!(f.rooms.shape(), None);
            assert_eq!(f.shape(), None);
            assert!(f.sessions.is_empty());
        }

        #[test]
        fn listed_entry_without_id_is_an_error() {
            let result = RawFeed::from_slice(br#"{"rooms": [{"en": {"name": "Hall"}}]}"#);
            assert!(result.is_err());
        }

        #[test]
        fn scalar_collection_is_an_error() {
            assert!(RawFeed::from_slice(br#"{"tags": 3}"#).is_err());
        }
    }

    #[test]
    fn declared_timezone() {
        let f = feed(r#"{"timezone": "Asia/Taipei"}"#);
        assert_eq!(f.timezone.as_deref(), Some("Asia/Taipei"));
    }
}
