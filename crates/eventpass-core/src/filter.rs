//! Per-day schedule filtering and free-text search.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{ScheduleError, ScheduleResult};
use crate::schedule::{Language, Schedule, Session};
use crate::time::SessionTime;

/// A predicate selecting sessions within one day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ScheduleFilter {
    /// Every session.
    #[default]
    All,
    /// Sessions in the attendee's favorite set.
    Favorites,
    /// Sessions carrying the tag.
    Tag(String),
    /// Sessions of the session type.
    Type(String),
    /// Sessions held in the room.
    Room(String),
    /// Sessions given by the speaker.
    Speaker(String),
}

impl ScheduleFilter {
    /// Returns true if the session passes this filter.
    pub fn matches<F>(&self, session: &Session, favorites: &F) -> bool
    where
        F: FavoriteSet + ?Sized,
    {
        match self {
            Self::All => true,
            Self::Favorites => favorites.contains_session(&session.id),
            Self::Tag(id) => session.tags.iter().any(|tag| tag == id),
            Self::Type(id) => session.session_type.as_deref() == Some(id.as_str()),
            Self::Room(id) => session.room == *id,
            Self::Speaker(id) => session.speakers.iter().any(|speaker| speaker == id),
        }
    }
}

impl fmt::Display for ScheduleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Favorites => write!(f, "favorites"),
            Self::Tag(id) => write!(f, "tag:{}", id),
            Self::Type(id) => write!(f, "type:{}", id),
            Self::Room(id) => write!(f, "room:{}", id),
            Self::Speaker(id) => write!(f, "speaker:{}", id),
        }
    }
}

/// Error returned when a filter string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFilterError {
    #[error("unknown filter {0:?} (expected all, favorites, tag:ID, type:ID, room:ID or speaker:ID)")]
    Unknown(String),
    #[error("filter {0:?} needs an identifier after ':'")]
    MissingId(String),
}

impl FromStr for ScheduleFilter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "all" => return Ok(Self::All),
            "favorites" | "favourites" | "fav" => return Ok(Self::Favorites),
            _ => {}
        }

        let Some((kind, id)) = s.split_once(':') else {
            return Err(ParseFilterError::Unknown(s.to_string()));
        };
        let id = id.trim();
        let build: fn(String) -> Self = match kind.trim().to_ascii_lowercase().as_str() {
            "tag" => Self::Tag,
            "type" => Self::Type,
            "room" => Self::Room,
            "speaker" => Self::Speaker,
            _ => return Err(ParseFilterError::Unknown(s.to_string())),
        };
        if id.is_empty() {
            return Err(ParseFilterError::MissingId(s.to_string()));
        }
        Ok(build(id.to_string()))
    }
}

/// Read access to the attendee's favorite session identifiers.
pub trait FavoriteSet {
    fn contains_session(&self, id: &str) -> bool;
}

impl FavoriteSet for HashSet<String> {
    fn contains_session(&self, id: &str) -> bool {
        self.contains(id)
    }
}

impl FavoriteSet for BTreeSet<String> {
    fn contains_session(&self, id: &str) -> bool {
        self.contains(id)
    }
}

impl FavoriteSet for [String] {
    fn contains_session(&self, id: &str) -> bool {
        self.iter().any(|fav| fav == id)
    }
}

/// A favorite set with no entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFavorites;

impl FavoriteSet for NoFavorites {
    fn contains_session(&self, _id: &str) -> bool {
        false
    }
}

/// A time slot after filtering, borrowing sessions from the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView<'a> {
    pub start: SessionTime,
    pub sessions: Vec<&'a Session>,
}

/// Filters one day of the schedule.
///
/// Slots keep their order and sessions keep their order within a slot. Slots
/// left without sessions are omitted, so an empty result means nothing on
/// that day matched. [`ScheduleFilter::All`] returns every slot unchanged.
///
/// # Errors
///
/// Returns [`ScheduleError::DayIndexOutOfRange`] if `day_index` does not name
/// a day of the schedule.
pub fn apply<'a, F>(
    schedule: &'a Schedule,
    day_index: usize,
    filter: &ScheduleFilter,
    favorites: &F,
) -> ScheduleResult<Vec<SlotView<'a>>>
where
    F: FavoriteSet + ?Sized,
{
    let day = schedule
        .day(day_index)
        .ok_or(ScheduleError::DayIndexOutOfRange {
            index: day_index,
            days: schedule.days().len(),
        })?;

    if matches!(filter, ScheduleFilter::All) {
        return Ok(day
            .slots()
            .iter()
            .map(|slot| SlotView {
                start: slot.start(),
                sessions: slot.sessions().iter().collect(),
            })
            .collect());
    }

    Ok(day
        .slots()
        .iter()
        .filter_map(|slot| {
            let sessions: Vec<&Session> = slot
                .sessions()
                .iter()
                .filter(|session| filter.matches(session, favorites))
                .collect();
            (!sessions.is_empty()).then(|| SlotView {
                start: slot.start(),
                sessions,
            })
        })
        .collect())
}

/// Finds sessions whose text contains `query`, ignoring case.
///
/// Titles and speaker names are searched in both languages; descriptions only
/// in `language`. Results are in chronological order. A blank query matches
/// nothing.
pub fn search<'a>(schedule: &'a Schedule, query: &str, language: Language) -> Vec<&'a Session> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let hit = |text: &str| text.to_lowercase().contains(&needle);

    schedule
        .sessions()
        .filter(|session| {
            session.text.iter().any(|text| hit(&text.title))
                || hit(session.description(language))
                || session.speakers.iter().any(|id| {
                    schedule
                        .speakers()
                        .get(id)
                        .is_some_and(|speaker| speaker.text.iter().any(|text| hit(&text.name)))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{NormalizeOptions, normalize_slice};
    use crate::schedule::{Day, TimeSlot};
    use crate::time::parse_session_time;
    use chrono::NaiveDate;

    const FEED: &str = r#"{
        "sessions": [
            {"id": "open", "start": "2024-03-01T09:00:00+08:00", "end": "2024-03-01T09:30:00+08:00",
             "room": "R0", "type": "K", "speakers": ["alice"], "tags": ["intro"],
             "zh": {"title": "開幕", "description": "歡迎來到研討會"}, "en": {"title": "Opening", "description": "Welcome"}},
            {"id": "rust", "start": "2024-03-01T10:00:00+08:00", "end": "2024-03-01T10:40:00+08:00",
             "room": "R1", "type": "T", "speakers": ["bob", "alice"], "tags": ["rust", "systems"],
             "en": {"title": "Fearless Concurrency", "description": "Threads without tears"}},
            {"id": "go", "start": "2024-03-01T10:00:00+08:00", "end": "2024-03-01T10:40:00+08:00",
             "room": "R2", "type": "T", "speakers": ["carol"], "tags": ["go"],
             "en": {"title": "Goroutines", "description": ""}},
            {"id": "close", "start": "2024-03-02T17:00:00+08:00", "end": "2024-03-02T17:30:00+08:00",
             "room": "R0", "type": "K", "speakers": [], "tags": [],
             "en": {"title": "Closing", "description": ""}}
        ],
        "speakers": {
            "alice": {"zh": {"name": "愛麗絲"}, "en": {"name": "Alice Chen"}},
            "bob": {"en": {"name": "Bob"}},
            "carol": {"en": {"name": "Carol"}}
        }
    }"#;

    fn schedule() -> Schedule {
        normalize_slice(FEED.as_bytes(), &NormalizeOptions::default()).unwrap()
    }

    fn ids(view: &[SlotView<'_>]) -> Vec<Vec<String>> {
        view.iter()
            .map(|slot| slot.sessions.iter().map(|s| s.id.clone()).collect())
            .collect()
    }

    mod apply {
        use super::*;

        #[test]
        fn all_is_identity() {
            let schedule = schedule();
            let view = apply(&schedule, 0, &ScheduleFilter::All, &NoFavorites).unwrap();
            let day = &schedule.days()[0];
            assert_eq!(view.len(), day.slots().len());
            for (slot, original) in view.iter().zip(day.slots()) {
                assert_eq!(slot.start, original.start());
                let expected: Vec<&Session> = original.sessions().iter().collect();
                assert_eq!(slot.sessions, expected);
            }
        }

        #[test]
        fn all_keeps_empty_slots() {
            let tz = chrono_tz::UTC;
            let at = |value: &str| parse_session_time(value, &tz).unwrap();
            let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
            let day = Day::new(
                date,
                vec![
                    TimeSlot::new(at("2024-03-01T09:00:00Z"), Vec::new()),
                    TimeSlot::new(at("2024-03-01T10:00:00Z"), Vec::new()),
                ],
            );
            let schedule = Schedule::new(
                vec![day],
                Default::default(),
                Default::default(),
                Default::default(),
                Default::default(),
            );

            let all = apply(&schedule, 0, &ScheduleFilter::All, &NoFavorites).unwrap();
            assert_eq!(all.len(), 2);
            assert!(all.iter().all(|slot| slot.sessions.is_empty()));

            let tagged = apply(&schedule, 0, &ScheduleFilter::Tag("rust".into()), &NoFavorites)
                .unwrap();
            assert!(tagged.is_empty());
        }

        #[test]
        fn tag_filter_drops_empty_slots() {
            let schedule = schedule();
            let view = apply(&schedule, 0, &ScheduleFilter::Tag("rust".into()), &NoFavorites)
                .unwrap();
            assert_eq!(ids(&view), vec![vec!["rust"]]);
        }

        #[test]
        fn type_filter_keeps_slot_order() {
            let schedule = schedule();
            let view = apply(&schedule, 0, &ScheduleFilter::Type("T".into()), &NoFavorites)
                .unwrap();
            assert_eq!(ids(&view), vec![vec!["rust", "go"]]);
        }

        #[test]
        fn room_filter() {
            let schedule = schedule();
            let view = apply(&schedule, 1, &ScheduleFilter::Room("R0".into()), &NoFavorites)
                .unwrap();
            assert_eq!(ids(&view), vec![vec!["close"]]);
        }

        #[test]
        fn speaker_filter_matches_any_position() {
            let schedule = schedule();
            let view = apply(
                &schedule,
                0,
                &ScheduleFilter::Speaker("alice".into()),
                &NoFavorites,
            )
            .unwrap();
            assert_eq!(ids(&view), vec![vec!["open"], vec!["rust"]]);
        }

        #[test]
        fn favorites_filter() {
            let schedule = schedule();
            let favorites: HashSet<String> = ["go".to_string(), "close".to_string()].into();
            let view = apply(&schedule, 0, &ScheduleFilter::Favorites, &favorites).unwrap();
            assert_eq!(ids(&view), vec![vec!["go"]]);

            let sorted: BTreeSet<String> = favorites.into_iter().collect();
            let view = apply(&schedule, 1, &ScheduleFilter::Favorites, &sorted).unwrap();
            assert_eq!(ids(&view), vec![vec!["close"]]);
        }

        #[test]
        fn empty_favorites_yield_empty_day() {
            let schedule = schedule();
            let view = apply(&schedule, 0, &ScheduleFilter::Favorites, &NoFavorites).unwrap();
            assert!(view.is_empty());
        }

        #[test]
        fn unknown_identifier_yields_empty_day() {
            let schedule = schedule();
            let view = apply(&schedule, 0, &ScheduleFilter::Tag("cobol".into()), &NoFavorites)
                .unwrap();
            assert!(view.is_empty());
        }

        #[test]
        fn out_of_range_day() {
            let schedule = schedule();
            let err = apply(&schedule, 2, &ScheduleFilter::All, &NoFavorites).unwrap_err();
            assert!(matches!(
                err,
                ScheduleError::DayIndexOutOfRange { index: 2, days: 2 }
            ));
        }

        #[test]
        fn empty_schedule_has_no_valid_day() {
            let empty = Schedule::default();
            assert!(apply(&empty, 0, &ScheduleFilter::All, &NoFavorites).is_err());
        }
    }

    mod parsing {
        use super::*;

        #[test]
        fn keywords_and_prefixed_ids() {
            assert_eq!("all".parse::<ScheduleFilter>(), Ok(ScheduleFilter::All));
            assert_eq!(" Favorites ".parse(), Ok(ScheduleFilter::Favorites));
            assert_eq!("tag:rust".parse(), Ok(ScheduleFilter::Tag("rust".into())));
            assert_eq!("TYPE:K".parse(), Ok(ScheduleFilter::Type("K".into())));
            assert_eq!("room:R0".parse(), Ok(ScheduleFilter::Room("R0".into())));
            assert_eq!(
                "speaker:alice".parse(),
                Ok(ScheduleFilter::Speaker("alice".into()))
            );
        }

        #[test]
        fn rejects_unknown_and_empty() {
            assert!(matches!(
                "track:1".parse::<ScheduleFilter>(),
                Err(ParseFilterError::Unknown(_))
            ));
            assert!(matches!(
                "everything".parse::<ScheduleFilter>(),
                Err(ParseFilterError::Unknown(_))
            ));
            assert!(matches!(
                "tag:".parse::<ScheduleFilter>(),
                Err(ParseFilterError::MissingId(_))
            ));
        }

        #[test]
        fn display_parses_back() {
            for filter in [
                ScheduleFilter::All,
                ScheduleFilter::Favorites,
                ScheduleFilter::Room("R1".into()),
            ] {
                assert_eq!(filter.to_string().parse::<ScheduleFilter>(), Ok(filter));
            }
        }

        #[test]
        fn serde_shape() {
            insta::assert_json_snapshot!(ScheduleFilter::Tag("rust".into()), @r#"
            {
              "kind": "tag",
              "id": "rust"
            }
            "#);
            let all: ScheduleFilter = serde_json::from_str(r#"{"kind": "all"}"#).unwrap();
            assert_eq!(all, ScheduleFilter::All);
        }
    }

    mod search {
        use super::*;

        fn found(query: &str, language: Language) -> Vec<String> {
            let schedule = schedule();
            search(&schedule, query, language)
                .into_iter()
                .map(|s| s.id.clone())
                .collect()
        }

        #[test]
        fn title_case_insensitive() {
            assert_eq!(found("fearless", Language::En), vec!["rust"]);
            assert_eq!(found("開幕", Language::En), vec!["open"]);
        }

        #[test]
        fn speaker_names_in_both_languages() {
            assert_eq!(found("alice chen", Language::Zh), vec!["open", "rust"]);
            assert_eq!(found("愛麗絲", Language::En), vec!["open", "rust"]);
        }

        #[test]
        fn description_uses_selected_language() {
            assert_eq!(found("threads", Language::En), vec!["rust"]);
            assert!(found("threads", Language::Zh).is_empty());
            assert_eq!(found("研討會", Language::Zh), vec!["open"]);
        }

        #[test]
        fn results_are_chronological_across_days() {
            assert_eq!(found("o", Language::En), vec!["open", "rust", "go", "close"]);
        }

        #[test]
        fn blank_query_matches_nothing() {
            assert!(found("   ", Language::En).is_empty());
        }
    }
}
