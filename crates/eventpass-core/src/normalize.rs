//! RawFeed to Schedule conversion pipeline.
//!
//! The normalization process:
//! 1. Resolves the default timezone for offset-less timestamps
//! 2. Parses every session's start and end into [`SessionTime`]
//! 3. Stable-sorts sessions by start, then end
//! 4. Splits the sorted sessions into days, then days into time slots
//! 5. Builds the speaker, room, tag and session-type maps
//!
//! The whole feed is rejected on the first problem; there is no partial
//! schedule.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::debug;

use crate::error::{EntityCategory, MalformedFeed, ScheduleError, ScheduleResult, TimestampField};
use crate::feed::{RawCollection, RawEntity, RawFeed, RawSession, RawSpeaker};
use crate::schedule::{Day, Entity, EntityMap, Schedule, Session, Speaker, TimeSlot};
use crate::time::{SessionTime, parse_session_time};

/// Options for [`normalize`].
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Timezone for timestamps without an offset. Overrides the zone the
    /// feed declares; UTC when neither is set.
    pub default_timezone: Option<Tz>,
}

impl NormalizeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default_timezone(mut self, tz: Tz) -> Self {
        self.default_timezone = Some(tz);
        self
    }
}

/// Decodes a JSON feed and normalizes it.
pub fn normalize_slice(bytes: &[u8], options: &NormalizeOptions) -> ScheduleResult<Schedule> {
    let raw = RawFeed::from_slice(bytes).map_err(MalformedFeed::from)?;
    normalize(&raw, options)
}

/// Converts a [`RawFeed`] into a [`Schedule`].
///
/// # Errors
///
/// - [`ScheduleError::MalformedFeed`] if a timestamp cannot be parsed, a
///   session ends before it starts, or the feed declares an unknown timezone
/// - [`ScheduleError::DuplicateIdentifier`] if two speakers, rooms, tags or
///   session types share an identifier
pub fn normalize(raw: &RawFeed, options: &NormalizeOptions) -> ScheduleResult<Schedule> {
    let tz = resolve_timezone(raw, options)?;

    let mut sessions = raw
        .sessions
        .iter()
        .map(|session| convert_session(session, &tz))
        .collect::<ScheduleResult<Vec<_>>>()?;

    // `sort_by_key` is stable: sessions with equal keys keep feed order.
    sessions.sort_by_key(|session| (session.start.date(), session.start, session.end));

    let days = split_days(sessions);

    let speakers = build_map(EntityCategory::Speaker, &raw.speakers, convert_speaker)?;
    let rooms = build_map(EntityCategory::Room, &raw.rooms, convert_entity)?;
    let tags = build_map(EntityCategory::Tag, &raw.tags, convert_entity)?;
    let types = build_map(EntityCategory::SessionType, &raw.session_types, convert_entity)?;

    debug!(
        sessions = raw.sessions.len(),
        days = days.len(),
        slots = days.iter().map(|day| day.slots().len()).sum::<usize>(),
        speakers = speakers.len(),
        rooms = rooms.len(),
        tags = tags.len(),
        types = types.len(),
        shape = ?raw.shape(),
        timezone = %tz,
        "normalized schedule feed"
    );

    Ok(Schedule::new(days, speakers, rooms, tags, types))
}

fn resolve_timezone(raw: &RawFeed, options: &NormalizeOptions) -> ScheduleResult<Tz> {
    if let Some(tz) = options.default_timezone {
        return Ok(tz);
    }

    match raw.timezone.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name
            .parse::<Tz>()
            .map_err(|_| MalformedFeed::UnknownTimezone(name.to_string()).into()),
        _ => Ok(Tz::UTC),
    }
}

fn convert_session(raw: &RawSession, tz: &Tz) -> ScheduleResult<Session> {
    let start = parse_field(raw, TimestampField::Start, &raw.start, tz)?;
    let end = parse_field(raw, TimestampField::End, &raw.end, tz)?;

    if end.to_utc() < start.to_utc() {
        return Err(MalformedFeed::EndBeforeStart {
            session_id: raw.id.clone(),
            start: raw.start.clone(),
            end: raw.end.clone(),
        }
        .into());
    }

    Ok(Session {
        id: raw.id.clone(),
        start,
        end,
        room: raw.room.clone(),
        session_type: raw.session_type.clone(),
        broadcast: raw.broadcast.clone().unwrap_or_default(),
        language: raw.language.clone(),
        speakers: raw.speakers.iter().map(|r| r.id().to_string()).collect(),
        tags: raw.tags.iter().map(|r| r.id().to_string()).collect(),
        text: raw.text.clone(),
        resources: raw.resources.clone(),
    })
}

fn parse_field(
    raw: &RawSession,
    field: TimestampField,
    value: &str,
    tz: &Tz,
) -> ScheduleResult<SessionTime> {
    parse_session_time(value, tz).ok_or_else(|| {
        MalformedFeed::Timestamp {
            session_id: raw.id.clone(),
            field,
            value: value.to_string(),
        }
        .into()
    })
}

/// Splits sorted sessions into days, then each day into time slots.
///
/// Sessions must already be sorted so that each date and each start time is
/// contiguous.
fn split_days(sessions: Vec<Session>) -> Vec<Day> {
    let mut buckets: Vec<(NaiveDate, Vec<Session>)> = Vec::new();

    for session in sessions {
        let date = session.start.date();
        match buckets.last_mut() {
            Some((current, bucket)) if *current == date => bucket.push(session),
            _ => buckets.push((date, vec![session])),
        }
    }

    buckets
        .into_iter()
        .map(|(date, sessions)| Day::new(date, group_slots(sessions)))
        .collect()
}

fn group_slots(sessions: Vec<Session>) -> Vec<TimeSlot> {
    let mut slots: Vec<(SessionTime, Vec<Session>)> = Vec::new();

    for session in sessions {
        match slots.last_mut() {
            Some((start, slot)) if *start == session.start => slot.push(session),
            _ => slots.push((session.start, vec![session])),
        }
    }

    slots
        .into_iter()
        .map(|(start, sessions)| TimeSlot::new(start, sessions))
        .collect()
}

fn build_map<R, T>(
    category: EntityCategory,
    collection: &RawCollection<R>,
    convert: impl Fn(&R) -> T,
) -> ScheduleResult<EntityMap<T>> {
    let mut entries = BTreeMap::new();

    for (id, raw) in collection.iter() {
        if entries.insert(id.to_string(), convert(raw)).is_some() {
            return Err(ScheduleError::DuplicateIdentifier {
                category,
                id: id.to_string(),
            });
        }
    }

    Ok(EntityMap::from_entries(entries))
}

fn convert_speaker(raw: &RawSpeaker) -> Speaker {
    Speaker {
        avatar: raw.avatar.clone(),
        text: raw.text.clone(),
    }
}

fn convert_entity(raw: &RawEntity) -> Entity {
    Entity {
        text: raw.text.clone(),
    }
}
