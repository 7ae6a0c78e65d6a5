//! Terminal and JSON rendering.
//!
//! Renderers only lay out what the core returns; slot and session order is
//! never changed here.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use eventpass_core::{
    Announcement, EventSettings, EventSummary, FavoriteSet, Language, ResourceKind,
    ScenarioState, ScenarioStatus, Schedule, ScheduleFilter, Session, SlotView,
};
use serde::Serialize;

use crate::config::DisplaySettings;

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const STAR: &str = "★";

/// Options for terminal output.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub language: Language,
    /// Dim sessions that have already ended.
    pub dim_past_sessions: bool,
    /// Emit OSC 8 hyperlinks for resource links.
    pub hyperlinks: bool,
    /// Maximum title length (truncated with ellipsis).
    pub max_title_length: Option<usize>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            language: Language::En,
            dim_past_sessions: true,
            hyperlinks: false,
            max_title_length: None,
        }
    }
}

impl RenderOptions {
    pub fn from_display(display: &DisplaySettings) -> Self {
        Self {
            language: Language::from_tag(&display.language),
            dim_past_sessions: display.dim_past_sessions,
            hyperlinks: display.hyperlinks,
            max_title_length: display.max_title_length,
        }
    }
}

/// One day of the schedule in JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDay {
    pub index: usize,
    pub date: NaiveDate,
    pub filter: String,
    pub slots: Vec<JsonSlot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonSlot {
    pub start: String,
    pub sessions: Vec<JsonSession>,
}

/// A session with its references resolved to display names.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSession {
    pub id: String,
    pub title: String,
    pub start: String,
    pub end: String,
    pub room_id: String,
    pub room: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub session_type: Option<String>,
    pub speakers: Vec<String>,
    pub tags: Vec<String>,
    pub favorite: bool,
    pub past: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<JsonLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonLink {
    pub kind: ResourceKind,
    pub url: String,
}

/// Entry of the day list in JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDaySummary {
    pub index: usize,
    pub date: NaiveDate,
    pub sessions: usize,
    pub today: bool,
}

/// Renders schedule views and event documents.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    fn title<'a>(&self, session: &'a Session) -> Cow<'a, str> {
        let title = session.title(self.options.language);
        let title = if title.is_empty() { session.id.as_str() } else { title };
        match self.options.max_title_length {
            Some(max_len) => ellipsis(title, max_len),
            None => Cow::Borrowed(title),
        }
    }

    fn speaker_names<'a>(&self, schedule: &'a Schedule, session: &'a Session) -> Vec<&'a str> {
        session
            .speakers
            .iter()
            .map(|id| schedule.speaker_name(id, self.options.language))
            .collect()
    }

    fn link_line(&self, session: &Session) -> Option<String> {
        let links = session.resources.links();
        if links.is_empty() {
            return None;
        }
        let parts: Vec<String> = links
            .into_iter()
            .map(|(kind, url)| {
                if self.options.hyperlinks {
                    make_hyperlink(url, kind.display_name())
                } else {
                    format!("{}: {}", kind.display_name(), url)
                }
            })
            .collect();
        let separator = if self.options.hyperlinks { " · " } else { "  " };
        Some(parts.join(separator))
    }

    fn session_block<F>(
        &self,
        out: &mut String,
        schedule: &Schedule,
        session: &Session,
        favorites: &F,
        now: DateTime<Utc>,
    ) where
        F: FavoriteSet + ?Sized,
    {
        let star = if favorites.contains_session(&session.id) {
            STAR
        } else {
            " "
        };
        let room = schedule.room_name(&session.room, self.options.language);

        let mut headline = format!("  {} {}", star, self.title(session));
        if !room.is_empty() {
            headline.push_str(&format!("  @ {}", room));
        }
        let mut lines = vec![headline];
        let speakers = self.speaker_names(schedule, session);
        if !speakers.is_empty() {
            lines.push(format!("      {}", speakers.join(", ")));
        }
        if let Some(links) = self.link_line(session) {
            lines.push(format!("      {}", links));
        }

        let dim = self.options.dim_past_sessions && session.is_past(now);
        for line in lines {
            if dim {
                out.push_str(&format!("{}{}{}\n", DIM, line, RESET));
            } else {
                out.push_str(&format!("{}\n", line));
            }
        }
    }

    /// Renders one filtered day for the terminal.
    pub fn schedule_tty<F>(
        &self,
        schedule: &Schedule,
        day_index: usize,
        filter: &ScheduleFilter,
        slots: &[SlotView<'_>],
        favorites: &F,
        now: DateTime<Utc>,
    ) -> String
    where
        F: FavoriteSet + ?Sized,
    {
        let mut out = String::new();
        if let Some(day) = schedule.day(day_index) {
            out.push_str(&format!(
                "Day {}/{} · {}\n",
                day_index + 1,
                schedule.days().len(),
                day.date()
            ));
        }

        if slots.is_empty() {
            out.push_str(&format!("No sessions match {} on this day.\n", filter));
            return out;
        }

        for slot in slots {
            out.push('\n');
            out.push_str(&format!("{}\n", slot.start.clock()));
            for session in &slot.sessions {
                self.session_block(&mut out, schedule, session, favorites, now);
            }
        }
        out
    }

    /// Converts a session for JSON output.
    pub fn session_json<F>(
        &self,
        schedule: &Schedule,
        session: &Session,
        favorites: &F,
        now: DateTime<Utc>,
    ) -> JsonSession
    where
        F: FavoriteSet + ?Sized,
    {
        let language = self.options.language;
        JsonSession {
            id: session.id.clone(),
            title: session.title(language).to_string(),
            start: session.start.to_rfc3339(),
            end: session.end.to_rfc3339(),
            room_id: session.room.clone(),
            room: schedule.room_name(&session.room, language).to_string(),
            session_type: session
                .session_type
                .as_deref()
                .map(|id| schedule.type_name(id, language).to_string()),
            speakers: self
                .speaker_names(schedule, session)
                .into_iter()
                .map(str::to_string)
                .collect(),
            tags: session
                .tags
                .iter()
                .map(|id| schedule.tag_name(id, language).to_string())
                .collect(),
            favorite: favorites.contains_session(&session.id),
            past: session.is_past(now),
            links: session
                .resources
                .links()
                .into_iter()
                .map(|(kind, url)| JsonLink {
                    kind,
                    url: url.to_string(),
                })
                .collect(),
        }
    }

    /// Converts one filtered day for JSON output.
    pub fn schedule_json<F>(
        &self,
        schedule: &Schedule,
        day_index: usize,
        filter: &ScheduleFilter,
        slots: &[SlotView<'_>],
        favorites: &F,
        now: DateTime<Utc>,
    ) -> JsonDay
    where
        F: FavoriteSet + ?Sized,
    {
        JsonDay {
            index: day_index,
            date: schedule
                .day(day_index)
                .map(|day| day.date())
                .unwrap_or_default(),
            filter: filter.to_string(),
            slots: slots
                .iter()
                .map(|slot| JsonSlot {
                    start: slot.start.to_rfc3339(),
                    sessions: slot
                        .sessions
                        .iter()
                        .map(|session| self.session_json(schedule, session, favorites, now))
                        .collect(),
                })
                .collect(),
        }
    }

    /// Renders search results, one session per block with its date.
    pub fn search_tty<F>(
        &self,
        schedule: &Schedule,
        query: &str,
        sessions: &[&Session],
        favorites: &F,
        now: DateTime<Utc>,
    ) -> String
    where
        F: FavoriteSet + ?Sized,
    {
        let mut out = String::new();
        if sessions.is_empty() {
            out.push_str(&format!("No sessions match {:?}.\n", query));
            return out;
        }
        for session in sessions {
            out.push_str(&format!("{} {}\n", session.start.date(), session.start.clock()));
            self.session_block(&mut out, schedule, session, favorites, now);
        }
        out
    }

    pub fn days_tty(&self, schedule: &Schedule, today: NaiveDate) -> String {
        let mut out = String::new();
        if schedule.is_empty() {
            out.push_str("The schedule has no sessions.\n");
            return out;
        }
        for (index, day) in schedule.days().iter().enumerate() {
            let marker = if day.date() == today { "*" } else { " " };
            out.push_str(&format!(
                "{} {}  {}  {} sessions\n",
                marker,
                index + 1,
                day.date(),
                day.session_count()
            ));
        }
        out
    }

    pub fn days_json(&self, schedule: &Schedule, today: NaiveDate) -> Vec<JsonDaySummary> {
        schedule
            .days()
            .iter()
            .enumerate()
            .map(|(index, day)| JsonDaySummary {
                index,
                date: day.date(),
                sessions: day.session_count(),
                today: day.date() == today,
            })
            .collect()
    }

    pub fn features_tty(&self, settings: &EventSettings) -> String {
        let language = self.options.language;
        let mut out = String::new();
        out.push_str(&format!(
            "{} ({})\n",
            settings.display_name.get(language),
            settings.event_id
        ));
        for feature in &settings.features {
            let gated = if feature.feature.requires_token() {
                " [token]"
            } else {
                ""
            };
            out.push_str(&format!(
                "  {:<13} {}{}",
                feature.feature.as_str(),
                feature.display_text.get(language),
                gated
            ));
            if let Some(url) = feature.url.as_deref() {
                out.push_str(&format!("  {}", url));
            }
            out.push('\n');
            for network in feature.wifi.iter().flatten() {
                out.push_str(&format!("      SSID {}  password {}\n", network.ssid, network.password));
            }
        }
        out
    }

    pub fn events_tty(&self, events: &[EventSummary]) -> String {
        let mut out = String::new();
        if events.is_empty() {
            out.push_str("No events.\n");
            return out;
        }
        for event in events {
            out.push_str(&format!(
                "{:<24} {}\n",
                event.event_id,
                event.display_name.get(self.options.language)
            ));
        }
        out
    }

    /// Renders fast-pass status; times are shown in `zone`.
    pub fn status_tty<Z>(&self, status: &ScenarioStatus, now: DateTime<Utc>, zone: &Z) -> String
    where
        Z: TimeZone,
        Z::Offset: fmt::Display,
    {
        let language = self.options.language;
        let mut out = String::new();
        out.push_str(&status.user_id);
        if !status.role.is_empty() {
            out.push_str(&format!(" ({})", status.role));
        }
        out.push_str(&format!(" · {}\n", status.event_id));

        for scenario in &status.scenarios {
            let state = scenario.state_at(now);
            out.push_str(&format!(
                "  {:<16} {:<13} {}",
                scenario.id,
                state_label(state),
                scenario.display_text.get(language)
            ));
            match state {
                ScenarioState::Used => {
                    if let Some(at) = scenario.used_at() {
                        out.push_str(&format!("  used {}", at.with_timezone(zone).format("%m-%d %H:%M")));
                    }
                }
                ScenarioState::Disabled => {
                    if let Some(reason) = scenario.disabled.as_deref() {
                        out.push_str(&format!("  {}", reason));
                    }
                }
                ScenarioState::NotYetOpen => {
                    if let Some(at) = scenario.available_from() {
                        out.push_str(&format!("  opens {}", at.with_timezone(zone).format("%m-%d %H:%M")));
                    }
                }
                ScenarioState::Available | ScenarioState::Expired => {}
            }
            out.push('\n');
        }
        out
    }

    /// Renders announcements in the order given; times are shown in `zone`.
    pub fn announcements_tty<Z>(&self, announcements: &[Announcement], zone: &Z) -> String
    where
        Z: TimeZone,
        Z::Offset: fmt::Display,
    {
        let mut out = String::new();
        if announcements.is_empty() {
            out.push_str("No announcements.\n");
            return out;
        }
        for announcement in announcements {
            let posted = announcement
                .posted_at()
                .map(|at| at.with_timezone(zone).format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            out.push_str(&format!(
                "{}  {}\n",
                posted,
                announcement.message(self.options.language)
            ));
            if let Some(link) = announcement.link() {
                let shown = if self.options.hyperlinks {
                    make_hyperlink(link, link)
                } else {
                    link.to_string()
                };
                out.push_str(&format!("      {}\n", shown));
            }
        }
        out
    }
}

fn state_label(state: ScenarioState) -> &'static str {
    match state {
        ScenarioState::Available => "available",
        ScenarioState::Used => "used",
        ScenarioState::Disabled => "disabled",
        ScenarioState::NotYetOpen => "not yet open",
        ScenarioState::Expired => "expired",
    }
}

/// Truncates a string to at most `max_len` characters, ending with `...`.
pub fn ellipsis(s: &str, max_len: usize) -> Cow<'_, str> {
    if max_len == 0 {
        return Cow::Borrowed("");
    }
    if s.chars().count() <= max_len {
        return Cow::Borrowed(s);
    }
    let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
    Cow::Owned(format!("{}...", truncated))
}

/// Creates an OSC 8 terminal hyperlink.
pub fn make_hyperlink(url: &str, label: &str) -> String {
    format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, label)
}
