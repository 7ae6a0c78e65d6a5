//! Fast-pass scenario status and announcements.
//!
//! A scenario is a redeemable entitlement such as check-in, lunch or a
//! souvenir. Times on the wire are Unix timestamps in seconds.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::schedule::{Language, Localized};

/// Where a scenario stands at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioState {
    Available,
    Used,
    Disabled,
    NotYetOpen,
    Expired,
}

/// One redeemable fast-pass scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub display_text: Localized<String>,
    #[serde(default)]
    pub available_time: i64,
    #[serde(default)]
    pub expire_time: i64,
    /// Seconds a redemption stays on screen after use.
    #[serde(default)]
    pub countdown: i64,
    /// Unix time of redemption, if used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used: Option<i64>,
    /// Reason the scenario is disabled for this attendee.
    #[serde(default, rename = "disable", skip_serializing_if = "Option::is_none")]
    pub disabled: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attr: BTreeMap<String, serde_json::Value>,
}

impl Scenario {
    /// Returns the state of the scenario at `now`.
    pub fn state_at(&self, now: DateTime<Utc>) -> ScenarioState {
        let now = now.timestamp();
        if self.disabled.is_some() {
            ScenarioState::Disabled
        } else if self.used.is_some() {
            ScenarioState::Used
        } else if now < self.available_time {
            ScenarioState::NotYetOpen
        } else if now >= self.expire_time {
            ScenarioState::Expired
        } else {
            ScenarioState::Available
        }
    }

    /// Returns true if the scenario can be redeemed at `now`.
    pub fn is_available_at(&self, now: DateTime<Utc>) -> bool {
        self.state_at(now) == ScenarioState::Available
    }

    pub fn available_from(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.available_time, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expire_time, 0)
    }

    pub fn used_at(&self) -> Option<DateTime<Utc>> {
        self.used.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

/// Fast-pass state of one attendee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStatus {
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub role: String,
    /// Unix time of the first check-in, 0 if never.
    #[serde(default)]
    pub first_use: i64,
    #[serde(default)]
    pub attr: BTreeMap<String, serde_json::Value>,
    /// Scenarios in ascending `order`.
    #[serde(default, deserialize_with = "sorted_by_order")]
    pub scenarios: Vec<Scenario>,
}

impl ScenarioStatus {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn scenario(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    /// Returns true if the attendee has checked in at least once.
    pub fn has_checked_in(&self) -> bool {
        self.first_use > 0
    }
}

fn sorted_by_order<'de, D>(deserializer: D) -> Result<Vec<Scenario>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut scenarios = Vec::<Scenario>::deserialize(deserializer)?;
    scenarios.sort_by_key(|s| s.order);
    Ok(scenarios)
}

/// An organizer announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Unix time of publication.
    pub datetime: i64,
    #[serde(default)]
    pub msg_zh: String,
    #[serde(default)]
    pub msg_en: String,
    #[serde(default)]
    pub uri: String,
}

impl Announcement {
    pub fn message(&self, language: Language) -> &str {
        match language {
            Language::Zh => &self.msg_zh,
            Language::En => &self.msg_en,
        }
    }

    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.datetime, 0)
    }

    /// Returns the link, if the announcement has one.
    pub fn link(&self) -> Option<&str> {
        let uri = self.uri.trim();
        (!uri.is_empty()).then_some(uri)
    }
}

/// Decodes an announcement list, newest first.
pub fn decode_announcements(bytes: &[u8]) -> Result<Vec<Announcement>, serde_json::Error> {
    let mut announcements: Vec<Announcement> = serde_json::from_slice(bytes)?;
    announcements.sort_by(|a, b| b.datetime.cmp(&a.datetime));
    Ok(announcements)
}
