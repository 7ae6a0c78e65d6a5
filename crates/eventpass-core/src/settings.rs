//! Event settings and feature resolution.
//!
//! An event publishes a settings document listing the features it offers
//! (schedule, fast pass, announcements, ...), each with a display label and
//! usually a base URL.

use serde::{Deserialize, Serialize};

use crate::error::{ScheduleError, ScheduleResult};
use crate::schedule::Localized;

/// The kind of an event feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Fastpass,
    Ticket,
    Schedule,
    Announcement,
    Wifi,
    Telegram,
    Im,
    Puzzle,
    Venue,
    Sponsors,
    Partners,
    Staffs,
    Webview,
    /// A kind this client does not know about.
    #[serde(other)]
    Unknown,
}

impl FeatureKind {
    /// Returns the wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fastpass => "fastpass",
            Self::Ticket => "ticket",
            Self::Schedule => "schedule",
            Self::Announcement => "announcement",
            Self::Wifi => "wifi",
            Self::Telegram => "telegram",
            Self::Im => "im",
            Self::Puzzle => "puzzle",
            Self::Venue => "venue",
            Self::Sponsors => "sponsors",
            Self::Partners => "partners",
            Self::Staffs => "staffs",
            Self::Webview => "webview",
            Self::Unknown => "unknown",
        }
    }

    /// Returns true if using the feature requires an access token.
    pub fn requires_token(&self) -> bool {
        matches!(self, Self::Fastpass | Self::Ticket | Self::Announcement)
    }
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One Wi-Fi network advertised by the `wifi` feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiNetwork {
    #[serde(rename = "SSID")]
    pub ssid: String,
    #[serde(default)]
    pub password: String,
}

/// A feature declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub feature: FeatureKind,
    #[serde(default)]
    pub display_text: Localized<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi: Option<Vec<WifiNetwork>>,
    /// Roles allowed to see the feature; every role when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_roles: Option<Vec<String>>,
}

impl Feature {
    /// Returns the base URL or [`ScheduleError::MissingFeatureUrl`].
    pub fn base_url(&self) -> ScheduleResult<&str> {
        match self.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(ScheduleError::MissingFeatureUrl(self.feature.to_string())),
        }
    }

    /// Returns true if an attendee with `role` may see the feature. A missing
    /// role only sees features without a role restriction.
    pub fn is_visible_to(&self, role: Option<&str>) -> bool {
        match (&self.visible_roles, role) {
            (None, _) => true,
            (Some(roles), Some(role)) => roles.iter().any(|r| r == role),
            (Some(_), None) => false,
        }
    }
}

/// Settings document of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSettings {
    pub event_id: String,
    #[serde(default)]
    pub display_name: Localized<String>,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl EventSettings {
    /// Decodes settings from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Returns the first feature of the given kind.
    pub fn feature(&self, kind: FeatureKind) -> Option<&Feature> {
        feature(self, kind)
    }
}

/// Returns the first feature of `kind` declared by the event.
///
/// Settings may list a kind more than once; the earliest entry wins.
pub fn feature(settings: &EventSettings, kind: FeatureKind) -> Option<&Feature> {
    settings.features.iter().find(|f| f.feature == kind)
}

/// Summary of an event as listed by the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub event_id: String,
    #[serde(default)]
    pub display_name: Localized<String>,
    #[serde(default)]
    pub logo_url: String,
}
