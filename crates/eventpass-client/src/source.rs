//! The fetch boundary.
//!
//! A [`FeedSource`] retrieves event documents. The core never does I/O; it
//! receives bytes or decoded documents from a source and normalizes them.
//!
//! - [`HttpSource`](crate::http::HttpSource): the event portal and feature URLs
//! - [`FileSource`]: local JSON files, for offline use and tests

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use eventpass_core::{
    AccessToken, Announcement, EventSettings, EventSummary, Feature, FeatureKind, Localized,
    ScenarioStatus, decode_announcements,
};
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Retrieves event documents.
///
/// Implementations should be `Send + Sync` so one source can serve
/// concurrent fetches. Token-gated methods receive an already validated
/// [`AccessToken`].
pub trait FeedSource: Send + Sync {
    /// Returns a short name for logs (e.g. "http", "file").
    fn name(&self) -> &str;

    /// Lists the events the portal knows about.
    fn fetch_events(&self) -> BoxFuture<'_, ClientResult<Vec<EventSummary>>>;

    /// Fetches the settings document of an event.
    fn fetch_settings<'a>(&'a self, event_id: &'a str)
    -> BoxFuture<'a, ClientResult<EventSettings>>;

    /// Fetches the raw schedule feed named by the schedule feature.
    fn fetch_schedule<'a>(&'a self, feature: &'a Feature) -> BoxFuture<'a, ClientResult<Vec<u8>>>;

    /// Fetches the attendee's fast-pass status.
    fn fetch_scenario_status<'a>(
        &'a self,
        feature: &'a Feature,
        token: &'a AccessToken,
    ) -> BoxFuture<'a, ClientResult<ScenarioStatus>>;

    /// Redeems a scenario and returns the updated status.
    fn use_scenario<'a>(
        &'a self,
        feature: &'a Feature,
        scenario: &'a str,
        token: &'a AccessToken,
    ) -> BoxFuture<'a, ClientResult<ScenarioStatus>>;

    /// Fetches announcements, newest first.
    fn fetch_announcements<'a>(
        &'a self,
        feature: &'a Feature,
        token: &'a AccessToken,
    ) -> BoxFuture<'a, ClientResult<Vec<Announcement>>>;
}

/// Reads event documents from local files.
///
/// Without a settings file, settings are synthesized with a single schedule
/// feature pointing at the feed file.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    settings: Option<PathBuf>,
    feed: Option<PathBuf>,
    status: Option<PathBuf>,
    announcements: Option<PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_settings(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_feed(mut self, path: impl Into<PathBuf>) -> Self {
        self.feed = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, path: impl Into<PathBuf>) -> Self {
        self.status = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_announcements(mut self, path: impl Into<PathBuf>) -> Self {
        self.announcements = Some(path.into());
        self
    }

    fn synthesized_settings(&self, event_id: &str) -> EventSettings {
        let features = self
            .feed
            .iter()
            .map(|path| Feature {
                feature: FeatureKind::Schedule,
                display_text: Localized::new("議程".to_string(), "Schedule".to_string()),
                icon: None,
                url: Some(path.display().to_string()),
                wifi: None,
                visible_roles: None,
            })
            .collect();

        EventSettings {
            event_id: event_id.to_string(),
            display_name: Localized::new(event_id.to_string(), event_id.to_string()),
            logo_url: String::new(),
            features,
        }
    }
}

async fn read(path: &Path) -> ClientResult<Vec<u8>> {
    debug!(path = %path.display(), "reading local document");
    tokio::fs::read(path).await.map_err(|e| {
        ClientError::Fetch(format!("failed to read {}: {}", path.display(), e))
    })
}

fn decode<T: serde::de::DeserializeOwned>(path: &Path, bytes: &[u8]) -> ClientResult<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| ClientError::Fetch(format!("invalid document {}: {}", path.display(), e)))
}

fn require<'a>(path: &'a Option<PathBuf>, what: &str) -> ClientResult<&'a Path> {
    path.as_deref()
        .ok_or_else(|| ClientError::Fetch(format!("no local {} file configured", what)))
}

impl FeedSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    fn fetch_events(&self) -> BoxFuture<'_, ClientResult<Vec<EventSummary>>> {
        Box::pin(async move {
            let Some(path) = self.settings.as_deref() else {
                return Ok(Vec::new());
            };
            let settings: EventSettings = decode(path, &read(path).await?)?;
            Ok(vec![EventSummary {
                event_id: settings.event_id,
                display_name: settings.display_name,
                logo_url: settings.logo_url,
            }])
        })
    }

    fn fetch_settings<'a>(
        &'a self,
        event_id: &'a str,
    ) -> BoxFuture<'a, ClientResult<EventSettings>> {
        Box::pin(async move {
            match self.settings.as_deref() {
                Some(path) => decode(path, &read(path).await?),
                None => Ok(self.synthesized_settings(event_id)),
            }
        })
    }

    fn fetch_schedule<'a>(&'a self, feature: &'a Feature) -> BoxFuture<'a, ClientResult<Vec<u8>>> {
        Box::pin(async move {
            match self.feed.as_deref() {
                Some(path) => read(path).await,
                None => read(Path::new(feature.base_url()?)).await,
            }
        })
    }

    fn fetch_scenario_status<'a>(
        &'a self,
        _feature: &'a Feature,
        _token: &'a AccessToken,
    ) -> BoxFuture<'a, ClientResult<ScenarioStatus>> {
        Box::pin(async move {
            let path = require(&self.status, "scenario status")?;
            decode(path, &read(path).await?)
        })
    }

    fn use_scenario<'a>(
        &'a self,
        _feature: &'a Feature,
        scenario: &'a str,
        _token: &'a AccessToken,
    ) -> BoxFuture<'a, ClientResult<ScenarioStatus>> {
        Box::pin(async move {
            Err(ClientError::Fetch(format!(
                "cannot redeem {:?} from local files",
                scenario
            )))
        })
    }

    fn fetch_announcements<'a>(
        &'a self,
        _feature: &'a Feature,
        _token: &'a AccessToken,
    ) -> BoxFuture<'a, ClientResult<Vec<Announcement>>> {
        Box::pin(async move {
            let path = require(&self.announcements, "announcement")?;
            decode_announcements(&read(path).await?)
                .map_err(|e| ClientError::Fetch(format!("invalid document {}: {}", path.display(), e)))
        })
    }
}
