//! Per-event application context.
//!
//! An [`EventService`] ties one event to a [`FeedSource`]: it resolves the
//! event's features, fetches and normalizes the schedule into its
//! [`ScheduleStore`], and runs the token-gated fast-pass operations.

use std::sync::Arc;

use eventpass_core::{
    AccessToken, Announcement, EventSettings, Feature, FeatureKind, NormalizeOptions,
    Schedule, ScenarioStatus, normalize_slice,
};
use tracing::{debug, info, instrument, warn};

use crate::error::{ClientError, ClientResult};
use crate::source::FeedSource;
use crate::store::{ScheduleStore, SharedStore};

/// One event opened through a feed source.
pub struct EventService {
    source: Arc<dyn FeedSource>,
    event_id: String,
    settings: Option<EventSettings>,
    store: SharedStore,
    options: NormalizeOptions,
    token: Option<AccessToken>,
}

impl std::fmt::Debug for EventService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventService")
            .field("source", &self.source.name())
            .field("event_id", &self.event_id)
            .field("settings_loaded", &self.settings.is_some())
            .field("token", &self.token)
            .finish()
    }
}

impl EventService {
    pub fn new(source: Arc<dyn FeedSource>, event_id: impl Into<String>) -> Self {
        Self {
            source,
            event_id: event_id.into(),
            settings: None,
            store: ScheduleStore::shared(),
            options: NormalizeOptions::default(),
            token: None,
        }
    }

    #[must_use]
    pub fn with_normalize_options(mut self, options: NormalizeOptions) -> Self {
        self.options = options;
        self
    }

    /// Uses an already validated token for token-gated features.
    #[must_use]
    pub fn with_token(mut self, token: AccessToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Shares an existing store instead of the service's own.
    #[must_use]
    pub fn with_store(mut self, store: SharedStore) -> Self {
        self.store = store;
        self
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    /// Returns the settings loaded by [`load_settings`](Self::load_settings).
    pub fn settings(&self) -> Option<&EventSettings> {
        self.settings.as_ref()
    }

    /// Fetches the event settings and keeps them for feature lookups.
    #[instrument(skip(self), fields(event = %self.event_id, source = self.source.name()))]
    pub async fn load_settings(&mut self) -> ClientResult<&EventSettings> {
        let settings = self.source.fetch_settings(&self.event_id).await?;
        debug!(features = settings.features.len(), "loaded event settings");
        Ok(self.settings.insert(settings))
    }

    /// Returns the feature of `kind`, loading settings first if needed.
    pub async fn feature(&mut self, kind: FeatureKind) -> ClientResult<&Feature> {
        if self.settings.is_none() {
            self.load_settings().await?;
        }
        self.settings
            .as_ref()
            .and_then(|settings| settings.feature(kind))
            .ok_or_else(|| {
                warn!(event = %self.event_id, feature = %kind, "event does not offer feature");
                ClientError::FeatureMissing(kind)
            })
    }

    /// Fetches, normalizes and installs the schedule.
    ///
    /// Returns the store's current schedule afterwards, which is this fetch's
    /// result unless a fetch started later has already been applied.
    #[instrument(skip(self), fields(event = %self.event_id))]
    pub async fn load_schedule(&mut self) -> ClientResult<Arc<Schedule>> {
        let ticket = self.store.begin_fetch();
        let feature = self.feature(FeatureKind::Schedule).await?.clone();
        let bytes = self.source.fetch_schedule(&feature).await?;
        let schedule = normalize_slice(&bytes, &self.options)?;
        self.store.complete(ticket, schedule).await;

        self.store.current().await.ok_or_else(|| {
            ClientError::Fetch("schedule store is empty after a completed fetch".to_string())
        })
    }

    /// Validates a token by fetching the attendee status with it.
    ///
    /// The token is kept for later calls only if the fast-pass endpoint
    /// accepts it.
    pub async fn redeem_token(&mut self, raw: &str) -> ClientResult<ScenarioStatus> {
        let token = AccessToken::parse(raw).inspect_err(|_| {
            warn!(event = %self.event_id, "rejected malformed access token");
        })?;
        let feature = self.feature(FeatureKind::Fastpass).await?.clone();
        let status = self.source.fetch_scenario_status(&feature, &token).await?;
        info!(event = %self.event_id, role = %status.role, "access token accepted");
        self.token = Some(token);
        Ok(status)
    }

    fn require_token(&self) -> ClientResult<AccessToken> {
        self.token.clone().ok_or(ClientError::NotLoggedIn)
    }

    /// Fetches the attendee's fast-pass status.
    pub async fn load_scenario_status(&mut self) -> ClientResult<ScenarioStatus> {
        let token = self.require_token()?;
        let feature = self.feature(FeatureKind::Fastpass).await?.clone();
        self.source.fetch_scenario_status(&feature, &token).await
    }

    /// Redeems `scenario` and returns the updated status.
    pub async fn use_scenario(&mut self, scenario: &str) -> ClientResult<ScenarioStatus> {
        let token = self.require_token()?;
        let feature = self.feature(FeatureKind::Fastpass).await?.clone();
        let status = self.source.use_scenario(&feature, scenario, &token).await?;
        info!(event = %self.event_id, scenario, "scenario redeemed");
        Ok(status)
    }

    /// Fetches announcements, newest first.
    pub async fn load_announcements(&mut self) -> ClientResult<Vec<Announcement>> {
        let token = self.require_token()?;
        let feature = self.feature(FeatureKind::Announcement).await?.clone();
        self.source.fetch_announcements(&feature, &token).await
    }
}
