//! HTTP feed source.

use std::time::Duration;

use eventpass_core::{
    AccessToken, Announcement, Endpoint, EventSettings, EventSummary, Feature, Portal,
    ScenarioStatus, decode_announcements,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::source::{BoxFuture, FeedSource};

/// Fetches event documents from the portal and feature URLs.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    portal: Portal,
}

impl HttpSource {
    /// Creates a source with the given request timeout.
    pub fn new(portal: Portal, timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("eventpass/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, portal })
    }

    #[instrument(skip_all, fields(url = %redact(&url)))]
    async fn get(&self, url: Url) -> ClientResult<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if let Some(err) = classify(status) {
            let body = response.text().await.unwrap_or_default();
            return Err(with_body(err, &body));
        }

        let bytes = response.bytes().await?;
        debug!(status = %status, bytes = bytes.len(), "fetched document");
        Ok(bytes.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        let bytes = self.get(url).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Fetch(format!("invalid response document: {}", e)))
    }
}

/// Maps a non-success status to an error.
fn classify(status: StatusCode) -> Option<ClientError> {
    if status.is_success() {
        return None;
    }
    let message = match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            format!("access token rejected ({})", status)
        }
        StatusCode::NOT_FOUND => format!("not found ({})", status),
        StatusCode::TOO_MANY_REQUESTS => format!("rate limit exceeded ({})", status),
        s if s.is_server_error() => format!("server error ({})", status),
        _ => format!("unexpected status {}", status),
    };
    Some(ClientError::Fetch(message))
}

fn with_body(err: ClientError, body: &str) -> ClientError {
    let body = body.trim();
    match err {
        ClientError::Fetch(message) if !body.is_empty() => {
            let excerpt: String = body.chars().take(200).collect();
            ClientError::Fetch(format!("{}: {}", message, excerpt))
        }
        other => other,
    }
}

/// Hides the token query value in logged URLs.
fn redact(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "token" { "***".to_string() } else { value.into_owned() };
            (key.into_owned(), value)
        })
        .collect();
    if !pairs.is_empty() {
        redacted.query_pairs_mut().clear().extend_pairs(pairs);
    }
    redacted.to_string()
}

fn parse_feature_url(feature: &Feature) -> ClientResult<Url> {
    let base = feature.base_url()?;
    Url::parse(base).map_err(|e| ClientError::Fetch(format!("invalid url {:?}: {}", base, e)))
}

impl FeedSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch_events(&self) -> BoxFuture<'_, ClientResult<Vec<EventSummary>>> {
        Box::pin(async move { self.get_json(self.portal.event_list()).await })
    }

    fn fetch_settings<'a>(
        &'a self,
        event_id: &'a str,
    ) -> BoxFuture<'a, ClientResult<EventSettings>> {
        Box::pin(async move { self.get_json(self.portal.event_settings(event_id)).await })
    }

    fn fetch_schedule<'a>(&'a self, feature: &'a Feature) -> BoxFuture<'a, ClientResult<Vec<u8>>> {
        Box::pin(async move {
            let url = parse_feature_url(feature)?;
            self.get(url).await
        })
    }

    fn fetch_scenario_status<'a>(
        &'a self,
        feature: &'a Feature,
        token: &'a AccessToken,
    ) -> BoxFuture<'a, ClientResult<ScenarioStatus>> {
        Box::pin(async move {
            let url = Endpoint::ScenarioStatus.url(feature.base_url()?, token)?;
            self.get_json(url).await
        })
    }

    fn use_scenario<'a>(
        &'a self,
        feature: &'a Feature,
        scenario: &'a str,
        token: &'a AccessToken,
    ) -> BoxFuture<'a, ClientResult<ScenarioStatus>> {
        Box::pin(async move {
            let url = Endpoint::ScenarioUse(scenario).url(feature.base_url()?, token)?;
            self.get_json(url).await
        })
    }

    fn fetch_announcements<'a>(
        &'a self,
        feature: &'a Feature,
        token: &'a AccessToken,
    ) -> BoxFuture<'a, ClientResult<Vec<Announcement>>> {
        Box::pin(async move {
            let url = Endpoint::Announcements.url(feature.base_url()?, token)?;
            let bytes = self.get(url).await?;
            decode_announcements(&bytes)
                .map_err(|e| ClientError::Fetch(format!("invalid announcement list: {}", e)))
        })
    }
}
