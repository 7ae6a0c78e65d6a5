//! Subcommand implementations.

pub mod config;
pub mod event;
pub mod fastpass;
pub mod favorite;
pub mod schedule;
pub mod token;

use std::sync::Arc;
use std::time::Duration;

use eventpass_core::{AccessToken, NormalizeOptions};
use serde::Serialize;
use tracing::debug;

use crate::cli::Cli;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::favorites::Favorites;
use crate::http::HttpSource;
use crate::render::{RenderOptions, Renderer};
use crate::service::EventService;
use crate::source::{FeedSource, FileSource};

/// Event id used when reading local files without `--event`.
const LOCAL_EVENT_ID: &str = "local";

/// Everything a command needs, resolved from flags and configuration.
pub struct Context {
    pub config: ClientConfig,
    pub json: bool,
    pub renderer: Renderer,
    source: Arc<dyn FeedSource>,
    event_id: Option<String>,
    token: Option<String>,
}

impl Context {
    /// Builds the context. Flags override configuration values.
    pub fn from_cli(cli: &Cli, mut config: ClientConfig) -> ClientResult<Self> {
        if let Some(language) = cli.language.as_deref() {
            config.display.language = language.to_string();
        }

        let source: Arc<dyn FeedSource> = if cli.uses_local_files() {
            let mut files = FileSource::new();
            if let Some(path) = &cli.settings {
                files = files.with_settings(path);
            }
            if let Some(path) = &cli.feed {
                files = files.with_feed(path);
            }
            if let Some(path) = &cli.status_file {
                files = files.with_status(path);
            }
            if let Some(path) = &cli.announcements_file {
                files = files.with_announcements(path);
            }
            Arc::new(files)
        } else {
            let timeout = Duration::from_secs(config.network.timeout);
            Arc::new(HttpSource::new(config.portal()?, timeout)?)
        };
        debug!(source = source.name(), "selected feed source");

        let event_id = cli
            .event
            .clone()
            .or_else(|| config.event.id.clone())
            .or_else(|| cli.uses_local_files().then(|| LOCAL_EVENT_ID.to_string()));

        Ok(Self {
            renderer: Renderer::new(RenderOptions::from_display(&config.display)),
            json: cli.json,
            source,
            event_id,
            token: cli.token.clone(),
            config,
        })
    }

    pub fn source(&self) -> Arc<dyn FeedSource> {
        Arc::clone(&self.source)
    }

    /// Returns the selected event.
    pub fn event_id(&self) -> ClientResult<&str> {
        self.event_id.as_deref().ok_or_else(|| {
            ClientError::Config(
                "no event selected (pass --event or set [event] id; `eventpass events` lists them)"
                    .to_string(),
            )
        })
    }

    /// Returns the access token from `--token`/`EVENTPASS_TOKEN`, else from
    /// the configured secret reference.
    pub fn token(&self) -> ClientResult<Option<AccessToken>> {
        let raw = match self.token.clone() {
            Some(raw) => Some(raw),
            None => self.config.resolve_token()?,
        };
        raw.map(|raw| AccessToken::from_code(&raw).map_err(ClientError::from))
            .transpose()
    }

    /// Opens the selected event.
    pub fn service(&self) -> ClientResult<EventService> {
        let mut options = NormalizeOptions::new();
        if let Some(tz) = self.config.default_timezone()? {
            options = options.with_default_timezone(tz);
        }
        let mut service =
            EventService::new(self.source(), self.event_id()?).with_normalize_options(options);
        if let Some(token) = self.token()? {
            service = service.with_token(token);
        }
        Ok(service)
    }

    /// Loads the favorites of the selected event.
    pub fn favorites(&self) -> ClientResult<Favorites> {
        Ok(Favorites::load(ClientConfig::favorites_path(self.event_id()?)))
    }
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> ClientResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ClientError::Fetch(format!("failed to serialize output: {}", e)))?;
    println!("{}", json);
    Ok(())
}
