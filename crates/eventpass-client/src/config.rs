//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/eventpass/config.toml` by default.
//!
//! The `event.token` value is a reference, never the token itself:
//! - `pass::path/in/store` resolved via `pass show`
//! - `env::VAR_NAME` resolved from the environment

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use eventpass_core::{DEFAULT_PORTAL_URL, Language, Portal, TracingOutputFormat};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::secret;

/// Configuration for the eventpass client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub portal: PortalSettings,
    pub event: EventConfig,
    pub display: DisplaySettings,
    pub network: NetworkSettings,
    pub logging: LoggingSettings,
}

/// Where event settings are published.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalSettings {
    pub base_url: String,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PORTAL_URL.to_string(),
        }
    }
}

/// The event to open when `--event` is not given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub id: Option<String>,

    /// IANA timezone for feed timestamps published without an offset.
    pub default_timezone: Option<String>,

    /// Secret reference for the access token (`pass::...` or `env::...`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Display settings for output formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// `zh`, `en`, or a tag such as `zh-TW`.
    pub language: String,

    /// Dim sessions that have already ended.
    pub dim_past_sessions: bool,

    /// Emit OSC 8 hyperlinks for session resources.
    pub hyperlinks: bool,

    /// Maximum title length (truncated with ellipsis).
    pub max_title_length: Option<usize>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            dim_past_sessions: true,
            hyperlinks: false,
            max_title_length: None,
        }
    }
}

/// HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self { timeout: 10 }
    }
}

/// Log output settings; `--debug` raises the level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `pretty`, `compact` or `json`.
    pub format: TracingOutputFormat,

    /// Filter directive such as `eventpass_client=debug`, overriding `RUST_LOG`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directive: Option<String>,
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ClientError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eventpass")
    }

    /// Returns the default data directory path.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eventpass")
    }

    /// Returns the favorites file of an event inside `data_dir`.
    pub fn favorites_path_in(data_dir: &Path, event_id: &str) -> PathBuf {
        data_dir.join(format!("{}-favorites.json", event_id))
    }

    /// Returns the favorites file of an event in the default data directory.
    pub fn favorites_path(event_id: &str) -> PathBuf {
        Self::favorites_path_in(&Self::default_data_dir(), event_id)
    }

    /// Returns the display language.
    pub fn language(&self) -> Language {
        Language::from_tag(&self.display.language)
    }

    /// Parses the configured default timezone.
    pub fn default_timezone(&self) -> ClientResult<Option<Tz>> {
        self.event
            .default_timezone
            .as_deref()
            .map(|name| {
                name.parse::<Tz>().map_err(|_| {
                    ClientError::Config(format!("unknown timezone {:?} in [event]", name))
                })
            })
            .transpose()
    }

    /// Builds the portal from `[portal] base_url`.
    pub fn portal(&self) -> ClientResult<Portal> {
        Ok(Portal::new(&self.portal.base_url)?)
    }

    /// Resolves the `[event] token` reference, if one is configured.
    pub fn resolve_token(&self) -> ClientResult<Option<String>> {
        self.event
            .token
            .as_deref()
            .map(|reference| {
                secret::resolve(reference)
                    .map_err(|e| ClientError::Config(format!("event.token: {}", e)))
            })
            .transpose()
    }

    /// Checks every value that can be checked without network access.
    pub fn validate(&self) -> ClientResult<()> {
        self.portal()?;
        self.default_timezone()?;
        if self.network.timeout == 0 {
            return Err(ClientError::Config(
                "network.timeout must be at least 1 second".to_string(),
            ));
        }
        if self
            .event
            .token
            .as_deref()
            .is_some_and(|reference| !secret::is_reference(reference))
        {
            return Err(ClientError::Config(
                "event.token must be a pass:: or env:: reference, not a literal token"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.portal.base_url, DEFAULT_PORTAL_URL);
        assert_eq!(config.network.timeout, 10);
        assert_eq!(config.language(), Language::En);
        assert!(config.display.dim_past_sessions);
        assert!(config.event.id.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [event]
            id = "COSCUP_2024"
            default_timezone = "Asia/Taipei"

            [display]
            language = "zh-TW"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.event.id.as_deref(), Some("COSCUP_2024"));
        assert_eq!(config.default_timezone().unwrap(), Some(chrono_tz::Asia::Taipei));
        assert_eq!(config.language(), Language::Zh);
        assert_eq!(config.network.timeout, 10);
        assert!(config.display.dim_past_sessions);
        assert_eq!(config.logging.format, TracingOutputFormat::Json);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[network]\ntimeout = 3\n").unwrap();
        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.network.timeout, 3);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[network\n").unwrap();
        let err = ClientConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn invalid_values() {
        let mut config = ClientConfig::default();
        config.event.default_timezone = Some("Nowhere/Land".to_string());
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.portal.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.network.timeout = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.event.token = Some("abc123".to_string());
        assert!(config.validate().is_err());
        config.event.token = Some("env::EVENTPASS_TEST_TOKEN_REF".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn favorites_path_is_per_event() {
        let path = ClientConfig::favorites_path_in(Path::new("/data/eventpass"), "SITCON_2024");
        assert_eq!(path, PathBuf::from("/data/eventpass/SITCON_2024-favorites.json"));
    }

    #[test]
    fn token_reference_is_not_serialized_when_absent() {
        let dumped = toml::to_string_pretty(&ClientConfig::default()).unwrap();
        assert!(!dumped.contains("token"));
        assert!(dumped.contains("base_url"));
    }
}
