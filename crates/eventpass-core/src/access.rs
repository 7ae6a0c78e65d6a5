//! Access tokens and endpoint URLs for token-gated event APIs.
//!
//! Tokens are validated before any request URL is built. A token is
//! non-empty and made of ASCII letters, digits, `-` and `_` only.

use std::fmt;

use url::Url;

use crate::error::{ScheduleError, ScheduleResult};

/// Default base URL of the event portal.
pub const DEFAULT_PORTAL_URL: &str = "https://portal.opass.app/events/";

/// Returns true if `token` is non-empty and uses only allowed characters.
///
/// No trimming is done here; see [`AccessToken::parse`].
pub fn is_valid_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// A validated attendee access token.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccessToken(String);

impl AccessToken {
    /// Trims surrounding whitespace and validates the token.
    pub fn parse(raw: &str) -> ScheduleResult<Self> {
        let token = raw.trim();
        if is_valid_token(token) {
            Ok(Self(token.to_string()))
        } else {
            Err(ScheduleError::InvalidToken)
        }
    }

    /// Extracts a token from a scanned code.
    ///
    /// Accepts a URL carrying a `token` query parameter, or a bare token that
    /// may be percent-encoded.
    pub fn from_code(code: &str) -> ScheduleResult<Self> {
        let code = code.trim();
        if let Ok(url) = Url::parse(code) {
            return url
                .query_pairs()
                .find(|(key, _)| key == "token")
                .ok_or(ScheduleError::InvalidToken)
                .and_then(|(_, value)| Self::parse(&value));
        }
        let decoded = urlencoding::decode(code).map_err(|_| ScheduleError::InvalidToken)?;
        Self::parse(&decoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl std::str::FromStr for AccessToken {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A token-gated endpoint below a feature's base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint<'a> {
    /// `{base}/announcement?token=`
    Announcements,
    /// `{base}/status?token=`
    ScenarioStatus,
    /// `{base}/use/{scenario}?token=`
    ScenarioUse(&'a str),
}

impl Endpoint<'_> {
    /// Builds the request URL for this endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidUrl`] if `base` is not an absolute
    /// hierarchical URL.
    pub fn url(&self, base: &str, token: &AccessToken) -> ScheduleResult<Url> {
        let mut url = parse_base(base)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| cannot_be_base(base))?;
            segments.pop_if_empty();
            match self {
                Self::Announcements => {
                    segments.push("announcement");
                }
                Self::ScenarioStatus => {
                    segments.push("status");
                }
                Self::ScenarioUse(scenario) => {
                    segments.push("use").push(scenario);
                }
            }
        }
        url.query_pairs_mut().append_pair("token", token.as_str());
        Ok(url)
    }
}

/// URLs of the event portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portal {
    base: Url,
}

impl Portal {
    /// Creates a portal rooted at `base`.
    pub fn new(base: &str) -> ScheduleResult<Self> {
        let base = parse_base(base)?;
        if base.cannot_be_a_base() {
            return Err(cannot_be_base(base.as_str()));
        }
        Ok(Self { base })
    }

    /// URL listing every event.
    pub fn event_list(&self) -> Url {
        self.base.clone()
    }

    /// URL of one event's settings document.
    pub fn event_settings(&self, event_id: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(event_id);
        }
        url
    }
}

fn parse_base(base: &str) -> ScheduleResult<Url> {
    Url::parse(base.trim()).map_err(|source| ScheduleError::InvalidUrl {
        url: base.to_string(),
        source,
    })
}

fn cannot_be_base(base: &str) -> ScheduleError {
    ScheduleError::InvalidUrl {
        url: base.to_string(),
        source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(raw: &str) -> AccessToken {
        AccessToken::parse(raw).unwrap()
    }

    mod validation {
        use super::*;

        #[test]
        fn accepts_allowed_characters() {
            assert!(is_valid_token("abc-123_XYZ"));
            assert!(is_valid_token("7679f08f7eaeef5e9a65a1738ae2840e"));
        }

        #[test]
        fn rejects_disallowed_characters() {
            assert!(!is_valid_token(""));
            assert!(!is_valid_token("abc def"));
            assert!(!is_valid_token("abc!"));
            assert!(!is_valid_token("token?x=1"));
            assert!(!is_valid_token("ünïcode"));
            assert!(!is_valid_token(" abc"));
        }

        #[test]
        fn parse_trims_first() {
            assert_eq!(token("  abc-123\n").as_str(), "abc-123");
        }

        #[test]
        fn parse_rejects_blank_and_inner_space() {
            let err = AccessToken::parse("   ").unwrap_err();
            assert!(matches!(err, ScheduleError::InvalidToken));
            assert!(err.is_recoverable());
            assert!(AccessToken::parse("abc def").is_err());
        }

        #[test]
        fn debug_hides_token() {
            assert_eq!(format!("{:?}", token("secret")), "AccessToken(***)");
        }

        #[test]
        fn from_code_reads_query_parameter() {
            let t = AccessToken::from_code("opass://login?event_id=X&token=abc_123").unwrap();
            assert_eq!(t.as_str(), "abc_123");
            assert!(AccessToken::from_code("https://example.org/?other=1").is_err());
        }

        #[test]
        fn from_code_accepts_bare_and_encoded() {
            assert_eq!(AccessToken::from_code("abc").unwrap().as_str(), "abc");
            assert_eq!(AccessToken::from_code("abc%2D1").unwrap().as_str(), "abc-1");
            assert!(AccessToken::from_code("abc%20def").is_err());
        }
    }

    mod endpoints {
        use super::*;

        #[test]
        fn announcement_url() {
            let url = Endpoint::Announcements
                .url("https://ccip.example.org", &token("abc"))
                .unwrap();
            assert_eq!(
                url.as_str(),
                "https://ccip.example.org/announcement?token=abc"
            );
        }

        #[test]
        fn status_url_with_path_and_trailing_slash() {
            let url = Endpoint::ScenarioStatus
                .url("https://example.org/ccip/", &token("abc"))
                .unwrap();
            assert_eq!(url.as_str(), "https://example.org/ccip/status?token=abc");
        }

        #[test]
        fn scenario_use_encodes_scenario() {
            let url = Endpoint::ScenarioUse("day1 lunch")
                .url("https://ccip.example.org", &token("abc"))
                .unwrap();
            assert_eq!(
                url.as_str(),
                "https://ccip.example.org/use/day1%20lunch?token=abc"
            );
        }

        #[test]
        fn invalid_base() {
            let err = Endpoint::Announcements
                .url("not a url", &token("abc"))
                .unwrap_err();
            assert!(matches!(err, ScheduleError::InvalidUrl { .. }));

            let err = Endpoint::Announcements
                .url("mailto:someone@example.org", &token("abc"))
                .unwrap_err();
            assert!(matches!(err, ScheduleError::InvalidUrl { .. }));
        }
    }

    mod portal {
        use super::*;

        #[test]
        fn default_urls() {
            let portal = Portal::new(DEFAULT_PORTAL_URL).unwrap();
            assert_eq!(portal.event_list().as_str(), DEFAULT_PORTAL_URL);
            assert_eq!(
                portal.event_settings("COSCUP_2024").as_str(),
                "https://portal.opass.app/events/COSCUP_2024"
            );
        }

        #[test]
        fn custom_base_without_trailing_slash() {
            let portal = Portal::new("http://localhost:8080/events").unwrap();
            assert_eq!(
                portal.event_settings("SITCON").as_str(),
                "http://localhost:8080/events/SITCON"
            );
        }
    }
}
