use crate::dispatch::Strategy;
use crate::error::ConfigError;
use crate::merge::default_tag_keys;
use reqwest::header::{HeaderName, HeaderValue};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Per-attempt timeout used when the configuration does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Credentials for HTTP Basic authentication.
///
/// Deserializes from a two element `[username, password]` list.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "(String, String)")]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        BasicAuth {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl From<(String, String)> for BasicAuth {
    fn from((username, password): (String, String)) -> Self {
        BasicAuth { username, password }
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Handler configuration, read once at setup and immutable afterwards.
///
/// **Fields**
/// - `urls`: push endpoints, tried in this order by the fallback strategy.
/// - `strategy`: [`Strategy::All`] broadcasts, [`Strategy::Fallback`]
///   stops at the first destination that accepts the payload.
/// - `timeout`: bound on every single attempt, in seconds when
///   deserialized.
/// - `auth`: optional Basic credentials attached to every attempt.
/// - `meta`: handler-level default metadata, lowest precedence.
/// - `tags`: metadata keys promoted to stream labels (also accepted as
///   `loki_tags`).
/// - `headers`: static headers; they override the default `Content-Type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Profile")]
pub struct HandlerConfig {
    pub urls: Vec<String>,
    pub strategy: Strategy,
    pub timeout: Duration,
    pub auth: Option<BasicAuth>,
    pub meta: BTreeMap<String, String>,
    pub tags: Vec<String>,
    pub headers: BTreeMap<String, String>,
}

/// Serialized shape of a [`HandlerConfig`], before validation.
#[derive(Debug, Deserialize)]
struct Profile {
    urls: Vec<String>,
    #[serde(default)]
    strategy: Option<String>,
    #[serde(default)]
    timeout: Option<f64>,
    #[serde(default)]
    auth: Option<BasicAuth>,
    #[serde(default)]
    meta: BTreeMap<String, String>,
    #[serde(default, alias = "loki_tags")]
    tags: Option<Vec<String>>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

impl TryFrom<Profile> for HandlerConfig {
    type Error = ConfigError;

    fn try_from(profile: Profile) -> Result<Self, Self::Error> {
        let strategy = match profile.strategy {
            Some(name) => name.parse()?,
            None => Strategy::default(),
        };
        let timeout = match profile.timeout {
            Some(secs) => {
                Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidTimeout)?
            }
            None => DEFAULT_TIMEOUT,
        };
        let config = HandlerConfig {
            urls: profile.urls,
            strategy,
            timeout,
            auth: profile.auth,
            meta: profile.meta,
            tags: profile.tags.unwrap_or_else(default_tag_keys),
            headers: profile.headers,
        };
        config.validate()?;
        Ok(config)
    }
}

impl HandlerConfig {
    /// Start a builder with a first destination url.
    pub fn builder(url: impl Into<String>) -> HandlerConfigBuilder {
        HandlerConfigBuilder::new(url)
    }

    /// Parse a JSON profile and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let profile: Profile =
            serde_json::from_str(json).map_err(|e| ConfigError::Profile(e.to_string()))?;
        Self::try_from(profile)
    }

    /// Reject configurations that could never ship a record.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.urls.is_empty() {
            return Err(ConfigError::NoUrls);
        }
        for url in &self.urls {
            let parsed = reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
                url: url.clone(),
                reason: e.to_string(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidUrl {
                    url: url.clone(),
                    reason: format!("unsupported scheme {}", parsed.scheme()),
                });
            }
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        for (name, value) in &self.headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ConfigError::InvalidHeader(name.clone()))?;
            HeaderValue::from_str(value).map_err(|_| ConfigError::InvalidHeader(name.clone()))?;
        }
        Ok(())
    }
}

/// Fluent construction of a validated [`HandlerConfig`].
#[derive(Debug, Clone)]
pub struct HandlerConfigBuilder {
    config: HandlerConfig,
}

impl HandlerConfigBuilder {
    fn new(url: impl Into<String>) -> Self {
        HandlerConfigBuilder {
            config: HandlerConfig {
                urls: vec![url.into()],
                strategy: Strategy::default(),
                timeout: DEFAULT_TIMEOUT,
                auth: None,
                meta: BTreeMap::new(),
                tags: default_tag_keys(),
                headers: BTreeMap::new(),
            },
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.urls.push(url.into());
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.auth = Some(BasicAuth::new(username, password));
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.meta.insert(key.into(), value.into());
        self
    }

    /// Replace the label keys.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> Result<HandlerConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
