//! Environment variable names used by this crate for convenient
//! configuration of the handler from services.
//!
//! These are purely helpers; the handler itself only ever sees a
//! [`HandlerConfig`].

use crate::config::HandlerConfig;
use crate::dispatch::Strategy;
use crate::error::ConfigError;
use std::time::Duration;

/// Comma separated list of push urls, e.g. `http://loki1:3100/loki/api/v1/push`.
pub const LOKI_URLS_ENV: &str = "LOKI_URLS";

/// Dispatch strategy name, `all` or `fallback`.
pub const LOKI_STRATEGY_ENV: &str = "LOKI_STRATEGY";

/// Per-attempt timeout in seconds.
pub const LOKI_TIMEOUT_SECS_ENV: &str = "LOKI_TIMEOUT_SECS";

/// Optional Basic auth user name.
pub const LOKI_USERNAME_ENV: &str = "LOKI_USERNAME";

/// Optional Basic auth password.
pub const LOKI_PASSWORD_ENV: &str = "LOKI_PASSWORD";

/// Comma separated list of label keys.
pub const LOKI_TAGS_ENV: &str = "LOKI_TAGS";

/// Build a validated [`HandlerConfig`] from the process environment.
pub fn config_from_env() -> Result<HandlerConfig, ConfigError> {
    config_from_lookup(|key| std::env::var(key).ok())
}

/// Build a validated [`HandlerConfig`] from an arbitrary key lookup.
pub fn config_from_lookup<F>(lookup: F) -> Result<HandlerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let urls = split_list(&lookup(LOKI_URLS_ENV).unwrap_or_default());
    let mut urls = urls.into_iter();
    let first = urls.next().ok_or(ConfigError::NoUrls)?;

    let mut builder = HandlerConfig::builder(first);
    for url in urls {
        builder = builder.url(url);
    }

    if let Some(strategy) = lookup(LOKI_STRATEGY_ENV) {
        builder = builder.strategy(strategy.parse::<Strategy>()?);
    }

    if let Some(raw) = lookup(LOKI_TIMEOUT_SECS_ENV) {
        let timeout = raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .ok_or_else(|| ConfigError::InvalidEnv {
                key: LOKI_TIMEOUT_SECS_ENV.to_string(),
                value: raw.clone(),
            })?;
        builder = builder.timeout(timeout);
    }

    match (lookup(LOKI_USERNAME_ENV), lookup(LOKI_PASSWORD_ENV)) {
        (Some(username), password) => {
            builder = builder.basic_auth(username, password.unwrap_or_default());
        }
        // A password alone would silently disable authentication.
        (None, Some(_)) => {
            return Err(ConfigError::InvalidEnv {
                key: LOKI_USERNAME_ENV.to_string(),
                value: String::new(),
            });
        }
        (None, None) => {}
    }

    if let Some(tags) = lookup(LOKI_TAGS_ENV) {
        builder = builder.tags(split_list(&tags));
    }

    builder.build()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
