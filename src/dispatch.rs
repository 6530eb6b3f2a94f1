//! Delivery strategies across the configured destinations.
//!
//! [`Strategy::All`] posts to every url concurrently and records each
//! outcome. [`Strategy::Fallback`] walks the urls in order and stops at the
//! first one that accepts the payload. Neither retries a destination within
//! the same dispatch.

use crate::error::{ConfigError, DispatchFailure, FailedDestination, FailedDestinations, TransportError};
use crate::transport::{PushRequest, Transport};
use futures::future::join_all;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// How a payload is spread over the configured destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Strategy {
    /// Broadcast to every destination.
    All,
    /// Try destinations in order until one succeeds.
    #[default]
    Fallback,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::All => "all",
            Strategy::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Strategy::All),
            "fallback" => Ok(Strategy::Fallback),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

impl TryFrom<String> for Strategy {
    type Error = ConfigError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

/// Result of one attempt against one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub url: String,
    pub succeeded: bool,
    pub error: Option<TransportError>,
}

/// Outcomes of one dispatch, in configured url order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub strategy: Strategy,
    pub outcomes: Vec<DispatchOutcome>,
}

impl DispatchReport {
    /// At least one destination accepted the payload.
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().any(|o| o.succeeded)
    }

    pub fn failed(&self) -> Vec<FailedDestination> {
        self.outcomes
            .iter()
            .filter_map(|o| {
                o.error.as_ref().map(|error| FailedDestination {
                    url: o.url.clone(),
                    error: error.clone(),
                })
            })
            .collect()
    }

    /// The failure to surface, if any.
    ///
    /// Fallback fails only when every destination failed. Broadcast fails
    /// as soon as one destination failed; a broadcast with no destinations
    /// at all counts as exhausted.
    pub fn failure(&self) -> Option<DispatchFailure> {
        let failed = self.failed();
        let attempted = self.outcomes.len();

        if !self.succeeded() {
            return Some(DispatchFailure::Exhausted {
                strategy: self.strategy,
                attempted,
                failed: FailedDestinations(failed),
            });
        }
        if self.strategy == Strategy::All && !failed.is_empty() {
            return Some(DispatchFailure::Partial {
                attempted,
                failed_count: failed.len(),
                failed: FailedDestinations(failed),
            });
        }
        None
    }

    pub fn is_failure(&self) -> bool {
        self.failure().is_some()
    }
}

/// Deliver `request` to `urls` according to `strategy`.
pub async fn dispatch(
    strategy: Strategy,
    request: &PushRequest,
    urls: &[String],
    transport: &dyn Transport,
) -> DispatchReport {
    let outcomes = match strategy {
        Strategy::All => broadcast(request, urls, transport).await,
        Strategy::Fallback => fallback(request, urls, transport).await,
    };
    debug!(
        strategy = %strategy,
        attempted = outcomes.len(),
        "push dispatch finished"
    );
    DispatchReport { strategy, outcomes }
}

async fn broadcast(
    request: &PushRequest,
    urls: &[String],
    transport: &dyn Transport,
) -> Vec<DispatchOutcome> {
    join_all(urls.iter().map(|url| attempt(request, url, transport))).await
}

async fn fallback(
    request: &PushRequest,
    urls: &[String],
    transport: &dyn Transport,
) -> Vec<DispatchOutcome> {
    let mut outcomes = Vec::with_capacity(urls.len());
    for (i, url) in urls.iter().enumerate() {
        let outcome = attempt(request, url, transport).await;
        let succeeded = outcome.succeeded;
        outcomes.push(outcome);
        if succeeded {
            break;
        }
        if let Some(next) = urls.get(i + 1) {
            debug!(failed = %url, next = %next, "falling back to next destination");
        }
    }
    outcomes
}

async fn attempt(request: &PushRequest, url: &str, transport: &dyn Transport) -> DispatchOutcome {
    match transport.post(url, request).await {
        Ok(()) => DispatchOutcome {
            url: url.to_string(),
            succeeded: true,
            error: None,
        },
        Err(err) => {
            warn!(url = %url, error = %err, "log push attempt failed");
            DispatchOutcome {
                url: url.to_string(),
                succeeded: false,
                error: Some(err),
            }
        }
    }
}
