use crate::dispatch::Strategy;
use std::fmt;

/// Failure of a single push attempt to one destination.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("destination responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Error returned when a handler configuration is rejected at setup time.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least one destination url is required")]
    NoUrls,

    #[error("invalid destination url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request timeout must be greater than zero")]
    InvalidTimeout,

    #[error("unknown dispatch strategy {0:?} (expected \"all\" or \"fallback\")")]
    UnknownStrategy(String),

    #[error("invalid header {0:?}")]
    InvalidHeader(String),

    #[error("invalid value {value:?} for {key}")]
    InvalidEnv { key: String, value: String },

    #[error("a tokio runtime is required to build the handler")]
    NoRuntime,

    #[error("malformed handler profile: {0}")]
    Profile(String),

    #[error("HTTP client could not be built: {0}")]
    Client(String),
}

/// One destination that did not accept the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDestination {
    pub url: String,
    pub error: TransportError,
}

/// Failed destinations rendered as `url (cause); url (cause)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FailedDestinations(pub Vec<FailedDestination>);

impl fmt::Display for FailedDestinations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failed) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} ({})", failed.url, failed.error)?;
        }
        Ok(())
    }
}

/// A shipping failure handed to the [`DiagnosticSink`](crate::diagnostics::DiagnosticSink).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchFailure {
    /// No destination accepted the payload.
    #[error("log delivery failed on every destination ({strategy} strategy, {attempted} attempted): {failed}")]
    Exhausted {
        strategy: Strategy,
        attempted: usize,
        failed: FailedDestinations,
    },

    /// Broadcast reached some destinations but not all of them.
    #[error("log delivery failed on {failed_count} of {attempted} destinations: {failed}")]
    Partial {
        attempted: usize,
        failed_count: usize,
        failed: FailedDestinations,
    },
}
