use crate::config::HandlerConfig;
use crate::error::TransportError;
use crate::payload::PushPayload;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use std::time::Duration;

/// Content type attached to every push unless a configured header overrides it.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Asynchronous delivery of one encoded push request to one url.
///
/// Implementations perform exactly one attempt per call. Retrying other
/// destinations is the dispatch strategy's business, not the transport's.
/// The same transport is shared by every in-flight dispatch, so it must be
/// safe for concurrent use.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `request` to `url`.
    ///
    /// **Returns**
    /// - `Ok(())` if the destination answered with a 2xx status.
    /// - `Err(..)` on a non-success status, timeout or connection error.
    async fn post(&self, url: &str, request: &PushRequest) -> Result<(), TransportError>;
}

/// Encoded payload plus everything needed to send it, shared by all the
/// attempts of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushRequest {
    pub body: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl PushRequest {
    pub fn new(payload: &PushPayload, headers: Vec<(String, String)>, timeout: Duration) -> Self {
        PushRequest {
            body: payload.encode(),
            headers,
            timeout,
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Headers attached to every attempt: the JSON content type, configured
/// static headers (which win on a name collision) and, when credentials are
/// configured, a Basic `Authorization` header.
pub fn push_headers(config: &HandlerConfig) -> Vec<(String, String)> {
    let mut headers = vec![("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string())];
    for (name, value) in &config.headers {
        headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        headers.push((name.clone(), value.clone()));
    }
    if let Some(auth) = &config.auth {
        let credentials = format!("{}:{}", auth.username, auth.password);
        let encoded = BASE64_STANDARD.encode(credentials.as_bytes());
        headers.retain(|(key, _)| !key.eq_ignore_ascii_case("Authorization"));
        headers.push(("Authorization".to_string(), format!("Basic {}", encoded)));
    }
    headers
}
