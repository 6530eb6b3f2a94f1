//! Shared helpers for the push integration tests.

#![allow(dead_code)]

use loki_log_sink::diagnostics::DiagnosticSink;
use loki_log_sink::http::HttpTransport;
use loki_log_sink::payload::PushPayload;
use loki_log_sink::{DispatchFailure, HandlerConfig, LokiHandler};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PUSH_PATH: &str = "/loki/api/v1/push";

/// Diagnostic sink that keeps every reported failure.
#[derive(Default)]
pub struct RecordingDiagnostics {
    reports: Mutex<Vec<DispatchFailure>>,
}

impl RecordingDiagnostics {
    pub fn reports(&self) -> Vec<DispatchFailure> {
        self.reports.lock().unwrap().clone()
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn report(&self, failure: &DispatchFailure) {
        self.reports.lock().unwrap().push(failure.clone());
    }
}

/// Start a Loki stand-in answering every push with `status`.
pub async fn loki(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

pub fn push_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), PUSH_PATH)
}

/// Handler using the real HTTP transport and a recording diagnostic sink.
pub fn http_handler(config: HandlerConfig) -> (LokiHandler, Arc<RecordingDiagnostics>) {
    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let handler = LokiHandler::new(
        config,
        Arc::new(HttpTransport::new().expect("http client")),
        diagnostics.clone(),
    )
    .expect("valid handler config");
    (handler, diagnostics)
}

/// Labels and decoded log line of the single stream in a push body.
pub fn decode_push(body: &[u8]) -> (BTreeMap<String, String>, Value) {
    let payload: PushPayload = serde_json::from_slice(body).expect("push payload");
    assert_eq!(payload.streams.len(), 1);
    let stream = payload.streams.into_iter().next().unwrap();
    assert_eq!(stream.values.len(), 1);
    let line = serde_json::from_str(&stream.values[0][1]).expect("json line");
    (stream.stream, line)
}

pub async fn received(server: &MockServer) -> Vec<wiremock::Request> {
    server.received_requests().await.unwrap_or_default()
}
