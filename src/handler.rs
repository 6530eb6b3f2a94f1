use crate::config::HandlerConfig;
use crate::diagnostics::{DiagnosticSink, StderrDiagnostics};
use crate::dispatch::{dispatch, DispatchReport};
use crate::error::ConfigError;
use crate::http::HttpTransport;
use crate::merge::{merge, LoggerContext};
use crate::payload::format;
use crate::record::LogRecord;
use crate::transport::{push_headers, PushRequest, Transport};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Ships [`LogRecord`]s to the configured Loki destinations without
/// blocking the caller.
///
/// Merging and formatting happen synchronously inside [`emit`](Self::emit),
/// so records keep their emission order up to the point of scheduling.
/// Delivery runs as an independent task on the runtime that was current
/// when the handler was built; deliveries of distinct records are not
/// ordered against each other.
///
/// The handler is cheap to clone and holds nothing mutable, so `emit` may
/// be called from any number of threads at once.
#[derive(Clone)]
pub struct LokiHandler {
    config: Arc<HandlerConfig>,
    headers: Arc<Vec<(String, String)>>,
    transport: Arc<dyn Transport>,
    diagnostics: Arc<dyn DiagnosticSink>,
    runtime: Handle,
}

impl LokiHandler {
    /// Build a handler from a validated configuration.
    ///
    /// **Errors**
    /// - any [`ConfigError`] reported by [`HandlerConfig::validate`].
    /// - [`ConfigError::NoRuntime`] when called outside a tokio runtime.
    pub fn new(
        config: HandlerConfig,
        transport: Arc<dyn Transport>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;
        let headers = push_headers(&config);
        Ok(Self {
            config: Arc::new(config),
            headers: Arc::new(headers),
            transport,
            diagnostics,
            runtime,
        })
    }

    /// Handler with the default HTTP transport, reporting failures on stderr.
    ///
    /// **Errors**
    /// - [`ConfigError::Client`] if the HTTP client cannot be initialised.
    /// - anything [`new`](Self::new) reports.
    pub fn with_http(config: HandlerConfig) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new().map_err(|e| ConfigError::Client(e.to_string()))?;
        Self::new(config, Arc::new(transport), Arc::new(StderrDiagnostics))
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Ship a record that carries no logger context.
    pub fn emit(&self, record: LogRecord) -> JoinHandle<DispatchReport> {
        self.emit_with_context(&LoggerContext::default(), record)
    }

    /// Ship a record emitted by a logger bound to `context`.
    ///
    /// Returns the delivery task so callers may await it; dropping the handle
    /// does not cancel delivery.
    pub fn emit_with_context(
        &self,
        context: &LoggerContext,
        record: LogRecord,
    ) -> JoinHandle<DispatchReport> {
        let merged = merge(&self.config.meta, &context.meta, &record, &self.config.tags);
        let payload = format(&merged, record.timestamp);
        let request = PushRequest::new(&payload, self.headers.as_ref().clone(), self.config.timeout);

        let config = Arc::clone(&self.config);
        let transport = Arc::clone(&self.transport);
        let diagnostics = Arc::clone(&self.diagnostics);

        self.runtime.spawn(async move {
            let report = dispatch(config.strategy, &request, &config.urls, transport.as_ref()).await;
            if let Some(failure) = report.failure() {
                diagnostics.report(&failure);
            }
            report
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Strategy;
    use crate::payload::PushPayload;
    use crate::error::DispatchFailure;
    use crate::record::Level;
    use crate::testing::{RecordingDiagnostics, RecordingTransport};
    use serde_json::{json, Value};

    fn handler(
        config: HandlerConfig,
        transport: Arc<RecordingTransport>,
        diagnostics: Arc<RecordingDiagnostics>,
    ) -> LokiHandler {
        LokiHandler::new(config, transport, diagnostics).unwrap()
    }

    fn three_urls(strategy: Strategy) -> HandlerConfig {
        HandlerConfig::builder("http://loki1")
            .url("http://loki2")
            .url("http://loki3")
            .strategy(strategy)
            .build()
            .unwrap()
    }

    fn decode(body: &str) -> PushPayload {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn building_outside_a_runtime_fails() {
        let config = HandlerConfig::builder("http://loki").build().unwrap();
        let result = LokiHandler::new(
            config,
            Arc::new(RecordingTransport::new()),
            Arc::new(RecordingDiagnostics::default()),
        );
        assert!(matches!(result, Err(ConfigError::NoRuntime)));
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_at_setup() {
        let mut config = HandlerConfig::builder("http://loki").build().unwrap();
        config.urls.clear();
        let result = LokiHandler::new(
            config,
            Arc::new(RecordingTransport::new()),
            Arc::new(RecordingDiagnostics::default()),
        );
        assert!(matches!(result, Err(ConfigError::NoUrls)));
    }

    #[tokio::test]
    async fn emit_ships_labels_and_body() {
        let transport = Arc::new(RecordingTransport::new());
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let config = HandlerConfig::builder("http://loki")
            .meta("handler_meta", "000")
            .build()
            .unwrap();
        let handler = handler(config, transport.clone(), diagnostics.clone());

        let record = LogRecord::new("component", Level::Error, "Error");
        let timestamp = record.timestamp;
        let report = handler.emit(record).await.unwrap();

        assert!(report.succeeded());
        let attempts = transport.attempts();
        assert_eq!(attempts.len(), 1);
        let payload = decode(&attempts[0].request.body);
        let stream = &payload.streams[0];
        assert_eq!(stream.stream["logger"], "component");
        assert_eq!(stream.stream["level"], "error");
        assert_eq!(stream.values[0][0], crate::payload::unix_nanos(timestamp));
        let line: Value = serde_json::from_str(&stream.values[0][1]).unwrap();
        assert_eq!(line, json!({"msg": "Error", "handler_meta": "000"}));
        assert!(diagnostics.reports().is_empty());
    }

    #[tokio::test]
    async fn logger_context_sits_between_handler_and_call() {
        let transport = Arc::new(RecordingTransport::new());
        let config = HandlerConfig::builder("http://loki")
            .meta("a", "1")
            .build()
            .unwrap();
        let handler = handler(config, transport.clone(), Arc::default());

        let context = LoggerContext::new([("a", "2"), ("b", "1")]);
        let record = LogRecord::new("component", Level::Info, "hi").with_meta([("b", "2"), ("c", "1")]);
        handler.emit_with_context(&context, record).await.unwrap();

        let payload = decode(&transport.attempts()[0].request.body);
        let line: Value = serde_json::from_str(&payload.streams[0].values[0][1]).unwrap();
        assert_eq!(line, json!({"msg": "hi", "a": "2", "b": "2", "c": "1"}));
    }

    #[tokio::test]
    async fn broadcast_sends_identical_payloads() {
        let transport = Arc::new(RecordingTransport::failing(["http://loki1"]));
        let handler = handler(three_urls(Strategy::All), transport.clone(), Arc::default());

        handler
            .emit(LogRecord::new("component", Level::Critical, "Critical"))
            .await
            .unwrap();

        let attempts = transport.attempts();
        assert_eq!(attempts.len(), 3);
        assert!(attempts.iter().all(|a| a.request == attempts[0].request));
    }

    #[tokio::test]
    async fn fallback_success_reports_nothing() {
        let transport = Arc::new(RecordingTransport::failing(["http://loki1", "http://loki2"]));
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let handler = handler(three_urls(Strategy::Fallback), transport.clone(), diagnostics.clone());

        let report = handler
            .emit(LogRecord::new("component", Level::Critical, "Critical"))
            .await
            .unwrap();

        assert_eq!(transport.urls(), vec!["http://loki1", "http://loki2", "http://loki3"]);
        assert!(report.succeeded());
        assert!(diagnostics.reports().is_empty());
    }

    #[tokio::test]
    async fn fallback_exhaustion_reports_once() {
        let transport = Arc::new(RecordingTransport::failing([
            "http://loki1",
            "http://loki2",
            "http://loki3",
        ]));
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let handler = handler(three_urls(Strategy::Fallback), transport.clone(), diagnostics.clone());

        handler
            .emit(LogRecord::new("component", Level::Critical, "Critical"))
            .await
            .unwrap();

        assert_eq!(transport.attempts().len(), 3);
        let reports = diagnostics.reports();
        assert_eq!(reports.len(), 1);
        assert!(matches!(
            reports[0],
            DispatchFailure::Exhausted { attempted: 3, .. }
        ));
    }

    #[tokio::test]
    async fn partial_broadcast_is_reported() {
        let transport = Arc::new(RecordingTransport::failing(["http://loki2"]));
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let handler = handler(three_urls(Strategy::All), transport, diagnostics.clone());

        handler
            .emit(LogRecord::new("component", Level::Info, "hi"))
            .await
            .unwrap();

        let reports = diagnostics.reports();
        assert_eq!(reports.len(), 1);
        assert!(matches!(reports[0], DispatchFailure::Partial { failed_count: 1, .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_emits_keep_their_own_payloads() {
        let transport = Arc::new(RecordingTransport::new());
        let handler = handler(
            HandlerConfig::builder("http://loki").build().unwrap(),
            transport.clone(),
            Arc::default(),
        );

        let mut threads = Vec::new();
        for i in 0..8 {
            let handler = handler.clone();
            threads.push(std::thread::spawn(move || {
                handler.emit(LogRecord::new("component", Level::Info, format!("record {}", i)))
            }));
        }
        for thread in threads {
            thread.join().unwrap().await.unwrap();
        }

        let mut messages: Vec<String> = transport
            .attempts()
            .iter()
            .map(|a| {
                let payload = decode(&a.request.body);
                let line: Value = serde_json::from_str(&payload.streams[0].values[0][1]).unwrap();
                line["msg"].as_str().unwrap().to_string()
            })
            .collect();
        messages.sort();
        let mut expected: Vec<String> = (0..8).map(|i| format!("record {}", i)).collect();
        expected.sort();
        assert_eq!(messages, expected);
    }
}
