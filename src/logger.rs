use crate::dispatch::DispatchReport;
use crate::handler::LokiHandler;
use crate::merge::LoggerContext;
use crate::record::{Level, LogRecord, Message};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A named logger bound to one [`LokiHandler`] and its own metadata.
///
/// There is no global registry: build loggers where they are needed and
/// pass them around like any other value.
#[derive(Clone)]
pub struct Logger {
    name: String,
    context: LoggerContext,
    handler: Arc<LokiHandler>,
}

impl Logger {
    pub fn new(name: impl Into<String>, handler: Arc<LokiHandler>) -> Self {
        Logger {
            name: name.into(),
            context: LoggerContext::default(),
            handler,
        }
    }

    /// Attach logger-level metadata, overriding handler defaults.
    pub fn with_meta<K, V>(mut self, meta: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.context
            .meta
            .extend(meta.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &LoggerContext {
        &self.context
    }

    /// Emit a record with per-call metadata.
    pub fn log(
        &self,
        level: Level,
        message: impl Into<Message>,
        meta: BTreeMap<String, String>,
    ) -> JoinHandle<DispatchReport> {
        let record = LogRecord::new(self.name.clone(), level, message).with_meta(meta);
        self.handler.emit_with_context(&self.context, record)
    }

    pub fn debug(&self, message: impl Into<Message>) -> JoinHandle<DispatchReport> {
        self.log(Level::Debug, message, BTreeMap::new())
    }

    pub fn info(&self, message: impl Into<Message>) -> JoinHandle<DispatchReport> {
        self.log(Level::Info, message, BTreeMap::new())
    }

    pub fn warning(&self, message: impl Into<Message>) -> JoinHandle<DispatchReport> {
        self.log(Level::Warning, message, BTreeMap::new())
    }

    pub fn error(&self, message: impl Into<Message>) -> JoinHandle<DispatchReport> {
        self.log(Level::Error, message, BTreeMap::new())
    }

    pub fn critical(&self, message: impl Into<Message>) -> JoinHandle<DispatchReport> {
        self.log(Level::Critical, message, BTreeMap::new())
    }
}
