use crate::handler::LokiHandler;
use crate::merge::LoggerContext;
use crate::record::{Level, LogRecord, Message};
use std::collections::{BTreeMap, HashMap};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Event targets that belong to the delivery path itself. Shipping them
/// would feed every push attempt back into the handler.
const SELF_TARGETS: &[&str] = &["loki_log_sink", "reqwest", "hyper", "h2", "rustls"];

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// hands them to a [`LokiHandler`].
///
/// The event target is used as the logger name, and the `message` field as
/// the message. Every other field becomes call metadata. Logger-level
/// metadata can be bound to a target with [`with_logger_meta`](Self::with_logger_meta).
pub struct LokiLayer {
    handler: LokiHandler,
    min_level: tracing::Level,
    contexts: HashMap<String, LoggerContext>,
    /// Total events seen by the layer (before filtering).
    pub total_events: Arc<AtomicU64>,
    /// Events handed to the handler.
    pub shipped_events: Arc<AtomicU64>,
}

impl LokiLayer {
    /// Create a layer shipping events at `min_level` and above.
    pub fn new(handler: LokiHandler, min_level: tracing::Level) -> Self {
        Self {
            handler,
            min_level,
            contexts: HashMap::new(),
            total_events: Arc::new(AtomicU64::new(0)),
            shipped_events: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Bind logger-level metadata to every event with this exact target.
    pub fn with_logger_meta(mut self, target: impl Into<String>, context: LoggerContext) -> Self {
        self.contexts.insert(target.into(), context);
        self
    }

    fn is_self_target(target: &str) -> bool {
        SELF_TARGETS.iter().any(|own| {
            target
                .strip_prefix(*own)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
        })
    }
}

impl<S> Layer<S> for LokiLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let meta = event.metadata();
        // More verbose levels compare greater in `tracing`.
        if *meta.level() > self.min_level || Self::is_self_target(meta.target()) {
            return;
        }

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        let record = LogRecord::new(
            meta.target(),
            Level::from(meta.level()),
            Message::Text(message.unwrap_or_default()),
        )
        .with_meta(fields);

        let context = self.contexts.get(meta.target());
        // Delivery runs detached; the handle is not needed here.
        drop(match context {
            Some(context) => self.handler.emit_with_context(context, record),
            None => self.handler.emit(record),
        });
        self.shipped_events.fetch_add(1, Ordering::Relaxed);
    }
}

/// Collects event fields as strings; `message` is kept apart.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, String>,
    pub message: &'a mut Option<String>,
}

impl<'a> FieldVisitor<'a> {
    fn insert(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            *self.message = Some(value);
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, format!("{:?}", value));
    }
}
