//! Metadata merging: handler defaults, logger context and per-call
//! metadata are flattened into one mapping and split into stream labels
//! and the JSON body of the log line.

use crate::record::{LogRecord, Message};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Body key holding a plain-text message.
pub const MESSAGE_KEY: &str = "msg";
/// Implicit metadata key carrying the logger name.
pub const LOGGER_KEY: &str = "logger";
/// Implicit metadata key carrying the level name.
pub const LEVEL_KEY: &str = "level";

/// Tag keys used when the configuration does not name any.
pub fn default_tag_keys() -> Vec<String> {
    vec![LOGGER_KEY.to_string(), LEVEL_KEY.to_string()]
}

/// Metadata bound to one logger for its whole lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggerContext {
    pub meta: BTreeMap<String, String>,
}

impl LoggerContext {
    pub fn new<K, V>(meta: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        LoggerContext {
            meta: meta.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// A record split into the label set of its stream and the log line body.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub labels: BTreeMap<String, String>,
    pub body: Map<String, Value>,
}

/// Apply the three metadata scopes in precedence order: handler defaults,
/// then logger context, then call metadata. Later scopes overwrite keys.
pub fn flatten_metadata(
    default_meta: &BTreeMap<String, String>,
    logger_meta: &BTreeMap<String, String>,
    call_meta: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut flat = default_meta.clone();
    for scope in [logger_meta, call_meta] {
        flat.extend(scope.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    flat
}

/// Merge a record with the handler and logger metadata.
///
/// `logger` and `level` are injected after the metadata scopes so they
/// always describe the record itself. Keys named in `tag_keys` become
/// labels; every other key lands in the body. Tag keys missing from the
/// flattened mapping are skipped. The message key is never a label and
/// never overwritten by metadata.
pub fn merge(
    default_meta: &BTreeMap<String, String>,
    logger_meta: &BTreeMap<String, String>,
    record: &LogRecord,
    tag_keys: &[String],
) -> MergedRecord {
    let mut flat = flatten_metadata(default_meta, logger_meta, &record.call_metadata);
    flat.insert(LOGGER_KEY.to_string(), record.logger_name.clone());
    flat.insert(LEVEL_KEY.to_string(), record.level.as_str().to_string());

    let mut labels = BTreeMap::new();
    let mut rest = Vec::new();

    for (key, value) in flat {
        if key == MESSAGE_KEY {
            continue;
        }
        if tag_keys.iter().any(|tag| *tag == key) {
            labels.insert(key, value);
        } else {
            rest.push((key, value));
        }
    }

    let mut body = message_body(&record.message, &labels);
    for (key, value) in rest {
        body.entry(key).or_insert(Value::String(value));
    }

    MergedRecord { labels, body }
}

/// An object message becomes the body unless one of its keys is already a
/// label; then, like any other message, it is wrapped under `msg`.
fn message_body(message: &Message, labels: &BTreeMap<String, String>) -> Map<String, Value> {
    match message {
        Message::Structured(Value::Object(fields))
            if !fields.keys().any(|key| labels.contains_key(key)) =>
        {
            fields.clone()
        }
        Message::Structured(other) => wrap(other.clone()),
        Message::Text(text) => wrap(Value::String(text.clone())),
    }
}

fn wrap(value: Value) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert(MESSAGE_KEY.to_string(), value);
    body
}
