use crate::merge::MergedRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Body of a Loki push request (`POST /loki/api/v1/push`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushPayload {
    pub streams: Vec<Stream>,
}

/// One label set and its `[unix-nanoseconds, line]` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub stream: BTreeMap<String, String>,
    pub values: Vec<[String; 2]>,
}

impl PushPayload {
    /// Render the wire JSON sent to every destination.
    ///
    /// Every field is a string, so the document is assembled as a
    /// [`Value`] and rendering cannot fail.
    pub fn encode(&self) -> String {
        let streams = self.streams.iter().map(Stream::to_value).collect();
        let mut root = Map::new();
        root.insert("streams".to_string(), Value::Array(streams));
        Value::Object(root).to_string()
    }
}

impl Stream {
    fn to_value(&self) -> Value {
        let labels = self
            .stream
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect();
        let values = self
            .values
            .iter()
            .map(|[ts, line]| Value::Array(vec![Value::String(ts.clone()), Value::String(line.clone())]))
            .collect();
        let mut stream = Map::new();
        stream.insert("stream".to_string(), Value::Object(labels));
        stream.insert("values".to_string(), Value::Array(values));
        Value::Object(stream)
    }
}

/// Build the push payload for one merged record: a single stream with a
/// single value stamped with the emission time.
pub fn format(merged: &MergedRecord, timestamp: DateTime<Utc>) -> PushPayload {
    let line = Value::Object(merged.body.clone()).to_string();
    PushPayload {
        streams: vec![Stream {
            stream: merged.labels.clone(),
            values: vec![[unix_nanos(timestamp), line]],
        }],
    }
}

/// Nanoseconds since the Unix epoch as a decimal string.
pub fn unix_nanos(timestamp: DateTime<Utc>) -> String {
    let nanos = i128::from(timestamp.timestamp()) * 1_000_000_000
        + i128::from(timestamp.timestamp_subsec_nanos());
    nanos.to_string()
}
