//! Telemetry events and their scalar field values.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::telemetry::transmission::Transmission;
use crate::telemetry::TelemetryError;

/// A scalar attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl FieldValue {
    /// Return true for the empty string, the only value the field policy drops.
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::String(s) if s.is_empty())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => f.write_str(s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<String> for FieldValue {
    fn from(val: String) -> Self {
        FieldValue::String(val)
    }
}

impl From<&str> for FieldValue {
    fn from(val: &str) -> Self {
        FieldValue::String(val.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(val: i64) -> Self {
        FieldValue::Int(val)
    }
}

impl From<i32> for FieldValue {
    fn from(val: i32) -> Self {
        FieldValue::Int(val.into())
    }
}

impl From<u16> for FieldValue {
    fn from(val: u16) -> Self {
        FieldValue::Int(val.into())
    }
}

impl From<u64> for FieldValue {
    fn from(val: u64) -> Self {
        FieldValue::Int(i64::try_from(val).unwrap_or(i64::MAX))
    }
}

impl From<f64> for FieldValue {
    fn from(val: f64) -> Self {
        FieldValue::Float(val)
    }
}

impl From<bool> for FieldValue {
    fn from(val: bool) -> Self {
        FieldValue::Bool(val)
    }
}

/// The data handed to a [`Transmission`] when an event is sent.
#[derive(Debug, Clone)]
pub struct EventPayload {
    /// Destination dataset, if the client was configured with one.
    pub dataset: Option<String>,
    /// When the event was created.
    pub created_at: DateTime<Utc>,
    pub fields: HashMap<String, FieldValue>,
}

/// A single flat attribute record, created by [`Client::new_event`](crate::telemetry::Client::new_event).
pub struct Event {
    fields: HashMap<String, FieldValue>,
    dataset: Option<String>,
    created_at: DateTime<Utc>,
    transmission: Arc<dyn Transmission>,
}

impl Event {
    pub(crate) fn new(dataset: Option<String>, transmission: Arc<dyn Transmission>) -> Self {
        Self {
            fields: HashMap::new(),
            dataset,
            created_at: Utc::now(),
            transmission,
        }
    }

    /// Set a field, replacing any previous value under the same name.
    pub fn add_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Set every field of the mapping.
    pub fn add_fields<I, K, V>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        for (name, value) in fields {
            self.add_field(name, value);
        }
    }

    pub fn remove_field(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &HashMap<String, FieldValue> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn dataset(&self) -> Option<&str> {
        self.dataset.as_deref()
    }

    /// Hand the event to the client's transmission. Consumes the event.
    pub fn send(self) -> Result<(), TelemetryError> {
        let Event {
            fields,
            dataset,
            created_at,
            transmission,
        } = self;
        transmission.transmit(EventPayload {
            dataset,
            created_at,
            fields,
        })
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("dataset", &self.dataset)
            .field("created_at", &self.created_at)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::MemoryTransmission;

    #[test]
    fn test_empty_detection() {
        assert!(FieldValue::from("").is_empty());
        assert!(!FieldValue::from("x").is_empty());
        assert!(!FieldValue::from(0i64).is_empty());
        assert!(!FieldValue::from(false).is_empty());
    }

    #[test]
    fn test_add_fields_overwrites() {
        let sink = Arc::new(MemoryTransmission::new());
        let mut event = Event::new(Some("requests".into()), sink.clone());

        event.add_field("content-length", "42");
        event.add_fields([("content-length", FieldValue::Int(42)), ("x-foo", "bar".into())]);

        assert_eq!(event.len(), 2);
        assert_eq!(event.get("content-length"), Some(&FieldValue::Int(42)));
        assert_eq!(event.dataset(), Some("requests"));
    }

    #[test]
    fn test_send_hands_payload_to_transmission() {
        let sink = Arc::new(MemoryTransmission::new());
        let mut event = Event::new(None, sink.clone());
        event.add_field("HTTP_STATUS", 200u16);
        event.send().unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].fields.get("HTTP_STATUS"), Some(&FieldValue::Int(200)));
        assert!(events[0].dataset.is_none());
    }

    #[test]
    fn test_serializes_as_plain_json_scalars() {
        let fields: HashMap<&str, FieldValue> = [
            ("s", FieldValue::from("abc")),
            ("i", FieldValue::from(7i64)),
            ("b", FieldValue::from(true)),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["s"], "abc");
        assert_eq!(json["i"], 7);
        assert_eq!(json["b"], true);
    }
}
