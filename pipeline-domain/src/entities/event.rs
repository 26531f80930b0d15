// Event entity
// Telemetry event as published on the feed

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::{Number, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingEvent {
    #[serde(default)]
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub client_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status_code: Option<i32>,
    pub event_type: String,
    #[serde(default)]
    pub duration_ms: Option<f64>,
    #[serde(default)]
    pub client_version: Option<String>,
    #[serde(default)]
    pub os_family: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default)]
    pub runtime_version: Option<String>,
    #[serde(default)]
    pub data: Option<EventPayload>,
}

/// One value of the open-ended event payload.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Objects and arrays are kept opaque.
    Nested(Value),
}

impl PayloadValue {
    /// Flat string form of the value; `None` marks an explicit null.
    pub fn to_flat_string(&self) -> Option<String> {
        match self {
            PayloadValue::Null => None,
            PayloadValue::Bool(value) => Some(value.to_string()),
            PayloadValue::Number(value) => Some(value.to_string()),
            PayloadValue::String(value) => Some(value.clone()),
            PayloadValue::Nested(value) => Some(value.to_string()),
        }
    }
}

impl From<Value> for PayloadValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => PayloadValue::Null,
            Value::Bool(flag) => PayloadValue::Bool(flag),
            Value::Number(number) => PayloadValue::Number(number),
            Value::String(text) => PayloadValue::String(text),
            nested @ (Value::Array(_) | Value::Object(_)) => PayloadValue::Nested(nested),
        }
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        PayloadValue::String(value.to_string())
    }
}

/// Insertion-ordered key/value payload.
///
/// A repeated key keeps the position of its first occurrence and the value of
/// its last one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPayload {
    entries: IndexMap<String, PayloadValue>,
}

impl EventPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PayloadValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PayloadValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for EventPayload
where
    K: Into<String>,
    V: Into<PayloadValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = EventPayload::new();
        for (key, value) in iter {
            payload.insert(key, value);
        }
        payload
    }
}

impl<'de> Deserialize<'de> for EventPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PayloadVisitor;

        impl<'de> Visitor<'de> for PayloadVisitor {
            type Value = EventPayload;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut payload = EventPayload {
                    entries: IndexMap::with_capacity(map.size_hint().unwrap_or(0)),
                };
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    payload.insert(key, PayloadValue::from(value));
                }
                Ok(payload)
            }
        }

        deserializer.deserialize_map(PayloadVisitor)
    }
}
