//! Attribute bag: a typed, dynamically keyed value map.
//!
//! Keys are kept in a `BTreeMap` so iteration (and therefore serialization
//! and hashing) is deterministic regardless of insertion order.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Attribute key holding the quota name for Quota calls.
pub const QUOTA_NAME: &str = "quota.name";
/// Attribute key holding the quota amount for Quota calls.
pub const QUOTA_AMOUNT: &str = "quota.amount";

/// One attribute value. Exactly one variant is active; values are stored
/// verbatim and never coerced between variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeValue {
    String(String),
    Bytes(Bytes),
    Int64(i64),
    Double(f64),
    Bool(bool),
    Timestamp(SystemTime),
    Duration(Duration),
    StringMap(BTreeMap<String, String>),
}

impl AttributeValue {
    /// Variant name, for logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::String(_) => "string",
            AttributeValue::Bytes(_) => "bytes",
            AttributeValue::Int64(_) => "int64",
            AttributeValue::Double(_) => "double",
            AttributeValue::Bool(_) => "bool",
            AttributeValue::Timestamp(_) => "timestamp",
            AttributeValue::Duration(_) => "duration",
            AttributeValue::StringMap(_) => "string_map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int64(&self) -> Option<i64> {
        match self {
            AttributeValue::Int64(v) => Some(*v),
            _ => None,
        }
    }
}

/// A bag of attributes keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes {
    entries: BTreeMap<String, AttributeValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `name`.
    pub fn set(&mut self, name: impl Into<String>, value: AttributeValue) {
        self.entries.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.entries.remove(name)
    }

    /// Apply every entry of `other`; `other` wins on key collision.
    pub fn merge(&mut self, other: &Attributes) {
        for (k, v) in &other.entries {
            self.entries.insert(k.clone(), v.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Borrow this bag through a builder.
    pub fn builder(&mut self) -> AttributesBuilder<'_> {
        AttributesBuilder::new(self)
    }
}

impl FromIterator<(String, AttributeValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Chainable helper that writes typed values into a bag.
pub struct AttributesBuilder<'a> {
    attributes: &'a mut Attributes,
}

impl<'a> AttributesBuilder<'a> {
    pub fn new(attributes: &'a mut Attributes) -> Self {
        Self { attributes }
    }

    pub fn add_string(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.attributes.set(key, AttributeValue::String(value.into()));
        self
    }

    pub fn add_bytes(&mut self, key: &str, value: impl Into<Bytes>) -> &mut Self {
        self.attributes.set(key, AttributeValue::Bytes(value.into()));
        self
    }

    pub fn add_int64(&mut self, key: &str, value: i64) -> &mut Self {
        self.attributes.set(key, AttributeValue::Int64(value));
        self
    }

    pub fn add_double(&mut self, key: &str, value: f64) -> &mut Self {
        self.attributes.set(key, AttributeValue::Double(value));
        self
    }

    pub fn add_bool(&mut self, key: &str, value: bool) -> &mut Self {
        self.attributes.set(key, AttributeValue::Bool(value));
        self
    }

    pub fn add_timestamp(&mut self, key: &str, value: SystemTime) -> &mut Self {
        self.attributes.set(key, AttributeValue::Timestamp(value));
        self
    }

    pub fn add_duration(&mut self, key: &str, value: Duration) -> &mut Self {
        self.attributes.set(key, AttributeValue::Duration(value));
        self
    }

    pub fn add_string_map(&mut self, key: &str, value: BTreeMap<String, String>) -> &mut Self {
        self.attributes.set(key, AttributeValue::StringMap(value));
        self
    }

    /// IP literals are stored as network-order octets, anything else as a string.
    pub fn add_ip_or_string(&mut self, key: &str, value: &str) -> &mut Self {
        match value.parse::<IpAddr>() {
            Ok(IpAddr::V4(ip)) => self.add_bytes(key, ip.octets().to_vec()),
            Ok(IpAddr::V6(ip)) => self.add_bytes(key, ip.octets().to_vec()),
            Err(_) => self.add_string(key, value),
        }
    }
}

/// Split a timestamp into protobuf-style `(seconds, nanos)` with
/// `nanos` in `[0, 1e9)`.
pub(crate) fn timestamp_parts(t: SystemTime) -> (i64, i32) {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => duration_parts(d),
        Err(e) => {
            let d = e.duration();
            let secs = -i64::try_from(d.as_secs()).unwrap_or(i64::MAX);
            let nanos = d.subsec_nanos() as i32;
            if nanos == 0 {
                (secs, 0)
            } else {
                (secs - 1, 1_000_000_000 - nanos)
            }
        }
    }
}

/// Seconds saturate at `i64::MAX`.
pub(crate) fn duration_parts(d: Duration) -> (i64, i32) {
    (
        i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        d.subsec_nanos() as i32,
    )
}
