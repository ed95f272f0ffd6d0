//! Referenced-attribute signature engine.
//!
//! The policy service answers each Check with the set of attributes its
//! decision depended on. [`Referenced`] decodes that set and derives a
//! signature over the current request's values for exactly those keys, so a
//! response cache can reuse a decision for any request that agrees on them.
//!
//! Digest layout (must stay bit-for-bit stable, caches on both sides of an
//! upgrade share keys):
//! - per exact key: `key`, NUL, value encoding, NUL
//! - value encoding: raw bytes for string/bytes, little-endian `i64`/`f64`,
//!   one byte for bool, `seconds(i64)` NUL `nanos(i32)` for timestamp and
//!   duration, `k` NUL `v` NUL per entry in key order for string maps
//! - finally the caller's extra key
//!
//! String maps are joined with NUL separators and not escaped, so keys or
//! values containing NUL can collide.

use std::collections::BTreeSet;
use std::fmt;

use md5::{Digest, Md5};
use serde::Deserialize;

use crate::attributes::{duration_parts, timestamp_parts, AttributeValue, Attributes};
use crate::dictionary;
use crate::error::{MixError, Result};

const DELIMITER: &[u8] = b"\0";
const WORD_DELIMITER: &[u8] = b":";

/// Match condition declared by the policy service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    /// The decision holds only while the attribute is absent.
    Absence,
    /// The decision holds only for an identical value.
    Exact,
    /// Pattern match; never evaluated here.
    Regex,
}

/// One referenced attribute in wire form.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeMatch {
    /// Global dictionary index (>= 0) or per-message word index (< 0).
    pub name: i32,
    pub condition: Condition,
}

/// Referenced attributes as received from the policy service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferencedAttributes {
    /// Per-message words for names missing from the global dictionary.
    #[serde(default)]
    pub words: Vec<String>,
    #[serde(default)]
    pub attribute_matches: Vec<AttributeMatch>,
}

/// 128-bit digest used as a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature([u8; 16]);

impl Signature {
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn from_hasher(hasher: Md5) -> Self {
        let mut out = [0u8; 16];
        out.copy_from_slice(&hasher.finalize());
        Self(out)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A decoded referenced set. A rejected hint never yields a partial set:
/// [`Referenced::fill`] either decodes every match or returns an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Referenced {
    absence_keys: Vec<String>,
    exact_keys: Vec<String>,
}

impl Referenced {
    /// Decode a wire hint. Any out-of-range index or `REGEX` condition
    /// rejects the whole set.
    pub fn fill(reference: &ReferencedAttributes) -> Result<Self> {
        let mut out = Referenced::default();

        for m in &reference.attribute_matches {
            let name = resolve_name(m.name, &reference.words).map_err(|e| {
                tracing::error!(error = %e, "rejecting referenced attributes");
                e
            })?;

            match m.condition {
                Condition::Absence => out.absence_keys.push(name.to_string()),
                Condition::Exact => out.exact_keys.push(name.to_string()),
                Condition::Regex => {
                    tracing::error!(attribute = %name, "received REGEX in referenced attributes");
                    return Err(MixError::UnsupportedRegex(name.to_string()));
                }
            }
        }

        Ok(out)
    }

    pub fn absence_keys(&self) -> &[String] {
        &self.absence_keys
    }

    pub fn exact_keys(&self) -> &[String] {
        &self.exact_keys
    }

    /// Signature of `attributes` restricted to this set, or `None` when the
    /// cached decision does not apply (absence key present or exact key
    /// missing).
    pub fn signature(&self, attributes: &Attributes, extra_key: &str) -> Option<Signature> {
        if self.absence_keys.iter().any(|k| attributes.contains(k)) {
            return None;
        }

        let mut hasher = Md5::new();
        for key in &self.exact_keys {
            let value = attributes.get(key)?;

            hasher.update(key.as_bytes());
            hasher.update(DELIMITER);
            update_value(&mut hasher, value);
            hasher.update(DELIMITER);
        }
        hasher.update(extra_key.as_bytes());

        Some(Signature::from_hasher(hasher))
    }

    /// Digest over the key names only (sorted), identifying structurally
    /// equivalent sets.
    pub fn hash(&self) -> Signature {
        let mut hasher = Md5::new();

        let absence: BTreeSet<&str> = self.absence_keys.iter().map(String::as_str).collect();
        for key in absence {
            hasher.update(key.as_bytes());
            hasher.update(DELIMITER);
        }
        hasher.update(WORD_DELIMITER);
        let exact: BTreeSet<&str> = self.exact_keys.iter().map(String::as_str).collect();
        for key in exact {
            hasher.update(key.as_bytes());
            hasher.update(DELIMITER);
        }

        Signature::from_hasher(hasher)
    }
}

impl fmt::Display for Referenced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Absence-keys: ")?;
        for key in &self.absence_keys {
            write!(f, "{key}, ")?;
        }
        f.write_str("Exact-keys: ")?;
        for key in &self.exact_keys {
            write!(f, "{key}, ")?;
        }
        Ok(())
    }
}

fn resolve_name<'a>(index: i32, words: &'a [String]) -> Result<&'a str> {
    if index >= 0 {
        let global = dictionary::global_words();
        return dictionary::global_word(index as usize).ok_or(MixError::GlobalWordIndex {
            index,
            len: global.len(),
        });
    }

    // per-message index is -(i + 1)
    let local = (-(index as i64) - 1) as usize;
    words
        .get(local)
        .map(String::as_str)
        .ok_or(MixError::MessageWordIndex {
            index: local,
            len: words.len(),
        })
}

fn update_value(hasher: &mut Md5, value: &AttributeValue) {
    match value {
        AttributeValue::String(s) => hasher.update(s.as_bytes()),
        AttributeValue::Bytes(b) => hasher.update(b),
        AttributeValue::Int64(v) => hasher.update(v.to_le_bytes()),
        AttributeValue::Double(v) => hasher.update(v.to_le_bytes()),
        AttributeValue::Bool(v) => hasher.update([u8::from(*v)]),
        AttributeValue::Timestamp(t) => update_seconds_nanos(hasher, timestamp_parts(*t)),
        AttributeValue::Duration(d) => update_seconds_nanos(hasher, duration_parts(*d)),
        AttributeValue::StringMap(map) => {
            for (k, v) in map {
                hasher.update(k.as_bytes());
                hasher.update(DELIMITER);
                hasher.update(v.as_bytes());
                hasher.update(DELIMITER);
            }
        }
    }
}

fn update_seconds_nanos(hasher: &mut Md5, (seconds, nanos): (i64, i32)) {
    hasher.update(seconds.to_le_bytes());
    hasher.update(DELIMITER);
    hasher.update(nanos.to_le_bytes());
}
