//! Global attribute-name dictionary.
//!
//! The policy service encodes attribute names in referenced-attributes hints
//! as indexes into this list (non-negative) or into a per-message word list
//! (negative, `-(i + 1)`). Indexes must match the service's table, so
//! entries are only ever appended.
//!
//! Only the attribute-name prefix of the service's table is carried here.
//! Indexes past `response.code` are rejected as out of range, which turns
//! caching off for that hint instead of resolving to a wrong name.

static GLOBAL_WORDS: &[&str] = &[
    "source.ip",
    "source.port",
    "source.name",
    "source.uid",
    "source.namespace",
    "source.labels",
    "source.user",
    "target.ip",
    "target.port",
    "target.service",
    "target.name",
    "target.uid",
    "target.namespace",
    "target.labels",
    "target.user",
    "request.headers",
    "request.id",
    "request.path",
    "request.host",
    "request.method",
    "request.reason",
    "request.referer",
    "request.scheme",
    "request.size",
    "request.time",
    "request.useragent",
    "response.headers",
    "response.size",
    "response.time",
    "response.duration",
    "response.code",
];

/// The process-wide global word list.
pub fn global_words() -> &'static [&'static str] {
    GLOBAL_WORDS
}

/// Look up a global word by index.
pub fn global_word(index: usize) -> Option<&'static str> {
    GLOBAL_WORDS.get(index).copied()
}
