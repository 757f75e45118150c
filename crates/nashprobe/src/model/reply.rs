//! Raw and normalized reply types.

use std::ops::Deref;

use serde::{Serialize, Serializer};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Key holding the untouched text when a reply could not be parsed.
pub const RAW_OUTPUT_KEY: &str = "raw_output";

/// Exact text payload returned by a backend for one prompt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawReply(String);

impl RawReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for RawReply {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<String> for RawReply {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RawReply {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Which recovery step produced a normalized reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyOrigin {
    /// The (possibly fence-stripped) text parsed as a JSON object.
    Object,
    /// A quote-wrapped, escaped fragment was unwrapped and parsed.
    QuotedFragment,
    /// Nothing parsed; the text is kept under `raw_output`.
    Fallback,
}

/// Structured mapping recovered from a model reply.
///
/// Always holds either the parsed object or a single `raw_output` entry.
/// Serializes as the bare mapping; the origin is bookkeeping only.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedReply {
    fields: JsonMap<String, JsonValue>,
    origin: ReplyOrigin,
}

impl NormalizedReply {
    pub(crate) fn parsed(fields: JsonMap<String, JsonValue>, origin: ReplyOrigin) -> Self {
        Self { fields, origin }
    }

    /// Build the fallback mapping `{"raw_output": text}`.
    pub fn fallback(text: impl Into<String>) -> Self {
        let mut fields = JsonMap::new();
        fields.insert(RAW_OUTPUT_KEY.to_string(), JsonValue::String(text.into()));
        Self {
            fields,
            origin: ReplyOrigin::Fallback,
        }
    }

    pub fn origin(&self) -> ReplyOrigin {
        self.origin
    }

    /// True when the reply did not conform to any structured format.
    pub fn is_fallback(&self) -> bool {
        self.origin == ReplyOrigin::Fallback
    }

    /// The preserved text for fallback replies.
    pub fn raw_output(&self) -> Option<&str> {
        if !self.is_fallback() {
            return None;
        }
        self.fields.get(RAW_OUTPUT_KEY).and_then(|v| v.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.fields.get(key)
    }

    /// String value under `key`, if present and a string.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }

    pub fn fields(&self) -> &JsonMap<String, JsonValue> {
        &self.fields
    }

    pub fn into_fields(self) -> JsonMap<String, JsonValue> {
        self.fields
    }
}

impl Serialize for NormalizedReply {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fallback_exposes_raw_output() {
        let r = NormalizedReply::fallback("oops");
        assert!(r.is_fallback());
        assert_eq!(r.raw_output(), Some("oops"));
        assert_eq!(r.fields().len(), 1);
    }

    #[test]
    fn parsed_reply_with_raw_output_key_is_not_fallback() {
        let mut fields = JsonMap::new();
        fields.insert(RAW_OUTPUT_KEY.into(), json!("model wrote this key itself"));
        let r = NormalizedReply::parsed(fields, ReplyOrigin::Object);
        assert!(!r.is_fallback());
        assert_eq!(r.raw_output(), None);
        assert_eq!(r.text(RAW_OUTPUT_KEY), Some("model wrote this key itself"));
    }

    #[test]
    fn serializes_as_bare_mapping() {
        let mut fields = JsonMap::new();
        fields.insert("decision".into(), json!("a_1 = 1"));
        let r = NormalizedReply::parsed(fields, ReplyOrigin::QuotedFragment);
        let v = serde_json::to_value(&r).expect("serialize");
        assert_eq!(v, json!({"decision": "a_1 = 1"}));
    }

    #[test]
    fn raw_reply_derefs_to_str() {
        let raw = RawReply::from("  {}  ");
        assert_eq!(raw.trim(), "{}");
        assert_eq!(raw.into_string(), "  {}  ");
    }
}
