//! Recovery for replies wrapped as an escaped JSON string literal.
//!
//! Some models answer with `"\"decision\": \"a_1 = 1\", \"cost\": \"c = 0.5\""`:
//! the key/value fragments of an object, escaped and quoted. The interior is
//! unescaped, wrapped in braces and parsed. This is a heuristic for that one
//! shape; anything else ends in the fallback mapping.

use serde_json::{Map as JsonMap, Value as JsonValue};

/// True when the text is at least `""` and both begins and ends with a quote.
pub fn is_quote_wrapped(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('"') && text.ends_with('"')
}

/// Unescaping path that led to a recovered object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unescape {
    /// Interior decoded as a JSON string body.
    JsonString,
    /// Interior unescaped by literal replacement of `\"` and `\n`.
    Manual,
}

/// Try to recover an object from a quote-wrapped text.
///
/// On failure returns the unwrapped interior so the caller can keep it
/// under the fallback key.
pub fn recover_quoted(text: &str) -> Result<(JsonMap<String, JsonValue>, Unescape), String> {
    let interior = &text[1..text.len() - 1];
    match decode_json_string(interior) {
        Some(decoded) => wrap_and_parse(&decoded)
            .map(|obj| (obj, Unescape::JsonString))
            .ok_or_else(|| interior.to_string()),
        None => wrap_and_parse(&manual_unescape(interior))
            .map(|obj| (obj, Unescape::Manual))
            .ok_or_else(|| interior.to_string()),
    }
}

fn decode_json_string(interior: &str) -> Option<String> {
    serde_json::from_str::<String>(&format!("\"{interior}\"")).ok()
}

fn manual_unescape(interior: &str) -> String {
    interior.replace("\\\"", "\"").replace("\\n", "\n")
}

fn wrap_and_parse(body: &str) -> Option<JsonMap<String, JsonValue>> {
    serde_json::from_str(&format!("{{{body}}}")).ok()
}
