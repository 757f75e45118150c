//! Best-effort recovery of a JSON object from model reply text.
//!
//! Steps run in order and the first that applies decides the outcome:
//! trim, strip a Markdown fence, unwrap a quoted escaped fragment, parse as
//! an object. Anything that does not parse is kept verbatim under
//! `raw_output`; `normalize` never fails.

use std::borrow::Cow;

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::model::{NormalizedReply, ReplyOrigin};

pub mod fence;
pub mod quoted;

/// Normalize one reply. Pure; safe to call from any thread.
pub fn normalize(raw: &str) -> NormalizedReply {
    let mut text: Cow<'_, str> = Cow::Borrowed(raw.trim());

    if fence::is_fenced(&text) {
        text = Cow::Owned(fence::strip_fence(&text));
        tracing::debug!("stripped code fence (remaining chars={})", text.len());
    }

    if quoted::is_quote_wrapped(&text) {
        return match quoted::recover_quoted(&text) {
            Ok((obj, how)) => {
                tracing::debug!("recovered quoted fragment via {:?} (keys={})", how, obj.len());
                NormalizedReply::parsed(obj, ReplyOrigin::QuotedFragment)
            }
            Err(interior) => {
                tracing::debug!("quoted fragment did not parse; keeping interior");
                NormalizedReply::fallback(interior)
            }
        };
    }

    let parsed = serde_json::from_str::<JsonValue>(&text);
    match parsed {
        Ok(JsonValue::Object(obj)) => NormalizedReply::parsed(obj, ReplyOrigin::Object),
        Ok(other) => {
            tracing::debug!("reply parsed as non-object JSON ({})", json_kind(&other));
            NormalizedReply::fallback(text.into_owned())
        }
        Err(e) => {
            tracing::debug!("reply is not JSON: {}", e);
            NormalizedReply::fallback(text.into_owned())
        }
    }
}

/// Normalize and return only the mapping.
pub fn normalize_to_map(raw: &str) -> JsonMap<String, JsonValue> {
    normalize(raw).into_fields()
}

fn json_kind(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
