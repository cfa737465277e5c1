//! Reply text extraction from reasoning responses
//!
//! The provider's structured-response payload is not stable across API modes:
//! the text may live in a top-level convenience field, inside structured
//! output blocks, or nested arbitrarily deep. Extraction is a prioritized
//! list of strategies evaluated in order, stopping at the first non-empty
//! result. An unrecognizable payload yields an empty string, never an error.

use serde_json::Value;

type Strategy = fn(&Value) -> Option<String>;

/// Strategies in preference order: convenience field, structured output
/// blocks, exhaustive payload walk.
const STRATEGIES: &[Strategy] = &[convenience_field, output_blocks, payload_walk];

/// Extract reply text from a reasoning response payload
#[must_use]
pub fn reply_text(payload: &Value) -> String {
    STRATEGIES
        .iter()
        .find_map(|extract| extract(payload))
        .unwrap_or_default()
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Top-level `output_text` convenience field
fn convenience_field(payload: &Value) -> Option<String> {
    payload
        .get("output_text")
        .and_then(Value::as_str)
        .and_then(non_empty)
}

/// Structured `output` message blocks: `output[].content[].text`, where
/// `text` is either a string or an object carrying a `value` string
fn output_blocks(payload: &Value) -> Option<String> {
    let blocks = payload.get("output")?.as_array()?;

    let mut chunks = Vec::new();
    for block in blocks {
        let Some(content) = block.get("content").and_then(Value::as_array) else {
            continue;
        };
        for part in content {
            match part.get("text") {
                Some(Value::String(text)) => chunks.extend(non_empty(text)),
                Some(nested @ Value::Object(_)) => {
                    chunks.extend(nested.get("value").and_then(Value::as_str).and_then(non_empty));
                }
                _ => {}
            }
        }
    }

    (!chunks.is_empty()).then(|| chunks.join("\n"))
}

/// Last resort: walk the whole payload collecting text-bearing leaves
fn payload_walk(payload: &Value) -> Option<String> {
    let mut chunks = Vec::new();
    collect_text(payload, &mut chunks);
    (!chunks.is_empty()).then(|| chunks.join("\n"))
}

fn collect_text(value: &Value, chunks: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                if matches!(key.as_str(), "text" | "output_text" | "value") {
                    if let Value::String(text) = nested {
                        chunks.extend(non_empty(text));
                        continue;
                    }
                }
                collect_text(nested, chunks);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_text(item, chunks);
            }
        }
        _ => {}
    }
}
