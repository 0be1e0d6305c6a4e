//! Self-healing argument coercion.
//!
//! Script literals arrive as strings or numbers regardless of what a tool
//! expects. When a tool carries a JSON schema, string arguments are converted
//! toward the declared property type and parameter keys are renamed to the
//! schema's spelling. A value that cannot be converted is passed through as
//! written.

use nit_primitives::normalize_key;
use serde_json::{Map, Value};
use tracing::debug;

const TRUE_WORDS: [&str; 5] = ["true", "1", "yes", "on", "y"];
const FALSE_WORDS: [&str; 5] = ["false", "0", "no", "off", "n"];

/// Coerces `params` toward the property types declared in `schema`.
#[must_use]
pub fn coerce_params(params: Map<String, Value>, schema: &Value) -> Map<String, Value> {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return params;
    };

    params
        .into_iter()
        .map(|(key, value)| {
            let wanted = normalize_key(&key);
            let Some((schema_key, property)) = properties
                .iter()
                .find(|(candidate, _)| normalize_key(candidate) == wanted)
            else {
                return (key, value);
            };

            let coerced = match property_type(property) {
                Some(kind) => coerce_value(value, kind),
                None => value,
            };
            (schema_key.clone(), coerced)
        })
        .collect()
}

fn property_type(property: &Value) -> Option<&str> {
    match property.get("type")? {
        Value::String(kind) => Some(kind),
        Value::Array(kinds) => kinds
            .iter()
            .filter_map(Value::as_str)
            .find(|kind| *kind != "null"),
        _ => None,
    }
}

/// Converts a single value toward the JSON schema type `kind`.
///
/// Only strings are rewritten; other values are returned unchanged, as is any
/// string that does not convert.
#[must_use]
pub fn coerce_value(value: Value, kind: &str) -> Value {
    let Value::String(text) = value else {
        return value;
    };

    let converted = match kind {
        "integer" => to_integer(&text),
        "number" => to_number(&text),
        "boolean" => to_boolean(&text),
        "array" => Some(to_array(&text)),
        "object" => to_object(&text),
        "string" => Some(Value::String(strip_quotes(&text).to_owned())),
        _ => None,
    };

    converted.unwrap_or_else(|| {
        debug!(kind, value = %text, "argument left as written");
        Value::String(text)
    })
}

fn to_integer(text: &str) -> Option<Value> {
    let trimmed = strip_quotes(text.trim());
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(Value::from(value));
    }
    let float = trimmed.parse::<f64>().ok().filter(|f| f.is_finite())?;
    #[allow(clippy::cast_possible_truncation)]
    let truncated = float.trunc() as i64;
    Some(Value::from(truncated))
}

fn to_number(text: &str) -> Option<Value> {
    strip_quotes(text.trim())
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

fn to_boolean(text: &str) -> Option<Value> {
    let lowered = strip_quotes(text.trim()).to_ascii_lowercase();
    if TRUE_WORDS.contains(&lowered.as_str()) {
        Some(Value::Bool(true))
    } else if FALSE_WORDS.contains(&lowered.as_str()) {
        Some(Value::Bool(false))
    } else {
        None
    }
}

fn to_array(text: &str) -> Value {
    let trimmed = text.trim();
    if let Some(Value::Array(items)) = parse_json_repairing_quotes(trimmed) {
        return Value::Array(items);
    }

    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(trimmed);

    if inner.contains(',') {
        return Value::Array(
            inner
                .split(',')
                .map(|item| strip_quotes(item.trim()))
                .filter(|item| !item.is_empty())
                .map(|item| Value::String(item.to_owned()))
                .collect(),
        );
    }

    Value::Array(vec![Value::String(strip_quotes(inner.trim()).to_owned())])
}

fn to_object(text: &str) -> Option<Value> {
    match parse_json_repairing_quotes(text.trim()) {
        Some(object @ Value::Object(_)) => Some(object),
        _ => None,
    }
}

fn parse_json_repairing_quotes(text: &str) -> Option<Value> {
    serde_json::from_str(text)
        .ok()
        .or_else(|| serde_json::from_str(&text.replace('\'', "\"")).ok())
}

fn strip_quotes(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &text[1..text.len() - 1];
        }
    }
    text
}
