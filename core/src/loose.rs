//! Truthiness and text coercion for loosely-typed JSON inputs.
//!
//! Handlers written against dynamic runtimes pass values whose "presence" is
//! decided by truthiness rather than by type: `0`, `""`, `false` and `null`
//! all count as "not supplied". These helpers pin those rules down in one
//! place so body, header and flag classification agree.

use serde_json::Value;

/// `false` for `null`, `false`, `0`, `-0` and `""`; `true` otherwise.
/// Empty arrays and objects are truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text form of a loose value: strings verbatim, `null` as `""`, everything
/// else as compact JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
