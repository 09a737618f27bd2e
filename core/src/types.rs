//! Input-side types for the response builder.
//!
//! # Design
//! Handlers hand the builder loosely-typed values. Before any defaulting
//! happens, each input is classified into a tagged variant (`Body`,
//! `HeaderValue`) so the inference rules in `builder` are exhaustive matches
//! rather than runtime type checks. The `from_value` constructors perform the
//! same classification for JSON events arriving over FFI or the mock gateway.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::EnvelopeError;
use crate::loose::{is_truthy, value_to_text};

/// Header name to value mapping. Keys are unique by construction, which is
/// what lets every key land in exactly one output mapping.
pub type Headers = BTreeMap<String, HeaderValue>;

/// Response body, classified before status inference.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    /// No body, or a falsy one. Renders as `""` and infers 204.
    #[default]
    Absent,

    /// An error-like value, carried as its human-readable string form.
    /// Renders verbatim and infers 400.
    Error(String),

    /// A structured value. Renders as compact JSON and infers 200.
    Structured(Value),

    /// A plain string body. Renders verbatim and infers 200.
    Scalar(String),
}

impl Body {
    /// Text body. An empty string is falsy and becomes `Absent`.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Body::Absent
        } else {
            Body::Scalar(text)
        }
    }

    /// Error-like body from anything implementing `std::error::Error`.
    pub fn error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        Body::Error(err.to_string())
    }

    /// Body from any serializable value, classified like a loose JSON body:
    /// strings pass through unquoted and falsy values are `Absent`.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, EnvelopeError> {
        let value = serde_json::to_value(value)
            .map_err(|e| EnvelopeError::Serialization(e.to_string()))?;
        Ok(Body::from_value(&value))
    }

    /// Classify a loosely-typed JSON body.
    ///
    /// Falsy values (`null`, `false`, `0`, `""`) are `Absent`. Truthy
    /// scalars keep their text form. Arrays and objects are `Structured`,
    /// except the error spelling `{"error": {"name": .., "message": ..}}`
    /// or `{"error": "message"}`, which is `Error`.
    pub fn from_value(value: &Value) -> Self {
        match value {
            v if !is_truthy(v) => Body::Absent,
            Value::String(s) => Body::Scalar(s.clone()),
            Value::Bool(_) | Value::Number(_) => Body::Scalar(value_to_text(value)),
            Value::Object(map) => match error_description(map) {
                Some(description) => Body::Error(description),
                None => Body::Structured(value.clone()),
            },
            Value::Array(_) => Body::Structured(value.clone()),
            Value::Null => Body::Absent,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Body::Absent)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Body::Error(_))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::text(text)
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::from_value(&value)
    }
}

impl<T: Into<Body>> From<Option<T>> for Body {
    fn from(body: Option<T>) -> Self {
        body.map(Into::into).unwrap_or_default()
    }
}

/// `"Name: message"`, falling back to `"Error: message"` when the object
/// carries no name. Any other object shape is not error-like.
fn error_description(map: &serde_json::Map<String, Value>) -> Option<String> {
    if map.len() != 1 {
        return None;
    }
    match map.get("error")? {
        Value::String(message) if message.is_empty() => Some("Error".to_string()),
        Value::String(message) => Some(format!("Error: {message}")),
        Value::Object(err) => {
            let message = err.get("message").and_then(Value::as_str)?;
            let name = err.get("name").and_then(Value::as_str).unwrap_or("Error");
            if message.is_empty() {
                Some(name.to_string())
            } else {
                Some(format!("{name}: {message}"))
            }
        }
        _ => None,
    }
}

fn field<'a>(event: &'a Value, name: &str) -> &'a Value {
    static NULL: Value = Value::Null;
    event.get(name).unwrap_or(&NULL)
}

/// A single header value or an ordered list of values for the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Single(String),
    Multi(Vec<String>),
}

impl HeaderValue {
    /// Classify a loosely-typed JSON header value. Arrays become `Multi`
    /// with every element coerced to text; everything else is `Single`.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) => HeaderValue::Multi(items.iter().map(value_to_text).collect()),
            other => HeaderValue::Single(value_to_text(other)),
        }
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Single(value)
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Single(value.to_string())
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(values: Vec<String>) -> Self {
        HeaderValue::Multi(values)
    }
}

impl From<Vec<&str>> for HeaderValue {
    fn from(values: Vec<&str>) -> Self {
        HeaderValue::Multi(values.into_iter().map(str::to_string).collect())
    }
}

/// Classify a loosely-typed header mapping. Anything that is not a JSON
/// object means "no headers supplied".
pub fn headers_from_value(value: &Value) -> Option<Headers> {
    let map = value.as_object()?;
    Some(
        map.iter()
            .map(|(name, v)| (name.clone(), HeaderValue::from_value(v)))
            .collect(),
    )
}

/// Everything the builder needs for one response.
///
/// `headers: None` selects the builder's default header set; `Some` (even
/// an empty map) replaces it entirely.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseInput {
    pub body: Body,
    pub status_code: Option<u16>,
    pub headers: Option<Headers>,
    pub is_base64_encoded: bool,
}

impl ResponseInput {
    pub fn new(body: impl Into<Body>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Add one header, switching from the defaults to an explicit set.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn base64_encoded(mut self, is_base64_encoded: bool) -> Self {
        self.is_base64_encoded = is_base64_encoded;
        self
    }

    /// Classify a loose JSON event of the shape
    /// `{"body": .., "statusCode": .., "headers": .., "isBase64Encoded": ..}`.
    /// Missing or ill-typed fields fall back to their defaults.
    pub fn from_value(event: &Value) -> Self {
        let status_code = field(event, "statusCode")
            .as_f64()
            .filter(|code| code.fract() == 0.0 && (1.0..=65535.0).contains(code))
            .map(|code| code as u16);

        let input = Self {
            body: Body::from_value(field(event, "body")),
            status_code,
            headers: headers_from_value(field(event, "headers")),
            is_base64_encoded: is_truthy(field(event, "isBase64Encoded")),
        };
        tracing::trace!(
            body_absent = input.body.is_absent(),
            body_error = input.body.is_error(),
            status_code = ?input.status_code,
            headers_supplied = input.headers.is_some(),
            "classified loose response input"
        );
        input
    }
}
