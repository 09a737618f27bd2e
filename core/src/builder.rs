//! Stateless response envelope builder.
//!
//! # Design
//! `ResponseBuilder` holds only the header set to fall back on and carries no
//! mutable state between calls. `build` is a pure function of its input:
//! status inference, header defaulting, body normalization and header
//! partitioning all happen on owned copies, so no call can observe another
//! call's output.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::http::{default_headers, ResponseEnvelope};
use crate::types::{Body, HeaderValue, Headers, ResponseInput};

/// Builds `ResponseEnvelope` values from classified inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseBuilder {
    default_headers: Headers,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseBuilder {
    /// Builder that falls back to the permissive CORS header set.
    pub fn new() -> Self {
        Self {
            default_headers: default_headers(),
        }
    }

    /// Builder that falls back to `headers` when a call supplies none.
    pub fn with_default_headers(headers: Headers) -> Self {
        Self {
            default_headers: headers,
        }
    }

    pub fn default_headers(&self) -> &Headers {
        &self.default_headers
    }

    pub fn build(&self, input: ResponseInput) -> ResponseEnvelope {
        let inferred = input.status_code.filter(|code| *code != 0).is_none();
        let status_code = resolve_status(input.status_code, &input.body);

        let resolved = input
            .headers
            .unwrap_or_else(|| self.default_headers.clone());
        let (headers, multi_value_headers) = partition_headers(resolved);

        tracing::debug!(
            status_code,
            inferred,
            single_headers = headers.len(),
            multi_value_headers = multi_value_headers.as_ref().map_or(0, BTreeMap::len),
            "built response envelope"
        );

        ResponseEnvelope {
            status_code,
            body: render_body(input.body),
            headers,
            multi_value_headers,
            is_base64_encoded: input.is_base64_encoded,
        }
    }

    /// Build from a loose JSON event; see `ResponseInput::from_value`.
    pub fn build_json(&self, event: &Value) -> ResponseEnvelope {
        self.build(ResponseInput::from_value(event))
    }
}

/// An explicit, non-zero status always wins. Otherwise: no body is 204, an
/// error-like body is 400, anything else is 200.
fn resolve_status(explicit: Option<u16>, body: &Body) -> u16 {
    match (explicit, body) {
        (Some(code), _) if code != 0 => code,
        (_, Body::Absent) => 204,
        (_, Body::Error(_)) => 400,
        (_, Body::Structured(_) | Body::Scalar(_)) => 200,
    }
}

fn render_body(body: Body) -> String {
    match body {
        Body::Absent => String::new(),
        Body::Error(description) => description,
        Body::Structured(value) => value.to_string(),
        Body::Scalar(text) => text,
    }
}

/// Split headers by shape. Each name lands in exactly one of the two maps;
/// the multi-value map is `None` when nothing is multi-valued.
fn partition_headers(
    headers: Headers,
) -> (BTreeMap<String, String>, Option<BTreeMap<String, Vec<String>>>) {
    let mut single = BTreeMap::new();
    let mut multi = BTreeMap::new();
    for (name, value) in headers {
        match value {
            HeaderValue::Single(value) => {
                single.insert(name, value);
            }
            HeaderValue::Multi(values) => {
                multi.insert(name, values);
            }
        }
    }
    (single, (!multi.is_empty()).then_some(multi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{ALLOW_ORIGIN, DEFAULT_HEADERS};
    use serde_json::json;

    fn builder() -> ResponseBuilder {
        ResponseBuilder::new()
    }

    #[test]
    fn empty_input_is_no_content_with_defaults() {
        let env = builder().build(ResponseInput::default());
        assert_eq!(env.status_code, 204);
        assert_eq!(env.body, "");
        assert!(!env.is_base64_encoded);
        assert!(env.multi_value_headers.is_none());
        assert_eq!(env.headers.len(), DEFAULT_HEADERS.len());
        assert_eq!(env.headers[ALLOW_ORIGIN], "*");
    }

    #[test]
    fn text_body_is_ok() {
        let env = builder().build(ResponseInput::new("hi"));
        assert_eq!(env.status_code, 200);
        assert_eq!(env.body, "hi");
    }

    #[test]
    fn structured_body_is_serialized() {
        let env = builder().build(ResponseInput::new(Body::Structured(json!({"a": 1}))));
        assert_eq!(env.status_code, 200);
        assert_eq!(env.body, r#"{"a":1}"#);
    }

    #[test]
    fn error_body_is_bad_request() {
        let err = std::fmt::Error;
        let env = builder().build(ResponseInput::new(Body::error(&err)));
        assert_eq!(env.status_code, 400);
        assert_eq!(env.body, err.to_string());
    }

    #[test]
    fn explicit_status_overrides_inference() {
        let bodies = [
            Body::Absent,
            Body::text(""),
            Body::Structured(json!({"object": true})),
            Body::Error("Error: error".into()),
        ];
        for body in bodies {
            let env = builder().build(ResponseInput::new(body).status_code(418));
            assert_eq!(env.status_code, 418);
        }
    }

    #[test]
    fn zero_status_is_inferred() {
        let env = builder().build(ResponseInput::new("x").status_code(0));
        assert_eq!(env.status_code, 200);
    }

    #[test]
    fn multi_value_headers_are_partitioned() {
        let env = builder().build(
            ResponseInput::default()
                .status_code(418)
                .header("Set-Cookie", vec!["a", "b"]),
        );
        assert!(env.headers.is_empty());
        let multi = env.multi_value_headers.unwrap();
        assert_eq!(multi["Set-Cookie"], vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn mixed_headers_land_in_exactly_one_map() {
        let env = builder().build(
            ResponseInput::default()
                .status_code(418)
                .header("Custom-Headers", "true")
                .header("Set-Cookie", vec!["a", "b"]),
        );
        let multi = env.multi_value_headers.unwrap();
        assert_eq!(env.headers.len(), 1);
        assert_eq!(env.headers["Custom-Headers"], "true");
        assert!(!multi.contains_key("Custom-Headers"));
        assert!(!env.headers.contains_key("Set-Cookie"));
    }

    #[test]
    fn supplied_empty_headers_replace_defaults() {
        let env = builder().build(ResponseInput::default().headers(Headers::new()));
        assert!(env.headers.is_empty());
        assert!(env.multi_value_headers.is_none());
    }

    #[test]
    fn base64_flag_passes_through() {
        let env = builder().build(ResponseInput::new("aGk=").base64_encoded(true));
        assert!(env.is_base64_encoded);
    }

    #[test]
    fn custom_default_headers_are_used_when_none_supplied() {
        let mut defaults = Headers::new();
        defaults.insert("X-Service".into(), HeaderValue::Single("orders".into()));
        defaults.insert("Vary".into(), HeaderValue::Multi(vec!["Origin".into()]));
        let builder = ResponseBuilder::with_default_headers(defaults);

        let env = builder.build(ResponseInput::new("x"));
        assert_eq!(env.headers["X-Service"], "orders");
        assert_eq!(env.multi_value_headers.unwrap()["Vary"], vec!["Origin".to_string()]);
    }

    #[test]
    fn default_headers_getter_reflects_configuration() {
        assert_eq!(builder().default_headers(), &default_headers());

        let mut defaults = Headers::new();
        defaults.insert("X-Service".into(), HeaderValue::Single("orders".into()));
        let custom = ResponseBuilder::with_default_headers(defaults.clone());
        assert_eq!(custom.default_headers(), &defaults);
    }

    #[test]
    fn mutating_output_does_not_leak_into_later_calls() {
        let b = builder();
        let mut first = b.build(ResponseInput::default());
        first.headers.insert("X-Leak".into(), "yes".into());
        first.headers.remove(ALLOW_ORIGIN);

        let second = b.build(ResponseInput::default());
        assert!(!second.headers.contains_key("X-Leak"));
        assert_eq!(second.headers[ALLOW_ORIGIN], "*");
        assert_eq!(b.build(ResponseInput::default()), second);
    }

    #[test]
    fn build_json_classifies_loose_event() {
        let env = builder().build_json(&json!({
            "body": {"object": true},
            "headers": {"Custom-Headers": true, "Set-Cookie": ["c1", "c2"]},
            "isBase64Encoded": "ok",
        }));
        assert_eq!(env.status_code, 200);
        assert_eq!(env.body, r#"{"object":true}"#);
        assert_eq!(env.headers["Custom-Headers"], "true");
        assert_eq!(env.multi_value_headers.unwrap()["Set-Cookie"].len(), 2);
        assert!(env.is_base64_encoded);
    }
}
