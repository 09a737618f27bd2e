//! The response envelope returned to the invoking gateway.
//!
//! # Design
//! The envelope is plain data: the builder produces it and the caller hands
//! it to whatever runtime serializes it back to the gateway. Field names
//! serialize in the gateway's camelCase shape:
//!
//! ```text
//! { statusCode, body, headers, multiValueHeaders?, isBase64Encoded }
//! ```
//!
//! `multiValueHeaders` is an `Option` so "no multi-value headers" is a
//! distinct state that is left out of the wire form entirely.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EnvelopeError;
use crate::types::{HeaderValue, Headers};

pub const ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
pub const ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const MAX_AGE: &str = "Access-Control-Max-Age";

/// Header set used when a caller supplies no headers at all.
pub const DEFAULT_HEADERS: [(&str, &str); 4] = [
    (
        ALLOW_HEADERS,
        "Content-Type,Authorization,X-Amz-Date,X-Api-Key,X-Amz-Security-Token",
    ),
    (ALLOW_METHODS, "OPTIONS,POST,GET,PUT,DELETE"),
    (ALLOW_ORIGIN, "*"),
    (MAX_AGE, "86400"),
];

/// A fresh copy of the permissive CORS header set.
pub fn default_headers() -> Headers {
    DEFAULT_HEADERS
        .iter()
        .map(|(name, value)| (name.to_string(), HeaderValue::Single(value.to_string())))
        .collect()
}

/// A normalized HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status_code: u16,
    pub body: String,
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_value_headers: Option<BTreeMap<String, Vec<String>>>,
    pub is_base64_encoded: bool,
}

impl ResponseEnvelope {
    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string(self).map_err(|e| EnvelopeError::Serialization(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Every header line the gateway would emit, in name order: single
    /// headers once, multi-value headers once per value.
    pub fn header_lines(&self) -> Vec<(&str, &str)> {
        let mut lines: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        if let Some(multi) = &self.multi_value_headers {
            for (name, values) in multi {
                lines.extend(values.iter().map(|value| (name.as_str(), value.as_str())));
            }
        }
        lines.sort_by(|a, b| a.0.cmp(b.0));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope() -> ResponseEnvelope {
        ResponseEnvelope {
            status_code: 200,
            body: "ok".to_string(),
            headers: BTreeMap::from([("Content-Type".to_string(), "text/plain".to_string())]),
            multi_value_headers: None,
            is_base64_encoded: false,
        }
    }

    #[test]
    fn default_headers_are_all_single_valued() {
        let headers = default_headers();
        assert_eq!(headers.len(), 4);
        assert!(headers.values().all(|v| matches!(v, HeaderValue::Single(_))));
        assert_eq!(headers[ALLOW_ORIGIN], HeaderValue::Single("*".into()));
        assert_eq!(headers[MAX_AGE], HeaderValue::Single("86400".into()));
    }

    #[test]
    fn serializes_camel_case_without_empty_multi_value_headers() {
        let json = serde_json::to_value(envelope()).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["isBase64Encoded"], false);
        assert!(json.get("multiValueHeaders").is_none());
    }

    #[test]
    fn serializes_multi_value_headers_when_present() {
        let mut env = envelope();
        env.multi_value_headers = Some(BTreeMap::from([(
            "Set-Cookie".to_string(),
            vec!["a=1".to_string(), "b=2".to_string()],
        )]));
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["multiValueHeaders"]["Set-Cookie"][1], "b=2");
    }

    #[test]
    fn parses_wire_shape_without_multi_value_headers() {
        let env = ResponseEnvelope::from_json(
            r#"{"statusCode":204,"body":"","headers":{},"isBase64Encoded":false}"#,
        )
        .unwrap();
        assert_eq!(env.status_code, 204);
        assert!(env.multi_value_headers.is_none());
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(matches!(
            ResponseEnvelope::from_json("not json"),
            Err(EnvelopeError::InvalidJson(_))
        ));
    }

    #[test]
    fn header_lines_repeat_multi_values() {
        let mut env = envelope();
        env.multi_value_headers = Some(BTreeMap::from([(
            "Set-Cookie".to_string(),
            vec!["a=1".to_string(), "b=2".to_string()],
        )]));
        assert_eq!(
            env.header_lines(),
            vec![
                ("Content-Type", "text/plain"),
                ("Set-Cookie", "a=1"),
                ("Set-Cookie", "b=2"),
            ]
        );
    }
}
