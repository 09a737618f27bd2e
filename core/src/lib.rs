//! Response envelope builder for serverless HTTP handlers.
//!
//! # Overview
//! Turns a handler's loosely-typed result (body, optional status code,
//! optional headers, base64 flag) into the normalized envelope a gateway
//! expects back. Nothing here touches the network; the caller returns the
//! envelope to its runtime, which does the I/O.
//!
//! # Design
//! - Inputs are classified into tagged variants (`Body`, `HeaderValue`)
//!   before any rule is applied, so inference is an exhaustive match.
//! - `ResponseBuilder` is stateless apart from its fallback header set and is
//!   safe to share across threads.
//! - `build` never fails: missing or malformed values fall back to defaults.

pub mod builder;
pub mod error;
pub mod http;
pub mod loose;
pub mod types;

pub use builder::ResponseBuilder;
pub use error::EnvelopeError;
pub use http::{default_headers, ResponseEnvelope};
pub use types::{Body, HeaderValue, Headers, ResponseInput};

/// Four-argument form of `ResponseBuilder::build` using the default header
/// set. `status_code: None` and `headers: None` trigger inference and
/// defaulting respectively.
pub fn build(
    body: impl Into<Body>,
    status_code: Option<u16>,
    headers: Option<Headers>,
    is_base64_encoded: bool,
) -> ResponseEnvelope {
    ResponseBuilder::new().build(ResponseInput {
        body: body.into(),
        status_code,
        headers,
        is_base64_encoded,
    })
}
