//! C-ABI wrapper around `envelope-core`.
//!
//! # Overview
//! Exposes the response builder through `extern "C"` functions so handlers
//! written in any language with a C FFI can produce gateway envelopes
//! without reimplementing the defaulting rules.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Structured results come back in a single `FfiEnvelopeResult` carrying
//!   an error code, an optional message and the envelope.
//! - Headers cross the boundary as JSON text (`{"Name": "v"}` or
//!   `{"Name": ["v1", "v2"]}`); a null pointer selects the defaults.
//! - The C caller owns all returned pointers and must call the matching
//!   `envelope_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use envelope_core::types::headers_from_value;
use envelope_core::{Body, Headers, ResponseBuilder, ResponseInput};

use types::*;

// ---------------------------------------------------------------------------
// Builder lifecycle
// ---------------------------------------------------------------------------

/// Create a builder that falls back to the permissive CORS header set.
///
/// The caller must free the returned pointer with `envelope_builder_free`.
#[unsafe(no_mangle)]
pub extern "C" fn envelope_builder_new() -> *mut FfiResponseBuilder {
    catch_unwind(|| {
        Box::into_raw(Box::new(FfiResponseBuilder {
            inner: ResponseBuilder::new(),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Create a builder that falls back to `headers_json` when a call supplies
/// no headers.
///
/// Returns null if `headers_json` is null, is not valid JSON, or is not a
/// JSON object.
#[unsafe(no_mangle)]
pub extern "C" fn envelope_builder_new_with_headers(
    headers_json: *const c_char,
) -> *mut FfiResponseBuilder {
    catch_unwind(|| {
        if headers_json.is_null() {
            return std::ptr::null_mut();
        }
        match read_headers(headers_json) {
            Ok(Some(headers)) => Box::into_raw(Box::new(FfiResponseBuilder {
                inner: ResponseBuilder::with_default_headers(headers),
            })),
            _ => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a builder created by `envelope_builder_new*`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn envelope_builder_free(builder: *mut FfiResponseBuilder) {
    if !builder.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(builder) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build functions
// ---------------------------------------------------------------------------

/// Failure while reading caller-supplied arguments.
struct ArgError(FfiErrorCode, String);

impl ArgError {
    fn into_result(self) -> *mut FfiEnvelopeResult {
        FfiEnvelopeResult::error(self.0, &self.1)
    }
}

/// Borrow a nullable C string as `&str`.
fn read_str<'a>(ptr: *const c_char, name: &str) -> Result<Option<&'a str>, ArgError> {
    if ptr.is_null() {
        return Ok(None);
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map(Some)
        .map_err(|_| ArgError(FfiErrorCode::InvalidUtf8, format!("{name} is not valid UTF-8")))
}

/// Null means "not supplied". A JSON value that is not an object also means
/// "not supplied", matching the loose-input rules of the core.
fn read_headers(ptr: *const c_char) -> Result<Option<Headers>, ArgError> {
    let Some(text) = read_str(ptr, "headers_json")? else {
        return Ok(None);
    };
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| ArgError(FfiErrorCode::InvalidJson, format!("headers_json: {e}")))?;
    Ok(headers_from_value(&value))
}

fn build_with(
    builder: *const FfiResponseBuilder,
    body: Body,
    status_code: u16,
    headers_json: *const c_char,
    is_base64_encoded: bool,
) -> *mut FfiEnvelopeResult {
    let builder = unsafe { &*builder };
    let headers = match read_headers(headers_json) {
        Ok(headers) => headers,
        Err(e) => return e.into_result(),
    };
    let input = ResponseInput {
        body,
        status_code: (status_code != 0).then_some(status_code),
        headers,
        is_base64_encoded,
    };
    FfiEnvelopeResult::ok(builder.inner.build(input))
}

/// Build an envelope around a text body.
///
/// `body` may be null (no body). `status_code` 0 means "infer".
/// `headers_json` may be null (use the builder's defaults).
/// The caller must free the result with `envelope_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn envelope_build(
    builder: *const FfiResponseBuilder,
    body: *const c_char,
    status_code: u16,
    headers_json: *const c_char,
    is_base64_encoded: bool,
) -> *mut FfiEnvelopeResult {
    catch_unwind(|| {
        if builder.is_null() {
            return FfiEnvelopeResult::null_arg("builder");
        }
        let body = match read_str(body, "body") {
            Ok(body) => Body::from(body),
            Err(e) => return e.into_result(),
        };
        build_with(builder, body, status_code, headers_json, is_base64_encoded)
    })
    .unwrap_or_else(|_| FfiEnvelopeResult::panic("panic in envelope_build"))
}

/// Build an envelope around an error-like body whose text is `message`.
/// Without an explicit status the envelope carries 400.
#[unsafe(no_mangle)]
pub extern "C" fn envelope_build_error(
    builder: *const FfiResponseBuilder,
    message: *const c_char,
    status_code: u16,
    headers_json: *const c_char,
    is_base64_encoded: bool,
) -> *mut FfiEnvelopeResult {
    catch_unwind(|| {
        if builder.is_null() {
            return FfiEnvelopeResult::null_arg("builder");
        }
        let message = match read_str(message, "message") {
            Ok(Some(message)) => message,
            Ok(None) => return FfiEnvelopeResult::null_arg("message"),
            Err(e) => return e.into_result(),
        };
        let body = Body::Error(message.to_string());
        build_with(builder, body, status_code, headers_json, is_base64_encoded)
    })
    .unwrap_or_else(|_| FfiEnvelopeResult::panic("panic in envelope_build_error"))
}

/// Build from a loose JSON event and return the envelope's JSON text.
///
/// Returns null if an argument is null, `event_json` is not valid JSON, or
/// the envelope cannot be represented as a C string.
/// The caller must free the returned string with `envelope_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn envelope_build_json(
    builder: *const FfiResponseBuilder,
    event_json: *const c_char,
) -> *mut c_char {
    catch_unwind(|| {
        if builder.is_null() || event_json.is_null() {
            return std::ptr::null_mut();
        }
        let builder = unsafe { &*builder };
        let Ok(Some(text)) = read_str(event_json, "event_json") else {
            return std::ptr::null_mut();
        };
        let Ok(event) = serde_json::from_str::<serde_json::Value>(text) else {
            return std::ptr::null_mut();
        };
        builder
            .inner
            .build_json(&event)
            .to_json()
            .ok()
            .and_then(|json| CString::new(json).ok())
            .map_or(std::ptr::null_mut(), CString::into_raw)
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiEnvelopeResult` returned by any `envelope_build*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn envelope_free_result(result: *mut FfiEnvelopeResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        if !result.envelope.is_null() {
            unsafe { FfiEnvelope::release(result.envelope) };
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn envelope_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
