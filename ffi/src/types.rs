//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, pointer + length pairs instead of maps,
//! and enums with explicit discriminants. Conversion and release helpers
//! live here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use envelope_core::{ResponseBuilder, ResponseEnvelope};

/// Opaque handle to a `ResponseBuilder`. C callers receive a pointer to this
/// and pass it back into every build function.
pub struct FfiResponseBuilder {
    pub(crate) inner: ResponseBuilder,
}

/// A single-valued header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// A multi-valued header: one key, `values_len` C strings in order.
#[repr(C)]
pub struct FfiMultiHeader {
    pub key: *mut c_char,
    pub values: *mut *mut c_char,
    pub values_len: u32,
}

/// A response envelope as C-compatible plain data.
///
/// `multi_value_headers` is null (and `multi_value_headers_len` zero) when
/// the envelope has no multi-value headers.
#[repr(C)]
pub struct FfiEnvelope {
    pub status_code: u16,
    pub body: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub multi_value_headers: *mut FfiMultiHeader,
    pub multi_value_headers_len: u32,
    pub is_base64_encoded: bool,
}

/// Error codes returned in `FfiEnvelopeResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NullArg = 1,
    InvalidUtf8 = 2,
    InvalidJson = 3,
    InteriorNul = 4,
    Panic = 5,
}

/// Result of every `envelope_build*` call that returns structured data.
///
/// On success `error_code` is `Ok`, `error_message` is null and `envelope`
/// points to the built envelope. On failure `envelope` is null and
/// `error_message` is a human-readable C string.
#[repr(C)]
pub struct FfiEnvelopeResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub envelope: *mut FfiEnvelope,
}

impl FfiEnvelopeResult {
    pub(crate) fn ok(envelope: ResponseEnvelope) -> *mut Self {
        if contains_nul(&envelope) {
            return Self::error(
                FfiErrorCode::InteriorNul,
                "envelope contains an interior NUL byte",
            );
        }
        let result = Box::new(FfiEnvelopeResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            envelope: FfiEnvelope::from_core(envelope),
        });
        Box::into_raw(result)
    }

    pub(crate) fn error(code: FfiErrorCode, msg: &str) -> *mut Self {
        let result = Box::new(FfiEnvelopeResult {
            error_code: code,
            error_message: CString::new(msg).unwrap_or_default().into_raw(),
            envelope: std::ptr::null_mut(),
        });
        Box::into_raw(result)
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, msg)
    }
}

impl FfiEnvelope {
    /// Move a core envelope onto the heap as C data. Callers check
    /// `contains_nul` first; a string with an interior NUL would come out
    /// empty here.
    fn from_core(envelope: ResponseEnvelope) -> *mut Self {
        let headers: Vec<FfiHeader> = envelope
            .headers
            .into_iter()
            .map(|(k, v)| FfiHeader {
                key: c_string(k),
                value: c_string(v),
            })
            .collect();
        let (headers, headers_len) = into_raw_slice(headers);

        let multi: Vec<FfiMultiHeader> = envelope
            .multi_value_headers
            .unwrap_or_default()
            .into_iter()
            .map(|(k, values)| {
                let values: Vec<*mut c_char> = values.into_iter().map(c_string).collect();
                let (values, values_len) = into_raw_slice(values);
                FfiMultiHeader {
                    key: c_string(k),
                    values,
                    values_len,
                }
            })
            .collect();
        let (multi_value_headers, multi_value_headers_len) = into_raw_slice(multi);

        Box::into_raw(Box::new(FfiEnvelope {
            status_code: envelope.status_code,
            body: c_string(envelope.body),
            headers,
            headers_len,
            multi_value_headers,
            multi_value_headers_len,
            is_base64_encoded: envelope.is_base64_encoded,
        }))
    }

    /// Release every allocation owned by an envelope produced by `from_core`.
    ///
    /// # Safety
    /// `ptr` must come from `from_core` and must not be used afterwards.
    pub(crate) unsafe fn release(ptr: *mut FfiEnvelope) {
        let envelope = unsafe { Box::from_raw(ptr) };
        free_c_string(envelope.body);
        for header in unsafe { from_raw_slice(envelope.headers, envelope.headers_len) }.iter() {
            free_c_string(header.key);
            free_c_string(header.value);
        }
        let multi = unsafe {
            from_raw_slice(envelope.multi_value_headers, envelope.multi_value_headers_len)
        };
        for header in multi.iter() {
            free_c_string(header.key);
            for value in unsafe { from_raw_slice(header.values, header.values_len) }.iter() {
                free_c_string(*value);
            }
        }
    }
}

fn contains_nul(envelope: &ResponseEnvelope) -> bool {
    let has_nul = |s: &String| s.contains('\0');
    has_nul(&envelope.body)
        || envelope.headers.iter().any(|(k, v)| has_nul(k) || has_nul(v))
        || envelope.multi_value_headers.iter().flatten().any(|(k, values)| {
            has_nul(k) || values.iter().any(has_nul)
        })
}

fn c_string(s: String) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

pub(crate) fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Leak `items` as a boxed slice. Empty vectors become a null pointer.
fn into_raw_slice<T>(items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = items.len() as u32;
    let ptr = Box::into_raw(items.into_boxed_slice()) as *mut T;
    (ptr, len)
}

/// Reclaim a slice leaked by `into_raw_slice`.
///
/// # Safety
/// `ptr` and `len` must come from the same `into_raw_slice` call.
unsafe fn from_raw_slice<T>(ptr: *mut T, len: u32) -> Box<[T]> {
    if ptr.is_null() || len == 0 {
        return Box::new([]);
    }
    unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len as usize)) }
}
