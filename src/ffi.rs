//! FFI interface for C++ interop
//!
//! Provides C-compatible functions for extracting records from HTML.
//! Mappings come in and records go out as JSON.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use serde_json::json;
use tracing::debug;

use crate::extractors::extract;
use crate::mapping::Mapping;
use crate::topics::my_topics_mapping;

/// Result struct returned to C++
/// Both pointers are owned by Rust and must be freed via free_extraction_result
#[repr(C)]
pub struct ExtractionResultFFI {
    /// JSON-serialized result (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if extraction failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Build a record from HTML with a JSON mapping description.
///
/// On success `json_ptr` holds `{"valid": bool, "record": {...}}`, where the
/// record carries raw fields, derived fields and child lists.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `mapping_json` - JSON mapping description (null-terminated)
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `mapping_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_extraction_result`
#[no_mangle]
pub unsafe extern "C" fn extract_record_ffi(
    html_ptr: *const c_char,
    html_len: usize,
    mapping_json: *const c_char,
) -> ExtractionResultFFI {
    let html = match html_from_raw(html_ptr, html_len) {
        Ok(h) => h,
        Err(msg) => return make_error_result(msg),
    };

    let mapping_str = if mapping_json.is_null() {
        return make_error_result("Mapping JSON is null");
    } else {
        match CStr::from_ptr(mapping_json).to_str() {
            Ok(s) => s,
            Err(_) => return make_error_result("Invalid UTF-8 in mapping JSON"),
        }
    };

    let mapping = match Mapping::from_json(mapping_str) {
        Ok(m) => m,
        Err(e) => return make_error_result(&e.to_string()),
    };

    run_extraction(html, &mapping)
}

/// Build a topic list page record with the built-in mapping
///
/// # Safety
/// Same as extract_record_ffi
#[no_mangle]
pub unsafe extern "C" fn extract_my_topics_ffi(
    html_ptr: *const c_char,
    html_len: usize,
) -> ExtractionResultFFI {
    let html = match html_from_raw(html_ptr, html_len) {
        Ok(h) => h,
        Err(msg) => return make_error_result(msg),
    };

    match my_topics_mapping() {
        Ok(mapping) => run_extraction(html, mapping),
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// Free an ExtractionResultFFI returned by one of the extract functions
///
/// # Safety
/// - `result` must have been returned by an extract function of this module
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_extraction_result(result: ExtractionResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

unsafe fn html_from_raw<'a>(html_ptr: *const c_char, html_len: usize) -> Result<&'a str, &'static str> {
    if html_ptr.is_null() || html_len == 0 {
        return Ok("");
    }
    let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
    std::str::from_utf8(slice).map_err(|_| "Invalid UTF-8 in HTML content")
}

fn run_extraction(html: &str, mapping: &Mapping) -> ExtractionResultFFI {
    let record = match extract(html, mapping) {
        Ok(r) => r,
        Err(e) => {
            debug!(error = %e, "extraction failed");
            return make_error_result(&e.to_string());
        }
    };

    let result = json!({
        "valid": mapping.is_valid(&record),
        "record": record.to_json(),
    });

    match CString::new(result.to_string()) {
        Ok(cstr) => ExtractionResultFFI {
            json_ptr: cstr.into_raw(),
            error_ptr: ptr::null_mut(),
        },
        Err(_) => make_error_result("Result JSON contains null bytes"),
    }
}

// Helper to create error result
fn make_error_result(msg: &str) -> ExtractionResultFFI {
    let error_cstr = CString::new(msg.replace('\0', "")).unwrap_or_default();
    ExtractionResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPPING: &str = r##"{
        "root": "ul.topics",
        "children": [{
            "name": "items",
            "selector": "li",
            "fields": [
                {"name": "title", "selector": "a"},
                {"name": "link", "selector": "a", "accessor": "attr:href"},
                {"name": "replies", "selector": "span.replies", "type": "int"}
            ],
            "derived": [
                {"name": "id", "source": "link", "kind": "path_segment", "prefix": "/t/", "terminator": "#"}
            ]
        }]
    }"##;

    unsafe fn take_result(result: ExtractionResultFFI) -> (Option<String>, Option<String>) {
        let json = (!result.json_ptr.is_null())
            .then(|| CStr::from_ptr(result.json_ptr).to_string_lossy().into_owned());
        let error = (!result.error_ptr.is_null())
            .then(|| CStr::from_ptr(result.error_ptr).to_string_lossy().into_owned());
        free_extraction_result(result);
        (json, error)
    }

    #[test]
    fn test_extract_record_ffi() {
        let html = r##"<ul class="topics">
            <li><a href="/t/1#reply2">One</a><span class="replies">2</span></li>
            <li><a href="/t/2">Two</a><span class="replies">-</span></li>
        </ul>"##;
        let mapping = CString::new(MAPPING).unwrap();

        let (json, error) = unsafe {
            take_result(extract_record_ffi(
                html.as_ptr() as *const c_char,
                html.len(),
                mapping.as_ptr(),
            ))
        };
        assert!(error.is_none());

        let value: serde_json::Value = serde_json::from_str(&json.unwrap()).unwrap();
        assert_eq!(value["valid"], true);
        assert_eq!(value["record"]["items"][0]["id"], "1");
        assert_eq!(value["record"]["items"][0]["replies"], 2);
        assert_eq!(value["record"]["items"][1]["id"], "2");
        assert_eq!(value["record"]["items"][1]["replies"], 0);
    }

    #[test]
    fn test_root_not_found_is_error() {
        let html = "<p>nothing here</p>";
        let mapping = CString::new(MAPPING).unwrap();

        let (json, error) = unsafe {
            take_result(extract_record_ffi(
                html.as_ptr() as *const c_char,
                html.len(),
                mapping.as_ptr(),
            ))
        };
        assert!(json.is_none());
        assert!(error.unwrap().contains("ul.topics"));
    }

    #[test]
    fn test_invalid_utf8_html_is_error() {
        let html: &[u8] = b"\xff\xfe";
        let mapping = CString::new(MAPPING).unwrap();

        let (json, error) = unsafe {
            take_result(extract_record_ffi(
                html.as_ptr() as *const c_char,
                html.len(),
                mapping.as_ptr(),
            ))
        };
        assert!(json.is_none());
        assert_eq!(error.as_deref(), Some("Invalid UTF-8 in HTML content"));

        let (json, error) = unsafe {
            take_result(extract_my_topics_ffi(html.as_ptr() as *const c_char, html.len()))
        };
        assert!(json.is_none());
        assert_eq!(error.as_deref(), Some("Invalid UTF-8 in HTML content"));
    }

    #[test]
    fn test_bad_mapping_is_error() {
        let mapping = CString::new(r#"{"root": "div["}"#).unwrap();
        let (json, error) =
            unsafe { take_result(extract_record_ffi(ptr::null(), 0, mapping.as_ptr())) };
        assert!(json.is_none());
        assert!(error.unwrap().contains("invalid selector"));

        let (_, error) =
            unsafe { take_result(extract_record_ffi(ptr::null(), 0, ptr::null())) };
        assert_eq!(error.as_deref(), Some("Mapping JSON is null"));
    }

    #[test]
    fn test_extract_my_topics_ffi() {
        let html = r#"<div id="Wrapper"><div class="cell item"><span class="item_title"><a href="/t/9#reply1">Hi</a></span></div></div>"#;
        let (json, error) = unsafe {
            take_result(extract_my_topics_ffi(html.as_ptr() as *const c_char, html.len()))
        };
        assert!(error.is_none());

        let value: serde_json::Value = serde_json::from_str(&json.unwrap()).unwrap();
        assert_eq!(value["valid"], true);
        assert_eq!(value["record"]["items"][0]["id"], "9");
        assert_eq!(value["record"]["items"][0]["user_name"], serde_json::Value::Null);
        assert_eq!(value["record"]["total"], 0);
    }
}
