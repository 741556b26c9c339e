//! FFI bindings for Compose Flux
//!
//! This module provides C-compatible functions so a mobile or web host can own a
//! tracker through an opaque handle. All functions use C strings
//! (null-terminated) and return allocated memory that must be freed by the
//! caller using `compose_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::replay::replay_to_json;
use crate::tracker::CompositionTracker;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Replay an event log JSON document and return report JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `compose_free_string`.
/// - Returns NULL on error; call `compose_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn compose_replay_to_json(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match replay_to_json(&json_str) {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Tracker API
// ============================================================================

/// Opaque handle to a CompositionTracker
pub struct ComposeTrackerHandle {
    tracker: CompositionTracker,
}

/// Create a new tracker on the wall clock.
///
/// # Safety
/// - Returns a pointer that must be freed with `compose_tracker_free`.
#[no_mangle]
pub extern "C" fn compose_tracker_new() -> *mut ComposeTrackerHandle {
    clear_last_error();
    Box::into_raw(Box::new(ComposeTrackerHandle {
        tracker: CompositionTracker::new(),
    }))
}

/// Free a tracker.
///
/// # Safety
/// - `tracker` must be a valid pointer returned by `compose_tracker_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn compose_tracker_free(tracker: *mut ComposeTrackerHandle) {
    if !tracker.is_null() {
        drop(Box::from_raw(tracker));
    }
}

/// Begin a new composition session.
///
/// # Safety
/// - `tracker` must be a valid pointer returned by `compose_tracker_new`.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn compose_tracker_start(tracker: *mut ComposeTrackerHandle) -> i32 {
    clear_last_error();

    if tracker.is_null() {
        set_last_error("Null tracker pointer");
        return -1;
    }

    (*tracker).tracker.start();
    0
}

/// Record one content edit. A NULL `previous_content` is treated as empty.
///
/// # Safety
/// - `tracker` must be a valid pointer returned by `compose_tracker_new`.
/// - `new_content` must be a valid null-terminated C string.
/// - `previous_content` must be a valid null-terminated C string or NULL.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn compose_tracker_record_change(
    tracker: *mut ComposeTrackerHandle,
    new_content: *const c_char,
    previous_content: *const c_char,
) -> i32 {
    clear_last_error();

    if tracker.is_null() {
        set_last_error("Null tracker pointer");
        return -1;
    }

    let new_str = match cstr_to_string(new_content) {
        Some(s) => s,
        None => {
            set_last_error("Invalid content string (null or not UTF-8)");
            return -1;
        }
    };

    let previous_str = if previous_content.is_null() {
        String::new()
    } else {
        match cstr_to_string(previous_content) {
            Some(s) => s,
            None => {
                set_last_error("Invalid previous content string (not UTF-8)");
                return -1;
            }
        }
    };

    (*tracker).tracker.record_change(&new_str, &previous_str);
    0
}

/// Finish the session and return the metrics as JSON.
///
/// # Safety
/// - `tracker` must be a valid pointer returned by `compose_tracker_new`.
/// - `final_content` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `compose_free_string`.
/// - Returns NULL on error; call `compose_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn compose_tracker_finish(
    tracker: *mut ComposeTrackerHandle,
    final_content: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if tracker.is_null() {
        set_last_error("Null tracker pointer");
        return ptr::null_mut();
    }

    let final_str = match cstr_to_string(final_content) {
        Some(s) => s,
        None => {
            set_last_error("Invalid content string (null or not UTF-8)");
            return ptr::null_mut();
        }
    };

    let metrics = (*tracker).tracker.finish(&final_str);
    match serde_json::to_string(&metrics) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Abandon the session without producing metrics.
///
/// # Safety
/// - `tracker` must be a valid pointer returned by `compose_tracker_new`.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn compose_tracker_reset(tracker: *mut ComposeTrackerHandle) -> i32 {
    clear_last_error();

    if tracker.is_null() {
        set_last_error("Null tracker pointer");
        return -1;
    }

    (*tracker).tracker.reset();
    0
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Compose Flux functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Compose Flux function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn compose_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Compose Flux call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn compose_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionMetrics;

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        compose_free_string(ptr);
        s
    }

    #[test]
    fn test_tracker_lifecycle() {
        unsafe {
            let tracker = compose_tracker_new();
            assert_eq!(compose_tracker_start(tracker), 0);

            let a = c("a");
            let ab = c("ab");
            assert_eq!(compose_tracker_record_change(tracker, a.as_ptr(), ptr::null()), 0);
            assert_eq!(compose_tracker_record_change(tracker, ab.as_ptr(), a.as_ptr()), 0);
            assert_eq!(compose_tracker_record_change(tracker, a.as_ptr(), ab.as_ptr()), 0);

            let json = take_string(compose_tracker_finish(tracker, a.as_ptr()));
            let metrics: SessionMetrics = serde_json::from_str(&json).unwrap();
            assert_eq!(metrics.backspace_count, 1);
            assert_eq!(metrics.max_char_count, 2);
            assert_eq!(metrics.final_char_count, 1);

            assert_eq!(compose_tracker_reset(tracker), 0);
            let json = take_string(compose_tracker_finish(tracker, a.as_ptr()));
            let metrics: SessionMetrics = serde_json::from_str(&json).unwrap();
            assert_eq!(metrics.backspace_count, 0);
            assert_eq!(metrics.writing_duration_sec, 0);

            compose_tracker_free(tracker);
        }
    }

    #[test]
    fn test_null_tracker_sets_error() {
        unsafe {
            assert_eq!(compose_tracker_start(ptr::null_mut()), -1);
            let err = CStr::from_ptr(compose_last_error()).to_str().unwrap();
            assert_eq!(err, "Null tracker pointer");
        }
    }

    #[test]
    fn test_non_utf8_content_rejected() {
        unsafe {
            let tracker = compose_tracker_new();
            let bad = CString::new(vec![0xff, 0xfe, b'a']).unwrap();
            let ok = c("ok");

            assert_eq!(compose_tracker_record_change(tracker, bad.as_ptr(), ptr::null()), -1);
            let err = CStr::from_ptr(compose_last_error()).to_str().unwrap();
            assert_eq!(err, "Invalid content string (null or not UTF-8)");

            assert_eq!(compose_tracker_record_change(tracker, ok.as_ptr(), bad.as_ptr()), -1);
            let err = CStr::from_ptr(compose_last_error()).to_str().unwrap();
            assert_eq!(err, "Invalid previous content string (not UTF-8)");

            assert!(compose_tracker_finish(tracker, bad.as_ptr()).is_null());
            let err = CStr::from_ptr(compose_last_error()).to_str().unwrap();
            assert_eq!(err, "Invalid content string (null or not UTF-8)");

            compose_tracker_free(tracker);
        }
    }

    #[test]
    fn test_replay_error_reported() {
        unsafe {
            let bad = c("not json");
            assert!(compose_replay_to_json(bad.as_ptr()).is_null());
            assert!(!compose_last_error().is_null());

            let good = c(r#"{"session_id":"s","events":[]}"#);
            let json = take_string(compose_replay_to_json(good.as_ptr()));
            assert!(json.contains("\"sessions\":[]"));
            assert!(compose_last_error().is_null());
        }
    }
}
