//! FFI bindings for Strava Stats
//!
//! This module provides C-compatible functions for calling the engine from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `stats_free_string`.
//!
//! Window arguments are JSON: `{"days_back": N}` or
//! `{"start_date": "YYYY-MM-DD", "end_date": "YYYY-MM-DD"}`. NULL or an empty
//! string selects the default window.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::NaiveDate;

use crate::config::EngineConfig;
use crate::error::StatsError;
use crate::pipeline::{activities_report_json, running_report_json, trends_report_json, StatsEngine};

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

/// Hand a report result back across the boundary
fn finish(result: Result<String, StatsError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Read the activities and window arguments shared by every report call
unsafe fn report_args(json: *const c_char, window: *const c_char) -> Option<(String, String)> {
    let Some(json_str) = cstr_to_string(json) else {
        set_last_error("Invalid JSON string pointer");
        return None;
    };

    // NULL means the default window; a non-NULL invalid string is an error
    let window_str = if window.is_null() {
        String::new()
    } else {
        match cstr_to_string(window) {
            Some(s) => s,
            None => {
                set_last_error("Invalid window string pointer");
                return None;
            }
        }
    };

    Some((json_str, window_str))
}

// ============================================================================
// Stateless API
// ============================================================================

/// Build an activity summary from raw activities JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - `window` must be a valid null-terminated C string or NULL.
/// - Returns a newly allocated string that must be freed with `stats_free_string`.
/// - Returns NULL on error; call `stats_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn stats_activities_report(
    json: *const c_char,
    window: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some((json_str, window_str)) = report_args(json, window) else {
        return ptr::null_mut();
    };

    finish(activities_report_json(json_str, window_str))
}

/// Build running stats, personal records and a distance histogram.
///
/// `use_miles` non-zero bins the histogram by mile, zero by kilometer.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - `window` must be a valid null-terminated C string or NULL.
/// - Returns a newly allocated string that must be freed with `stats_free_string`.
/// - Returns NULL on error; call `stats_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn stats_running_report(
    json: *const c_char,
    window: *const c_char,
    use_miles: i32,
) -> *mut c_char {
    clear_last_error();

    let Some((json_str, window_str)) = report_args(json, window) else {
        return ptr::null_mut();
    };

    finish(running_report_json(json_str, window_str, use_miles != 0))
}

/// Build a trend series.
///
/// # Safety
/// - `json` and `period` must be valid null-terminated C strings.
/// - `window` must be a valid null-terminated C string or NULL.
/// - `period` is one of `daily`, `weekly`, `monthly`.
/// - Returns a newly allocated string that must be freed with `stats_free_string`.
/// - Returns NULL on error; call `stats_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn stats_trends_report(
    json: *const c_char,
    window: *const c_char,
    period: *const c_char,
    running_only: i32,
) -> *mut c_char {
    clear_last_error();

    let Some((json_str, window_str)) = report_args(json, window) else {
        return ptr::null_mut();
    };

    let period_str = match cstr_to_string(period) {
        Some(s) => s,
        None => {
            set_last_error("Invalid period string pointer");
            return ptr::null_mut();
        }
    };

    finish(trends_report_json(
        json_str,
        window_str,
        period_str,
        running_only != 0,
    ))
}

// ============================================================================
// Configured Engine API
// ============================================================================

/// Opaque handle to a StatsEngine
pub struct StatsEngineHandle {
    engine: StatsEngine,
}

/// Create an engine from a JSON configuration.
///
/// `config_json` may be NULL for defaults. `today` may be NULL to use the
/// local calendar date, or a `YYYY-MM-DD` string to pin it.
///
/// # Safety
/// - `config_json` and `today` must be valid null-terminated C strings or NULL.
/// - Returns a pointer that must be freed with `stats_engine_free`.
/// - Returns NULL on error; call `stats_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn stats_engine_new(
    config_json: *const c_char,
    today: *const c_char,
) -> *mut StatsEngineHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        EngineConfig::default()
    } else {
        let Some(json) = cstr_to_string(config_json) else {
            set_last_error("Invalid config string pointer");
            return ptr::null_mut();
        };
        match EngineConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let mut engine = StatsEngine::with_config(config);

    if !today.is_null() {
        let Some(today_str) = cstr_to_string(today) else {
            set_last_error("Invalid today string pointer");
            return ptr::null_mut();
        };
        match NaiveDate::parse_from_str(&today_str, "%Y-%m-%d") {
            Ok(date) => engine = engine.as_of(date),
            Err(e) => {
                let err = StatsError::DateParseError(format!("{}: {}", today_str, e));
                set_last_error(&err.to_string());
                return ptr::null_mut();
            }
        }
    }

    Box::into_raw(Box::new(StatsEngineHandle { engine }))
}

/// Free an engine.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `stats_engine_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn stats_engine_free(engine: *mut StatsEngineHandle) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Run the configured engine: activity summary.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `stats_engine_new`.
/// - `json` must be a valid null-terminated C string; `window` may be NULL.
/// - Returns a newly allocated string that must be freed with `stats_free_string`.
#[no_mangle]
pub unsafe extern "C" fn stats_engine_activities_report(
    engine: *mut StatsEngineHandle,
    json: *const c_char,
    window: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let engine = &(*engine).engine;

    let Some((json_str, window_str)) = report_args(json, window) else {
        return ptr::null_mut();
    };

    finish(engine.activities_report_json(&json_str, &window_str))
}

/// Run the configured engine: running report, binned per the configured unit.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `stats_engine_new`.
/// - `json` must be a valid null-terminated C string; `window` may be NULL.
/// - Returns a newly allocated string that must be freed with `stats_free_string`.
#[no_mangle]
pub unsafe extern "C" fn stats_engine_running_report(
    engine: *mut StatsEngineHandle,
    json: *const c_char,
    window: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let engine = &(*engine).engine;

    let Some((json_str, window_str)) = report_args(json, window) else {
        return ptr::null_mut();
    };

    let use_miles = engine.config().use_miles;
    finish(engine.running_report_json(&json_str, &window_str, use_miles))
}

/// Run the configured engine: trends for the configured period and filter.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `stats_engine_new`.
/// - `json` must be a valid null-terminated C string; `window` may be NULL.
/// - Returns a newly allocated string that must be freed with `stats_free_string`.
#[no_mangle]
pub unsafe extern "C" fn stats_engine_trends_report(
    engine: *mut StatsEngineHandle,
    json: *const c_char,
    window: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let engine = &(*engine).engine;

    let Some((json_str, window_str)) = report_args(json, window) else {
        return ptr::null_mut();
    };

    let config = engine.config();
    finish(engine.trends_report_json(
        &json_str,
        &window_str,
        config.period,
        config.running_only,
    ))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by a `stats_*` function.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a `stats_*` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn stats_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next `stats_*` call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn stats_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn stats_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
