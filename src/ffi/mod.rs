// In src/ffi/mod.rs
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::sync::OnceLock;
use crate::ffi::error::{ErrorCode, FFIError};
use serde::Serialize;
use tokio::runtime::Runtime;

pub mod error;
pub mod table;

pub use error::FFIResult;

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Shared runtime for every FFI call. Kept alive for the life of the
/// process so spawned notice timers outlive the call that started them.
pub fn runtime() -> FFIResult<&'static Runtime> {
    if let Some(rt) = RUNTIME.get() {
        return Ok(rt);
    }
    let rt = Runtime::new().map_err(|e| {
        FFIError::with_details(ErrorCode::InternalError, "Failed to create async runtime", &e.to_string())
    })?;
    // Another thread may have won the race; either runtime is fine
    let _ = RUNTIME.set(rt);
    RUNTIME
        .get()
        .ok_or_else(|| FFIError::internal("Async runtime unavailable".to_string()))
}

/// Run an async future to completion on the shared runtime
pub fn block_on_async<F, T>(future: F) -> FFIResult<T>
where
    F: std::future::Future<Output = FFIResult<T>>,
{
    runtime()?.block_on(future)
}

/// Error handling helper for FFI boundaries (returns error code)
pub fn handle_status_result<F>(func: F) -> c_int
where
    F: FnOnce() -> FFIResult<()>,
{
    match func() {
        Ok(_) => ErrorCode::Success as c_int,
        Err(e) => {
            log::error!(
                "[Rust FFI Error] Code: {:?}, Message: {}, Details: {:?}",
                e.code,
                e.message,
                e.details.as_deref().unwrap_or("None")
            );
            e.code as c_int
        }
    }
}

/// Hands ownership of `value` to the caller as a C string
pub fn to_c_string(value: String) -> FFIResult<*mut c_char> {
    Ok(CString::new(value)?.into_raw())
}

/// Serializes `value` and hands the JSON to the caller
pub fn create_json_response<T: Serialize>(value: &T) -> FFIResult<*mut c_char> {
    let json = serde_json::to_string(value)
        .map_err(|e| FFIError::internal(format!("JSON serialization failed: {}", e)))?;
    to_c_string(json)
}

/// Borrows a C string as `&str`.
///
/// # Safety
/// `ptr` must be null or a valid null-terminated string that outlives `'a`.
pub unsafe fn str_from_ptr<'a>(ptr: *const c_char, what: &str) -> FFIResult<&'a str> {
    if ptr.is_null() {
        return Err(FFIError::null_pointer(what));
    }
    Ok(unsafe { CStr::from_ptr(ptr) }.to_str()?)
}

/// Like [`str_from_ptr`] but a null pointer yields `None`.
///
/// # Safety
/// Same as [`str_from_ptr`].
pub unsafe fn opt_str_from_ptr<'a>(ptr: *const c_char, what: &str) -> FFIResult<Option<&'a str>> {
    if ptr.is_null() {
        Ok(None)
    } else {
        unsafe { str_from_ptr(ptr, what) }.map(Some)
    }
}
