// src/ffi/table.rs
// ============================================================================
// FFI bindings for `TableSession`.
// The host owns an opaque session handle. Inputs arrive as C strings (JSON
// where structured), results leave as JSON strings through an out pointer.
//
// Memory ownership:
//   - Every *mut c_char handed out must be released with `table_free_string`.
//   - Every handle from `table_session_new` must be released with
//     `table_session_free`.
// ============================================================================

use crate::config::TableConfig;
use crate::domains::export::{DirectorySink, ExportFormat};
use crate::domains::notification::schedule_expiry;
use crate::domains::store::RecordSource;
use crate::domains::table::TableSession;
use crate::ffi::error::{FFIError, FFIResult};
use crate::ffi::{block_on_async, create_json_response, handle_status_result, opt_str_from_ptr, runtime, str_from_ptr};
use crate::types::RecordId;
use serde_json::json;
use std::ffi::{c_char, CString};
use std::os::raw::c_int;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Opaque session handle given to the host
pub struct TableHandle {
    config: TableConfig,
    session: Mutex<TableSession>,
}

impl TableHandle {
    fn new(config: TableConfig) -> FFIResult<Self> {
        let session = TableSession::new(&config)?;
        Ok(Self {
            config,
            session: Mutex::new(session),
        })
    }

    fn lock(&self) -> FFIResult<MutexGuard<'_, TableSession>> {
        self.session
            .lock()
            .map_err(|_| FFIError::internal("Table session lock poisoned".to_string()))
    }
}

/// # Safety
/// `handle` must be null or a pointer returned by `table_session_new` that
/// has not been freed.
unsafe fn handle_ref<'a>(handle: *const TableHandle) -> FFIResult<&'a TableHandle> {
    unsafe { handle.as_ref() }.ok_or_else(|| FFIError::null_pointer("session handle"))
}

/// # Safety
/// `result` must be null or valid for writes.
unsafe fn write_result(result: *mut *mut c_char, value: *mut c_char) -> FFIResult<()> {
    if result.is_null() {
        // Reclaim the string rather than leak it
        drop(unsafe { CString::from_raw(value) });
        return Err(FFIError::null_pointer("result"));
    }
    unsafe { *result = value };
    Ok(())
}

fn parse_format(format: &str) -> FFIResult<ExportFormat> {
    ExportFormat::from_str(format)
        .ok_or_else(|| FFIError::invalid_argument(&format!("Unsupported export format: {}", format)))
}

/// Reloads `handle` from `source`. The session lock is released while the
/// fetch is in flight so snapshots keep answering and report `loading`.
fn reload_from(handle: &TableHandle, source: &dyn RecordSource) -> FFIResult<usize> {
    handle.lock()?.begin_reload();
    let outcome = block_on_async(async { Ok::<_, FFIError>(source.fetch().await) })?;
    Ok(handle.lock()?.finish_reload(outcome)?)
}

/// Arms the expiry timer for whatever notice is showing now
fn schedule_notice_expiry(session: &TableSession) -> FFIResult<()> {
    if let Some(notice) = session.notice() {
        runtime()?.spawn(schedule_expiry(session.notifications(), notice.generation));
    }
    Ok(())
}

// ============================================================================
// SESSION LIFECYCLE
// ============================================================================

/// Create a table session.
///
/// `config_json` may be null, in which case configuration comes from the
/// environment (`.env` and `RECORD_TABLE_*`).
///
/// # Safety
/// `config_json` must be null or a valid C string; `out_handle` must be valid
/// for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn table_session_new(
    config_json: *const c_char,
    out_handle: *mut *mut TableHandle,
) -> c_int {
    handle_status_result(|| unsafe {
        if out_handle.is_null() {
            return Err(FFIError::null_pointer("out_handle"));
        }
        crate::initialize_logging();

        let config = match opt_str_from_ptr(config_json, "config_json")? {
            Some(json) => TableConfig::from_json(json)?,
            None => TableConfig::from_env()?,
        };
        log::info!("Creating table session (reload policy {:?})", config.reload_policy);

        *out_handle = Box::into_raw(Box::new(TableHandle::new(config)?));
        Ok(())
    })
}

/// Release a session handle.
///
/// # Safety
/// `handle` must be null or a pointer from `table_session_new`, freed once.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn table_session_free(handle: *mut TableHandle) {
    if !handle.is_null() {
        unsafe {
            drop(Box::from_raw(handle));
        }
    }
}

// ============================================================================
// RECORDS AND SELECTION
// ============================================================================

/// Replace the session's records with a JSON array.
/// Output: `{"accepted": n, "rejected": [Rejection]}`
///
/// # Safety
/// Pointers must be valid as described on `table_session_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn table_set_records(
    handle: *const TableHandle,
    records_json: *const c_char,
    result: *mut *mut c_char,
) -> c_int {
    handle_status_result(|| unsafe {
        let handle = handle_ref(handle)?;
        let raw: serde_json::Value = serde_json::from_str(str_from_ptr(records_json, "records_json")?)?;

        let mut session = handle.lock()?;
        let rejected = session.set_records(&raw);
        let response = json!({
            "accepted": session.records().len(),
            "rejected": rejected,
        });
        write_result(result, create_json_response(&response)?)
    })
}

/// Toggle the selection of one record. `id_json` is a JSON scalar such as
/// `2` or `"a-1"`.
/// Output: `{"id": id, "selected": bool}`
///
/// # Safety
/// Pointers must be valid as described on `table_session_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn table_toggle(
    handle: *const TableHandle,
    id_json: *const c_char,
    result: *mut *mut c_char,
) -> c_int {
    handle_status_result(|| unsafe {
        let handle = handle_ref(handle)?;
        let value: serde_json::Value = serde_json::from_str(str_from_ptr(id_json, "id_json")?)?;
        let id = RecordId::from_json(&value)
            .ok_or_else(|| FFIError::invalid_argument("Record id must be an integer or a string"))?;

        let selected = handle.lock()?.toggle(&id)?;
        write_result(result, create_json_response(&json!({ "id": id, "selected": selected }))?)
    })
}

/// Export the selected records (or all of them) as `format` (`"csv"`,
/// `"xlsx"`). Files land in `directory`, or the configured export directory
/// when `directory` is null.
/// Output: ExportOutcome JSON
///
/// # Safety
/// Pointers must be valid as described on `table_session_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn table_export(
    handle: *const TableHandle,
    format: *const c_char,
    directory: *const c_char,
    result: *mut *mut c_char,
) -> c_int {
    handle_status_result(|| unsafe {
        let handle = handle_ref(handle)?;
        let format = parse_format(str_from_ptr(format, "format")?)?;
        let dir = match opt_str_from_ptr(directory, "directory")? {
            Some(dir) => PathBuf::from(dir),
            None => handle
                .config
                .export_dir
                .clone()
                .ok_or_else(|| FFIError::invalid_argument("No export directory given or configured"))?,
        };

        let session = handle.lock()?;
        let outcome = session.export(format, &DirectorySink::new(dir));
        // Success and failure both leave a notice to expire
        schedule_notice_expiry(&session)?;
        write_result(result, create_json_response(&outcome?)?)
    })
}

/// Reload records from the configured remote source.
/// Output: `{"loaded": n}`
///
/// # Safety
/// Pointers must be valid as described on `table_session_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn table_reload(handle: *const TableHandle, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let handle = handle_ref(handle)?;
        let source = handle.config.record_source();
        let loaded = reload_from(handle, &*source)?;
        write_result(result, create_json_response(&json!({ "loaded": loaded }))?)
    })
}

/// Current records, selection, statistics and notice.
/// Output: TableSnapshot JSON
///
/// # Safety
/// Pointers must be valid as described on `table_session_new`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn table_snapshot(handle: *const TableHandle, result: *mut *mut c_char) -> c_int {
    handle_status_result(|| unsafe {
        let handle = handle_ref(handle)?;
        let snapshot = handle.lock()?.snapshot();
        write_result(result, create_json_response(&snapshot)?)
    })
}

/// Free memory allocated by Rust for C strings.
/// MUST be called by the host for every *mut c_char returned by table functions.
///
/// # Safety
/// `ptr` must be null or a string returned by this module, freed once.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn table_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LoadResult;
    use crate::ffi::error::ErrorCode;
    use async_trait::async_trait;
    use std::ffi::CStr;
    use std::ptr;
    use std::time::{Duration, Instant};

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    unsafe fn take_json(ptr: *mut c_char) -> serde_json::Value {
        let text = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
        unsafe { table_free_string(ptr) };
        serde_json::from_str(&text).unwrap()
    }

    fn new_session(dir: &std::path::Path) -> *mut TableHandle {
        let config = c(&json!({
            "required_fields": ["name"],
            "export_dir": dir,
            "columns": [{"key": "id", "header": "ID"}, {"key": "name", "header": "Name"}]
        })
        .to_string());
        let mut handle = ptr::null_mut();
        let code = unsafe { table_session_new(config.as_ptr(), &mut handle) };
        assert_eq!(code, ErrorCode::Success as c_int);
        assert!(!handle.is_null());
        handle
    }

    #[test]
    fn test_session_round_trip_through_c_abi() {
        let dir = tempfile::tempdir().unwrap();
        let handle = new_session(dir.path());
        let mut out = ptr::null_mut();

        let records = c(r#"[{"id": 1, "name": "Juan"}, {"id": 2, "name": "María"}, {"id": 3}]"#);
        let code = unsafe { table_set_records(handle, records.as_ptr(), &mut out) };
        assert_eq!(code, 0);
        let response = unsafe { take_json(out) };
        assert_eq!(response["accepted"], json!(2));
        assert_eq!(response["rejected"].as_array().unwrap().len(), 1);

        let id = c("2");
        assert_eq!(unsafe { table_toggle(handle, id.as_ptr(), &mut out) }, 0);
        assert_eq!(unsafe { take_json(out) }, json!({"id": 2, "selected": true}));

        let format = c("csv");
        assert_eq!(unsafe { table_export(handle, format.as_ptr(), ptr::null(), &mut out) }, 0);
        let outcome = unsafe { take_json(out) };
        assert_eq!(outcome["filename"], json!("records_selected.csv"));
        let written = std::fs::read_to_string(dir.path().join("records_selected.csv")).unwrap();
        assert_eq!(written, "ID,Name\n2,María\n");

        assert_eq!(unsafe { table_snapshot(handle, &mut out) }, 0);
        let snapshot = unsafe { take_json(out) };
        assert_eq!(snapshot["selected_ids"], json!([2]));
        assert_eq!(snapshot["notice"]["text"], json!("1 records exported successfully as CSV"));

        unsafe { table_session_free(handle) };
    }

    #[test]
    fn test_errors_come_back_as_codes() {
        let dir = tempfile::tempdir().unwrap();
        let handle = new_session(dir.path());
        let mut out = ptr::null_mut();

        let id = c("42");
        let code = unsafe { table_toggle(handle, id.as_ptr(), &mut out) };
        assert_eq!(code, ErrorCode::RecordNotFound as c_int);

        let format = c("pdf");
        let code = unsafe { table_export(handle, format.as_ptr(), ptr::null(), &mut out) };
        assert_eq!(code, ErrorCode::InvalidArgument as c_int);

        let format = c("xlsx");
        let code = unsafe { table_export(handle, format.as_ptr(), ptr::null(), &mut out) };
        assert_eq!(code, ErrorCode::ExportNoData as c_int);

        let code = unsafe { table_snapshot(ptr::null(), &mut out) };
        assert_eq!(code, ErrorCode::NullPointer as c_int);

        unsafe { table_session_free(handle) };
    }

    #[test]
    fn test_invalid_config_is_rejected_at_creation() {
        let config = c(r#"{"csv_delimiter": "\n"}"#);
        let mut handle = ptr::null_mut();
        let code = unsafe { table_session_new(config.as_ptr(), &mut handle) };
        assert_eq!(code, ErrorCode::ConfigurationError as c_int);
        assert!(handle.is_null());
    }

    struct SlowSource {
        delay: Duration,
    }

    #[async_trait]
    impl RecordSource for SlowSource {
        async fn fetch(&self) -> LoadResult<serde_json::Value> {
            tokio::time::sleep(self.delay).await;
            Ok(json!([{"id": 7, "name": "Lucía"}]))
        }
    }

    #[test]
    fn test_snapshot_answers_while_reload_is_in_flight() {
        let dir = tempfile::tempdir().unwrap();
        let raw = new_session(dir.path());
        let handle = unsafe { handle_ref(raw) }.unwrap();
        let source = SlowSource {
            delay: Duration::from_millis(800),
        };

        std::thread::scope(|scope| {
            let reload = scope.spawn(|| reload_from(handle, &source));
            // Give the reload time to mark the session as loading
            std::thread::sleep(Duration::from_millis(150));

            let mut out = ptr::null_mut();
            let started = Instant::now();
            assert_eq!(unsafe { table_snapshot(raw, &mut out) }, 0);
            assert!(started.elapsed() < Duration::from_millis(300));
            let snapshot = unsafe { take_json(out) };
            assert_eq!(snapshot["loading"], json!(true));

            assert_eq!(reload.join().unwrap().unwrap(), 1);
        });

        let mut out = ptr::null_mut();
        assert_eq!(unsafe { table_snapshot(raw, &mut out) }, 0);
        let snapshot = unsafe { take_json(out) };
        assert_eq!(snapshot["loading"], json!(false));
        assert_eq!(snapshot["records"], json!([{"id": 7, "name": "Lucía"}]));

        unsafe { table_session_free(raw) };
    }
}
