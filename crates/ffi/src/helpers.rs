use crate::error::{with_last_error_mut, DefaultGroundcastError, GroundcastError, GroundcastErrorCode};
use crate::instance::{GroundInstance, GroundState};
use std::ffi::CString;

/// Set the thread-local error message and code.
pub(crate) fn set_last_error(error: &impl GroundcastError) {
    with_last_error_mut(|(cstring, code)| {
        *cstring = CString::new(error.msg()).ok();
        *code = error.code();
    });
}

/// Track an error by setting it in thread-local storage and returning its code.
#[inline]
pub(crate) fn track_error(error: &impl GroundcastError) -> GroundcastErrorCode {
    set_last_error(error);
    error.code()
}

/// Record the error of a failed result, passing successes through.
pub(crate) fn track_result<T>(result: Result<T, DefaultGroundcastError>) -> Result<T, GroundcastErrorCode> {
    result.map_err(|error| track_error(&error))
}

/// Clear the thread-local error message and code.
/// Called on every successful operation.
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = GroundcastErrorCode::Ok;
    });
}

/// Run an FFI body and turn its outcome into the code returned to C.
pub(crate) fn handle_ffi_result_error<F>(body: F) -> GroundcastErrorCode
where
    F: FnOnce() -> Result<(), DefaultGroundcastError>,
{
    match track_result(body()) {
        Ok(()) => {
            clear_last_error();
            GroundcastErrorCode::Ok
        }
        Err(code) => code,
    }
}

/// Borrow an instance handed out by `groundcast_new`.
///
/// # Safety
/// `ptr` must be null or a pointer returned by `groundcast_new` that has not
/// been destroyed yet.
pub(crate) unsafe fn instance_from_ptr<'a>(ptr: *const GroundInstance) -> Result<&'a GroundInstance, DefaultGroundcastError> {
    // SAFETY: non-null pointers come from `Box::into_raw` in `groundcast_new`
    unsafe { ptr.as_ref() }.ok_or_else(|| DefaultGroundcastError::null_pointer("ptr"))
}

/// Run `func` with shared access to the instance state.
pub(crate) fn with_ground_state<F, T>(instance: &GroundInstance, func: F) -> Result<T, DefaultGroundcastError>
where
    F: FnOnce(&GroundState) -> T,
{
    let state = instance
        .state
        .read()
        .map_err(|_| DefaultGroundcastError::lock_poisoned("RwLock"))?;

    Ok(func(&state))
}

/// Run `func` with exclusive access to the instance state.
pub(crate) fn with_ground_state_mut<F, T>(instance: &GroundInstance, func: F) -> Result<T, DefaultGroundcastError>
where
    F: FnOnce(&mut GroundState) -> T,
{
    let mut state = instance
        .state
        .write()
        .map_err(|_| DefaultGroundcastError::lock_poisoned("RwLock"))?;

    Ok(func(&mut state))
}
