use groundcast_core::GridError;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

/// Common interface for FFI error types.
///
/// # Design
/// - `code()` - Returns the error code to be passed across FFI boundary
/// - `msg()` - Returns the error message for diagnostic purposes
///
/// # Example
/// ```rust,ignore
/// let err = DefaultGroundcastError::null_pointer("out_height");
/// assert_eq!(err.code(), GroundcastErrorCode::NullPointer);
/// assert_eq!(err.msg(), "Parameter 'out_height' cannot be null");
/// ```
pub(crate) trait GroundcastError {
    /// Returns the error code to be returned across the FFI boundary.
    fn code(&self) -> GroundcastErrorCode;

    /// Returns the human-readable error message.
    fn msg(&self) -> &str;
}

/// Default implementation of `GroundcastError` for common FFI error scenarios.
///
/// Wraps a `GroundcastErrorCode` with a message and provides a constructor
/// for each error kind (except Ok, which represents success).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultGroundcastError {
    code: GroundcastErrorCode,
    msg: String,
}

impl DefaultGroundcastError {
    /// Create error for null pointer passed where non-null required.
    ///
    /// # Arguments
    /// * `param_name` - The name of the parameter that was null (e.g., `"out_instance"`, `"ptr"`)
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: GroundcastErrorCode::NullPointer,
            msg: format!("Parameter '{param_name}' cannot be null"),
        }
    }

    /// Create error for poisoned lock.
    ///
    /// # Arguments
    /// * `lock_name` - The name of the lock that was poisoned (e.g., `"RwLock"`)
    pub fn lock_poisoned(lock_name: &str) -> Self {
        Self {
            code: GroundcastErrorCode::LockPoisoned,
            msg: format!("Lock '{lock_name}' was poisoned by a panic in another thread"),
        }
    }

    /// Create error for invalid terrain parameters with a custom message.
    ///
    /// # Arguments
    /// * `param_name` - The name of the invalid parameter (e.g., `"map_x"`, `"square_size"`)
    /// * `message` - A description of the validation error
    pub fn invalid_terrain_parameter_msg(param_name: &str, message: &str) -> Self {
        Self {
            code: GroundcastErrorCode::InvalidTerrainParameters,
            msg: format!("Terrain parameter {param_name}: {message}"),
        }
    }

    /// Create error for a terrain parameter that must be finite.
    ///
    /// # Arguments
    /// * `param_name` - The name of the invalid parameter (e.g., `"hill_height"`)
    /// * `value` - The invalid value
    pub fn invalid_terrain_parameter(param_name: &str, value: f32) -> Self {
        Self::invalid_terrain_parameter_msg(param_name, &format!("must be finite, got {value}"))
    }

    /// Create error for invalid parameter.
    ///
    /// # Arguments
    /// * `message` - Description of the error
    pub fn invalid_parameter(message: String) -> Self {
        Self {
            code: GroundcastErrorCode::InvalidParameter,
            msg: message,
        }
    }
}

impl GroundcastError for DefaultGroundcastError {
    fn code(&self) -> GroundcastErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

/// Map geometry problems are terrain errors, sample buffer problems are
/// plain parameter errors.
impl From<GridError> for DefaultGroundcastError {
    fn from(error: GridError) -> Self {
        match error {
            GridError::InvalidDimensions { .. } => Self::invalid_terrain_parameter_msg("map_x/map_z", &error.to_string()),
            GridError::InvalidSquareSize(_) => Self::invalid_terrain_parameter_msg("square_size", &error.to_string()),
            GridError::SampleCountMismatch { .. } | GridError::NonFiniteHeight { .. } | GridError::DimensionMismatch => {
                Self::invalid_parameter(error.to_string())
            }
        }
    }
}

/// FFI error codes returned by groundcast functions.
/// Follows standard C convention: 0 = success, non-zero = error.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundcastErrorCode {
    /// Operation completed successfully.
    Ok = 0,

    /// Invalid pointer: null pointer passed where non-null required.
    NullPointer = 1,

    /// Lock poisoned: internal synchronization primitive was poisoned by a panic.
    LockPoisoned = 2,

    /// Invalid terrain parameters: map dimensions must be at least one cell,
    /// square size finite and positive, shape parameters finite.
    InvalidTerrainParameters = 3,

    /// Invalid parameter passed to function.
    InvalidParameter = 4,
}

impl From<DefaultGroundcastError> for GroundcastErrorCode {
    fn from(error: DefaultGroundcastError) -> Self {
        error.code
    }
}

thread_local! {
    /// Thread-local storage for the most recent FFI error (C string, error code).
    /// The CString is kept here so the pointer handed out stays valid.
    static LAST_ERROR: RefCell<(Option<CString>, GroundcastErrorCode)> = const { RefCell::new((None, GroundcastErrorCode::Ok)) };
}

/// Internal helper to read `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, GroundcastErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

/// Internal helper to mutate `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, GroundcastErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Retrieve the most recent FFI error message as a null-terminated C string.
///
/// Returns:
/// - A borrowed pointer to the error message if the last call on this thread failed.
/// - `null` if the last call succeeded or the message cannot be converted to a C string.
///
/// # Thread Safety
/// Error messages are stored per-thread, so each thread sees only its own
/// failures.
///
/// # Lifetime
/// The returned pointer is valid until the next FFI call on this thread.
///
/// **DO NOT FREE THIS POINTER** - it is managed internally.
///
/// Example:
/// ```cpp
/// GroundInstance* ground = nullptr;
/// GroundcastErrorCode err = groundcast_new(terrain, &ground);
/// if (err != GroundcastErrorCode::Ok) {
///     const char* error = groundcast_get_last_error();
///     if (error) {
///         printf("Terrain creation failed: %s\n", error);
///     }
/// }
/// ```
#[no_mangle]
pub extern "C" fn groundcast_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Retrieve the most recent FFI error code.
///
/// Returns:
/// - `GroundcastErrorCode::Ok` (0) if the last call on this thread succeeded
/// - The specific error code from the last failed operation
#[no_mangle]
pub extern "C" fn groundcast_get_last_error_code() -> GroundcastErrorCode {
    with_last_error(|(_cstring, code)| *code)
}
