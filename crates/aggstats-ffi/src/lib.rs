//! C FFI boundary for aggstats
//!
//! This crate provides C-compatible functions for calling the aggregate
//! statistics engine from a host query engine. Columns arrive as `DataArray`
//! values with an optional validity bitmask; NULL entries are excluded under
//! the engine's default missing-value policy.

mod types;

pub use types::*;

use aggstats_core::{AggregateStatsEngine, ColumnTable, StatsError, StatsResult};

/// Convert StatsError to ErrorCode
fn error_to_code(err: &StatsError) -> ErrorCode {
    match err {
        StatsError::FieldNotFound { .. } => ErrorCode::FieldNotFound,
        StatsError::TypeMismatch { .. } => ErrorCode::TypeMismatch,
        StatsError::InsufficientData { .. } => ErrorCode::InsufficientData,
        StatsError::DegenerateInput { .. } => ErrorCode::DegenerateInput,
        StatsError::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
        StatsError::MissingValue { .. } => ErrorCode::MissingValue,
        StatsError::InvalidValue { .. } => ErrorCode::InvalidValue,
        StatsError::InvalidConfidenceLevel(_) | StatsError::EmptyInput { .. } => {
            ErrorCode::InvalidInput
        }
        StatsError::Distribution(_) => ErrorCode::InternalError,
    }
}

/// Run `f`, catching panics and reporting failures through `out_error`
///
/// # Safety
/// `out_error` must be NULL or a valid pointer
unsafe fn guarded<T>(
    name: &str,
    out_error: *mut AggstatsError,
    f: impl FnOnce() -> StatsResult<T>,
) -> Option<T> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            if !out_error.is_null() {
                (*out_error).set(error_to_code(&e), &e.to_string());
            }
            None
        }
        Err(_) => {
            if !out_error.is_null() {
                (*out_error).set(
                    ErrorCode::InternalError,
                    &format!("Internal panic in {}", name),
                );
            }
            None
        }
    }
}

/// Reset `out_error` and check the output pointer
///
/// # Safety
/// `out_error` must be NULL or a valid pointer
unsafe fn prepare<T>(out: *mut T, out_error: *mut AggstatsError) -> bool {
    if !out_error.is_null() {
        *out_error = AggstatsError::success();
    }
    if out.is_null() {
        if !out_error.is_null() {
            (*out_error).set(ErrorCode::InvalidInput, "output pointer is NULL");
        }
        return false;
    }
    true
}

/// Single-column table named "x"
unsafe fn single_table(x: &DataArray) -> StatsResult<ColumnTable> {
    ColumnTable::new().with_column("x", x.to_values()?)
}

/// Two-column table named "x" and "y"; lengths must match
unsafe fn paired_table(x: &DataArray, y: &DataArray) -> StatsResult<ColumnTable> {
    ColumnTable::new()
        .with_column("x", x.to_values()?)?
        .with_column("y", y.to_values()?)
}

/// Pearson correlation coefficient
///
/// # Safety
/// - `x` and `y` must be valid DataArrays of equal length
/// - `out_r` must be a valid pointer
/// - `out_error` must be NULL or a valid pointer
///
/// # Returns
/// `true` on success, `false` on error (check `out_error` for details)
#[no_mangle]
pub unsafe extern "C" fn aggstats_correlation(
    x: DataArray,
    y: DataArray,
    out_r: *mut f64,
    out_error: *mut AggstatsError,
) -> bool {
    if !prepare(out_r, out_error) {
        return false;
    }
    let result = guarded("correlation", out_error, || {
        let table = paired_table(&x, &y)?;
        AggregateStatsEngine::default().correlation(&table, "x", "y")
    });
    match result {
        Some(r) => {
            *out_r = r;
            true
        }
        None => false,
    }
}

/// Simple linear regression of y on x
///
/// # Safety
/// - `x` and `y` must be valid DataArrays of equal length
/// - `out_result` must be a valid pointer
/// - `out_error` must be NULL or a valid pointer
#[no_mangle]
pub unsafe extern "C" fn aggstats_linear_regression(
    x: DataArray,
    y: DataArray,
    out_result: *mut LinearRegressionFFI,
    out_error: *mut AggstatsError,
) -> bool {
    if !prepare(out_result, out_error) {
        return false;
    }
    let result = guarded("linear regression", out_error, || {
        let table = paired_table(&x, &y)?;
        AggregateStatsEngine::default().linear_regression(&table, "x", "y")
    });
    match result {
        Some(fit) => {
            *out_result = fit.into();
            true
        }
        None => {
            *out_result = LinearRegressionFFI::default();
            false
        }
    }
}

/// Population or sample variance
///
/// # Safety
/// - `x` must be a valid DataArray
/// - `out_value` must be a valid pointer
/// - `out_error` must be NULL or a valid pointer
#[no_mangle]
pub unsafe extern "C" fn aggstats_variance(
    x: DataArray,
    mode: VarianceModeFFI,
    out_value: *mut f64,
    out_error: *mut AggstatsError,
) -> bool {
    if !prepare(out_value, out_error) {
        return false;
    }
    let result = guarded("variance", out_error, || {
        let table = single_table(&x)?;
        AggregateStatsEngine::default().variance(&table, "x", mode.into())
    });
    match result {
        Some(v) => {
            *out_value = v;
            true
        }
        None => false,
    }
}

/// Population or sample standard deviation
///
/// # Safety
/// - `x` must be a valid DataArray
/// - `out_value` must be a valid pointer
/// - `out_error` must be NULL or a valid pointer
#[no_mangle]
pub unsafe extern "C" fn aggstats_stddev(
    x: DataArray,
    mode: VarianceModeFFI,
    out_value: *mut f64,
    out_error: *mut AggstatsError,
) -> bool {
    if !prepare(out_value, out_error) {
        return false;
    }
    let result = guarded("standard deviation", out_error, || {
        let table = single_table(&x)?;
        AggregateStatsEngine::default().standard_deviation(&table, "x", mode.into())
    });
    match result {
        Some(v) => {
            *out_value = v;
            true
        }
        None => false,
    }
}

/// Population or sample covariance
///
/// # Safety
/// - `x` and `y` must be valid DataArrays of equal length
/// - `out_value` must be a valid pointer
/// - `out_error` must be NULL or a valid pointer
#[no_mangle]
pub unsafe extern "C" fn aggstats_covariance(
    x: DataArray,
    y: DataArray,
    mode: VarianceModeFFI,
    out_value: *mut f64,
    out_error: *mut AggstatsError,
) -> bool {
    if !prepare(out_value, out_error) {
        return false;
    }
    let result = guarded("covariance", out_error, || {
        let table = paired_table(&x, &y)?;
        AggregateStatsEngine::default().covariance(&table, "x", "y", mode.into())
    });
    match result {
        Some(v) => {
            *out_value = v;
            true
        }
        None => false,
    }
}

/// Pearson correlation t-test
///
/// # Safety
/// - `x` and `y` must be valid DataArrays of equal length
/// - `out_result` must be a valid pointer
/// - `out_error` must be NULL or a valid pointer
#[no_mangle]
pub unsafe extern "C" fn aggstats_correlation_test(
    x: DataArray,
    y: DataArray,
    confidence_level: f64,
    out_result: *mut CorrelationTestFFI,
    out_error: *mut AggstatsError,
) -> bool {
    if !prepare(out_result, out_error) {
        return false;
    }
    let result = guarded("correlation test", out_error, || {
        let table = paired_table(&x, &y)?;
        AggregateStatsEngine::default().correlation_test(&table, "x", "y", confidence_level)
    });
    match result {
        Some(t) => {
            *out_result = t.into();
            true
        }
        None => {
            *out_result = CorrelationTestFFI::default();
            false
        }
    }
}

/// Get library version string
#[no_mangle]
pub extern "C" fn aggstats_version() -> *const libc::c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const libc::c_char
}
