//! C-compatible types for FFI boundary

use aggstats_core::{
    CorrelationTest, LinearRegression, StatsError, StatsResult, Value, VarianceMode,
};
use libc::c_char;

/// Error codes for FFI boundary
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    InvalidInput = 1,
    FieldNotFound = 2,
    TypeMismatch = 3,
    InsufficientData = 4,
    DegenerateInput = 5,
    DimensionMismatch = 6,
    MissingValue = 7,
    InvalidValue = 8,
    InternalError = 99,
}

/// Error information for FFI
#[repr(C)]
pub struct AggstatsError {
    pub code: ErrorCode,
    pub message: [c_char; 256],
}

impl AggstatsError {
    pub fn success() -> Self {
        Self {
            code: ErrorCode::Success,
            message: [0; 256],
        }
    }

    pub fn set(&mut self, code: ErrorCode, msg: &str) {
        self.code = code;
        let bytes = msg.as_bytes();
        let len = bytes.len().min(255);
        for (i, &b) in bytes[..len].iter().enumerate() {
            self.message[i] = b as c_char;
        }
        self.message[len] = 0;
    }

    /// Message as a Rust string (up to the first NUL)
    pub fn message_str(&self) -> String {
        let bytes: Vec<u8> = self
            .message
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as u8)
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Array of f64 values with validity mask for NULL handling
#[repr(C)]
pub struct DataArray {
    /// Pointer to data values
    pub data: *const f64,
    /// Validity bitmask: bit i is 1 if data[i] is valid, 0 if NULL
    /// Can be NULL if all values are valid
    pub validity: *const u8,
    /// Number of elements
    pub len: usize,
}

impl DataArray {
    /// Check if index i is valid (not NULL)
    ///
    /// # Safety
    /// Caller must ensure index is within bounds
    pub unsafe fn is_valid(&self, i: usize) -> bool {
        if self.validity.is_null() {
            return true;
        }
        let byte_idx = i / 8;
        let bit_idx = i % 8;
        ((*self.validity.add(byte_idx)) >> bit_idx) & 1 == 1
    }

    /// Convert to cell values, mapping NULL entries to `Value::Missing`
    ///
    /// A NULL data pointer is accepted only for a zero-length array.
    ///
    /// # Safety
    /// Caller must ensure pointers are valid and len is correct
    pub unsafe fn to_values(&self) -> StatsResult<Vec<Value>> {
        if self.data.is_null() {
            return if self.len == 0 {
                Ok(Vec::new())
            } else {
                Err(StatsError::EmptyInput { field: "data" })
            };
        }
        let mut result = Vec::with_capacity(self.len);
        for i in 0..self.len {
            if self.is_valid(i) {
                result.push(Value::Number(*self.data.add(i)));
            } else {
                result.push(Value::Missing);
            }
        }
        Ok(result)
    }
}

/// Variance divisor convention
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarianceModeFFI {
    Population = 0,
    Sample = 1,
}

impl From<VarianceModeFFI> for VarianceMode {
    fn from(mode: VarianceModeFFI) -> Self {
        match mode {
            VarianceModeFFI::Population => VarianceMode::Population,
            VarianceModeFFI::Sample => VarianceMode::Sample,
        }
    }
}

/// Linear regression result for FFI
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct LinearRegressionFFI {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Number of complete pairs
    pub n: usize,
    pub avg_x: f64,
    pub avg_y: f64,
    pub sxx: f64,
    pub syy: f64,
    pub sxy: f64,
}

impl Default for LinearRegressionFFI {
    fn default() -> Self {
        Self {
            slope: f64::NAN,
            intercept: f64::NAN,
            r_squared: f64::NAN,
            n: 0,
            avg_x: f64::NAN,
            avg_y: f64::NAN,
            sxx: f64::NAN,
            syy: f64::NAN,
            sxy: f64::NAN,
        }
    }
}

impl From<LinearRegression> for LinearRegressionFFI {
    fn from(fit: LinearRegression) -> Self {
        Self {
            slope: fit.slope,
            intercept: fit.intercept,
            r_squared: fit.r_squared,
            n: fit.n,
            avg_x: fit.avg_x,
            avg_y: fit.avg_y,
            sxx: fit.sxx,
            syy: fit.syy,
            sxy: fit.sxy,
        }
    }
}

/// Correlation test result for FFI
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct CorrelationTestFFI {
    /// Correlation coefficient
    pub r: f64,
    /// t statistic
    pub statistic: f64,
    /// p-value
    pub p_value: f64,
    /// Degrees of freedom
    pub df: usize,
    /// Confidence interval lower bound
    pub ci_lower: f64,
    /// Confidence interval upper bound
    pub ci_upper: f64,
    /// Confidence level
    pub confidence_level: f64,
    /// Sample size
    pub n: usize,
}

impl Default for CorrelationTestFFI {
    fn default() -> Self {
        Self {
            r: f64::NAN,
            statistic: f64::NAN,
            p_value: f64::NAN,
            df: 0,
            ci_lower: f64::NAN,
            ci_upper: f64::NAN,
            confidence_level: 0.95,
            n: 0,
        }
    }
}

impl From<CorrelationTest> for CorrelationTestFFI {
    fn from(t: CorrelationTest) -> Self {
        Self {
            r: t.r,
            statistic: t.statistic,
            p_value: t.p_value,
            df: t.df,
            ci_lower: t.ci_lower,
            ci_upper: t.ci_upper,
            confidence_level: t.confidence_level,
            n: t.n,
        }
    }
}
