use std::fmt;

// ============================================================================
// Cell values
// ============================================================================

/// A single cell of a record
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Floating-point quantity
    Number(f64),
    /// Integer quantity (counts, populations)
    Integer(i64),
    /// Fixed-precision decimal: `mantissa / 10^scale`
    Decimal { mantissa: i128, scale: u32 },
    /// Non-numeric content
    Text(String),
    /// Absent value (NULL)
    #[default]
    Missing,
}

impl Value {
    /// Numeric reading of the value, or `None` for `Missing` and `Text`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            Value::Decimal { mantissa, scale } => Some(decimal_to_f64(*mantissa, *scale)),
            Value::Text(_) | Value::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Short name of the value's kind, used in type errors
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Integer(_) => "integer",
            Value::Decimal { .. } => "decimal",
            Value::Text(_) => "text",
            Value::Missing => "missing",
        }
    }
}

/// `mantissa / 10^scale`, dividing in steps that keep each power of ten finite
fn decimal_to_f64(mantissa: i128, scale: u32) -> f64 {
    const STEP: u32 = 300;
    let mut value = mantissa as f64;
    let mut remaining = scale;
    while remaining > 0 && value != 0.0 {
        let step = remaining.min(STEP);
        value /= 10f64.powi(step as i32);
        remaining -= step;
    }
    value
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Value::Missing, Value::Number)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Decimal { .. } => write!(f, "{}", self.as_f64().unwrap_or(f64::NAN)),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Missing => write!(f, "NULL"),
        }
    }
}

// ============================================================================
// Options
// ============================================================================

/// Divisor convention for variance, standard deviation and covariance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VarianceMode {
    /// Divide by n (full enumeration)
    #[default]
    Population,
    /// Divide by n - 1 (Bessel's correction)
    Sample,
}

impl VarianceMode {
    /// Smallest number of observations for which the statistic is defined
    pub fn min_observations(self) -> usize {
        match self {
            VarianceMode::Population => 1,
            VarianceMode::Sample => 2,
        }
    }

    pub(crate) fn divisor(self, n: usize) -> f64 {
        match self {
            VarianceMode::Population => n as f64,
            VarianceMode::Sample => (n - 1) as f64,
        }
    }
}

/// Policy for handling missing values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    /// Exclude records with a missing value in any requested field (default)
    #[default]
    Skip,
    /// Error if any missing value is encountered
    Error,
}

/// Policy for handling NaN values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NanPolicy {
    /// Treat NaN exactly like a missing value (default)
    #[default]
    DropNaN,
    /// Error if any NaN is encountered (strict mode)
    ErrorOnNaN,
}

/// Options for the aggregate engine
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    /// How missing values are treated
    pub missing: MissingPolicy,
    /// How NaN values are treated
    pub nan: NanPolicy,
}

// ============================================================================
// Results
// ============================================================================

/// Simple linear regression of y on x, fitted by least squares
///
/// The `regr_*` style fields come from the same accumulator as the fit, so
/// `r_squared` is always consistent with the sample the slope was computed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRegression {
    /// Slope of the fitted line
    pub slope: f64,
    /// Intercept of the fitted line
    pub intercept: f64,
    /// Coefficient of determination
    pub r_squared: f64,
    /// Number of complete (x, y) pairs used
    pub n: usize,
    /// Mean of the independent variable
    pub avg_x: f64,
    /// Mean of the dependent variable
    pub avg_y: f64,
    /// Σ(x - x̄)²
    pub sxx: f64,
    /// Σ(y - ȳ)²
    pub syy: f64,
    /// Σ(x - x̄)(y - ȳ)
    pub sxy: f64,
}

impl LinearRegression {
    /// Predicted y for a given x
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Single-column descriptive summary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSummary {
    /// Number of non-missing observations
    pub n: usize,
    /// Number of records excluded as missing
    pub n_missing: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Population variance
    pub var_pop: f64,
    /// Sample variance (None when n < 2)
    pub var_samp: Option<f64>,
    /// Population standard deviation
    pub std_pop: f64,
    /// Sample standard deviation (None when n < 2)
    pub std_samp: Option<f64>,
}

/// Significance test of a Pearson correlation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationTest {
    /// Correlation coefficient
    pub r: f64,
    /// t statistic with n - 2 degrees of freedom
    pub statistic: f64,
    /// Two-sided p-value
    pub p_value: f64,
    /// Degrees of freedom
    pub df: usize,
    /// Fisher-z confidence interval lower bound (NaN when n < 4)
    pub ci_lower: f64,
    /// Fisher-z confidence interval upper bound (NaN when n < 4)
    pub ci_upper: f64,
    /// Confidence level used
    pub confidence_level: f64,
    /// Number of complete pairs
    pub n: usize,
}

/// Coefficient inference for a simple linear regression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionInference {
    pub fit: LinearRegression,
    /// Residual standard error, sqrt(SSE / (n - 2))
    pub residual_std_error: f64,
    pub slope_std_error: f64,
    pub intercept_std_error: f64,
    pub slope_t: f64,
    pub intercept_t: f64,
    pub slope_p_value: f64,
    pub intercept_p_value: f64,
    pub slope_ci: (f64, f64),
    pub intercept_ci: (f64, f64),
    /// Confidence level used (e.g., 0.95)
    pub confidence_level: f64,
    /// Residual degrees of freedom (n - 2)
    pub df: usize,
}
