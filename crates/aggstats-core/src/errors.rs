use thiserror::Error;

/// Errors that can occur during aggregate computations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    // Schema errors
    #[error("Field not found: {field}")]
    FieldNotFound { field: String },

    #[error("Type mismatch in field '{field}' at row {row}: expected numeric or missing, found {found}")]
    TypeMismatch {
        field: String,
        row: usize,
        found: &'static str,
    },

    // Input validation errors
    #[error("Insufficient data for {statistic}: need at least {required} observations, found {found}")]
    InsufficientData {
        statistic: &'static str,
        required: usize,
        found: usize,
    },

    #[error("Dimension mismatch: left input has {left} rows, right input has {right} rows")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Missing value in field '{field}' at row {row}")]
    MissingValue { field: String, row: usize },

    #[error("Invalid value in field '{field}' at row {row}: {value}")]
    InvalidValue {
        field: String,
        row: usize,
        value: f64,
    },

    #[error("Invalid confidence level: {0} (must be in (0, 1))")]
    InvalidConfidenceLevel(f64),

    #[error("Empty input: {field} cannot be empty")]
    EmptyInput { field: &'static str },

    // Numerical errors
    #[error("Degenerate input for {statistic}: {reason}")]
    DegenerateInput {
        statistic: &'static str,
        reason: &'static str,
    },

    #[error("Distribution error: {0}")]
    Distribution(String),
}

impl StatsError {
    pub(crate) fn insufficient(statistic: &'static str, required: usize, found: usize) -> Self {
        StatsError::InsufficientData {
            statistic,
            required,
            found,
        }
    }
}

/// Result type for statistical operations
pub type StatsResult<T> = Result<T, StatsError>;
