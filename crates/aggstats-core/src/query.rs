//! Tagged queries and results for presentation layers
//!
//! A caller that chooses statistics at runtime (a CLI, a report script)
//! describes each computation as a [`StatQuery`] and receives a [`StatResult`]
//! carrying what was computed, over which fields, and the full-precision value.
//! Rounding is left to the caller.

use crate::dataset::Dataset;
use crate::engine::AggregateStatsEngine;
use crate::errors::StatsResult;
use crate::types::{
    ColumnSummary, CorrelationTest, LinearRegression, RegressionInference, VarianceMode,
};
use tracing::debug_span;

/// One aggregate computation
#[derive(Debug, Clone, PartialEq)]
pub enum StatQuery {
    Mean {
        field: String,
    },
    Variance {
        field: String,
        mode: VarianceMode,
    },
    StandardDeviation {
        field: String,
        mode: VarianceMode,
    },
    Summary {
        field: String,
    },
    Covariance {
        x: String,
        y: String,
        mode: VarianceMode,
    },
    Correlation {
        x: String,
        y: String,
    },
    LinearRegression {
        x: String,
        y: String,
    },
    CorrelationTest {
        x: String,
        y: String,
        confidence_level: f64,
    },
    RegressionInference {
        x: String,
        y: String,
        confidence_level: f64,
    },
}

impl StatQuery {
    pub fn kind(&self) -> StatKind {
        match self {
            StatQuery::Mean { .. } => StatKind::Mean,
            StatQuery::Variance { mode, .. } => StatKind::Variance(*mode),
            StatQuery::StandardDeviation { mode, .. } => StatKind::StandardDeviation(*mode),
            StatQuery::Summary { .. } => StatKind::Summary,
            StatQuery::Covariance { mode, .. } => StatKind::Covariance(*mode),
            StatQuery::Correlation { .. } => StatKind::Correlation,
            StatQuery::LinearRegression { .. } => StatKind::LinearRegression,
            StatQuery::CorrelationTest { .. } => StatKind::CorrelationTest,
            StatQuery::RegressionInference { .. } => StatKind::RegressionInference,
        }
    }

    /// Fields read by the query, x before y
    pub fn fields(&self) -> Vec<&str> {
        match self {
            StatQuery::Mean { field }
            | StatQuery::Variance { field, .. }
            | StatQuery::StandardDeviation { field, .. }
            | StatQuery::Summary { field } => vec![field.as_str()],
            StatQuery::Covariance { x, y, .. }
            | StatQuery::Correlation { x, y }
            | StatQuery::LinearRegression { x, y }
            | StatQuery::CorrelationTest { x, y, .. }
            | StatQuery::RegressionInference { x, y, .. } => vec![x.as_str(), y.as_str()],
        }
    }
}

/// What a result means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    Mean,
    Variance(VarianceMode),
    StandardDeviation(VarianceMode),
    Summary,
    Covariance(VarianceMode),
    Correlation,
    LinearRegression,
    CorrelationTest,
    RegressionInference,
}

impl StatKind {
    /// SQL-style name of the aggregate
    pub fn name(&self) -> &'static str {
        match self {
            StatKind::Mean => "avg",
            StatKind::Variance(VarianceMode::Population) => "var_pop",
            StatKind::Variance(VarianceMode::Sample) => "var_samp",
            StatKind::StandardDeviation(VarianceMode::Population) => "stddev_pop",
            StatKind::StandardDeviation(VarianceMode::Sample) => "stddev_samp",
            StatKind::Summary => "summary",
            StatKind::Covariance(VarianceMode::Population) => "covar_pop",
            StatKind::Covariance(VarianceMode::Sample) => "covar_samp",
            StatKind::Correlation => "corr",
            StatKind::LinearRegression => "regr",
            StatKind::CorrelationTest => "corr_test",
            StatKind::RegressionInference => "regr_inference",
        }
    }

    /// Human-readable description
    pub fn meaning(&self) -> &'static str {
        match self {
            StatKind::Mean => "arithmetic mean",
            StatKind::Variance(VarianceMode::Population) => "population variance",
            StatKind::Variance(VarianceMode::Sample) => "sample variance",
            StatKind::StandardDeviation(VarianceMode::Population) => {
                "population standard deviation"
            }
            StatKind::StandardDeviation(VarianceMode::Sample) => "sample standard deviation",
            StatKind::Summary => "descriptive summary",
            StatKind::Covariance(VarianceMode::Population) => "population covariance",
            StatKind::Covariance(VarianceMode::Sample) => "sample covariance",
            StatKind::Correlation => "Pearson correlation coefficient",
            StatKind::LinearRegression => "least-squares linear regression",
            StatKind::CorrelationTest => "Pearson correlation t-test",
            StatKind::RegressionInference => "linear regression coefficient inference",
        }
    }

    /// Unit of the headline value
    pub fn unit(&self) -> Unit {
        match self {
            StatKind::Mean | StatKind::StandardDeviation(_) | StatKind::Summary => {
                Unit::FieldUnits
            }
            StatKind::Variance(_) => Unit::SquaredFieldUnits,
            StatKind::Covariance(_) => Unit::ProductOfFieldUnits,
            StatKind::Correlation | StatKind::CorrelationTest => Unit::Dimensionless,
            StatKind::LinearRegression | StatKind::RegressionInference => Unit::YPerX,
        }
    }
}

/// Unit of a statistic relative to the fields it was computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Same unit as the field
    FieldUnits,
    /// Square of the field's unit
    SquaredFieldUnits,
    /// Unit of x times unit of y
    ProductOfFieldUnits,
    /// Units of y per unit of x (slope)
    YPerX,
    /// No unit
    Dimensionless,
}

/// Value of a computed statistic
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Scalar(f64),
    Regression(LinearRegression),
    Summary(ColumnSummary),
    CorrelationTest(CorrelationTest),
    RegressionInference(RegressionInference),
}

/// A computed statistic with its meaning tag
#[derive(Debug, Clone, PartialEq)]
pub struct StatResult {
    pub kind: StatKind,
    /// Fields the statistic was computed over, x before y
    pub fields: Vec<String>,
    pub value: StatValue,
}

impl StatResult {
    /// Headline scalar: the value itself, the slope, the mean, or r
    pub fn headline(&self) -> f64 {
        match &self.value {
            StatValue::Scalar(v) => *v,
            StatValue::Regression(fit) => fit.slope,
            StatValue::Summary(s) => s.mean,
            StatValue::CorrelationTest(t) => t.r,
            StatValue::RegressionInference(inf) => inf.fit.slope,
        }
    }
}

impl AggregateStatsEngine {
    /// Run a query and tag its result
    pub fn evaluate<D: Dataset + ?Sized>(
        &self,
        dataset: &D,
        query: &StatQuery,
    ) -> StatsResult<StatResult> {
        let kind = query.kind();
        let _span = debug_span!("evaluate", statistic = kind.name()).entered();

        let value = match query {
            StatQuery::Mean { field } => StatValue::Scalar(self.mean(dataset, field)?),
            StatQuery::Variance { field, mode } => {
                StatValue::Scalar(self.variance(dataset, field, *mode)?)
            }
            StatQuery::StandardDeviation { field, mode } => {
                StatValue::Scalar(self.standard_deviation(dataset, field, *mode)?)
            }
            StatQuery::Summary { field } => StatValue::Summary(self.summarize(dataset, field)?),
            StatQuery::Covariance { x, y, mode } => {
                StatValue::Scalar(self.covariance(dataset, x, y, *mode)?)
            }
            StatQuery::Correlation { x, y } => StatValue::Scalar(self.correlation(dataset, x, y)?),
            StatQuery::LinearRegression { x, y } => {
                StatValue::Regression(self.linear_regression(dataset, x, y)?)
            }
            StatQuery::CorrelationTest {
                x,
                y,
                confidence_level,
            } => StatValue::CorrelationTest(self.correlation_test(
                dataset,
                x,
                y,
                *confidence_level,
            )?),
            StatQuery::RegressionInference {
                x,
                y,
                confidence_level,
            } => StatValue::RegressionInference(self.regression_inference(
                dataset,
                x,
                y,
                *confidence_level,
            )?),
        };

        Ok(StatResult {
            kind,
            fields: query.fields().into_iter().map(String::from).collect(),
            value,
        })
    }
}
