//! Aggregate statistics over dataset fields
//!
//! Every operation is a pure function of the dataset, the selected field(s),
//! and the engine options. Each call makes one forward pass over the fields it
//! reads and keeps only an O(1) accumulator.
//!
//! Missing-value policy:
//! - univariate statistics use every non-missing value of the field
//! - bivariate statistics use only records where both fields are present;
//!   a record missing either value contributes nothing to any sum

use crate::dataset::{Dataset, NumericColumnView, PairedSample};
use crate::errors::{StatsError, StatsResult};
use crate::inference;
use crate::moments::{CoMoments, Moments};
use crate::types::{
    ColumnSummary, CorrelationTest, EngineOptions, LinearRegression, RegressionInference,
    VarianceMode,
};
use tracing::{debug, debug_span};

/// Stateless engine for correlation, simple regression and dispersion
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateStatsEngine {
    options: EngineOptions,
}

impl AggregateStatsEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    // ------------------------------------------------------------------------
    // Scans
    // ------------------------------------------------------------------------

    /// Single pass over one field
    pub fn scan<D: Dataset + ?Sized>(&self, dataset: &D, field: &str) -> StatsResult<Moments> {
        let mut view = NumericColumnView::new(dataset, field, self.options)?;
        let mut moments = Moments::new();
        for cell in view.by_ref() {
            if let Some(v) = cell? {
                moments.push(v);
            }
        }
        debug!(
            field,
            n = moments.count(),
            missing = view.missing(),
            "scanned column"
        );
        Ok(moments)
    }

    /// Single pass over the complete (x, y) pairs of two fields
    pub fn scan_pairs<D: Dataset + ?Sized>(
        &self,
        dataset: &D,
        field_x: &str,
        field_y: &str,
    ) -> StatsResult<CoMoments> {
        let mut sample = PairedSample::new(dataset, field_x, field_y, self.options)?;
        let mut moments = CoMoments::new();
        for pair in sample.by_ref() {
            let (x, y) = pair?;
            moments.push(x, y);
        }
        debug!(
            field_x,
            field_y,
            n = moments.count(),
            excluded = sample.excluded(),
            "scanned paired sample"
        );
        Ok(moments)
    }

    // ------------------------------------------------------------------------
    // Bivariate
    // ------------------------------------------------------------------------

    /// Pearson correlation coefficient of two fields, in [-1, 1]
    pub fn correlation<D: Dataset + ?Sized>(
        &self,
        dataset: &D,
        field_x: &str,
        field_y: &str,
    ) -> StatsResult<f64> {
        let _span = debug_span!("correlation", field_x, field_y).entered();
        let moments = self.scan_pairs(dataset, field_x, field_y)?;
        correlation_from_moments(&moments)
    }

    /// Least-squares fit of `field_y = slope * field_x + intercept`
    pub fn linear_regression<D: Dataset + ?Sized>(
        &self,
        dataset: &D,
        field_x: &str,
        field_y: &str,
    ) -> StatsResult<LinearRegression> {
        let _span = debug_span!("linear_regression", field_x, field_y).entered();
        let moments = self.scan_pairs(dataset, field_x, field_y)?;
        regression_from_moments(&moments)
    }

    /// Covariance of two fields over their complete pairs
    pub fn covariance<D: Dataset + ?Sized>(
        &self,
        dataset: &D,
        field_x: &str,
        field_y: &str,
        mode: VarianceMode,
    ) -> StatsResult<f64> {
        let _span = debug_span!("covariance", field_x, field_y, ?mode).entered();
        let moments = self.scan_pairs(dataset, field_x, field_y)?;
        let n = moments.count();
        let statistic = match mode {
            VarianceMode::Population => "population covariance",
            VarianceMode::Sample => "sample covariance",
        };
        if n < mode.min_observations() {
            return Err(StatsError::insufficient(
                statistic,
                mode.min_observations(),
                n,
            ));
        }
        if !moments.is_finite() {
            return Err(overflowed(statistic));
        }
        Ok(moments.sxy() / mode.divisor(n))
    }

    /// Pearson correlation with a t-test and Fisher-z confidence interval
    pub fn correlation_test<D: Dataset + ?Sized>(
        &self,
        dataset: &D,
        field_x: &str,
        field_y: &str,
        confidence_level: f64,
    ) -> StatsResult<CorrelationTest> {
        let _span = debug_span!("correlation_test", field_x, field_y).entered();
        inference::validate_confidence_level(confidence_level)?;
        let moments = self.scan_pairs(dataset, field_x, field_y)?;
        inference::correlation_test(&moments, confidence_level)
    }

    /// Simple regression with coefficient standard errors, t-tests and intervals
    pub fn regression_inference<D: Dataset + ?Sized>(
        &self,
        dataset: &D,
        field_x: &str,
        field_y: &str,
        confidence_level: f64,
    ) -> StatsResult<RegressionInference> {
        let _span = debug_span!("regression_inference", field_x, field_y).entered();
        inference::validate_confidence_level(confidence_level)?;
        let moments = self.scan_pairs(dataset, field_x, field_y)?;
        inference::regression_inference(&moments, confidence_level)
    }

    // ------------------------------------------------------------------------
    // Univariate
    // ------------------------------------------------------------------------

    /// Arithmetic mean of the non-missing values of a field
    pub fn mean<D: Dataset + ?Sized>(&self, dataset: &D, field: &str) -> StatsResult<f64> {
        let _span = debug_span!("mean", field).entered();
        let moments = self.scan(dataset, field)?;
        if moments.count() == 0 {
            return Err(StatsError::insufficient("mean", 1, 0));
        }
        if !moments.mean().is_finite() {
            return Err(overflowed("mean"));
        }
        Ok(moments.mean())
    }

    /// Population or sample variance of a field
    pub fn variance<D: Dataset + ?Sized>(
        &self,
        dataset: &D,
        field: &str,
        mode: VarianceMode,
    ) -> StatsResult<f64> {
        let _span = debug_span!("variance", field, ?mode).entered();
        let moments = self.scan(dataset, field)?;
        variance_from_moments(&moments, mode)
    }

    /// Square root of [`variance`](Self::variance) under the same mode
    pub fn standard_deviation<D: Dataset + ?Sized>(
        &self,
        dataset: &D,
        field: &str,
        mode: VarianceMode,
    ) -> StatsResult<f64> {
        self.variance(dataset, field, mode).map(f64::sqrt)
    }

    /// Count, mean, extremes and both variance conventions in one pass
    pub fn summarize<D: Dataset + ?Sized>(
        &self,
        dataset: &D,
        field: &str,
    ) -> StatsResult<ColumnSummary> {
        let _span = debug_span!("summarize", field).entered();
        let mut view = NumericColumnView::new(dataset, field, self.options)?;
        let mut moments = Moments::new();
        for cell in view.by_ref() {
            if let Some(v) = cell? {
                moments.push(v);
            }
        }
        let n = moments.count();
        if n == 0 {
            return Err(StatsError::insufficient("summary", 1, 0));
        }

        let var_pop = variance_from_moments(&moments, VarianceMode::Population)?;
        let var_samp = variance_from_moments(&moments, VarianceMode::Sample).ok();
        Ok(ColumnSummary {
            n,
            n_missing: view.missing(),
            mean: moments.mean(),
            min: moments.min(),
            max: moments.max(),
            var_pop,
            var_samp,
            std_pop: var_pop.sqrt(),
            std_samp: var_samp.map(f64::sqrt),
        })
    }
}

// ============================================================================
// Closed forms over accumulated moments
// ============================================================================

fn overflowed(statistic: &'static str) -> StatsError {
    StatsError::DegenerateInput {
        statistic,
        reason: "accumulated sums overflowed the f64 range",
    }
}

/// Pearson's r from bivariate moments
pub fn correlation_from_moments(moments: &CoMoments) -> StatsResult<f64> {
    let n = moments.count();
    if n < 2 {
        return Err(StatsError::insufficient("correlation", 2, n));
    }
    if !moments.is_finite() {
        return Err(overflowed("correlation"));
    }
    let (sxx, syy) = (moments.sxx(), moments.syy());
    if sxx <= 0.0 || syy <= 0.0 {
        return Err(StatsError::DegenerateInput {
            statistic: "correlation",
            reason: "a field has zero variance",
        });
    }
    let r = moments.sxy() / (sxx * syy).sqrt();
    // Rounding can push |r| a hair past 1 for perfectly linear data
    Ok(r.clamp(-1.0, 1.0))
}

/// Slope, intercept and R² from bivariate moments
///
/// R² is the square of [`correlation_from_moments`] on the same moments. When
/// y is constant and x is not, the fitted horizontal line leaves no residual
/// variance and R² is reported as 1.
pub fn regression_from_moments(moments: &CoMoments) -> StatsResult<LinearRegression> {
    let n = moments.count();
    if n < 2 {
        return Err(StatsError::insufficient("linear regression", 2, n));
    }
    if !moments.is_finite() {
        return Err(overflowed("linear regression"));
    }
    let sxx = moments.sxx();
    if sxx <= 0.0 {
        return Err(StatsError::DegenerateInput {
            statistic: "linear regression",
            reason: "independent variable has zero variance",
        });
    }

    let slope = moments.sxy() / sxx;
    let intercept = moments.mean_y() - slope * moments.mean_x();
    let r_squared = if moments.syy() <= 0.0 {
        1.0
    } else {
        let r = correlation_from_moments(moments)?;
        r * r
    };

    Ok(LinearRegression {
        slope,
        intercept,
        r_squared,
        n,
        avg_x: moments.mean_x(),
        avg_y: moments.mean_y(),
        sxx,
        syy: moments.syy(),
        sxy: moments.sxy(),
    })
}

/// Population or sample variance from univariate moments
pub fn variance_from_moments(moments: &Moments, mode: VarianceMode) -> StatsResult<f64> {
    let n = moments.count();
    let required = mode.min_observations();
    if n < required {
        let statistic = match mode {
            VarianceMode::Population => "population variance",
            VarianceMode::Sample => "sample variance",
        };
        return Err(StatsError::insufficient(statistic, required, n));
    }
    if !moments.is_finite() {
        return Err(overflowed("variance"));
    }
    Ok(moments.m2() / mode.divisor(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ColumnTable, Record, RecordStream, RowTable};
    use crate::types::{MissingPolicy, Value};

    fn xy(x: &[f64], y: &[f64]) -> ColumnTable {
        ColumnTable::from_f64(&[("x", x), ("y", y)]).unwrap()
    }

    fn engine() -> AggregateStatsEngine {
        AggregateStatsEngine::default()
    }

    #[test]
    fn test_regression_recovers_line() {
        let table = xy(&[1.0, 2.0, 3.0, 4.0], &[3.0, 5.0, 7.0, 9.0]);
        let fit = engine().linear_regression(&table, "x", "y").unwrap();

        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert_eq!(fit.n, 4);
        assert!((fit.avg_x - 2.5).abs() < 1e-12);
        assert!((fit.avg_y - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_known_value() {
        // Hand-computed: sxy = 6, sxx = 10, syy = 6 -> r = 6 / sqrt(60)
        let table = xy(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 5.0, 4.0, 5.0]);
        let r = engine().correlation(&table, "x", "y").unwrap();
        assert!((r - 6.0 / 60f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_negative_correlation() {
        let x: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 100.0 - v).collect();
        let r = engine().correlation(&xy(&x, &y), "x", "y").unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_r_squared_matches_correlation() {
        let table = xy(
            &[34_186.0, 45_340.0, 58_731.0, 61_937.0, 40_202.0],
            &[26.7, 20.6, 13.8, 10.4, 22.1],
        );
        let e = engine();
        let r = e.correlation(&table, "x", "y").unwrap();
        let fit = e.linear_regression(&table, "x", "y").unwrap();
        assert_eq!(fit.r_squared, r * r);
        assert!(fit.slope < 0.0);
    }

    #[test]
    fn test_correlation_constant_column_is_degenerate() {
        let table = xy(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]);
        let result = engine().correlation(&table, "x", "y");
        assert!(matches!(result, Err(StatsError::DegenerateInput { .. })));
    }

    #[test]
    fn test_regression_constant_x_is_degenerate() {
        let table = xy(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]);
        let result = engine().linear_regression(&table, "x", "y");
        assert!(matches!(result, Err(StatsError::DegenerateInput { .. })));
    }

    #[test]
    fn test_regression_constant_y() {
        let table = xy(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]);
        let fit = engine().linear_regression(&table, "x", "y").unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.intercept, 4.0);
        assert_eq!(fit.r_squared, 1.0);
    }

    #[test]
    fn test_correlation_insufficient_data() {
        let table = xy(&[1.0, f64::NAN], &[2.0, 3.0]);
        let result = engine().correlation(&table, "x", "y");
        assert!(matches!(
            result,
            Err(StatsError::InsufficientData {
                required: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_missing_exclusion_matches_prefiltered() {
        let x = [1.0, f64::NAN, 3.0, 4.0, 5.0, 6.0, f64::NAN, 8.0];
        let y = [2.0, 9.0, f64::NAN, 4.5, 4.0, 7.5, f64::NAN, 9.0];
        let full = xy(&x, &y);
        let filtered = xy(&[1.0, 4.0, 5.0, 6.0, 8.0], &[2.0, 4.5, 4.0, 7.5, 9.0]);

        let e = engine();
        assert_eq!(
            e.linear_regression(&full, "x", "y").unwrap(),
            e.linear_regression(&filtered, "x", "y").unwrap()
        );
        assert_eq!(
            e.correlation(&full, "x", "y").unwrap(),
            e.correlation(&filtered, "x", "y").unwrap()
        );
    }

    #[test]
    fn test_variance_population_and_sample() {
        let table = ColumnTable::from_f64(&[("v", &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])])
            .unwrap();
        let e = engine();
        let pop = e.variance(&table, "v", VarianceMode::Population).unwrap();
        let samp = e.variance(&table, "v", VarianceMode::Sample).unwrap();
        assert!((pop - 4.0).abs() < 1e-12);
        assert!((samp - 32.0 / 7.0).abs() < 1e-12);

        let sd = e
            .standard_deviation(&table, "v", VarianceMode::Population)
            .unwrap();
        assert!((sd - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_variance_single_record() {
        let table = ColumnTable::from_f64(&[("v", &[52_000.0])]).unwrap();
        let e = engine();
        assert_eq!(
            e.variance(&table, "v", VarianceMode::Population).unwrap(),
            0.0
        );
        assert!(matches!(
            e.variance(&table, "v", VarianceMode::Sample),
            Err(StatsError::InsufficientData {
                required: 2,
                found: 1,
                ..
            })
        ));
        assert!(matches!(
            e.standard_deviation(&table, "v", VarianceMode::Sample),
            Err(StatsError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_variance_empty_population() {
        let table = ColumnTable::from_f64(&[("v", &[f64::NAN, f64::NAN])]).unwrap();
        let result = engine().variance(&table, "v", VarianceMode::Population);
        assert!(matches!(
            result,
            Err(StatsError::InsufficientData { found: 0, .. })
        ));
    }

    #[test]
    fn test_variance_large_magnitude() {
        let values: Vec<f64> = (1..=5).map(|i| 1e9 + i as f64).collect();
        let table = ColumnTable::from_f64(&[("income", &values)]).unwrap();
        let var = engine()
            .variance(&table, "income", VarianceMode::Sample)
            .unwrap();
        assert!((var - 2.5).abs() < 1e-6, "got {}", var);
    }

    fn assert_overflow<T: std::fmt::Debug>(result: StatsResult<T>) {
        match result {
            Err(StatsError::DegenerateInput { reason, .. }) => {
                assert!(reason.contains("overflow"), "{}", reason)
            }
            other => panic!("expected overflow error, got {:?}", other),
        }
    }

    #[test]
    fn test_overflow_is_reported() {
        let e = engine();
        let extremes = ColumnTable::from_f64(&[("v", &[-1.7e308, 1.7e308])]).unwrap();
        assert_overflow(e.variance(&extremes, "v", VarianceMode::Population));
        assert_overflow(e.mean(&extremes, "v"));

        let wide_x = xy(&[1e160, 2e160, 3e160], &[1.0, 2.0, 3.0]);
        assert_overflow(e.correlation(&wide_x, "x", "y"));
        assert_overflow(e.covariance(&wide_x, "x", "y", VarianceMode::Sample));

        let wide_y = xy(&[1.0, 2.0, 3.0, 4.0], &[1e160, 3e160, 2e160, 4e160]);
        assert_overflow(e.linear_regression(&wide_y, "x", "y"));
        assert_overflow(e.regression_inference(&wide_y, "x", "y", 0.95));
    }

    #[test]
    fn test_large_but_representable_values() {
        // Squares stay below f64::MAX
        let table = xy(&[1e150, 2e150, 3e150], &[1.0, 2.0, 3.0]);
        let r = engine().correlation(&table, "x", "y").unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_streaming_source_single_pass() {
        let pulled = std::cell::Cell::new(0usize);
        let records = [(1.0, 3.0), (2.0, 5.0), (f64::NAN, 100.0), (3.0, 7.0), (4.0, 9.0)]
            .into_iter()
            .map(|(x, y)| {
                pulled.set(pulled.get() + 1);
                Record::new().with("x", x).with("y", y)
            });
        let stream = RecordStream::new(["x", "y"], records);

        let fit = engine().linear_regression(&stream, "x", "y").unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert_eq!(fit.n, 4);
        assert_eq!(pulled.get(), 5);

        // Consumed streams have no records left
        assert!(matches!(
            engine().correlation(&stream, "x", "y"),
            Err(StatsError::InsufficientData { found: 0, .. })
        ));
    }

    #[test]
    fn test_field_not_found() {
        let table = xy(&[1.0, 2.0], &[3.0, 4.0]);
        let e = engine();
        assert!(matches!(
            e.correlation(&table, "x", "z"),
            Err(StatsError::FieldNotFound { field }) if field == "z"
        ));
        assert!(matches!(
            e.variance(&table, "w", VarianceMode::Sample),
            Err(StatsError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let table = RowTable::from_records(vec![
            Record::new().with("x", 1.0).with("y", 2.0),
            Record::new().with("x", "unknown").with("y", 3.0),
            Record::new().with("x", 3.0).with("y", 1.0),
        ]);
        let result = engine().correlation(&table, "x", "y");
        assert!(matches!(
            result,
            Err(StatsError::TypeMismatch { row: 1, .. })
        ));
    }

    #[test]
    fn test_strict_missing_policy() {
        let table = xy(&[1.0, 2.0, 3.0], &[1.0, 2.0, 4.0])
            .with_column("z", [Value::Number(1.0), Value::Missing, Value::Number(3.0)])
            .unwrap();
        let strict = AggregateStatsEngine::new(EngineOptions {
            missing: MissingPolicy::Error,
            ..Default::default()
        });
        assert!(strict.correlation(&table, "x", "y").is_ok());
        assert!(matches!(
            strict.correlation(&table, "x", "z"),
            Err(StatsError::MissingValue { row: 1, .. })
        ));
    }

    #[test]
    fn test_mixed_numeric_kinds() {
        let table = ColumnTable::new()
            .with_column(
                "pct",
                [
                    Value::Decimal { mantissa: 125, scale: 1 },
                    Value::Integer(10),
                    Value::Number(7.5),
                ],
            )
            .unwrap();
        let mean = engine().mean(&table, "pct").unwrap();
        assert!((mean - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_covariance() {
        let table = xy(&[1.0, 2.0, 3.0, 4.0], &[3.0, 5.0, 7.0, 9.0]);
        let e = engine();
        let pop = e
            .covariance(&table, "x", "y", VarianceMode::Population)
            .unwrap();
        let samp = e.covariance(&table, "x", "y", VarianceMode::Sample).unwrap();
        assert!((pop - 2.5).abs() < 1e-12);
        assert!((samp - 10.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_summarize() {
        let table = ColumnTable::from_f64(&[("v", &[4.0, f64::NAN, 8.0, 6.0])]).unwrap();
        let s = engine().summarize(&table, "v").unwrap();
        assert_eq!(s.n, 3);
        assert_eq!(s.n_missing, 1);
        assert_eq!(s.min, 4.0);
        assert_eq!(s.max, 8.0);
        assert!((s.mean - 6.0).abs() < 1e-12);
        assert!((s.var_samp.unwrap() - 4.0).abs() < 1e-12);
        assert!((s.std_samp.unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_summarize_single_value() {
        let table = ColumnTable::from_f64(&[("v", &[3.0])]).unwrap();
        let s = engine().summarize(&table, "v").unwrap();
        assert_eq!(s.var_pop, 0.0);
        assert_eq!(s.var_samp, None);
        assert_eq!(s.std_samp, None);
    }
}
