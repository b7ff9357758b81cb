//! Significance tests for correlation and simple regression
//!
//! p-values and critical values come from statrs' Student's t and standard
//! normal distributions.

use crate::engine::{correlation_from_moments, regression_from_moments};
use crate::errors::{StatsError, StatsResult};
use crate::moments::CoMoments;
use crate::types::{CorrelationTest, RegressionInference};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

/// Reject confidence levels outside (0, 1)
pub fn validate_confidence_level(confidence_level: f64) -> StatsResult<()> {
    if confidence_level > 0.0 && confidence_level < 1.0 {
        Ok(())
    } else {
        Err(StatsError::InvalidConfidenceLevel(confidence_level))
    }
}

fn students_t(df: usize) -> StatsResult<StudentsT> {
    StudentsT::new(0.0, 1.0, df as f64).map_err(|e| StatsError::Distribution(e.to_string()))
}

/// Two-sided p-value of a t statistic
fn two_sided_p(t_dist: &StudentsT, t: f64) -> f64 {
    if t.is_nan() {
        f64::NAN
    } else if t.is_infinite() {
        0.0
    } else {
        (2.0 * (1.0 - t_dist.cdf(t.abs()))).clamp(0.0, 1.0)
    }
}

/// Two-sided critical value for the given confidence level
fn critical_value(t_dist: &StudentsT, confidence_level: f64) -> f64 {
    t_dist.inverse_cdf((1.0 + confidence_level) / 2.0)
}

/// Ratio of an estimate to its standard error, with a zero error mapping to ±∞
fn t_ratio(estimate: f64, std_error: f64) -> f64 {
    if std_error > 0.0 {
        estimate / std_error
    } else if estimate == 0.0 {
        f64::NAN
    } else {
        estimate.signum() * f64::INFINITY
    }
}

/// Pearson correlation t-test with a Fisher-z confidence interval
///
/// t = r·√(n−2) / √(1−r²) with n − 2 degrees of freedom. The interval needs
/// n ≥ 4 (standard error 1/√(n−3)); below that its bounds are NaN.
pub fn correlation_test(moments: &CoMoments, confidence_level: f64) -> StatsResult<CorrelationTest> {
    validate_confidence_level(confidence_level)?;
    let n = moments.count();
    if n < 3 {
        return Err(StatsError::insufficient("correlation test", 3, n));
    }
    let r = correlation_from_moments(moments)?;
    let df = n - 2;
    let t_dist = students_t(df)?;

    let one_minus_r2 = 1.0 - r * r;
    let statistic = if one_minus_r2 <= 0.0 {
        r.signum() * f64::INFINITY
    } else {
        r * (df as f64).sqrt() / one_minus_r2.sqrt()
    };
    let p_value = two_sided_p(&t_dist, statistic);

    let (ci_lower, ci_upper) = if n >= 4 {
        let normal = Normal::new(0.0, 1.0).map_err(|e| StatsError::Distribution(e.to_string()))?;
        let z_crit = normal.inverse_cdf((1.0 + confidence_level) / 2.0);
        let z = r.atanh();
        let se = 1.0 / ((n - 3) as f64).sqrt();
        ((z - z_crit * se).tanh(), (z + z_crit * se).tanh())
    } else {
        (f64::NAN, f64::NAN)
    };

    Ok(CorrelationTest {
        r,
        statistic,
        p_value,
        df,
        ci_lower,
        ci_upper,
        confidence_level,
        n,
    })
}

/// Standard errors, t-tests and confidence intervals for slope and intercept
///
/// SSE = syy − sxy²/sxx, residual standard error √(SSE/(n−2)),
/// se(slope) = rse/√sxx, se(intercept) = rse·√(1/n + x̄²/sxx).
pub fn regression_inference(
    moments: &CoMoments,
    confidence_level: f64,
) -> StatsResult<RegressionInference> {
    validate_confidence_level(confidence_level)?;
    let n = moments.count();
    if n < 3 {
        return Err(StatsError::insufficient("regression inference", 3, n));
    }
    let fit = regression_from_moments(moments)?;
    let df = n - 2;
    let t_dist = students_t(df)?;

    let sse = (fit.syy - fit.sxy * fit.sxy / fit.sxx).max(0.0);
    let residual_std_error = (sse / df as f64).sqrt();
    let slope_std_error = residual_std_error / fit.sxx.sqrt();
    let intercept_std_error =
        residual_std_error * (1.0 / n as f64 + fit.avg_x * fit.avg_x / fit.sxx).sqrt();

    let slope_t = t_ratio(fit.slope, slope_std_error);
    let intercept_t = t_ratio(fit.intercept, intercept_std_error);
    let t_crit = critical_value(&t_dist, confidence_level);

    Ok(RegressionInference {
        fit,
        residual_std_error,
        slope_std_error,
        intercept_std_error,
        slope_t,
        intercept_t,
        slope_p_value: two_sided_p(&t_dist, slope_t),
        intercept_p_value: two_sided_p(&t_dist, intercept_t),
        slope_ci: (
            fit.slope - t_crit * slope_std_error,
            fit.slope + t_crit * slope_std_error,
        ),
        intercept_ci: (
            fit.intercept - t_crit * intercept_std_error,
            fit.intercept + t_crit * intercept_std_error,
        ),
        confidence_level,
        df,
    })
}
