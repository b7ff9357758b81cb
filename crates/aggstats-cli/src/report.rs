//! Presentation of results: rounding and a one-line interpretation

use aggstats_core::{
    ColumnSummary, CorrelationTest, LinearRegression, RegressionInference, StatKind, StatResult,
    StatValue,
};

/// Rendered lines for one result
pub fn render(result: &StatResult, precision: usize) -> Vec<String> {
    let fields = result.fields.join(", ");
    let label = format!("{}({})", result.kind.name(), fields);
    let fmt = |v: f64| format!("{:.*}", precision, v);

    match &result.value {
        StatValue::Scalar(v) => vec![
            format!("{} = {}", label, fmt(*v)),
            interpret_scalar(result.kind, &result.fields, *v, precision),
        ],
        StatValue::Regression(fit) => render_regression(&result.fields, fit, precision),
        StatValue::Summary(summary) => render_summary(&result.fields[0], summary, precision),
        StatValue::CorrelationTest(test) => render_correlation_test(&label, test, precision),
        StatValue::RegressionInference(inf) => render_inference(&result.fields, inf, precision),
    }
}

/// Qualitative strength of a correlation coefficient
pub fn strength(r: f64) -> &'static str {
    match r.abs() {
        a if a >= 0.7 => "strong",
        a if a >= 0.4 => "moderate",
        a if a >= 0.1 => "weak",
        _ => "negligible",
    }
}

fn direction(v: f64) -> &'static str {
    if v >= 0.0 {
        "positive"
    } else {
        "negative"
    }
}

fn interpret_scalar(kind: StatKind, fields: &[String], v: f64, precision: usize) -> String {
    let field = fields.first().map(String::as_str).unwrap_or("");
    match kind {
        StatKind::Correlation => {
            let (x, y) = (field, fields.get(1).map(String::as_str).unwrap_or(""));
            if strength(v) == "negligible" {
                format!("There is no meaningful linear association between {} and {}.", x, y)
            } else {
                let tendency = if v > 0.0 { "higher" } else { "lower" };
                format!(
                    "{} {} linear association: records with higher {} tend to have {} {}.",
                    capitalize(strength(v)),
                    direction(v),
                    x,
                    tendency,
                    y
                )
            }
        }
        StatKind::Covariance(_) => format!(
            "The {} sign means {} and {} tend to move {}; its magnitude depends on both fields' units.",
            direction(v),
            field,
            fields.get(1).map(String::as_str).unwrap_or(""),
            if v >= 0.0 { "together" } else { "in opposite directions" }
        ),
        StatKind::Variance(_) => format!(
            "Variance is in squared units of {}; its square root, {:.*}, is the spread in the field's own units.",
            field,
            precision,
            v.sqrt()
        ),
        StatKind::StandardDeviation(_) => format!(
            "Values of {} typically lie about {:.*} units from their mean.",
            field, precision, v
        ),
        StatKind::Mean => format!("The average {} is {:.*}.", field, precision, v),
        other => format!("{} of {}", capitalize(other.meaning()), fields.join(" and ")),
    }
}

fn render_regression(fields: &[String], fit: &LinearRegression, precision: usize) -> Vec<String> {
    let (x, y) = (&fields[0], &fields[1]);
    vec![
        format!(
            "{} = {:.*} * {} + {:.*}   (R² = {:.*}, n = {})",
            y, precision, fit.slope, x, precision, fit.intercept, precision, fit.r_squared, fit.n
        ),
        format!(
            "Each additional unit of {} is associated with a change of {:.*} in {}; the line explains {:.1}% of the variance in {}.",
            x,
            precision,
            fit.slope,
            y,
            fit.r_squared * 100.0,
            y
        ),
    ]
}

fn render_summary(field: &str, s: &ColumnSummary, precision: usize) -> Vec<String> {
    let fmt = |v: f64| format!("{:.*}", precision, v);
    let opt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), fmt);
    vec![
        format!("summary({})", field),
        format!("  n           = {} ({} missing)", s.n, s.n_missing),
        format!("  mean        = {}", fmt(s.mean)),
        format!("  min / max   = {} / {}", fmt(s.min), fmt(s.max)),
        format!("  var_pop     = {}", fmt(s.var_pop)),
        format!("  var_samp    = {}", opt(s.var_samp)),
        format!("  stddev_pop  = {}", fmt(s.std_pop)),
        format!("  stddev_samp = {}", opt(s.std_samp)),
    ]
}

fn render_correlation_test(label: &str, t: &CorrelationTest, precision: usize) -> Vec<String> {
    let alpha = 1.0 - t.confidence_level;
    let verdict = if t.p_value < alpha {
        "is statistically significant"
    } else {
        "is not statistically significant"
    };
    let mut lines = vec![
        format!(
            "{}: r = {:.*}, t = {:.*}, df = {}, p = {:.3e}",
            label, precision, t.r, precision, t.statistic, t.df, t.p_value
        ),
        format!(
            "The {} {} correlation {} at the {:.0}% level.",
            strength(t.r),
            direction(t.r),
            verdict,
            alpha * 100.0
        ),
    ];
    if !t.ci_lower.is_nan() {
        lines.push(format!(
            "{:.0}% confidence interval for r: [{:.*}, {:.*}]",
            t.confidence_level * 100.0,
            precision,
            t.ci_lower,
            precision,
            t.ci_upper
        ));
    }
    lines
}

fn render_inference(fields: &[String], inf: &RegressionInference, precision: usize) -> Vec<String> {
    let mut lines = render_regression(fields, &inf.fit, precision);
    let level = inf.confidence_level * 100.0;
    lines.push(format!(
        "{:<10} {:>14} {:>14} {:>10} {:>12}   {:.0}% CI",
        "term", "estimate", "std. error", "t", "p", level
    ));
    let rows = [
        (
            "intercept",
            inf.fit.intercept,
            inf.intercept_std_error,
            inf.intercept_t,
            inf.intercept_p_value,
            inf.intercept_ci,
        ),
        (
            fields[0].as_str(),
            inf.fit.slope,
            inf.slope_std_error,
            inf.slope_t,
            inf.slope_p_value,
            inf.slope_ci,
        ),
    ];
    for (term, estimate, se, t, p, (lo, hi)) in rows {
        lines.push(format!(
            "{:<10} {:>14.*} {:>14.*} {:>10.3} {:>12.3e}   [{:.*}, {:.*}]",
            term, precision, estimate, precision, se, t, p, precision, lo, precision, hi
        ));
    }
    lines.push(format!(
        "Residual standard error: {:.*} on {} degrees of freedom",
        precision, inf.residual_std_error, inf.df
    ));
    lines
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aggstats_core::{AggregateStatsEngine, ColumnTable, StatQuery, VarianceMode};

    fn table() -> ColumnTable {
        ColumnTable::from_f64(&[
            ("income", [41.0, 52.5, 38.2, 60.1, 47.3, 55.0].as_slice()),
            ("poverty", [18.0, 12.1, 21.4, 9.8, 15.5, 11.9].as_slice()),
        ])
        .unwrap()
    }

    fn run(query: StatQuery) -> StatResult {
        AggregateStatsEngine::default()
            .evaluate(&table(), &query)
            .unwrap()
    }

    #[test]
    fn test_strength_buckets() {
        assert_eq!(strength(-0.85), "strong");
        assert_eq!(strength(0.5), "moderate");
        assert_eq!(strength(0.15), "weak");
        assert_eq!(strength(0.01), "negligible");
    }

    #[test]
    fn test_render_correlation() {
        let lines = render(
            &run(StatQuery::Correlation {
                x: "income".into(),
                y: "poverty".into(),
            }),
            3,
        );
        assert!(lines[0].starts_with("corr(income, poverty) = -0.9"), "{}", lines[0]);
        assert!(lines[1].starts_with("Strong negative"), "{}", lines[1]);
    }

    #[test]
    fn test_render_variance_precision() {
        let lines = render(
            &run(StatQuery::Variance {
                field: "income".into(),
                mode: VarianceMode::Sample,
            }),
            2,
        );
        let value = lines[0].rsplit(" = ").next().unwrap();
        assert_eq!(value.split('.').nth(1).map(str::len), Some(2));
        assert!(lines[0].starts_with("var_samp(income)"));
    }

    #[test]
    fn test_render_regression() {
        let lines = render(
            &run(StatQuery::LinearRegression {
                x: "income".into(),
                y: "poverty".into(),
            }),
            4,
        );
        assert!(lines[0].starts_with("poverty = -0."), "{}", lines[0]);
        assert!(lines[0].contains("n = 6"));
    }

    #[test]
    fn test_render_summary_and_inference() {
        let summary = render(
            &run(StatQuery::Summary {
                field: "income".into(),
            }),
            1,
        );
        assert_eq!(summary.len(), 8);
        assert!(summary[1].contains("n           = 6 (0 missing)"));

        let inference = render(
            &run(StatQuery::RegressionInference {
                x: "income".into(),
                y: "poverty".into(),
                confidence_level: 0.95,
            }),
            3,
        );
        assert!(inference.iter().any(|l| l.starts_with("intercept")));
        assert!(inference.last().unwrap().contains("on 4 degrees of freedom"));
    }

    #[test]
    fn test_render_correlation_test() {
        let lines = render(
            &run(StatQuery::CorrelationTest {
                x: "income".into(),
                y: "poverty".into(),
                confidence_level: 0.95,
            }),
            3,
        );
        assert!(lines[1].contains("is statistically significant"), "{}", lines[1]);
        assert!(lines[2].starts_with("95% confidence interval"));
    }
}
