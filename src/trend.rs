//! Time-series trend analysis: weekly bucketing, ordinary-least-squares
//! trend fitting, naive prediction, and Pearson correlation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::query::filter::DateRange;

/// One observation in a trend series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Window label, the start date of the week ("2025-03-03").
    pub label: String,
    pub value: f64,
}

/// An ordered weekly series for one metric. A pure function of its inputs:
/// recomputing from the same records yields the same series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub metric: String,
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Bucket dated observations into contiguous 7-day windows spanning
/// `range`. Windows with no observations report 0, never NaN.
pub fn bucket_by_week(metric: &str, dates: &[NaiveDate], range: DateRange) -> TrendSeries {
    let points = range
        .weekly_windows()
        .into_iter()
        .map(|w| TrendPoint {
            label: w.start.format("%Y-%m-%d").to_string(),
            value: dates.iter().filter(|d| w.contains(**d)).count() as f64,
        })
        .collect();
    TrendSeries {
        metric: metric.to_string(),
        points,
    }
}

/// Weekly series of a per-window rate: `numerators` over `denominators`
/// counted within each window, as a percentage. Empty windows report 0.
pub fn bucket_rate_by_week(
    metric: &str,
    numerators: &[NaiveDate],
    denominators: &[NaiveDate],
    range: DateRange,
) -> TrendSeries {
    let points = range
        .weekly_windows()
        .into_iter()
        .map(|w| {
            let num = numerators.iter().filter(|d| w.contains(**d)).count() as u64;
            let den = denominators.iter().filter(|d| w.contains(**d)).count() as u64;
            TrendPoint {
                label: w.start.format("%Y-%m-%d").to_string(),
                value: crate::metrics::pct(num, den),
            }
        })
        .collect();
    TrendSeries {
        metric: metric.to_string(),
        points,
    }
}

/// Ordinary-least-squares fit of value against index. Returns the fitted
/// value at each index. Fewer than two points, or a degenerate fit, yields
/// the input unchanged (a flat series is its own best line).
pub fn fit_linear_trend(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return values.to_vec();
    }

    let nf = n as f64;
    let sum_x: f64 = (0..n).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
    let sum_xx: f64 = (0..n).map(|i| (i as f64).powi(2)).sum();

    let denom = nf * sum_xx - sum_x * sum_x;
    if denom == 0.0 {
        return values.to_vec();
    }
    let slope = (nf * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / nf;

    (0..n).map(|i| slope * i as f64 + intercept).collect()
}

/// Extrapolate `periods` future weekly points from the slope between the
/// last two observed points. Requires at least two history points and a
/// positive horizon; otherwise the forecast is empty.
pub fn predict(series: &TrendSeries, periods: usize) -> Vec<TrendPoint> {
    if periods == 0 || series.points.len() < 2 {
        return Vec::new();
    }

    let last = &series.points[series.points.len() - 1];
    let prev = &series.points[series.points.len() - 2];
    let slope = last.value - prev.value;

    let last_start = NaiveDate::parse_from_str(&last.label, "%Y-%m-%d").ok();

    (1..=periods)
        .map(|i| {
            let label = match last_start {
                Some(d) => (d + chrono::Duration::weeks(i as i64))
                    .format("%Y-%m-%d")
                    .to_string(),
                None => format!("+{i}w"),
            };
            TrendPoint {
                label,
                value: last.value + slope * i as f64,
            }
        })
        .collect()
}

/// Pearson correlation coefficient between two series. Returns 0, never
/// NaN, when the series differ in length, are shorter than two points, or
/// either side has zero variance.
pub fn correlate(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return 0.0;
    }
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return 0.0;
    }
    (cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0)
}
