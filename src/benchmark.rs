//! Benchmark comparisons of current-period aggregates against prior-period,
//! historical-team, and fixed-target baselines.

use serde::{Deserialize, Serialize};

use crate::metrics::types::MetricsBundle;

/// One metric compared against one baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    pub metric: String,
    /// Which baseline this row compares against: "previous-period",
    /// "team-historical", or "fixed-target".
    pub baseline: String,
    pub current_value: f64,
    pub baseline_value: f64,
    pub percent_delta: f64,
}

/// Baseline values for the tracked metrics. Used both for the fixed
/// targets and for the historical team averages a deployment supplies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkTargets {
    pub completion_rate: f64,
    pub delegation_success_rate: f64,
    pub review_approval_rate: f64,
    pub implementation_efficiency: f64,
}

impl Default for BenchmarkTargets {
    fn default() -> Self {
        Self {
            completion_rate: 85.0,
            delegation_success_rate: 90.0,
            review_approval_rate: 80.0,
            implementation_efficiency: 85.0,
        }
    }
}

impl BenchmarkTargets {
    /// The tracked metrics as (name, value) rows, in declaration order.
    fn rows(&self) -> [(&'static str, f64); 4] {
        [
            ("completion_rate", self.completion_rate),
            ("delegation_success_rate", self.delegation_success_rate),
            ("review_approval_rate", self.review_approval_rate),
            ("implementation_efficiency", self.implementation_efficiency),
        ]
    }

    /// Extract the tracked metric values from a computed bundle.
    pub fn from_bundle(bundle: &MetricsBundle) -> Self {
        Self {
            completion_rate: bundle.tasks.completion_rate,
            delegation_success_rate: crate::metrics::pct(
                bundle.delegations.successful_delegations,
                bundle.delegations.total_delegations,
            ),
            review_approval_rate: bundle.reviews.approval_rate,
            implementation_efficiency: bundle.performance.implementation_efficiency,
        }
    }
}

/// Relative delta of `current` against `baseline` in percent. A zero
/// baseline yields 0 rather than a division blowup.
pub fn compare_to_baseline(current: f64, baseline: f64) -> f64 {
    if baseline == 0.0 {
        0.0
    } else {
        (current - baseline) / baseline * 100.0
    }
}

/// Build the full benchmark set: every tracked metric against every
/// baseline. The previous-period bundle must come from the same filter
/// shifted back by one period length (`ReportFilter::previous_period`),
/// which guarantees equal window sizes.
pub fn build_benchmark_set(
    current: &MetricsBundle,
    previous: &MetricsBundle,
    team_historical: &BenchmarkTargets,
    fixed_target: &BenchmarkTargets,
) -> Vec<BenchmarkComparison> {
    let current_rows = BenchmarkTargets::from_bundle(current).rows();
    let baselines = [
        ("previous-period", BenchmarkTargets::from_bundle(previous).rows()),
        ("team-historical", team_historical.rows()),
        ("fixed-target", fixed_target.rows()),
    ];

    let mut set = Vec::with_capacity(current_rows.len() * baselines.len());
    for (metric, current_value) in current_rows {
        for (baseline, rows) in &baselines {
            let baseline_value = rows
                .iter()
                .find(|(name, _)| name == &metric)
                .map(|(_, v)| *v)
                .unwrap_or(0.0);
            set.push(BenchmarkComparison {
                metric: metric.to_string(),
                baseline: baseline.to_string(),
                current_value,
                baseline_value,
                percent_delta: compare_to_baseline(current_value, baseline_value),
            });
        }
    }
    set
}
