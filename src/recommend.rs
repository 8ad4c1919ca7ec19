//! Threshold-driven advisory messages. A fixed, ordered rule table is
//! evaluated against the assembled metrics; every firing rule contributes
//! its message in declaration order.

use crate::benchmark::BenchmarkComparison;
use crate::metrics::types::{FlowMetrics, MetricsBundle};

/// Everything a rule may look at.
pub struct RuleInput<'a> {
    pub bundle: &'a MetricsBundle,
    pub flow: &'a FlowMetrics,
    pub benchmarks: &'a [BenchmarkComparison],
}

struct Rule {
    applies: fn(&RuleInput) -> bool,
    message: &'static str,
}

const COMPLETION_RATE_FLOOR: f64 = 70.0;
const SUCCESS_RATE_FLOOR: f64 = 80.0;
const APPROVAL_RATE_FLOOR: f64 = 75.0;
const EFFICIENCY_FLOOR: f64 = 60.0;
const REVIEW_HOURS_CEILING: f64 = 24.0;

/// Rules fire independently; declaration order is output order.
const RULES: &[Rule] = &[
    Rule {
        applies: |input| {
            input.bundle.tasks.total_tasks > 0
                && input.bundle.tasks.completion_rate < COMPLETION_RATE_FLOOR
        },
        message: "Completion rate is below 70%. Consider decomposing large tasks \
                  into smaller, independently completable units.",
    },
    Rule {
        applies: |input| {
            input.bundle.delegations.total_delegations > 0
                && input.flow.success_rate < SUCCESS_RATE_FLOOR
        },
        message: "Delegation success rate is below 80%. Clearer delegation \
                  instructions and acceptance criteria may reduce rejected handoffs.",
    },
    Rule {
        applies: |input| {
            input.bundle.reviews.total_reviews > 0
                && input.bundle.reviews.approval_rate < APPROVAL_RATE_FLOOR
        },
        message: "Code review approval rate is below 75%. A code-quality focus \
                  (lint gates, smaller changesets) should raise first-pass approvals.",
    },
    Rule {
        applies: |input| {
            input.flow.total_flows > 0 && input.flow.efficiency_score < EFFICIENCY_FLOOR
        },
        message: "Flow efficiency is below 60. Review the delegation handoff \
                  process for stalls between roles.",
    },
    Rule {
        applies: |input| !input.flow.bottleneck_roles.is_empty(),
        message: "One or more roles are bottlenecks. Rebalance incoming work or \
                  add capacity to the flagged roles.",
    },
    Rule {
        applies: |input| {
            input
                .flow
                .problem_patterns
                .iter()
                .any(|p| p.pattern == "high redelegation" && p.count > 0)
        },
        message: "Some tasks were redelegated more than twice. Stabilize task \
                  assignments by tightening upfront scoping.",
    },
    Rule {
        applies: |input| {
            input.bundle.reviews.total_reviews > 0
                && input.bundle.reviews.avg_review_hours > REVIEW_HOURS_CEILING
        },
        message: "Reviews take more than a day on average. Shorter review \
                  turnaround keeps delegated work from going stale.",
    },
    Rule {
        applies: |input| {
            input.benchmarks.iter().any(|b| {
                b.baseline == "previous-period"
                    && b.metric == "completion_rate"
                    && b.percent_delta < -10.0
            })
        },
        message: "Completion rate dropped more than 10% versus the previous \
                  period. Check for scope growth or staffing changes.",
    },
];

const STEADY_STATE: &str =
    "No threshold findings for this period. Metrics are steady or there is \
     not enough data to advise on.";

/// Evaluate every rule against the assembled metrics. If none fire, a
/// single neutral steady-state message is returned.
pub fn generate_recommendations(
    bundle: &MetricsBundle,
    flow: &FlowMetrics,
    benchmarks: &[BenchmarkComparison],
) -> Vec<String> {
    let input = RuleInput {
        bundle,
        flow,
        benchmarks,
    };
    let fired: Vec<String> = RULES
        .iter()
        .filter(|r| (r.applies)(&input))
        .map(|r| r.message.to_string())
        .collect();

    if fired.is_empty() {
        vec![STEADY_STATE.to_string()]
    } else {
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::types::{ProblemPattern, TaskMetrics};

    fn healthy_bundle() -> MetricsBundle {
        MetricsBundle {
            tasks: TaskMetrics {
                total_tasks: 10,
                completed_tasks: 9,
                completion_rate: 90.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn healthy_flow() -> FlowMetrics {
        FlowMetrics {
            total_flows: 10,
            success_rate: 95.0,
            efficiency_score: 85.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_steady_state_when_nothing_fires() {
        let recs = generate_recommendations(&healthy_bundle(), &healthy_flow(), &[]);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].contains("steady"));
    }

    #[test]
    fn test_low_completion_rate_fires() {
        let mut bundle = healthy_bundle();
        bundle.tasks.completion_rate = 55.0;
        let recs = generate_recommendations(&bundle, &healthy_flow(), &[]);
        assert!(recs[0].contains("decomposing"));
    }

    #[test]
    fn test_empty_data_does_not_fire_thresholds() {
        // All-zero bundle: rates are 0 but there is nothing to advise on.
        let recs = generate_recommendations(
            &MetricsBundle::default(),
            &FlowMetrics::default(),
            &[],
        );
        assert_eq!(recs.len(), 1);
        assert!(recs[0].contains("not enough data"));
    }

    #[test]
    fn test_multiple_rules_in_declaration_order() {
        let mut bundle = healthy_bundle();
        bundle.tasks.completion_rate = 50.0;
        bundle.delegations.total_delegations = 5;
        let mut flow = healthy_flow();
        flow.success_rate = 60.0;
        flow.problem_patterns = vec![ProblemPattern {
            pattern: "high redelegation".into(),
            count: 3,
        }];

        let recs = generate_recommendations(&bundle, &flow, &[]);
        assert_eq!(recs.len(), 3);
        assert!(recs[0].contains("decomposing"));
        assert!(recs[1].contains("delegation instructions"));
        assert!(recs[2].contains("redelegated"));
    }

    #[test]
    fn test_benchmark_regression_fires() {
        let benchmarks = vec![BenchmarkComparison {
            metric: "completion_rate".into(),
            baseline: "previous-period".into(),
            current_value: 60.0,
            baseline_value: 90.0,
            percent_delta: -33.3,
        }];
        let recs = generate_recommendations(&healthy_bundle(), &healthy_flow(), &benchmarks);
        assert!(recs.iter().any(|r| r.contains("previous period")));
    }
}
