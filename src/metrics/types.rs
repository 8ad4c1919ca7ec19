use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Task metrics: volume, completion, and distributions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMetrics {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    /// Tasks by status key (e.g. "in-progress").
    pub by_status: BTreeMap<String, u64>,
    /// Percentage of tasks completed, 0 when there are no tasks.
    pub completion_rate: f64,
    /// Mean hours from creation to completion over completed tasks with a
    /// recorded completion time; 0 when none qualify.
    pub avg_completion_hours: f64,
    pub by_priority: BTreeMap<String, u64>,
    pub by_owner: BTreeMap<String, u64>,
}

/// A rejection reason with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasonCount {
    pub reason: String,
    pub count: u64,
}

/// Delegation metrics: handoff volume and outcomes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DelegationMetrics {
    pub total_delegations: u64,
    pub successful_delegations: u64,
    pub failed_delegations: u64,
    /// Mean per-task redelegation count (from task records).
    pub avg_redelegation_count: f64,
    pub max_redelegation_count: u32,
    /// Delegations per "from→to" role pair.
    pub transition_counts: BTreeMap<String, u64>,
    /// Top 5 rejection reasons, most frequent first; ties break by reason
    /// string ascending so output is deterministic.
    pub top_rejection_reasons: Vec<ReasonCount>,
}

/// Code review metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeReviewMetrics {
    pub total_reviews: u64,
    pub by_status: BTreeMap<String, u64>,
    /// Percentage approved (outright or with reservations), 0 when empty.
    pub approval_rate: f64,
    /// Mean hours from review creation to last update.
    pub avg_review_hours: f64,
}

/// Cross-cutting performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// completed / total tasks × 100, 0 when there are no tasks.
    pub implementation_efficiency: f64,
    pub avg_subtasks_per_task: f64,
    /// Role receiving the most transitions; ties go to the first role
    /// encountered in the input.
    pub most_active_mode: Option<String>,
    pub least_active_mode: Option<String>,
    /// Mean hours from task creation to earliest delegation, over tasks
    /// with at least one delegation.
    pub avg_hours_to_first_delegation: f64,
}

/// A recurring delegation problem with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemPattern {
    pub pattern: String,
    pub count: u64,
}

/// Delegation-flow metrics and derived bottleneck analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowMetrics {
    pub total_flows: u64,
    /// Mean hours between delegation and completion over flows with both
    /// timestamps; 0 when none qualify.
    pub avg_flow_hours: f64,
    pub success_rate: f64,
    /// Percentage of tasks that were redelegated at least once.
    pub redelegation_rate: f64,
    /// Weighted composite in [0, 100].
    pub efficiency_score: f64,
    /// Roles flagged for abnormal incoming volume or handoff latency.
    pub bottleneck_roles: Vec<String>,
    /// Transitions per "from→to" role pair.
    pub transition_counts: BTreeMap<String, u64>,
    pub problem_patterns: Vec<ProblemPattern>,
}

/// Immutable set of first-order aggregates for one filter. Every sub-bundle
/// is always present; a group that could not be computed holds its
/// zero-valued default rather than an absent field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsBundle {
    pub tasks: TaskMetrics,
    pub delegations: DelegationMetrics,
    pub reviews: CodeReviewMetrics,
    pub performance: PerformanceMetrics,
}
