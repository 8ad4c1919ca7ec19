pub mod flow;
pub mod types;

pub use types::*;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::date_util::hours_between;
use crate::records::{
    DelegationEvent, RoleTransition, SubtaskRecord, TaskRecord, TaskStatus,
};

/// Percentage of `part` in `whole`, clamped to [0, 100] and 0 when the
/// denominator is 0. Every rate in this crate goes through here so no
/// NaN or infinity can escape into a report.
pub(crate) fn pct(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64 * 100.0).clamp(0.0, 100.0)
    }
}

/// Mean of a value list, 0 when empty.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Compute task metrics for one record set.
///
/// Pure: the same records always produce the same output. Distributions use
/// ordered maps so serialization is deterministic too.
pub fn task_metrics(tasks: &[TaskRecord]) -> TaskMetrics {
    let total = tasks.len() as u64;
    let completed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count() as u64;

    let completion_hours: Vec<f64> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .filter_map(|t| t.completion_hours())
        .collect();

    let mut by_status: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_priority: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_owner: BTreeMap<String, u64> = BTreeMap::new();
    for t in tasks {
        *by_status.entry(t.status.as_str().to_string()).or_default() += 1;
        *by_priority.entry(t.priority.to_string()).or_default() += 1;
        *by_owner.entry(t.owner.clone()).or_default() += 1;
    }

    TaskMetrics {
        total_tasks: total,
        completed_tasks: completed,
        by_status,
        completion_rate: pct(completed, total),
        avg_completion_hours: mean(&completion_hours),
        by_priority,
        by_owner,
    }
}

/// Compute delegation metrics from events plus the task records that carry
/// per-task redelegation counts.
pub fn delegation_metrics(events: &[DelegationEvent], tasks: &[TaskRecord]) -> DelegationMetrics {
    let total = events.len() as u64;
    let successful = events.iter().filter(|e| e.success).count() as u64;

    let mut transition_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut reason_counts: BTreeMap<String, u64> = BTreeMap::new();
    for e in events {
        let key = format!("{}→{}", e.from_role, e.to_role);
        *transition_counts.entry(key).or_default() += 1;
        if let Some(reason) = &e.rejection_reason {
            *reason_counts.entry(reason.clone()).or_default() += 1;
        }
    }

    // Top 5 by count desc; BTreeMap iteration already orders equal counts
    // by reason string ascending, and the sort below is stable.
    let mut top_rejection_reasons: Vec<ReasonCount> = reason_counts
        .into_iter()
        .map(|(reason, count)| ReasonCount { reason, count })
        .collect();
    top_rejection_reasons.sort_by(|a, b| b.count.cmp(&a.count));
    top_rejection_reasons.truncate(5);

    let redelegations: Vec<f64> = tasks.iter().map(|t| t.redelegation_count as f64).collect();
    let max_redelegation_count = tasks.iter().map(|t| t.redelegation_count).max().unwrap_or(0);

    DelegationMetrics {
        total_delegations: total,
        successful_delegations: successful,
        failed_delegations: total - successful,
        avg_redelegation_count: mean(&redelegations),
        max_redelegation_count,
        transition_counts,
        top_rejection_reasons,
    }
}

/// Compute code review metrics.
pub fn review_metrics(reviews: &[crate::records::CodeReviewRecord]) -> CodeReviewMetrics {
    let total = reviews.len() as u64;
    let approved = reviews.iter().filter(|r| r.status.is_approval()).count() as u64;
    let review_hours: Vec<f64> = reviews.iter().map(|r| r.review_hours()).collect();

    let mut by_status: BTreeMap<String, u64> = BTreeMap::new();
    for r in reviews {
        *by_status.entry(r.status.as_str().to_string()).or_default() += 1;
    }

    CodeReviewMetrics {
        total_reviews: total,
        by_status,
        approval_rate: pct(approved, total),
        avg_review_hours: mean(&review_hours),
    }
}

/// Compute cross-cutting performance metrics.
pub fn performance_metrics(
    tasks: &[TaskRecord],
    delegations: &[DelegationEvent],
    subtasks: &[SubtaskRecord],
    transitions: &[RoleTransition],
) -> PerformanceMetrics {
    let total = tasks.len() as u64;
    let completed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count() as u64;

    let avg_subtasks_per_task = if total == 0 {
        0.0
    } else {
        subtasks.len() as f64 / total as f64
    };

    let (most_active_mode, least_active_mode) = mode_activity(transitions);

    // Earliest delegation per task, then mean hours from task creation.
    let mut first_delegation: BTreeMap<&str, DateTime<Utc>> = BTreeMap::new();
    for e in delegations {
        first_delegation
            .entry(e.task_ref.as_str())
            .and_modify(|at| {
                if e.delegated_at < *at {
                    *at = e.delegated_at;
                }
            })
            .or_insert(e.delegated_at);
    }
    let waits: Vec<f64> = tasks
        .iter()
        .filter_map(|t| {
            first_delegation
                .get(t.id.as_str())
                .map(|at| hours_between(t.created_at, *at))
        })
        .collect();

    PerformanceMetrics {
        implementation_efficiency: pct(completed, total),
        avg_subtasks_per_task,
        most_active_mode,
        least_active_mode,
        avg_hours_to_first_delegation: mean(&waits),
    }
}

/// Most and least active modes by transition-target frequency. Ties go to
/// the role first encountered in the input, so counts are accumulated in
/// input order and only strictly better counts displace the current pick.
fn mode_activity(transitions: &[RoleTransition]) -> (Option<String>, Option<String>) {
    let mut counts: Vec<(String, u64)> = Vec::new();
    for t in transitions {
        match counts.iter_mut().find(|(role, _)| *role == t.to_role) {
            Some((_, n)) => *n += 1,
            None => counts.push((t.to_role.clone(), 1)),
        }
    }
    if counts.is_empty() {
        return (None, None);
    }

    let mut most = &counts[0];
    let mut least = &counts[0];
    for c in &counts[1..] {
        if c.1 > most.1 {
            most = c;
        }
        if c.1 < least.1 {
            least = c;
        }
    }
    (Some(most.0.clone()), Some(least.0.clone()))
}

/// Assemble a full bundle from all record sets. Each sub-bundle is computed
/// independently; the functions are total, so no sub-computation can poison
/// its siblings.
pub fn compute_bundle(
    tasks: &[TaskRecord],
    delegations: &[DelegationEvent],
    reviews: &[crate::records::CodeReviewRecord],
    subtasks: &[SubtaskRecord],
    transitions: &[RoleTransition],
) -> MetricsBundle {
    MetricsBundle {
        tasks: task_metrics(tasks),
        delegations: delegation_metrics(delegations, tasks),
        reviews: review_metrics(reviews),
        performance: performance_metrics(tasks, delegations, subtasks, transitions),
    }
}
