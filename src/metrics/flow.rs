use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::metrics::types::{FlowMetrics, ProblemPattern};
use crate::metrics::{mean, pct};
use crate::records::{DelegationEvent, RoleTransition, TaskRecord};

/// Weights of the flow efficiency composite.
const SUCCESS_WEIGHT: f64 = 0.5;
const REDELEGATION_WEIGHT: f64 = 0.3;
const DURATION_WEIGHT: f64 = 0.2;

/// A task redelegated more than this many times counts as a "high
/// redelegation" problem pattern.
const HIGH_REDELEGATION_THRESHOLD: u32 = 2;

/// Configured thresholds for bottleneck detection. These are deployment
/// tuning knobs, wired in at composition time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BottleneckThresholds {
    /// A role is a bottleneck when its incoming-transition count exceeds
    /// this multiple of the mean incoming count across all roles.
    pub incoming_multiple: f64,
    /// ... or when its average outgoing-handoff duration exceeds this many
    /// hours.
    pub handoff_hours: f64,
}

impl Default for BottleneckThresholds {
    fn default() -> Self {
        Self {
            incoming_multiple: 2.0,
            handoff_hours: 24.0,
        }
    }
}

/// Compute delegation-flow metrics, the efficiency composite, and the
/// bottleneck/problem analysis in one pass.
pub fn flow_metrics(
    events: &[DelegationEvent],
    tasks: &[TaskRecord],
    transitions: &[RoleTransition],
    thresholds: &BottleneckThresholds,
) -> FlowMetrics {
    let total = events.len() as u64;
    let successful = events.iter().filter(|e| e.success).count() as u64;
    let success_rate = pct(successful, total);

    let flow_hours: Vec<f64> = events.iter().filter_map(|e| e.flow_hours()).collect();
    let avg_flow_hours = mean(&flow_hours);

    let redelegated = tasks.iter().filter(|t| t.redelegation_count > 0).count() as u64;
    let redelegation_rate = pct(redelegated, tasks.len() as u64);

    let mut transition_counts: BTreeMap<String, u64> = BTreeMap::new();
    for t in transitions {
        let key = format!("{}→{}", t.from_role, t.to_role);
        *transition_counts.entry(key).or_default() += 1;
    }

    FlowMetrics {
        total_flows: total,
        avg_flow_hours,
        success_rate,
        redelegation_rate,
        efficiency_score: efficiency_score(success_rate, redelegation_rate, avg_flow_hours),
        bottleneck_roles: bottleneck_roles(transitions, thresholds),
        transition_counts,
        problem_patterns: problem_patterns(events, tasks),
    }
}

/// Weighted composite of success rate, redelegation rate, and handoff
/// duration, clamped to [0, 100].
///
/// duration_score degrades by 10 points per full day of average flow
/// duration; an average of 0 (no measurable flows) contributes nothing.
pub fn efficiency_score(success_rate: f64, redelegation_rate: f64, avg_flow_hours: f64) -> f64 {
    let duration_score = if avg_flow_hours > 0.0 {
        (100.0 - (avg_flow_hours / 24.0) * 10.0).max(0.0)
    } else {
        0.0
    };
    let score = success_rate * SUCCESS_WEIGHT
        + (100.0 - redelegation_rate) * REDELEGATION_WEIGHT
        + duration_score * DURATION_WEIGHT;
    score.clamp(0.0, 100.0)
}

/// Roles flagged for abnormally high incoming-transition volume or
/// abnormally long outgoing handoffs, relative to configured thresholds.
/// Output is ordered by first appearance as a transition target.
pub fn bottleneck_roles(
    transitions: &[RoleTransition],
    thresholds: &BottleneckThresholds,
) -> Vec<String> {
    if transitions.is_empty() {
        return Vec::new();
    }

    // Incoming counts and outgoing handoff durations, in first-seen order.
    let mut incoming: Vec<(String, u64)> = Vec::new();
    let mut handoffs: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for t in transitions {
        match incoming.iter_mut().find(|(role, _)| *role == t.to_role) {
            Some((_, n)) => *n += 1,
            None => incoming.push((t.to_role.clone(), 1)),
        }
        if let Some(h) = t.handoff_hours {
            handoffs.entry(t.from_role.as_str()).or_default().push(h);
        }
    }

    let mean_incoming =
        incoming.iter().map(|(_, n)| *n as f64).sum::<f64>() / incoming.len() as f64;

    let mut flagged = Vec::new();
    for (role, count) in &incoming {
        let by_volume = *count as f64 > thresholds.incoming_multiple * mean_incoming;
        let by_latency = handoffs
            .get(role.as_str())
            .map(|hours| mean(hours) > thresholds.handoff_hours)
            .unwrap_or(false);
        if by_volume || by_latency {
            flagged.push(role.clone());
        }
    }
    // Roles that only ever hand off (never receive) can still be slow.
    for (role, hours) in &handoffs {
        if mean(hours) > thresholds.handoff_hours
            && !flagged.iter().any(|f| f == role)
            && !incoming.iter().any(|(r, _)| r == role)
        {
            flagged.push(role.to_string());
        }
    }
    flagged
}

/// Recurring problems in delegation history, most frequent first. Ties keep
/// insertion order (high redelegation before failures).
pub fn problem_patterns(events: &[DelegationEvent], tasks: &[TaskRecord]) -> Vec<ProblemPattern> {
    let high_redelegation = tasks
        .iter()
        .filter(|t| t.redelegation_count > HIGH_REDELEGATION_THRESHOLD)
        .count() as u64;
    let failures = events.iter().filter(|e| !e.success).count() as u64;

    let mut patterns = vec![
        ProblemPattern {
            pattern: "high redelegation".into(),
            count: high_redelegation,
        },
        ProblemPattern {
            pattern: "failed delegations".into(),
            count: failures,
        },
    ];
    patterns.sort_by(|a, b| b.count.cmp(&a.count));
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Priority, TaskStatus};
    use chrono::{TimeZone, Utc};

    fn event(success: bool, flow_hours: Option<i64>) -> DelegationEvent {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        DelegationEvent {
            task_ref: "t1".into(),
            from_role: "orchestrator".into(),
            to_role: "coder".into(),
            delegated_at: at,
            success,
            rejection_reason: None,
            completed_at: flow_hours.map(|h| at + chrono::Duration::hours(h)),
        }
    }

    fn task_with_redelegations(n: u32) -> TaskRecord {
        TaskRecord {
            id: format!("t{n}"),
            status: TaskStatus::InProgress,
            priority: Priority::Medium,
            owner: "alice".into(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            completed_at: None,
            redelegation_count: n,
        }
    }

    fn transition(from: &str, to: &str, handoff: Option<f64>) -> RoleTransition {
        RoleTransition {
            task_ref: "t1".into(),
            from_role: from.into(),
            to_role: to.into(),
            occurred_at: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            handoff_hours: handoff,
        }
    }

    #[test]
    fn test_efficiency_score_bounds() {
        // All failures, huge durations: still within [0, 100].
        let worst = efficiency_score(0.0, 100.0, 10_000.0);
        assert!((0.0..=100.0).contains(&worst));

        let best = efficiency_score(100.0, 0.0, 1.0);
        assert!((0.0..=100.0).contains(&best));

        // Perfect success, no redelegation, no measured duration:
        // 50 + 30 + 0 = 80.
        assert_eq!(efficiency_score(100.0, 0.0, 0.0), 80.0);
    }

    #[test]
    fn test_efficiency_score_duration_decay() {
        // 48h average costs 20 duration points before weighting.
        let score = efficiency_score(100.0, 0.0, 48.0);
        assert_eq!(score, 50.0 + 30.0 + 80.0 * 0.2);
    }

    #[test]
    fn test_flow_metrics_all_failures_stays_in_range() {
        let events: Vec<DelegationEvent> = (0..10).map(|_| event(false, Some(24 * 30))).collect();
        let tasks: Vec<TaskRecord> = (0..10).map(task_with_redelegations).collect();
        let m = flow_metrics(&events, &tasks, &[], &BottleneckThresholds::default());
        assert!((0.0..=100.0).contains(&m.efficiency_score));
        assert_eq!(m.success_rate, 0.0);
        assert_eq!(m.redelegation_rate, 90.0); // t0 has count 0
    }

    #[test]
    fn test_flow_metrics_empty() {
        let m = flow_metrics(&[], &[], &[], &BottleneckThresholds::default());
        assert_eq!(m.total_flows, 0);
        assert_eq!(m.avg_flow_hours, 0.0);
        assert_eq!(m.efficiency_score, 0.0 + 30.0 + 0.0); // only redelegation term
        assert!(m.bottleneck_roles.is_empty());
    }

    #[test]
    fn test_avg_flow_hours_ignores_open_flows() {
        let events = vec![event(true, Some(12)), event(true, Some(36)), event(true, None)];
        let m = flow_metrics(&events, &[], &[], &BottleneckThresholds::default());
        assert_eq!(m.avg_flow_hours, 24.0);
    }

    #[test]
    fn test_bottleneck_by_incoming_volume() {
        // "review" takes 50 incoming transitions; four other roles take 10
        // each. Mean = 18, 50 > 2×18, so "review" is flagged.
        let mut transitions = Vec::new();
        for _ in 0..50 {
            transitions.push(transition("coder", "review", None));
        }
        for role in ["architect", "coder", "debug", "ask"] {
            for _ in 0..10 {
                transitions.push(transition("orchestrator", role, None));
            }
        }
        let flagged = bottleneck_roles(&transitions, &BottleneckThresholds::default());
        assert_eq!(flagged, vec!["review".to_string()]);
    }

    #[test]
    fn test_bottleneck_by_handoff_latency() {
        let transitions = vec![
            transition("review", "coder", Some(48.0)),
            transition("coder", "review", Some(1.0)),
        ];
        let flagged = bottleneck_roles(&transitions, &BottleneckThresholds::default());
        // "review" averaged 48h outgoing handoffs.
        assert!(flagged.contains(&"review".to_string()));
        assert!(!flagged.contains(&"coder".to_string()));
    }

    #[test]
    fn test_bottleneck_thresholds_respected() {
        let transitions = vec![
            transition("review", "coder", Some(48.0)),
            transition("coder", "review", Some(1.0)),
        ];
        let lenient = BottleneckThresholds {
            incoming_multiple: 10.0,
            handoff_hours: 100.0,
        };
        assert!(bottleneck_roles(&transitions, &lenient).is_empty());
    }

    #[test]
    fn test_problem_patterns_ordering() {
        let events = vec![event(false, None), event(false, None), event(true, None)];
        let tasks = vec![task_with_redelegations(3)];
        let patterns = problem_patterns(&events, &tasks);
        assert_eq!(patterns[0].pattern, "failed delegations");
        assert_eq!(patterns[0].count, 2);
        assert_eq!(patterns[1].pattern, "high redelegation");
        assert_eq!(patterns[1].count, 1);
    }

    #[test]
    fn test_problem_patterns_tie_keeps_insertion_order() {
        let events = vec![event(false, None)];
        let tasks = vec![task_with_redelegations(3)];
        let patterns = problem_patterns(&events, &tasks);
        assert_eq!(patterns[0].pattern, "high redelegation");
    }
}
