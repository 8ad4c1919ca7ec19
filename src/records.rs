use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    NeedsReview,
    Completed,
    NeedsChanges,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not-started",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::NeedsReview => "needs-review",
            TaskStatus::Completed => "completed",
            TaskStatus::NeedsChanges => "needs-changes",
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "not-started" => Ok(TaskStatus::NotStarted),
            "in-progress" => Ok(TaskStatus::InProgress),
            "needs-review" => Ok(TaskStatus::NeedsReview),
            "completed" => Ok(TaskStatus::Completed),
            "needs-changes" => Ok(TaskStatus::NeedsChanges),
            other => Err(Error::Validation(format!("unknown task status: {other}"))),
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            other => Err(Error::Validation(format!("unknown priority: {other}"))),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A workflow task as recorded by the execution system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// How many times the task was handed back and re-delegated.
    #[serde(default)]
    pub redelegation_count: u32,
}

impl TaskRecord {
    /// Completion span in hours, when the task actually completed.
    pub fn completion_hours(&self) -> Option<f64> {
        self.completed_at
            .map(|done| crate::date_util::hours_between(self.created_at, done))
    }
}

/// One delegation of a task from one role to another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationEvent {
    pub task_ref: String,
    pub from_role: String,
    pub to_role: String,
    pub delegated_at: DateTime<Utc>,
    pub success: bool,
    pub rejection_reason: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DelegationEvent {
    /// Hours from delegation to completion, when the flow finished.
    pub fn flow_hours(&self) -> Option<f64> {
        self.completed_at
            .map(|done| crate::date_util::hours_between(self.delegated_at, done))
    }
}

/// Outcome of a code review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Approved,
    ApprovedWithReservations,
    NeedsChanges,
    Pending,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Approved => "approved",
            ReviewStatus::ApprovedWithReservations => "approved_with_reservations",
            ReviewStatus::NeedsChanges => "needs_changes",
            ReviewStatus::Pending => "pending",
        }
    }

    /// Approved outright or with reservations.
    pub fn is_approval(&self) -> bool {
        matches!(
            self,
            ReviewStatus::Approved | ReviewStatus::ApprovedWithReservations
        )
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "approved" => Ok(ReviewStatus::Approved),
            "approved_with_reservations" => Ok(ReviewStatus::ApprovedWithReservations),
            "needs_changes" => Ok(ReviewStatus::NeedsChanges),
            "pending" => Ok(ReviewStatus::Pending),
            other => Err(Error::Validation(format!("unknown review status: {other}"))),
        }
    }
}

/// A code review attached to a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeReviewRecord {
    pub task_ref: String,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CodeReviewRecord {
    pub fn review_hours(&self) -> f64 {
        crate::date_util::hours_between(self.created_at, self.updated_at)
    }
}

/// A planned subtask under a task's implementation plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskRecord {
    pub task_ref: String,
    pub plan_ref: String,
    pub batch_id: String,
    pub status: TaskStatus,
    pub sequence: u32,
    pub estimated_minutes: Option<u32>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A role-to-role handoff observed in the workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleTransition {
    pub task_ref: String,
    pub from_role: String,
    pub to_role: String,
    pub occurred_at: DateTime<Utc>,
    /// How long the receiving role held the task before handing it off,
    /// when the next handoff is known.
    pub handoff_hours: Option<f64>,
}
