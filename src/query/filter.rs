use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::records::Priority;

/// A date range [start, end] inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of days covered, inclusive of both endpoints.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The immediately preceding range of exactly the same length.
    /// Guarantees equal window sizes for period-over-period comparisons.
    pub fn previous(&self) -> Self {
        let len = self.len_days();
        Self {
            start: self.start - Duration::days(len),
            end: self.start - Duration::days(1),
        }
    }

    /// Contiguous 7-day windows spanning this range, anchored at `start`.
    /// The final window is clipped to `end`.
    pub fn weekly_windows(&self) -> Vec<DateRange> {
        let mut windows = Vec::new();
        let mut cursor = self.start;
        while cursor <= self.end {
            let window_end = (cursor + Duration::days(6)).min(self.end);
            windows.push(DateRange::new(cursor, window_end));
            cursor = window_end + Duration::days(1);
        }
        windows
    }

    pub fn contains(&self, d: NaiveDate) -> bool {
        d >= self.start && d <= self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} → {}", self.start, self.end)
    }
}

/// Normalized filter applied uniformly to every record query for one
/// report request. Built once in the Filtering phase and never mutated.
///
/// Absent fields mean "no bound": the data source returns all records
/// for that dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub date_range: Option<DateRange>,
    pub owner: Option<String>,
    pub mode: Option<String>,
    pub priority: Option<Priority>,
    /// Scope every record set to one task (single-task report types).
    pub task_ref: Option<String>,
}

impl ReportFilter {
    /// Build a filter from request options. Pure and total: there are no
    /// error conditions, absent options simply stay unbounded.
    pub fn build(
        date_range: Option<DateRange>,
        owner: Option<String>,
        mode: Option<String>,
        priority: Option<Priority>,
    ) -> Self {
        Self {
            date_range,
            owner,
            mode,
            priority,
            task_ref: None,
        }
    }

    /// Narrow the filter to a single task.
    pub fn with_task_ref(mut self, task_ref: impl Into<String>) -> Self {
        self.task_ref = Some(task_ref.into());
        self
    }

    /// The same filter shifted back by exactly one period length.
    /// A filter with no date range has no meaningful prior period and is
    /// returned unchanged.
    pub fn previous_period(&self) -> Self {
        Self {
            date_range: self.date_range.map(|r| r.previous()),
            ..self.clone()
        }
    }
}
