//! Ports to external collaborators: the raw record source and the
//! observability sink.

use async_trait::async_trait;

use crate::error::Result;
use crate::query::filter::ReportFilter;
use crate::records::{
    CodeReviewRecord, DelegationEvent, RoleTransition, SubtaskRecord, TaskRecord,
};

/// Contract for the raw record source backing report generation.
///
/// Reads must be repeatable and side-effect-free for the same filter; the
/// engine performs no retries itself. Implementations decide what "no
/// bound" means for absent filter fields.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn tasks(&self, filter: &ReportFilter) -> Result<Vec<TaskRecord>>;

    async fn delegations(&self, filter: &ReportFilter) -> Result<Vec<DelegationEvent>>;

    async fn reviews(&self, filter: &ReportFilter) -> Result<Vec<CodeReviewRecord>>;

    async fn subtasks(&self, filter: &ReportFilter) -> Result<Vec<SubtaskRecord>>;

    async fn transitions(&self, filter: &ReportFilter) -> Result<Vec<RoleTransition>>;
}

/// Structured sink for report-generation events. Passed into the engine at
/// composition time; there is no process-global logging state in the core.
pub trait ReportObserver: Send + Sync {
    /// A metric group's fetch or computation failed and its zero-valued
    /// default was substituted.
    fn on_group_fallback(&self, group: &str, cause: &str) {
        let _ = (group, cause);
    }

    /// A report finished assembling.
    fn on_assembled(&self, report_type: &str, degraded_groups: usize) {
        let _ = (report_type, degraded_groups);
    }
}

/// Observer that discards everything.
pub struct NoopObserver;

impl ReportObserver for NoopObserver {}

/// Observer that forwards to the `log` facade. What the binary wires in.
pub struct LogObserver;

impl ReportObserver for LogObserver {
    fn on_group_fallback(&self, group: &str, cause: &str) {
        log::warn!("metric group '{group}' fell back to defaults: {cause}");
    }

    fn on_assembled(&self, report_type: &str, degraded_groups: usize) {
        if degraded_groups > 0 {
            log::warn!("{report_type} report assembled with {degraded_groups} degraded group(s)");
        } else {
            log::info!("{report_type} report assembled");
        }
    }
}
