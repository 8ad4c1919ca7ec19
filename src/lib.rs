pub mod benchmark;
pub mod date_util;
pub mod error;
pub mod metrics;
pub mod query;
pub mod recommend;
pub mod records;
pub mod report;
pub mod source;
pub mod storage;
pub mod trend;

use std::sync::Arc;

use serde::Deserialize;

pub use benchmark::{BenchmarkComparison, BenchmarkTargets};
pub use error::{Error, Result};
pub use metrics::flow::BottleneckThresholds;
pub use metrics::types::{
    CodeReviewMetrics, DelegationMetrics, FlowMetrics, MetricsBundle, PerformanceMetrics,
    TaskMetrics,
};
pub use query::{DateRange, Period, ReportFilter};
pub use records::{
    CodeReviewRecord, DelegationEvent, Priority, ReviewStatus, RoleTransition, SubtaskRecord,
    TaskRecord, TaskStatus,
};
pub use report::{ReportData, ReportEngine, ReportRequest, ReportType};
pub use source::{DataSource, LogObserver, NoopObserver, ReportObserver};
pub use storage::Database;
pub use trend::{TrendPoint, TrendSeries};

use storage::repository;

/// One batch of workflow records as exported by the execution system.
/// All sections are optional; absent sections import nothing.
#[derive(Debug, Default, Deserialize)]
pub struct ImportBundle {
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(default)]
    pub delegations: Vec<DelegationEvent>,
    #[serde(default)]
    pub reviews: Vec<CodeReviewRecord>,
    #[serde(default)]
    pub subtasks: Vec<SubtaskRecord>,
    #[serde(default)]
    pub transitions: Vec<RoleTransition>,
}

impl ImportBundle {
    pub fn len(&self) -> usize {
        self.tasks.len()
            + self.delegations.len()
            + self.reviews.len()
            + self.subtasks.len()
            + self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Main entry point for the workflow analytics warehouse.
pub struct FlowDW {
    db: Database,
    engine: ReportEngine,
}

impl FlowDW {
    pub fn new(db: Database) -> Self {
        let engine = ReportEngine::new(Arc::new(db.clone()))
            .with_observer(Arc::new(LogObserver));
        Self { db, engine }
    }

    /// Access the database (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Generate a report against the warehouse.
    pub async fn report(&self, request: ReportRequest) -> Result<ReportData> {
        self.engine.generate(request).await
    }

    /// Import a record batch. Re-importing the same batch updates rows in
    /// place. Returns the number of records written.
    pub async fn import(&self, bundle: ImportBundle) -> Result<usize> {
        let count = bundle.len();
        self.db
            .writer()
            .call(move |conn| {
                let tx = conn.transaction()?;
                for task in &bundle.tasks {
                    repository::upsert_task(&tx, task)?;
                }
                for event in &bundle.delegations {
                    repository::upsert_delegation(&tx, event)?;
                }
                for review in &bundle.reviews {
                    repository::upsert_review(&tx, review)?;
                }
                for subtask in &bundle.subtasks {
                    repository::upsert_subtask(&tx, subtask)?;
                }
                for transition in &bundle.transitions {
                    repository::upsert_transition(&tx, transition)?;
                }
                tx.commit()?;
                Ok::<(), rusqlite::Error>(())
            })
            .await?;
        log::info!("imported {count} records");
        Ok(count)
    }

    /// Row counts per warehouse table.
    pub async fn status(&self) -> Result<Vec<(String, i64)>> {
        self.db
            .reader()
            .call(|conn| repository::table_counts(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_import_then_report() {
        let db = Database::open_memory().await.unwrap();
        let dw = FlowDW::new(db);

        let bundle = ImportBundle {
            tasks: vec![TaskRecord {
                id: "t1".into(),
                status: TaskStatus::Completed,
                priority: Priority::High,
                owner: "alice".into(),
                created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
                completed_at: Some(Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap()),
                redelegation_count: 0,
            }],
            delegations: vec![DelegationEvent {
                task_ref: "t1".into(),
                from_role: "orchestrator".into(),
                to_role: "coder".into(),
                delegated_at: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
                success: true,
                rejection_reason: None,
                completed_at: Some(Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).unwrap()),
            }],
            ..Default::default()
        };
        assert_eq!(dw.import(bundle).await.unwrap(), 2);

        let report = dw
            .report(ReportRequest::new(ReportType::Summary))
            .await
            .unwrap();
        assert_eq!(report.metrics.tasks.total_tasks, 1);
        assert_eq!(report.metrics.tasks.completion_rate, 100.0);
        assert_eq!(report.metrics.delegations.total_delegations, 1);
        assert!(report.degraded_groups.is_empty());

        let counts = dw.status().await.unwrap();
        assert!(counts.contains(&("tasks".to_string(), 1)));
        assert!(counts.contains(&("delegation_events".to_string(), 1)));
    }

    #[tokio::test]
    async fn test_reimport_is_idempotent() {
        let db = Database::open_memory().await.unwrap();
        let dw = FlowDW::new(db);

        let task = TaskRecord {
            id: "t1".into(),
            status: TaskStatus::InProgress,
            priority: Priority::Low,
            owner: "bob".into(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
            completed_at: None,
            redelegation_count: 0,
        };
        dw.import(ImportBundle {
            tasks: vec![task.clone()],
            ..Default::default()
        })
        .await
        .unwrap();
        dw.import(ImportBundle {
            tasks: vec![task],
            ..Default::default()
        })
        .await
        .unwrap();

        let counts = dw.status().await.unwrap();
        assert!(counts.contains(&("tasks".to_string(), 1)));
    }
}
