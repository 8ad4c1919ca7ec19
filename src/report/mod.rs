//! Report assembly: validates a request, gathers the required metric
//! groups concurrently, and merges them into one [`ReportData`].
//!
//! Each metric group is an independent unit of failure isolation: a fetch
//! or computation error inside one group is caught where the group joins,
//! reported to the observer, and replaced by that group's zero-valued
//! default. Only request validation and the final merge can fail a report.

pub mod charts;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::benchmark::{build_benchmark_set, BenchmarkComparison, BenchmarkTargets};
use crate::error::{Error, Result};
use crate::metrics::flow::{flow_metrics, BottleneckThresholds};
use crate::metrics::types::{
    CodeReviewMetrics, DelegationMetrics, FlowMetrics, MetricsBundle, PerformanceMetrics,
    TaskMetrics,
};
use crate::query::filter::{DateRange, ReportFilter};
use crate::records::{Priority, TaskStatus};
use crate::source::{DataSource, NoopObserver, ReportObserver};
use crate::trend::{bucket_by_week, fit_linear_trend, predict, TrendPoint, TrendSeries};

pub use charts::{ChartKind, ChartSeries, ChartSpec};

/// Recognized report types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportType {
    Summary,
    TaskDetail,
    DelegationAnalysis,
    Performance,
    Trends,
    Benchmark,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Summary => "summary",
            ReportType::TaskDetail => "task-detail",
            ReportType::DelegationAnalysis => "delegation-analysis",
            ReportType::Performance => "performance",
            ReportType::Trends => "trends",
            ReportType::Benchmark => "benchmark",
        }
    }
}

impl std::str::FromStr for ReportType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "summary" => Ok(ReportType::Summary),
            "task-detail" => Ok(ReportType::TaskDetail),
            "delegation-analysis" => Ok(ReportType::DelegationAnalysis),
            "performance" => Ok(ReportType::Performance),
            "trends" => Ok(ReportType::Trends),
            "benchmark" => Ok(ReportType::Benchmark),
            other => Err(Error::Validation(format!("unknown report type: {other}"))),
        }
    }
}

/// Metric groups a report type may require. Each group is the unit of
/// concurrent gathering and of failure isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricGroup {
    Tasks,
    Delegations,
    Reviews,
    Performance,
    Flow,
    Trends,
    Benchmarks,
}

impl MetricGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricGroup::Tasks => "tasks",
            MetricGroup::Delegations => "delegations",
            MetricGroup::Reviews => "reviews",
            MetricGroup::Performance => "performance",
            MetricGroup::Flow => "flow",
            MetricGroup::Trends => "trends",
            MetricGroup::Benchmarks => "benchmarks",
        }
    }
}

/// Static description of one report type.
#[derive(Debug, Clone, Copy)]
pub struct ReportSpec {
    pub title: &'static str,
    pub groups: &'static [MetricGroup],
    pub requires_task_id: bool,
}

const SUMMARY_SPEC: ReportSpec = ReportSpec {
    title: "Workflow Summary Report",
    groups: &[
        MetricGroup::Tasks,
        MetricGroup::Delegations,
        MetricGroup::Reviews,
        MetricGroup::Flow,
    ],
    requires_task_id: false,
};
const TASK_DETAIL_SPEC: ReportSpec = ReportSpec {
    title: "Task Detail Report",
    groups: &[
        MetricGroup::Tasks,
        MetricGroup::Delegations,
        MetricGroup::Reviews,
    ],
    requires_task_id: true,
};
const DELEGATION_SPEC: ReportSpec = ReportSpec {
    title: "Delegation Analysis Report",
    groups: &[MetricGroup::Delegations, MetricGroup::Flow],
    requires_task_id: false,
};
const PERFORMANCE_SPEC: ReportSpec = ReportSpec {
    title: "Performance Report",
    groups: &[
        MetricGroup::Tasks,
        MetricGroup::Reviews,
        MetricGroup::Performance,
    ],
    requires_task_id: false,
};
const TRENDS_SPEC: ReportSpec = ReportSpec {
    title: "Trend Report",
    groups: &[MetricGroup::Tasks, MetricGroup::Trends],
    requires_task_id: false,
};
const BENCHMARK_SPEC: ReportSpec = ReportSpec {
    title: "Benchmark Report",
    groups: &[MetricGroup::Tasks, MetricGroup::Benchmarks],
    requires_task_id: false,
};

/// The report-type table: which metric groups each type needs, its display
/// title, and whether a task identifier is mandatory.
pub fn report_spec(report_type: ReportType) -> &'static ReportSpec {
    match report_type {
        ReportType::Summary => &SUMMARY_SPEC,
        ReportType::TaskDetail => &TASK_DETAIL_SPEC,
        ReportType::DelegationAnalysis => &DELEGATION_SPEC,
        ReportType::Performance => &PERFORMANCE_SPEC,
        ReportType::Trends => &TRENDS_SPEC,
        ReportType::Benchmark => &BENCHMARK_SPEC,
    }
}

/// A report request as received from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    pub report_type: ReportType,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub task_id: Option<String>,
    pub owner: Option<String>,
    pub mode: Option<String>,
    pub priority: Option<Priority>,
}

impl ReportRequest {
    pub fn new(report_type: ReportType) -> Self {
        Self {
            report_type,
            start_date: None,
            end_date: None,
            task_id: None,
            owner: None,
            mode: None,
            priority: None,
        }
    }
}

/// The assembled report: always fully populated. Groups whose data was
/// unavailable hold their zero-valued defaults.
#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub title: String,
    pub report_type: ReportType,
    pub generated_at: DateTime<Utc>,
    pub date_range: Option<DateRange>,
    pub filters: ReportFilter,
    pub metrics: MetricsBundle,
    pub flow: FlowMetrics,
    pub trends: Vec<TrendSeries>,
    pub benchmarks: Vec<BenchmarkComparison>,
    pub charts: Vec<ChartSeries>,
    pub recommendations: Vec<String>,
    /// Groups that fell back to defaults during gathering.
    pub degraded_groups: Vec<MetricGroup>,
}

/// Output of one gathering unit.
enum GroupData {
    Tasks(TaskMetrics),
    Delegations(DelegationMetrics),
    Reviews(CodeReviewMetrics),
    Performance(PerformanceMetrics),
    Flow(FlowMetrics),
    Trends(Vec<TrendSeries>),
    Benchmarks(Vec<BenchmarkComparison>),
}

impl GroupData {
    fn default_for(group: MetricGroup) -> Self {
        match group {
            MetricGroup::Tasks => GroupData::Tasks(TaskMetrics::default()),
            MetricGroup::Delegations => GroupData::Delegations(DelegationMetrics::default()),
            MetricGroup::Reviews => GroupData::Reviews(CodeReviewMetrics::default()),
            MetricGroup::Performance => GroupData::Performance(PerformanceMetrics::default()),
            MetricGroup::Flow => GroupData::Flow(FlowMetrics::default()),
            MetricGroup::Trends => GroupData::Trends(Vec::new()),
            MetricGroup::Benchmarks => GroupData::Benchmarks(Vec::new()),
        }
    }
}

/// The analytics engine. Stateless across requests: every call builds its
/// own filter and bundle. Collaborators are wired in explicitly at
/// construction; there is no global registry.
pub struct ReportEngine {
    source: Arc<dyn DataSource>,
    observer: Arc<dyn ReportObserver>,
    thresholds: BottleneckThresholds,
    team_historical: BenchmarkTargets,
    fixed_targets: BenchmarkTargets,
}

impl ReportEngine {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self {
            source,
            observer: Arc::new(NoopObserver),
            thresholds: BottleneckThresholds::default(),
            team_historical: BenchmarkTargets::default(),
            fixed_targets: BenchmarkTargets::default(),
        }
    }

    /// Route group-fallback and assembly events to the given sink.
    pub fn with_observer(mut self, observer: Arc<dyn ReportObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_thresholds(mut self, thresholds: BottleneckThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_team_baseline(mut self, baseline: BenchmarkTargets) -> Self {
        self.team_historical = baseline;
        self
    }

    pub fn with_targets(mut self, targets: BenchmarkTargets) -> Self {
        self.fixed_targets = targets;
        self
    }

    /// Generate a report. Returns either a complete [`ReportData`]
    /// (possibly with zero-valued groups where data was unavailable) or a
    /// single descriptive error, never a partial result.
    pub async fn generate(&self, request: ReportRequest) -> Result<ReportData> {
        // Filtering: validation failures are the only pre-gather aborts.
        let filter = self.build_filter(&request)?;
        let spec = report_spec(request.report_type);

        // Gathering: every required group runs as its own task; a failed
        // group degrades to its default instead of failing the request.
        let mut join_set: JoinSet<(MetricGroup, Result<GroupData>)> = JoinSet::new();
        let mut spawned: HashMap<tokio::task::Id, MetricGroup> = HashMap::new();
        for &group in spec.groups {
            let source = Arc::clone(&self.source);
            let filter = filter.clone();
            let thresholds = self.thresholds.clone();
            let team = self.team_historical.clone();
            let fixed = self.fixed_targets.clone();
            let handle = join_set.spawn(async move {
                let result =
                    gather_group(group, source.as_ref(), &filter, &thresholds, &team, &fixed)
                        .await;
                (group, result)
            });
            spawned.insert(handle.id(), group);
        }

        let mut metrics = MetricsBundle::default();
        let mut flow = FlowMetrics::default();
        let mut trends: Vec<TrendSeries> = Vec::new();
        let mut benchmarks: Vec<BenchmarkComparison> = Vec::new();
        let mut degraded: Vec<MetricGroup> = Vec::new();

        while let Some(joined) = join_set.join_next().await {
            let (group, result) = match joined {
                Ok(pair) => pair,
                // A panicked or aborted task carries no pair; recover the
                // group from the task id so it degrades like any other
                // group failure.
                Err(e) => match spawned.get(&e.id()).copied() {
                    Some(group) => (
                        group,
                        Err(Error::Aggregation(format!("gather task died: {e}"))),
                    ),
                    None => {
                        log::error!("unattributed gather task failed to join: {e}");
                        continue;
                    }
                },
            };
            let data = match result {
                Ok(data) => data,
                Err(e) => {
                    let cause = Error::PartialData {
                        group: group.as_str().to_string(),
                        message: e.to_string(),
                    };
                    self.observer.on_group_fallback(group.as_str(), &cause.to_string());
                    degraded.push(group);
                    GroupData::default_for(group)
                }
            };
            match data {
                GroupData::Tasks(m) => metrics.tasks = m,
                GroupData::Delegations(m) => metrics.delegations = m,
                GroupData::Reviews(m) => metrics.reviews = m,
                GroupData::Performance(m) => metrics.performance = m,
                GroupData::Flow(m) => flow = m,
                GroupData::Trends(series) => trends = series,
                GroupData::Benchmarks(set) => benchmarks = set,
            }
        }

        // Transforming: merge failures are unrecoverable for this request.
        let recommendations =
            crate::recommend::generate_recommendations(&metrics, &flow, &benchmarks);

        let payload = serde_json::json!({
            "metrics": serde_json::to_value(&metrics)
                .map_err(|e| Error::Aggregation(e.to_string()))?,
            "flow": serde_json::to_value(&flow)
                .map_err(|e| Error::Aggregation(e.to_string()))?,
            "trends": serde_json::to_value(&trends)
                .map_err(|e| Error::Aggregation(e.to_string()))?,
            "benchmarks": serde_json::to_value(&benchmarks)
                .map_err(|e| Error::Aggregation(e.to_string()))?,
        });
        let charts = charts::build_charts(request.report_type, &payload);

        self.observer
            .on_assembled(request.report_type.as_str(), degraded.len());

        Ok(ReportData {
            title: spec.title.to_string(),
            report_type: request.report_type,
            generated_at: Utc::now(),
            date_range: filter.date_range,
            filters: filter,
            metrics,
            flow,
            trends,
            benchmarks,
            charts,
            recommendations,
            degraded_groups: degraded,
        })
    }

    /// Filtering phase: validate report-type-specific mandatory inputs and
    /// date ordering, then build the immutable filter.
    fn build_filter(&self, request: &ReportRequest) -> Result<ReportFilter> {
        let spec = report_spec(request.report_type);
        if spec.requires_task_id && request.task_id.is_none() {
            return Err(Error::Validation(format!(
                "report type '{}' requires a task identifier",
                request.report_type.as_str()
            )));
        }

        let date_range = match (request.start_date, request.end_date) {
            (Some(start), Some(end)) => {
                if end < start {
                    return Err(Error::Validation(format!(
                        "end date {end} is before start date {start}"
                    )));
                }
                Some(DateRange::new(start, end))
            }
            (Some(start), None) => {
                // Open-ended ranges close at today.
                Some(DateRange::new(start, chrono::Local::now().date_naive()))
            }
            (None, Some(_)) => {
                return Err(Error::Validation(
                    "an end date requires a start date".into(),
                ));
            }
            (None, None) => None,
        };

        let mut filter = ReportFilter::build(
            date_range,
            request.owner.clone(),
            request.mode.clone(),
            request.priority,
        );
        if let Some(task_id) = &request.task_id {
            filter = filter.with_task_ref(task_id.clone());
        }
        Ok(filter)
    }
}

/// Fetch and compute one metric group. Any error propagates to the caller,
/// which substitutes the group default.
async fn gather_group(
    group: MetricGroup,
    source: &dyn DataSource,
    filter: &ReportFilter,
    thresholds: &BottleneckThresholds,
    team: &BenchmarkTargets,
    fixed: &BenchmarkTargets,
) -> Result<GroupData> {
    match group {
        MetricGroup::Tasks => {
            let tasks = source.tasks(filter).await?;
            Ok(GroupData::Tasks(crate::metrics::task_metrics(&tasks)))
        }
        MetricGroup::Delegations => {
            let events = source.delegations(filter).await?;
            let tasks = source.tasks(filter).await?;
            Ok(GroupData::Delegations(crate::metrics::delegation_metrics(
                &events, &tasks,
            )))
        }
        MetricGroup::Reviews => {
            let reviews = source.reviews(filter).await?;
            Ok(GroupData::Reviews(crate::metrics::review_metrics(&reviews)))
        }
        MetricGroup::Performance => {
            let tasks = source.tasks(filter).await?;
            let events = source.delegations(filter).await?;
            let subtasks = source.subtasks(filter).await?;
            let transitions = source.transitions(filter).await?;
            Ok(GroupData::Performance(crate::metrics::performance_metrics(
                &tasks,
                &events,
                &subtasks,
                &transitions,
            )))
        }
        MetricGroup::Flow => {
            let events = source.delegations(filter).await?;
            let tasks = source.tasks(filter).await?;
            let transitions = source.transitions(filter).await?;
            Ok(GroupData::Flow(flow_metrics(
                &events,
                &tasks,
                &transitions,
                thresholds,
            )))
        }
        MetricGroup::Trends => {
            let tasks = source.tasks(filter).await?;
            Ok(GroupData::Trends(trend_series(&tasks, filter)))
        }
        MetricGroup::Benchmarks => {
            let current = fetch_bundle(source, filter).await?;
            let previous = fetch_bundle(source, &filter.previous_period()).await?;
            Ok(GroupData::Benchmarks(build_benchmark_set(
                &current, &previous, team, fixed,
            )))
        }
    }
}

/// Full bundle for one filter, as the benchmark group needs both the
/// current and the shifted previous period.
async fn fetch_bundle(source: &dyn DataSource, filter: &ReportFilter) -> Result<MetricsBundle> {
    let tasks = source.tasks(filter).await?;
    let events = source.delegations(filter).await?;
    let reviews = source.reviews(filter).await?;
    let subtasks = source.subtasks(filter).await?;
    let transitions = source.transitions(filter).await?;
    Ok(crate::metrics::compute_bundle(
        &tasks,
        &events,
        &reviews,
        &subtasks,
        &transitions,
    ))
}

/// Weekly series for the trends group: created, completed, a fitted trend
/// over completions, and a four-week forecast.
///
/// With no explicit date range the span of the observed records is used;
/// with no records at all the series are empty.
fn trend_series(tasks: &[crate::records::TaskRecord], filter: &ReportFilter) -> Vec<TrendSeries> {
    let range = filter.date_range.or_else(|| {
        let dates: Vec<NaiveDate> = tasks.iter().map(|t| t.created_at.date_naive()).collect();
        match (dates.iter().min(), dates.iter().max()) {
            (Some(min), Some(max)) => Some(DateRange::new(*min, *max)),
            _ => None,
        }
    });
    let Some(range) = range else {
        return Vec::new();
    };

    let created: Vec<NaiveDate> = tasks.iter().map(|t| t.created_at.date_naive()).collect();
    let completed: Vec<NaiveDate> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .filter_map(|t| t.completed_at.map(|at| at.date_naive()))
        .collect();

    let created_series = bucket_by_week("tasks-created", &created, range);
    let completed_series = bucket_by_week("tasks-completed", &completed, range);

    let fitted_values = fit_linear_trend(&completed_series.values());
    let fitted = TrendSeries {
        metric: "tasks-completed-trend".into(),
        points: completed_series
            .points
            .iter()
            .zip(fitted_values)
            .map(|(p, value)| TrendPoint {
                label: p.label.clone(),
                value,
            })
            .collect(),
    };

    let forecast = TrendSeries {
        metric: "tasks-completed-forecast".into(),
        points: predict(&completed_series, 4),
    };

    // Chart paths index this order: created first, completed second.
    let mut series = vec![created_series, completed_series, fitted];
    if !forecast.is_empty() {
        series.push(forecast);
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{
        CodeReviewRecord, DelegationEvent, RoleTransition, SubtaskRecord, TaskRecord,
    };
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
    }

    fn sample_task(id: &str, completed: bool) -> TaskRecord {
        TaskRecord {
            id: id.into(),
            status: if completed {
                TaskStatus::Completed
            } else {
                TaskStatus::InProgress
            },
            priority: Priority::High,
            owner: "alice".into(),
            created_at: ts(1, 0),
            completed_at: completed.then(|| ts(2, 0)),
            redelegation_count: 0,
        }
    }

    /// Data source double: serves canned records, optionally failing
    /// individual record sets.
    #[derive(Default)]
    struct StubSource {
        tasks: Vec<TaskRecord>,
        delegations: Vec<DelegationEvent>,
        fail_delegations: bool,
        fail_tasks: bool,
        panic_reviews: bool,
    }

    #[async_trait]
    impl DataSource for StubSource {
        async fn tasks(&self, _filter: &ReportFilter) -> Result<Vec<TaskRecord>> {
            if self.fail_tasks {
                return Err(Error::Database("tasks table unavailable".into()));
            }
            Ok(self.tasks.clone())
        }

        async fn delegations(&self, _filter: &ReportFilter) -> Result<Vec<DelegationEvent>> {
            if self.fail_delegations {
                return Err(Error::Database("delegations table unavailable".into()));
            }
            Ok(self.delegations.clone())
        }

        async fn reviews(&self, _filter: &ReportFilter) -> Result<Vec<CodeReviewRecord>> {
            if self.panic_reviews {
                panic!("reviews backend is gone");
            }
            Ok(Vec::new())
        }

        async fn subtasks(&self, _filter: &ReportFilter) -> Result<Vec<SubtaskRecord>> {
            Ok(Vec::new())
        }

        async fn transitions(&self, _filter: &ReportFilter) -> Result<Vec<RoleTransition>> {
            Ok(Vec::new())
        }
    }

    /// Observer double that records fallback events.
    #[derive(Default)]
    struct RecordingObserver {
        fallbacks: Mutex<Vec<String>>,
    }

    impl ReportObserver for RecordingObserver {
        fn on_group_fallback(&self, group: &str, _cause: &str) {
            self.fallbacks.lock().unwrap().push(group.to_string());
        }
    }

    #[test]
    fn test_report_type_parsing() {
        assert_eq!(
            "delegation-analysis".parse::<ReportType>().unwrap(),
            ReportType::DelegationAnalysis
        );
        assert!("nonsense".parse::<ReportType>().is_err());
    }

    #[test]
    fn test_report_spec_table() {
        assert!(report_spec(ReportType::TaskDetail).requires_task_id);
        assert!(!report_spec(ReportType::Summary).requires_task_id);
        assert!(report_spec(ReportType::Trends)
            .groups
            .contains(&MetricGroup::Trends));
    }

    #[tokio::test]
    async fn test_task_detail_requires_task_id() {
        let engine = ReportEngine::new(Arc::new(StubSource::default()));
        let err = engine
            .generate(ReportRequest::new(ReportType::TaskDetail))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_end_before_start_rejected() {
        let engine = ReportEngine::new(Arc::new(StubSource::default()));
        let mut request = ReportRequest::new(ReportType::Summary);
        request.start_date = NaiveDate::from_ymd_opt(2025, 3, 10);
        request.end_date = NaiveDate::from_ymd_opt(2025, 3, 1);
        let err = engine.generate(request).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_failed_group_degrades_not_fails() {
        // The delegation fetch fails; the task group must still be fully
        // populated and the request must assemble.
        let source = StubSource {
            tasks: vec![sample_task("t1", true), sample_task("t2", false)],
            fail_delegations: true,
            ..Default::default()
        };
        let observer = Arc::new(RecordingObserver::default());
        let engine =
            ReportEngine::new(Arc::new(source)).with_observer(Arc::clone(&observer) as _);

        let report = engine
            .generate(ReportRequest::new(ReportType::Summary))
            .await
            .unwrap();

        assert_eq!(report.metrics.tasks.total_tasks, 2);
        assert_eq!(report.metrics.tasks.completion_rate, 50.0);
        // Delegations and flow both read delegations, so both degrade.
        assert_eq!(report.metrics.delegations, DelegationMetrics::default());
        assert!(report.degraded_groups.contains(&MetricGroup::Delegations));
        assert!(report.degraded_groups.contains(&MetricGroup::Flow));

        let fallbacks = observer.fallbacks.lock().unwrap();
        assert!(fallbacks.contains(&"delegations".to_string()));
    }

    #[tokio::test]
    async fn test_panicking_group_degrades_and_is_reported() {
        // A panic inside a gather task must be attributed to its group:
        // listed in degraded_groups and surfaced through the observer,
        // exactly like an error return.
        let source = StubSource {
            tasks: vec![sample_task("t1", true)],
            panic_reviews: true,
            ..Default::default()
        };
        let observer = Arc::new(RecordingObserver::default());
        let engine =
            ReportEngine::new(Arc::new(source)).with_observer(Arc::clone(&observer) as _);

        let report = engine
            .generate(ReportRequest::new(ReportType::Summary))
            .await
            .unwrap();

        assert_eq!(report.metrics.tasks.total_tasks, 1);
        assert_eq!(report.metrics.reviews, CodeReviewMetrics::default());
        assert_eq!(report.degraded_groups, vec![MetricGroup::Reviews]);

        let fallbacks = observer.fallbacks.lock().unwrap();
        assert_eq!(fallbacks.as_slice(), ["reviews"]);
    }

    #[tokio::test]
    async fn test_all_groups_failing_still_assembles() {
        let source = StubSource {
            fail_tasks: true,
            fail_delegations: true,
            ..Default::default()
        };
        let engine = ReportEngine::new(Arc::new(source));
        let report = engine
            .generate(ReportRequest::new(ReportType::Summary))
            .await
            .unwrap();

        assert_eq!(report.metrics, MetricsBundle::default());
        // Reviews still succeeded (empty), so not every group degraded.
        assert!(!report.degraded_groups.contains(&MetricGroup::Reviews));
        assert_eq!(report.recommendations.len(), 1);
    }

    #[tokio::test]
    async fn test_summary_report_happy_path() {
        let source = StubSource {
            tasks: vec![
                sample_task("t1", true),
                sample_task("t2", true),
                sample_task("t3", false),
            ],
            delegations: vec![DelegationEvent {
                task_ref: "t1".into(),
                from_role: "orchestrator".into(),
                to_role: "coder".into(),
                delegated_at: ts(1, 2),
                success: true,
                rejection_reason: None,
                completed_at: Some(ts(1, 8)),
            }],
            ..Default::default()
        };
        let engine = ReportEngine::new(Arc::new(source));
        let report = engine
            .generate(ReportRequest::new(ReportType::Summary))
            .await
            .unwrap();

        assert_eq!(report.title, "Workflow Summary Report");
        assert!(report.degraded_groups.is_empty());
        assert_eq!(report.metrics.tasks.total_tasks, 3);
        assert_eq!(report.metrics.delegations.total_delegations, 1);
        assert_eq!(report.flow.total_flows, 1);
        assert!(!report.charts.is_empty());
        assert!(!report.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_trends_report_series_order() {
        let source = StubSource {
            tasks: vec![sample_task("t1", true), sample_task("t2", true)],
            ..Default::default()
        };
        let engine = ReportEngine::new(Arc::new(source));
        let mut request = ReportRequest::new(ReportType::Trends);
        request.start_date = NaiveDate::from_ymd_opt(2025, 3, 1);
        request.end_date = NaiveDate::from_ymd_opt(2025, 3, 28);
        let report = engine.generate(request).await.unwrap();

        assert_eq!(report.trends[0].metric, "tasks-created");
        assert_eq!(report.trends[1].metric, "tasks-completed");
        assert_eq!(report.trends[0].points.len(), 4);
        // Charts picked up the weekly series.
        assert!(report
            .charts
            .iter()
            .any(|c| c.name == "tasks-created-weekly"));
    }

    #[tokio::test]
    async fn test_benchmark_report_includes_comparisons() {
        let source = StubSource {
            tasks: vec![sample_task("t1", true)],
            ..Default::default()
        };
        let engine = ReportEngine::new(Arc::new(source));
        let mut request = ReportRequest::new(ReportType::Benchmark);
        request.start_date = NaiveDate::from_ymd_opt(2025, 3, 1);
        request.end_date = NaiveDate::from_ymd_opt(2025, 3, 31);
        let report = engine.generate(request).await.unwrap();

        assert_eq!(report.benchmarks.len(), 12);
        assert!(report
            .benchmarks
            .iter()
            .any(|b| b.baseline == "previous-period"));
    }
}
