//! Chart-ready series extraction. Each report type has a static table of
//! chart specs; each spec names a dot-path into the serialized report
//! payload. Extraction never fails: a missing path or empty dataset simply
//! omits the chart.

use serde::Serialize;
use serde_json::Value;

use crate::report::ReportType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
}

/// A chart definition: where its data lives in the report payload and how
/// to present it.
#[derive(Debug, Clone, Copy)]
pub struct ChartSpec {
    pub name: &'static str,
    pub kind: ChartKind,
    /// Dot-path into the serialized report payload. Numeric segments index
    /// into arrays.
    pub path: &'static str,
}

/// One chart with its extracted data, ready for a presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub kind: ChartKind,
    pub data: Value,
}

const STATUS_PIE: ChartSpec = ChartSpec {
    name: "tasks-by-status",
    kind: ChartKind::Pie,
    path: "metrics.tasks.by_status",
};
const PRIORITY_BAR: ChartSpec = ChartSpec {
    name: "tasks-by-priority",
    kind: ChartKind::Bar,
    path: "metrics.tasks.by_priority",
};
const OWNER_BAR: ChartSpec = ChartSpec {
    name: "tasks-by-owner",
    kind: ChartKind::Bar,
    path: "metrics.tasks.by_owner",
};
const TRANSITION_BAR: ChartSpec = ChartSpec {
    name: "role-transitions",
    kind: ChartKind::Bar,
    path: "flow.transition_counts",
};
const REJECTION_BAR: ChartSpec = ChartSpec {
    name: "rejection-reasons",
    kind: ChartKind::Bar,
    path: "metrics.delegations.top_rejection_reasons",
};
const REVIEW_PIE: ChartSpec = ChartSpec {
    name: "reviews-by-status",
    kind: ChartKind::Pie,
    path: "metrics.reviews.by_status",
};
const CREATED_TREND: ChartSpec = ChartSpec {
    name: "tasks-created-weekly",
    kind: ChartKind::Line,
    path: "trends.0.points",
};
const COMPLETED_TREND: ChartSpec = ChartSpec {
    name: "tasks-completed-weekly",
    kind: ChartKind::Line,
    path: "trends.1.points",
};
const BENCHMARK_BAR: ChartSpec = ChartSpec {
    name: "benchmark-deltas",
    kind: ChartKind::Bar,
    path: "benchmarks",
};

/// Static chart table per report type.
pub fn chart_specs(report_type: ReportType) -> &'static [ChartSpec] {
    match report_type {
        ReportType::Summary => &[STATUS_PIE, PRIORITY_BAR, TRANSITION_BAR],
        ReportType::TaskDetail => &[STATUS_PIE, REVIEW_PIE],
        ReportType::DelegationAnalysis => &[TRANSITION_BAR, REJECTION_BAR],
        ReportType::Performance => &[OWNER_BAR, PRIORITY_BAR, REVIEW_PIE],
        ReportType::Trends => &[CREATED_TREND, COMPLETED_TREND],
        ReportType::Benchmark => &[BENCHMARK_BAR],
    }
}

/// Walk a dot-path through a JSON value. Numeric segments index arrays.
/// Any missing segment yields `None`; this never panics.
pub fn extract_by_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn is_empty_data(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Build the chart series for a report type from its serialized payload.
/// Charts whose data is missing or empty are omitted rather than rendered
/// empty.
pub fn build_charts(report_type: ReportType, payload: &Value) -> Vec<ChartSeries> {
    chart_specs(report_type)
        .iter()
        .filter_map(|spec| {
            let data = extract_by_path(payload, spec.path)?;
            if is_empty_data(data) {
                return None;
            }
            Some(ChartSeries {
                name: spec.name.to_string(),
                kind: spec.kind,
                data: data.clone(),
            })
        })
        .collect()
}
