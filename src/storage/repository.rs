//! Row-level access to the warehouse tables, plus the [`DataSource`]
//! implementation that serves the report engine from SQLite.
//!
//! Filter semantics: the date range scopes each table by its primary
//! timestamp, `task_ref` scopes every table, `owner` and `priority` apply
//! to tasks only, and `mode` constrains the receiving role of delegation
//! events and role transitions.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, params_from_iter, Connection};

use crate::error::Result as CrateResult;
use crate::query::filter::ReportFilter;
use crate::records::{
    CodeReviewRecord, DelegationEvent, RoleTransition, SubtaskRecord, TaskRecord,
};
use crate::source::DataSource;
use crate::storage::Database;

// ── Tasks ──────────────────────────────────────────────────────────

pub fn upsert_task(conn: &Connection, task: &TaskRecord) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO tasks (
            task_id, status, priority, owner, created_at, completed_at,
            redelegation_count, imported_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'))
        ON CONFLICT(task_id) DO UPDATE SET
            status=excluded.status, priority=excluded.priority,
            owner=excluded.owner, created_at=excluded.created_at,
            completed_at=excluded.completed_at,
            redelegation_count=excluded.redelegation_count,
            imported_at=excluded.imported_at",
        params![
            task.id,
            task.status.as_str(),
            task.priority.as_str(),
            task.owner,
            task.created_at.to_rfc3339(),
            task.completed_at.map(|t| t.to_rfc3339()),
            task.redelegation_count,
        ],
    )?;
    Ok(())
}

pub fn tasks_matching(
    conn: &Connection,
    filter: &ReportFilter,
) -> Result<Vec<TaskRecord>, rusqlite::Error> {
    let mut sql = String::from(
        "SELECT task_id, status, priority, owner, created_at, completed_at,
                redelegation_count
         FROM tasks WHERE 1=1",
    );
    let mut args: Vec<String> = Vec::new();
    push_range_clause(&mut sql, &mut args, filter, "created_at");
    push_eq_clause(&mut sql, &mut args, "task_id", filter.task_ref.as_deref());
    push_eq_clause(&mut sql, &mut args, "owner", filter.owner.as_deref());
    push_eq_clause(
        &mut sql,
        &mut args,
        "priority",
        filter.priority.map(|p| p.as_str()),
    );
    sql.push_str(" ORDER BY created_at, task_id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args), |row| {
        Ok(TaskRecord {
            id: row.get(0)?,
            status: parse_column(row.get::<_, String>(1)?, 1)?,
            priority: parse_column(row.get::<_, String>(2)?, 2)?,
            owner: row.get(3)?,
            created_at: parse_ts(row.get::<_, String>(4)?, 4)?,
            completed_at: parse_opt_ts(row.get::<_, Option<String>>(5)?, 5)?,
            redelegation_count: row.get(6)?,
        })
    })?;
    rows.collect()
}

// ── Delegation events ──────────────────────────────────────────────

pub fn upsert_delegation(
    conn: &Connection,
    event: &DelegationEvent,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO delegation_events (
            task_ref, from_role, to_role, delegated_at, success,
            rejection_reason, completed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(task_ref, to_role, delegated_at) DO UPDATE SET
            from_role=excluded.from_role, success=excluded.success,
            rejection_reason=excluded.rejection_reason,
            completed_at=excluded.completed_at",
        params![
            event.task_ref,
            event.from_role,
            event.to_role,
            event.delegated_at.to_rfc3339(),
            event.success as i32,
            event.rejection_reason,
            event.completed_at.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(())
}

pub fn delegations_matching(
    conn: &Connection,
    filter: &ReportFilter,
) -> Result<Vec<DelegationEvent>, rusqlite::Error> {
    let mut sql = String::from(
        "SELECT task_ref, from_role, to_role, delegated_at, success,
                rejection_reason, completed_at
         FROM delegation_events WHERE 1=1",
    );
    let mut args: Vec<String> = Vec::new();
    push_range_clause(&mut sql, &mut args, filter, "delegated_at");
    push_eq_clause(&mut sql, &mut args, "task_ref", filter.task_ref.as_deref());
    push_eq_clause(&mut sql, &mut args, "to_role", filter.mode.as_deref());
    sql.push_str(" ORDER BY delegated_at, task_ref");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args), |row| {
        Ok(DelegationEvent {
            task_ref: row.get(0)?,
            from_role: row.get(1)?,
            to_role: row.get(2)?,
            delegated_at: parse_ts(row.get::<_, String>(3)?, 3)?,
            success: row.get::<_, i32>(4)? != 0,
            rejection_reason: row.get(5)?,
            completed_at: parse_opt_ts(row.get::<_, Option<String>>(6)?, 6)?,
        })
    })?;
    rows.collect()
}

// ── Code reviews ───────────────────────────────────────────────────

pub fn upsert_review(
    conn: &Connection,
    review: &CodeReviewRecord,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO code_reviews (task_ref, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(task_ref, created_at) DO UPDATE SET
            status=excluded.status, updated_at=excluded.updated_at",
        params![
            review.task_ref,
            review.status.as_str(),
            review.created_at.to_rfc3339(),
            review.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn reviews_matching(
    conn: &Connection,
    filter: &ReportFilter,
) -> Result<Vec<CodeReviewRecord>, rusqlite::Error> {
    let mut sql = String::from(
        "SELECT task_ref, status, created_at, updated_at
         FROM code_reviews WHERE 1=1",
    );
    let mut args: Vec<String> = Vec::new();
    push_range_clause(&mut sql, &mut args, filter, "created_at");
    push_eq_clause(&mut sql, &mut args, "task_ref", filter.task_ref.as_deref());
    sql.push_str(" ORDER BY created_at, task_ref");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args), |row| {
        Ok(CodeReviewRecord {
            task_ref: row.get(0)?,
            status: parse_column(row.get::<_, String>(1)?, 1)?,
            created_at: parse_ts(row.get::<_, String>(2)?, 2)?,
            updated_at: parse_ts(row.get::<_, String>(3)?, 3)?,
        })
    })?;
    rows.collect()
}

// ── Subtasks ───────────────────────────────────────────────────────

pub fn upsert_subtask(
    conn: &Connection,
    subtask: &SubtaskRecord,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO subtasks (
            task_ref, plan_ref, batch_id, status, sequence,
            estimated_minutes, started_at, completed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(task_ref, plan_ref, sequence) DO UPDATE SET
            batch_id=excluded.batch_id, status=excluded.status,
            estimated_minutes=excluded.estimated_minutes,
            started_at=excluded.started_at, completed_at=excluded.completed_at",
        params![
            subtask.task_ref,
            subtask.plan_ref,
            subtask.batch_id,
            subtask.status.as_str(),
            subtask.sequence,
            subtask.estimated_minutes,
            subtask.started_at.map(|t| t.to_rfc3339()),
            subtask.completed_at.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(())
}

pub fn subtasks_matching(
    conn: &Connection,
    filter: &ReportFilter,
) -> Result<Vec<SubtaskRecord>, rusqlite::Error> {
    let mut sql = String::from(
        "SELECT task_ref, plan_ref, batch_id, status, sequence,
                estimated_minutes, started_at, completed_at
         FROM subtasks WHERE 1=1",
    );
    let mut args: Vec<String> = Vec::new();
    push_eq_clause(&mut sql, &mut args, "task_ref", filter.task_ref.as_deref());
    sql.push_str(" ORDER BY task_ref, plan_ref, sequence");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args), |row| {
        Ok(SubtaskRecord {
            task_ref: row.get(0)?,
            plan_ref: row.get(1)?,
            batch_id: row.get(2)?,
            status: parse_column(row.get::<_, String>(3)?, 3)?,
            sequence: row.get(4)?,
            estimated_minutes: row.get(5)?,
            started_at: parse_opt_ts(row.get::<_, Option<String>>(6)?, 6)?,
            completed_at: parse_opt_ts(row.get::<_, Option<String>>(7)?, 7)?,
        })
    })?;
    rows.collect()
}

// ── Role transitions ───────────────────────────────────────────────

pub fn upsert_transition(
    conn: &Connection,
    transition: &RoleTransition,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO role_transitions (
            task_ref, from_role, to_role, occurred_at, handoff_hours
        ) VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(task_ref, to_role, occurred_at) DO UPDATE SET
            from_role=excluded.from_role, handoff_hours=excluded.handoff_hours",
        params![
            transition.task_ref,
            transition.from_role,
            transition.to_role,
            transition.occurred_at.to_rfc3339(),
            transition.handoff_hours,
        ],
    )?;
    Ok(())
}

pub fn transitions_matching(
    conn: &Connection,
    filter: &ReportFilter,
) -> Result<Vec<RoleTransition>, rusqlite::Error> {
    let mut sql = String::from(
        "SELECT task_ref, from_role, to_role, occurred_at, handoff_hours
         FROM role_transitions WHERE 1=1",
    );
    let mut args: Vec<String> = Vec::new();
    push_range_clause(&mut sql, &mut args, filter, "occurred_at");
    push_eq_clause(&mut sql, &mut args, "task_ref", filter.task_ref.as_deref());
    push_eq_clause(&mut sql, &mut args, "to_role", filter.mode.as_deref());
    sql.push_str(" ORDER BY occurred_at, task_ref");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(args), |row| {
        Ok(RoleTransition {
            task_ref: row.get(0)?,
            from_role: row.get(1)?,
            to_role: row.get(2)?,
            occurred_at: parse_ts(row.get::<_, String>(3)?, 3)?,
            handoff_hours: row.get(4)?,
        })
    })?;
    rows.collect()
}

// ── Warehouse status ───────────────────────────────────────────────

/// Row counts per table, for the `status` command.
pub fn table_counts(conn: &Connection) -> Result<Vec<(String, i64)>, rusqlite::Error> {
    let tables = [
        "tasks",
        "delegation_events",
        "code_reviews",
        "subtasks",
        "role_transitions",
    ];
    let mut counts = Vec::with_capacity(tables.len());
    for table in tables {
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
        counts.push((table.to_string(), count));
    }
    Ok(counts)
}

// ── Helpers ────────────────────────────────────────────────────────

/// Constrain `column` to the filter's date range. Timestamps are stored in
/// RFC 3339 UTC, so lexical comparison matches chronological order. The end
/// bound is exclusive at midnight of the following day.
fn push_range_clause(
    sql: &mut String,
    args: &mut Vec<String>,
    filter: &ReportFilter,
    column: &str,
) {
    if let Some(range) = filter.date_range {
        let start = range.start.and_hms_opt(0, 0, 0);
        let end = (range.end + Duration::days(1)).and_hms_opt(0, 0, 0);
        if let (Some(start), Some(end)) = (start, end) {
            sql.push_str(&format!(
                " AND {column} >= ?{} AND {column} < ?{}",
                args.len() + 1,
                args.len() + 2
            ));
            args.push(start.and_utc().to_rfc3339());
            args.push(end.and_utc().to_rfc3339());
        }
    }
}

fn push_eq_clause(sql: &mut String, args: &mut Vec<String>, column: &str, value: Option<&str>) {
    if let Some(value) = value {
        sql.push_str(&format!(" AND {column} = ?{}", args.len() + 1));
        args.push(value.to_string());
    }
}

fn parse_ts(raw: String, column: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

fn parse_opt_ts(
    raw: Option<String>,
    column: usize,
) -> Result<Option<DateTime<Utc>>, rusqlite::Error> {
    raw.map(|s| parse_ts(s, column)).transpose()
}

fn parse_column<T: std::str::FromStr<Err = crate::error::Error>>(
    raw: String,
    column: usize,
) -> Result<T, rusqlite::Error> {
    raw.parse().map_err(|e: crate::error::Error| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::other(e.to_string())),
        )
    })
}

// ── DataSource ─────────────────────────────────────────────────────

#[async_trait]
impl DataSource for Database {
    async fn tasks(&self, filter: &ReportFilter) -> CrateResult<Vec<TaskRecord>> {
        let filter = filter.clone();
        Ok(self
            .reader()
            .call(move |conn| tasks_matching(conn, &filter))
            .await?)
    }

    async fn delegations(&self, filter: &ReportFilter) -> CrateResult<Vec<DelegationEvent>> {
        let filter = filter.clone();
        Ok(self
            .reader()
            .call(move |conn| delegations_matching(conn, &filter))
            .await?)
    }

    async fn reviews(&self, filter: &ReportFilter) -> CrateResult<Vec<CodeReviewRecord>> {
        let filter = filter.clone();
        Ok(self
            .reader()
            .call(move |conn| reviews_matching(conn, &filter))
            .await?)
    }

    async fn subtasks(&self, filter: &ReportFilter) -> CrateResult<Vec<SubtaskRecord>> {
        let filter = filter.clone();
        Ok(self
            .reader()
            .call(move |conn| subtasks_matching(conn, &filter))
            .await?)
    }

    async fn transitions(&self, filter: &ReportFilter) -> CrateResult<Vec<RoleTransition>> {
        let filter = filter.clone();
        Ok(self
            .reader()
            .call(move |conn| transitions_matching(conn, &filter))
            .await?)
    }
}
