use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::domain::{ActivityLog, LogRange, LogTotals, ValidLog};
use crate::ids::{AccountId, InternId, LogId};
use crate::internship::interns::InternQuery;
use crate::internship::review::{ReviewStatus, Verdict};
use crate::storage::{parse_column, RepositoryError, SqliteStore};

/// Storage abstraction for daily activity logs.
pub trait LogbookRepository: Send + Sync {
    fn insert_log(
        &self,
        intern_id: InternId,
        log: &ValidLog,
        now: DateTime<Utc>,
    ) -> Result<ActivityLog, RepositoryError>;
    /// Only pending entries change; reviewed ones yield `Conflict`.
    fn update_log(&self, id: LogId, log: &ValidLog) -> Result<ActivityLog, RepositoryError>;
    fn delete_log(&self, id: LogId) -> Result<(), RepositoryError>;
    fn fetch_log(&self, id: LogId) -> Result<Option<ActivityLog>, RepositoryError>;
    /// Entries in date order.
    fn list_logs(
        &self,
        intern_id: InternId,
        range: &LogRange,
    ) -> Result<Vec<ActivityLog>, RepositoryError>;
    /// Settles a pending entry; one already reviewed yields `Conflict`.
    fn record_log_review(
        &self,
        id: LogId,
        verdict: &Verdict,
        reviewer: AccountId,
        now: DateTime<Utc>,
    ) -> Result<ActivityLog, RepositoryError>;
    fn log_totals(&self, intern_id: InternId) -> Result<LogTotals, RepositoryError>;
    fn count_pending_logs(&self, scope: &InternQuery) -> Result<u32, RepositoryError>;
}

const LOG_COLUMNS: &str = "id, intern_id, log_date, time_in, time_out, break_minutes, \
     worked_minutes, activities, status, remarks, reviewed_by, created_at, reviewed_at";

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<ActivityLog> {
    Ok(ActivityLog {
        id: row.get(0)?,
        intern_id: row.get(1)?,
        log_date: row.get(2)?,
        time_in: row.get(3)?,
        time_out: row.get(4)?,
        break_minutes: row.get(5)?,
        worked_minutes: row.get(6)?,
        activities: row.get(7)?,
        status: parse_column(row, 8)?,
        remarks: row.get(9)?,
        reviewed_by: row.get(10)?,
        created_at: row.get(11)?,
        reviewed_at: row.get(12)?,
    })
}

impl LogbookRepository for SqliteStore {
    fn insert_log(
        &self,
        intern_id: InternId,
        log: &ValidLog,
        now: DateTime<Utc>,
    ) -> Result<ActivityLog, RepositoryError> {
        let id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO activity_logs (intern_id, log_date, time_in, time_out, break_minutes, \
                 worked_minutes, activities, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    intern_id,
                    log.log_date,
                    log.time_in,
                    log.time_out,
                    log.break_minutes,
                    log.worked_minutes,
                    log.activities,
                    ReviewStatus::Pending.as_str(),
                    now,
                ],
            )?;
            Ok(LogId(conn.last_insert_rowid()))
        })?;
        self.fetch_log(id)?.ok_or(RepositoryError::NotFound)
    }

    fn update_log(&self, id: LogId, log: &ValidLog) -> Result<ActivityLog, RepositoryError> {
        let changed = self.with_conn(|conn| {
            conn.execute(
                "UPDATE activity_logs SET log_date = ?2, time_in = ?3, time_out = ?4, \
                 break_minutes = ?5, worked_minutes = ?6, activities = ?7 \
                 WHERE id = ?1 AND status = ?8",
                params![
                    id,
                    log.log_date,
                    log.time_in,
                    log.time_out,
                    log.break_minutes,
                    log.worked_minutes,
                    log.activities,
                    ReviewStatus::Pending.as_str(),
                ],
            )
        })?;
        match self.fetch_log(id)? {
            Some(updated) if changed > 0 => Ok(updated),
            Some(_) => Err(RepositoryError::Conflict),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn delete_log(&self, id: LogId) -> Result<(), RepositoryError> {
        let changed = self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM activity_logs WHERE id = ?1 AND status = ?2",
                params![id, ReviewStatus::Pending.as_str()],
            )
        })?;
        if changed > 0 {
            return Ok(());
        }
        match self.fetch_log(id)? {
            Some(_) => Err(RepositoryError::Conflict),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_log(&self, id: LogId) -> Result<Option<ActivityLog>, RepositoryError> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {LOG_COLUMNS} FROM activity_logs WHERE id = ?1"),
                [id],
                log_from_row,
            )
            .optional()
        })
    }

    fn list_logs(
        &self,
        intern_id: InternId,
        range: &LogRange,
    ) -> Result<Vec<ActivityLog>, RepositoryError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LOG_COLUMNS} FROM activity_logs
                 WHERE intern_id = ?1
                   AND (?2 IS NULL OR log_date >= ?2)
                   AND (?3 IS NULL OR log_date <= ?3)
                   AND (?4 IS NULL OR status = ?4)
                 ORDER BY log_date"
            ))?;
            let rows = stmt.query_map(
                params![
                    intern_id,
                    range.from,
                    range.to,
                    range.status.map(ReviewStatus::as_str),
                ],
                log_from_row,
            )?;
            rows.collect()
        })
    }

    fn record_log_review(
        &self,
        id: LogId,
        verdict: &Verdict,
        reviewer: AccountId,
        now: DateTime<Utc>,
    ) -> Result<ActivityLog, RepositoryError> {
        let changed = self.with_conn(|conn| {
            conn.execute(
                "UPDATE activity_logs SET status = ?2, remarks = ?3, reviewed_by = ?4, \
                 reviewed_at = ?5 WHERE id = ?1 AND status = ?6",
                params![
                    id,
                    verdict.status.as_str(),
                    verdict.remarks,
                    reviewer,
                    now,
                    ReviewStatus::Pending.as_str(),
                ],
            )
        })?;
        match self.fetch_log(id)? {
            Some(log) if changed > 0 => Ok(log),
            Some(_) => Err(RepositoryError::Conflict),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn log_totals(&self, intern_id: InternId) -> Result<LogTotals, RepositoryError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT
                    COALESCE(SUM(CASE WHEN status = ?2 THEN worked_minutes END), 0),
                    COALESCE(SUM(CASE WHEN status = ?3 THEN worked_minutes END), 0)
                 FROM activity_logs WHERE intern_id = ?1",
                params![
                    intern_id,
                    ReviewStatus::Approved.as_str(),
                    ReviewStatus::Pending.as_str(),
                ],
                |row| {
                    Ok(LogTotals {
                        approved_minutes: row.get(0)?,
                        pending_minutes: row.get(1)?,
                    })
                },
            )
        })
    }

    fn count_pending_logs(&self, scope: &InternQuery) -> Result<u32, RepositoryError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM activity_logs l JOIN interns i ON i.id = l.intern_id
                 WHERE l.status = ?1
                   AND (?2 IS NULL OR i.program_id = ?2)
                   AND (?3 IS NULL OR i.company_id = ?3)
                   AND (?4 IS NULL OR i.id = ?4)",
                params![
                    ReviewStatus::Pending.as_str(),
                    scope.program_id,
                    scope.company_id,
                    scope.intern_id,
                ],
                |row| row.get(0),
            )
        })
    }
}
