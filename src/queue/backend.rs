// src/queue/backend.rs
//
// Durable queue backend contract and its SQLite implementation.
//
// Delivery semantics: at-least-once. A claim marks the row active and
// counts the attempt inside one immediate transaction, so a job is owned
// by a single local worker at a time; rows left active by a crashed
// worker are requeued and redelivered.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rusqlite::{Row, TransactionBehavior};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::ConnectionPool;
use crate::error::{AppError, AppResult};
use crate::queue::job::{Job, JobPayload, JobState, RetryPolicy};
use crate::repositories::{parse_timestamp, parse_uuid};

// ---------------------------------------------------------------------
// Queue contract
// ---------------------------------------------------------------------
pub trait JobQueue: Send + Sync {
    /// Place a job on the queue, runnable immediately. Returns the job id.
    fn enqueue(&self, payload: JobPayload) -> AppResult<Uuid>;

    /// Atomically claim the next runnable job: the row transitions
    /// queued → active and its attempt counter increments.
    fn claim_ready(&self, now: DateTime<Utc>) -> AppResult<Option<Job>>;

    /// Mark a claimed job as completed.
    fn complete(&self, job_id: Uuid) -> AppResult<()>;

    /// Record a failed attempt. Schedules a retry or dead-letters the job
    /// according to `policy`; returns the resulting state.
    fn fail_attempt(
        &self,
        job_id: Uuid,
        error: &str,
        policy: &RetryPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<JobState>;

    /// Dead-lettered jobs, retained for operator inspection.
    fn list_failed(&self) -> AppResult<Vec<Job>>;

    /// Jobs currently waiting to run.
    fn pending_count(&self) -> AppResult<usize>;

    /// Requeue jobs stuck in the active state since before `older_than`
    /// (a worker died mid-attempt). Returns the number requeued.
    fn requeue_stale_active(&self, older_than: DateTime<Utc>) -> AppResult<usize>;
}

// ---------------------------------------------------------------------
// SQLite Implementation
// ---------------------------------------------------------------------
pub struct SqliteJobQueue {
    pool: Arc<ConnectionPool>,
}

impl SqliteJobQueue {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_job(row: &Row) -> rusqlite::Result<Job> {
        let id_str: String = row.get("id")?;
        let payload_str: String = row.get("payload")?;
        let state_str: String = row.get("state")?;
        let next_run_at_str: String = row.get("next_run_at")?;
        let created_at_str: String = row.get("created_at")?;
        let updated_at_str: String = row.get("updated_at")?;

        let payload: JobPayload = serde_json::from_str(&payload_str).map_err(|e| {
            crate::repositories::conversion_error("payload", &payload_str, &e.to_string())
        })?;

        let state = JobState::from_str(&state_str).ok_or_else(|| {
            crate::repositories::conversion_error("state", &state_str, "unknown job state")
        })?;

        Ok(Job {
            id: parse_uuid("id", &id_str)?,
            payload,
            state,
            attempts: row.get::<_, i64>("attempts")? as u32,
            next_run_at: parse_timestamp("next_run_at", &next_run_at_str)?,
            last_error: row.get("last_error")?,
            created_at: parse_timestamp("created_at", &created_at_str)?,
            updated_at: parse_timestamp("updated_at", &updated_at_str)?,
        })
    }

    fn get_job(conn: &rusqlite::Connection, job_id: Uuid) -> AppResult<Job> {
        let mut stmt = conn.prepare(
            "SELECT id, kind, payload, state, attempts, next_run_at, last_error,
                    created_at, updated_at
             FROM jobs WHERE id = ?1",
        )?;

        let result = stmt.query_row(rusqlite::params![job_id.to_string()], Self::row_to_job);

        match result {
            Ok(job) => Ok(job),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(AppError::NotFound),
            Err(e) => Err(AppError::Database(e)),
        }
    }
}

impl JobQueue for SqliteJobQueue {
    fn enqueue(&self, payload: JobPayload) -> AppResult<Uuid> {
        let conn = self.pool.get()?;
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO jobs (id, kind, payload, state, attempts, next_run_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, 'queued', 0, ?4, ?4, ?4)",
            rusqlite::params![
                id.to_string(),
                payload.kind().as_str(),
                serde_json::to_string(&payload)?,
                now,
            ],
        )?;

        Ok(id)
    }

    fn claim_ready(&self, now: DateTime<Utc>) -> AppResult<Option<Job>> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let candidate: Option<String> = {
            let mut stmt = tx.prepare(
                "SELECT id FROM jobs
                 WHERE state = 'queued' AND next_run_at <= ?1
                 ORDER BY next_run_at, created_at
                 LIMIT 1",
            )?;

            match stmt.query_row(rusqlite::params![now.to_rfc3339()], |row| {
                row.get::<_, String>(0)
            }) {
                Ok(id) => Some(id),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(AppError::Database(e)),
            }
        };

        let Some(id_str) = candidate else {
            return Ok(None);
        };

        tx.execute(
            "UPDATE jobs SET state = 'active', attempts = attempts + 1, updated_at = ?2
             WHERE id = ?1",
            rusqlite::params![id_str, now.to_rfc3339()],
        )?;

        let job = Self::get_job(&tx, parse_uuid("id", &id_str).map_err(AppError::Database)?)?;
        tx.commit()?;

        Ok(Some(job))
    }

    fn complete(&self, job_id: Uuid) -> AppResult<()> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE jobs SET state = 'completed', updated_at = ?2 WHERE id = ?1",
            rusqlite::params![job_id.to_string(), Utc::now().to_rfc3339()],
        )?;

        if changed == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    fn fail_attempt(
        &self,
        job_id: Uuid,
        error: &str,
        policy: &RetryPolicy,
        now: DateTime<Utc>,
    ) -> AppResult<JobState> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let job = Self::get_job(&tx, job_id)?;

        let state = if policy.is_exhausted(job.attempts) {
            tx.execute(
                "UPDATE jobs SET state = 'failed', last_error = ?2, updated_at = ?3
                 WHERE id = ?1",
                rusqlite::params![job_id.to_string(), error, now.to_rfc3339()],
            )?;
            JobState::Failed
        } else {
            let delay = policy.delay_after(job.attempts);
            let next_run_at = now + ChronoDuration::milliseconds(delay.as_millis() as i64);
            tx.execute(
                "UPDATE jobs SET state = 'queued', last_error = ?2, next_run_at = ?3,
                                 updated_at = ?4
                 WHERE id = ?1",
                rusqlite::params![
                    job_id.to_string(),
                    error,
                    next_run_at.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )?;
            JobState::Queued
        };

        tx.commit()?;
        Ok(state)
    }

    fn list_failed(&self) -> AppResult<Vec<Job>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, kind, payload, state, attempts, next_run_at, last_error,
                    created_at, updated_at
             FROM jobs WHERE state = 'failed' ORDER BY updated_at",
        )?;

        let jobs = stmt
            .query_map([], Self::row_to_job)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(jobs)
    }

    fn pending_count(&self) -> AppResult<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE state = 'queued'",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn requeue_stale_active(&self, older_than: DateTime<Utc>) -> AppResult<usize> {
        let conn = self.pool.get()?;
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE jobs SET state = 'queued', next_run_at = ?2, updated_at = ?2
             WHERE state = 'active' AND updated_at < ?1",
            rusqlite::params![older_than.to_rfc3339(), now],
        )?;
        Ok(changed)
    }
}
