// src/queue/job.rs
//
// Job types and retry policy.
//
// CRITICAL RULES:
// - Payloads are a tagged union; worker dispatch is exhaustive
// - A NewComicFile job may spawn a ProcessComicSeries job, never the reverse
// - Retry configuration is an explicit value object, not queue-call flags

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::metadata::StandardizedMetadata;

/// Work item payload, one variant per job type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobPayload {
    /// A stabilized add/change was observed on a comic archive file
    NewComicFile {
        file_path: PathBuf,
        library_id: Uuid,
    },

    /// A comic was catalogued in a folder with no series record yet
    ProcessComicSeries {
        series_path: PathBuf,
        comic_id: Uuid,
        /// Standardized metadata of the spawning comic, when available.
        /// Its series title is preferred over the folder-derived name.
        metadata: Option<StandardizedMetadata>,
    },
}

impl JobPayload {
    pub fn kind(&self) -> JobKind {
        match self {
            JobPayload::NewComicFile { .. } => JobKind::NewComicFile,
            JobPayload::ProcessComicSeries { .. } => JobKind::ProcessComicSeries,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobKind {
    NewComicFile,
    ProcessComicSeries,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::NewComicFile => "new_comic_file",
            JobKind::ProcessComicSeries => "process_comic_series",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "new_comic_file" => Some(JobKind::NewComicFile),
            "process_comic_series" => Some(JobKind::ProcessComicSeries),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Queue lifecycle state of a job.
///
/// `Failed` rows remain in the table as the dead letter set, inspectable
/// by an operator; they are never silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Active,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Active => "active",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "queued" => Some(JobState::Queued),
            "active" => Some(JobState::Active),
            "completed" => Some(JobState::Completed),
            "failed" => Some(JobState::Failed),
            _ => None,
        }
    }
}

/// A durable queue entry.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub payload: JobPayload,
    pub state: JobState,

    /// Delivery attempts so far, counted at claim time
    pub attempts: u32,

    /// Earliest time the job may next be claimed
    pub next_run_at: DateTime<Utc>,

    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn kind(&self) -> JobKind {
        self.payload.kind()
    }
}

/// How retry delays grow between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    Fixed,
    Exponential,
}

/// Explicit retry configuration, passed to the queue rather than
/// hardcoded per call site.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delivery attempts before a job is dead-lettered
    pub max_attempts: u32,

    /// Delay after the first failed attempt
    pub backoff_base: Duration,

    pub strategy: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base: Duration::from_secs(2),
            strategy: BackoffStrategy::Exponential,
        }
    }
}

impl RetryPolicy {
    /// Delay before re-running after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.strategy {
            BackoffStrategy::Fixed => self.backoff_base,
            BackoffStrategy::Exponential => {
                // Cap the exponent so the delay stays finite for deep retries
                let exponent = attempt.saturating_sub(1).min(16);
                self.backoff_base * (1u32 << exponent)
            }
        }
    }

    /// True once `attempts` deliveries have failed and no retry remains.
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}
