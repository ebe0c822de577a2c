//! Job ledger collaborator
//!
//! The ledger is the durable owner of job progress: the orchestrator pushes a
//! snapshot after every work unit and polls the cancellation flag at unit
//! boundaries. Implementations must make all three operations cheap; they are
//! called once per unit on the hot path.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// Errors from ledger operations
///
/// Any of these reaching the orchestrator is treated as a job-fatal defect:
/// a crawl whose progress cannot be recorded is not worth continuing.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Unknown job: {0}")]
    UnknownJob(String),

    #[error("Job already finalized: {0}")]
    AlreadyFinalized(String),

    #[error("Ledger backend error: {0}")]
    Backend(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Point-in-time progress of a running job
///
/// `completed_units` is monotonically non-decreasing across the snapshots of
/// one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Work units finished so far (success or failure)
    pub completed_units: usize,

    /// Total work units in the job
    pub total_units: usize,

    /// Site of the unit just finished
    pub current_site: String,

    /// Keyword of the unit just finished
    pub current_keyword: String,

    /// Items found so far, across all units
    pub items_found: usize,
}

impl ProgressSnapshot {
    /// Completion percentage, 0–100
    pub fn percent(&self) -> u8 {
        if self.total_units == 0 {
            return 100;
        }
        ((self.completed_units * 100) / self.total_units) as u8
    }
}

/// How a job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Every work unit was attempted
    Completed,

    /// Cancellation was observed at a unit boundary
    Cancelled,

    /// A collaborator contract violation stopped the job
    Failed,
}

/// Final record of a job, written exactly once
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// Terminal status
    pub status: JobStatus,

    /// Total items handed to the document store
    pub items_found: usize,

    /// Items per site name
    pub per_site_counts: BTreeMap<String, usize>,

    /// Items per keyword
    pub per_keyword_counts: BTreeMap<String, usize>,

    /// Units whose entry page never succeeded, as (site, keyword)
    pub failed_units: Vec<(String, String)>,

    /// Defect description when status is `Failed`
    pub error: Option<String>,

    /// When the job loop started
    pub started_at: DateTime<Utc>,

    /// When the outcome was finalized
    pub finished_at: DateTime<Utc>,
}

/// Durable owner of job state
///
/// All operations take the job id so one ledger can serve many jobs.
pub trait JobLedger {
    /// Whether cancellation has been requested for this job
    fn is_cancelled(&self, job_id: &str) -> LedgerResult<bool>;

    /// Records a progress snapshot
    fn publish_progress(&self, job_id: &str, snapshot: ProgressSnapshot) -> LedgerResult<()>;

    /// Records the final outcome; must be called exactly once per job
    fn finalize(&self, job_id: &str, outcome: JobOutcome) -> LedgerResult<()>;
}

/// In-process ledger for embedding and tests
///
/// Tracks a single job at a time: the cancellation flag is global to the
/// ledger instance and snapshots are keyed only by publish order.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    cancelled: AtomicBool,
    snapshots: Mutex<Vec<ProgressSnapshot>>,
    outcome: Mutex<Option<JobOutcome>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; the orchestrator observes it at the next unit
    /// boundary
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// All snapshots published so far, in order
    pub fn snapshots(&self) -> Vec<ProgressSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }

    /// The finalized outcome, if the job has ended
    pub fn outcome(&self) -> Option<JobOutcome> {
        self.outcome.lock().unwrap().clone()
    }
}

impl JobLedger for InMemoryLedger {
    fn is_cancelled(&self, _job_id: &str) -> LedgerResult<bool> {
        Ok(self.cancelled.load(Ordering::SeqCst))
    }

    fn publish_progress(&self, _job_id: &str, snapshot: ProgressSnapshot) -> LedgerResult<()> {
        self.snapshots.lock().unwrap().push(snapshot);
        Ok(())
    }

    fn finalize(&self, job_id: &str, outcome: JobOutcome) -> LedgerResult<()> {
        let mut slot = self.outcome.lock().unwrap();
        if slot.is_some() {
            return Err(LedgerError::AlreadyFinalized(job_id.to_string()));
        }
        *slot = Some(outcome);
        Ok(())
    }
}
