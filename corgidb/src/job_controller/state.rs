//! State of background reconciliation jobs.
//!
//! - `JobsState` is shared with every handler as `web::Data`.
//! - Workers report through `JobReporter`, which pushes `JobUpdate`s onto an
//!   MPSC channel.
//! - `start_job_updater` drains that channel into the shared map.

use common::jobs::JobStatus;
use log::{debug, error, info};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// Shared job table plus the sender workers report through.
#[derive(Clone)]
pub struct JobsState {
    /// Job id to its latest status. Read by the status endpoint, written by
    /// `start_job_updater`.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    /// A state plus the receiver to hand to [`start_job_updater`].
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(capacity);
        let state = Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

/// Handle a blocking worker uses to report progress.
#[derive(Clone)]
pub struct JobReporter {
    job_id: String,
    tx: mpsc::Sender<JobUpdate>,
}

impl JobReporter {
    /// Must only be called from a blocking thread. Returns false once the
    /// updater has stopped listening.
    pub fn progress(&self, done: u32) -> bool {
        let update = JobUpdate {
            job_id: self.job_id.clone(),
            status: JobStatus::InProgress(done),
        };
        match self.tx.blocking_send(update) {
            Ok(()) => true,
            Err(e) => {
                debug!("Progress for job {} dropped: {}", self.job_id, e);
                false
            }
        }
    }
}

/// Drains job updates into the shared map until every sender is gone.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        jobs.insert(update.job_id.clone(), update.status);
    }
}

/// Registers a job as `Pending`, runs `work` on the blocking pool and records
/// its outcome. Returns the job id immediately.
pub async fn schedule_blocking_job<F>(state: &JobsState, work: F) -> String
where
    F: FnOnce(JobReporter) -> Result<String, String> + Send + 'static,
{
    let job_id = uuid::Uuid::new_v4().to_string();
    state
        .jobs
        .write()
        .await
        .insert(job_id.clone(), JobStatus::Pending);

    let reporter = JobReporter {
        job_id: job_id.clone(),
        tx: state.tx.clone(),
    };
    let tx = state.tx.clone();
    let id = job_id.clone();

    tokio::spawn(async move {
        let handle = tokio::task::spawn_blocking(move || work(reporter));
        let status = match handle.await {
            Ok(Ok(summary)) => {
                info!("Job {} completed: {}", id, summary);
                JobStatus::Completed(summary)
            }
            Ok(Err(e)) => {
                error!("Job {} failed: {}", id, e);
                JobStatus::Failed(e)
            }
            Err(join_err) => {
                error!("Job {} panicked: {}", id, join_err);
                JobStatus::Failed(format!("join error: {}", join_err))
            }
        };
        // Queued behind every progress update of this job.
        if let Err(e) = tx.send(JobUpdate { job_id: id, status }).await {
            debug!("Final status for job {} dropped: {}", e.0.job_id, e);
        }
    });

    job_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn wait_for_end(state: &JobsState, job_id: &str) -> JobStatus {
        for _ in 0..200 {
            match state.status(job_id).await {
                Some(JobStatus::Pending) | Some(JobStatus::InProgress(_)) | None => {
                    tokio::time::sleep(Duration::from_millis(10)).await
                }
                Some(done) => return done,
            }
        }
        panic!("job {} did not finish", job_id);
    }

    #[actix_web::test]
    async fn job_outcome_is_recorded() {
        let (state, rx) = JobsState::new(16);
        tokio::spawn(start_job_updater(state.clone(), rx));

        let ok = schedule_blocking_job(&state, |reporter| {
            reporter.progress(1);
            Ok("1 statement(s)".to_string())
        })
        .await;
        let failed = schedule_blocking_job(&state, |_| Err("rejected".to_string())).await;

        assert_eq!(
            wait_for_end(&state, &ok).await,
            JobStatus::Completed("1 statement(s)".to_string())
        );
        assert_eq!(
            wait_for_end(&state, &failed).await,
            JobStatus::Failed("rejected".to_string())
        );
    }

    #[actix_web::test]
    async fn progress_after_updater_stops_is_dropped() {
        let (state, rx) = JobsState::new(1);
        drop(rx);
        let reporter = JobReporter {
            job_id: "orphan".to_string(),
            tx: state.tx.clone(),
        };
        let delivered = tokio::task::spawn_blocking(move || reporter.progress(3))
            .await
            .unwrap();
        assert!(!delivered);
        assert_eq!(state.status("orphan").await, None);
    }
}
