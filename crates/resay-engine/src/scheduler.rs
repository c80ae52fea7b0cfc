//! Bounded worker pool with a hard per-job deadline.
//!
//! Directive evaluation runs off the ingestion path so one slow pattern
//! cannot stall intake of new chat lines. The caller waits at most the
//! deadline; past it the job is cancelled cooperatively and abandoned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task;
use tokio::time::timeout;
use tracing::{error, warn};

use crate::history::Utterance;

/// Cancellation flag threaded through the matching loop. Honoured at
/// checkpoints inside the scan, never a forced stop: after the deadline the
/// worker may run briefly until it next checks the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, PartialEq)]
pub enum JobOutcome {
    /// The job finished inside the deadline. `None` means no eligible entry.
    Completed(Option<Utterance>),
    /// Deadline expired; cancellation was signalled and the result, if one
    /// ever arrives, is discarded. Timed-out jobs are not resubmitted.
    CancelledAfterDeadline,
}

/// Who asked for what. Carried alongside the job purely so a timeout can be
/// logged with enough context to identify abuse.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub corrector: String,
    pub directive: String,
}

pub struct Scheduler {
    permits: Arc<Semaphore>,
    deadline: Duration,
}

impl Scheduler {
    pub fn new(workers: usize, deadline: Duration) -> Self {
        Scheduler {
            permits: Arc::new(Semaphore::new(workers.max(1))),
            deadline,
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run `work` on the pool and wait for it, but never longer than the
    /// deadline. The pool permit travels into the worker, so a timed-out job
    /// keeps its slot until it actually observes cancellation and returns.
    pub async fn submit<F>(&self, ctx: JobContext, work: F) -> JobOutcome
    where
        F: FnOnce(&CancelToken) -> Option<Utterance> + Send + 'static,
    {
        let token = CancelToken::new();
        let worker_token = token.clone();
        let permits = self.permits.clone();

        let run = async move {
            let permit = permits
                .acquire_owned()
                .await
                .expect("scheduler semaphore is never closed");
            task::spawn_blocking(move || {
                let _permit = permit;
                work(&worker_token)
            })
            .await
        };

        match timeout(self.deadline, run).await {
            Ok(Ok(result)) => JobOutcome::Completed(result),
            Ok(Err(join_err)) => {
                error!(
                    corrector = %ctx.corrector,
                    directive = %ctx.directive,
                    error = %join_err,
                    "correction worker failed"
                );
                JobOutcome::Completed(None)
            }
            Err(_) => {
                token.cancel();
                warn!(
                    corrector = %ctx.corrector,
                    directive = %ctx.directive,
                    deadline_ms = self.deadline.as_millis() as u64,
                    "correction exceeded its deadline; cancellation requested"
                );
                JobOutcome::CancelledAfterDeadline
            }
        }
    }
}
