use crate::client::{JobStatus, JobStatusSource};
use crate::error::{AnalysisClientError, AnalysisResult};
use crate::normalize::AnalysisReport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};

/// When to check a job: once after `initial_delay`, then every `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub initial_delay: Duration,
    pub interval: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(60),
            interval: Duration::from_secs(10),
        }
    }
}

/// Handle to one job's poll loop.
///
/// The loop holds at most one timer at a time. Cancelling (or dropping the
/// handle) stops the timer; a status response that lands after cancellation
/// is discarded.
pub struct PollTask {
    job_id: String,
    cancel: watch::Sender<bool>,
    outcome: Option<oneshot::Receiver<AnalysisResult<AnalysisReport>>>,
}

impl PollTask {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn cancel(&self) {
        if !self.is_cancelled() {
            tracing::debug!("Cancelling poll for job {}", self.job_id);
            self.cancel.send_replace(true);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Wait for the job to reach a terminal state.
    pub async fn wait(&mut self) -> AnalysisResult<AnalysisReport> {
        let outcome = self.outcome.take().ok_or(AnalysisClientError::Cancelled)?;
        outcome.await.unwrap_or(Err(AnalysisClientError::Cancelled))
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

/// Spawn the poll loop for an already submitted job.
pub fn start_polling<S>(
    source: Arc<S>,
    job_id: String,
    ticker: Option<String>,
    schedule: PollSchedule,
) -> PollTask
where
    S: JobStatusSource + ?Sized + 'static,
{
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let (outcome_tx, outcome_rx) = oneshot::channel();

    tokio::spawn(poll_loop(
        source,
        job_id.clone(),
        ticker,
        schedule,
        cancel_rx,
        outcome_tx,
    ));

    PollTask {
        job_id,
        cancel: cancel_tx,
        outcome: Some(outcome_rx),
    }
}

async fn poll_loop<S>(
    source: Arc<S>,
    job_id: String,
    ticker: Option<String>,
    schedule: PollSchedule,
    mut cancel: watch::Receiver<bool>,
    outcome: oneshot::Sender<AnalysisResult<AnalysisReport>>,
) where
    S: JobStatusSource + ?Sized,
{
    let mut delay = schedule.initial_delay;
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.changed() => {
                tracing::debug!("Poll for job {} cancelled before timer fired", job_id);
                return;
            }
        }
        if *cancel.borrow() {
            return;
        }

        attempt += 1;
        let status = source.check_status(&job_id).await;
        if *cancel.borrow() {
            tracing::debug!("Discarding late status for cancelled job {}", job_id);
            return;
        }

        let result = match status {
            Ok(JobStatus::Pending) => {
                tracing::debug!("Job {} still pending after {} checks", job_id, attempt);
                delay = schedule.interval;
                continue;
            }
            Ok(JobStatus::Done(raw)) => {
                tracing::info!("Job {} done after {} checks", job_id, attempt);
                AnalysisReport::from_result(&raw, ticker.as_deref())
            }
            Ok(JobStatus::Failed(message)) => {
                tracing::warn!("Job {} failed: {}", job_id, message);
                Err(AnalysisClientError::JobFailed(message))
            }
            Err(e) if e.is_transient() => {
                tracing::warn!(
                    "Status check for job {} failed, retrying in {:?}: {}",
                    job_id,
                    schedule.interval,
                    e
                );
                delay = schedule.interval;
                continue;
            }
            Err(e) => {
                tracing::error!(
                    "Status check for job {} returned an unusable payload: {}",
                    job_id,
                    e
                );
                Err(e)
            }
        };

        let _ = outcome.send(result);
        return;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{advance, assert_elapsed, ScriptedJobs, Step};
    use serde_json::json;
    use tokio::time::Instant;

    const SCHEDULE: PollSchedule = PollSchedule {
        initial_delay: Duration::from_secs(60),
        interval: Duration::from_secs(10),
    };

    #[tokio::test(start_paused = true)]
    async fn test_pending_pending_done_polls_three_times() {
        let jobs = Arc::new(ScriptedJobs::default());
        jobs.script(
            "job-1",
            vec![
                Step::Pending,
                Step::Pending,
                Step::Done(json!("{\"MarketSnapshot\":\"Flat open\"}")),
            ],
        );

        let started = Instant::now();
        let mut task = start_polling(
            jobs.clone(),
            "job-1".to_string(),
            Some("TCS".to_string()),
            SCHEDULE,
        );
        let report = task.wait().await.unwrap();

        let calls = jobs.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 3);
        assert_elapsed(calls[0].1 - started, 60);
        assert_elapsed(calls[1].1 - calls[0].1, 10);
        assert_elapsed(calls[2].1 - calls[1].1, 10);

        assert_eq!(report.ticker.as_deref(), Some("TCS"));
        assert_eq!(report.sections.len(), 1);
        assert_eq!(report.sections[0].title, "Market Snapshot");
        assert!(report.overview.is_none());

        advance(60.0).await;
        assert_eq!(jobs.total_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_stops_polling() {
        let jobs = Arc::new(ScriptedJobs::default());
        jobs.script("job-1", vec![Step::Failed("timeout")]);

        let mut task = start_polling(jobs.clone(), "job-1".to_string(), None, SCHEDULE);
        match task.wait().await {
            Err(AnalysisClientError::JobFailed(message)) => assert_eq!(message, "timeout"),
            other => panic!("expected job failure, got {:?}", other),
        }

        advance(120.0).await;
        assert_eq!(jobs.total_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_schedules_one_more_poll() {
        let jobs = Arc::new(ScriptedJobs::default());
        jobs.script("job-1", vec![Step::Unreachable]);

        let task = start_polling(jobs.clone(), "job-1".to_string(), None, SCHEDULE);

        advance(60.5).await;
        assert_eq!(jobs.total_calls(), 1);

        advance(5.0).await;
        assert_eq!(jobs.total_calls(), 1);

        advance(5.0).await;
        assert_eq!(jobs.total_calls(), 2);
        assert!(!task.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_scheduled_poll() {
        let jobs = Arc::new(ScriptedJobs::default());
        let mut task = start_polling(jobs.clone(), "job-1".to_string(), None, SCHEDULE);

        advance(30.0).await;
        task.cancel();
        advance(120.0).await;

        assert_eq!(jobs.total_calls(), 0);
        assert!(matches!(task.wait().await, Err(AnalysisClientError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels() {
        let jobs = Arc::new(ScriptedJobs::default());
        let task = start_polling(jobs.clone(), "job-1".to_string(), None, SCHEDULE);
        drop(task);

        advance(120.0).await;
        assert_eq!(jobs.total_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparseable_result_is_fatal() {
        let jobs = Arc::new(ScriptedJobs::default());
        jobs.script("job-1", vec![Step::Done(json!("<html>oops</html>"))]);

        let mut task = start_polling(jobs.clone(), "job-1".to_string(), None, SCHEDULE);
        assert!(matches!(
            task.wait().await,
            Err(AnalysisClientError::InvalidResult(_))
        ));

        advance(60.0).await;
        assert_eq!(jobs.total_calls(), 1);
    }
}
