use crate::client::{JobStatusSource, JobSubmitter};
use crate::error::{AnalysisClientError, AnalysisResult};
use crate::normalize::AnalysisReport;
use crate::poller::{start_polling, PollSchedule, PollTask};
use std::sync::Arc;

/// One caller's analysis flow: at most one job is polled at a time.
///
/// Starting a new analysis cancels the previous poll before the new job is
/// submitted, so a stale job can never overwrite fresh state.
pub struct AnalysisSession<C> {
    client: Arc<C>,
    schedule: PollSchedule,
    current: Option<PollTask>,
}

impl<C> AnalysisSession<C>
where
    C: JobSubmitter + JobStatusSource + 'static,
{
    pub fn new(client: Arc<C>, schedule: PollSchedule) -> Self {
        Self {
            client,
            schedule,
            current: None,
        }
    }

    /// Submit a new analysis, superseding any in-flight one. Returns the job id.
    pub async fn start(&mut self, ticker: &str, prompt: &str) -> AnalysisResult<String> {
        self.cancel();

        let job_id = self.client.submit(ticker, prompt).await?;
        let task = start_polling(
            self.client.clone(),
            job_id.clone(),
            Some(ticker.trim().to_uppercase()),
            self.schedule,
        );
        self.current = Some(task);
        Ok(job_id)
    }

    pub fn current_job(&self) -> Option<&str> {
        self.current.as_ref().map(PollTask::job_id)
    }

    /// Stop polling the current job, if any.
    pub fn cancel(&mut self) {
        if let Some(task) = self.current.take() {
            tracing::info!("Abandoning analysis job {}", task.job_id());
            task.cancel();
        }
    }

    /// Wait for the current job's outcome.
    pub async fn wait(&mut self) -> AnalysisResult<AnalysisReport> {
        let task = self.current.as_mut().ok_or(AnalysisClientError::Cancelled)?;
        let outcome = task.wait().await;
        self.current = None;
        outcome
    }
}

impl<C> Drop for AnalysisSession<C> {
    fn drop(&mut self) {
        if let Some(task) = self.current.take() {
            task.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{advance, ScriptedJobs, Step};
    use serde_json::json;
    use std::time::Duration;

    const SCHEDULE: PollSchedule = PollSchedule {
        initial_delay: Duration::from_secs(10),
        interval: Duration::from_secs(10),
    };

    #[tokio::test(start_paused = true)]
    async fn test_second_request_cancels_first() {
        let jobs = Arc::new(ScriptedJobs::default());
        let mut session = AnalysisSession::new(jobs.clone(), SCHEDULE);

        let first = session.start("infy", "trend?").await.unwrap();
        let second = session.start("tcs", "risk?").await.unwrap();
        assert_eq!(first, "job-1");
        assert_eq!(second, "job-2");
        assert_eq!(session.current_job(), Some("job-2"));

        advance(10.5).await;
        assert_eq!(jobs.total_calls(), 1);
        assert_eq!(jobs.calls_for("job-2"), 1);
        assert_eq!(jobs.calls_for("job-1"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_while_polling() {
        let jobs = Arc::new(ScriptedJobs::default());
        let mut session = AnalysisSession::new(jobs.clone(), SCHEDULE);

        session.start("INFY", "trend?").await.unwrap();
        advance(25.0).await;
        assert_eq!(jobs.calls_for("job-1"), 2);

        session.start("TCS", "risk?").await.unwrap();
        advance(10.5).await;
        assert_eq!(jobs.calls_for("job-1"), 2);
        assert_eq!(jobs.calls_for("job-2"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_returns_report() {
        let jobs = Arc::new(ScriptedJobs::default());
        jobs.script(
            "job-1",
            vec![
                Step::Pending,
                Step::Done(json!({"output": "{\"overview\":\"Range bound\"}"})),
            ],
        );
        let mut session = AnalysisSession::new(jobs.clone(), SCHEDULE);

        session.start("reliance", "outlook").await.unwrap();
        let report = session.wait().await.unwrap();

        assert_eq!(report.ticker.as_deref(), Some("RELIANCE"));
        assert_eq!(report.overview.as_deref(), Some("Range bound"));
        assert!(session.current_job().is_none());
        assert_eq!(
            jobs.submissions.lock().unwrap()[0],
            ("reliance".to_string(), "outlook".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_submission_leaves_no_task() {
        let jobs = Arc::new(ScriptedJobs::default());
        let mut session = AnalysisSession::new(jobs.clone(), SCHEDULE);

        session.start("INFY", "trend?").await.unwrap();
        assert!(session.start("  ", "trend?").await.is_err());
        assert!(session.current_job().is_none());

        advance(30.0).await;
        assert_eq!(jobs.total_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_then_wait() {
        let jobs = Arc::new(ScriptedJobs::default());
        let mut session = AnalysisSession::new(jobs.clone(), SCHEDULE);

        session.start("INFY", "trend?").await.unwrap();
        session.cancel();
        assert!(matches!(
            session.wait().await,
            Err(AnalysisClientError::Cancelled)
        ));

        advance(30.0).await;
        assert_eq!(jobs.total_calls(), 0);
    }
}
