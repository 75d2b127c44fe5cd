//! Scripted job service shared by the poller and session tests.

use crate::client::{JobStatus, JobStatusSource, JobSubmitter};
use crate::error::{AnalysisClientError, AnalysisResult};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub(crate) enum Step {
    Pending,
    Done(serde_json::Value),
    Failed(&'static str),
    Unreachable,
}

/// Job service double. Unscripted checks report pending; submissions hand
/// out `job-1`, `job-2`, ...
#[derive(Default)]
pub(crate) struct ScriptedJobs {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    pub(crate) calls: Mutex<Vec<(String, Instant)>>,
    pub(crate) submissions: Mutex<Vec<(String, String)>>,
    next_job: AtomicU32,
}

impl ScriptedJobs {
    pub(crate) fn script(&self, job_id: &str, steps: Vec<Step>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(job_id.to_string(), steps.into());
    }

    pub(crate) fn calls_for(&self, job_id: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == job_id)
            .count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl JobStatusSource for ScriptedJobs {
    async fn check_status(&self, job_id: &str) -> AnalysisResult<JobStatus> {
        self.calls
            .lock()
            .unwrap()
            .push((job_id.to_string(), Instant::now()));

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(job_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Step::Pending);

        match step {
            Step::Pending => Ok(JobStatus::Pending),
            Step::Done(raw) => Ok(JobStatus::Done(raw)),
            Step::Failed(message) => Ok(JobStatus::Failed(message.to_string())),
            Step::Unreachable => Err(AnalysisClientError::Upstream {
                status: 503,
                body: "connection refused".to_string(),
            }),
        }
    }
}

#[async_trait]
impl JobSubmitter for ScriptedJobs {
    async fn submit(&self, ticker: &str, prompt: &str) -> AnalysisResult<String> {
        if ticker.trim().is_empty() {
            return Err(AnalysisClientError::InvalidRequest(
                "Prompt and ticker are required".to_string(),
            ));
        }
        self.submissions
            .lock()
            .unwrap()
            .push((ticker.to_string(), prompt.to_string()));
        let n = self.next_job.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("job-{}", n))
    }
}

/// Let paused time run forward by `secs`.
pub(crate) async fn advance(secs: f64) {
    tokio::time::sleep(Duration::from_secs_f64(secs)).await;
}

/// Paused-clock timers fire on millisecond ticks; allow for the rounding.
pub(crate) fn assert_elapsed(elapsed: Duration, secs: u64) {
    let expected = Duration::from_secs(secs);
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(5),
        "expected ~{:?}, got {:?}",
        expected,
        elapsed
    );
}
