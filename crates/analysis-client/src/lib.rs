//! Client for the long-running stock analysis workflow.
//!
//! A prompt is submitted to a webhook that answers with a job id; the job's
//! status endpoint is then polled until it finishes, and the result document
//! is normalized into display sections.

pub mod client;
pub mod config;
pub mod error;
pub mod normalize;
pub mod poller;
pub mod session;

#[cfg(test)]
mod testing;

pub use client::{AnalysisJobClient, AnalysisJobs, JobStatus, JobStatusSource, JobSubmitter};
pub use config::AnalysisConfig;
pub use error::{AnalysisClientError, AnalysisResult};
pub use normalize::{normalize, unwrap_document, AnalysisReport, AnalysisSection};
pub use poller::{start_polling, PollSchedule, PollTask};
pub use session::AnalysisSession;
