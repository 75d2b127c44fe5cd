use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisClientError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("N8N webhook not activated. Please go to your N8N workflow and click \"Execute workflow\" to activate the webhook in test mode.")]
    WorkflowNotActivated,

    #[error("Analysis service returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Analysis service did not return a job id")]
    MissingJobId,

    #[error("{0}")]
    JobFailed(String),

    #[error("Could not parse analysis result: {0}")]
    InvalidResult(String),

    #[error("Analysis cancelled")]
    Cancelled,
}

impl AnalysisClientError {
    /// A failed status check (not a failed job). Polling retries these.
    pub fn is_transient(&self) -> bool {
        match self {
            AnalysisClientError::RequestFailed(e) => !e.is_decode(),
            AnalysisClientError::Upstream { .. } => true,
            _ => false,
        }
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisClientError>;
