use crate::config::AnalysisConfig;
use crate::error::{AnalysisClientError, AnalysisResult};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{json, Value};

/// Where an analysis job stands, as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Pending,
    /// Terminal success; carries the raw result payload.
    Done(Value),
    /// Terminal failure; carries the job's error message.
    Failed(String),
}

/// Status side of the job service.
#[async_trait]
pub trait JobStatusSource: Send + Sync {
    async fn check_status(&self, job_id: &str) -> AnalysisResult<JobStatus>;
}

/// Submission side of the job service.
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    /// Submit a prompt for `ticker`, returning the job id.
    async fn submit(&self, ticker: &str, prompt: &str) -> AnalysisResult<String>;
}

/// Both halves of the job service, usable as one trait object.
pub trait AnalysisJobs: JobSubmitter + JobStatusSource {}

impl<T: JobSubmitter + JobStatusSource> AnalysisJobs for T {}

const DEFAULT_FAILURE: &str = "Analysis job failed";

#[derive(Clone)]
pub struct AnalysisJobClient {
    client: Client,
    config: AnalysisConfig,
}

impl AnalysisJobClient {
    pub fn new(config: AnalysisConfig) -> Self {
        let client = Client::builder()
            .timeout(config.submit_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    pub fn from_env() -> Self {
        Self::new(AnalysisConfig::from_env())
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn status_url(&self, job_id: &str) -> AnalysisResult<Url> {
        let mut url = Url::parse(&self.config.status_base_url).map_err(|e| {
            AnalysisClientError::InvalidRequest(format!("invalid status base URL: {}", e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                AnalysisClientError::InvalidRequest("status base URL cannot take a path".to_string())
            })?
            .pop_if_empty()
            .push("status")
            .push(job_id);
        Ok(url)
    }
}

#[async_trait]
impl JobSubmitter for AnalysisJobClient {
    async fn submit(&self, ticker: &str, prompt: &str) -> AnalysisResult<String> {
        let ticker = ticker.trim().to_uppercase();
        let prompt = prompt.trim();
        if ticker.is_empty() || prompt.is_empty() {
            return Err(AnalysisClientError::InvalidRequest(
                "Prompt and ticker are required".to_string(),
            ));
        }

        tracing::info!("Submitting analysis job for {}", ticker);
        let body = json!({ "prompt": format!("{}, {}", ticker, prompt) });
        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        let document = sniff_submission(status, &text)?;

        let job_id = extract_job_id(&document).ok_or(AnalysisClientError::MissingJobId)?;
        tracing::info!("Analysis job {} accepted for {}", job_id, ticker);
        Ok(job_id)
    }
}

#[async_trait]
impl JobStatusSource for AnalysisJobClient {
    async fn check_status(&self, job_id: &str) -> AnalysisResult<JobStatus> {
        let url = self.status_url(job_id)?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisClientError::Upstream {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        parse_status(&response.text().await?)
    }
}

/// Classify a submission response before trusting it as JSON.
///
/// n8n answers an inactive webhook with an HTML page or a
/// "not registered" message, often with a 404.
fn sniff_submission(status: u16, body: &str) -> AnalysisResult<Value> {
    let trimmed = body.trim_start();
    if trimmed.starts_with("<!DOCTYPE html")
        || trimmed.starts_with("<html")
        || body.contains("webhook is not registered")
        || body.contains("not registered for POST requests")
    {
        return Err(AnalysisClientError::WorkflowNotActivated);
    }

    if !(200..300).contains(&status) {
        return Err(AnalysisClientError::Upstream {
            status,
            body: body.chars().take(200).collect(),
        });
    }

    serde_json::from_str(body).map_err(|e| {
        AnalysisClientError::InvalidResponse(format!("Webhook returned invalid JSON response: {}", e))
    })
}

fn extract_job_id(document: &Value) -> Option<String> {
    let object = match document {
        Value::Array(items) => items.first()?,
        other => other,
    };

    ["jobId", "job_id", "id"]
        .iter()
        .find_map(|key| match object.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

fn parse_status(body: &str) -> AnalysisResult<JobStatus> {
    let mut value: Value = serde_json::from_str(body).map_err(|e| {
        AnalysisClientError::InvalidResponse(format!("Status endpoint returned invalid JSON: {}", e))
    })?;
    if let Value::Array(items) = &mut value {
        value = if items.is_empty() {
            Value::Null
        } else {
            items.swap_remove(0)
        };
    }

    let payload: StatusPayload = serde_json::from_value(value)
        .map_err(|e| AnalysisClientError::InvalidResponse(format!("Unexpected status payload: {}", e)))?;

    let status = payload.status.unwrap_or_default().trim().to_ascii_lowercase();
    match status.as_str() {
        "done" | "completed" | "success" => match payload.result {
            Some(result) if !result.is_null() => Ok(JobStatus::Done(result)),
            _ => Err(AnalysisClientError::InvalidResult(
                "job finished without a result".to_string(),
            )),
        },
        "failed" | "error" => {
            let message = match payload.error {
                Some(Value::String(s)) if !s.trim().is_empty() => s,
                Some(Value::Null) | None => DEFAULT_FAILURE.to_string(),
                Some(Value::String(_)) => DEFAULT_FAILURE.to_string(),
                Some(other) => other.to_string(),
            };
            Ok(JobStatus::Failed(message))
        }
        _ => Ok(JobStatus::Pending),
    }
}
