use std::time::Duration;

/// Analysis webhook configuration
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Job submission endpoint (POST)
    pub webhook_url: String,
    /// Base for `GET {status_base_url}/status/{job_id}`
    pub status_base_url: String,
    pub initial_delay: Duration,
    pub poll_interval: Duration,
    pub submit_timeout: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            webhook_url: "http://localhost:5678/webhook/stock-analysis".to_string(),
            status_base_url: "http://localhost:5678/webhook".to_string(),
            initial_delay: Duration::from_secs(60),
            poll_interval: Duration::from_secs(10),
            submit_timeout: Duration::from_secs(45),
        }
    }
}

impl AnalysisConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secs = |key: &str, fallback: Duration| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };

        Self {
            webhook_url: std::env::var("ANALYSIS_WEBHOOK_URL").unwrap_or(defaults.webhook_url),
            status_base_url: std::env::var("ANALYSIS_STATUS_BASE_URL")
                .unwrap_or(defaults.status_base_url)
                .trim_end_matches('/')
                .to_string(),
            initial_delay: secs("ANALYSIS_INITIAL_DELAY_SECS", defaults.initial_delay),
            poll_interval: secs("ANALYSIS_POLL_INTERVAL_SECS", defaults.poll_interval),
            submit_timeout: secs("ANALYSIS_SUBMIT_TIMEOUT_SECS", defaults.submit_timeout),
        }
    }

    pub fn schedule(&self) -> crate::PollSchedule {
        crate::PollSchedule {
            initial_delay: self.initial_delay,
            interval: self.poll_interval,
        }
    }
}
