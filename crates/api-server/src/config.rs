use analysis_client::AnalysisConfig;
use anyhow::{Context, Result};
use market_data::SamcoCredentials;

/// Server configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub samco_base_url: String,
    pub yahoo_base_url: String,
    /// `None` runs the quote adapter on Yahoo alone.
    pub samco_credentials: Option<SamcoCredentials>,
    pub analysis: AnalysisConfig,
    pub enable_hsts: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let port = match std::env::var("API_PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("API_PORT must be a port number, got '{}'", raw))?,
            Err(_) => 3000,
        };

        Ok(Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            samco_base_url: std::env::var("SAMCO_BASE_URL")
                .unwrap_or_else(|_| samco_client::DEFAULT_BASE_URL.to_string()),
            yahoo_base_url: std::env::var("YAHOO_BASE_URL")
                .unwrap_or_else(|_| yahoo_client::DEFAULT_BASE_URL.to_string()),
            samco_credentials: SamcoCredentials::from_env(),
            analysis: AnalysisConfig::from_env(),
            enable_hsts: std::env::var("ENABLE_HSTS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
