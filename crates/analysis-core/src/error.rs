use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not supported by this source: {0}")]
    Unsupported(&'static str),
}

impl MarketDataError {
    /// The upstream could not be reached or is failing server-side.
    pub fn is_transport(&self) -> bool {
        match self {
            MarketDataError::Network(_) => true,
            MarketDataError::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, MarketDataError::Unauthorized(_))
    }
}

impl From<reqwest::Error> for MarketDataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            MarketDataError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            MarketDataError::Upstream {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            MarketDataError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for MarketDataError {
    fn from(err: serde_json::Error) -> Self {
        MarketDataError::InvalidResponse(err.to_string())
    }
}

pub type MarketDataResult<T> = Result<T, MarketDataError>;
