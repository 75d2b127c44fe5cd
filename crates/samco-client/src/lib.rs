//! Samco StockNote REST client.
//!
//! Every data call takes the session token explicitly; login state is owned
//! by whoever composes this client with other sources.

mod models;

use analysis_core::{
    Candle, CandleInterval, DateRange, Exchange, MarketDataError, Provider, Quote,
    SessionMarketSource,
};
use async_trait::async_trait;
use models::*;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.stocknote.com";

const SESSION_HEADER: &str = "x-session-token";

/// Trading session bounds used to widen intraday date ranges.
const SESSION_OPEN: &str = "09:15:00";
const SESSION_CLOSE: &str = "15:30:00";

#[derive(Clone)]
pub struct SamcoClient {
    client: Client,
    base_url: String,
}

impl SamcoClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Self {
        let base_url =
            std::env::var("SAMCO_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        session: &str,
        query: &[(&str, String)],
    ) -> Result<T, MarketDataError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header(SESSION_HEADER, session)
            .query(query)
            .send()
            .await?;

        decode(response).await
    }
}

/// Map HTTP status to the error taxonomy, then decode the body.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, MarketDataError> {
    let status = response.status();
    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(MarketDataError::Unauthorized(format!(
            "Samco rejected the session (HTTP {})",
            status
        )));
    }
    if !status.is_success() {
        return Err(MarketDataError::Upstream {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        });
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

fn failure(status_message: Option<String>) -> Result<(), MarketDataError> {
    if mentions_session(status_message.as_deref()) {
        return Err(MarketDataError::Unauthorized(
            status_message.unwrap_or_default(),
        ));
    }
    Ok(())
}

#[async_trait]
impl SessionMarketSource for SamcoClient {
    fn provider(&self) -> Provider {
        Provider::Samco
    }

    async fn login(
        &self,
        user_id: &str,
        password: &str,
        year_of_birth: &str,
    ) -> Result<String, MarketDataError> {
        let url = format!("{}/login", self.base_url);
        let body = serde_json::json!({
            "userId": user_id,
            "password": password,
            "yob": year_of_birth,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let login: LoginResponse = decode(response).await?;

        match login.session_token {
            Some(token) if !token.trim().is_empty() && is_success(login.status.as_deref()) => {
                tracing::info!("Samco login successful");
                Ok(token)
            }
            _ => Err(MarketDataError::Unauthorized(
                login
                    .status_message
                    .unwrap_or_else(|| "Login failed - invalid credentials".to_string()),
            )),
        }
    }

    async fn quote(
        &self,
        session: &str,
        symbol: &str,
        exchange: &Exchange,
    ) -> Result<Option<Quote>, MarketDataError> {
        let response: QuoteResponse = self
            .get_json(
                "/quote/getQuote",
                session,
                &[
                    ("symbolName", symbol.to_string()),
                    ("exchange", exchange.to_string()),
                ],
            )
            .await?;

        if !is_success(response.status.as_deref()) {
            failure(response.status_message)?;
            return Ok(None);
        }

        Ok(response.quote_details.map(|d| Quote {
            last_traded_price: d.last_traded_price,
            change: d.change_value,
            percent_change: d.change_percentage,
            day_high: d.high,
            day_low: d.low,
            volume: d.total_traded_volume,
        }))
    }

    async fn daily_candles(
        &self,
        session: &str,
        symbol: &str,
        exchange: &Exchange,
        range: &DateRange,
    ) -> Result<Vec<Candle>, MarketDataError> {
        tracing::debug!(
            "Samco historical {} {} {} -> {}",
            symbol,
            exchange,
            range.from_str_date(),
            range.to_str_date()
        );

        let response: HistoricalResponse = self
            .get_json(
                "/history/candleData",
                session,
                &[
                    ("symbolName", symbol.to_string()),
                    ("exchange", exchange.to_string()),
                    ("fromDate", range.from_str_date()),
                    ("toDate", range.to_str_date()),
                ],
            )
            .await?;

        if !is_success(response.status.as_deref()) {
            failure(response.status_message)?;
            return Ok(Vec::new());
        }

        Ok(response
            .historical_candle_data
            .unwrap_or_default()
            .into_iter()
            .map(Candle::from)
            .collect())
    }

    async fn intraday_candles(
        &self,
        session: &str,
        symbol: &str,
        exchange: &Exchange,
        range: &DateRange,
        interval: CandleInterval,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let response: IntradayResponse = self
            .get_json(
                "/intraday/candleData",
                session,
                &[
                    ("symbolName", symbol.to_string()),
                    ("exchange", exchange.to_string()),
                    ("fromDate", format!("{} {}", range.from_str_date(), SESSION_OPEN)),
                    ("toDate", format!("{} {}", range.to_str_date(), SESSION_CLOSE)),
                    ("interval", interval.minutes().to_string()),
                ],
            )
            .await?;

        if !is_success(response.status.as_deref()) {
            failure(response.status_message)?;
            return Ok(Vec::new());
        }

        Ok(response
            .intraday_candle_data
            .unwrap_or_default()
            .into_iter()
            .map(Candle::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = SamcoClient::new("https://api.stocknote.com/".to_string());
        assert_eq!(client.base_url, "https://api.stocknote.com");
    }

    #[test]
    fn test_failure_maps_session_messages_to_unauthorized() {
        let err = failure(Some("Session Expired".to_string())).unwrap_err();
        assert!(err.is_unauthorized());
        assert!(failure(Some("No records found".to_string())).is_ok());
        assert!(failure(None).is_ok());
    }

    #[tokio::test]
    #[ignore] // Only run with valid credentials
    async fn test_login_and_quote() {
        let client = SamcoClient::from_env();
        let token = client
            .login(
                &std::env::var("SAMCO_USER_ID").unwrap(),
                &std::env::var("SAMCO_PASSWORD").unwrap(),
                &std::env::var("SAMCO_YOB").unwrap(),
            )
            .await
            .unwrap();

        let quote = client
            .quote(&token, "RELIANCE", &Exchange::default())
            .await
            .unwrap();
        println!("RELIANCE quote: {:?}", quote);
    }
}
