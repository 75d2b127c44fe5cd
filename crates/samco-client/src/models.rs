use analysis_core::Candle;
use serde::{Deserialize, Deserializer};

/// StockNote sends numbers as JSON numbers on some endpoints and as strings on others.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Float(f64),
    Text(String),
}

fn flexible_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Numeric> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Numeric::Float(v)) => v,
        Some(Numeric::Text(s)) => s.trim().replace(',', "").parse().unwrap_or(0.0),
        None => 0.0,
    })
}

fn flexible_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = flexible_f64(deserializer)?;
    Ok(if value.is_finite() && value > 0.0 { value as u64 } else { 0 })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub session_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuoteResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub quote_details: Option<QuoteDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuoteDetails {
    #[serde(default, deserialize_with = "flexible_f64")]
    pub last_traded_price: f64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub change_value: f64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub change_percentage: f64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub high: f64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub low: f64,
    #[serde(default, deserialize_with = "flexible_u64")]
    pub total_traded_volume: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HistoricalResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub historical_candle_data: Option<Vec<SamcoCandle>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IntradayResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub intraday_candle_data: Option<Vec<SamcoCandle>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SamcoCandle {
    /// Daily candles carry `date`, intraday candles carry `dateTime`.
    #[serde(default, alias = "dateTime")]
    pub date: String,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub open: f64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub high: f64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub low: f64,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub close: f64,
    #[serde(default, deserialize_with = "flexible_u64")]
    pub volume: u64,
}

impl From<SamcoCandle> for Candle {
    fn from(c: SamcoCandle) -> Self {
        Candle {
            date: c.date,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            volume: c.volume,
        }
    }
}

pub(crate) fn is_success(status: Option<&str>) -> bool {
    status.map(|s| s.eq_ignore_ascii_case("success")).unwrap_or(false)
}

/// StockNote reports an expired or missing session inside a 200 body.
pub(crate) fn mentions_session(message: Option<&str>) -> bool {
    message
        .map(|m| {
            let m = m.to_lowercase();
            m.contains("session") || m.contains("login")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candle_numbers_as_strings_or_numbers() {
        let body = r#"{
            "status": "Success",
            "historicalCandleData": [
                {"date": "2024-01-02", "open": "2500.5", "high": 2525, "low": "2,490.0", "close": "2510", "volume": "1200345"},
                {"date": "2024-01-03", "open": 2510, "high": 2530, "low": 2500, "close": 2520, "volume": 990000}
            ]
        }"#;
        let parsed: HistoricalResponse = serde_json::from_str(body).unwrap();
        let candles: Vec<Candle> = parsed
            .historical_candle_data
            .unwrap()
            .into_iter()
            .map(Candle::from)
            .collect();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open, 2500.5);
        assert_eq!(candles[0].low, 2490.0);
        assert_eq!(candles[0].volume, 1_200_345);
        assert_eq!(candles[1].close, 2520.0);
    }

    #[test]
    fn test_intraday_uses_date_time_key() {
        let body = r#"{
            "status": "Success",
            "intradayCandleData": [
                {"dateTime": "2024-01-02 09:15:00.0", "open": "1", "high": "2", "low": "0.5", "close": "1.5", "volume": "10"}
            ]
        }"#;
        let parsed: IntradayResponse = serde_json::from_str(body).unwrap();
        let candle = parsed.intraday_candle_data.unwrap().remove(0);
        assert_eq!(candle.date, "2024-01-02 09:15:00.0");
    }

    #[test]
    fn test_status_helpers() {
        assert!(is_success(Some("Success")));
        assert!(!is_success(Some("Failure")));
        assert!(!is_success(None));
        assert!(mentions_session(Some("Session Expired. Please login again")));
        assert!(!mentions_session(Some("No data found")));
    }
}
