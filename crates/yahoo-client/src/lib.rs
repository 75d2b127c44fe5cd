//! Yahoo Finance chart API client, used as the credential-free fallback source.

use analysis_core::{
    Candle, DateRange, Exchange, MarketDataError, Provider, PublicMarketSource, Quote,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
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
            std::env::var("YAHOO_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    fn ticker(symbol: &str, exchange: &Exchange) -> String {
        format!("{}{}", symbol, exchange.yahoo_suffix())
    }

    /// Fetch one chart result. `Ok(None)` when Yahoo does not know the ticker.
    async fn chart(
        &self,
        ticker: &str,
        query: &[(&str, String)],
    ) -> Result<Option<ChartResult>, MarketDataError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);
        let response = self.client.get(&url).query(query).send().await?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(MarketDataError::Upstream {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: ChartResponse = serde_json::from_str(&response.text().await?)?;
        if let Some(err) = body.chart.error {
            tracing::debug!("Yahoo chart error for {}: {:?}", ticker, err.description);
        }
        Ok(body.chart.result.and_then(|mut r| {
            if r.is_empty() {
                None
            } else {
                Some(r.remove(0))
            }
        }))
    }
}

#[async_trait]
impl PublicMarketSource for YahooClient {
    fn provider(&self) -> Provider {
        Provider::Yahoo
    }

    async fn quote(
        &self,
        symbol: &str,
        exchange: &Exchange,
    ) -> Result<Option<Quote>, MarketDataError> {
        let ticker = Self::ticker(symbol, exchange);
        let result = self
            .chart(
                &ticker,
                &[("range", "1d".to_string()), ("interval", "1d".to_string())],
            )
            .await?;

        Ok(result.and_then(|r| r.meta.into_quote()))
    }

    async fn daily_candles(
        &self,
        symbol: &str,
        exchange: &Exchange,
        range: &DateRange,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let ticker = Self::ticker(symbol, exchange);
        let period1 = range
            .from
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default();
        // period2 is exclusive; push it past the last requested day
        let period2 = (range.to + ChronoDuration::days(1))
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default();

        let result = self
            .chart(
                &ticker,
                &[
                    ("period1", period1.to_string()),
                    ("period2", period2.to_string()),
                    ("interval", "1d".to_string()),
                ],
            )
            .await?;

        Ok(result.map(ChartResult::into_candles).unwrap_or_default())
    }
}

// Response structures
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    chart_previous_close: Option<f64>,
    #[serde(default)]
    previous_close: Option<f64>,
    #[serde(default)]
    regular_market_day_high: Option<f64>,
    #[serde(default)]
    regular_market_day_low: Option<f64>,
    #[serde(default)]
    regular_market_volume: Option<f64>,
    /// Exchange offset from UTC in seconds (19800 for IST).
    #[serde(default)]
    gmtoffset: Option<i64>,
}

impl ChartMeta {
    fn into_quote(self) -> Option<Quote> {
        let price = self.regular_market_price?;
        let previous = self.chart_previous_close.or(self.previous_close);
        let (change, percent_change) = match previous {
            Some(prev) if prev > 0.0 => (price - prev, (price - prev) / prev * 100.0),
            _ => (0.0, 0.0),
        };

        Some(Quote {
            last_traded_price: price,
            change,
            percent_change,
            day_high: self.regular_market_day_high.unwrap_or_default(),
            day_low: self.regular_market_day_low.unwrap_or_default(),
            volume: self.regular_market_volume.unwrap_or_default().max(0.0) as u64,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl ChartResult {
    /// Zip the parallel arrays into candles, dropping buckets with any missing price.
    fn into_candles(self) -> Vec<Candle> {
        let offset = self.meta.gmtoffset.unwrap_or(0);
        let series = self
            .indicators
            .and_then(|i| i.quote.into_iter().next())
            .unwrap_or_default();

        let at = |v: &Vec<Option<f64>>, i: usize| v.get(i).copied().flatten();

        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let date = DateTime::from_timestamp(ts + offset, 0)?.date_naive();
                Some(Candle {
                    date: date.format("%Y-%m-%d").to_string(),
                    open: at(&series.open, i)?,
                    high: at(&series.high, i)?,
                    low: at(&series.low, i)?,
                    close: at(&series.close, i)?,
                    volume: at(&series.volume, i).unwrap_or_default().max(0.0) as u64,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART_BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "regularMarketPrice": 2525.0,
                    "chartPreviousClose": 2500.0,
                    "regularMarketDayHigh": 2530.0,
                    "regularMarketDayLow": 2490.0,
                    "regularMarketVolume": 3456789,
                    "gmtoffset": 19800
                },
                "timestamp": [1704167100, 1704253500, 1704339900],
                "indicators": {
                    "quote": [{
                        "open": [2500.0, null, 2515.0],
                        "high": [2520.0, 2530.0, 2535.0],
                        "low": [2490.0, 2495.0, 2505.0],
                        "close": [2510.0, 2512.0, 2525.0],
                        "volume": [1000, 2000, null]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_quote_from_meta() {
        let body: ChartResponse = serde_json::from_str(CHART_BODY).unwrap();
        let result = body.chart.result.unwrap().remove(0);
        let quote = result.meta.into_quote().unwrap();
        assert_eq!(quote.last_traded_price, 2525.0);
        assert_eq!(quote.change, 25.0);
        assert!((quote.percent_change - 1.0).abs() < 1e-9);
        assert_eq!(quote.volume, 3_456_789);
    }

    #[test]
    fn test_candles_skip_incomplete_buckets() {
        let body: ChartResponse = serde_json::from_str(CHART_BODY).unwrap();
        let candles = body.chart.result.unwrap().remove(0).into_candles();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].date, "2024-01-02");
        assert_eq!(candles[1].date, "2024-01-04");
        assert_eq!(candles[1].volume, 0);
    }

    #[test]
    fn test_ticker_suffix() {
        assert_eq!(YahooClient::ticker("INFY", &Exchange::new("NSE")), "INFY.NS");
        assert_eq!(YahooClient::ticker("INFY", &Exchange::new("BSE")), "INFY.BO");
    }

    #[test]
    fn test_missing_result_is_none() {
        let body: ChartResponse = serde_json::from_str(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#,
        )
        .unwrap();
        assert!(body.chart.result.is_none());
    }

    #[tokio::test]
    #[ignore] // Hits the live Yahoo endpoint
    async fn test_live_quote() {
        let client = YahooClient::from_env();
        let quote = client.quote("RELIANCE", &Exchange::default()).await.unwrap();
        println!("RELIANCE: {:?}", quote);
    }
}
