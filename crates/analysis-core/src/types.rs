use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Latest traded snapshot for a symbol.
///
/// Serialized with the short keys the browser client already consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Quote {
    #[serde(rename = "ltp")]
    pub last_traded_price: f64,
    pub change: f64,
    #[serde(rename = "pChange")]
    pub percent_change: f64,
    #[serde(rename = "high")]
    pub day_high: f64,
    #[serde(rename = "low")]
    pub day_low: f64,
    pub volume: u64,
}

impl Quote {
    /// A quote with no traded price carries nothing worth showing.
    pub fn is_usable(&self) -> bool {
        self.last_traded_price > 0.0
    }
}

/// OHLCV bar for one day or one intraday bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Candle {
    /// `YYYY-MM-DD` for daily candles, `YYYY-MM-DD HH:MM:SS` for intraday.
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Candle {
    /// Bucket start as Unix seconds (UTC). `None` if the date is malformed.
    pub fn epoch_seconds(&self) -> Option<i64> {
        let raw = self.date.trim();
        if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return day.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
        }
        for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(dt.and_utc().timestamp());
            }
        }
        DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.timestamp())
    }
}

/// Shape consumed by the candlestick chart widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChartPoint {
    /// Unix seconds
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Convert candles to chart points, skipping unparseable dates, ascending by time.
pub fn chart_points(candles: &[Candle]) -> Vec<ChartPoint> {
    let mut points: Vec<ChartPoint> = candles
        .iter()
        .filter_map(|c| {
            c.epoch_seconds().map(|time| ChartPoint {
                time,
                open: c.open,
                high: c.high,
                low: c.low,
                close: c.close,
            })
        })
        .collect();
    points.sort_by_key(|p| p.time);
    points
}

/// Which upstream answered a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Samco,
    Yahoo,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Samco => write!(f, "samco"),
            Provider::Yahoo => write!(f, "yahoo"),
        }
    }
}

/// Exchange code (NSE, BSE, NFO, ...), always upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Exchange(String);

impl Exchange {
    pub fn new(code: &str) -> Self {
        let code = code.trim();
        if code.is_empty() {
            return Self::default();
        }
        Self(code.to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ticker suffix Yahoo uses for this exchange.
    pub fn yahoo_suffix(&self) -> &'static str {
        match self.0.as_str() {
            "BSE" => ".BO",
            _ => ".NS",
        }
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self("NSE".to_string())
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Intraday bucket size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandleInterval {
    #[serde(rename = "15min")]
    FifteenMinutes,
    #[serde(rename = "60min")]
    SixtyMinutes,
}

impl CandleInterval {
    /// Anything other than `15min` means hourly candles.
    pub fn parse_lenient(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("15min") {
            CandleInterval::FifteenMinutes
        } else {
            CandleInterval::SixtyMinutes
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CandleInterval::FifteenMinutes => "15min",
            CandleInterval::SixtyMinutes => "60min",
        }
    }

    pub fn minutes(&self) -> u32 {
        match self {
            CandleInterval::FifteenMinutes => 15,
            CandleInterval::SixtyMinutes => 60,
        }
    }
}

impl Default for CandleInterval {
    fn default() -> Self {
        CandleInterval::FifteenMinutes
    }
}

/// Inclusive calendar-day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateRangeError {
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("fromDate {from} is after toDate {to}")]
    Inverted { from: NaiveDate, to: NaiveDate },
}

impl DateRange {
    pub fn parse(from: &str, to: &str) -> Result<Self, DateRangeError> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map_err(|_| DateRangeError::InvalidDate(s.to_string()))
        };
        let (from, to) = (parse(from)?, parse(to)?);
        if from > to {
            return Err(DateRangeError::Inverted { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn from_str_date(&self) -> String {
        self.from.format("%Y-%m-%d").to_string()
    }

    pub fn to_str_date(&self) -> String {
        self.to.format("%Y-%m-%d").to_string()
    }
}

/// Chart zoom presets offered by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartRange {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "1W")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "1Y")]
    OneYear,
}

impl ChartRange {
    /// Range ending at `today`.
    pub fn date_range(&self, today: NaiveDate) -> DateRange {
        let from = match self {
            ChartRange::OneDay => today - Duration::days(1),
            ChartRange::OneWeek => today - Duration::days(7),
            ChartRange::OneMonth => months_before(today, 1),
            ChartRange::ThreeMonths => months_before(today, 3),
            ChartRange::OneYear => months_before(today, 12),
        };
        DateRange { from, to: today }
    }

    pub fn date_range_today(&self) -> DateRange {
        self.date_range(Utc::now().date_naive())
    }

    /// Intraday bucket used when this range is charted intraday.
    pub fn intraday_interval(&self) -> CandleInterval {
        match self {
            ChartRange::OneDay => CandleInterval::FifteenMinutes,
            _ => CandleInterval::SixtyMinutes,
        }
    }
}

fn months_before(day: NaiveDate, months: u32) -> NaiveDate {
    day.checked_sub_months(Months::new(months)).unwrap_or(day)
}

impl Default for ChartRange {
    fn default() -> Self {
        ChartRange::OneMonth
    }
}

impl FromStr for ChartRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1D" => Ok(ChartRange::OneDay),
            "1W" => Ok(ChartRange::OneWeek),
            "1M" => Ok(ChartRange::OneMonth),
            "3M" => Ok(ChartRange::ThreeMonths),
            "1Y" => Ok(ChartRange::OneYear),
            other => Err(format!("Unknown chart range '{}'", other)),
        }
    }
}

/// Data tagged with the single provider that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sourced<T> {
    pub provider: Provider,
    pub data: T,
}

impl<T> Sourced<T> {
    pub fn new(provider: Provider, data: T) -> Self {
        Self { provider, data }
    }
}
