use async_trait::async_trait;
use crate::{Candle, CandleInterval, DateRange, Exchange, MarketDataError, Provider, Quote};

/// Broker-grade source that needs a login before any data call.
///
/// The session token lives with the caller, not the source, so one
/// authentication state can be shared across every request.
#[async_trait]
pub trait SessionMarketSource: Send + Sync {
    fn provider(&self) -> Provider;

    /// Exchange credentials for a session token.
    async fn login(&self, user_id: &str, password: &str, year_of_birth: &str)
        -> Result<String, MarketDataError>;

    async fn quote(&self, session: &str, symbol: &str, exchange: &Exchange)
        -> Result<Option<Quote>, MarketDataError>;

    async fn daily_candles(&self, session: &str, symbol: &str, exchange: &Exchange, range: &DateRange)
        -> Result<Vec<Candle>, MarketDataError>;

    async fn intraday_candles(
        &self,
        session: &str,
        symbol: &str,
        exchange: &Exchange,
        range: &DateRange,
        interval: CandleInterval,
    ) -> Result<Vec<Candle>, MarketDataError>;
}

/// Public source usable without credentials.
#[async_trait]
pub trait PublicMarketSource: Send + Sync {
    fn provider(&self) -> Provider;

    async fn quote(&self, symbol: &str, exchange: &Exchange) -> Result<Option<Quote>, MarketDataError>;

    async fn daily_candles(&self, symbol: &str, exchange: &Exchange, range: &DateRange)
        -> Result<Vec<Candle>, MarketDataError>;

    async fn intraday_candles(
        &self,
        _symbol: &str,
        _exchange: &Exchange,
        _range: &DateRange,
        _interval: CandleInterval,
    ) -> Result<Vec<Candle>, MarketDataError> {
        Err(MarketDataError::Unsupported("intraday candles"))
    }
}
