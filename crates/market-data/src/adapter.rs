use crate::auth::{ProviderAuthState, SamcoCredentials};
use analysis_core::{
    Candle, CandleInterval, DateRange, Exchange, MarketDataError, Provider, PublicMarketSource,
    Quote, SessionMarketSource, Sourced,
};
use samco_client::SamcoClient;
use serde::Serialize;
use std::sync::Arc;
use yahoo_client::YahooClient;

/// Outcome of a quote lookup across both sources.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum QuoteLookup {
    Found(Sourced<Quote>),
    /// Neither source had a usable quote for the symbol.
    NotFound,
    /// The fallback could not be reached after the primary came up empty.
    Unavailable(String),
}

struct PrimarySource {
    source: Arc<dyn SessionMarketSource>,
    credentials: SamcoCredentials,
}

/// Quote/candle facade: tries the broker first, then the public source.
///
/// Never surfaces provider errors for candle requests; an empty sequence
/// means no data from either source.
pub struct QuoteProviderAdapter {
    primary: Option<PrimarySource>,
    fallback: Arc<dyn PublicMarketSource>,
    auth: Arc<ProviderAuthState>,
}

impl QuoteProviderAdapter {
    pub fn new(
        primary: Option<(Arc<dyn SessionMarketSource>, SamcoCredentials)>,
        fallback: Arc<dyn PublicMarketSource>,
        auth: Arc<ProviderAuthState>,
    ) -> Self {
        Self {
            primary: primary.map(|(source, credentials)| PrimarySource {
                source,
                credentials,
            }),
            fallback,
            auth,
        }
    }

    /// Samco over Yahoo. Without credentials the adapter runs on Yahoo alone.
    pub fn samco_over_yahoo(
        samco: SamcoClient,
        yahoo: YahooClient,
        credentials: Option<SamcoCredentials>,
    ) -> Self {
        let primary = match credentials {
            Some(credentials) => {
                let source: Arc<dyn SessionMarketSource> = Arc::new(samco);
                Some((source, credentials))
            }
            None => {
                tracing::warn!("Samco credentials not configured, using Yahoo Finance only");
                None
            }
        };

        Self::new(primary, Arc::new(yahoo), Arc::new(ProviderAuthState::new()))
    }

    pub fn auth(&self) -> &Arc<ProviderAuthState> {
        &self.auth
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Current session for the primary, logging in on first use.
    ///
    /// Returns `None` when there is no primary, once the credentials have been
    /// rejected, or when this login attempt could not complete.
    async fn primary_session(&self) -> Option<(&PrimarySource, String)> {
        let primary = self.primary.as_ref()?;
        if self.auth.has_failed() {
            return None;
        }
        if let Some(token) = self.auth.session() {
            return Some((primary, token));
        }

        let _guard = self.auth.login_lock.lock().await;
        // Re-check: another request may have logged in (or failed) while we waited
        if self.auth.has_failed() {
            return None;
        }
        if let Some(token) = self.auth.session() {
            return Some((primary, token));
        }

        self.auth.record_attempt();
        let credentials = &primary.credentials;
        match primary
            .source
            .login(
                &credentials.user_id,
                &credentials.password,
                &credentials.year_of_birth,
            )
            .await
        {
            Ok(token) => {
                self.auth.store_session(token.clone());
                Some((primary, token))
            }
            Err(e) if e.is_unauthorized() => {
                tracing::error!(
                    "{} login rejected, using {} for the rest of this process: {}",
                    primary.source.provider(),
                    self.fallback.provider(),
                    e
                );
                self.auth.mark_failed();
                None
            }
            Err(e) => {
                // Not a verdict on the credentials; the next request logs in again
                tracing::warn!(
                    "{} login failed, using {} for this request: {}",
                    primary.source.provider(),
                    self.fallback.provider(),
                    e
                );
                None
            }
        }
    }

    fn primary_failed(&self, provider: Provider, what: &str, symbol: &str, err: &MarketDataError) {
        if err.is_unauthorized() {
            // Session expired; the next request logs in again
            self.auth.clear_session();
        }
        tracing::warn!(
            "{} {} failed for {}, falling back to {}: {}",
            provider,
            what,
            symbol,
            self.fallback.provider(),
            err
        );
    }

    pub async fn get_quote(&self, symbol: &str, exchange: &Exchange) -> QuoteLookup {
        if let Some((primary, session)) = self.primary_session().await {
            let provider = primary.source.provider();
            match primary.source.quote(&session, symbol, exchange).await {
                Ok(Some(quote)) if quote.is_usable() => {
                    return QuoteLookup::Found(Sourced::new(provider, quote));
                }
                Ok(_) => tracing::info!(
                    "{} had no usable quote for {}, trying {}",
                    provider,
                    symbol,
                    self.fallback.provider()
                ),
                Err(e) => self.primary_failed(provider, "quote", symbol, &e),
            }
        }

        let provider = self.fallback.provider();
        match self.fallback.quote(symbol, exchange).await {
            Ok(Some(quote)) if quote.is_usable() => {
                QuoteLookup::Found(Sourced::new(provider, quote))
            }
            Ok(_) => QuoteLookup::NotFound,
            Err(e) if e.is_transport() => {
                tracing::error!("{} quote unavailable for {}: {}", provider, symbol, e);
                QuoteLookup::Unavailable(format!("Quote providers unavailable: {}", e))
            }
            Err(e) => {
                tracing::warn!("{} quote failed for {}: {}", provider, symbol, e);
                QuoteLookup::NotFound
            }
        }
    }

    pub async fn get_historical_data(
        &self,
        symbol: &str,
        exchange: &Exchange,
        range: &DateRange,
    ) -> Sourced<Vec<Candle>> {
        if let Some((primary, session)) = self.primary_session().await {
            let provider = primary.source.provider();
            match primary
                .source
                .daily_candles(&session, symbol, exchange, range)
                .await
            {
                Ok(candles) if !candles.is_empty() => return Sourced::new(provider, candles),
                Ok(_) => tracing::info!("{} returned no daily candles for {}", provider, symbol),
                Err(e) => self.primary_failed(provider, "historical data", symbol, &e),
            }
        }

        self.fallback_daily(symbol, exchange, range).await
    }

    pub async fn get_intraday_data(
        &self,
        symbol: &str,
        exchange: &Exchange,
        range: &DateRange,
        interval: CandleInterval,
    ) -> Sourced<Vec<Candle>> {
        if let Some((primary, session)) = self.primary_session().await {
            let provider = primary.source.provider();
            match primary
                .source
                .intraday_candles(&session, symbol, exchange, range, interval)
                .await
            {
                Ok(candles) if !candles.is_empty() => return Sourced::new(provider, candles),
                Ok(_) => tracing::info!("{} returned no intraday candles for {}", provider, symbol),
                Err(e) => self.primary_failed(provider, "intraday data", symbol, &e),
            }
        }

        let provider = self.fallback.provider();
        match self
            .fallback
            .intraday_candles(symbol, exchange, range, interval)
            .await
        {
            Ok(candles) => Sourced::new(provider, candles),
            Err(MarketDataError::Unsupported(_)) => {
                tracing::info!(
                    "{} has no intraday candles, serving daily candles for {}",
                    provider,
                    symbol
                );
                self.fallback_daily(symbol, exchange, range).await
            }
            Err(e) => {
                tracing::warn!("{} intraday data failed for {}: {}", provider, symbol, e);
                Sourced::new(provider, Vec::new())
            }
        }
    }

    async fn fallback_daily(
        &self,
        symbol: &str,
        exchange: &Exchange,
        range: &DateRange,
    ) -> Sourced<Vec<Candle>> {
        let provider = self.fallback.provider();
        match self.fallback.daily_candles(symbol, exchange, range).await {
            Ok(candles) => Sourced::new(provider, candles),
            Err(e) => {
                tracing::warn!("{} historical data failed for {}: {}", provider, symbol, e);
                Sourced::new(provider, Vec::new())
            }
        }
    }
}
