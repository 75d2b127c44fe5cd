//! Quote and candle endpoints backed by the quote provider adapter.

use analysis_core::{
    chart_points, Candle, CandleInterval, ChartPoint, ChartRange, DateRange, Exchange, Provider,
    Quote,
};
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use market_data::QuoteLookup;
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};

/// Response header naming the source that produced the data.
pub const PROVIDER_HEADER: &str = "x-data-provider";

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuoteQuery {
    /// Exchange code, defaults to NSE
    pub exchange: Option<String>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct CandleQuery {
    pub exchange: Option<String>,
    /// YYYY-MM-DD
    pub from_date: Option<String>,
    /// YYYY-MM-DD
    pub to_date: Option<String>,
    /// `15min` or `60min` (intraday only)
    pub interval: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Historical,
    Intraday,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChartQuery {
    pub exchange: Option<String>,
    /// 1D, 1W, 1M, 3M or 1Y
    pub range: Option<String>,
    /// Defaults to intraday for 1D, historical otherwise
    pub kind: Option<ChartKind>,
}

pub fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/api/stock/quote/:symbol", get(get_quote))
        .route("/api/stock/historical/:symbol", get(get_historical))
        .route("/api/stock/intraday/:symbol", get(get_intraday))
        .route("/api/stock/chart/:symbol", get(get_chart))
}

fn exchange_of(raw: Option<&str>) -> Exchange {
    Exchange::new(raw.unwrap_or_default())
}

fn sourced<T: Serialize>(provider: Provider, body: T) -> Response {
    ([(PROVIDER_HEADER, provider.to_string())], Json(body)).into_response()
}

fn date_range(query: &CandleQuery) -> Result<DateRange, AppError> {
    fn present(v: &Option<String>) -> Option<&str> {
        v.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
    let (Some(from), Some(to)) = (present(&query.from_date), present(&query.to_date)) else {
        return Err(AppError::bad_request("fromDate and toDate are required"));
    };
    DateRange::parse(from, to).map_err(|e| AppError::bad_request(e.to_string()))
}

#[utoipa::path(
    get,
    path = "/api/stock/quote/{symbol}",
    params(("symbol" = String, Path, description = "NSE/BSE ticker symbol"), QuoteQuery),
    responses(
        (status = 200, description = "Latest quote", body = Quote),
        (status = 404, description = "No quote from any source", body = crate::ErrorBody),
        (status = 500, description = "Quote sources unreachable", body = crate::ErrorBody)
    ),
    tag = "Stocks"
)]
async fn get_quote(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<QuoteQuery>,
) -> Result<Response, AppError> {
    let symbol = symbol.trim().to_uppercase();
    let exchange = exchange_of(query.exchange.as_deref());

    match state.market.get_quote(&symbol, &exchange).await {
        QuoteLookup::Found(quote) => Ok(sourced(quote.provider, quote.data)),
        QuoteLookup::NotFound => Err(AppError::not_found("Stock quote not found")),
        QuoteLookup::Unavailable(message) => Err(AppError::internal(message)),
    }
}

#[utoipa::path(
    get,
    path = "/api/stock/historical/{symbol}",
    params(("symbol" = String, Path, description = "NSE/BSE ticker symbol"), CandleQuery),
    responses(
        (status = 200, description = "Daily candles, oldest first", body = [Candle]),
        (status = 400, description = "Missing or invalid dates", body = crate::ErrorBody),
        (status = 404, description = "No candles in range", body = crate::ErrorBody)
    ),
    tag = "Stocks"
)]
async fn get_historical(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<CandleQuery>,
) -> Result<Response, AppError> {
    let range = date_range(&query)?;
    let symbol = symbol.trim().to_uppercase();
    let exchange = exchange_of(query.exchange.as_deref());

    let candles = state
        .market
        .get_historical_data(&symbol, &exchange, &range)
        .await;
    if candles.data.is_empty() {
        return Err(AppError::not_found("Historical data not found"));
    }

    tracing::debug!("{} daily candles for {} from {}", candles.data.len(), symbol, candles.provider);
    Ok(sourced(candles.provider, candles.data))
}

#[utoipa::path(
    get,
    path = "/api/stock/intraday/{symbol}",
    params(("symbol" = String, Path, description = "NSE/BSE ticker symbol"), CandleQuery),
    responses(
        (status = 200, description = "Intraday candles, oldest first", body = [Candle]),
        (status = 400, description = "Missing or invalid dates", body = crate::ErrorBody),
        (status = 404, description = "No candles in range", body = crate::ErrorBody)
    ),
    tag = "Stocks"
)]
async fn get_intraday(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<CandleQuery>,
) -> Result<Response, AppError> {
    let range = date_range(&query)?;
    let symbol = symbol.trim().to_uppercase();
    let exchange = exchange_of(query.exchange.as_deref());
    let interval = CandleInterval::parse_lenient(query.interval.as_deref().unwrap_or("15min"));

    let candles = state
        .market
        .get_intraday_data(&symbol, &exchange, &range, interval)
        .await;
    if candles.data.is_empty() {
        return Err(AppError::not_found("Intraday data not found"));
    }

    Ok(sourced(candles.provider, candles.data))
}

#[utoipa::path(
    get,
    path = "/api/stock/chart/{symbol}",
    params(("symbol" = String, Path, description = "NSE/BSE ticker symbol"), ChartQuery),
    responses(
        (status = 200, description = "Chart points with epoch-second times", body = [ChartPoint]),
        (status = 400, description = "Unknown range", body = crate::ErrorBody),
        (status = 404, description = "No candles in range", body = crate::ErrorBody)
    ),
    tag = "Stocks"
)]
async fn get_chart(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<ChartQuery>,
) -> Result<Response, AppError> {
    let range: ChartRange = match query.range.as_deref() {
        Some(raw) => raw.parse().map_err(AppError::bad_request)?,
        None => ChartRange::default(),
    };
    let kind = query.kind.unwrap_or(if range == ChartRange::OneDay {
        ChartKind::Intraday
    } else {
        ChartKind::Historical
    });

    let symbol = symbol.trim().to_uppercase();
    let exchange = exchange_of(query.exchange.as_deref());
    let dates = range.date_range_today();

    let candles = match kind {
        ChartKind::Historical => {
            state
                .market
                .get_historical_data(&symbol, &exchange, &dates)
                .await
        }
        ChartKind::Intraday => {
            state
                .market
                .get_intraday_data(&symbol, &exchange, &dates, range.intraday_interval())
                .await
        }
    };

    let points = chart_points(&candles.data);
    if points.is_empty() {
        return Err(AppError::not_found("Chart data not found"));
    }
    Ok(sourced(candles.provider, points))
}
