//! Symbol Search API Routes
//!
//! Ticker suggestions from the static NSE list.

use axum::{
    extract::{Path, Query},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::nse_symbols::{self, DEFAULT_LIMIT, MAX_LIMIT};
use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
}

impl From<&(&str, &str)> for SymbolMatch {
    fn from((symbol, name): &(&str, &str)) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            exchange: "NSE".to_string(),
        }
    }
}

pub fn symbol_routes() -> Router<AppState> {
    Router::new()
        .route("/api/symbols/search", get(search_symbols))
        .route("/api/symbols/:symbol", get(get_symbol))
}

#[utoipa::path(
    get,
    path = "/api/symbols/search",
    params(SearchQuery),
    responses((status = 200, description = "Matching NSE symbols, best match first")),
    tag = "Symbols"
)]
async fn search_symbols(Query(query): Query<SearchQuery>) -> Json<ApiResponse<Vec<SymbolMatch>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let matches = nse_symbols::search(&query.q, limit)
        .into_iter()
        .map(SymbolMatch::from)
        .collect();

    Json(ApiResponse::success(matches))
}

#[utoipa::path(
    get,
    path = "/api/symbols/{symbol}",
    params(("symbol" = String, Path, description = "NSE ticker symbol")),
    responses(
        (status = 200, description = "Listed symbol"),
        (status = 404, description = "Not in the NSE list", body = crate::ErrorBody)
    ),
    tag = "Symbols"
)]
async fn get_symbol(
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<SymbolMatch>>, AppError> {
    let entry = nse_symbols::lookup(&symbol).ok_or_else(|| {
        AppError::not_found(format!(
            "{} is not a listed NSE symbol",
            symbol.trim().to_uppercase()
        ))
    })?;

    Ok(Json(ApiResponse::success(SymbolMatch::from(entry))))
}
