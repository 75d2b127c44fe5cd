pub mod analysis_routes;
pub mod config;
pub mod nse_symbols;
pub mod request_id;
pub mod security_headers;
pub mod stock_routes;
pub mod symbol_routes;


use std::sync::Arc;

use analysis_client::{AnalysisJobClient, AnalysisJobs};
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use market_data::QuoteProviderAdapter;
use samco_client::SamcoClient;
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use yahoo_client::YahooClient;

pub use config::ServerConfig;
use security_headers::SecurityHeaders;

/// Shared handler state. Cloned per request; everything inside is `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub market: Arc<QuoteProviderAdapter>,
    pub analysis: Arc<dyn AnalysisJobs>,
}

impl AppState {
    pub fn new(market: Arc<QuoteProviderAdapter>, analysis: Arc<dyn AnalysisJobs>) -> Self {
        Self { market, analysis }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        let market = QuoteProviderAdapter::samco_over_yahoo(
            SamcoClient::new(config.samco_base_url.clone()),
            YahooClient::new(config.yahoo_base_url.clone()),
            config.samco_credentials.clone(),
        );
        let analysis = AnalysisJobClient::new(config.analysis.clone());

        Self::new(Arc::new(market), Arc::new(analysis))
    }
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Body of every error response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// Handler error: a status plus a message that is safe to show callers.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: impl Into<anyhow::Error>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, anyhow::Error::msg(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, anyhow::Error::msg(message.into()))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            anyhow::Error::msg(message.into()),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, "{:#}", self.error);
        } else {
            tracing::debug!(status = %self.status, "{}", self.error);
        }

        let body = ErrorBody {
            error: self.error.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, err)
    }
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Samco credentials are configured
    pub primary_configured: bool,
    pub primary_logged_in: bool,
    /// Samco login failed; quotes come from Yahoo until restart
    pub primary_auth_failed: bool,
    pub timestamp: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "Health"
)]
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let auth = state.market.auth();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        primary_configured: state.market.has_primary(),
        primary_logged_in: auth.is_logged_in(),
        primary_auth_failed: auth.has_failed(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "NSE Stock Analysis API",
        description = "Quotes and candles for NSE/BSE symbols, plus AI analysis jobs"
    ),
    paths(
        health,
        stock_routes::get_quote,
        stock_routes::get_historical,
        stock_routes::get_intraday,
        stock_routes::get_chart,
        analysis_routes::submit_analysis,
        analysis_routes::get_analysis_status,
        symbol_routes::search_symbols,
        symbol_routes::get_symbol,
    ),
    components(schemas(
        ErrorBody,
        HealthResponse,
        analysis_core::Quote,
        analysis_core::Candle,
        analysis_core::ChartPoint,
        analysis_core::Provider,
        analysis_client::AnalysisReport,
        analysis_client::AnalysisSection,
        analysis_routes::AnalysisRequest,
        analysis_routes::JobAccepted,
        analysis_routes::AnalysisStatusResponse,
        stock_routes::ChartKind,
        symbol_routes::SymbolMatch,
    )),
    tags(
        (name = "Stocks", description = "Quotes and OHLCV candles"),
        (name = "Analysis", description = "Long-running AI analysis jobs"),
        (name = "Symbols", description = "NSE ticker suggestions"),
        (name = "Health", description = "Liveness")
    )
)]
pub struct ApiDoc;

/// Full router with middleware. Request ids are assigned outside the trace
/// layer so every request span carries one.
pub fn build_router(state: AppState, security: SecurityHeaders) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(stock_routes::stock_routes())
        .merge(analysis_routes::analysis_routes())
        .merge(symbol_routes::symbol_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(
            security,
            security_headers::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(request_id::make_span))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    // Panic hook: log panic info before crashing
    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    let config = ServerConfig::from_env()?;
    tracing::info!("Starting stock analysis API");
    if config.samco_credentials.is_some() {
        tracing::info!("  Quotes: Samco ({}) with Yahoo fallback", config.samco_base_url);
    } else {
        tracing::info!("  Quotes: Yahoo only (Samco credentials not set)");
    }
    tracing::info!("  Analysis webhook: {}", config.analysis.webhook_url);

    let state = AppState::from_config(&config);
    let app = build_router(
        state,
        SecurityHeaders {
            hsts: config.enable_hsts,
        },
    );

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API docs at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
