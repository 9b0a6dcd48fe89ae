use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portfolio_core::analysis::PortfolioAnalyzer;
use portfolio_core::domain::portfolio::PortfolioAnalysisResult;
use portfolio_core::llm::analyst::LlmAnalyst;
use portfolio_core::llm::gemini::GeminiClient;
use portfolio_core::market::alpha_vantage::AlphaVantageClient;
use portfolio_core::tracking::http::HttpTrackingSink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = portfolio_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    // Missing credentials abort startup; requests never see a half-wired app.
    let market = Arc::new(AlphaVantageClient::from_settings(&settings)?);
    let llm = Arc::new(GeminiClient::from_settings(&settings)?);
    let tracking = Arc::new(HttpTrackingSink::open(&settings).await?);

    let analyzer = Arc::new(PortfolioAnalyzer::new(
        market,
        LlmAnalyst::new(llm, tracking.clone()),
    ));

    let state = AppState { analyzer };

    let app = Router::new()
        .route("/", get(root))
        .route("/analyze", post(analyze))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Close the process-wide tracking run after the server drains.
    if let Err(err) = tracking.finish().await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::warn!(error = %err, "failed to finish tracking run");
    }

    Ok(())
}

#[derive(Clone)]
struct AppState {
    analyzer: Arc<PortfolioAnalyzer>,
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "Portfolio Analyzer API is running!"}))
}

#[derive(Debug, Deserialize)]
struct PortfolioRequest {
    tickers: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    detail: String,
}

async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<PortfolioRequest>,
) -> Result<Json<PortfolioAnalysisResult>, (StatusCode, Json<ErrorDetail>)> {
    if request.tickers.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorDetail {
                detail: "Tickers list cannot be empty.".to_string(),
            }),
        ));
    }

    let result = state.analyzer.analyze_portfolio(&request.tickers).await;

    // Pipeline-level failures stay HTTP 200 per the endpoint contract, but
    // they are worth an alert.
    if let PortfolioAnalysisResult::Error { error } = &result {
        sentry::capture_message(error, sentry::Level::Error);
    }

    Ok(Json(result))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &portfolio_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
