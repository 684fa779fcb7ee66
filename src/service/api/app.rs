use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::service::api::routes::{foodi, health, market, options, stock};
use crate::service::api::AppState;

/// Build the dashboard router with CORS limited to the configured origins.
pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.allowed_origins);
    // Camera frames arrive as base64 JSON and outgrow axum's 2 MB default.
    let upload_limit = DefaultBodyLimit::max(state.settings.foodi.max_upload_bytes);

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        // Market
        .route("/api/market/overview", get(market::overview))
        .route("/api/market/news", get(market::news))
        .route("/api/market/earnings", get(market::earnings))
        .route("/api/market/earnings/grouped", get(market::earnings_grouped))
        // Single stock
        .route("/api/stock/{ticker}/details", get(stock::details))
        .route("/api/stock/{ticker}/chart", get(stock::chart))
        .route("/api/stock/{ticker}/news", get(stock::news))
        // Options
        .route(
            "/api/option/{ticker}/allExpirationDates",
            get(options::expirations),
        )
        .route("/api/option/{ticker}/stream", get(options::stream))
        .route("/api/option/{ticker}", get(options::chain))
        // Food scanner
        .route(
            "/api/foodi/getNutrients",
            post(foodi::get_nutrients).layer(upload_limit),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600))
}
