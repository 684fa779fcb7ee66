use std::sync::Arc;

use anyhow::Result;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use portfolio_desk::config::Settings;
use portfolio_desk::service::api::{create_app, AppState};
use portfolio_desk::service::caching::RedisCache;
use portfolio_desk::service::finance::FinanceService;
use portfolio_desk::service::food::FoodScanner;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env();

    info!("Initializing FinanceService...");
    let finance = Arc::new(FinanceService::new(
        settings.http_proxy.clone(),
        settings.finnhub_api_key.clone(),
    )?);

    info!("Initializing Redis cache (optional)...");
    let cache = match RedisCache::from_env().await {
        Ok(c) => {
            info!("Connected to Redis cache");
            Some(c)
        }
        Err(err) => {
            info!("Redis cache disabled: {err}");
            None
        }
    };

    let food = Arc::new(FoodScanner::new(settings.foodi.clone(), cache)?);

    let addr = settings.bind_addr();
    let app = create_app(AppState::new(finance, food, settings));

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
