use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use wander_api::config::Config;
use wander_api::db::{self, ActivityStore, Cache};
use wander_api::routes::{create_router, AppState};
use wander_api::services::providers::forecast::HttpForecastProvider;
use wander_api::services::providers::llm::HttpLlmClient;
use wander_api::services::providers::places::HttpPlacesProvider;
use wander_api::services::{CurationService, LlmGateway};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    let store = ActivityStore::new(pool).await?;
    let hubs = store.region_hubs().to_vec();

    let redis_client = db::create_redis_client(&config.redis_url)?;
    let cache = Cache::new(redis_client);

    let places = Arc::new(HttpPlacesProvider::new(
        cache.clone(),
        config.places_api_key.clone(),
        config.places_api_url.clone(),
    ));
    let forecast = Arc::new(HttpForecastProvider::new(
        cache,
        config.forecast_api_url.clone(),
    ));
    let llm = LlmGateway::new(Arc::new(HttpLlmClient::new(
        config.llm_api_key.clone(),
        config.llm_api_url.clone(),
        config.llm_model.clone(),
    )));

    let curation = CurationService::new(
        places,
        forecast,
        llm,
        hubs,
        Some(store),
        config.selection_weights(),
    );

    let state = Arc::new(AppState { curation });
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
