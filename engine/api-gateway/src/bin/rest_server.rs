//! REST API server for cached KTC rankings and Sleeper data

use std::sync::Arc;
use tracing::info;

use api_gateway::config::StorageBackend;
use api_gateway::logging::initialize_logging;
use api_gateway::{create_routes, AppState, GatewayConfig};
use ktc_scraper::KtcScraper;
use ranking_service::{
    CacheStore, JsonExporter, LeagueSync, MemoryStore, PgStore, QueryService, RefreshOrchestrator,
};
use sleeper_client::SleeperClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config_path = std::env::var("GATEWAY_CONFIG").ok();
    let config = GatewayConfig::load(config_path.as_deref())?;

    initialize_logging(&config.logging.level, &config.logging.format)?;
    info!("Starting REST API server...");

    let store: Arc<dyn CacheStore> = match config.database.backend {
        StorageBackend::Postgres => {
            let store = PgStore::connect(&config.database.url, config.database.max_connections).await?;
            if config.database.run_migrations {
                store.migrate().await?;
            }
            info!("Connected to database");
            Arc::new(store)
        }
        StorageBackend::Memory => {
            info!("Using in-memory cache store");
            Arc::new(MemoryStore::new())
        }
    };

    let scraper = KtcScraper::with_urls(
        config.sources.ktc_dynasty_url.clone(),
        config.sources.ktc_fantasy_url.clone(),
        config.sources.http_timeout(),
    )?;
    let sleeper = Arc::new(SleeperClient::new(config.sources.sleeper_config())?);

    let mut refresh = RefreshOrchestrator::new(store.clone(), Arc::new(scraper), sleeper.clone());
    if config.export.enabled {
        let exporter = JsonExporter::new(config.export.dir.clone());
        info!("Exporting refresh results to {}", exporter.dir().display());
        refresh = refresh.with_exporter(exporter);
    }

    let state = AppState {
        refresh: Arc::new(refresh),
        query: QueryService::new(store.clone()),
        leagues: Arc::new(LeagueSync::new(store, sleeper)),
    };
    let routes = create_routes(state);

    let addr = config.server_addr()?;
    info!("Starting REST API server on {}", addr);
    warp::serve(routes).run(addr).await;

    Ok(())
}
