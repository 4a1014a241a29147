use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use stockharvest::{
    config::{self, StoreBackend},
    error::{AppError, Result},
    routes,
    services::{
        alphavantage::AlphaVantageClient, extraction_service::DataExtractionService,
        finnhub::FinnhubClient, memory_store::MemoryStore, mongo_store::MongoStore,
        polygon::PolygonClient, scorecard_service::ScorecardService, store::StockStore,
    },
    AppState,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let settings = config::load();

    let store: Arc<dyn StockStore> = match settings.store_backend {
        StoreBackend::Mongo => {
            let mongo = MongoStore::connect(&settings.mongodb_uri, &settings.mongodb_db).await?;
            mongo.ping().await?;
            tracing::info!(db = %settings.mongodb_db, "connected to MongoDB");
            Arc::new(mongo)
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store, data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let timeout = settings.api_request_timeout;
    let alpha = Arc::new(AlphaVantageClient::new(settings.alpha_vantage.clone(), timeout)?);
    let finnhub = Arc::new(FinnhubClient::new(settings.finnhub.clone(), timeout)?);
    let polygon = Arc::new(PolygonClient::new(settings.polygon.clone(), timeout)?);

    let extraction = DataExtractionService::new(alpha.clone(), finnhub, polygon, alpha, store.clone());

    let state = AppState {
        settings: settings.clone(),
        store: store.clone(),
        extraction: Arc::new(extraction),
        scorecards: Arc::new(ScorecardService::new(store)),
    };

    let app = routes::app(state);

    let ip = settings
        .host
        .parse::<std::net::IpAddr>()
        .map_err(|e| AppError::InvalidInput(format!("HOST '{}': {e}", settings.host)))?;
    let addr = SocketAddr::from((ip, settings.port));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Transport(format!("bind {addr}: {e}")))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Transport(e.to_string()))
}
