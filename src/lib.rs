pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;
pub use api::{AppContext, AppState};

// Export client types
pub use client::{DescriptorClient, Enricher, HttpDescriptorClient, HttpEnricher, NoopEnricher};

// Export logic types
pub use logic::{
    AnalysisRunner, BaselineResolver, BatchAnalysisResult, ChangeLedger, ChangeStatistics,
    Comparator, CompareContext, ServiceAnalysisStatus, ServiceChangeSummary,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{MemoryStore, Store};

pub use error::MonitorError;

/// Builds the full application stack from configuration and serves it.
/// Also used by integration-style tests that want a real listener.
pub async fn run_server() -> anyhow::Result<()> {
    use axum::serve;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with INFO level only (suppress DEBUG logs)
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    let config = crate::config::AppConfig::load()?;

    let store = Arc::new(crate::store::MemoryStore::new());
    let ctx = Arc::new(crate::build_context(store, &config));

    let app = crate::api::routes::create_router().with_state(ctx);

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;

    serve(listener, app).await?;

    Ok(())
}

/// Wires the descriptor client, enricher and analysis runner for a store.
pub fn build_context<S: Store>(
    store: std::sync::Arc<S>,
    config: &config::AppConfig,
) -> AppContext<S> {
    use std::sync::Arc;

    let descriptors: Arc<dyn DescriptorClient> =
        Arc::new(HttpDescriptorClient::new(&config.services));

    let enricher: Arc<dyn Enricher> = match &config.enrichment.endpoint {
        Some(endpoint) => Arc::new(HttpEnricher::new(endpoint.clone(), &config.enrichment)),
        None => Arc::new(NoopEnricher),
    };

    let runner = AnalysisRunner::new(
        store.clone(),
        descriptors,
        enricher,
        config.known_service_names(),
    );

    AppContext {
        store,
        runner,
        retention_keep_default: config.retention.keep_default,
    }
}
