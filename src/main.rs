use axum::serve;
use driftwatch::api::routes::create_router;
use driftwatch::config::AppConfig;
use driftwatch::store::MemoryStore;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with explicit filter to suppress reqwest debug logs
    use env_logger::Builder;
    use log::LevelFilter;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("reqwest", LevelFilter::Warn)
        .init();

    println!("Driftwatch: API Contract Drift Monitor");

    let config = AppConfig::load()?;
    println!(
        "Configuration loaded: server={}:{}, monitoring {} services",
        config.server.host,
        config.server.port,
        config.services.len()
    );
    for service in &config.services {
        println!("  - {} at {}", service.name, service.url);
    }
    if config.enrichment.endpoint.is_none() {
        println!("Enrichment endpoint not configured, AI annotations disabled");
    }

    let store = Arc::new(MemoryStore::new());
    let ctx = Arc::new(driftwatch::build_context(store, &config));

    run_server(create_router().with_state(ctx), &config).await?;

    Ok(())
}

async fn run_server(app: axum::Router, config: &AppConfig) -> anyhow::Result<()> {
    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    println!("Driftwatch server running on http://{}", bind_address);

    serve(listener, app).await?;

    Ok(())
}
