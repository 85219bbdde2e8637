pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use std::sync::Arc;

use crate::config::{Config, StoreBackend};
use crate::state::AppState;
use crate::store::{DocumentStore, MemoryStore, PgStore};

/// Builds the configured document store and serves the API on it.
pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let store: Arc<dyn DocumentStore> = match config.store {
        StoreBackend::Postgres => {
            let pool = store::postgres::create_pool(&config.database_url).await?;
            let store = PgStore::new(pool);
            store.migrate().await?;
            tracing::info!("connected to postgres and ran migrations");
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(store);
    let app = routes::create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "tvshelf-api listening");

    axum::serve(listener, app).await?;

    Ok(())
}
