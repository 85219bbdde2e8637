use tracing_subscriber::EnvFilter;

use tvshelf_api::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loads .env first so RUST_LOG from there is honored too.
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tvshelf_api=debug,tower_http=debug".into()),
        )
        .init();

    tvshelf_api::start_server(config).await
}
