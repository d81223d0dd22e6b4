//! # Tandem API Server
//!
//! The HTTP server for the Tandem accountability-partner platform:
//! invitations, member onboarding, match creation/dissolution, and the
//! rematch review workflow.
//!
//! ## Startup
//!
//! Configuration is read once from the environment; the database pool,
//! cache client, and mailer are constructed here and injected into the
//! application state for the life of the process.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p tandem-api
//! ```

use std::sync::Arc;

use tandem_api::{
    app::{build_router, AppState},
    config::Config,
};
use tandem_shared::cache::CacheClient;
use tandem_shared::db::migrations::run_migrations;
use tandem_shared::db::pool::{create_pool, DatabaseConfig};
use tandem_shared::notify::{HttpMailer, Mailer, NullMailer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tandem_api=debug,tandem_shared=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Tandem API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool).await?;

    let cache = CacheClient::connect(config.cache.url.as_deref()).await;

    let mailer: Arc<dyn Mailer> = match &config.mailer.endpoint {
        Some(endpoint) => Arc::new(HttpMailer::new(
            endpoint.clone(),
            config.mailer.api_key.clone(),
            config.mailer.from.clone(),
        )),
        None => Arc::new(NullMailer),
    };

    let bind_address = config.bind_address();
    let state = AppState::new(pool, cache, mailer, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received, exiting...");
        })
        .await?;

    Ok(())
}
