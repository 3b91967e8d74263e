//! Card Gateway Service - Main Application Entry Point
//!
//! A REST API that validates card payments, submits them to the payment
//! gateway and keeps an auditable record of every attempt.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Gateway Client**: reqwest with a bounded timeout
//! - **Storage**: PostgreSQL with sqlx, or in-memory when no database is configured
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Choose the record store (and run migrations for PostgreSQL)
//! 3. Build the gateway client
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured port

use std::sync::Arc;

use card_gateway::{
    config::Config,
    db, handlers,
    services::{
        gateway_client::HttpGateway,
        reference::{ReferenceGenerator, SequentialReferenceGenerator},
        transaction_service::TransactionService,
    },
    store::{InMemoryTransactionStore, PgReferenceGenerator, PgTransactionStore, TransactionStore},
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        gateway = %config.gateway_url,
        timeout_secs = config.gateway_timeout_secs,
        "Configuration loaded"
    );

    let (store, references): (Arc<dyn TransactionStore>, Arc<dyn ReferenceGenerator>) =
        match &config.database_url {
            Some(database_url) => {
                let pool = db::create_pool(database_url).await?;
                tracing::info!("Database pool created");

                db::run_migrations(&pool).await?;
                tracing::info!("Database migrations complete");

                (
                    Arc::new(PgTransactionStore::new(pool.clone())),
                    Arc::new(PgReferenceGenerator::new(pool)),
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set, transactions are kept in memory only");
                (
                    Arc::new(InMemoryTransactionStore::new()),
                    Arc::new(SequentialReferenceGenerator::default()),
                )
            }
        };

    let gateway = HttpGateway::new(config.gateway_url.clone(), config.gateway_timeout())?;
    let service = Arc::new(TransactionService::new(
        Arc::new(gateway),
        store,
        references,
    ));

    let app = handlers::router(service).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
