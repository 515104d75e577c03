//! GrowHub server wiring: configuration, pool, metrics and the HTTP app.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;

pub use config::Config;

use anyhow::Context;
use growhub_core::Commerce;
use growhub_core::environment::SystemClock;
use growhub_core::metrics::register_commerce_metrics;
use growhub_core::notifier::TracingNotifier;
use growhub_postgres::{PostgresLedgerStore, register_store_metrics};
use growhub_web::{AppState, build_router};
use metrics_exporter_prometheus::PrometheusBuilder;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;

/// Install the Prometheus exporter on the metrics listener and describe every metric.
///
/// # Errors
///
/// Returns an error if the address is invalid or the exporter cannot be installed.
pub fn install_metrics(config: &Config) -> anyhow::Result<()> {
    let addr: SocketAddr = config
        .server
        .metrics_addr()
        .parse()
        .context("Invalid metrics address")?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;

    register_commerce_metrics();
    register_store_metrics();
    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

/// Connect the pool, optionally migrate, and build the router.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn build_app(config: &Config) -> anyhow::Result<axum::Router> {
    let db = &config.database;
    let pool = PgPoolOptions::new()
        .max_connections(db.max_connections)
        .min_connections(db.min_connections)
        .acquire_timeout(db.connect_timeout())
        .idle_timeout(db.idle_timeout())
        .connect(&db.url)
        .await
        .context("Failed to connect to the Ledger Store")?;

    let store = PostgresLedgerStore::from_pool(pool);
    if db.run_migrations {
        store.migrate().await?;
    }

    let commerce = Commerce::new(
        Arc::new(store),
        Arc::new(SystemClock),
        Arc::new(TracingNotifier),
    );
    Ok(build_router(AppState::new(commerce)))
}
