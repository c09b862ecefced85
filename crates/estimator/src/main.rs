//! Cost Estimator - construction project cost estimation service
//!
//! Accepts historical project datasets per company, trains a model for
//! each, and serves predictions, insights and what-if scenarios over HTTP.

use anyhow::{Context, Result};
use cost_estimator::{api, config::ServiceConfig};
use estimator_lib::{health::HealthRegistry, observability::StructuredLogger, CostEngine};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs, level from RUST_LOG
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = ServiceConfig::load().context("Failed to load service configuration")?;
    info!(
        service = %config.service_name,
        n_estimators = config.n_estimators,
        random_seed = config.random_seed,
        "Estimator configured"
    );

    let health_registry = HealthRegistry::new();
    api::register_components(&health_registry).await;

    let logger = StructuredLogger::new(&config.service_name);
    logger.log_startup(SERVICE_VERSION);

    let engine = Arc::new(CostEngine::with_logger(
        config.trainer_config(),
        logger.clone(),
    ));
    let app_state = Arc::new(api::AppState::new(
        engine,
        health_registry.clone(),
        config.service_name.clone(),
        config.max_upload_bytes,
    ));

    health_registry.set_ready(true).await;

    let server = tokio::spawn(api::serve(config.listen_addr(), app_state));

    tokio::select! {
        result = server => {
            match result {
                Ok(Err(e)) => error!(error = %e, "API server failed"),
                Err(e) => error!(error = %e, "API server task panicked"),
                Ok(Ok(())) => {}
            }
            logger.log_shutdown("API server stopped");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            logger.log_shutdown("SIGINT received");
        }
    }

    health_registry.set_ready(false).await;
    info!("Shutting down");

    Ok(())
}
