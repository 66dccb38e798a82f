use std::sync::Arc;

use axum::Router;
use configs::AppConfig;
use service::{
    evidence::{EvidenceRepository, EvidenceService, MongoEvidenceRepository},
    ingest,
    payment::{MongoPaymentRepository, PaymentRepository, PaymentService},
    runtime,
};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::errors::StartupError;
use crate::observability::CSV_ROWS_INGESTED_TOTAL;
use crate::routes;

/// Shared handler state; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub payments: Arc<PaymentService>,
    pub evidence: Arc<EvidenceService>,
}

impl AppState {
    pub fn new(payments: Arc<dyn PaymentRepository>, evidence: Arc<dyn EvidenceRepository>) -> Self {
        Self {
            payments: Arc::new(PaymentService::new(Arc::clone(&payments), Arc::clone(&evidence))),
            evidence: Arc::new(EvidenceService::new(payments, evidence)),
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Seed the payments collection from the CSV file if enabled and present
async fn seed_from_csv(cfg: &AppConfig, payments: &dyn PaymentRepository) -> Result<(), StartupError> {
    let should_ingest = runtime::ensure_env(&cfg.ingest).await?;
    if !should_ingest {
        return Ok(());
    }
    let summary = ingest::load_csv(payments, &cfg.ingest)
        .await
        .map_err(|e| StartupError::Ingest(e.to_string()))?;
    CSV_ROWS_INGESTED_TOTAL.inc_by(summary.inserted as u64);
    if summary.skipped > 0 {
        warn!(skipped = summary.skipped, "some csv rows were skipped");
    }
    info!(
        event = "csv_ingest",
        inserted = summary.inserted,
        skipped = summary.skipped,
        already_populated = summary.already_populated,
        "initial ingest finished"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for ctrl_c");
        return;
    }
    info!(event = "shutdown_signal", "received Ctrl+C, draining connections");
}

/// Public entry: connect to MongoDB, seed from CSV, then serve HTTP until Ctrl+C
pub async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;

    let db = models::db::connect(&cfg.database).await?;
    models::db::ping(&db)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    info!(event = "db_connected", database = %cfg.database.name, "mongodb reachable");

    let payments: Arc<dyn PaymentRepository> = Arc::new(MongoPaymentRepository::new(&db));
    let evidence: Arc<dyn EvidenceRepository> = Arc::new(MongoEvidenceRepository::new(&db));

    seed_from_csv(&cfg, payments.as_ref()).await?;

    let state = AppState::new(payments, evidence);
    let app: Router = routes::build_router(state, build_cors(), cfg.server.max_upload_bytes);

    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "starting server crate");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!(event = "stop", "server stopped");
    Ok(())
}
