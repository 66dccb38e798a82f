//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so the server crate can decide on the
//! startup ingest from an `IngestConfig` alone.

use configs::IngestConfig;

/// Returns whether the CSV seed should be loaded on this start.
pub async fn ensure_env(ingest: &IngestConfig) -> anyhow::Result<bool> {
    common::env::ensure_env(&ingest.csv_path, ingest.enabled).await
}
