//! Environment/runtime helpers
//!
//! Sanity checks on the files the server expects to find at startup.

use tracing::{info, warn};

/// Check the CSV seed file; returns whether startup ingest should run.
///
/// A missing file is not fatal: the server starts with whatever the
/// database already holds.
pub async fn ensure_env(csv_path: &str, ingest_enabled: bool) -> anyhow::Result<bool> {
    if !ingest_enabled {
        info!(%csv_path, "csv ingest disabled by configuration");
        return Ok(false);
    }
    match tokio::fs::metadata(csv_path).await {
        Ok(meta) if meta.is_file() => Ok(true),
        Ok(_) => Err(anyhow::anyhow!("{csv_path} exists but is not a regular file")),
        Err(_) => {
            warn!(%csv_path, "csv seed file not found; skipping startup ingest");
            Ok(false)
        }
    }
}
