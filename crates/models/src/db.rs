use std::time::Duration;

use configs::DatabaseConfig;
use mongodb::{bson::doc, options::ClientOptions, Client, Database};
use tracing::info;

pub const PAYMENTS_COLLECTION: &str = "payments";
pub const EVIDENCE_COLLECTION: &str = "evidence";

const APP_NAME: &str = "payments-server";

/// Build a client from `database.uri` and return the configured database handle.
///
/// The driver connects lazily; call [`ping`] to fail fast on an unreachable server.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<Database> {
    let mut opts = ClientOptions::parse(&cfg.uri).await?;
    let timeout = Duration::from_secs(cfg.connect_timeout_secs);
    opts.connect_timeout = Some(timeout);
    opts.server_selection_timeout = Some(timeout);
    opts.app_name = Some(APP_NAME.to_string());

    let client = Client::with_options(opts)?;
    info!(database = %cfg.name, "mongodb client created");
    Ok(client.database(&cfg.name))
}

pub async fn ping(db: &Database) -> anyhow::Result<()> {
    db.run_command(doc! { "ping": 1 }).await?;
    Ok(())
}
