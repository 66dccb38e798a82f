use std::io;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info,tower_http=info,axum=info,mongodb=warn";

/// Initialize tracing subscriber with sensible defaults and stdout writer.
/// - Respects `RUST_LOG` if set
/// - Falls back to `info,tower_http=info,axum=info,mongodb=warn`
/// - Writes to stdout so `docker compose logs` picks everything up
pub fn init_logging_default() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// Initialize tracing subscriber with JSON structured output.
/// - Respects `RUST_LOG` if set
/// - Emits one JSON object per event for log shippers
pub fn init_logging_json() {
    // 请求级别的细节放在 server::routes 下，需要时用 RUST_LOG=info,server=debug 打开
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .json()
        .with_writer(io::stdout)
        .try_init();
}

/// Pick the formatter from `LOG_FORMAT` (`json` or anything else for compact).
pub fn init_logging_from_env() {
    if wants_json(std::env::var("LOG_FORMAT").ok().as_deref()) {
        init_logging_json();
    } else {
        init_logging_default();
    }
}

fn wants_json(format: Option<&str>) -> bool {
    matches!(format.map(|f| f.trim().to_ascii_lowercase()), Some(f) if f == "json")
}
