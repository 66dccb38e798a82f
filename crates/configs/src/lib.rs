use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Upper bound on request bodies; evidence files live inside one BSON document.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            worker_threads: Some(4),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { uri: String::new(), name: String::new(), connect_timeout_secs: default_connect_timeout() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Skip the seed when the payments collection already has documents.
    #[serde(default = "default_true")]
    pub skip_if_populated: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { csv_path: default_csv_path(), enabled: true, skip_if_populated: true }
    }
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 8000 }
fn default_max_upload_bytes() -> usize { 15 * 1024 * 1024 }
fn default_connect_timeout() -> u64 { 10 }
fn default_csv_path() -> String { "./payment_information.csv".into() }
fn default_true() -> bool { true }

pub fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

/// Load `config.toml` (or `$CONFIG_PATH`); a missing file yields defaults.
pub fn load_default() -> Result<AppConfig> {
    let path = config_path();
    if Path::new(&path).exists() {
        load_from_file(&path)
    } else {
        Ok(AppConfig::default())
    }
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)
        .map_err(|e| anyhow!("failed to parse {path}: {e}"))?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.apply_env_overrides(|key| std::env::var(key).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Environment variables win over file values when set and non-empty.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("SERVER_PORT").and_then(|p| p.trim().parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(w) = get("TOKIO_WORKER_THREADS").and_then(|v| v.trim().parse::<usize>().ok()) {
            self.server.worker_threads = Some(w);
        }
        if let Some(uri) = get("MONGODB_URI") {
            self.database.uri = uri;
        }
        if let Some(name) = get("DATABASE_NAME") {
            self.database.name = name;
        }
        if let Some(path) = get("CSV_FILE_PATH") {
            self.ingest.csv_path = path;
        }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.validate()?;
        if self.ingest.csv_path.trim().is_empty() {
            self.ingest.csv_path = default_csv_path();
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port 必须在 1..=65535 范围内"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        if self.max_upload_bytes == 0 {
            self.max_upload_bytes = default_max_upload_bytes();
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.uri.trim().is_empty() {
            return Err(anyhow!("database.uri 为空；请在 config.toml 或环境变量 MONGODB_URI 中提供"));
        }
        let lower = self.uri.to_lowercase();
        if !(lower.starts_with("mongodb://") || lower.starts_with("mongodb+srv://")) {
            return Err(anyhow!("database.uri 必须以 mongodb:// 或 mongodb+srv:// 开头"));
        }
        if self.name.trim().is_empty() {
            return Err(anyhow!("database.name 为空；请在 config.toml 或环境变量 DATABASE_NAME 中提供"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(anyhow!("database.connect_timeout_secs 必须为正整数秒"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_compose_ports() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.ingest.csv_path, "./payment_information.csv");
        assert!(cfg.ingest.enabled);
        assert!(cfg.ingest.skip_if_populated);
    }

    #[test]
    fn env_only_configuration_validates() -> Result<()> {
        let mut cfg = AppConfig::default();
        cfg.apply_env_overrides(env(&[
            ("MONGODB_URI", "mongodb://mongo:27017"),
            ("DATABASE_NAME", "payments"),
            ("CSV_FILE_PATH", "/app/seed.csv"),
        ]));
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.database.uri, "mongodb://mongo:27017");
        assert_eq!(cfg.database.name, "payments");
        assert_eq!(cfg.ingest.csv_path, "/app/seed.csv");
        Ok(())
    }

    #[test]
    fn missing_database_settings_are_rejected() {
        let mut cfg = AppConfig::default();
        assert!(cfg.normalize_and_validate().is_err());

        cfg.apply_env_overrides(env(&[("MONGODB_URI", "mongodb://localhost:27017")]));
        assert!(cfg.normalize_and_validate().is_err(), "name still missing");
    }

    #[test]
    fn non_mongo_uri_is_rejected() {
        let mut cfg = AppConfig::default();
        cfg.apply_env_overrides(env(&[
            ("MONGODB_URI", "postgres://localhost/db"),
            ("DATABASE_NAME", "payments"),
        ]));
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn blank_and_garbage_env_values_are_ignored() {
        let mut cfg = AppConfig::default();
        cfg.apply_env_overrides(env(&[("SERVER_HOST", "  "), ("SERVER_PORT", "eighty")]));
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8000);
    }

    #[test]
    fn file_values_then_env_overrides() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(
            file,
            r#"
[server]
host = "127.0.0.1"
port = 9000
worker_threads = 0

[database]
uri = "mongodb://localhost:27017"
name = "from_file"

[ingest]
enabled = false
"#
        )?;
        let mut cfg = load_from_file(file.path().to_str().unwrap())?;
        cfg.apply_env_overrides(env(&[("DATABASE_NAME", "from_env")]));
        cfg.normalize_and_validate()?;

        assert_eq!(cfg.bind_addr(), "127.0.0.1:9000");
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.database.name, "from_env");
        assert_eq!(cfg.database.connect_timeout_secs, 10);
        assert!(!cfg.ingest.enabled);
        Ok(())
    }

    #[test]
    fn malformed_file_is_an_error() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "[server\nport = ")?;
        assert!(load_from_file(file.path().to_str().unwrap()).is_err());
        Ok(())
    }
}
