//! Compose file data model.
//!
//! Maps are `BTreeMap` so a re-serialised manifest is stable and diffable.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ManifestError;
use crate::port::PortMapping;
use crate::volume::VolumeMount;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposeFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceSpec>,
    /// Value is `None` for the common `name:` (empty body) declaration.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub volumes: BTreeMap<String, Option<VolumeSpec>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Command>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortEntry>,
    #[serde(default, skip_serializing_if = "DependsOn::is_empty")]
    pub depends_on: DependsOn,
    #[serde(default, skip_serializing_if = "Environment::is_empty")]
    pub environment: Environment,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<VolumeEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,
}

/// `build: .` or `build: { context, dockerfile }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildSpec {
    Context(String),
    Detailed {
        context: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dockerfile: Option<String>,
    },
}

impl BuildSpec {
    pub fn context(&self) -> &str {
        match self {
            BuildSpec::Context(c) => c,
            BuildSpec::Detailed { context, .. } => context,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Command {
    Shell(String),
    Exec(Vec<String>),
}

/// A `ports:` entry: bare number, `[ip:][host:]container[/proto]` string, or long-syntax map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortEntry {
    Number(u32),
    Text(String),
    Long(LongPort),
}

/// `published` may be written as a number or a quoted string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Number(u32),
    Text(String),
}

impl PortValue {
    pub fn render(&self) -> String {
        match self {
            PortValue::Number(n) => n.to_string(),
            PortValue::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongPort {
    pub target: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<PortValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl PortEntry {
    pub fn mapping(&self) -> Result<PortMapping, ManifestError> {
        match self {
            PortEntry::Number(n) => PortMapping::parse(&n.to_string()),
            PortEntry::Text(s) => PortMapping::parse(s),
            PortEntry::Long(l) => PortMapping::from_long(
                l.target,
                l.published.as_ref().map(PortValue::render).as_deref(),
                l.host_ip.as_deref(),
                l.protocol.as_deref(),
            ),
        }
    }
}

/// A service `volumes:` entry: `source:target[:mode]` string or long-syntax map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VolumeEntry {
    Short(String),
    Long(LongVolume),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongVolume {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub target: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

impl VolumeEntry {
    pub fn mount(&self) -> Result<VolumeMount, ManifestError> {
        match self {
            VolumeEntry::Short(spec) => VolumeMount::parse(spec),
            VolumeEntry::Long(l) => VolumeMount::from_long(&l.kind, l.source.as_deref(), &l.target, l.read_only),
        }
    }
}

impl From<&str> for VolumeEntry {
    fn from(spec: &str) -> Self {
        VolumeEntry::Short(spec.to_string())
    }
}

impl From<String> for VolumeEntry {
    fn from(spec: String) -> Self {
        VolumeEntry::Short(spec)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependsOnCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// `depends_on` as a list or as a map of service → condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependsOn {
    List(Vec<String>),
    Map(BTreeMap<String, DependsOnCondition>),
}

impl Default for DependsOn {
    fn default() -> Self {
        DependsOn::List(Vec::new())
    }
}

impl DependsOn {
    pub fn names(&self) -> Vec<&str> {
        match self {
            DependsOn::List(v) => v.iter().map(String::as_str).collect(),
            DependsOn::Map(m) => m.keys().map(String::as_str).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            DependsOn::List(v) => v.is_empty(),
            DependsOn::Map(m) => m.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl EnvValue {
    pub fn render(&self) -> String {
        match self {
            EnvValue::Text(s) => s.clone(),
            EnvValue::Integer(n) => n.to_string(),
            EnvValue::Float(f) => f.to_string(),
            EnvValue::Bool(b) => b.to_string(),
        }
    }
}

/// `environment:` as `KEY: value` map or `KEY=value` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Environment {
    Map(BTreeMap<String, Option<EnvValue>>),
    List(Vec<String>),
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Map(BTreeMap::new())
    }
}

impl Environment {
    pub fn is_empty(&self) -> bool {
        match self {
            Environment::Map(m) => m.is_empty(),
            Environment::List(v) => v.is_empty(),
        }
    }

    /// Resolved `(key, value)` pairs; list entries without `=` yield an empty value.
    pub fn pairs(&self) -> Vec<(String, String)> {
        match self {
            Environment::Map(m) => m
                .iter()
                .map(|(k, v)| (k.clone(), v.as_ref().map(EnvValue::render).unwrap_or_default()))
                .collect(),
            Environment::List(v) => v
                .iter()
                .map(|entry| match entry.split_once('=') {
                    Some((k, val)) => (k.to_string(), val.to_string()),
                    None => (entry.clone(), String::new()),
                })
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.pairs().into_iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<bool>,
}

impl ComposeFile {
    /// Goes through `serde_yaml::Value` so duplicate mapping keys (two
    /// services or volumes with the same name) are rejected instead of
    /// the later one silently replacing the earlier.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ManifestError> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        Ok(serde_yaml::from_value(value)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| ManifestError::Io { path: path.display().to_string(), source })?;
        let file = Self::from_yaml_str(&content)?;
        debug!(path = %path.display(), services = file.services.len(), "manifest loaded");
        Ok(file)
    }

    pub fn to_yaml(&self) -> Result<String, ManifestError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn service(&self, name: &str) -> Option<&ServiceSpec> {
        self.services.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_FORMS: &str = r#"
services:
  db:
    image: postgres:16
    ports:
      - 5432
    environment:
      - POSTGRES_PASSWORD=secret
      - DEBUG
  web:
    build:
      context: ./web
      dockerfile: Dockerfile.dev
    depends_on:
      db:
        condition: service_healthy
    environment:
      WORKERS: 4
      RATIO: 0.5
      VERBOSE: true
      EMPTY:
"#;

    #[test]
    fn alternate_syntaxes_parse() {
        let f = ComposeFile::from_yaml_str(LIST_FORMS).unwrap();
        let db = f.service("db").unwrap();
        assert_eq!(db.ports, vec![PortEntry::Number(5432)]);
        assert_eq!(db.environment.get("POSTGRES_PASSWORD").as_deref(), Some("secret"));
        assert_eq!(db.environment.get("DEBUG").as_deref(), Some(""));

        let web = f.service("web").unwrap();
        assert_eq!(web.build.as_ref().map(BuildSpec::context), Some("./web"));
        assert_eq!(web.depends_on.names(), vec!["db"]);
        assert_eq!(web.environment.get("WORKERS").as_deref(), Some("4"));
        assert_eq!(web.environment.get("RATIO").as_deref(), Some("0.5"));
        assert_eq!(web.environment.get("VERBOSE").as_deref(), Some("true"));
        assert_eq!(web.environment.get("EMPTY").as_deref(), Some(""));
    }

    #[test]
    fn yaml_output_parses_back_identically() {
        let f = ComposeFile::from_yaml_str(LIST_FORMS).unwrap();
        let again = ComposeFile::from_yaml_str(&f.to_yaml().unwrap()).unwrap();
        assert_eq!(again, f);
    }

    #[test]
    fn broken_yaml_is_an_error() {
        assert!(matches!(ComposeFile::from_yaml_str("services: [unclosed"), Err(ManifestError::Yaml(_))));
        assert!(matches!(ComposeFile::from_yaml_str("services:\n  a:\n    ports: {x: 1}\n"), Err(ManifestError::Yaml(_))));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let services = "services:\n  app: {image: a}\n  app: {image: b}\n";
        assert!(matches!(ComposeFile::from_yaml_str(services), Err(ManifestError::Yaml(_))));

        let volumes = "services:\n  app: {image: a}\nvolumes:\n  data:\n  data:\n";
        assert!(matches!(ComposeFile::from_yaml_str(volumes), Err(ManifestError::Yaml(_))));
    }

    #[test]
    fn long_port_and_volume_syntax() {
        let f = ComposeFile::from_yaml_str(
            r#"
services:
  db:
    image: mongo
    ports:
      - target: 27017
        published: "27017"
      - target: 53
        published: 5353
        host_ip: 127.0.0.1
        protocol: udp
    volumes:
      - type: volume
        source: data
        target: /data/db
      - type: bind
        source: ./seed
        target: /seed
        read_only: true
volumes:
  data:
"#,
        )
        .unwrap();
        let db = f.service("db").unwrap();
        let ports: Vec<PortMapping> = db.ports.iter().map(|p| p.mapping().unwrap()).collect();
        assert_eq!(ports[0], PortMapping::published(27017, 27017));
        assert_eq!(ports[1].to_string(), "127.0.0.1:5353:53/udp");

        let mounts: Vec<VolumeMount> = db.volumes.iter().map(|v| v.mount().unwrap()).collect();
        assert_eq!(mounts[0].named_volume(), Some("data"));
        assert_eq!(mounts[1].mode.as_deref(), Some("ro"));

        let again = ComposeFile::from_yaml_str(&f.to_yaml().unwrap()).unwrap();
        assert_eq!(again, f);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ComposeFile::load("/no/such/compose.yml").unwrap_err();
        assert!(err.to_string().contains("/no/such/compose.yml"));
    }
}
