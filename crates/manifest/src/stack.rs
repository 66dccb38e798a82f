//! The manifest this repository ships: one MongoDB service and the API
//! server built from the repository root.

use std::collections::BTreeMap;

use crate::model::{BuildSpec, ComposeFile, DependsOn, EnvValue, Environment, PortEntry, ServiceSpec};

pub const DATABASE_SERVICE: &str = "mongo";
pub const APP_SERVICE: &str = "app";
pub const DATA_VOLUME: &str = "mongo_data";

impl ComposeFile {
    pub fn payment_stack(database_name: &str) -> Self {
        let mongo = ServiceSpec {
            image: Some("mongo".into()),
            ports: vec![PortEntry::Text("27017:27017".into())],
            volumes: vec![format!("{DATA_VOLUME}:/data/db").into()],
            ..Default::default()
        };

        let mut env = BTreeMap::new();
        env.insert(
            "MONGODB_URI".to_string(),
            Some(EnvValue::Text(format!("mongodb://{DATABASE_SERVICE}:27017"))),
        );
        env.insert("DATABASE_NAME".to_string(), Some(EnvValue::Text(database_name.to_string())));

        let app = ServiceSpec {
            build: Some(BuildSpec::Context(".".into())),
            ports: vec![PortEntry::Text("8000:8000".into())],
            depends_on: DependsOn::List(vec![DATABASE_SERVICE.into()]),
            environment: Environment::Map(env),
            volumes: vec![".:/app".into()],
            ..Default::default()
        };

        let mut services = BTreeMap::new();
        services.insert(DATABASE_SERVICE.to_string(), mongo);
        services.insert(APP_SERVICE.to_string(), app);

        let mut volumes = BTreeMap::new();
        volumes.insert(DATA_VOLUME.to_string(), None);

        ComposeFile { version: None, services, volumes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::lint;
    use crate::port::PortMapping;

    const SHIPPED: &str = include_str!("../../../docker-compose.yml");

    #[test]
    fn shipped_manifest_matches_builder() {
        let shipped = ComposeFile::from_yaml_str(SHIPPED).unwrap();
        assert_eq!(shipped, ComposeFile::payment_stack("payments"));
    }

    #[test]
    fn shipped_manifest_lints_clean() {
        let report = lint(&ComposeFile::from_yaml_str(SHIPPED).unwrap());
        assert!(report.findings.is_empty(), "{:?}", report.findings);
    }

    #[test]
    fn app_points_at_database_service() {
        let stack = ComposeFile::payment_stack("ledger");
        let app = stack.service(APP_SERVICE).unwrap();
        assert_eq!(app.depends_on.names(), vec![DATABASE_SERVICE]);
        assert_eq!(app.environment.get("MONGODB_URI").as_deref(), Some("mongodb://mongo:27017"));
        assert_eq!(app.environment.get("DATABASE_NAME").as_deref(), Some("ledger"));

        let ports: Vec<PortMapping> = stack
            .services
            .values()
            .flat_map(|s| s.ports.iter())
            .map(|p| p.mapping().unwrap())
            .collect();
        assert!(ports.contains(&PortMapping::published(27017, 27017)));
        assert!(ports.contains(&PortMapping::published(8000, 8000)));
    }

    #[test]
    fn builder_survives_yaml_round_trip() {
        let stack = ComposeFile::payment_stack("payments");
        let yaml = stack.to_yaml().unwrap();
        assert_eq!(ComposeFile::from_yaml_str(&yaml).unwrap(), stack);
    }
}
