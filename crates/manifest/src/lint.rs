//! Schema-level checks on a parsed manifest.
//!
//! These mirror what an orchestrator would reject (or silently mis-wire)
//! at startup: bad port syntax, dangling dependencies, undeclared volumes.

use std::collections::BTreeSet;
use std::fmt;

use crate::model::{ComposeFile, Environment};
use crate::port::PortMapping;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub rule: &'static str,
    pub service: Option<String>,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.service {
            Some(s) => write!(f, "{}[{}] service '{}': {}", self.severity, self.rule, s, self.message),
            None => write!(f, "{}[{}]: {}", self.severity, self.rule, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintReport {
    pub findings: Vec<Finding>,
}

impl LintReport {
    pub fn is_ok(&self) -> bool {
        !self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Error)
    }

    pub fn has_rule(&self, rule: &str) -> bool {
        self.findings.iter().any(|f| f.rule == rule)
    }

    fn push(&mut self, severity: Severity, rule: &'static str, service: Option<&str>, message: String) {
        self.findings.push(Finding { severity, rule, service: service.map(str::to_string), message });
    }

    fn error(&mut self, rule: &'static str, service: &str, message: String) {
        self.push(Severity::Error, rule, Some(service), message);
    }
}

/// Two host bindings collide when port and protocol match and either side
/// listens on every interface or both name the same address.
fn same_host_socket(a: &PortMapping, b: &PortMapping) -> bool {
    a.host == b.host
        && a.protocol == b.protocol
        && (a.binds_all_interfaces() || b.binds_all_interfaces() || a.host_ip == b.host_ip)
}

pub fn lint(file: &ComposeFile) -> LintReport {
    let mut report = LintReport::default();
    let mut published: Vec<(PortMapping, String)> = Vec::new();
    let mut mounted: BTreeSet<String> = BTreeSet::new();

    if file.services.is_empty() {
        report.push(Severity::Error, "no-services", None, "manifest declares no services".into());
    }

    for (name, svc) in &file.services {
        match (&svc.image, &svc.build) {
            (None, None) => report.error("service-source", name, "declares neither image nor build".into()),
            (Some(_), Some(_)) => report.error("service-source", name, "declares both image and build".into()),
            _ => {}
        }

        for entry in &svc.ports {
            match entry.mapping() {
                Ok(mapping) => {
                    if let Some(host) = mapping.host {
                        if let Some(other) = published.iter().find(|(p, _)| same_host_socket(p, &mapping)).map(|(_, s)| s) {
                            report.error(
                                "port-conflict",
                                name,
                                format!("host port {host}/{} already published by '{other}'", mapping.protocol.as_str()),
                            );
                        }
                        published.push((mapping, name.clone()));
                    }
                }
                Err(e) => report.error("port-syntax", name, e.to_string()),
            }
        }

        for dep in svc.depends_on.names() {
            if dep == name {
                report.error("self-dependency", name, "depends on itself".into());
            } else if !file.services.contains_key(dep) {
                report.error("unknown-dependency", name, format!("depends on undefined service '{dep}'"));
            }
        }

        for entry in &svc.volumes {
            match entry.mount() {
                Ok(mount) => {
                    if let Some(vol) = mount.named_volume() {
                        mounted.insert(vol.to_string());
                        if !file.volumes.contains_key(vol) {
                            report.error(
                                "undeclared-volume",
                                name,
                                format!("mounts named volume '{vol}' which is not declared under top-level volumes"),
                            );
                        }
                    }
                }
                Err(e) => report.error("volume-syntax", name, e.to_string()),
            }
        }

        if let Environment::List(entries) = &svc.environment {
            for entry in entries {
                let key = entry.split_once('=').map(|(k, _)| k).unwrap_or(entry.as_str());
                if key.trim().is_empty() {
                    report.error("environment-syntax", name, format!("environment entry '{entry}' has no key"));
                }
            }
        }
    }

    for vol in file.volumes.keys() {
        if !mounted.contains(vol) {
            report.push(Severity::Warning, "unused-volume", None, format!("volume '{vol}' is declared but never mounted"));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(yaml: &str) -> LintReport {
        lint(&ComposeFile::from_yaml_str(yaml).unwrap())
    }

    #[test]
    fn dangling_dependency_and_volume() {
        let r = report(
            r#"
services:
  app:
    build: .
    depends_on: [db]
    volumes:
      - data:/var/lib/data
"#,
        );
        assert!(!r.is_ok());
        assert!(r.has_rule("unknown-dependency"));
        assert!(r.has_rule("undeclared-volume"));
        assert_eq!(r.errors().count(), 2);
    }

    #[test]
    fn bad_ports_and_conflicts() {
        let r = report(
            r#"
services:
  a:
    image: nginx
    ports: ["8080:80", "80:abc"]
  b:
    image: nginx
    ports: ["8080:8080", "8080:8080/udp"]
"#,
        );
        assert!(r.has_rule("port-syntax"));
        let conflicts: Vec<_> = r.findings.iter().filter(|f| f.rule == "port-conflict").collect();
        assert_eq!(conflicts.len(), 1, "udp on the same number is a different socket");
        assert_eq!(conflicts[0].service.as_deref(), Some("b"));
    }

    #[test]
    fn wildcard_and_explicit_any_address_conflict() {
        let r = report(
            r#"
services:
  a:
    image: nginx
    ports: ["8080:80"]
  b:
    image: nginx
    ports: ["0.0.0.0:8080:80"]
  c:
    image: nginx
    ports: ["127.0.0.1:9000:80"]
  d:
    image: nginx
    ports: ["127.0.0.2:9000:80"]
"#,
        );
        let conflicts: Vec<_> = r.findings.iter().filter(|f| f.rule == "port-conflict").collect();
        assert_eq!(conflicts.len(), 1, "{conflicts:?}");
        assert_eq!(conflicts[0].service.as_deref(), Some("b"));
    }

    #[test]
    fn long_syntax_entries_are_checked() {
        let r = report(
            r#"
services:
  a:
    image: mongo
    ports:
      - target: 27017
        published: "27017"
    volumes:
      - type: volume
        source: undeclared
        target: /data/db
  b:
    image: mongo
    ports:
      - target: 27018
        published: 27017
"#,
        );
        assert!(r.has_rule("undeclared-volume"));
        assert!(r.has_rule("port-conflict"));
        assert!(!r.has_rule("port-syntax"));
    }

    #[test]
    fn service_source_and_self_dependency() {
        let r = report(
            r#"
services:
  nothing:
    depends_on: [nothing]
  both:
    image: x
    build: .
"#,
        );
        assert_eq!(r.findings.iter().filter(|f| f.rule == "service-source").count(), 2);
        assert!(r.has_rule("self-dependency"));
    }

    #[test]
    fn unused_volume_is_only_a_warning() {
        let r = report(
            r#"
services:
  a:
    image: x
    environment: ["=oops", "OK=1"]
volumes:
  spare:
"#,
        );
        assert!(r.has_rule("unused-volume"));
        assert!(r.has_rule("environment-syntax"));
        assert_eq!(r.errors().count(), 1);
    }

    #[test]
    fn empty_manifest_is_rejected() {
        assert!(!report("services: {}\n").is_ok());
    }

    #[test]
    fn finding_display() {
        let f = Finding { severity: Severity::Error, rule: "port-syntax", service: Some("a".into()), message: "bad".into() };
        assert_eq!(f.to_string(), "error[port-syntax] service 'a': bad");
    }
}
