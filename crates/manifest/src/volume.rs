//! Service volume mounts: `source:target[:mode]`.

use crate::error::ManifestError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountSource {
    /// Host path (starts with `.`, `/` or `~`).
    Bind(String),
    /// Reference to a top-level named volume.
    Named(String),
    /// Only a container path was given.
    Anonymous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    pub source: MountSource,
    pub target: String,
    pub mode: Option<String>,
}

fn is_host_path(s: &str) -> bool {
    s.starts_with('.') || s.starts_with('/') || s.starts_with('~')
}

impl VolumeMount {
    pub fn parse(spec: &str) -> Result<Self, ManifestError> {
        let trimmed = spec.trim();
        let parts: Vec<&str> = trimmed.split(':').collect();
        let (source, target, mode) = match parts.as_slice() {
            [target] => (MountSource::Anonymous, *target, None),
            [source, target] => (classify(source), *target, None),
            [source, target, mode] => (classify(source), *target, Some(mode.to_string())),
            _ => return Err(ManifestError::volume(spec, "expected source:target[:mode]")),
        };
        if target.is_empty() || !target.starts_with('/') {
            return Err(ManifestError::volume(spec, "container path must be absolute"));
        }
        if matches!(&source, MountSource::Named(n) if n.is_empty()) {
            return Err(ManifestError::volume(spec, "empty source"));
        }
        if let Some(m) = &mode {
            if !m.split(',').all(|flag| matches!(flag, "ro" | "rw" | "z" | "Z" | "cached" | "delegated" | "consistent")) {
                return Err(ManifestError::volume(spec, format!("unknown mode '{m}'")));
            }
        }
        Ok(Self { source, target: target.to_string(), mode })
    }

    /// Long syntax: `type`, `source`, `target` and `read_only` keys.
    pub fn from_long(kind: &str, source: Option<&str>, target: &str, read_only: bool) -> Result<Self, ManifestError> {
        let spec = format!("type: {kind}, target: {target}");
        if !target.starts_with('/') {
            return Err(ManifestError::volume(&spec, "container path must be absolute"));
        }
        let source = source.map(str::trim).filter(|s| !s.is_empty());
        let source = match (kind, source) {
            ("bind", Some(path)) => MountSource::Bind(path.to_string()),
            ("bind", None) => return Err(ManifestError::volume(&spec, "bind mount needs a source")),
            ("volume", Some(name)) => MountSource::Named(name.to_string()),
            ("volume", None) | ("tmpfs", None) => MountSource::Anonymous,
            ("tmpfs", Some(_)) => return Err(ManifestError::volume(&spec, "tmpfs mount takes no source")),
            (other, _) => return Err(ManifestError::volume(&spec, format!("unsupported mount type '{other}'"))),
        };
        let mode = read_only.then(|| "ro".to_string());
        Ok(Self { source, target: target.to_string(), mode })
    }

    pub fn named_volume(&self) -> Option<&str> {
        match &self.source {
            MountSource::Named(n) => Some(n),
            _ => None,
        }
    }
}

fn classify(source: &str) -> MountSource {
    if is_host_path(source) {
        MountSource::Bind(source.to_string())
    } else {
        MountSource::Named(source.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_and_named_mounts() {
        let bind = VolumeMount::parse(".:/app").unwrap();
        assert_eq!(bind.source, MountSource::Bind(".".into()));
        assert_eq!(bind.named_volume(), None);

        let named = VolumeMount::parse("mongo_data:/data/db").unwrap();
        assert_eq!(named.named_volume(), Some("mongo_data"));
        assert_eq!(named.target, "/data/db");

        let ro = VolumeMount::parse("./seed:/seed:ro").unwrap();
        assert_eq!(ro.mode.as_deref(), Some("ro"));

        let anon = VolumeMount::parse("/var/cache").unwrap();
        assert_eq!(anon.source, MountSource::Anonymous);
    }

    #[test]
    fn long_syntax_mounts() {
        let named = VolumeMount::from_long("volume", Some("mongo_data"), "/data/db", false).unwrap();
        assert_eq!(named.named_volume(), Some("mongo_data"));
        assert_eq!(named.mode, None);

        let bind = VolumeMount::from_long("bind", Some("./seed"), "/seed", true).unwrap();
        assert_eq!(bind.source, MountSource::Bind("./seed".into()));
        assert_eq!(bind.mode.as_deref(), Some("ro"));

        assert_eq!(VolumeMount::from_long("tmpfs", None, "/tmp", false).unwrap().source, MountSource::Anonymous);
        assert!(VolumeMount::from_long("bind", None, "/seed", false).is_err());
        assert!(VolumeMount::from_long("volume", Some("data"), "relative", false).is_err());
        assert!(VolumeMount::from_long("npipe", Some("x"), "/x", false).is_err());
    }

    #[test]
    fn invalid_mounts() {
        for bad in ["data:relative", "a:/b:rx", "a:/b:ro:extra", ":/data", ""] {
            assert!(VolumeMount::parse(bad).is_err(), "{bad} should be rejected");
        }
    }
}
