use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot read manifest {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid port mapping '{spec}': {reason}")]
    Port { spec: String, reason: String },
    #[error("invalid volume mount '{spec}': {reason}")]
    Volume { spec: String, reason: String },
}

impl ManifestError {
    pub(crate) fn port(spec: &str, reason: impl Into<String>) -> Self {
        Self::Port { spec: spec.to_string(), reason: reason.into() }
    }

    pub(crate) fn volume(spec: &str, reason: impl Into<String>) -> Self {
        Self::Volume { spec: spec.to_string(), reason: reason.into() }
    }
}
