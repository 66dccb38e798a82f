//! Typed model of the deployment manifest (`docker-compose.yml`) with
//! schema-level lint checks.
//!
//! Nothing here talks to a container runtime: the manifest is read, checked
//! and written, and the orchestrator does the rest.

pub mod error;
pub mod model;
pub mod port;
pub mod volume;
pub mod lint;
pub mod stack;

pub use error::ManifestError;
pub use lint::{lint, Finding, LintReport, Severity};
pub use model::{
    BuildSpec, ComposeFile, DependsOn, Environment, LongPort, LongVolume, PortEntry, PortValue, ServiceSpec, VolumeEntry,
    VolumeSpec,
};
pub use port::{PortMapping, Protocol};
pub use volume::{MountSource, VolumeMount};
