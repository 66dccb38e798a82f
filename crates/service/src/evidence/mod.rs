//! Evidence files attached to payments.

pub mod repository;
pub mod service;

pub use repository::{EvidenceRepository, MongoEvidenceRepository};
pub use service::EvidenceService;
