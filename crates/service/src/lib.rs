//! Service layer: business rules for payments and evidence on top of `models`.
//! - Persistence sits behind repository traits (MongoDB and in-memory impls).
//! - Handlers in `server` talk only to `PaymentService` / `EvidenceService`.
//! - CSV seeding lives in `ingest`.

pub mod errors;
pub mod pagination;
pub mod runtime;
pub mod payment;
pub mod evidence;
pub mod ingest;

use mongodb::bson::oid::ObjectId;

use crate::errors::ServiceError;

/// Parse a hex payment id coming from a URL path.
pub fn parse_payment_id(raw: &str) -> Result<ObjectId, ServiceError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| ServiceError::Validation("Invalid payment ID format".into()))
}
