use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Db(String),
    #[error("ingest error: {0}")]
    Ingest(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// Message without the variant prefix, for client-facing error bodies.
    pub fn detail(&self) -> String {
        match self {
            ServiceError::Validation(m)
            | ServiceError::NotFound(m)
            | ServiceError::Db(m)
            | ServiceError::Ingest(m)
            | ServiceError::Model(models::errors::ModelError::Validation(m)) => m.clone(),
        }
    }
}

impl From<mongodb::error::Error> for ServiceError {
    fn from(e: mongodb::error::Error) -> Self { ServiceError::Db(e.to_string()) }
}

impl From<mongodb::bson::ser::Error> for ServiceError {
    fn from(e: mongodb::bson::ser::Error) -> Self { ServiceError::Db(e.to_string()) }
}

impl From<csv::Error> for ServiceError {
    fn from(e: csv::Error) -> Self { ServiceError::Ingest(e.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_detail_reads_naturally() {
        let e = ServiceError::not_found("Payment");
        assert_eq!(e.detail(), "Payment not found");
        assert_eq!(e.to_string(), "not found: Payment not found");
    }
}
