use std::sync::Arc;

use models::{Evidence, PaymentStatus};
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::evidence::repository::EvidenceRepository;
use crate::parse_payment_id;
use crate::payment::repository::PaymentRepository;

/// Upload/download of proof-of-payment files.
pub struct EvidenceService {
    payments: Arc<dyn PaymentRepository>,
    evidence: Arc<dyn EvidenceRepository>,
}

impl EvidenceService {
    pub fn new(payments: Arc<dyn PaymentRepository>, evidence: Arc<dyn EvidenceRepository>) -> Self {
        Self { payments, evidence }
    }

    /// Store the file and mark the payment `completed`. The returned file id
    /// is the payment id, which is also the download key.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        payment_id: &str,
        file_name: &str,
        file_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ServiceError> {
        let id = parse_payment_id(payment_id)?;
        if self.payments.find_by_id(id).await?.is_none() {
            return Err(ServiceError::not_found("Payment"));
        }
        let key = id.to_hex();
        self.evidence.insert(Evidence::new(key.clone(), file_name, file_type, bytes)).await?;
        self.payments.set_status(id, PaymentStatus::Completed).await?;
        info!(payment_id = %key, %file_name, "evidence_uploaded");
        Ok(key)
    }

    pub async fn download(&self, payment_id: &str) -> Result<Evidence, ServiceError> {
        let evidence = self
            .evidence
            .find_by_payment(payment_id.trim())
            .await?
            .ok_or_else(|| ServiceError::not_found("Evidence"))?;
        if evidence.is_empty() {
            return Err(ServiceError::Validation("No file data found".into()));
        }
        Ok(evidence)
    }
}
