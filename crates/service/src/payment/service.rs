use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use models::{dates, PaymentCreateRequest, PaymentUpdateRequest, PaymentView};
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::evidence::repository::EvidenceRepository;
use crate::parse_payment_id;
use crate::payment::{query::PaymentQuery, repository::PaymentRepository};

/// Application service encapsulating payment business rules.
pub struct PaymentService {
    payments: Arc<dyn PaymentRepository>,
    evidence: Arc<dyn EvidenceRepository>,
}

impl PaymentService {
    pub fn new(payments: Arc<dyn PaymentRepository>, evidence: Arc<dyn EvidenceRepository>) -> Self {
        Self { payments, evidence }
    }

    /// Returns the new payment's hex id.
    #[instrument(skip_all, fields(payee_email = %req.payee_email))]
    pub async fn create(&self, req: PaymentCreateRequest) -> Result<String, ServiceError> {
        let payment = req.into_payment()?;
        let id = self.payments.insert(payment).await?;
        info!(payment_id = %id, "payment_created");
        Ok(id.to_hex())
    }

    #[instrument(skip(self, req))]
    pub async fn update(&self, payment_id: &str, req: PaymentUpdateRequest) -> Result<(), ServiceError> {
        let id = parse_payment_id(payment_id)?;
        let payment = req.into_payment()?;
        if !self.payments.replace_fields(id, payment).await? {
            return Err(ServiceError::not_found("Payment"));
        }
        info!(payment_id = %id, "payment_updated");
        Ok(())
    }

    /// Deletes the payment and every evidence file attached to it.
    #[instrument(skip(self))]
    pub async fn delete(&self, payment_id: &str) -> Result<(), ServiceError> {
        let id = parse_payment_id(payment_id)?;
        if self.payments.find_by_id(id).await?.is_none() {
            return Err(ServiceError::not_found("Payment"));
        }
        let removed = self.evidence.delete_by_payment(&id.to_hex()).await?;
        if !self.payments.delete(id).await? {
            return Err(ServiceError::not_found("Payment"));
        }
        info!(payment_id = %id, evidence_removed = removed, "payment_deleted");
        Ok(())
    }

    pub async fn list(&self, query: &PaymentQuery) -> Result<Vec<PaymentView>, ServiceError> {
        self.list_as_of(query, Utc::now().date_naive()).await
    }

    /// Refresh due/overdue statuses relative to `today`, then run the query.
    pub async fn list_as_of(&self, query: &PaymentQuery, today: NaiveDate) -> Result<Vec<PaymentView>, ServiceError> {
        let refreshed = self.payments.refresh_statuses(dates::due_date_to_bson(today)).await?;
        if refreshed > 0 {
            info!(refreshed, %today, "payment_statuses_refreshed");
        }
        let page = self.payments.search(query).await?;
        Ok(page.into_iter().map(PaymentView::from).collect())
    }
}
