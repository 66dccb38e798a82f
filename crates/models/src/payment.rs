use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{dates, errors::ModelError};

/// Stored form of a payee payment (collection `payments`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub payee_first_name: String,
    pub payee_last_name: String,
    pub payee_payment_status: String,
    pub payee_added_date_utc: String,
    pub payee_due_date: bson::DateTime,
    pub payee_address_line_1: String,
    #[serde(default)]
    pub payee_address_line_2: Option<String>,
    pub payee_city: String,
    pub payee_country: String,
    #[serde(default)]
    pub payee_province_or_state: Option<String>,
    pub payee_postal_code: String,
    pub payee_phone_number: String,
    pub payee_email: String,
    pub currency: String,
    #[serde(default)]
    pub discount_percent: Option<f64>,
    #[serde(default)]
    pub tax_percent: Option<f64>,
    pub due_amount: f64,
    #[serde(default)]
    pub total_due: Option<f64>,
}

/// Well-known values of `payee_payment_status`. Input is free text, these
/// are the ones the service itself writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    DueNow,
    Overdue,
    Completed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::DueNow => "due_now",
            PaymentStatus::Overdue => "overdue",
            PaymentStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `due - due*discount% + due*tax%`, rounded to cents. Missing percentages count as zero.
pub fn compute_total_due(due_amount: f64, discount_percent: Option<f64>, tax_percent: Option<f64>) -> f64 {
    let discount = discount_percent.unwrap_or(0.0);
    let tax = tax_percent.unwrap_or(0.0);
    round2(due_amount - due_amount * discount / 100.0 + due_amount * tax / 100.0)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl Payment {
    pub fn due_date(&self) -> Option<NaiveDate> {
        dates::bson_to_due_date(self.payee_due_date)
    }

    pub fn recompute_total_due(&mut self) {
        self.total_due = Some(compute_total_due(self.due_amount, self.discount_percent, self.tax_percent));
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.due_amount.is_finite() || self.due_amount < 0.0 {
            return Err(ModelError::Validation("due_amount must be a non-negative number".into()));
        }
        for (name, value) in [("discount_percent", self.discount_percent), ("tax_percent", self.tax_percent)] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(ModelError::Validation(format!("{name} must be a non-negative number")));
                }
            }
        }
        if self.payee_payment_status.trim().is_empty() {
            return Err(ModelError::Validation("payee_payment_status must not be empty".into()));
        }
        Ok(())
    }
}

/// Body of `POST /payments/create` and `PUT /payments/update/{id}`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentCreateRequest {
    pub payee_first_name: String,
    pub payee_last_name: String,
    pub payee_payment_status: String,
    #[serde(deserialize_with = "dates::deserialize_flexible_datetime")]
    #[schema(value_type = String, format = DateTime, example = "2024-01-05T15:07:00Z")]
    pub payee_added_date_utc: DateTime<Utc>,
    #[schema(value_type = String, format = Date, example = "2024-02-01")]
    pub payee_due_date: NaiveDate,
    pub payee_address_line_1: String,
    #[serde(default)]
    pub payee_address_line_2: Option<String>,
    pub payee_city: String,
    pub payee_country: String,
    #[serde(default)]
    pub payee_province_or_state: Option<String>,
    pub payee_postal_code: String,
    pub payee_phone_number: String,
    pub payee_email: String,
    pub currency: String,
    #[serde(default)]
    pub discount_percent: Option<f64>,
    #[serde(default)]
    pub tax_percent: Option<f64>,
    pub due_amount: f64,
}

pub type PaymentUpdateRequest = PaymentCreateRequest;

impl PaymentCreateRequest {
    /// Convert to the stored shape: format the added date, pin the due date
    /// to midnight UTC and compute `total_due`.
    pub fn into_payment(self) -> Result<Payment, ModelError> {
        let mut payment = Payment {
            id: None,
            payee_first_name: self.payee_first_name,
            payee_last_name: self.payee_last_name,
            payee_payment_status: self.payee_payment_status,
            payee_added_date_utc: dates::format_added_date(self.payee_added_date_utc),
            payee_due_date: dates::due_date_to_bson(self.payee_due_date),
            payee_address_line_1: self.payee_address_line_1,
            payee_address_line_2: self.payee_address_line_2,
            payee_city: self.payee_city,
            payee_country: self.payee_country,
            payee_province_or_state: self.payee_province_or_state,
            payee_postal_code: self.payee_postal_code,
            payee_phone_number: self.payee_phone_number,
            payee_email: self.payee_email,
            currency: self.currency,
            discount_percent: self.discount_percent,
            tax_percent: self.tax_percent,
            due_amount: self.due_amount,
            total_due: None,
        };
        payment.validate()?;
        payment.recompute_total_due();
        Ok(payment)
    }
}

/// JSON projection returned by `GET /payments/get_payments`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentView {
    #[serde(rename = "_id")]
    pub id: String,
    pub payee_first_name: String,
    pub payee_last_name: String,
    pub payee_payment_status: String,
    pub payee_added_date_utc: String,
    /// `YYYY-MM-DD`
    pub payee_due_date: String,
    pub payee_address_line_1: String,
    pub payee_address_line_2: Option<String>,
    pub payee_city: String,
    pub payee_country: String,
    pub payee_province_or_state: Option<String>,
    pub payee_postal_code: String,
    pub payee_phone_number: String,
    pub payee_email: String,
    pub currency: String,
    pub discount_percent: Option<f64>,
    pub tax_percent: Option<f64>,
    pub due_amount: f64,
    pub total_due: Option<f64>,
}

impl From<Payment> for PaymentView {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id.map(|id| id.to_hex()).unwrap_or_default(),
            payee_due_date: dates::display_due_date(p.payee_due_date),
            payee_first_name: p.payee_first_name,
            payee_last_name: p.payee_last_name,
            payee_payment_status: p.payee_payment_status,
            payee_added_date_utc: p.payee_added_date_utc,
            payee_address_line_1: p.payee_address_line_1,
            payee_address_line_2: p.payee_address_line_2,
            payee_city: p.payee_city,
            payee_country: p.payee_country,
            payee_province_or_state: p.payee_province_or_state,
            payee_postal_code: p.payee_postal_code,
            payee_phone_number: p.payee_phone_number,
            payee_email: p.payee_email,
            currency: p.currency,
            discount_percent: p.discount_percent,
            tax_percent: p.tax_percent,
            due_amount: p.due_amount,
            total_due: p.total_due,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_json() -> serde_json::Value {
        json!({
            "payee_first_name": "Ada",
            "payee_last_name": "Lovelace",
            "payee_payment_status": "pending",
            "payee_added_date_utc": "2024-01-05T15:07:00Z",
            "payee_due_date": "2024-02-01",
            "payee_address_line_1": "12 Analytical St",
            "payee_city": "London",
            "payee_country": "GB",
            "payee_postal_code": "N1 9GU",
            "payee_phone_number": "+442071234567",
            "payee_email": "ada@example.com",
            "currency": "GBP",
            "discount_percent": 10.0,
            "tax_percent": 5.0,
            "due_amount": 200.0
        })
    }

    #[test]
    fn total_due_is_additive_and_rounded() {
        assert_eq!(compute_total_due(100.0, Some(10.0), Some(5.0)), 95.0);
        assert_eq!(compute_total_due(100.0, None, None), 100.0);
        assert_eq!(compute_total_due(19.99, Some(0.0), Some(7.5)), 21.49);
        assert_eq!(compute_total_due(0.0, Some(50.0), Some(50.0)), 0.0);
    }

    #[test]
    fn request_converts_to_stored_payment() {
        let req: PaymentCreateRequest = serde_json::from_value(request_json()).unwrap();
        let p = req.into_payment().unwrap();
        assert_eq!(p.id, None);
        assert_eq!(p.payee_added_date_utc, "Jan 05, 2024, 03:07 PM");
        assert_eq!(p.due_date(), NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(p.total_due, Some(190.0));
        assert_eq!(p.payee_address_line_2, None);
    }

    #[test]
    fn negative_amount_is_rejected() {
        let mut body = request_json();
        body["due_amount"] = json!(-1.0);
        let req: PaymentCreateRequest = serde_json::from_value(body).unwrap();
        assert!(matches!(req.into_payment(), Err(ModelError::Validation(_))));
    }

    #[test]
    fn bad_due_date_fails_deserialization() {
        let mut body = request_json();
        body["payee_due_date"] = json!("01/02/2024");
        assert!(serde_json::from_value::<PaymentCreateRequest>(body).is_err());
    }

    #[test]
    fn view_uses_hex_id_and_plain_due_date() {
        let req: PaymentCreateRequest = serde_json::from_value(request_json()).unwrap();
        let mut p = req.into_payment().unwrap();
        let oid = ObjectId::new();
        p.id = Some(oid);

        let v = serde_json::to_value(PaymentView::from(p)).unwrap();
        assert_eq!(v["_id"], json!(oid.to_hex()));
        assert_eq!(v["payee_due_date"], json!("2024-02-01"));
        assert_eq!(v["total_due"], json!(190.0));
    }

    #[test]
    fn stored_payment_round_trips_through_bson() {
        let req: PaymentCreateRequest = serde_json::from_value(request_json()).unwrap();
        let p = req.into_payment().unwrap();
        let doc = bson::to_document(&p).unwrap();
        assert!(!doc.contains_key("_id"));
        assert!(matches!(doc.get("payee_due_date"), Some(bson::Bson::DateTime(_))));
        let back: Payment = bson::from_document(doc).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn status_strings() {
        assert_eq!(PaymentStatus::DueNow.to_string(), "due_now");
        assert_eq!(PaymentStatus::Completed.as_str(), "completed");
    }
}
