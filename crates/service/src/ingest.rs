//! CSV seeding of the payments collection.
//!
//! Rows are normalised into [`Payment`] documents before insert:
//! `payee_added_date_utc` arrives as Unix seconds, `payee_due_date` as
//! `YYYY-MM-DD`, percentages may be blank. Rows that cannot be normalised
//! are skipped and reported rather than aborting the whole file.

use std::io::Read;
use std::path::Path;

use configs::IngestConfig;
use models::{dates, Payment, PaymentStatus};
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::ServiceError;
use crate::payment::repository::PaymentRepository;

pub const REQUIRED_COLUMNS: &[&str] = &[
    "payee_first_name",
    "payee_last_name",
    "payee_payment_status",
    "payee_added_date_utc",
    "payee_due_date",
    "payee_address_line_1",
    "payee_city",
    "payee_country",
    "payee_postal_code",
    "payee_phone_number",
    "payee_email",
    "currency",
    "due_amount",
];

#[derive(Debug, Deserialize)]
struct CsvRow {
    payee_first_name: String,
    payee_last_name: String,
    payee_payment_status: String,
    payee_added_date_utc: String,
    payee_due_date: String,
    payee_address_line_1: String,
    #[serde(default)]
    payee_address_line_2: Option<String>,
    payee_city: String,
    payee_country: String,
    #[serde(default)]
    payee_province_or_state: Option<String>,
    payee_postal_code: String,
    payee_phone_number: String,
    payee_email: String,
    currency: String,
    #[serde(default)]
    discount_percent: Option<String>,
    #[serde(default)]
    tax_percent: Option<String>,
    due_amount: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    /// 1-based data row number (header excluded)
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub payments: Vec<Payment>,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct IngestSummary {
    pub inserted: usize,
    pub skipped: usize,
    /// Set when ingest was skipped because the collection already had data.
    pub already_populated: bool,
}

/// Percentages: blank or non-numeric counts as 0.
fn lenient_percent(raw: Option<&str>) -> f64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok()).filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn blank_to_none(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

impl CsvRow {
    fn into_payment(self) -> Result<Payment, String> {
        let added = dates::added_date_from_epoch(&self.payee_added_date_utc)
            .ok_or_else(|| format!("invalid payee_added_date_utc '{}'", self.payee_added_date_utc))?;
        let due = dates::parse_due_date(&self.payee_due_date)
            .ok_or_else(|| format!("invalid payee_due_date '{}'", self.payee_due_date))?;
        let due_amount = self
            .due_amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("invalid due_amount '{}'", self.due_amount))?;
        let status = if self.payee_payment_status.trim().is_empty() {
            PaymentStatus::Pending.as_str().to_string()
        } else {
            self.payee_payment_status
        };

        let mut payment = Payment {
            id: None,
            payee_first_name: self.payee_first_name,
            payee_last_name: self.payee_last_name,
            payee_payment_status: status,
            payee_added_date_utc: added,
            payee_due_date: dates::due_date_to_bson(due),
            payee_address_line_1: self.payee_address_line_1,
            payee_address_line_2: Some(self.payee_address_line_2.unwrap_or_default()),
            payee_city: self.payee_city,
            payee_country: self.payee_country,
            payee_province_or_state: blank_to_none(self.payee_province_or_state),
            payee_postal_code: self.payee_postal_code,
            payee_phone_number: self.payee_phone_number,
            payee_email: self.payee_email,
            currency: self.currency,
            discount_percent: Some(lenient_percent(self.discount_percent.as_deref())),
            tax_percent: Some(lenient_percent(self.tax_percent.as_deref())),
            due_amount,
            total_due: None,
        };
        payment.validate().map_err(|e| e.to_string())?;
        payment.recompute_total_due();
        Ok(payment)
    }
}

/// Parse and normalise CSV content; header row is required.
pub fn normalize_reader<R: Read>(reader: R) -> Result<NormalizedBatch, ServiceError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).flexible(true).from_reader(reader);

    let headers = rdr.headers()?.clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(ServiceError::Ingest(format!("missing required columns: {}", missing.join(", "))));
    }

    let mut batch = NormalizedBatch::default();
    for (idx, record) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = idx + 1;
        let outcome = record.map_err(|e| e.to_string()).and_then(CsvRow::into_payment);
        match outcome {
            Ok(payment) => batch.payments.push(payment),
            Err(reason) => {
                warn!(row, %reason, "skipping csv row");
                batch.skipped.push(SkippedRow { row, reason });
            }
        }
    }
    Ok(batch)
}

pub fn normalize_csv(path: impl AsRef<Path>) -> Result<NormalizedBatch, ServiceError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(|e| ServiceError::Ingest(format!("cannot open {}: {e}", path.display())))?;
    normalize_reader(std::io::BufReader::new(file))
}

/// Seed the payments collection from `cfg.csv_path`.
pub async fn load_csv(repo: &dyn PaymentRepository, cfg: &IngestConfig) -> Result<IngestSummary, ServiceError> {
    if cfg.skip_if_populated {
        let existing = repo.count().await?;
        if existing > 0 {
            info!(existing, "payments collection already populated; skipping csv ingest");
            return Ok(IngestSummary { already_populated: true, ..Default::default() });
        }
    }

    let path = cfg.csv_path.clone();
    info!(csv_path = %path, "normalizing csv");
    let batch = tokio::task::spawn_blocking(move || normalize_csv(path))
        .await
        .map_err(|e| ServiceError::Ingest(format!("csv worker failed: {e}")))??;

    let skipped = batch.skipped.len();
    let inserted = repo.insert_many(batch.payments).await?;
    info!(inserted, skipped, "csv ingest completed");
    Ok(IngestSummary { inserted, skipped, already_populated: false })
}
