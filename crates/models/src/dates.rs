//! Date conventions shared by the API and the CSV ingest.
//!
//! `payee_added_date_utc` is stored pre-formatted for display, while
//! `payee_due_date` is stored as a BSON datetime at midnight UTC so range
//! queries and sorting work server-side.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use mongodb::bson;
use serde::{Deserialize, Deserializer};

/// `Jan 05, 2024, 03:07 PM`
pub const ADDED_DATE_FORMAT: &str = "%b %d, %Y, %I:%M %p";
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_added_date(at: DateTime<Utc>) -> String {
    at.format(ADDED_DATE_FORMAT).to_string()
}

/// Unix seconds (integer or float text) to the display format.
pub fn added_date_from_epoch(raw: &str) -> Option<String> {
    let secs = raw.trim().parse::<f64>().ok().filter(|s| s.is_finite())?;
    DateTime::<Utc>::from_timestamp(secs.trunc() as i64, 0).map(format_added_date)
}

pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DUE_DATE_FORMAT).ok()
}

pub fn due_date_to_bson(date: NaiveDate) -> bson::DateTime {
    bson::DateTime::from_millis(date.and_time(NaiveTime::MIN).and_utc().timestamp_millis())
}

pub fn bson_to_due_date(at: bson::DateTime) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(at.timestamp_millis()).map(|d| d.date_naive())
}

/// Renders a stored due date as `YYYY-MM-DD`.
pub fn display_due_date(at: bson::DateTime) -> String {
    bson_to_due_date(at)
        .map(|d| d.format(DUE_DATE_FORMAT).to_string())
        .unwrap_or_else(|| at.to_string())
}

/// Accepts RFC 3339 timestamps and naive ISO datetimes (treated as UTC).
pub fn deserialize_flexible_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flexible_datetime(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid datetime '{raw}', expected ISO 8601"))
    })
}

pub fn parse_flexible_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
