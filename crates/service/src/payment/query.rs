use models::Payment;
use mongodb::bson::{doc, Bson, Document};

use crate::pagination::Pagination;

/// Text fields covered by `search`. City and country have their own exact filters.
pub const SEARCH_FIELDS: &[&str] = &[
    "payee_first_name",
    "payee_last_name",
    "payee_payment_status",
    "payee_added_date_utc",
    "payee_address_line_1",
    "payee_address_line_2",
    "payee_province_or_state",
    "payee_postal_code",
    "payee_phone_number",
    "payee_email",
    "currency",
];

/// Filters and paging for `GET /payments/get_payments`.
#[derive(Clone, Debug, Default)]
pub struct PaymentQuery {
    pub payee_country: Option<String>,
    pub payee_city: Option<String>,
    /// Case-insensitive literal substring, not a regex.
    pub search: Option<String>,
    pub pagination: Pagination,
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.trim().is_empty())
}

impl PaymentQuery {
    pub fn country(&self) -> Option<&str> { non_empty(&self.payee_country) }
    pub fn city(&self) -> Option<&str> { non_empty(&self.payee_city) }
    pub fn search_term(&self) -> Option<&str> { non_empty(&self.search).map(str::trim) }

    /// MongoDB filter document equivalent to [`PaymentQuery::matches`].
    pub fn filter(&self) -> Document {
        let mut filter = Document::new();
        if let Some(country) = self.country() {
            filter.insert("payee_country", country);
        }
        if let Some(city) = self.city() {
            filter.insert("payee_city", city);
        }
        if let Some(term) = self.search_term() {
            let pattern = regex::escape(term);
            let clauses: Vec<Bson> = SEARCH_FIELDS
                .iter()
                .map(|field| {
                    let mut clause = Document::new();
                    clause.insert(*field, doc! { "$regex": pattern.as_str(), "$options": "i" });
                    Bson::Document(clause)
                })
                .collect();
            filter.insert("$or", clauses);
        }
        filter
    }

    pub fn matches(&self, p: &Payment) -> bool {
        if let Some(country) = self.country() {
            if p.payee_country != country {
                return false;
            }
        }
        if let Some(city) = self.city() {
            if p.payee_city != city {
                return false;
            }
        }
        match self.search_term() {
            None => true,
            Some(term) => {
                let needle = term.to_lowercase();
                search_values(p).any(|v| v.to_lowercase().contains(&needle))
            }
        }
    }
}

fn search_values(p: &Payment) -> impl Iterator<Item = &str> {
    [
        Some(p.payee_first_name.as_str()),
        Some(p.payee_last_name.as_str()),
        Some(p.payee_payment_status.as_str()),
        Some(p.payee_added_date_utc.as_str()),
        Some(p.payee_address_line_1.as_str()),
        p.payee_address_line_2.as_deref(),
        p.payee_province_or_state.as_deref(),
        Some(p.payee_postal_code.as_str()),
        Some(p.payee_phone_number.as_str()),
        Some(p.payee_email.as_str()),
        Some(p.currency.as_str()),
    ]
    .into_iter()
    .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_matches_everything() {
        assert!(PaymentQuery::default().filter().is_empty());
    }

    #[test]
    fn blank_filters_are_ignored() {
        let q = PaymentQuery {
            payee_country: Some("".into()),
            payee_city: Some("  ".into()),
            search: Some(" ".into()),
            ..Default::default()
        };
        assert!(q.filter().is_empty());
    }

    #[test]
    fn search_is_escaped_and_case_insensitive() {
        let q = PaymentQuery { search: Some("a.b+".into()), payee_country: Some("US".into()), ..Default::default() };
        let f = q.filter();
        assert_eq!(f.get_str("payee_country").unwrap(), "US");
        let or = f.get_array("$or").unwrap();
        assert_eq!(or.len(), SEARCH_FIELDS.len());
        let first = or[0].as_document().unwrap().get_document("payee_first_name").unwrap();
        assert_eq!(first.get_str("$regex").unwrap(), r"a\.b\+");
        assert_eq!(first.get_str("$options").unwrap(), "i");
    }
}
