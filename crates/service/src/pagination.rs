//! Pagination utilities for service layer
//!
//! `skip`/`limit` pairs straight from the query string, clamped before they
//! reach the database.

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// documents to skip
    pub skip: i64,
    /// documents to return
    pub limit: i64,
}

impl Pagination {
    pub fn from_query(skip: Option<i64>, limit: Option<i64>) -> Self {
        Self { skip: skip.unwrap_or(0), limit: limit.unwrap_or(DEFAULT_LIMIT) }
    }

    /// Clamp to sane values: negative skip becomes 0, limit lands in `1..=MAX_LIMIT`.
    pub fn normalize(self) -> (u64, i64) {
        let skip = self.skip.max(0) as u64;
        let limit = self.limit.clamp(1, MAX_LIMIT);
        (skip, limit)
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { skip: 0, limit: DEFAULT_LIMIT } }
}
