//! List request parameters.

use serde::Deserialize;

/// Page and search filter for listing clients.
///
/// Carries the pagination state explicitly; callers keep the current page and
/// search term themselves and send them with every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListClientsQuery {
    /// 1-based page number. Missing or non-positive values mean page 1.
    pub page: Option<i64>,
    /// Case-sensitive substring matched against name, email, tax document
    /// and state registration. Blank means no filter.
    pub search: Option<String>,
}

impl ListClientsQuery {
    /// Fixed number of clients per page.
    pub const PAGE_SIZE: i64 = 20;

    /// Create a query for a page and optional search term.
    #[must_use]
    pub fn new(page: i64, search: Option<&str>) -> Self {
        Self {
            page: Some(page),
            search: search.map(ToOwned::to_owned),
        }
    }

    /// The effective page number (at least 1).
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p >= 1).unwrap_or(1)
    }

    /// Rows to skip for the effective page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(Self::PAGE_SIZE)
    }

    /// The search term, or `None` if absent or blank.
    ///
    /// The term itself is not trimmed: matching is a literal substring match.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.trim().is_empty())
    }
}
