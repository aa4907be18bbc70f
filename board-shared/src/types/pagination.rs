use serde::{Deserialize, Serialize};

/// Fixed page size for post listings.
pub const PAGE_SIZE: u64 = 10;

/// Largest offset a database bind (`BIGINT`) can carry.
const MAX_OFFSET: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Copy)]
pub struct PaginationParams {
    pub page: u64,
}

impl PaginationParams {
    pub fn new(page: u64) -> Self {
        Self { page: page.max(1) }
    }

    pub fn page(&self) -> u64 {
        self.page.max(1)
    }

    /// Saturates instead of overflowing for absurd page numbers; such pages
    /// are simply empty.
    pub fn offset(&self) -> u64 {
        (self.page() - 1).saturating_mul(PAGE_SIZE).min(MAX_OFFSET)
    }

    pub fn limit(&self) -> u64 {
        PAGE_SIZE
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1 }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, params: &PaginationParams) -> Self {
        let per_page = params.limit();
        Self {
            items,
            total,
            page: params.page(),
            per_page,
            total_pages: total.div_ceil(per_page),
        }
    }
}
