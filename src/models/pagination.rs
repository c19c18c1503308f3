use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Normalised page/limit pair; page is 1-based and limit capped at `max_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(page: Option<u64>, limit: Option<u64>, default_limit: u64, max_limit: u64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, max_limit),
        }
    }

    /// Documents to skip; saturates so huge page numbers just land past the end.
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit).min(i64::MAX as u64)
    }

    pub fn limit_i64(&self) -> i64 {
        self.limit as i64
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, utoipa::ToSchema)]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub limit: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: PageRequest, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(page.limit);
        Self {
            current_page: page.page,
            total_pages,
            total_items,
            limit: page.limit,
            has_next: page.page < total_pages,
            has_prev: page.page > 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_normalisation() {
        let p = PageRequest::new(Some(0), Some(500), 50, 200);
        assert_eq!(p, PageRequest { page: 1, limit: 200 });
        assert_eq!(PageRequest::new(None, None, 20, 100).limit, 20);
        assert_eq!(PageRequest::new(Some(3), Some(10), 20, 100).skip(), 20);
    }

    #[test]
    fn test_skip_saturates_for_huge_pages() {
        let p = PageRequest::new(Some(u64::MAX), Some(200), 50, 200);
        assert_eq!(p.skip(), i64::MAX as u64);
        assert!(!Pagination::new(p, 10).has_next);
    }

    #[test]
    fn test_pagination_flags() {
        let page = PageRequest::new(Some(2), Some(10), 10, 100);
        let p = Pagination::new(page, 25);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_next);
        assert!(p.has_prev);

        let last = Pagination::new(PageRequest::new(Some(3), Some(10), 10, 100), 25);
        assert!(!last.has_next);

        let empty = Pagination::new(PageRequest::new(None, None, 10, 100), 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next && !empty.has_prev);
    }
}
