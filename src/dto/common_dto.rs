use serde::Serialize;

/// Default page size for ledger history
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Upper bound for any page size
pub const MAX_PAGE_SIZE: i64 = 100;

// Paging metadata
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

// Paged response
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

// Generic message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Resolved page/limit pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Parses raw query values; anything missing, non-numeric or below 1
    /// falls back to the default.
    pub fn parse(page: Option<&str>, limit: Option<&str>, default_limit: i64) -> Self {
        let parse = |raw: Option<&str>| {
            raw.and_then(|value| value.trim().parse::<f64>().ok())
                .filter(|value| value.is_finite() && *value >= 1.0)
                .map(|value| value.floor() as i64)
        };

        Self {
            page: parse(page).unwrap_or(1),
            limit: parse(limit).unwrap_or(default_limit).min(MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn meta(&self, total: i64) -> PaginationMeta {
        PaginationMeta {
            page: self.page,
            limit: self.limit,
            total,
            total_pages: (total + self.limit - 1) / self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn junk_falls_back_to_defaults() {
        let page = PageRequest::parse(Some("abc"), Some("-4"), DEFAULT_PAGE_SIZE);
        assert_eq!(page, PageRequest { page: 1, limit: 20 });
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn fractional_values_are_floored_and_limit_capped() {
        let page = PageRequest::parse(Some("3.7"), Some("500"), DEFAULT_PAGE_SIZE);
        assert_eq!(page, PageRequest { page: 3, limit: MAX_PAGE_SIZE });
        assert_eq!(page.offset(), 200);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = PageRequest { page: 1, limit: 20 };
        assert_eq!(page.meta(0).total_pages, 0);
        assert_eq!(page.meta(20).total_pages, 1);
        assert_eq!(page.meta(21).total_pages, 2);
    }
}
