//! Common DTO types

use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

/// Largest page a list endpoint returns
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Pagination query parameters
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u32,
    /// Items per page
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    50
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PaginationParams {
    /// Offset for store queries
    pub fn offset(&self) -> u32 {
        (self.page.max(1) - 1).saturating_mul(self.limit)
    }
}

/// `?limit=` for short feeds
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitParams {
    #[serde(default = "default_feed_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u32,
}

fn default_feed_limit() -> u32 {
    20
}

impl Default for LimitParams {
    fn default() -> Self {
        Self {
            limit: default_feed_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_offset() {
        let p = PaginationParams { page: 3, limit: 20 };
        assert_eq!(p.offset(), 40);
        assert_eq!(PaginationParams::default().offset(), 0);
    }

    #[test]
    fn test_pagination_bounds() {
        assert!(PaginationParams { page: 0, limit: 20 }.validate().is_err());
        assert!(PaginationParams { page: 1, limit: MAX_PAGE_LIMIT + 1 }.validate().is_err());
        assert!(PaginationParams { page: 1, limit: MAX_PAGE_LIMIT }.validate().is_ok());
    }
}
