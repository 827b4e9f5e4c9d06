// src/response.rs

use serde::Serialize;

/// Standard success envelope: `{"success": true, "message": ..., "data": ...}`.
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub total_pages: i64,
}

/// Success envelope for list endpoints, with pagination metadata.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
    pub pagination: Pagination,
}

impl<T> PaginatedResponse<T> {
    pub fn new(message: impl Into<String>, data: T, page: i64, total_pages: i64) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            pagination: Pagination { page, total_pages },
        }
    }
}

/// `ceil(total / limit)`, with an empty result set yielding zero pages.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

#[cfg(test)]
mod tests {
    use super::total_pages;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(25, 10), 3);
    }
}
