// src/models/post.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'posts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub url: Option<String>,
    pub content: Option<String>,
    pub points: i32,
    pub comment_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Author annotation attached to posts and comments.
#[derive(Debug, Clone, Serialize)]
pub struct Author {
    pub id: String,
    pub username: String,
}

/// Wire DTO for a post, with author and the viewer's upvote state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub url: Option<String>,
    pub content: Option<String>,
    pub points: i32,
    pub comment_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub author: Author,
    pub is_upvoted: bool,
}

/// Flat row shape produced by the post list/get queries
/// (post columns + joined author + upvote presence).
#[derive(Debug, FromRow)]
pub struct PostQueryRow {
    pub id: i64,
    pub title: String,
    pub url: Option<String>,
    pub content: Option<String>,
    pub points: i32,
    pub comment_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub author_id: String,
    pub author_username: String,
    pub is_upvoted: bool,
}

impl From<PostQueryRow> for PostResponse {
    fn from(row: PostQueryRow) -> Self {
        PostResponse {
            id: row.id,
            title: row.title,
            url: row.url,
            content: row.content,
            points: row.points,
            comment_count: row.comment_count,
            created_at: row.created_at,
            author: Author {
                id: row.author_id,
                username: row.author_username,
            },
            is_upvoted: row.is_upvoted,
        }
    }
}

/// DTO for creating a new post.
/// At least one of `url` / `content` is required; that cross-field rule is
/// checked in the handler since it spans two fields.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 chars"
    ))]
    pub title: String,

    pub url: Option<String>,

    pub content: Option<String>,

    #[validate(length(min = 1))]
    pub user_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Points,
    Recent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    Desc,
}

/// Query parameters shared by the paginated list endpoints.
/// `author` / `site` only apply to post listings; the comment endpoints
/// ignore them, as the original API does.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationQuery {
    pub limit: Option<i64>,
    pub page: Option<i64>,
    pub sort_by: Option<SortBy>,
    pub order: Option<Order>,

    /// Restrict to posts by this author id (exact match).
    pub author: Option<String>,

    /// Restrict to posts whose url equals this string (exact match,
    /// no domain parsing).
    pub site: Option<String>,

    /// Viewer id for upvote-state annotation; anonymous when absent.
    pub user_id: Option<String>,

    /// Post-comments listing only: attach up to two direct children per
    /// top-level comment.
    pub include_children: Option<bool>,
}

impl PaginationQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    pub fn sort_by(&self) -> SortBy {
        self.sort_by.unwrap_or(SortBy::Points)
    }

    pub fn order(&self) -> Order {
        self.order.unwrap_or(Order::Desc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(limit: Option<i64>, page: Option<i64>) -> PaginationQuery {
        PaginationQuery {
            limit,
            page,
            sort_by: None,
            order: None,
            author: None,
            site: None,
            user_id: None,
            include_children: None,
        }
    }

    #[test]
    fn defaults_to_first_page_of_ten_by_points_desc() {
        let q = query(None, None);
        assert_eq!(q.limit(), 10);
        assert_eq!(q.page(), 1);
        assert_eq!(q.offset(), 0);
        assert_eq!(q.sort_by(), SortBy::Points);
        assert_eq!(q.order(), Order::Desc);
    }

    #[test]
    fn clamps_limit_and_page() {
        let q = query(Some(1000), Some(0));
        assert_eq!(q.limit(), 100);
        assert_eq!(q.page(), 1);

        let q = query(Some(25), Some(3));
        assert_eq!(q.offset(), 50);
    }
}
