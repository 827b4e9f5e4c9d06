// src/models/comment.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::post::Author;

/// DTO for creating a comment (top-level under a post, or a reply under a
/// parent comment — the route decides which).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Comment must be between 1 and 1000 characters"
    ))]
    pub content: String,

    #[validate(length(min = 1))]
    pub user_id: String,
}

/// The viewer's upvote on a comment, encoded as a singleton list for wire
/// compatibility with existing clients: `[{"userId": ...}]` when upvoted,
/// `[]` otherwise.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentUpvoteRef {
    pub user_id: String,
}

/// Wire DTO for a comment.
/// `child_comments` is present (possibly empty) on top-level comments
/// returned by the post-comments listing and on freshly created comments;
/// nested previews omit it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub user_id: String,
    pub post_id: i64,
    pub parent_comment_id: Option<i64>,
    pub depth: i32,
    pub content: String,
    pub points: i32,
    pub comment_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub comment_upvotes: Vec<CommentUpvoteRef>,
    pub author: Author,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_comments: Option<Vec<CommentResponse>>,
}

/// Flat row shape produced by the comment listing queries
/// (comment columns + joined author + the viewer's upvote row if any).
#[derive(Debug, FromRow)]
pub struct CommentQueryRow {
    pub id: i64,
    pub user_id: String,
    pub post_id: i64,
    pub parent_comment_id: Option<i64>,
    pub depth: i32,
    pub content: String,
    pub points: i32,
    pub comment_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub author_id: String,
    pub author_username: String,
    pub upvoter_id: Option<String>,
}

impl CommentQueryRow {
    pub fn into_response(self, child_comments: Option<Vec<CommentResponse>>) -> CommentResponse {
        CommentResponse {
            id: self.id,
            user_id: self.user_id,
            post_id: self.post_id,
            parent_comment_id: self.parent_comment_id,
            depth: self.depth,
            content: self.content,
            points: self.points,
            comment_count: self.comment_count,
            created_at: self.created_at,
            comment_upvotes: self
                .upvoter_id
                .map(|user_id| vec![CommentUpvoteRef { user_id }])
                .unwrap_or_default(),
            author: Author {
                id: self.author_id,
                username: self.author_username,
            },
            child_comments,
        }
    }
}

/// Row shape for a freshly inserted comment (no joins needed — the author
/// was just looked up and the upvote list is empty by construction).
#[derive(Debug, FromRow)]
pub struct InsertedCommentRow {
    pub id: i64,
    pub user_id: String,
    pub post_id: i64,
    pub parent_comment_id: Option<i64>,
    pub depth: i32,
    pub content: String,
    pub points: i32,
    pub comment_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl InsertedCommentRow {
    pub fn into_response(self, author: Author) -> CommentResponse {
        CommentResponse {
            id: self.id,
            user_id: self.user_id,
            post_id: self.post_id,
            parent_comment_id: self.parent_comment_id,
            depth: self.depth,
            content: self.content,
            points: self.points,
            comment_count: self.comment_count,
            created_at: self.created_at,
            comment_upvotes: Vec::new(),
            author,
            child_comments: Some(Vec::new()),
        }
    }
}
