// src/handlers/comments.rs

use axum::{
    Form, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::auth::fetch_user_by_id,
    handlers::posts::comments_order_clause,
    models::{
        comment::{CommentQueryRow, CommentResponse, CreateCommentRequest, InsertedCommentRow},
        post::{Author, PaginationQuery},
    },
    response::{PaginatedResponse, SuccessResponse, total_pages},
    utils::html::clean_html,
};

/// Row shape for the parent lookup inside the reply transaction.
#[derive(sqlx::FromRow)]
struct ParentComment {
    id: i64,
    post_id: i64,
    depth: i32,
}

/// Create a reply under an existing comment.
///
/// The new comment inherits `post_id` from its parent and sits one level
/// deeper. The parent's direct-reply counter and the root post's flat
/// total are bumped in the same transaction as the insert, so either all
/// three writes land or none do.
pub async fn create_reply(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Form(payload): Form<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let author = fetch_user_by_id(&pool, &payload.user_id)
        .await?
        .ok_or(AppError::AuthError("User doesn't exist".to_string()))?;

    let content = clean_html(&payload.content);

    let mut tx = pool.begin().await?;

    let parent: ParentComment =
        sqlx::query_as("SELECT id, post_id, depth FROM comments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound("Comment not found".to_string()))?;

    let parent_updated: Option<i32> = sqlx::query_scalar(
        "UPDATE comments SET comment_count = comment_count + 1 WHERE id = $1 \
         RETURNING comment_count",
    )
    .bind(parent.id)
    .fetch_optional(&mut *tx)
    .await?;

    let post_updated: Option<i32> = sqlx::query_scalar(
        "UPDATE posts SET comment_count = comment_count + 1 WHERE id = $1 \
         RETURNING comment_count",
    )
    .bind(parent.post_id)
    .fetch_optional(&mut *tx)
    .await?;

    if parent_updated.is_none() || post_updated.is_none() {
        return Err(AppError::NotFound("Error creating comment".to_string()));
    }

    let comment = sqlx::query_as::<_, InsertedCommentRow>(
        r#"
        INSERT INTO comments (user_id, post_id, parent_comment_id, depth, content)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, post_id, parent_comment_id, depth, content,
                  points, comment_count, created_at
        "#,
    )
    .bind(&author.id)
    .bind(parent.post_id)
    .bind(parent.id)
    .bind(parent.depth + 1)
    .bind(&content)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    let author = Author {
        id: author.id,
        username: author.username,
    };

    Ok(Json(SuccessResponse::new(
        "Comment created",
        comment.into_response(author),
    )))
}

/// Toggle the caller's upvote on a comment.
///
/// Same shape as the post toggle: bump-and-lock the counter row first,
/// then flip the upvote row, all in one transaction. The response encodes
/// the resulting state as the `commentUpvotes` singleton list the clients
/// already consume.
pub async fn upvote_comment(
    State(pool): State<PgPool>,
    Path((id, user_id)): Path<(i64, String)>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM comment_upvotes WHERE comment_id = $1 AND user_id = $2")
            .bind(id)
            .bind(&user_id)
            .fetch_optional(&mut *tx)
            .await?;

    let points_change: i32 = if existing.is_some() { -1 } else { 1 };

    let points: i32 = sqlx::query_scalar(
        "UPDATE comments SET points = points + $1 WHERE id = $2 RETURNING points",
    )
    .bind(points_change)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Comment not found".to_string()))?;

    match existing {
        Some(upvote_id) => {
            sqlx::query("DELETE FROM comment_upvotes WHERE id = $1")
                .bind(upvote_id)
                .execute(&mut *tx)
                .await?;
        }
        None => {
            sqlx::query("INSERT INTO comment_upvotes (comment_id, user_id) VALUES ($1, $2)")
                .bind(id)
                .bind(&user_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| match AppError::from(e) {
                    AppError::Conflict(_) => AppError::Conflict("Already upvoted".to_string()),
                    other => other,
                })?;
        }
    }

    tx.commit().await?;

    let comment_upvotes = if points_change > 0 {
        json!([{ "userId": user_id }])
    } else {
        json!([])
    };

    Ok(Json(SuccessResponse::new(
        "Comment updated",
        json!({ "count": points, "commentUpvotes": comment_upvotes }),
    )))
}

/// List the direct children of a comment, paginated and sorted.
/// An unknown parent id simply yields an empty page.
pub async fn list_child_comments(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Query(params): Query<PaginationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit();
    let page = params.page();

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE parent_comment_id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await?;

    let sql = format!(
        "SELECT c.id, c.user_id, c.post_id, c.parent_comment_id, c.depth, c.content, \
                c.points, c.comment_count, c.created_at, \
                u.id AS author_id, u.username AS author_username, cu.user_id AS upvoter_id \
         FROM comments c \
         JOIN users u ON u.id = c.user_id \
         LEFT JOIN comment_upvotes cu ON cu.comment_id = c.id AND cu.user_id = $2 \
         WHERE c.parent_comment_id = $1 \
         ORDER BY {} \
         LIMIT $3 OFFSET $4",
        comments_order_clause(params.sort_by(), params.order())
    );

    let rows: Vec<CommentQueryRow> = sqlx::query_as(&sql)
        .bind(id)
        .bind(params.user_id.as_deref())
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&pool)
        .await?;

    let comments: Vec<CommentResponse> = rows
        .into_iter()
        .map(|row| row.into_response(None))
        .collect();

    Ok(Json(PaginatedResponse::new(
        "Comments fetched",
        comments,
        page,
        total_pages(total, limit),
    )))
}
