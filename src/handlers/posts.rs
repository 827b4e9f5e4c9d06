// src/handlers/posts.rs

use std::collections::HashMap;

use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use url::Url;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::auth::fetch_user_by_id,
    models::{
        comment::{CommentQueryRow, CommentResponse, CreateCommentRequest, InsertedCommentRow},
        post::{
            Author, CreatePostRequest, Order, PaginationQuery, Post, PostQueryRow, PostResponse,
            SortBy,
        },
    },
    response::{PaginatedResponse, SuccessResponse, total_pages},
    utils::html::clean_html,
};

/// Bounded preview size when `includeChildren` is requested.
const CHILD_PREVIEW_LIMIT: i64 = 2;

fn posts_order_clause(sort_by: SortBy, order: Order) -> &'static str {
    match (sort_by, order) {
        (SortBy::Points, Order::Desc) => "p.points DESC",
        (SortBy::Points, Order::Asc) => "p.points ASC",
        (SortBy::Recent, Order::Desc) => "p.created_at DESC",
        (SortBy::Recent, Order::Asc) => "p.created_at ASC",
    }
}

pub(super) fn comments_order_clause(sort_by: SortBy, order: Order) -> &'static str {
    match (sort_by, order) {
        (SortBy::Points, Order::Desc) => "c.points DESC",
        (SortBy::Points, Order::Asc) => "c.points ASC",
        (SortBy::Recent, Order::Desc) => "c.created_at DESC",
        (SortBy::Recent, Order::Asc) => "c.created_at ASC",
    }
}

/// Appends the list filters to a post query.
///
/// Both the COUNT query and the data query go through this one helper so
/// their predicates can never drift apart when filters are added.
fn push_post_filters(query: &mut QueryBuilder<'_, Postgres>, params: &PaginationQuery) {
    let mut separator = " WHERE ";
    if let Some(author) = &params.author {
        query.push(separator).push("p.user_id = ").push_bind(author.clone());
        separator = " AND ";
    }
    if let Some(site) = &params.site {
        query.push(separator).push("p.url = ").push_bind(site.clone());
    }
}

/// Create a new post. A post must carry a url, a content body, or both.
pub async fn create_post(
    State(pool): State<PgPool>,
    Form(payload): Form<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let url_field = payload.url.as_deref().filter(|u| !u.is_empty());
    let content_field = payload.content.as_deref().filter(|c| !c.is_empty());

    if url_field.is_none() && content_field.is_none() {
        return Err(AppError::BadRequest(
            "Either URL or Content must be provided".to_string(),
        ));
    }

    if let Some(raw_url) = url_field {
        Url::parse(raw_url).map_err(|_| AppError::BadRequest("Invalid URL".to_string()))?;
    }

    let author = fetch_user_by_id(&pool, &payload.user_id)
        .await?
        .ok_or(AppError::AuthError("User doesn't exist".to_string()))?;

    let content = content_field.map(clean_html);

    let post = sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (user_id, title, url, content)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, title, url, content, points, comment_count, created_at
        "#,
    )
    .bind(&author.id)
    .bind(&payload.title)
    .bind(url_field)
    .bind(content.as_deref())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create post: {}", e);
        AppError::from(e)
    })?;

    let response = PostResponse {
        id: post.id,
        title: post.title,
        url: post.url,
        content: post.content,
        points: post.points,
        comment_count: post.comment_count,
        created_at: post.created_at,
        author: Author {
            id: author.id,
            username: author.username,
        },
        is_upvoted: false,
    };

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new("Post created", json!({ "post": response }))),
    ))
}

/// List posts with pagination, sorting, author/site filters, and the
/// viewer's upvote flag.
pub async fn list_posts(
    State(pool): State<PgPool>,
    Query(params): Query<PaginationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit();
    let page = params.page();

    let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
    push_post_filters(&mut count_query, &params);
    let total: i64 = count_query.build_query_scalar().fetch_one(&pool).await?;

    let mut data_query = QueryBuilder::<Postgres>::new(
        "SELECT p.id, p.title, p.url, p.content, p.points, p.comment_count, p.created_at, \
         u.id AS author_id, u.username AS author_username, ",
    );
    match &params.user_id {
        Some(viewer) => {
            data_query.push(
                "(pu.user_id IS NOT NULL) AS is_upvoted \
                 FROM posts p \
                 JOIN users u ON u.id = p.user_id \
                 LEFT JOIN post_upvotes pu ON pu.post_id = p.id AND pu.user_id = ",
            );
            data_query.push_bind(viewer.clone());
        }
        None => {
            data_query.push(
                "FALSE AS is_upvoted \
                 FROM posts p \
                 JOIN users u ON u.id = p.user_id",
            );
        }
    }
    push_post_filters(&mut data_query, &params);
    data_query
        .push(" ORDER BY ")
        .push(posts_order_clause(params.sort_by(), params.order()));
    data_query.push(" LIMIT ").push_bind(limit);
    data_query.push(" OFFSET ").push_bind(params.offset());

    let rows: Vec<PostQueryRow> = data_query.build_query_as().fetch_all(&pool).await?;
    let posts: Vec<PostResponse> = rows.into_iter().map(PostResponse::from).collect();

    Ok(Json(PaginatedResponse::new(
        "Posts fetched",
        posts,
        page,
        total_pages(total, limit),
    )))
}

/// Toggle the caller's upvote on a post.
///
/// The counter bump runs first: `UPDATE ... RETURNING` takes the row lock
/// on the post, so concurrent toggles against the same post serialize at
/// the store. A racing duplicate insert from the same user trips the
/// unique constraint and surfaces as a retryable 409.
pub async fn upvote_post(
    State(pool): State<PgPool>,
    Path((id, user_id)): Path<(i64, String)>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM post_upvotes WHERE post_id = $1 AND user_id = $2")
            .bind(id)
            .bind(&user_id)
            .fetch_optional(&mut *tx)
            .await?;

    let points_change: i32 = if existing.is_some() { -1 } else { 1 };

    let points: i32 =
        sqlx::query_scalar("UPDATE posts SET points = points + $1 WHERE id = $2 RETURNING points")
            .bind(points_change)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound("Post not found".to_string()))?;

    match existing {
        Some(upvote_id) => {
            sqlx::query("DELETE FROM post_upvotes WHERE id = $1")
                .bind(upvote_id)
                .execute(&mut *tx)
                .await?;
        }
        None => {
            sqlx::query("INSERT INTO post_upvotes (post_id, user_id) VALUES ($1, $2)")
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

    Ok(Json(SuccessResponse::new(
        "Post updated",
        json!({ "count": points, "isUpvoted": points_change > 0 }),
    )))
}

/// Create a top-level comment directly under a post.
pub async fn create_comment(
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

    let updated: Option<i32> = sqlx::query_scalar(
        "UPDATE posts SET comment_count = comment_count + 1 WHERE id = $1 RETURNING comment_count",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    if updated.is_none() {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    let comment = sqlx::query_as::<_, InsertedCommentRow>(
        r#"
        INSERT INTO comments (user_id, post_id, content)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, post_id, parent_comment_id, depth, content,
                  points, comment_count, created_at
        "#,
    )
    .bind(&author.id)
    .bind(id)
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

/// List a post's top-level comments, optionally with a bounded preview of
/// up to two direct children per comment.
pub async fn list_post_comments(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Query(params): Query<PaginationQuery>,
) -> Result<impl IntoResponse, AppError> {
    // Anonymous viewers get empty upvote annotations; a supplied viewer id
    // must resolve.
    if let Some(viewer) = &params.user_id {
        fetch_user_by_id(&pool, viewer)
            .await?
            .ok_or(AppError::AuthError("User doesn't exist".to_string()))?;
    }

    let post_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM posts WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    if post_exists.is_none() {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    let limit = params.limit();
    let page = params.page();

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM comments WHERE post_id = $1 AND parent_comment_id IS NULL",
    )
    .bind(id)
    .fetch_one(&pool)
    .await?;

    let order_clause = comments_order_clause(params.sort_by(), params.order());

    let sql = format!(
        "SELECT c.id, c.user_id, c.post_id, c.parent_comment_id, c.depth, c.content, \
                c.points, c.comment_count, c.created_at, \
                u.id AS author_id, u.username AS author_username, cu.user_id AS upvoter_id \
         FROM comments c \
         JOIN users u ON u.id = c.user_id \
         LEFT JOIN comment_upvotes cu ON cu.comment_id = c.id AND cu.user_id = $2 \
         WHERE c.post_id = $1 AND c.parent_comment_id IS NULL \
         ORDER BY {order_clause} \
         LIMIT $3 OFFSET $4"
    );

    let rows: Vec<CommentQueryRow> = sqlx::query_as(&sql)
        .bind(id)
        .bind(params.user_id.as_deref())
        .bind(limit)
        .bind(params.offset())
        .fetch_all(&pool)
        .await?;

    let mut children_by_parent: HashMap<i64, Vec<CommentResponse>> = HashMap::new();
    if params.include_children.unwrap_or(false) && !rows.is_empty() {
        let parent_ids: Vec<i64> = rows.iter().map(|row| row.id).collect();

        // One query for all previews: rank each parent's children by the
        // requested sort and keep the first two.
        let child_sql = format!(
            "SELECT id, user_id, post_id, parent_comment_id, depth, content, points, \
                    comment_count, created_at, author_id, author_username, upvoter_id \
             FROM ( \
                 SELECT c.id, c.user_id, c.post_id, c.parent_comment_id, c.depth, c.content, \
                        c.points, c.comment_count, c.created_at, \
                        u.id AS author_id, u.username AS author_username, \
                        cu.user_id AS upvoter_id, \
                        ROW_NUMBER() OVER ( \
                            PARTITION BY c.parent_comment_id ORDER BY {order_clause} \
                        ) AS child_rank \
                 FROM comments c \
                 JOIN users u ON u.id = c.user_id \
                 LEFT JOIN comment_upvotes cu ON cu.comment_id = c.id AND cu.user_id = $2 \
                 WHERE c.parent_comment_id = ANY($1) \
             ) ranked \
             WHERE child_rank <= $3 \
             ORDER BY parent_comment_id, child_rank"
        );

        let child_rows: Vec<CommentQueryRow> = sqlx::query_as(&child_sql)
            .bind(&parent_ids)
            .bind(params.user_id.as_deref())
            .bind(CHILD_PREVIEW_LIMIT)
            .fetch_all(&pool)
            .await?;

        for row in child_rows {
            if let Some(parent_id) = row.parent_comment_id {
                children_by_parent
                    .entry(parent_id)
                    .or_default()
                    .push(row.into_response(None));
            }
        }
    }

    let comments: Vec<CommentResponse> = rows
        .into_iter()
        .map(|row| {
            let children = children_by_parent.remove(&row.id).unwrap_or_default();
            row.into_response(Some(children))
        })
        .collect();

    Ok(Json(PaginatedResponse::new(
        "Comments fetched",
        comments,
        page,
        total_pages(total, limit),
    )))
}

/// Get a single post with the given viewer's upvote flag.
pub async fn get_post(
    State(pool): State<PgPool>,
    Path((id, user_id)): Path<(i64, String)>,
) -> Result<impl IntoResponse, AppError> {
    let row: Option<PostQueryRow> = sqlx::query_as(
        "SELECT p.id, p.title, p.url, p.content, p.points, p.comment_count, p.created_at, \
                u.id AS author_id, u.username AS author_username, \
                (pu.user_id IS NOT NULL) AS is_upvoted \
         FROM posts p \
         JOIN users u ON u.id = p.user_id \
         LEFT JOIN post_upvotes pu ON pu.post_id = p.id AND pu.user_id = $2 \
         WHERE p.id = $1",
    )
    .bind(id)
    .bind(&user_id)
    .fetch_optional(&pool)
    .await?;

    let post = row.ok_or(AppError::NotFound("Post not found".to_string()))?;

    Ok(Json(SuccessResponse::new(
        "Post fetched",
        PostResponse::from(post),
    )))
}

/// Delete a post. Only the author can delete; a missing post and a
/// foreign post answer identically so callers cannot probe existence.
/// Comments and upvote rows go with it (cascade at the store).
pub async fn delete_post(
    State(pool): State<PgPool>,
    Path((id, user_id)): Path<(i64, String)>,
) -> Result<impl IntoResponse, AppError> {
    fetch_user_by_id(&pool, &user_id)
        .await?
        .ok_or(AppError::AuthError("User doesn't exist".to_string()))?;

    let deleted: Option<i64> =
        sqlx::query_scalar("DELETE FROM posts WHERE id = $1 AND user_id = $2 RETURNING id")
            .bind(id)
            .bind(&user_id)
            .fetch_optional(&pool)
            .await?;

    if deleted.is_none() {
        return Err(AppError::NotFound(
            "Post not found or you don't have permission".to_string(),
        ));
    }

    Ok(Json(SuccessResponse::new(
        "Post deleted successfully",
        serde_json::Value::Null,
    )))
}
