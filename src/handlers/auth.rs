// src/handlers/auth.rs

use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{LoginRequest, SignupRequest, UpdateUserRequest, User},
    response::SuccessResponse,
    utils::{
        hash::{hash_password, verify_password},
        id::generate_id,
    },
};

/// Shared lookup used by every handler that needs to resolve an acting
/// user id to a user row.
pub async fn fetch_user_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, randname, email, description, tags, created_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it, and assigns the
/// opaque id plus a generated pseudonym the clients display in the
/// community. Returns 201 Created with the user (hash never serialized).
pub async fn signup(
    State(pool): State<PgPool>,
    Form(payload): Form<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;
    let user_id = generate_id(15);
    let randname = generate_id(6);

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, password_hash, randname, email)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, username, password_hash, randname, email, description, tags, created_at
        "#,
    )
    .bind(&user_id)
    .bind(&payload.username)
    .bind(&hashed_password)
    .bind(&randname)
    .bind(payload.email.as_deref())
    .fetch_one(&pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict("Username already used".to_string()),
        other => {
            tracing::error!("Failed to create user: {}", other);
            other
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new("User created", json!({ "user": user }))),
    ))
}

/// Authenticates a user against the stored Argon2 hash and returns the
/// user object; the clients keep the id and pass it with later requests.
pub async fn login(
    State(pool): State<PgPool>,
    Form(payload): Form<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, randname, email, description, tags, created_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(&payload.username)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::AuthError("Incorrect username".to_string()))?;

    let is_valid = verify_password(&payload.password, &user.password_hash)?;
    if !is_valid {
        return Err(AppError::AuthError("Incorrect password".to_string()));
    }

    Ok(Json(SuccessResponse::new("Logged in", json!({ "user": user }))))
}

/// Fetch a user by id.
pub async fn get_user(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = fetch_user_by_id(&pool, &id)
        .await?
        .ok_or(AppError::AuthError("User doesn't exist".to_string()))?;

    Ok(Json(SuccessResponse::new("User fetched", json!({ "user": user }))))
}

/// Partial user update: username, randname and/or password.
pub async fn update_user(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
    Form(payload): Form<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    fetch_user_by_id(&pool, &id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let password_hash = match &payload.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let mut query = QueryBuilder::<Postgres>::new("UPDATE users SET ");
    let mut updates = query.separated(", ");
    let mut has_update = false;

    if let Some(username) = &payload.username {
        updates.push("username = ").push_bind_unseparated(username.clone());
        has_update = true;
    }
    if let Some(randname) = &payload.randname {
        updates.push("randname = ").push_bind_unseparated(randname.clone());
        has_update = true;
    }
    if let Some(hash) = password_hash {
        updates.push("password_hash = ").push_bind_unseparated(hash);
        has_update = true;
    }

    if !has_update {
        return Err(AppError::BadRequest("No update data provided".to_string()));
    }

    query.push(" WHERE id = ").push_bind(id);
    query.push(
        " RETURNING id, username, password_hash, randname, email, description, tags, created_at",
    );

    let user: User = query
        .build_query_as()
        .fetch_one(&pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Username already taken".to_string()),
            other => other,
        })?;

    Ok(Json(SuccessResponse::new(
        "User updated successfully",
        json!({ "user": user }),
    )))
}
