// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,

    /// Unique username.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    /// Auto-generated pseudonym, shown in place of the username inside the
    /// support community.
    pub randname: String,

    pub email: Option<String>,

    /// Free-form self-description.
    pub description: Option<String>,

    /// Interest tags (e.g., "anxiety", "stress").
    pub tags: Option<Vec<String>>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new user (signup form).
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,

    #[validate(length(
        min = 3,
        max = 255,
        message = "Password length must be between 3 and 255 characters."
    ))]
    pub password: String,

    #[validate(email(message = "Invalid email address."))]
    pub email: Option<String>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 255))]
    pub password: String,
}

/// DTO for partial user updates. Absent fields are left untouched.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,

    #[validate(length(min = 1, max = 50))]
    pub randname: Option<String>,

    #[validate(length(min = 3, max = 255))]
    pub password: Option<String>,
}
