// src/handlers/content.rs

use axum::{
    Json,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::content::{Article, Audio, is_audio_category},
    services::media::MediaKind,
    state::AppState,
    utils::{duration::format_duration, html::clean_html},
};

/// Text fields plus at most one file, collected from a multipart body.
#[derive(Default)]
struct UploadForm {
    fields: std::collections::HashMap<String, String>,
    file: Option<(String, Vec<u8>)>,
}

impl UploadForm {
    async fn read(multipart: &mut Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.file = Some((file_name, bytes.to_vec()));
            } else if !name.is_empty() {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    fn required_text(&self, name: &str) -> Result<&str, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::BadRequest(format!("{} is required", name)))
    }
}

fn validate_length(name: &str, value: &str, max: usize) -> Result<(), AppError> {
    let len = value.chars().count();
    if len == 0 || len > max {
        return Err(AppError::BadRequest(format!(
            "{} length must be between 1 and {} chars",
            name, max
        )));
    }
    Ok(())
}

/// Create an article: title + content + cover image.
pub async fn create_article(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = UploadForm::read(&mut multipart).await?;

    let title = form.required_text("title")?;
    let content = form.required_text("content")?;
    validate_length("title", title, 200)?;

    let (file_name, bytes) = form
        .file
        .as_ref()
        .ok_or(AppError::BadRequest("Image is required".to_string()))?;

    let upload = state.media.upload(MediaKind::Image, bytes, file_name).await?;

    let article = sqlx::query_as::<_, Article>(
        "INSERT INTO articles (title, image_url, content) VALUES ($1, $2, $3) \
         RETURNING id, title, image_url, content",
    )
    .bind(title)
    .bind(&upload.url)
    .bind(clean_html(content))
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(json!({ "success": true, "data": article })))
}

pub async fn list_articles(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let articles = sqlx::query_as::<_, Article>(
        "SELECT id, title, image_url, content FROM articles ORDER BY id",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({ "success": true, "data": articles })))
}

async fn fetch_article(state: &AppState, id: i64) -> Result<Article, AppError> {
    sqlx::query_as::<_, Article>("SELECT id, title, image_url, content FROM articles WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound("Article not found".to_string()))
}

pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let article = fetch_article(&state, id).await?;
    Ok(Json(json!({ "success": true, "data": article })))
}

/// Update an article's text and/or replace its cover image. A replaced
/// image is removed from the media store.
pub async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = UploadForm::read(&mut multipart).await?;
    let existing = fetch_article(&state, id).await?;

    if let Some(t) = form.text("title") {
        validate_length("title", t, 200)?;
    }
    let title = form.text("title").unwrap_or(&existing.title).to_string();
    let content = match form.text("content") {
        Some(content) => clean_html(content),
        None => existing.content.clone(),
    };

    let image_url = match &form.file {
        Some((file_name, bytes)) => {
            state
                .media
                .delete(&existing.image_url, MediaKind::Image)
                .await?;
            state
                .media
                .upload(MediaKind::Image, bytes, file_name)
                .await?
                .url
        }
        None => existing.image_url.clone(),
    };

    let article = sqlx::query_as::<_, Article>(
        "UPDATE articles SET title = $2, image_url = $3, content = $4 WHERE id = $1 \
         RETURNING id, title, image_url, content",
    )
    .bind(id)
    .bind(&title)
    .bind(&image_url)
    .bind(&content)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(json!({ "success": true, "data": article })))
}

pub async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let article = fetch_article(&state, id).await?;

    state
        .media
        .delete(&article.image_url, MediaKind::Image)
        .await?;

    sqlx::query("DELETE FROM articles WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(json!({ "success": true })))
}

/// Create an audio entry: category + title + audio file. Duration comes
/// from the media store's metadata when it can extract it, otherwise from
/// the optional `duration` form field (seconds); formatted "MM:SS".
pub async fn create_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = UploadForm::read(&mut multipart).await?;

    let category = form.required_text("category")?;
    if !is_audio_category(category) {
        return Err(AppError::BadRequest("Invalid audio category".to_string()));
    }
    let title = form.required_text("title")?;
    validate_length("title", title, 200)?;

    let (file_name, bytes) = form
        .file
        .as_ref()
        .ok_or(AppError::BadRequest("Audio file is required".to_string()))?;

    let upload = state.media.upload(MediaKind::Audio, bytes, file_name).await?;

    let duration_secs = upload
        .duration_secs
        .or_else(|| form.text("duration").and_then(|d| d.parse::<f64>().ok()));
    let duration = duration_secs.map(format_duration);

    let audio = sqlx::query_as::<_, Audio>(
        "INSERT INTO audios (category, title, url, duration) VALUES ($1, $2, $3, $4) \
         RETURNING id, category, title, url, duration",
    )
    .bind(category)
    .bind(title)
    .bind(&upload.url)
    .bind(duration.as_deref())
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(json!({ "success": true, "data": audio })))
}

pub async fn list_audios(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let audios = sqlx::query_as::<_, Audio>(
        "SELECT id, category, title, url, duration FROM audios ORDER BY id",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({ "success": true, "data": audios })))
}

pub async fn get_audio(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let audio = sqlx::query_as::<_, Audio>(
        "SELECT id, category, title, url, duration FROM audios WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("Audio not found".to_string()))?;

    Ok(Json(json!({ "success": true, "data": audio })))
}

pub async fn delete_audio(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let audio = sqlx::query_as::<_, Audio>(
        "SELECT id, category, title, url, duration FROM audios WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("Audio not found".to_string()))?;

    state.media.delete(&audio.url, MediaKind::Audio).await?;

    sqlx::query("DELETE FROM audios WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(json!({ "success": true })))
}
