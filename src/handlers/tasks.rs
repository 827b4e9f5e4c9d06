// src/handlers/tasks.rs

use axum::{
    Form, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::task::{CompleteTaskRequest, DailyTask, GroupedTasks, TaskQueryRow},
};

/// (section, category, draws-from-audio) template for one day's plan.
const DAILY_PLAN: [(&str, &str, bool); 5] = [
    ("Morning", "Breath", true),
    ("Morning", "Articles", false),
    ("Day", "Meditation", true),
    ("Evening", "Sleep Stories", true),
    ("Evening", "Sleep Sounds", true),
];

const TASK_SELECT: &str = "SELECT t.id, t.section, t.category, t.is_completed, \
            au.id AS audio_id, au.category AS audio_category, au.title AS audio_title, \
            au.url AS audio_url, au.duration AS audio_duration, \
            ar.id AS article_id, ar.title AS article_title, \
            ar.image_url AS article_image_url, ar.content AS article_content \
     FROM daily_tasks t \
     LEFT JOIN audios au ON au.id = t.audio_id \
     LEFT JOIN articles ar ON ar.id = t.article_id";

async fn fetch_today_tasks(pool: &PgPool, user_id: &str) -> Result<Vec<TaskQueryRow>, AppError> {
    let rows = sqlx::query_as::<_, TaskQueryRow>(&format!(
        "{TASK_SELECT} WHERE t.user_id = $1 AND t.for_date = CURRENT_DATE ORDER BY t.id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Today's wellness plan for a user: one breathing track, one article,
/// one meditation, one sleep story and one sleep sound, drawn at random
/// from the content library. Generated on first request of the day, then
/// served as-is for the rest of it.
pub async fn daily_tasks(
    State(pool): State<PgPool>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut tasks = fetch_today_tasks(&pool, &user_id).await?;

    if tasks.is_empty() {
        let mut tx = pool.begin().await?;

        for (section, category, from_audio) in DAILY_PLAN {
            let payload_id: Option<i64> = if from_audio {
                sqlx::query_scalar(
                    "SELECT id FROM audios WHERE category = $1 ORDER BY RANDOM() LIMIT 1",
                )
                .bind(category)
                .fetch_optional(&mut *tx)
                .await?
            } else {
                sqlx::query_scalar("SELECT id FROM articles ORDER BY RANDOM() LIMIT 1")
                    .fetch_optional(&mut *tx)
                    .await?
            };

            // An empty content library for a category just leaves a gap in
            // the plan.
            let Some(payload_id) = payload_id else {
                tracing::warn!(category, "No content available for daily task");
                continue;
            };

            let (audio_id, article_id) = if from_audio {
                (Some(payload_id), None)
            } else {
                (None, Some(payload_id))
            };

            sqlx::query(
                "INSERT INTO daily_tasks (user_id, for_date, section, category, audio_id, article_id) \
                 VALUES ($1, CURRENT_DATE, $2, $3, $4, $5)",
            )
            .bind(&user_id)
            .bind(section)
            .bind(category)
            .bind(audio_id)
            .bind(article_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tasks = fetch_today_tasks(&pool, &user_id).await?;
    }

    let mut grouped = GroupedTasks {
        morning: Vec::new(),
        day: Vec::new(),
        evening: Vec::new(),
    };
    for task in tasks.into_iter().map(DailyTask::from) {
        match task.section.as_str() {
            "Morning" => grouped.morning.push(task),
            "Day" => grouped.day.push(task),
            _ => grouped.evening.push(task),
        }
    }

    Ok(Json(json!({ "success": true, "data": grouped })))
}

/// Mark one of the user's tasks as completed.
pub async fn complete_task(
    State(pool): State<PgPool>,
    Path(task_id): Path<i64>,
    Form(payload): Form<CompleteTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let updated: Option<i64> = sqlx::query_scalar(
        "UPDATE daily_tasks SET is_completed = TRUE WHERE id = $1 AND user_id = $2 RETURNING id",
    )
    .bind(task_id)
    .bind(&payload.user_id)
    .fetch_optional(&pool)
    .await?;

    if updated.is_none() {
        return Err(AppError::NotFound("Task not found".to_string()));
    }

    let task: TaskQueryRow = sqlx::query_as(&format!("{TASK_SELECT} WHERE t.id = $1"))
        .bind(task_id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Task marked as completed",
        "task": DailyTask::from(task),
    })))
}
