// src/models/task.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::content::{Article, Audio};

/// Wire DTO for one daily task, with its audio or article payload joined in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTask {
    pub id: i64,
    pub section: String,
    pub category: String,
    pub is_completed: bool,
    pub audio: Option<Audio>,
    pub article: Option<Article>,
}

/// The day's tasks grouped by section, as the clients render them.
#[derive(Debug, Serialize)]
pub struct GroupedTasks {
    #[serde(rename = "Morning")]
    pub morning: Vec<DailyTask>,
    #[serde(rename = "Day")]
    pub day: Vec<DailyTask>,
    #[serde(rename = "Evening")]
    pub evening: Vec<DailyTask>,
}

/// Flat row shape from the task listing query; left joins leave the
/// payload columns NULL on the side that does not apply.
#[derive(Debug, FromRow)]
pub struct TaskQueryRow {
    pub id: i64,
    pub section: String,
    pub category: String,
    pub is_completed: bool,
    pub audio_id: Option<i64>,
    pub audio_category: Option<String>,
    pub audio_title: Option<String>,
    pub audio_url: Option<String>,
    pub audio_duration: Option<String>,
    pub article_id: Option<i64>,
    pub article_title: Option<String>,
    pub article_image_url: Option<String>,
    pub article_content: Option<String>,
}

impl From<TaskQueryRow> for DailyTask {
    fn from(row: TaskQueryRow) -> Self {
        let audio = match (row.audio_id, row.audio_category, row.audio_title, row.audio_url) {
            (Some(id), Some(category), Some(title), Some(url)) => Some(Audio {
                id,
                category,
                title,
                url,
                duration: row.audio_duration,
            }),
            _ => None,
        };

        let article = match (
            row.article_id,
            row.article_title,
            row.article_image_url,
            row.article_content,
        ) {
            (Some(id), Some(title), Some(image_url), Some(content)) => Some(Article {
                id,
                title,
                image_url,
                content,
            }),
            _ => None,
        };

        DailyTask {
            id: row.id,
            section: row.section,
            category: row.category,
            is_completed: row.is_completed,
            audio,
            article,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTaskRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
}
