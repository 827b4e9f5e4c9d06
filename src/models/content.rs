// src/models/content.rs

use serde::Serialize;
use sqlx::FromRow;

/// Represents the 'articles' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub image_url: String,
    pub content: String,
}

/// Represents the 'audios' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Audio {
    pub id: i64,

    /// One of AUDIO_CATEGORIES.
    pub category: String,

    pub title: String,

    /// Public URL of the stored audio file.
    pub url: String,

    /// Formatted duration ("MM:SS" or "HH:MM:SS").
    pub duration: Option<String>,
}

/// Audio categories; daily-task generation draws one track per category.
pub const AUDIO_CATEGORIES: [&str; 4] = ["Breath", "Meditation", "Sleep Stories", "Sleep Sounds"];

pub fn is_audio_category(value: &str) -> bool {
    AUDIO_CATEGORIES.contains(&value)
}
