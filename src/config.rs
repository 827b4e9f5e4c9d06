// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,

    /// Optional Redis URL for the chat-message store.
    /// Absent means the in-memory store (single process, non-durable).
    pub redis_url: Option<String>,

    pub rust_log: String,

    /// Directory where uploaded media is stored, served under /media.
    pub media_root: String,

    /// Base URL prefixed to stored media paths when building public URLs.
    pub public_base_url: String,

    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let redis_url = env::var("REDIS_URL").ok();

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let media_root = env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string());

        let public_base_url =
            env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self {
            database_url,
            redis_url,
            rust_log,
            media_root,
            public_base_url,
            port,
        }
    }
}
