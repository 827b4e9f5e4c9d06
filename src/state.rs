use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::config::Config;
use crate::services::chat_store::ChatMessageStore;
use crate::services::media::MediaStore;

/// Process-wide state, built once in main and injected into handlers.
/// The service clients sit behind trait objects so tests can substitute
/// in-memory implementations.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub chat_store: Arc<dyn ChatMessageStore>,
    pub media: Arc<dyn MediaStore>,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
