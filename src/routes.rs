// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::handlers::{auth, chats, comments, content, posts, tasks};
use crate::state::AppState;

/// Cap for multipart media uploads (article images, audio tracks).
const UPLOAD_BODY_LIMIT: usize = 50 * 1024 * 1024;

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, posts, comments, chats, tasks, content).
/// * Applies global middleware (Trace, CORS).
/// * Serves locally stored media files under /media.
/// * Injects global state (pool, config, service clients).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/{id}", get(auth::get_user).put(auth::update_user));

    let post_routes = Router::new()
        .route("/", post(posts::create_post).get(posts::list_posts))
        .route("/{id}/comment", post(posts::create_comment))
        .route("/{id}/comments", get(posts::list_post_comments))
        .route("/{id}/{user_id}/upvote", post(posts::upvote_post))
        .route("/{id}/{user_id}", get(posts::get_post).delete(posts::delete_post));

    let comment_routes = Router::new()
        .route("/{id}", post(comments::create_reply))
        .route("/{id}/comments", get(comments::list_child_comments))
        .route("/{id}/{user_id}/upvote", post(comments::upvote_comment));

    let chat_routes = Router::new()
        .route("/start-user-chat", post(chats::start_user_chat))
        .route("/send-message", post(chats::send_message))
        .route(
            "/chat-history/{user_id}/{other_user_id}",
            get(chats::chat_history),
        );

    let task_routes = Router::new()
        .route("/daily/{user_id}", get(tasks::daily_tasks))
        .route("/{task_id}/complete", put(tasks::complete_task));

    let article_routes = Router::new()
        .route("/", post(content::create_article).get(content::list_articles))
        .route(
            "/{id}",
            get(content::get_article)
                .put(content::update_article)
                .delete(content::delete_article),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

    let audio_routes = Router::new()
        .route("/", post(content::create_audio).get(content::list_audios))
        .route("/{id}", get(content::get_audio).delete(content::delete_audio))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

    let media_dir = ServeDir::new(&state.config.media_root);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/posts", post_routes)
        .nest("/api/comments", comment_routes)
        .nest("/api/chats", chat_routes)
        .nest("/api/tasks", task_routes)
        .nest("/api/articles", article_routes)
        .nest("/api/audios", audio_routes)
        .nest_service("/media", media_dir)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
