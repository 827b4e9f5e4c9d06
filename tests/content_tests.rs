// tests/content_tests.rs
//
// Article and audio management through the media-store boundary. The
// local store writes under a throwaway media root, so these run without
// any external object storage.

use std::sync::Arc;

use hearu_backend::services::chat_store::MemoryChatStore;
use hearu_backend::services::media::LocalMediaStore;
use hearu_backend::{config::Config, routes, state::AppState};
use sqlx::postgres::PgPoolOptions;

async fn spawn_app() -> String {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let media_root =
        std::env::temp_dir().join(format!("hearu-test-media-{}", uuid::Uuid::new_v4()));

    let config = Config {
        database_url: database_url.clone(),
        redis_url: None,
        rust_log: "error".to_string(),
        media_root: media_root.to_string_lossy().into_owned(),
        public_base_url: "http://localhost:0".to_string(),
        port: 0,
    };

    let state = AppState {
        pool,
        config,
        chat_store: Arc::new(MemoryChatStore::new()),
        media: Arc::new(LocalMediaStore::new(media_root, "http://localhost:0")),
    };

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn article_form(title: &str, content: &str) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("title", title.to_string())
        .text("content", content.to_string())
        .part(
            "file",
            reqwest::multipart::Part::bytes(vec![0xFF, 0xD8, 0xFF]).file_name("cover image.jpg"),
        )
}

#[tokio::test]
async fn article_crud_round_trip() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Creation without an image is rejected.
    let response = client
        .post(&format!("{}/api/articles", address))
        .multipart(
            reqwest::multipart::Form::new()
                .text("title", "no image")
                .text("content", "body"),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Create.
    let response = client
        .post(&format!("{}/api/articles", address))
        .multipart(article_form("Why self love is important", "Be kind to yourself."))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    let article_id = body["data"]["id"].as_i64().unwrap();
    let image_url = body["data"]["imageUrl"].as_str().unwrap().to_string();
    assert!(image_url.contains("/media/articles/"));

    // Read one.
    let body: serde_json::Value = client
        .get(&format!("{}/api/articles/{}", address, article_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["title"], "Why self love is important");

    // Update the text only; the image is untouched.
    let response = client
        .put(&format!("{}/api/articles/{}", address, article_id))
        .multipart(reqwest::multipart::Form::new().text("title", "Self love, revisited"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Self love, revisited");
    assert_eq!(body["data"]["imageUrl"], image_url.as_str());

    // Delete, then the article is gone.
    let response = client
        .delete(&format!("{}/api/articles/{}", address, article_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .get(&format!("{}/api/articles/{}", address, article_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn audio_upload_validates_category_and_formats_duration() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let audio_part = || {
        reqwest::multipart::Part::bytes(vec![0u8; 16]).file_name("calm waves.m4a")
    };

    // Unknown category.
    let response = client
        .post(&format!("{}/api/audios", address))
        .multipart(
            reqwest::multipart::Form::new()
                .text("category", "Jazz")
                .text("title", "Calm Waves")
                .part("file", audio_part()),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Valid create; client-supplied duration seconds are formatted.
    let response = client
        .post(&format!("{}/api/audios", address))
        .multipart(
            reqwest::multipart::Form::new()
                .text("category", "Sleep Sounds")
                .text("title", "Calm Waves")
                .text("duration", "420")
                .part("file", audio_part()),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let audio_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["category"], "Sleep Sounds");
    assert_eq!(body["data"]["duration"], "07:00");
    assert!(body["data"]["url"].as_str().unwrap().contains("/media/audios/"));

    // Listed, fetched, deleted.
    let body: serde_json::Value = client
        .get(&format!("{}/api/audios/{}", address, audio_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["title"], "Calm Waves");

    let response = client
        .delete(&format!("{}/api/audios/{}", address, audio_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .get(&format!("{}/api/audios/{}", address, audio_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
