// tests/chat_task_tests.rs
//
// Direct messaging (against the in-memory chat store) and daily wellness
// task generation.

use std::sync::Arc;

use hearu_backend::services::chat_store::MemoryChatStore;
use hearu_backend::services::media::LocalMediaStore;
use hearu_backend::{config::Config, routes, state::AppState};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

async fn spawn_app() -> (String, PgPool) {
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
        pool: pool.clone(),
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

    (address, pool)
}

async fn create_user(client: &reqwest::Client, address: &str, prefix: &str) -> String {
    let username = format!("{}_{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..8]);

    let body: serde_json::Value = client
        .post(&format!("{}/api/auth/signup", address))
        .form(&[("username", username.as_str()), ("password", "password123")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    body["data"]["user"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn chat_flow_start_send_history() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let user_a = create_user(&client, &address, "cha").await;
    let user_b = create_user(&client, &address, "chb").await;

    // Starting with an unknown partner fails.
    let response = client
        .post(&format!("{}/api/chats/start-user-chat", address))
        .form(&[("userId", user_a.as_str()), ("otherUserId", "ghost")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    // Start a chat.
    let body: serde_json::Value = client
        .post(&format!("{}/api/chats/start-user-chat", address))
        .form(&[("userId", user_a.as_str()), ("otherUserId", user_b.as_str())])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    let chat_id = body["chatId"].as_str().unwrap().to_string();

    // Starting again from the other side reuses the same chat.
    let body: serde_json::Value = client
        .post(&format!("{}/api/chats/start-user-chat", address))
        .form(&[("userId", user_b.as_str()), ("otherUserId", user_a.as_str())])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["chatId"].as_str().unwrap(), chat_id);

    // Exchange two messages.
    for (sender, content) in [(&user_a, "hello"), (&user_b, "hi there")] {
        let response = client
            .post(&format!("{}/api/chats/send-message", address))
            .form(&[
                ("chatId", chat_id.as_str()),
                ("senderId", sender.as_str()),
                ("content", content),
            ])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    // A non-participant cannot send into the chat.
    let user_c = create_user(&client, &address, "chc").await;
    let response = client
        .post(&format!("{}/api/chats/send-message", address))
        .form(&[
            ("chatId", chat_id.as_str()),
            ("senderId", user_c.as_str()),
            ("content", "let me in"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    // History comes back oldest-first, from either direction.
    let body: serde_json::Value = client
        .get(&format!(
            "{}/api/chats/chat-history/{}/{}",
            address, user_b, user_a
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["chatId"].as_str().unwrap(), chat_id);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "hello");
    assert_eq!(messages[0]["senderId"], user_a.as_str());
    assert_eq!(messages[1]["content"], "hi there");

    // No chat between unpaired users.
    let response = client
        .get(&format!(
            "{}/api/chats/chat-history/{}/{}",
            address, user_a, user_c
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

/// Seed one audio per category plus one article, so generation has a full
/// library to draw from.
async fn seed_content_library(pool: &PgPool) {
    for category in ["Breath", "Meditation", "Sleep Stories", "Sleep Sounds"] {
        sqlx::query("INSERT INTO audios (category, title, url, duration) VALUES ($1, $2, $3, $4)")
            .bind(category)
            .bind(format!("{} track", category))
            .bind(format!("http://localhost:0/media/audios/{}.m4a", category))
            .bind("05:00")
            .execute(pool)
            .await
            .unwrap();
    }

    sqlx::query("INSERT INTO articles (title, image_url, content) VALUES ($1, $2, $3)")
        .bind("Why self love is important")
        .bind("http://localhost:0/media/articles/cover.jpg")
        .bind("Self-love is the foundation of a healthy and fulfilling life.")
        .execute(pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn daily_tasks_generate_once_per_day() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    seed_content_library(&pool).await;
    let user = create_user(&client, &address, "dt").await;

    let body: serde_json::Value = client
        .get(&format!("{}/api/tasks/daily/{}", address, user))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);

    let data = &body["data"];
    assert_eq!(data["Morning"].as_array().unwrap().len(), 2);
    assert_eq!(data["Day"].as_array().unwrap().len(), 1);
    assert_eq!(data["Evening"].as_array().unwrap().len(), 2);

    // The article slot carries an article, the rest carry audio.
    let morning = data["Morning"].as_array().unwrap();
    let article_task = morning
        .iter()
        .find(|t| t["category"] == "Articles")
        .unwrap();
    assert!(article_task["article"].is_object());
    assert!(article_task["audio"].is_null());

    let breath_task = morning.iter().find(|t| t["category"] == "Breath").unwrap();
    assert!(breath_task["audio"].is_object());
    assert!(breath_task["article"].is_null());

    // Same day, same plan: ids are stable across requests.
    let first_ids: Vec<i64> = data["Morning"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect();

    let body: serde_json::Value = client
        .get(&format!("{}/api/tasks/daily/{}", address, user))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let second_ids: Vec<i64> = body["data"]["Morning"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect();
    assert_eq!(first_ids, second_ids);
}

#[tokio::test]
async fn completing_a_task_requires_ownership() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    seed_content_library(&pool).await;
    let user = create_user(&client, &address, "tc").await;
    let other = create_user(&client, &address, "to").await;

    let body: serde_json::Value = client
        .get(&format!("{}/api/tasks/daily/{}", address, user))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let task_id = body["data"]["Day"][0]["id"].as_i64().unwrap();

    // Someone else's task cannot be completed.
    let response = client
        .put(&format!("{}/api/tasks/{}/complete", address, task_id))
        .form(&[("userId", other.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    // The owner completes it.
    let body: serde_json::Value = client
        .put(&format!("{}/api/tasks/{}/complete", address, task_id))
        .form(&[("userId", user.as_str())])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["task"]["isCompleted"], true);

    // And it stays completed in the daily view.
    let body: serde_json::Value = client
        .get(&format!("{}/api/tasks/daily/{}", address, user))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["Day"][0]["isCompleted"], true);
}
