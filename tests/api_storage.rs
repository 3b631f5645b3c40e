//! Router tests that go all the way to PostgreSQL.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`. The song
//! info API is never called here, so its URL points nowhere.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use song_library::models::SongInfo;
use song_library::services::{SongInfoClient, SongRepository};
use song_library::{build_router, AppState};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::util::ServiceExt; // for `oneshot`

async fn setup() -> (Router, Arc<SongRepository>) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database");
    let db = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Should connect to test database");

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Should apply migrations");

    let repository = Arc::new(SongRepository::new(db));
    let app = build_router(Arc::new(AppState {
        repository: repository.clone(),
        song_info: Arc::new(SongInfoClient::new("http://127.0.0.1:1".to_string())),
    }));
    (app, repository)
}

async fn create_song(repository: &SongRepository, text: &str) -> i32 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let group_id = repository
        .resolve_group(&format!("Verses {}", nanos))
        .await
        .unwrap();

    let song = repository
        .create_song_with_details(
            "Paged".to_string(),
            group_id,
            SongInfo {
                release_date: NaiveDate::from_ymd_opt(2006, 7, 16).unwrap(),
                text: text.to_string(),
                link: "https://example.com/paged".to_string(),
            },
        )
        .await
        .unwrap();
    song.id
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_text_pages_through_verses() {
    let (app, repository) = setup().await;
    let id = create_song(&repository, "A\n\nB\n\nC").await;

    let (status, body) = send(&app, "GET", &format!("/api/songs/{}/text?page=1&limit=2", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "text": "A\n\nB" }));

    let (status, body) = send(&app, "GET", &format!("/api/songs/{}/text?page=2&limit=2", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "text": "C" }));

    let (status, body) = send(&app, "GET", &format!("/api/songs/{}/text?page=3&limit=2", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "no more verses" }));

    // Only the first page value counts
    let (status, body) =
        send(&app, "GET", &format!("/api/songs/{}/text?page=2&page=1&limit=2", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "text": "C" }));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_delete_missing_song_is_ok() {
    let (app, repository) = setup().await;
    let id = create_song(&repository, "A").await;

    let (status, body) = send(&app, "DELETE", &format!("/api/songs/{}/delete", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    // Second delete hits nothing and still succeeds
    let (status, body) = send(&app, "DELETE", &format!("/api/songs/{}/delete", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, body) = send(&app, "GET", &format!("/api/songs/{}/text", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": format!("no such text with song_id: {}", id) }));
}
