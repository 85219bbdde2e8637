use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;

use tvshelf_api::routes::create_router;
use tvshelf_api::state::AppState;
use tvshelf_api::store::MemoryStore;

fn create_test_server() -> TestServer {
    let state = AppState::new(Arc::new(MemoryStore::new()));
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

fn rating_url(user: &str, show: &str) -> String {
    format!("/api/v1/users/{user}/shows/{show}/rating")
}

fn status_url(user: &str, show: &str) -> String {
    format!("/api/v1/users/{user}/shows/{show}/status")
}

async fn get_aggregate(server: &TestServer, user: &str) -> serde_json::Value {
    let response = server.get(&format!("/api/v1/users/{user}/aggregate")).await;
    response.assert_status_ok();
    response.json()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_rate_then_read_back() {
    let server = create_test_server();

    let response = server
        .put(&rating_url("u1", "s1"))
        .json(&json!({ "rating": 4 }))
        .await;
    response.assert_status(axum::http::StatusCode::NO_CONTENT);

    let response = server.get(&rating_url("u1", "s1")).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["rating"], 4);

    let aggregate = get_aggregate(&server, "u1").await;
    assert_eq!(aggregate["total_rating"], 4);
    assert_eq!(aggregate["rating_count"], 1);
    assert_eq!(aggregate["average_rating"], 4.0);
}

#[tokio::test]
async fn test_unrated_show_reads_as_null() {
    let server = create_test_server();

    let response = server.get(&rating_url("u1", "never-rated")).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["rating"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_rating_lifecycle_keeps_aggregate_consistent() {
    let server = create_test_server();

    // Rate a first show.
    server
        .put(&rating_url("u1", "s1"))
        .json(&json!({ "rating": 4 }))
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);
    let aggregate = get_aggregate(&server, "u1").await;
    assert_eq!(aggregate["total_rating"], 4);
    assert_eq!(aggregate["rating_count"], 1);
    assert_eq!(aggregate["average_rating"], 4.0);

    // Re-rate it: the count must not grow.
    server
        .put(&rating_url("u1", "s1"))
        .json(&json!({ "rating": 2 }))
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);
    let aggregate = get_aggregate(&server, "u1").await;
    assert_eq!(aggregate["total_rating"], 2);
    assert_eq!(aggregate["rating_count"], 1);
    assert_eq!(aggregate["average_rating"], 2.0);

    // Rate a second show.
    server
        .put(&rating_url("u1", "s2"))
        .json(&json!({ "rating": 5 }))
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);
    let aggregate = get_aggregate(&server, "u1").await;
    assert_eq!(aggregate["total_rating"], 7);
    assert_eq!(aggregate["rating_count"], 2);
    assert_eq!(aggregate["average_rating"], 3.5);

    // Remove the first rating.
    server
        .delete(&rating_url("u1", "s1"))
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);
    let aggregate = get_aggregate(&server, "u1").await;
    assert_eq!(aggregate["total_rating"], 5);
    assert_eq!(aggregate["rating_count"], 1);
    assert_eq!(aggregate["average_rating"], 5.0);
}

#[tokio::test]
async fn test_out_of_range_ratings_are_rejected() {
    let server = create_test_server();

    for bad in [0, 6, 42] {
        let response = server
            .put(&rating_url("u1", "s1"))
            .json(&json!({ "rating": bad }))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("rating"));
    }

    // Nothing was written.
    let aggregate = get_aggregate(&server, "u1").await;
    assert_eq!(aggregate["rating_count"], 0);
    assert_eq!(aggregate["total_rating"], 0);
    assert_eq!(aggregate["average_rating"], 0.0);
}

#[tokio::test]
async fn test_deleting_unrated_show_is_a_noop() {
    let server = create_test_server();

    server
        .delete(&rating_url("u1", "s1"))
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);
    server
        .delete(&rating_url("u1", "s1"))
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);

    let aggregate = get_aggregate(&server, "u1").await;
    assert_eq!(aggregate["rating_count"], 0);
}

#[tokio::test]
async fn test_aggregates_are_per_user() {
    let server = create_test_server();

    server
        .put(&rating_url("u1", "s1"))
        .json(&json!({ "rating": 2 }))
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);
    server
        .put(&rating_url("u2", "s1"))
        .json(&json!({ "rating": 5 }))
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);

    let first = get_aggregate(&server, "u1").await;
    let second = get_aggregate(&server, "u2").await;
    assert_eq!(first["total_rating"], 2);
    assert_eq!(second["total_rating"], 5);
}

#[tokio::test]
async fn test_watch_status_defaults_to_watch_now() {
    let server = create_test_server();

    let response = server.get(&status_url("u1", "s1")).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["watch_state"], "watch_now");
    assert_eq!(body["poster_path"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_watch_status_roundtrip_keeps_poster() {
    let server = create_test_server();

    server
        .put(&status_url("u1", "s1"))
        .json(&json!({ "watch_state": "watching", "poster_path": "/p.jpg" }))
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);

    // A later client without the artwork must not blank it out.
    server
        .put(&status_url("u1", "s1"))
        .json(&json!({ "watch_state": "watched" }))
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);

    let response = server.get(&status_url("u1", "s1")).await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["watch_state"], "watched");
    assert_eq!(body["poster_path"], "/p.jpg");
}

#[tokio::test]
async fn test_watch_now_resets_status_and_rating() {
    let server = create_test_server();

    server
        .put(&status_url("u1", "s1"))
        .json(&json!({ "watch_state": "watched" }))
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);
    server
        .put(&rating_url("u1", "s1"))
        .json(&json!({ "rating": 4 }))
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);

    server
        .put(&status_url("u1", "s1"))
        .json(&json!({ "watch_state": "watch_now" }))
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);

    let status: serde_json::Value = server.get(&status_url("u1", "s1")).await.json();
    assert_eq!(status["watch_state"], "watch_now");

    let rating: serde_json::Value = server.get(&rating_url("u1", "s1")).await.json();
    assert_eq!(rating["rating"], serde_json::Value::Null);

    let aggregate = get_aggregate(&server, "u1").await;
    assert_eq!(aggregate["rating_count"], 0);
    assert_eq!(aggregate["total_rating"], 0);
}

#[tokio::test]
async fn test_unknown_watch_state_is_rejected() {
    let server = create_test_server();

    let response = server
        .put(&status_url("u1", "s1"))
        .json(&json!({ "watch_state": "binged" }))
        .await;
    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_favorites_flow() {
    let server = create_test_server();

    server
        .put("/api/v1/users/u1/favorites/s1")
        .json(&json!({ "poster_path": "/a.jpg" }))
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);
    server
        .put("/api/v1/users/u1/favorites/s2")
        .json(&json!({}))
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);
    // Favoriting the same show twice keeps a single entry.
    server
        .put("/api/v1/users/u1/favorites/s1")
        .json(&json!({ "poster_path": "/a.jpg" }))
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);

    let response = server.get("/api/v1/users/u1/favorites").await;
    response.assert_status_ok();
    let favorites: Vec<serde_json::Value> = response.json();
    assert_eq!(favorites.len(), 2);
    assert_eq!(favorites[0]["show_id"], "s1");
    assert_eq!(favorites[0]["poster_path"], "/a.jpg");

    server
        .delete("/api/v1/users/u1/favorites/s1")
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);
    let favorites: Vec<serde_json::Value> = server.get("/api/v1/users/u1/favorites").await.json();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0]["show_id"], "s2");
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let server = create_test_server();
    let response = server.get("/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}
