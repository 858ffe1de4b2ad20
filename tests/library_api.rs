//! Library endpoints driven through the full router.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;

use common::{build_test_app, delete, get, patch, post, put, FakeCatalog};

async fn app() -> axum::Router {
    build_test_app(Arc::new(FakeCatalog::default())).await
}

fn entry(id: &str, title: &str, status: &str, rating: i32) -> serde_json::Value {
    json!({
        "book": { "id": id, "title": title },
        "status": status,
        "rating": rating
    })
}

#[tokio::test]
async fn b1_scenario_over_http() {
    let app = app().await;

    let (status, _) = put(&app, "/api/library/b1", entry("b1", "Dune", "ON_QUEUE", 0)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = get(&app, "/api/library/b1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ON_QUEUE");
    assert_eq!(json["rating"], 0);

    let (status, _) = put(&app, "/api/library/b1/status", json!({ "status": "READ" })).await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = get(&app, "/api/library/b1").await;
    assert_eq!(json["status"], "READ");
    assert_eq!(json["rating"], 0);
}

#[tokio::test]
async fn rating_outside_zero_to_five_is_unprocessable() {
    let app = app().await;

    for rating in [-1, 6, 100] {
        let (status, json) =
            put(&app, "/api/library/b1", entry("b1", "Dune", "ON_QUEUE", rating)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "rating {rating}");
        assert_eq!(json["error"]["code"], "validation_error");
        assert_eq!(json["error"]["details"][0]["field"], "rating");
    }

    for rating in 0..=5 {
        let (status, _) =
            put(&app, "/api/library/b1", entry("b1", "Dune", "ON_QUEUE", rating)).await;
        assert_eq!(status, StatusCode::OK, "rating {rating}");
    }
}

#[tokio::test]
async fn delete_is_idempotent() {
    let app = app().await;
    put(&app, "/api/library/b1", entry("b1", "Dune", "ON_QUEUE", 0)).await;

    let (first, _) = delete(&app, "/api/library/b1").await;
    let (second, _) = delete(&app, "/api/library/b1").await;
    assert_eq!(first, StatusCode::NO_CONTENT);
    assert_eq!(second, StatusCode::NO_CONTENT);

    let (status, json) = get(&app, "/api/library/b1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn status_round_trip_for_every_status() {
    let app = app().await;
    put(&app, "/api/library/b1", entry("b1", "Dune", "READING", 3)).await;

    for target in ["ON_QUEUE", "READING", "READ", "READ", "ON_QUEUE"] {
        let (status, json) =
            put(&app, "/api/library/b1/status", json!({ "status": target })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], target);

        let (_, json) = get(&app, "/api/library/b1").await;
        assert_eq!(json["status"], target);
        assert_eq!(json["rating"], 3);
    }
}

#[tokio::test]
async fn unknown_status_is_rejected() {
    let app = app().await;
    put(&app, "/api/library/b1", entry("b1", "Dune", "ON_QUEUE", 0)).await;

    let (status, json) = put(&app, "/api/library/b1/status", json!({ "status": "DONE" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"]["code"], "invalid_status");

    let (status, _) = get(&app, "/api/library?status=FINISHED").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn status_of_missing_book_is_not_found() {
    let app = app().await;
    let (status, _) = put(&app, "/api/library/ghost/status", json!({ "status": "READ" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn adding_a_book_twice_keeps_the_first_entry() {
    let app = app().await;
    let book = json!({ "id": "b7", "title": "Solaris", "authors": "Stanisław Lem" });

    let (status, json) = post(&app, "/api/library", book.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "ON_QUEUE");
    assert_eq!(json["rating"], 0);

    put(&app, "/api/library/b7/status", json!({ "status": "READING" })).await;

    let (status, json) = post(&app, "/api/library", book).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "READING");
}

#[tokio::test]
async fn shelves_are_sorted_and_filtered() {
    let app = app().await;
    put(&app, "/api/library/z", entry("z", "zen", "READ", 4)).await;
    put(&app, "/api/library/a", entry("a", "Anathem", "READING", 0)).await;
    put(&app, "/api/library/m", entry("m", "Middlemarch", "READ", 5)).await;

    let (status, json) = get(&app, "/api/library").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["book"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["a", "m", "z"]);

    let (_, json) = get(&app, "/api/library?status=READ").await;
    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["book"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["m", "z"]);
}

#[tokio::test]
async fn patch_saves_all_edits_as_one_batch() {
    let app = app().await;
    put(&app, "/api/library/b1", entry("b1", "Dune", "ON_QUEUE", 0)).await;

    let (status, json) = patch(
        &app,
        "/api/library/b1",
        json!({ "status": "READ", "rating": 5, "thoughts": "  the spice must flow " }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["has_changes"], false);
    assert_eq!(json["saving_changes"], false);

    let (_, json) = get(&app, "/api/library/b1").await;
    assert_eq!(json["status"], "READ");
    assert_eq!(json["rating"], 5);
    assert_eq!(json["thoughts"], "the spice must flow");
}

#[tokio::test]
async fn concurrent_patches_to_different_fields_both_land() {
    let app = app().await;
    put(&app, "/api/library/b1", entry("b1", "Dune", "ON_QUEUE", 0)).await;

    let (rating, thoughts) = tokio::join!(
        patch(&app, "/api/library/b1", json!({ "rating": 4 })),
        patch(&app, "/api/library/b1", json!({ "thoughts": "x" })),
    );
    assert_eq!(rating.0, StatusCode::OK);
    assert_eq!(thoughts.0, StatusCode::OK);

    let (_, json) = get(&app, "/api/library/b1").await;
    assert_eq!(json["rating"], 4);
    assert_eq!(json["thoughts"], "x");
    assert_eq!(json["status"], "ON_QUEUE");
}

#[tokio::test]
async fn patch_with_bad_rating_changes_nothing() {
    let app = app().await;
    put(&app, "/api/library/b1", entry("b1", "Dune", "ON_QUEUE", 2)).await;

    let (status, _) = patch(
        &app,
        "/api/library/b1",
        json!({ "status": "READ", "rating": 9 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, json) = get(&app, "/api/library/b1").await;
    assert_eq!(json["status"], "ON_QUEUE");
    assert_eq!(json["rating"], 2);
}

#[tokio::test]
async fn patch_of_missing_book_is_not_found() {
    let app = app().await;
    let (status, _) = patch(&app, "/api/library/ghost", json!({ "rating": 3 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_with_mismatched_id_is_rejected() {
    let app = app().await;
    let (status, json) = put(&app, "/api/library/b1", entry("b2", "Dune", "ON_QUEUE", 0)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"]["details"][0]["field"], "book_id");
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let app = app().await;
    let (status, json) = put(&app, "/api/library/b1", json!({ "nope": true })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn health_endpoints_respond() {
    let app = app().await;

    let (status, body) = get(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, body) = get(&app, "/api/library/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "library module is healthy");
}

#[tokio::test]
async fn openapi_document_lists_module_paths() {
    let app = app().await;
    let (status, json) = get(&app, "/docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);

    let paths = json["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/library"));
    assert!(paths.contains_key("/api/library/{book_id}/status"));
    assert!(paths.contains_key("/api/catalog/search"));
    assert!(paths.contains_key("/api/catalog/sessions/{id}/more"));
    assert!(json["components"]["schemas"]["LibraryEntry"].is_object());
}
