//! HTTP API integration tests
//!
//! Exercises the router end to end with a scripted enrichment capability:
//! ingest → selection → batch run → validation, plus error responses for
//! invalid commands.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use songdex_ce::enrichment::{Enricher, Enrichment, EnrichmentError};
use songdex_ce::models::{EnrichedFields, MusicItem};
use songdex_ce::AppState;
use songdex_common::events::EventBus;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// Enricher that succeeds for everything except titles containing "fail"
struct TestEnricher;

#[async_trait]
impl Enricher for TestEnricher {
    async fn enrich(&self, item: &MusicItem) -> Result<Enrichment, EnrichmentError> {
        if item.title.to_lowercase().contains("fail") {
            return Err(EnrichmentError::NoMatch(item.title.clone()));
        }
        Ok(Enrichment {
            fields: EnrichedFields {
                album: Some("Test Album".to_string()),
                release_year: Some(1971),
                ..Default::default()
            },
            confidence_score: 92,
            source: "test".to_string(),
        })
    }
}

fn app() -> Router {
    let state = AppState::new(Arc::new(TestEnricher), EventBus::new(64));
    songdex_ce::build_router(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = match body {
        Some(value) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .expect("request builds"),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request builds"),
    };

    let response = app.clone().oneshot(request).await.expect("handler runs");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body readable")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

fn scenario_catalog() -> Value {
    json!({
        "files": [{
            "filename": "catalog.xlsx",
            "sheets": [{
                "sheet_name": "Sheet1",
                "headers": ["Música: Nome", "Artista"],
                "rows": [
                    ["Música: Imagine", "John Lennon"],
                    ["", "X"],
                    ["Help", "The Beatles"]
                ]
            }]
        }]
    })
}

async fn ingest(app: &Router) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/catalog/ingest",
        Some(scenario_catalog()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

async fn wait_for_batch_status(app: &Router, want: &str) -> Value {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let (status, body) = send(app, Method::GET, "/batch/status", None).await;
            assert_eq!(status, StatusCode::OK);
            if body["status"] == want {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("batch status {want} not reached in time"))
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "songdex-ce");
}

#[tokio::test]
async fn ingest_detects_columns_and_extracts_titles() {
    let app = app();
    let body = ingest(&app).await;

    assert_eq!(body["stats"]["total_files"], 1);
    assert_eq!(body["stats"]["total_sheets"], 1);
    assert_eq!(body["stats"]["total_titles"], 2);
    assert_eq!(body["stats"]["unique_titles"], 2);

    let columns = &body["files"][0]["sheets"][0]["detected_columns"];
    assert_eq!(columns["title"]["index"], 0);
    assert_eq!(columns["title"]["name"], "Música: Nome");
    assert_eq!(columns["artist"]["index"], 1);
    assert!(columns["lyrics"].is_null());

    let (status, titles) = send(&app, Method::GET, "/catalog/titles", None).await;
    assert_eq!(status, StatusCode::OK);
    let titles = titles.as_array().expect("array");
    assert_eq!(titles.len(), 2);
    assert_eq!(titles[0]["title"], "Imagine");
    assert_eq!(titles[0]["artist"], "John Lennon");
    assert_eq!(titles[1]["title"], "Help");
}

#[tokio::test]
async fn ingest_without_files_is_bad_request() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/catalog/ingest",
        Some(json!({"files": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn selection_supports_toggle_and_filtered_bulk_ops() {
    let app = app();
    ingest(&app).await;

    let (status, body) = send(&app, Method::GET, "/selection", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected"], json!(["imagine", "help"]));
    assert_eq!(body["selected_count"], 2);
    assert_eq!(body["total"], 2);

    let (status, body) = send(
        &app,
        Method::POST,
        "/selection/toggle",
        Some(json!({"key": "help"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected"], json!(["imagine"]));

    let (status, body) = send(&app, Method::POST, "/selection/clear", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected_count"], 0);

    let (status, body) = send(
        &app,
        Method::POST,
        "/selection/select-all",
        Some(json!({"filter": "lennon"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected"], json!(["imagine"]));

    let (status, body) = send(
        &app,
        Method::POST,
        "/selection/toggle",
        Some(json!({"key": "unknown"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn full_pipeline_enriches_then_validates() {
    let app = app();
    ingest(&app).await;

    let (status, body) = send(&app, Method::POST, "/batch/submit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["submitted"], 2);

    let final_status = wait_for_batch_status(&app, "completed").await;
    assert_eq!(final_status["progress"]["current"], 2);
    assert_eq!(final_status["progress"]["percentage"], 100.0);

    let (status, items) = send(&app, Method::GET, "/items?filter=pending", None).await;
    assert_eq!(status, StatusCode::OK);
    let items = items.as_array().expect("array").clone();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i["status"] == "enriched"));
    assert_eq!(items[0]["enriched_fields"]["album"], "Test Album");
    assert_eq!(items[0]["confidence_score"], 92);

    let first = items[0]["id"].as_str().expect("uuid").to_string();
    let second = items[1]["id"].as_str().expect("uuid").to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/items/{first}/review"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "validating");

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/items/{first}"),
        Some(json!({"genre": "rock"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enriched_fields"]["genre"], "rock");
    assert_eq!(body["enriched_fields"]["album"], "Test Album");
    assert_eq!(body["status"], "validating");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/items/{first}/validate"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "validated");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/items/{second}/reject"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");

    let (_, validated) = send(&app, Method::GET, "/items?filter=validated", None).await;
    assert_eq!(validated.as_array().expect("array").len(), 1);
    let (_, rejected) = send(&app, Method::GET, "/items?filter=rejected", None).await;
    assert_eq!(rejected.as_array().expect("array").len(), 1);
    let (_, pending) = send(&app, Method::GET, "/items?filter=pending", None).await;
    assert_eq!(pending.as_array().expect("array").len(), 0);

    // Terminal items are closed to further review commands
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/items/{first}/reject"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    // No failures this run
    let (_, errors) = send(&app, Method::GET, "/errors", None).await;
    assert_eq!(errors["count"], 0);
}

#[tokio::test]
async fn empty_selection_submission_completes_with_zero_total() {
    let app = app();
    ingest(&app).await;

    send(&app, Method::POST, "/selection/clear", Some(json!({}))).await;

    let (status, body) = send(&app, Method::POST, "/batch/submit", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["submitted"], 0);
    assert_eq!(body["snapshot"]["status"], "completed");
    assert_eq!(body["snapshot"]["progress"]["total"], 0);
}

#[tokio::test]
async fn failed_items_land_in_the_error_log_with_retry() {
    let app = app();
    let catalog = json!({
        "files": [{
            "filename": "catalog.xlsx",
            "sheets": [{
                "sheet_name": "Sheet1",
                "headers": ["Title"],
                "rows": [["Good Song"], ["fail me"]]
            }]
        }]
    });
    let (status, _) = send(&app, Method::POST, "/catalog/ingest", Some(catalog)).await;
    assert_eq!(status, StatusCode::OK);

    send(&app, Method::POST, "/batch/submit", None).await;
    wait_for_batch_status(&app, "completed").await;

    let (status, errors) = send(&app, Method::GET, "/errors", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(errors["count"], 1);
    let entry = &errors["entries"][0];
    assert!(entry["message"]
        .as_str()
        .expect("message")
        .contains("no match found"));
    assert_eq!(entry["failed_items"].as_array().expect("array").len(), 1);

    // The enricher keeps failing that title, so the retry run logs it again
    let (status, body) = send(&app, Method::POST, "/errors/retry", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["session_id"].is_string());

    wait_for_batch_status(&app, "completed").await;
    let (_, errors) = send(&app, Method::GET, "/errors", None).await;
    assert_eq!(errors["count"], 1);

    let (status, body) = send(&app, Method::POST, "/errors/clear", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], 1);
}

#[tokio::test]
async fn batch_commands_conflict_when_idle() {
    let app = app();
    for uri in ["/batch/pause", "/batch/resume", "/batch/cancel"] {
        let (status, body) = send(&app, Method::POST, uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT, "{uri} should conflict");
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    // Reset from idle is a no-op, not an error
    let (status, body) = send(&app, Method::POST, "/batch/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "idle");
}

#[tokio::test]
async fn unknown_item_is_not_found() {
    let app = app();
    let id = uuid::Uuid::new_v4();
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/items/{id}/validate"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn retry_with_empty_log_is_not_found() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/errors/retry", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}
