mod common;

use std::sync::Arc;

use asset_schema_api::handlers::{self, AppContext};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

/// The returned database guard must outlive the router
async fn app() -> (common::TestDb, Router) {
    let db = common::setup().await;
    let state = Arc::new(AppContext::new(db.repos.clone(), db.settings));
    (db, handlers::router(state))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", "tester");
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn errors_map_to_status_codes() {
    let (_db, app) = app().await;

    let (status, body) = send(&app, "POST", "/asset-types", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["name is required"]));

    let (status, body) = send(&app, "GET", "/asset-types/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn field_lifecycle_over_http() {
    let (_db, app) = app().await;

    let (status, _) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, types) = send(&app, "POST", "/field-types/ensure-defaults", None).await;
    assert_eq!(status, StatusCode::OK);
    let text_id = types
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["slug"] == "text")
        .map(|t| t["id"].clone())
        .unwrap();

    let (status, laptop) = send(&app, "POST", "/asset-types", Some(json!({ "name": "Laptop" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let laptop_id = laptop["id"].as_str().unwrap().to_string();

    let fields_uri = format!("/asset-types/{laptop_id}/fields");
    let (status, field) = send(
        &app,
        "POST",
        &fields_uri,
        Some(json!({ "name": "Serial", "field_type_id": text_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(field["slug"], "serial");
    assert_eq!(field["created_by"], "tester");

    let (status, body) = send(
        &app,
        "POST",
        &fields_uri,
        Some(json!({ "name": "Serial", "field_type_id": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid field type");

    let (status, asset) = send(
        &app,
        "POST",
        &format!("/asset-types/{laptop_id}/assets"),
        Some(json!({ "label": "LT-1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let asset_id = asset["id"].as_str().unwrap().to_string();

    let (status, outcome) = send(
        &app,
        "PUT",
        &format!("/assets/{asset_id}/values"),
        Some(json!({ "values": { "serial": "SN-1" } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["record"]["complete"], true);

    let field_id = field["id"].as_str().unwrap();
    let (status, body) = send(&app, "DELETE", &format!("{fields_uri}/{field_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["values_count"], 1);

    let (status, report) = send(
        &app,
        "POST",
        &format!("/asset-types/{laptop_id}/reconcile"),
        Some(json!({ "presets": { "location": { "selected": true } } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["status"], "saved");

    let (status, state) = send(&app, "GET", &format!("/asset-types/{laptop_id}/presets"), None).await;
    assert_eq!(status, StatusCode::OK);
    let location = state["presets"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["key"] == "location")
        .unwrap();
    assert_eq!(location["selected"], true);

    let (status, record) = send(&app, "GET", &format!("/assets/{asset_id}/record"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["fields"].as_array().unwrap().len(), 2);
}
