//! HTTP surface tests exercising the router end to end.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrond_lib::api::create_router;
use metrond_lib::core::MetricUpdate;
use metrond_lib::gateway::IngestionGateway;
use metrond_lib::integrity::SignatureVerifier;
use metrond_lib::storage::{FileBackend, MetricStore};
use std::sync::Arc;
use tower::ServiceExt;

fn router(dir: &tempfile::TempDir, key: &str) -> (axum::Router, Arc<IngestionGateway>) {
    let gateway = Arc::new(IngestionGateway::new(
        Arc::new(MetricStore::new()),
        Arc::new(FileBackend::new(dir.path().join("db.json"))),
        SignatureVerifier::new(key),
        false,
    ));
    (create_router(Arc::clone(&gateway)), gateway)
}

fn json_post(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn update_and_value_json_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = router(&dir, "");

    let update = serde_json::to_string(&MetricUpdate::gauge("Alloc", 100.5)).unwrap();
    let response = app.clone().oneshot(json_post("/update/", update)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let query = r#"{"id":"Alloc","type":"gauge"}"#.to_string();
    let response = app.oneshot(json_post("/value/", query)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: MetricUpdate = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body.value, Some(100.5));
}

#[tokio::test]
async fn batch_endpoint_applies_all_updates() {
    let dir = tempfile::tempdir().unwrap();
    let (app, gateway) = router(&dir, "");

    let batch = serde_json::to_string(&vec![
        MetricUpdate::counter("PollCount", 1),
        MetricUpdate::counter("PollCount", 1),
        MetricUpdate::gauge("Alloc", 10.0),
    ])
    .unwrap();
    let response = app.oneshot(json_post("/updates/", batch)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(gateway.value("PollCount", "counter").unwrap().delta, Some(2));
}

#[tokio::test]
async fn path_style_update_and_value() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = router(&dir, "");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/update/counter/PollCount/5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/value/counter/PollCount")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "5");
}

#[tokio::test]
async fn unknown_kind_maps_to_not_implemented() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = router(&dir, "");

    let body = r#"{"id":"X","type":"histogram","value":1.0}"#.to_string();
    let response = app.oneshot(json_post("/update/", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
}

#[tokio::test]
async fn missing_metric_maps_to_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = router(&dir, "");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/value/gauge/Missing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tampered_signature_maps_to_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let (app, gateway) = router(&dir, "k1");

    let body =
        serde_json::to_string(&MetricUpdate::gauge("Alloc", 100.5).with_hash("bogus")).unwrap();
    let response = app.oneshot(json_post("/update/", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(gateway.snapshot().is_empty());
}

#[tokio::test]
async fn list_renders_sorted_gauges() {
    let dir = tempfile::tempdir().unwrap();
    let (app, gateway) = router(&dir, "");

    gateway.apply(&MetricUpdate::gauge("Zulu", 2.0)).await.unwrap();
    gateway.apply(&MetricUpdate::gauge("Alpha", 1.0)).await.unwrap();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    let alpha = html.find("Alpha").unwrap();
    let zulu = html.find("Zulu").unwrap();
    assert!(alpha < zulu);
}

#[tokio::test]
async fn ping_reports_backend_health() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _) = router(&dir, "");

    let response = app
        .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
