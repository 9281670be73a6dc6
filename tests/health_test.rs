use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use pdfmatrix_backend::config::AppConfig;
use pdfmatrix_backend::services::convert::ConversionService;
use pdfmatrix_backend::services::executor::ProcessRunner;
use pdfmatrix_backend::services::workspace::Workspace;
use pdfmatrix_backend::{AppState, create_app};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

async fn app_with(config: AppConfig) -> (tempfile::TempDir, axum::Router) {
    let dir = tempfile::tempdir().unwrap();
    let workspace = Workspace::create(dir.path().join("ws")).await.unwrap();
    let converter = Arc::new(ConversionService::new(
        workspace,
        Arc::new(ProcessRunner),
        config.clone(),
    ));
    (dir, create_app(AppState { converter, config }))
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_root_liveness() {
    let (_dir, app) = app_with(AppConfig::default()).await;
    let (status, json) = get_json(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "running");
    assert_eq!(json["message"], "PDF Matrix Backend API");
    assert!(!json["version"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_health_reports_missing_tools_without_failing() {
    let mut config = AppConfig::default();
    config.unoconv_program = "definitely-not-a-real-unoconv".to_string();
    config.soffice_program = "definitely-not-a-real-soffice".to_string();
    let (_dir, app) = app_with(config).await;

    let (status, json) = get_json(&app, "/health").await;

    // Health reporting itself never fails
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["libreoffice"], false);
    assert_eq!(json["unoconv"], false);
}

#[tokio::test]
async fn test_health_reports_resolvable_tools() {
    // `sh` stands in for tools guaranteed to be on any PATH we run under
    let mut config = AppConfig::default();
    config.unoconv_program = "sh".to_string();
    config.soffice_program = "sh".to_string();
    let (_dir, app) = app_with(config).await;

    let (status, json) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["libreoffice"], true);
    assert_eq!(json["unoconv"], true);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let (_dir, app) = app_with(AppConfig::default()).await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .header("x-request-id", "test-id-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "test-id-123");
}
