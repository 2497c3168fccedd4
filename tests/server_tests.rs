use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use udiscovery_runner::config::{InterpreterCandidate, WorkerConfig};
use udiscovery_runner::runner::JobRunner;
use udiscovery_runner::server::{router, AppState};

/// Build the app around a stand-in `/bin/sh` worker.
fn sh_worker_app(dir: &TempDir, script_body: &str) -> Router {
    let script_path = dir.path().join("worker.sh");
    fs::write(&script_path, script_body).unwrap();
    let config = WorkerConfig::new(dir.path())
        .with_script("worker.sh")
        .with_interpreters(vec![InterpreterCandidate::Bundled(PathBuf::from("/bin/sh"))]);
    router(AppState {
        runner: Arc::new(JobRunner::new(config)),
    })
}

fn demo_request(goal: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/demo")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "goal": goal }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_demo_returns_worker_payload_verbatim() {
    let dir = TempDir::new().unwrap();
    let app = sh_worker_app(
        &dir,
        r#"echo 'loading pipeline'
echo '{"success": true, "result": "ranked 3 candidates"}'
"#,
    );

    let response = app.oneshot(demo_request("rank candidates")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/json"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        json,
        json!({"success": true, "result": "ranked 3 candidates"})
    );
}

#[tokio::test]
async fn test_demo_rejects_empty_goal() {
    let dir = TempDir::new().unwrap();
    let app = sh_worker_app(&dir, "echo '{\"ok\":true}'\n");

    let response = app.oneshot(demo_request("")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("non-empty"));
}

#[tokio::test]
async fn test_demo_rejects_body_without_goal_field() {
    let dir = TempDir::new().unwrap();
    let app = sh_worker_app(&dir, "echo '{\"ok\":true}'\n");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/demo")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("non-empty"));
}

#[tokio::test]
async fn test_demo_unavailable_without_interpreter() {
    let dir = TempDir::new().unwrap();
    let script_path = dir.path().join("worker.sh");
    fs::write(&script_path, "echo '{\"ok\":true}'\n").unwrap();
    let config = WorkerConfig::new(dir.path())
        .with_script("worker.sh")
        .with_interpreters(vec![InterpreterCandidate::System(
            "udiscovery-no-such-interpreter".to_string(),
        )]);
    let app = router(AppState {
        runner: Arc::new(JobRunner::new(config)),
    });

    let response = app.oneshot(demo_request("goal")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("interpreter"));
}

#[tokio::test]
async fn test_demo_reports_worker_failure() {
    let dir = TempDir::new().unwrap();
    let app = sh_worker_app(
        &dir,
        r#"echo 'pipeline blew up' >&2
exit 3
"#,
    );

    let response = app.oneshot(demo_request("goal")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
    let error = json["error"].as_str().unwrap();
    assert!(error.contains("code 3"));
    assert!(error.contains("pipeline blew up"));
}

#[tokio::test]
async fn test_health_reports_ok() {
    let dir = TempDir::new().unwrap();
    let app = sh_worker_app(&dir, "echo '{\"ok\":true}'\n");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, json!({"status": "ok"}));
}
