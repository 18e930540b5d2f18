//! HTTP client tests against a mock backend.

use edge_console::config::BackendConfig;
use edge_console::hub::{ApiError, ExecuteNotebookRequest, HttpHubApi, HubApi, ImageFile};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, body_string_contains, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpHubApi {
    let backend = BackendConfig {
        host: server.address().ip().to_string(),
        port: server.address().port(),
        ..Default::default()
    };
    HttpHubApi::new(backend, Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_health_probe_hits_server_root() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).health().await.unwrap();
}

#[tokio::test]
async fn test_health_probe_non_2xx_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server).health().await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 503, .. }));
}

#[tokio::test]
async fn test_health_probe_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let backend = BackendConfig {
        host: server.address().ip().to_string(),
        port: server.address().port(),
        ..Default::default()
    };
    let api = HttpHubApi::new(backend, Duration::from_millis(100)).unwrap();

    assert_eq!(api.health().await.unwrap_err(), ApiError::Timeout);
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let backend = BackendConfig {
        host: "127.0.0.1".to_string(),
        port: 1,
        ..Default::default()
    };
    let api = HttpHubApi::new(backend, Duration::from_secs(1)).unwrap();

    assert!(matches!(
        api.system_info().await.unwrap_err(),
        ApiError::Network(_)
    ));
}

#[tokio::test]
async fn test_system_info_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/system/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jupyterhub_url": "http://hub.local:8000",
            "jupyterhub_user": "akumar",
            "jetson_ip": "192.168.1.50",
            "connected": true,
            "active_deployments": 2
        })))
        .mount(&server)
        .await;

    let info = client_for(&server).system_info().await.unwrap();
    assert_eq!(info.jetson_ip, "192.168.1.50");
    assert_eq!(info.active_deployments, 2);
}

#[tokio::test]
async fn test_connect_sends_token_and_returns_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jupyterhub/connect"))
        .and(body_json(json!({"token": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "connected",
            "user_info": {"name": "akumar", "admin": false, "server_running": true}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = client_for(&server).connect("secret").await.unwrap();
    assert_eq!(user.name, "akumar");
    assert!(user.server_running);
}

#[tokio::test]
async fn test_connect_rejection_carries_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jupyterhub/connect"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid JupyterHub token"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).connect("bad").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Http {
            status: 401,
            detail: "Invalid JupyterHub token".to_string()
        }
    );
    assert_eq!(err.to_string(), "Invalid JupyterHub token");
}

#[tokio::test]
async fn test_error_without_detail_gets_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/jupyterhub/start-server"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let err = client_for(&server).start_server().await.unwrap_err();
    assert_eq!(err.to_string(), "backend returned HTTP 500");
}

#[tokio::test]
async fn test_unparseable_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/jupyterhub/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).hub_status().await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_upload_sends_multipart_images() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/training/upload"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .and(body_string_contains("name=\"object_name\""))
        .and(body_string_contains("cat"))
        .and(body_string_contains("filename=\"a.jpg\""))
        .and(body_string_contains("image/jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "training_id": "t-123",
            "files_uploaded": 2,
            "message": "ok"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.jpg");
    let b = dir.path().join("b.png");
    std::fs::write(&a, b"jpeg-bytes").unwrap();
    std::fs::write(&b, b"png-bytes").unwrap();
    let files = vec![
        ImageFile::from_path(a).unwrap(),
        ImageFile::from_path(b).unwrap(),
    ];

    let response = client_for(&server).upload("cat", &files).await.unwrap();
    assert_eq!(response.training_id, "t-123");
    assert_eq!(response.files_uploaded, 2);
}

#[tokio::test]
async fn test_upload_missing_file_fails_before_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/training/upload"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let files = vec![ImageFile::from_path("/nonexistent/a.jpg").unwrap()];
    let err = client_for(&server).upload("cat", &files).await.unwrap_err();
    assert!(matches!(err, ApiError::File { .. }));
}

#[tokio::test]
async fn test_training_start_and_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/training/execute-notebook"))
        .and(body_json(json!({
            "object_name": "cat",
            "notebook_path": "train.ipynb",
            "timeout": 3600
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"training_id": "train-9"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/training/status/train-9"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "running", "progress": 42.5})),
        )
        .mount(&server)
        .await;

    let api = client_for(&server);
    let id = api
        .execute_notebook(&ExecuteNotebookRequest {
            object_name: "cat".to_string(),
            notebook_path: "train.ipynb".to_string(),
            timeout: 3600,
        })
        .await
        .unwrap();
    assert_eq!(id, "train-9");

    let status = api.training_status(&id).await.unwrap();
    assert_eq!(status.status, "running");
    assert_eq!(status.progress, Some(42.5));
}

#[tokio::test]
async fn test_deployment_start_and_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/deployment/start"))
        .and(body_json(json!({"model_type": "face_recognition"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"deployment_id": "dep-1"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/deployment/status/dep-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "failed", "message": "disk full"})),
        )
        .mount(&server)
        .await;

    let api = client_for(&server);
    let id = api.start_deployment("face_recognition").await.unwrap();
    let status = api.deployment_status(&id).await.unwrap();
    assert_eq!(status.status, "failed");
    assert!(status.progress.is_none());
    assert_eq!(status.message, "disk full");
}

#[tokio::test]
async fn test_stream_start_and_stop() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/stream/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "started",
            "mqtt_connected": false,
            "is_running": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/stream/stop"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "stopped"})),
        )
        .mount(&server)
        .await;

    let api = client_for(&server);
    let started = api.start_stream().await.unwrap();
    assert!(!started.mqtt_connected);
    assert!(started.is_running);

    let stopped = api.stop_stream().await.unwrap();
    assert_eq!(stopped.status, "stopped");
    assert!(stopped.message.is_empty());
}

#[tokio::test]
async fn test_custom_api_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/stream/stop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "stopped"})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = BackendConfig {
        host: server.address().ip().to_string(),
        port: server.address().port(),
        api_prefix: "/v2/".to_string(),
        request_timeout_seconds: None,
    };
    let api = HttpHubApi::new(backend, Duration::from_secs(2)).unwrap();
    api.stop_stream().await.unwrap();
}
