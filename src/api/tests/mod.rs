use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tower::ServiceExt; // for oneshot


/// Helper to create a test ArchiveManager instance wrapped in Arc
async fn create_test_manager() -> (Arc<ArchiveManager>, tempfile::TempDir) {
    let (manager, temp_dir) = crate::manager::test_helpers::test_manager().await;
    (Arc::new(manager), temp_dir)
}

/// Parse a response body as JSON
async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_ok_and_version() {
    let (manager, _temp_dir) = create_test_manager().await;
    let config = manager.get_config();

    let app = create_router(manager, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn cors_headers_present_when_enabled() {
    let (manager, _temp_dir) = create_test_manager().await;

    let mut config = (*manager.get_config()).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let config = Arc::new(config);

    let app = create_router(manager, config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn api_key_required_when_configured() {
    let (manager, _temp_dir) = create_test_manager().await;

    let mut config = (*manager.get_config()).clone();
    config.server.api.api_key = Some("test-secret-key".to_string());
    let config = Arc::new(config);

    let app = create_router(manager, config);

    // Without key: 401
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // With the right key: 200
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("X-Api-Key", "test-secret-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Wrong key: 401
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("X-Api-Key", "wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn authentication_disabled_by_default() {
    let (manager, _temp_dir) = create_test_manager().await;
    let config = manager.get_config();
    assert!(config.server.api.api_key.is_none());

    let app = create_router(manager, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn openapi_json_endpoint_serves_the_spec() {
    let (manager, _temp_dir) = create_test_manager().await;
    let config = manager.get_config();

    let app = create_router(manager, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json.get("openapi").is_some(), "Should have 'openapi' field");
    assert_eq!(json["info"]["title"], "fetchzip REST API");
    assert!(
        json["paths"].as_object().unwrap().contains_key("/archives"),
        "Spec should document /archives"
    );
}

#[tokio::test]
async fn swagger_ui_can_be_disabled() {
    let (manager, _temp_dir) = create_test_manager().await;

    let mut config = (*manager.get_config()).clone();
    config.server.api.swagger_ui = false;
    let config = Arc::new(config);

    let app = create_router(manager, config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.status(),
        StatusCode::NOT_FOUND,
        "Swagger UI should not be accessible when disabled"
    );
}

#[tokio::test]
async fn server_starts_and_responds_over_tcp() {
    let (manager, _temp_dir) = create_test_manager().await;

    // Bind to a random available port (port 0)
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = (*manager.get_config()).clone();
    config.server.api.bind_address = addr;
    let config = Arc::new(config);

    let server_manager = manager.clone();
    let server_config = config.clone();
    let server_handle = tokio::spawn(async move {
        let app = create_router(server_manager, server_config);
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    let client = reqwest::Client::new();
    let url = format!("http://{}/health", addr);
    let response = client.get(url).send().await.unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["status"], "ok");

    server_handle.abort();
}

#[tokio::test]
async fn spawn_api_server_method_runs() {
    let (manager, _temp_dir) = crate::manager::test_helpers::test_manager_with(|config| {
        // Port 0 = OS assigns a free port
        config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    })
    .await;
    let manager = Arc::new(manager);

    let api_handle = manager.spawn_api_server();

    tokio::time::sleep(Duration::from_millis(100)).await;

    api_handle.abort();
}
