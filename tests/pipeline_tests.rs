use axum::http::StatusCode;
use axum_test::TestServer;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use textgate::{
    backend::{self, AnalysisResult},
    config::{self, BackendConfig},
    request::EndpointKind,
    retry::RetryPolicy,
    server::{self, DispatchError, Dispatcher},
};
use tokio::time::Instant;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{test_policy, StubBackend};

async fn mount_model_server(server: &MockServer, model_id: &str) {
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"model_id": model_id})))
        .mount(server)
        .await;
}

fn write_config(dir: &tempfile::TempDir, yaml: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

#[test_log::test(tokio::test)]
async fn test_similarity_through_model_server() {
    let model_server = MockServer::start().await;
    mount_model_server(&model_server, "all-MiniLM-L6-v2").await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .and(body_json(json!({"inputs": ["x", "y"], "truncate": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[1.0, 0.0], [0.0, 1.0]])))
        .mount(&model_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .and(body_json(json!({"inputs": ["x"], "truncate": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[1.0, 0.0]])))
        .mount(&model_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(
        &dir,
        &format!(
            "service:\n  endpoint: similarity\nbackend:\n  kind: local_embedding\n  base_url: {}\n  model: all-MiniLM-L6-v2\n",
            model_server.uri()
        ),
    );
    let config = config::load_from(&config_path).await.unwrap();

    let backend = backend::connect(&config.backend, &test_policy(), config.request_timeout())
        .await
        .unwrap();
    let dispatcher = Dispatcher::new(config.service.endpoint, backend, test_policy());
    let server = TestServer::new(server::router(Arc::new(dispatcher))).unwrap();

    let response = server
        .post("/similarity")
        .json(&json!({"sentences1": ["x", "y"], "sentences2": ["x"]}))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({"scores": [[1.0], [0.0]], "status": "success"})
    );
}

#[test_log::test(tokio::test)]
async fn test_detect_threshold_from_config() {
    let model_server = MockServer::start().await;
    mount_model_server(&model_server, "roberta-base-openai-detector").await;
    let essay = "An uploaded essay sentence. ".repeat(500);
    Mock::given(method("POST"))
        .and(path("/predict"))
        .and(body_json(json!({"inputs": essay.clone(), "truncate": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"label": "LABEL_1", "score": 0.6},
            {"label": "LABEL_0", "score": 0.4}
        ])))
        .mount(&model_server)
        .await;

    let yaml = format!(
        "backend:\n  kind: local_classifier\n  base_url: {}\n  threshold: 0.7\n",
        model_server.uri()
    );
    let config = config::Config::from_yaml(&yaml).unwrap();
    assert_ok!(config.validate());
    let BackendConfig::LocalClassifier(classifier) = &config.backend else {
        panic!("expected a classifier backend");
    };
    assert_eq!(classifier.threshold, 0.7);

    let backend = backend::connect(&config.backend, &test_policy(), config.request_timeout())
        .await
        .unwrap();
    let dispatcher = Dispatcher::new(EndpointKind::Detect, backend, test_policy());
    let server = TestServer::new(server::router(Arc::new(dispatcher))).unwrap();

    let response = server.post("/detect").json(&json!({"text": essay})).await;

    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({"ai_generated": false, "ai_score": 0.6, "status": "success"})
    );
}

#[tokio::test]
async fn test_hosted_remote_failure_is_server_error() {
    let hosted = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/bert-base-uncased"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Model bert-base-uncased is currently loading"))
        .expect(3)
        .mount(&hosted)
        .await;

    let yaml = format!(
        "service:\n  endpoint: hosted_fill_mask\nbackend:\n  kind: hosted_inference\n  base_url: {}\n  model: bert-base-uncased\n",
        hosted.uri()
    );
    let config = config::Config::from_yaml(&yaml).unwrap();
    let backend = backend::connect(&config.backend, &test_policy(), config.request_timeout())
        .await
        .unwrap();
    let dispatcher = Dispatcher::new(config.service.endpoint, backend, test_policy());
    let server = TestServer::new(server::router(Arc::new(dispatcher))).unwrap();

    let response = server
        .post("/analyze")
        .json(&json!({"text": "The capital of France is [MASK]."}))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>(),
        json!({"error": "Model bert-base-uncased is currently loading", "status": "error"})
    );
}

#[tokio::test]
async fn test_model_server_timeout_hides_internal_details() {
    let model_server = MockServer::start().await;
    mount_model_server(&model_server, "roberta-base-openai-detector").await;
    Mock::given(method("POST"))
        .and(path("/predict"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"label": "LABEL_1", "score": 0.9}]))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(2)
        .mount(&model_server)
        .await;

    let config = config::Config::from_yaml(&format!(
        "backend:\n  kind: local_classifier\n  base_url: {}\n",
        model_server.uri()
    ))
    .unwrap();
    let policy = RetryPolicy::new(2, Duration::from_millis(10));
    let backend = backend::connect(&config.backend, &policy, Duration::from_millis(200))
        .await
        .unwrap();
    let dispatcher = Dispatcher::new(EndpointKind::Detect, backend, policy);
    let server = TestServer::new(server::router(Arc::new(dispatcher))).unwrap();

    let response = server.post("/detect").json(&json!({"text": "essay"})).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.text();
    assert!(!body.contains("http://"), "address leaked: {}", body);
    assert_eq!(
        serde_json::from_str::<Value>(&body).unwrap(),
        json!({"error": "Model server timed out", "status": "error"})
    );
}

#[tokio::test(start_paused = true)]
async fn test_fixed_delay_between_attempts() {
    for failures in 0..5u32 {
        let backend = StubBackend::returning(AnalysisResult::Reply("pong".to_string()))
            .with_failures(failures);
        let dispatcher = Dispatcher::new(
            EndpointKind::Chat,
            Arc::new(backend.clone()),
            RetryPolicy::default(),
        );

        let start = Instant::now();
        let outcome = dispatcher.dispatch(br#"{"message": "ping"}"#).await;
        let elapsed = start.elapsed();

        if failures < 3 {
            assert_eq!(assert_ok!(outcome), AnalysisResult::Reply("pong".to_string()));
            assert_eq!(backend.calls(), failures as usize + 1);
            assert_eq!(elapsed, Duration::from_secs(failures as u64));
        } else {
            let DispatchError::Exhausted(exhausted) = assert_err!(outcome) else {
                panic!("expected retry exhaustion");
            };
            assert_eq!(exhausted.attempts, 3);
            assert_eq!(backend.calls(), 3);
            assert_eq!(elapsed, Duration::from_secs(2));
        }
    }
}

#[tokio::test]
async fn test_missing_config_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = config::load_from(dir.path().join("absent.yaml")).await;
    assert!(matches!(result, Err(textgate::Error::Io(_))));
}
