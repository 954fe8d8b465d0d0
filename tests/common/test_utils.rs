use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use textgate::{
    backend::InferenceBackend,
    request::EndpointKind,
    retry::RetryPolicy,
    server::{self, Dispatcher},
};
use tower::ServiceExt; // for `oneshot`

/// Retry policy with a short delay so failing tests stay fast
pub fn test_policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(10))
}

pub fn create_test_app(endpoint: EndpointKind, backend: Arc<dyn InferenceBackend>) -> Router {
    let dispatcher = Dispatcher::new(endpoint, backend, test_policy());
    server::router(Arc::new(dispatcher))
}

pub fn json_request(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

/// Sends `request` and returns the status with the decoded JSON body
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
