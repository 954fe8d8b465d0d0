mod dispatcher;
mod envelope;
pub mod handlers;

pub use dispatcher::{DispatchError, Dispatcher};
pub use envelope::{ErrorEnvelope, HealthResponse, ResultFields, Status, SuccessEnvelope};

use crate::{backend, config::Config, Result};
use axum::{
    routing::{get, post},
    Router,
};
use handlers::AppState;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Routes the dispatcher's endpoint plus `GET /health`.
pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    let path = dispatcher.endpoint().path();
    Router::new()
        .route(path, post(handlers::analyze))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(dispatcher))
}

pub async fn run(config: Config) -> Result<()> {
    let policy = config.retry_policy();

    // Load the model or client once; failure here stops the process
    let backend = backend::connect(&config.backend, &policy, config.request_timeout()).await?;

    let dispatcher = Arc::new(Dispatcher::new(config.service.endpoint, backend, policy));
    info!(
        endpoint = %dispatcher.endpoint(),
        backend = dispatcher.backend_name(),
        max_attempts = policy.max_attempts(),
        delay_ms = policy.delay().as_millis() as u64,
        "Dispatcher ready"
    );

    let app = router(dispatcher.clone());

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Serving POST {} on {}", dispatcher.endpoint().path(), addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
