use super::dispatcher::{DispatchError, Dispatcher};
use super::envelope::{HealthResponse, SuccessEnvelope};
use axum::{body::Bytes, extract::State, response::Json};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            started_at: Utc::now(),
        }
    }
}

/// The body is taken as raw bytes so malformed JSON maps to a 400 envelope.
pub async fn analyze(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<SuccessEnvelope, DispatchError> {
    let dispatcher = state.dispatcher;
    let span = info_span!(
        "analysis",
        request_id = %Uuid::new_v4(),
        endpoint = %dispatcher.endpoint()
    );

    async move {
        info!(bytes = body.len(), "Received analysis request");

        match dispatcher.dispatch(&body).await {
            Ok(result) => {
                info!("Request completed successfully");
                Ok(SuccessEnvelope::from(result))
            }
            Err(e @ DispatchError::Validation(_)) => {
                warn!("Rejected request: {}", e);
                Err(e)
            }
            Err(e) => {
                error!("Failed to process request: {}", e);
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        endpoint: state.dispatcher.endpoint().to_string(),
        backend: state.dispatcher.backend_name(),
        started_at: state.started_at,
    })
}
