use crate::backend::{AnalysisResult, InferenceBackend};
use crate::request::{EndpointKind, ValidationError, validate_bytes};
use crate::retry::{self, RetryExhausted, RetryPolicy};
use axum::http::StatusCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Terminal outcome of a request that did not produce a result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Exhausted(#[from] RetryExhausted),
}

impl DispatchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Exhausted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message returned to the caller. Retry bookkeeping stays in the logs.
    pub fn client_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Exhausted(e) => e.last_error.message.clone(),
        }
    }
}

/// Validate, invoke under retry, return the result. One per process.
pub struct Dispatcher {
    endpoint: EndpointKind,
    backend: Arc<dyn InferenceBackend>,
    policy: RetryPolicy,
}

impl Dispatcher {
    pub fn new(endpoint: EndpointKind, backend: Arc<dyn InferenceBackend>, policy: RetryPolicy) -> Self {
        Self {
            endpoint,
            backend,
            policy,
        }
    }

    pub fn endpoint(&self) -> EndpointKind {
        self.endpoint
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn dispatch(&self, body: &[u8]) -> Result<AnalysisResult, DispatchError> {
        let request = validate_bytes(self.endpoint, body)?;
        let request = &request;
        let backend = &self.backend;

        let result = retry::execute(&self.policy, move |attempt| {
            debug!(attempt, backend = backend.name(), "Invoking backend");
            backend.invoke(request)
        })
        .await?;

        Ok(result)
    }
}
