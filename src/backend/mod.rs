//! Inference backends behind a single `invoke` capability.
//!
//! A process builds exactly one backend at startup from its configuration
//! and shares it read-only across all requests. Variants:
//!
//! - [`LocalClassifierBackend`]: binary classification with a configured threshold
//! - [`LocalEmbeddingBackend`]: cosine similarity over sentence embeddings
//! - [`LocalRankingBackend`]: cross-encoder relevance scores
//! - [`HostedInferenceBackend`]: a hosted model endpoint returning native JSON
//! - [`ChatCompletionBackend`]: chat completion returning free-form text

mod chat;
mod hosted;
mod local;
pub mod model;
mod model_server;
mod types;

pub use chat::{ChatCompletionBackend, DEFAULT_CHAT_URL};
pub use hosted::{DEFAULT_HOSTED_URL, HostedInferenceBackend};
pub use local::{
    DEFAULT_POSITIVE_LABEL, DEFAULT_THRESHOLD, LocalClassifierBackend, LocalEmbeddingBackend,
    LocalRankingBackend, cosine_similarity,
};
pub use model_server::ModelServer;
pub use types::*;

use crate::config::BackendConfig;
use crate::request::{AnalysisRequest, EndpointKind};
use crate::retry::{self, RetryPolicy};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[async_trait]
pub trait InferenceBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn invoke(&self, request: &AnalysisRequest) -> std::result::Result<AnalysisResult, BackendError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    LocalClassifier,
    LocalEmbedding,
    LocalRanking,
    HostedInference,
    ChatCompletion,
}

impl BackendKind {
    /// Whether this backend can produce results for `endpoint`.
    pub fn supports(&self, endpoint: EndpointKind) -> bool {
        use EndpointKind::*;
        match self {
            Self::LocalClassifier => matches!(endpoint, Detect | Classify),
            Self::LocalEmbedding | Self::LocalRanking => {
                matches!(endpoint, PairwiseSimilarity | Rank | Similarity)
            }
            Self::HostedInference => matches!(endpoint, HostedSimilarity | HostedFillMask),
            Self::ChatCompletion => matches!(endpoint, Chat),
        }
    }
}

/// Builds the configured backend, retrying model/client loading under
/// `policy`. A final failure is fatal to startup.
pub async fn connect(
    config: &BackendConfig,
    policy: &RetryPolicy,
    timeout: Duration,
) -> Result<Arc<dyn InferenceBackend>> {
    let backend: Arc<dyn InferenceBackend> = match config {
        BackendConfig::LocalClassifier(c) => {
            let model = load_model_server(&c.base_url, &c.model, policy, timeout).await?;
            Arc::new(LocalClassifierBackend::new(
                model,
                c.positive_label.clone(),
                c.threshold,
            ))
        }
        BackendConfig::LocalEmbedding(c) => {
            let model = load_model_server(&c.base_url, &c.model, policy, timeout).await?;
            Arc::new(LocalEmbeddingBackend::new(model))
        }
        BackendConfig::LocalRanking(c) => {
            let model = load_model_server(&c.base_url, &c.model, policy, timeout).await?;
            Arc::new(LocalRankingBackend::new(model))
        }
        BackendConfig::HostedInference(c) => {
            let backend = retry::execute(policy, move |_| async move {
                HostedInferenceBackend::new(&c.base_url, &c.model, c.api_token.clone(), timeout)
            })
            .await?;
            info!(url = %backend.url(), "Hosted inference client ready");
            Arc::new(backend)
        }
        BackendConfig::ChatCompletion(c) => {
            let backend = retry::execute(policy, move |_| async move {
                ChatCompletionBackend::new(
                    &c.base_url,
                    &c.model,
                    c.api_token.clone(),
                    c.system_prompt.clone(),
                    timeout,
                )
            })
            .await?;
            info!(model = %c.model, "Chat completion client ready");
            Arc::new(backend)
        }
    };

    Ok(backend)
}

async fn load_model_server(
    base_url: &str,
    model: &str,
    policy: &RetryPolicy,
    timeout: Duration,
) -> Result<Arc<ModelServer>> {
    let server = retry::execute(policy, move |attempt| {
        info!(
            "Attempting to load model (attempt {}/{})...",
            attempt,
            policy.max_attempts()
        );
        ModelServer::connect(base_url, model, timeout)
    })
    .await?;
    Ok(Arc::new(server))
}
