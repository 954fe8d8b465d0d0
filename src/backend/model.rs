//! Capabilities of an in-process model. The model math is opaque here; the
//! local backends only shape what these traits return.

use super::BackendError;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Probability for every class label of a single text.
    async fn class_scores(&self, text: &str) -> Result<Vec<LabelScore>, BackendError>;
}

#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// One embedding per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError>;
}

#[async_trait]
pub trait CrossEncoder: Send + Sync {
    /// Relevance of each passage to `query`, in passage order.
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f64>, BackendError>;
}
