//! Client for a co-located model server speaking the
//! text-embeddings-inference wire format.

use super::model::{CrossEncoder, LabelScore, TextClassifier, TextEmbedder};
use super::BackendError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const PEER: &str = "Model server";

#[derive(Debug, Deserialize)]
struct InfoResponse {
    model_id: String,
}

// Every request sets `truncate`: the server rejects over-length inputs otherwise.
#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    inputs: &'a str,
    truncate: bool,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
    truncate: bool,
}

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    texts: &'a [String],
    raw_scores: bool,
    truncate: bool,
}

#[derive(Debug, Deserialize)]
struct RerankHit {
    index: usize,
    score: f64,
}

pub struct ModelServer {
    client: Client,
    base_url: String,
    model_id: String,
}

impl ModelServer {
    /// Probes `GET /info` and returns a handle to the loaded model.
    ///
    /// Any failure here is a model-load failure.
    pub async fn connect(base_url: &str, model: &str, timeout: Duration) -> Result<Self, BackendError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::model_load(format!("Failed to create HTTP client: {}", e)))?;

        let response = client
            .get(format!("{}/info", base_url))
            .send()
            .await
            .map_err(|e| BackendError::model_load(format!("Model server unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::model_load(format!(
                "Model server returned {}: {}",
                status, body
            )));
        }

        let info: InfoResponse = response
            .json()
            .await
            .map_err(|e| BackendError::model_load(format!("Invalid model info: {}", e)))?;

        if !model.is_empty() && info.model_id != model {
            warn!(
                expected = model,
                served = %info.model_id,
                "Model server serves a different model than configured"
            );
        }

        info!(url = %base_url, model = %info.model_id, "Model loaded");

        Ok(Self {
            client,
            base_url,
            model_id: info.model_id,
        })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BackendError> {
        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::transport(PEER, &e))?;

        let parsed = decode(response).await?;
        debug!(
            path,
            duration_ms = start.elapsed().as_millis() as u64,
            "Model server call complete"
        );
        Ok(parsed)
    }
}

/// Status and body details are logged; callers only see stable messages.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(%status, body = %body, "Model server rejected request");
        return Err(BackendError::remote(format!("{} returned {}", PEER, status)));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| BackendError::transport(PEER, &e))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        warn!(error = %e, "Undecodable model output");
        BackendError::malformed("Model returned an invalid response")
    })
}

#[async_trait]
impl TextClassifier for ModelServer {
    async fn class_scores(&self, text: &str) -> Result<Vec<LabelScore>, BackendError> {
        self.post(
            "/predict",
            &PredictRequest {
                inputs: text,
                truncate: true,
            },
        )
        .await
    }
}

#[async_trait]
impl TextEmbedder for ModelServer {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        self.post(
            "/embed",
            &EmbedRequest {
                inputs: texts,
                truncate: true,
            },
        )
        .await
    }
}

#[async_trait]
impl CrossEncoder for ModelServer {
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f64>, BackendError> {
        let hits: Vec<RerankHit> = self
            .post(
                "/rerank",
                &RerankRequest {
                    query,
                    texts: passages,
                    raw_scores: false,
                    truncate: true,
                },
            )
            .await?;

        // The server sorts hits by score; restore passage order
        let mut scores = vec![None; passages.len()];
        for hit in hits {
            let slot = scores.get_mut(hit.index).ok_or_else(|| {
                BackendError::malformed(format!("Rerank index {} out of range", hit.index))
            })?;
            *slot = Some(hit.score);
        }
        scores
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| BackendError::malformed("Rerank response is missing passages"))
    }
}
