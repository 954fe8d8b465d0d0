use super::{AnalysisResult, BackendError, InferenceBackend};
use crate::request::AnalysisRequest;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_HOSTED_URL: &str = "https://api-inference.huggingface.co";

const PEER: &str = "Hosted inference endpoint";

/// A hosted inference endpoint addressed as `{base_url}/models/{model}`.
pub struct HostedInferenceBackend {
    client: Client,
    url: String,
    api_token: Option<String>,
}

impl HostedInferenceBackend {
    pub fn new(
        base_url: &str,
        model: &str,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::model_load(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: format!("{}/models/{}", base_url.trim_end_matches('/'), model),
            api_token: api_token.filter(|t| !t.is_empty()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn inputs(&self, request: &AnalysisRequest) -> Result<Value, BackendError> {
        match request {
            AnalysisRequest::Text { text } => Ok(json!(text)),
            AnalysisRequest::SourceSentences { .. } => Ok(json!(request)),
            other => Err(BackendError::runtime(format!(
                "hosted_inference backend cannot serve {} requests",
                other.shape()
            ))),
        }
    }
}

#[async_trait]
impl InferenceBackend for HostedInferenceBackend {
    fn name(&self) -> &'static str {
        "hosted_inference"
    }

    async fn invoke(&self, request: &AnalysisRequest) -> Result<AnalysisResult, BackendError> {
        let payload = json!({ "inputs": self.inputs(request)? });

        let mut call = self.client.post(&self.url).json(&payload);
        if let Some(token) = &self.api_token {
            call = call.bearer_auth(token);
        }

        let response = call
            .send()
            .await
            .map_err(|e| BackendError::transport(PEER, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::transport(PEER, &e))?;

        if !status.is_success() {
            return Err(BackendError::remote(body));
        }

        debug!(status = %status, bytes = body.len(), "Hosted inference call complete");

        serde_json::from_str(&body)
            .map(AnalysisResult::Native)
            .map_err(|e| {
                warn!(error = %e, "Undecodable hosted inference output");
                BackendError::malformed(format!("{} returned an invalid response", PEER))
            })
    }
}
