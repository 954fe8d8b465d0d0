//! HTTP client for a remote detection service.
//!
//! Calls `POST {base_url}/detect` under a [`RetryPolicy`] and only accepts a
//! `200` response whose envelope reports `"status": "success"`.

use crate::backend::BackendError;
use crate::retry::{self, RetryExhausted, RetryPolicy};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub ai_generated: bool,
    pub ai_score: f64,
}

#[derive(Debug, Deserialize)]
struct DetectEnvelope {
    #[serde(default)]
    status: String,
    #[serde(flatten)]
    detection: Option<Detection>,
}

pub struct DetectorClient {
    http: Client,
    url: String,
    policy: RetryPolicy,
}

impl DetectorClient {
    pub fn new(base_url: &str, policy: RetryPolicy, timeout: Duration) -> crate::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: format!("{}/detect", base_url.trim_end_matches('/')),
            policy,
        })
    }

    pub async fn check(&self, text: &str) -> Result<Detection, RetryExhausted> {
        retry::execute(&self.policy, move |attempt| {
            info!(
                "Attempting to connect to AI detector (attempt {}/{})",
                attempt,
                self.policy.max_attempts()
            );
            self.check_once(text)
        })
        .await
    }

    async fn check_once(&self, text: &str) -> Result<Detection, BackendError> {
        let response = self
            .http
            .post(&self.url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| BackendError::remote(format!("Failed to connect to AI detector: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::remote(e.to_string()))?;

        if status != StatusCode::OK {
            return Err(BackendError::remote(format!(
                "Invalid response code from AI detector: {}",
                status
            )));
        }

        let envelope: DetectEnvelope = serde_json::from_str(&body).map_err(|_| {
            BackendError::malformed(format!("Invalid response from AI detector: {}", body))
        })?;

        match envelope {
            DetectEnvelope {
                status,
                detection: Some(detection),
            } if status == "success" => Ok(detection),
            _ => Err(BackendError::malformed(format!(
                "Invalid response from AI detector: {}",
                body
            ))),
        }
    }
}
