use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// Success payload produced by a backend. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AnalysisResult {
    Classification { score: f64, label: bool },
    Score(f64),
    Scores(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
    Native(serde_json::Value),
    Reply(String),
}

/// Where a backend failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorOrigin {
    ModelLoad,
    ModelRuntime,
    RemoteCall,
    MalformedOutput,
}

impl fmt::Display for BackendErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ModelLoad => "model_load",
            Self::ModelRuntime => "model_runtime",
            Self::RemoteCall => "remote_call",
            Self::MalformedOutput => "malformed_output",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct BackendError {
    pub origin: BackendErrorOrigin,
    pub message: String,
}

impl BackendError {
    pub fn new(origin: BackendErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            origin,
            message: message.into(),
        }
    }

    pub fn model_load(message: impl Into<String>) -> Self {
        Self::new(BackendErrorOrigin::ModelLoad, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(BackendErrorOrigin::ModelRuntime, message)
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(BackendErrorOrigin::RemoteCall, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(BackendErrorOrigin::MalformedOutput, message)
    }
}

impl BackendError {
    /// Maps a transport fault to a stable message naming only `peer`.
    ///
    /// The underlying error carries the peer URL, so it goes to the logs
    /// and never into `message`.
    pub fn transport(peer: &str, err: &reqwest::Error) -> Self {
        warn!(peer, error = ?err, "Outbound call failed");
        if err.is_timeout() {
            Self::remote(format!("{} timed out", peer))
        } else if err.is_decode() {
            Self::malformed(format!("{} returned an invalid response", peer))
        } else {
            Self::remote(format!("{} unreachable", peer))
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport("Upstream service", &err)
    }
}

impl From<async_openai::error::OpenAIError> for BackendError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        use async_openai::error::OpenAIError;
        match err {
            OpenAIError::Reqwest(e) => Self::transport("Chat completion endpoint", &e),
            OpenAIError::ApiError(e) => Self::remote(e.message),
            OpenAIError::JSONDeserialize(e) => {
                warn!(error = %e, "Undecodable chat completion");
                Self::malformed("Chat completion endpoint returned an invalid response")
            }
            other => {
                warn!(error = %other, "Chat completion failed");
                Self::remote("Chat completion failed")
            }
        }
    }
}
