use super::dispatcher::DispatchError;
use crate::backend::AnalysisResult;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ResultFields {
    Classification { ai_generated: bool, ai_score: f64 },
    Similarity { similarity_score: f64 },
    Scores { scores: Vec<f64> },
    Matrix { scores: Vec<Vec<f64>> },
    Native { result: serde_json::Value },
    Reply { reply: String },
}

#[derive(Debug, Serialize)]
pub struct SuccessEnvelope {
    #[serde(flatten)]
    pub fields: ResultFields,
    pub status: Status,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub status: Status,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub endpoint: String,
    pub backend: &'static str,
    pub started_at: DateTime<Utc>,
}

impl From<AnalysisResult> for SuccessEnvelope {
    fn from(result: AnalysisResult) -> Self {
        let fields = match result {
            AnalysisResult::Classification { score, label } => ResultFields::Classification {
                ai_generated: label,
                ai_score: score,
            },
            AnalysisResult::Score(similarity_score) => ResultFields::Similarity { similarity_score },
            AnalysisResult::Scores(scores) => ResultFields::Scores { scores },
            AnalysisResult::Matrix(scores) => ResultFields::Matrix { scores },
            AnalysisResult::Native(result) => ResultFields::Native { result },
            AnalysisResult::Reply(reply) => ResultFields::Reply { reply },
        };
        Self {
            fields,
            status: Status::Success,
        }
    }
}

impl IntoResponse for SuccessEnvelope {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

impl From<&DispatchError> for ErrorEnvelope {
    fn from(err: &DispatchError) -> Self {
        Self {
            error: err.client_message(),
            status: Status::Error,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorEnvelope::from(&self))).into_response()
    }
}
