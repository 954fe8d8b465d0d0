use super::model::{CrossEncoder, TextClassifier, TextEmbedder};
use super::{AnalysisResult, BackendError, InferenceBackend};
use crate::request::AnalysisRequest;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Label of class index 1, the "AI-generated" class of a binary detector.
pub const DEFAULT_POSITIVE_LABEL: &str = "LABEL_1";

pub const DEFAULT_THRESHOLD: f64 = 0.5;

fn unsupported(backend: &str, request: &AnalysisRequest) -> BackendError {
    BackendError::runtime(format!(
        "{} backend cannot serve {} requests",
        backend,
        request.shape()
    ))
}

/// Binary text classifier: `label = score > threshold`.
pub struct LocalClassifierBackend {
    classifier: Arc<dyn TextClassifier>,
    positive_label: String,
    threshold: f64,
}

impl LocalClassifierBackend {
    pub fn new(classifier: Arc<dyn TextClassifier>, positive_label: impl Into<String>, threshold: f64) -> Self {
        Self {
            classifier,
            positive_label: positive_label.into(),
            threshold,
        }
    }
}

#[async_trait]
impl InferenceBackend for LocalClassifierBackend {
    fn name(&self) -> &'static str {
        "local_classifier"
    }

    async fn invoke(&self, request: &AnalysisRequest) -> Result<AnalysisResult, BackendError> {
        let AnalysisRequest::Text { text } = request else {
            return Err(unsupported(self.name(), request));
        };

        let scores = self.classifier.class_scores(text).await?;
        let score = scores
            .iter()
            .find(|s| s.label == self.positive_label)
            .map(|s| s.score)
            .ok_or_else(|| {
                BackendError::malformed(format!(
                    "Classifier output has no '{}' label",
                    self.positive_label
                ))
            })?;

        if !(0.0..=1.0).contains(&score) {
            return Err(BackendError::malformed(format!(
                "Classifier score {} is not a probability",
                score
            )));
        }

        debug!(score, threshold = self.threshold, "Text classified");
        Ok(AnalysisResult::Classification {
            score,
            label: score > self.threshold,
        })
    }
}

/// Cosine similarity over sentence embeddings.
pub struct LocalEmbeddingBackend {
    embedder: Arc<dyn TextEmbedder>,
}

impl LocalEmbeddingBackend {
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self { embedder }
    }

    async fn embed_exact(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        let embeddings = self.embedder.embed(texts).await?;
        if embeddings.len() != texts.len() {
            return Err(BackendError::malformed(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }

    async fn one_to_many(&self, source: &str, targets: &[String]) -> Result<Vec<f64>, BackendError> {
        let mut texts = Vec::with_capacity(targets.len() + 1);
        texts.push(source.to_string());
        texts.extend_from_slice(targets);

        let embeddings = self.embed_exact(&texts).await?;
        let (source, targets) = embeddings
            .split_first()
            .ok_or_else(|| BackendError::malformed("Embedder returned no vectors"))?;
        targets.iter().map(|t| cosine_similarity(source, t)).collect()
    }
}

#[async_trait]
impl InferenceBackend for LocalEmbeddingBackend {
    fn name(&self) -> &'static str {
        "local_embedding"
    }

    async fn invoke(&self, request: &AnalysisRequest) -> Result<AnalysisResult, BackendError> {
        match request {
            AnalysisRequest::TextPair { text1, text2 } => {
                let scores = self.one_to_many(text1, std::slice::from_ref(text2)).await?;
                let score = scores
                    .first()
                    .copied()
                    .ok_or_else(|| BackendError::malformed("Embedder returned no vectors"))?;
                Ok(AnalysisResult::Score(score))
            }
            AnalysisRequest::QueryPassages { query, passages } => {
                Ok(AnalysisResult::Scores(self.one_to_many(query, passages).await?))
            }
            AnalysisRequest::SourceSentences {
                source_sentence,
                sentences,
            } => Ok(AnalysisResult::Scores(
                self.one_to_many(source_sentence, sentences).await?,
            )),
            AnalysisRequest::SentencePairs {
                sentences1,
                sentences2,
            } => {
                let rows = self.embed_exact(sentences1).await?;
                let columns = self.embed_exact(sentences2).await?;
                let matrix = rows
                    .iter()
                    .map(|row| {
                        columns
                            .iter()
                            .map(|column| cosine_similarity(row, column))
                            .collect::<Result<Vec<_>, _>>()
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(AnalysisResult::Matrix(matrix))
            }
            other => Err(unsupported(self.name(), other)),
        }
    }
}

/// Cross-encoder relevance scoring.
pub struct LocalRankingBackend {
    encoder: Arc<dyn CrossEncoder>,
}

impl LocalRankingBackend {
    pub fn new(encoder: Arc<dyn CrossEncoder>) -> Self {
        Self { encoder }
    }

    async fn score_exact(&self, query: &str, passages: &[String]) -> Result<Vec<f64>, BackendError> {
        let scores = self.encoder.score(query, passages).await?;
        if scores.len() != passages.len() {
            return Err(BackendError::malformed(format!(
                "Expected {} scores, got {}",
                passages.len(),
                scores.len()
            )));
        }
        Ok(scores)
    }
}

#[async_trait]
impl InferenceBackend for LocalRankingBackend {
    fn name(&self) -> &'static str {
        "local_ranking"
    }

    async fn invoke(&self, request: &AnalysisRequest) -> Result<AnalysisResult, BackendError> {
        match request {
            AnalysisRequest::QueryPassages { query, passages } => {
                Ok(AnalysisResult::Scores(self.score_exact(query, passages).await?))
            }
            AnalysisRequest::TextPair { text1, text2 } => {
                let scores = self.score_exact(text1, std::slice::from_ref(text2)).await?;
                Ok(AnalysisResult::Score(scores[0]))
            }
            AnalysisRequest::SentencePairs {
                sentences1,
                sentences2,
            } => {
                let mut matrix = Vec::with_capacity(sentences1.len());
                for sentence in sentences1 {
                    matrix.push(self.score_exact(sentence, sentences2).await?);
                }
                Ok(AnalysisResult::Matrix(matrix))
            }
            other => Err(unsupported(self.name(), other)),
        }
    }
}

/// Zero vectors have similarity 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, BackendError> {
    if a.len() != b.len() {
        return Err(BackendError::malformed(format!(
            "Vector dimension mismatch: {} != {}",
            a.len(),
            b.len()
        )));
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let a_norm = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let b_norm = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if a_norm == 0.0 || b_norm == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (a_norm * b_norm))
}
