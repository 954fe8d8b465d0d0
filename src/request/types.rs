use serde::{Deserialize, Serialize};
use std::fmt;

/// The logical operation a process exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    Detect,
    Classify,
    HostedSimilarity,
    HostedFillMask,
    PairwiseSimilarity,
    Rank,
    Similarity,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Text,
    }
}

const fn text_list(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::TextList,
    }
}

const TEXT_FIELDS: &[FieldSpec] = &[text("text")];
const SOURCE_SENTENCE_FIELDS: &[FieldSpec] = &[text("source_sentence"), text_list("sentences")];
const TEXT_PAIR_FIELDS: &[FieldSpec] = &[text("text1"), text("text2")];
const QUERY_PASSAGE_FIELDS: &[FieldSpec] = &[text("query"), text_list("passages")];
const SENTENCE_PAIR_FIELDS: &[FieldSpec] = &[text_list("sentences1"), text_list("sentences2")];
const MESSAGE_FIELDS: &[FieldSpec] = &[text("message")];

impl EndpointKind {
    pub const ALL: [EndpointKind; 8] = [
        Self::Detect,
        Self::Classify,
        Self::HostedSimilarity,
        Self::HostedFillMask,
        Self::PairwiseSimilarity,
        Self::Rank,
        Self::Similarity,
        Self::Chat,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Self::Detect => "/detect",
            Self::Classify
            | Self::HostedSimilarity
            | Self::HostedFillMask
            | Self::PairwiseSimilarity => "/analyze",
            Self::Rank => "/rank",
            Self::Similarity => "/similarity",
            Self::Chat => "/chat",
        }
    }

    /// Required fields in the order they are checked.
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Self::Detect | Self::Classify | Self::HostedFillMask => TEXT_FIELDS,
            Self::HostedSimilarity => SOURCE_SENTENCE_FIELDS,
            Self::PairwiseSimilarity => TEXT_PAIR_FIELDS,
            Self::Rank => QUERY_PASSAGE_FIELDS,
            Self::Similarity => SENTENCE_PAIR_FIELDS,
            Self::Chat => MESSAGE_FIELDS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detect => "detect",
            Self::Classify => "classify",
            Self::HostedSimilarity => "hosted_similarity",
            Self::HostedFillMask => "hosted_fill_mask",
            Self::PairwiseSimilarity => "pairwise_similarity",
            Self::Rank => "rank",
            Self::Similarity => "similarity",
            Self::Chat => "chat",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request that passed validation for its endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisRequest {
    Text {
        text: String,
    },
    TextPair {
        text1: String,
        text2: String,
    },
    SourceSentences {
        source_sentence: String,
        sentences: Vec<String>,
    },
    QueryPassages {
        query: String,
        passages: Vec<String>,
    },
    SentencePairs {
        sentences1: Vec<String>,
        sentences2: Vec<String>,
    },
    Message {
        message: String,
    },
}

impl AnalysisRequest {
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::TextPair { .. } => "text pair",
            Self::SourceSentences { .. } => "source sentence",
            Self::QueryPassages { .. } => "query/passages",
            Self::SentencePairs { .. } => "sentence pairs",
            Self::Message { .. } => "chat message",
        }
    }
}
