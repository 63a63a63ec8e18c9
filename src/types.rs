use serde::Serialize;

/// One review to classify. Identified only by its position in the input.
pub type InputItem = String;

/// Fully materialized chat prompt for a single review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRequest {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
}

impl Sentiment {
    pub const ALL: [Sentiment; 2] = [Sentiment::Positive, Sentiment::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
        }
    }

    pub fn from_literal(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationRecord {
    pub sentiment: Sentiment,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InferenceError,
    SyntaxFailure,
    SchemaFailure,
    Cancelled,
    WorkerAborted,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InferenceError => "inference_error",
            ErrorKind::SyntaxFailure => "syntax_failure",
            ErrorKind::SchemaFailure => "schema_failure",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::WorkerAborted => "worker_aborted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorDetail {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Per-item result, serialized either as the bare record or as `{"error": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Success(ClassificationRecord),
    Failure { error: ErrorDetail },
}

impl Outcome {
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Outcome::Failure {
            error: ErrorDetail::new(kind, message),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure { error } => Some(error.kind),
        }
    }
}
