use async_trait::async_trait;
use thiserror::Error;

use crate::types::RenderedRequest;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("request timed out")]
    Timeout,

    #[error("rate limited by provider: {0}")]
    RateLimited(String),

    #[error("provider rejected credentials ({status}): {body}")]
    Unauthorized { status: u16, body: String },

    #[error("provider returned status {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl InferenceError {
    /// Errors that will fail every remaining item the same way.
    pub fn is_fatal(&self) -> bool {
        matches!(self, InferenceError::Unauthorized { .. })
    }
}

/// Boundary to the language-model service: one rendered prompt in, raw reply text out.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn infer(&self, request: &RenderedRequest) -> Result<String, InferenceError>;
}
