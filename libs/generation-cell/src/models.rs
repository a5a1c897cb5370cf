// libs/generation-cell/src/models.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A single structured call to the text-generation backend.
///
/// `context` carries the task input as JSON; the backend is expected to answer
/// with a JSON object matching whatever shape `instructions` describes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub task: String,
    pub instructions: String,
    pub context: Value,
}

impl GenerationRequest {
    pub fn new(task: impl Into<String>, instructions: impl Into<String>, context: Value) -> Self {
        Self {
            task: task.into(),
            instructions: instructions.into(),
            context,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerationResponse {
    pub output: Option<Value>,
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Text generation service is not configured")]
    NotConfigured,

    #[error("Text generation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Text generation service error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Text generation transport error: {0}")]
    Transport(String),

    #[error("Text generation returned invalid output: {0}")]
    InvalidOutput(String),
}
