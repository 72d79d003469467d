use thiserror::Error;

/// Errors surfaced by the IR pipeline. Per-op decode problems are not errors;
/// they come back as warning diagnostics next to the ops that did decode.
#[derive(Debug, Error)]
pub enum IrError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("input outside the IR contract: {0}")]
    Contract(String),

    #[error("document rejected with {count} validation error(s); first: {first}")]
    Rejected { count: usize, first: String },

    #[error("builder failed: {0}")]
    Builder(String),
}

impl IrError {
    pub fn contract(message: impl Into<String>) -> Self {
        Self::Contract(message.into())
    }
}
