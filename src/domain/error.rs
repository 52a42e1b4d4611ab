// ============================================================
// Layer 3: Error Taxonomy
// ============================================================
// Construction-time structural errors (a backbone without an LM
// head, a model whose blocks cannot be found) are reported with
// their own variants. Everything coming from the machinery below
// (file system, JSON, checkpoint recorder) passes through unchanged.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    /// The backbone was not built for causal generation
    #[error("invalid backbone: {reason}")]
    InvalidBackbone {
        /// What the backbone is missing
        reason: String,
    },

    /// No ordered sequence of transformer blocks could be located
    #[error("no transformer layers found for pattern '{pattern}'")]
    LayerNotFound {
        /// The pattern (or list of patterns) that was tried
        pattern: String,
    },

    /// Identifier is neither a checkpoint directory nor a registered model
    #[error("model '{0}' is neither a checkpoint directory nor a registered model")]
    ModelNotFound(String),

    /// A construction or call option is out of range
    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("config (de)serialisation failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Checkpoint recorder failure, carried as text to keep Burn out of this layer
    #[error("checkpoint recorder error: {0}")]
    Recorder(String),
}

impl ModelError {
    pub fn invalid_backbone(reason: impl Into<String>) -> Self {
        Self::InvalidBackbone { reason: reason.into() }
    }
}
