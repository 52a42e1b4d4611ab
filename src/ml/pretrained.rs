// ============================================================
// Layer 5: Pretrained Sources
// ============================================================
// A model can be obtained two ways:
//
//   Identifier  - a checkpoint directory on disk, or failing that
//                 a built-in registry id (tiny random checkpoints)
//   Backbone    - an already-instantiated CausalLm
//
// `CausalLm::from_pretrained` is the backbone's native loader. It
// reads only the backbone files of a checkpoint directory, so a
// directory written by the value-head wrapper loads here too.

use std::path::{Path, PathBuf};

use burn::prelude::*;

use crate::domain::error::ModelResult;
use crate::infra::{checkpoint::CheckpointDir, registry};
use crate::ml::backbone::CausalLm;

pub enum PretrainedSource<B: Backend> {
    Identifier(String),
    Backbone(CausalLm<B>),
}

impl<B: Backend> From<&str> for PretrainedSource<B> {
    fn from(identifier: &str) -> Self {
        Self::Identifier(identifier.to_string())
    }
}

impl<B: Backend> From<String> for PretrainedSource<B> {
    fn from(identifier: String) -> Self {
        Self::Identifier(identifier)
    }
}

impl<B: Backend> From<&Path> for PretrainedSource<B> {
    fn from(path: &Path) -> Self {
        Self::Identifier(path.to_string_lossy().into_owned())
    }
}

impl<B: Backend> From<PathBuf> for PretrainedSource<B> {
    fn from(path: PathBuf) -> Self {
        Self::from(path.as_path())
    }
}

impl<B: Backend> From<CausalLm<B>> for PretrainedSource<B> {
    fn from(backbone: CausalLm<B>) -> Self {
        Self::Backbone(backbone)
    }
}

impl<B: Backend> CausalLm<B> {
    /// Directory first, registry second.
    pub fn from_pretrained(identifier: &str, device: &B::Device) -> ModelResult<Self> {
        let checkpoint = CheckpointDir::new(identifier);
        if checkpoint.exists() {
            tracing::info!("Loading backbone from '{}'", identifier);
            return checkpoint.load_backbone(device);
        }
        let config = registry::lookup(identifier)?;
        tracing::info!(
            "Initialising registered backbone '{}': {:?}, {} layers, hidden_size={}",
            identifier, config.architecture, config.num_layers, config.hidden_size
        );
        config.init(device)
    }

    pub fn save_pretrained(&self, dir: impl AsRef<Path>) -> ModelResult<()> {
        CheckpointDir::new(dir.as_ref()).save_backbone(self)
    }
}
