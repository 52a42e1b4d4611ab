// ============================================================
// Layer 6: Pretrained Registry
// ============================================================
// Built-in tiny checkpoints, addressable by id wherever a
// checkpoint directory is accepted. Every id carries its own
// weight seed, so looking an id up twice yields the same weights.
//
//   tiny-random-gpt2        GPT-2 layout with LM head
//   tiny-random-gpt2-model  GPT-2 layout, bare transformer
//   tiny-random-gpt-neox    GPT-NeoX layout with LM head
//   tiny-random-opt         OPT layout with LM head

use crate::domain::error::{ModelError, ModelResult};
use crate::domain::naming::Architecture;
use crate::ml::backbone::BackboneConfig;

pub const TINY_RANDOM_GPT2: &str = "tiny-random-gpt2";
pub const TINY_RANDOM_GPT2_MODEL: &str = "tiny-random-gpt2-model";
pub const TINY_RANDOM_GPT_NEOX: &str = "tiny-random-gpt-neox";
pub const TINY_RANDOM_OPT: &str = "tiny-random-opt";

/// Registered ids that carry a language-modelling head.
pub const CAUSAL_LM_MODELS: &[&str] = &[TINY_RANDOM_GPT2, TINY_RANDOM_GPT_NEOX, TINY_RANDOM_OPT];

pub fn lookup(id: &str) -> ModelResult<BackboneConfig> {
    // The bare GPT-2 shares the seed of its causal variant, so both
    // ids hold the same transformer weights.
    match id {
        TINY_RANDOM_GPT2 => Ok(tiny(Architecture::Gpt2, 0x6770_7432)),
        TINY_RANDOM_GPT2_MODEL => Ok(tiny(Architecture::Gpt2, 0x6770_7432).with_has_lm_head(false)),
        TINY_RANDOM_GPT_NEOX => Ok(tiny(Architecture::GptNeoX, 0x6e65_6f78)),
        TINY_RANDOM_OPT => Ok(tiny(Architecture::Opt, 0x006f_7074)),
        _ => Err(ModelError::ModelNotFound(id.to_string())),
    }
}

fn tiny(architecture: Architecture, seed: u64) -> BackboneConfig {
    BackboneConfig::new(architecture, 1000, 128, 32, 4, 5, 37).with_seed(Some(seed))
}
