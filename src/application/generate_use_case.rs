// ============================================================
// Layer 2: GenerateUseCase
// ============================================================
//   Step 1: Load the value-head model              (Layer 5 / 6)
//   Step 2: Decode new tokens from the prompt      (Layer 5 - generation)
//   Step 3: Score the full sequence with the value head

use anyhow::{bail, Context, Result};
use burn::prelude::*;

use crate::domain::generation::GenerationOptions;
use crate::ml::value_head::{ValueHeadConfig, ValueHeadModel};

#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub model:     String,
    pub input_ids: Vec<u32>,
    pub options:   GenerationOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    /// Prompt followed by the generated tokens
    pub tokens:     Vec<i64>,
    pub prompt_len: usize,
    /// One value estimate per token of `tokens`
    pub values:     Vec<f32>,
}

impl GenerationReport {
    pub fn generated(&self) -> &[i64] {
        &self.tokens[self.prompt_len..]
    }
}

pub struct GenerateUseCase {
    config: GenerateConfig,
}

impl GenerateUseCase {
    pub fn new(config: GenerateConfig) -> Self {
        Self { config }
    }

    pub fn execute<B: Backend>(&self, device: &B::Device) -> Result<GenerationReport> {
        let cfg = &self.config;
        if cfg.input_ids.is_empty() {
            bail!("--input-ids must contain at least one token id");
        }

        // ── Step 1: Load ─────────────────────────────────────────────────────
        let model = ValueHeadModel::<B>::from_pretrained(cfg.model.as_str(), &ValueHeadConfig::new(), device)
            .with_context(|| format!("Failed to load '{}'", cfg.model))?;

        // ── Step 2: Generate ─────────────────────────────────────────────────
        let prompt: Vec<i32> = cfg.input_ids.iter().map(|&id| id as i32).collect();
        let prompt_len = prompt.len();
        let input = Tensor::<B, 1, Int>::from_ints(prompt.as_slice(), device).reshape([1, prompt_len]);
        let generated = model
            .generate(input, &cfg.options)
            .context("Generation failed")?;

        // ── Step 3: Value estimates ──────────────────────────────────────────
        let output = model
            .forward(generated.clone(), None)
            .context("Scoring the generated sequence failed")?;
        let tokens: Vec<i64> = generated.into_data().iter::<i64>().collect();
        let values: Vec<f32> = output.value.into_data().iter::<f32>().collect();

        tracing::info!("Generated {} tokens", tokens.len() - prompt_len);
        Ok(GenerationReport { tokens, prompt_len, values })
    }
}
