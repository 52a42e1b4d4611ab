// ============================================================
// Layer 2: InitUseCase
// ============================================================
//   Step 1: Resolve the backbone           (Layer 6 - registry / checkpoint)
//   Step 2: Attach a value head            (Layer 5 - ml)
//   Step 3: Save backbone and value head   (Layer 6 - checkpoint)

use anyhow::{Context, Result};
use burn::prelude::*;

use crate::domain::value_head::ValueHeadInit;
use crate::ml::params::NamedParameters;
use crate::ml::value_head::{ValueHeadConfig, ValueHeadModel};

#[derive(Debug, Clone)]
pub struct InitConfig {
    /// Registry id or checkpoint directory
    pub model:                String,
    pub output:               String,
    pub summary_dropout_prob: Option<f64>,
    pub v_head_init:          Option<ValueHeadInit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitReport {
    pub output:         String,
    pub dropout_prob:   f64,
    pub num_parameters: usize,
}

pub struct InitUseCase {
    config: InitConfig,
}

impl InitUseCase {
    pub fn new(config: InitConfig) -> Self {
        Self { config }
    }

    pub fn execute<B: Backend>(&self, device: &B::Device) -> Result<InitReport> {
        let cfg = &self.config;

        // ── Step 1 + 2: Load backbone and attach the value head ──────────────
        let options = ValueHeadConfig::new()
            .with_summary_dropout_prob(cfg.summary_dropout_prob)
            .with_v_head_init_strategy(cfg.v_head_init);
        let model = ValueHeadModel::<B>::from_pretrained(cfg.model.as_str(), &options, device)
            .with_context(|| format!("Failed to build a value-head model from '{}'", cfg.model))?;

        // ── Step 3: Save ─────────────────────────────────────────────────────
        model
            .save_pretrained(&cfg.output)
            .with_context(|| format!("Failed to save model to '{}'", cfg.output))?;

        Ok(InitReport {
            output:         cfg.output.clone(),
            dropout_prob:   model.dropout_prob(),
            num_parameters: model.num_parameters(),
        })
    }
}
