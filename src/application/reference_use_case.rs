// ============================================================
// Layer 2: ReferenceUseCase
// ============================================================
//   Step 1: Load the policy model                  (Layer 5 / 6)
//   Step 2: Create the reference model             (Layer 5 - reference)
//   Step 3: Optionally save the reference          (Layer 6 - checkpoint)
//
// Sharing is a property of two models in memory; a saved reference
// is an ordinary checkpoint and loads back as an independent model.

use anyhow::{Context, Result};
use burn::prelude::*;

use crate::ml::params::NamedParameters;
use crate::ml::reference::create_reference_model;
use crate::ml::value_head::{ValueHeadConfig, ValueHeadModel};

#[derive(Debug, Clone)]
pub struct ReferenceConfig {
    pub model:             String,
    pub num_shared_layers: usize,
    pub pattern:           Option<String>,
    pub output:            Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceReport {
    pub shared_layers:      usize,
    pub total_layers:       Option<usize>,
    pub pattern:            Option<String>,
    pub shared_parameters:  Vec<String>,
    /// Parameters of the policy that still receive gradients
    pub trainable_in_model: usize,
    pub reference_frozen:   bool,
}

pub struct ReferenceUseCase {
    config: ReferenceConfig,
}

impl ReferenceUseCase {
    pub fn new(config: ReferenceConfig) -> Self {
        Self { config }
    }

    pub fn execute<B: Backend>(&self, device: &B::Device) -> Result<ReferenceReport> {
        let cfg = &self.config;

        // ── Step 1: Load ─────────────────────────────────────────────────────
        let mut model =
            ValueHeadModel::<B>::from_pretrained(cfg.model.as_str(), &ValueHeadConfig::new(), device)
                .with_context(|| format!("Failed to load '{}'", cfg.model))?;

        // ── Step 2: Reference ────────────────────────────────────────────────
        let reference = create_reference_model(&mut model, cfg.num_shared_layers, cfg.pattern.as_deref())
            .context("Failed to create the reference model")?;

        // ── Step 3: Save ─────────────────────────────────────────────────────
        if let Some(output) = &cfg.output {
            reference
                .model
                .save_pretrained(output)
                .with_context(|| format!("Failed to save reference model to '{}'", output))?;
        }

        let trainable_in_model = model
            .named_parameters()
            .iter()
            .filter(|p| p.requires_grad)
            .map(|p| p.num_elements())
            .sum();

        Ok(ReferenceReport {
            shared_layers:     reference.shared_layers,
            total_layers:      reference.total_layers,
            reference_frozen:  reference.model.is_frozen(),
            pattern:           reference.pattern,
            shared_parameters: reference.shared_parameters,
            trainable_in_model,
        })
    }
}
