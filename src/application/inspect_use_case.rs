// ============================================================
// Layer 2: InspectUseCase
// ============================================================
// Lists the named parameters of a model. Value-head models are
// tried first; a backbone without an LM head cannot be wrapped,
// so it is listed as a bare backbone instead.

use anyhow::{Context, Result};
use burn::prelude::*;

use crate::domain::error::ModelError;
use crate::ml::backbone::CausalLm;
use crate::ml::params::{NamedParameter, NamedParameters};
use crate::ml::value_head::{ValueHeadConfig, ValueHeadModel};

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRow {
    pub name:          String,
    pub shape:         Vec<usize>,
    pub requires_grad: bool,
}

impl From<NamedParameter> for ParameterRow {
    fn from(param: NamedParameter) -> Self {
        Self { name: param.name, shape: param.shape, requires_grad: param.requires_grad }
    }
}

pub struct InspectUseCase {
    model:  String,
    filter: Option<String>,
}

impl InspectUseCase {
    pub fn new(model: String, filter: Option<String>) -> Self {
        Self { model, filter }
    }

    pub fn execute<B: Backend>(&self, device: &B::Device) -> Result<Vec<ParameterRow>> {
        let params = match ValueHeadModel::<B>::from_pretrained(
            self.model.as_str(),
            &ValueHeadConfig::new(),
            device,
        ) {
            Ok(model) => model.named_parameters(),
            Err(ModelError::InvalidBackbone { reason }) => {
                tracing::info!("Listing '{}' as a bare backbone: {}", self.model, reason);
                CausalLm::<B>::from_pretrained(&self.model, device)
                    .with_context(|| format!("Failed to load '{}'", self.model))?
                    .named_parameters()
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to load '{}'", self.model));
            }
        };

        Ok(params
            .into_iter()
            .filter(|p| self.filter.as_deref().map_or(true, |f| p.name.contains(f)))
            .map(ParameterRow::from)
            .collect())
    }
}
