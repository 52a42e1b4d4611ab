// ============================================================
// Layer 3: Value-Head Options
// ============================================================
// The value head's dropout probability can come from three places.
// Precedence, highest first:
//
//   1. an explicit construction option (`summary_dropout_prob`)
//   2. the backbone configuration (`summary_dropout_prob`)
//   3. DEFAULT_SUMMARY_DROPOUT_PROB

use serde::{Deserialize, Serialize};

use crate::domain::error::{ModelError, ModelResult};

pub const DEFAULT_SUMMARY_DROPOUT_PROB: f64 = 0.1;

/// How the value head's summary layer is initialised.
/// Absent means the framework's default random initialisation,
/// which always leaves a non-zero bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueHeadInit {
    /// weight ~ N(0, initializer_range), bias = 0
    Normal,
}

/// Pick the dropout probability and check it is a probability.
pub fn resolve_dropout_prob(
    explicit: Option<f64>,
    backbone: Option<f64>,
) -> ModelResult<f64> {
    let prob = explicit.or(backbone).unwrap_or(DEFAULT_SUMMARY_DROPOUT_PROB);
    if !(0.0..=1.0).contains(&prob) {
        return Err(ModelError::InvalidOption(format!(
            "summary_dropout_prob must be within [0, 1], got {prob}"
        )));
    }
    Ok(prob)
}
