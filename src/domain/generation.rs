// ============================================================
// Layer 3: Generation Options
// ============================================================
// Greedy decoding by default. With `do_sample` the next token is
// drawn from the temperature-scaled softmax, optionally restricted
// to the `top_k` most likely tokens (0 = no restriction).

use serde::{Deserialize, Serialize};

use crate::domain::error::{ModelError, ModelResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub max_new_tokens: usize,
    /// Rows that emitted this id keep emitting it; generation stops once every row has
    pub eos_token_id:   Option<u32>,
    pub do_sample:      bool,
    pub temperature:    f64,
    pub top_k:          usize,
    /// Seed for sampling; entropy-seeded when absent
    pub seed:           Option<u64>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_new_tokens: 20,
            eos_token_id:   None,
            do_sample:      false,
            temperature:    1.0,
            top_k:          0,
            seed:           None,
        }
    }
}

impl GenerationOptions {
    pub fn validate(&self) -> ModelResult<()> {
        if self.do_sample && !(self.temperature > 0.0) {
            return Err(ModelError::InvalidOption(format!(
                "temperature must be positive when sampling, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}
