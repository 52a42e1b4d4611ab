// ============================================================
// Layer 5: Autoregressive Generation
// ============================================================
// Each step runs the full prefix through the transformer, takes
// the logits of the last position and appends one token per row.
// No KV cache: the tiny backbones here do not need one.

use burn::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::error::{ModelError, ModelResult};
use crate::domain::generation::GenerationOptions;
use crate::ml::backbone::{check_token_ids, CausalLm};

impl<B: Backend> CausalLm<B> {
    /// input_ids: [batch, prompt_len] → [batch, prompt_len + generated]
    ///
    /// Stops after `max_new_tokens`, when every row has emitted the
    /// end-of-sequence token, or when the position table is full.
    pub fn generate(
        &self,
        input_ids: Tensor<B, 2, Int>,
        options:   &GenerationOptions,
    ) -> ModelResult<Tensor<B, 2, Int>> {
        options.validate()?;
        let lm_head = self.lm_head()?;
        let [batch_size, prompt_len] = input_ids.dims();
        if prompt_len == 0 {
            return Err(ModelError::InvalidOption("generate needs a non-empty prompt".to_string()));
        }
        let vocab_size = self.config().vocab_size;
        check_token_ids(&input_ids, vocab_size)?;

        let device      = input_ids.device();
        let d_model     = self.hidden_size();
        let n_positions = self.config().n_positions;
        let eos         = options.eos_token_id.or(self.config().eos_token_id);
        if let Some(eos) = eos.filter(|&eos| eos as usize >= vocab_size) {
            return Err(ModelError::InvalidOption(format!(
                "eos_token_id {eos} is outside the vocabulary (size {vocab_size})"
            )));
        }
        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };

        let mut ids      = input_ids;
        let mut finished = vec![false; batch_size];

        for _ in 0..options.max_new_tokens {
            let [_, seq_len] = ids.dims();
            if seq_len >= n_positions {
                tracing::warn!("Generation stopped at the position limit ({})", n_positions);
                break;
            }

            let hidden = self.transformer.forward(ids.clone());
            let last   = hidden
                .slice([0..batch_size, seq_len - 1..seq_len, 0..d_model])
                .reshape([batch_size, d_model]);
            let logits = lm_head.forward(last); // [batch, vocab_size]

            let mut next: Vec<u32> = if options.do_sample {
                let [_, vocab_size] = logits.dims();
                let flat: Vec<f32> = logits.into_data().iter::<f32>().collect();
                flat.chunks(vocab_size)
                    .map(|row| sample_next_token(row, options, &mut rng))
                    .collect()
            } else {
                logits.argmax(1).into_data().iter::<i64>().map(|id| id as u32).collect()
            };

            if let Some(eos) = eos {
                for (token, done) in next.iter_mut().zip(finished.iter_mut()) {
                    if *done {
                        *token = eos;
                    }
                    *done |= *token == eos;
                }
            }

            let next: Vec<i32> = next.into_iter().map(|id| id as i32).collect();
            let next = Tensor::<B, 1, Int>::from_ints(next.as_slice(), &device)
                .reshape([batch_size, 1]);
            ids = Tensor::cat(vec![ids, next], 1);

            if eos.is_some() && finished.iter().all(|&done| done) {
                break;
            }
        }

        Ok(ids)
    }
}

/// Draw a token id from one row of logits.
///
/// Logits are divided by the temperature; with `top_k > 0` only the
/// k largest survive. Sampling is over the softmax of what remains.
pub fn sample_next_token<R: Rng>(logits: &[f32], options: &GenerationOptions, rng: &mut R) -> u32 {
    let temperature = options.temperature as f32;
    let mut candidates: Vec<(usize, f32)> = logits
        .iter()
        .enumerate()
        .map(|(id, &logit)| (id, logit / temperature))
        .collect();

    if options.top_k > 0 && options.top_k < candidates.len() {
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        candidates.truncate(options.top_k);
    }

    let max = candidates.iter().map(|&(_, l)| l).fold(f32::NEG_INFINITY, f32::max);
    let weights: Vec<f32> = candidates.iter().map(|&(_, l)| (l - max).exp()).collect();
    let total: f32 = weights.iter().sum();

    let mut threshold = rng.gen::<f32>() * total;
    for (&(id, _), weight) in candidates.iter().zip(&weights) {
        if threshold < *weight {
            return id as u32;
        }
        threshold -= weight;
    }
    // Rounding can leave a sliver past the last weight.
    candidates.last().map_or(0, |&(id, _)| id as u32)
}
