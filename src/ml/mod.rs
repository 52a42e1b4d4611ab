// ============================================================
// Layer 5: ML / Model Layer (Burn)
// ============================================================
// All tensor code lives here.
//
//   backbone.rs   - GPT-2 / GPT-NeoX / OPT style causal transformer with an
//                   optional LM head, plus the shifted LM loss
//   params.rs     - dotted parameter names for inspection and
//                   layer discovery
//   value_head.rs - ValueHeadModel: backbone + scalar value per token
//   pretrained.rs - from_pretrained / save_pretrained entry points
//   generation.rs - greedy and sampled autoregressive decoding
//   reference.rs  - frozen reference copies with shared leading blocks

/// Causal transformer backbone
pub mod backbone;

/// Named parameter listing
pub mod params;

/// Value-head wrapper
pub mod value_head;

/// Loading from registry ids and checkpoint directories
pub mod pretrained;

/// Autoregressive decoding
pub mod generation;

/// Reference model factory
pub mod reference;

#[cfg(test)]
pub mod test_utils;
