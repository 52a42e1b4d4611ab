// ============================================================
// Layer 3: Parameter Naming and Layer Patterns
// ============================================================
// Every parameter of a model is addressed by a dotted path, e.g.
//
//   pretrained_model.transformer.h.0.attn.c_attn.weight
//   └─ wrapper ──┘ └──── block 0 of the backbone ───┘
//
// The reference-model factory never looks at concrete Rust types
// to find transformer blocks. It matches these names against a
// layer pattern such as `transformer.h.{layer}`; a model whose
// names match no pattern has no introspectable block sequence.

use serde::{Deserialize, Serialize};

use crate::domain::error::{ModelError, ModelResult};

/// Placeholder substituted with the block index inside a layer pattern
pub const LAYER_PLACEHOLDER: &str = "{layer}";

/// Block naming schemes tried when no explicit pattern is given
pub const LAYER_PATTERNS: &[&str] = &[
    "transformer.h.{layer}",
    "gpt_neox.layers.{layer}",
    "model.decoder.layers.{layer}",
];

/// Backbone layout family. Decides parameter names, the residual
/// wiring of each block and the feed-forward activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Architecture {
    /// Sequential residual: x + attn(ln_1(x)), then + mlp(ln_2(..))
    Gpt2,
    /// Parallel residual: x + attn(ln_1(x)) + mlp(ln_2(x))
    GptNeoX,
    /// Sequential residual with a ReLU feed-forward; the decoder lives
    /// under `model.decoder` and fc1/fc2 sit directly in each layer
    Opt,
}

/// Non-linearity of the feed-forward sublayer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Gelu,
    Relu,
}

/// Names of every parameter-carrying submodule of one family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamNames {
    pub base:               &'static str,
    pub token_embedding:    &'static str,
    pub position_embedding: &'static str,
    pub blocks:             &'static str,
    pub ln_1:               &'static str,
    pub attn:               &'static str,
    pub qkv:                &'static str,
    pub attn_out:           &'static str,
    pub ln_2:               &'static str,
    pub mlp:                &'static str,
    pub fc_in:              &'static str,
    pub fc_out:             &'static str,
    pub final_norm:         &'static str,
    pub lm_head:            &'static str,
}

const GPT2_NAMES: ParamNames = ParamNames {
    base:               "transformer",
    token_embedding:    "wte",
    position_embedding: "wpe",
    blocks:             "h",
    ln_1:               "ln_1",
    attn:               "attn",
    qkv:                "c_attn",
    attn_out:           "c_proj",
    ln_2:               "ln_2",
    mlp:                "mlp",
    fc_in:              "c_fc",
    fc_out:             "c_proj",
    final_norm:         "ln_f",
    lm_head:            "lm_head",
};

const GPT_NEOX_NAMES: ParamNames = ParamNames {
    base:               "gpt_neox",
    token_embedding:    "embed_in",
    position_embedding: "embed_pos",
    blocks:             "layers",
    ln_1:               "input_layernorm",
    attn:               "attention",
    qkv:                "query_key_value",
    attn_out:           "dense",
    ln_2:               "post_attention_layernorm",
    mlp:                "mlp",
    fc_in:              "dense_h_to_4h",
    fc_out:             "dense_4h_to_h",
    final_norm:         "final_layer_norm",
    lm_head:            "embed_out",
};

// OPT keeps q/k/v as three projections; here they are one fused
// `qkv_proj` so every family shares the same attention module.
const OPT_NAMES: ParamNames = ParamNames {
    base:               "model.decoder",
    token_embedding:    "embed_tokens",
    position_embedding: "embed_positions",
    blocks:             "layers",
    ln_1:               "self_attn_layer_norm",
    attn:               "self_attn",
    qkv:                "qkv_proj",
    attn_out:           "out_proj",
    ln_2:               "final_layer_norm",
    mlp:                "",
    fc_in:              "fc1",
    fc_out:             "fc2",
    final_norm:         "final_layer_norm",
    lm_head:            "lm_head",
};

impl Architecture {
    pub fn names(self) -> &'static ParamNames {
        match self {
            Architecture::Gpt2    => &GPT2_NAMES,
            Architecture::GptNeoX => &GPT_NEOX_NAMES,
            Architecture::Opt     => &OPT_NAMES,
        }
    }

    pub fn parallel_residual(self) -> bool {
        matches!(self, Architecture::GptNeoX)
    }

    pub fn activation(self) -> Activation {
        match self {
            Architecture::Opt => Activation::Relu,
            Architecture::Gpt2 | Architecture::GptNeoX => Activation::Gelu,
        }
    }
}

impl ParamNames {
    /// The layer pattern this family's block names follow
    pub fn layer_pattern(&self) -> String {
        format!("{}.{}.{}", self.base, self.blocks, LAYER_PLACEHOLDER)
    }
}

/// Join a dotted prefix and a name; an empty side yields the other.
pub fn join(prefix: &str, name: &str) -> String {
    match (prefix.is_empty(), name.is_empty()) {
        (true, _)     => name.to_string(),
        (false, true) => prefix.to_string(),
        _             => format!("{prefix}.{name}"),
    }
}

/// `transformer.h.{layer}` with layer 3 → `transformer.h.3`
pub fn layer_prefix(pattern: &str, layer: usize) -> String {
    pattern.replace(LAYER_PLACEHOLDER, &layer.to_string())
}

/// True when `name` lies under the dotted path `prefix`, on segment
/// boundaries: `a.h.1` covers `a.h.1.w` but not `a.h.10.w`.
pub fn is_under(name: &str, prefix: &str) -> bool {
    let bytes = name.as_bytes();
    name.match_indices(prefix).any(|(at, _)| {
        let end = at + prefix.len();
        let starts_on_segment = at == 0 || bytes[at - 1] == b'.';
        let ends_on_segment = end == bytes.len() || bytes[end] == b'.';
        starts_on_segment && ends_on_segment
    })
}

/// Count consecutive blocks 0, 1, 2, ... that have at least one
/// parameter under `pattern`.
pub fn count_layers<S: AsRef<str>>(pattern: &str, names: &[S]) -> usize {
    (0..)
        .take_while(|&layer| {
            let prefix = layer_prefix(pattern, layer);
            names.iter().any(|name| is_under(name.as_ref(), &prefix))
        })
        .count()
}

/// Find the layer pattern for a set of parameter names.
///
/// An explicit pattern must contain `{layer}` and match block 0;
/// otherwise every entry of [`LAYER_PATTERNS`] is tried in order.
/// Returns the pattern together with the number of blocks it covers.
pub fn resolve_layer_pattern<S: AsRef<str>>(
    names:    &[S],
    explicit: Option<&str>,
) -> ModelResult<(String, usize)> {
    if let Some(pattern) = explicit {
        if !pattern.contains(LAYER_PLACEHOLDER) {
            return Err(ModelError::InvalidOption(format!(
                "layer pattern '{pattern}' has no {LAYER_PLACEHOLDER} placeholder"
            )));
        }
        return match count_layers(pattern, names) {
            0 => Err(ModelError::LayerNotFound { pattern: pattern.to_string() }),
            n => Ok((pattern.to_string(), n)),
        };
    }

    LAYER_PATTERNS
        .iter()
        .map(|pattern| (pattern.to_string(), count_layers(pattern, names)))
        .find(|(_, n)| *n > 0)
        .ok_or_else(|| ModelError::LayerNotFound {
            pattern: LAYER_PATTERNS.join(" | "),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gpt2_names(layers: usize) -> Vec<String> {
        let mut names = vec!["pretrained_model.transformer.wte.weight".to_string()];
        for layer in 0..layers {
            names.push(format!("pretrained_model.transformer.h.{layer}.attn.c_attn.weight"));
            names.push(format!("pretrained_model.transformer.h.{layer}.mlp.c_fc.bias"));
        }
        names.push("v_head.summary.weight".to_string());
        names
    }

    #[test]
    fn test_is_under_respects_segment_boundaries() {
        assert!(is_under("a.transformer.h.1.attn.w", "transformer.h.1"));
        assert!(!is_under("a.transformer.h.10.attn.w", "transformer.h.1"));
        assert!(!is_under("a.xtransformer.h.1.attn.w", "transformer.h.1"));
        assert!(is_under("transformer.h.1", "transformer.h.1"));
    }

    #[test]
    fn test_count_layers_over_ten_blocks() {
        let names = gpt2_names(12);
        assert_eq!(count_layers("transformer.h.{layer}", &names), 12);
        assert_eq!(count_layers("gpt_neox.layers.{layer}", &names), 0);
    }

    #[test]
    fn test_resolve_default_patterns() {
        let names = gpt2_names(5);
        let (pattern, layers) = resolve_layer_pattern(&names, None).unwrap();
        assert_eq!(pattern, "transformer.h.{layer}");
        assert_eq!(layers, 5);
    }

    #[test]
    fn test_resolve_explicit_pattern_without_match() {
        let names = gpt2_names(2);
        let err = resolve_layer_pattern(&names, Some("decoder.block.{layer}")).unwrap_err();
        assert!(matches!(err, ModelError::LayerNotFound { .. }));
    }

    #[test]
    fn test_resolve_explicit_pattern_requires_placeholder() {
        let names = gpt2_names(2);
        let err = resolve_layer_pattern(&names, Some("transformer.h")).unwrap_err();
        assert!(matches!(err, ModelError::InvalidOption(_)));
    }

    #[test]
    fn test_resolve_without_blocks() {
        let names = vec!["v_head.summary.weight".to_string()];
        let err = resolve_layer_pattern(&names, None).unwrap_err();
        assert!(matches!(err, ModelError::LayerNotFound { .. }));
    }

    #[test]
    fn test_every_pattern_belongs_to_a_family() {
        let families = [Architecture::Gpt2, Architecture::GptNeoX, Architecture::Opt];
        let patterns: Vec<String> = families.iter().map(|a| a.names().layer_pattern()).collect();
        assert_eq!(patterns.len(), LAYER_PATTERNS.len());
        for pattern in LAYER_PATTERNS {
            assert!(patterns.iter().any(|p| p == pattern), "{pattern}");
        }
    }

    #[test]
    fn test_join_skips_empty_segments() {
        assert_eq!(join("", "wte"), "wte");
        assert_eq!(join("model.decoder.layers.0", ""), "model.decoder.layers.0");
        assert_eq!(join("a", "b"), "a.b");
    }

    #[test]
    fn test_resolve_opt_names() {
        let names = vec![
            "pretrained_model.model.decoder.embed_tokens.weight".to_string(),
            "pretrained_model.model.decoder.layers.0.fc1.weight".to_string(),
            "pretrained_model.model.decoder.layers.1.fc1.weight".to_string(),
            "pretrained_model.model.decoder.final_layer_norm.weight".to_string(),
        ];
        let (pattern, layers) = resolve_layer_pattern(&names, None).unwrap();
        assert_eq!(pattern, "model.decoder.layers.{layer}");
        assert_eq!(layers, 2);
    }
}
