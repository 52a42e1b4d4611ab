use burn::{
    module::{Ignored, Param},
    nn::{
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        Initializer,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};
use rand::{
    distributions::{Distribution, Uniform},
    rngs::StdRng,
    SeedableRng,
};

use crate::domain::error::{ModelError, ModelResult};
use crate::domain::naming::{join, Activation, Architecture, ParamNames};
use crate::ml::params::{NamedParameter, NamedParameters};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally; do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct BackboneConfig {
    pub architecture:      Architecture,
    pub vocab_size:        usize,
    pub n_positions:       usize,
    pub hidden_size:       usize,
    pub num_heads:         usize,
    pub num_layers:        usize,
    pub intermediate_size: usize,
    #[config(default = 0.1)]
    pub dropout:           f64,
    #[config(default = 1e-5)]
    pub layer_norm_eps:    f64,
    #[config(default = 0.02)]
    pub initializer_range: f64,
    /// False for a bare transformer without the language-modelling head
    #[config(default = true)]
    pub has_lm_head:       bool,
    /// Picked up by the value head when no explicit option is passed
    #[config(default = "None")]
    pub summary_dropout_prob: Option<f64>,
    #[config(default = "None")]
    pub eos_token_id:      Option<u32>,
    /// Fixed weight seed; `init` then builds the same weights every time
    #[config(default = "None")]
    pub seed:              Option<u64>,
}

impl BackboneConfig {
    pub fn validate(&self) -> ModelResult<()> {
        if self.num_heads == 0 || self.hidden_size % self.num_heads != 0 {
            return Err(ModelError::InvalidOption(format!(
                "hidden_size {} is not divisible by num_heads {}",
                self.hidden_size, self.num_heads
            )));
        }
        if self.vocab_size == 0 || self.n_positions == 0 {
            return Err(ModelError::InvalidOption(
                "vocab_size and n_positions must be non-zero".to_string(),
            ));
        }
        if let Some(eos) = self.eos_token_id {
            if eos as usize >= self.vocab_size {
                return Err(ModelError::InvalidOption(format!(
                    "eos_token_id {eos} is outside the vocabulary (size {})",
                    self.vocab_size
                )));
            }
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ModelResult<CausalLm<B>> {
        self.validate()?;
        let mut seeded = self.seed.map(|seed| SeededInit::new(seed, self.initializer_range));

        let token_embedding    = self.embedding(&mut seeded, self.vocab_size, device);
        let position_embedding = self.embedding(&mut seeded, self.n_positions, device);
        let blocks: Vec<Block<B>> = (0..self.num_layers)
            .map(|_| self.build_block(&mut seeded, device))
            .collect();
        let final_norm = self.layer_norm(device);
        let dropout    = DropoutConfig::new(self.dropout).init();

        let lm_head = self.has_lm_head.then(|| {
            self.linear(&mut seeded, self.hidden_size, self.vocab_size, false, device)
        });

        Ok(CausalLm {
            transformer: Transformer {
                token_embedding, position_embedding, blocks, final_norm, dropout,
            },
            lm_head,
            config: Ignored(self.clone()),
        })
    }

    fn initializer(&self) -> Initializer {
        Initializer::Normal { mean: 0.0, std: self.initializer_range }
    }

    fn layer_norm<B: Backend>(&self, device: &B::Device) -> LayerNorm<B> {
        LayerNormConfig::new(self.hidden_size)
            .with_epsilon(self.layer_norm_eps)
            .init(device)
    }

    fn embedding<B: Backend>(
        &self,
        seeded: &mut Option<SeededInit>,
        rows:   usize,
        device: &B::Device,
    ) -> Embedding<B> {
        let mut embedding = EmbeddingConfig::new(rows, self.hidden_size)
            .with_initializer(self.initializer())
            .init(device);
        if let Some(seeded) = seeded {
            embedding.weight = seeded.param([rows, self.hidden_size], device);
        }
        embedding
    }

    fn linear<B: Backend>(
        &self,
        seeded: &mut Option<SeededInit>,
        d_in:   usize,
        d_out:  usize,
        bias:   bool,
        device: &B::Device,
    ) -> Linear<B> {
        let mut linear = LinearConfig::new(d_in, d_out)
            .with_bias(bias)
            .with_initializer(self.initializer())
            .init(device);
        if let Some(seeded) = seeded {
            linear.weight = seeded.param([d_in, d_out], device);
            linear.bias = linear
                .bias
                .map(|_| Param::from_tensor(Tensor::zeros([d_out], device)));
        }
        linear
    }

    fn build_block<B: Backend>(&self, seeded: &mut Option<SeededInit>, device: &B::Device) -> Block<B> {
        let attn = CausalSelfAttention {
            qkv:           self.linear(seeded, self.hidden_size, 3 * self.hidden_size, true, device),
            out_proj:      self.linear(seeded, self.hidden_size, self.hidden_size, true, device),
            attn_dropout:  DropoutConfig::new(self.dropout).init(),
            resid_dropout: DropoutConfig::new(self.dropout).init(),
            num_heads:     self.num_heads,
        };
        let mlp = Mlp {
            fc_in:      self.linear(seeded, self.hidden_size, self.intermediate_size, true, device),
            fc_out:     self.linear(seeded, self.intermediate_size, self.hidden_size, true, device),
            dropout:    DropoutConfig::new(self.dropout).init(),
            activation: Ignored(self.architecture.activation()),
        };
        Block {
            ln_1: self.layer_norm(device),
            attn,
            ln_2: self.layer_norm(device),
            mlp,
            parallel_residual: self.architecture.parallel_residual(),
        }
    }
}

// Weights drawn in construction order from one seeded stream, so a
// seeded config always rebuilds the same model. Uniform on [-a, a]
// with a = std·√3 has the configured standard deviation.
struct SeededInit {
    rng:   StdRng,
    range: Uniform<f64>,
}

impl SeededInit {
    fn new(seed: u64, std: f64) -> Self {
        let bound = std * 3f64.sqrt();
        Self {
            rng:   StdRng::seed_from_u64(seed),
            range: Uniform::new_inclusive(-bound, bound),
        }
    }

    fn param<B: Backend, const D: usize>(
        &mut self,
        shape:  [usize; D],
        device: &B::Device,
    ) -> Param<Tensor<B, D>> {
        let len: usize = shape.iter().product();
        let values: Vec<f32> = (0..len)
            .map(|_| self.range.sample(&mut self.rng) as f32)
            .collect();
        Param::from_tensor(Tensor::from_data(TensorData::new(values, shape), device))
    }
}

/// Every id must index the embedding table.
pub(crate) fn check_token_ids<B: Backend, const D: usize>(
    ids:        &Tensor<B, D, Int>,
    vocab_size: usize,
) -> ModelResult<()> {
    let lowest  = ids.clone().min().into_scalar().elem::<i64>();
    let highest = ids.clone().max().into_scalar().elem::<i64>();
    for id in [lowest, highest] {
        if id < 0 || id as usize >= vocab_size {
            return Err(ModelError::InvalidOption(format!(
                "token id {id} is outside the vocabulary (size {vocab_size})"
            )));
        }
    }
    Ok(())
}

// ─── Causal self-attention ───────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct CausalSelfAttention<B: Backend> {
    /// Fused query/key/value projection: d_model → 3·d_model
    pub qkv:           Linear<B>,
    pub out_proj:      Linear<B>,
    pub attn_dropout:  Dropout,
    pub resid_dropout: Dropout,
    pub num_heads:     usize,
}

impl<B: Backend> CausalSelfAttention<B> {
    /// x: [batch, seq_len, d_model] → [batch, seq_len, d_model]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch_size, seq_len, d_model] = x.dims();
        let head_dim = d_model / self.num_heads;
        let device   = x.device();

        let qkv = self.qkv.forward(x); // [batch, seq_len, 3·d_model]
        let split_heads = |from: usize| {
            qkv.clone()
                .slice([0..batch_size, 0..seq_len, from..from + d_model])
                .reshape([batch_size, seq_len, self.num_heads, head_dim])
                .swap_dims(1, 2) // [batch, heads, seq_len, head_dim]
        };
        let q = split_heads(0);
        let k = split_heads(d_model);
        let v = split_heads(2 * d_model);

        let scores = q
            .matmul(k.swap_dims(2, 3))
            .div_scalar((head_dim as f64).sqrt());

        // Position i may only attend to positions <= i.
        let mask = Tensor::<B, 2>::ones([seq_len, seq_len], &device)
            .triu(1)
            .mul_scalar(-1.0e9)
            .reshape([1, 1, seq_len, seq_len])
            .expand([batch_size, self.num_heads, seq_len, seq_len]);

        let probs = burn::tensor::activation::softmax(scores + mask, 3);
        let context = self.attn_dropout.forward(probs)
            .matmul(v)
            .swap_dims(1, 2)
            .reshape([batch_size, seq_len, d_model]);

        self.resid_dropout.forward(self.out_proj.forward(context))
    }
}

#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    pub fc_in:      Linear<B>,
    pub fc_out:     Linear<B>,
    pub dropout:    Dropout,
    pub activation: Ignored<Activation>,
}

impl<B: Backend> Mlp<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let hidden = self.fc_in.forward(x);
        let hidden = match self.activation.0 {
            Activation::Gelu => burn::tensor::activation::gelu(hidden),
            Activation::Relu => burn::tensor::activation::relu(hidden),
        };
        self.dropout.forward(self.fc_out.forward(hidden))
    }
}

// ─── Transformer block ───────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Block<B: Backend> {
    pub ln_1:              LayerNorm<B>,
    pub attn:              CausalSelfAttention<B>,
    pub ln_2:              LayerNorm<B>,
    pub mlp:               Mlp<B>,
    pub parallel_residual: bool,
}

impl<B: Backend> Block<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        if self.parallel_residual {
            let attn_out = self.attn.forward(self.ln_1.forward(x.clone()));
            let mlp_out  = self.mlp.forward(self.ln_2.forward(x.clone()));
            x + attn_out + mlp_out
        } else {
            let x = x.clone() + self.attn.forward(self.ln_1.forward(x));
            x.clone() + self.mlp.forward(self.ln_2.forward(x))
        }
    }

    fn collect_named_with(&self, names: &ParamNames, prefix: &str, out: &mut Vec<NamedParameter>) {
        let attn = join(prefix, names.attn);
        let mlp  = join(prefix, names.mlp);
        self.ln_1.collect_named(&join(prefix, names.ln_1), out);
        self.attn.qkv.collect_named(&join(&attn, names.qkv), out);
        self.attn.out_proj.collect_named(&join(&attn, names.attn_out), out);
        self.ln_2.collect_named(&join(prefix, names.ln_2), out);
        self.mlp.fc_in.collect_named(&join(&mlp, names.fc_in), out);
        self.mlp.fc_out.collect_named(&join(&mlp, names.fc_out), out);
    }
}

// ─── Transformer (the backbone without its LM head) ──────────────────────────
#[derive(Module, Debug)]
pub struct Transformer<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub blocks:             Vec<Block<B>>,
    pub final_norm:         LayerNorm<B>,
    pub dropout:            Dropout,
}

impl<B: Backend> Transformer<B> {
    /// input_ids: [batch, seq_len] → last hidden state [batch, seq_len, d_model]
    pub fn forward(&self, input_ids: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        let [batch_size, seq_len] = input_ids.dims();

        let tok_emb = self.token_embedding.forward(input_ids);
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for block in &self.blocks {
            x = block.forward(x);
        }
        self.final_norm.forward(x)
    }

    fn collect_named_with(&self, names: &ParamNames, prefix: &str, out: &mut Vec<NamedParameter>) {
        self.token_embedding.collect_named(&join(prefix, names.token_embedding), out);
        self.position_embedding.collect_named(&join(prefix, names.position_embedding), out);
        let blocks = join(prefix, names.blocks);
        for (index, block) in self.blocks.iter().enumerate() {
            block.collect_named_with(names, &join(&blocks, &index.to_string()), out);
        }
        self.final_norm.collect_named(&join(prefix, names.final_norm), out);
    }
}

// ─── Causal language model ───────────────────────────────────────────────────
// A transformer plus an optional LM head. The head is optional so
// that a bare transformer (`into_base_model`) is representable; the
// value-head wrapper inspects `lm_head` to reject it.
#[derive(Module, Debug)]
pub struct CausalLm<B: Backend> {
    pub transformer: Transformer<B>,
    pub lm_head:     Option<Linear<B>>,
    pub config:      Ignored<BackboneConfig>,
}

pub struct CausalLmOutput<B: Backend> {
    /// [batch, seq_len, vocab_size]
    pub logits:        Tensor<B, 3>,
    /// Shifted next-token cross entropy; present only when labels were given
    pub loss:          Option<Tensor<B, 1>>,
    /// Last hidden state after the final norm: [batch, seq_len, d_model]
    pub hidden_states: Tensor<B, 3>,
}

impl<B: Backend> CausalLm<B> {
    pub fn config(&self) -> &BackboneConfig {
        &self.config.0
    }

    pub fn config_mut(&mut self) -> &mut BackboneConfig {
        &mut self.config.0
    }

    pub fn hidden_size(&self) -> usize {
        self.config.0.hidden_size
    }

    pub fn num_layers(&self) -> usize {
        self.transformer.blocks.len()
    }

    pub fn has_lm_head(&self) -> bool {
        self.lm_head.is_some()
    }

    pub fn device(&self) -> B::Device {
        self.transformer.token_embedding.weight.val().device()
    }

    /// Drop the LM head, keeping only the transformer.
    pub fn into_base_model(mut self) -> Self {
        self.lm_head = None;
        self.config.0.has_lm_head = false;
        self
    }

    pub(crate) fn lm_head(&self) -> ModelResult<&Linear<B>> {
        self.lm_head.as_ref().ok_or_else(|| {
            ModelError::invalid_backbone(format!(
                "{:?} backbone has no language-modelling head",
                self.config.0.architecture
            ))
        })
    }

    /// input_ids: [batch, seq_len]; labels, when given, must have the same shape.
    pub fn forward(
        &self,
        input_ids: Tensor<B, 2, Int>,
        labels:    Option<Tensor<B, 2, Int>>,
    ) -> ModelResult<CausalLmOutput<B>> {
        let lm_head = self.lm_head()?;
        let [_, seq_len] = input_ids.dims();
        if seq_len == 0 || seq_len > self.config.0.n_positions {
            return Err(ModelError::InvalidOption(format!(
                "sequence length {seq_len} outside 1..={}",
                self.config.0.n_positions
            )));
        }
        let vocab_size = self.config.0.vocab_size;
        check_token_ids(&input_ids, vocab_size)?;
        if let Some(labels) = &labels {
            if labels.dims() != input_ids.dims() {
                return Err(ModelError::InvalidOption(format!(
                    "labels shape {:?} does not match input_ids shape {:?}",
                    labels.dims(),
                    input_ids.dims()
                )));
            }
            check_token_ids(labels, vocab_size)?;
        }

        let hidden_states = self.transformer.forward(input_ids);
        let logits = lm_head.forward(hidden_states.clone());
        let loss = labels.and_then(|labels| shifted_cross_entropy(logits.clone(), labels));

        Ok(CausalLmOutput { logits, loss, hidden_states })
    }
}

impl<B: Backend> NamedParameters for CausalLm<B> {
    fn collect_named(&self, prefix: &str, out: &mut Vec<NamedParameter>) {
        let names = self.config.0.architecture.names();
        self.transformer.collect_named_with(names, &join(prefix, names.base), out);
        self.lm_head.collect_named(&join(prefix, names.lm_head), out);
    }
}

/// Next-token loss: logits at position t are scored against labels[t + 1].
/// Sequences shorter than two tokens have nothing to predict.
fn shifted_cross_entropy<B: Backend>(
    logits: Tensor<B, 3>,
    labels: Tensor<B, 2, Int>,
) -> Option<Tensor<B, 1>> {
    let [batch_size, seq_len, vocab_size] = logits.dims();
    if seq_len < 2 {
        return None;
    }
    let predicted = batch_size * (seq_len - 1);
    let shifted_logits = logits
        .slice([0..batch_size, 0..seq_len - 1, 0..vocab_size])
        .reshape([predicted, vocab_size]);
    let shifted_labels = labels
        .slice([0..batch_size, 1..seq_len])
        .reshape([predicted]);

    let ce = CrossEntropyLossConfig::new().init(&shifted_logits.device());
    Some(ce.forward(shifted_logits, shifted_labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::test_utils::{device, input_ids, tiny_config, TestBackend};

    #[test]
    fn test_forward_shapes() {
        for arch in [Architecture::Gpt2, Architecture::GptNeoX, Architecture::Opt] {
            let cfg = tiny_config(arch);
            let model: CausalLm<TestBackend> = cfg.init(&device()).unwrap();
            let ids = input_ids(&[[1, 2, 3, 4, 5, 6]]);
            let out = model.forward(ids.clone(), Some(ids)).unwrap();
            assert_eq!(out.logits.dims(), [1, 6, cfg.vocab_size]);
            assert_eq!(out.hidden_states.dims(), [1, 6, cfg.hidden_size]);
            let loss: f32 = out.loss.unwrap().into_scalar().elem::<f32>();
            assert!(loss.is_finite() && loss > 0.0);
        }
    }

    #[test]
    fn test_forward_is_causal() {
        type Inner = burn::backend::NdArray;
        let cfg = tiny_config(Architecture::Gpt2).with_dropout(0.0);
        let device = Default::default();
        let model: CausalLm<Inner> = cfg.init(&device).unwrap();
        let a = Tensor::<Inner, 1, Int>::from_ints([5, 6, 7, 8].as_slice(), &device).reshape([1, 4]);
        let b = Tensor::<Inner, 1, Int>::from_ints([5, 6, 7, 9].as_slice(), &device).reshape([1, 4]);
        let vocab = cfg.vocab_size;
        let prefix = |ids: Tensor<Inner, 2, Int>| -> Vec<f32> {
            model.forward(ids, None).unwrap().logits
                .slice([0..1, 0..3, 0..vocab])
                .into_data().iter::<f32>().collect()
        };
        assert_eq!(prefix(a), prefix(b));
    }

    #[test]
    fn test_no_loss_without_labels() {
        let model: CausalLm<TestBackend> = tiny_config(Architecture::Gpt2).init(&device()).unwrap();
        let out = model.forward(input_ids(&[[1, 2, 3]]), None).unwrap();
        assert!(out.loss.is_none());
    }

    #[test]
    fn test_single_token_has_no_loss() {
        let model: CausalLm<TestBackend> = tiny_config(Architecture::Gpt2).init(&device()).unwrap();
        let ids = input_ids(&[[1]]);
        let out = model.forward(ids.clone(), Some(ids)).unwrap();
        assert!(out.loss.is_none());
    }

    #[test]
    fn test_label_shape_mismatch() {
        let model: CausalLm<TestBackend> = tiny_config(Architecture::Gpt2).init(&device()).unwrap();
        let result = model.forward(input_ids(&[[1, 2, 3]]), Some(input_ids(&[[1, 2]])));
        assert!(matches!(result, Err(ModelError::InvalidOption(_))));
    }

    #[test]
    fn test_base_model_has_no_head() {
        let model: CausalLm<TestBackend> = tiny_config(Architecture::Gpt2).init(&device()).unwrap();
        let base = model.into_base_model();
        assert!(!base.has_lm_head());
        assert!(base.parameter_names().iter().all(|n| !n.starts_with("lm_head")));
        let result = base.forward(input_ids(&[[1, 2]]), None);
        assert!(matches!(result, Err(ModelError::InvalidBackbone { .. })));
    }

    #[test]
    fn test_parameter_names_follow_family() {
        let gpt2: CausalLm<TestBackend> = tiny_config(Architecture::Gpt2).init(&device()).unwrap();
        let names = gpt2.parameter_names();
        assert!(names.contains(&"transformer.h.0.attn.c_attn.weight".to_string()));
        assert!(names.contains(&"transformer.h.1.mlp.c_proj.bias".to_string()));
        assert!(names.contains(&"transformer.ln_f.weight".to_string()));
        assert!(names.contains(&"lm_head.weight".to_string()));

        let neox: CausalLm<TestBackend> = tiny_config(Architecture::GptNeoX).init(&device()).unwrap();
        let names = neox.parameter_names();
        assert!(names.contains(&"gpt_neox.layers.0.attention.query_key_value.weight".to_string()));
        assert!(names.contains(&"gpt_neox.final_layer_norm.bias".to_string()));
        assert!(names.contains(&"embed_out.weight".to_string()));

        let opt: CausalLm<TestBackend> = tiny_config(Architecture::Opt).init(&device()).unwrap();
        let names = opt.parameter_names();
        assert!(names.contains(&"model.decoder.layers.0.self_attn.qkv_proj.weight".to_string()));
        assert!(names.contains(&"model.decoder.layers.0.fc1.weight".to_string()));
        assert!(names.contains(&"model.decoder.layers.2.final_layer_norm.bias".to_string()));
        assert!(names.contains(&"model.decoder.final_layer_norm.weight".to_string()));
        assert!(names.contains(&"lm_head.weight".to_string()));
    }

    #[test]
    fn test_layer_norm_reports_weight_and_bias() {
        let model: CausalLm<TestBackend> = tiny_config(Architecture::Gpt2).init(&device()).unwrap();
        let weight = model.get_parameter("transformer.h.0.ln_1.weight").unwrap();
        let bias   = model.get_parameter("transformer.h.0.ln_1.bias").unwrap();
        assert_eq!(weight.shape, vec![16]);
        assert!(weight.values().iter().all(|&v| v == 1.0));
        assert!(bias.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_seeded_init_is_reproducible() {
        let cfg = tiny_config(Architecture::GptNeoX).with_seed(Some(3));
        let a: CausalLm<TestBackend> = cfg.init(&device()).unwrap();
        let b: CausalLm<TestBackend> = cfg.init(&device()).unwrap();
        for (x, y) in a.named_parameters().iter().zip(&b.named_parameters()) {
            assert_eq!(x.values(), y.values(), "{}", x.name);
        }

        let other: CausalLm<TestBackend> =
            tiny_config(Architecture::GptNeoX).with_seed(Some(4)).init(&device()).unwrap();
        let name = "gpt_neox.layers.0.attention.query_key_value.weight";
        assert_ne!(a.get_parameter(name).unwrap().values(), other.get_parameter(name).unwrap().values());
    }

    #[test]
    fn test_seeded_init_keeps_scale() {
        let model: CausalLm<TestBackend> =
            tiny_config(Architecture::Gpt2).with_seed(Some(1)).init(&device()).unwrap();
        let values = model.get_parameter("transformer.wte.weight").unwrap().values();
        let bound = (0.02 * 3f64.sqrt()) as f32 + 1e-6;
        assert!(values.iter().all(|v| v.abs() <= bound));
        assert!(values.iter().any(|&v| v != 0.0));
        let bias = model.get_parameter("transformer.h.0.attn.c_attn.bias").unwrap().values();
        assert!(bias.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_out_of_vocabulary_input_is_rejected() {
        let model: CausalLm<TestBackend> = tiny_config(Architecture::Gpt2).init(&device()).unwrap();
        let result = model.forward(input_ids(&[[1, 5000]]), None);
        assert!(matches!(result, Err(ModelError::InvalidOption(msg)) if msg.contains("outside the vocabulary")));

        let result = model.forward(input_ids(&[[1, 2]]), Some(input_ids(&[[1, 96]])));
        assert!(matches!(result, Err(ModelError::InvalidOption(_))));

        let result = model.forward(input_ids(&[[-1, 2]]), None);
        assert!(matches!(result, Err(ModelError::InvalidOption(_))));
    }

    #[test]
    fn test_eos_outside_vocabulary_rejected() {
        let cfg = tiny_config(Architecture::Gpt2).with_eos_token_id(Some(96));
        assert!(matches!(cfg.validate(), Err(ModelError::InvalidOption(_))));
    }

    #[test]
    fn test_invalid_head_split_rejected() {
        let cfg = BackboneConfig::new(Architecture::Gpt2, 16, 8, 10, 3, 1, 16);
        let result = cfg.init::<TestBackend>(&device());
        assert!(matches!(result, Err(ModelError::InvalidOption(_))));
    }
}
