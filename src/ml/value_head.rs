use std::path::Path;

use burn::{
    module::{Ignored, Param},
    nn::{Dropout, DropoutConfig, Initializer, Linear, LinearConfig},
    prelude::*,
};

use crate::domain::error::{ModelError, ModelResult};
use crate::domain::generation::GenerationOptions;
use crate::domain::naming::join;
use crate::domain::value_head::{resolve_dropout_prob, ValueHeadInit};
use crate::infra::checkpoint::CheckpointDir;
use crate::ml::backbone::CausalLm;
use crate::ml::params::{NamedParameter, NamedParameters};
use crate::ml::pretrained::PretrainedSource;

/// Construction options of the value head.
#[derive(Config, Debug)]
pub struct ValueHeadConfig {
    /// Overrides the backbone config's `summary_dropout_prob`
    #[config(default = "None")]
    pub summary_dropout_prob: Option<f64>,
    #[config(default = "None")]
    pub v_head_init_strategy: Option<ValueHeadInit>,
    /// Standard deviation for `ValueHeadInit::Normal`
    #[config(default = 0.2)]
    pub v_head_initializer_range: f64,
}

impl ValueHeadConfig {
    pub fn init<B: Backend>(
        &self,
        hidden_size:  usize,
        dropout_prob: f64,
        device:       &B::Device,
    ) -> ValueHead<B> {
        let summary = match self.v_head_init_strategy {
            None => LinearConfig::new(hidden_size, 1).init(device),
            Some(ValueHeadInit::Normal) => {
                let mut summary = LinearConfig::new(hidden_size, 1)
                    .with_initializer(Initializer::Normal {
                        mean: 0.0,
                        std:  self.v_head_initializer_range,
                    })
                    .init(device);
                summary.bias = Some(Param::from_tensor(Tensor::zeros([1], device)));
                summary
            }
        };
        ValueHead {
            dropout: DropoutConfig::new(dropout_prob).init(),
            summary,
        }
    }

    /// Field-wise merge: options set on `self` win over `saved`.
    pub fn merged_over(&self, saved: Option<&ValueHeadConfig>) -> ValueHeadConfig {
        let Some(saved) = saved else {
            return self.clone();
        };
        ValueHeadConfig {
            summary_dropout_prob:     self.summary_dropout_prob.or(saved.summary_dropout_prob),
            v_head_init_strategy:     self.v_head_init_strategy.or(saved.v_head_init_strategy),
            v_head_initializer_range: self.v_head_initializer_range,
        }
    }
}

/// hidden state → dropout → Linear(hidden_size, 1) → one value per position
#[derive(Module, Debug)]
pub struct ValueHead<B: Backend> {
    pub dropout: Dropout,
    pub summary: Linear<B>,
}

impl<B: Backend> ValueHead<B> {
    /// hidden_states: [batch, seq_len, d_model] → values: [batch, seq_len]
    pub fn forward(&self, hidden_states: Tensor<B, 3>) -> Tensor<B, 2> {
        let [batch_size, seq_len, _] = hidden_states.dims();
        self.summary
            .forward(self.dropout.forward(hidden_states))
            .reshape([batch_size, seq_len])
    }
}

impl<B: Backend> NamedParameters for ValueHead<B> {
    fn collect_named(&self, prefix: &str, out: &mut Vec<NamedParameter>) {
        self.summary.collect_named(&join(prefix, "summary"), out);
    }
}

// ─── ValueHeadModel ──────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct ValueHeadModel<B: Backend> {
    pub pretrained_model: CausalLm<B>,
    pub v_head:           ValueHead<B>,
    /// Options as resolved at construction; persisted by `save_pretrained`
    pub options:          Ignored<ValueHeadConfig>,
}

/// The three outputs of a forward pass, always all present.
pub struct ValueHeadOutput<B: Backend> {
    /// [batch, seq_len, vocab_size]
    pub logits: Tensor<B, 3>,
    /// None when no labels were supplied
    pub loss:   Option<Tensor<B, 1>>,
    /// [batch, seq_len]
    pub value:  Tensor<B, 2>,
}

impl<B: Backend> ValueHeadOutput<B> {
    pub fn into_parts(self) -> (Tensor<B, 3>, Option<Tensor<B, 1>>, Tensor<B, 2>) {
        (self.logits, self.loss, self.value)
    }
}

impl<B: Backend> ValueHeadModel<B> {
    /// Load from a checkpoint directory or registry id, or wrap a backbone.
    ///
    /// A directory written by `save_pretrained` restores the value head
    /// and its options; options passed here override the saved ones.
    /// A directory holding only a backbone gets a fresh value head.
    pub fn from_pretrained(
        source:  impl Into<PretrainedSource<B>>,
        options: &ValueHeadConfig,
        device:  &B::Device,
    ) -> ModelResult<Self> {
        let identifier = match source.into() {
            PretrainedSource::Backbone(backbone) => return Self::from_backbone(backbone, options),
            PretrainedSource::Identifier(identifier) => identifier,
        };

        let checkpoint = CheckpointDir::new(&identifier);
        if !checkpoint.exists() {
            let backbone = CausalLm::from_pretrained(identifier.as_str(), device)?;
            return Self::from_backbone(backbone, options);
        }

        tracing::info!("Loading value-head model from '{}'", identifier);
        let backbone = checkpoint.load_backbone(device)?;
        let saved    = checkpoint.load_value_head_config()?;
        let model    = Self::from_backbone(backbone, &options.merged_over(saved.as_ref()))?;

        match checkpoint.load_value_head(model.v_head.clone(), device)? {
            Some(v_head) => Ok(Self { v_head, ..model }),
            None => {
                tracing::info!("No value head stored in '{}', initialised a fresh one", identifier);
                Ok(model)
            }
        }
    }

    /// Attach a freshly initialised value head to `backbone`.
    pub fn from_backbone(backbone: CausalLm<B>, options: &ValueHeadConfig) -> ModelResult<Self> {
        if !backbone.has_lm_head() {
            return Err(ModelError::invalid_backbone(
                "the value-head wrapper needs a causal LM with a language-modelling head",
            ));
        }
        let dropout_prob = resolve_dropout_prob(
            options.summary_dropout_prob,
            backbone.config().summary_dropout_prob,
        )?;
        let v_head = options.init(backbone.hidden_size(), dropout_prob, &backbone.device());

        tracing::debug!(
            "Attached value head: hidden_size={}, dropout={}",
            backbone.hidden_size(),
            dropout_prob
        );

        Ok(Self {
            pretrained_model: backbone,
            v_head,
            options: Ignored(options.clone().with_summary_dropout_prob(Some(dropout_prob))),
        })
    }

    /// Write backbone and value head to `dir`. The backbone files alone
    /// are a complete checkpoint for `CausalLm::from_pretrained`.
    pub fn save_pretrained(&self, dir: impl AsRef<Path>) -> ModelResult<()> {
        let checkpoint = CheckpointDir::new(dir.as_ref());
        checkpoint.save_backbone(&self.pretrained_model)?;
        checkpoint.save_value_head(&self.v_head, &self.options.0)?;
        tracing::info!("Saved value-head model to '{}'", dir.as_ref().display());
        Ok(())
    }

    pub fn forward(
        &self,
        input_ids: Tensor<B, 2, Int>,
        labels:    Option<Tensor<B, 2, Int>>,
    ) -> ModelResult<ValueHeadOutput<B>> {
        let output = self.pretrained_model.forward(input_ids, labels)?;
        let value  = self.v_head.forward(output.hidden_states);
        Ok(ValueHeadOutput { logits: output.logits, loss: output.loss, value })
    }

    /// Generation is the backbone's; the value head takes no part in it.
    pub fn generate(
        &self,
        input_ids: Tensor<B, 2, Int>,
        options:   &GenerationOptions,
    ) -> ModelResult<Tensor<B, 2, Int>> {
        self.pretrained_model.generate(input_ids, options)
    }

    pub fn dropout_prob(&self) -> f64 {
        self.v_head.dropout.prob
    }

    pub fn device(&self) -> B::Device {
        self.pretrained_model.device()
    }

    /// True when no parameter will receive gradients.
    pub fn is_frozen(&self) -> bool {
        self.named_parameters().iter().all(|p| !p.requires_grad)
    }
}

impl<B: Backend> NamedParameters for ValueHeadModel<B> {
    fn collect_named(&self, prefix: &str, out: &mut Vec<NamedParameter>) {
        self.pretrained_model.collect_named(&join(prefix, "pretrained_model"), out);
        self.v_head.collect_named(&join(prefix, "v_head"), out);
    }
}
