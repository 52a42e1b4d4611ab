// ============================================================
// Layer 1: CLI Commands and Arguments
// ============================================================
// Four subcommands: `init`, `inspect`, `generate`, `reference`.
// Every `--model` accepts a checkpoint directory or a registry id.

use clap::{Args, Subcommand, ValueEnum};

use crate::application::{
    generate_use_case::GenerateConfig,
    init_use_case::InitConfig,
    reference_use_case::ReferenceConfig,
};
use crate::domain::generation::GenerationOptions;
use crate::domain::value_head::ValueHeadInit;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Attach a value head to a backbone and save the result
    Init(InitArgs),

    /// List the named parameters of a model
    Inspect(InspectArgs),

    /// Generate tokens from a prompt and print value estimates
    Generate(GenerateArgs),

    /// Build a reference model sharing the first layers with the policy
    Reference(ReferenceArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum VHeadInitArg {
    /// Normal(0, v_head_initializer_range) weight, zero bias
    Normal,
}

impl From<VHeadInitArg> for ValueHeadInit {
    fn from(arg: VHeadInitArg) -> Self {
        match arg {
            VHeadInitArg::Normal => ValueHeadInit::Normal,
        }
    }
}

#[derive(Args, Debug)]
pub struct InitArgs {
    #[arg(long, default_value = "tiny-random-gpt2")]
    pub model: String,

    /// Directory the value-head model is written to
    #[arg(long, default_value = "checkpoints/value-head")]
    pub output: String,

    /// Dropout before the value head; falls back to the backbone config, then 0.1
    #[arg(long)]
    pub summary_dropout_prob: Option<f64>,

    #[arg(long, value_enum)]
    pub v_head_init: Option<VHeadInitArg>,
}

impl From<InitArgs> for InitConfig {
    fn from(a: InitArgs) -> Self {
        InitConfig {
            model:                a.model,
            output:               a.output,
            summary_dropout_prob: a.summary_dropout_prob,
            v_head_init:          a.v_head_init.map(Into::into),
        }
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[arg(long, default_value = "tiny-random-gpt2")]
    pub model: String,

    /// Only list parameters whose name contains this string
    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[arg(long, default_value = "tiny-random-gpt2")]
    pub model: String,

    /// Comma-separated prompt token ids, e.g. 1,2,3
    #[arg(long, value_delimiter = ',', required = true)]
    pub input_ids: Vec<u32>,

    #[arg(long, default_value_t = 20)]
    pub max_new_tokens: usize,

    /// Sample instead of greedy decoding
    #[arg(long)]
    pub do_sample: bool,

    #[arg(long, default_value_t = 1.0)]
    pub temperature: f64,

    /// Keep only the k most likely tokens when sampling (0 = all)
    #[arg(long, default_value_t = 0)]
    pub top_k: usize,

    #[arg(long)]
    pub eos_token_id: Option<u32>,

    #[arg(long)]
    pub seed: Option<u64>,
}

impl From<GenerateArgs> for GenerateConfig {
    fn from(a: GenerateArgs) -> Self {
        GenerateConfig {
            model:     a.model,
            input_ids: a.input_ids,
            options:   GenerationOptions {
                max_new_tokens: a.max_new_tokens,
                eos_token_id:   a.eos_token_id,
                do_sample:      a.do_sample,
                temperature:    a.temperature,
                top_k:          a.top_k,
                seed:           a.seed,
            },
        }
    }
}

#[derive(Args, Debug)]
pub struct ReferenceArgs {
    #[arg(long, default_value = "tiny-random-gpt2")]
    pub model: String,

    /// Leading blocks shared with the policy; 0 makes a fully independent copy
    #[arg(long, default_value_t = 0)]
    pub num_shared_layers: usize,

    /// Block naming pattern, e.g. "transformer.h.{layer}"
    #[arg(long)]
    pub pattern: Option<String>,

    /// Save the reference model to this directory
    #[arg(long)]
    pub output: Option<String>,
}

impl From<ReferenceArgs> for ReferenceConfig {
    fn from(a: ReferenceArgs) -> Self {
        ReferenceConfig {
            model:             a.model,
            num_shared_layers: a.num_shared_layers,
            pattern:           a.pattern,
            output:            a.output,
        }
    }
}
