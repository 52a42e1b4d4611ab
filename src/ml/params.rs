// ============================================================
// Layer 5: Named Parameters
// ============================================================
// Burn identifies parameters by ParamId only. For checkpoint
// inspection, for `get_parameter("...c_attn.weight")` and for
// pattern-based layer discovery we also need the dotted path of
// each parameter, so every module in the model reports its own
// parameters under the prefix it is given.

use burn::{
    module::Param,
    nn::{Embedding, LayerNorm, Linear},
    prelude::*,
};

use crate::domain::naming::join;

/// A snapshot of one parameter: its dotted name, shape and values.
#[derive(Debug, Clone)]
pub struct NamedParameter {
    pub name:          String,
    pub shape:         Vec<usize>,
    pub data:          TensorData,
    pub requires_grad: bool,
}

impl NamedParameter {
    pub fn from_param<B: Backend, const D: usize>(
        name:  String,
        param: &Param<Tensor<B, D>>,
    ) -> Self {
        let tensor = param.val();
        Self {
            name,
            shape:         tensor.dims().to_vec(),
            requires_grad: tensor.is_require_grad(),
            data:          tensor.into_data(),
        }
    }

    pub fn num_elements(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn values(&self) -> Vec<f32> {
        self.data.iter::<f32>().collect()
    }
}

/// Modules that can list their parameters by dotted name.
pub trait NamedParameters {
    /// Push every parameter of `self` onto `out`, named under `prefix`.
    fn collect_named(&self, prefix: &str, out: &mut Vec<NamedParameter>);

    fn named_parameters(&self) -> Vec<NamedParameter> {
        let mut out = Vec::new();
        self.collect_named("", &mut out);
        out
    }

    fn parameter_names(&self) -> Vec<String> {
        self.named_parameters().into_iter().map(|p| p.name).collect()
    }

    fn get_parameter(&self, name: &str) -> Option<NamedParameter> {
        self.named_parameters().into_iter().find(|p| p.name == name)
    }

    fn num_parameters(&self) -> usize {
        self.named_parameters().iter().map(NamedParameter::num_elements).sum()
    }
}

impl<B: Backend> NamedParameters for Linear<B> {
    fn collect_named(&self, prefix: &str, out: &mut Vec<NamedParameter>) {
        out.push(NamedParameter::from_param(join(prefix, "weight"), &self.weight));
        if let Some(bias) = &self.bias {
            out.push(NamedParameter::from_param(join(prefix, "bias"), bias));
        }
    }
}

impl<B: Backend> NamedParameters for Embedding<B> {
    fn collect_named(&self, prefix: &str, out: &mut Vec<NamedParameter>) {
        out.push(NamedParameter::from_param(join(prefix, "weight"), &self.weight));
    }
}

// Checkpoint names use `weight` / `bias` for burn's gamma / beta.
impl<B: Backend> NamedParameters for LayerNorm<B> {
    fn collect_named(&self, prefix: &str, out: &mut Vec<NamedParameter>) {
        out.push(NamedParameter::from_param(join(prefix, "weight"), &self.gamma));
        if let Some(beta) = &self.beta {
            out.push(NamedParameter::from_param(join(prefix, "bias"), beta));
        }
    }
}

impl<T: NamedParameters> NamedParameters for Option<T> {
    fn collect_named(&self, prefix: &str, out: &mut Vec<NamedParameter>) {
        if let Some(module) = self {
            module.collect_named(prefix, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::nn::{LayerNormConfig, LinearConfig};

    use crate::ml::test_utils::{device, TestBackend};

    #[test]
    fn test_linear_reports_weight_and_bias() {
        let linear: Linear<TestBackend> = LinearConfig::new(4, 3).init(&device());
        let params = linear.named_parameters();
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["weight", "bias"]);
        assert_eq!(params[0].shape, vec![4, 3]);
        assert_eq!(params[1].shape, vec![3]);
        assert_eq!(linear.num_parameters(), 15);
    }

    #[test]
    fn test_prefix_is_joined() {
        let linear: Linear<TestBackend> = LinearConfig::new(2, 2).with_bias(false).init(&device());
        let mut out = Vec::new();
        linear.collect_named("mlp.c_fc", &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "mlp.c_fc.weight");
    }

    #[test]
    fn test_layer_norm_uses_checkpoint_names() {
        let norm: LayerNorm<TestBackend> = LayerNormConfig::new(6).init(&device());
        let params = norm.named_parameters();
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["weight", "bias"]);

        let no_bias: LayerNorm<TestBackend> = LayerNormConfig::new(6).with_bias(false).init(&device());
        assert_eq!(no_bias.parameter_names(), vec!["weight".to_string()]);
    }
}
