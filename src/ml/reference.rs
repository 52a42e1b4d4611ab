// ============================================================
// Layer 5: Reference Model Factory
// ============================================================
// A reference model is a frozen snapshot of the policy, used as a
// fixed comparison point (e.g. for a KL penalty) while the policy
// trains.
//
//   1. Layers: block names are matched against a layer pattern,
//      which must select whole blocks. `num_shared_layers` is
//      clamped to the block count.
//   2. Deep copy: the whole model is recorded to bytes and loaded
//      back, which allocates fresh storage for every parameter.
//   3. Aliasing: for every block with index < num_shared_layers the
//      copy is replaced by a clone of the source's block, and both
//      sides are frozen. A burn module clone points at the same
//      tensors, but burn tensors are immutable: an update builds a
//      new tensor and never shows up in the other model. The two
//      models agree on those blocks only because neither can
//      update them.
//
// Non-block parameters (embeddings, final norm, heads) are always
// copied.

use burn::{
    prelude::*,
    record::{BinBytesRecorder, FullPrecisionSettings, Recorder},
};

use crate::domain::error::{ModelError, ModelResult};
use crate::domain::naming::{is_under, layer_prefix, resolve_layer_pattern};
use crate::ml::params::NamedParameters;
use crate::ml::value_head::ValueHeadModel;

/// A frozen copy of a model plus a description of what it shares.
pub struct ReferenceModel<B: Backend> {
    pub model:             ValueHeadModel<B>,
    /// Blocks aliased with the source, after clamping
    pub shared_layers:     usize,
    /// Block count of the model; None when nothing was shared
    pub total_layers:      Option<usize>,
    /// The layer pattern that matched; None when nothing was shared
    pub pattern:           Option<String>,
    /// Names of the parameters aliased with the source
    pub shared_parameters: Vec<String>,
}

impl<B: Backend> ReferenceModel<B> {
    pub fn into_model(self) -> ValueHeadModel<B> {
        self.model
    }
}

/// Create a frozen reference copy of `model` whose first
/// `num_shared_layers` blocks are aliased with `model`.
///
/// `pattern` names the blocks, e.g. `"transformer.h.{layer}"`; when
/// absent the known naming schemes are tried. A pattern selecting
/// only part of each block is rejected with `InvalidOption`. The
/// shared blocks of `model` itself are frozen.
pub fn create_reference_model<B: Backend>(
    model:             &mut ValueHeadModel<B>,
    num_shared_layers: usize,
    pattern:           Option<&str>,
) -> ModelResult<ReferenceModel<B>> {
    if num_shared_layers == 0 {
        tracing::info!("Created independent reference model");
        return Ok(ReferenceModel {
            model:             deep_copy(model)?.no_grad(),
            shared_layers:     0,
            total_layers:      None,
            pattern:           None,
            shared_parameters: Vec::new(),
        });
    }

    let names = model.parameter_names();
    let (pattern, _) = resolve_layer_pattern(&names, pattern)?;
    let total_layers = model.pretrained_model.num_layers();
    let block_pattern = model.pretrained_model.config().architecture.names().layer_pattern();
    if !selects_whole_blocks(&names, &pattern, &block_pattern, total_layers) {
        return Err(ModelError::InvalidOption(format!(
            "layer pattern '{pattern}' does not select whole blocks (expected '{block_pattern}')"
        )));
    }
    if num_shared_layers > total_layers {
        tracing::warn!(
            "num_shared_layers={} exceeds the {} layers of the model, sharing all of them",
            num_shared_layers, total_layers
        );
    }
    let shared_layers = num_shared_layers.min(total_layers);

    let mut reference = deep_copy(model)?.no_grad();
    let source_blocks    = model.pretrained_model.transformer.blocks.iter_mut();
    let reference_blocks = reference.pretrained_model.transformer.blocks.iter_mut();
    for (source_block, reference_block) in source_blocks.zip(reference_blocks).take(shared_layers) {
        let frozen = source_block.clone().no_grad();
        *reference_block = frozen.clone();
        *source_block = frozen;
    }

    let prefixes: Vec<String> = (0..shared_layers)
        .map(|layer| layer_prefix(&pattern, layer))
        .collect();
    let shared_parameters: Vec<String> = names
        .into_iter()
        .filter(|name| prefixes.iter().any(|prefix| is_under(name, prefix)))
        .collect();

    tracing::info!(
        "Created reference model sharing {}/{} layers ({} parameters) via '{}'",
        shared_layers, total_layers, shared_parameters.len(), pattern
    );

    Ok(ReferenceModel {
        model: reference,
        shared_layers,
        total_layers: Some(total_layers),
        pattern: Some(pattern),
        shared_parameters,
    })
}

/// True when, for every block, `pattern` selects exactly the
/// parameters that `block_pattern` does.
fn selects_whole_blocks(names: &[String], pattern: &str, block_pattern: &str, layers: usize) -> bool {
    (0..=layers).all(|layer| {
        let selected = layer_prefix(pattern, layer);
        let block    = layer_prefix(block_pattern, layer);
        names.iter().all(|name| is_under(name, &selected) == is_under(name, &block))
    })
}

/// Structural clone with freshly allocated storage for every parameter.
fn deep_copy<B: Backend>(model: &ValueHeadModel<B>) -> ModelResult<ValueHeadModel<B>> {
    let device   = model.device();
    let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
    let bytes    = recorder.record(model.clone().into_record(), ())?;
    let record   = recorder.load(bytes, &device)?;
    Ok(model.clone().load_record(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::optim::{AdamWConfig, GradientsParams, Optimizer};

    use crate::domain::error::ModelError;
    use crate::infra::registry::TINY_RANDOM_GPT2;
    use crate::ml::test_utils::{device, input_ids, TestBackend};
    use crate::ml::value_head::ValueHeadConfig;

    const LAYER_FORMAT: &str = "pretrained_model.transformer.h.{layer}.attn.c_attn.weight";

    fn layer(index: usize) -> String {
        LAYER_FORMAT.replace("{layer}", &index.to_string())
    }

    fn setup() -> ValueHeadModel<TestBackend> {
        ValueHeadModel::from_pretrained(TINY_RANDOM_GPT2, &ValueHeadConfig::new(), &device()).unwrap()
    }

    fn values(model: &ValueHeadModel<TestBackend>, name: &str) -> Vec<f32> {
        model.get_parameter(name).unwrap().values()
    }

    /// One AdamW step with lr = 1 on the causal-LM loss.
    fn optimizer_step(model: ValueHeadModel<TestBackend>) -> ValueHeadModel<TestBackend> {
        let mut optim = AdamWConfig::new().init();
        let ids = input_ids(&[[0, 1, 2, 3]]);
        let loss = model.forward(ids.clone(), Some(ids)).unwrap().loss.unwrap();
        let grads = GradientsParams::from_grads(loss.backward(), &model);
        optim.step(1.0, model, grads)
    }

    #[test]
    fn test_independent_reference() {
        let mut model = setup();
        let reference = create_reference_model(&mut model, 0, None).unwrap().into_model();

        let first_before = values(&model, &layer(0));
        let last_before  = values(&model, &layer(4));
        let first_ref_before = values(&reference, &layer(0));
        let last_ref_before  = values(&reference, &layer(4));

        let model = optimizer_step(model);

        // before optimisation ref and model are identical
        assert_eq!(first_before, first_ref_before);
        assert_eq!(last_before, last_ref_before);
        // ref model stays identical after optimisation
        assert_eq!(first_ref_before, values(&reference, &layer(0)));
        assert_eq!(last_ref_before, values(&reference, &layer(4)));
        // optimised model changes
        assert_ne!(first_before, values(&model, &layer(0)));
        assert_ne!(last_before, values(&model, &layer(4)));
    }

    #[test]
    fn test_independent_reference_matches_every_parameter() {
        let mut model = setup();
        let reference = create_reference_model(&mut model, 0, None).unwrap().into_model();
        let source = model.named_parameters();
        let copied = reference.named_parameters();
        assert_eq!(source.len(), copied.len());
        for (a, b) in source.iter().zip(&copied) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.values(), b.values(), "{}", a.name);
        }
    }

    #[test]
    fn test_shared_layers() {
        let mut model = setup();
        let reference = create_reference_model(&mut model, 1, None).unwrap().into_model();

        let first_before  = values(&model, &layer(0));
        let second_before = values(&model, &layer(1));
        let first_ref_before  = values(&reference, &layer(0));
        let second_ref_before = values(&reference, &layer(1));

        let model = optimizer_step(model);

        // before optimisation ref and model are identical
        assert_eq!(first_before, first_ref_before);
        assert_eq!(second_before, second_ref_before);
        // ref model stays identical after optimisation
        assert_eq!(first_ref_before, values(&reference, &layer(0)));
        assert_eq!(second_ref_before, values(&reference, &layer(1)));
        // first layer of optimised model stays the same
        assert_eq!(first_before, values(&model, &layer(0)));
        // other layers in optimised model change
        assert_ne!(second_before, values(&model, &layer(1)));
    }

    #[test]
    fn test_reference_is_frozen() {
        let mut model = setup();
        let reference = create_reference_model(&mut model, 2, None).unwrap();
        assert!(reference.model.is_frozen());
        assert!(!model.is_frozen());
    }

    #[test]
    fn test_shared_layers_frozen_in_source() {
        let mut model = setup();
        create_reference_model(&mut model, 2, None).unwrap();
        for param in model.named_parameters() {
            let shared = param.name.contains(".h.0.") || param.name.contains(".h.1.");
            assert_eq!(param.requires_grad, !shared, "{}", param.name);
        }
    }

    #[test]
    fn test_shared_parameter_report() {
        let mut model = setup();
        let reference = create_reference_model(&mut model, 1, None).unwrap();
        assert_eq!(reference.shared_layers, 1);
        assert_eq!(reference.total_layers, Some(5));
        assert_eq!(reference.pattern.as_deref(), Some("transformer.h.{layer}"));
        assert!(reference.shared_parameters.contains(&layer(0)));
        assert!(!reference.shared_parameters.contains(&layer(1)));
        assert!(reference
            .shared_parameters
            .iter()
            .all(|name| name.starts_with("pretrained_model.transformer.h.0.")));
    }

    #[test]
    fn test_shared_layers_clamped() {
        let mut model = setup();
        let reference = create_reference_model(&mut model, 100, None).unwrap();
        assert_eq!(reference.shared_layers, 5);
        assert!(model
            .named_parameters()
            .iter()
            .filter(|p| p.name.contains(".h."))
            .all(|p| !p.requires_grad));
        // embeddings and heads are never shared
        assert!(model.get_parameter("pretrained_model.transformer.wte.weight").unwrap().requires_grad);
        assert!(model.get_parameter("v_head.summary.weight").unwrap().requires_grad);
    }

    #[test]
    fn test_explicit_pattern() {
        let mut model = setup();
        let reference =
            create_reference_model(&mut model, 2, Some("transformer.h.{layer}")).unwrap();
        assert_eq!(reference.shared_layers, 2);
    }

    #[test]
    fn test_explicit_pattern_with_model_prefix() {
        let mut model = setup();
        let reference =
            create_reference_model(&mut model, 1, Some("pretrained_model.transformer.h.{layer}")).unwrap();
        assert_eq!(reference.shared_layers, 1);
        assert!(reference.shared_parameters.contains(&layer(0)));
    }

    #[test]
    fn test_partial_block_pattern_rejected() {
        let mut model = setup();
        let result = create_reference_model(&mut model, 1, Some("transformer.h.{layer}.mlp"));
        assert!(matches!(result, Err(ModelError::InvalidOption(_))));
        // nothing in the source was frozen
        assert!(model.named_parameters().iter().all(|p| p.requires_grad));
    }

    #[test]
    fn test_report_matches_frozen_parameters() {
        let mut model = setup();
        let reference = create_reference_model(&mut model, 2, None).unwrap();
        let frozen: Vec<String> = model
            .named_parameters()
            .into_iter()
            .filter(|p| !p.requires_grad)
            .map(|p| p.name)
            .collect();
        assert_eq!(frozen, reference.shared_parameters);
    }

    #[test]
    fn test_layer_not_found() {
        let mut model = setup();
        let result = create_reference_model(&mut model, 1, Some("model.decoder.layers.{layer}"));
        assert!(matches!(result, Err(ModelError::LayerNotFound { .. })));
        // a failed call leaves the source untouched
        assert!(!model.is_frozen());
        assert!(model.get_parameter(&layer(0)).unwrap().requires_grad);
    }
}
