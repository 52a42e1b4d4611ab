// ============================================================
// Layer 2: Application / Use Cases
// ============================================================
// Each use case wires the registry, checkpoint and ml layers
// together for one CLI command:
//
//   init_use_case.rs      - wrap a backbone, save the result
//   inspect_use_case.rs   - list named parameters of a model
//   generate_use_case.rs  - decode from a prompt and score it
//   reference_use_case.rs - build a reference model, report sharing
//
// Rules for this layer:
//   - No tensor math here
//   - No printing here (that's Layer 1)
//   - Library errors become anyhow errors with context

/// Backend used by the command line; autodiff so `requires_grad`
/// is meaningful when reporting frozen parameters.
pub type AppBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Backend for decoding; without autodiff, dropout is inactive and
/// greedy decoding of a registry id is reproducible.
pub type InferBackend = burn::backend::Wgpu;

pub mod init_use_case;

pub mod inspect_use_case;

pub mod generate_use_case;

pub mod reference_use_case;
