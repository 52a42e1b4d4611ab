// ============================================================
// Layer 6: Infrastructure Layer
// ============================================================
// Everything that touches the file system or resolves a model id:
//
//   checkpoint.rs - checkpoint directory I/O
//                   Backbone and value-head records through Burn's
//                   NamedMpkGzFileRecorder, configs as JSON next
//                   to them.
//
//   registry.rs   - built-in tiny checkpoints addressable by id
//                   (tiny-random-gpt2, tiny-random-gpt-neox, ...)

/// Checkpoint directory saving and loading
pub mod checkpoint;

/// Registered model ids and their backbone configs
pub mod registry;
