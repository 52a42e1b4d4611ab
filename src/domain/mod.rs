// ============================================================
// Layer 3: Domain Layer
// ============================================================
// Plain Rust types that describe the system independently of
// the tensor framework:
//
//   error.rs      - the error taxonomy shared by every layer
//   naming.rs     - architecture families, parameter names and
//                   layer patterns used to introspect blocks
//   value_head.rs - value-head options and dropout precedence
//   generation.rs - decoding options for `generate`
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, functions and errors

/// ModelError and its variants
pub mod error;

/// Architecture families, parameter names, layer patterns
pub mod naming;

/// Value-head options and dropout resolution
pub mod value_head;

/// Options for autoregressive decoding
pub mod generation;
