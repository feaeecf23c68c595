#![warn(missing_docs)]
//! Typed front-end for a batched secret-sharing virtual machine.
//!
//! The crate compiles typed expressions over secret and clear values into
//! [`mpc_ir`] instruction tapes. Everything threads through one
//! [`Frontend`](frontend::Frontend): the value-kind lattice in [`types`]
//! (integers, bits, binary-field elements, fixed point, floating point,
//! quantized integers, player-local values), the generic bit-circuit
//! kernels in [`circuits`], and the memory-backed containers in [`mem`].
//! The VM that executes the tapes (protocols, networking, preprocessing)
//! lives outside this workspace.

/// Adders, comparators, prefix scans and the Wallace-tree multiplier.
pub mod circuits;
/// Compiler configuration: ring width, rounding, overflow policy.
pub mod config;
/// Scoped execution context (batch width, domain, bit length).
pub mod context;
/// The compile-time error taxonomy.
pub mod error;
/// The compilation driver.
pub mod frontend;
/// The generic single-bit gate interface.
pub mod gates;
/// Memory-backed containers: arrays, matrices, persistent slots.
pub mod mem;
/// The value-kind lattice and the mixed-kind operator surface.
pub mod types;

pub use config::{CompilerConfig, FixOverflow, Rounding};
pub use error::{CompilerError, Result};
pub use frontend::Frontend;
pub use types::Value;
