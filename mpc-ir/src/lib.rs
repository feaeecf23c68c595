#![warn(missing_docs)]
//! Instruction layer for a batched secret-sharing virtual machine.
//!
//! The front-end crate lowers typed expressions into [`Tape`](tape::Tape)s of
//! vectorized instructions. Every instruction carries the batch width it was
//! emitted under, so one logical operation may act on many independent lanes
//! in lock-step. The VM itself (execution, networking, preprocessing) lives
//! outside this workspace; this crate only defines the contract the front-end
//! emits against: opcodes, register files, static memory and basic blocks.

/// Static memory addresses and the per-kind allocator.
pub mod mem;
/// Defines the vectorized bytecode for the MPC-VM.
pub mod op;
/// Register files and monotonic register allocation.
pub mod reg;
/// The per-region instruction sink and basic-block tokens.
pub mod tape;

pub use mem::{Address, MemError, MemPool};
pub use op::{AbortReason, Instr, Op};
pub use reg::{RegAlloc, RegId, RegKind};
pub use tape::{BlockId, Tape};
