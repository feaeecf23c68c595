//! Compile-time error taxonomy.
//!
//! Every error here aborts compilation of the enclosing tape; nothing is
//! caught internally. Conditions that depend on values only known during the
//! secure computation are not errors at this level, they compile into a
//! guarded abort instruction instead.

use mpc_ir::{Address, MemError, RegKind};

/// Errors raised while lowering typed expressions to instructions.
#[derive(Debug, thiserror::Error)]
pub enum CompilerError {
    /// Two kinds met in an operator without a declared coercion path.
    #[error("incompatible kinds in {op}: {lhs} and {rhs}")]
    TypeMismatch {
        /// Operator name.
        op: &'static str,
        /// Kind of the left operand.
        lhs: &'static str,
        /// Kind of the right operand.
        rhs: &'static str,
    },
    /// Fixed-point operands with unequal fractional precision and no
    /// explicit rescale.
    #[error("fixed-point precision mismatch: f={lhs} vs f={rhs} (rescale explicitly)")]
    PrecisionMismatch {
        /// Fractional bits of the left operand.
        lhs: u32,
        /// Fractional bits of the right operand.
        rhs: u32,
    },
    /// Batch widths that neither match nor broadcast.
    #[error("vector size mismatch: {lhs} vs {rhs}")]
    VectorMismatch {
        /// Batch width of the left operand.
        lhs: u32,
        /// Batch width of the right operand.
        rhs: u32,
    },
    /// Arithmetic between personal values of different parties.
    #[error("personal values belong to different parties: {lhs} and {rhs}")]
    OwnerMismatch {
        /// Owner of the left operand.
        lhs: u32,
        /// Owner of the right operand.
        rhs: u32,
    },
    /// A compile-time constant that does not fit the kind's declared width.
    #[error("constant {value} out of range for {kind} of {bits} bits")]
    ConstantRange {
        /// Offending constant, rendered as text.
        value: String,
        /// Target kind name.
        kind: &'static str,
        /// Declared bit width.
        bits: u32,
    },
    /// Division by a compile-time zero constant.
    #[error("division of {kind} by a constant zero")]
    DivisionByZero {
        /// Dividend kind name.
        kind: &'static str,
    },
    /// A compile-time container index outside the declared bounds.
    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds {
        /// Offending index.
        index: u64,
        /// Declared container length.
        length: u64,
    },
    /// Assignment with the wrong number of elements.
    #[error("expected {expected} elements, got {got}")]
    WrongElementCount {
        /// Declared element count.
        expected: u64,
        /// Provided element count.
        got: u64,
    },
    /// Access to a deleted container or memory value.
    #[error("access to deleted {what}")]
    DeletedAccess {
        /// Description of the deleted object.
        what: &'static str,
    },
    /// Access to address space before allocation.
    #[error("access to unallocated {kind:?} memory at {address}")]
    Unallocated {
        /// Memory kind.
        kind: RegKind,
        /// Offending address.
        address: Address,
    },
    /// Allocator misuse; always a compiler defect.
    #[error(transparent)]
    Mem(#[from] MemError),
    /// Invariant violation inside the compiler itself.
    #[error("internal compiler defect: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the front-end.
pub type Result<T, E = CompilerError> = std::result::Result<T, E>;
