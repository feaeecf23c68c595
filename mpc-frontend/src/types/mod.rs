//! The value-type lattice.
//!
//! One struct per kind; all register-based values carry the register of
//! their first lane and their batch width. Secret kinds additionally carry
//! an identity used to memoize bit decompositions. Conversions between
//! kinds are explicit named paths; there is no implicit cast across the
//! binary/arithmetic boundary.

mod bin;
mod bitint;
mod fixed;
mod float;
mod int;
mod personal;
mod quant;
mod traits;
mod value;

pub use bin::{ClearBin, SecretBin};
pub use bitint::BitInt;
pub use fixed::{ClearFix, SecretFix};
pub use float::SecretFloat;
pub use int::{ClearBit, ClearInt, Int64, SecretBit, SecretInt};
pub use personal::Personal;
pub use quant::{QuantParams, SecretQuant, UnreducedQuant, MAX_SUMMANDS};
pub use traits::{IntOps, NumberOps};
pub use value::Value;

/// Identity of a register-based value, used as a memoization key for bit
/// decomposition. Distinct from the register id: re-deriving a value into
/// new registers yields a new identity, so cached bits can never alias a
/// logically different value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueId(pub(crate) u64);
