//! Compiler configuration.

use serde::{Deserialize, Serialize};

/// How fixed-point products are reduced back to `f` fractional bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rounding {
    /// Probabilistic truncation: exact in expectation, cheapest in the
    /// underlying protocol.
    #[default]
    Probabilistic,
    /// Deterministic round-half-up.
    Nearest,
}

/// What happens when a fixed-point value may exceed its declared total
/// width `k`.
///
/// The original system silently truncated runtime values and only rejected
/// literal constants; that trade-off is kept available but made explicit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixOverflow {
    /// No checks at all; overflow wraps silently.
    Ignore,
    /// Reject out-of-range compile-time constants, trust runtime values.
    #[default]
    CheckConstants,
    /// Additionally compile runtime range guards that abort the running
    /// computation on overflow.
    CheckAll,
}

/// Tunables of the front-end.
///
/// Defaults match the original system: 64-bit ring, 40-bit statistical
/// security, probabilistic rounding, constants-only overflow checks,
/// bounds-checked containers, carry-lookahead above 122 bits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Bit length of the arithmetic ring/field the program runs over.
    pub ring_bits: u32,
    /// Statistical security parameter passed to non-linear primitives.
    pub security: u32,
    /// Fixed-point reduction mode.
    pub rounding: Rounding,
    /// Fixed-point overflow policy.
    pub fix_overflow: FixOverflow,
    /// Whether container accesses with dynamic indices compile runtime
    /// bounds guards. Compile-time indices are always checked.
    pub index_checks: bool,
    /// Operand bit length at which adders switch from carry-select to
    /// carry-lookahead. The default is the empirical crossover point.
    pub cla_threshold: u32,
    /// Default fractional bits for fixed-point values built without
    /// explicit precision.
    pub default_fix_f: u32,
    /// Default total bits for fixed-point values built without explicit
    /// precision.
    pub default_fix_k: u32,
    /// Default significand bits for floating-point values.
    pub float_vlen: u32,
    /// Default exponent bits for floating-point values.
    pub float_plen: u32,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            ring_bits: 64,
            security: 40,
            rounding: Rounding::default(),
            fix_overflow: FixOverflow::default(),
            index_checks: true,
            cla_threshold: 122,
            default_fix_f: 16,
            default_fix_k: 31,
            float_vlen: 24,
            float_plen: 8,
        }
    }
}
