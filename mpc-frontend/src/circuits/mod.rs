//! Bit-circuit kernels, generic over the [`BitGates`](crate::gates::BitGates)
//! gate set.
//!
//! Bits are least-significant first throughout. Every kernel zero-pads or
//! rejects unequal operand lengths at its boundary, and returns exactly
//! `n` bits, or `n + 1` when a carry-out is requested.

pub mod adders;
pub mod cmp;
pub mod mult;
pub mod prefix;
