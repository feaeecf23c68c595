//! Arithmetic-domain bit-integers: a fixed-length little-endian vector of
//! secret bits, with ring arithmetic lowered through the circuit kernels.

use super::{SecretBit, SecretInt};
use crate::circuits::{adders, cmp, mult};
use crate::error::{CompilerError, Result};
use crate::frontend::Frontend;
use crate::gates::ArithGates;

/// A secret integer held as individual bits, least significant first.
///
/// Produced by bit-decomposing a [`SecretInt`] or assembled from loose
/// bits. All arithmetic goes through the adder/multiplier circuits, so
/// cost is counted in secret multiplications rather than ring operations.
#[derive(Debug, Clone)]
pub struct BitInt {
    bits: Vec<SecretBit>,
}

impl BitInt {
    /// Decomposes a secret integer into its `n` low bits.
    pub fn from_secret(fe: &mut Frontend, v: &SecretInt, n: u32) -> Result<Self> {
        Ok(Self {
            bits: fe.bit_decompose(v, n)?,
        })
    }

    /// Wraps an existing bit sequence.
    pub fn from_bits(bits: Vec<SecretBit>) -> Result<Self> {
        if bits.is_empty() {
            return Err(CompilerError::Internal("empty bit-integer".into()));
        }
        Ok(Self { bits })
    }

    /// The bits, least significant first.
    pub fn bits(&self) -> &[SecretBit] {
        &self.bits
    }

    /// Bit width.
    pub fn n_bits(&self) -> u32 {
        self.bits.len() as u32
    }

    /// Recomposes into a native secret integer.
    pub fn to_secret(&self, fe: &mut Frontend) -> Result<SecretInt> {
        fe.bit_compose(&self.bits)
    }

    /// Wrapping addition at the wider operand's width.
    pub fn add(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let thr = fe.config().cla_threshold;
        let mut g = ArithGates::new(fe);
        let bits = adders::bit_adder(&mut g, &self.bits, &other.bits, None, false, thr)?;
        Self::from_bits(bits)
    }

    /// Addition with carry-out, one bit wider than the operands.
    pub fn add_with_carry(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let thr = fe.config().cla_threshold;
        let mut g = ArithGates::new(fe);
        let bits = adders::bit_adder(&mut g, &self.bits, &other.bits, None, true, thr)?;
        Self::from_bits(bits)
    }

    /// Wrapping two's-complement subtraction.
    pub fn sub(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let mut g = ArithGates::new(fe);
        let bits = adders::bit_subtractor(&mut g, &self.bits, &other.bits)?;
        Self::from_bits(bits)
    }

    /// Truncating multiplication at the wider operand's width.
    pub fn mul(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let thr = fe.config().cla_threshold;
        let mut g = ArithGates::new(fe);
        let bits = mult::bit_multiplier(&mut g, &self.bits, &other.bits, thr)?;
        Self::from_bits(bits)
    }

    /// Left shift by a constant, dropping high bits.
    pub fn shl(&self, fe: &mut Frontend, amount: u32) -> Result<Self> {
        let n = self.bits.len();
        let amount = (amount as usize).min(n);
        let mut bits = Vec::with_capacity(n);
        for _ in 0..amount {
            bits.push(SecretBit::constant(fe, false)?);
        }
        bits.extend_from_slice(&self.bits[..n - amount]);
        Self::from_bits(bits)
    }

    /// Logical right shift by a constant, filling with zeros.
    pub fn shr(&self, fe: &mut Frontend, amount: u32) -> Result<Self> {
        let n = self.bits.len();
        let amount = (amount as usize).min(n);
        let mut bits = self.bits[amount..].to_vec();
        for _ in 0..amount {
            bits.push(SecretBit::constant(fe, false)?);
        }
        Self::from_bits(bits)
    }

    /// Unsigned `self < other`.
    pub fn less_than(&self, fe: &mut Frontend, other: &Self) -> Result<SecretBit> {
        let mut g = ArithGates::new(fe);
        cmp::bit_less_than(&mut g, &self.bits, &other.bits)
    }

    /// Signed `self < other`: swapping the sign bits between the operands
    /// reduces signed order to the unsigned comparison.
    pub fn less_than_signed(&self, fe: &mut Frontend, other: &Self) -> Result<SecretBit> {
        let mut g = ArithGates::new(fe);
        let (mut a, mut b) = adders::pad_equal(&mut g, &self.bits, &other.bits)?;
        let top = a.len() - 1;
        std::mem::swap(&mut a[top], &mut b[top]);
        cmp::bit_less_than(&mut g, &a, &b)
    }

    /// Constant-round unsigned `self < other` via the highest differing
    /// bit.
    pub fn less_than_constant_round(&self, fe: &mut Frontend, other: &Self) -> Result<SecretBit> {
        let mut g = ArithGates::new(fe);
        cmp::highest_different_bit(&mut g, &self.bits, &other.bits, true)
    }

    /// Bitwise equality.
    pub fn equal(&self, fe: &mut Frontend, other: &Self) -> Result<SecretBit> {
        let mut g = ArithGates::new(fe);
        let (a, b) = adders::pad_equal(&mut g, &self.bits, &other.bits)?;
        let (_, ne) = cmp::bit_comparator(&mut g, &a, &b)?;
        ne.not(fe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;
    use crate::types::NumberOps;
    use mpc_ir::Op;

    fn setup() -> (Frontend, BitInt, BitInt) {
        let mut fe = Frontend::new(CompilerConfig::default());
        let x = SecretInt::input(&mut fe, 0).unwrap();
        let y = SecretInt::input(&mut fe, 1).unwrap();
        let a = BitInt::from_secret(&mut fe, &x, 8).unwrap();
        let b = BitInt::from_secret(&mut fe, &y, 8).unwrap();
        (fe, a, b)
    }

    #[test]
    fn add_keeps_width_and_carry_widens() {
        let (mut fe, a, b) = setup();
        assert_eq!(a.add(&mut fe, &b).unwrap().n_bits(), 8);
        assert_eq!(a.add_with_carry(&mut fe, &b).unwrap().n_bits(), 9);
    }

    #[test]
    fn decomposition_is_reused_across_operations() {
        let (mut fe, a, _) = setup();
        let x2 = BitInt::from_bits(a.bits().to_vec()).unwrap();
        a.add(&mut fe, &x2).unwrap();
        let decs = fe.tape().count_ops(|op| matches!(op, Op::BitDec { .. }));
        assert_eq!(decs, 2);
    }

    #[test]
    fn shifts_preserve_width_without_multiplications() {
        let (mut fe, a, _) = setup();
        let before = fe.tape().count_ops(|op| matches!(op, Op::Mul { .. }));
        let l = a.shl(&mut fe, 3).unwrap();
        let r = a.shr(&mut fe, 3).unwrap();
        let after = fe.tape().count_ops(|op| matches!(op, Op::Mul { .. }));
        assert_eq!(l.n_bits(), 8);
        assert_eq!(r.n_bits(), 8);
        assert_eq!(before, after);
    }

    #[test]
    fn round_trip_through_native_integer() {
        let (mut fe, a, _) = setup();
        let v = a.to_secret(&mut fe).unwrap();
        assert_eq!(v.size(), 1);
        let comps = fe
            .tape()
            .count_ops(|op| matches!(op, Op::BitCompose { .. }));
        assert_eq!(comps, 1);
    }

    #[test]
    fn comparisons_yield_single_bits() {
        let (mut fe, a, b) = setup();
        let lt = a.less_than(&mut fe, &b).unwrap();
        let slt = a.less_than_signed(&mut fe, &b).unwrap();
        let eq = a.equal(&mut fe, &b).unwrap();
        assert_eq!(lt.size(), 1);
        assert_eq!(slt.size(), 1);
        assert_eq!(eq.size(), 1);
    }
}
