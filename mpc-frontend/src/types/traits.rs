//! Capability interfaces of the lattice.
//!
//! `NumberOps` is what every numeric kind supports; the comparison-derived
//! operations (`min`/`max`/`abs`) and `pow_public` live here as default
//! methods so each kind only supplies its primitives. `IntOps` adds the
//! ring tricks that are valid on 0/1 values only.

use crate::error::{CompilerError, Result};
use crate::frontend::Frontend;

/// Arithmetic capability shared by all numeric kinds.
pub trait NumberOps: Sized + Clone {
    /// Kind name used in error messages.
    const KIND: &'static str;
    /// The single-bit kind this kind's comparisons return.
    type Cond: Clone;

    /// Batch width of this value.
    fn size(&self) -> u32;
    /// Addition.
    fn add(&self, fe: &mut Frontend, other: &Self) -> Result<Self>;
    /// Subtraction.
    fn sub(&self, fe: &mut Frontend, other: &Self) -> Result<Self>;
    /// Multiplication.
    fn mul(&self, fe: &mut Frontend, other: &Self) -> Result<Self>;
    /// Additive negation.
    fn neg(&self, fe: &mut Frontend) -> Result<Self>;
    /// Zero with this value's parameters and width.
    fn zero_like(&self, fe: &mut Frontend) -> Result<Self>;
    /// One with this value's parameters and width.
    fn one_like(&self, fe: &mut Frontend) -> Result<Self>;
    /// Less-than, yielding the comparison kind.
    fn lt(&self, fe: &mut Frontend, other: &Self) -> Result<Self::Cond>;
    /// Selects `t` where `cond` is 1, `f` where it is 0.
    fn select(fe: &mut Frontend, cond: &Self::Cond, t: &Self, f: &Self) -> Result<Self>;

    /// Squaring; kinds with a cheaper protocol primitive override this.
    fn square(&self, fe: &mut Frontend) -> Result<Self> {
        self.mul(fe, self)
    }

    /// Exponentiation by a public exponent, square-and-multiply.
    fn pow_public(&self, fe: &mut Frontend, mut e: u64) -> Result<Self> {
        if e == 0 {
            return self.one_like(fe);
        }
        let mut base = self.clone();
        let mut acc: Option<Self> = None;
        loop {
            if e & 1 == 1 {
                acc = Some(match acc {
                    Some(acc) => acc.mul(fe, &base)?,
                    None => base.clone(),
                });
            }
            e >>= 1;
            if e == 0 {
                break;
            }
            base = base.square(fe)?;
        }
        acc.ok_or_else(|| CompilerError::Internal("exponent without set bits".into()))
    }

    /// Minimum, from comparison and select.
    fn min(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let c = self.lt(fe, other)?;
        Self::select(fe, &c, self, other)
    }

    /// Maximum, from comparison and select.
    fn max(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let c = self.lt(fe, other)?;
        Self::select(fe, &c, other, self)
    }

    /// Absolute value, from comparison against zero and select.
    fn abs(&self, fe: &mut Frontend) -> Result<Self> {
        let zero = self.zero_like(fe)?;
        let c = self.lt(fe, &zero)?;
        let negated = self.neg(fe)?;
        Self::select(fe, &c, &negated, self)
    }

    /// Sum of a non-empty slice.
    fn sum(fe: &mut Frontend, xs: &[Self]) -> Result<Self> {
        let (first, rest) = xs
            .split_first()
            .ok_or_else(|| CompilerError::Internal("sum over empty slice".into()))?;
        let mut acc = first.clone();
        for x in rest {
            acc = acc.add(fe, x)?;
        }
        Ok(acc)
    }

    /// Inner product of two equally long slices.
    ///
    /// The default multiplies pairwise and folds; kinds with a deferred
    /// reduction (fixed point) override it to reduce once at the end.
    fn dot_product(fe: &mut Frontend, xs: &[Self], ys: &[Self]) -> Result<Self> {
        if xs.len() != ys.len() || xs.is_empty() {
            return Err(CompilerError::WrongElementCount {
                expected: xs.len() as u64,
                got: ys.len() as u64,
            });
        }
        let mut acc = xs[0].mul(fe, &ys[0])?;
        for (x, y) in xs.iter().zip(ys).skip(1) {
            let p = x.mul(fe, y)?;
            acc = acc.add(fe, &p)?;
        }
        Ok(acc)
    }
}

/// Ring tricks valid on values guaranteed to be 0 or 1, plus the
/// conditional operations built from them. Arithmetic-domain integers get
/// their logical operators this way; the binary domain has native gates
/// instead.
pub trait IntOps: NumberOps {
    /// `cond * (t - f) + f`, one multiplication. The receiver is the
    /// condition and must be 0/1.
    fn if_else(&self, fe: &mut Frontend, t: &Self, f: &Self) -> Result<Self> {
        let d = t.sub(fe, f)?;
        let cd = self.mul(fe, &d)?;
        f.add(fe, &cd)
    }

    /// Swaps the pair iff the receiver (0/1) is 1, with one multiplication.
    fn cond_swap(&self, fe: &mut Frontend, a: &Self, b: &Self) -> Result<(Self, Self)> {
        let d = b.sub(fe, a)?;
        let p = self.mul(fe, &d)?;
        Ok((a.add(fe, &p)?, b.sub(fe, &p)?))
    }

    /// XOR on 0/1 values: `a + b - 2ab`.
    fn bit_xor(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let ab = self.mul(fe, other)?;
        let s = self.add(fe, other)?;
        let two_ab = ab.add(fe, &ab)?;
        s.sub(fe, &two_ab)
    }

    /// OR on 0/1 values: `a + b - ab`.
    fn bit_or(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let ab = self.mul(fe, other)?;
        let s = self.add(fe, other)?;
        s.sub(fe, &ab)
    }

    /// AND on 0/1 values: `ab`.
    fn bit_and(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        self.mul(fe, other)
    }

    /// NOT on a 0/1 value: `1 - a`.
    fn bit_not(&self, fe: &mut Frontend) -> Result<Self> {
        let one = self.one_like(fe)?;
        one.sub(fe, self)
    }

    /// Sum and carry of two 0/1 values.
    fn half_adder(&self, fe: &mut Frontend, other: &Self) -> Result<(Self, Self)> {
        let s = self.bit_xor(fe, other)?;
        let c = self.bit_and(fe, other)?;
        Ok((s, c))
    }
}
