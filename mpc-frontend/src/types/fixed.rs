//! Fixed-point kinds: a ring integer `v` interpreted as `v / 2^f`, with
//! `k` total bits of which `f` are fractional.
//!
//! Precision is part of the type: adding values of unequal `f` is a
//! compile-time error, never a silent rescale. Only construction from a
//! compile-time float rescales, and range-checks the scaled constant per
//! the configured overflow policy.

use mpc_ir::{AbortReason, Op};
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use crate::config::FixOverflow;
use crate::error::{CompilerError, Result};
use crate::frontend::Frontend;
use crate::types::{ClearInt, IntOps, NumberOps, SecretBit, SecretInt};

fn scale_literal(value: f64, f: u32) -> BigInt {
    let scaled = (value * 2f64.powi(f as i32)).round();
    BigInt::from(scaled as i128)
}

fn check_fix_const(fe: &Frontend, value: &BigInt, k: u32, kind: &'static str) -> Result<()> {
    match fe.config().fix_overflow {
        FixOverflow::Ignore => Ok(()),
        FixOverflow::CheckConstants | FixOverflow::CheckAll => {
            fe.check_const_range(value, k, kind)
        }
    }
}

/// Compiles a runtime range assertion `-2^k <= v < 2^k` that halts the
/// running computation on violation. Costs a reveal, so only emitted under
/// the check-all overflow policy.
fn runtime_range_guard(fe: &mut Frontend, v: &SecretInt, k: u32) -> Result<()> {
    fe.with_bit_length(k + 2, |fe| {
        let bound = BigInt::one() << k;
        let off = ClearInt::from_const(fe, bound.clone())?;
        // in range iff 0 <= shifted < 2^(k+1)
        let shifted = v.add_clear(fe, &off)?;
        let zero = SecretInt::from_const(fe, 0)?;
        let below = shifted.lt(fe, &zero)?;
        let hi = SecretInt::from_const(fe, bound << 1)?;
        let above = hi.le(fe, &shifted)?;
        let bad = below.or(fe, &above)?;
        let bad_int = SecretInt::from_bit(fe, &bad)?;
        let revealed = bad_int.reveal(fe)?;
        fe.emit_sized(
            revealed.size,
            Op::CondAbort {
                cond: revealed.reg,
                reason: AbortReason::FixOverflow,
            },
        );
        Ok(())
    })
}

/// Clear fixed-point value.
///
/// Tracks the scaled integer constant when it is known at compile time, so
/// a later division or multiplication can fold or strength-reduce it.
#[derive(Clone, Debug)]
pub struct ClearFix {
    v: ClearInt,
    k: u32,
    f: u32,
    literal: Option<BigInt>,
}

impl ClearFix {
    /// From a compile-time float, scaled by `2^f` and range-checked.
    pub fn from_f64(fe: &mut Frontend, value: f64, k: u32, f: u32) -> Result<Self> {
        let scaled = scale_literal(value, f);
        check_fix_const(fe, &scaled, k, Self::KIND)?;
        let v = ClearInt::from_const(fe, scaled.clone())?;
        Ok(Self {
            v,
            k,
            f,
            literal: Some(scaled),
        })
    }

    /// From a compile-time float at the configured default precision.
    pub fn from_f64_default(fe: &mut Frontend, value: f64) -> Result<Self> {
        let (k, f) = (fe.config().default_fix_k, fe.config().default_fix_f);
        Self::from_f64(fe, value, k, f)
    }

    /// From a clear integer, scaled up by `2^f`.
    pub fn from_int(fe: &mut Frontend, value: &ClearInt, k: u32, f: u32) -> Result<Self> {
        let v = value.shl(fe, f)?;
        Ok(Self {
            v,
            k,
            f,
            literal: None,
        })
    }

    pub(crate) fn from_raw(v: ClearInt, k: u32, f: u32) -> Self {
        Self {
            v,
            k,
            f,
            literal: None,
        }
    }

    /// The scaled integer register.
    pub fn raw(&self) -> &ClearInt {
        &self.v
    }

    /// Total bits.
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Fractional bits.
    pub fn f(&self) -> u32 {
        self.f
    }

    /// The scaled integer constant, when known at compile time.
    pub fn literal(&self) -> Option<&BigInt> {
        self.literal.as_ref()
    }

    fn check_parity(&self, other: &Self) -> Result<()> {
        if self.f != other.f {
            return Err(CompilerError::PrecisionMismatch {
                lhs: self.f,
                rhs: other.f,
            });
        }
        Ok(())
    }
}

impl NumberOps for ClearFix {
    const KIND: &'static str = "clear fixed point";
    type Cond = super::ClearBit;

    fn size(&self) -> u32 {
        self.v.size()
    }

    fn add(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        self.check_parity(other)?;
        let v = self.v.add(fe, &other.v)?;
        let literal = match (&self.literal, &other.literal) {
            (Some(a), Some(b)) => Some(a + b),
            _ => None,
        };
        Ok(Self {
            v,
            k: self.k.max(other.k),
            f: self.f,
            literal,
        })
    }

    fn sub(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        self.check_parity(other)?;
        let v = self.v.sub(fe, &other.v)?;
        let literal = match (&self.literal, &other.literal) {
            (Some(a), Some(b)) => Some(a - b),
            _ => None,
        };
        Ok(Self {
            v,
            k: self.k.max(other.k),
            f: self.f,
            literal,
        })
    }

    fn mul(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        self.check_parity(other)?;
        let raw = self.v.mul(fe, &other.v)?;
        let v = raw.shr(fe, self.f)?;
        let literal = match (&self.literal, &other.literal) {
            (Some(a), Some(b)) => Some((a * b) >> self.f),
            _ => None,
        };
        Ok(Self {
            v,
            k: self.k.max(other.k),
            f: self.f,
            literal,
        })
    }

    fn neg(&self, fe: &mut Frontend) -> Result<Self> {
        let v = self.v.neg(fe)?;
        Ok(Self {
            v,
            k: self.k,
            f: self.f,
            literal: self.literal.as_ref().map(|l| -l),
        })
    }

    fn zero_like(&self, fe: &mut Frontend) -> Result<Self> {
        Self::from_f64(fe, 0.0, self.k, self.f)
    }

    fn one_like(&self, fe: &mut Frontend) -> Result<Self> {
        Self::from_f64(fe, 1.0, self.k, self.f)
    }

    fn lt(&self, fe: &mut Frontend, other: &Self) -> Result<Self::Cond> {
        self.check_parity(other)?;
        fe.with_bit_length(self.k, |fe| self.v.lt(fe, &other.v))
    }

    fn select(fe: &mut Frontend, cond: &Self::Cond, t: &Self, f: &Self) -> Result<Self> {
        t.check_parity(f)?;
        let ci = cond.to_clear_int();
        let d = t.v.sub(fe, &f.v)?;
        let cd = ci.mul(fe, &d)?;
        let v = f.v.add(fe, &cd)?;
        Ok(Self {
            v,
            k: t.k.max(f.k),
            f: t.f,
            literal: None,
        })
    }
}

/// Secret fixed-point value.
#[derive(Clone, Debug)]
pub struct SecretFix {
    v: SecretInt,
    k: u32,
    f: u32,
}

impl SecretFix {
    /// Secret holding a compile-time float, scaled by `2^f` and
    /// range-checked per the overflow policy.
    pub fn from_f64(fe: &mut Frontend, value: f64, k: u32, f: u32) -> Result<Self> {
        let scaled = scale_literal(value, f);
        check_fix_const(fe, &scaled, k, Self::KIND)?;
        let v = SecretInt::from_const(fe, scaled)?;
        Ok(Self { v, k, f })
    }

    /// From a compile-time float at the configured default precision.
    pub fn from_f64_default(fe: &mut Frontend, value: f64) -> Result<Self> {
        let (k, f) = (fe.config().default_fix_k, fe.config().default_fix_f);
        Self::from_f64(fe, value, k, f)
    }

    /// From a secret integer, scaled up by `2^f`.
    pub fn from_int(fe: &mut Frontend, value: &SecretInt, k: u32, f: u32) -> Result<Self> {
        let v = value.shl(fe, f)?;
        Ok(Self { v, k, f })
    }

    /// Promotes a clear fixed-point value by trivial sharing.
    pub fn from_clear(fe: &mut Frontend, value: &ClearFix) -> Result<Self> {
        let v = SecretInt::from_clear(fe, value.raw())?;
        Ok(Self {
            v,
            k: value.k(),
            f: value.f(),
        })
    }

    /// Secret fixed-point input provided by one party, pre-scaled.
    pub fn input(fe: &mut Frontend, party: u32, k: u32, f: u32) -> Result<Self> {
        let v = SecretInt::input(fe, party)?;
        Ok(Self { v, k, f })
    }

    pub(crate) fn from_raw(v: SecretInt, k: u32, f: u32) -> Self {
        Self { v, k, f }
    }

    /// The scaled integer register.
    pub fn raw(&self) -> &SecretInt {
        &self.v
    }

    /// Total bits.
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Fractional bits.
    pub fn f(&self) -> u32 {
        self.f
    }

    /// Opens the value to all parties.
    pub fn reveal(&self, fe: &mut Frontend) -> Result<ClearFix> {
        let v = self.v.reveal(fe)?;
        Ok(ClearFix::from_raw(v, self.k, self.f))
    }

    /// Truncates the fraction away, yielding the integer part.
    pub fn to_int(&self, fe: &mut Frontend) -> Result<SecretInt> {
        fe.with_bit_length(self.k, |fe| self.v.shr(fe, self.f))
    }

    fn check_parity(&self, other_k: u32, other_f: u32) -> Result<()> {
        if self.f != other_f {
            return Err(CompilerError::PrecisionMismatch {
                lhs: self.f,
                rhs: other_f,
            });
        }
        let _ = other_k;
        Ok(())
    }

    /// Truncates a double-width product back to `f` fractional bits and
    /// applies the overflow policy.
    fn reduce_product(&self, fe: &mut Frontend, raw: SecretInt, k: u32) -> Result<Self> {
        let v = fe.with_bit_length(k + self.f, |fe| raw.shr(fe, self.f))?;
        let res = Self {
            v,
            k,
            f: self.f,
        };
        if fe.config().fix_overflow == FixOverflow::CheckAll {
            runtime_range_guard(fe, &res.v, k)?;
        }
        Ok(res)
    }

    /// Addition with a clear fixed-point operand (linear).
    pub fn add_clear(&self, fe: &mut Frontend, other: &ClearFix) -> Result<Self> {
        self.check_parity(other.k(), other.f())?;
        let v = self.v.add_clear(fe, other.raw())?;
        Ok(Self {
            v,
            k: self.k.max(other.k()),
            f: self.f,
        })
    }

    /// Multiplication by a clear fixed-point operand (linear, then one
    /// truncation).
    pub fn mul_clear(&self, fe: &mut Frontend, other: &ClearFix) -> Result<Self> {
        self.check_parity(other.k(), other.f())?;
        let raw = self.v.mul_clear(fe, other.raw())?;
        self.reduce_product(fe, raw, self.k.max(other.k()))
    }

    /// Secret fixed-point division via the division protocol.
    pub fn div(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        self.check_parity(other.k, other.f)?;
        let k = self.k.max(other.k);
        let f = self.f;
        fe.with_broadcast(self.v.size(), other.v.size(), |fe| {
            let dest = fe.alloc(mpc_ir::RegKind::Secret);
            fe.emit(Op::FixDiv {
                dest,
                a: self.v.reg(),
                b: other.v.reg(),
                k,
                f,
            });
            let size = fe.ctx().vector_size();
            Ok(Self {
                v: SecretInt::from_reg(fe, dest, size),
                k,
                f,
            })
        })
    }

    /// Division by a clear fixed-point value. A compile-time power-of-two
    /// divisor strength-reduces to a shift; a constant zero is rejected.
    pub fn div_clear(&self, fe: &mut Frontend, other: &ClearFix) -> Result<Self> {
        self.check_parity(other.k(), other.f())?;
        if let Some(lit) = other.literal() {
            if lit.is_zero() {
                return Err(CompilerError::DivisionByZero { kind: Self::KIND });
            }
            let magnitude = lit.abs();
            let p = magnitude.bits() - 1;
            if magnitude == BigInt::one() << p {
                // divisor value is 2^(p - f)
                let v = if p as u32 >= self.f {
                    fe.with_bit_length(self.k, |fe| self.v.shr(fe, p as u32 - self.f))?
                } else {
                    self.v.shl(fe, self.f - p as u32)?
                };
                let v = if lit.is_negative() { v.neg(fe)? } else { v };
                return Ok(Self {
                    v,
                    k: self.k,
                    f: self.f,
                });
            }
        }
        let promoted = Self::from_clear(fe, other)?;
        self.div(fe, &promoted)
    }
}

impl NumberOps for SecretFix {
    const KIND: &'static str = "secret fixed point";
    type Cond = SecretBit;

    fn size(&self) -> u32 {
        self.v.size()
    }

    fn add(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        self.check_parity(other.k, other.f)?;
        let v = self.v.add(fe, &other.v)?;
        Ok(Self {
            v,
            k: self.k.max(other.k),
            f: self.f,
        })
    }

    fn sub(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        self.check_parity(other.k, other.f)?;
        let v = self.v.sub(fe, &other.v)?;
        Ok(Self {
            v,
            k: self.k.max(other.k),
            f: self.f,
        })
    }

    fn mul(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        self.check_parity(other.k, other.f)?;
        let raw = self.v.mul(fe, &other.v)?;
        self.reduce_product(fe, raw, self.k.max(other.k))
    }

    fn neg(&self, fe: &mut Frontend) -> Result<Self> {
        let v = self.v.neg(fe)?;
        Ok(Self {
            v,
            k: self.k,
            f: self.f,
        })
    }

    fn zero_like(&self, fe: &mut Frontend) -> Result<Self> {
        Self::from_f64(fe, 0.0, self.k, self.f)
    }

    fn one_like(&self, fe: &mut Frontend) -> Result<Self> {
        Self::from_f64(fe, 1.0, self.k, self.f)
    }

    fn lt(&self, fe: &mut Frontend, other: &Self) -> Result<SecretBit> {
        self.check_parity(other.k, other.f)?;
        fe.with_bit_length(self.k, |fe| self.v.lt(fe, &other.v))
    }

    fn select(fe: &mut Frontend, cond: &SecretBit, t: &Self, f: &Self) -> Result<Self> {
        t.check_parity(f.k, f.f)?;
        let v = cond.select_int(fe, &t.v, &f.v)?;
        Ok(Self {
            v,
            k: t.k.max(f.k),
            f: t.f,
        })
    }

    /// Deferred reduction: sums the unreduced double-width products and
    /// truncates once at the end.
    fn dot_product(fe: &mut Frontend, xs: &[Self], ys: &[Self]) -> Result<Self> {
        if xs.len() != ys.len() || xs.is_empty() {
            return Err(CompilerError::WrongElementCount {
                expected: xs.len() as u64,
                got: ys.len() as u64,
            });
        }
        let mut acc = xs[0].v.mul(fe, &ys[0].v)?;
        for (x, y) in xs.iter().zip(ys).skip(1) {
            xs[0].check_parity(x.k, x.f)?;
            xs[0].check_parity(y.k, y.f)?;
            let p = x.v.mul(fe, &y.v)?;
            acc = acc.add(fe, &p)?;
        }
        let headroom = 64 - (xs.len() as u64).leading_zeros();
        let k = xs[0].k + headroom;
        xs[0].reduce_product(fe, acc, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompilerConfig, Rounding};
    use num_traits::ToPrimitive;

    fn fe_with(fix_overflow: FixOverflow) -> Frontend {
        Frontend::new(CompilerConfig {
            fix_overflow,
            ..CompilerConfig::default()
        })
    }

    #[test]
    fn literal_scaling_round_trips_within_half_ulp() {
        let mut fe = fe_with(FixOverflow::CheckConstants);
        for v in [0.0, 0.5, 3.5, -1.25, 1.0 / 3.0, -100.0625] {
            let x = ClearFix::from_f64(&mut fe, v, 31, 16).unwrap();
            let lit = x.literal().unwrap().to_f64().unwrap();
            assert!((lit / 65536.0 - v).abs() <= 1.0 / 131072.0, "v={v}");
        }
    }

    #[test]
    fn clear_product_matches_worked_example() {
        // 3.5 * -1.25 = -4.375, exactly representable at f=16
        let mut fe = fe_with(FixOverflow::CheckConstants);
        let x = ClearFix::from_f64(&mut fe, 3.5, 31, 16).unwrap();
        let y = ClearFix::from_f64(&mut fe, -1.25, 31, 16).unwrap();
        let p = x.mul(&mut fe, &y).unwrap();
        assert_eq!(p.literal().unwrap(), &BigInt::from(-286720));
        assert_eq!(-286720.0 / 65536.0, -4.375);
    }

    #[test]
    fn secret_product_truncates_per_rounding_mode() {
        let mut fe = fe_with(FixOverflow::CheckConstants);
        let x = SecretFix::from_f64(&mut fe, 3.5, 31, 16).unwrap();
        let y = SecretFix::from_f64(&mut fe, -1.25, 31, 16).unwrap();
        x.mul(&mut fe, &y).unwrap();
        assert_eq!(
            fe.tape()
                .count_ops(|op| matches!(op, Op::TruncPr { k: 47, m: 16, .. })),
            1
        );

        let mut fe = Frontend::new(CompilerConfig {
            rounding: Rounding::Nearest,
            ..CompilerConfig::default()
        });
        let x = SecretFix::from_f64(&mut fe, 3.5, 31, 16).unwrap();
        let y = SecretFix::from_f64(&mut fe, -1.25, 31, 16).unwrap();
        x.mul(&mut fe, &y).unwrap();
        assert_eq!(
            fe.tape()
                .count_ops(|op| matches!(op, Op::TruncRound { .. })),
            1
        );
    }

    #[test]
    fn unequal_precision_is_a_type_error() {
        let mut fe = fe_with(FixOverflow::CheckConstants);
        let x = SecretFix::from_f64(&mut fe, 1.0, 31, 16).unwrap();
        let y = SecretFix::from_f64(&mut fe, 1.0, 31, 8).unwrap();
        assert!(matches!(
            x.add(&mut fe, &y),
            Err(CompilerError::PrecisionMismatch { lhs: 16, rhs: 8 })
        ));
    }

    #[test]
    fn constant_overflow_policy_is_honored() {
        let mut fe = fe_with(FixOverflow::CheckConstants);
        assert!(matches!(
            ClearFix::from_f64(&mut fe, 1048576.0, 16, 8),
            Err(CompilerError::ConstantRange { .. })
        ));
        let mut fe = fe_with(FixOverflow::Ignore);
        assert!(ClearFix::from_f64(&mut fe, 1048576.0, 16, 8).is_ok());
    }

    #[test]
    fn check_all_compiles_a_guarded_abort() {
        let mut fe = fe_with(FixOverflow::CheckAll);
        let x = SecretFix::from_f64(&mut fe, 2.0, 31, 16).unwrap();
        let y = SecretFix::from_f64(&mut fe, 2.0, 31, 16).unwrap();
        x.mul(&mut fe, &y).unwrap();
        assert_eq!(
            fe.tape().count_ops(|op| matches!(
                op,
                Op::CondAbort {
                    reason: AbortReason::FixOverflow,
                    ..
                }
            )),
            1
        );
    }

    #[test]
    fn power_of_two_divisor_becomes_a_shift() {
        let mut fe = fe_with(FixOverflow::CheckConstants);
        let x = SecretFix::from_f64(&mut fe, 10.0, 31, 16).unwrap();
        let four = ClearFix::from_f64(&mut fe, 4.0, 31, 16).unwrap();
        x.div_clear(&mut fe, &four).unwrap();
        assert_eq!(
            fe.tape().count_ops(|op| matches!(op, Op::FixDiv { .. })),
            0
        );
        assert_eq!(
            fe.tape()
                .count_ops(|op| matches!(op, Op::TruncPr { m: 2, .. })),
            1
        );

        let three = ClearFix::from_f64(&mut fe, 3.0, 31, 16).unwrap();
        x.div_clear(&mut fe, &three).unwrap();
        assert_eq!(
            fe.tape().count_ops(|op| matches!(op, Op::FixDiv { k: 31, f: 16, .. })),
            1
        );
    }

    #[test]
    fn division_by_constant_zero_is_rejected() {
        let mut fe = fe_with(FixOverflow::CheckConstants);
        let x = SecretFix::from_f64(&mut fe, 1.0, 31, 16).unwrap();
        let zero = ClearFix::from_f64(&mut fe, 0.0, 31, 16).unwrap();
        assert!(matches!(
            x.div_clear(&mut fe, &zero),
            Err(CompilerError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn dot_product_truncates_once() {
        let mut fe = fe_with(FixOverflow::CheckConstants);
        let xs: Vec<_> = (0..4)
            .map(|i| SecretFix::from_f64(&mut fe, f64::from(i), 31, 16).unwrap())
            .collect();
        let ys = xs.clone();
        SecretFix::dot_product(&mut fe, &xs, &ys).unwrap();
        let truncs = fe.tape().count_ops(|op| {
            matches!(op, Op::TruncPr { .. } | Op::TruncRound { .. })
        });
        assert_eq!(truncs, 1);
    }
}
