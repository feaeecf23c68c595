//! Quantized secret integers (scale / zero-point / bit-width), with a
//! deferred-reduction accumulator so multiply-accumulate chains pay the
//! rescale once.

use num_bigint::BigInt;

use crate::error::{CompilerError, Result};
use crate::frontend::Frontend;
use crate::types::{ClearInt, NumberOps, SecretInt};

/// Most summands an unreduced accumulator may absorb before reduction;
/// bounds the headroom reserved in the shift budget.
pub const MAX_SUMMANDS: u32 = 2048;

fn log2_ceil(n: u64) -> u32 {
    if n <= 1 {
        0
    } else {
        64 - (n - 1).leading_zeros()
    }
}

/// Quantization parameters: `value = scale * (q - zero_point)` with `q`
/// an unsigned `k`-bit integer.
#[derive(Clone, Debug, PartialEq)]
pub struct QuantParams {
    /// Scale factor.
    pub scale: f64,
    /// Zero point.
    pub zero_point: i64,
    /// Bit width of the quantized representation.
    pub k: u32,
}

impl QuantParams {
    /// New parameter set.
    pub fn new(scale: f64, zero_point: i64, k: u32) -> Self {
        Self {
            scale,
            zero_point,
            k,
        }
    }
}

/// Secret quantized integer.
#[derive(Clone, Debug)]
pub struct SecretQuant {
    v: SecretInt,
    params: QuantParams,
}

impl SecretQuant {
    /// Kind name used in error messages.
    pub const KIND: &'static str = "secret quantized integer";

    /// Quantizes a compile-time float; the quantized value must fit the
    /// declared `k` bits.
    pub fn from_f64(fe: &mut Frontend, value: f64, params: QuantParams) -> Result<Self> {
        let q = (value / params.scale + params.zero_point as f64).round() as i64;
        if q < 0 || q >= 1 << params.k {
            return Err(CompilerError::ConstantRange {
                value: value.to_string(),
                kind: Self::KIND,
                bits: params.k,
            });
        }
        let v = SecretInt::from_const(fe, q)?;
        Ok(Self { v, params })
    }

    /// Secret quantized input from one party.
    pub fn input(fe: &mut Frontend, party: u32, params: QuantParams) -> Result<Self> {
        let v = SecretInt::input(fe, party)?;
        Ok(Self { v, params })
    }

    /// The quantized integer register.
    pub fn raw(&self) -> &SecretInt {
        &self.v
    }

    /// The parameter set.
    pub fn params(&self) -> &QuantParams {
        &self.params
    }

    fn check_params(&self, other: &Self) -> Result<()> {
        if self.params != other.params {
            return Err(CompilerError::TypeMismatch {
                op: "quantized arithmetic",
                lhs: Self::KIND,
                rhs: Self::KIND,
            });
        }
        Ok(())
    }

    /// Addition under a shared parameter set: `q1 + q2 - Z`.
    pub fn add(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        self.check_params(other)?;
        let sum = self.v.add(fe, &other.v)?;
        let z = ClearInt::from_const(fe, self.params.zero_point)?;
        let v = sum.sub_clear(fe, &z)?;
        Ok(Self {
            v,
            params: self.params.clone(),
        })
    }

    /// Negation: `-q + 2Z`.
    pub fn neg(&self, fe: &mut Frontend) -> Result<Self> {
        let n = self.v.neg(fe)?;
        let z2 = ClearInt::from_const(fe, 2 * self.params.zero_point)?;
        let v = n.add_clear(fe, &z2)?;
        Ok(Self {
            v,
            params: self.params.clone(),
        })
    }

    /// Multiplication without the rescale, for deferred accumulation.
    pub fn mul_no_reduce(
        &self,
        fe: &mut Frontend,
        other: &Self,
        res_params: Option<QuantParams>,
    ) -> Result<UnreducedQuant> {
        let z1 = ClearInt::from_const(fe, self.params.zero_point)?;
        let z2 = ClearInt::from_const(fe, other.params.zero_point)?;
        let a = self.v.sub_clear(fe, &z1)?;
        let b = other.v.sub_clear(fe, &z2)?;
        let v = a.mul(fe, &b)?;
        Ok(UnreducedQuant {
            v,
            lhs: self.params.clone(),
            rhs: other.params.clone(),
            res: res_params.unwrap_or_else(|| self.params.clone()),
            n_summands: 1,
        })
    }

    /// Multiplication with immediate reduction.
    pub fn mul(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let unreduced = self.mul_no_reduce(fe, other, None)?;
        unreduced.reduce(fe)
    }
}

/// Deferred multiply-accumulate state: the double-width integer sum of
/// unreduced products, reduced to the result parameter set once.
#[derive(Clone, Debug)]
pub struct UnreducedQuant {
    v: SecretInt,
    lhs: QuantParams,
    rhs: QuantParams,
    res: QuantParams,
    n_summands: u32,
}

impl UnreducedQuant {
    /// Number of products accumulated so far.
    pub fn n_summands(&self) -> u32 {
        self.n_summands
    }

    /// Accumulates another unreduced product of the same parameter sets.
    pub fn add(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        if self.lhs != other.lhs || self.rhs != other.rhs || self.res != other.res {
            return Err(CompilerError::TypeMismatch {
                op: "unreduced quantized accumulation",
                lhs: SecretQuant::KIND,
                rhs: SecretQuant::KIND,
            });
        }
        let v = self.v.add(fe, &other.v)?;
        Ok(Self {
            v,
            lhs: self.lhs.clone(),
            rhs: self.rhs.clone(),
            res: self.res.clone(),
            n_summands: self.n_summands + other.n_summands,
        })
    }

    /// The single rescale: multiply by the combined scale as a fixed
    /// shifted integer, truncate, clamp into the `k`-bit range.
    pub fn reduce(&self, fe: &mut Frontend) -> Result<SecretQuant> {
        if self.n_summands > MAX_SUMMANDS {
            return Err(CompilerError::Internal(format!(
                "{} summands exceed the accumulation bound {MAX_SUMMANDS}",
                self.n_summands
            )));
        }
        let max_length = fe.config().ring_bits - 1;
        let m = self.lhs.scale * self.rhs.scale / self.res.scale;
        let log_m = m.log2().ceil() as i64;
        let budget = i64::from(max_length)
            - i64::from(self.lhs.k)
            - i64::from(self.rhs.k)
            - i64::from(log2_ceil(u64::from(self.n_summands)))
            - log_m;
        if budget <= 0 {
            return Err(CompilerError::Internal(
                "no shift budget left for quantized reduction".into(),
            ));
        }
        let n_shift = budget as u32;
        let int_mult = (m * 2f64.powi(n_shift as i32)).round() as i64;
        let mult = ClearInt::from_const(fe, BigInt::from(int_mult))?;
        let shifted_z = ClearInt::from_const(
            fe,
            BigInt::from(self.res.zero_point) << n_shift,
        )?;
        let scaled = self.v.mul_clear(fe, &mult)?;
        let biased = scaled.add_clear(fe, &shifted_z)?;
        let shifted = fe.with_bit_length(max_length, |fe| biased.shr(fe, n_shift))?;

        // clamp into [0, 2^k)
        let length = self.res.k.max(max_length - n_shift) + 1;
        let top = SecretInt::from_const(fe, (1i64 << self.res.k) - 1)?;
        let zero = SecretInt::from_const(fe, 0)?;
        let over = fe.with_bit_length(length, |fe| top.lt(fe, &shifted))?;
        let under = fe.with_bit_length(length, |fe| shifted.lt(fe, &zero))?;
        let clamped = over.select_int(fe, &top, &shifted)?;
        let clamped = under.select_int(fe, &zero, &clamped)?;
        Ok(SecretQuant {
            v: clamped,
            params: self.res.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;
    use mpc_ir::Op;

    fn fe() -> Frontend {
        Frontend::new(CompilerConfig::default())
    }

    fn params() -> QuantParams {
        QuantParams::new(0.5, 0, 8)
    }

    #[test]
    fn quantization_rounds_to_the_grid() {
        let mut fe = fe();
        SecretQuant::from_f64(&mut fe, 3.0, params()).unwrap();
        // q = 3.0 / 0.5 = 6
        assert_eq!(
            fe.tape().count_ops(|op| matches!(op, Op::LdI { imm: 6, .. })),
            1
        );
    }

    #[test]
    fn unquantizable_constant_is_rejected() {
        let mut fe = fe();
        assert!(matches!(
            SecretQuant::from_f64(&mut fe, 1000.0, params()),
            Err(CompilerError::ConstantRange { .. })
        ));
        assert!(matches!(
            SecretQuant::from_f64(&mut fe, -1.0, params()),
            Err(CompilerError::ConstantRange { .. })
        ));
    }

    #[test]
    fn parameter_mismatch_is_a_type_error() {
        let mut fe = fe();
        let x = SecretQuant::from_f64(&mut fe, 1.0, params()).unwrap();
        let y = SecretQuant::from_f64(&mut fe, 1.0, QuantParams::new(0.25, 0, 8)).unwrap();
        assert!(matches!(
            x.add(&mut fe, &y),
            Err(CompilerError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn deferred_accumulation_truncates_once() {
        let mut fe = fe();
        let a = SecretQuant::input(&mut fe, 0, params()).unwrap();
        let b = SecretQuant::input(&mut fe, 1, params()).unwrap();
        let c = SecretQuant::input(&mut fe, 0, params()).unwrap();
        let d = SecretQuant::input(&mut fe, 1, params()).unwrap();
        let p1 = a.mul_no_reduce(&mut fe, &b, None).unwrap();
        let p2 = c.mul_no_reduce(&mut fe, &d, None).unwrap();
        let acc = p1.add(&mut fe, &p2).unwrap();
        assert_eq!(acc.n_summands(), 2);
        acc.reduce(&mut fe).unwrap();
        let truncs = fe
            .tape()
            .count_ops(|op| matches!(op, Op::TruncPr { .. } | Op::TruncRound { .. }));
        assert_eq!(truncs, 1);
    }
}
