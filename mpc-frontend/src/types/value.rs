//! Mixed-kind operator surface.
//!
//! [`Value`] closes the lattice over one enum so user-facing code can apply
//! arithmetic and comparison operators without naming the concrete kinds on
//! both sides. Dispatch is an exhaustive match over a coercion matrix:
//! clear kinds promote to secret, machine integers widen into the ring,
//! single bits widen into integers, and an integer meeting a fixed-point
//! operand is scaled into the fixed-point representation of the other side.
//! The binary domain never mixes with the arithmetic domain here; crossing
//! that boundary stays an explicit decompose/recompose conversion.

use crate::error::{CompilerError, Result};
use crate::frontend::Frontend;
use crate::types::{
    ClearBin, ClearBit, ClearFix, ClearInt, Int64, IntOps, NumberOps, Personal, SecretBin,
    SecretBit, SecretFix, SecretFloat, SecretInt, SecretQuant,
};

/// A value of any kind in the lattice.
#[derive(Clone, Debug)]
pub enum Value {
    /// Secret-shared ring integer.
    Secret(SecretInt),
    /// Clear ring integer.
    Clear(ClearInt),
    /// Clear 64-bit machine integer.
    Int64(Int64),
    /// Secret comparison bit.
    SecretBit(SecretBit),
    /// Clear comparison bit.
    ClearBit(ClearBit),
    /// Secret binary-field element.
    SecretBin(SecretBin),
    /// Clear binary-field element.
    ClearBin(ClearBin),
    /// Secret fixed-point number.
    SecretFix(SecretFix),
    /// Clear fixed-point number.
    ClearFix(ClearFix),
    /// Secret floating-point number.
    Float(SecretFloat),
    /// Secret quantized integer.
    Quant(SecretQuant),
    /// Player-local clear value.
    Personal(Personal),
}

/// Arithmetic pair after coercion. The mixed variants keep the clear side
/// clear so linear operations stay local instead of paying a conversion.
enum IntPair {
    Int64(Int64, Int64),
    Clear(ClearInt, ClearInt),
    Secret(SecretInt, SecretInt),
    Mixed {
        s: SecretInt,
        c: ClearInt,
        /// True when the clear operand was on the left.
        swapped: bool,
    },
}

enum FixPair {
    Clear(ClearFix, ClearFix),
    Secret(SecretFix, SecretFix),
    Mixed {
        s: SecretFix,
        c: ClearFix,
        swapped: bool,
    },
}

enum Pair {
    Int(IntPair),
    Fix(FixPair),
    SecretBin(SecretBin, SecretBin),
    ClearBin(ClearBin, ClearBin),
    Float(SecretFloat, SecretFloat),
    Quant(SecretQuant, SecretQuant),
}

#[derive(Clone, Copy)]
enum Gate {
    Xor,
    And,
    Or,
}

impl Value {
    /// Kind name, matching the error taxonomy.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Secret(_) => SecretInt::KIND,
            Value::Clear(_) => ClearInt::KIND,
            Value::Int64(_) => Int64::KIND,
            Value::SecretBit(_) => "secret bit",
            Value::ClearBit(_) => "clear bit",
            Value::SecretBin(_) => "secret binary element",
            Value::ClearBin(_) => "clear binary element",
            Value::SecretFix(_) => SecretFix::KIND,
            Value::ClearFix(_) => ClearFix::KIND,
            Value::Float(_) => SecretFloat::KIND,
            Value::Quant(_) => SecretQuant::KIND,
            Value::Personal(_) => "player-local value",
        }
    }

    /// Addition; XOR in the binary domain.
    pub fn add(&self, fe: &mut Frontend, other: &Value) -> eyre::Result<Value> {
        if let (Value::Personal(a), Value::Personal(b)) = (self, other) {
            return Ok(Value::Personal(a.add(fe, b)?));
        }
        let pair = coerce(fe, "add", self.clone(), other.clone())?;
        Ok(match pair {
            Pair::Int(IntPair::Int64(a, b)) => Value::Int64(a.add(fe, &b)?),
            Pair::Int(IntPair::Clear(a, b)) => Value::Clear(a.add(fe, &b)?),
            Pair::Int(IntPair::Secret(a, b)) => Value::Secret(a.add(fe, &b)?),
            Pair::Int(IntPair::Mixed { s, c, .. }) => Value::Secret(s.add_clear(fe, &c)?),
            Pair::Fix(FixPair::Clear(a, b)) => Value::ClearFix(a.add(fe, &b)?),
            Pair::Fix(FixPair::Secret(a, b)) => Value::SecretFix(a.add(fe, &b)?),
            Pair::Fix(FixPair::Mixed { s, c, .. }) => Value::SecretFix(s.add_clear(fe, &c)?),
            // Characteristic two: addition in the binary domain is XOR.
            Pair::SecretBin(a, b) => Value::SecretBin(a.xor(fe, &b)?),
            Pair::ClearBin(a, b) => Value::ClearBin(a.xor(fe, &b)?),
            Pair::Float(a, b) => Value::Float(a.add(fe, &b)?),
            Pair::Quant(a, b) => Value::Quant(a.add(fe, &b)?),
        })
    }

    /// Subtraction; coincides with addition in the binary domain.
    pub fn sub(&self, fe: &mut Frontend, other: &Value) -> eyre::Result<Value> {
        if let (Value::Personal(a), Value::Personal(b)) = (self, other) {
            return Ok(Value::Personal(a.sub(fe, b)?));
        }
        let pair = coerce(fe, "sub", self.clone(), other.clone())?;
        Ok(match pair {
            Pair::Int(IntPair::Int64(a, b)) => Value::Int64(a.sub(fe, &b)?),
            Pair::Int(IntPair::Clear(a, b)) => Value::Clear(a.sub(fe, &b)?),
            Pair::Int(IntPair::Secret(a, b)) => Value::Secret(a.sub(fe, &b)?),
            Pair::Int(IntPair::Mixed { s, c, swapped }) => {
                if swapped {
                    let neg = s.neg(fe)?;
                    Value::Secret(neg.add_clear(fe, &c)?)
                } else {
                    Value::Secret(s.sub_clear(fe, &c)?)
                }
            }
            Pair::Fix(FixPair::Clear(a, b)) => Value::ClearFix(a.sub(fe, &b)?),
            Pair::Fix(FixPair::Secret(a, b)) => Value::SecretFix(a.sub(fe, &b)?),
            Pair::Fix(FixPair::Mixed { s, c, swapped }) => {
                if swapped {
                    let neg = s.neg(fe)?;
                    Value::SecretFix(neg.add_clear(fe, &c)?)
                } else {
                    let neg = c.neg(fe)?;
                    Value::SecretFix(s.add_clear(fe, &neg)?)
                }
            }
            // Subtraction coincides with addition in characteristic two.
            Pair::SecretBin(a, b) => Value::SecretBin(a.xor(fe, &b)?),
            Pair::ClearBin(a, b) => Value::ClearBin(a.xor(fe, &b)?),
            Pair::Float(a, b) => Value::Float(a.sub(fe, &b)?),
            Pair::Quant(a, b) => {
                let nb = b.neg(fe)?;
                Value::Quant(a.add(fe, &nb)?)
            }
        })
    }

    /// Multiplication; AND in the binary domain.
    pub fn mul(&self, fe: &mut Frontend, other: &Value) -> eyre::Result<Value> {
        if let (Value::Personal(a), Value::Personal(b)) = (self, other) {
            return Ok(Value::Personal(a.mul(fe, b)?));
        }
        let pair = coerce(fe, "mul", self.clone(), other.clone())?;
        Ok(match pair {
            Pair::Int(IntPair::Int64(a, b)) => Value::Int64(a.mul(fe, &b)?),
            Pair::Int(IntPair::Clear(a, b)) => Value::Clear(a.mul(fe, &b)?),
            Pair::Int(IntPair::Secret(a, b)) => Value::Secret(a.mul(fe, &b)?),
            Pair::Int(IntPair::Mixed { s, c, .. }) => Value::Secret(s.mul_clear(fe, &c)?),
            Pair::Fix(FixPair::Clear(a, b)) => Value::ClearFix(a.mul(fe, &b)?),
            Pair::Fix(FixPair::Secret(a, b)) => Value::SecretFix(a.mul(fe, &b)?),
            Pair::Fix(FixPair::Mixed { s, c, .. }) => Value::SecretFix(s.mul_clear(fe, &c)?),
            Pair::SecretBin(a, b) => Value::SecretBin(a.and(fe, &b)?),
            Pair::ClearBin(a, b) => Value::ClearBin(a.and(fe, &b)?),
            Pair::Float(a, b) => Value::Float(a.mul(fe, &b)?),
            Pair::Quant(a, b) => Value::Quant(a.mul(fe, &b)?),
        })
    }

    /// Division. An all-clear integer pair divides in the clear; any secret
    /// integer operand promotes both sides to fixed point at the configured
    /// default precision, matching the semantics users expect of `/` on
    /// secret integers.
    pub fn div(&self, fe: &mut Frontend, other: &Value) -> eyre::Result<Value> {
        let pair = coerce(fe, "div", self.clone(), other.clone())?;
        Ok(match pair {
            Pair::Int(IntPair::Int64(a, b)) => {
                let a = a.to_clear(fe)?;
                let b = b.to_clear(fe)?;
                Value::Clear(a.div(fe, &b)?)
            }
            Pair::Int(IntPair::Clear(a, b)) => Value::Clear(a.div(fe, &b)?),
            Pair::Int(IntPair::Secret(a, b)) => {
                let (k, f) = (fe.config().default_fix_k, fe.config().default_fix_f);
                let a = SecretFix::from_int(fe, &a, k, f)?;
                let b = SecretFix::from_int(fe, &b, k, f)?;
                Value::SecretFix(a.div(fe, &b)?)
            }
            Pair::Int(IntPair::Mixed { s, c, swapped }) => {
                let (k, f) = (fe.config().default_fix_k, fe.config().default_fix_f);
                let s = SecretFix::from_int(fe, &s, k, f)?;
                let c = ClearFix::from_int(fe, &c, k, f)?;
                if swapped {
                    let c = SecretFix::from_clear(fe, &c)?;
                    Value::SecretFix(c.div(fe, &s)?)
                } else {
                    Value::SecretFix(s.div_clear(fe, &c)?)
                }
            }
            Pair::Fix(FixPair::Clear(a, b)) => Value::ClearFix(clear_fix_div(fe, &a, &b)?),
            Pair::Fix(FixPair::Secret(a, b)) => Value::SecretFix(a.div(fe, &b)?),
            Pair::Fix(FixPair::Mixed { s, c, swapped }) => {
                if swapped {
                    let c = SecretFix::from_clear(fe, &c)?;
                    Value::SecretFix(c.div(fe, &s)?)
                } else {
                    Value::SecretFix(s.div_clear(fe, &c)?)
                }
            }
            Pair::SecretBin(..) | Pair::ClearBin(..) | Pair::Float(..) | Pair::Quant(..) => {
                return Err(mismatch("div", self.kind(), other.kind()).into())
            }
        })
    }

    /// Arithmetic negation.
    pub fn neg(&self, fe: &mut Frontend) -> eyre::Result<Value> {
        Ok(match self {
            Value::Secret(v) => Value::Secret(v.neg(fe)?),
            Value::Clear(v) => Value::Clear(v.neg(fe)?),
            Value::Int64(v) => Value::Int64(v.neg(fe)?),
            Value::SecretBit(b) => {
                let v = SecretInt::from_bit(fe, b)?;
                Value::Secret(v.neg(fe)?)
            }
            Value::ClearBit(b) => Value::Clear(b.to_clear_int().neg(fe)?),
            Value::SecretFix(v) => Value::SecretFix(v.neg(fe)?),
            Value::ClearFix(v) => Value::ClearFix(v.neg(fe)?),
            Value::Float(v) => Value::Float(v.neg(fe)?),
            Value::Quant(v) => Value::Quant(v.neg(fe)?),
            // Negation is local to the owner.
            Value::Personal(p) => {
                Value::Personal(Personal::new(p.owner(), p.value.neg(fe)?))
            }
            Value::SecretBin(_) | Value::ClearBin(_) => {
                return Err(mismatch("neg", self.kind(), self.kind()).into())
            }
        })
    }

    /// Strict less-than. The result kind follows the comparison domain:
    /// `SecretBit` when anything secret is involved, `ClearBit` for clear
    /// ring values, `Int64` for machine integers.
    pub fn lt(&self, fe: &mut Frontend, other: &Value) -> eyre::Result<Value> {
        let pair = coerce(fe, "lt", self.clone(), other.clone())?;
        Ok(match pair {
            Pair::Int(IntPair::Int64(a, b)) => Value::Int64(a.lt(fe, &b)?),
            Pair::Int(IntPair::Clear(a, b)) => Value::ClearBit(a.lt(fe, &b)?),
            Pair::Int(IntPair::Secret(a, b)) => Value::SecretBit(a.lt(fe, &b)?),
            Pair::Int(IntPair::Mixed { s, c, swapped }) => {
                let c = SecretInt::from_clear(fe, &c)?;
                let bit = if swapped { c.lt(fe, &s)? } else { s.lt(fe, &c)? };
                Value::SecretBit(bit)
            }
            Pair::Fix(FixPair::Clear(a, b)) => Value::ClearBit(a.lt(fe, &b)?),
            Pair::Fix(FixPair::Secret(a, b)) => Value::SecretBit(a.lt(fe, &b)?),
            Pair::Fix(FixPair::Mixed { s, c, swapped }) => {
                let c = SecretFix::from_clear(fe, &c)?;
                let bit = if swapped { c.lt(fe, &s)? } else { s.lt(fe, &c)? };
                Value::SecretBit(bit)
            }
            Pair::Float(a, b) => Value::SecretBit(a.lt(fe, &b)?),
            Pair::SecretBin(..) | Pair::ClearBin(..) | Pair::Quant(..) => {
                return Err(mismatch("lt", self.kind(), other.kind()).into())
            }
        })
    }

    /// Equality; the result kind follows the comparison domain.
    pub fn eq(&self, fe: &mut Frontend, other: &Value) -> eyre::Result<Value> {
        let pair = coerce(fe, "eq", self.clone(), other.clone())?;
        Ok(match pair {
            Pair::Int(IntPair::Int64(a, b)) => Value::Int64(a.eq(fe, &b)?),
            Pair::Int(IntPair::Clear(a, b)) => Value::ClearBit(a.eq(fe, &b)?),
            Pair::Int(IntPair::Secret(a, b)) => Value::SecretBit(a.eq(fe, &b)?),
            Pair::Int(IntPair::Mixed { s, c, .. }) => {
                let c = SecretInt::from_clear(fe, &c)?;
                Value::SecretBit(s.eq(fe, &c)?)
            }
            Pair::Fix(FixPair::Clear(a, b)) => {
                check_fix_parity(a.f(), b.f())?;
                Value::ClearBit(a.raw().eq(fe, b.raw())?)
            }
            Pair::Fix(FixPair::Secret(a, b)) => {
                check_fix_parity(a.f(), b.f())?;
                Value::SecretBit(a.raw().eq(fe, b.raw())?)
            }
            Pair::Fix(FixPair::Mixed { s, c, .. }) => {
                check_fix_parity(s.f(), c.f())?;
                let c = SecretFix::from_clear(fe, &c)?;
                Value::SecretBit(s.raw().eq(fe, c.raw())?)
            }
            Pair::Float(a, b) => Value::SecretBit(a.eq(fe, &b)?),
            Pair::Quant(a, b) => {
                if a.params() != b.params() {
                    return Err(mismatch("eq", self.kind(), other.kind()).into());
                }
                Value::SecretBit(a.raw().eq(fe, b.raw())?)
            }
            Pair::SecretBin(..) | Pair::ClearBin(..) => {
                return Err(mismatch("eq", self.kind(), other.kind()).into())
            }
        })
    }

    /// Logical XOR on bit-valued operands.
    pub fn bit_xor(&self, fe: &mut Frontend, other: &Value) -> eyre::Result<Value> {
        self.gate(fe, other, "bit_xor", Gate::Xor)
    }

    /// Logical AND on bit-valued operands.
    pub fn bit_and(&self, fe: &mut Frontend, other: &Value) -> eyre::Result<Value> {
        self.gate(fe, other, "bit_and", Gate::And)
    }

    /// Logical OR on bit-valued operands.
    pub fn bit_or(&self, fe: &mut Frontend, other: &Value) -> eyre::Result<Value> {
        self.gate(fe, other, "bit_or", Gate::Or)
    }

    /// Logical gates. Native in the binary domain; on comparison bits and
    /// 0/1-valued integers they lower to the ring identities of [`IntOps`].
    fn gate(&self, fe: &mut Frontend, other: &Value, op: &'static str, g: Gate) -> eyre::Result<Value> {
        if let (Value::SecretBit(a), Value::SecretBit(b)) = (self, other) {
            let r = match g {
                Gate::Xor => a.xor(fe, b)?,
                Gate::And => a.and(fe, b)?,
                Gate::Or => a.or(fe, b)?,
            };
            return Ok(Value::SecretBit(r));
        }
        let pair = coerce(fe, op, self.clone(), other.clone())?;
        Ok(match pair {
            Pair::SecretBin(a, b) => Value::SecretBin(match g {
                Gate::Xor => a.xor(fe, &b)?,
                Gate::And => a.and(fe, &b)?,
                Gate::Or => a.or(fe, &b)?,
            }),
            Pair::ClearBin(a, b) => Value::ClearBin(match g {
                Gate::Xor => a.xor(fe, &b)?,
                Gate::And => a.and(fe, &b)?,
                Gate::Or => a.or(fe, &b)?,
            }),
            Pair::Int(IntPair::Int64(a, b)) => Value::Int64(int_gate(fe, g, &a, &b)?),
            Pair::Int(IntPair::Clear(a, b)) => Value::Clear(int_gate(fe, g, &a, &b)?),
            Pair::Int(IntPair::Secret(a, b)) => Value::Secret(int_gate(fe, g, &a, &b)?),
            Pair::Int(IntPair::Mixed { s, c, .. }) => {
                let c = SecretInt::from_clear(fe, &c)?;
                Value::Secret(int_gate(fe, g, &s, &c)?)
            }
            Pair::Fix(..) | Pair::Float(..) | Pair::Quant(..) => {
                return Err(mismatch(op, self.kind(), other.kind()).into())
            }
        })
    }
}

fn int_gate<T: IntOps>(fe: &mut Frontend, g: Gate, a: &T, b: &T) -> Result<T> {
    match g {
        Gate::Xor => a.bit_xor(fe, b),
        Gate::And => a.bit_and(fe, b),
        Gate::Or => a.bit_or(fe, b),
    }
}

fn check_fix_parity(lhs: u32, rhs: u32) -> Result<()> {
    if lhs != rhs {
        return Err(CompilerError::PrecisionMismatch { lhs, rhs });
    }
    Ok(())
}

/// Clear fixed-point division on the raw representation:
/// `(a << f) / b` keeps `f` fractional bits in the quotient.
fn clear_fix_div(fe: &mut Frontend, a: &ClearFix, b: &ClearFix) -> Result<ClearFix> {
    check_fix_parity(a.f(), b.f())?;
    if let Some(lit) = b.literal() {
        if num_traits::Zero::is_zero(lit) {
            return Err(CompilerError::DivisionByZero {
                kind: ClearFix::KIND,
            });
        }
    }
    let shifted = a.raw().shl(fe, a.f())?;
    let v = shifted.div(fe, b.raw())?;
    Ok(ClearFix::from_raw(v, a.k().max(b.k()), a.f()))
}

fn mismatch(op: &'static str, lhs: &'static str, rhs: &'static str) -> CompilerError {
    CompilerError::TypeMismatch { op, lhs, rhs }
}

/// Widens single bits into their integer kinds and lowers player-local
/// values into secret shares (an input step by the owner).
fn lift_scalar(fe: &mut Frontend, v: Value) -> Result<Value> {
    Ok(match v {
        Value::SecretBit(b) => Value::Secret(SecretInt::from_bit(fe, &b)?),
        Value::ClearBit(b) => Value::Clear(b.to_clear_int()),
        Value::Personal(p) => Value::Secret(p.to_secret(fe)?),
        other => other,
    })
}

fn fix_precision(v: &Value) -> Option<(u32, u32)> {
    match v {
        Value::SecretFix(x) => Some((x.k(), x.f())),
        Value::ClearFix(x) => Some((x.k(), x.f())),
        _ => None,
    }
}

enum FixSide {
    Clear(ClearFix),
    Secret(SecretFix),
}

fn lift_to_fix(
    fe: &mut Frontend,
    op: &'static str,
    v: Value,
    k: u32,
    f: u32,
    other_kind: &'static str,
) -> Result<FixSide> {
    Ok(match v {
        Value::ClearFix(x) => FixSide::Clear(x),
        Value::SecretFix(x) => FixSide::Secret(x),
        Value::Clear(x) => FixSide::Clear(ClearFix::from_int(fe, &x, k, f)?),
        Value::Secret(x) => FixSide::Secret(SecretFix::from_int(fe, &x, k, f)?),
        Value::Int64(x) => {
            let c = x.to_clear(fe)?;
            FixSide::Clear(ClearFix::from_int(fe, &c, k, f)?)
        }
        other => return Err(mismatch(op, other.kind(), other_kind)),
    })
}

/// The coercion matrix. Returns the operands as a same-domain pair, or
/// [`CompilerError::TypeMismatch`] when no declared path connects them.
fn coerce(fe: &mut Frontend, op: &'static str, lhs: Value, rhs: Value) -> Result<Pair> {
    let (lk, rk) = (lhs.kind(), rhs.kind());
    // Binary-domain pairs never touch the arithmetic ladder.
    match (lhs, rhs) {
        (Value::SecretBin(a), Value::SecretBin(b)) => return Ok(Pair::SecretBin(a, b)),
        (Value::SecretBin(a), Value::ClearBin(b)) => {
            let b = SecretBin::from_clear(fe, &b)?;
            return Ok(Pair::SecretBin(a, b));
        }
        (Value::ClearBin(a), Value::SecretBin(b)) => {
            let a = SecretBin::from_clear(fe, &a)?;
            return Ok(Pair::SecretBin(a, b));
        }
        (Value::ClearBin(a), Value::ClearBin(b)) => return Ok(Pair::ClearBin(a, b)),
        (Value::Float(a), Value::Float(b)) => return Ok(Pair::Float(a, b)),
        (Value::Quant(a), Value::Quant(b)) => return Ok(Pair::Quant(a, b)),
        (lhs, rhs) => {
            let lhs = lift_scalar(fe, lhs)?;
            let rhs = lift_scalar(fe, rhs)?;
            if let Some((k, f)) = fix_precision(&lhs).or_else(|| fix_precision(&rhs)) {
                let a = lift_to_fix(fe, op, lhs, k, f, rk)?;
                let b = lift_to_fix(fe, op, rhs, k, f, lk)?;
                return Ok(Pair::Fix(match (a, b) {
                    (FixSide::Clear(a), FixSide::Clear(b)) => FixPair::Clear(a, b),
                    (FixSide::Secret(a), FixSide::Secret(b)) => FixPair::Secret(a, b),
                    (FixSide::Secret(s), FixSide::Clear(c)) => FixPair::Mixed {
                        s,
                        c,
                        swapped: false,
                    },
                    (FixSide::Clear(c), FixSide::Secret(s)) => FixPair::Mixed {
                        s,
                        c,
                        swapped: true,
                    },
                }));
            }
            let pair = match (lhs, rhs) {
                (Value::Int64(a), Value::Int64(b)) => IntPair::Int64(a, b),
                (Value::Int64(a), Value::Clear(b)) => {
                    let a = a.to_clear(fe)?;
                    IntPair::Clear(a, b)
                }
                (Value::Clear(a), Value::Int64(b)) => {
                    let b = b.to_clear(fe)?;
                    IntPair::Clear(a, b)
                }
                (Value::Clear(a), Value::Clear(b)) => IntPair::Clear(a, b),
                (Value::Secret(a), Value::Secret(b)) => IntPair::Secret(a, b),
                (Value::Secret(s), Value::Clear(c)) => IntPair::Mixed {
                    s,
                    c,
                    swapped: false,
                },
                (Value::Clear(c), Value::Secret(s)) => IntPair::Mixed {
                    s,
                    c,
                    swapped: true,
                },
                (Value::Secret(s), Value::Int64(b)) => {
                    let c = b.to_clear(fe)?;
                    IntPair::Mixed {
                        s,
                        c,
                        swapped: false,
                    }
                }
                (Value::Int64(a), Value::Secret(s)) => {
                    let c = a.to_clear(fe)?;
                    IntPair::Mixed {
                        s,
                        c,
                        swapped: true,
                    }
                }
                _ => return Err(mismatch(op, lk, rk)),
            };
            Ok(Pair::Int(pair))
        }
    }
}

impl From<SecretInt> for Value {
    fn from(v: SecretInt) -> Self {
        Value::Secret(v)
    }
}

impl From<ClearInt> for Value {
    fn from(v: ClearInt) -> Self {
        Value::Clear(v)
    }
}

impl From<Int64> for Value {
    fn from(v: Int64) -> Self {
        Value::Int64(v)
    }
}

impl From<SecretBit> for Value {
    fn from(v: SecretBit) -> Self {
        Value::SecretBit(v)
    }
}

impl From<ClearBit> for Value {
    fn from(v: ClearBit) -> Self {
        Value::ClearBit(v)
    }
}

impl From<SecretBin> for Value {
    fn from(v: SecretBin) -> Self {
        Value::SecretBin(v)
    }
}

impl From<ClearBin> for Value {
    fn from(v: ClearBin) -> Self {
        Value::ClearBin(v)
    }
}

impl From<SecretFix> for Value {
    fn from(v: SecretFix) -> Self {
        Value::SecretFix(v)
    }
}

impl From<ClearFix> for Value {
    fn from(v: ClearFix) -> Self {
        Value::ClearFix(v)
    }
}

impl From<SecretFloat> for Value {
    fn from(v: SecretFloat) -> Self {
        Value::Float(v)
    }
}

impl From<SecretQuant> for Value {
    fn from(v: SecretQuant) -> Self {
        Value::Quant(v)
    }
}

impl From<Personal> for Value {
    fn from(v: Personal) -> Self {
        Value::Personal(v)
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

    #[test]
    fn secret_plus_clear_stays_linear() {
        let mut fe = fe();
        let s = Value::from(SecretInt::from_const(&mut fe, 5).unwrap());
        let c = Value::from(ClearInt::from_const(&mut fe, 3).unwrap());
        let r = s.add(&mut fe, &c).unwrap();
        assert!(matches!(r, Value::Secret(_)));
        // No conversion of the clear operand into the secret register file.
        assert_eq!(
            fe.tape().count_ops(|op| matches!(op, Op::ConvReg { .. })),
            0
        );
    }

    #[test]
    fn clear_minus_secret_respects_order() {
        let mut fe = fe();
        let c = Value::from(ClearInt::from_const(&mut fe, 10).unwrap());
        let s = Value::from(SecretInt::from_const(&mut fe, 4).unwrap());
        let r = c.sub(&mut fe, &s).unwrap();
        assert!(matches!(r, Value::Secret(_)));
        // c - s lowers to (-s) + c.
        assert_eq!(fe.tape().count_ops(|op| matches!(op, Op::Neg { .. })), 1);
    }

    #[test]
    fn machine_integer_widens_into_the_ring() {
        let mut fe = fe();
        let i = Value::from(Int64::from_const(&mut fe, 7).unwrap());
        let c = Value::from(ClearInt::from_const(&mut fe, 1).unwrap());
        let r = i.add(&mut fe, &c).unwrap();
        assert!(matches!(r, Value::Clear(_)));
        assert_eq!(
            fe.tape().count_ops(|op| matches!(op, Op::ConvReg { .. })),
            1
        );
    }

    #[test]
    fn secret_division_promotes_to_fixed_point() {
        let mut fe = fe();
        let a = Value::from(SecretInt::from_const(&mut fe, 7).unwrap());
        let b = Value::from(SecretInt::from_const(&mut fe, 2).unwrap());
        let r = a.div(&mut fe, &b).unwrap();
        assert!(matches!(r, Value::SecretFix(_)));
        assert_eq!(
            fe.tape()
                .count_ops(|op| matches!(op, Op::FixDiv { k: 31, f: 16, .. })),
            1
        );
    }

    #[test]
    fn integer_meets_fixed_point_at_its_precision() {
        let mut fe = fe();
        let x = Value::from(SecretFix::from_f64(&mut fe, 1.5, 31, 16).unwrap());
        let n = Value::from(ClearInt::from_const(&mut fe, 2).unwrap());
        let r = x.mul(&mut fe, &n).unwrap();
        match r {
            Value::SecretFix(f) => {
                assert_eq!(f.f(), 16);
                assert_eq!(f.k(), 31);
            }
            other => panic!("unexpected kind {}", other.kind()),
        }
    }

    #[test]
    fn binary_addition_is_xor() {
        let mut fe = fe();
        let a = Value::from(SecretBin::from_const(&mut fe, 0b1100, 4).unwrap());
        let b = Value::from(ClearBin::from_const(&mut fe, 0b1010, 4).unwrap());
        let r = a.add(&mut fe, &b).unwrap();
        assert!(matches!(r, Value::SecretBin(_)));
        assert_eq!(fe.tape().count_ops(|op| matches!(op, Op::Xor { .. })), 1);
        assert_eq!(fe.tape().count_ops(|op| matches!(op, Op::Add { .. })), 0);
    }

    #[test]
    fn binary_never_meets_arithmetic() {
        let mut fe = fe();
        let a = Value::from(SecretBin::from_const(&mut fe, 3, 4).unwrap());
        let b = Value::from(SecretInt::from_const(&mut fe, 3).unwrap());
        let err = a.add(&mut fe, &b).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CompilerError>(),
            Some(CompilerError::TypeMismatch { op: "add", .. })
        ));
    }

    #[test]
    fn float_only_mixes_with_float() {
        let mut fe = fe();
        let x = Value::from(SecretFloat::from_f64_default(&mut fe, 1.5).unwrap());
        let n = Value::from(SecretInt::from_const(&mut fe, 2).unwrap());
        assert!(x.add(&mut fe, &n).is_err());
        let y = Value::from(SecretFloat::from_f64_default(&mut fe, 2.5).unwrap());
        assert!(matches!(x.add(&mut fe, &y).unwrap(), Value::Float(_)));
    }

    #[test]
    fn personal_pair_stays_local() {
        let mut fe = fe();
        let a = Personal::new(1, ClearInt::from_const(&mut fe, 2).unwrap());
        let b = Personal::new(1, ClearInt::from_const(&mut fe, 3).unwrap());
        let r = Value::from(a).add(&mut fe, &Value::from(b)).unwrap();
        assert!(matches!(r, Value::Personal(_)));
        assert_eq!(fe.tape().count_ops(|op| matches!(op, Op::Input { .. })), 0);
    }

    #[test]
    fn personal_meeting_secret_is_an_input_step() {
        let mut fe = fe();
        let p = Value::from(Personal::new(2, ClearInt::from_const(&mut fe, 2).unwrap()));
        let s = Value::from(SecretInt::from_const(&mut fe, 1).unwrap());
        let r = p.add(&mut fe, &s).unwrap();
        assert!(matches!(r, Value::Secret(_)));
        assert_eq!(
            fe.tape()
                .count_ops(|op| matches!(op, Op::Input { party: 2, .. })),
            1
        );
    }

    #[test]
    fn fixed_equality_demands_matching_precision() {
        let mut fe = fe();
        let a = Value::from(SecretFix::from_f64(&mut fe, 1.0, 31, 16).unwrap());
        let b = Value::from(SecretFix::from_f64(&mut fe, 1.0, 31, 8).unwrap());
        let err = a.eq(&mut fe, &b).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CompilerError>(),
            Some(CompilerError::PrecisionMismatch { lhs: 16, rhs: 8 })
        ));
    }

    #[test]
    fn comparison_results_compose_as_bits() {
        let mut fe = fe();
        let a = SecretInt::from_const(&mut fe, 1).unwrap();
        let b = SecretInt::from_const(&mut fe, 2).unwrap();
        let x = Value::from(a.lt(&mut fe, &b).unwrap());
        let y = Value::from(b.lt(&mut fe, &a).unwrap());
        let r = x.bit_or(&mut fe, &y).unwrap();
        assert!(matches!(r, Value::SecretBit(_)));
    }

    #[test]
    fn clear_fixed_division_by_constant_zero_is_rejected() {
        let mut fe = fe();
        let a = Value::from(ClearFix::from_f64(&mut fe, 1.0, 31, 16).unwrap());
        let b = Value::from(ClearFix::from_f64(&mut fe, 0.0, 31, 16).unwrap());
        let err = a.div(&mut fe, &b).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CompilerError>(),
            Some(CompilerError::DivisionByZero { .. })
        ));
    }
}
