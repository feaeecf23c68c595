//! Integer kinds of the arithmetic domain: secret and clear ring integers,
//! clear 64-bit machine integers, and the single-bit comparison kinds.

use mpc_ir::{Op, RegId, RegKind};
use num_bigint::BigInt;

use crate::config::Rounding;
use crate::error::Result;
use crate::frontend::Frontend;
use crate::types::{IntOps, NumberOps, ValueId};

/// Secret-shared ring/field integer (register-based, ephemeral).
#[derive(Clone, Debug)]
pub struct SecretInt {
    pub(crate) reg: RegId,
    pub(crate) size: u32,
    pub(crate) id: ValueId,
}

/// Clear ring/field integer, known to all parties.
#[derive(Clone, Debug)]
pub struct ClearInt {
    pub(crate) reg: RegId,
    pub(crate) size: u32,
}

/// Clear 64-bit machine integer: loop counters, addresses, channel ids.
#[derive(Clone, Debug)]
pub struct Int64 {
    pub(crate) reg: RegId,
    pub(crate) size: u32,
}

/// Secret single bit, the result kind of secret comparisons.
///
/// Kept distinct from [`SecretInt`] so bitwise composition of comparison
/// results is well typed; the 0/1 guarantee is by construction.
#[derive(Clone, Debug)]
pub struct SecretBit {
    pub(crate) reg: RegId,
    pub(crate) size: u32,
}

/// Clear single bit, the result kind of clear comparisons.
#[derive(Clone, Debug)]
pub struct ClearBit {
    pub(crate) reg: RegId,
    pub(crate) size: u32,
}

fn emit_bin(
    fe: &mut Frontend,
    dest_kind: RegKind,
    a: (RegId, u32),
    b: (RegId, u32),
    make: impl FnOnce(RegId, RegId, RegId) -> Op,
) -> Result<(RegId, u32)> {
    fe.with_broadcast(a.1, b.1, |fe| {
        let dest = fe.alloc(dest_kind);
        fe.emit(make(dest, a.0, b.0));
        Ok((dest, fe.ctx().vector_size()))
    })
}

impl SecretInt {
    /// Secret value holding a compile-time constant (trivially shared by
    /// the VM). The constant must fit the ring.
    pub fn from_const(fe: &mut Frontend, value: impl Into<BigInt>) -> Result<Self> {
        let value = value.into();
        fe.check_const_range(&value, fe.config().ring_bits, Self::KIND)?;
        let reg = fe.load_const(RegKind::Secret, &value);
        let size = fe.ctx().vector_size();
        let id = fe.fresh_id();
        Ok(Self { reg, size, id })
    }

    /// Secret input provided by one party.
    pub fn input(fe: &mut Frontend, party: u32) -> Result<Self> {
        let dest = fe.alloc(RegKind::Secret);
        fe.emit(Op::Input { dest, party });
        let size = fe.ctx().vector_size();
        let id = fe.fresh_id();
        Ok(Self {
            reg: dest,
            size,
            id,
        })
    }

    /// Promotes a clear integer by trivial sharing.
    pub fn from_clear(fe: &mut Frontend, value: &ClearInt) -> Result<Self> {
        fe.with_size(value.size, |fe| {
            let dest = fe.alloc(RegKind::Secret);
            fe.emit(Op::ConvReg {
                dest,
                src: value.reg,
            });
            let id = fe.fresh_id();
            Ok(Self {
                reg: dest,
                size: value.size,
                id,
            })
        })
    }

    /// Widens a secret bit into an integer register.
    pub fn from_bit(fe: &mut Frontend, bit: &SecretBit) -> Result<Self> {
        fe.with_size(bit.size, |fe| {
            let dest = fe.alloc(RegKind::Secret);
            fe.emit(Op::ConvReg { dest, src: bit.reg });
            let id = fe.fresh_id();
            Ok(Self {
                reg: dest,
                size: bit.size,
                id,
            })
        })
    }

    /// A uniformly random `n`-bit secret integer, composed from
    /// preprocessing random bits.
    pub fn random(fe: &mut Frontend, n: u32) -> Result<Self> {
        let size = fe.ctx().vector_size();
        let first = fe.alloc_sized(RegKind::SecretBit, n * size);
        let mut bits = Vec::with_capacity(n as usize);
        for i in 0..n {
            let reg = RegId {
                kind: RegKind::SecretBit,
                id: first.id + i * size,
            };
            fe.emit(Op::RandBit { dest: reg });
            bits.push(SecretBit { reg, size });
        }
        fe.bit_compose(&bits)
    }

    pub(crate) fn from_reg(fe: &mut Frontend, reg: RegId, size: u32) -> Self {
        let id = fe.fresh_id();
        Self { reg, size, id }
    }

    pub(crate) fn reg(&self) -> RegId {
        self.reg
    }

    /// Opens the value to all parties.
    pub fn reveal(&self, fe: &mut Frontend) -> Result<ClearInt> {
        fe.with_size(self.size, |fe| {
            let dest = fe.alloc(RegKind::Clear);
            fe.emit(Op::Reveal {
                dest,
                src: self.reg,
            });
            Ok(ClearInt {
                reg: dest,
                size: self.size,
            })
        })
    }

    /// Opens the value to a single party only.
    pub fn reveal_to(&self, fe: &mut Frontend, party: u32) -> Result<ClearInt> {
        fe.with_size(self.size, |fe| {
            let dest = fe.alloc(RegKind::Clear);
            fe.emit(Op::RevealTo {
                party,
                dest,
                src: self.reg,
            });
            Ok(ClearInt {
                reg: dest,
                size: self.size,
            })
        })
    }

    /// Addition with a clear operand (linear, no communication in the VM).
    pub fn add_clear(&self, fe: &mut Frontend, other: &ClearInt) -> Result<Self> {
        let (reg, size) = emit_bin(
            fe,
            RegKind::Secret,
            (self.reg, self.size),
            (other.reg, other.size),
            |dest, a, b| Op::Add { dest, a, b },
        )?;
        Ok(Self::from_reg(fe, reg, size))
    }

    /// Subtraction of a clear operand.
    pub fn sub_clear(&self, fe: &mut Frontend, other: &ClearInt) -> Result<Self> {
        let (reg, size) = emit_bin(
            fe,
            RegKind::Secret,
            (self.reg, self.size),
            (other.reg, other.size),
            |dest, a, b| Op::Sub { dest, a, b },
        )?;
        Ok(Self::from_reg(fe, reg, size))
    }

    /// Multiplication by a clear operand (linear).
    pub fn mul_clear(&self, fe: &mut Frontend, other: &ClearInt) -> Result<Self> {
        let (reg, size) = emit_bin(
            fe,
            RegKind::Secret,
            (self.reg, self.size),
            (other.reg, other.size),
            |dest, a, b| Op::Mul { dest, a, b },
        )?;
        Ok(Self::from_reg(fe, reg, size))
    }

    /// Equality, via the equality-to-zero primitive on the difference.
    pub fn eq(&self, fe: &mut Frontend, other: &Self) -> Result<SecretBit> {
        let diff = self.sub(fe, other)?;
        let k = fe.ctx().bit_length();
        fe.with_size(diff.size, |fe| {
            let dest = fe.alloc(RegKind::SecretBit);
            fe.emit(Op::Eqz {
                dest,
                src: diff.reg,
                k,
            });
            Ok(SecretBit {
                reg: dest,
                size: diff.size,
            })
        })
    }

    /// Inequality.
    pub fn ne(&self, fe: &mut Frontend, other: &Self) -> Result<SecretBit> {
        let eq = self.eq(fe, other)?;
        eq.not(fe)
    }

    /// Less-or-equal: `!(other < self)`.
    pub fn le(&self, fe: &mut Frontend, other: &Self) -> Result<SecretBit> {
        let gt = other.lt(fe, self)?;
        gt.not(fe)
    }

    /// Greater-than.
    pub fn gt(&self, fe: &mut Frontend, other: &Self) -> Result<SecretBit> {
        other.lt(fe, self)
    }

    /// Greater-or-equal.
    pub fn ge(&self, fe: &mut Frontend, other: &Self) -> Result<SecretBit> {
        let lt = self.lt(fe, other)?;
        lt.not(fe)
    }

    /// Left shift by a public amount (a scaling, stays linear).
    pub fn shl(&self, fe: &mut Frontend, amount: u32) -> Result<Self> {
        fe.with_size(self.size, |fe| {
            let dest = fe.alloc(RegKind::Secret);
            fe.emit(Op::Shl {
                dest,
                src: self.reg,
                amount,
            });
            let id = fe.fresh_id();
            Ok(Self {
                reg: dest,
                size: self.size,
                id,
            })
        })
    }

    /// Right shift via the truncation protocol, rounding per configuration.
    pub fn shr(&self, fe: &mut Frontend, amount: u32) -> Result<Self> {
        let k = fe.ctx().bit_length();
        fe.with_size(self.size, |fe| {
            let dest = fe.alloc(RegKind::Secret);
            let op = match fe.config().rounding {
                Rounding::Probabilistic => Op::TruncPr {
                    dest,
                    src: self.reg,
                    k,
                    m: amount,
                },
                Rounding::Nearest => Op::TruncRound {
                    dest,
                    src: self.reg,
                    k,
                    m: amount,
                },
            };
            fe.emit(op);
            let id = fe.fresh_id();
            Ok(Self {
                reg: dest,
                size: self.size,
                id,
            })
        })
    }

    /// Exponentiation by a secret exponent of at most `exp_bits` bits:
    /// square-and-multiply driven by the exponent's bit decomposition.
    pub fn pow_secret(&self, fe: &mut Frontend, exp: &Self, exp_bits: u32) -> Result<Self> {
        let bits = fe.bit_decompose(exp, exp_bits)?;
        let one = self.one_like(fe)?;
        let mut base = self.clone();
        let mut acc = one.clone();
        for (i, bit) in bits.iter().enumerate() {
            let factor = bit.select_int(fe, &base, &one)?;
            acc = acc.mul(fe, &factor)?;
            if i + 1 < bits.len() {
                base = base.square(fe)?;
            }
        }
        Ok(acc)
    }
}

impl NumberOps for SecretInt {
    const KIND: &'static str = "secret integer";
    type Cond = SecretBit;

    fn size(&self) -> u32 {
        self.size
    }

    fn add(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let (reg, size) = emit_bin(
            fe,
            RegKind::Secret,
            (self.reg, self.size),
            (other.reg, other.size),
            |dest, a, b| Op::Add { dest, a, b },
        )?;
        Ok(Self::from_reg(fe, reg, size))
    }

    fn sub(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let (reg, size) = emit_bin(
            fe,
            RegKind::Secret,
            (self.reg, self.size),
            (other.reg, other.size),
            |dest, a, b| Op::Sub { dest, a, b },
        )?;
        Ok(Self::from_reg(fe, reg, size))
    }

    fn mul(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let (reg, size) = emit_bin(
            fe,
            RegKind::Secret,
            (self.reg, self.size),
            (other.reg, other.size),
            |dest, a, b| Op::Mul { dest, a, b },
        )?;
        Ok(Self::from_reg(fe, reg, size))
    }

    fn neg(&self, fe: &mut Frontend) -> Result<Self> {
        fe.with_size(self.size, |fe| {
            let dest = fe.alloc(RegKind::Secret);
            fe.emit(Op::Neg {
                dest,
                src: self.reg,
            });
            let id = fe.fresh_id();
            Ok(Self {
                reg: dest,
                size: self.size,
                id,
            })
        })
    }

    fn zero_like(&self, fe: &mut Frontend) -> Result<Self> {
        fe.with_size(self.size, |fe| SecretInt::from_const(fe, 0))
    }

    fn one_like(&self, fe: &mut Frontend) -> Result<Self> {
        fe.with_size(self.size, |fe| SecretInt::from_const(fe, 1))
    }

    /// Signed less-than via the less-than-zero primitive on the difference.
    fn lt(&self, fe: &mut Frontend, other: &Self) -> Result<SecretBit> {
        let diff = self.sub(fe, other)?;
        let k = fe.ctx().bit_length();
        fe.with_size(diff.size, |fe| {
            let dest = fe.alloc(RegKind::SecretBit);
            fe.emit(Op::Ltz {
                dest,
                src: diff.reg,
                k,
            });
            Ok(SecretBit {
                reg: dest,
                size: diff.size,
            })
        })
    }

    fn select(fe: &mut Frontend, cond: &SecretBit, t: &Self, f: &Self) -> Result<Self> {
        cond.select_int(fe, t, f)
    }
}

impl IntOps for SecretInt {}

impl SecretBit {
    /// A fresh random secret bit from preprocessing.
    pub fn random(fe: &mut Frontend) -> Result<Self> {
        let dest = fe.alloc(RegKind::SecretBit);
        fe.emit(Op::RandBit { dest });
        Ok(Self {
            reg: dest,
            size: fe.ctx().vector_size(),
        })
    }

    /// A public 0 or 1 held in a secret-typed bit register.
    pub fn constant(fe: &mut Frontend, value: bool) -> Result<Self> {
        let reg = fe.load_const(RegKind::SecretBit, &BigInt::from(value as u8));
        Ok(Self {
            reg,
            size: fe.ctx().vector_size(),
        })
    }

    /// Batch width of this bit.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub(crate) fn reg(&self) -> RegId {
        self.reg
    }

    fn bin(
        &self,
        fe: &mut Frontend,
        other: &Self,
        make: impl FnOnce(RegId, RegId, RegId) -> Op,
    ) -> Result<(RegId, u32)> {
        emit_bin(
            fe,
            RegKind::SecretBit,
            (self.reg, self.size),
            (other.reg, other.size),
            make,
        )
    }

    /// XOR via ring arithmetic: `a + b - 2ab`.
    pub fn xor(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let (ab, _) = self.bin(fe, other, |dest, a, b| Op::Mul { dest, a, b })?;
        let (s, size) = self.bin(fe, other, |dest, a, b| Op::Add { dest, a, b })?;
        fe.with_size(size, |fe| {
            let two_ab = fe.alloc(RegKind::SecretBit);
            fe.emit(Op::Add {
                dest: two_ab,
                a: ab,
                b: ab,
            });
            let dest = fe.alloc(RegKind::SecretBit);
            fe.emit(Op::Sub {
                dest,
                a: s,
                b: two_ab,
            });
            Ok(Self { reg: dest, size })
        })
    }

    /// AND via ring arithmetic: `ab`.
    pub fn and(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let (reg, size) = self.bin(fe, other, |dest, a, b| Op::Mul { dest, a, b })?;
        Ok(Self { reg, size })
    }

    /// OR via ring arithmetic: `a + b - ab`.
    pub fn or(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let (ab, _) = self.bin(fe, other, |dest, a, b| Op::Mul { dest, a, b })?;
        let (s, size) = self.bin(fe, other, |dest, a, b| Op::Add { dest, a, b })?;
        fe.with_size(size, |fe| {
            let dest = fe.alloc(RegKind::SecretBit);
            fe.emit(Op::Sub { dest, a: s, b: ab });
            Ok(Self { reg: dest, size })
        })
    }

    /// NOT via ring arithmetic: `1 - a`.
    pub fn not(&self, fe: &mut Frontend) -> Result<Self> {
        fe.with_size(self.size, |fe| {
            let one = fe.load_const(RegKind::SecretBit, &BigInt::from(1));
            let dest = fe.alloc(RegKind::SecretBit);
            fe.emit(Op::Sub {
                dest,
                a: one,
                b: self.reg,
            });
            Ok(Self {
                reg: dest,
                size: self.size,
            })
        })
    }

    /// Selects between two secret integers: `f + cond * (t - f)`, a single
    /// multiplication, valid because the receiver is 0/1 by construction.
    pub fn select_int(
        &self,
        fe: &mut Frontend,
        t: &SecretInt,
        f: &SecretInt,
    ) -> Result<SecretInt> {
        let d = t.sub(fe, f)?;
        let (cd, _) = emit_bin(
            fe,
            RegKind::Secret,
            (self.reg, self.size),
            (d.reg, d.size),
            |dest, a, b| Op::Mul { dest, a, b },
        )?;
        let (reg, size) = emit_bin(
            fe,
            RegKind::Secret,
            (f.reg, f.size),
            (cd, self.size.max(d.size)),
            |dest, a, b| Op::Add { dest, a, b },
        )?;
        Ok(SecretInt::from_reg(fe, reg, size))
    }
}

impl ClearInt {
    /// Clear constant; must fit the ring.
    pub fn from_const(fe: &mut Frontend, value: impl Into<BigInt>) -> Result<Self> {
        let value = value.into();
        fe.check_const_range(&value, fe.config().ring_bits, Self::KIND)?;
        let reg = fe.load_const(RegKind::Clear, &value);
        Ok(Self {
            reg,
            size: fe.ctx().vector_size(),
        })
    }

    pub(crate) fn from_reg(reg: RegId, size: u32) -> Self {
        Self { reg, size }
    }

    pub(crate) fn reg(&self) -> RegId {
        self.reg
    }

    /// Clear division.
    pub fn div(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let (reg, size) = emit_bin(
            fe,
            RegKind::Clear,
            (self.reg, self.size),
            (other.reg, other.size),
            |dest, a, b| Op::Div { dest, a, b },
        )?;
        Ok(Self { reg, size })
    }

    /// Clear remainder.
    pub fn modulo(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let (reg, size) = emit_bin(
            fe,
            RegKind::Clear,
            (self.reg, self.size),
            (other.reg, other.size),
            |dest, a, b| Op::Mod { dest, a, b },
        )?;
        Ok(Self { reg, size })
    }

    /// Clear equality.
    pub fn eq(&self, fe: &mut Frontend, other: &Self) -> Result<ClearBit> {
        let (reg, size) = emit_bin(
            fe,
            RegKind::Clear,
            (self.reg, self.size),
            (other.reg, other.size),
            |dest, a, b| Op::EqC { dest, a, b },
        )?;
        Ok(ClearBit { reg, size })
    }

    /// Clear inequality.
    pub fn ne(&self, fe: &mut Frontend, other: &Self) -> Result<ClearBit> {
        let eq = self.eq(fe, other)?;
        eq.not(fe)
    }

    /// Clear `self <= other`.
    pub fn le(&self, fe: &mut Frontend, other: &Self) -> Result<ClearBit> {
        let gt = other.lt(fe, self)?;
        gt.not(fe)
    }

    /// Clear `self > other`.
    pub fn gt(&self, fe: &mut Frontend, other: &Self) -> Result<ClearBit> {
        other.lt(fe, self)
    }

    /// Clear `self >= other`.
    pub fn ge(&self, fe: &mut Frontend, other: &Self) -> Result<ClearBit> {
        let lt = self.lt(fe, other)?;
        lt.not(fe)
    }

    /// Left shift by a public amount.
    pub fn shl(&self, fe: &mut Frontend, amount: u32) -> Result<Self> {
        fe.with_size(self.size, |fe| {
            let dest = fe.alloc(RegKind::Clear);
            fe.emit(Op::Shl {
                dest,
                src: self.reg,
                amount,
            });
            Ok(Self {
                reg: dest,
                size: self.size,
            })
        })
    }

    /// Right shift by a public amount.
    pub fn shr(&self, fe: &mut Frontend, amount: u32) -> Result<Self> {
        fe.with_size(self.size, |fe| {
            let dest = fe.alloc(RegKind::Clear);
            fe.emit(Op::Shr {
                dest,
                src: self.reg,
                amount,
            });
            Ok(Self {
                reg: dest,
                size: self.size,
            })
        })
    }
}

impl NumberOps for ClearInt {
    const KIND: &'static str = "clear integer";
    type Cond = ClearBit;

    fn size(&self) -> u32 {
        self.size
    }

    fn add(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let (reg, size) = emit_bin(
            fe,
            RegKind::Clear,
            (self.reg, self.size),
            (other.reg, other.size),
            |dest, a, b| Op::Add { dest, a, b },
        )?;
        Ok(Self { reg, size })
    }

    fn sub(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let (reg, size) = emit_bin(
            fe,
            RegKind::Clear,
            (self.reg, self.size),
            (other.reg, other.size),
            |dest, a, b| Op::Sub { dest, a, b },
        )?;
        Ok(Self { reg, size })
    }

    fn mul(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let (reg, size) = emit_bin(
            fe,
            RegKind::Clear,
            (self.reg, self.size),
            (other.reg, other.size),
            |dest, a, b| Op::Mul { dest, a, b },
        )?;
        Ok(Self { reg, size })
    }

    fn neg(&self, fe: &mut Frontend) -> Result<Self> {
        fe.with_size(self.size, |fe| {
            let dest = fe.alloc(RegKind::Clear);
            fe.emit(Op::Neg {
                dest,
                src: self.reg,
            });
            Ok(Self {
                reg: dest,
                size: self.size,
            })
        })
    }

    fn zero_like(&self, fe: &mut Frontend) -> Result<Self> {
        fe.with_size(self.size, |fe| ClearInt::from_const(fe, 0))
    }

    fn one_like(&self, fe: &mut Frontend) -> Result<Self> {
        fe.with_size(self.size, |fe| ClearInt::from_const(fe, 1))
    }

    fn lt(&self, fe: &mut Frontend, other: &Self) -> Result<ClearBit> {
        let (reg, size) = emit_bin(
            fe,
            RegKind::Clear,
            (self.reg, self.size),
            (other.reg, other.size),
            |dest, a, b| Op::LtC { dest, a, b },
        )?;
        Ok(ClearBit { reg, size })
    }

    fn select(fe: &mut Frontend, cond: &ClearBit, t: &Self, f: &Self) -> Result<Self> {
        let cond = ClearInt {
            reg: cond.reg,
            size: cond.size,
        };
        let d = t.sub(fe, f)?;
        let cd = cond.mul(fe, &d)?;
        f.add(fe, &cd)
    }
}

impl IntOps for ClearInt {}

impl ClearBit {
    /// Batch width of this bit.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Widens into a clear integer (same register file, new type).
    pub fn to_clear_int(&self) -> ClearInt {
        ClearInt {
            reg: self.reg,
            size: self.size,
        }
    }

    /// NOT: `1 - a`.
    pub fn not(&self, fe: &mut Frontend) -> Result<Self> {
        fe.with_size(self.size, |fe| {
            let one = fe.load_const(RegKind::Clear, &BigInt::from(1));
            let dest = fe.alloc(RegKind::Clear);
            fe.emit(Op::Sub {
                dest,
                a: one,
                b: self.reg,
            });
            Ok(Self {
                reg: dest,
                size: self.size,
            })
        })
    }
}

impl Int64 {
    /// Machine-integer constant.
    pub fn from_const(fe: &mut Frontend, value: i64) -> Result<Self> {
        let reg = fe.load_const(RegKind::Int64, &BigInt::from(value));
        Ok(Self {
            reg,
            size: fe.ctx().vector_size(),
        })
    }

    pub(crate) fn from_reg(reg: RegId, size: u32) -> Self {
        Self { reg, size }
    }

    pub(crate) fn reg(&self) -> RegId {
        self.reg
    }

    /// Converts into a clear ring element.
    pub fn to_clear(&self, fe: &mut Frontend) -> Result<ClearInt> {
        fe.with_size(self.size, |fe| {
            let dest = fe.alloc(RegKind::Clear);
            fe.emit(Op::ConvReg {
                dest,
                src: self.reg,
            });
            Ok(ClearInt {
                reg: dest,
                size: self.size,
            })
        })
    }

    /// Equality, yielding a machine-integer 0/1.
    pub fn eq(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let (reg, size) = emit_bin(
            fe,
            RegKind::Int64,
            (self.reg, self.size),
            (other.reg, other.size),
            |dest, a, b| Op::EqC { dest, a, b },
        )?;
        Ok(Self { reg, size })
    }
}

impl NumberOps for Int64 {
    const KIND: &'static str = "machine integer";
    type Cond = Int64;

    fn size(&self) -> u32 {
        self.size
    }

    fn add(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let (reg, size) = emit_bin(
            fe,
            RegKind::Int64,
            (self.reg, self.size),
            (other.reg, other.size),
            |dest, a, b| Op::Add { dest, a, b },
        )?;
        Ok(Self { reg, size })
    }

    fn sub(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let (reg, size) = emit_bin(
            fe,
            RegKind::Int64,
            (self.reg, self.size),
            (other.reg, other.size),
            |dest, a, b| Op::Sub { dest, a, b },
        )?;
        Ok(Self { reg, size })
    }

    fn mul(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let (reg, size) = emit_bin(
            fe,
            RegKind::Int64,
            (self.reg, self.size),
            (other.reg, other.size),
            |dest, a, b| Op::Mul { dest, a, b },
        )?;
        Ok(Self { reg, size })
    }

    fn neg(&self, fe: &mut Frontend) -> Result<Self> {
        fe.with_size(self.size, |fe| {
            let dest = fe.alloc(RegKind::Int64);
            fe.emit(Op::Neg {
                dest,
                src: self.reg,
            });
            Ok(Self {
                reg: dest,
                size: self.size,
            })
        })
    }

    fn zero_like(&self, fe: &mut Frontend) -> Result<Self> {
        fe.with_size(self.size, |fe| Int64::from_const(fe, 0))
    }

    fn one_like(&self, fe: &mut Frontend) -> Result<Self> {
        fe.with_size(self.size, |fe| Int64::from_const(fe, 1))
    }

    fn lt(&self, fe: &mut Frontend, other: &Self) -> Result<Int64> {
        let (reg, size) = emit_bin(
            fe,
            RegKind::Int64,
            (self.reg, self.size),
            (other.reg, other.size),
            |dest, a, b| Op::LtC { dest, a, b },
        )?;
        Ok(Self { reg, size })
    }

    fn select(fe: &mut Frontend, cond: &Int64, t: &Self, f: &Self) -> Result<Self> {
        let d = t.sub(fe, f)?;
        let cd = cond.mul(fe, &d)?;
        f.add(fe, &cd)
    }
}

impl IntOps for Int64 {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;

    #[test]
    fn secret_lt_emits_ltz_at_ring_width() {
        let mut fe = Frontend::new(CompilerConfig::default());
        let a = SecretInt::from_const(&mut fe, 3).unwrap();
        let b = SecretInt::from_const(&mut fe, 5).unwrap();
        a.lt(&mut fe, &b).unwrap();
        assert_eq!(
            fe.tape().count_ops(|op| matches!(op, Op::Ltz { k: 64, .. })),
            1
        );
    }

    #[test]
    fn random_int_composes_fresh_bits_in_place() {
        let mut fe = Frontend::new(CompilerConfig::default());
        SecretInt::random(&mut fe, 8).unwrap();
        assert_eq!(fe.tape().count_ops(|op| matches!(op, Op::RandBit { .. })), 8);
        assert_eq!(
            fe.tape()
                .count_ops(|op| matches!(op, Op::BitCompose { n: 8, .. })),
            1
        );
        // the bits are allocated as one run, so no copies are needed
        assert_eq!(fe.tape().count_ops(|op| matches!(op, Op::ConvReg { .. })), 0);
    }

    #[test]
    fn sum_folds_pairwise() {
        let mut fe = Frontend::new(CompilerConfig::default());
        let xs = [1, 2, 3]
            .map(|v| ClearInt::from_const(&mut fe, v).unwrap());
        <ClearInt as NumberOps>::sum(&mut fe, &xs).unwrap();
        assert_eq!(fe.tape().count_ops(|op| matches!(op, Op::Add { .. })), 2);
        let empty: [ClearInt; 0] = [];
        assert!(<ClearInt as NumberOps>::sum(&mut fe, &empty).is_err());
    }

    #[test]
    fn broadcast_mismatch_is_rejected() {
        let mut fe = Frontend::new(CompilerConfig::default());
        let a = fe
            .with_size(2, |fe| SecretInt::from_const(fe, 1))
            .unwrap();
        let b = fe
            .with_size(3, |fe| SecretInt::from_const(fe, 1))
            .unwrap();
        assert!(a.add(&mut fe, &b).is_err());
    }

    #[test]
    fn broadcast_widens_to_max() {
        let mut fe = Frontend::new(CompilerConfig::default());
        let a = fe
            .with_size(4, |fe| SecretInt::from_const(fe, 1))
            .unwrap();
        let b = SecretInt::from_const(&mut fe, 2).unwrap();
        let c = a.add(&mut fe, &b).unwrap();
        assert_eq!(c.size(), 4);
        let d = b.add(&mut fe, &a).unwrap();
        assert_eq!(d.size(), 4);
    }

    #[test]
    fn if_else_uses_one_multiplication() {
        let mut fe = Frontend::new(CompilerConfig::default());
        let a = SecretInt::from_const(&mut fe, 10).unwrap();
        let b = SecretInt::from_const(&mut fe, 20).unwrap();
        let c = a.eq(&mut fe, &b).unwrap();
        let before = fe.tape().count_ops(|op| matches!(op, Op::Mul { .. }));
        c.select_int(&mut fe, &a, &b).unwrap();
        let after = fe.tape().count_ops(|op| matches!(op, Op::Mul { .. }));
        assert_eq!(after - before, 1);
    }

    #[test]
    fn pow_public_is_square_and_multiply() {
        let mut fe = Frontend::new(CompilerConfig::default());
        let a = SecretInt::from_const(&mut fe, 3).unwrap();
        a.pow_public(&mut fe, 13).unwrap();
        // 13 = 0b1101: three squarings, two extra multiplies
        let muls = fe.tape().count_ops(|op| matches!(op, Op::Mul { .. }));
        assert_eq!(muls, 5);
    }

    #[test]
    fn bit_decomposition_is_memoized() {
        let mut fe = Frontend::new(CompilerConfig::default());
        let a = SecretInt::from_const(&mut fe, 99).unwrap();
        let first = fe.bit_decompose(&a, 8).unwrap();
        let second = fe.bit_decompose(&a, 8).unwrap();
        assert_eq!(first[0].reg(), second[0].reg());
        assert_eq!(
            fe.tape().count_ops(|op| matches!(op, Op::BitDec { .. })),
            1
        );
        // a different requested width is a different computation
        fe.bit_decompose(&a, 16).unwrap();
        assert_eq!(
            fe.tape().count_ops(|op| matches!(op, Op::BitDec { .. })),
            2
        );
    }
}
