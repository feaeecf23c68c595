//! Binary-domain kinds: clear and secret binary-field elements.
//!
//! These live in the binary circuit domain; logical operators are native
//! gates, and there is no implicit path to or from the arithmetic kinds.
//! Crossing the boundary is always explicit bit decomposition plus
//! recomposition.

use mpc_ir::{Op, RegId, RegKind};
use num_bigint::BigInt;

use crate::context::Domain;
use crate::error::Result;
use crate::frontend::Frontend;

/// Clear binary-field element of `n_bits` bits.
#[derive(Clone, Debug)]
pub struct ClearBin {
    pub(crate) reg: RegId,
    pub(crate) size: u32,
    pub(crate) n_bits: u32,
}

/// Secret-shared binary-field element of `n_bits` bits.
#[derive(Clone, Debug)]
pub struct SecretBin {
    pub(crate) reg: RegId,
    pub(crate) size: u32,
    pub(crate) n_bits: u32,
}

fn emit_bin(
    fe: &mut Frontend,
    kind: RegKind,
    a: (RegId, u32),
    b: (RegId, u32),
    make: impl FnOnce(RegId, RegId, RegId) -> Op,
) -> Result<(RegId, u32)> {
    fe.with_domain(Domain::Binary, |fe| {
        fe.with_broadcast(a.1, b.1, |fe| {
            let dest = fe.alloc(kind);
            fe.emit(make(dest, a.0, b.0));
            Ok((dest, fe.ctx().vector_size()))
        })
    })
}

macro_rules! bin_kind {
    ($ty:ident, $regkind:expr, $kindname:literal) => {
        impl $ty {
            /// Constant of `n_bits` bits.
            pub fn from_const(fe: &mut Frontend, value: u64, n_bits: u32) -> Result<Self> {
                let big = BigInt::from(value);
                fe.check_const_range(&big, n_bits, $kindname)?;
                let reg = fe.load_const($regkind, &big);
                Ok(Self {
                    reg,
                    size: fe.ctx().vector_size(),
                    n_bits,
                })
            }

            /// Batch width.
            pub fn size(&self) -> u32 {
                self.size
            }

            /// Declared bit width.
            pub fn n_bits(&self) -> u32 {
                self.n_bits
            }

            /// Bitwise XOR (free in the binary domain).
            pub fn xor(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
                let n_bits = self.n_bits.max(other.n_bits);
                let (reg, size) = emit_bin(
                    fe,
                    $regkind,
                    (self.reg, self.size),
                    (other.reg, other.size),
                    |dest, a, b| Op::Xor { dest, a, b },
                )?;
                Ok(Self { reg, size, n_bits })
            }

            /// Bitwise AND.
            pub fn and(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
                let n_bits = self.n_bits.max(other.n_bits);
                let (reg, size) = emit_bin(
                    fe,
                    $regkind,
                    (self.reg, self.size),
                    (other.reg, other.size),
                    |dest, a, b| Op::And { dest, a, b },
                )?;
                Ok(Self { reg, size, n_bits })
            }

            /// Bitwise OR: `(a ^ b) ^ (a & b)`.
            pub fn or(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
                let x = self.xor(fe, other)?;
                let a = self.and(fe, other)?;
                x.xor(fe, &a)
            }

            /// Bitwise NOT over the declared width.
            pub fn not(&self, fe: &mut Frontend) -> Result<Self> {
                fe.with_bit_length(self.n_bits, |fe| {
                    fe.with_size(self.size, |fe| {
                        let dest = fe.alloc($regkind);
                        fe.emit(Op::Not {
                            dest,
                            src: self.reg,
                        });
                        Ok(Self {
                            reg: dest,
                            size: self.size,
                            n_bits: self.n_bits,
                        })
                    })
                })
            }

            /// Left shift by a public amount; width is preserved.
            pub fn shl(&self, fe: &mut Frontend, amount: u32) -> Result<Self> {
                fe.with_size(self.size, |fe| {
                    let dest = fe.alloc($regkind);
                    fe.emit(Op::Shl {
                        dest,
                        src: self.reg,
                        amount,
                    });
                    Ok(Self {
                        reg: dest,
                        size: self.size,
                        n_bits: self.n_bits,
                    })
                })
            }

            /// Right shift by a public amount (plain bit movement; no
            /// protocol involved in the binary domain).
            pub fn shr(&self, fe: &mut Frontend, amount: u32) -> Result<Self> {
                fe.with_size(self.size, |fe| {
                    let dest = fe.alloc($regkind);
                    fe.emit(Op::Shr {
                        dest,
                        src: self.reg,
                        amount,
                    });
                    Ok(Self {
                        reg: dest,
                        size: self.size,
                        n_bits: self.n_bits,
                    })
                })
            }
        }
    };
}

bin_kind!(ClearBin, RegKind::ClearBin, "clear binary element");
bin_kind!(SecretBin, RegKind::SecretBin, "secret binary element");

impl SecretBin {
    /// Promotes a clear binary element into the secret domain.
    pub fn from_clear(fe: &mut Frontend, value: &ClearBin) -> Result<Self> {
        fe.with_size(value.size, |fe| {
            let dest = fe.alloc(RegKind::SecretBin);
            fe.emit(Op::ConvReg {
                dest,
                src: value.reg,
            });
            Ok(Self {
                reg: dest,
                size: value.size,
                n_bits: value.n_bits,
            })
        })
    }

    /// Secret binary input provided by one party.
    pub fn input(fe: &mut Frontend, party: u32, n_bits: u32) -> Result<Self> {
        let dest = fe.alloc(RegKind::SecretBin);
        fe.emit(Op::Input { dest, party });
        Ok(Self {
            reg: dest,
            size: fe.ctx().vector_size(),
            n_bits,
        })
    }

    /// Opens the element to all parties.
    pub fn reveal(&self, fe: &mut Frontend) -> Result<ClearBin> {
        fe.with_size(self.size, |fe| {
            let dest = fe.alloc(RegKind::ClearBin);
            fe.emit(Op::Reveal {
                dest,
                src: self.reg,
            });
            Ok(ClearBin {
                reg: dest,
                size: self.size,
                n_bits: self.n_bits,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;

    #[test]
    fn xor_is_native_in_binary_domain() {
        let mut fe = Frontend::new(CompilerConfig::default());
        let a = SecretBin::from_const(&mut fe, 0b1010, 4).unwrap();
        let b = SecretBin::from_const(&mut fe, 0b0110, 4).unwrap();
        a.xor(&mut fe, &b).unwrap();
        assert_eq!(fe.tape().count_ops(|op| matches!(op, Op::Xor { .. })), 1);
        assert_eq!(fe.tape().count_ops(|op| matches!(op, Op::Mul { .. })), 0);
    }

    #[test]
    fn constant_must_fit_declared_width() {
        let mut fe = Frontend::new(CompilerConfig::default());
        assert!(ClearBin::from_const(&mut fe, 16, 4).is_err());
        assert!(ClearBin::from_const(&mut fe, 15, 4).is_ok());
    }
}
