//! Secret floating point, the `(v, p, z, s)` 4-tuple representation of
//! `(1-2s)(1-z) * v * 2^p` after Aliasgari et al.
//!
//! No hardware float support is assumed anywhere: significand alignment
//! goes through the power-of-two and inversion primitives, renormalization
//! finds the top set bit with a prefix OR over the bit decomposition, and
//! every would-be status flag is an explicit secret 0/1 combined with
//! `if_else` arithmetic.

use mpc_ir::{Op, RegKind};

use crate::circuits::prefix::pre_or;
use crate::error::Result;
use crate::frontend::Frontend;
use crate::gates::ArithGates;
use crate::types::{ClearInt, NumberOps, SecretBit, SecretInt};

fn ltz_int(fe: &mut Frontend, x: &SecretInt, k: u32) -> Result<SecretInt> {
    let bit = fe.with_size(x.size(), |fe| {
        let dest = fe.alloc(RegKind::SecretBit);
        fe.emit(Op::Ltz {
            dest,
            src: x.reg(),
            k,
        });
        Ok(SecretBit {
            reg: dest,
            size: x.size(),
        })
    })?;
    SecretInt::from_bit(fe, &bit)
}

fn eqz_int(fe: &mut Frontend, x: &SecretInt, k: u32) -> Result<SecretInt> {
    let bit = fe.with_size(x.size(), |fe| {
        let dest = fe.alloc(RegKind::SecretBit);
        fe.emit(Op::Eqz {
            dest,
            src: x.reg(),
            k,
        });
        Ok(SecretBit {
            reg: dest,
            size: x.size(),
        })
    })?;
    SecretInt::from_bit(fe, &bit)
}

/// `2^x` for a secret exponent of at most `n` bits.
fn pow2(fe: &mut Frontend, x: &SecretInt, n: u32) -> Result<SecretInt> {
    fe.with_size(x.size(), |fe| {
        let dest = fe.alloc(RegKind::Secret);
        fe.emit(Op::Pow2 {
            dest,
            src: x.reg(),
            n,
        });
        let size = fe.ctx().vector_size();
        Ok(SecretInt::from_reg(fe, dest, size))
    })
}

/// Multiplicative inverse of a non-zero secret field element, by masking
/// with a preprocessed inverse pair, opening the product and inverting it
/// in the clear.
fn invert(fe: &mut Frontend, x: &SecretInt) -> Result<SecretInt> {
    let (r, r_inv) = fe.with_size(x.size(), |fe| {
        let a = fe.alloc(RegKind::Secret);
        let b = fe.alloc(RegKind::Secret);
        fe.emit(Op::Inverse { a, b });
        let size = fe.ctx().vector_size();
        let r = SecretInt::from_reg(fe, a, size);
        let r_inv = SecretInt::from_reg(fe, b, size);
        Ok((r, r_inv))
    })?;
    let masked = x.mul(fe, &r)?;
    let opened = masked.reveal(fe)?;
    let one = ClearInt::from_const(fe, 1)?;
    let opened_inv = one.div(fe, &opened)?;
    r_inv.mul_clear(fe, &opened_inv)
}

fn sconst(fe: &mut Frontend, v: i64) -> Result<SecretInt> {
    SecretInt::from_const(fe, v)
}

/// Secret floating-point value.
#[derive(Clone, Debug)]
pub struct SecretFloat {
    v: SecretInt,
    p: SecretInt,
    z: SecretInt,
    s: SecretInt,
    vlen: u32,
    plen: u32,
}

impl SecretFloat {
    /// Kind name used in error messages.
    pub const KIND: &'static str = "secret float";

    /// From a compile-time float: normalizes the significand into
    /// `[2^(vlen-1), 2^vlen)` and encodes zero and sign as explicit flags.
    pub fn from_f64(fe: &mut Frontend, value: f64, vlen: u32, plen: u32) -> Result<Self> {
        let (v, p, z, s) = if value == 0.0 {
            (0i64, 0i64, 1i64, 0i64)
        } else {
            let sign = i64::from(value < 0.0);
            let m = value.abs();
            let exp = m.log2().floor() as i64;
            let mut v = (m * 2f64.powi((i64::from(vlen) - 1 - exp) as i32)).round() as i64;
            let mut p = exp - i64::from(vlen) + 1;
            if v >= 1 << vlen {
                v >>= 1;
                p += 1;
            }
            if v < 1 << (vlen - 1) {
                v <<= 1;
                p -= 1;
            }
            (v, p, 0, sign)
        };
        Ok(Self {
            v: sconst(fe, v)?,
            p: sconst(fe, p)?,
            z: sconst(fe, z)?,
            s: sconst(fe, s)?,
            vlen,
            plen,
        })
    }

    /// From a compile-time float at the configured significand/exponent
    /// widths.
    pub fn from_f64_default(fe: &mut Frontend, value: f64) -> Result<Self> {
        let (vlen, plen) = (fe.config().float_vlen, fe.config().float_plen);
        Self::from_f64(fe, value, vlen, plen)
    }

    /// Four secret inputs from one party, pre-normalized by the provider.
    pub fn input(fe: &mut Frontend, party: u32, vlen: u32, plen: u32) -> Result<Self> {
        Ok(Self {
            v: SecretInt::input(fe, party)?,
            p: SecretInt::input(fe, party)?,
            z: SecretInt::input(fe, party)?,
            s: SecretInt::input(fe, party)?,
            vlen,
            plen,
        })
    }

    /// Significand bits.
    pub fn vlen(&self) -> u32 {
        self.vlen
    }

    /// Exponent bits.
    pub fn plen(&self) -> u32 {
        self.plen
    }

    /// Batch width.
    pub fn size(&self) -> u32 {
        self.v.size()
    }

    /// The tuple components `(v, p, z, s)`.
    pub fn parts(&self) -> (&SecretInt, &SecretInt, &SecretInt, &SecretInt) {
        (&self.v, &self.p, &self.z, &self.s)
    }

    /// Negation: flips the sign flag unless the value is zero.
    pub fn neg(&self, fe: &mut Frontend) -> Result<Self> {
        let one = sconst(fe, 1)?;
        let ns = one.sub(fe, &self.s)?;
        let nz = one.sub(fe, &self.z)?;
        let s = ns.mul(fe, &nz)?;
        Ok(Self {
            s,
            ..self.clone()
        })
    }

    /// Addition.
    ///
    /// Clear-logic branch structure over `(sign, exponent order,
    /// significand order)`: pick the dominant operand, align the smaller
    /// significand by the exponent delta, sum, and renormalize by locating
    /// the top set bit of the result.
    pub fn add(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let (vlen, plen) = (self.vlen, self.plen);
        let (v1, p1, z1, s1) = (&self.v, &self.p, &self.z, &self.s);
        let (v2, p2, z2, s2) = (&other.v, &other.p, &other.z, &other.s);
        let one_c = ClearInt::from_const(fe, 1)?;

        let diff_p = p1.sub(fe, p2)?;
        let a_bit = fe.with_bit_length(plen, |fe| p1.lt(fe, p2))?;
        let a = SecretInt::from_bit(fe, &a_bit)?;
        let b = eqz_int(fe, &diff_p, plen)?;
        let c_bit = fe.with_bit_length(vlen, |fe| v1.lt(fe, v2))?;
        let c = SecretInt::from_bit(fe, &c_bit)?;

        let ap1 = a.mul(fe, p1)?;
        let ap2 = a.mul(fe, p2)?;
        let av1 = a.mul(fe, v1)?;
        let av2 = a.mul(fe, v2)?;
        let cv1 = c.mul(fe, v1)?;
        let cv2 = c.mul(fe, v2)?;
        let one = sconst(fe, 1)?;
        let bneg = one.sub(fe, &b)?;

        // pmax = a ? p2 : p1, pmin the other way round
        let pmax = ap2.add(fe, p1)?.sub(fe, &ap1)?;
        let pmin = p2.sub(fe, &ap2)?.add(fe, &ap1)?;
        // vmax selected by exponent order, by significand order on a tie
        let t1 = av2.add(fe, v1)?.sub(fe, &av1)?;
        let t2 = cv2.add(fe, v1)?.sub(fe, &cv1)?;
        let bt1 = bneg.mul(fe, &t1)?;
        let bt2 = b.mul(fe, &t2)?;
        let vmax = bt1.add(fe, &bt2)?;
        let u1 = av1.add(fe, v2)?.sub(fe, &av2)?;
        let u2 = cv1.add(fe, v2)?.sub(fe, &cv2)?;
        let bu1 = bneg.mul(fe, &u1)?;
        let bu2 = b.mul(fe, &u2)?;
        let vmin = bu1.add(fe, &bu2)?;

        // s3 = s1 xor s2
        let s1s2 = s1.mul(fe, s2)?;
        let two_s1s2 = s1s2.add(fe, &s1s2)?;
        let s3 = s1.add(fe, s2)?.sub(fe, &two_s1s2)?;

        // d: exponent gap exceeds the significand width, the small operand
        // vanishes entirely
        let delta = pmax.sub(fe, &pmin)?;
        let gap = sconst(fe, i64::from(vlen))?
            .add(fe, &pmin)?
            .sub(fe, &pmax)?;
        let d = ltz_int(fe, &gap, plen)?;
        let dneg = one.sub(fe, &d)?;
        let capped_delta = dneg.mul(fe, &delta)?;
        let pow_delta = pow2(fe, &capped_delta, vlen + 1)?;

        let v3 = vmax.clone();
        let sign_factor = one.sub(fe, &s3)?.sub(fe, &s3)?;
        let signed_vmin = sign_factor.mul(fe, &vmin)?;
        let aligned = vmax.mul(fe, &pow_delta)?;
        let v4 = aligned.add(fe, &signed_vmin)?;
        let dv3 = d.mul(fe, &v3)?;
        let dv4 = dneg.mul(fe, &v4)?;
        let to_trunc = dv3.add(fe, &dv4)?;

        // rescale by 2^vlen / pow_delta, then drop the vlen-1 guard bits
        let scaled = to_trunc.shl(fe, vlen)?;
        let pow_delta_inv = invert(fe, &pow_delta)?;
        let widened = scaled.mul(fe, &pow_delta_inv)?;
        let v = fe.with_bit_length(2 * vlen + 1, |fe| widened.shr(fe, vlen - 1))?;

        // renormalize: prefix OR from the top bit locates the leading one
        let bits = fe.bit_decompose(&v, vlen + 2)?;
        let msb_first: Vec<SecretBit> = bits[1..].iter().rev().cloned().collect();
        let mut g = ArithGates::new(fe);
        let h = pre_or(&mut g, &msb_first)?;
        let mut p0 = sconst(fe, i64::from(vlen) + 1)?;
        for hi in &h {
            let hi_int = SecretInt::from_bit(fe, hi)?;
            p0 = p0.sub(fe, &hi_int)?;
        }
        let mut not_h = Vec::with_capacity(h.len());
        for hi in &h {
            not_h.push(hi.not(fe)?);
        }
        let composed = fe.bit_compose(&not_h)?;
        let pow_p0 = composed.add_clear(fe, &one_c)?;
        let renorm = pow_p0.mul(fe, &v)?;
        let t2v = fe.with_bit_length(vlen + 2, |fe| renorm.shr(fe, 2))?;
        let p_res = pmax.sub(fe, &p0)?.add_clear(fe, &one_c)?;

        // zero handling: either input zero passes the other through
        let zz = z1.mul(fe, z2)?;
        let zprod = one.sub(fe, z1)?.sub(fe, z2)?.add(fe, &zz)?;
        let zt = zprod.mul(fe, &t2v)?;
        let z1v2 = z1.mul(fe, v2)?;
        let z2v1 = z2.mul(fe, v1)?;
        let v_out = zt.add(fe, &z1v2)?.add(fe, &z2v1)?;
        let z_out = eqz_int(fe, &v_out, vlen)?;
        let zp = zprod.mul(fe, &p_res)?;
        let z1p2 = z1.mul(fe, p2)?;
        let z2p1 = z2.mul(fe, p1)?;
        let p_mix = zp.add(fe, &z1p2)?.add(fe, &z2p1)?;
        let znot = one.sub(fe, &z_out)?;
        let p_out = p_mix.mul(fe, &znot)?;

        // the surviving operand's sign wins
        let aneg = one.sub(fe, &a)?;
        let cneg = one.sub(fe, &c)?;
        let as2 = a.mul(fe, s2)?;
        let as1 = aneg.mul(fe, s1)?;
        let cs2 = c.mul(fe, s2)?;
        let cs1 = cneg.mul(fe, s1)?;
        let sa = as2.add(fe, &as1)?;
        let sc = cs2.add(fe, &cs1)?;
        let sba = bneg.mul(fe, &sa)?;
        let sbc = b.mul(fe, &sc)?;
        let s_pre = sba.add(fe, &sbc)?;
        let zs = zprod.mul(fe, &s_pre)?;
        let z2only = z2.sub(fe, &zz)?;
        let z1only = z1.sub(fe, &zz)?;
        let s_from1 = z2only.mul(fe, s1)?;
        let s_from2 = z1only.mul(fe, s2)?;
        let s_out = zs.add(fe, &s_from1)?.add(fe, &s_from2)?;

        Ok(Self {
            v: v_out,
            p: p_out,
            z: z_out,
            s: s_out,
            vlen,
            plen,
        })
    }

    /// Subtraction as addition of the negated operand.
    pub fn sub(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let negated = other.neg(fe)?;
        self.add(fe, &negated)
    }

    /// Multiplication: truncate the double-width significand product,
    /// adjust the exponent for the possible carry bit.
    pub fn mul(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        let (vlen, plen) = (self.vlen, self.plen);
        let raw = self.v.mul(fe, &other.v)?;
        let v1 = fe.with_bit_length(2 * vlen, |fe| raw.shr(fe, vlen - 1))?;
        let c2exp = ClearInt::from_const(fe, 1i64 << vlen)?;
        let t = v1.sub_clear(fe, &c2exp)?;
        let b = ltz_int(fe, &t, vlen + 1)?;
        let bv = b.mul(fe, &v1)?.add(fe, &v1)?;
        let v2 = fe.with_bit_length(vlen + 1, |fe| bv.shr(fe, 1))?;

        let zz = self.z.mul(fe, &other.z)?;
        let z = self.z.add(fe, &other.z)?.sub(fe, &zz)?;
        let ss = self.s.mul(fe, &other.s)?;
        let two_ss = ss.add(fe, &ss)?;
        let s = self.s.add(fe, &other.s)?.sub(fe, &two_ss)?;
        let vlen_c = ClearInt::from_const(fe, i64::from(vlen))?;
        let p_sum = self.p.add(fe, &other.p)?.sub(fe, &b)?.add_clear(fe, &vlen_c)?;
        let one = sconst(fe, 1)?;
        let znot = one.sub(fe, &z)?;
        let p = p_sum.mul(fe, &znot)?;
        Ok(Self {
            v: v2,
            p,
            z,
            s,
            vlen,
            plen,
        })
    }

    /// Less-than, composed from sign, exponent order and signed
    /// significand order.
    pub fn lt(&self, fe: &mut Frontend, other: &Self) -> Result<SecretBit> {
        let (vlen, plen) = (self.vlen, self.plen);
        let (z1, s1) = (&self.z, &self.s);
        let (z2, s2) = (&other.z, &other.s);
        let one = sconst(fe, 1)?;

        let a_bit = fe.with_bit_length(plen, |fe| self.p.lt(fe, &other.p))?;
        let a = SecretInt::from_bit(fe, &a_bit)?;
        let diff_p = self.p.sub(fe, &other.p)?;
        let c = eqz_int(fe, &diff_p, plen)?;
        let sf1 = one.sub(fe, s1)?.sub(fe, s1)?;
        let sf2 = one.sub(fe, s2)?.sub(fe, s2)?;
        let sv1 = sf1.mul(fe, &self.v)?;
        let sv2 = sf2.mul(fe, &other.v)?;
        let d_bit = fe.with_bit_length(vlen + 1, |fe| sv1.lt(fe, &sv2))?;
        let d = SecretInt::from_bit(fe, &d_bit)?;

        let cd = c.mul(fe, &d)?;
        let ca = c.mul(fe, &a)?;
        let b1 = cd.add(fe, &a)?.sub(fe, &ca)?;
        let b2 = cd
            .add(fe, &one)?
            .add(fe, &ca)?
            .sub(fe, &c)?
            .sub(fe, &a)?;
        let s12 = s1.mul(fe, s2)?;
        let z12 = z1.mul(fe, z2)?;

        let z1only = z1.sub(fe, &z12)?;
        let z2only = z2.sub(fe, &z12)?;
        let s2not = one.sub(fe, s2)?;
        let term1 = z1only.mul(fe, &s2not)?;
        let term2 = z2only.mul(fe, s1)?;
        let nz = one.add(fe, &z12)?.sub(fe, z1)?.sub(fe, z2)?;
        let ns = one.add(fe, &s12)?.sub(fe, s1)?.sub(fe, s2)?;
        let nsb1 = ns.mul(fe, &b1)?;
        let sb2 = s12.mul(fe, &b2)?;
        let inner = s1.sub(fe, &s12)?.add(fe, &nsb1)?.add(fe, &sb2)?;
        let term3 = nz.mul(fe, &inner)?;
        let b = term1.add(fe, &term2)?.add(fe, &term3)?;
        fe.with_size(b.size(), |fe| {
            let dest = fe.alloc(RegKind::SecretBit);
            fe.emit(Op::ConvReg {
                dest,
                src: b.reg(),
            });
            Ok(SecretBit {
                reg: dest,
                size: b.size(),
            })
        })
    }

    /// Equality: component-wise, except zeros compare equal regardless of
    /// sign.
    pub fn eq(&self, fe: &mut Frontend, other: &Self) -> Result<SecretBit> {
        let dv = self.v.sub(fe, &other.v)?;
        let dp = self.p.sub(fe, &other.p)?;
        let ev = eqz_int(fe, &dv, self.vlen)?;
        let ep = eqz_int(fe, &dp, self.plen)?;
        let one = sconst(fe, 1)?;
        let ss = self.s.mul(fe, &other.s)?;
        let two_ss = ss.add(fe, &ss)?;
        let es = one.sub(fe, &self.s)?.sub(fe, &other.s)?.add(fe, &two_ss)?;
        let zz = self.z.mul(fe, &other.z)?;
        let znot = one.sub(fe, &zz)?;
        let both = ev.mul(fe, &ep)?.mul(fe, &es)?.mul(fe, &znot)?;
        let res = both.add(fe, &zz)?;
        fe.with_size(res.size(), |fe| {
            let dest = fe.alloc(RegKind::SecretBit);
            fe.emit(Op::ConvReg {
                dest,
                src: res.reg(),
            });
            Ok(SecretBit {
                reg: dest,
                size: res.size(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;

    fn fe() -> Frontend {
        Frontend::new(CompilerConfig::default())
    }

    #[test]
    fn addition_uses_alignment_and_renormalization_primitives() {
        let mut fe = fe();
        let x = SecretFloat::from_f64(&mut fe, 2.5, 24, 8).unwrap();
        let y = SecretFloat::from_f64(&mut fe, 0.125, 24, 8).unwrap();
        x.add(&mut fe, &y).unwrap();
        let pow2s = fe.tape().count_ops(|op| matches!(op, Op::Pow2 { .. }));
        let decs = fe
            .tape()
            .count_ops(|op| matches!(op, Op::BitDec { n: 26, .. }));
        let invs = fe.tape().count_ops(|op| matches!(op, Op::Inverse { .. }));
        assert_eq!(pow2s, 1);
        assert_eq!(decs, 1);
        assert_eq!(invs, 1);
    }

    #[test]
    fn multiplication_truncates_twice_without_decomposition() {
        let mut fe = fe();
        let x = SecretFloat::from_f64(&mut fe, 3.0, 24, 8).unwrap();
        let y = SecretFloat::from_f64(&mut fe, -0.5, 24, 8).unwrap();
        x.mul(&mut fe, &y).unwrap();
        let truncs = fe
            .tape()
            .count_ops(|op| matches!(op, Op::TruncPr { .. } | Op::TruncRound { .. }));
        let decs = fe.tape().count_ops(|op| matches!(op, Op::BitDec { .. }));
        assert_eq!(truncs, 2);
        assert_eq!(decs, 0);
    }

    #[test]
    fn zero_literal_sets_the_zero_flag() {
        let mut fe = fe();
        SecretFloat::from_f64(&mut fe, 0.0, 24, 8).unwrap();
        // components load as 0, 0, 1, 0
        let ones = fe
            .tape()
            .count_ops(|op| matches!(op, Op::LdI { imm: 1, .. }));
        assert_eq!(ones, 1);
    }

    #[test]
    fn literal_significand_is_normalized() {
        let mut fe = fe();
        // 1.5 = 12582912 * 2^-23 with a 24-bit significand
        SecretFloat::from_f64(&mut fe, 1.5, 24, 8).unwrap();
        let v_loads = fe
            .tape()
            .count_ops(|op| matches!(op, Op::LdI { imm: 12582912, .. }));
        assert_eq!(v_loads, 1);
    }

    #[test]
    fn comparisons_return_single_bits() {
        let mut fe = fe();
        let x = SecretFloat::from_f64(&mut fe, 1.0, 24, 8).unwrap();
        let y = SecretFloat::from_f64(&mut fe, 2.0, 24, 8).unwrap();
        let lt = x.lt(&mut fe, &y).unwrap();
        let eq = x.eq(&mut fe, &y).unwrap();
        assert_eq!(lt.size(), 1);
        assert_eq!(eq.size(), 1);
        let eqzs = fe.tape().count_ops(|op| matches!(op, Op::Eqz { .. }));
        assert_eq!(eqzs, 3);
    }
}
