//! Adder and subtractor constructions.
//!
//! Three adders with different depth/gate-count trade-offs, all built on
//! the same [`full_adder`] primitive, plus a borrow-scan subtractor that
//! reuses the carry prefix machinery.

use itertools::izip;

use super::prefix::pre_op_l;
use crate::error::{CompilerError, Result};
use crate::gates::BitGates;

/// Sum and carry of two bits.
pub fn half_adder<G: BitGates>(g: &mut G, a: &G::Bit, b: &G::Bit) -> Result<(G::Bit, G::Bit)> {
    let s = g.xor(a, b)?;
    let c = g.and(a, b)?;
    Ok((s, c))
}

/// Sum and carry of three bits, with a single AND gate:
/// `s = (a ^ b) ^ c`, `c_out = a ^ ((a ^ b) & (c ^ a))`.
pub fn full_adder<G: BitGates>(
    g: &mut G,
    a: &G::Bit,
    b: &G::Bit,
    c: &G::Bit,
) -> Result<(G::Bit, G::Bit)> {
    let axb = g.xor(a, b)?;
    let s = g.xor(&axb, c)?;
    let cxa = g.xor(c, a)?;
    let t = g.and(&axb, &cxa)?;
    let c_out = g.xor(a, &t)?;
    Ok((s, c_out))
}

/// Prefix combine for `(propagate, generate)` pairs, least significant
/// operand first. The generate update is an XOR because `hi` never has both
/// components set at once.
pub(super) fn pg_combine<G: BitGates>(
    g: &mut G,
    lo: &(G::Bit, G::Bit),
    hi: &(G::Bit, G::Bit),
) -> Result<(G::Bit, G::Bit)> {
    let p = g.and(&lo.0, &hi.0)?;
    let t = g.and(&hi.0, &lo.1)?;
    let c = g.xor(&hi.1, &t)?;
    Ok((p, c))
}

fn check_len(a: usize, b: usize) -> Result<usize> {
    if a != b {
        return Err(CompilerError::Internal(format!(
            "adder operand lengths differ: {a} vs {b}"
        )));
    }
    Ok(a)
}

/// Zero-extends the shorter operand so both have equal length.
pub fn pad_equal<G: BitGates>(
    g: &mut G,
    a: &[G::Bit],
    b: &[G::Bit],
) -> Result<(Vec<G::Bit>, Vec<G::Bit>)> {
    let n = a.len().max(b.len());
    let mut av = a.to_vec();
    let mut bv = b.to_vec();
    while av.len() < n {
        av.push(g.const_zero()?);
    }
    while bv.len() < n {
        bv.push(g.const_zero()?);
    }
    Ok((av, bv))
}

/// Linear-depth addition. One AND per bit.
///
/// Returns `n` sum bits, plus the carry-out when `get_carry` is set. An
/// absent `carry_in` saves the first full adder.
pub fn ripple_carry_adder<G: BitGates>(
    g: &mut G,
    a: &[G::Bit],
    b: &[G::Bit],
    carry_in: Option<&G::Bit>,
    get_carry: bool,
) -> Result<Vec<G::Bit>> {
    let n = check_len(a.len(), b.len())?;
    let mut res = Vec::with_capacity(n + usize::from(get_carry));
    let mut carry: Option<G::Bit> = carry_in.cloned();
    for i in 0..n {
        if i + 1 == n && !get_carry {
            let axb = g.xor(&a[i], &b[i])?;
            res.push(match &carry {
                Some(c) => g.xor(&axb, c)?,
                None => axb,
            });
            return Ok(res);
        }
        let (s, c) = match &carry {
            Some(c) => full_adder(g, &a[i], &b[i], c)?,
            None => half_adder(g, &a[i], &b[i])?,
        };
        res.push(s);
        carry = Some(c);
    }
    if get_carry {
        res.push(match carry {
            Some(c) => c,
            None => g.const_zero()?,
        });
    }
    Ok(res)
}

/// Log-depth addition via a parallel prefix over the carry recurrence.
///
/// Higher gate count than ripple carry, pays off once operands are long
/// enough that round depth dominates.
pub fn carry_lookahead_adder<G: BitGates>(
    g: &mut G,
    a: &[G::Bit],
    b: &[G::Bit],
    carry_in: Option<&G::Bit>,
    get_carry: bool,
) -> Result<Vec<G::Bit>> {
    let n = check_len(a.len(), b.len())?;
    if n == 0 {
        return Ok(Vec::new());
    }
    let mut pairs = Vec::with_capacity(n);
    for i in 0..n {
        pairs.push(half_adder(g, &a[i], &b[i])?);
    }
    if let Some(cin) = carry_in {
        // fold the incoming carry into the first generate bit
        let t = g.and(&pairs[0].0, cin)?;
        pairs[0].1 = g.xor(&pairs[0].1, &t)?;
    }
    let prefix = pre_op_l(g, pg_combine, &pairs)?;
    let mut res = Vec::with_capacity(n + usize::from(get_carry));
    res.push(match carry_in {
        Some(cin) => g.xor(&pairs[0].0, cin)?,
        None => pairs[0].0.clone(),
    });
    for i in 1..n {
        res.push(g.xor(&pairs[i].0, &prefix[i - 1].1)?);
    }
    if get_carry {
        res.push(prefix[n - 1].1.clone());
    }
    Ok(res)
}

/// Block sizes for the carry-select adder: a remainder block at the low
/// end, then geometrically shrinking blocks toward the high end, chosen
/// so carries arrive exactly when each block needs them.
fn select_blocks(n: usize) -> Vec<usize> {
    let mut m = 0usize;
    while m * (m + 1) / 2 + 1 < n {
        m += 1;
    }
    let mut k = m;
    while k > 0 && (k..=m).sum::<usize>() + 1 < n {
        k -= 1;
    }
    let mut blocks: Vec<usize> = (k + 1..=m).rev().collect();
    let tail: usize = blocks.iter().sum();
    blocks.insert(0, n - tail);
    blocks
}

/// Block-speculative addition: each block is ripple-added for both carry
/// hypotheses and the right result is selected once the previous block's
/// carry is known.
pub fn carry_select_adder<G: BitGates>(
    g: &mut G,
    a: &[G::Bit],
    b: &[G::Bit],
    carry_in: Option<&G::Bit>,
    get_carry: bool,
) -> Result<Vec<G::Bit>> {
    let n = check_len(a.len(), b.len())?;
    if n == 0 {
        return Ok(Vec::new());
    }
    let blocks = select_blocks(n);
    let mut res = Vec::with_capacity(n + usize::from(get_carry));
    let mut carry: Option<G::Bit> = carry_in.cloned();
    let mut pos = 0usize;
    for &blk in &blocks {
        let aa = &a[pos..pos + blk];
        let bb = &b[pos..pos + blk];
        pos += blk;
        match &carry {
            None => {
                let c0 = ripple_carry_adder(g, aa, bb, None, true)?;
                res.extend_from_slice(&c0[..blk]);
                carry = Some(c0[blk].clone());
            }
            Some(c) => {
                let one = g.const_one()?;
                let c0 = ripple_carry_adder(g, aa, bb, None, true)?;
                let c1 = ripple_carry_adder(g, aa, bb, Some(&one), true)?;
                let c = c.clone();
                for i in 0..blk {
                    res.push(g.mux(&c, &c1[i], &c0[i])?);
                }
                carry = Some(g.mux(&c, &c1[blk], &c0[blk])?);
            }
        }
    }
    if get_carry {
        res.push(match carry {
            Some(c) => c,
            None => g.const_zero()?,
        });
    }
    Ok(res)
}

/// Addition with automatic construction choice by operand length:
/// ripple carry for very short operands, carry lookahead at or beyond
/// `cla_threshold` bits, carry select in between. Operands are
/// zero-extended to equal length first.
pub fn bit_adder<G: BitGates>(
    g: &mut G,
    a: &[G::Bit],
    b: &[G::Bit],
    carry_in: Option<&G::Bit>,
    get_carry: bool,
    cla_threshold: u32,
) -> Result<Vec<G::Bit>> {
    let (a, b) = pad_equal(g, a, b)?;
    let n = a.len();
    if n <= 3 {
        ripple_carry_adder(g, &a, &b, carry_in, get_carry)
    } else if n as u32 >= cla_threshold {
        carry_lookahead_adder(g, &a, &b, carry_in, get_carry)
    } else {
        carry_select_adder(g, &a, &b, carry_in, get_carry)
    }
}

/// Two's-complement subtraction `a - b` via borrow propagation with the
/// same prefix scan as the lookahead adder. Negating and adding would need
/// a decomposition-dependent negation, the borrow scan does not.
pub fn bit_subtractor<G: BitGates>(g: &mut G, a: &[G::Bit], b: &[G::Bit]) -> Result<Vec<G::Bit>> {
    let (a, b) = pad_equal(g, a, b)?;
    let n = a.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    let mut xors = Vec::with_capacity(n);
    let mut pairs = Vec::with_capacity(n);
    for (ai, bi) in izip!(&a, &b) {
        let x = g.xor(ai, bi)?;
        let p = g.not(&x)?;
        let na = g.not(ai)?;
        let borrow = g.and(&na, bi)?;
        xors.push(x);
        pairs.push((p, borrow));
    }
    let prefix = pre_op_l(g, pg_combine, &pairs)?;
    let mut res = Vec::with_capacity(n);
    res.push(xors[0].clone());
    for i in 1..n {
        res.push(g.xor(&xors[i], &prefix[i - 1].1)?);
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::PlainGates;

    fn to_bits(x: u128, n: usize) -> Vec<bool> {
        (0..n).map(|i| (x >> i) & 1 == 1).collect()
    }

    fn from_bits(bits: &[bool]) -> u128 {
        bits.iter()
            .enumerate()
            .fold(0, |acc, (i, &b)| acc | (u128::from(b) << i))
    }

    type Adder = fn(
        &mut PlainGates,
        &[bool],
        &[bool],
        Option<&bool>,
        bool,
    ) -> crate::error::Result<Vec<bool>>;

    const ADDERS: [(&str, Adder); 3] = [
        ("ripple", ripple_carry_adder::<PlainGates>),
        ("lookahead", carry_lookahead_adder::<PlainGates>),
        ("select", carry_select_adder::<PlainGates>),
    ];

    fn sample_values(n: usize) -> Vec<u128> {
        let mask = if n == 128 { u128::MAX } else { (1 << n) - 1 };
        [
            0,
            1,
            2,
            3,
            0x5555_5555_5555_5555_5555_5555_5555_5555,
            0xC8,
            0x57,
            mask - 1,
            mask,
        ]
        .iter()
        .map(|v| v & mask)
        .collect()
    }

    #[test]
    fn all_adders_agree_with_integer_addition() {
        for n in [1usize, 8, 32, 64, 128] {
            let vals = sample_values(n);
            for &x in &vals {
                for &y in &vals {
                    let a = to_bits(x, n);
                    let b = to_bits(y, n);
                    let want = x.wrapping_add(y);
                    for (name, adder) in ADDERS {
                        let mut g = PlainGates::default();
                        let with_carry = adder(&mut g, &a, &b, None, true).unwrap();
                        assert_eq!(with_carry.len(), n + 1, "{name} n={n}");
                        if n < 128 {
                            assert_eq!(
                                from_bits(&with_carry),
                                want & ((1 << (n + 1)) - 1),
                                "{name} n={n} x={x} y={y}"
                            );
                        }
                        let no_carry = adder(&mut g, &a, &b, None, false).unwrap();
                        assert_eq!(no_carry.len(), n, "{name} n={n}");
                        let mask = if n == 128 { u128::MAX } else { (1 << n) - 1 };
                        assert_eq!(from_bits(&no_carry), want & mask, "{name} n={n} x={x} y={y}");
                    }
                }
            }
        }
    }

    macro_rules! random_pair_tests {
        ($($name:ident => $adder:path),* $(,)?) => {
            $(paste::paste! {
                #[test]
                fn [<$name _matches_reference_on_random_pairs>]() {
                    use rand::{Rng, SeedableRng};
                    let mut rng = rand_chacha::ChaCha12Rng::seed_from_u64(0x5eed);
                    for n in [8usize, 32, 64, 128] {
                        let mask = if n == 128 { u128::MAX } else { (1 << n) - 1 };
                        for _ in 0..32 {
                            let x = rng.gen::<u128>() & mask;
                            let y = rng.gen::<u128>() & mask;
                            let mut g = PlainGates::default();
                            let got = $adder(&mut g, &to_bits(x, n), &to_bits(y, n), None, false)
                                .unwrap();
                            assert_eq!(
                                from_bits(&got),
                                x.wrapping_add(y) & mask,
                                "n={n} x={x} y={y}"
                            );
                        }
                    }
                }
            })*
        };
    }

    random_pair_tests! {
        ripple => ripple_carry_adder::<PlainGates>,
        lookahead => carry_lookahead_adder::<PlainGates>,
        select => carry_select_adder::<PlainGates>,
    }

    #[test]
    fn carry_in_is_honored() {
        for (name, adder) in ADDERS {
            let mut g = PlainGates::default();
            let a = to_bits(0xff, 8);
            let b = to_bits(0, 8);
            let one = true;
            let got = adder(&mut g, &a, &b, Some(&one), true).unwrap();
            assert_eq!(from_bits(&got), 0x100, "{name}");
        }
    }

    #[test]
    fn eight_bit_example_with_carry_out() {
        // 200 + 87 = 287, nine bits 0b100011111
        let a = to_bits(200, 8);
        let b = to_bits(87, 8);
        let mut g = PlainGates::default();
        let ripple = ripple_carry_adder(&mut g, &a, &b, None, true).unwrap();
        let select = carry_select_adder(&mut g, &a, &b, None, true).unwrap();
        assert_eq!(from_bits(&ripple), 287);
        assert_eq!(ripple, select);
    }

    #[test]
    fn dispatcher_pads_unequal_lengths() {
        let mut g = PlainGates::default();
        let a = to_bits(0b101, 3);
        let b = to_bits(0b1_0000, 5);
        let got = bit_adder(&mut g, &a, &b, None, false, 122).unwrap();
        assert_eq!(got.len(), 5);
        assert_eq!(from_bits(&got), 0b1_0101);
    }

    #[test]
    fn select_blocks_cover_the_width() {
        for n in 1..=200 {
            let blocks = select_blocks(n);
            assert_eq!(blocks.iter().sum::<usize>(), n, "n={n}");
            assert!(blocks.iter().skip(1).all(|&b| b > 0), "n={n}");
        }
    }

    #[test]
    fn ripple_skips_and_gates_for_constant_carry_paths() {
        // first bit uses a half adder, last bit without carry-out is pure xor
        let mut g = PlainGates::default();
        let a = to_bits(0b1010, 4);
        let b = to_bits(0b0110, 4);
        ripple_carry_adder(&mut g, &a, &b, None, false).unwrap();
        assert_eq!(g.and_count, 3);
    }

    #[test]
    fn subtractor_wraps_two_complement() {
        for n in [4usize, 8, 16, 64] {
            let vals = sample_values(n.min(64));
            let mask = if n == 128 { u128::MAX } else { (1 << n) - 1 };
            for &x in &vals {
                for &y in &vals {
                    let (x, y) = (x & mask, y & mask);
                    let mut g = PlainGates::default();
                    let got = bit_subtractor(&mut g, &to_bits(x, n), &to_bits(y, n)).unwrap();
                    assert_eq!(got.len(), n);
                    assert_eq!(from_bits(&got), x.wrapping_sub(y) & mask, "n={n} x={x} y={y}");
                }
            }
        }
    }
}
