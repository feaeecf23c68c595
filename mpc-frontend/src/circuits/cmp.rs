//! Bitwise comparison circuits.

use super::adders::pad_equal;
use super::prefix::{k_op_l, pre_or};
use crate::error::Result;
use crate::gates::BitGates;

/// Log-depth comparison scan. Returns `(res, ne)` where `ne` is set iff
/// the operands differ and `res` is then the second operand's bit at the
/// highest differing position, so `res` means `a < b` whenever `ne` holds.
pub fn bit_comparator<G: BitGates>(
    g: &mut G,
    a: &[G::Bit],
    b: &[G::Bit],
) -> Result<(G::Bit, G::Bit)> {
    let (a, b) = pad_equal(g, a, b)?;
    let mut items = Vec::with_capacity(a.len());
    for (ai, bi) in a.iter().zip(&b) {
        items.push((bi.clone(), g.xor(ai, bi)?));
    }
    let mut op = |g: &mut G,
                  lo: &(G::Bit, G::Bit),
                  hi: &(G::Bit, G::Bit)|
     -> Result<(G::Bit, G::Bit)> {
        let res = g.mux(&hi.1, &hi.0, &lo.0)?;
        let ne = g.or(&hi.1, &lo.1)?;
        Ok((res, ne))
    };
    k_op_l(g, &mut op, &items)
}

/// Unsigned `a < b` over equal-length (after padding) bit sequences.
pub fn bit_less_than<G: BitGates>(g: &mut G, a: &[G::Bit], b: &[G::Bit]) -> Result<G::Bit> {
    let (res, ne) = bit_comparator(g, a, b)?;
    g.and(&ne, &res)
}

/// Constant-round comparison variant: locates the highest differing bit
/// via a prefix OR of the bitwise differences and selects the chosen
/// operand's bit there. Returns zero when the operands are equal, so with
/// `take_b` set this is again `a < b`.
pub fn highest_different_bit<G: BitGates>(
    g: &mut G,
    a: &[G::Bit],
    b: &[G::Bit],
    take_b: bool,
) -> Result<G::Bit> {
    let (a, b) = pad_equal(g, a, b)?;
    let n = a.len();
    if n == 0 {
        return g.const_zero();
    }
    let mut diffs = Vec::with_capacity(n);
    for i in (0..n).rev() {
        diffs.push(g.xor(&a[i], &b[i])?);
    }
    let preor = pre_or(g, &diffs)?;
    // one-hot of the most significant difference, MSB first; the prefix OR
    // is monotone so adjacent XOR isolates the step
    let mut onehot = Vec::with_capacity(n);
    onehot.push(preor[0].clone());
    for i in 1..n {
        onehot.push(g.xor(&preor[i], &preor[i - 1])?);
    }
    let chosen = if take_b { &b } else { &a };
    let mut acc = g.const_zero()?;
    for (h, bit) in onehot.iter().zip(chosen.iter().rev()) {
        let masked = g.and(h, bit)?;
        acc = g.xor(&acc, &masked)?;
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::PlainGates;

    fn to_bits(x: u64, n: usize) -> Vec<bool> {
        (0..n).map(|i| (x >> i) & 1 == 1).collect()
    }

    #[test]
    fn less_than_matches_integer_order() {
        let vals = [0u64, 1, 2, 7, 100, 128, 200, 254, 255];
        for &x in &vals {
            for &y in &vals {
                let mut g = PlainGates::default();
                let got = bit_less_than(&mut g, &to_bits(x, 8), &to_bits(y, 8)).unwrap();
                assert_eq!(got, x < y, "{x} < {y}");
            }
        }
    }

    #[test]
    fn comparator_trichotomy() {
        let vals = [0u64, 3, 9, 15];
        for &x in &vals {
            for &y in &vals {
                let mut g = PlainGates::default();
                let (res, ne) = bit_comparator(&mut g, &to_bits(x, 4), &to_bits(y, 4)).unwrap();
                let lt = ne && res;
                let gt = ne && !res;
                let eq = !ne;
                assert_eq!(
                    [lt, eq, gt].iter().filter(|&&p| p).count(),
                    1,
                    "{x} vs {y}"
                );
                assert_eq!(lt, x < y);
                assert_eq!(eq, x == y);
            }
        }
    }

    #[test]
    fn constant_round_variant_agrees_with_scan() {
        let vals = [0u64, 1, 5, 8, 12, 15];
        for &x in &vals {
            for &y in &vals {
                let a = to_bits(x, 4);
                let b = to_bits(y, 4);
                let mut g = PlainGates::default();
                let scan = bit_less_than(&mut g, &a, &b).unwrap();
                let direct = highest_different_bit(&mut g, &a, &b, true).unwrap();
                assert_eq!(scan, direct, "{x} vs {y}");
            }
        }
    }

    #[test]
    fn equal_inputs_give_zero_difference_bit() {
        let a = to_bits(0b1011, 4);
        let mut g = PlainGates::default();
        assert!(!highest_different_bit(&mut g, &a, &a, false).unwrap());
        let (_, ne) = bit_comparator(&mut g, &a, &a).unwrap();
        assert!(!ne);
    }

    #[test]
    fn unequal_lengths_are_zero_extended() {
        let mut g = PlainGates::default();
        let a = to_bits(0b11, 2);
        let b = to_bits(0b100, 3);
        assert!(bit_less_than(&mut g, &a, &b).unwrap());
        assert!(!bit_less_than(&mut g, &b, &a).unwrap());
    }
}
