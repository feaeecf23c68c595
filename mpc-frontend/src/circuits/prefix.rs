//! Parallel prefix and reduction scaffolding shared by the adders and
//! comparators.

use crate::error::{CompilerError, Result};
use crate::gates::BitGates;

/// Log-depth prefix computation of an associative operator.
///
/// Returns the running combination `op(items[0], ..., items[i])` at every
/// position. The operator receives `(lower_prefix, current)` in that order;
/// non-commutative operators rely on it.
pub fn pre_op_l<G, T, F>(g: &mut G, mut op: F, items: &[T]) -> Result<Vec<T>>
where
    T: Clone,
    F: FnMut(&mut G, &T, &T) -> Result<T>,
{
    let k = items.len();
    let mut output: Vec<T> = items.to_vec();
    if k <= 1 {
        return Ok(output);
    }
    let logk = (usize::BITS - (k - 1).leading_zeros()) as usize;
    let kmax = 1usize << logk;
    for i in 0..logk {
        let half = 1usize << i;
        let full = half << 1;
        for j in 0..kmax / full {
            let y = half + j * full - 1;
            for z in 1..=half {
                if y + z < k {
                    output[y + z] = op(g, &output[y], &output[y + z])?;
                }
            }
        }
    }
    Ok(output)
}

/// Log-depth reduction of an associative operator over a non-empty slice.
pub fn k_op_l<G, T, F>(g: &mut G, op: &mut F, items: &[T]) -> Result<T>
where
    T: Clone,
    F: FnMut(&mut G, &T, &T) -> Result<T>,
{
    match items.len() {
        0 => Err(CompilerError::Internal(
            "reduction over empty bit sequence".into(),
        )),
        1 => Ok(items[0].clone()),
        k => {
            let lo = k_op_l(g, op, &items[..k / 2])?;
            let hi = k_op_l(g, op, &items[k / 2..])?;
            op(g, &lo, &hi)
        }
    }
}

/// Prefix OR of a bit sequence.
pub fn pre_or<G: BitGates>(g: &mut G, bits: &[G::Bit]) -> Result<Vec<G::Bit>> {
    pre_op_l(g, |g, a, b| g.or(a, b), bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::PlainGates;

    fn to_bits(x: u64, n: usize) -> Vec<bool> {
        (0..n).map(|i| (x >> i) & 1 == 1).collect()
    }

    #[test]
    fn prefix_or_matches_running_or() {
        let mut g = PlainGates::default();
        for &x in &[0u64, 1, 0b1000, 0b1010_0110, 0xff, 0x80] {
            for n in 1..=8 {
                let bits = to_bits(x, n);
                let got = pre_or(&mut g, &bits).unwrap();
                let mut acc = false;
                for (i, &b) in bits.iter().enumerate() {
                    acc |= b;
                    assert_eq!(got[i], acc, "x={x:#b} n={n} i={i}");
                }
            }
        }
    }

    #[test]
    fn reduction_computes_parity() {
        let mut g = PlainGates::default();
        for &x in &[0u64, 1, 0b111, 0b1011_0010, u64::MAX >> 56] {
            let bits = to_bits(x, 8);
            let mut op = |g: &mut PlainGates, a: &bool, b: &bool| g.xor(a, b);
            let got = k_op_l(&mut g, &mut op, &bits).unwrap();
            assert_eq!(got, x.count_ones() % 2 == 1);
        }
    }

    #[test]
    fn reduction_rejects_empty_input() {
        let mut g = PlainGates::default();
        let mut op = |g: &mut PlainGates, a: &bool, b: &bool| g.xor(a, b);
        assert!(k_op_l(&mut g, &mut op, &[]).is_err());
    }

    #[test]
    fn prefix_handles_non_power_of_two_lengths() {
        let mut g = PlainGates::default();
        for n in 1..=13 {
            let bits = vec![false; n - 1]
                .into_iter()
                .chain(std::iter::once(true))
                .collect::<Vec<_>>();
            let got = pre_or(&mut g, &bits).unwrap();
            assert_eq!(got.len(), n);
            assert!(got[..n - 1].iter().all(|&b| !b));
            assert!(got[n - 1]);
        }
    }
}
