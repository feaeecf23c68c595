//! Wallace-tree partial-product reduction and the bit multiplier built
//! on it.

use super::adders::{bit_adder, full_adder, half_adder};
use crate::error::Result;
use crate::gates::BitGates;

/// One compression round: every column with more than two bits feeds
/// triples through full adders (pairs through half adders), pushing carries
/// into the next column. The result has one more column than the input.
pub fn wallace_reduction<G: BitGates>(
    g: &mut G,
    columns: Vec<Vec<G::Bit>>,
) -> Result<Vec<Vec<G::Bit>>> {
    let mut out: Vec<Vec<G::Bit>> = vec![Vec::new(); columns.len() + 1];
    for (i, mut col) in columns.into_iter().enumerate() {
        while col.len() >= 3 {
            let k = col.len();
            let (s, c) = full_adder(g, &col[k - 3], &col[k - 2], &col[k - 1])?;
            col.truncate(k - 3);
            out[i].push(s);
            out[i + 1].push(c);
        }
        if col.len() == 2 {
            let (s, c) = half_adder(g, &col[0], &col[1])?;
            out[i].push(s);
            out[i + 1].push(c);
        } else {
            out[i].append(&mut col);
        }
    }
    Ok(out)
}

/// Compresses the columns until every column holds at most two bits, then
/// returns the two remaining addend rows, zero-padded to equal length.
/// Without `get_carry` the width is pinned after every round, discarding
/// overflow columns.
pub fn wallace_tree_without_finish<G: BitGates>(
    g: &mut G,
    mut columns: Vec<Vec<G::Bit>>,
    get_carry: bool,
) -> Result<(Vec<G::Bit>, Vec<G::Bit>)> {
    while columns.iter().map(Vec::len).max().unwrap_or(0) > 2 {
        let width = columns.len();
        columns = wallace_reduction(g, columns)?;
        if !get_carry {
            columns.truncate(width);
        }
    }
    let mut r0 = Vec::with_capacity(columns.len());
    let mut r1 = Vec::with_capacity(columns.len());
    for col in columns {
        let mut it = col.into_iter();
        r0.push(match it.next() {
            Some(bit) => bit,
            None => g.const_zero()?,
        });
        r1.push(match it.next() {
            Some(bit) => bit,
            None => g.const_zero()?,
        });
    }
    Ok((r0, r1))
}

/// Full column reduction finished with [`bit_adder`].
pub fn wallace_tree_from_columns<G: BitGates>(
    g: &mut G,
    columns: Vec<Vec<G::Bit>>,
    get_carry: bool,
    cla_threshold: u32,
) -> Result<Vec<G::Bit>> {
    let (r0, r1) = wallace_tree_without_finish(g, columns, get_carry)?;
    bit_adder(g, &r0, &r1, None, get_carry, cla_threshold)
}

/// Reduces a matrix of addend rows, each a bit sequence of the final
/// width. Shorter rows are treated as high-zero.
pub fn wallace_tree_from_matrix<G: BitGates>(
    g: &mut G,
    rows: Vec<Vec<G::Bit>>,
    get_carry: bool,
    cla_threshold: u32,
) -> Result<Vec<G::Bit>> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut columns: Vec<Vec<G::Bit>> = vec![Vec::new(); width];
    for row in rows {
        for (j, bit) in row.into_iter().enumerate() {
            columns[j].push(bit);
        }
    }
    wallace_tree_from_columns(g, columns, get_carry, cla_threshold)
}

/// Truncating multiplication: partial products above the result width are
/// never generated. Returns `max(len a, len b)` bits.
pub fn bit_multiplier<G: BitGates>(
    g: &mut G,
    a: &[G::Bit],
    b: &[G::Bit],
    cla_threshold: u32,
) -> Result<Vec<G::Bit>> {
    let n = a.len().max(b.len());
    if n == 0 {
        return Ok(Vec::new());
    }
    let mut columns: Vec<Vec<G::Bit>> = vec![Vec::new(); n];
    for (i, bi) in b.iter().enumerate() {
        for (j, aj) in a.iter().enumerate() {
            if i + j < n {
                columns[i + j].push(g.and(aj, bi)?);
            }
        }
    }
    let mut res = wallace_tree_from_columns(g, columns, false, cla_threshold)?;
    res.truncate(n);
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::PlainGates;

    fn to_bits(x: u64, n: usize) -> Vec<bool> {
        (0..n).map(|i| (x >> i) & 1 == 1).collect()
    }

    fn from_bits(bits: &[bool]) -> u64 {
        bits.iter()
            .enumerate()
            .fold(0, |acc, (i, &b)| acc | (u64::from(b) << i))
    }

    #[test]
    fn multiplier_truncates_like_wrapping_mul() {
        for n in [1usize, 4, 8, 16] {
            let mask = (1u64 << n) - 1;
            let vals = [0u64, 1, 2, 3, 7, 0x5a, 0xc8, mask];
            for &x in &vals {
                for &y in &vals {
                    let (x, y) = (x & mask, y & mask);
                    let mut g = PlainGates::default();
                    let got =
                        bit_multiplier(&mut g, &to_bits(x, n), &to_bits(y, n), 122).unwrap();
                    assert_eq!(got.len(), n);
                    assert_eq!(from_bits(&got), x.wrapping_mul(y) & mask, "n={n} {x}*{y}");
                }
            }
        }
    }

    #[test]
    fn matrix_reduction_sums_rows() {
        let rows: Vec<u64> = vec![13, 200, 91, 7, 255, 128];
        let mut g = PlainGates::default();
        let bit_rows = rows.iter().map(|&r| to_bits(r, 10)).collect();
        let got = wallace_tree_from_matrix(&mut g, bit_rows, true, 122).unwrap();
        assert!(got.len() > 10);
        assert_eq!(from_bits(&got), rows.iter().sum::<u64>());
    }

    #[test]
    fn reduction_leaves_at_most_two_per_column() {
        let mut g = PlainGates::default();
        let columns: Vec<Vec<bool>> = vec![vec![true; 7], vec![true; 5], vec![false; 2]];
        let (r0, r1) = wallace_tree_without_finish(&mut g, columns, true).unwrap();
        assert_eq!(r0.len(), r1.len());
        // 7 ones weighted 1 plus 5 ones weighted 2
        assert_eq!(from_bits(&r0) + from_bits(&r1), 17);
    }

    #[test]
    fn empty_operands_multiply_to_nothing() {
        let mut g = PlainGates::default();
        assert!(bit_multiplier::<PlainGates>(&mut g, &[], &[], 122)
            .unwrap()
            .is_empty());
    }
}
