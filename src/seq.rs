//! Integer row primitives shared by the constraint and matrix layers.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};

/// Build an owned row from machine integers
pub fn row(vals: &[i64]) -> Vec<BigInt> {
    vals.iter().map(|&v| BigInt::from(v)).collect()
}

/// Set every entry to zero
pub fn clear(dst: &mut [BigInt]) {
    for v in dst.iter_mut() {
        v.set_zero();
    }
}

/// Negate a row in place
pub fn negate(dst: &mut [BigInt]) {
    for v in dst.iter_mut() {
        *v = -std::mem::take(v);
    }
}

pub fn negated(src: &[BigInt]) -> Vec<BigInt> {
    src.iter().map(|v| -v).collect()
}

/// Scale a row in place
pub fn scale(dst: &mut [BigInt], f: &BigInt) {
    for v in dst.iter_mut() {
        *v = &*v * f;
    }
}

/// `dst = a * r1 + b * r2`
pub fn combine(a: &BigInt, r1: &[BigInt], b: &BigInt, r2: &[BigInt]) -> Vec<BigInt> {
    r1.iter().zip(r2).map(|(x, y)| a * x + b * y).collect()
}

/// Inner product of two rows
pub fn inner_product(r1: &[BigInt], r2: &[BigInt]) -> BigInt {
    r1.iter().zip(r2).map(|(x, y)| x * y).sum()
}

/// Gcd of all entries, zero for an all-zero row
pub fn gcd(row: &[BigInt]) -> BigInt {
    let mut g = BigInt::zero();
    for v in row {
        if !v.is_zero() {
            g = g.gcd(v);
        }
    }
    g
}

/// Divide a row by the gcd of its entries
pub fn normalize(row: &mut [BigInt]) {
    let g = gcd(row);
    if g.is_zero() || g == BigInt::from(1) {
        return;
    }
    for v in row.iter_mut() {
        *v = &*v / &g;
    }
}

/// Index of the first nonzero entry in `row[from..]`, if any
pub fn first_nonzero(row: &[BigInt], from: usize) -> Option<usize> {
    (from..row.len()).find(|&i| !row[i].is_zero())
}

/// True if every entry is zero
pub fn is_zero(row: &[BigInt]) -> bool {
    row.iter().all(|v| v.is_zero())
}

/// Canonical sign: make the first nonzero entry after the constant positive
pub fn canonical_sign(row: &mut [BigInt]) {
    if let Some(i) = first_nonzero(row, 1) {
        if row[i].is_negative() {
            negate(row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let mut r = row(&[6, -9, 12]);
        normalize(&mut r);
        assert_eq!(r, row(&[2, -3, 4]));

        let mut z = row(&[0, 0]);
        normalize(&mut z);
        assert_eq!(z, row(&[0, 0]));
    }

    #[test]
    fn test_combine() {
        let r1 = row(&[1, 0, 2]);
        let r2 = row(&[0, 1, -1]);
        let c = combine(&BigInt::from(2), &r1, &BigInt::from(3), &r2);
        assert_eq!(c, row(&[2, 3, 1]));
    }

    #[test]
    fn test_inner_product() {
        assert_eq!(
            inner_product(&row(&[1, 2, 3]), &row(&[4, 5, 6])),
            BigInt::from(32)
        );
    }

    #[test]
    fn test_canonical_sign() {
        let mut r = row(&[5, -1, 2]);
        canonical_sign(&mut r);
        assert_eq!(r, row(&[-5, 1, -2]));
    }
}
