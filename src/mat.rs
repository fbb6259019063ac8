//! Dense integer matrices for the homogeneous coordinate transformations
//! used by the hull engine: preimages, right/left inverses and the
//! compression of equality systems into lower-dimensional spaces.

use crate::error::{HullError, Result};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Zero};

/// Integer matrix stored by rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mat {
    pub n_row: usize,
    pub n_col: usize,
    rows: Vec<Vec<BigInt>>,
}

impl Mat {
    pub fn from_rows(rows: Vec<Vec<BigInt>>) -> Result<Self> {
        let n_row = rows.len();
        let n_col = rows.first().map_or(0, |r| r.len());
        for r in &rows {
            if r.len() != n_col {
                return Err(HullError::DimensionMismatch {
                    expected: n_col,
                    got: r.len(),
                });
            }
        }
        Ok(Self { n_row, n_col, rows })
    }

    pub fn zero(n_row: usize, n_col: usize) -> Self {
        Self {
            n_row,
            n_col,
            rows: vec![vec![BigInt::zero(); n_col]; n_row],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zero(n, n);
        for i in 0..n {
            m.rows[i][i] = BigInt::one();
        }
        m
    }

    pub fn row(&self, i: usize) -> &[BigInt] {
        &self.rows[i]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut Vec<BigInt> {
        &mut self.rows[i]
    }

    pub fn transpose(&self) -> Mat {
        let mut t = Mat::zero(self.n_col, self.n_row);
        for i in 0..self.n_row {
            for j in 0..self.n_col {
                t.rows[j][i] = self.rows[i][j].clone();
            }
        }
        t
    }

    pub fn product(&self, other: &Mat) -> Result<Mat> {
        if self.n_col != other.n_row {
            return Err(HullError::DimensionMismatch {
                expected: self.n_col,
                got: other.n_row,
            });
        }
        let mut p = Mat::zero(self.n_row, other.n_col);
        for i in 0..self.n_row {
            for j in 0..other.n_col {
                let mut acc = BigInt::zero();
                for k in 0..self.n_col {
                    acc += &self.rows[i][k] * &other.rows[k][j];
                }
                p.rows[i][j] = acc;
            }
        }
        Ok(p)
    }

    /// `row * self` for a row vector with `n_row` entries
    pub fn transform_row(&self, row: &[BigInt]) -> Result<Vec<BigInt>> {
        if row.len() != self.n_row {
            return Err(HullError::DimensionMismatch {
                expected: self.n_row,
                got: row.len(),
            });
        }
        let mut out = vec![BigInt::zero(); self.n_col];
        for (i, c) in row.iter().enumerate() {
            if c.is_zero() {
                continue;
            }
            for j in 0..self.n_col {
                out[j] += c * &self.rows[i][j];
            }
        }
        Ok(out)
    }

    /// Right inverse of a full-row-rank matrix.
    ///
    /// Returns an integer `T` with `self * T = f * I` for some positive
    /// integer `f` folded into `T`. The factor is irrelevant to constraint
    /// rows, which are scale invariant.
    pub fn right_inverse(&self) -> Result<Mat> {
        let m = self.n_row;
        let n = self.n_col;
        let mut work: Vec<Vec<BigRational>> = self
            .rows
            .iter()
            .map(|r| {
                let mut row: Vec<BigRational> =
                    r.iter().map(|v| BigRational::from(v.clone())).collect();
                row.extend((0..m).map(|_| BigRational::zero()));
                row
            })
            .collect();
        for (i, row) in work.iter_mut().enumerate() {
            row[n + i] = BigRational::one();
        }

        // Gauss-Jordan with pivot column bookkeeping
        let mut pivots = Vec::with_capacity(m);
        let mut rank = 0;
        for col in 0..n {
            let Some(pr) = (rank..m).find(|&r| !work[r][col].is_zero()) else {
                continue;
            };
            work.swap(rank, pr);
            let inv = work[rank][col].recip();
            for v in work[rank].iter_mut() {
                *v = &*v * &inv;
            }
            for r in 0..m {
                if r != rank && !work[r][col].is_zero() {
                    let f = work[r][col].clone();
                    for c in 0..n + m {
                        let sub = &f * &work[rank][c];
                        work[r][c] = &work[r][c] - sub;
                    }
                }
            }
            pivots.push(col);
            rank += 1;
            if rank == m {
                break;
            }
        }
        if rank < m {
            return Err(HullError::SingularMatrix { rows: m, rank });
        }

        // Solution with zeros in the non-pivot rows
        let mut sol = vec![vec![BigRational::zero(); m]; n];
        for (k, &col) in pivots.iter().enumerate() {
            for j in 0..m {
                sol[col][j] = work[k][n + j].clone();
            }
        }

        Ok(clear_denominators(&sol))
    }

    /// Left inverse of a full-column-rank matrix: `T * self = g * I`
    pub fn left_inverse(&self) -> Result<Mat> {
        Ok(self.transpose().right_inverse()?.transpose())
    }
}

/// Scale a rational matrix by the lcm of its denominators
fn clear_denominators(sol: &[Vec<BigRational>]) -> Mat {
    let mut f = BigInt::one();
    for row in sol {
        for v in row {
            f = f.lcm(v.denom());
        }
    }
    let rows = sol
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| v.numer() * (&f / v.denom()))
                .collect::<Vec<_>>()
        })
        .collect();
    Mat {
        n_row: sol.len(),
        n_col: sol.first().map_or(0, |r| r.len()),
        rows,
    }
}

/// Integer basis of the right kernel of a rational matrix: all rows `e`
/// of the result satisfy `rows[i] . e = 0`.
pub(crate) fn kernel_int(rows: &[Vec<BigRational>], width: usize) -> Vec<Vec<BigInt>> {
    let mut work: Vec<Vec<BigRational>> = rows.to_vec();
    let mut pivots: Vec<usize> = Vec::new();
    let mut rank = 0;
    for col in 0..width {
        let Some(pr) = (rank..work.len()).find(|&r| !work[r][col].is_zero()) else {
            continue;
        };
        work.swap(rank, pr);
        let inv = work[rank][col].recip();
        for v in work[rank].iter_mut() {
            *v = &*v * &inv;
        }
        for r in 0..work.len() {
            if r != rank && !work[r][col].is_zero() {
                let f = work[r][col].clone();
                for c in 0..width {
                    let sub = &f * &work[rank][c];
                    work[r][c] = &work[r][c] - sub;
                }
            }
        }
        pivots.push(col);
        rank += 1;
    }
    let free: Vec<usize> = (0..width).filter(|c| !pivots.contains(c)).collect();
    free.iter()
        .map(|&fc| {
            let mut v = vec![BigRational::zero(); width];
            v[fc] = BigRational::one();
            for (k, &col) in pivots.iter().enumerate() {
                v[col] = -work[k][fc].clone();
            }
            let mut f = BigInt::one();
            for x in &v {
                f = f.lcm(x.denom());
            }
            v.iter().map(|x| x.numer() * (&f / x.denom())).collect()
        })
        .collect()
}

/// Affine parameterization of the solution set of a homogeneous equality
/// system.
///
/// `eqs` holds rows `(c0, c1, .., cd)` meaning `c0 + c . x = 0` over `d`
/// variables. On success returns `(T, T2)` where `T` is `(1+d) x (1+e)`
/// with first row `(f, 0, .., 0)`, mapping homogeneous points of the
/// compressed `e`-dimensional space onto the subspace, and `T2` is its
/// homogeneous left inverse mapping constraints back out. Constraint rows
/// transform forward as `c * T` and backward as `c' * T2`.
pub fn equality_compression(eqs: &[Vec<BigInt>], row_len: usize) -> Result<(Mat, Mat)> {
    let d = row_len - 1;
    let mut work: Vec<Vec<BigRational>> = eqs
        .iter()
        .map(|r| r.iter().map(|v| BigRational::from(v.clone())).collect())
        .collect();

    // Reduce on the variable columns; the constant tags along
    let mut pivots: Vec<usize> = Vec::new();
    let mut rank = 0;
    for col in 1..row_len {
        let Some(pr) = (rank..work.len()).find(|&r| !work[r][col].is_zero()) else {
            continue;
        };
        work.swap(rank, pr);
        let inv = work[rank][col].recip();
        for v in work[rank].iter_mut() {
            *v = &*v * &inv;
        }
        for r in 0..work.len() {
            if r != rank && !work[r][col].is_zero() {
                let f = work[r][col].clone();
                for c in 0..row_len {
                    let sub = &f * &work[rank][c];
                    work[r][c] = &work[r][c] - sub;
                }
            }
        }
        pivots.push(col);
        rank += 1;
    }
    for r in rank..work.len() {
        if !work[r][0].is_zero() {
            return Err(HullError::Precondition(
                "equality compression of an inconsistent system".to_string(),
            ));
        }
    }

    let free: Vec<usize> = (1..row_len).filter(|c| !pivots.contains(c)).collect();
    let e = d - rank;

    // Particular solution with free variables at zero: pivot var of row k
    // equals -constant of the reduced row
    let mut t = vec![vec![BigRational::zero(); 1 + e]; row_len];
    t[0][0] = BigRational::one();
    for (k, &col) in pivots.iter().enumerate() {
        t[col][0] = -work[k][0].clone();
    }
    // Nullspace basis: one column per free variable
    for (j, &fc) in free.iter().enumerate() {
        t[fc][1 + j] = BigRational::one();
        for (k, &col) in pivots.iter().enumerate() {
            t[col][1 + j] = -work[k][fc].clone();
        }
    }

    let t = clear_denominators(&t);
    let t2 = t.left_inverse()?;
    Ok((t, t2))
}
