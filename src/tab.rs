//! Exact LP over a basic set: a dense two-phase primal simplex on
//! `BigRational`, with Bland's rule for anti-cycling. Free variables are
//! split into differences of nonnegative ones; every inequality gets a
//! slack. Empty and Unbounded are data conditions for the callers, not
//! errors.

use crate::basic_set::BasicSet;
use crate::error::{HullError, Result};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// Outcome of one LP query
#[derive(Debug, Clone, PartialEq)]
pub enum LpOutcome {
    /// Finite optimum, exact
    Bounded(BigRational),
    /// The objective is unbounded in the requested direction
    Unbounded,
    /// The basic set has no rational point
    Empty,
}

/// Standard-form tableau of one basic set, reusable across objectives
#[derive(Debug, Clone)]
pub struct Tab {
    n_var: usize,
    n_cols: usize,
    rows: Vec<Vec<BigRational>>,
    rhs: Vec<BigRational>,
}

impl Tab {
    /// Build the standard form: `x_j = u_j - v_j`, one slack per
    /// inequality, right-hand sides made nonnegative.
    pub fn from_basic_set(bset: &BasicSet) -> Self {
        let d = bset.space().total();
        let n_slack = bset.n_ineq();
        let n_cols = 2 * d + n_slack;
        let mut rows = Vec::with_capacity(bset.n_eq() + n_slack);
        let mut rhs = Vec::with_capacity(bset.n_eq() + n_slack);

        let mut push = |src: &[BigInt], slack: Option<usize>| {
            let mut row = vec![BigRational::zero(); n_cols];
            for j in 0..d {
                let c = BigRational::from(src[1 + j].clone());
                row[d + j] = -c.clone();
                row[j] = c;
            }
            if let Some(s) = slack {
                row[2 * d + s] = -BigRational::one();
            }
            let mut b = -BigRational::from(src[0].clone());
            if b.is_negative() {
                for v in row.iter_mut() {
                    *v = -std::mem::take(v);
                }
                b = -b;
            }
            rows.push(row);
            rhs.push(b);
        };

        for eq in bset.eqs() {
            push(eq, None);
        }
        for (s, ineq) in bset.ineqs().iter().enumerate() {
            push(ineq, Some(s));
        }

        Self {
            n_var: d,
            n_cols,
            rows,
            rhs,
        }
    }

    /// Minimize `objective[0] + objective[1..] . x`
    pub fn min(&self, objective: &[BigInt]) -> Result<LpOutcome> {
        if objective.len() != 1 + self.n_var {
            return Err(HullError::DimensionMismatch {
                expected: 1 + self.n_var,
                got: objective.len(),
            });
        }
        let mut cost = vec![BigRational::zero(); self.n_cols];
        for j in 0..self.n_var {
            let c = BigRational::from(objective[1 + j].clone());
            cost[self.n_var + j] = -c.clone();
            cost[j] = c;
        }
        match self.solve(cost)? {
            Solved::Infeasible => Ok(LpOutcome::Empty),
            Solved::Unbounded => Ok(LpOutcome::Unbounded),
            Solved::Optimal(v) => Ok(LpOutcome::Bounded(
                v + BigRational::from(objective[0].clone()),
            )),
        }
    }

    /// Maximize `objective[0] + objective[1..] . x`
    pub fn max(&self, objective: &[BigInt]) -> Result<LpOutcome> {
        let negated: Vec<BigInt> = objective.iter().map(|v| -v).collect();
        Ok(match self.min(&negated)? {
            LpOutcome::Bounded(v) => LpOutcome::Bounded(-v),
            other => other,
        })
    }

    fn solve(&self, cost: Vec<BigRational>) -> Result<Solved> {
        let m = self.rows.len();
        let mut t = self.rows.clone();
        let mut b = self.rhs.clone();

        // Phase 1: artificial basis
        for (i, row) in t.iter_mut().enumerate() {
            row.extend((0..m).map(|j| {
                if i == j {
                    BigRational::one()
                } else {
                    BigRational::zero()
                }
            }));
        }
        let mut basis: Vec<usize> = (self.n_cols..self.n_cols + m).collect();
        let mut phase1 = vec![BigRational::zero(); self.n_cols + m];
        for v in phase1.iter_mut().skip(self.n_cols) {
            *v = BigRational::one();
        }
        let value = match primal(&mut t, &mut b, &mut basis, &phase1) {
            Some(v) => v,
            None => {
                return Err(HullError::LpFailure {
                    reason: "phase 1 unbounded".to_string(),
                });
            }
        };
        if value.is_positive() {
            return Ok(Solved::Infeasible);
        }

        // Drive leftover artificials out of the basis
        let mut i = 0;
        while i < basis.len() {
            if basis[i] < self.n_cols {
                i += 1;
                continue;
            }
            if let Some(j) = (0..self.n_cols).find(|&j| !t[i][j].is_zero()) {
                pivot(&mut t, &mut b, &mut basis, i, j);
                i += 1;
            } else {
                // redundant row
                t.remove(i);
                b.remove(i);
                basis.remove(i);
            }
        }
        for row in t.iter_mut() {
            row.truncate(self.n_cols);
        }

        // Phase 2
        match primal(&mut t, &mut b, &mut basis, &cost) {
            Some(v) => Ok(Solved::Optimal(v)),
            None => Ok(Solved::Unbounded),
        }
    }
}

enum Solved {
    Optimal(BigRational),
    Unbounded,
    Infeasible,
}

/// Primal simplex from a feasible basis. Returns the optimum, or `None`
/// when the objective is unbounded below. Bland's rule throughout.
fn primal(
    t: &mut [Vec<BigRational>],
    b: &mut [BigRational],
    basis: &mut [usize],
    cost: &[BigRational],
) -> Option<BigRational> {
    let n = cost.len();
    let mut red: Vec<BigRational> = cost.to_vec();
    let mut z = BigRational::zero();
    for (i, &bi) in basis.iter().enumerate() {
        if cost[bi].is_zero() {
            continue;
        }
        let c = cost[bi].clone();
        for j in 0..n {
            let sub = &c * &t[i][j];
            red[j] = &red[j] - sub;
        }
        z += &c * &b[i];
    }

    loop {
        let Some(enter) = (0..n).find(|&j| red[j].is_negative()) else {
            return Some(z);
        };
        let mut leave: Option<(usize, BigRational)> = None;
        for i in 0..t.len() {
            if !t[i][enter].is_positive() {
                continue;
            }
            let ratio = &b[i] / &t[i][enter];
            let better = match &leave {
                None => true,
                Some((li, cur)) => ratio < *cur || (ratio == *cur && basis[i] < basis[*li]),
            };
            if better {
                leave = Some((i, ratio));
            }
        }
        let (leave, theta) = leave?;
        z += &red[enter] * &theta;
        pivot(t, b, basis, leave, enter);
        let f = red[enter].clone();
        for j in 0..n {
            let sub = &f * &t[leave][j];
            red[j] = &red[j] - sub;
        }
    }
}

fn pivot(
    t: &mut [Vec<BigRational>],
    b: &mut [BigRational],
    basis: &mut [usize],
    row: usize,
    col: usize,
) {
    let inv = t[row][col].recip();
    for v in t[row].iter_mut() {
        *v = &*v * &inv;
    }
    b[row] = &b[row] * &inv;
    for i in 0..t.len() {
        if i == row || t[i][col].is_zero() {
            continue;
        }
        let f = t[i][col].clone();
        for j in 0..t[i].len() {
            let sub = &f * &t[row][j];
            t[i][j] = &t[i][j] - sub;
        }
        let sub = &f * &b[row];
        b[i] = &b[i] - sub;
    }
    basis[row] = col;
}

/// One-shot LP over a basic set
pub fn solve_lp(bset: &BasicSet, maximize: bool, objective: &[BigInt]) -> Result<LpOutcome> {
    let tab = Tab::from_basic_set(bset);
    if maximize {
        tab.max(objective)
    } else {
        tab.min(objective)
    }
}

/// Whether the recession cone of `bset` degenerates to the origin.
///
/// The cone is clamped to the unit box, which keeps every probe bounded;
/// a nonzero element exists iff some coordinate can move off zero.
pub fn cone_is_bounded(bset: &BasicSet) -> Result<bool> {
    let d = bset.space().total();
    if d == 0 {
        return Ok(true);
    }
    let mut boxed = bset.recession_cone();
    for j in 0..d {
        let mut lo = vec![BigInt::zero(); 1 + d];
        lo[0] = BigInt::one();
        lo[1 + j] = BigInt::one();
        let mut hi = vec![BigInt::zero(); 1 + d];
        hi[0] = BigInt::one();
        hi[1 + j] = -BigInt::one();
        boxed = boxed.add_inequality(lo)?.add_inequality(hi)?;
    }
    let tab = Tab::from_basic_set(&boxed);
    for j in 0..d {
        for sign in [1i64, -1] {
            let mut obj = vec![BigInt::zero(); 1 + d];
            obj[1 + j] = BigInt::from(sign);
            match tab.max(&obj)? {
                LpOutcome::Bounded(v) => {
                    if v.is_positive() {
                        return Ok(false);
                    }
                }
                LpOutcome::Unbounded => return Ok(false),
                LpOutcome::Empty => {
                    return Err(HullError::LpFailure {
                        reason: "recession cone with no origin".to_string(),
                    });
                }
            }
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq::row;
    use crate::space::Space;

    fn bset(eq: &[&[i64]], ineq: &[&[i64]], d: usize) -> BasicSet {
        BasicSet::from_rows_i64(Space::pure(d), eq, ineq).unwrap()
    }

    #[test]
    fn test_min_over_interval() {
        // 2 <= x <= 7, minimize x
        let b = bset(&[], &[&[-2, 1], &[7, -1]], 1);
        let out = solve_lp(&b, false, &row(&[0, 1])).unwrap();
        assert_eq!(out, LpOutcome::Bounded(BigRational::from(BigInt::from(2))));
        let out = solve_lp(&b, true, &row(&[0, 1])).unwrap();
        assert_eq!(out, LpOutcome::Bounded(BigRational::from(BigInt::from(7))));
    }

    #[test]
    fn test_fractional_optimum() {
        // 3x >= 1, minimize x: optimum 1/3
        let b = bset(&[], &[&[-1, 3]], 1);
        let out = solve_lp(&b, false, &row(&[0, 1])).unwrap();
        assert_eq!(
            out,
            LpOutcome::Bounded(BigRational::new(BigInt::one(), BigInt::from(3)))
        );
    }

    #[test]
    fn test_unbounded() {
        let b = bset(&[], &[&[0, 1]], 1);
        assert_eq!(solve_lp(&b, true, &row(&[0, 1])).unwrap(), LpOutcome::Unbounded);
    }

    #[test]
    fn test_infeasible() {
        let b = bset(&[], &[&[-5, 1], &[3, -1]], 1);
        assert_eq!(solve_lp(&b, false, &row(&[0, 1])).unwrap(), LpOutcome::Empty);
    }

    #[test]
    fn test_equalities_and_objective_constant() {
        // x + y = 4, x >= 1, y >= 1; minimize 10 + x
        let b = bset(&[&[-4, 1, 1]], &[&[-1, 1, 0], &[-1, 0, 1]], 2);
        let out = solve_lp(&b, false, &row(&[10, 1, 0])).unwrap();
        assert_eq!(out, LpOutcome::Bounded(BigRational::from(BigInt::from(11))));
    }

    #[test]
    fn test_cone_boundedness() {
        // bounded interval: cone is {0}
        let b = bset(&[], &[&[-2, 1], &[7, -1]], 1);
        assert!(cone_is_bounded(&b).unwrap());
        // half line: cone is a ray
        let b = bset(&[], &[&[0, 1]], 1);
        assert!(!cone_is_bounded(&b).unwrap());
        // line in 2d through equality
        let b = bset(&[&[0, 1, -1]], &[], 2);
        assert!(!cone_is_bounded(&b).unwrap());
    }
}
