//! Simple hull: the tightest superset of a union that can be written
//! using only relaxed translates of the union's own constraints, plus
//! the bounded variant that re-tightens unbounded dimensions through
//! projection.

use crate::basic_set::BasicSet;
use crate::error::Result;
use crate::seq;
use crate::set::Set;
use crate::space::Space;
use crate::tab::{LpOutcome, Tab};
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

impl Set {
    /// A superset of the union in which every inequality has the
    /// coefficient vector of some constraint of some piece, with a
    /// possibly relaxed constant.
    pub fn simple_hull(self) -> Result<BasicSet> {
        let set = self.align_divs().remove_empty_parts();
        let space = set.space().clone();
        if set.n() == 0 {
            return Ok(BasicSet::empty(space));
        }
        let set = set.normalize()?;
        if set.n() == 0 {
            return Ok(BasicSet::empty(space));
        }
        if set.n() == 1 {
            return Ok(set.into_sole_part()?.finalize());
        }

        let mut hull = set.affine_hull()?;
        let mut hull_keys: HashSet<Vec<BigInt>> = HashSet::new();
        for eq in hull.eqs() {
            hull_keys.insert(eq[1..].to_vec());
            hull_keys.insert(seq::negated(&eq[1..]));
        }

        let parts = set.parts();
        let n = parts.len();
        let piece_hash: Vec<HashMap<Vec<BigInt>, BigInt>> =
            parts.iter().map(constraint_hash).collect();
        // one tableau per piece, reused by every probe of this call
        let tabs: Vec<Tab> = parts.iter().map(Tab::from_basic_set).collect();

        debug!(pieces = n, "collecting relaxed common constraints");
        for i in 0..n {
            for row in candidate_rows(&parts[i]) {
                let key = row[1..].to_vec();
                if hull_keys.contains(&key) {
                    continue;
                }
                // an earlier piece already proposed this direction
                if (0..i).any(|j| piece_hash[j].contains_key(&key)) {
                    continue;
                }
                let mut c0 = row[0].clone();
                let mut ok = true;
                for j in 0..n {
                    if j == i {
                        continue;
                    }
                    if j > i && let Some(k0) = piece_hash[j].get(&key) {
                        if *k0 > c0 {
                            c0 = k0.clone();
                        }
                        continue;
                    }
                    let mut obj = vec![BigInt::zero()];
                    obj.extend_from_slice(&key);
                    match tabs[j].min(&obj)? {
                        LpOutcome::Bounded(min) => {
                            let need = (-min).ceil().to_integer();
                            if need > c0 {
                                c0 = need;
                            }
                        }
                        LpOutcome::Unbounded => {
                            trace!(piece = j, "direction unbounded, dropping candidate");
                            ok = false;
                            break;
                        }
                        // an empty piece constrains nothing
                        LpOutcome::Empty => continue,
                    }
                }
                if ok {
                    let mut committed = vec![c0];
                    committed.extend(key.iter().cloned());
                    hull = hull.add_inequality(committed)?;
                    hull_keys.insert(key);
                }
            }
        }
        hull.basic_hull()
    }

    /// Simple hull with every set dimension bounded whenever the union
    /// bounds it: dimensions the simple hull leaves open are tightened
    /// by projecting the union onto them and hulling the projection.
    pub fn bounded_simple_hull(self) -> Result<BasicSet> {
        let set = self.align_divs();
        let space = set.space().clone();
        let mut hull = set.clone().simple_hull()?;
        if hull.is_flagged_empty() {
            return Ok(hull);
        }
        for i in 0..space.n_dim {
            if dim_is_bounded(&hull, &space, i) {
                continue;
            }
            debug!(dim = i, "tightening an unbounded dimension");
            let bounds = set_bounds(set.clone(), &space, i)?;
            hull = hull.intersect(bounds)?;
        }
        hull.basic_hull()
    }
}

/// Equalities in both orientations, then inequalities
fn candidate_rows(piece: &BasicSet) -> Vec<Vec<BigInt>> {
    let mut rows = Vec::with_capacity(2 * piece.n_eq() + piece.n_ineq());
    for eq in piece.eqs() {
        rows.push(eq.clone());
        rows.push(seq::negated(eq));
    }
    rows.extend(piece.ineqs().iter().cloned());
    rows
}

/// Direction -> weakest constant of the piece's own constraints
fn constraint_hash(piece: &BasicSet) -> HashMap<Vec<BigInt>, BigInt> {
    let mut table = HashMap::new();
    for row in candidate_rows(piece) {
        table
            .entry(row[1..].to_vec())
            .and_modify(|cur: &mut BigInt| {
                if row[0] > *cur {
                    *cur = row[0].clone();
                }
            })
            .or_insert_with(|| row[0].clone());
    }
    table
}

/// A set dimension is bounded when an equality determines it from the
/// columns left of it, or a lower and an upper inequality touch no other
/// set dimension or existential.
fn dim_is_bounded(hull: &BasicSet, space: &Space, i: usize) -> bool {
    let col = space.dim_col(i);
    let row_len = space.row_len();
    for eq in hull.eqs() {
        if !eq[col].is_zero() && (col + 1..row_len).all(|c| eq[c].is_zero()) {
            return true;
        }
    }
    let clean = |row: &[BigInt]| {
        (0..space.n_dim).all(|j| j == i || row[space.dim_col(j)].is_zero())
            && (1 + space.n_param + space.n_dim..row_len).all(|c| row[c].is_zero())
    };
    let lower = hull
        .ineqs()
        .iter()
        .any(|r| r[col].is_positive() && clean(r));
    let upper = hull
        .ineqs()
        .iter()
        .any(|r| r[col].is_negative() && clean(r));
    lower && upper
}

/// Bounds of the union on set dimension `i` alone: eliminate every other
/// set dimension and all existentials, then hull the projection.
fn set_bounds(set: Set, space: &Space, i: usize) -> Result<BasicSet> {
    let np = space.n_param;
    let nd = space.n_dim;
    let mut projected = set;
    if i > 0 {
        projected = projected.eliminate_vars(np, i)?;
    }
    if i + 1 < nd {
        projected = projected.eliminate_vars(np + i + 1, nd - i - 1)?;
    }
    if space.n_div > 0 {
        projected = projected.eliminate_vars(np + nd, space.n_div)?;
    }
    projected.convex_hull()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq::row;

    #[test]
    fn test_simple_hull_of_intervals() {
        // [0, 5] and [3, 10]: every bound is a translate of an input bound
        let a = BasicSet::from_rows_i64(Space::pure(1), &[], &[&[0, 1], &[5, -1]]).unwrap();
        let b = BasicSet::from_rows_i64(Space::pure(1), &[], &[&[-3, 1], &[10, -1]]).unwrap();
        let set = Set::from_parts(vec![a, b]).unwrap();
        let hull = set.simple_hull().unwrap();
        assert_eq!(hull.n_ineq(), 2);
        assert!(hull.ineqs().contains(&row(&[0, 1])));
        assert!(hull.ineqs().contains(&row(&[10, -1])));
    }

    #[test]
    fn test_simple_hull_with_parameter() {
        // {0 <= x <= n} union {0 <= x <= n + 1} over parameter n:
        // the upper bound relaxes to x <= n + 1
        let space = Space::new(1, 1, 0);
        let a =
            BasicSet::from_rows_i64(space.clone(), &[], &[&[0, 0, 1], &[0, 1, -1]]).unwrap();
        let b =
            BasicSet::from_rows_i64(space.clone(), &[], &[&[0, 0, 1], &[1, 1, -1]]).unwrap();
        let set = Set::from_parts(vec![a, b]).unwrap();
        let hull = set.simple_hull().unwrap();
        assert_eq!(hull.n_ineq(), 2);
        assert!(hull.ineqs().contains(&row(&[0, 0, 1])));
        assert!(hull.ineqs().contains(&row(&[1, 1, -1])));
    }

    #[test]
    fn test_simple_hull_drops_unbounded_direction() {
        // [0, 1] and the half line x >= 5: no finite upper translate
        let a = BasicSet::from_rows_i64(Space::pure(1), &[], &[&[0, 1], &[1, -1]]).unwrap();
        let b = BasicSet::from_rows_i64(Space::pure(1), &[], &[&[-5, 1]]).unwrap();
        let set = Set::from_parts(vec![a, b]).unwrap();
        let hull = set.simple_hull().unwrap();
        assert_eq!(hull.n_ineq(), 1);
        assert_eq!(hull.ineqs()[0], row(&[0, 1]));
    }

    #[test]
    fn test_dim_bounded_check() {
        let space = Space::pure(2);
        let hull = BasicSet::from_rows_i64(
            space.clone(),
            &[],
            &[&[0, 1, 0], &[1, -1, 0], &[0, 1, 1]],
        )
        .unwrap();
        assert!(dim_is_bounded(&hull, &space, 0));
        // dimension 1 has a lower bound entangled with dimension 0 only
        assert!(!dim_is_bounded(&hull, &space, 1));
    }

    #[test]
    fn test_bounded_simple_hull_recovers_box() {
        // two boxes whose skewed descriptions hide the plain bounds on y
        let a = BasicSet::from_rows_i64(
            Space::pure(2),
            &[],
            &[&[0, 1, 0], &[1, -1, 0], &[0, 1, 1], &[1, -1, -1]],
        )
        .unwrap();
        let b = BasicSet::from_rows_i64(
            Space::pure(2),
            &[],
            &[&[0, 1, 0], &[1, -1, 0], &[0, -1, 1], &[1, 1, -1]],
        )
        .unwrap();
        let set = Set::from_parts(vec![a, b]).unwrap();
        let hull = set.bounded_simple_hull().unwrap();
        // both dimensions end up with explicit bounds
        let space = Space::pure(2);
        assert!(dim_is_bounded(&hull, &space, 0));
        assert!(dim_is_bounded(&hull, &space, 1));
    }
}
