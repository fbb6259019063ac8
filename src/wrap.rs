//! Exact hull of a bounded full-dimensional union by ridge wrapping:
//! start from one facet of the hull and rotate it around the ridges of
//! already-known facets until the description closes up.

use crate::basic_set::BasicSet;
use crate::error::{HullError, Result};
use crate::hull;
use crate::mat::{self, Mat};
use crate::seq;
use crate::set::{Set, basic_set_from_ineqs};
use crate::space::Space;
use crate::tab::{self, LpOutcome};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};
use std::collections::HashMap;
use tracing::trace;

/// Wrapping entry point. The input is pure, rational, bounded,
/// full-dimensional, at least 2-dimensional, and every piece is nonempty
/// and normalized.
pub(crate) fn uset_convex_hull_wrap(set: Set) -> Result<BasicSet> {
    check_wrap_precondition(&set)?;
    let space = set.space().clone();
    let (candidates, is_hull) = proto_hull(&set);
    if is_hull {
        trace!(
            facets = candidates.len(),
            "a relaxed piece description already is the hull"
        );
        return basic_set_from_ineqs(space, &candidates)?
            .set_rational()
            .basic_hull();
    }
    let seed = if candidates.is_empty() {
        vec![initial_facet(&set)?]
    } else {
        candidates
    };
    extend(&set, seed)
}

fn check_wrap_precondition(set: &Set) -> Result<()> {
    if !set.space().is_pure() {
        return Err(HullError::Precondition(
            "wrapping kernel fed a set with parameters or existentials".to_string(),
        ));
    }
    if set.space().total() < 2 || set.n() == 0 {
        return Err(HullError::Precondition(
            "wrapping kernel needs at least two dimensions and one piece".to_string(),
        ));
    }
    Ok(())
}

/// Common constraints: relaxed translates of the inequalities of the
/// piece with the fewest inequalities (preferring one without
/// equalities) that appear in every other piece. When some piece's full
/// description consists of exactly the surviving rows, those rows are
/// the hull.
fn proto_hull(set: &Set) -> (Vec<Vec<BigInt>>, bool) {
    let parts = set.parts();
    let Some(seed) = parts
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| (p.n_eq() > 0, p.n_ineq()))
        .map(|(i, _)| i)
    else {
        return (Vec::new(), false);
    };

    let mut candidates: Vec<Vec<BigInt>> = Vec::new();
    for row in parts[seed].ineqs() {
        if !candidates.iter().any(|c| c[1..] == row[1..]) {
            candidates.push(row.clone());
        }
    }

    for (k, piece) in parts.iter().enumerate() {
        if k == seed || candidates.is_empty() {
            continue;
        }
        let mut table: HashMap<Vec<BigInt>, BigInt> = HashMap::new();
        let negated: Vec<Vec<BigInt>> = piece.eqs().iter().map(|r| seq::negated(r)).collect();
        for row in piece.ineqs().iter().chain(piece.eqs()).chain(&negated) {
            table
                .entry(row[1..].to_vec())
                .and_modify(|cur| {
                    if row[0] > *cur {
                        *cur = row[0].clone();
                    }
                })
                .or_insert_with(|| row[0].clone());
        }
        candidates.retain_mut(|cand| match table.get(&cand[1..]) {
            Some(c0) => {
                if *c0 > cand[0] {
                    cand[0] = c0.clone();
                }
                true
            }
            None => false,
        });
    }

    let is_hull = !candidates.is_empty()
        && parts.iter().any(|p| {
            p.n_eq() == 0
                && p.n_ineq() == candidates.len()
                && candidates.iter().all(|c| p.ineqs().contains(c))
        });
    (candidates, is_hull)
}

/// Minimum of `dir . x` over every piece of the union, or `None` when
/// some piece is unbounded in that direction.
fn uset_is_bound(set: &Set, dir: &[BigInt]) -> Result<Option<BigRational>> {
    let mut obj = vec![BigInt::zero()];
    obj.extend_from_slice(dir);
    let mut global: Option<BigRational> = None;
    for piece in set.parts() {
        match tab::solve_lp(piece, false, &obj)? {
            LpOutcome::Empty => continue,
            LpOutcome::Unbounded => return Ok(None),
            LpOutcome::Bounded(v) => {
                if global.as_ref().is_none_or(|g| v < *g) {
                    global = Some(v);
                }
            }
        }
    }
    match global {
        Some(v) => Ok(Some(v)),
        None => Err(HullError::Precondition(
            "bound probe over a union of empty pieces".to_string(),
        )),
    }
}

/// A maximal set of linearly independent supporting hyperplanes, one
/// per bounded direction drawn from the constraints of the pieces. Each
/// returned row is tight on the union.
fn independent_bounds(set: &Set) -> Result<Vec<Vec<BigInt>>> {
    let d = set.space().total();
    let mut bounds: Vec<Vec<BigInt>> = Vec::with_capacity(d);
    let mut echelon: Vec<(usize, Vec<BigRational>)> = Vec::new();

    'pieces: for piece in set.parts() {
        let negated: Vec<Vec<BigInt>> = piece.eqs().iter().map(|r| seq::negated(r)).collect();
        for row in piece
            .eqs()
            .iter()
            .chain(&negated)
            .chain(piece.ineqs().iter())
        {
            if bounds.len() == d {
                break 'pieces;
            }
            let dir = &row[1..];
            if !span_extends(&echelon, dir) {
                continue;
            }
            let Some(min) = uset_is_bound(set, dir)? else {
                continue;
            };
            // supporting hyperplane: den * dir . x - num >= 0
            let mut supp = vec![-min.numer().clone()];
            supp.extend(dir.iter().map(|c| c * min.denom()));
            seq::normalize(&mut supp);
            bounds.push(supp);
            span_insert_dir(&mut echelon, dir);
        }
    }

    if bounds.len() < d {
        return Err(HullError::Precondition(format!(
            "only {} of {} independent bounds in a bounded union",
            bounds.len(),
            d
        )));
    }
    Ok(bounds)
}

fn span_extends(echelon: &[(usize, Vec<BigRational>)], dir: &[BigInt]) -> bool {
    reduce_dir(echelon, dir).is_some()
}

fn span_insert_dir(echelon: &mut Vec<(usize, Vec<BigRational>)>, dir: &[BigInt]) {
    if let Some(reduced) = reduce_dir(echelon, dir) {
        echelon.push(reduced);
    }
}

fn reduce_dir(
    echelon: &[(usize, Vec<BigRational>)],
    dir: &[BigInt],
) -> Option<(usize, Vec<BigRational>)> {
    let mut v: Vec<BigRational> = dir
        .iter()
        .map(|c| BigRational::from(c.clone()))
        .collect();
    for (p, row) in echelon {
        if !v[*p].is_zero() {
            let f = v[*p].clone();
            for (x, y) in v.iter_mut().zip(row) {
                let sub = &f * y;
                *x = &*x - sub;
            }
        }
    }
    let p = v.iter().position(|x| !x.is_zero())?;
    let inv = v[p].recip();
    for x in v.iter_mut() {
        *x = &*x * &inv;
    }
    Some((p, v))
}

/// One true facet of the hull: start from a supporting hyperplane and
/// rotate it around ridges taken from the affine hull of its tight slice
/// until that slice is `(d-1)`-dimensional.
fn initial_facet(set: &Set) -> Result<Vec<BigInt>> {
    let d = set.space().total();
    let bounds = independent_bounds(set)?;
    let mut facet = bounds[0].clone();

    for _ in 0..=d {
        let slice = set.clone().add_equality(&facet)?;
        let face = slice.affine_hull()?;
        if face.is_flagged_empty() {
            return Err(HullError::Precondition(
                "supporting hyperplane misses the union".to_string(),
            ));
        }
        if face.n_eq() == 1 {
            return Ok(facet);
        }
        let ridge = face
            .eqs()
            .iter()
            .find(|e| !parallel(&e[1..], &facet[1..]))
            .ok_or_else(|| {
                HullError::Precondition("touching face with a degenerate equality basis".to_string())
            })?
            .clone();
        trace!(touching_eqs = face.n_eq(), "rotating the initial bound");
        facet = wrap_facet(set, &facet, &ridge)?.ok_or_else(|| HullError::LpFailure {
            reason: "initial facet wrap unbounded over a bounded union".to_string(),
        })?;
    }
    Err(HullError::Precondition(
        "initial facet construction did not converge".to_string(),
    ))
}

/// True when two directions are proportional
fn parallel(a: &[BigInt], b: &[BigInt]) -> bool {
    for i in 0..a.len() {
        for j in i + 1..a.len() {
            if &a[i] * &b[j] != &a[j] * &b[i] {
                return false;
            }
        }
    }
    true
}

/// Rotate `facet` about `ridge` onto the adjacent supporting hyperplane.
///
/// The union is sliced into the 2-plane where the facet reads `x1 >= 0`
/// and the ridge `x2 >= 0`, and the wrapping LP is solved over the
/// homogenized cones of the pieces: per piece `k` variables
/// `(a_k, x_k1, x_k2)` with `a_k >= 0`, globally `sum x_k1 = 1`,
/// minimizing `sum x_k2`. The optimum `n/d` yields the rotated
/// constraint `d * ridge - n * facet`. An unbounded LP means the facet
/// is unbounded through this ridge and `None` is returned; any other LP
/// failure aborts.
pub(crate) fn wrap_facet(
    set: &Set,
    facet: &[BigInt],
    ridge: &[BigInt],
) -> Result<Option<Vec<BigInt>>> {
    let row_len = set.space().row_len();
    let mut unit = vec![BigInt::zero(); row_len];
    unit[0] = BigInt::one();
    let m = Mat::from_rows(vec![unit, facet.to_vec(), ridge.to_vec()])?;
    let t = m.right_inverse()?;
    // pieces missed by the 2-plane reduce to the canonical empty form,
    // which would leave their LP block unconstrained
    let sliced = set.clone().preimage(&t)?.remove_empty_parts();

    let n = sliced.n();
    let lp_space = Space::pure(3 * n);
    let mut lp = BasicSet::universe(lp_space.clone()).set_rational();
    for (k, piece) in sliced.parts().iter().enumerate() {
        let off = 1 + 3 * k;
        let spread = |src: &[BigInt]| {
            let mut row = vec![BigInt::zero(); lp_space.row_len()];
            row[off] = src[0].clone();
            row[off + 1] = src[1].clone();
            row[off + 2] = src[2].clone();
            row
        };
        for eq in piece.eqs() {
            lp = lp.add_equality(spread(eq))?;
        }
        for ineq in piece.ineqs() {
            lp = lp.add_inequality(spread(ineq))?;
        }
        let mut nonneg = vec![BigInt::zero(); lp_space.row_len()];
        nonneg[off] = BigInt::one();
        lp = lp.add_inequality(nonneg)?;
    }
    let mut total = vec![BigInt::zero(); lp_space.row_len()];
    total[0] = -BigInt::one();
    for k in 0..n {
        total[1 + 3 * k + 1] = BigInt::one();
    }
    lp = lp.add_equality(total)?;

    let mut obj = vec![BigInt::zero(); lp_space.row_len()];
    for k in 0..n {
        obj[1 + 3 * k + 2] = BigInt::one();
    }

    match tab::solve_lp(&lp, false, &obj)? {
        LpOutcome::Unbounded => Ok(None),
        LpOutcome::Empty => Err(HullError::LpFailure {
            reason: "wrapping lp is infeasible".to_string(),
        }),
        LpOutcome::Bounded(opt) => {
            let mut row = seq::combine(&-opt.numer().clone(), facet, opt.denom(), ridge);
            seq::normalize(&mut row);
            Ok(Some(row))
        }
    }
}

/// The `(d-1)`-dimensional description of the face of the union tight
/// for `c`: compress the slice one dimension down, hull it recursively,
/// and lift the constraints back.
fn compute_facet(set: &Set, c: &[BigInt]) -> Result<BasicSet> {
    let row_len = set.space().row_len();
    let (t, t2) = mat::equality_compression(&[c.to_vec()], row_len)?;
    let slice = set.clone().add_equality(c)?.preimage(&t)?;
    let fhull = hull::uset_convex_hull(slice)?;
    if fhull.is_flagged_empty() {
        return Err(HullError::Precondition(
            "tight slice of a supporting hyperplane is empty".to_string(),
        ));
    }
    fhull.preimage(&t2)
}

/// The main loop: grow the hull row by row. For each hull inequality,
/// compare the ridges of its true facet against the slice the hull
/// already knows and wrap every unmatched ridge into a new facet.
fn extend(set: &Set, seed: Vec<Vec<BigInt>>) -> Result<BasicSet> {
    let space = set.space().clone();
    let mut rows = seed;
    let mut i = 0;
    while i < rows.len() {
        let c = rows[i].clone();
        let facet = compute_facet(set, &c)?
            .add_equality(c.clone())?
            .gauss()
            .normalize_constraints();
        let hull_facet = basic_set_from_ineqs(space.clone(), &rows)?
            .add_equality(c.clone())?
            .gauss()
            .normalize_constraints();
        trace!(
            row = i,
            hull_rows = rows.len(),
            ridges = facet.n_ineq(),
            "extending the hull through one facet"
        );
        for ridge in facet.ineqs() {
            if hull_facet.ineqs().contains(ridge) {
                continue;
            }
            if let Some(new) = wrap_facet(set, &c, ridge)?
                && !rows.contains(&new)
            {
                rows.push(new);
            }
        }
        i += 1;
    }
    basic_set_from_ineqs(space, &rows)?.set_rational().basic_hull()
}
