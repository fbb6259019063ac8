//! Convex hull strategy dispatcher and the low-dimensional and
//! Fourier-Motzkin kernels. The wrapping kernel lives in `wrap`.

use crate::basic_set::BasicSet;
use crate::error::{HullError, Result};
use crate::mat;
use crate::seq;
use crate::set::Set;
use crate::space::Space;
use crate::wrap;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use tracing::debug;

impl BasicSet {
    /// Same solution set, no redundant inequality, implicit equalities
    /// surfaced. The single-basic-set form of the hull operations.
    pub fn basic_hull(self) -> Result<BasicSet> {
        Ok(self.remove_redundancies()?.finalize())
    }
}

impl Set {
    /// The exact convex hull of the union, as a single basic set.
    ///
    /// The union is flattened to a pure rational set, hulled by the
    /// kernel the dispatcher selects, and the schema restored afterwards.
    pub fn convex_hull(self) -> Result<BasicSet> {
        let set = self.align_divs();
        let model = set.space().clone();
        let hull = uset_convex_hull(set.underlying())?;
        let hull = hull.overlying(&model)?;
        Ok(hull.clear_rational().finalize())
    }
}

/// Hull of a pure set: specials first, then affine-hull factoring, then
/// the boundedness-directed choice between wrapping and Fourier-Motzkin.
pub(crate) fn uset_convex_hull(set: Set) -> Result<BasicSet> {
    let space = set.space().clone();
    let set = set.remove_empty_parts();
    if set.n() == 0 {
        return Ok(BasicSet::empty(space));
    }
    if space.total() == 0 {
        return Ok(BasicSet::universe(space).set_rational());
    }
    let set = set.normalize()?;
    if set.n() == 0 {
        return Ok(BasicSet::empty(space));
    }
    if set.n() == 1 {
        return set.into_sole_part();
    }

    let aff = set.affine_hull()?;
    if aff.is_flagged_empty() {
        return Ok(BasicSet::empty(space));
    }
    if aff.n_eq() > 0 {
        debug!(n_eq = aff.n_eq(), "factoring out the affine hull");
        return modulo_affine_hull(set, aff);
    }
    let d = space.total();
    if d == 1 {
        return convex_hull_1d(&set);
    }
    if set.is_bounded()? {
        debug!(pieces = set.n(), dim = d, "bounded union, wrapping kernel");
        wrap::uset_convex_hull_wrap(set)
    } else {
        debug!(pieces = set.n(), dim = d, "unbounded union, fm kernel");
        convex_hull_fm(set)
    }
}

/// Remove the equalities of the affine hull by substitution, hull the
/// lower-dimensional image, and lift the result back.
fn modulo_affine_hull(set: Set, aff: BasicSet) -> Result<BasicSet> {
    let row_len = set.space().row_len();
    let (t, t2) = mat::equality_compression(aff.eqs(), row_len)?;
    if t.n_col == 1 {
        // the affine hull is a single point, which is the hull itself
        return Ok(aff.set_rational());
    }
    let lhull = uset_convex_hull(set.preimage(&t)?)?;
    let lifted = lhull.preimage(&t2)?;
    lifted.intersect(aff)?.basic_hull()
}

/// Scalar hull: one global lower and one global upper bound, each the
/// weakest of the per-piece bounds, absent when any piece lacks that
/// side. Fractions `c0/c1` are compared exactly.
fn convex_hull_1d(set: &Set) -> Result<BasicSet> {
    let space = set.space().clone();
    let mut lower: Option<(BigRational, Vec<BigInt>)> = None;
    let mut upper: Option<(BigRational, Vec<BigInt>)> = None;
    let mut has_lower = true;
    let mut has_upper = true;

    for part in set.parts() {
        let mut part_lower: Option<(BigRational, Vec<BigInt>)> = None;
        let mut part_upper: Option<(BigRational, Vec<BigInt>)> = None;
        let mut consider = |row: &[BigInt]| {
            let value = BigRational::new(-row[0].clone(), row[1].clone());
            if row[1].is_positive() {
                if part_lower.as_ref().is_none_or(|(v, _)| value > *v) {
                    part_lower = Some((value, row.to_vec()));
                }
            } else if part_upper.as_ref().is_none_or(|(v, _)| value < *v) {
                part_upper = Some((value, row.to_vec()));
            }
        };
        for row in part.eqs() {
            if row[1].is_zero() {
                continue;
            }
            consider(row);
            consider(&seq::negated(row));
        }
        for row in part.ineqs() {
            if row[1].is_zero() {
                continue;
            }
            consider(row);
        }

        match part_lower {
            None => has_lower = false,
            Some((value, row)) => {
                if has_lower && lower.as_ref().is_none_or(|(v, _)| value < *v) {
                    lower = Some((value, row));
                }
            }
        }
        match part_upper {
            None => has_upper = false,
            Some((value, row)) => {
                if has_upper && upper.as_ref().is_none_or(|(v, _)| value > *v) {
                    upper = Some((value, row));
                }
            }
        }
    }

    let mut hull = BasicSet::universe(space).set_rational();
    if has_lower && let Some((_, row)) = lower {
        hull = hull.add_inequality(row)?;
    }
    if has_upper && let Some((_, row)) = upper {
        hull = hull.add_inequality(row)?;
    }
    Ok(hull.finalize())
}

/// Convex hull of two pieces by Minkowski sum in homogeneous
/// coordinates: variables `(a1, a2, y, z, x)` with each piece homogenized
/// into its own block, `a1 + a2 = 1`, `x = y + z`; the first `2 + 2d`
/// variables are projected out by Fourier-Motzkin.
fn convex_hull_pair(b1: &BasicSet, b2: &BasicSet) -> Result<BasicSet> {
    b1.space().check_compatible(b2.space())?;
    let d = b1.space().total();
    let wide = Space::pure(2 + 3 * d);
    let mut hull = BasicSet::universe(wide.clone()).set_rational();

    for (i, piece) in [b1, b2].into_iter().enumerate() {
        let homogenize = |src: &[BigInt]| {
            let mut row = vec![BigInt::zero(); wide.row_len()];
            row[1 + i] = src[0].clone();
            for j in 0..d {
                row[1 + 2 + i * d + j] = src[1 + j].clone();
            }
            row
        };
        for eq in piece.eqs() {
            hull = hull.add_equality(homogenize(eq))?;
        }
        for ineq in piece.ineqs() {
            hull = hull.add_inequality(homogenize(ineq))?;
        }
        let mut nonneg = vec![BigInt::zero(); wide.row_len()];
        nonneg[1 + i] = BigInt::from(1);
        hull = hull.add_inequality(nonneg)?;
    }

    let mut sum = vec![BigInt::zero(); wide.row_len()];
    sum[0] = BigInt::from(-1);
    sum[1] = BigInt::from(1);
    sum[2] = BigInt::from(1);
    hull = hull.add_equality(sum)?;
    for j in 0..d {
        let mut link = vec![BigInt::zero(); wide.row_len()];
        link[1 + 2 + j] = BigInt::from(-1);
        link[1 + 2 + d + j] = BigInt::from(-1);
        link[1 + 2 + 2 * d + j] = BigInt::from(1);
        hull = hull.add_equality(link)?;
    }

    hull = hull.eliminate_vars(0, 2 + 2 * d)?;
    hull = hull.drop_vars(0, 2 + 2 * d)?;
    hull.basic_hull()
}

/// Fold the pair kernel across the union, left to right
fn convex_hull_fm(set: Set) -> Result<BasicSet> {
    let mut parts = set.into_parts().into_iter();
    let mut hull = parts
        .next()
        .ok_or_else(|| HullError::Precondition("fm kernel on an empty union".to_string()))?;
    for part in parts {
        hull = convex_hull_pair(&hull, &part)?;
        if hull.is_flagged_empty() {
            return Err(HullError::ComputationError(
                "pairwise hull of nonempty pieces came out empty".to_string(),
            ));
        }
    }
    hull.basic_hull()
}
