//! Finite unions of basic sets and the collection-level passes the hull
//! engine needs: normalization, schema alignment, flattening, and the
//! affine hull of a union.

use crate::basic_set::BasicSet;
use crate::error::{HullError, Result};
use crate::mat::{self, Mat};
use crate::seq;
use crate::space::Space;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

#[derive(Debug, Clone)]
pub struct Set {
    space: Space,
    parts: Vec<BasicSet>,
}

impl Set {
    pub fn empty(space: Space) -> Self {
        Self {
            space,
            parts: Vec::new(),
        }
    }

    pub fn from_basic_set(bset: BasicSet) -> Self {
        Self {
            space: bset.space().clone(),
            parts: vec![bset],
        }
    }

    pub fn from_parts(parts: Vec<BasicSet>) -> Result<Self> {
        let mut iter = parts.into_iter();
        let Some(first) = iter.next() else {
            return Err(HullError::Precondition(
                "a set needs at least one piece or an explicit space".to_string(),
            ));
        };
        iter.try_fold(Self::from_basic_set(first), Set::push)
    }

    /// Add a piece to the union. Pieces may disagree on the width of
    /// their existential block; the narrower side is padded so that the
    /// whole union shares one schema.
    pub fn push(mut self, bset: BasicSet) -> Result<Self> {
        let (sp, bp) = (self.space.n_div, bset.space().n_div);
        let bset = if bp < sp { bset.pad_divs(sp - bp) } else { bset };
        if bp > sp {
            self = self.align_to(bp);
        }
        self.space.check_compatible(bset.space())?;
        self.parts.push(bset);
        Ok(self)
    }

    fn align_to(mut self, n_div: usize) -> Self {
        let missing = n_div - self.space.n_div;
        self.parts = self
            .parts
            .into_iter()
            .map(|p| p.pad_divs(missing))
            .collect();
        self.space.n_div = n_div;
        self
    }

    pub fn space(&self) -> &Space {
        &self.space
    }

    pub fn n(&self) -> usize {
        self.parts.len()
    }

    pub fn parts(&self) -> &[BasicSet] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<BasicSet> {
        self.parts
    }

    pub fn into_sole_part(mut self) -> Result<BasicSet> {
        if self.parts.len() == 1 {
            if let Some(part) = self.parts.pop() {
                return Ok(part);
            }
        }
        Err(HullError::Precondition(format!(
            "expected a single piece, found {}",
            self.parts.len()
        )))
    }

    pub fn set_rational(mut self) -> Self {
        self.parts = self.parts.into_iter().map(BasicSet::set_rational).collect();
        self
    }

    /// Drop pieces already flagged empty
    pub fn remove_empty_parts(mut self) -> Self {
        self.parts.retain(|p| !p.is_flagged_empty());
        self
    }

    /// Per-piece redundancy removal; pieces proven empty are dropped
    pub fn normalize(self) -> Result<Self> {
        let space = self.space.clone();
        let mut parts = Vec::with_capacity(self.parts.len());
        for part in self.parts {
            let part = part.remove_redundancies()?;
            if !part.is_flagged_empty() {
                parts.push(part);
            }
        }
        Ok(Self { space, parts })
    }

    /// Intersect every piece with the hyperplane `row = 0`
    pub fn add_equality(self, row: &[BigInt]) -> Result<Self> {
        let space = self.space.clone();
        let mut parts = Vec::with_capacity(self.parts.len());
        for part in self.parts {
            parts.push(part.add_equality(row.to_vec())?);
        }
        Ok(Self { space, parts })
    }

    pub fn preimage(self, t: &Mat) -> Result<Self> {
        let space = Space::pure(t.n_col - 1);
        let mut parts = Vec::with_capacity(self.parts.len());
        for part in self.parts {
            parts.push(part.preimage(t)?);
        }
        Ok(Self { space, parts })
    }

    pub fn eliminate_vars(self, first: usize, n: usize) -> Result<Self> {
        let space = self.space.clone();
        let mut parts = Vec::with_capacity(self.parts.len());
        for part in self.parts {
            parts.push(part.eliminate_vars(first, n)?);
        }
        Ok(Self { space, parts })
    }

    /// Pad every piece to the widest existential block so that all pieces
    /// share one schema.
    pub fn align_divs(mut self) -> Self {
        let widest = self
            .parts
            .iter()
            .map(|p| p.space().n_div)
            .max()
            .unwrap_or(self.space.n_div);
        self.parts = self
            .parts
            .into_iter()
            .map(|p| {
                let missing = widest - p.space().n_div;
                if missing > 0 { p.pad_divs(missing) } else { p }
            })
            .collect();
        self.space.n_div = widest;
        self
    }

    /// Flatten parameters and existentials into plain set dimensions;
    /// pieces become rational.
    pub fn underlying(mut self) -> Self {
        self.space = Space::pure(self.space.total());
        self.parts = self.parts.into_iter().map(BasicSet::underlying).collect();
        self
    }

    /// Bounded iff every piece's recession cone degenerates to the origin
    pub fn is_bounded(&self) -> Result<bool> {
        for part in &self.parts {
            if !crate::tab::cone_is_bounded(part)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The smallest affine subspace containing the union.
    ///
    /// Folds the pieces by affine span: a sample point of the first
    /// nonempty piece, the direction spaces of all pieces, and the
    /// difference vectors between sample points. The span is converted
    /// back to an equality system through a kernel computation.
    pub fn affine_hull(&self) -> Result<BasicSet> {
        let d = self.space.total();
        let mut origin: Option<Vec<BigRational>> = None;
        let mut dirs: Vec<(usize, Vec<BigRational>)> = Vec::new();

        for part in &self.parts {
            let ah = part.affine_hull()?;
            if ah.is_flagged_empty() {
                continue;
            }
            if ah.n_eq() == 0 {
                return Ok(BasicSet::universe(self.space.clone()));
            }
            let point = ah.sample_point_of_equalities()?;
            let (t, _) = mat::equality_compression(ah.eqs(), self.space.row_len())?;
            for c in 1..t.n_col {
                let v: Vec<BigRational> = (1..self.space.row_len())
                    .map(|r| BigRational::from(t.row(r)[c].clone()))
                    .collect();
                span_insert(&mut dirs, v);
            }
            match &origin {
                None => origin = Some(point),
                Some(p0) => {
                    let diff: Vec<BigRational> =
                        point.iter().zip(p0).map(|(a, b)| a - b).collect();
                    span_insert(&mut dirs, diff);
                }
            }
            if dirs.len() == d {
                return Ok(BasicSet::universe(self.space.clone()));
            }
        }

        let Some(origin) = origin else {
            return Ok(BasicSet::empty(self.space.clone()));
        };

        // Equalities = kernel of the homogeneous span matrix
        let mut rows: Vec<Vec<BigRational>> = Vec::with_capacity(1 + dirs.len());
        let mut first = vec![BigRational::one()];
        first.extend(origin);
        rows.push(first);
        for (_, v) in &dirs {
            let mut row = vec![BigRational::zero()];
            row.extend(v.iter().cloned());
            rows.push(row);
        }
        let eqs = mat::kernel_int(&rows, 1 + d);
        let mut hull = BasicSet::universe(self.space.clone());
        for eq in eqs {
            hull = hull.add_equality(eq)?;
        }
        Ok(hull.gauss().normalize_constraints())
    }
}

/// Insert a vector into an incrementally reduced span basis
fn span_insert(dirs: &mut Vec<(usize, Vec<BigRational>)>, mut v: Vec<BigRational>) {
    for (p, row) in dirs.iter() {
        if !v[*p].is_zero() {
            let f = v[*p].clone();
            for (x, y) in v.iter_mut().zip(row) {
                let sub = &f * y;
                *x = &*x - sub;
            }
        }
    }
    let Some(p) = v.iter().position(|x| !x.is_zero()) else {
        return;
    };
    let inv = v[p].recip();
    for x in v.iter_mut() {
        *x = &*x * &inv;
    }
    dirs.push((p, v));
}

/// Keep rows (as inequalities) of a pure basic set built from raw rows
pub(crate) fn basic_set_from_ineqs(space: Space, rows: &[Vec<BigInt>]) -> Result<BasicSet> {
    let mut bset = BasicSet::universe(space);
    for row in rows {
        let mut row = row.clone();
        seq::normalize(&mut row);
        bset = bset.add_inequality(row)?;
    }
    Ok(bset)
}
