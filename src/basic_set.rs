//! A single convex polyhedral piece: a conjunction of integer-linear
//! equalities and inequalities over an optional parameter/existential
//! schema. Constraint rows are homogeneous: `(c0, c1, .., cd)` means
//! `c0 + c . x >= 0` for inequalities and `= 0` for equalities.

use crate::error::{HullError, Result};
use crate::mat::{self, Mat};
use crate::seq;
use crate::space::Space;
use crate::tab::{self, LpOutcome};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::collections::HashSet;

/// Status flags of a basic set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub empty: bool,
    pub no_redundant: bool,
    pub no_implicit: bool,
    pub rational: bool,
}

/// Verdict of a single-constraint redundancy test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Redundancy {
    Redundant,
    Irredundant,
    SetEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicSet {
    space: Space,
    eq: Vec<Vec<BigInt>>,
    ineq: Vec<Vec<BigInt>>,
    flags: Flags,
}

impl BasicSet {
    pub fn universe(space: Space) -> Self {
        Self {
            space,
            eq: Vec::new(),
            ineq: Vec::new(),
            flags: Flags::default(),
        }
    }

    /// The canonical flagged-empty form: a single `1 = 0` equality
    pub fn empty(space: Space) -> Self {
        let mut row = vec![BigInt::zero(); space.row_len()];
        row[0] = BigInt::one();
        Self {
            space,
            eq: vec![row],
            ineq: Vec::new(),
            flags: Flags {
                empty: true,
                no_redundant: true,
                no_implicit: true,
                rational: false,
            },
        }
    }

    pub fn from_constraints(
        space: Space,
        eq: Vec<Vec<BigInt>>,
        ineq: Vec<Vec<BigInt>>,
    ) -> Result<Self> {
        let bset = Self {
            space,
            eq: Vec::new(),
            ineq: Vec::new(),
            flags: Flags::default(),
        };
        let bset = eq.into_iter().try_fold(bset, BasicSet::add_equality)?;
        ineq.into_iter().try_fold(bset, BasicSet::add_inequality)
    }

    /// Test-friendly constructor over machine integers
    pub fn from_rows_i64(space: Space, eq: &[&[i64]], ineq: &[&[i64]]) -> Result<Self> {
        Self::from_constraints(
            space,
            eq.iter().map(|r| seq::row(r)).collect(),
            ineq.iter().map(|r| seq::row(r)).collect(),
        )
    }

    pub fn space(&self) -> &Space {
        &self.space
    }

    pub fn n_eq(&self) -> usize {
        self.eq.len()
    }

    pub fn n_ineq(&self) -> usize {
        self.ineq.len()
    }

    pub fn eqs(&self) -> &[Vec<BigInt>] {
        &self.eq
    }

    pub fn ineqs(&self) -> &[Vec<BigInt>] {
        &self.ineq
    }

    pub fn is_flagged_empty(&self) -> bool {
        self.flags.empty
    }

    pub fn is_rational(&self) -> bool {
        self.flags.rational
    }

    pub fn set_rational(mut self) -> Self {
        self.flags.rational = true;
        self
    }

    pub fn clear_rational(mut self) -> Self {
        self.flags.rational = false;
        self
    }

    /// Replace all constraints with the canonical empty form
    pub fn set_empty(self) -> Self {
        let rational = self.flags.rational;
        let mut empty = Self::empty(self.space);
        empty.flags.rational = rational;
        empty
    }

    fn check_row(&self, row: &[BigInt]) -> Result<()> {
        if row.len() != self.space.row_len() {
            return Err(HullError::DimensionMismatch {
                expected: self.space.row_len(),
                got: row.len(),
            });
        }
        Ok(())
    }

    pub fn add_equality(mut self, row: Vec<BigInt>) -> Result<Self> {
        self.check_row(&row)?;
        self.eq.push(row);
        self.flags.no_redundant = false;
        self.flags.no_implicit = false;
        Ok(self)
    }

    pub fn add_inequality(mut self, row: Vec<BigInt>) -> Result<Self> {
        self.check_row(&row)?;
        self.ineq.push(row);
        self.flags.no_redundant = false;
        self.flags.no_implicit = false;
        Ok(self)
    }

    /// Gaussian elimination of the equalities onto all other constraints.
    ///
    /// Produces a deterministic echelon basis (leftmost pivots, positive
    /// pivot sign, gcd-reduced rows) so that identical faces reduce to
    /// identical rows. Detects `0 = c` contradictions and flags EMPTY.
    pub fn gauss(mut self) -> Self {
        if self.flags.empty {
            return self;
        }
        let w = self.space.row_len();
        let mut done = 0;
        for col in 1..w {
            let Some(r) = (done..self.eq.len()).find(|&r| !self.eq[r][col].is_zero()) else {
                continue;
            };
            self.eq.swap(done, r);
            if self.eq[done][col].is_negative() {
                seq::negate(&mut self.eq[done]);
            }
            seq::normalize(&mut self.eq[done]);
            let pivot = self.eq[done].clone();
            let p = pivot[col].clone();
            for r in 0..self.eq.len() {
                if r != done && !self.eq[r][col].is_zero() {
                    let a = self.eq[r][col].clone();
                    self.eq[r] = seq::combine(&p, &self.eq[r], &(-a), &pivot);
                    seq::normalize(&mut self.eq[r]);
                }
            }
            for row in self.ineq.iter_mut() {
                if !row[col].is_zero() {
                    let a = row[col].clone();
                    *row = seq::combine(&p, row, &(-a), &pivot);
                    seq::normalize(row);
                }
            }
            done += 1;
        }
        for r in done..self.eq.len() {
            if !self.eq[r][0].is_zero() {
                return self.set_empty();
            }
        }
        self.eq.truncate(done);
        self
    }

    /// Per-row gcd reduction, canonical equality sign, removal of trivial
    /// rows and detection of trivially false ones.
    pub fn normalize_constraints(mut self) -> Self {
        if self.flags.empty {
            return self;
        }
        let mut empty = false;
        self.eq.retain_mut(|row| {
            seq::normalize(row);
            seq::canonical_sign(row);
            if seq::first_nonzero(row, 1).is_some() {
                return true;
            }
            if !row[0].is_zero() {
                empty = true;
            }
            false
        });
        let mut seen = HashSet::new();
        self.ineq.retain_mut(|row| {
            seq::normalize(row);
            if seq::first_nonzero(row, 1).is_none() {
                if row[0].is_negative() {
                    empty = true;
                }
                return false;
            }
            seen.insert(row.clone())
        });
        if empty {
            return self.set_empty();
        }
        self
    }

    /// Intersection of two pieces over the same space
    pub fn intersect(mut self, other: BasicSet) -> Result<Self> {
        self.space.check_compatible(&other.space)?;
        if self.flags.empty {
            return Ok(self);
        }
        if other.flags.empty {
            return Ok(other);
        }
        self.eq.extend(other.eq);
        self.ineq.extend(other.ineq);
        self.flags.no_redundant = false;
        self.flags.no_implicit = false;
        self.flags.rational = self.flags.rational || other.flags.rational;
        Ok(self)
    }

    /// Compose every constraint row with `t`: the result describes
    /// `{ y : T y in self }` in the space with `t.n_col - 1` variables.
    pub fn preimage(self, t: &Mat) -> Result<Self> {
        if t.n_row != self.space.row_len() {
            return Err(HullError::DimensionMismatch {
                expected: self.space.row_len(),
                got: t.n_row,
            });
        }
        let space = Space::pure(t.n_col - 1);
        let mut out = BasicSet::universe(space);
        out.flags.rational = self.flags.rational;
        if self.flags.empty {
            return Ok(out.set_empty());
        }
        for row in &self.eq {
            out = out.add_equality(t.transform_row(row)?)?;
        }
        for row in &self.ineq {
            out = out.add_inequality(t.transform_row(row)?)?;
        }
        Ok(out.gauss().normalize_constraints())
    }

    /// Existentially eliminate variables `first..first + n` (0-based over
    /// the variable columns) by equality substitution where possible and
    /// Fourier-Motzkin combination otherwise. The space is unchanged; the
    /// eliminated columns end up zero everywhere.
    pub fn eliminate_vars(mut self, first: usize, n: usize) -> Result<Self> {
        if self.flags.empty {
            return Ok(self);
        }
        if first + n > self.space.total() {
            return Err(HullError::DimensionMismatch {
                expected: self.space.total(),
                got: first + n,
            });
        }
        for var in first..first + n {
            let col = 1 + var;
            if let Some(r) = self.eq.iter().position(|row| !row[col].is_zero()) {
                let pivot = self.eq.remove(r);
                let p = if pivot[col].is_negative() {
                    seq::negated(&pivot)
                } else {
                    pivot
                };
                let pc = p[col].clone();
                for row in self.eq.iter_mut().chain(self.ineq.iter_mut()) {
                    if !row[col].is_zero() {
                        let a = row[col].clone();
                        *row = seq::combine(&pc, row, &(-a), &p);
                        seq::normalize(row);
                    }
                }
                continue;
            }
            let (pos, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.ineq)
                .into_iter()
                .partition(|row| row[col].is_positive());
            let (neg, keep): (Vec<_>, Vec<_>) =
                rest.into_iter().partition(|row| row[col].is_negative());
            self.ineq = keep;
            for p in &pos {
                for ng in &neg {
                    let mut row = seq::combine(&(-ng[col].clone()), p, &p[col].clone(), ng);
                    seq::normalize(&mut row);
                    self.ineq.push(row);
                }
            }
        }
        self.flags.no_redundant = false;
        self.flags.no_implicit = false;
        Ok(self.normalize_constraints())
    }

    /// Drop variable columns `first..first + n`; they must not be
    /// referenced by any constraint (eliminate first).
    pub fn drop_vars(mut self, first: usize, n: usize) -> Result<Self> {
        for row in self.eq.iter().chain(self.ineq.iter()) {
            for col in 1 + first..1 + first + n {
                if !row[col].is_zero() {
                    return Err(HullError::Precondition(
                        "dropping a variable that is still constrained".to_string(),
                    ));
                }
            }
        }
        for row in self.eq.iter_mut().chain(self.ineq.iter_mut()) {
            row.drain(1 + first..1 + first + n);
        }
        self.space = Space::pure(self.space.total() - n);
        Ok(self)
    }

    /// Pad the existential block with `n` fresh unconstrained columns
    pub fn pad_divs(mut self, n: usize) -> Self {
        for row in self.eq.iter_mut().chain(self.ineq.iter_mut()) {
            row.extend((0..n).map(|_| BigInt::zero()));
        }
        self.space.n_div += n;
        self
    }

    /// Reinterpret the columns of a pure piece under a structured schema
    pub fn overlying(mut self, model: &Space) -> Result<Self> {
        if !self.space.is_pure() || self.space.total() != model.total() {
            return Err(HullError::SpaceMismatch {
                left: self.space.row_len(),
                right: model.row_len(),
            });
        }
        self.space = model.clone();
        Ok(self)
    }

    /// Flatten parameters and existentials into plain set dimensions and
    /// mark the piece rational.
    pub fn underlying(mut self) -> Self {
        self.space = Space::pure(self.space.total());
        self.flags.rational = true;
        self
    }

    /// Directions along which the piece is unbounded: same constraints
    /// with the constants dropped.
    pub fn recession_cone(&self) -> Self {
        let zero_const = |rows: &[Vec<BigInt>]| {
            rows.iter()
                .map(|r| {
                    let mut r = r.clone();
                    r[0] = BigInt::zero();
                    r
                })
                .collect()
        };
        Self {
            space: self.space.clone(),
            eq: zero_const(&self.eq),
            ineq: zero_const(&self.ineq),
            flags: Flags {
                rational: true,
                ..Flags::default()
            },
        }
    }

    /// Move every inequality that the piece satisfies with equality into
    /// the equality system.
    pub(crate) fn detect_implicit_equalities(mut self) -> Result<Self> {
        if self.flags.empty || self.flags.no_implicit || self.ineq.is_empty() {
            self.flags.no_implicit = true;
            return Ok(self);
        }
        let mut implicit = Vec::new();
        for i in 0..self.ineq.len() {
            let outcome = tab::solve_lp(&self, true, &self.ineq[i])?;
            match outcome {
                LpOutcome::Empty => return Ok(self.set_empty()),
                LpOutcome::Unbounded => {}
                LpOutcome::Bounded(max) => {
                    if max.is_zero() {
                        implicit.push(i);
                    }
                }
            }
        }
        if !implicit.is_empty() {
            for &i in implicit.iter().rev() {
                let row = self.ineq.remove(i);
                self.eq.push(row);
            }
            self = self.gauss();
        }
        self.flags.no_implicit = true;
        Ok(self)
    }

    /// Decide whether inequality `idx` is implied by the remaining
    /// constraints. May discover that the piece is empty.
    pub(crate) fn constraint_is_redundant(&self, idx: usize) -> Result<Redundancy> {
        let row = &self.ineq[idx];
        // Cheap rejection: a direction no other constraint bounds
        for col in 1..self.space.row_len() {
            if row[col].is_zero() {
                continue;
            }
            let sign_pos = row[col].is_positive();
            let covered = self
                .eq
                .iter()
                .any(|r| !r[col].is_zero())
                || self.ineq.iter().enumerate().any(|(j, r)| {
                    j != idx && !r[col].is_zero() && r[col].is_positive() == sign_pos
                });
            if !covered {
                return Ok(Redundancy::Irredundant);
            }
        }
        let mut rest = self.clone();
        let row = rest.ineq.remove(idx);
        match tab::solve_lp(&rest, false, &row)? {
            LpOutcome::Empty => Ok(Redundancy::SetEmpty),
            LpOutcome::Unbounded => Ok(Redundancy::Irredundant),
            LpOutcome::Bounded(min) => {
                if min >= BigRational::zero() {
                    Ok(Redundancy::Redundant)
                } else {
                    Ok(Redundancy::Irredundant)
                }
            }
        }
    }

    /// The redundancy oracle: same solution set, no redundant inequality.
    ///
    /// Gaussian elimination first, early outs for the trivial cases, then
    /// implicit equalities and the per-constraint LP walk.
    pub fn remove_redundancies(mut self) -> Result<Self> {
        self = self.gauss().normalize_constraints();
        if self.flags.empty {
            return Ok(self);
        }
        if self.flags.no_redundant && self.flags.no_implicit {
            return Ok(self);
        }
        self = self.detect_implicit_equalities()?.normalize_constraints();
        if self.flags.empty {
            return Ok(self);
        }
        if self.ineq.len() > 1 {
            let mut i = 0;
            while i < self.ineq.len() {
                let verdict = self.constraint_is_redundant(i)?;
                match verdict {
                    Redundancy::SetEmpty => return Ok(self.set_empty()),
                    Redundancy::Redundant => {
                        self.ineq.remove(i);
                    }
                    Redundancy::Irredundant => i += 1,
                }
            }
        }
        self.flags.no_redundant = true;
        self.flags.no_implicit = true;
        Ok(self)
    }

    /// Canonical form of the final results: gcd-reduced rows, canonical
    /// equality signs.
    pub fn finalize(self) -> Self {
        self.normalize_constraints()
    }

    /// The smallest affine subspace containing the piece, as an
    /// equality-only basic set.
    pub fn affine_hull(&self) -> Result<Self> {
        let ah = self.clone().gauss();
        if ah.flags.empty {
            return Ok(ah);
        }
        let mut ah = ah.detect_implicit_equalities()?;
        if ah.flags.empty {
            return Ok(ah);
        }
        ah.ineq.clear();
        ah.flags.no_redundant = true;
        Ok(ah.gauss().normalize_constraints())
    }

    /// A rational point satisfying the equality system (free variables at
    /// zero). Only meaningful after `affine_hull` or `gauss`.
    pub(crate) fn sample_point_of_equalities(&self) -> Result<Vec<BigRational>> {
        if self.flags.empty {
            return Err(HullError::Precondition(
                "sample point of an empty piece".to_string(),
            ));
        }
        if self.eq.is_empty() {
            return Ok(vec![BigRational::zero(); self.space.total()]);
        }
        let (t, _) = mat::equality_compression(&self.eq, self.space.row_len())?;
        let f = t.row(0)[0].clone();
        Ok((1..self.space.row_len())
            .map(|i| BigRational::new(t.row(i)[0].clone(), f.clone()))
            .collect())
    }

    /// LP-backed emptiness check
    pub fn is_empty(&self) -> Result<bool> {
        if self.flags.empty {
            return Ok(true);
        }
        let zero = vec![BigInt::zero(); self.space.row_len()];
        Ok(matches!(
            tab::solve_lp(self, false, &zero)?,
            LpOutcome::Empty
        ))
    }
}
