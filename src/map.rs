//! Relational forms. A basic map is a basic set whose set dimensions
//! are split into input and output blocks; hull operations flatten to
//! the underlying set and wrap the result back.

use crate::basic_set::BasicSet;
use crate::error::{HullError, Result};
use crate::set::Set;
use crate::space::Space;

#[derive(Debug, Clone)]
pub struct BasicMap {
    n_in: usize,
    n_out: usize,
    bset: BasicSet,
}

impl BasicMap {
    pub fn from_basic_set(bset: BasicSet, n_in: usize, n_out: usize) -> Result<Self> {
        if bset.space().n_dim != n_in + n_out {
            return Err(HullError::DimensionMismatch {
                expected: n_in + n_out,
                got: bset.space().n_dim,
            });
        }
        Ok(Self { n_in, n_out, bset })
    }

    pub fn universe(n_param: usize, n_in: usize, n_out: usize) -> Self {
        Self {
            n_in,
            n_out,
            bset: BasicSet::universe(Space::new(n_param, n_in + n_out, 0)),
        }
    }

    pub fn n_in(&self) -> usize {
        self.n_in
    }

    pub fn n_out(&self) -> usize {
        self.n_out
    }

    pub fn basic_set(&self) -> &BasicSet {
        &self.bset
    }

    pub fn into_basic_set(self) -> BasicSet {
        self.bset
    }

    /// Redundancy removal on a single basic map
    pub fn basic_hull(self) -> Result<BasicMap> {
        let (n_in, n_out) = (self.n_in, self.n_out);
        BasicMap::from_basic_set(self.bset.basic_hull()?, n_in, n_out)
    }
}

#[derive(Debug, Clone)]
pub struct Map {
    n_in: usize,
    n_out: usize,
    set: Set,
}

impl Map {
    pub fn from_basic_map(bmap: BasicMap) -> Self {
        Self {
            n_in: bmap.n_in,
            n_out: bmap.n_out,
            set: Set::from_basic_set(bmap.bset),
        }
    }

    pub fn push(mut self, bmap: BasicMap) -> Result<Self> {
        if bmap.n_in != self.n_in || bmap.n_out != self.n_out {
            return Err(HullError::DimensionMismatch {
                expected: self.n_in + self.n_out,
                got: bmap.n_in + bmap.n_out,
            });
        }
        self.set = self.set.push(bmap.bset)?;
        Ok(self)
    }

    pub fn n(&self) -> usize {
        self.set.n()
    }

    pub fn set(&self) -> &Set {
        &self.set
    }

    /// Underlying set of the relation: inputs and outputs concatenated
    pub fn underlying_set(self) -> Set {
        self.set
    }

    pub fn convex_hull(self) -> Result<BasicMap> {
        let (n_in, n_out) = (self.n_in, self.n_out);
        BasicMap::from_basic_set(self.set.convex_hull()?, n_in, n_out)
    }

    pub fn simple_hull(self) -> Result<BasicMap> {
        let (n_in, n_out) = (self.n_in, self.n_out);
        BasicMap::from_basic_set(self.set.simple_hull()?, n_in, n_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq::row;

    #[test]
    fn test_map_hull_flattens_to_set() {
        // {x -> y : y = x, 0 <= x <= 1} union {x -> y : y = x, 2 <= x <= 3}
        let piece = |lo: i64, hi: i64| {
            let bset = BasicSet::from_rows_i64(
                Space::new(0, 2, 0),
                &[&[0, 1, -1]],
                &[&[-lo, 1, 0], &[hi, -1, 0]],
            )
            .unwrap();
            BasicMap::from_basic_set(bset, 1, 1).unwrap()
        };
        let map = Map::from_basic_map(piece(0, 1)).push(piece(2, 3)).unwrap();
        let hull = map.convex_hull().unwrap();
        assert_eq!(hull.n_in(), 1);
        assert_eq!(hull.n_out(), 1);
        let bset = hull.basic_set();
        assert_eq!(bset.n_eq(), 1);
        assert_eq!(bset.eqs()[0], row(&[0, 1, -1]));
        // gauss substitutes x for y, so the bounds land on the y column
        assert_eq!(bset.n_ineq(), 2);
        assert!(bset.ineqs().contains(&row(&[0, 0, 1])));
        assert!(bset.ineqs().contains(&row(&[3, 0, -1])));
    }

    #[test]
    fn test_basic_map_hull_removes_redundancy() {
        let bset = BasicSet::from_rows_i64(
            Space::new(0, 2, 0),
            &[],
            &[&[0, 1, 0], &[5, -1, 0], &[-1, 1, 0], &[0, 0, 1]],
        )
        .unwrap();
        let bmap = BasicMap::from_basic_set(bset, 1, 1).unwrap();
        let hull = bmap.basic_hull().unwrap();
        assert_eq!(hull.basic_set().n_ineq(), 3);
    }
}
