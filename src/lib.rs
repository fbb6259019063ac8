//! Convex hull engine for unions of integer-linear basic sets
//!
//! This library computes, over exact rational arithmetic, either the exact
//! convex hull of a finite union of polyhedral pieces (facet enumeration by
//! ridge wrapping for bounded unions, Minkowski-sum projection for
//! unbounded ones) or a simple hull, the tightest superset expressible
//! with relaxed translates of the union's own constraints.

pub mod basic_set;
pub mod error;
pub mod hull;
pub mod map;
pub mod mat;
pub mod seq;
pub mod set;
pub mod simple_hull;
pub mod space;
pub mod tab;
mod wrap;

// Re-export main types and functions
pub use basic_set::{BasicSet, Flags};
pub use error::{HullError, Result};
pub use map::{BasicMap, Map};
pub use mat::Mat;
pub use set::Set;
pub use space::Space;
pub use tab::{LpOutcome, Tab, cone_is_bounded, solve_lp};
