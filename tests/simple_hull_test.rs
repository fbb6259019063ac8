use num_rational::BigRational;
use num_traits::Zero;
use polyhull::{BasicSet, LpOutcome, Set, Space, solve_lp};

fn assert_contains(hull: &BasicSet, piece: &BasicSet) {
    for ineq in hull.ineqs() {
        match solve_lp(piece, false, ineq).unwrap() {
            LpOutcome::Bounded(min) => {
                assert!(min >= BigRational::zero(), "piece escapes the simple hull")
            }
            LpOutcome::Empty => return,
            LpOutcome::Unbounded => panic!("piece unbounded against the simple hull"),
        }
    }
}

/// Every inequality of the hull shares its coefficient vector with some
/// constraint of some piece (up to the orientation of an equality) and
/// carries a constant at least as weak.
fn assert_provenance(hull: &BasicSet, parts: &[BasicSet]) {
    'rows: for row in hull.ineqs() {
        for piece in parts {
            for eq in piece.eqs() {
                if eq[1..] == row[1..] && row[0] >= eq[0] {
                    continue 'rows;
                }
                let neg: Vec<num_bigint::BigInt> = eq.iter().map(|v| -v).collect();
                if neg[1..] == row[1..] && row[0] >= neg[0] {
                    continue 'rows;
                }
            }
            for ineq in piece.ineqs() {
                if ineq[1..] == row[1..] && row[0] >= ineq[0] {
                    continue 'rows;
                }
            }
        }
        panic!("hull constraint without a source constraint: {row:?}");
    }
}

#[test]
fn parametric_interval_union() {
    // {0 <= x <= n} union {0 <= x <= n + 1}: the relaxed upper bound wins
    let space = Space::new(1, 1, 0);
    let a = BasicSet::from_rows_i64(space.clone(), &[], &[&[0, 0, 1], &[0, 1, -1]]).unwrap();
    let b = BasicSet::from_rows_i64(space.clone(), &[], &[&[0, 0, 1], &[1, 1, -1]]).unwrap();
    let parts = vec![a, b];
    let set = Set::from_parts(parts.clone()).unwrap();
    let hull = set.simple_hull().unwrap();
    assert_eq!(hull.n_eq(), 0);
    assert_eq!(hull.n_ineq(), 2);
    let lower = [0i64, 0, 1].map(num_bigint::BigInt::from);
    let upper = [1i64, 1, -1].map(num_bigint::BigInt::from);
    assert!(hull.ineqs().iter().any(|r| r.as_slice() == lower));
    assert!(hull.ineqs().iter().any(|r| r.as_slice() == upper));
    for p in &parts {
        assert_contains(&hull, p);
    }
    assert_provenance(&hull, &parts);
}

#[test]
fn simple_hull_is_superset_of_convex_hull() {
    // two squares: the simple hull contains every piece and the convex
    // hull of the union
    let square = |dx: i64| {
        BasicSet::from_rows_i64(
            Space::pure(2),
            &[],
            &[&[-dx, 1, 0], &[dx + 1, -1, 0], &[0, 0, 1], &[1, 0, -1]],
        )
        .unwrap()
    };
    let parts = vec![square(0), square(3)];
    let set = Set::from_parts(parts.clone()).unwrap();
    let hull = set.clone().simple_hull().unwrap();
    for p in &parts {
        assert_contains(&hull, p);
    }
    assert_provenance(&hull, &parts);
    let exact = set.convex_hull().unwrap();
    // the exact hull satisfies every simple hull constraint
    assert_contains(&hull, &exact);
}

#[test]
fn simple_hull_of_single_piece_is_identity() {
    let bset = BasicSet::from_rows_i64(
        Space::pure(2),
        &[],
        &[&[0, 1, 0], &[2, -1, 0], &[0, 0, 1], &[2, 0, -1]],
    )
    .unwrap();
    let hull = Set::from_basic_set(bset.clone()).simple_hull().unwrap();
    assert_eq!(hull.n_ineq(), bset.n_ineq());
}

#[test]
fn simple_hull_idempotence() {
    let a = BasicSet::from_rows_i64(Space::pure(1), &[], &[&[0, 1], &[5, -1]]).unwrap();
    let b = BasicSet::from_rows_i64(Space::pure(1), &[], &[&[-3, 1], &[10, -1]]).unwrap();
    let hull = Set::from_parts(vec![a, b]).unwrap().simple_hull().unwrap();
    let again = Set::from_basic_set(hull.clone()).simple_hull().unwrap();
    let mut left = hull.ineqs().to_vec();
    let mut right = again.ineqs().to_vec();
    left.sort();
    right.sort();
    assert_eq!(left, right);
}

#[test]
fn simple_hull_of_empty_set() {
    let hull = Set::empty(Space::pure(2)).simple_hull().unwrap();
    assert!(hull.is_flagged_empty());
}

#[test]
fn bounded_simple_hull_tightens_open_dimension() {
    // two wedges whose simple hull has no plain bound on y, although the
    // union is bounded in y
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
    let parts = vec![a, b];
    let set = Set::from_parts(parts.clone()).unwrap();
    let hull = set.bounded_simple_hull().unwrap();
    for p in &parts {
        assert_contains(&hull, p);
    }
    // y is bounded in both directions now
    let obj = [0i64, 0, 1].map(num_bigint::BigInt::from);
    assert!(matches!(
        solve_lp(&hull, false, &obj).unwrap(),
        LpOutcome::Bounded(_)
    ));
    assert!(matches!(
        solve_lp(&hull, true, &obj).unwrap(),
        LpOutcome::Bounded(_)
    ));
}
