use num_rational::BigRational;
use num_traits::Zero;
use polyhull::{BasicSet, LpOutcome, Set, Space, solve_lp};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Every point of `piece` satisfies every constraint of `hull`
fn assert_contains(hull: &BasicSet, piece: &BasicSet) {
    for eq in hull.eqs() {
        match solve_lp(piece, false, eq).unwrap() {
            LpOutcome::Bounded(min) => assert!(min.is_zero(), "equality broken from below"),
            LpOutcome::Empty => return,
            LpOutcome::Unbounded => panic!("equality unbounded over a contained piece"),
        }
        match solve_lp(piece, true, eq).unwrap() {
            LpOutcome::Bounded(max) => assert!(max.is_zero(), "equality broken from above"),
            other => panic!("unexpected outcome {other:?}"),
        }
    }
    for ineq in hull.ineqs() {
        match solve_lp(piece, false, ineq).unwrap() {
            LpOutcome::Bounded(min) => {
                assert!(min >= BigRational::zero(), "inequality violated by a piece")
            }
            LpOutcome::Empty => return,
            LpOutcome::Unbounded => panic!("piece escapes a hull inequality"),
        }
    }
}

/// Every inequality of `hull` is attained with equality somewhere in the
/// union: no facet floats free of the input.
fn assert_tight(hull: &BasicSet, parts: &[BasicSet]) {
    for ineq in hull.ineqs() {
        let mut best: Option<BigRational> = None;
        for piece in parts {
            if let LpOutcome::Bounded(min) = solve_lp(piece, false, ineq).unwrap()
                && best.as_ref().is_none_or(|b| min < *b)
            {
                best = Some(min);
            }
        }
        assert_eq!(best, Some(BigRational::zero()), "facet not tight on the union");
    }
}

fn rows_of(bset: &BasicSet) -> (Vec<Vec<num_bigint::BigInt>>, Vec<Vec<num_bigint::BigInt>>) {
    let mut eqs = bset.eqs().to_vec();
    let mut ineqs = bset.ineqs().to_vec();
    eqs.sort();
    ineqs.sort();
    (eqs, ineqs)
}

fn interval(lo: i64, hi: i64) -> BasicSet {
    BasicSet::from_rows_i64(Space::pure(1), &[], &[&[-lo, 1], &[hi, -1]]).unwrap()
}

fn point2(x: i64, y: i64) -> BasicSet {
    BasicSet::from_rows_i64(Space::pure(2), &[&[-x, 1, 0], &[-y, 0, 1]], &[]).unwrap()
}

#[test]
fn overlapping_intervals() {
    let parts = vec![interval(0, 5), interval(3, 10)];
    let set = Set::from_parts(parts.clone()).unwrap();
    let hull = set.convex_hull().unwrap();
    let (eqs, ineqs) = rows_of(&hull);
    assert!(eqs.is_empty());
    assert_eq!(
        ineqs,
        vec![
            vec![0.into(), 1.into()],
            vec![10.into(), (-1).into()]
        ]
    );
    for p in &parts {
        assert_contains(&hull, p);
    }
    assert_tight(&hull, &parts);
}

#[test]
fn triangle_from_three_points() {
    init_tracing();
    let parts = vec![point2(0, 0), point2(1, 0), point2(0, 1)];
    let set = Set::from_parts(parts.clone()).unwrap();
    let hull = set.convex_hull().unwrap();
    assert_eq!(hull.n_eq(), 0);
    assert_eq!(hull.n_ineq(), 3);
    let (_, ineqs) = rows_of(&hull);
    let expect: Vec<Vec<num_bigint::BigInt>> = vec![
        vec![0.into(), 0.into(), 1.into()],
        vec![0.into(), 1.into(), 0.into()],
        vec![1.into(), (-1).into(), (-1).into()],
    ];
    let mut expect = expect;
    expect.sort();
    assert_eq!(ineqs, expect);
    for p in &parts {
        assert_contains(&hull, p);
    }
    assert_tight(&hull, &parts);
}

#[test]
fn opposite_rays_make_universe() {
    let lo = BasicSet::from_rows_i64(Space::pure(1), &[], &[&[0, 1]]).unwrap();
    let hi = BasicSet::from_rows_i64(Space::pure(1), &[], &[&[0, -1]]).unwrap();
    let hull = Set::from_parts(vec![lo, hi]).unwrap().convex_hull().unwrap();
    assert_eq!(hull.n_eq(), 0);
    assert_eq!(hull.n_ineq(), 0);
}

#[test]
fn parallel_segments_make_square() {
    let seg = |x: i64| {
        BasicSet::from_rows_i64(
            Space::pure(2),
            &[&[-x, 1, 0]],
            &[&[0, 0, 1], &[1, 0, -1]],
        )
        .unwrap()
    };
    let parts = vec![seg(0), seg(1)];
    let set = Set::from_parts(parts.clone()).unwrap();
    let hull = set.convex_hull().unwrap();
    assert_eq!(hull.n_eq(), 0);
    assert_eq!(hull.n_ineq(), 4);
    let (_, ineqs) = rows_of(&hull);
    let mut expect: Vec<Vec<num_bigint::BigInt>> = vec![
        vec![0.into(), 1.into(), 0.into()],
        vec![1.into(), (-1).into(), 0.into()],
        vec![0.into(), 0.into(), 1.into()],
        vec![1.into(), 0.into(), (-1).into()],
    ];
    expect.sort();
    assert_eq!(ineqs, expect);
    for p in &parts {
        assert_contains(&hull, p);
    }
    assert_tight(&hull, &parts);
}

#[test]
fn basic_hull_drops_redundant_bound() {
    let bset = BasicSet::from_rows_i64(
        Space::pure(1),
        &[],
        &[&[0, 1], &[10, -1], &[-2, 1]],
    )
    .unwrap();
    let hull = bset.basic_hull().unwrap();
    let (_, ineqs) = rows_of(&hull);
    assert_eq!(
        ineqs,
        vec![
            vec![(-2).into(), 1.into()],
            vec![10.into(), (-1).into()]
        ]
    );
}

#[test]
fn empty_union_hull_is_empty() {
    let hull = Set::empty(Space::pure(2)).convex_hull().unwrap();
    assert!(hull.is_flagged_empty());
}

#[test]
fn empty_pieces_contribute_nothing() {
    let parts = vec![interval(5, 3), interval(0, 1), BasicSet::empty(Space::pure(1))];
    let hull = Set::from_parts(parts).unwrap().convex_hull().unwrap();
    let (_, ineqs) = rows_of(&hull);
    assert_eq!(
        ineqs,
        vec![
            vec![0.into(), 1.into()],
            vec![1.into(), (-1).into()]
        ]
    );
}

#[test]
fn hull_is_idempotent() {
    let set = Set::from_parts(vec![point2(0, 0), point2(1, 0), point2(0, 1)]).unwrap();
    let hull = set.convex_hull().unwrap();
    let again = Set::from_basic_set(hull.clone()).convex_hull().unwrap();
    assert_eq!(rows_of(&hull), rows_of(&again));

    let bset = BasicSet::from_rows_i64(
        Space::pure(1),
        &[],
        &[&[0, 1], &[10, -1], &[-2, 1]],
    )
    .unwrap();
    let once = bset.basic_hull().unwrap();
    let twice = once.clone().basic_hull().unwrap();
    assert_eq!(rows_of(&once), rows_of(&twice));
}

#[test]
fn affine_hull_is_preserved() {
    // two points on a line: hull is the segment, same affine hull
    let set = Set::from_parts(vec![point2(0, 0), point2(2, 2)]).unwrap();
    let aff_before = set.affine_hull().unwrap();
    let hull = set.convex_hull().unwrap();
    let aff_after = Set::from_basic_set(hull).affine_hull().unwrap();
    assert_eq!(rows_of(&aff_before).0, rows_of(&aff_after).0);
}

#[test]
fn mixed_dimension_pieces() {
    // a square and a segment poking out of it
    let square = BasicSet::from_rows_i64(
        Space::pure(2),
        &[],
        &[&[0, 1, 0], &[1, -1, 0], &[0, 0, 1], &[1, 0, -1]],
    )
    .unwrap();
    let seg = BasicSet::from_rows_i64(
        Space::pure(2),
        &[&[0, 0, 1]],
        &[&[0, 1, 0], &[2, -1, 0]],
    )
    .unwrap();
    let parts = vec![square, seg];
    let set = Set::from_parts(parts.clone()).unwrap();
    let hull = set.convex_hull().unwrap();
    for p in &parts {
        assert_contains(&hull, p);
    }
    assert_tight(&hull, &parts);
    // the corner (2, 0) and (0, 1) must both be inside
    assert_contains(&hull, &point2(2, 0));
    assert_contains(&hull, &point2(0, 1));
}

#[test]
fn unbounded_pair_through_fm() {
    // two parallel half-planes in 2d: x >= 0 with 0 <= y <= 1 and
    // x >= 2 with 2 <= y <= 3; the hull is unbounded in x
    let strip = |lo: i64, ylo: i64, yhi: i64| {
        BasicSet::from_rows_i64(
            Space::pure(2),
            &[],
            &[&[-lo, 1, 0], &[-ylo, 0, 1], &[yhi, 0, -1]],
        )
        .unwrap()
    };
    let parts = vec![strip(0, 0, 1), strip(2, 2, 3)];
    let set = Set::from_parts(parts.clone()).unwrap();
    let hull = set.convex_hull().unwrap();
    for p in &parts {
        assert_contains(&hull, p);
    }
    // x is unbounded above inside the hull
    let obj = [0i64, 1, 0].map(num_bigint::BigInt::from);
    assert_eq!(solve_lp(&hull, true, &obj).unwrap(), LpOutcome::Unbounded);
    // y stays within [0, 3]
    let obj = [0i64, 0, 1].map(num_bigint::BigInt::from);
    assert_eq!(
        solve_lp(&hull, true, &obj).unwrap(),
        LpOutcome::Bounded(BigRational::from(num_bigint::BigInt::from(3)))
    );
    assert_eq!(
        solve_lp(&hull, false, &obj).unwrap(),
        LpOutcome::Bounded(BigRational::zero())
    );
}

#[test]
fn square_with_outlying_point() {
    init_tracing();
    let square = BasicSet::from_rows_i64(
        Space::pure(2),
        &[],
        &[&[0, 1, 0], &[1, -1, 0], &[0, 0, 1], &[1, 0, -1]],
    )
    .unwrap();
    let parts = vec![square, point2(2, 2)];
    let set = Set::from_parts(parts.clone()).unwrap();
    let hull = set.convex_hull().unwrap();
    for p in &parts {
        assert_contains(&hull, p);
    }
    assert_tight(&hull, &parts);
    // the midpoint (3/2, 3/2) of the new edge lies inside
    let mid = BasicSet::from_rows_i64(Space::pure(2), &[&[-3, 2, 0], &[-3, 0, 2]], &[])
        .unwrap();
    assert_contains(&hull, &mid);
    // but (2, 1) does not: the segment towards (2, 2) is a real facet
    let outside = point2(2, 1);
    let violated = hull.ineqs().iter().any(|ineq| {
        matches!(
            solve_lp(&outside, false, ineq).unwrap(),
            LpOutcome::Bounded(v) if v < BigRational::zero()
        )
    });
    assert!(violated);
}
