use std::collections::BTreeSet;

use itertools::Itertools;
use musmcs::{
    all_mcs, all_mus, is_mcs, is_mus, marco, marco_naive, ExplainError, FullResolve, MapSolverMode, Marco,
    MarcoConfig, MusMcs, Oracle, SoftSet, Subset, SubsetSolverOptiMode,
};

mod common;
use common::{assumption, full_resolve, init_tracing, BruteForce, Cst, Flaky, DOMAIN, NUM_VARS};

fn sets(n: usize, sets: &[&[usize]]) -> BTreeSet<Subset> {
    sets.iter()
        .map(|s| Subset::from_indices(n, s.iter().copied()).unwrap())
        .collect()
}

fn split<O: Oracle>(enumeration: Marco<'_, O>) -> (BTreeSet<Subset>, BTreeSet<Subset>) {
    let mut muses = BTreeSet::new();
    let mut mcses = BTreeSet::new();
    for res in enumeration {
        match res.unwrap() {
            MusMcs::Mus(mus) => assert!(muses.insert(mus), "duplicated MUS"),
            MusMcs::Mcs(mcs) => assert!(mcses.insert(mcs), "duplicated MCS"),
        }
    }
    (muses, mcses)
}

/// `[x0 < x1, x1 < x2, x2 < x0, x0 < x2, x3 <= 4, x3 >= 5]`
fn cycles() -> Vec<Cst> {
    vec![Cst::Lt(0, 1), Cst::Lt(1, 2), Cst::Lt(2, 0), Cst::Lt(0, 2), Cst::Le(3, 4), Cst::Ge(3, 5)]
}

#[test]
fn test_single_conflict() {
    init_tracing();
    // [x0 == 5, x1 >= 3, x0 == 7, x2 <= 8]
    let soft = [Cst::Eq(0, 5), Cst::Ge(1, 3), Cst::Eq(0, 7), Cst::Le(2, 8)];
    let expected_muses = sets(4, &[&[0, 2]]);
    let expected_mcses = sets(4, &[&[0], &[2]]);

    assert_eq!(split(marco(&mut full_resolve(&soft, &[]))), (expected_muses.clone(), expected_mcses.clone()));
    assert_eq!(split(marco(&mut assumption(&soft, &[]))), (expected_muses.clone(), expected_mcses.clone()));
    assert_eq!(split(marco_naive(&mut assumption(&soft, &[]))), (expected_muses, expected_mcses));
}

#[test]
fn test_all_configurations_agree() {
    let soft = cycles();
    let expected_muses = sets(6, &[&[0, 1, 2], &[2, 3], &[4, 5]]);
    let expected_mcses = sets(
        6,
        &[&[2, 5], &[0, 3, 5], &[1, 3, 5], &[2, 4], &[0, 3, 4], &[1, 3, 4]],
    );
    let modes = [
        MapSolverMode::HighPreferredValues,
        MapSolverMode::LowPreferredValues,
        MapSolverMode::HighOptimize,
        MapSolverMode::LowOptimize,
    ];
    let opti_modes = [SubsetSolverOptiMode::None, SubsetSolverOptiMode::KnownSingletonMCSes];
    for (map_solver_mode, subset_solver_opti_mode) in modes.into_iter().cartesian_product(opti_modes) {
        let config = MarcoConfig {
            return_muses: true,
            return_mcses: true,
            map_solver_mode,
            subset_solver_opti_mode,
        };
        let mut oracle = full_resolve(&soft, &[]);
        let found = split(Marco::new(&mut oracle, config.clone()));
        assert_eq!(found, (expected_muses.clone(), expected_mcses.clone()), "{config:?}");

        let mut oracle = assumption(&soft, &[]);
        let found = split(Marco::new(&mut oracle, config.clone()));
        assert_eq!(found, (expected_muses.clone(), expected_mcses.clone()), "{config:?}");
    }
}

#[test]
fn test_results_are_minimal_and_dual() {
    let soft = [
        Cst::Ge(0, 4),
        Cst::Lt(1, 0),
        Cst::Le(1, 2),
        Cst::Eq(2, 3),
        Cst::Lt(0, 2),
        Cst::Ne(1, 3),
    ];
    let mut oracle = assumption(&soft, &[]);
    let results = marco(&mut oracle).collect::<Result<Vec<_>, _>>().unwrap();
    let muses = results.iter().filter(|r| r.is_mus()).map(MusMcs::subset).collect_vec();
    let mcses = results.iter().filter(|r| r.is_mcs()).map(MusMcs::subset).collect_vec();
    assert!(!muses.is_empty());

    let mut reference = full_resolve(&soft, &[]);
    for mus in &muses {
        assert!(is_mus(&mut reference, mus).unwrap());
    }
    for mcs in &mcses {
        assert!(is_mcs(&mut reference, mcs).unwrap());
    }
    // every MUS intersects every MCS
    for (mus, mcs) in muses.iter().cartesian_product(&mcses) {
        assert!(mus.intersects(mcs));
    }
}

#[test]
fn test_all_mus_and_all_mcs() {
    let soft = cycles();
    let mut oracle = assumption(&soft, &[]);
    let muses = all_mus(&mut oracle, None).unwrap();
    assert_eq!(muses.into_iter().collect::<BTreeSet<_>>(), sets(6, &[&[0, 1, 2], &[2, 3], &[4, 5]]));
    assert_eq!(all_mcs(&mut oracle, None).unwrap().len(), 6);
    assert_eq!(all_mcs(&mut oracle, Some(1)).unwrap().len(), 1);

    let soft_set = SoftSet::new(soft).unwrap();
    let first = marco(&mut full_resolve(soft_set.constraints(), &[]))
        .mus_only()
        .next()
        .unwrap()
        .unwrap();
    assert!(soft_set.project(&first).len() >= 2);
}

#[test]
fn test_callbacks_and_projection() {
    let soft = [Cst::Eq(0, 5), Cst::Ge(1, 3), Cst::Eq(0, 7), Cst::Le(2, 8)];
    let soft_set = SoftSet::new(soft).unwrap();
    let mut oracle = full_resolve(&soft, &[]);
    let mut explained = Vec::new();
    let mut repairs = Vec::new();
    let mut on_mus = |mus: &Subset| explained.push(soft_set.project(mus));
    let mut on_mcs = |mcs: &Subset| repairs.push(mcs.len());
    let res = marco(&mut oracle).run(Some(&mut on_mus), Some(&mut on_mcs));

    assert_eq!(res.complete, Some(true));
    assert_eq!(explained, vec![vec![&Cst::Eq(0, 5), &Cst::Eq(0, 7)]]);
    assert_eq!(repairs, vec![1, 1]);
    let mus = MusMcs::Mus(res.muses.unwrap()[0].clone());
    assert_eq!(mus.project(&soft_set), MusMcs::Mus(vec![&Cst::Eq(0, 5), &Cst::Eq(0, 7)]));
}

#[test]
fn test_nothing_to_enumerate() {
    let soft = [Cst::Ge(0, 3), Cst::Le(0, 4)];
    assert_eq!(marco(&mut full_resolve(&soft, &[])).count(), 0);
    assert_eq!(marco(&mut assumption(&soft, &[])).count(), 0);

    let hard = [Cst::Lt(1, 2), Cst::Lt(2, 1)];
    let results = marco(&mut assumption(&soft, &hard)).collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(results, vec![MusMcs::Mus(Subset::empty(2))]);
}

#[test]
fn test_failure_keeps_partial_results() {
    let backend = Flaky {
        inner: BruteForce::new(NUM_VARS, DOMAIN),
        ok_solves: 12,
    };
    let mut oracle = FullResolve::new(backend, cycles(), vec![]).with_timeout(None);
    let res = marco(&mut oracle).run(None, None);
    assert_eq!(res.complete, Some(false));
    assert_eq!(res.interrupted_by, Some(ExplainError::Oracle("solver crashed".to_string())));
    let found = res.muses.map_or(0, |v| v.len()) + res.mcses.map_or(0, |v| v.len());
    assert!(found < 9);
    assert_eq!(oracle.stats().num_errors, 1);
}
