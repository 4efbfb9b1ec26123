//! Random small problems, checked against an exhaustive exploration of the subsets of the soft set.

use std::collections::BTreeSet;

use itertools::Itertools;
use musmcs::{
    is_mus, marco, marco_naive, mss, mss_naive, mus, optimal_mus, optimal_mus_naive, quickxplain_naive, smus,
    AssumptionOracle, ExplainError, FullResolve, MusMcs, Oracle, Subset, Weights,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

mod common;
use common::{init_tracing, BruteForce, Cst};

const VARS: usize = 3;
const MAX_VALUE: i32 = 3;

fn random_constraint(rng: &mut SmallRng) -> Cst {
    let x = rng.random_range(0..VARS);
    let v = rng.random_range(0..=MAX_VALUE);
    match rng.random_range(0..5) {
        0 => Cst::Eq(x, v),
        1 => Cst::Ne(x, v),
        2 => Cst::Ge(x, v),
        3 => Cst::Le(x, v),
        _ => Cst::Lt(x, rng.random_range(0..VARS)),
    }
}

/// Every MUS and MCS of a problem, computed from the sets of soft constraints satisfied by each assignment.
struct Exhaustive {
    num_soft: usize,
    /// For each assignment satisfying the hard constraints, the bit mask of satisfied soft constraints.
    models: Vec<u32>,
}

impl Exhaustive {
    fn new(soft: &[Cst], hard: &[Cst]) -> Self {
        let models = (0..VARS)
            .map(|_| 0..=MAX_VALUE)
            .multi_cartesian_product()
            .filter(|values| hard.iter().all(|c| c.holds(values)))
            .map(|values| {
                soft.iter()
                    .enumerate()
                    .filter(|(_, c)| c.holds(&values))
                    .fold(0, |mask, (i, _)| mask | (1 << i))
            })
            .collect();
        Exhaustive {
            num_soft: soft.len(),
            models,
        }
    }

    fn is_sat(&self, mask: u32) -> bool {
        self.models.iter().any(|&model| mask & !model == 0)
    }

    fn subset(&self, mask: u32) -> Subset {
        Subset::from_indices(self.num_soft, (0..self.num_soft).filter(|i| mask >> i & 1 == 1)).unwrap()
    }

    fn masks(&self) -> impl Iterator<Item = u32> {
        0..(1u32 << self.num_soft)
    }

    fn muses(&self) -> BTreeSet<Subset> {
        self.masks()
            .filter(|&m| !self.is_sat(m) && (0..self.num_soft).all(|i| m >> i & 1 == 0 || self.is_sat(m & !(1 << i))))
            .map(|m| self.subset(m))
            .collect()
    }

    fn mcses(&self) -> BTreeSet<Subset> {
        let full = (1u32 << self.num_soft) - 1;
        self.masks()
            .filter(|&m| self.is_sat(m) && (0..self.num_soft).all(|i| m >> i & 1 == 1 || !self.is_sat(m | (1 << i))))
            .map(|m| self.subset(full & !m))
            .filter(|mcs| !mcs.is_empty())
            .collect()
    }
}

fn full_resolve(soft: &[Cst], hard: &[Cst]) -> FullResolve<Cst, BruteForce> {
    FullResolve::new(BruteForce::new(VARS, 0..=MAX_VALUE), soft.to_vec(), hard.to_vec()).with_timeout(None)
}

fn assumption(soft: &[Cst], hard: &[Cst]) -> AssumptionOracle<Cst, BruteForce> {
    AssumptionOracle::new(BruteForce::new(VARS, 0..=MAX_VALUE), soft.to_vec(), hard.to_vec()).with_timeout(None)
}

fn enumerate<O: Oracle>(oracle: &mut O, naive: bool) -> (BTreeSet<Subset>, BTreeSet<Subset>) {
    let enumeration = if naive { marco_naive(oracle) } else { marco(oracle) };
    let mut muses = BTreeSet::new();
    let mut mcses = BTreeSet::new();
    for res in enumeration {
        match res.unwrap() {
            MusMcs::Mus(mus) => assert!(muses.insert(mus)),
            MusMcs::Mcs(mcs) => assert!(mcses.insert(mcs)),
        }
    }
    (muses, mcses)
}

/// Random problems with 3 to 7 soft constraints, and sometimes a hard one.
fn problems(seed: u64, count: usize) -> Vec<(Vec<Cst>, Vec<Cst>)> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let num_soft = rng.random_range(3..=7);
            let soft = (0..num_soft).map(|_| random_constraint(&mut rng)).collect_vec();
            let hard = if rng.random_bool(0.3) {
                vec![random_constraint(&mut rng)]
            } else {
                vec![]
            };
            (soft, hard)
        })
        .collect()
}

#[test]
fn test_enumeration_is_complete() {
    init_tracing();
    for (soft, hard) in problems(1, 40) {
        let reference = Exhaustive::new(&soft, &hard);
        let expected = (reference.muses(), reference.mcses());
        assert_eq!(enumerate(&mut full_resolve(&soft, &hard), false), expected, "{soft:?} / {hard:?}");
        assert_eq!(enumerate(&mut assumption(&soft, &hard), false), expected, "{soft:?} / {hard:?}");
        assert_eq!(enumerate(&mut assumption(&soft, &hard), true), expected, "{soft:?} / {hard:?}");
    }
}

#[test]
fn test_single_explanations_are_minimal() {
    for (soft, hard) in problems(2, 40) {
        let reference = Exhaustive::new(&soft, &hard);
        let muses = reference.muses();
        let mcses = reference.mcses();
        let full = (1u32 << soft.len()) - 1;
        let sat = reference.is_sat(full);

        for res in [
            mus(&mut assumption(&soft, &hard)),
            mus(&mut full_resolve(&soft, &hard)),
            quickxplain_naive(&mut full_resolve(&soft, &hard)),
        ] {
            if sat {
                assert_eq!(res, Err(ExplainError::NoConflict));
            } else {
                assert!(muses.contains(&res.unwrap()), "{soft:?} / {hard:?}");
            }
        }

        for res in [mss(&mut assumption(&soft, &hard)), mss_naive(&mut full_resolve(&soft, &hard))] {
            if reference.models.is_empty() {
                assert_eq!(res, Err(ExplainError::HardInfeasible));
            } else {
                let s = res.unwrap();
                assert!(mcses.contains(&s.complement()) || (sat && s.len() == soft.len()));
            }
        }
    }
}

#[test]
fn test_optimal_muses_have_minimum_weight() {
    let mut rng = SmallRng::seed_from_u64(3);
    for (soft, hard) in problems(4, 40) {
        let reference = Exhaustive::new(&soft, &hard);
        let muses = reference.muses();
        let Some(min_size) = muses.iter().map(Subset::len).min() else {
            assert_eq!(smus(&mut full_resolve(&soft, &hard)), Err(ExplainError::NoConflict));
            continue;
        };
        let weights = Weights::new((0..soft.len()).map(|_| rng.random_range(1..=5)).collect(), soft.len()).unwrap();
        let min_weight = muses.iter().map(|m| m.weight(&weights)).min().unwrap();

        let mut oracle = assumption(&soft, &hard);
        assert_eq!(smus(&mut oracle).unwrap().len(), min_size, "{soft:?} / {hard:?}");
        for res in [
            optimal_mus(&mut oracle, Some(&weights)).unwrap(),
            optimal_mus(&mut full_resolve(&soft, &hard), Some(&weights)).unwrap(),
            optimal_mus_naive(&mut full_resolve(&soft, &hard), Some(&weights)).unwrap(),
        ] {
            assert_eq!(res.weight(&weights), min_weight, "{soft:?} / {hard:?} / {weights:?}");
            assert!(is_mus(&mut oracle, &res).unwrap());
        }
    }
}
