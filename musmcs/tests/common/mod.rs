#![allow(dead_code)]

//! A small finite-domain backend: integer variables over a common domain, solved by enumeration.

use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

use itertools::Itertools;
use musmcs::{AssumptionBackend, AssumptionOracle, Backend, FullResolve, OracleError, Witness};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cst {
    Eq(usize, i32),
    Ne(usize, i32),
    Ge(usize, i32),
    Le(usize, i32),
    /// `x_i < x_j`
    Lt(usize, usize),
}

impl Cst {
    pub fn holds(&self, values: &[i32]) -> bool {
        match *self {
            Cst::Eq(x, v) => values[x] == v,
            Cst::Ne(x, v) => values[x] != v,
            Cst::Ge(x, v) => values[x] >= v,
            Cst::Le(x, v) => values[x] <= v,
            Cst::Lt(x, y) => values[x] < values[y],
        }
    }
}

#[derive(Clone, Debug)]
pub struct Assignment(pub Vec<i32>);

impl Witness<Cst> for Assignment {
    fn satisfies(&self, constraint: &Cst) -> bool {
        constraint.holds(&self.0)
    }
}

/// Tries every assignment of `num_vars` variables (at least one) in lexicographic order.
pub struct BruteForce {
    pub num_vars: usize,
    pub domain: RangeInclusive<i32>,
    /// Whether cores are minimized before being returned.
    pub minimal_cores: bool,
    pub num_solves: u64,
}

impl BruteForce {
    pub fn new(num_vars: usize, domain: RangeInclusive<i32>) -> Self {
        assert!(num_vars > 0);
        BruteForce {
            num_vars,
            domain,
            minimal_cores: false,
            num_solves: 0,
        }
    }

    fn find(&mut self, constraints: &[&Cst], timeout: Option<Duration>) -> Result<Option<Assignment>, OracleError> {
        self.num_solves += 1;
        let start = Instant::now();
        for values in (0..self.num_vars).map(|_| self.domain.clone()).multi_cartesian_product() {
            if timeout.is_some_and(|t| start.elapsed() >= t) {
                return Err(OracleError::Timeout(timeout));
            }
            if constraints.iter().all(|c| c.holds(&values)) {
                return Ok(Some(Assignment(values)));
            }
        }
        Ok(None)
    }

    fn is_unsat(
        &mut self,
        hard: &[&Cst],
        assumptions: &[&Cst],
        timeout: Option<Duration>,
    ) -> Result<bool, OracleError> {
        let all = hard.iter().chain(assumptions).copied().collect_vec();
        Ok(self.find(&all, timeout)?.is_none())
    }
}

impl Backend<Cst> for BruteForce {
    type Witness = Assignment;

    fn solve(&mut self, constraints: &[&Cst], timeout: Option<Duration>) -> Result<Option<Assignment>, OracleError> {
        self.find(constraints, timeout)
    }
}

impl AssumptionBackend<Cst> for BruteForce {
    /// The core is the shortest UNSAT prefix of the assumptions, minimized by deletion if requested.
    fn solve_assuming(
        &mut self,
        hard: &[&Cst],
        assumptions: &[&Cst],
        timeout: Option<Duration>,
    ) -> Result<Result<Assignment, Vec<usize>>, OracleError> {
        let all = hard.iter().chain(assumptions).copied().collect_vec();
        if let Some(witness) = self.find(&all, timeout)? {
            return Ok(Ok(witness));
        }
        let mut prefix_len = 0;
        while !self.is_unsat(hard, &assumptions[..prefix_len], timeout)? {
            prefix_len += 1;
        }
        let mut core = (0..prefix_len).collect_vec();
        if self.minimal_cores {
            let mut i = 0;
            while i < core.len() {
                let without = core
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(_, &pos)| assumptions[pos])
                    .collect_vec();
                if self.is_unsat(hard, &without, timeout)? {
                    core.remove(i);
                } else {
                    i += 1;
                }
            }
        }
        Ok(Err(core))
    }

    fn cores_are_minimal(&self) -> bool {
        self.minimal_cores
    }
}

/// Fails every solve after the first `ok_solves`.
pub struct Flaky {
    pub inner: BruteForce,
    pub ok_solves: u64,
}

impl Flaky {
    fn fail(&self) -> Result<(), OracleError> {
        if self.inner.num_solves >= self.ok_solves {
            return Err(OracleError::Failure("solver crashed".to_string()));
        }
        Ok(())
    }
}

impl Backend<Cst> for Flaky {
    type Witness = Assignment;

    fn solve(&mut self, constraints: &[&Cst], timeout: Option<Duration>) -> Result<Option<Assignment>, OracleError> {
        self.fail()?;
        self.inner.solve(constraints, timeout)
    }
}

impl AssumptionBackend<Cst> for Flaky {
    fn solve_assuming(
        &mut self,
        hard: &[&Cst],
        assumptions: &[&Cst],
        timeout: Option<Duration>,
    ) -> Result<Result<Assignment, Vec<usize>>, OracleError> {
        self.fail()?;
        self.inner.solve_assuming(hard, assumptions, timeout)
    }
}

pub const NUM_VARS: usize = 4;
pub const DOMAIN: RangeInclusive<i32> = 0..=9;

pub fn full_resolve(soft: &[Cst], hard: &[Cst]) -> FullResolve<Cst, BruteForce> {
    FullResolve::new(BruteForce::new(NUM_VARS, DOMAIN), soft.to_vec(), hard.to_vec()).with_timeout(None)
}

pub fn assumption(soft: &[Cst], hard: &[Cst]) -> AssumptionOracle<Cst, BruteForce> {
    AssumptionOracle::new(BruteForce::new(NUM_VARS, DOMAIN), soft.to_vec(), hard.to_vec()).with_timeout(None)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
