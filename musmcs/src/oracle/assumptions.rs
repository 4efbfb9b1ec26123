use std::marker::PhantomData;
use std::time::{Duration, Instant};

use itertools::Itertools;

use crate::config::oracle_timeout_from_env;
use crate::error::OracleError;
use crate::oracle::{AssumptionBackend, Core, Oracle, OracleStats, Verdict, Witness};
use crate::subset::Subset;

/// Oracle activating soft constraints as solver assumptions.
///
/// - On UNSAT, the backend's core is translated back into soft indices.
///   It is an upper bound of a MUS unless the backend guarantees minimal cores.
/// - On SAT, the witness is evaluated on *every* soft constraint, so that callers learn for free
///   which unchecked constraints are consistent with it.
pub struct AssumptionOracle<C, B: AssumptionBackend<C>> {
    backend: B,
    soft: Vec<C>,
    hard: Vec<C>,
    timeout: Option<Duration>,
    stats: OracleStats,
    _constraint: PhantomData<fn(&C)>,
}

impl<C, B: AssumptionBackend<C>> AssumptionOracle<C, B> {
    pub fn new(backend: B, soft: Vec<C>, hard: Vec<C>) -> Self {
        AssumptionOracle {
            backend,
            soft,
            hard,
            timeout: oracle_timeout_from_env(),
            stats: OracleStats::default(),
            _constraint: PhantomData,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn soft(&self) -> &[C] {
        &self.soft
    }

    pub fn hard(&self) -> &[C] {
        &self.hard
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn solve(&mut self, subset: &Subset) -> Result<Verdict, OracleError> {
        let hard = self.hard.iter().collect_vec();
        let indices = subset.iter().collect_vec();
        let assumptions = indices.iter().map(|&i| &self.soft[i]).collect_vec();

        match self.backend.solve_assuming(&hard, &assumptions, self.timeout)? {
            Ok(witness) => {
                let mut satisfied = subset.clone();
                for (i, c) in self.soft.iter().enumerate() {
                    if !satisfied.contains(i) && witness.satisfies(c) {
                        satisfied.insert(i);
                    }
                }
                Ok(Verdict::Sat {
                    satisfied: Some(satisfied),
                })
            }
            Err(positions) => {
                let mut members = Subset::empty(self.soft.len());
                for pos in positions {
                    match indices.get(pos) {
                        Some(&i) => members.insert(i),
                        None => {
                            return Err(OracleError::Failure(format!(
                                "core refers to assumption #{pos} but only {} were given",
                                indices.len()
                            )))
                        }
                    }
                }
                Ok(Verdict::Unsat {
                    core: Some(Core {
                        members,
                        minimal: self.backend.cores_are_minimal(),
                    }),
                })
            }
        }
    }
}

impl<C, B: AssumptionBackend<C>> Oracle for AssumptionOracle<C, B> {
    fn num_soft(&self) -> usize {
        self.soft.len()
    }

    fn check(&mut self, subset: &Subset) -> Result<Verdict, OracleError> {
        debug_assert_eq!(subset.universe(), self.soft.len());
        let start = Instant::now();
        let res = self.solve(subset);
        self.stats.record(&res, start.elapsed());
        tracing::trace!("check {} -> {:?}", subset, res.as_ref().map(Verdict::is_sat));
        res
    }

    fn supports_assumptions(&self) -> bool {
        true
    }

    fn stats(&self) -> &OracleStats {
        &self.stats
    }
}
