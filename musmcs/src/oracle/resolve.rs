use std::marker::PhantomData;
use std::time::{Duration, Instant};

use itertools::Itertools;

use crate::config::oracle_timeout_from_env;
use crate::error::OracleError;
use crate::oracle::{Backend, Oracle, OracleStats, Verdict};
use crate::subset::Subset;

/// Oracle that re-solves `hard ∪ subset` from scratch on every check.
///
/// It never reports cores nor witnesses, so algorithms run against it in their naive form.
pub struct FullResolve<C, B: Backend<C>> {
    backend: B,
    soft: Vec<C>,
    hard: Vec<C>,
    timeout: Option<Duration>,
    stats: OracleStats,
    _constraint: PhantomData<fn(&C)>,
}

impl<C, B: Backend<C>> FullResolve<C, B> {
    pub fn new(backend: B, soft: Vec<C>, hard: Vec<C>) -> Self {
        FullResolve {
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
}

impl<C, B: Backend<C>> Oracle for FullResolve<C, B> {
    fn num_soft(&self) -> usize {
        self.soft.len()
    }

    fn check(&mut self, subset: &Subset) -> Result<Verdict, OracleError> {
        debug_assert_eq!(subset.universe(), self.soft.len());
        let active = self.hard.iter().chain(subset.iter().map(|i| &self.soft[i])).collect_vec();

        let start = Instant::now();
        let res = self
            .backend
            .solve(&active, self.timeout)
            .map(|witness| match witness {
                Some(_) => Verdict::Sat { satisfied: None },
                None => Verdict::Unsat { core: None },
            });
        self.stats.record(&res, start.elapsed());
        tracing::trace!("check {} -> {:?}", subset, res.as_ref().map(Verdict::is_sat));
        res
    }

    fn supports_assumptions(&self) -> bool {
        false
    }

    fn stats(&self) -> &OracleStats {
        &self.stats
    }
}
