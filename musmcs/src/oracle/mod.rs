//! The satisfiability oracle the explanation algorithms are built upon.
//!
//! Algorithms only depend on the [`Oracle`] trait, which answers whether a subset of the soft
//! constraints is satisfiable together with the hard constraints. Actual solvers are plugged in
//! through the [`Backend`] / [`AssumptionBackend`] traits, wrapped in one of the two adapters:
//!
//!  - [`FullResolve`]: re-solves `hard ∪ subset` from scratch on each check. Always available.
//!  - [`AssumptionOracle`]: activates soft constraints through assumptions, so that UNSAT checks
//!    come with a core and SAT checks with a witness, which algorithms use to save oracle calls.

mod assumptions;
mod backend;
mod resolve;

use std::fmt::{Display, Formatter};
use std::time::Duration;

pub use assumptions::AssumptionOracle;
pub use backend::{AssumptionBackend, Backend, Witness};
pub use resolve::FullResolve;

use crate::error::OracleError;
use crate::subset::Subset;

/// An unsatisfiable subset of the checked constraints, as returned by the solver.
///
/// Unless `minimal` is set, it is only an upper bound of a MUS.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Core {
    pub members: Subset,
    pub minimal: bool,
}

/// Outcome of a single oracle check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Sat {
        /// Soft constraints satisfied by the witness found, if any.
        /// When present, it is a superset of the checked subset.
        satisfied: Option<Subset>,
    },
    Unsat {
        /// Unsatisfiable core, when the solver provides one. It is a subset of the checked subset.
        core: Option<Core>,
    },
}

impl Verdict {
    pub fn is_sat(&self) -> bool {
        matches!(self, Verdict::Sat { .. })
    }

    pub fn is_unsat(&self) -> bool {
        !self.is_sat()
    }
}

pub trait Oracle {
    /// Number of soft constraints. Checked subsets are drawn from `0..num_soft()`.
    fn num_soft(&self) -> usize;

    /// Checks whether the hard constraints together with the given soft constraints are satisfiable.
    ///
    /// Must be deterministic: the same subset always yields the same satisfiability.
    fn check(&mut self, subset: &Subset) -> Result<Verdict, OracleError>;

    /// Whether checks may come with cores and witnesses.
    /// Algorithms use this to decide between their assumption-based and naive variants.
    fn supports_assumptions(&self) -> bool;

    fn stats(&self) -> &OracleStats;
}

impl<O: Oracle + ?Sized> Oracle for &mut O {
    fn num_soft(&self) -> usize {
        (**self).num_soft()
    }
    fn check(&mut self, subset: &Subset) -> Result<Verdict, OracleError> {
        (**self).check(subset)
    }
    fn supports_assumptions(&self) -> bool {
        (**self).supports_assumptions()
    }
    fn stats(&self) -> &OracleStats {
        (**self).stats()
    }
}

/// Counters of the oracle calls of one session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OracleStats {
    pub num_checks: u64,
    pub num_sat: u64,
    pub num_unsat: u64,
    pub num_errors: u64,
    /// Cumulated time spent in the backend.
    pub time: Duration,
}

impl OracleStats {
    pub(crate) fn record(&mut self, outcome: &Result<Verdict, OracleError>, time: Duration) {
        self.num_checks += 1;
        self.time += time;
        match outcome {
            Ok(Verdict::Sat { .. }) => self.num_sat += 1,
            Ok(Verdict::Unsat { .. }) => self.num_unsat += 1,
            Err(_) => self.num_errors += 1,
        }
    }
}

impl Display for OracleStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "# oracle checks : {}", self.num_checks)?;
        writeln!(f, "#   sat         : {}", self.num_sat)?;
        writeln!(f, "#   unsat       : {}", self.num_unsat)?;
        writeln!(f, "#   errors      : {}", self.num_errors)?;
        writeln!(f, "oracle time (s) : {:.6}", self.time.as_secs_f64())
    }
}
