//! Index-level oracles for unit tests.

use crate::error::OracleError;
use crate::oracle::{Core, Oracle, OracleStats, Verdict};
use crate::subset::Subset;

/// A subset is UNSAT iff it contains one of the listed conflicts.
/// The MUSes of the problem are thus exactly the inclusion-minimal conflicts.
pub(crate) struct ConflictTable {
    num_soft: usize,
    conflicts: Vec<Subset>,
    assumptions: bool,
    /// Fail with a timeout after this number of checks.
    fail_after: Option<u64>,
    stats: OracleStats,
}

impl ConflictTable {
    pub fn new(num_soft: usize, conflicts: &[&[usize]]) -> Self {
        ConflictTable {
            num_soft,
            conflicts: conflicts
                .iter()
                .map(|c| Subset::from_indices(num_soft, c.iter().copied()).unwrap())
                .collect(),
            assumptions: false,
            fail_after: None,
            stats: OracleStats::default(),
        }
    }

    /// Reports (non-minimal) cores and witnesses.
    pub fn with_assumptions(mut self) -> Self {
        self.assumptions = true;
        self
    }

    pub fn failing_after(mut self, num_checks: u64) -> Self {
        self.fail_after = Some(num_checks);
        self
    }

    pub fn is_sat(&self, subset: &Subset) -> bool {
        !self.conflicts.iter().any(|c| c.is_subset(subset))
    }

    pub fn num_checks(&self) -> u64 {
        self.stats.num_checks
    }
}

impl Oracle for ConflictTable {
    fn num_soft(&self) -> usize {
        self.num_soft
    }

    fn check(&mut self, subset: &Subset) -> Result<Verdict, OracleError> {
        if self.fail_after.is_some_and(|n| self.stats.num_checks >= n) {
            let res = Err(OracleError::Timeout(None));
            self.stats.record(&res, Default::default());
            return res;
        }
        let res = if self.is_sat(subset) {
            let satisfied = self.assumptions.then(|| {
                // greedily extend the subset, as a solver's assignment would happen to satisfy more
                let mut satisfied = subset.clone();
                for i in 0..self.num_soft {
                    satisfied.insert(i);
                    if !self.is_sat(&satisfied) && !subset.contains(i) {
                        satisfied.remove(i);
                    }
                }
                satisfied
            });
            Verdict::Sat { satisfied }
        } else {
            let core = self.assumptions.then(|| {
                // union of all contained conflicts: valid but usually not minimal
                let mut members = Subset::empty(self.num_soft);
                for c in self.conflicts.iter().filter(|c| c.is_subset(subset)) {
                    members.union_with(c);
                }
                Core { members, minimal: false }
            });
            Verdict::Unsat { core }
        };
        let res = Ok(res);
        self.stats.record(&res, Default::default());
        res
    }

    fn supports_assumptions(&self) -> bool {
        self.assumptions
    }

    fn stats(&self) -> &OracleStats {
        &self.stats
    }
}
