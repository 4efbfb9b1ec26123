use std::str::FromStr;

use derive_more::Display;
use itertools::Itertools;
use rustsat::solvers::{Solve, SolveIncremental, SolverResult};
use rustsat::types::{Clause, Lit, TernaryVal};
use rustsat_batsat::BasicSolver;

use crate::error::{ExplainError, Result};
use crate::subset::{SoftIdx, Subset};

/// - "High" bias approaches are more likely to discover
///   UNSAT seeds early (since they will be larger), thus favoring finding MUSes early.
/// - "Low" bias approaches are more likely to discover
///   SAT seeds early (since they will be smaller), thus favoring finding MCSes early.
///
/// For each, two methods are available: 1. using preferred values, and 2. optimizing.
/// For high (low) bias, the former corresponds to the map solver first trying to include
/// (exclude) each constraint, while the latter corresponds to finding a seed of maximal
/// (minimal) cardinality.
/// Both are functionally equivalent, but the preferred values method is expected to be faster.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Display)]
pub enum MapSolverMode {
    #[default]
    #[display("high-preferred")]
    HighPreferredValues,
    #[display("low-preferred")]
    LowPreferredValues,
    #[display("high-optimize")]
    HighOptimize,
    #[display("low-optimize")]
    LowOptimize,
}

impl MapSolverMode {
    fn prefers_high(self) -> bool {
        matches!(self, MapSolverMode::HighPreferredValues | MapSolverMode::HighOptimize)
    }

    fn optimizes(self) -> bool {
        matches!(self, MapSolverMode::HighOptimize | MapSolverMode::LowOptimize)
    }
}

impl FromStr for MapSolverMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high-preferred" => Ok(MapSolverMode::HighPreferredValues),
            "low-preferred" => Ok(MapSolverMode::LowPreferredValues),
            "high-optimize" => Ok(MapSolverMode::HighOptimize),
            "low-optimize" => Ok(MapSolverMode::LowOptimize),
            _ => Err(format!("unknown map solver mode: {s}")),
        }
    }
}

/// Keeps track of the explored part of the powerset of the soft constraints.
///
/// The map is a set of clauses over one boolean variable per soft constraint, telling whether
/// it is included in the seed. Models of the clauses are the unexplored subsets.
/// Clauses are handed to a SAT solver, queried under assumptions.
pub(crate) struct MapSolver {
    num_vars: usize,
    mode: MapSolverMode,
    solver: BasicSolver,
    /// Whether the map variables were made known to the solver.
    declared: bool,
    /// Set once an empty clause is added: every subset has been explored.
    exhausted: bool,
    /// Index of the next auxiliary variable.
    next_var: u32,
    /// `at_least[k - 1]` implies that at least `k` map literals hold with the preferred value.
    /// Only encoded in optimizing modes, on the first search.
    at_least: Option<Vec<Lit>>,
    /// Singleton MCSes (registered in `block_down`).
    /// Their members belong to every MUS, which the subset solver may exploit.
    known_singleton_mcses: Subset,
}

/// The literal telling that soft constraint `i` is part of the seed.
fn included(i: SoftIdx) -> Lit {
    Lit::positive(i as u32)
}

fn map_error(err: impl std::fmt::Display) -> ExplainError {
    ExplainError::MapSolver(err.to_string())
}

impl MapSolver {
    pub fn new(num_vars: usize, mode: MapSolverMode) -> Self {
        MapSolver {
            num_vars,
            mode,
            solver: BasicSolver::default(),
            declared: false,
            exhausted: false,
            next_var: num_vars as u32 + 1,
            at_least: None,
            known_singleton_mcses: Subset::empty(num_vars),
        }
    }

    pub fn known_singleton_mcses(&self) -> &Subset {
        &self.known_singleton_mcses
    }

    /// Searches for a subset that was not explored yet.
    /// In the MARCO algorithm, it will always be a new subset, thanks to `block_down` and `block_up`.
    pub fn find_unexplored_seed(&mut self) -> Result<Option<Subset>> {
        if self.exhausted {
            return Ok(None);
        }
        self.declare_vars()?;
        if !self.mode.optimizes() {
            return self.lexical_seed(Vec::new());
        }

        let at_least = self.cardinality_counter()?;
        if !self.solve(&[])? {
            return Ok(None);
        }
        let mut best = 0;
        while best < at_least.len() && self.solve(&[at_least[best]])? {
            best += 1;
        }
        tracing::trace!("optimal seed cardinality bound: {best}");
        let bound = best.checked_sub(1).map(|k| at_least[k]);
        self.lexical_seed(bound.into_iter().collect())
    }

    /// Marks all subsets of the MSS complementing `mcs` as explored:
    /// seeds discovered from now on contain at least one member of `mcs`.
    pub fn block_down(&mut self, mcs: &Subset) -> Result<()> {
        if let Ok(singleton) = mcs.iter().exactly_one() {
            self.known_singleton_mcses.insert(singleton);
        }
        self.add_clause(mcs.iter().map(included).collect())
    }

    /// Marks all supersets of `mus` as explored:
    /// seeds discovered from now on exclude at least one member of `mus`.
    pub fn block_up(&mut self, mus: &Subset) -> Result<()> {
        self.add_clause(mus.iter().map(|i| !included(i)).collect())
    }

    fn add_clause(&mut self, lits: Vec<Lit>) -> Result<()> {
        if lits.is_empty() {
            self.exhausted = true;
            return Ok(());
        }
        self.declare_vars()?;
        self.solver.add_clause(lits.into_iter().collect()).map_err(map_error)
    }

    /// Mentions every map variable in a clause satisfied through an anchor variable,
    /// so that the solver knows them before any blocking clause does.
    fn declare_vars(&mut self) -> Result<()> {
        if self.declared {
            return Ok(());
        }
        self.declared = true;
        let anchor = Lit::positive(self.num_vars as u32);
        self.solver.add_unit(anchor).map_err(map_error)?;
        for i in 0..self.num_vars {
            self.solver.add_binary(anchor, included(i)).map_err(map_error)?;
        }
        Ok(())
    }

    fn preferred(&self, i: SoftIdx) -> Lit {
        if self.mode.prefers_high() {
            included(i)
        } else {
            !included(i)
        }
    }

    fn fresh_lit(&mut self) -> Lit {
        let lit = Lit::positive(self.next_var);
        self.next_var += 1;
        lit
    }

    /// Sequential counter over the preferred literals of the map variables, encoded once.
    fn cardinality_counter(&mut self) -> Result<Vec<Lit>> {
        if let Some(at_least) = &self.at_least {
            return Ok(at_least.clone());
        }
        // `prev[j - 1]`: at least `j` of the literals seen so far hold
        let mut prev: Vec<Lit> = Vec::new();
        for i in 0..self.num_vars {
            let lit = self.preferred(i);
            let mut cur = Vec::with_capacity(prev.len() + 1);
            for j in 1..=prev.len() + 1 {
                let s = self.fresh_lit();
                let without_lit = prev.get(j - 1).copied();
                let mut clause: Clause = [!s, lit].into_iter().chain(without_lit).collect();
                self.solver.add_clause(clause).map_err(map_error)?;
                if j >= 2 {
                    clause = [!s, prev[j - 2]].into_iter().chain(without_lit).collect();
                    self.solver.add_clause(clause).map_err(map_error)?;
                }
                cur.push(s);
            }
            prev = cur;
        }
        self.at_least = Some(prev.clone());
        Ok(prev)
    }

    /// Decides the map variables in index order, each on its preferred value whenever the map
    /// and the previous decisions allow it.
    fn lexical_seed(&mut self, mut assumptions: Vec<Lit>) -> Result<Option<Subset>> {
        if !self.solve(&assumptions)? {
            return Ok(None);
        }
        // values of the last model, which satisfies all assumptions made so far
        let mut model = self.model_values();
        let mut seed = Subset::empty(self.num_vars);
        for i in 0..self.num_vars {
            let preferred = self.preferred(i);
            assumptions.push(preferred);
            if model[i] != Some(preferred == included(i)) {
                if self.solve(&assumptions)? {
                    model = self.model_values();
                } else {
                    // the previous model still satisfies every assumption, `!preferred` included
                    assumptions.pop();
                    assumptions.push(!preferred);
                }
            }
            if assumptions.last() == Some(&included(i)) {
                seed.insert(i);
            }
        }
        Ok(Some(seed))
    }

    /// Value of each map variable in the last model. `None` when the solver does not tell.
    fn model_values(&self) -> Vec<Option<bool>> {
        (0..self.num_vars)
            .map(|i| match self.solver.lit_val(included(i)) {
                Ok(TernaryVal::True) => Some(true),
                Ok(TernaryVal::False) => Some(false),
                _ => None,
            })
            .collect()
    }

    fn solve(&mut self, assumptions: &[Lit]) -> Result<bool> {
        match self.solver.solve_assumps(assumptions).map_err(map_error)? {
            SolverResult::Sat => Ok(true),
            SolverResult::Unsat => Ok(false),
            SolverResult::Interrupted => Err(ExplainError::MapSolver("interrupted".to_string())),
        }
    }
}
