//! Enumeration of all MUSes and MCSes with the MARCO algorithm
//! (Liffiton, Previti, Malik & Marques-Silva, 2016).
//!
//! A "map solver" keeps track of the subsets of soft constraints that are not yet explored.
//! Each unexplored subset (seed) it proposes is checked against the oracle:
//!  - if UNSAT, it is shrunk to a MUS, and all supersets of the MUS are blocked in the map;
//!  - if SAT, it is grown to an MSS, and all subsets of the MSS are blocked in the map
//!    (i.e. every future seed must contain a member of the complementing MCS).
//!
//! Since every MUS intersects every MCS, no MUS or MCS is ever blocked before being found:
//! the enumeration is complete once the map has no model left.

mod mapsolver;

use std::hash::Hash;
use std::iter::FusedIterator;
use std::time::{Duration, Instant};

use itertools::Itertools;

use crate::config::{subset_solver_opti_mode_from_env, MAP_SOLVER_MODE};
use crate::error::{ExplainError, Result};
use crate::mss::grow;
use crate::mus::shrink;
use crate::oracle::{Oracle, Verdict};
use crate::subset::{SoftSet, Subset};
use mapsolver::MapSolver;
pub use mapsolver::MapSolverMode;

/// Optional optimisation of the shrinking steps.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SubsetSolverOptiMode {
    None,
    /// Members of singleton MCSes found so far belong to every MUS:
    /// their deletion is never tried when shrinking.
    #[default]
    KnownSingletonMCSes,
}

#[derive(Clone, Debug)]
pub struct MarcoConfig {
    pub return_muses: bool,
    pub return_mcses: bool,
    pub map_solver_mode: MapSolverMode,
    pub subset_solver_opti_mode: SubsetSolverOptiMode,
}

impl Default for MarcoConfig {
    fn default() -> Self {
        MarcoConfig {
            return_muses: true,
            return_mcses: true,
            map_solver_mode: MAP_SOLVER_MODE.get(),
            subset_solver_opti_mode: subset_solver_opti_mode_from_env(),
        }
    }
}

/// A result of the enumeration.
///
/// MCSes are reported as such. The MSS they complement is given by [`MusMcs::mss`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MusMcs<S = Subset> {
    Mus(S),
    Mcs(S),
}

impl<S> MusMcs<S> {
    pub fn is_mus(&self) -> bool {
        matches!(self, MusMcs::Mus(_))
    }

    pub fn is_mcs(&self) -> bool {
        matches!(self, MusMcs::Mcs(_))
    }

    pub fn subset(&self) -> &S {
        match self {
            MusMcs::Mus(s) | MusMcs::Mcs(s) => s,
        }
    }

    pub fn into_subset(self) -> S {
        match self {
            MusMcs::Mus(s) | MusMcs::Mcs(s) => s,
        }
    }
}

impl MusMcs<Subset> {
    /// The MSS complementing an MCS result, `None` for a MUS.
    pub fn mss(&self) -> Option<Subset> {
        match self {
            MusMcs::Mus(_) => None,
            MusMcs::Mcs(mcs) => Some(mcs.complement()),
        }
    }

    /// Maps the soft indices of the result back to the constraint identifiers, keeping the kind.
    ///
    /// ```
    /// use musmcs::{MusMcs, SoftSet, Subset};
    /// let soft = SoftSet::new(["a", "b", "c"]).unwrap();
    /// let mus = MusMcs::Mus(Subset::from_indices(3, [0, 2]).unwrap());
    /// assert_eq!(mus.project(&soft), MusMcs::Mus(vec![&"a", &"c"]));
    /// ```
    pub fn project<'s, C: Eq + Hash + Clone>(&self, soft: &'s SoftSet<C>) -> MusMcs<Vec<&'s C>> {
        match self {
            MusMcs::Mus(s) => MusMcs::Mus(soft.project(s)),
            MusMcs::Mcs(s) => MusMcs::Mcs(soft.project(s)),
        }
    }
}

/// Outcome of [`Marco::run`].
#[derive(Clone, Debug)]
pub struct MusMcsEnumerationResult {
    /// MUSes found, if requested.
    pub muses: Option<Vec<Subset>>,
    /// MCSes found, if requested.
    pub mcses: Option<Vec<Subset>>,
    pub run_time: Option<Duration>,
    /// Whether every MUS and MCS was found.
    pub complete: Option<bool>,
    /// The oracle error that ended the enumeration early, if any.
    pub interrupted_by: Option<ExplainError>,
}

pub struct Marco<'a, O: Oracle + ?Sized> {
    oracle: &'a mut O,
    map_solver: MapSolver,
    config: MarcoConfig,
    /// Whether cores and witnesses of the oracle are used to shrink and grow faster.
    use_hints: bool,
    /// Set once the map is exhausted or an error occurred.
    done: bool,

    #[cfg(debug_assertions)]
    debug_found: std::collections::HashSet<MusMcs>,
}

/// Lazy enumeration of all MUSes and MCSes, using cores and witnesses if the oracle provides them.
pub fn marco<O: Oracle + ?Sized>(oracle: &mut O) -> Marco<'_, O> {
    Marco::new(oracle, MarcoConfig::default())
}

/// Lazy enumeration of all MUSes and MCSes, ignoring cores and witnesses.
pub fn marco_naive<O: Oracle + ?Sized>(oracle: &mut O) -> Marco<'_, O> {
    Marco::naive(oracle, MarcoConfig::default())
}

/// All MUSes of the problem (at most `max` of them if given).
pub fn all_mus<O: Oracle + ?Sized>(oracle: &mut O, max: Option<usize>) -> Result<Vec<Subset>> {
    let config = MarcoConfig {
        return_mcses: false,
        ..MarcoConfig::default()
    };
    Marco::new(oracle, config)
        .take(max.unwrap_or(usize::MAX))
        .map_ok(MusMcs::into_subset)
        .collect()
}

/// All MCSes of the problem (at most `max` of them if given).
pub fn all_mcs<O: Oracle + ?Sized>(oracle: &mut O, max: Option<usize>) -> Result<Vec<Subset>> {
    let config = MarcoConfig {
        return_muses: false,
        ..MarcoConfig::default()
    };
    Marco::new(oracle, config)
        .take(max.unwrap_or(usize::MAX))
        .map_ok(MusMcs::into_subset)
        .collect()
}

impl<O: Oracle + ?Sized> Iterator for Marco<'_, O> {
    type Item = Result<MusMcs>;

    /// The next MUS or MCS. After an oracle error is returned, the iterator is exhausted:
    /// the enumeration can only be restarted from the beginning.
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self._next() {
            Ok(Some(musmcs)) => Some(Ok(musmcs)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl<O: Oracle + ?Sized> FusedIterator for Marco<'_, O> {}

impl<'a, O: Oracle + ?Sized> Marco<'a, O> {
    pub fn new(oracle: &'a mut O, config: MarcoConfig) -> Self {
        let use_hints = oracle.supports_assumptions();
        Self::with(oracle, config, use_hints)
    }

    /// Never exploits cores nor witnesses, even if the oracle provides them.
    pub fn naive(oracle: &'a mut O, config: MarcoConfig) -> Self {
        Self::with(oracle, config, false)
    }

    fn with(oracle: &'a mut O, config: MarcoConfig, use_hints: bool) -> Self {
        let map_solver = MapSolver::new(oracle.num_soft(), config.map_solver_mode);
        Marco {
            oracle,
            map_solver,
            config,
            use_hints,
            done: false,
            #[cfg(debug_assertions)]
            debug_found: Default::default(),
        }
    }

    /// Provides an iterator over all MUSes of the problem.
    pub fn mus_only(self) -> impl Iterator<Item = Result<Subset>> + use<'a, O> {
        self.filter_map_ok(|musmcs| match musmcs {
            MusMcs::Mus(mus) => Some(mus),
            MusMcs::Mcs(_) => None,
        })
    }

    /// Runs the enumeration to the end, or until the oracle fails.
    /// Results found before a failure are kept, and the result is then marked incomplete.
    pub fn run(
        &mut self,
        mut on_mus_found: Option<&mut dyn FnMut(&Subset)>,
        mut on_mcs_found: Option<&mut dyn FnMut(&Subset)>,
    ) -> MusMcsEnumerationResult {
        let _span = tracing::span!(tracing::Level::DEBUG, "MARCO").entered();
        let mut muses = self.config.return_muses.then(Vec::<Subset>::new);
        let mut mcses = self.config.return_mcses.then(Vec::<Subset>::new);
        let mut interrupted_by = None;

        let start = Instant::now();
        for musmcs in self.by_ref() {
            match musmcs {
                Ok(MusMcs::Mus(mus)) => {
                    if let Some(callback) = on_mus_found.as_mut() {
                        callback(&mus);
                    }
                    muses.get_or_insert_with(Vec::new).push(mus);
                }
                Ok(MusMcs::Mcs(mcs)) => {
                    if let Some(callback) = on_mcs_found.as_mut() {
                        callback(&mcs);
                    }
                    mcses.get_or_insert_with(Vec::new).push(mcs);
                }
                Err(err) => {
                    tracing::warn!("enumeration interrupted: {}", err);
                    interrupted_by = Some(err);
                }
            }
        }

        debug_assert!(muses.as_ref().is_none_or(|v| v.iter().all_unique()));
        debug_assert!(mcses.as_ref().is_none_or(|v| v.iter().all_unique()));
        tracing::debug!(
            "found {} MUSes and {} MCSes ({} oracle checks)",
            muses.as_ref().map_or(0, Vec::len),
            mcses.as_ref().map_or(0, Vec::len),
            self.oracle.stats().num_checks
        );

        MusMcsEnumerationResult {
            muses,
            mcses,
            run_time: Some(start.elapsed()),
            complete: Some(interrupted_by.is_none()),
            interrupted_by,
        }
    }

    fn _next(&mut self) -> Result<Option<MusMcs>> {
        while let Some(seed) = self.map_solver.find_unexplored_seed()? {
            match self.oracle.check(&seed)? {
                Verdict::Sat { satisfied } => {
                    let satisfied = match satisfied {
                        Some(satisfied) if self.use_hints => satisfied,
                        _ => seed,
                    };
                    if !self.config.return_mcses && self.use_hints {
                        // Growing is only needed to report MCSes. Blocking the subsets of the
                        // witness's satisfied set is enough to make progress.
                        self.map_solver.block_down(&satisfied.complement())?;
                        continue;
                    }
                    let order = (0..self.oracle.num_soft()).collect_vec();
                    let mss = grow(self.oracle, satisfied, &order, self.use_hints)?;
                    let mcs = mss.complement();
                    self.map_solver.block_down(&mcs)?;

                    // an empty MCS means the whole soft set is SAT: nothing to correct
                    if !mcs.is_empty() && self.config.return_mcses {
                        self.debug_check_is_new(MusMcs::Mcs(mcs.clone()));
                        return Ok(Some(MusMcs::Mcs(mcs)));
                    }
                }
                Verdict::Unsat { core } => {
                    let unsat = match core {
                        Some(core) if self.use_hints => core.members.intersection(&seed),
                        _ => seed,
                    };
                    let skip = match self.config.subset_solver_opti_mode {
                        SubsetSolverOptiMode::None => None,
                        SubsetSolverOptiMode::KnownSingletonMCSes => {
                            Some(self.map_solver.known_singleton_mcses().clone())
                        }
                    };
                    let mus = shrink(self.oracle, unsat, self.use_hints, skip.as_ref())?;
                    self.map_solver.block_up(&mus)?;

                    // an empty MUS means the hard constraints are UNSAT, and the map is now exhausted
                    if mus.is_empty() {
                        tracing::warn!("hard constraints are unsatisfiable on their own");
                    }
                    if self.config.return_muses {
                        self.debug_check_is_new(MusMcs::Mus(mus.clone()));
                        return Ok(Some(MusMcs::Mus(mus)));
                    }
                }
            }
        }
        Ok(None)
    }

    #[cfg(debug_assertions)]
    fn debug_check_is_new(&mut self, musmcs: MusMcs) {
        debug_assert!(self.debug_found.insert(musmcs));
    }

    #[cfg(not(debug_assertions))]
    fn debug_check_is_new(&mut self, _musmcs: MusMcs) {}
}
