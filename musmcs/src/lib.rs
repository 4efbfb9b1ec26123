//! Explanations of the infeasibility of constraint problems.
//!
//! Given soft constraints that are jointly unsatisfiable (possibly together with hard
//! constraints that always hold), this crate computes:
//!  - Minimal Unsatisfiable Subsets (MUS): minimal conflicts, see [`mus`], [`quickxplain`] and the
//!    optimal variants [`smus`], [`optimal_mus`] and [`ocus`];
//!  - Maximal Satisfiable Subsets (MSS) and their complements, Minimal Correction Sets (MCS):
//!    minimal repairs, see [`mss`] and [`mcs`];
//!  - all of them, with the MARCO enumeration ([`marco()`]).
//!
//! Algorithms only talk to a satisfiability [`Oracle`] over indices of the soft constraints.
//! Solvers are plugged in through [`Backend`] or [`AssumptionBackend`], wrapped in
//! [`FullResolve`] or [`AssumptionOracle`].

pub mod config;
pub mod error;
pub mod explain;
pub mod marco;
pub mod mss;
pub mod mus;
pub mod optimal;
pub mod oracle;
pub mod subset;
pub mod validate;

#[cfg(test)]
mod fixtures;

pub use error::{ExplainError, OracleError, Result};
pub use explain::{explain_unsat, Algorithm, Explanation};
pub use marco::{
    all_mcs, all_mus, marco, marco_naive, MapSolverMode, Marco, MarcoConfig, MusMcs, MusMcsEnumerationResult,
    SubsetSolverOptiMode,
};
pub use mss::{mcs, mcs_from_mss, mcs_naive, mcs_opt, mss, mss_naive, mss_opt};
pub use mus::{mus, mus_naive, quickxplain, quickxplain_naive};
pub use optimal::{ocus, ocus_naive, ocus_with, optimal_mus, optimal_mus_naive, smus};
pub use oracle::{
    AssumptionBackend, AssumptionOracle, Backend, Core, FullResolve, Oracle, OracleStats, Verdict, Witness,
};
pub use subset::{SoftIdx, SoftSet, Subset, Weight, Weights};
pub use validate::{is_mcs, is_mss, is_mus};
