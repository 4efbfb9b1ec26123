//! Optimal unsatisfiable subsets, by implicit hitting set duality.
//!
//! Every unsatisfiable subset intersects every correction set (complement of a satisfiable
//! subset). Hence a minimum-weight hitting set of the correction sets found so far is a lower
//! bound on the weight of any unsatisfiable subset, and as soon as such a hitting set is itself
//! UNSAT, it is optimal. When it is SAT, its satisfied set is grown and the complement is a
//! new correction set that it does not hit.
//!
//! - [`smus`]: smallest MUS (unit weights).
//! - [`optimal_mus`]: minimum-weight MUS.
//! - [`ocus`]: minimum-weight unsatisfiable subset among those accepted by a predicate
//!   (Optimal Constrained Unsatisfiable Subset).

mod hitting_set;

pub use hitting_set::{BranchAndBound, CostOrdered, HittingSetSolver};

use itertools::Itertools;

use crate::config::ExplainConfig;
use crate::error::{ExplainError, Result};
use crate::mss::grow;
use crate::mus::shrink;
use crate::oracle::{Oracle, Verdict};
use crate::subset::{Subset, Weights};
use hitting_set::SubsetsByCost;

/// Smallest (cardinality-minimal) MUS.
pub fn smus<O: Oracle + ?Sized>(oracle: &mut O) -> Result<Subset> {
    let _span = tracing::span!(tracing::Level::DEBUG, "SMUS").entered();
    let weights = Weights::unit(oracle.num_soft());
    let res = ocus_with(oracle, &weights, |_| true, &mut BranchAndBound::new(), &ExplainConfig::from_env())?;
    tracing::debug!("SMUS of size {}: {}", res.len(), res);
    Ok(res)
}

/// Minimum-weight MUS (SMUS if no weights are given).
///
/// Zero-weight members that are not needed for unsatisfiability are removed from the result,
/// which is thus always subset-minimal.
pub fn optimal_mus<O: Oracle + ?Sized>(oracle: &mut O, weights: Option<&Weights>) -> Result<Subset> {
    let weights = resolve_weights(oracle, weights)?;
    let _span = tracing::span!(tracing::Level::DEBUG, "OPTIMAL MUS").entered();
    let res = ocus_with(oracle, &weights, |_| true, &mut BranchAndBound::new(), &ExplainConfig::from_env())?;
    drop_free_members(oracle, res, &weights)
}

/// Minimum-weight unsatisfiable subset accepted by `predicate`.
///
/// The result is not necessarily subset-minimal, since the predicate may reject all
/// of its subsets. Fails with `OcusInfeasible` if no unsatisfiable subset is accepted.
pub fn ocus<O, P>(oracle: &mut O, weights: Option<&Weights>, predicate: P) -> Result<Subset>
where
    O: Oracle + ?Sized,
    P: Fn(&Subset) -> bool,
{
    let weights = resolve_weights(oracle, weights)?;
    ocus_with(oracle, &weights, predicate, &mut BranchAndBound::new(), &ExplainConfig::from_env())
}

/// The implicit hitting set loop, with a caller-provided hitting set optimiser.
pub fn ocus_with<O, P, H>(
    oracle: &mut O,
    weights: &Weights,
    predicate: P,
    hitting_set_solver: &mut H,
    config: &ExplainConfig,
) -> Result<Subset>
where
    O: Oracle + ?Sized,
    P: Fn(&Subset) -> bool,
    H: HittingSetSolver + ?Sized,
{
    check_weights(oracle, weights)?;
    let _span = tracing::span!(tracing::Level::DEBUG, "OCUS").entered();
    let n = oracle.num_soft();
    if oracle.check(&Subset::full(n))?.is_sat() {
        return Err(ExplainError::NoConflict);
    }
    let use_witness = oracle.supports_assumptions();
    let grow_order = weights.order_by_decreasing_weight();
    let mut correction_sets: Vec<Subset> = Vec::new();

    loop {
        let Some(candidate) = hitting_set_solver.solve(&correction_sets, weights, &predicate) else {
            tracing::debug!("no admissible hitting set of {} correction sets", correction_sets.len());
            return Err(ExplainError::OcusInfeasible);
        };
        tracing::trace!(
            "iteration {}: hitting set {} of weight {}",
            correction_sets.len(),
            candidate,
            candidate.weight(weights)
        );

        match oracle.check(&candidate)? {
            Verdict::Unsat { .. } => {
                tracing::debug!(
                    "optimal subset {} of weight {} after {} iterations",
                    candidate,
                    candidate.weight(weights),
                    correction_sets.len() + 1
                );
                return Ok(candidate);
            }
            Verdict::Sat { satisfied } => {
                let satisfied = satisfied.unwrap_or(candidate);
                let satisfied = if config.grow_correction_sets {
                    grow(oracle, satisfied, &grow_order, use_witness)?
                } else {
                    satisfied
                };
                let correction_set = satisfied.complement();
                if correction_set.is_empty() {
                    // the oracle reported the full soft set as both SAT and UNSAT
                    return Err(ExplainError::NoConflict);
                }
                correction_sets.push(correction_set);
            }
        }
    }
}

/// Minimum-weight MUS by enumerating subsets of non-decreasing weight.
///
/// Does not need a hitting set optimiser but is exponential in the size of the result.
pub fn optimal_mus_naive<O: Oracle + ?Sized>(oracle: &mut O, weights: Option<&Weights>) -> Result<Subset> {
    let weights = resolve_weights(oracle, weights)?;
    let _span = tracing::span!(tracing::Level::DEBUG, "OPTIMAL MUS (naive)").entered();
    let res = enumerate_by_cost(oracle, &weights, |_| true)?;
    drop_free_members(oracle, res, &weights)
}

/// [`ocus`] by enumerating subsets of non-decreasing weight. See [`optimal_mus_naive`].
pub fn ocus_naive<O, P>(oracle: &mut O, weights: Option<&Weights>, predicate: P) -> Result<Subset>
where
    O: Oracle + ?Sized,
    P: Fn(&Subset) -> bool,
{
    let weights = resolve_weights(oracle, weights)?;
    let _span = tracing::span!(tracing::Level::DEBUG, "OCUS (naive)").entered();
    enumerate_by_cost(oracle, &weights, predicate)
}

/// The first admissible UNSAT subset in order of non-decreasing weight.
/// Candidates that miss a correction set learnt from a previous SAT candidate are skipped
/// without an oracle call.
fn enumerate_by_cost<O, P>(oracle: &mut O, weights: &Weights, predicate: P) -> Result<Subset>
where
    O: Oracle + ?Sized,
    P: Fn(&Subset) -> bool,
{
    if oracle.check(&Subset::full(oracle.num_soft()))?.is_sat() {
        return Err(ExplainError::NoConflict);
    }
    let mut correction_sets: Vec<Subset> = Vec::new();
    for (cost, candidate) in SubsetsByCost::new(weights) {
        if !candidate.hits_all(&correction_sets) || !predicate(&candidate) {
            continue;
        }
        match oracle.check(&candidate)? {
            Verdict::Unsat { .. } => {
                tracing::debug!("optimal subset {} of weight {}", candidate, cost);
                return Ok(candidate);
            }
            Verdict::Sat { satisfied } => {
                correction_sets.push(satisfied.unwrap_or(candidate).complement());
            }
        }
    }
    Err(ExplainError::OcusInfeasible)
}

/// Removes the zero-weight members that are not necessary for unsatisfiability.
/// Members of positive weight are all necessary, as the subset is of minimal weight.
fn drop_free_members<O: Oracle + ?Sized>(oracle: &mut O, unsat: Subset, weights: &Weights) -> Result<Subset> {
    let free = unsat.iter().filter(|&i| weights.weight(i) == 0).collect_vec();
    if free.is_empty() {
        return Ok(unsat);
    }
    let mut necessary = unsat.clone();
    for i in free {
        necessary.remove(i);
    }
    let use_cores = oracle.supports_assumptions();
    let mus = shrink(oracle, unsat, use_cores, Some(&necessary))?;
    tracing::debug!("MUS {} of weight {}", mus, mus.weight(weights));
    Ok(mus)
}

fn resolve_weights<O: Oracle + ?Sized>(oracle: &O, weights: Option<&Weights>) -> Result<Weights> {
    let weights = weights.cloned().unwrap_or_else(|| Weights::unit(oracle.num_soft()));
    check_weights(oracle, &weights)?;
    Ok(weights)
}

fn check_weights<O: Oracle + ?Sized>(oracle: &O, weights: &Weights) -> Result<()> {
    if weights.len() != oracle.num_soft() {
        return Err(ExplainError::InvalidWeights {
            expected: oracle.num_soft(),
            actual: weights.len(),
        });
    }
    Ok(())
}
