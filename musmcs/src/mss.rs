//! Maximal Satisfiable Subsets (MSS) and their complements, Minimal Correction Sets (MCS).
//!
//! All builders grow a satisfiable subset greedily. The order in which soft constraints are
//! considered decides which of the (many) MSSes is found.

use itertools::Itertools;

use crate::error::{ExplainError, Result};
use crate::oracle::{Oracle, Verdict};
use crate::subset::{SoftIdx, Subset, Weights};

/// Greedy MSS: soft constraints are added in input order and kept if the result is still SAT.
pub fn mss_naive<O: Oracle + ?Sized>(oracle: &mut O) -> Result<Subset> {
    let _span = tracing::span!(tracing::Level::DEBUG, "MSS (naive)").entered();
    let order = (0..oracle.num_soft()).collect_vec();
    greedy_mss(oracle, &order, false)
}

/// Greedy MSS exploiting the witnesses of SAT checks: any constraint satisfied by a witness
/// is added without a dedicated check.
///
/// Falls back to [`mss_naive`] if the oracle does not support assumptions.
pub fn mss<O: Oracle + ?Sized>(oracle: &mut O) -> Result<Subset> {
    if !oracle.supports_assumptions() {
        tracing::debug!("oracle does not support assumptions, using naive MSS construction");
        return mss_naive(oracle);
    }
    let _span = tracing::span!(tracing::Level::DEBUG, "MSS").entered();
    let order = (0..oracle.num_soft()).collect_vec();
    greedy_mss(oracle, &order, true)
}

/// Greedy MSS considering soft constraints by decreasing weight (ties in input order),
/// so that heavier constraints are preferentially kept.
///
/// The result is subset-maximal but not necessarily of maximal weight.
/// Witnesses are ignored here: absorbing light constraints satisfied by chance could
/// exclude heavier ones considered later.
pub fn mss_opt<O: Oracle + ?Sized>(oracle: &mut O, weights: &Weights) -> Result<Subset> {
    check_weights(oracle, weights)?;
    let _span = tracing::span!(tracing::Level::DEBUG, "MSS (weighted)").entered();
    greedy_mss(oracle, &weights.order_by_decreasing_weight(), false)
}

/// The MCS complementing [`mss_naive`].
pub fn mcs_naive<O: Oracle + ?Sized>(oracle: &mut O) -> Result<Subset> {
    mss_naive(oracle).map(|mss| mcs_from_mss(&mss))
}

/// The MCS complementing [`mss`].
pub fn mcs<O: Oracle + ?Sized>(oracle: &mut O) -> Result<Subset> {
    mss(oracle).map(|mss| mcs_from_mss(&mss))
}

/// The MCS complementing [`mss_opt`]: light constraints are preferentially removed.
pub fn mcs_opt<O: Oracle + ?Sized>(oracle: &mut O, weights: &Weights) -> Result<Subset> {
    mss_opt(oracle, weights).map(|mss| mcs_from_mss(&mss))
}

/// The complement of an MSS within the soft set. No oracle call.
pub fn mcs_from_mss(mss: &Subset) -> Subset {
    mss.complement()
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

fn greedy_mss<O: Oracle + ?Sized>(oracle: &mut O, order: &[SoftIdx], use_witness: bool) -> Result<Subset> {
    let n = oracle.num_soft();
    let all = Subset::full(n);
    if oracle.check(&all)?.is_sat() {
        tracing::debug!("all soft constraints are jointly satisfiable");
        return Ok(all);
    }

    let start = if use_witness {
        match oracle.check(&Subset::empty(n))? {
            Verdict::Unsat { .. } => return Err(ExplainError::HardInfeasible),
            Verdict::Sat { satisfied } => satisfied.unwrap_or_else(|| Subset::empty(n)),
        }
    } else {
        Subset::empty(n)
    };
    let mss = grow(oracle, start, order, use_witness)?;

    // without witnesses, the empty set was never checked on its own
    if mss.is_empty() && !use_witness && oracle.check(&mss)?.is_unsat() {
        return Err(ExplainError::HardInfeasible);
    }
    tracing::debug!("MSS of size {}: {}", mss.len(), mss);
    Ok(mss)
}

/// Extends the satisfiable subset `sat_subset` into an MSS, trying the constraints in `order`.
///
/// With `use_witness`, the satisfied set reported on each SAT check replaces the current set,
/// skipping the checks of all constraints it contains.
pub(crate) fn grow<O: Oracle + ?Sized>(
    oracle: &mut O,
    sat_subset: Subset,
    order: &[SoftIdx],
    use_witness: bool,
) -> Result<Subset> {
    let mut current = sat_subset;
    for &lit in order {
        if current.contains(lit) {
            continue;
        }
        current.insert(lit);
        match oracle.check(&current)? {
            Verdict::Sat {
                satisfied: Some(satisfied),
            } if use_witness => {
                debug_assert!(satisfied.is_superset(&current));
                current = satisfied;
            }
            Verdict::Sat { .. } => {}
            Verdict::Unsat { .. } => current.remove(lit),
        }
    }
    Ok(current)
}
