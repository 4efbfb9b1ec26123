//! Extraction of a single Minimal Unsatisfiable Subset (MUS).
//!
//! A MUS is a subset of the soft constraints that is unsatisfiable together with the hard
//! constraints, and such that removing any of its members makes it satisfiable.
//!
//! An empty MUS is a legitimate result: it means that the hard constraints are unsatisfiable on
//! their own, and no soft constraint takes part in the conflict.

use itertools::Itertools;

use crate::error::{ExplainError, Result};
use crate::oracle::{Core, Oracle, Verdict};
use crate::subset::{SoftIdx, Subset};

/// Deletion-based MUS, re-checking the full subset after each tentative removal.
///
/// Soft constraints are tried for removal in input order, each exactly once: O(n) oracle calls.
/// Fails with `NoConflict` if the soft constraints are jointly satisfiable with the hard ones.
pub fn mus_naive<O: Oracle + ?Sized>(oracle: &mut O) -> Result<Subset> {
    let _span = tracing::span!(tracing::Level::DEBUG, "MUS (naive)").entered();
    let all = Subset::full(oracle.num_soft());
    if oracle.check(&all)?.is_sat() {
        return Err(ExplainError::NoConflict);
    }
    let mus = shrink(oracle, all, false, None)?;
    report(&mus);
    Ok(mus)
}

/// Assumption-based MUS: a first check over all soft constraints yields a core, which is
/// then shrunk by deletion (using the cores of each subsequent UNSAT check to skip ahead).
///
/// Falls back to [`mus_naive`] if the oracle does not support assumptions.
pub fn mus<O: Oracle + ?Sized>(oracle: &mut O) -> Result<Subset> {
    if !oracle.supports_assumptions() {
        tracing::debug!("oracle does not support assumptions, using naive MUS extraction");
        return mus_naive(oracle);
    }
    let _span = tracing::span!(tracing::Level::DEBUG, "MUS").entered();
    let all = Subset::full(oracle.num_soft());
    let mus = match oracle.check(&all)? {
        Verdict::Sat { .. } => return Err(ExplainError::NoConflict),
        Verdict::Unsat {
            core: Some(Core { members, minimal: true }),
        } => members,
        Verdict::Unsat { core: Some(core) } => shrink(oracle, core.members, true, None)?,
        Verdict::Unsat { core: None } => shrink(oracle, all, true, None)?,
    };
    report(&mus);
    Ok(mus)
}

/// QuickXplain, with the soft constraints preferred in input order.
///
/// See [`quickxplain`].
pub fn quickxplain_naive<O: Oracle + ?Sized>(oracle: &mut O) -> Result<Subset> {
    let preference = (0..oracle.num_soft()).collect_vec();
    quickxplain(oracle, &preference)
}

/// Preferred MUS by the QuickXplain divide-and-conquer algorithm (Junker, 2004).
///
/// `preference` lists the soft constraints considered, most preferred first (i.e. least willing
/// to remove). Among the MUSes of these constraints, the one returned avoids the least preferred
/// constraints: its latest member in `preference` is as early as possible, then recursively.
/// Takes O(k.log(n/k)) oracle calls where k is the size of the result.
///
/// The result only depends on the preference order and on the satisfiability of the checked
/// subsets, so repeated calls return the same MUS.
pub fn quickxplain<O: Oracle + ?Sized>(oracle: &mut O, preference: &[SoftIdx]) -> Result<Subset> {
    let _span = tracing::span!(tracing::Level::DEBUG, "QUICKXPLAIN").entered();
    let n = oracle.num_soft();
    let considered = Subset::from_indices(n, preference.iter().copied())?;
    if considered.len() != preference.len() {
        let pos = preference
            .iter()
            .duplicates()
            .next()
            .and_then(|dup| preference.iter().rposition(|x| x == dup));
        return Err(ExplainError::DuplicateConstraint(pos.unwrap_or(0)));
    }
    if oracle.check(&considered)?.is_sat() {
        return Err(ExplainError::NoConflict);
    }
    let empty = Subset::empty(n);
    if oracle.check(&empty)?.is_unsat() {
        tracing::warn!("hard constraints are unsatisfiable on their own");
        return Ok(empty);
    }
    let mus = quickxplain_rec(oracle, &empty, false, preference)?;
    report(&mus);
    Ok(mus)
}

/// Returns a minimal subset of `constraints` that is unsatisfiable together with `background`.
///
/// Requires `background ∪ constraints` to be UNSAT and `constraints` to be non-empty.
/// `background_changed` tells whether constraints were added to the background since the last
/// check, in which case the background alone may already be UNSAT.
fn quickxplain_rec<O: Oracle + ?Sized>(
    oracle: &mut O,
    background: &Subset,
    background_changed: bool,
    constraints: &[SoftIdx],
) -> Result<Subset> {
    debug_assert!(!constraints.is_empty());
    if background_changed && oracle.check(background)?.is_unsat() {
        return Ok(Subset::empty(background.universe()));
    }
    if let [single] = constraints {
        return Subset::from_indices(background.universe(), [*single]);
    }

    let (preferred, others) = constraints.split_at(constraints.len() / 2);

    let mut with_preferred = background.clone();
    for &i in preferred {
        with_preferred.insert(i);
    }
    let delta2 = quickxplain_rec(oracle, &with_preferred, true, others)?;
    let delta1 = quickxplain_rec(oracle, &background.union(&delta2), !delta2.is_empty(), preferred)?;
    Ok(delta1.union(&delta2))
}

/// Finds a MUS by deleting members of `unsat_subset` (in increasing index order) until deleting
/// any more leads to SAT.
///
/// - With `use_cores`, the core of an UNSAT check replaces the current set, skipping the deletion
///   of all members outside of the core.
/// - Members of `skip` are known to belong to every MUS (e.g. singleton MCSes): their deletion is
///   not even tried.
pub(crate) fn shrink<O: Oracle + ?Sized>(
    oracle: &mut O,
    unsat_subset: Subset,
    use_cores: bool,
    skip: Option<&Subset>,
) -> Result<Subset> {
    let candidates = unsat_subset.iter().collect_vec();
    let mut current = unsat_subset;

    for lit in candidates {
        if !current.contains(lit) || skip.is_some_and(|s| s.contains(lit)) {
            continue;
        }
        current.remove(lit);
        match oracle.check(&current)? {
            Verdict::Unsat { core } => {
                if let Some(core) = core.filter(|_| use_cores) {
                    debug_assert!(core.members.is_subset(&current));
                    current = core.members.intersection(&current);
                }
            }
            Verdict::Sat { .. } => {
                debug_assert!(!current.contains(lit));
                current.insert(lit);
            }
        }
    }
    Ok(current)
}

fn report(mus: &Subset) {
    if mus.is_empty() {
        tracing::warn!("hard constraints are unsatisfiable on their own: empty MUS");
    } else {
        tracing::debug!("MUS of size {}: {}", mus.len(), mus);
    }
}
