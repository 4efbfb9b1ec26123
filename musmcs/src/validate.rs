//! Re-checks of minimality / maximality against the oracle.
//!
//! These are meant for tests and debug assertions: each takes O(n) oracle calls.

use crate::error::{ExplainError, Result};
use crate::oracle::{Oracle, Verdict};
use crate::subset::Subset;

/// Whether `subset` is UNSAT and every subset obtained by removing one member is SAT.
///
/// The empty subset is a MUS exactly when the hard constraints are UNSAT on their own.
pub fn is_mus<O: Oracle + ?Sized>(oracle: &mut O, subset: &Subset) -> Result<bool> {
    check_universe(oracle, subset)?;
    if oracle.check(subset)?.is_sat() {
        return Ok(false);
    }
    let mut reduced = subset.clone();
    for lit in subset.iter() {
        reduced.remove(lit);
        let sat = oracle.check(&reduced)?.is_sat();
        reduced.insert(lit);
        if !sat {
            tracing::debug!("{} is not minimal: still UNSAT without {}", subset, lit);
            return Ok(false);
        }
    }
    Ok(true)
}

/// Whether `subset` is SAT and adding any other soft constraint makes it UNSAT.
pub fn is_mss<O: Oracle + ?Sized>(oracle: &mut O, subset: &Subset) -> Result<bool> {
    check_universe(oracle, subset)?;
    match oracle.check(subset)? {
        Verdict::Unsat { .. } => return Ok(false),
        Verdict::Sat {
            satisfied: Some(satisfied),
        } if satisfied.len() > subset.len() => {
            // the witness satisfies a strictly larger subset
            return Ok(false);
        }
        Verdict::Sat { .. } => {}
    }
    let mut extended = subset.clone();
    for lit in subset.complement().iter() {
        extended.insert(lit);
        let sat = oracle.check(&extended)?.is_sat();
        extended.remove(lit);
        if sat {
            tracing::debug!("{} is not maximal: still SAT with {}", subset, lit);
            return Ok(false);
        }
    }
    Ok(true)
}

/// Whether `subset` is the complement of an MSS.
pub fn is_mcs<O: Oracle + ?Sized>(oracle: &mut O, subset: &Subset) -> Result<bool> {
    check_universe(oracle, subset)?;
    is_mss(oracle, &subset.complement())
}

fn check_universe<O: Oracle + ?Sized>(oracle: &O, subset: &Subset) -> Result<()> {
    let n = oracle.num_soft();
    if subset.universe() != n {
        // report the first index that does not exist in the smaller universe
        return Err(ExplainError::InvalidSubset {
            index: subset.universe().min(n),
            len: n,
        });
    }
    Ok(())
}
