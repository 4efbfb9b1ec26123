//! Choice of the explanation algorithm by name.

use std::str::FromStr;

use derive_more::Display;

use crate::error::{ExplainError, Result};
use crate::marco::{all_mcs, all_mus};
use crate::mss::{mcs, mcs_naive, mcs_opt, mss, mss_naive, mss_opt};
use crate::mus::{mus, mus_naive, quickxplain_naive};
use crate::optimal::{ocus, ocus_naive, optimal_mus, optimal_mus_naive, smus};
use crate::oracle::Oracle;
use crate::subset::{Subset, Weights};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display)]
pub enum Algorithm {
    #[display("mus")]
    Mus,
    #[display("mus_naive")]
    MusNaive,
    #[display("quickxplain_naive")]
    QuickXplain,
    #[display("smus")]
    Smus,
    #[display("optimal_mus")]
    OptimalMus,
    #[display("optimal_mus_naive")]
    OptimalMusNaive,
    #[display("ocus")]
    Ocus,
    #[display("ocus_naive")]
    OcusNaive,
    #[display("mss")]
    Mss,
    #[display("mss_naive")]
    MssNaive,
    #[display("mss_opt")]
    MssOpt,
    #[display("mcs")]
    Mcs,
    #[display("mcs_naive")]
    McsNaive,
    #[display("mcs_opt")]
    McsOpt,
    #[display("all_mus")]
    AllMus,
    #[display("all_mcs")]
    AllMcs,
}

impl Algorithm {
    pub const ALL: [Algorithm; 16] = [
        Algorithm::Mus,
        Algorithm::MusNaive,
        Algorithm::QuickXplain,
        Algorithm::Smus,
        Algorithm::OptimalMus,
        Algorithm::OptimalMusNaive,
        Algorithm::Ocus,
        Algorithm::OcusNaive,
        Algorithm::Mss,
        Algorithm::MssNaive,
        Algorithm::MssOpt,
        Algorithm::Mcs,
        Algorithm::McsNaive,
        Algorithm::McsOpt,
        Algorithm::AllMus,
        Algorithm::AllMcs,
    ];
}

impl FromStr for Algorithm {
    type Err = ExplainError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        if name == "quickxplain" {
            return Ok(Algorithm::QuickXplain);
        }
        Algorithm::ALL
            .into_iter()
            .find(|algo| algo.to_string() == name)
            .ok_or_else(|| ExplainError::UnknownAlgorithm(s.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Explanation {
    Mus(Subset),
    Mss(Subset),
    Mcs(Subset),
    AllMus(Vec<Subset>),
    AllMcs(Vec<Subset>),
}

/// Explains the infeasibility of the soft constraints with the given algorithm.
///
/// `weights` are only used by the weighted algorithms and default to unit weights.
/// With `check`, the joint unsatisfiability of the soft constraints is verified first, and
/// `NoConflict` is returned if they are satisfiable, whatever the algorithm.
pub fn explain_unsat<O: Oracle + ?Sized>(
    oracle: &mut O,
    algorithm: Algorithm,
    weights: Option<&Weights>,
    check: bool,
) -> Result<Explanation> {
    if check && oracle.check(&Subset::full(oracle.num_soft()))?.is_sat() {
        return Err(ExplainError::NoConflict);
    }
    tracing::debug!("explaining with {}", algorithm);
    let unit;
    let weights = match weights {
        Some(weights) => weights,
        None => {
            unit = Weights::unit(oracle.num_soft());
            &unit
        }
    };
    let admit_all = |_: &Subset| true;

    let explanation = match algorithm {
        Algorithm::Mus => Explanation::Mus(mus(oracle)?),
        Algorithm::MusNaive => Explanation::Mus(mus_naive(oracle)?),
        Algorithm::QuickXplain => Explanation::Mus(quickxplain_naive(oracle)?),
        Algorithm::Smus => Explanation::Mus(smus(oracle)?),
        Algorithm::OptimalMus => Explanation::Mus(optimal_mus(oracle, Some(weights))?),
        Algorithm::OptimalMusNaive => Explanation::Mus(optimal_mus_naive(oracle, Some(weights))?),
        Algorithm::Ocus => Explanation::Mus(ocus(oracle, Some(weights), admit_all)?),
        Algorithm::OcusNaive => Explanation::Mus(ocus_naive(oracle, Some(weights), admit_all)?),
        Algorithm::Mss => Explanation::Mss(mss(oracle)?),
        Algorithm::MssNaive => Explanation::Mss(mss_naive(oracle)?),
        Algorithm::MssOpt => Explanation::Mss(mss_opt(oracle, weights)?),
        Algorithm::Mcs => Explanation::Mcs(mcs(oracle)?),
        Algorithm::McsNaive => Explanation::Mcs(mcs_naive(oracle)?),
        Algorithm::McsOpt => Explanation::Mcs(mcs_opt(oracle, weights)?),
        Algorithm::AllMus => Explanation::AllMus(all_mus(oracle, None)?),
        Algorithm::AllMcs => Explanation::AllMcs(all_mcs(oracle, None)?),
    };
    Ok(explanation)
}
