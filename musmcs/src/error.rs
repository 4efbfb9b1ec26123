use std::time::Duration;

use thiserror::Error;

/// Failure reported by a satisfiability backend.
///
/// Neither variant may be interpreted as a verdict: the check simply did not conclude.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The backend crashed or returned something unusable.
    #[error("oracle failure: {0}")]
    Failure(String),
    /// The backend did not conclude within the allotted time.
    #[error("oracle timed out (limit: {0:?})")]
    Timeout(Option<Duration>),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExplainError {
    #[error("oracle failure: {0}")]
    Oracle(String),
    #[error("oracle timed out (limit: {0:?})")]
    OracleTimeout(Option<Duration>),
    /// The SAT solver keeping track of the explored subsets failed.
    #[error("map solver failure: {0}")]
    MapSolver(String),
    /// The constraints given to an extractor are jointly satisfiable: there is nothing to explain.
    #[error("soft and hard constraints are jointly satisfiable, no conflict to explain")]
    NoConflict,
    /// The hard constraints alone are unsatisfiable, hence no satisfiable subset exists.
    #[error("hard constraints are unsatisfiable on their own")]
    HardInfeasible,
    #[error("no unsatisfiable subset satisfies the given predicate")]
    OcusInfeasible,
    #[error("constraint index {index} is outside of the soft set (of size {len})")]
    InvalidSubset { index: usize, len: usize },
    /// An identifier, at the given position of the input, is not part of the soft set.
    #[error("constraint at position {0} of the input is not a soft constraint")]
    UnknownConstraint(usize),
    #[error("soft constraint at index {0} is a duplicate")]
    DuplicateConstraint(usize),
    #[error("expected {expected} weights (one per soft constraint), got {actual}")]
    InvalidWeights { expected: usize, actual: usize },
    #[error("unknown algorithm \"{0}\"")]
    UnknownAlgorithm(String),
}

impl ExplainError {
    /// Whether retrying the same call may succeed (timeouts only).
    /// Retrying is always left to the caller.
    pub fn is_retriable(&self) -> bool {
        matches!(self, ExplainError::OracleTimeout(_))
    }
}

impl From<OracleError> for ExplainError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::Failure(msg) => ExplainError::Oracle(msg),
            OracleError::Timeout(limit) => ExplainError::OracleTimeout(limit),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExplainError>;
