use std::time::Duration;

use crate::error::OracleError;

/// A satisfying assignment found by a backend.
pub trait Witness<C> {
    /// Whether the assignment satisfies the given constraint.
    fn satisfies(&self, constraint: &C) -> bool;
}

/// A solver able to decide the satisfiability of a conjunction of constraints.
pub trait Backend<C> {
    type Witness: Witness<C>;

    /// Solves the conjunction of `constraints` from scratch.
    /// Returns a witness if satisfiable, `None` if unsatisfiable.
    ///
    /// If `timeout` is set and the search exceeds it, the backend must return [`OracleError::Timeout`].
    fn solve(&mut self, constraints: &[&C], timeout: Option<Duration>) -> Result<Option<Self::Witness>, OracleError>;
}

/// A solver that can additionally take constraints as assumptions and explain unsatisfiability.
pub trait AssumptionBackend<C>: Backend<C> {
    /// Solves `hard` with the `assumptions` activated.
    ///
    /// - If SAT: `Ok(Ok(witness))`.
    /// - If UNSAT: `Ok(Err(core))` where `core` holds positions in `assumptions` of constraints
    ///   that are, together with `hard`, already unsatisfiable.
    fn solve_assuming(
        &mut self,
        hard: &[&C],
        assumptions: &[&C],
        timeout: Option<Duration>,
    ) -> Result<Result<Self::Witness, Vec<usize>>, OracleError>;

    /// Whether returned cores are guaranteed to be subset-minimal.
    fn cores_are_minimal(&self) -> bool {
        false
    }
}
