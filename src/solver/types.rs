//! Solver interface and outcome types.

use super::config::SolverConfig;
use crate::formulation::{Assignment, ConstraintSystem};
use std::time::Duration;

/// Status reported by a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// Optimal within the configured gap tolerances.
    Optimal,
    /// A feasible incumbent, not proven optimal before the time limit.
    FeasibleWithinTimeLimit,
    /// No assignment satisfies every constraint.
    Infeasible,
    /// The objective is unbounded.
    Unbounded,
    /// The time limit was reached without any feasible incumbent.
    NoSolutionWithinTimeLimit,
    /// Solver failure unrelated to feasibility.
    Error,
}

impl SolverStatus {
    /// Whether the status comes with an assignment.
    pub fn has_solution(self) -> bool {
        matches!(
            self,
            SolverStatus::Optimal | SolverStatus::FeasibleWithinTimeLimit
        )
    }
}

/// What a solver returns for one system.
#[derive(Debug, Clone)]
pub struct SolverOutcome {
    pub status: SolverStatus,
    /// A value for every variable; present iff `status.has_solution()`.
    pub assignment: Option<Assignment>,
    /// Objective value of `assignment`.
    pub objective_value: Option<i64>,
    /// Best proven lower bound on the objective, if known.
    pub best_bound: Option<i64>,
    pub solve_time: Duration,
    /// Free-form detail, e.g. the reason for an `Error` status.
    pub message: Option<String>,
}

impl SolverOutcome {
    /// An outcome without an assignment.
    pub fn empty(status: SolverStatus) -> Self {
        Self {
            status,
            assignment: None,
            objective_value: None,
            best_bound: None,
            solve_time: Duration::ZERO,
            message: None,
        }
    }

    /// An `Error` outcome carrying `message`.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::empty(SolverStatus::Error)
        }
    }

    pub fn with_solve_time(mut self, elapsed: Duration) -> Self {
        self.solve_time = elapsed;
        self
    }

    pub fn has_solution(&self) -> bool {
        self.status.has_solution() && self.assignment.is_some()
    }

    pub fn is_proven_optimal(&self) -> bool {
        self.status == SolverStatus::Optimal
    }
}

/// A backend that optimizes a [`ConstraintSystem`].
///
/// Implementations may wrap external MILP binaries or search the
/// schedule space directly; either way the returned assignment must
/// satisfy every row of the system.
pub trait Solver {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Solves `system`, blocking until a status is available.
    fn solve(&self, system: &ConstraintSystem, config: &SolverConfig) -> SolverOutcome;
}
