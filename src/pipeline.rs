//! Formulate, solve and decode in one call.
//!
//! Solver statuses map onto [`SolveError`] unchanged and nothing is retried.
//! The assignment is decoded only when the solver reports a solution.

use crate::decode::{decode, Schedule};
use crate::error::SolveError;
use crate::formulation::{FormulationOptions, Formulator};
use crate::instance::ProjectInstance;
use crate::solver::{Solver, SolverConfig, SolverStatus};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A decoded schedule and how it was obtained.
#[derive(Debug, Clone)]
pub struct Solved {
    pub schedule: Schedule,
    /// The solver's objective value.
    pub makespan: u32,
    pub status: SolverStatus,
    /// `false` when the time limit cut the search short.
    pub proven_optimal: bool,
    pub solve_time: Duration,
}

/// Solves `instance` with the default formulation.
pub fn solve_instance<S: Solver + ?Sized>(
    instance: &ProjectInstance,
    solver: &S,
    config: &SolverConfig,
) -> Result<Solved, SolveError> {
    solve_with_options(instance, FormulationOptions::default(), solver, config)
}

/// Solves `instance` formulated with `options`.
///
/// # Errors
///
/// - [`SolveError::Config`] if `config` is invalid; the solver is not called
/// - [`SolveError::Infeasible`], [`SolveError::Unbounded`],
///   [`SolveError::TimeLimit`] and [`SolveError::Solver`] for the matching
///   solver statuses
/// - [`SolveError::Decode`] if the returned assignment is not a schedule
pub fn solve_with_options<S: Solver + ?Sized>(
    instance: &ProjectInstance,
    options: FormulationOptions,
    solver: &S,
    config: &SolverConfig,
) -> Result<Solved, SolveError> {
    config.validate()?;

    let system = Formulator::new(instance).with_options(options).build();
    info!(
        solver = solver.name(),
        jobs = instance.job_count(),
        variables = system.variable_count(),
        constraints = system.constraint_count(),
        "solving"
    );

    let outcome = solver.solve(&system, config);
    debug!(status = ?outcome.status, objective = ?outcome.objective_value, elapsed = ?outcome.solve_time, "solver returned");

    let assignment = match outcome.status {
        SolverStatus::Optimal | SolverStatus::FeasibleWithinTimeLimit => {
            outcome.assignment.as_ref().ok_or_else(|| {
                SolveError::Solver(format!(
                    "{} reported {:?} without an assignment",
                    solver.name(),
                    outcome.status
                ))
            })?
        }
        SolverStatus::Infeasible => return Err(SolveError::Infeasible),
        SolverStatus::Unbounded => return Err(SolveError::Unbounded),
        SolverStatus::NoSolutionWithinTimeLimit => {
            return Err(SolveError::TimeLimit {
                seconds: config.time_limit_seconds,
            })
        }
        SolverStatus::Error => {
            let message = outcome
                .message
                .clone()
                .unwrap_or_else(|| format!("{} failed", solver.name()));
            warn!(%message, "solver error");
            return Err(SolveError::Solver(message));
        }
    };

    let schedule = decode(&system, assignment)?;
    let objective = outcome
        .objective_value
        .unwrap_or_else(|| system.objective_value(assignment));
    if objective != i64::from(schedule.makespan) {
        return Err(SolveError::Solver(format!(
            "objective {objective} does not match decoded makespan {}",
            schedule.makespan
        )));
    }

    let proven_optimal = outcome.is_proven_optimal();
    info!(
        makespan = schedule.makespan,
        proven_optimal,
        elapsed = ?outcome.solve_time,
        "solved"
    );

    Ok(Solved {
        makespan: schedule.makespan,
        schedule,
        status: outcome.status,
        proven_optimal,
        solve_time: outcome.solve_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::formulation::{Assignment, ConstraintSystem};
    use crate::instance::{InstanceBuilder, ResourceKind};
    use crate::solver::{SearchSolver, SolverOutcome};

    fn chain(horizon: u32) -> ProjectInstance {
        InstanceBuilder::new(horizon)
            .with_resource("R1", ResourceKind::Renewable, 100)
            .with_resource("NR1", ResourceKind::NonRenewable, 100)
            .with_mode("M1")
            .with_job("J1")
            .with_job("J2")
            .with_job("J3")
            .with_mode_spec("J1", "M1", 2, [("R1", 3), ("NR1", 5)])
            .with_mode_spec("J2", "M1", 3, [("R1", 3), ("NR1", 5)])
            .with_mode_spec("J3", "M1", 4, [("R1", 3), ("NR1", 5)])
            .with_precedence("J1", "J2")
            .with_precedence("J2", "J3")
            .build()
            .unwrap()
    }

    /// Returns a fixed outcome regardless of the system.
    struct Canned(SolverOutcome);

    impl Solver for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        fn solve(&self, _system: &ConstraintSystem, _config: &SolverConfig) -> SolverOutcome {
            self.0.clone()
        }
    }

    #[test]
    fn test_solve_chain() {
        let solved = solve_instance(&chain(9), &SearchSolver::new(), &SolverConfig::default()).unwrap();
        assert_eq!(solved.makespan, 9);
        assert!(solved.proven_optimal);
        assert_eq!(solved.status, SolverStatus::Optimal);
        let starts: Vec<u32> = solved.schedule.jobs.iter().map(|j| j.start.0).collect();
        assert_eq!(starts, vec![1, 3, 6]);
    }

    #[test]
    fn test_solve_chain_infeasible() {
        let err = solve_instance(&chain(8), &SearchSolver::new(), &SolverConfig::default()).unwrap_err();
        assert_eq!(err, SolveError::Infeasible);
    }

    #[test]
    fn test_dyn_solver() {
        let solver: Box<dyn Solver> = Box::new(SearchSolver::new());
        let solved = solve_instance(&chain(10), solver.as_ref(), &SolverConfig::default()).unwrap();
        assert_eq!(solved.makespan, 9);
    }

    #[test]
    fn test_invalid_config() {
        let config = SolverConfig::default().with_time_limit_seconds(0);
        let err = solve_instance(&chain(9), &SearchSolver::new(), &config).unwrap_err();
        assert_eq!(err, SolveError::Config(ConfigError::ZeroTimeLimit));
    }

    #[test]
    fn test_statuses_propagate() {
        let inst = chain(9);
        let config = SolverConfig::default().with_time_limit_seconds(5);
        let cases = [
            (SolverStatus::Unbounded, SolveError::Unbounded),
            (SolverStatus::NoSolutionWithinTimeLimit, SolveError::TimeLimit { seconds: 5 }),
            (SolverStatus::Infeasible, SolveError::Infeasible),
        ];
        for (status, expected) in cases {
            let err = solve_instance(&inst, &Canned(SolverOutcome::empty(status)), &config).unwrap_err();
            assert_eq!(err, expected);
        }

        let err = solve_instance(&inst, &Canned(SolverOutcome::error("license expired")), &config)
            .unwrap_err();
        assert_eq!(err, SolveError::Solver("license expired".into()));
    }

    #[test]
    fn test_bad_assignment_is_decode_error() {
        let inst = chain(9);
        let len = Formulator::new(&inst).build().variable_count();
        let outcome = SolverOutcome {
            assignment: Some(Assignment::zeros(len)),
            objective_value: Some(0),
            ..SolverOutcome::empty(SolverStatus::Optimal)
        };
        let err = solve_instance(&inst, &Canned(outcome), &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, SolveError::Decode(_)));
    }

    #[test]
    fn test_feasible_within_time_limit_is_not_optimal() {
        let inst = chain(9);
        let optimal = SearchSolver::new()
            .solve(&Formulator::new(&inst).build(), &SolverConfig::default());
        let outcome = SolverOutcome {
            status: SolverStatus::FeasibleWithinTimeLimit,
            ..optimal
        };
        let solved = solve_instance(&inst, &Canned(outcome), &SolverConfig::default()).unwrap();
        assert!(!solved.proven_optimal);
        assert_eq!(solved.status, SolverStatus::FeasibleWithinTimeLimit);
    }

    #[test]
    fn test_objective_mismatch() {
        let inst = chain(9);
        let optimal = SearchSolver::new()
            .solve(&Formulator::new(&inst).build(), &SolverConfig::default());
        let outcome = SolverOutcome {
            objective_value: Some(7),
            ..optimal
        };
        let err = solve_instance(&inst, &Canned(outcome), &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, SolveError::Solver(_)));
    }
}
