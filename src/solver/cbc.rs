//! COIN-OR CBC adapter.
//!
//! Writes the system as an LP file into a temporary directory, runs the
//! `cbc` binary on it and reads back the solution file.

use super::config::SolverConfig;
use super::lp::{lp_name, write_lp};
use super::types::{Solver, SolverOutcome, SolverStatus};
use crate::formulation::{Assignment, ConstraintSystem, VarId};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;
use tracing::{debug, warn};

/// Largest distance from an integer still accepted as that integer.
const INTEGRALITY_TOLERANCE: f64 = 1e-5;

/// Objective values at or above this mean "no solution" in CBC output.
const NO_SOLUTION_OBJECTIVE: f64 = 1e49;

/// Runs the external `cbc` binary.
///
/// The configuration maps onto CBC's `sec`, `allow`, `ratio` and `primalT`
/// parameters.
#[derive(Debug, Clone)]
pub struct CbcSolver {
    binary: PathBuf,
    extra_args: Vec<String>,
}

impl CbcSolver {
    /// Uses `cbc` from `PATH`.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("cbc"),
            extra_args: Vec::new(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Appends a raw CBC argument, passed before `solve`.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    fn arguments(&self, config: &SolverConfig) -> Vec<String> {
        let mut args = vec![
            "sec".to_string(),
            config.time_limit_seconds.to_string(),
            "allow".to_string(),
            config.absolute_gap.to_string(),
            "ratio".to_string(),
            config.relative_gap.to_string(),
            "primalT".to_string(),
            config.numeric_tolerance.to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }

    fn run(&self, system: &ConstraintSystem, config: &SolverConfig) -> Result<SolverOutcome, String> {
        let dir = tempfile::tempdir().map_err(|e| format!("cannot create work dir: {e}"))?;
        let model = dir.path().join("model.lp");
        let solution = dir.path().join("solution.txt");

        let file = File::create(&model).map_err(|e| format!("cannot write LP file: {e}"))?;
        let mut writer = BufWriter::new(file);
        write_lp(system, &mut writer).map_err(|e| format!("cannot write LP file: {e}"))?;
        drop(writer);

        let output = Command::new(&self.binary)
            .arg(&model)
            .args(self.arguments(config))
            .arg("solve")
            .arg("solu")
            .arg(&solution)
            .output()
            .map_err(|e| format!("cannot run {}: {e}", self.binary.display()))?;
        if !output.status.success() {
            return Err(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        let text =
            fs::read_to_string(&solution).map_err(|e| format!("cannot read solution file: {e}"))?;
        let mut outcome = parse_solution(system, &text);
        if outcome.best_bound.is_none() && outcome.status.has_solution() {
            outcome.best_bound = lower_bound(&String::from_utf8_lossy(&output.stdout));
        }
        Ok(outcome)
    }
}

impl Default for CbcSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for CbcSolver {
    fn name(&self) -> &str {
        "cbc"
    }

    fn solve(&self, system: &ConstraintSystem, config: &SolverConfig) -> SolverOutcome {
        let started = Instant::now();
        if let Err(e) = config.validate() {
            return SolverOutcome::error(e.to_string());
        }
        debug!(
            binary = %self.binary.display(),
            variables = system.variable_count(),
            constraints = system.constraint_count(),
            "running cbc"
        );
        let outcome = self.run(system, config).unwrap_or_else(|message| {
            warn!(%message, "cbc failed");
            SolverOutcome::error(message)
        });
        outcome.with_solve_time(started.elapsed())
    }
}

/// Last lower bound CBC printed to its log (`Best possible:` or
/// `Lower bound:`), rounded up to the next integer.
pub fn lower_bound(log: &str) -> Option<i64> {
    log.lines()
        .filter_map(|line| {
            let line = line.trim();
            line.strip_prefix("Best possible:")
                .or_else(|| line.strip_prefix("Lower bound:"))
        })
        .filter_map(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.abs() < NO_SOLUTION_OBJECTIVE)
        .last()
        .map(|v| (v - INTEGRALITY_TOLERANCE).ceil() as i64)
}

/// Parses a CBC solution file written with `solu`.
///
/// The first line carries the status and objective value, e.g.
/// `Optimal - objective value 9.00000000`. Each further line is
/// `[**] <index> <name> <value> <reduced cost>`; variables CBC leaves out
/// are zero.
///
/// The header objective is the incumbent's value, so `best_bound` is only
/// filled for `Optimal`.
pub fn parse_solution(system: &ConstraintSystem, text: &str) -> SolverOutcome {
    let mut lines = text.lines();
    let header = lines.next().unwrap_or("").trim();
    let objective = header
        .rsplit("objective value")
        .next()
        .filter(|_| header.contains("objective value"))
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.abs() < NO_SOLUTION_OBJECTIVE);

    let lower = header.to_ascii_lowercase();
    let status = if lower.starts_with("optimal") {
        SolverStatus::Optimal
    } else if lower.contains("unbounded") {
        SolverStatus::Unbounded
    } else if lower.contains("infeasible") {
        SolverStatus::Infeasible
    } else if lower.starts_with("stopped") {
        if objective.is_some() {
            SolverStatus::FeasibleWithinTimeLimit
        } else {
            SolverStatus::NoSolutionWithinTimeLimit
        }
    } else {
        return SolverOutcome::error(format!("unrecognized cbc status line: {header:?}"));
    };
    if !status.has_solution() {
        return SolverOutcome::empty(status);
    }

    let names: HashMap<String, VarId> = (0..system.variable_count())
        .map(|i| (lp_name(system, VarId(i)), VarId(i)))
        .collect();
    let mut assignment = Assignment::zeros(system.variable_count());
    for line in lines {
        let mut fields = line.split_whitespace().peekable();
        if fields.peek() == Some(&"**") {
            fields.next();
        }
        let (Some(_index), Some(name), Some(value)) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        let Some(&var) = names.get(name) else {
            return SolverOutcome::error(format!("cbc reported unknown variable {name}"));
        };
        let Ok(value) = value.parse::<f64>() else {
            return SolverOutcome::error(format!("cbc reported non-numeric value for {name}"));
        };
        let rounded = value.round();
        if (value - rounded).abs() > INTEGRALITY_TOLERANCE {
            return SolverOutcome::error(format!("{name} = {value} is not integral"));
        }
        assignment.set(var, rounded as i64);
    }

    let violations = system.check(&assignment);
    if let Some(first) = violations.first() {
        return SolverOutcome::error(format!(
            "cbc solution violates {} row(s), first: {first}",
            violations.len()
        ));
    }

    SolverOutcome {
        status,
        objective_value: Some(system.objective_value(&assignment)),
        best_bound: objective
            .filter(|_| status == SolverStatus::Optimal)
            .map(|v| v.round() as i64),
        assignment: Some(assignment),
        ..SolverOutcome::empty(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formulation::{formulate, Placement};
    use crate::instance::{InstanceBuilder, JobId, ModeId, ResourceKind, Slot};

    fn system() -> ConstraintSystem {
        let inst = InstanceBuilder::new(3)
            .with_resource("R1", ResourceKind::Renewable, 2)
            .with_mode("M1")
            .with_job("J1")
            .with_job("J2")
            .with_mode_spec("J1", "M1", 1, [("R1", 1)])
            .with_mode_spec("J2", "M1", 2, [("R1", 2)])
            .with_precedence("J1", "J2")
            .build()
            .unwrap();
        formulate(&inst)
    }

    /// Solution file listing every non-zero of the optimal schedule.
    fn solution_text(sys: &ConstraintSystem, header: &str) -> String {
        let assignment = sys.expand(&[
            Placement {
                job: JobId(0),
                mode: ModeId(0),
                start: Slot(1),
            },
            Placement {
                job: JobId(1),
                mode: ModeId(0),
                start: Slot(2),
            },
        ]);
        let mut text = format!("{header}\n");
        for (i, &v) in assignment.values().iter().enumerate() {
            if v != 0 {
                text.push_str(&format!(
                    "{i:>7} {:<30} {v:>15} {:>15}\n",
                    lp_name(sys, VarId(i)),
                    0
                ));
            }
        }
        text
    }

    #[test]
    fn test_parse_optimal() {
        let sys = system();
        let outcome = parse_solution(&sys, &solution_text(&sys, "Optimal - objective value 3.00000000"));
        assert_eq!(outcome.status, SolverStatus::Optimal);
        assert_eq!(outcome.objective_value, Some(3));
        assert_eq!(outcome.best_bound, Some(3));
        assert!(sys.is_satisfied(outcome.assignment.as_ref().unwrap()));
    }

    #[test]
    fn test_parse_stopped_with_incumbent() {
        let sys = system();
        let text = solution_text(&sys, "Stopped on time - objective value 3.00000000");
        let outcome = parse_solution(&sys, &text);
        assert_eq!(outcome.status, SolverStatus::FeasibleWithinTimeLimit);
        assert!(outcome.has_solution());
        assert_eq!(outcome.objective_value, Some(3));
        assert_eq!(outcome.best_bound, None);
        assert!(!outcome.is_proven_optimal());
    }

    #[test]
    fn test_lower_bound_from_log() {
        let log = "\
Cbc0010I After 1000 nodes, 12 on tree, 10 best solution, best possible 7.5
Result - Stopped on time limit

Objective value:                10.00000000
Lower bound:                    7.500
Gap:                            0.25
";
        assert_eq!(lower_bound(log), Some(8));
        assert_eq!(lower_bound("Best possible:   3.0000001\n"), Some(3));
        assert_eq!(lower_bound("Best possible: 1e+50\n"), None);
        assert_eq!(lower_bound("Result - Optimal solution found\n"), None);
    }

    #[test]
    fn test_parse_stopped_without_incumbent() {
        let outcome = parse_solution(&system(), "Stopped on time - objective value 1e+50\n");
        assert_eq!(outcome.status, SolverStatus::NoSolutionWithinTimeLimit);
        assert!(outcome.assignment.is_none());
    }

    #[test]
    fn test_parse_infeasible_and_unbounded() {
        let sys = system();
        assert_eq!(
            parse_solution(&sys, "Infeasible - objective value 0.00000000\n").status,
            SolverStatus::Infeasible
        );
        assert_eq!(
            parse_solution(&sys, "Integer infeasible - objective value 0\n").status,
            SolverStatus::Infeasible
        );
        assert_eq!(
            parse_solution(&sys, "Unbounded - objective value 0\n").status,
            SolverStatus::Unbounded
        );
    }

    #[test]
    fn test_parse_marked_lines() {
        let sys = system();
        let text = solution_text(&sys, "Optimal - objective value 3")
            .replacen("\n ", "\n** ", 1);
        assert!(parse_solution(&sys, &text).has_solution());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let sys = system();
        assert_eq!(parse_solution(&sys, "").status, SolverStatus::Error);
        let text = "Optimal - objective value 3\n 0 nonsense 1 0\n";
        assert_eq!(parse_solution(&sys, text).status, SolverStatus::Error);
    }

    #[test]
    fn test_parse_rejects_infeasible_values() {
        // Optimal header but nothing set: single start/end rows fail.
        let outcome = parse_solution(&system(), "Optimal - objective value 0\n");
        assert_eq!(outcome.status, SolverStatus::Error);
    }

    #[test]
    fn test_missing_binary_is_error() {
        let solver = CbcSolver::new().with_binary("/nonexistent/cbc-binary");
        let outcome = solver.solve(&system(), &SolverConfig::default());
        assert_eq!(outcome.status, SolverStatus::Error);
        assert!(outcome.message.unwrap().contains("cannot run"));
    }

    #[test]
    fn test_arguments() {
        let solver = CbcSolver::new().with_arg("threads").with_arg("2");
        let args = solver.arguments(&SolverConfig::relaxed());
        assert_eq!(
            args,
            ["sec", "1200", "allow", "100", "ratio", "0.01", "primalT", "0.0000001", "threads", "2"]
        );
    }
}
