//! Built-in exact search.
//!
//! Depth-first branch and bound over one (mode, start slot) decision per
//! job. Jobs are fixed in topological order so every predecessor is placed
//! before its successors; within a job, shorter modes and earlier starts are
//! tried first.
//!
//! Pruning uses a critical-path bound: a placed job ending at slot `e`
//! forces the makespan to at least `e` plus the longest chain of
//! minimum-duration successors behind it. Resource checks mirror the
//! capacity rows of the system, including the across-modes rows when the
//! system was built with them.
//!
//! # References
//!
//! Demeulemeester & Herroelen (1992), "A Branch-and-Bound Procedure for the
//! Multiple Resource-Constrained Project Scheduling Problem"

use super::config::SolverConfig;
use super::types::{Solver, SolverOutcome, SolverStatus};
use crate::formulation::{ConstraintSystem, Placement};
use crate::instance::{JobId, ModeId, ProjectInstance, ResourceId, ResourceKind, Slot};
use std::time::Instant;
use tracing::debug;

/// How often (in nodes) the clock is read.
const CLOCK_INTERVAL: u64 = 256;

/// Exact branch-and-bound solver that needs no external binary.
///
/// # Examples
///
/// ```
/// use u_mrcpsp::formulation::formulate;
/// use u_mrcpsp::instance::{InstanceBuilder, ResourceKind};
/// use u_mrcpsp::solver::{SearchSolver, Solver, SolverConfig, SolverStatus};
///
/// let instance = InstanceBuilder::new(4)
///     .with_resource("R1", ResourceKind::Renewable, 1)
///     .with_mode("M1")
///     .with_job("A")
///     .with_job("B")
///     .with_mode_spec("A", "M1", 2, [("R1", 1)])
///     .with_mode_spec("B", "M1", 2, [("R1", 1)])
///     .build()
///     .unwrap();
///
/// let outcome = SearchSolver::new().solve(&formulate(&instance), &SolverConfig::default());
/// assert_eq!(outcome.status, SolverStatus::Optimal);
/// assert_eq!(outcome.objective_value, Some(4));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SearchSolver;

impl SearchSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SearchSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for SearchSolver {
    fn name(&self) -> &str {
        "search"
    }

    fn solve(&self, system: &ConstraintSystem, config: &SolverConfig) -> SolverOutcome {
        let started = Instant::now();
        if let Err(e) = config.validate() {
            return SolverOutcome::error(e.to_string());
        }

        let instance = system.instance();
        let Some(order) = instance.topological_order() else {
            debug!("precedence graph has a cycle");
            return SolverOutcome::empty(SolverStatus::Infeasible)
                .with_solve_time(started.elapsed());
        };

        let mut search = Search::new(instance, order, system.options().capacity_across_modes);
        if search.root_bound > instance.horizon().len() {
            debug!(
                bound = search.root_bound,
                horizon = instance.horizon().len(),
                "critical path exceeds the horizon"
            );
            return SolverOutcome::empty(SolverStatus::Infeasible)
                .with_solve_time(started.elapsed());
        }

        search.run(started, config);
        let elapsed = started.elapsed();
        debug!(
            nodes = search.nodes,
            stop = ?search.stop,
            best = ?search.best.as_ref().map(|(v, _)| *v),
            root_bound = search.root_bound,
            "search finished"
        );

        let root_bound = i64::from(search.root_bound);
        let (status, best_bound) = match (&search.best, search.stop) {
            (None, Stop::Exhausted) => {
                return SolverOutcome::empty(SolverStatus::Infeasible).with_solve_time(elapsed)
            }
            (None, _) => {
                return SolverOutcome {
                    best_bound: Some(root_bound),
                    ..SolverOutcome::empty(SolverStatus::NoSolutionWithinTimeLimit)
                }
                .with_solve_time(elapsed)
            }
            (Some((value, _)), Stop::Exhausted) => {
                (SolverStatus::Optimal, i64::from(*value))
            }
            (Some(_), Stop::WithinGap) => (SolverStatus::Optimal, root_bound),
            (Some(_), Stop::TimeLimit) => (SolverStatus::FeasibleWithinTimeLimit, root_bound),
        };

        let placements = search.best.map(|(_, p)| p).unwrap_or_default();
        let assignment = system.expand(&placements);
        let violations = system.check(&assignment);
        if let Some(first) = violations.first() {
            return SolverOutcome::error(format!(
                "search produced an assignment with {} violation(s), first: {first}",
                violations.len()
            ))
            .with_solve_time(elapsed);
        }

        SolverOutcome {
            status,
            objective_value: Some(system.objective_value(&assignment)),
            assignment: Some(assignment),
            best_bound: Some(best_bound),
            solve_time: elapsed,
            message: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Exhausted,
    WithinGap,
    TimeLimit,
}

/// Search state for one instance.
struct Search<'a> {
    instance: &'a ProjectInstance,
    order: Vec<JobId>,
    /// Admissible modes per job, shortest first.
    modes: Vec<Vec<(ModeId, u32)>>,
    /// Longest chain of minimum durations strictly after each job.
    tail: Vec<u32>,
    root_bound: u32,
    renewable: Vec<ResourceId>,
    non_renewable: Vec<ResourceId>,
    across_modes: bool,
    /// `[bucket][renewable][slot - 1]`.
    renewable_usage: Vec<u64>,
    /// `[bucket][non_renewable]`.
    non_renewable_usage: Vec<u64>,
    ends: Vec<u32>,
    placements: Vec<Placement>,
    best: Option<(u32, Vec<Placement>)>,
    nodes: u64,
    stop: Stop,
}

impl<'a> Search<'a> {
    fn new(instance: &'a ProjectInstance, order: Vec<JobId>, across_modes: bool) -> Self {
        let jobs = instance.job_count();

        let modes = instance
            .jobs()
            .iter()
            .map(|job| {
                let mut modes: Vec<(ModeId, u32)> = job
                    .admissible_modes()
                    .map(|(m, spec)| (m, spec.duration))
                    .collect();
                modes.sort_by_key(|&(m, d)| (d, m.0));
                modes
            })
            .collect();

        let mut tail = vec![0u32; jobs];
        for &job in order.iter().rev() {
            tail[job.0] = instance
                .successors(job)
                .iter()
                .map(|s| tail[s.0] + instance.job(*s).min_duration())
                .max()
                .unwrap_or(0);
        }
        let root_bound = instance
            .job_ids()
            .filter(|&j| instance.predecessors(j).is_empty())
            .map(|j| instance.job(j).min_duration() + tail[j.0])
            .max()
            .unwrap_or(0);

        let renewable: Vec<ResourceId> =
            instance.resources_of_kind(ResourceKind::Renewable).collect();
        let non_renewable: Vec<ResourceId> =
            instance.resources_of_kind(ResourceKind::NonRenewable).collect();
        let buckets = if across_modes { 1 } else { instance.mode_count() };
        let slots = instance.horizon().len() as usize;

        Self {
            instance,
            order,
            modes,
            tail,
            root_bound,
            renewable_usage: vec![0; buckets * renewable.len() * slots],
            non_renewable_usage: vec![0; buckets * non_renewable.len()],
            renewable,
            non_renewable,
            across_modes,
            ends: vec![0; jobs],
            placements: Vec::with_capacity(jobs),
            best: None,
            nodes: 0,
            stop: Stop::Exhausted,
        }
    }

    fn run(&mut self, started: Instant, config: &SolverConfig) {
        self.dfs(0, 0, started, config);
    }

    fn bucket(&self, mode: ModeId) -> usize {
        if self.across_modes {
            0
        } else {
            mode.0
        }
    }

    fn renewable_index(&self, bucket: usize, r: usize, slot: u32) -> usize {
        let slots = self.instance.horizon().len() as usize;
        (bucket * self.renewable.len() + r) * slots + slot as usize - 1
    }

    fn incumbent(&self) -> u32 {
        self.best
            .as_ref()
            .map_or(self.instance.horizon().len() + 1, |(v, _)| *v)
    }

    fn non_renewable_fits(&self, job: JobId, mode: ModeId, duration: u32) -> bool {
        let bucket = self.bucket(mode);
        self.non_renewable.iter().enumerate().all(|(r, &res)| {
            let need = u64::from(self.instance.need(job, mode, res)) * u64::from(duration);
            let used = self.non_renewable_usage[bucket * self.non_renewable.len() + r];
            used + need <= u64::from(self.instance.resource(res).availability)
        })
    }

    fn renewable_fits(&self, job: JobId, mode: ModeId, start: u32, end: u32) -> bool {
        let bucket = self.bucket(mode);
        self.renewable.iter().enumerate().all(|(r, &res)| {
            let need = u64::from(self.instance.need(job, mode, res));
            if need == 0 {
                return true;
            }
            let cap = u64::from(self.instance.resource(res).availability);
            (start..=end).all(|s| self.renewable_usage[self.renewable_index(bucket, r, s)] + need <= cap)
        })
    }

    /// Adds or removes the resource usage of a placement.
    fn apply(&mut self, job: JobId, mode: ModeId, start: u32, end: u32, add: bool) {
        let bucket = self.bucket(mode);
        for r in 0..self.renewable.len() {
            let need = u64::from(self.instance.need(job, mode, self.renewable[r]));
            for s in start..=end {
                let idx = self.renewable_index(bucket, r, s);
                if add {
                    self.renewable_usage[idx] += need;
                } else {
                    self.renewable_usage[idx] -= need;
                }
            }
        }
        let duration = u64::from(end - start + 1);
        for r in 0..self.non_renewable.len() {
            let need = u64::from(self.instance.need(job, mode, self.non_renewable[r])) * duration;
            let idx = bucket * self.non_renewable.len() + r;
            if add {
                self.non_renewable_usage[idx] += need;
            } else {
                self.non_renewable_usage[idx] -= need;
            }
        }
    }

    fn dfs(&mut self, depth: usize, max_end: u32, started: Instant, config: &SolverConfig) {
        self.nodes += 1;
        if self.nodes % CLOCK_INTERVAL == 0 && started.elapsed() >= config.time_limit() {
            self.stop = Stop::TimeLimit;
        }
        if self.stop != Stop::Exhausted {
            return;
        }

        if depth == self.order.len() {
            let value = max_end;
            if value < self.incumbent() {
                self.best = Some((value, self.placements.clone()));
                if config.within_gap(i64::from(value), i64::from(self.root_bound)) {
                    self.stop = Stop::WithinGap;
                }
            }
            return;
        }

        let job = self.order[depth];
        let horizon = self.instance.horizon().len();
        let earliest = self
            .instance
            .predecessors(job)
            .iter()
            .map(|p| self.ends[p.0] + 1)
            .max()
            .unwrap_or(1);

        for i in 0..self.modes[job.0].len() {
            let (mode, duration) = self.modes[job.0][i];
            if earliest + duration - 1 > horizon || !self.non_renewable_fits(job, mode, duration) {
                continue;
            }
            for start in earliest..=horizon + 1 - duration {
                let end = start + duration - 1;
                let bound = max_end.max(end + self.tail[job.0]).max(self.root_bound);
                // Bounds only grow with later starts.
                if bound >= self.incumbent() {
                    break;
                }
                if !self.renewable_fits(job, mode, start, end) {
                    continue;
                }

                self.apply(job, mode, start, end, true);
                self.ends[job.0] = end;
                self.placements.push(Placement {
                    job,
                    mode,
                    start: Slot(start),
                });

                self.dfs(depth + 1, max_end.max(end), started, config);

                self.placements.pop();
                self.ends[job.0] = 0;
                self.apply(job, mode, start, end, false);

                if self.stop != Stop::Exhausted {
                    return;
                }
            }
        }
    }
}
