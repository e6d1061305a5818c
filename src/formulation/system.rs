//! The formulated constraint system.

use super::assignment::Assignment;
use super::builder::FormulationOptions;
use super::expr::{ConstraintFamily, LinearConstraint, LinearExpr, Objective, Sense};
use super::variables::{VarId, VarKind, VarRole, Variable};
use crate::instance::{JobId, ModeId, ProjectInstance, Slot};
use std::collections::BTreeMap;
use std::fmt;

/// A job's mode and start slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub job: JobId,
    pub mode: ModeId,
    pub start: Slot,
}

/// A constraint or domain violated by an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A variable holds a value outside its domain.
    Domain { var: VarId, name: String, value: i64 },
    /// A row does not hold.
    Row {
        family: ConstraintFamily,
        name: String,
        lhs: i64,
        sense: Sense,
        rhs: i64,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Domain { name, value, .. } => {
                write!(f, "{name} = {value} is outside its domain")
            }
            Violation::Row {
                name,
                lhs,
                sense,
                rhs,
                ..
            } => write!(f, "{name}: {lhs} {sense} {rhs} does not hold"),
        }
    }
}

/// Variables, rows and objective of one instance, plus the instance they
/// were built from.
///
/// Variables are laid out densely: all `start` variables (job-major, then
/// slot), all `end` variables, the `active` variables of each admissible
/// (job, mode) pair, the `mode` variables, and finally `makespan`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSystem {
    instance: ProjectInstance,
    options: FormulationOptions,
    variables: Vec<Variable>,
    constraints: Vec<LinearConstraint>,
    objective: Objective,
    slots: usize,
    end_base: usize,
    active_base: Vec<Vec<Option<usize>>>,
    mode_vars: Vec<Vec<Option<VarId>>>,
    makespan: VarId,
}

impl ConstraintSystem {
    /// Allocates every variable for `instance` and sets the makespan
    /// objective. Rows are appended afterwards with [`push`](Self::push).
    pub(crate) fn with_variables(instance: &ProjectInstance, options: FormulationOptions) -> Self {
        let horizon = instance.horizon();
        let slots = horizon.len() as usize;
        let jobs = instance.job_count();
        let mut variables = Vec::new();

        for job in instance.job_ids() {
            let label = &instance.job(job).label;
            for slot in horizon.slots() {
                variables.push(Variable {
                    name: format!("start[{label},{slot}]"),
                    kind: VarKind::Binary,
                    role: VarRole::Start { job, slot },
                });
            }
        }

        let end_base = variables.len();
        for job in instance.job_ids() {
            let label = &instance.job(job).label;
            for slot in horizon.slots() {
                variables.push(Variable {
                    name: format!("end[{label},{slot}]"),
                    kind: VarKind::Binary,
                    role: VarRole::End { job, slot },
                });
            }
        }

        let mut active_base = vec![vec![None; instance.mode_count()]; jobs];
        for job in instance.job_ids() {
            let label = &instance.job(job).label;
            for (mode, _) in instance.job(job).admissible_modes() {
                active_base[job.0][mode.0] = Some(variables.len());
                let mode_label = instance.mode_label(mode);
                for slot in horizon.slots() {
                    variables.push(Variable {
                        name: format!("active[{label},{slot},{mode_label}]"),
                        kind: VarKind::Binary,
                        role: VarRole::Active { job, slot, mode },
                    });
                }
            }
        }

        let mut mode_vars = vec![vec![None; instance.mode_count()]; jobs];
        for job in instance.job_ids() {
            let label = &instance.job(job).label;
            for (mode, _) in instance.job(job).admissible_modes() {
                mode_vars[job.0][mode.0] = Some(VarId(variables.len()));
                variables.push(Variable {
                    name: format!("mode[{label},{}]", instance.mode_label(mode)),
                    kind: VarKind::Binary,
                    role: VarRole::ModeChosen { job, mode },
                });
            }
        }

        let makespan = VarId(variables.len());
        variables.push(Variable {
            name: "makespan".into(),
            kind: VarKind::Integer {
                lower: 0,
                upper: i64::from(horizon.len()),
            },
            role: VarRole::Makespan,
        });

        Self {
            instance: instance.clone(),
            options,
            variables,
            constraints: Vec::new(),
            objective: Objective::Minimize(LinearExpr::new().plus(makespan, 1)),
            slots,
            end_base,
            active_base,
            mode_vars,
            makespan,
        }
    }

    pub(crate) fn push(&mut self, row: LinearConstraint) {
        self.constraints.push(row);
    }

    /// The instance this system was formulated from.
    pub fn instance(&self) -> &ProjectInstance {
        &self.instance
    }

    pub fn options(&self) -> &FormulationOptions {
        &self.options
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, var: VarId) -> &Variable {
        &self.variables[var.0]
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// `start[job, slot]`.
    ///
    /// # Panics
    ///
    /// If `slot` is outside the horizon.
    pub fn start(&self, job: JobId, slot: Slot) -> VarId {
        self.assert_in_horizon(slot);
        VarId(job.0 * self.slots + slot.0 as usize - 1)
    }

    /// `end[job, slot]`. Panics like [`start`](Self::start).
    pub fn end(&self, job: JobId, slot: Slot) -> VarId {
        self.assert_in_horizon(slot);
        VarId(self.end_base + job.0 * self.slots + slot.0 as usize - 1)
    }

    /// `active[job, slot, mode]`, or `None` if `mode` is not admissible
    /// for `job`. Panics like [`start`](Self::start).
    pub fn active(&self, job: JobId, slot: Slot, mode: ModeId) -> Option<VarId> {
        self.assert_in_horizon(slot);
        self.active_base[job.0][mode.0].map(|base| VarId(base + slot.0 as usize - 1))
    }

    fn assert_in_horizon(&self, slot: Slot) {
        assert!(
            self.instance.horizon().contains(slot),
            "slot {slot} outside horizon 1..={}",
            self.instance.horizon().len()
        );
    }

    /// `mode[job, mode]`, or `None` if `mode` is not admissible for `job`.
    pub fn mode_chosen(&self, job: JobId, mode: ModeId) -> Option<VarId> {
        self.mode_vars[job.0][mode.0]
    }

    pub fn makespan(&self) -> VarId {
        self.makespan
    }

    /// Slot following `slot` in ordinal order.
    pub fn slot_next(&self, slot: Slot) -> Option<Slot> {
        self.instance.horizon().next(slot)
    }

    /// Number of rows in `family`.
    pub fn family_count(&self, family: ConstraintFamily) -> usize {
        self.constraints.iter().filter(|c| c.family == family).count()
    }

    /// Row count per non-empty family.
    pub fn family_counts(&self) -> BTreeMap<ConstraintFamily, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.constraints {
            *counts.entry(row.family).or_insert(0) += 1;
        }
        counts
    }

    /// Expands per-job (mode, start) decisions into a full assignment:
    /// start/end flags, the active run, the mode flag and the makespan.
    ///
    /// Placements that are not admissible or do not fit inside the horizon
    /// are skipped, leaving their job all-zero for [`check`](Self::check)
    /// to report.
    pub fn expand(&self, placements: &[Placement]) -> Assignment {
        let mut assignment = Assignment::zeros(self.variables.len());
        let mut makespan = 0;

        for p in placements {
            let Some(duration) = self.instance.duration(p.job, p.mode) else {
                continue;
            };
            let Some(end) = p.start.0.checked_add(duration - 1).map(Slot) else {
                continue;
            };
            if p.start.0 == 0 || !self.instance.horizon().contains(end) {
                continue;
            }
            assignment.set(self.start(p.job, p.start), 1);
            assignment.set(self.end(p.job, end), 1);
            for index in p.start.0..=end.0 {
                if let Some(var) = self.active(p.job, Slot(index), p.mode) {
                    assignment.set(var, 1);
                }
            }
            if let Some(var) = self.mode_chosen(p.job, p.mode) {
                assignment.set(var, 1);
            }
            makespan = makespan.max(end.0);
        }

        assignment.set(self.makespan, i64::from(makespan));
        assignment
    }

    /// Objective value of `assignment`.
    pub fn objective_value(&self, assignment: &Assignment) -> i64 {
        self.objective.expr().evaluate(assignment)
    }

    /// Every domain and row violated by `assignment`.
    pub fn check(&self, assignment: &Assignment) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (i, var) in self.variables.iter().enumerate() {
            let value = assignment.value(VarId(i));
            if !var.kind.admits(value) {
                violations.push(Violation::Domain {
                    var: VarId(i),
                    name: var.name.clone(),
                    value,
                });
            }
        }

        for row in &self.constraints {
            let lhs = row.expr.evaluate(assignment);
            if !row.sense.holds(lhs, row.rhs) {
                violations.push(Violation::Row {
                    family: row.family,
                    name: row.name.clone(),
                    lhs,
                    sense: row.sense,
                    rhs: row.rhs,
                });
            }
        }

        violations
    }

    /// Whether `assignment` satisfies every domain and row.
    pub fn is_satisfied(&self, assignment: &Assignment) -> bool {
        self.check(assignment).is_empty()
    }
}
