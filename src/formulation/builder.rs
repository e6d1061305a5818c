//! Builds the constraint system from an instance.

use super::expr::{ConstraintFamily, LinearConstraint, LinearExpr, Sense};
use super::system::ConstraintSystem;
use crate::instance::{JobId, ProjectInstance, ResourceKind};
use tracing::{debug, trace};

/// Optional parts of the formulation.
///
/// # Examples
///
/// ```
/// use u_mrcpsp::formulation::FormulationOptions;
///
/// let options = FormulationOptions::default().with_span_cuts(false);
/// assert!(options.capacity_across_modes);
/// assert!(!options.span_cuts);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormulationOptions {
    /// Also cap resource usage summed over all modes (per slot for
    /// renewable resources, per horizon for non-renewable ones). The
    /// per-mode rows are emitted either way.
    pub capacity_across_modes: bool,
    /// Emit the span rows (end index − start index = duration − 1), which
    /// are implied by the others but tighten the relaxation.
    pub span_cuts: bool,
}

impl Default for FormulationOptions {
    fn default() -> Self {
        Self {
            capacity_across_modes: true,
            span_cuts: true,
        }
    }
}

impl FormulationOptions {
    pub fn with_capacity_across_modes(mut self, enabled: bool) -> Self {
        self.capacity_across_modes = enabled;
        self
    }

    pub fn with_span_cuts(mut self, enabled: bool) -> Self {
        self.span_cuts = enabled;
        self
    }
}

/// Translates a [`ProjectInstance`] into a [`ConstraintSystem`].
///
/// The build is a single deterministic pass over dense indices: two builds
/// of the same instance with the same options compare equal.
///
/// # Examples
///
/// ```
/// use u_mrcpsp::formulation::{ConstraintFamily, Formulator};
/// use u_mrcpsp::instance::{InstanceBuilder, ResourceKind};
///
/// let instance = InstanceBuilder::new(4)
///     .with_resource("R1", ResourceKind::Renewable, 2)
///     .with_mode("M1")
///     .with_job("J1")
///     .with_mode_spec("J1", "M1", 2, [("R1", 1)])
///     .build()
///     .unwrap();
///
/// let system = Formulator::new(&instance).build();
/// assert_eq!(system.family_count(ConstraintFamily::SingleMode), 1);
/// // 3 non-last slots x 1 mode
/// assert_eq!(system.family_count(ConstraintFamily::EndContinuity), 3);
/// ```
pub struct Formulator<'a> {
    instance: &'a ProjectInstance,
    options: FormulationOptions,
}

impl<'a> Formulator<'a> {
    pub fn new(instance: &'a ProjectInstance) -> Self {
        Self {
            instance,
            options: FormulationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FormulationOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds variables, rows and the makespan objective.
    pub fn build(&self) -> ConstraintSystem {
        let mut sys = ConstraintSystem::with_variables(self.instance, self.options);

        self.start_before_end(&mut sys);
        self.renewable_capacity(&mut sys);
        self.non_renewable_capacity(&mut sys);
        self.precedence(&mut sys);
        self.active_duration(&mut sys);
        if self.options.span_cuts {
            self.span_duration(&mut sys);
        }
        self.continuity(&mut sys);
        self.single_start_end(&mut sys);
        self.single_mode(&mut sys);
        self.mode_consistency(&mut sys);
        self.makespan_link(&mut sys);
        if self.options.capacity_across_modes {
            self.renewable_across_modes(&mut sys);
            self.non_renewable_across_modes(&mut sys);
        }

        for (family, rows) in sys.family_counts() {
            trace!(family = family.tag(), rows, "constraint family");
        }
        debug!(
            variables = sys.variable_count(),
            constraints = sys.constraint_count(),
            jobs = self.instance.job_count(),
            slots = self.instance.horizon().len(),
            "formulation built"
        );

        sys
    }

    fn job_label(&self, job: JobId) -> &str {
        &self.instance.job(job).label
    }

    /// `Σ_s index(s) · end[job, s]`, scaled by `sign`.
    fn add_weighted_end(
        &self,
        sys: &ConstraintSystem,
        expr: &mut LinearExpr,
        job: JobId,
        sign: i64,
    ) {
        for slot in self.instance.horizon().slots() {
            expr.add(sys.end(job, slot), sign * i64::from(slot.index()));
        }
    }

    /// `Σ_s index(s) · start[job, s]`, scaled by `sign`.
    fn add_weighted_start(
        &self,
        sys: &ConstraintSystem,
        expr: &mut LinearExpr,
        job: JobId,
        sign: i64,
    ) {
        for slot in self.instance.horizon().slots() {
            expr.add(sys.start(job, slot), sign * i64::from(slot.index()));
        }
    }

    fn start_before_end(&self, sys: &mut ConstraintSystem) {
        for job in self.instance.job_ids() {
            let mut expr = LinearExpr::new();
            self.add_weighted_end(sys, &mut expr, job, 1);
            self.add_weighted_start(sys, &mut expr, job, -1);
            sys.push(LinearConstraint {
                family: ConstraintFamily::StartBeforeEnd,
                name: format!("start_before_end[{}]", self.job_label(job)),
                expr,
                sense: Sense::Ge,
                rhs: 0,
            });
        }
    }

    fn renewable_capacity(&self, sys: &mut ConstraintSystem) {
        let inst = self.instance;
        let renewable: Vec<_> = inst.resources_of_kind(ResourceKind::Renewable).collect();
        for slot in inst.horizon().slots() {
            for &resource in &renewable {
                for mode in inst.mode_ids() {
                    let mut expr = LinearExpr::new();
                    for job in inst.job_ids() {
                        if let Some(var) = sys.active(job, slot, mode) {
                            expr.add(var, i64::from(inst.need(job, mode, resource)));
                        }
                    }
                    if expr.is_empty() {
                        continue;
                    }
                    sys.push(LinearConstraint {
                        family: ConstraintFamily::RenewableCapacity,
                        name: format!(
                            "renewable[{slot},{},{}]",
                            inst.resource(resource).label,
                            inst.mode_label(mode)
                        ),
                        expr,
                        sense: Sense::Le,
                        rhs: i64::from(inst.resource(resource).availability),
                    });
                }
            }
        }
    }

    fn non_renewable_capacity(&self, sys: &mut ConstraintSystem) {
        let inst = self.instance;
        for resource in inst.resources_of_kind(ResourceKind::NonRenewable) {
            for mode in inst.mode_ids() {
                let mut expr = LinearExpr::new();
                for job in inst.job_ids() {
                    let need = i64::from(inst.need(job, mode, resource));
                    for slot in inst.horizon().slots() {
                        if let Some(var) = sys.active(job, slot, mode) {
                            expr.add(var, need);
                        }
                    }
                }
                if expr.is_empty() {
                    continue;
                }
                sys.push(LinearConstraint {
                    family: ConstraintFamily::NonRenewableCapacity,
                    name: format!(
                        "non_renewable[{},{}]",
                        inst.resource(resource).label,
                        inst.mode_label(mode)
                    ),
                    expr,
                    sense: Sense::Le,
                    rhs: i64::from(inst.resource(resource).availability),
                });
            }
        }
    }

    fn precedence(&self, sys: &mut ConstraintSystem) {
        for edge in self.instance.precedences() {
            // Self-loops are removed when the instance is built.
            if edge.predecessor == edge.successor {
                continue;
            }
            let mut expr = LinearExpr::new();
            self.add_weighted_start(sys, &mut expr, edge.successor, 1);
            self.add_weighted_end(sys, &mut expr, edge.predecessor, -1);
            sys.push(LinearConstraint {
                family: ConstraintFamily::Precedence,
                name: format!(
                    "precedence[{},{}]",
                    self.job_label(edge.predecessor),
                    self.job_label(edge.successor)
                ),
                expr,
                sense: Sense::Ge,
                rhs: 1,
            });
        }
    }

    fn active_duration(&self, sys: &mut ConstraintSystem) {
        let inst = self.instance;
        for job in inst.job_ids() {
            for (mode, spec) in inst.job(job).admissible_modes() {
                let mut expr = LinearExpr::new();
                for slot in inst.horizon().slots() {
                    if let Some(var) = sys.active(job, slot, mode) {
                        expr.add(var, 1);
                    }
                }
                if let Some(chosen) = sys.mode_chosen(job, mode) {
                    expr.add(chosen, -i64::from(spec.duration));
                }
                sys.push(LinearConstraint {
                    family: ConstraintFamily::ActiveDuration,
                    name: format!("active_duration[{},{}]", self.job_label(job), inst.mode_label(mode)),
                    expr,
                    sense: Sense::Eq,
                    rhs: 0,
                });
            }
        }
    }

    fn span_duration(&self, sys: &mut ConstraintSystem) {
        let inst = self.instance;
        for job in inst.job_ids() {
            let mut expr = LinearExpr::new();
            self.add_weighted_end(sys, &mut expr, job, 1);
            self.add_weighted_start(sys, &mut expr, job, -1);
            for (mode, spec) in inst.job(job).admissible_modes() {
                if let Some(chosen) = sys.mode_chosen(job, mode) {
                    expr.add(chosen, -i64::from(spec.duration));
                }
            }
            sys.push(LinearConstraint {
                family: ConstraintFamily::SpanDuration,
                name: format!("span_duration[{}]", self.job_label(job)),
                expr,
                sense: Sense::Eq,
                rhs: -1,
            });
        }
    }

    /// End and start continuity rows. Both are skipped for the last slot,
    /// which has no successor.
    fn continuity(&self, sys: &mut ConstraintSystem) {
        let inst = self.instance;
        let mut start_rows = Vec::new();

        for job in inst.job_ids() {
            let label = self.job_label(job);
            for slot in inst.horizon().slots() {
                let Some(next) = sys.slot_next(slot) else {
                    continue;
                };
                for (mode, _) in inst.job(job).admissible_modes() {
                    let (Some(now), Some(later)) = (sys.active(job, slot, mode), sys.active(job, next, mode))
                    else {
                        continue;
                    };
                    let mode_label = inst.mode_label(mode);
                    let ends_now = sys.end(job, slot);
                    let starts_next = sys.start(job, next);

                    sys.push(LinearConstraint {
                        family: ConstraintFamily::EndContinuity,
                        name: format!("end_continuity[{label},{slot},{mode_label}]"),
                        expr: LinearExpr::new()
                            .plus(now, 1)
                            .plus(later, -1)
                            .plus(ends_now, -1),
                        sense: Sense::Le,
                        rhs: 0,
                    });
                    start_rows.push(LinearConstraint {
                        family: ConstraintFamily::StartContinuity,
                        name: format!("start_continuity[{label},{slot},{mode_label}]"),
                        expr: LinearExpr::new()
                            .plus(later, 1)
                            .plus(now, -1)
                            .plus(starts_next, -1),
                        sense: Sense::Le,
                        rhs: 0,
                    });
                }
            }
        }

        for row in start_rows {
            sys.push(row);
        }
    }

    fn single_start_end(&self, sys: &mut ConstraintSystem) {
        let inst = self.instance;
        for job in inst.job_ids() {
            let mut expr = LinearExpr::new();
            for slot in inst.horizon().slots() {
                expr.add(sys.start(job, slot), 1);
            }
            sys.push(LinearConstraint {
                family: ConstraintFamily::SingleStart,
                name: format!("single_start[{}]", self.job_label(job)),
                expr,
                sense: Sense::Eq,
                rhs: 1,
            });
        }
        for job in inst.job_ids() {
            let mut expr = LinearExpr::new();
            for slot in inst.horizon().slots() {
                expr.add(sys.end(job, slot), 1);
            }
            sys.push(LinearConstraint {
                family: ConstraintFamily::SingleEnd,
                name: format!("single_end[{}]", self.job_label(job)),
                expr,
                sense: Sense::Eq,
                rhs: 1,
            });
        }
    }

    fn single_mode(&self, sys: &mut ConstraintSystem) {
        let inst = self.instance;
        for job in inst.job_ids() {
            let mut expr = LinearExpr::new();
            for mode in inst.mode_ids() {
                if let Some(var) = sys.mode_chosen(job, mode) {
                    expr.add(var, 1);
                }
            }
            sys.push(LinearConstraint {
                family: ConstraintFamily::SingleMode,
                name: format!("single_mode[{}]", self.job_label(job)),
                expr,
                sense: Sense::Eq,
                rhs: 1,
            });
        }
    }

    fn mode_consistency(&self, sys: &mut ConstraintSystem) {
        let inst = self.instance;
        for job in inst.job_ids() {
            for slot in inst.horizon().slots() {
                for (mode, _) in inst.job(job).admissible_modes() {
                    let (Some(chosen), Some(active)) =
                        (sys.mode_chosen(job, mode), sys.active(job, slot, mode))
                    else {
                        continue;
                    };
                    sys.push(LinearConstraint {
                        family: ConstraintFamily::ModeConsistency,
                        name: format!(
                            "mode_consistency[{},{slot},{}]",
                            self.job_label(job),
                            inst.mode_label(mode)
                        ),
                        expr: LinearExpr::new().plus(chosen, 1).plus(active, -1),
                        sense: Sense::Ge,
                        rhs: 0,
                    });
                }
            }
        }
    }

    fn makespan_link(&self, sys: &mut ConstraintSystem) {
        let inst = self.instance;
        let makespan = sys.makespan();
        for job in inst.job_ids() {
            for slot in inst.horizon().slots() {
                let end = sys.end(job, slot);
                sys.push(LinearConstraint {
                    family: ConstraintFamily::MakespanLink,
                    name: format!("makespan_link[{},{slot}]", self.job_label(job)),
                    expr: LinearExpr::new()
                        .plus(end, i64::from(slot.index()))
                        .plus(makespan, -1),
                    sense: Sense::Le,
                    rhs: 0,
                });
            }
        }
    }

    fn renewable_across_modes(&self, sys: &mut ConstraintSystem) {
        let inst = self.instance;
        let renewable: Vec<_> = inst.resources_of_kind(ResourceKind::Renewable).collect();
        for slot in inst.horizon().slots() {
            for &resource in &renewable {
                let mut expr = LinearExpr::new();
                for job in inst.job_ids() {
                    for (mode, spec) in inst.job(job).admissible_modes() {
                        if let Some(var) = sys.active(job, slot, mode) {
                            expr.add(var, i64::from(spec.need(resource)));
                        }
                    }
                }
                if expr.is_empty() {
                    continue;
                }
                sys.push(LinearConstraint {
                    family: ConstraintFamily::RenewableCapacityAcrossModes,
                    name: format!("renewable_total[{slot},{}]", inst.resource(resource).label),
                    expr,
                    sense: Sense::Le,
                    rhs: i64::from(inst.resource(resource).availability),
                });
            }
        }
    }

    fn non_renewable_across_modes(&self, sys: &mut ConstraintSystem) {
        let inst = self.instance;
        for resource in inst.resources_of_kind(ResourceKind::NonRenewable) {
            let mut expr = LinearExpr::new();
            for job in inst.job_ids() {
                for (mode, spec) in inst.job(job).admissible_modes() {
                    for slot in inst.horizon().slots() {
                        if let Some(var) = sys.active(job, slot, mode) {
                            expr.add(var, i64::from(spec.need(resource)));
                        }
                    }
                }
            }
            if expr.is_empty() {
                continue;
            }
            sys.push(LinearConstraint {
                family: ConstraintFamily::NonRenewableCapacityAcrossModes,
                name: format!("non_renewable_total[{}]", inst.resource(resource).label),
                expr,
                sense: Sense::Le,
                rhs: i64::from(inst.resource(resource).availability),
            });
        }
    }
}

/// Formulates `instance` with default options.
pub fn formulate(instance: &ProjectInstance) -> ConstraintSystem {
    Formulator::new(instance).build()
}

/// Formulates independent instances in parallel, one build per instance.
#[cfg(feature = "parallel")]
pub fn formulate_all(instances: &[ProjectInstance]) -> Vec<ConstraintSystem> {
    use rayon::prelude::*;

    instances.par_iter().map(formulate).collect()
}
