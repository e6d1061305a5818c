//! Decoded schedules.

use crate::instance::{JobId, ModeId, ProjectInstance, ResourceId, ResourceKind, Slot};
use std::fmt;
use thiserror::Error;

/// One job's mode and run of slots.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduledJob {
    pub job: JobId,
    pub job_label: String,
    pub mode: ModeId,
    pub mode_label: String,
    /// First active slot.
    pub start: Slot,
    /// Last active slot (inclusive).
    pub end: Slot,
    pub duration: u32,
}

impl ScheduledJob {
    /// Whether the job executes in `slot`.
    pub fn is_active(&self, slot: Slot) -> bool {
        self.start <= slot && slot <= self.end
    }

    pub fn slots(&self) -> impl Iterator<Item = Slot> {
        (self.start.0..=self.end.0).map(Slot)
    }
}

/// A per-job schedule and its makespan.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schedule {
    /// One entry per job, in job order.
    pub jobs: Vec<ScheduledJob>,
    /// Largest end slot index, 0 for an empty schedule.
    pub makespan: u32,
}

/// A property the schedule fails against its instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleViolation {
    #[error("job {job} is missing from the schedule")]
    MissingJob { job: String },

    #[error("job {job} cannot run in mode {mode}")]
    InadmissibleMode { job: String, mode: String },

    #[error("job {job} runs {actual} slots, mode {mode} lasts {expected}")]
    Duration {
        job: String,
        mode: String,
        expected: u32,
        actual: u32,
    },

    #[error("job {job} ends after the horizon")]
    OutsideHorizon { job: String },

    #[error("{successor} starts at {start}, before {predecessor} ends at {end}")]
    Precedence {
        predecessor: String,
        successor: String,
        end: u32,
        start: u32,
    },

    #[error("resource {resource} uses {used} of {available} in slot {slot}")]
    RenewableOverload {
        resource: String,
        slot: u32,
        used: u64,
        available: u32,
    },

    #[error("resource {resource} consumes {used} of {available}")]
    NonRenewableOverload {
        resource: String,
        used: u64,
        available: u32,
    },

    #[error("makespan {reported} differs from the last end slot {actual}")]
    Makespan { reported: u32, actual: u32 },
}

impl Schedule {
    /// Builds a schedule, deriving the makespan from the jobs.
    pub fn new(jobs: Vec<ScheduledJob>) -> Self {
        let makespan = jobs.iter().map(|j| j.end.0).max().unwrap_or(0);
        Self { jobs, makespan }
    }

    pub fn job(&self, job: JobId) -> Option<&ScheduledJob> {
        self.jobs.iter().find(|j| j.job == job)
    }

    /// Jobs executing in `slot`.
    pub fn active_jobs(&self, slot: Slot) -> impl Iterator<Item = &ScheduledJob> {
        self.jobs.iter().filter(move |j| j.is_active(slot))
    }

    /// `(job, slot, mode, duration)` for every active slot, job by job.
    pub fn assignments(&self) -> impl Iterator<Item = (&str, Slot, &str, u32)> {
        self.jobs.iter().flat_map(|j| {
            j.slots()
                .map(move |s| (j.job_label.as_str(), s, j.mode_label.as_str(), j.duration))
        })
    }

    /// Usage of `resource` per slot (index 0 is slot 1), summed over all
    /// jobs and modes. Slots outside the horizon are ignored.
    pub fn resource_profile(&self, instance: &ProjectInstance, resource: ResourceId) -> Vec<u64> {
        let mut profile = vec![0u64; instance.horizon().len() as usize];
        for j in &self.jobs {
            let need = u64::from(instance.need(j.job, j.mode, resource));
            for slot in j.slots() {
                let Some(i) = (slot.index() as usize).checked_sub(1) else {
                    continue;
                };
                if let Some(cell) = profile.get_mut(i) {
                    *cell += need;
                }
            }
        }
        profile
    }

    /// Checks the schedule against `instance`: every job placed once in an
    /// admissible mode for its duration, precedence, renewable capacity per
    /// slot, non-renewable totals and the makespan.
    ///
    /// Capacities are checked summed over modes.
    pub fn verify(&self, instance: &ProjectInstance) -> Vec<ScheduleViolation> {
        let mut violations = Vec::new();
        let horizon = instance.horizon();

        for job in instance.job_ids() {
            let label = &instance.job(job).label;
            let Some(entry) = self.job(job) else {
                violations.push(ScheduleViolation::MissingJob { job: label.clone() });
                continue;
            };
            match instance.duration(job, entry.mode) {
                None => violations.push(ScheduleViolation::InadmissibleMode {
                    job: label.clone(),
                    mode: entry.mode_label.clone(),
                }),
                Some(expected) => {
                    let actual = (entry.end.0 + 1).saturating_sub(entry.start.0);
                    if actual != expected || entry.duration != expected {
                        violations.push(ScheduleViolation::Duration {
                            job: label.clone(),
                            mode: entry.mode_label.clone(),
                            expected,
                            actual,
                        });
                    }
                }
            }
            if entry.start.0 == 0 || !horizon.contains(entry.end) {
                violations.push(ScheduleViolation::OutsideHorizon { job: label.clone() });
            }
        }

        for edge in instance.precedences() {
            let (Some(p), Some(q)) = (self.job(edge.predecessor), self.job(edge.successor)) else {
                continue;
            };
            if q.start.0 <= p.end.0 {
                violations.push(ScheduleViolation::Precedence {
                    predecessor: p.job_label.clone(),
                    successor: q.job_label.clone(),
                    end: p.end.0,
                    start: q.start.0,
                });
            }
        }

        for resource in instance.resources_of_kind(ResourceKind::Renewable) {
            let r = instance.resource(resource);
            for (i, &used) in self.resource_profile(instance, resource).iter().enumerate() {
                if used > u64::from(r.availability) {
                    violations.push(ScheduleViolation::RenewableOverload {
                        resource: r.label.clone(),
                        slot: i as u32 + 1,
                        used,
                        available: r.availability,
                    });
                }
            }
        }

        for resource in instance.resources_of_kind(ResourceKind::NonRenewable) {
            let r = instance.resource(resource);
            let used: u64 = self.resource_profile(instance, resource).iter().sum();
            if used > u64::from(r.availability) {
                violations.push(ScheduleViolation::NonRenewableOverload {
                    resource: r.label.clone(),
                    used,
                    available: r.availability,
                });
            }
        }

        let actual = self.jobs.iter().map(|j| j.end.0).max().unwrap_or(0);
        if actual != self.makespan {
            violations.push(ScheduleViolation::Makespan {
                reported: self.makespan,
                actual,
            });
        }

        violations
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for j in &self.jobs {
            writeln!(
                f,
                "{} mode {} slots {}..={} (duration {})",
                j.job_label, j.mode_label, j.start, j.end, j.duration
            )?;
        }
        write!(f, "makespan {}", self.makespan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::InstanceBuilder;

    fn instance() -> ProjectInstance {
        InstanceBuilder::new(8)
            .with_resource("R1", ResourceKind::Renewable, 3)
            .with_resource("NR1", ResourceKind::NonRenewable, 10)
            .with_mode("M1")
            .with_mode("M2")
            .with_job("A")
            .with_job("B")
            .with_mode_spec("A", "M1", 2, [("R1", 2), ("NR1", 1)])
            .with_mode_spec("B", "M1", 3, [("R1", 1), ("NR1", 2)])
            .with_mode_spec("B", "M2", 1, [("R1", 3), ("NR1", 5)])
            .with_precedence("A", "B")
            .build()
            .unwrap()
    }

    fn entry(job: usize, label: &str, mode: usize, start: u32, duration: u32) -> ScheduledJob {
        ScheduledJob {
            job: JobId(job),
            job_label: label.into(),
            mode: ModeId(mode),
            mode_label: format!("M{}", mode + 1),
            start: Slot(start),
            end: Slot(start + duration - 1),
            duration,
        }
    }

    #[test]
    fn test_valid_schedule() {
        let schedule = Schedule::new(vec![entry(0, "A", 0, 1, 2), entry(1, "B", 0, 3, 3)]);
        assert_eq!(schedule.makespan, 5);
        assert!(schedule.verify(&instance()).is_empty());
    }

    #[test]
    fn test_precedence_violation() {
        let schedule = Schedule::new(vec![entry(0, "A", 0, 1, 2), entry(1, "B", 0, 2, 3)]);
        let violations = schedule.verify(&instance());
        assert!(matches!(
            violations.as_slice(),
            [ScheduleViolation::Precedence { end: 2, start: 2, .. }]
        ));
    }

    #[test]
    fn test_capacity_violations() {
        let inst = InstanceBuilder::new(4)
            .with_resource("R1", ResourceKind::Renewable, 2)
            .with_resource("NR1", ResourceKind::NonRenewable, 3)
            .with_mode("M1")
            .with_job("A")
            .with_job("B")
            .with_mode_spec("A", "M1", 2, [("R1", 2), ("NR1", 1)])
            .with_mode_spec("B", "M1", 2, [("R1", 1), ("NR1", 1)])
            .build()
            .unwrap();
        let schedule = Schedule::new(vec![entry(0, "A", 0, 1, 2), entry(1, "B", 0, 2, 2)]);
        let violations = schedule.verify(&inst);
        assert!(violations.contains(&ScheduleViolation::RenewableOverload {
            resource: "R1".into(),
            slot: 2,
            used: 3,
            available: 2,
        }));
        assert!(violations.contains(&ScheduleViolation::NonRenewableOverload {
            resource: "NR1".into(),
            used: 4,
            available: 3,
        }));
    }

    #[test]
    fn test_missing_job_and_makespan() {
        let mut schedule = Schedule::new(vec![entry(0, "A", 0, 1, 2)]);
        schedule.makespan = 7;
        let violations = schedule.verify(&instance());
        assert!(violations.contains(&ScheduleViolation::MissingJob { job: "B".into() }));
        assert!(violations.contains(&ScheduleViolation::Makespan {
            reported: 7,
            actual: 2
        }));
    }

    #[test]
    fn test_slot_zero_is_outside_horizon() {
        let zero = ScheduledJob {
            start: Slot(0),
            end: Slot(1),
            ..entry(0, "A", 0, 1, 2)
        };
        let schedule = Schedule::new(vec![zero, entry(1, "B", 0, 3, 3)]);
        let inst = instance();
        let violations = schedule.verify(&inst);
        assert!(violations.contains(&ScheduleViolation::OutsideHorizon { job: "A".into() }));

        let r1 = inst.resource_by_label("R1").unwrap();
        assert_eq!(schedule.resource_profile(&inst, r1), vec![2, 0, 1, 1, 1, 0, 0, 0]);
    }

    #[test]
    fn test_inadmissible_mode() {
        let schedule = Schedule::new(vec![entry(0, "A", 1, 1, 2), entry(1, "B", 0, 3, 3)]);
        assert!(matches!(
            schedule.verify(&instance()).as_slice(),
            [ScheduleViolation::InadmissibleMode { .. }]
        ));
    }

    #[test]
    fn test_profile_and_active_jobs() {
        let inst = instance();
        let schedule = Schedule::new(vec![entry(0, "A", 0, 1, 2), entry(1, "B", 1, 3, 1)]);
        let r1 = inst.resource_by_label("R1").unwrap();
        assert_eq!(
            schedule.resource_profile(&inst, r1),
            vec![2, 2, 3, 0, 0, 0, 0, 0]
        );
        let active: Vec<_> = schedule.active_jobs(Slot(2)).map(|j| j.job).collect();
        assert_eq!(active, vec![JobId(0)]);
        assert!(schedule.active_jobs(Slot(4)).next().is_none());
    }

    #[test]
    fn test_assignments_and_display() {
        let schedule = Schedule::new(vec![entry(0, "A", 0, 1, 2), entry(1, "B", 1, 3, 1)]);
        let rows: Vec<_> = schedule.assignments().collect();
        assert_eq!(
            rows,
            vec![
                ("A", Slot(1), "M1", 2),
                ("A", Slot(2), "M1", 2),
                ("B", Slot(3), "M2", 1),
            ]
        );
        let text = schedule.to_string();
        assert!(text.starts_with("A mode M1 slots 1..=2 (duration 2)\n"));
        assert!(text.ends_with("makespan 3"));
    }
}
