//! Solution decoding.
//!
//! Reads the `active`, `start`, `end` and `mode` values of an assignment
//! back into one [`ScheduledJob`] per job. The decoder does not trust the
//! solver: every job must run in exactly one mode, over a contiguous run
//! of slots as long as that mode's duration, with its start and end flags
//! on the first and last slot of the run.

mod schedule;

pub use schedule::{Schedule, ScheduleViolation, ScheduledJob};

use crate::error::DecodeError;
use crate::formulation::{Assignment, ConstraintSystem};
use crate::instance::{JobId, Slot};

/// Decodes `assignment` into a schedule.
///
/// # Errors
///
/// Returns the first [`DecodeError`] found, scanning jobs in order.
pub fn decode(system: &ConstraintSystem, assignment: &Assignment) -> Result<Schedule, DecodeError> {
    if assignment.len() != system.variable_count() {
        return Err(DecodeError::SizeMismatch {
            expected: system.variable_count(),
            actual: assignment.len(),
        });
    }

    let jobs = system
        .instance()
        .job_ids()
        .map(|job| decode_job(system, assignment, job))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Schedule::new(jobs))
}

fn decode_job(
    system: &ConstraintSystem,
    assignment: &Assignment,
    job: JobId,
) -> Result<ScheduledJob, DecodeError> {
    let instance = system.instance();
    let horizon = instance.horizon();
    let label = &instance.job(job).label;

    let mut runs = Vec::new();
    for (mode, spec) in instance.job(job).admissible_modes() {
        let slots: Vec<Slot> = horizon
            .slots()
            .filter(|&s| {
                system
                    .active(job, s, mode)
                    .is_some_and(|var| assignment.is_set(var))
            })
            .collect();
        if !slots.is_empty() {
            runs.push((mode, spec.duration, slots));
        }
    }

    let (mode, duration, slots) = match runs.len() {
        0 => return Err(DecodeError::Idle { job: label.clone() }),
        1 => runs.remove(0),
        _ => {
            return Err(DecodeError::MultipleModes {
                job: label.clone(),
                modes: runs
                    .iter()
                    .map(|(m, _, _)| instance.mode_label(*m).to_string())
                    .collect(),
            })
        }
    };
    let mode_label = instance.mode_label(mode);

    if let Some(w) = slots.windows(2).find(|w| w[1].0 != w[0].0 + 1) {
        return Err(DecodeError::Gap {
            job: label.clone(),
            slot: w[0].0,
        });
    }
    let active = slots.len() as u32;
    if active != duration {
        return Err(DecodeError::DurationMismatch {
            job: label.clone(),
            mode: mode_label.to_string(),
            active,
            duration,
        });
    }

    let starts: Vec<Slot> = horizon
        .slots()
        .filter(|&s| assignment.is_set(system.start(job, s)))
        .collect();
    if starts.len() != 1 {
        return Err(DecodeError::StartCount {
            job: label.clone(),
            count: starts.len(),
        });
    }
    let ends: Vec<Slot> = horizon
        .slots()
        .filter(|&s| assignment.is_set(system.end(job, s)))
        .collect();
    if ends.len() != 1 {
        return Err(DecodeError::EndCount {
            job: label.clone(),
            count: ends.len(),
        });
    }

    // `slots` is non-empty and contiguous here.
    let (first, last) = (slots[0], slots[slots.len() - 1]);
    let (start, end) = (starts[0], ends[0]);
    if start != first || end != last {
        return Err(DecodeError::BoundaryMismatch {
            job: label.clone(),
            start: start.0,
            end: end.0,
            first: first.0,
            last: last.0,
        });
    }

    let flags_agree = instance.job(job).admissible_modes().all(|(m, _)| {
        let set = system
            .mode_chosen(job, m)
            .is_some_and(|var| assignment.is_set(var));
        set == (m == mode)
    });
    if !flags_agree {
        return Err(DecodeError::ModeFlagMismatch {
            job: label.clone(),
            mode: mode_label.to_string(),
        });
    }

    Ok(ScheduledJob {
        job,
        job_label: label.clone(),
        mode,
        mode_label: mode_label.to_string(),
        start,
        end,
        duration,
    })
}
