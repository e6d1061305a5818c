//! Label-based instance construction and validation.

use super::types::{Horizon, Job, JobId, ModeSpec, PrecedenceEdge, Resource, ResourceKind};
use super::ProjectInstance;
use crate::error::DataError;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct ResourceDecl {
    label: String,
    kind: ResourceKind,
    availability: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct ModeSpecDecl {
    job: String,
    mode: String,
    duration: u32,
    needs: Vec<(String, u32)>,
}

/// Collects raw instance data keyed by labels and validates it into a
/// [`ProjectInstance`].
///
/// Nothing is checked until [`build`](Self::build), which reports the
/// first invariant violation found.
///
/// # Examples
///
/// ```
/// use u_mrcpsp::instance::{InstanceBuilder, ResourceKind};
///
/// let instance = InstanceBuilder::new(10)
///     .with_resource("R1", ResourceKind::Renewable, 4)
///     .with_resource("NR1", ResourceKind::NonRenewable, 20)
///     .with_mode("M1")
///     .with_mode("M2")
///     .with_job("J1")
///     .with_mode_spec("J1", "M1", 3, [("R1", 2), ("NR1", 1)])
///     .with_mode_spec("J1", "M2", 2, [("R1", 4), ("NR1", 2)])
///     .build()
///     .unwrap();
/// assert_eq!(instance.job_count(), 1);
/// assert_eq!(instance.mode_count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceBuilder {
    horizon: u32,
    resources: Vec<ResourceDecl>,
    modes: Vec<String>,
    jobs: Vec<String>,
    mode_specs: Vec<ModeSpecDecl>,
    precedences: Vec<(String, String)>,
}

impl InstanceBuilder {
    /// Starts an instance with `horizon` slots.
    pub fn new(horizon: u32) -> Self {
        Self {
            horizon,
            ..Self::default()
        }
    }

    pub fn with_resource(
        mut self,
        label: impl Into<String>,
        kind: ResourceKind,
        availability: u32,
    ) -> Self {
        self.resources.push(ResourceDecl {
            label: label.into(),
            kind,
            availability,
        });
        self
    }

    /// Declares a mode label. Modes are shared by all jobs; each job
    /// opts into a mode with [`with_mode_spec`](Self::with_mode_spec).
    pub fn with_mode(mut self, label: impl Into<String>) -> Self {
        self.modes.push(label.into());
        self
    }

    pub fn with_job(mut self, label: impl Into<String>) -> Self {
        self.jobs.push(label.into());
        self
    }

    /// Makes `mode` admissible for `job` with the given duration and needs.
    /// Resources not listed in `needs` are not consumed.
    pub fn with_mode_spec<I, S>(
        mut self,
        job: impl Into<String>,
        mode: impl Into<String>,
        duration: u32,
        needs: I,
    ) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        self.mode_specs.push(ModeSpecDecl {
            job: job.into(),
            mode: mode.into(),
            duration,
            needs: needs.into_iter().map(|(r, q)| (r.into(), q)).collect(),
        });
        self
    }

    /// Requires `successor` to start after `predecessor` has ended.
    ///
    /// A self-referential edge is accepted here and discarded by
    /// [`build`](Self::build).
    pub fn with_precedence(
        mut self,
        predecessor: impl Into<String>,
        successor: impl Into<String>,
    ) -> Self {
        self.precedences.push((predecessor.into(), successor.into()));
        self
    }

    /// Validates the collected data and builds the immutable instance.
    pub fn build(&self) -> Result<ProjectInstance, DataError> {
        if self.horizon == 0 {
            return Err(DataError::EmptyHorizon);
        }

        let resource_index = index_labels("resource", self.resources.iter().map(|r| &r.label))?;
        let mode_index = index_labels("mode", self.modes.iter())?;
        let job_index = index_labels("job", self.jobs.iter())?;

        let resources: Vec<Resource> = self
            .resources
            .iter()
            .map(|r| Resource {
                label: r.label.clone(),
                kind: r.kind,
                availability: r.availability,
            })
            .collect();

        let mut jobs: Vec<Job> = self
            .jobs
            .iter()
            .map(|label| Job {
                label: label.clone(),
                modes: vec![None; self.modes.len()],
            })
            .collect();

        for decl in &self.mode_specs {
            let j = *job_index
                .get(decl.job.as_str())
                .ok_or_else(|| DataError::UnknownJob(decl.job.clone()))?;
            let m = *mode_index
                .get(decl.mode.as_str())
                .ok_or_else(|| DataError::UnknownMode(decl.mode.clone()))?;

            if decl.duration == 0 || decl.duration > self.horizon {
                return Err(DataError::InvalidDuration {
                    job: decl.job.clone(),
                    mode: decl.mode.clone(),
                    duration: decl.duration,
                    horizon: self.horizon,
                });
            }

            let mut needs = vec![0; resources.len()];
            for (label, quantity) in &decl.needs {
                let r = *resource_index
                    .get(label.as_str())
                    .ok_or_else(|| DataError::UnknownResource(label.clone()))?;
                needs[r] = *quantity;
            }

            let slot = &mut jobs[j].modes[m];
            if slot.is_some() {
                return Err(DataError::DuplicateModeSpec {
                    job: decl.job.clone(),
                    mode: decl.mode.clone(),
                });
            }
            *slot = Some(ModeSpec {
                duration: decl.duration,
                needs,
            });
        }

        if let Some(job) = jobs.iter().find(|j| j.modes.iter().all(Option::is_none)) {
            return Err(DataError::NoAdmissibleMode(job.label.clone()));
        }

        let mut edges = BTreeSet::new();
        for (pred, succ) in &self.precedences {
            let p = *job_index
                .get(pred.as_str())
                .ok_or_else(|| DataError::UnknownJob(pred.clone()))?;
            let s = *job_index
                .get(succ.as_str())
                .ok_or_else(|| DataError::UnknownJob(succ.clone()))?;
            if p == s {
                warn!(job = %pred, "ignoring self-referential precedence edge");
                continue;
            }
            edges.insert(PrecedenceEdge {
                predecessor: JobId(p),
                successor: JobId(s),
            });
        }

        debug!(
            jobs = jobs.len(),
            modes = self.modes.len(),
            resources = resources.len(),
            edges = edges.len(),
            horizon = self.horizon,
            "instance built"
        );

        Ok(ProjectInstance::from_parts(
            Horizon::new(self.horizon),
            jobs,
            self.modes.clone(),
            resources,
            edges.into_iter().collect(),
        ))
    }
}

fn index_labels<'a>(
    entity: &'static str,
    labels: impl Iterator<Item = &'a String>,
) -> Result<HashMap<&'a str, usize>, DataError> {
    let mut index = HashMap::new();
    for (i, label) in labels.enumerate() {
        if index.insert(label.as_str(), i).is_some() {
            return Err(DataError::DuplicateLabel {
                entity,
                label: label.clone(),
            });
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> InstanceBuilder {
        InstanceBuilder::new(9)
            .with_resource("R1", ResourceKind::Renewable, 100)
            .with_resource("NR1", ResourceKind::NonRenewable, 100)
            .with_mode("M1")
            .with_job("J1")
            .with_job("J2")
            .with_mode_spec("J1", "M1", 2, [("R1", 3), ("NR1", 5)])
            .with_mode_spec("J2", "M1", 3, [("R1", 3), ("NR1", 5)])
    }

    #[test]
    fn test_build_ok() {
        let instance = base().with_precedence("J1", "J2").build().unwrap();
        assert_eq!(instance.job_count(), 2);
        assert_eq!(instance.precedences().len(), 1);
        assert_eq!(instance.horizon().len(), 9);
    }

    #[test]
    fn test_empty_horizon() {
        let err = InstanceBuilder::new(0).build().unwrap_err();
        assert_eq!(err, DataError::EmptyHorizon);
    }

    #[test]
    fn test_self_loop_dropped() {
        let instance = base()
            .with_precedence("J1", "J1")
            .with_precedence("J1", "J2")
            .build()
            .unwrap();
        assert_eq!(instance.precedences().len(), 1);
        assert_eq!(instance.precedences()[0].predecessor, JobId(0));
        assert_eq!(instance.precedences()[0].successor, JobId(1));
    }

    #[test]
    fn test_duplicate_edges_collapsed() {
        let instance = base()
            .with_precedence("J1", "J2")
            .with_precedence("J1", "J2")
            .build()
            .unwrap();
        assert_eq!(instance.precedences().len(), 1);
    }

    #[test]
    fn test_zero_duration_rejected() {
        let err = base()
            .with_job("J3")
            .with_mode_spec("J3", "M1", 0, [("R1", 1)])
            .build()
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidDuration { duration: 0, .. }));
    }

    #[test]
    fn test_duration_beyond_horizon_rejected() {
        let err = base()
            .with_job("J3")
            .with_mode_spec("J3", "M1", 10, [("R1", 1)])
            .build()
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidDuration { duration: 10, horizon: 9, .. }));
    }

    #[test]
    fn test_job_without_mode_rejected() {
        let err = base().with_job("J3").build().unwrap_err();
        assert_eq!(err, DataError::NoAdmissibleMode("J3".into()));
    }

    #[test]
    fn test_undeclared_mode_rejected() {
        // Mode declared as M2 while the data refers to M1.
        let err = InstanceBuilder::new(9)
            .with_resource("R1", ResourceKind::Renewable, 100)
            .with_mode("M2")
            .with_job("J1")
            .with_mode_spec("J1", "M1", 2, [("R1", 3)])
            .build()
            .unwrap_err();
        assert_eq!(err, DataError::UnknownMode("M1".into()));
    }

    #[test]
    fn test_unknown_references() {
        let err = base()
            .with_mode_spec("J9", "M1", 1, Vec::<(String, u32)>::new())
            .build()
            .unwrap_err();
        assert_eq!(err, DataError::UnknownJob("J9".into()));

        let err = base()
            .with_job("J3")
            .with_mode_spec("J3", "M1", 1, [("R9", 1)])
            .build()
            .unwrap_err();
        assert_eq!(err, DataError::UnknownResource("R9".into()));

        let err = base().with_precedence("J1", "J7").build().unwrap_err();
        assert_eq!(err, DataError::UnknownJob("J7".into()));
    }

    #[test]
    fn test_duplicates_rejected() {
        let err = base().with_job("J1").build().unwrap_err();
        assert!(matches!(err, DataError::DuplicateLabel { entity: "job", .. }));

        let err = base()
            .with_mode_spec("J1", "M1", 1, [("R1", 1)])
            .build()
            .unwrap_err();
        assert!(matches!(err, DataError::DuplicateModeSpec { .. }));
    }
}
