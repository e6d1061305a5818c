//! Problem instance (domain data model).
//!
//! A [`ProjectInstance`] holds jobs, the shared mode set, resources,
//! precedence edges and the slot horizon. It is built once through
//! [`InstanceBuilder`], which enforces the data invariants, and is
//! immutable afterwards.
//!
//! All entities are addressed by dense indices ([`JobId`], [`ModeId`],
//! [`ResourceId`], [`Slot`]); labels are kept only for display.

mod builder;
pub mod generator;
mod types;

pub use builder::InstanceBuilder;
pub use generator::{GeneratorConfig, InstanceGenerator};
pub use types::{
    Horizon, Job, JobId, ModeId, ModeSpec, PrecedenceEdge, Resource, ResourceId, ResourceKind,
    Slot,
};

use std::collections::VecDeque;

/// A validated MRCPSP instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProjectInstance {
    horizon: Horizon,
    jobs: Vec<Job>,
    mode_labels: Vec<String>,
    resources: Vec<Resource>,
    precedences: Vec<PrecedenceEdge>,
    #[cfg_attr(feature = "serde", serde(skip))]
    predecessors: Vec<Vec<JobId>>,
    #[cfg_attr(feature = "serde", serde(skip))]
    successors: Vec<Vec<JobId>>,
}

impl ProjectInstance {
    pub(crate) fn from_parts(
        horizon: Horizon,
        jobs: Vec<Job>,
        mode_labels: Vec<String>,
        resources: Vec<Resource>,
        precedences: Vec<PrecedenceEdge>,
    ) -> Self {
        let mut predecessors = vec![Vec::new(); jobs.len()];
        let mut successors = vec![Vec::new(); jobs.len()];
        for edge in &precedences {
            predecessors[edge.successor.0].push(edge.predecessor);
            successors[edge.predecessor.0].push(edge.successor);
        }
        Self {
            horizon,
            jobs,
            mode_labels,
            resources,
            precedences,
            predecessors,
            successors,
        }
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, job: JobId) -> &Job {
        &self.jobs[job.0]
    }

    pub fn job_ids(&self) -> impl Iterator<Item = JobId> + Clone {
        (0..self.jobs.len()).map(JobId)
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn mode_labels(&self) -> &[String] {
        &self.mode_labels
    }

    pub fn mode_ids(&self) -> impl Iterator<Item = ModeId> + Clone {
        (0..self.mode_labels.len()).map(ModeId)
    }

    pub fn mode_count(&self) -> usize {
        self.mode_labels.len()
    }

    pub fn mode_label(&self, mode: ModeId) -> &str {
        &self.mode_labels[mode.0]
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resource(&self, resource: ResourceId) -> &Resource {
        &self.resources[resource.0]
    }

    pub fn resource_ids(&self) -> impl Iterator<Item = ResourceId> + Clone {
        (0..self.resources.len()).map(ResourceId)
    }

    /// Resources of the given kind, in index order.
    pub fn resources_of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = ResourceId> + '_ {
        self.resource_ids()
            .filter(move |&r| self.resources[r.0].kind == kind)
    }

    /// Precedence edges, sorted by (predecessor, successor), without
    /// self-loops or duplicates.
    pub fn precedences(&self) -> &[PrecedenceEdge] {
        &self.precedences
    }

    pub fn predecessors(&self, job: JobId) -> &[JobId] {
        &self.predecessors[job.0]
    }

    pub fn successors(&self, job: JobId) -> &[JobId] {
        &self.successors[job.0]
    }

    /// Spec of `job` in `mode`, if the mode is admissible for the job.
    pub fn mode_spec(&self, job: JobId, mode: ModeId) -> Option<&ModeSpec> {
        self.jobs[job.0].mode(mode)
    }

    /// Duration of `job` in `mode`, if admissible.
    pub fn duration(&self, job: JobId, mode: ModeId) -> Option<u32> {
        self.mode_spec(job, mode).map(|s| s.duration)
    }

    /// Need of `job` in `mode` for `resource`; zero when the mode is not
    /// admissible.
    pub fn need(&self, job: JobId, mode: ModeId, resource: ResourceId) -> u32 {
        self.mode_spec(job, mode).map_or(0, |s| s.need(resource))
    }

    pub fn job_by_label(&self, label: &str) -> Option<JobId> {
        self.jobs.iter().position(|j| j.label == label).map(JobId)
    }

    pub fn mode_by_label(&self, label: &str) -> Option<ModeId> {
        self.mode_labels.iter().position(|m| m == label).map(ModeId)
    }

    pub fn resource_by_label(&self, label: &str) -> Option<ResourceId> {
        self.resources
            .iter()
            .position(|r| r.label == label)
            .map(ResourceId)
    }

    /// Jobs ordered so every predecessor comes before its successors
    /// (Kahn's algorithm, lowest index first among ready jobs).
    ///
    /// Returns `None` if the precedence graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<JobId>> {
        let n = self.jobs.len();
        let mut in_degree: Vec<usize> = self.predecessors.iter().map(Vec::len).collect();
        let mut ready: VecDeque<JobId> = (0..n)
            .filter(|&j| in_degree[j] == 0)
            .map(JobId)
            .collect();
        let mut order = Vec::with_capacity(n);

        while let Some(job) = ready.pop_front() {
            order.push(job);
            for &succ in &self.successors[job.0] {
                in_degree[succ.0] -= 1;
                if in_degree[succ.0] == 0 {
                    ready.push_back(succ);
                }
            }
        }

        (order.len() == n).then_some(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> ProjectInstance {
        InstanceBuilder::new(9)
            .with_resource("R1", ResourceKind::Renewable, 100)
            .with_resource("NR1", ResourceKind::NonRenewable, 100)
            .with_mode("M1")
            .with_job("J1")
            .with_job("J2")
            .with_job("J3")
            .with_mode_spec("J1", "M1", 2, [("R1", 3), ("NR1", 5)])
            .with_mode_spec("J2", "M1", 3, [("R1", 3), ("NR1", 5)])
            .with_mode_spec("J3", "M1", 4, [("R1", 3), ("NR1", 5)])
            .with_precedence("J2", "J3")
            .with_precedence("J1", "J2")
            .build()
            .unwrap()
    }

    #[test]
    fn test_lookups() {
        let inst = chain();
        let j2 = inst.job_by_label("J2").unwrap();
        let m1 = inst.mode_by_label("M1").unwrap();
        let nr1 = inst.resource_by_label("NR1").unwrap();
        assert_eq!(inst.duration(j2, m1), Some(3));
        assert_eq!(inst.need(j2, m1, nr1), 5);
        assert_eq!(inst.predecessors(j2), &[JobId(0)]);
        assert_eq!(inst.successors(j2), &[JobId(2)]);
        assert!(inst.mode_by_label("M2").is_none());
    }

    #[test]
    fn test_resources_of_kind() {
        let inst = chain();
        let renewable: Vec<_> = inst.resources_of_kind(ResourceKind::Renewable).collect();
        let non_renewable: Vec<_> = inst.resources_of_kind(ResourceKind::NonRenewable).collect();
        assert_eq!(renewable, vec![ResourceId(0)]);
        assert_eq!(non_renewable, vec![ResourceId(1)]);
    }

    #[test]
    fn test_topological_order() {
        let inst = chain();
        assert_eq!(
            inst.topological_order(),
            Some(vec![JobId(0), JobId(1), JobId(2)])
        );
    }

    #[test]
    fn test_topological_order_cycle() {
        let inst = InstanceBuilder::new(5)
            .with_mode("M1")
            .with_job("A")
            .with_job("B")
            .with_mode_spec("A", "M1", 1, Vec::<(String, u32)>::new())
            .with_mode_spec("B", "M1", 1, Vec::<(String, u32)>::new())
            .with_precedence("A", "B")
            .with_precedence("B", "A")
            .build()
            .unwrap();
        assert!(inst.topological_order().is_none());
    }
}
