//! Seeded random instance generation.
//!
//! Produces test and benchmark instances: durations and needs drawn
//! uniformly from configurable ranges, and forward-only precedence edges
//! so the precedence graph is always acyclic. Generation is a fixture
//! concern; the formulator never calls it.

use super::builder::InstanceBuilder;
use super::types::ResourceKind;
use super::ProjectInstance;
use crate::error::{ConfigError, GenerateError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;

/// Parameters for [`InstanceGenerator`].
///
/// The defaults reproduce an 18-job, 2-mode, 30-slot project with two
/// renewable and two non-renewable resources of capacity 100, durations
/// and needs in `1..=4`.
///
/// # Examples
///
/// ```
/// use u_mrcpsp::instance::{GeneratorConfig, InstanceGenerator};
///
/// let config = GeneratorConfig::default()
///     .with_jobs(6)
///     .with_horizon(40)
///     .with_seed(7);
/// let a = InstanceGenerator::new(config.clone()).generate().unwrap();
/// let b = InstanceGenerator::new(config).generate().unwrap();
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of jobs.
    pub jobs: usize,
    /// Number of modes; every job is admissible in every mode.
    pub modes: usize,
    /// Number of renewable resources.
    pub renewable: usize,
    /// Number of non-renewable resources.
    pub non_renewable: usize,
    /// Horizon length in slots.
    pub horizon: u32,
    /// Range of mode durations. Clamped to the horizon.
    pub duration_range: RangeInclusive<u32>,
    /// Range of per-slot needs.
    pub need_range: RangeInclusive<u32>,
    /// Capacity of every resource.
    pub availability: u32,
    /// Probability of an edge `i -> j` for each pair `i < j`.
    pub edge_probability: f64,
    /// Random seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            jobs: 18,
            modes: 2,
            renewable: 2,
            non_renewable: 2,
            horizon: 30,
            duration_range: 1..=4,
            need_range: 1..=4,
            availability: 100,
            edge_probability: 0.15,
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn with_jobs(mut self, n: usize) -> Self {
        self.jobs = n;
        self
    }

    pub fn with_modes(mut self, n: usize) -> Self {
        self.modes = n;
        self
    }

    pub fn with_resources(mut self, renewable: usize, non_renewable: usize) -> Self {
        self.renewable = renewable;
        self.non_renewable = non_renewable;
        self
    }

    pub fn with_horizon(mut self, slots: u32) -> Self {
        self.horizon = slots;
        self
    }

    pub fn with_duration_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.duration_range = range;
        self
    }

    pub fn with_need_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.need_range = range;
        self
    }

    pub fn with_availability(mut self, availability: u32) -> Self {
        self.availability = availability;
        self
    }

    pub fn with_edge_probability(mut self, p: f64) -> Self {
        self.edge_probability = p;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_range.is_empty() {
            return Err(ConfigError::EmptyRange {
                field: "duration_range",
                start: *self.duration_range.start(),
                end: *self.duration_range.end(),
            });
        }
        if *self.duration_range.start() == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        if self.need_range.is_empty() {
            return Err(ConfigError::EmptyRange {
                field: "need_range",
                start: *self.need_range.start(),
                end: *self.need_range.end(),
            });
        }
        if !(0.0..=1.0).contains(&self.edge_probability) {
            return Err(ConfigError::EdgeProbabilityOutOfRange(self.edge_probability));
        }
        Ok(())
    }
}

/// Generates random [`ProjectInstance`]s from a [`GeneratorConfig`].
pub struct InstanceGenerator {
    config: GeneratorConfig,
}

impl InstanceGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Draws one instance. With a fixed seed the result is deterministic.
    pub fn generate(&self) -> Result<ProjectInstance, GenerateError> {
        let cfg = &self.config;
        cfg.validate()?;
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random()),
        };

        let resource_labels: Vec<String> = (1..=cfg.renewable)
            .map(|i| format!("R{i}"))
            .chain((1..=cfg.non_renewable).map(|i| format!("NR{i}")))
            .collect();
        let mode_labels: Vec<String> = (1..=cfg.modes).map(|i| format!("M{i}")).collect();
        let job_labels: Vec<String> = (1..=cfg.jobs).map(|i| format!("J{i}")).collect();

        let mut builder = InstanceBuilder::new(cfg.horizon);
        for (i, label) in resource_labels.iter().enumerate() {
            let kind = if i < cfg.renewable {
                ResourceKind::Renewable
            } else {
                ResourceKind::NonRenewable
            };
            builder = builder.with_resource(label.clone(), kind, cfg.availability);
        }
        for label in &mode_labels {
            builder = builder.with_mode(label.clone());
        }
        for label in &job_labels {
            builder = builder.with_job(label.clone());
        }

        let max_duration = cfg.horizon.max(1);
        for job in &job_labels {
            for mode in &mode_labels {
                let duration = rng.random_range(cfg.duration_range.clone()).min(max_duration);
                let needs: Vec<(String, u32)> = resource_labels
                    .iter()
                    .map(|r| (r.clone(), rng.random_range(cfg.need_range.clone())))
                    .collect();
                builder = builder.with_mode_spec(job.clone(), mode.clone(), duration, needs);
            }
        }

        for i in 0..cfg.jobs {
            for j in (i + 1)..cfg.jobs {
                if rng.random_bool(cfg.edge_probability) {
                    builder = builder.with_precedence(job_labels[i].clone(), job_labels[j].clone());
                }
            }
        }

        Ok(builder.build()?)
    }
}
