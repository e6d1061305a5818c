//! Solver configuration.

use crate::error::ConfigError;
use std::time::Duration;

/// Options handed to a [`Solver`](super::Solver) unchanged.
///
/// The defaults ask for a proven optimum within a 20-minute budget.
/// [`SolverConfig::relaxed`] reproduces the looser tolerances typically
/// given to an external MILP binary.
///
/// # Examples
///
/// ```
/// use u_mrcpsp::solver::SolverConfig;
///
/// let config = SolverConfig::default()
///     .with_time_limit_seconds(30)
///     .with_relative_gap(0.05);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Wall-clock budget for the search.
    pub time_limit_seconds: u64,

    /// Stop once the incumbent is within this additive distance of the
    /// best bound.
    pub absolute_gap: f64,

    /// Stop once the incumbent is within this fraction of itself from the
    /// best bound (0.01 = 1%).
    pub relative_gap: f64,

    /// Feasibility/optimality tolerance of the underlying numeric solve.
    pub numeric_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_seconds: 1200,
            absolute_gap: 0.0,
            relative_gap: 0.0,
            numeric_tolerance: 1e-7,
        }
    }
}

impl SolverConfig {
    /// 1200 s, absolute gap 100, relative gap 1%, tolerance 1e-7.
    pub fn relaxed() -> Self {
        Self {
            absolute_gap: 100.0,
            relative_gap: 0.01,
            ..Self::default()
        }
    }

    pub fn with_time_limit_seconds(mut self, seconds: u64) -> Self {
        self.time_limit_seconds = seconds;
        self
    }

    pub fn with_absolute_gap(mut self, gap: f64) -> Self {
        self.absolute_gap = gap;
        self
    }

    pub fn with_relative_gap(mut self, gap: f64) -> Self {
        self.relative_gap = gap;
        self
    }

    pub fn with_numeric_tolerance(mut self, tolerance: f64) -> Self {
        self.numeric_tolerance = tolerance;
        self
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_seconds)
    }

    /// Whether an incumbent of value `incumbent` is close enough to
    /// `bound` to stop.
    pub fn within_gap(&self, incumbent: i64, bound: i64) -> bool {
        let gap = (incumbent - bound).max(0) as f64;
        gap <= self.absolute_gap || gap <= self.relative_gap * (incumbent.unsigned_abs() as f64)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.time_limit_seconds == 0 {
            return Err(ConfigError::ZeroTimeLimit);
        }
        if !(self.absolute_gap >= 0.0) {
            return Err(ConfigError::NegativeAbsoluteGap(self.absolute_gap));
        }
        if !(0.0..=1.0).contains(&self.relative_gap) {
            return Err(ConfigError::RelativeGapOutOfRange(self.relative_gap));
        }
        if !(self.numeric_tolerance > 0.0) {
            return Err(ConfigError::NonPositiveTolerance(self.numeric_tolerance));
        }
        Ok(())
    }
}
