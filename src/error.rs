//! Error types.
//!
//! Failures are grouped by where they originate: instance data
//! ([`DataError`]), solver and generator configuration ([`ConfigError`],
//! [`GenerateError`]), decoding of an
//! assignment ([`DecodeError`]), and the end-to-end solve
//! ([`SolveError`]), which wraps the others and carries solver statuses.

use thiserror::Error;

/// An instance violates the data-model invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("horizon must contain at least one slot")]
    EmptyHorizon,

    #[error("duplicate {entity} label: {label}")]
    DuplicateLabel { entity: &'static str, label: String },

    #[error("unknown job: {0}")]
    UnknownJob(String),

    #[error("unknown mode: {0}")]
    UnknownMode(String),

    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("job {0} has no admissible mode")]
    NoAdmissibleMode(String),

    #[error("job {job} mode {mode}: duration {duration} outside 1..={horizon}")]
    InvalidDuration {
        job: String,
        mode: String,
        duration: u32,
        horizon: u32,
    },

    #[error("job {job} mode {mode} is specified more than once")]
    DuplicateModeSpec { job: String, mode: String },
}

/// A solver or generator configuration value is out of range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("time_limit_seconds must be positive")]
    ZeroTimeLimit,

    #[error("absolute_gap must be non-negative, got {0}")]
    NegativeAbsoluteGap(f64),

    #[error("relative_gap must be in [0, 1], got {0}")]
    RelativeGapOutOfRange(f64),

    #[error("numeric_tolerance must be positive, got {0}")]
    NonPositiveTolerance(f64),

    #[error("{field} {start}..={end} is empty")]
    EmptyRange {
        field: &'static str,
        start: u32,
        end: u32,
    },

    #[error("duration_range must not include 0")]
    ZeroDuration,

    #[error("edge_probability must be in [0, 1], got {0}")]
    EdgeProbabilityOutOfRange(f64),
}

/// Random instance generation failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),
}

/// An assignment does not decode into a well-formed schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("job {job} is never active")]
    Idle { job: String },

    #[error("job {job} is active under several modes: {modes:?}")]
    MultipleModes { job: String, modes: Vec<String> },

    #[error("job {job} activity has a gap after slot {slot}")]
    Gap { job: String, slot: u32 },

    #[error("job {job} is active for {active} slots, mode {mode} lasts {duration}")]
    DurationMismatch {
        job: String,
        mode: String,
        active: u32,
        duration: u32,
    },

    #[error("job {job} has {count} start flags")]
    StartCount { job: String, count: usize },

    #[error("job {job} has {count} end flags")]
    EndCount { job: String, count: usize },

    #[error("job {job} start/end flags ({start}, {end}) do not bound its active run ({first}, {last})")]
    BoundaryMismatch {
        job: String,
        start: u32,
        end: u32,
        first: u32,
        last: u32,
    },

    #[error("job {job} runs in mode {mode} but its mode flags disagree")]
    ModeFlagMismatch { job: String, mode: String },

    #[error("assignment has {actual} values, system has {expected} variables")]
    SizeMismatch { expected: usize, actual: usize },
}

/// End-to-end solve failure.
///
/// Solver statuses other than a found solution are surfaced as-is; none
/// of them is retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("no schedule satisfies all constraints")]
    Infeasible,

    #[error("solver reported the model as unbounded")]
    Unbounded,

    #[error("time limit of {seconds}s reached without a feasible schedule")]
    TimeLimit { seconds: u64 },

    #[error("solver error: {0}")]
    Solver(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
