//! Solver interface and backends.
//!
//! # Key Components
//!
//! - **Interface**: [`Solver`] trait, [`SolverConfig`], [`SolverStatus`],
//!   [`SolverOutcome`]
//! - **Built-in**: [`SearchSolver`], exact branch and bound in-process
//! - **External**: [`CbcSolver`] runs COIN-OR CBC on an LP export
//!   ([`lp::write_lp`])
//!
//! Solvers receive the configuration unchanged and block until a status is
//! available; the time limit is the only cancellation.

mod cbc;
mod config;
pub mod lp;
mod search;
mod types;

pub use cbc::{lower_bound, parse_solution, CbcSolver};
pub use config::SolverConfig;
pub use search::SearchSolver;
pub use types::{Solver, SolverOutcome, SolverStatus};
