//! Multi-mode resource-constrained project scheduling (MRCPSP).
//!
//! Builds a time-indexed 0/1 formulation of the MRCPSP, hands it to a
//! pluggable solver, and decodes the returned assignment into a schedule:
//!
//! - **Instance**: jobs, modes, renewable / non-renewable resources,
//!   precedence edges and a discrete slot horizon, validated once and
//!   immutable afterwards.
//! - **Formulation**: the variable schema (`start`, `end`, `active`,
//!   `mode`, `makespan`), thirteen constraint families and the makespan
//!   objective, as explicit data.
//! - **Solver**: the [`solver::Solver`] trait, solver configuration and
//!   status, a built-in branch-and-bound search, an LP-file exporter and an
//!   adapter for the COIN-OR CBC binary.
//! - **Decode**: turns an assignment back into a per-job schedule and
//!   verifies it is well formed.
//! - **Pipeline**: formulate → solve → decode with solver statuses
//!   propagated unchanged.
//!
//! # Example
//!
//! ```
//! use u_mrcpsp::instance::{InstanceBuilder, ResourceKind};
//! use u_mrcpsp::pipeline::solve_instance;
//! use u_mrcpsp::solver::{SearchSolver, SolverConfig};
//!
//! let instance = InstanceBuilder::new(9)
//!     .with_resource("R1", ResourceKind::Renewable, 100)
//!     .with_mode("M1")
//!     .with_job("J1")
//!     .with_job("J2")
//!     .with_mode_spec("J1", "M1", 2, [("R1", 3)])
//!     .with_mode_spec("J2", "M1", 3, [("R1", 3)])
//!     .with_precedence("J1", "J2")
//!     .build()
//!     .unwrap();
//!
//! let solved = solve_instance(&instance, &SearchSolver::new(), &SolverConfig::default()).unwrap();
//! assert_eq!(solved.makespan, 5);
//! assert!(solved.proven_optimal);
//! ```
//!
//! # References
//!
//! - Pritsker, Watters & Wolfe (1969), "Multiproject Scheduling with Limited
//!   Resources: A Zero-One Programming Approach"
//! - Talbot (1982), "Resource-Constrained Project Scheduling with
//!   Time-Resource Tradeoffs: The Nonpreemptive Case"

pub mod decode;
pub mod error;
pub mod formulation;
pub mod instance;
pub mod pipeline;
pub mod solver;
