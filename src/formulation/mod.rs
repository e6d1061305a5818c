//! Time-indexed MRCPSP formulation.
//!
//! Turns a [`ProjectInstance`](crate::instance::ProjectInstance) into an
//! explicit [`ConstraintSystem`]: binary `start`, `end`, `active` and
//! `mode` variables, an integer `makespan`, linear rows grouped by
//! [`ConstraintFamily`], and the objective "minimize makespan".
//!
//! The system is plain data. Any backend that accepts linear rows over
//! integer variables can solve it, and any assignment can be checked
//! against it with [`ConstraintSystem::check`].
//!
//! # References
//!
//! Pritsker, Watters & Wolfe (1969), "Multiproject Scheduling with Limited
//! Resources: A Zero-One Programming Approach"

mod assignment;
mod builder;
mod expr;
mod system;
mod variables;

pub use assignment::Assignment;
#[cfg(feature = "parallel")]
pub use builder::formulate_all;
pub use builder::{formulate, FormulationOptions, Formulator};
pub use expr::{ConstraintFamily, LinearConstraint, LinearExpr, Objective, Sense};
pub use system::{ConstraintSystem, Placement, Violation};
pub use variables::{VarId, VarKind, VarRole, Variable};
