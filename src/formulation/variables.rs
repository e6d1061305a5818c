//! Decision variables of the time-indexed formulation.

use crate::instance::{JobId, ModeId, Slot};

/// Dense variable index into a [`ConstraintSystem`](super::ConstraintSystem).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub usize);

/// Domain of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    /// Takes 0 or 1.
    Binary,
    /// Integer in `[lower, upper]`.
    Integer { lower: i64, upper: i64 },
}

impl VarKind {
    /// Whether `value` lies in the domain.
    pub fn admits(&self, value: i64) -> bool {
        match *self {
            VarKind::Binary => value == 0 || value == 1,
            VarKind::Integer { lower, upper } => (lower..=upper).contains(&value),
        }
    }
}

/// What a variable stands for in the scheduling model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarRole {
    /// 1 iff `job` starts in `slot`.
    Start { job: JobId, slot: Slot },
    /// 1 iff `job` ends in `slot`.
    End { job: JobId, slot: Slot },
    /// 1 iff `job` is executed in `slot` under `mode`.
    Active { job: JobId, slot: Slot, mode: ModeId },
    /// 1 iff `job` uses `mode`.
    ModeChosen { job: JobId, mode: ModeId },
    /// Latest end slot over all jobs.
    Makespan,
}

/// A named decision variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// Readable name, e.g. `active[J1,3,M2]`. Unique within a system.
    pub name: String,
    pub kind: VarKind,
    pub role: VarRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_domain() {
        assert!(VarKind::Binary.admits(0));
        assert!(VarKind::Binary.admits(1));
        assert!(!VarKind::Binary.admits(2));
        assert!(!VarKind::Binary.admits(-1));
    }

    #[test]
    fn test_integer_domain() {
        let kind = VarKind::Integer { lower: 0, upper: 9 };
        assert!(kind.admits(0));
        assert!(kind.admits(9));
        assert!(!kind.admits(10));
        assert!(!kind.admits(-1));
    }
}
