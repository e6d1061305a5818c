//! Variable assignments returned by solvers.

use super::variables::VarId;

/// A value for every variable of a system, indexed by [`VarId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<i64>,
}

impl Assignment {
    /// All-zero assignment for `len` variables.
    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0; len],
        }
    }

    pub fn from_values(values: Vec<i64>) -> Self {
        Self { values }
    }

    /// Value of `var`; variables beyond the end read as zero.
    pub fn value(&self, var: VarId) -> i64 {
        self.values.get(var.0).copied().unwrap_or(0)
    }

    /// Whether `var` is nonzero.
    pub fn is_set(&self, var: VarId) -> bool {
        self.value(var) != 0
    }

    pub fn set(&mut self, var: VarId, value: i64) {
        self.values[var.0] = value;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }
}
