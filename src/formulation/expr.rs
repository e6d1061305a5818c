//! Linear expressions, rows and the objective.

use super::assignment::Assignment;
use super::variables::VarId;
use std::fmt;

/// A linear combination of variables with integer coefficients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: Vec<(VarId, i64)>,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `coef * var`. Zero coefficients are dropped.
    pub fn add(&mut self, var: VarId, coef: i64) {
        if coef != 0 {
            self.terms.push((var, coef));
        }
    }

    /// Builder form of [`add`](Self::add).
    pub fn plus(mut self, var: VarId, coef: i64) -> Self {
        self.add(var, coef);
        self
    }

    /// `(variable, coefficient)` pairs in insertion order.
    pub fn terms(&self) -> &[(VarId, i64)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value of the expression under `assignment`.
    pub fn evaluate(&self, assignment: &Assignment) -> i64 {
        self.terms
            .iter()
            .map(|&(var, coef)| coef * assignment.value(var))
            .sum()
    }
}

/// Relation between a row's left-hand side and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl Sense {
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Sense::Le => lhs <= rhs,
            Sense::Ge => lhs >= rhs,
            Sense::Eq => lhs == rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "=",
        }
    }
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The group a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConstraintFamily {
    /// Weighted end index ≥ weighted start index.
    StartBeforeEnd,
    /// Per slot, renewable resource and mode.
    RenewableCapacity,
    /// Per non-renewable resource and mode, over the whole horizon.
    NonRenewableCapacity,
    /// Successor start ≥ predecessor end + 1.
    Precedence,
    /// Active-slot count equals the chosen mode's duration.
    ActiveDuration,
    /// End index − start index equals chosen duration − 1.
    SpanDuration,
    /// Active now and not next ⇒ ends now.
    EndContinuity,
    /// Active next and not now ⇒ starts next.
    StartContinuity,
    SingleStart,
    SingleEnd,
    SingleMode,
    /// Active under a mode ⇒ that mode is chosen.
    ModeConsistency,
    /// Every end index is bounded by the makespan.
    MakespanLink,
    /// Per slot and renewable resource, summed over modes.
    RenewableCapacityAcrossModes,
    /// Per non-renewable resource, summed over modes.
    NonRenewableCapacityAcrossModes,
}

impl ConstraintFamily {
    /// Every family, in emission order.
    pub const ALL: [ConstraintFamily; 15] = [
        ConstraintFamily::StartBeforeEnd,
        ConstraintFamily::RenewableCapacity,
        ConstraintFamily::NonRenewableCapacity,
        ConstraintFamily::Precedence,
        ConstraintFamily::ActiveDuration,
        ConstraintFamily::SpanDuration,
        ConstraintFamily::EndContinuity,
        ConstraintFamily::StartContinuity,
        ConstraintFamily::SingleStart,
        ConstraintFamily::SingleEnd,
        ConstraintFamily::SingleMode,
        ConstraintFamily::ModeConsistency,
        ConstraintFamily::MakespanLink,
        ConstraintFamily::RenewableCapacityAcrossModes,
        ConstraintFamily::NonRenewableCapacityAcrossModes,
    ];

    /// Short snake-case tag used in row names.
    pub fn tag(self) -> &'static str {
        match self {
            ConstraintFamily::StartBeforeEnd => "start_before_end",
            ConstraintFamily::RenewableCapacity => "renewable",
            ConstraintFamily::NonRenewableCapacity => "non_renewable",
            ConstraintFamily::Precedence => "precedence",
            ConstraintFamily::ActiveDuration => "active_duration",
            ConstraintFamily::SpanDuration => "span_duration",
            ConstraintFamily::EndContinuity => "end_continuity",
            ConstraintFamily::StartContinuity => "start_continuity",
            ConstraintFamily::SingleStart => "single_start",
            ConstraintFamily::SingleEnd => "single_end",
            ConstraintFamily::SingleMode => "single_mode",
            ConstraintFamily::ModeConsistency => "mode_consistency",
            ConstraintFamily::MakespanLink => "makespan_link",
            ConstraintFamily::RenewableCapacityAcrossModes => "renewable_total",
            ConstraintFamily::NonRenewableCapacityAcrossModes => "non_renewable_total",
        }
    }
}

/// A linear row `expr sense rhs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint {
    pub family: ConstraintFamily,
    /// Readable name, e.g. `precedence[J1,J2]`.
    pub name: String,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: i64,
}

impl LinearConstraint {
    pub fn is_satisfied(&self, assignment: &Assignment) -> bool {
        self.sense.holds(self.expr.evaluate(assignment), self.rhs)
    }
}

/// The optimization objective.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Objective {
    Minimize(LinearExpr),
}

impl Objective {
    pub fn expr(&self) -> &LinearExpr {
        match self {
            Objective::Minimize(expr) => expr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_evaluate() {
        let expr = LinearExpr::new()
            .plus(VarId(0), 3)
            .plus(VarId(1), -2)
            .plus(VarId(2), 0);
        assert_eq!(expr.terms().len(), 2);

        let mut a = Assignment::zeros(3);
        a.set(VarId(0), 1);
        a.set(VarId(1), 4);
        assert_eq!(expr.evaluate(&a), 3 - 8);
    }

    #[test]
    fn test_sense_holds() {
        assert!(Sense::Le.holds(1, 1));
        assert!(!Sense::Le.holds(2, 1));
        assert!(Sense::Ge.holds(2, 1));
        assert!(Sense::Eq.holds(-1, -1));
        assert!(!Sense::Eq.holds(0, -1));
    }

    #[test]
    fn test_row_satisfied() {
        let row = LinearConstraint {
            family: ConstraintFamily::SingleStart,
            name: "single_start[J1]".into(),
            expr: LinearExpr::new().plus(VarId(0), 1).plus(VarId(1), 1),
            sense: Sense::Eq,
            rhs: 1,
        };
        let mut a = Assignment::zeros(2);
        assert!(!row.is_satisfied(&a));
        a.set(VarId(1), 1);
        assert!(row.is_satisfied(&a));
        a.set(VarId(0), 1);
        assert!(!row.is_satisfied(&a));
    }

    #[test]
    fn test_family_tags_unique() {
        let mut tags: Vec<&str> = ConstraintFamily::ALL.iter().map(|f| f.tag()).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), ConstraintFamily::ALL.len());
    }
}
