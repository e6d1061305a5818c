//! CPLEX LP export.
//!
//! Renders a [`ConstraintSystem`] in the LP text format read by CBC, CPLEX,
//! Gurobi, HiGHS and most other MILP solvers.
//!
//! Variable names are `x<id>_<name>` with every character outside
//! `[A-Za-z0-9_]` replaced by `_`; the id prefix keeps them unique. Rows are
//! named `c<index>_<family>`.

use crate::formulation::{ConstraintSystem, LinearExpr, VarId, VarKind};
use std::io::{self, Write};

/// Terms per line; LP readers cap line length.
const TERMS_PER_LINE: usize = 8;

/// LP-safe name of `var`.
pub fn lp_name(system: &ConstraintSystem, var: VarId) -> String {
    let sanitized: String = system
        .variable(var)
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("x{}_{}", var.0, sanitized.trim_end_matches('_'))
}

fn write_expr<W: Write>(
    system: &ConstraintSystem,
    expr: &LinearExpr,
    writer: &mut W,
) -> io::Result<()> {
    for (i, &(var, coef)) in expr.terms().iter().enumerate() {
        if i > 0 && i % TERMS_PER_LINE == 0 {
            write!(writer, "\n   ")?;
        }
        let sign = if coef < 0 { '-' } else { '+' };
        write!(writer, " {sign} {} {}", coef.unsigned_abs(), lp_name(system, var))?;
    }
    Ok(())
}

/// Writes `system` in LP format.
pub fn write_lp<W: Write>(system: &ConstraintSystem, writer: &mut W) -> io::Result<()> {
    let instance = system.instance();
    writeln!(
        writer,
        "\\ {} jobs, {} slots",
        instance.job_count(),
        instance.horizon().len()
    )?;

    writeln!(writer, "Minimize")?;
    write!(writer, " obj:")?;
    write_expr(system, system.objective().expr(), writer)?;
    writeln!(writer)?;

    writeln!(writer, "Subject To")?;
    for (i, row) in system.constraints().iter().enumerate() {
        write!(writer, " c{i}_{}:", row.family.tag())?;
        write_expr(system, &row.expr, writer)?;
        writeln!(writer, " {} {}", row.sense, row.rhs)?;
    }

    writeln!(writer, "Bounds")?;
    let mut general = Vec::new();
    let mut binary = Vec::new();
    for (i, var) in system.variables().iter().enumerate() {
        let name = lp_name(system, VarId(i));
        match var.kind {
            VarKind::Binary => binary.push(name),
            VarKind::Integer { lower, upper } => {
                writeln!(writer, " {lower} <= {name} <= {upper}")?;
                general.push(name);
            }
        }
    }

    if !general.is_empty() {
        writeln!(writer, "General")?;
        for chunk in general.chunks(TERMS_PER_LINE) {
            writeln!(writer, " {}", chunk.join(" "))?;
        }
    }
    if !binary.is_empty() {
        writeln!(writer, "Binary")?;
        for chunk in binary.chunks(TERMS_PER_LINE) {
            writeln!(writer, " {}", chunk.join(" "))?;
        }
    }
    writeln!(writer, "End")
}

/// [`write_lp`] into a `String`.
pub fn to_lp_string(system: &ConstraintSystem) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_lp(system, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}
