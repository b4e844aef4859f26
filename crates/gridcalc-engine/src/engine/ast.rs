//! Formula trees.
//!
//! A [`Formula`] is what the parser produces for one cell. References are
//! stored relative to the cell the formula was entered in (unless marked
//! absolute with `$`), so the same tree can be rendered back to text for a
//! different cell when it is copied.

use std::fmt::Write as _;

use super::cell_ref::CellRef;

/// Operators and functions a formula can apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Func {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
}

impl Func {
    /// Apply the binary form. Division follows IEEE 754 (`1/0` is infinity).
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Func::Add => a + b,
            Func::Sub => a - b,
            Func::Mul => a * b,
            Func::Div => a / b,
            Func::Min => a.min(b),
            Func::Max => a.max(b),
        }
    }

    /// Look up a named function (case-insensitive).
    pub fn from_name(name: &str) -> Option<Func> {
        match name.to_ascii_lowercase().as_str() {
            "min" => Some(Func::Min),
            "max" => Some(Func::Max),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Func::Add => "+",
            Func::Sub => "-",
            Func::Mul => "*",
            Func::Div => "/",
            Func::Min => "min",
            Func::Max => "max",
        }
    }

    fn is_named(self) -> bool {
        matches!(self, Func::Min | Func::Max)
    }

    fn precedence(self) -> u8 {
        match self {
            Func::Add | Func::Sub => 1,
            Func::Mul | Func::Div => 2,
            Func::Min | Func::Max => ATOM,
        }
    }
}

const UNARY: u8 = 3;
const ATOM: u8 = 4;

/// One coordinate of a reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coord {
    /// Offset from the base cell's coordinate.
    Relative(isize),
    /// Fixed 0-indexed coordinate (`$` in source text).
    Absolute(usize),
}

impl Coord {
    fn resolve(self, base: usize) -> Option<usize> {
        match self {
            Coord::Relative(delta) => base.checked_add_signed(delta),
            Coord::Absolute(index) => Some(index),
        }
    }

    fn is_absolute(self) -> bool {
        matches!(self, Coord::Absolute(_))
    }
}

/// A parsed cell reference, resolved against a base cell on use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelRef {
    pub col: Coord,
    pub row: Coord,
}

impl RelRef {
    /// Build a reference that points at `target` when resolved against `base`.
    pub fn between(base: &CellRef, target: &CellRef, abs_col: bool, abs_row: bool) -> RelRef {
        let coord = |abs: bool, from: usize, to: usize| {
            if abs {
                Coord::Absolute(to)
            } else {
                Coord::Relative(to as isize - from as isize)
            }
        };
        RelRef {
            col: coord(abs_col, base.col, target.col),
            row: coord(abs_row, base.row, target.row),
        }
    }

    /// Resolve to an absolute cell. `None` if the reference falls off the sheet.
    pub fn resolve(&self, base: &CellRef) -> Option<CellRef> {
        Some(CellRef::new(
            self.col.resolve(base.col)?,
            self.row.resolve(base.row)?,
        ))
    }

    /// Source text for this reference as seen from `base`, e.g. `$A2`.
    pub fn to_text(&self, base: &CellRef) -> String {
        let Some(target) = self.resolve(base) else {
            return "#REF!".to_string();
        };
        let mut out = String::new();
        if self.col.is_absolute() {
            out.push('$');
        }
        out.push_str(&CellRef::col_to_letters(target.col));
        if self.row.is_absolute() {
            out.push('$');
        }
        let _ = write!(out, "{}", target.row + 1);
        out
    }
}

/// Parsed formula for a single cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Formula {
    Number(f64),
    Unary {
        func: Func,
        operand: Box<Formula>,
    },
    Binary {
        func: Func,
        left: Box<Formula>,
        right: Box<Formula>,
    },
    Reference(RelRef),
}

impl Formula {
    /// Visit every reference node, in source order.
    pub fn for_each_reference(&self, f: &mut impl FnMut(&RelRef)) {
        match self {
            Formula::Number(_) => {}
            Formula::Reference(r) => f(r),
            Formula::Unary { operand, .. } => operand.for_each_reference(f),
            Formula::Binary { left, right, .. } => {
                left.for_each_reference(f);
                right.for_each_reference(f);
            }
        }
    }

    /// Render canonical source text with references resolved against `base`.
    pub fn render(&self, base: &CellRef) -> String {
        let mut out = String::new();
        self.render_into(base, &mut out);
        out
    }

    fn precedence(&self) -> u8 {
        match self {
            Formula::Number(_) | Formula::Reference(_) => ATOM,
            Formula::Unary { .. } => UNARY,
            Formula::Binary { func, .. } => func.precedence(),
        }
    }

    fn render_into(&self, base: &CellRef, out: &mut String) {
        match self {
            Formula::Number(n) => {
                let _ = write!(out, "{}", n);
            }
            Formula::Reference(r) => out.push_str(&r.to_text(base)),
            Formula::Unary { func, operand } => {
                out.push_str(func.symbol());
                operand.render_child(base, out, operand.precedence() < UNARY);
            }
            Formula::Binary { func, left, right } if func.is_named() => {
                out.push_str(func.symbol());
                out.push('(');
                left.render_into(base, out);
                out.push_str(", ");
                right.render_into(base, out);
                out.push(')');
            }
            Formula::Binary { func, left, right } => {
                let prec = func.precedence();
                left.render_child(base, out, left.precedence() < prec);
                let _ = write!(out, " {} ", func.symbol());
                // Operators are left-associative, so an equal-precedence right
                // operand must keep its parentheses.
                right.render_child(base, out, right.precedence() <= prec);
            }
        }
    }

    fn render_child(&self, base: &CellRef, out: &mut String, parens: bool) {
        if parens {
            out.push('(');
            self.render_into(base, out);
            out.push(')');
        } else {
            self.render_into(base, out);
        }
    }
}
