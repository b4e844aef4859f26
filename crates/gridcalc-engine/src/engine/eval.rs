//! Formula evaluation.
//!
//! Evaluation is a pure read of the [`CellStore`]: references resolve
//! against the formula's own cell and read the target's stored value.

use super::ast::Formula;
use super::cell::CellStore;
use super::cell_ref::CellRef;

/// Evaluate `formula` as the formula of cell `base`.
///
/// - unary operators apply their binary form with a left operand of `0`
/// - a reference to an unset cell (or off the sheet) reads as `0`
/// - division by zero follows IEEE 754 rather than erroring
pub fn evaluate(formula: &Formula, base: &CellRef, store: &CellStore) -> f64 {
    match formula {
        Formula::Number(n) => *n,
        Formula::Unary { func, operand } => func.apply(0.0, evaluate(operand, base, store)),
        Formula::Binary { func, left, right } => func.apply(
            evaluate(left, base, store),
            evaluate(right, base, store),
        ),
        Formula::Reference(r) => r.resolve(base).map_or(0.0, |target| store.value(&target)),
    }
}
