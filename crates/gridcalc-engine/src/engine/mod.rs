//! Spreadsheet engine API.
//!
//! This module provides the core computation engine for the spreadsheet:
//!
//! - [`CellRef`] - Cell reference parsing (A1 notation ↔ col/row indices)
//! - [`Formula`], [`Func`], [`RelRef`] - Parsed formula trees
//! - [`parse`] - Formula text → [`Formula`]
//! - [`Cell`], [`CellStore`] - Data structures for cell storage
//! - [`evaluate`] - Compute a formula's value against the store
//! - [`precedents`], [`Dependents`] - Dependency tracking in both directions
//! - [`detect_cycle`] - Circular dependency detection

mod ast;
mod cell;
mod cell_ref;
mod cycle;
mod deps;
mod eval;
mod parse;

pub use ast::{Coord, Formula, Func, RelRef};
pub use cell::{Cell, CellStore};
pub use cell_ref::CellRef;
pub use cycle::detect_cycle;
pub use deps::{Dependents, precedents};
pub use eval::evaluate;
pub use parse::parse;
