//! Cell data structures for the spreadsheet.
//!
//! - [`Cell`] - A cell's formula text, parsed tree, last value and precedents
//! - [`CellStore`] - Sparse storage for cells, iterated in id order

use std::collections::{BTreeMap, BTreeSet};

use super::ast::Formula;
use super::cell_ref::CellRef;

/// A cell in the spreadsheet.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    /// Formula source text as entered.
    pub expr: String,
    pub formula: Formula,
    /// Last computed value.
    pub value: f64,
    /// Cells this cell's formula reads directly.
    pub precedents: BTreeSet<CellRef>,
}

impl Cell {
    pub fn new(expr: &str, formula: Formula, precedents: BTreeSet<CellRef>) -> Cell {
        Cell {
            expr: expr.to_string(),
            formula,
            value: 0.0,
            precedents,
        }
    }
}

/// Sparse cell storage keyed by cell id.
///
/// The store has a single owner; mutation goes through `&mut self`.
#[derive(Clone, Debug, Default)]
pub struct CellStore {
    cells: BTreeMap<CellRef, Cell>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &CellRef) -> Option<&Cell> {
        self.cells.get(id)
    }

    pub fn get_mut(&mut self, id: &CellRef) -> Option<&mut Cell> {
        self.cells.get_mut(id)
    }

    pub fn contains(&self, id: &CellRef) -> bool {
        self.cells.contains_key(id)
    }

    /// Current value of `id`; unset cells read as zero.
    pub fn value(&self, id: &CellRef) -> f64 {
        self.cells.get(id).map_or(0.0, |c| c.value)
    }

    /// Insert or replace a cell, returning the previous entry.
    pub fn insert(&mut self, id: CellRef, cell: Cell) -> Option<Cell> {
        self.cells.insert(id, cell)
    }

    pub fn remove(&mut self, id: &CellRef) -> Option<Cell> {
        self.cells.remove(id)
    }

    /// Put back a snapshot taken before a provisional insert.
    pub fn restore(&mut self, id: &CellRef, snapshot: Option<Cell>) {
        match snapshot {
            Some(cell) => {
                self.cells.insert(id.clone(), cell);
            }
            None => {
                self.cells.remove(id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellRef, &Cell)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
