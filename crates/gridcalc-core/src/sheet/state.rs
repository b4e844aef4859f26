use gridcalc_engine::engine::{CellRef, CellStore, Dependents};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{GridcalcError, Result};

/// Cell id -> newly computed value, for every cell a mutation touched.
pub type Updates = BTreeMap<CellRef, f64>;

/// A cell's formula text and current value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellInfo {
    pub expr: String,
    pub value: f64,
}

/// One spreadsheet: its cells plus the reverse dependency index.
///
/// All mutation goes through `&mut self`, so a mutation runs to completion
/// (including its cascade) before anything else can observe the sheet.
#[derive(Clone, Debug)]
pub struct Spreadsheet {
    pub(crate) name: String,
    pub(crate) store: CellStore,
    /// Reverse dependency map: cell -> cells that depend on it
    pub(crate) dependents: Dependents,
}

impl Spreadsheet {
    pub fn new(name: &str) -> Self {
        Spreadsheet {
            name: name.to_string(),
            store: CellStore::new(),
            dependents: Dependents::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read-only view of the cells.
    pub fn store(&self) -> &CellStore {
        &self.store
    }

    /// Formula text and value of `id`.
    pub fn get(&self, id: &CellRef) -> Result<CellInfo> {
        let cell = self
            .store
            .get(id)
            .ok_or_else(|| GridcalcError::NotFound(id.clone()))?;
        Ok(CellInfo {
            expr: cell.expr.clone(),
            value: cell.value,
        })
    }

    /// Current value of `id`; unset cells read as zero.
    pub fn value(&self, id: &CellRef) -> f64 {
        self.store.value(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
