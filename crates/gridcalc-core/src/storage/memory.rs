use dashmap::DashMap;
use gridcalc_engine::engine::CellRef;
use std::collections::BTreeMap;

use super::SheetStore;
use crate::error::Result;

/// In-memory store; contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sheets: DashMap<String, BTreeMap<CellRef, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SheetStore for MemoryStore {
    fn entries(&self, sheet: &str) -> Result<Vec<(CellRef, String)>> {
        Ok(self
            .sheets
            .get(sheet)
            .map(|cells| {
                cells
                    .iter()
                    .map(|(id, expr)| (id.clone(), expr.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn set(&self, sheet: &str, id: &CellRef, expr: &str) -> Result<()> {
        self.sheets
            .entry(sheet.to_string())
            .or_default()
            .insert(id.clone(), expr.to_string());
        Ok(())
    }

    fn remove(&self, sheet: &str, id: &CellRef) -> Result<()> {
        if let Some(mut cells) = self.sheets.get_mut(sheet) {
            cells.remove(id);
        }
        Ok(())
    }

    fn clear(&self, sheet: &str) -> Result<()> {
        self.sheets.remove(sheet);
        Ok(())
    }
}
