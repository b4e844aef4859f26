//! Named spreadsheets backed by a [`SheetStore`].
//!
//! Each sheet is rebuilt from its stored formulas the first time it is used
//! and then kept in memory. Successful edits are written through to the
//! store; rejected edits leave both the sheet and the store untouched.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::RefMut;
use gridcalc_engine::engine::CellRef;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{GridcalcError, Result};
use crate::sheet::{CellInfo, Spreadsheet, Updates};
use crate::storage::{SheetStore, check_sheet_name};

pub struct SpreadsheetServices {
    sheets: DashMap<String, Spreadsheet>,
    store: Arc<dyn SheetStore>,
}

type SheetGuard<'a> = RefMut<'a, String, Spreadsheet>;

fn cell_id(id: &str) -> Result<CellRef> {
    Ok(id.parse::<CellRef>()?)
}

impl SpreadsheetServices {
    pub fn new(store: Arc<dyn SheetStore>) -> Self {
        SpreadsheetServices {
            sheets: DashMap::new(),
            store,
        }
    }

    /// Replay the stored formulas of `name` into a new sheet.
    fn open(&self, name: &str) -> Result<Spreadsheet> {
        let entries = self.store.entries(name)?;
        let mut sheet = Spreadsheet::new(name);
        sheet.load(entries)?;
        debug!(sheet = name, cells = sheet.len(), "opened");
        Ok(sheet)
    }

    /// Exclusive access to `name`, replaying it from the store if needed.
    ///
    /// The returned guard locks the sheet, so operations on one sheet run
    /// one at a time.
    fn sheet(&self, name: &str) -> Result<SheetGuard<'_>> {
        check_sheet_name(name)?;
        match self.sheets.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_ref()),
            Entry::Vacant(entry) => Ok(entry.insert(self.open(name)?)),
        }
    }

    /// Like [`Self::sheet`], but `None` for a sheet with nothing stored,
    /// which is then not kept in memory.
    fn existing(&self, name: &str) -> Result<Option<SheetGuard<'_>>> {
        check_sheet_name(name)?;
        if let Some(guard) = self.sheets.get_mut(name) {
            return Ok(Some(guard));
        }
        let sheet = self.open(name)?;
        if sheet.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.sheets.entry(name.to_string()).or_insert(sheet)))
    }

    /// Write an accepted edit through to the store.
    ///
    /// If the write fails the sheet is forgotten, so the next access replays
    /// what the store actually holds.
    fn persist(
        &self,
        name: &str,
        guard: SheetGuard<'_>,
        write: impl FnOnce(&dyn SheetStore) -> Result<()>,
    ) -> Result<()> {
        let result = write(self.store.as_ref());
        if result.is_err() {
            drop(guard);
            self.sheets.remove(name);
        }
        result
    }

    /// Set `id` to `expr`; returns every value the edit changed.
    pub fn evaluate(&self, sheet: &str, id: &str, expr: &str) -> Result<Updates> {
        let id = cell_id(id)?;
        let mut guard = self.sheet(sheet)?;
        let updates = guard.set_cell(&id, expr)?;
        let stored = guard.get(&id)?.expr;
        self.persist(sheet, guard, |store| store.set(sheet, &id, &stored))?;
        info!(sheet, cell = %id, expr = %stored, updated = updates.len(), "evaluate");
        Ok(updates)
    }

    pub fn query(&self, sheet: &str, id: &str) -> Result<CellInfo> {
        let id = cell_id(id)?;
        match self.existing(sheet)? {
            Some(guard) => guard.get(&id),
            None => Err(GridcalcError::NotFound(id)),
        }
    }

    /// Delete `id`; dependents keep their current values.
    pub fn remove(&self, sheet: &str, id: &str) -> Result<Updates> {
        let id = cell_id(id)?;
        let Some(mut guard) = self.existing(sheet)? else {
            return Ok(Updates::new());
        };
        let updates = guard.remove(&id);
        if !updates.is_empty() {
            self.persist(sheet, guard, |store| store.remove(sheet, &id))?;
        }
        info!(sheet, cell = %id, "remove");
        Ok(updates)
    }

    /// Copy the formula of `src` into `dest`, adjusting relative references.
    pub fn copy(&self, sheet: &str, dest: &str, src: &str) -> Result<Updates> {
        let dest = cell_id(dest)?;
        let src = cell_id(src)?;
        let mut guard = self.sheet(sheet)?;
        let updates = guard.copy(&src, &dest)?;
        let stored = guard.store().get(&dest).map(|cell| cell.expr.clone());
        self.persist(sheet, guard, |store| match &stored {
            Some(expr) => store.set(sheet, &dest, expr),
            None => store.remove(sheet, &dest),
        })?;
        info!(sheet, %src, %dest, updated = updates.len(), "copy");
        Ok(updates)
    }

    /// Every formula in `sheet`, precedents first.
    pub fn dump(&self, sheet: &str) -> Result<Vec<(CellRef, String)>> {
        Ok(self
            .existing(sheet)?
            .map(|guard| guard.dump())
            .unwrap_or_default())
    }

    /// Replace the content of `sheet` with `entries`.
    ///
    /// Entries are applied in order; the first rejected one aborts the load
    /// and the previous content stays in place.
    pub fn load(&self, sheet: &str, entries: Vec<(String, String)>) -> Result<()> {
        check_sheet_name(sheet)?;
        let entries = entries
            .into_iter()
            .map(|(id, expr)| Ok((cell_id(&id)?, expr)))
            .collect::<Result<Vec<_>>>()?;

        let mut fresh = Spreadsheet::new(sheet);
        fresh.load(entries.iter().map(|(id, expr)| (id.clone(), expr.as_str())))?;

        // Hold the sheet's slot while the store is rewritten so no edit can
        // land in between.
        let slot = self.sheets.entry(sheet.to_string());
        if let Err(e) = self.store.replace(sheet, &fresh.dump()) {
            if let Entry::Occupied(cached) = slot {
                cached.remove();
            }
            return Err(e);
        }
        info!(sheet, cells = fresh.len(), "load");
        slot.insert(fresh);
        Ok(())
    }

    pub fn clear(&self, sheet: &str) -> Result<()> {
        if let Some(mut guard) = self.existing(sheet)? {
            guard.clear();
            self.persist(sheet, guard, |store| store.clear(sheet))?;
        }
        info!(sheet, "clear");
        Ok(())
    }
}
