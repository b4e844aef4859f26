use gridcalc_engine::engine::CellRef;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{SheetStore, check_sheet_name, parse_grd, write_grd};
use crate::error::Result;

/// Stores each spreadsheet as `<dir>/<name>.grd`.
///
/// Every write rewrites the sheet's file; callers serialize mutations of a
/// given sheet.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir` as the data directory, creating it if needed.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(FileStore {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn sheet_path(&self, sheet: &str) -> Result<PathBuf> {
        check_sheet_name(sheet)?;
        Ok(self.dir.join(format!("{}.grd", sheet)))
    }

    fn read(&self, path: &Path) -> Result<BTreeMap<CellRef, String>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        Ok(parse_grd(path)?.into_iter().collect())
    }

    fn write(&self, path: &Path, cells: &BTreeMap<CellRef, String>) -> Result<()> {
        if cells.is_empty() {
            if path.exists() {
                std::fs::remove_file(path)?;
            }
            return Ok(());
        }
        write_grd(path, cells.iter().map(|(id, expr)| (id, expr.as_str())))
    }
}

impl SheetStore for FileStore {
    fn entries(&self, sheet: &str) -> Result<Vec<(CellRef, String)>> {
        let path = self.sheet_path(sheet)?;
        Ok(self.read(&path)?.into_iter().collect())
    }

    fn set(&self, sheet: &str, id: &CellRef, expr: &str) -> Result<()> {
        let path = self.sheet_path(sheet)?;
        let mut cells = self.read(&path)?;
        cells.insert(id.clone(), expr.to_string());
        self.write(&path, &cells)
    }

    fn remove(&self, sheet: &str, id: &CellRef) -> Result<()> {
        let path = self.sheet_path(sheet)?;
        let mut cells = self.read(&path)?;
        if cells.remove(id).is_some() {
            self.write(&path, &cells)?;
        }
        Ok(())
    }

    fn clear(&self, sheet: &str) -> Result<()> {
        let path = self.sheet_path(sheet)?;
        self.write(&path, &BTreeMap::new())
    }

    fn replace(&self, sheet: &str, entries: &[(CellRef, String)]) -> Result<()> {
        let path = self.sheet_path(sheet)?;
        let cells: BTreeMap<CellRef, String> = entries.iter().cloned().collect();
        self.write(&path, &cells)
    }
}
