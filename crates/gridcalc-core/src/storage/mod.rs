//! Persistence of raw formula text, keyed by (spreadsheet name, cell id).
//!
//! Only expressions are stored; values and dependencies are rebuilt by
//! replaying the expressions through [`crate::Spreadsheet::load`].

mod file;
mod memory;
mod parser;
mod writer;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use parser::{parse_grd, parse_grd_content};
pub use writer::{write_grd, write_grd_content};

use crate::error::{GridcalcError, Result};
use gridcalc_engine::engine::CellRef;

/// Key-value store of formula text per spreadsheet.
pub trait SheetStore: Send + Sync {
    /// All stored `(id, expr)` pairs of `sheet`; empty for an unknown sheet.
    fn entries(&self, sheet: &str) -> Result<Vec<(CellRef, String)>>;

    fn set(&self, sheet: &str, id: &CellRef, expr: &str) -> Result<()>;

    fn remove(&self, sheet: &str, id: &CellRef) -> Result<()>;

    fn clear(&self, sheet: &str) -> Result<()>;

    /// Replace the whole content of `sheet`.
    fn replace(&self, sheet: &str, entries: &[(CellRef, String)]) -> Result<()> {
        self.clear(sheet)?;
        for (id, expr) in entries {
            self.set(sheet, id, expr)?;
        }
        Ok(())
    }
}

/// Spreadsheet names double as file names, so keep them to `[A-Za-z0-9_-]+`.
pub fn check_sheet_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(GridcalcError::InvalidSheetName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_sheet_name() {
        assert!(check_sheet_name("budget_2024").is_ok());
        assert!(check_sheet_name("a-b").is_ok());
        assert!(check_sheet_name("").is_err());
        assert!(check_sheet_name("../etc").is_err());
        assert!(check_sheet_name("has space").is_err());
        assert!(check_sheet_name(&"x".repeat(65)).is_err());
    }
}
