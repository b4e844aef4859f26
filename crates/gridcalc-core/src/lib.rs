//! gridcalc-core - spreadsheet model, recalculation and storage.

pub mod error;
pub mod services;
pub mod sheet;
pub mod storage;

pub use error::{GridcalcError, Result};
pub use services::SpreadsheetServices;
pub use sheet::{CellInfo, Spreadsheet, Updates};
pub use storage::{FileStore, MemoryStore, SheetStore};

pub use gridcalc_engine::engine::CellRef;
