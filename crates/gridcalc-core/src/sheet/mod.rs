//! Spreadsheet state and recalculation (UI-agnostic).

mod io;
mod ops;
mod state;

pub use state::{CellInfo, Spreadsheet, Updates};
