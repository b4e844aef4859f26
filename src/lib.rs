//! Gridcalc - spreadsheet engine with automatic recalculation.
//!
//! The binary wires [`config`] and [`server`] around
//! [`gridcalc_core::SpreadsheetServices`].

pub mod config;
pub mod server;
