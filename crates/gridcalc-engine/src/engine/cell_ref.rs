//! Cell reference parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell references
//! (e.g., "A1", "B2", "AA100") and zero-indexed column/row coordinates.
//!
//! # Examples
//!
//! ```
//! use gridcalc_engine::engine::CellRef;
//!
//! let cell = CellRef::parse("B3").unwrap();
//! assert_eq!(cell.col, 1); // 0-indexed
//! assert_eq!(cell.row, 2);
//! assert_eq!(cell.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;

use crate::error::EngineError;

/// A reference to a cell by column and row indices (0-indexed).
///
/// Ordering is column-major (`A1 < A2 < B1`), which is also the order in
/// which dependents are visited during a cascade.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct CellRef {
    pub col: usize,
    pub row: usize,
}

impl CellRef {
    pub fn new(col: usize, row: usize) -> CellRef {
        CellRef { col, row }
    }

    /// Parse a cell reference from spreadsheet notation (e.g., "A1", "b2", "AA10").
    /// Returns None if the input is invalid.
    pub fn parse(name: &str) -> Option<CellRef> {
        let caps = a1_re().captures(name)?;
        let col = letters_to_col(&caps["letters"])?;
        let row = caps["numbers"].parse::<usize>().ok()?.checked_sub(1)?;
        Some(CellRef::new(col, row))
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }

    /// Move by a signed column/row delta. `None` if the result leaves the sheet.
    pub fn offset(&self, delta_col: isize, delta_row: isize) -> Option<CellRef> {
        let col = self.col.checked_add_signed(delta_col)?;
        let row = self.row.checked_add_signed(delta_row)?;
        Some(CellRef::new(col, row))
    }
}

/// Convert column letters to a 0-indexed column ("A" -> 0, "AA" -> 26).
pub(crate) fn letters_to_col(letters: &str) -> Option<usize> {
    let mut col_acc = 0usize;
    for c in letters.to_ascii_uppercase().bytes() {
        let digit = (c - b'A') as usize + 1;
        col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
    }
    col_acc.checked_sub(1)
}

fn a1_re() -> &'static Regex {
    static A1_RE: OnceLock<Regex> = OnceLock::new();
    A1_RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)$")
            .expect("cell reference regex must compile")
    })
}

impl std::str::FromStr for CellRef {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.trim()).ok_or_else(|| EngineError::InvalidCell(s.to_string()))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", CellRef::col_to_letters(self.col), self.row + 1)
    }
}

// Serialized as its A1 name so cell ids can key JSON objects.
impl Serialize for CellRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CellRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::CellRef;

    #[test]
    fn test_parse_single_letter_columns() {
        assert_eq!(CellRef::parse("A1"), Some(CellRef::new(0, 0)));
        assert_eq!(CellRef::parse("B1"), Some(CellRef::new(1, 0)));
        assert_eq!(CellRef::parse("Z1"), Some(CellRef::new(25, 0)));
        assert_eq!(CellRef::parse("A10"), Some(CellRef::new(0, 9)));
    }

    #[test]
    fn test_parse_multi_letter_and_lowercase() {
        assert_eq!(CellRef::parse("AA1").unwrap().col, 26);
        assert_eq!(CellRef::parse("BA1").unwrap().col, 52);
        assert_eq!(CellRef::parse("b3"), Some(CellRef::new(1, 2)));
    }

    #[test]
    fn test_parse_invalid_inputs() {
        assert!(CellRef::parse("").is_none());
        assert!(CellRef::parse("123").is_none());
        assert!(CellRef::parse("ABC").is_none());
        assert!(CellRef::parse("A0").is_none());
        assert!(CellRef::parse("1A").is_none());
        assert!(CellRef::parse("A 1").is_none());
    }

    #[test]
    fn test_parse_a1_overflow_returns_none() {
        let huge = format!("{}1", "Z".repeat(40));
        assert!(CellRef::parse(&huge).is_none());
    }

    #[test]
    fn test_col_to_letters_handles_max_usize() {
        let letters = CellRef::col_to_letters(usize::MAX);
        assert!(!letters.is_empty());
        assert!(letters.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_display_round_trips() {
        for name in ["A1", "Z9", "AA100", "BC7"] {
            assert_eq!(CellRef::parse(name).unwrap().to_string(), name);
        }
    }

    #[test]
    fn test_offset_stays_on_sheet() {
        let b2 = CellRef::new(1, 1);
        assert_eq!(b2.offset(1, 2), Some(CellRef::new(2, 3)));
        assert_eq!(b2.offset(-2, 0), None);
    }

    #[test]
    fn test_from_str_trims_and_reports_invalid() {
        let parsed: CellRef = " c2 ".parse().unwrap();
        assert_eq!(parsed, CellRef::new(2, 1));
        assert!("2C".parse::<CellRef>().is_err());
    }
}
