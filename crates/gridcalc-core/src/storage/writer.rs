//! Writer for .grd file format

use crate::error::Result;
use gridcalc_engine::engine::CellRef;
use std::fs;
use std::path::Path;

/// Write `(id, expr)` pairs to a .grd file
pub fn write_grd<'a>(
    path: &Path,
    entries: impl IntoIterator<Item = (&'a CellRef, &'a str)>,
) -> Result<()> {
    let content = write_grd_content(entries);
    fs::write(path, content)?;
    Ok(())
}

/// Write `(id, expr)` pairs to a .grd format string
pub fn write_grd_content<'a>(entries: impl IntoIterator<Item = (&'a CellRef, &'a str)>) -> String {
    let mut lines = vec!["# Gridcalc Spreadsheet".to_string()];

    // Collect and sort cells by position for consistent output
    let mut cells: Vec<_> = entries.into_iter().collect();
    cells.sort_by(|(a, _), (b, _)| a.row.cmp(&b.row).then(a.col.cmp(&b.col)));

    for (cell_ref, expr) in cells {
        lines.push(format!("{}: ={}", cell_ref, expr));
    }

    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_formula() {
        let a1 = CellRef::new(0, 0);
        let content = write_grd_content([(&a1, "B1 + C1")]);
        assert!(content.contains("A1: =B1 + C1"));
    }

    #[test]
    fn test_sorted_output() {
        let b2 = CellRef::new(1, 1);
        let a1 = CellRef::new(0, 0);
        let b1 = CellRef::new(1, 0);
        let content = write_grd_content([(&b2, "3"), (&a1, "1"), (&b1, "2")]);
        let lines: Vec<_> = content.lines().collect();
        // After header, should be A1, B1, B2
        assert!(lines[1].starts_with("A1"));
        assert!(lines[2].starts_with("B1"));
        assert!(lines[3].starts_with("B2"));
    }

    #[test]
    fn test_round_trips_through_parser() {
        let a1 = CellRef::new(0, 0);
        let c2 = CellRef::new(2, 1);
        let content = write_grd_content([(&c2, "max(A1, 2) * -1"), (&a1, "$B$1 / 3")]);
        let entries = super::super::parser::parse_grd_content(&content).unwrap();
        assert_eq!(
            entries,
            vec![
                (a1, "$B$1 / 3".to_string()),
                (c2, "max(A1, 2) * -1".to_string()),
            ]
        );
    }
}
