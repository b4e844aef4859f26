//! Parser for .grd file format

use crate::error::{GridcalcError, Result};
use gridcalc_engine::engine::CellRef;
use std::fs;
use std::path::Path;

/// Parse a .grd file into `(id, expr)` pairs, in file order.
pub fn parse_grd(path: &Path) -> Result<Vec<(CellRef, String)>> {
    let content = fs::read_to_string(path)?;
    parse_grd_content(&content)
}

/// Parse .grd content from a string
pub fn parse_grd_content(content: &str) -> Result<Vec<(CellRef, String)>> {
    let mut entries = Vec::new();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Parse "CELLREF: =EXPR" format
        let Some((cell_ref_str, value_str)) = line.split_once(':') else {
            return Err(GridcalcError::Parse {
                line: line_num + 1,
                message: "Expected 'CELLREF: =EXPR' format".to_string(),
            });
        };

        let cell_ref_str = cell_ref_str.trim();
        let cell_ref = CellRef::parse(cell_ref_str).ok_or_else(|| GridcalcError::Parse {
            line: line_num + 1,
            message: format!("Invalid cell reference: {}", cell_ref_str),
        })?;

        let Some(expr) = value_str.trim().strip_prefix('=') else {
            return Err(GridcalcError::Parse {
                line: line_num + 1,
                message: format!("Expected a formula starting with '=': {}", value_str.trim()),
            });
        };

        entries.push((cell_ref, expr.trim().to_string()));
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formula() {
        let entries = parse_grd_content("A1: =B1 + C1").unwrap();
        assert_eq!(entries, vec![(CellRef::new(0, 0), "B1 + C1".to_string())]);
    }

    #[test]
    fn test_parse_multiple_cells() {
        let content = r#"
# Test spreadsheet
A1: =100
A2: =200
B3: =A1 + A2
"#;
        let entries = parse_grd_content(content).unwrap();
        let ids: Vec<String> = entries.iter().map(|(id, _)| id.to_string()).collect();
        assert_eq!(ids, vec!["A1", "A2", "B3"]);
    }

    #[test]
    fn test_missing_equals_is_an_error() {
        let err = parse_grd_content("# header\nA1: 42").unwrap_err();
        match err {
            GridcalcError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_cell_reference() {
        let err = parse_grd_content("1A: =3").unwrap_err();
        assert!(matches!(err, GridcalcError::Parse { line: 1, .. }));
    }
}
