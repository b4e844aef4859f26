use super::{Spreadsheet, Updates};
use crate::error::{GridcalcError, Result};
use gridcalc_engine::engine::{Cell, CellRef, detect_cycle, evaluate, parse, precedents};
use tracing::{debug, warn};

fn format_path(path: &[CellRef]) -> String {
    path.iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Formula text as kept in the cell: trimmed, with every run of whitespace
/// collapsed to one space so it always fits on a single line.
fn one_line(expr: &str) -> String {
    expr.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl Spreadsheet {
    /// Set cell `id` to formula `expr` and recompute everything downstream.
    ///
    /// Returns the new value of `id` and of every cell that transitively
    /// depends on it. On error the sheet is left exactly as it was.
    pub fn set_cell(&mut self, id: &CellRef, expr: &str) -> Result<Updates> {
        let formula = parse(expr, id)?;
        let expr = one_line(expr);
        let expr = expr.as_str();
        let new_precedents = precedents(&formula, id);
        if new_precedents.contains(id) {
            warn!(sheet = %self.name, cell = %id, expr, "rejected self-reference");
            return Err(GridcalcError::CircularRef(id.clone()));
        }

        let value = evaluate(&formula, id, &self.store);
        let mut cell = Cell::new(expr, formula, new_precedents.clone());
        cell.value = value;

        // Temporarily insert to check for cycles
        let snapshot = self.store.insert(id.clone(), cell);
        if let Some(path) = detect_cycle(id, &self.store) {
            self.store.restore(id, snapshot);
            warn!(sheet = %self.name, cell = %id, cycle = %format_path(&path), "rejected circular reference");
            return Err(GridcalcError::CircularRef(id.clone()));
        }

        let old_precedents = snapshot.map(|c| c.precedents).unwrap_or_default();
        self.dependents.link(id, &old_precedents, &new_precedents);

        let mut updates = Updates::new();
        updates.insert(id.clone(), value);
        for dependent in self.dependents.recalc_order(id, &self.store) {
            if let Some(value) = self.recompute(&dependent) {
                updates.insert(dependent, value);
            }
        }
        debug!(sheet = %self.name, cell = %id, updated = updates.len(), "recalculated");
        Ok(updates)
    }

    /// Re-evaluate a stored formula in place.
    fn recompute(&mut self, id: &CellRef) -> Option<f64> {
        let value = evaluate(&self.store.get(id)?.formula, id, &self.store);
        self.store.get_mut(id)?.value = value;
        Some(value)
    }

    /// Delete cell `id`.
    ///
    /// Cells that read `id` are not recomputed; they keep their last value
    /// until they or one of their precedents is next edited. Returns `{id: 0}`
    /// if the cell existed.
    pub fn remove(&mut self, id: &CellRef) -> Updates {
        let mut updates = Updates::new();
        if let Some(cell) = self.store.remove(id) {
            self.dependents.unlink(id, &cell.precedents);
            updates.insert(id.clone(), 0.0);
            debug!(sheet = %self.name, cell = %id, "removed");
        }
        updates
    }

    /// Remove every cell.
    pub fn clear(&mut self) {
        self.store.clear();
        self.dependents.clear();
        debug!(sheet = %self.name, "cleared");
    }

    /// Copy the formula of `src` into `dest`, shifting its relative
    /// references by the distance between the two cells.
    ///
    /// Copying an empty cell removes `dest`.
    pub fn copy(&mut self, src: &CellRef, dest: &CellRef) -> Result<Updates> {
        let Some(cell) = self.store.get(src) else {
            return Ok(self.remove(dest));
        };
        let expr = cell.formula.render(dest);
        debug!(sheet = %self.name, %src, %dest, expr, "copy");
        self.set_cell(dest, &expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridcalc_engine::engine::Dependents;
    use pretty_assertions::assert_eq;

    fn id(name: &str) -> CellRef {
        CellRef::parse(name).unwrap()
    }

    fn updates(pairs: &[(&str, f64)]) -> Updates {
        pairs.iter().map(|(name, v)| (id(name), *v)).collect()
    }

    fn assert_index_consistent(sheet: &Spreadsheet) {
        let rebuilt = Dependents::rebuild(sheet.store());
        for (cell, c) in sheet.store().iter() {
            for precedent in c.precedents.iter().chain(std::iter::once(cell)) {
                assert_eq!(
                    sheet.dependents.of(precedent).collect::<Vec<_>>(),
                    rebuilt.of(precedent).collect::<Vec<_>>(),
                    "dependents of {}",
                    precedent
                );
            }
        }
    }

    #[test]
    fn test_literal_formula_updates_only_itself() {
        let mut sheet = Spreadsheet::new("test");
        let result = sheet.set_cell(&id("A1"), "42").unwrap();
        assert_eq!(result, updates(&[("A1", 42.0)]));
    }

    #[test]
    fn test_direct_self_reference_is_rejected() {
        let mut sheet = Spreadsheet::new("test");
        sheet.set_cell(&id("A1"), "7").unwrap();

        let err = sheet.set_cell(&id("A1"), "A1 + 1").unwrap_err();
        assert!(matches!(err, GridcalcError::CircularRef(ref c) if *c == id("A1")));
        assert_eq!(sheet.get(&id("A1")).unwrap().expr, "7");
        assert_eq!(sheet.value(&id("A1")), 7.0);
    }

    #[test]
    fn test_mutual_cycle_rolls_back_only_edited_cell() {
        let mut sheet = Spreadsheet::new("test");
        sheet.set_cell(&id("B1"), "A1 + 1").unwrap();
        assert_eq!(sheet.value(&id("B1")), 1.0);

        let err = sheet.set_cell(&id("A1"), "B1 + 1").unwrap_err();
        assert_eq!(err.code(), "CIRCULAR_REF");
        assert!(sheet.get(&id("A1")).is_err());
        assert_eq!(sheet.get(&id("B1")).unwrap().expr, "A1 + 1");
        assert_eq!(sheet.value(&id("B1")), 1.0);
        assert_index_consistent(&sheet);
    }

    #[test]
    fn test_three_cell_cycle_is_rejected() {
        let mut sheet = Spreadsheet::new("test");
        sheet.set_cell(&id("A1"), "B1").unwrap();
        sheet.set_cell(&id("B1"), "C1").unwrap();
        sheet.set_cell(&id("C1"), "5").unwrap();
        assert_eq!(sheet.value(&id("A1")), 5.0);

        let err = sheet.set_cell(&id("C1"), "A1 + 1").unwrap_err();
        assert_eq!(err.code(), "CIRCULAR_REF");
        assert_eq!(sheet.get(&id("C1")).unwrap().expr, "5");
        assert_eq!(sheet.value(&id("A1")), 5.0);
        assert_eq!(sheet.value(&id("B1")), 5.0);
        assert_index_consistent(&sheet);
    }

    #[test]
    fn test_cascade_reaches_transitive_dependents() {
        let mut sheet = Spreadsheet::new("test");
        sheet.set_cell(&id("A1"), "2").unwrap();
        sheet.set_cell(&id("B1"), "A1 + 3").unwrap();
        sheet.set_cell(&id("C1"), "B1 * 2").unwrap();

        let result = sheet.set_cell(&id("A1"), "5").unwrap();
        assert_eq!(result, updates(&[("A1", 5.0), ("B1", 8.0), ("C1", 16.0)]));
    }

    #[test]
    fn test_diamond_sees_both_new_precedents() {
        let mut sheet = Spreadsheet::new("test");
        sheet.set_cell(&id("A1"), "1").unwrap();
        sheet.set_cell(&id("B1"), "A1").unwrap();
        sheet.set_cell(&id("C1"), "A1 * 2").unwrap();
        sheet.set_cell(&id("D1"), "B1 + C1").unwrap();

        let result = sheet.set_cell(&id("A1"), "10").unwrap();
        assert_eq!(
            result,
            updates(&[("A1", 10.0), ("B1", 10.0), ("C1", 20.0), ("D1", 30.0)])
        );
    }

    #[test]
    fn test_unset_reference_reads_zero() {
        let mut sheet = Spreadsheet::new("test");
        let result = sheet.set_cell(&id("A1"), "Z9 + 1").unwrap();
        assert_eq!(result, updates(&[("A1", 1.0)]));
    }

    #[test]
    fn test_setting_precedent_later_updates_dependent() {
        let mut sheet = Spreadsheet::new("test");
        sheet.set_cell(&id("A1"), "Z9 + 1").unwrap();
        let result = sheet.set_cell(&id("Z9"), "4").unwrap();
        assert_eq!(result, updates(&[("A1", 5.0), ("Z9", 4.0)]));
    }

    #[test]
    fn test_syntax_error_leaves_sheet_untouched() {
        let mut sheet = Spreadsheet::new("test");
        sheet.set_cell(&id("A1"), "3").unwrap();
        let err = sheet.set_cell(&id("A1"), "3 +").unwrap_err();
        assert_eq!(err.code(), "SYNTAX");
        assert_eq!(sheet.get(&id("A1")).unwrap().expr, "3");
    }

    #[test]
    fn test_multi_line_formula_is_kept_on_one_line() {
        let mut sheet = Spreadsheet::new("test");
        let result = sheet.set_cell(&id("A1"), "  1\n+\t2\r\n ").unwrap();
        assert_eq!(result, updates(&[("A1", 3.0)]));
        assert_eq!(sheet.get(&id("A1")).unwrap().expr, "1 + 2");
    }

    #[test]
    fn test_changing_formula_drops_old_dependency() {
        let mut sheet = Spreadsheet::new("test");
        sheet.set_cell(&id("B1"), "A1 + 1").unwrap();
        sheet.set_cell(&id("B1"), "C1 + 1").unwrap();

        let result = sheet.set_cell(&id("A1"), "100").unwrap();
        assert_eq!(result, updates(&[("A1", 100.0)]));
        assert_eq!(sheet.value(&id("B1")), 1.0);
        assert_index_consistent(&sheet);
    }

    #[test]
    fn test_reevaluating_unchanged_formula_is_idempotent() {
        let mut sheet = Spreadsheet::new("test");
        sheet.set_cell(&id("A1"), "4").unwrap();
        let first = sheet.set_cell(&id("B1"), "A1 * A1 - 1").unwrap();
        let second = sheet.set_cell(&id("B1"), "A1 * A1 - 1").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_division_by_zero_yields_infinity() {
        let mut sheet = Spreadsheet::new("test");
        let result = sheet.set_cell(&id("A1"), "1 / B1").unwrap();
        assert_eq!(result[&id("A1")], f64::INFINITY);
    }

    #[test]
    fn test_remove_keeps_dependent_values() {
        let mut sheet = Spreadsheet::new("test");
        sheet.set_cell(&id("A1"), "3").unwrap();
        sheet.set_cell(&id("B1"), "A1 * 2").unwrap();

        assert_eq!(sheet.remove(&id("A1")), updates(&[("A1", 0.0)]));
        assert!(sheet.get(&id("A1")).is_err());
        assert_eq!(sheet.value(&id("B1")), 6.0);

        // The dependency survives; setting A1 again cascades to B1.
        let result = sheet.set_cell(&id("A1"), "1").unwrap();
        assert_eq!(result, updates(&[("A1", 1.0), ("B1", 2.0)]));
    }

    #[test]
    fn test_remove_missing_cell_is_empty() {
        let mut sheet = Spreadsheet::new("test");
        assert!(sheet.remove(&id("C3")).is_empty());
    }

    #[test]
    fn test_get_missing_cell_is_not_found() {
        let sheet = Spreadsheet::new("test");
        let err = sheet.get(&id("A1")).unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_clear_empties_sheet() {
        let mut sheet = Spreadsheet::new("test");
        sheet.set_cell(&id("A1"), "1").unwrap();
        sheet.set_cell(&id("B1"), "A1").unwrap();
        sheet.clear();
        assert!(sheet.is_empty());
        assert_eq!(sheet.dependents.of(&id("A1")).count(), 0);
    }

    #[test]
    fn test_copy_shifts_relative_references() {
        let mut sheet = Spreadsheet::new("test");
        sheet.set_cell(&id("B3"), "7").unwrap();
        sheet.set_cell(&id("A1"), "A2 + 1").unwrap();

        let result = sheet.copy(&id("A1"), &id("B2")).unwrap();
        assert_eq!(result, updates(&[("B2", 8.0)]));
        assert_eq!(sheet.get(&id("B2")).unwrap().expr, "B3 + 1");
    }

    #[test]
    fn test_copy_keeps_absolute_references() {
        let mut sheet = Spreadsheet::new("test");
        sheet.set_cell(&id("A1"), "10").unwrap();
        sheet.set_cell(&id("B1"), "$A$1 + A2").unwrap();
        sheet.copy(&id("B1"), &id("C4")).unwrap();
        assert_eq!(sheet.get(&id("C4")).unwrap().expr, "$A$1 + B5");
        assert_eq!(sheet.value(&id("C4")), 10.0);
    }

    #[test]
    fn test_copy_from_empty_cell_removes_destination() {
        let mut sheet = Spreadsheet::new("test");
        sheet.set_cell(&id("B2"), "5").unwrap();
        let result = sheet.copy(&id("A1"), &id("B2")).unwrap();
        assert_eq!(result, updates(&[("B2", 0.0)]));
        assert!(sheet.get(&id("B2")).is_err());
    }

    #[test]
    fn test_copy_off_sheet_is_syntax_error() {
        let mut sheet = Spreadsheet::new("test");
        sheet.set_cell(&id("B1"), "A1 + 1").unwrap();
        let err = sheet.copy(&id("B1"), &id("A1")).unwrap_err();
        assert_eq!(err.code(), "SYNTAX");
        assert!(sheet.get(&id("A1")).is_err());
    }

    #[test]
    fn test_copy_into_cycle_is_rejected() {
        let mut sheet = Spreadsheet::new("test");
        sheet.set_cell(&id("A2"), "A1 + 1").unwrap();
        sheet.set_cell(&id("A1"), "A3").unwrap();
        // Copied to A3 the formula reads A2, closing A3 -> A2 -> A1 -> A3.
        let err = sheet.copy(&id("A2"), &id("A3")).unwrap_err();
        assert_eq!(err.code(), "CIRCULAR_REF");
    }
}
