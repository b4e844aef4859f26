//! gridcalc_engine - Formula language and cell dependency graph.

pub mod engine;
pub mod error;

pub use error::{EngineError, Result};

#[cfg(test)]
mod tests {
    use crate::engine::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_parse_eval_through_store() {
        let mut store = CellStore::new();
        let a1 = CellRef::new(0, 0);
        let b1 = CellRef::new(1, 0);

        let formula = parse("2", &a1).unwrap();
        let mut cell = Cell::new("2", formula, BTreeSet::new());
        cell.value = evaluate(&cell.formula, &a1, &store);
        store.insert(a1.clone(), cell);

        let formula = parse("A1 * 10", &b1).unwrap();
        let precs = precedents(&formula, &b1);
        assert!(precs.contains(&a1));
        assert_eq!(evaluate(&formula, &b1, &store), 20.0);
    }

    #[test]
    fn test_copied_formula_reads_shifted_cells() {
        let a1 = CellRef::new(0, 0);
        let b2 = CellRef::new(1, 1);
        let formula = parse("A2 + 1", &a1).unwrap();
        assert_eq!(formula.render(&b2), "B3 + 1");
        let precs: Vec<String> = precedents(&formula, &b2)
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(precs, vec!["B3"]);
    }
}
