//! Circular dependency detection for formula cells.
//!
//! When a formula is entered, we must verify it doesn't create a cycle
//! (e.g., A1 references B1, B1 references C1, C1 references A1).
//! The new cell is provisionally installed in the store and this module
//! searches its precedents depth-first before anything is evaluated.

use std::collections::{HashSet, btree_set};

use super::{CellRef, CellStore};

/// Detect circular dependencies starting from a cell.
/// Returns Some(cycle_path) if a cycle is found, None otherwise.
///
/// The search keeps its own stack, so chains of any length are safe.
pub fn detect_cycle(start: &CellRef, store: &CellStore) -> Option<Vec<CellRef>> {
    let mut visiting = HashSet::new();
    let mut done = HashSet::new();
    // The current path, each cell paired with its unexplored precedents.
    let mut stack: Vec<(CellRef, btree_set::Iter<'_, CellRef>)> = Vec::new();

    let cell = store.get(start)?;
    visiting.insert(start.clone());
    stack.push((start.clone(), cell.precedents.iter()));

    while let Some((_, pending)) = stack.last_mut() {
        let Some(next) = pending.next() else {
            if let Some((id, _)) = stack.pop() {
                visiting.remove(&id);
                done.insert(id);
            }
            continue;
        };
        if visiting.contains(next) {
            let mut path: Vec<CellRef> = stack.iter().map(|(id, _)| id.clone()).collect();
            path.push(next.clone());
            return Some(path);
        }
        if done.contains(next) {
            continue;
        }
        if let Some(cell) = store.get(next) {
            visiting.insert(next.clone());
            stack.push((next.clone(), cell.precedents.iter()));
        }
    }
    None
}
