//! Dependency tracking between cells.
//!
//! A cell's *precedents* are the cells its formula reads; they are derived by
//! walking the parsed formula's reference nodes. The inverse relation, a
//! cell's *dependents*, is kept as an explicit reverse index ([`Dependents`])
//! that is updated whenever a cell's precedent set changes.

use std::collections::{BTreeSet, HashMap};

use super::ast::Formula;
use super::cell::CellStore;
use super::cell_ref::CellRef;

/// Cells read directly by `formula` when it is the formula of `base`.
///
/// References that fall off the sheet read as zero and are not precedents.
pub fn precedents(formula: &Formula, base: &CellRef) -> BTreeSet<CellRef> {
    let mut deps = BTreeSet::new();
    formula.for_each_reference(&mut |r| {
        if let Some(target) = r.resolve(base) {
            deps.insert(target);
        }
    });
    deps
}

/// Reverse dependency map: cell -> cells whose formulas read it.
#[derive(Clone, Debug, Default)]
pub struct Dependents {
    map: HashMap<CellRef, BTreeSet<CellRef>>,
}

impl Dependents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the whole index from the store.
    pub fn rebuild(store: &CellStore) -> Self {
        let mut dependents = Self::new();
        for (id, cell) in store.iter() {
            dependents.link(id, &BTreeSet::new(), &cell.precedents);
        }
        dependents
    }

    /// Direct dependents of `id`, in id order.
    pub fn of(&self, id: &CellRef) -> impl Iterator<Item = &CellRef> {
        self.map.get(id).into_iter().flatten()
    }

    /// Record that `cell` now reads `new` instead of `old`.
    pub fn link(&mut self, cell: &CellRef, old: &BTreeSet<CellRef>, new: &BTreeSet<CellRef>) {
        for gone in old.difference(new) {
            self.detach(gone, cell);
        }
        for added in new.difference(old) {
            self.map
                .entry(added.clone())
                .or_default()
                .insert(cell.clone());
        }
    }

    /// Forget every edge from `cell` to its precedents.
    pub fn unlink(&mut self, cell: &CellRef, precedents: &BTreeSet<CellRef>) {
        for precedent in precedents {
            self.detach(precedent, cell);
        }
    }

    fn detach(&mut self, precedent: &CellRef, cell: &CellRef) {
        if let Some(set) = self.map.get_mut(precedent) {
            set.remove(cell);
            if set.is_empty() {
                self.map.remove(precedent);
            }
        }
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Every cell downstream of `id`, not including `id` itself.
    pub fn transitive(&self, id: &CellRef) -> BTreeSet<CellRef> {
        let mut seen = BTreeSet::new();
        let mut to_process: Vec<&CellRef> = self.of(id).collect();
        while let Some(cell) = to_process.pop() {
            if cell != id && seen.insert(cell.clone()) {
                to_process.extend(self.of(cell));
            }
        }
        seen
    }

    /// Order in which the cells downstream of `id` must be recomputed after
    /// `id` changes.
    pub fn recalc_order(&self, id: &CellRef, store: &CellStore) -> Vec<CellRef> {
        self.order(&self.transitive(id), store)
    }

    /// Every cell in the store, precedents before dependents.
    pub fn evaluation_order(&self, store: &CellStore) -> Vec<CellRef> {
        let all: BTreeSet<CellRef> = store.iter().map(|(id, _)| id.clone()).collect();
        self.order(&all, store)
    }

    /// Topologically sort `cells`: every cell comes after those of its
    /// precedents that are also in `cells`, ties go to the lower id.
    /// Assumes the graph is acyclic.
    fn order(&self, cells: &BTreeSet<CellRef>, store: &CellStore) -> Vec<CellRef> {
        let mut pending: HashMap<&CellRef, usize> = cells
            .iter()
            .map(|cell| {
                let waiting_on = store
                    .get(cell)
                    .map_or(0, |c| c.precedents.intersection(cells).count());
                (cell, waiting_on)
            })
            .collect();

        let mut ready: BTreeSet<&CellRef> = pending
            .iter()
            .filter(|(_, waiting_on)| **waiting_on == 0)
            .map(|(cell, _)| *cell)
            .collect();

        let mut order = Vec::with_capacity(cells.len());
        while let Some(cell) = ready.pop_first() {
            order.push(cell.clone());
            for dependent in self.of(cell) {
                if let Some(waiting_on) = pending.get_mut(dependent) {
                    *waiting_on -= 1;
                    if *waiting_on == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }
        order
    }
}
