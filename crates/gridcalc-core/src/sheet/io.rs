use super::Spreadsheet;
use crate::error::Result;
use gridcalc_engine::engine::CellRef;
use tracing::debug;

impl Spreadsheet {
    /// Replay `(id, expr)` pairs through [`Spreadsheet::set_cell`], stopping
    /// at the first rejected entry.
    pub fn load<I, S>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (CellRef, S)>,
        S: AsRef<str>,
    {
        let mut count = 0usize;
        for (id, expr) in entries {
            self.set_cell(&id, expr.as_ref())?;
            count += 1;
        }
        debug!(sheet = %self.name, count, "loaded");
        Ok(())
    }

    /// Every cell with its formula text, precedents before dependents.
    ///
    /// Loading the result into an empty sheet reproduces every value.
    pub fn dump(&self) -> Vec<(CellRef, String)> {
        self.dependents
            .evaluation_order(&self.store)
            .into_iter()
            .filter_map(|id| {
                let expr = self.store.get(&id)?.expr.clone();
                Some((id, expr))
            })
            .collect()
    }
}
