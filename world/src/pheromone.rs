//! Sparse trail-strength layer.

use std::collections::BTreeMap;

use lasius_core::{CellCoord, PheromoneSnapshot};

/// Accumulated trail strength keyed by cell.
///
/// Marks appear on the first deposit with strength one and gain one per
/// further deposit. Nothing decays and nothing is ever removed during a run.
#[derive(Clone, Debug, Default)]
pub struct PheromoneLayer {
    marks: BTreeMap<CellCoord, u32>,
}

impl PheromoneLayer {
    /// Strength of the mark on `cell`, zero when unmarked.
    #[must_use]
    pub fn strength_at(&self, cell: CellCoord) -> u32 {
        self.marks.get(&cell).copied().unwrap_or(0)
    }

    /// Strength of the mark on `cell`, if one exists.
    #[must_use]
    pub fn mark_at(&self, cell: CellCoord) -> Option<u32> {
        self.marks.get(&cell).copied()
    }

    /// Number of marked cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Reports whether no cell has been marked yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Sum of every mark's strength.
    #[must_use]
    pub fn total_strength(&self) -> u64 {
        self.marks.values().map(|strength| u64::from(*strength)).sum()
    }

    /// Marks ordered by cell.
    pub fn iter(&self) -> impl Iterator<Item = PheromoneSnapshot> + '_ {
        self.marks
            .iter()
            .map(|(cell, strength)| PheromoneSnapshot {
                cell: *cell,
                strength: *strength,
            })
    }

    pub(crate) fn deposit(&mut self, cell: CellCoord) -> u32 {
        let strength = self.marks.entry(cell).or_insert(0);
        *strength = strength.saturating_add(1);
        *strength
    }

    pub(crate) fn clear(&mut self) {
        self.marks.clear();
    }
}
