//! The set of cells that can still be acquired.

use std::collections::{BTreeMap, BTreeSet};

use afa_data::{Cell, Dataset};

/// Still-missing feature cells, grouped by instance.
///
/// Iteration is always instance-major and then by attribute, so anything
/// derived from the pool is deterministic. Instances whose last cell was
/// removed are dropped by [`CellPool::prune_completed_instances`].
///
/// # Example
///
/// ```
/// use afa_data::{Attribute, Cell, Dataset};
/// use afa_engine::pool::CellPool;
///
/// let dataset = Dataset::new(
///     vec![Attribute::numeric("x"), Attribute::numeric("z"), Attribute::nominal("y", ["a"])],
///     vec![vec![None, None, Some(0.0)], vec![Some(1.0), None, Some(0.0)]],
/// )?;
/// let mut pool = CellPool::from_dataset(&dataset);
/// assert_eq!(pool.remaining_count(), 3);
///
/// assert!(pool.remove_cell(Cell::new(1, 1)));
/// pool.prune_completed_instances();
/// assert_eq!(pool.instances().collect::<Vec<_>>(), [0]);
/// # Ok::<(), afa_data::DataError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellPool {
    entries: BTreeMap<usize, BTreeSet<usize>>,
}

impl CellPool {
    /// Pool of every missing non-class cell of `dataset`.
    #[must_use]
    pub fn from_dataset(dataset: &Dataset) -> Self {
        Self::from_cells(dataset.missing_cells())
    }

    #[must_use]
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = Cell>,
    {
        let mut entries = BTreeMap::<usize, BTreeSet<usize>>::new();
        for cell in cells {
            entries
                .entry(cell.instance)
                .or_default()
                .insert(cell.attribute);
        }
        Self { entries }
    }

    #[must_use]
    pub fn remaining_count(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(BTreeSet::is_empty)
    }

    #[must_use]
    pub fn contains(&self, cell: Cell) -> bool {
        self.entries
            .get(&cell.instance)
            .is_some_and(|attrs| attrs.contains(&cell.attribute))
    }

    /// Removes `cell`, returning whether it was in the pool.
    ///
    /// The instance entry stays, possibly empty, until the next
    /// [`CellPool::prune_completed_instances`].
    pub fn remove_cell(&mut self, cell: Cell) -> bool {
        self.entries
            .get_mut(&cell.instance)
            .is_some_and(|attrs| attrs.remove(&cell.attribute))
    }

    /// Drops instances that have no cell left.
    pub fn prune_completed_instances(&mut self) {
        self.entries.retain(|_, attrs| !attrs.is_empty());
    }

    /// Instances with at least one cell in the pool.
    pub fn instances(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .filter(|(_, attrs)| !attrs.is_empty())
            .map(|(i, _)| *i)
    }

    /// Pooled attributes of `instance`.
    pub fn attributes_of(&self, instance: usize) -> impl Iterator<Item = usize> + '_ {
        self.entries.get(&instance).into_iter().flatten().copied()
    }

    /// Every pooled cell, instance-major.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.entries
            .iter()
            .flat_map(|(i, attrs)| attrs.iter().map(|j| Cell::new(*i, *j)))
    }
}
