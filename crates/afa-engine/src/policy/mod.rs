//! Policies that choose which cells to acquire next.
//!
//! Every policy implements [`BatchSelector`]: once at loop construction it
//! sees the starting dataset and pool, then every round it ranks candidate
//! cells and returns a batch of at most `batch_size` of them. Policies only
//! read the dataset and pool; the loop does the acquiring and tells the
//! policy afterwards through [`BatchSelector::on_acquired`].
//!
//! # Variants
//!
//! - [`BanditPolicy`] - UCB score mixing instance reward, attribute reward
//!   and an exploration bonus over the whole pool
//! - [`SeuPolicy`] - sequential expected utility, scored by counterfactual
//!   retraining, over candidates restricted by a [`CandidateSampler`]:
//!   - [`UniformSampling`] - one uniform sample drawn at construction
//!   - [`ErrorSampling`] - missing cells of misclassified or uncertain
//!     instances, redrawn each round
//! - [`RandomPolicy`] - uniformly shuffled pool, the baseline
//!
//! [`Policy`] is the closed set of these variants, which is what the loop
//! holds.
//!
//! # Ranking
//!
//! Scores sort descending. Equal scores go to the lower cell (instance first,
//! then attribute), so a ranking depends only on the scores.

use std::cmp::Ordering;

use afa_classifier::ClassifierOracle;
use afa_data::{Cell, Dataset};
use rand_pcg::Pcg64;

use crate::{EngineError, pool::CellPool};

pub use self::{
    bandit::{BanditPolicy, QueryCounters},
    random::RandomPolicy,
    seu::{CandidateSampler, ErrorSampling, SeuPolicy, UniformSampling},
};

mod bandit;
mod random;
pub mod seu;

/// What a policy sees while choosing a batch.
#[derive(Debug)]
pub struct SelectionContext<'a, O>
where
    O: ClassifierOracle,
{
    /// The working dataset, with every value acquired so far.
    pub dataset: &'a Dataset,
    /// Classifier trained on `dataset`.
    pub classifier: &'a O::Model,
    /// Oracle used for counterfactual and surrogate training.
    pub classifier_oracle: &'a O,
    /// The loop's random number generator.
    pub rng: &'a mut Pcg64,
}

/// A batch chosen for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Cells to acquire, best first.
    pub cells: Vec<Cell>,
    /// Number of cells the policy ranked to choose the batch.
    pub candidate_count: usize,
}

impl Selection {
    /// Takes the first `batch_size` cells of a ranking.
    #[must_use]
    pub fn top(mut ranked: Vec<Cell>, batch_size: usize) -> Self {
        let candidate_count = ranked.len();
        ranked.truncate(batch_size);
        Self {
            cells: ranked,
            candidate_count,
        }
    }
}

/// Capability shared by every acquisition policy.
pub trait BatchSelector {
    /// Short name used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Prepares the policy for a run starting from `dataset` and `pool`.
    ///
    /// Called once, before the first round.
    fn initialize(
        &mut self,
        dataset: &Dataset,
        pool: &CellPool,
        batch_size: usize,
        rng: &mut Pcg64,
    ) -> Result<(), EngineError>;

    /// Chooses up to `batch_size` distinct cells from `pool`.
    ///
    /// An empty selection means the policy has nothing left to offer.
    fn select_batch<O>(
        &mut self,
        ctx: SelectionContext<'_, O>,
        pool: &CellPool,
        batch_size: usize,
    ) -> Result<Selection, EngineError>
    where
        O: ClassifierOracle;

    /// Observes cells the loop acquired after the last selection.
    fn on_acquired(&mut self, _cells: &[Cell]) {}
}

/// The acquisition policies the loop can run.
#[derive(Debug, derive_more::IsVariant)]
pub enum Policy {
    Bandit(BanditPolicy),
    SeuUniform(SeuPolicy<UniformSampling>),
    SeuError(SeuPolicy<ErrorSampling>),
    Random(RandomPolicy),
}

impl BatchSelector for Policy {
    fn name(&self) -> &'static str {
        match self {
            Self::Bandit(p) => p.name(),
            Self::SeuUniform(p) => p.name(),
            Self::SeuError(p) => p.name(),
            Self::Random(p) => p.name(),
        }
    }

    fn initialize(
        &mut self,
        dataset: &Dataset,
        pool: &CellPool,
        batch_size: usize,
        rng: &mut Pcg64,
    ) -> Result<(), EngineError> {
        match self {
            Self::Bandit(p) => p.initialize(dataset, pool, batch_size, rng),
            Self::SeuUniform(p) => p.initialize(dataset, pool, batch_size, rng),
            Self::SeuError(p) => p.initialize(dataset, pool, batch_size, rng),
            Self::Random(p) => p.initialize(dataset, pool, batch_size, rng),
        }
    }

    fn select_batch<O>(
        &mut self,
        ctx: SelectionContext<'_, O>,
        pool: &CellPool,
        batch_size: usize,
    ) -> Result<Selection, EngineError>
    where
        O: ClassifierOracle,
    {
        match self {
            Self::Bandit(p) => p.select_batch(ctx, pool, batch_size),
            Self::SeuUniform(p) => p.select_batch(ctx, pool, batch_size),
            Self::SeuError(p) => p.select_batch(ctx, pool, batch_size),
            Self::Random(p) => p.select_batch(ctx, pool, batch_size),
        }
    }

    fn on_acquired(&mut self, cells: &[Cell]) {
        match self {
            Self::Bandit(p) => p.on_acquired(cells),
            Self::SeuUniform(p) => p.on_acquired(cells),
            Self::SeuError(p) => p.on_acquired(cells),
            Self::Random(p) => p.on_acquired(cells),
        }
    }
}

/// Sorts scored cells best first, lower cell first among equal scores.
#[must_use]
pub fn rank(mut scored: Vec<(f64, Cell)>) -> Vec<Cell> {
    scored.sort_by(|(sa, ca), (sb, cb)| {
        sb.partial_cmp(sa)
            .unwrap_or(Ordering::Equal)
            .then_with(|| ca.cmp(cb))
    });
    scored.into_iter().map(|(_, cell)| cell).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_breaks_ties_by_cell() {
        let ranked = rank(vec![
            (0.5, Cell::new(3, 0)),
            (0.9, Cell::new(5, 1)),
            (0.5, Cell::new(1, 2)),
            (0.5, Cell::new(1, 0)),
        ]);
        assert_eq!(
            ranked,
            [Cell::new(5, 1), Cell::new(1, 0), Cell::new(1, 2), Cell::new(3, 0)]
        );
    }

    #[test]
    fn test_top_keeps_candidate_count() {
        let selection = Selection::top(vec![Cell::new(0, 0), Cell::new(0, 1)], 5);
        assert_eq!(selection.cells.len(), 2);
        assert_eq!(selection.candidate_count, 2);

        let selection = Selection::top(vec![Cell::new(0, 0), Cell::new(0, 1)], 1);
        assert_eq!(selection.cells, [Cell::new(0, 0)]);
        assert_eq!(selection.candidate_count, 2);
    }
}
