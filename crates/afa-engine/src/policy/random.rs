use afa_classifier::ClassifierOracle;
use afa_data::Dataset;
use rand::seq::SliceRandom as _;
use rand_pcg::Pcg64;

use super::{BatchSelector, Selection, SelectionContext};
use crate::{EngineError, pool::CellPool};

/// Baseline policy: a uniformly random batch of pooled cells.
///
/// Each round the pool is listed instance-major, shuffled with the loop's
/// generator, and the first `batch_size` cells are taken, so a fixed seed
/// reproduces the same batches.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPolicy;

impl BatchSelector for RandomPolicy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn initialize(
        &mut self,
        _dataset: &Dataset,
        _pool: &CellPool,
        _batch_size: usize,
        _rng: &mut Pcg64,
    ) -> Result<(), EngineError> {
        Ok(())
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
        let mut cells = pool.cells().collect::<Vec<_>>();
        cells.shuffle(ctx.rng);
        Ok(Selection::top(cells, batch_size))
    }
}
