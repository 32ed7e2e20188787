use std::collections::BTreeSet;

use afa_classifier::Classifier;
use afa_data::{Cell, Dataset};
use rand::seq::SliceRandom as _;
use rand_pcg::Pcg64;
use tracing::debug;

use super::CandidateSampler;
use crate::{EngineError, config::UniformSamplingParams, pool::CellPool};

/// One uniform sample of the starting pool, scored for the whole run.
///
/// The sample holds `min(alpha, floor(missing / batch_size)) × batch_size`
/// cells, where `missing` is the size of the starting pool. With fewer
/// missing cells than one batch the sample is empty and the run ends at
/// once. Acquired cells leave the sample; nothing is ever added.
#[derive(Debug, Clone, Default)]
pub struct UniformSampling {
    params: UniformSamplingParams,
    sample: BTreeSet<Cell>,
}

impl UniformSampling {
    #[must_use]
    pub fn new(params: UniformSamplingParams) -> Self {
        Self {
            params,
            sample: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn params(&self) -> &UniformSamplingParams {
        &self.params
    }

    /// Cells of the sample not acquired yet.
    #[must_use]
    pub fn sample(&self) -> &BTreeSet<Cell> {
        &self.sample
    }
}

impl CandidateSampler for UniformSampling {
    fn name(&self) -> &'static str {
        "seu-uniform"
    }

    fn initialize(
        &mut self,
        _dataset: &Dataset,
        pool: &CellPool,
        batch_size: usize,
        rng: &mut Pcg64,
    ) -> Result<(), EngineError> {
        self.params.validate()?;
        let mut cells = pool.cells().collect::<Vec<_>>();
        let alpha = self.params.alpha.min(cells.len() / batch_size.max(1));
        cells.shuffle(rng);
        cells.truncate(alpha * batch_size);
        self.sample = cells.into_iter().collect();
        debug!(
            alpha,
            sample = self.sample.len(),
            pool = pool.remaining_count(),
            "uniform candidate sample drawn"
        );
        Ok(())
    }

    fn candidates<C>(
        &mut self,
        _dataset: &Dataset,
        _classifier: &C,
        pool: &CellPool,
        _rng: &mut Pcg64,
    ) -> Vec<Cell>
    where
        C: Classifier + ?Sized,
    {
        self.sample
            .iter()
            .copied()
            .filter(|cell| pool.contains(*cell))
            .collect()
    }

    fn on_acquired(&mut self, cells: &[Cell]) {
        for cell in cells {
            self.sample.remove(cell);
        }
    }
}

#[cfg(test)]
mod tests {
    use afa_data::Attribute;
    use rand::SeedableRng as _;

    use super::*;

    #[derive(Debug)]
    struct Stub;

    impl Classifier for Stub {
        fn num_classes(&self) -> usize {
            1
        }

        fn distribution(&self, _row: &[Option<f64>]) -> Vec<f64> {
            vec![1.0]
        }
    }

    fn empty() -> Dataset {
        Dataset::new(vec![Attribute::nominal("y", ["a"])], vec![]).unwrap()
    }

    fn pool(n: usize) -> CellPool {
        CellPool::from_cells((0..n).map(|i| Cell::new(i / 3, i % 3)))
    }

    fn sampled(alpha: usize, missing: usize, batch_size: usize) -> UniformSampling {
        let mut sampler = UniformSampling::new(UniformSamplingParams { alpha });
        sampler
            .initialize(
                &empty(),
                &pool(missing),
                batch_size,
                &mut Pcg64::seed_from_u64(3),
            )
            .unwrap();
        sampler
    }

    #[test]
    fn test_sample_size_is_clamped() {
        // min(alpha, floor(missing / b)) × b
        assert_eq!(sampled(2, 30, 4).sample().len(), 8);
        assert_eq!(sampled(10, 30, 4).sample().len(), 28);
        assert_eq!(sampled(10, 30, 1).sample().len(), 10);
        assert_eq!(sampled(3, 3, 5).sample().len(), 0);
    }

    #[test]
    fn test_sample_only_shrinks() {
        let mut sampler = sampled(2, 30, 3);
        let full = pool(30);
        let before = sampler.sample().clone();
        assert!(before.iter().all(|c| full.contains(*c)));

        let taken = before.iter().take(2).copied().collect::<Vec<_>>();
        sampler.on_acquired(&taken);
        sampler.on_acquired(&[Cell::new(99, 0)]);
        assert_eq!(sampler.sample().len(), before.len() - 2);
        assert!(sampler.sample().is_subset(&before));
    }

    #[test]
    fn test_candidates_are_in_pool() {
        let mut sampler = sampled(5, 12, 2);
        let mut pool = pool(12);
        let first = *sampler.sample().first().unwrap();
        pool.remove_cell(first);
        let candidates = sampler.candidates(
            &empty(),
            &Stub,
            &pool,
            &mut Pcg64::seed_from_u64(0),
        );
        assert_eq!(candidates.len(), 9);
        assert!(!candidates.contains(&first));
    }
}
