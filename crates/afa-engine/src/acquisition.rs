//! The acquire-and-retrain loop.
//!
//! [`AcquisitionLoop::perform`] runs rounds of:
//!
//! 1. **Select** - the policy picks up to `batch_size` cells from the pool
//! 2. **Acquire** - the ground-truth oracle reveals each selected cell
//! 3. **Retrain** - the classifier oracle trains on the updated dataset
//! 4. **Commit** - the dataset, pool and policy state advance together and
//!    the round is returned as an [`AcquisitionRound`]
//!
//! A round is atomic: selection draws from a copy of the random number
//! generator and values are written to a copy of the dataset. Both are only
//! committed once retraining succeeded, so an error leaves the loop exactly as
//! it was before the round, and retrying picks the same batch.
//!
//! The loop stops early when the pool is empty or the policy has no
//! candidates left ([`LoopStatus::Exhausted`]); otherwise it stops after `k`
//! rounds ([`LoopStatus::BudgetMet`]) and can be resumed by calling
//! [`AcquisitionLoop::perform`] again.

use afa_classifier::ClassifierOracle;
use afa_data::{Cell, Dataset, GroundTruthOracle};
use rand::SeedableRng as _;
use rand_pcg::Pcg64;
use tracing::{debug, info};

use crate::{
    ConfigError, EngineError,
    config::AcquisitionConfig,
    policy::{BatchSelector, Policy, SelectionContext},
    pool::CellPool,
};

/// Where the loop stands between calls to [`AcquisitionLoop::perform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum LoopStatus {
    /// No round has run yet.
    Ready,
    /// The last call ran all the rounds it was asked for; more can run.
    BudgetMet,
    /// Nothing is left to acquire. Further calls return no rounds.
    Exhausted,
}

/// One completed round.
#[derive(Debug, Clone)]
pub struct AcquisitionRound<M> {
    /// Zero-based index of the round over the lifetime of the loop.
    pub index: usize,
    /// Acquired cells, in the order the policy ranked them.
    pub cells: Vec<Cell>,
    /// Number of cells the policy ranked to choose `cells`.
    pub candidate_count: usize,
    /// Classifier retrained right after the acquisition.
    pub classifier: M,
}

/// Runs a policy against a dataset with missing values.
#[derive(Debug)]
pub struct AcquisitionLoop<O>
where
    O: ClassifierOracle,
{
    dataset: Dataset,
    ground_truth: Box<dyn GroundTruthOracle>,
    classifier_oracle: O,
    policy: Policy,
    config: AcquisitionConfig,
    pool: CellPool,
    classifier: O::Model,
    rng: Pcg64,
    status: LoopStatus,
    rounds_completed: usize,
    initial_missing_count: usize,
}

impl<O> AcquisitionLoop<O>
where
    O: ClassifierOracle,
{
    /// Validates the setup, builds the pool, prepares the policy and trains
    /// the baseline classifier.
    ///
    /// The class attribute must be the last attribute, nominal, and labelled
    /// on every instance.
    pub fn new(
        dataset: Dataset,
        ground_truth: Box<dyn GroundTruthOracle>,
        classifier_oracle: O,
        mut policy: Policy,
        config: AcquisitionConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        validate_dataset(&dataset)?;

        let pool = CellPool::from_dataset(&dataset);
        let mut rng = Pcg64::seed_from_u64(config.seed);
        policy.initialize(&dataset, &pool, config.batch_size, &mut rng)?;
        let classifier = classifier_oracle.train(&dataset)?;
        let initial_missing_count = pool.remaining_count();
        debug!(
            policy = policy.name(),
            instances = dataset.num_instances(),
            features = dataset.num_features(),
            missing = initial_missing_count,
            batch_size = config.batch_size,
            "acquisition loop ready"
        );

        Ok(Self {
            dataset,
            ground_truth,
            classifier_oracle,
            policy,
            config,
            pool,
            classifier,
            rng,
            status: LoopStatus::Ready,
            rounds_completed: 0,
            initial_missing_count,
        })
    }

    /// Runs up to `k` rounds and returns the completed ones.
    ///
    /// Fewer than `k` rounds are returned when the pool runs out. On error
    /// the failing round is discarded; rounds completed by earlier calls stay
    /// committed.
    pub fn perform(&mut self, k: usize) -> Result<Vec<AcquisitionRound<O::Model>>, EngineError> {
        let mut rounds = vec![];
        for _ in 0..k {
            if self.status.is_exhausted() {
                break;
            }
            match self.round()? {
                Some(round) => rounds.push(round),
                None => self.exhaust(),
            }
        }
        if !self.status.is_exhausted() && k > 0 {
            self.status = LoopStatus::BudgetMet;
        }
        Ok(rounds)
    }

    fn round(&mut self) -> Result<Option<AcquisitionRound<O::Model>>, EngineError> {
        if self.pool.is_empty() {
            return Ok(None);
        }
        let mut rng = self.rng.clone();
        let ctx = SelectionContext {
            dataset: &self.dataset,
            classifier: &self.classifier,
            classifier_oracle: &self.classifier_oracle,
            rng: &mut rng,
        };
        let selection = self
            .policy
            .select_batch(ctx, &self.pool, self.config.batch_size)?;
        if selection.cells.is_empty() {
            self.rng = rng;
            return Ok(None);
        }

        let mut dataset = self.dataset.clone();
        for cell in &selection.cells {
            let value = self.ground_truth.value(*cell)?;
            dataset.set_value(*cell, value)?;
        }
        let classifier = self.classifier_oracle.train(&dataset)?;

        self.dataset = dataset;
        self.rng = rng;
        for cell in &selection.cells {
            self.pool.remove_cell(*cell);
        }
        self.pool.prune_completed_instances();
        self.policy.on_acquired(&selection.cells);
        self.classifier = classifier.clone();

        let index = self.rounds_completed;
        self.rounds_completed += 1;
        debug!(
            round = index,
            policy = self.policy.name(),
            acquired = ?selection.cells,
            candidates = selection.candidate_count,
            remaining = self.pool.remaining_count(),
            "round completed"
        );
        if self.pool.is_empty() {
            self.exhaust();
        }

        Ok(Some(AcquisitionRound {
            index,
            cells: selection.cells,
            candidate_count: selection.candidate_count,
            classifier,
        }))
    }

    fn exhaust(&mut self) {
        if !self.status.is_exhausted() {
            info!(
                rounds = self.rounds_completed,
                remaining = self.pool.remaining_count(),
                "acquisition exhausted"
            );
            self.status = LoopStatus::Exhausted;
        }
    }

    /// Classifier trained on the current dataset; before the first round,
    /// the baseline.
    #[must_use]
    pub fn classifier(&self) -> &O::Model {
        &self.classifier
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    #[must_use]
    pub fn pool(&self) -> &CellPool {
        &self.pool
    }

    #[must_use]
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    #[must_use]
    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    #[must_use]
    pub fn status(&self) -> LoopStatus {
        self.status
    }

    #[must_use]
    pub fn rounds_completed(&self) -> usize {
        self.rounds_completed
    }

    /// Number of feature cells, `instances × features`.
    #[must_use]
    pub fn total_cell_count(&self) -> usize {
        self.dataset.num_instances() * self.dataset.num_features()
    }

    /// Size of the pool when the loop was built.
    #[must_use]
    pub fn initial_missing_count(&self) -> usize {
        self.initial_missing_count
    }
}

fn validate_dataset(dataset: &Dataset) -> Result<(), ConfigError> {
    let num_attributes = dataset.num_attributes();
    if dataset.class_index() + 1 != num_attributes {
        return Err(ConfigError::ClassNotLast {
            class_index: dataset.class_index(),
            num_attributes,
        });
    }
    if !dataset.class_attribute().is_nominal() {
        return Err(ConfigError::NonNominalClass {
            attribute: dataset.class_index(),
        });
    }
    if let Some(instance) = dataset.unlabelled_instances().next() {
        return Err(ConfigError::MissingClassLabel { instance });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        collections::BTreeSet,
        sync::atomic::{AtomicBool, Ordering},
    };

    use afa_classifier::{
        Classifier,
        tree::{DecisionTree, DecisionTreeOracle},
    };
    use afa_data::{Attribute, OracleError, ReferenceOracle, missing};

    use super::*;
    use crate::config::{
        BanditParams, ErrorSamplingParams, PolicyConfig, UniformSamplingParams,
    };

    #[expect(clippy::cast_precision_loss)]
    fn complete(n: usize) -> Dataset {
        // class follows `a`; `b` is noise; `c` is numeric and follows `a`
        let rows = (0..n)
            .map(|i| {
                let a = (i % 2) as f64;
                let b = ((i / 2) % 3) as f64;
                let c = a * 10.0 + (i % 5) as f64;
                vec![Some(a), Some(b), Some(c), Some(a)]
            })
            .collect();
        Dataset::new(
            vec![
                Attribute::nominal("a", ["0", "1"]),
                Attribute::nominal("b", ["x", "y", "z"]),
                Attribute::numeric("c"),
                Attribute::nominal("class", ["n", "y"]),
            ],
            rows,
        )
        .unwrap()
    }

    fn hidden(n: usize, seed: u64) -> (Dataset, Dataset) {
        let original = complete(n);
        let working =
            missing::hide_uniformly(&original, 0.5, &mut Pcg64::seed_from_u64(seed)).unwrap();
        (original, working)
    }

    fn build(
        original: Dataset,
        working: Dataset,
        policy: PolicyConfig,
        batch_size: usize,
        seed: u64,
    ) -> AcquisitionLoop<DecisionTreeOracle> {
        AcquisitionLoop::new(
            working,
            Box::new(ReferenceOracle::new(original)),
            DecisionTreeOracle::default(),
            policy.build().unwrap(),
            AcquisitionConfig { batch_size, seed },
        )
        .unwrap()
    }

    fn all_policies() -> [PolicyConfig; 4] {
        [
            PolicyConfig::Bandit(BanditParams::default()),
            PolicyConfig::SeuUniform(UniformSamplingParams { alpha: 10 }),
            PolicyConfig::SeuError(ErrorSamplingParams { es_param: 2 }),
            PolicyConfig::Random,
        ]
    }

    #[test]
    fn test_single_missing_cell() {
        let original = complete(4);
        let mut working = original.clone();
        working.set_missing(Cell::new(2, 1)).unwrap();

        for policy in all_policies() {
            let mut afa = build(original.clone(), working.clone(), policy, 1, 0);
            assert_eq!(afa.status(), LoopStatus::Ready);
            assert_eq!(afa.initial_missing_count(), 1);
            assert_eq!(afa.total_cell_count(), 12);

            let rounds = afa.perform(1).unwrap();
            assert_eq!(rounds.len(), 1);
            assert_eq!(rounds[0].cells, [Cell::new(2, 1)]);
            assert_eq!(afa.pool().remaining_count(), 0);
            assert_eq!(afa.dataset(), &original);
            assert_eq!(afa.status(), LoopStatus::Exhausted);

            assert!(afa.perform(1).unwrap().is_empty());
            assert_eq!(afa.rounds_completed(), 1);
        }
    }

    #[test]
    fn test_rounds_respect_batch_size_and_pool() {
        for policy in all_policies() {
            let (original, working) = hidden(12, 3);
            let mut afa = build(original.clone(), working, policy, 3, 11);
            let mut acquired = BTreeSet::new();
            let mut remaining = afa.pool().remaining_count();

            let rounds = afa.perform(100).unwrap();
            assert!(!rounds.is_empty());
            for (index, round) in rounds.iter().enumerate() {
                assert_eq!(round.index, index);
                assert!(round.cells.len() <= 3);
                assert_eq!(round.cells.len(), round.candidate_count.min(3));
                for cell in &round.cells {
                    assert!(acquired.insert(*cell), "{cell} acquired twice");
                    assert_eq!(afa.dataset().value(*cell), original.value(*cell));
                }
                assert!(remaining >= round.cells.len());
                remaining -= round.cells.len();
            }
            assert_eq!(afa.pool().remaining_count(), remaining);
            assert_eq!(
                afa.pool().cells().collect::<Vec<_>>(),
                afa.dataset().missing_cells().collect::<Vec<_>>()
            );
            assert_eq!(afa.status(), LoopStatus::Exhausted);
        }
    }

    #[test]
    fn test_whole_pool_policies_drain_the_pool() {
        for policy in [
            PolicyConfig::Bandit(BanditParams::with_alpha(0.5)),
            PolicyConfig::SeuError(ErrorSamplingParams { es_param: 1 }),
            PolicyConfig::Random,
        ] {
            let (original, working) = hidden(10, 5);
            let mut afa = build(original.clone(), working, policy, 4, 2);
            let missing = afa.initial_missing_count();
            let rounds = afa.perform(missing).unwrap();
            assert_eq!(afa.pool().remaining_count(), 0);
            assert_eq!(afa.dataset(), &original);
            assert_eq!(rounds.iter().map(|r| r.cells.len()).sum::<usize>(), missing);
            if !afa.policy().is_seu_error() {
                // every round but the last takes a full batch
                assert!(rounds[..rounds.len() - 1].iter().all(|r| r.cells.len() == 4));
            }
        }
    }

    #[test]
    fn test_budget_and_resume() {
        let (original, working) = hidden(12, 8);
        let mut afa = build(original, working, PolicyConfig::Random, 2, 4);
        let first = afa.perform(2).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(afa.status(), LoopStatus::BudgetMet);
        let second = afa.perform(1).unwrap();
        assert_eq!(second[0].index, 2);
        assert_eq!(afa.rounds_completed(), 3);
    }

    #[test]
    fn test_fixed_seed_reproduces_run() {
        for policy in [
            PolicyConfig::Random,
            PolicyConfig::SeuError(ErrorSamplingParams { es_param: 2 }),
        ] {
            let run = || {
                let (original, working) = hidden(12, 1);
                build(original, working, policy, 2, 99)
                    .perform(4)
                    .unwrap()
                    .into_iter()
                    .map(|r| r.cells)
                    .collect::<Vec<_>>()
            };
            assert_eq!(run(), run());
        }
    }

    #[test]
    fn test_uniform_sample_smaller_than_batch_exhausts() {
        let (original, mut working) = hidden(4, 0);
        for cell in working.missing_cells().skip(1).collect::<Vec<_>>() {
            working
                .set_value(cell, original.value(cell).unwrap())
                .unwrap();
        }
        let mut afa = build(
            original,
            working,
            PolicyConfig::SeuUniform(UniformSamplingParams { alpha: 3 }),
            2,
            0,
        );
        assert!(afa.perform(3).unwrap().is_empty());
        assert_eq!(afa.status(), LoopStatus::Exhausted);
        assert_eq!(afa.pool().remaining_count(), 1);
    }

    #[test]
    fn test_invalid_setups_are_rejected() {
        let (original, working) = hidden(6, 0);
        let try_build = |working: Dataset, policy: PolicyConfig, batch_size| {
            AcquisitionLoop::new(
                working,
                Box::new(ReferenceOracle::new(original.clone())),
                DecisionTreeOracle::default(),
                policy.build().unwrap(),
                AcquisitionConfig {
                    batch_size,
                    seed: 0,
                },
            )
        };

        let class_first = working.with_class_index(0).unwrap();
        assert!(matches!(
            try_build(class_first, PolicyConfig::Random, 1),
            Err(EngineError::Config(ConfigError::ClassNotLast { .. }))
        ));

        let mut unlabelled = working.clone();
        unlabelled.set_missing(Cell::new(4, 3)).unwrap();
        assert!(matches!(
            try_build(unlabelled, PolicyConfig::Random, 1),
            Err(EngineError::Config(ConfigError::MissingClassLabel { instance: 4 }))
        ));

        assert!(matches!(
            try_build(working.clone(), PolicyConfig::Random, 0),
            Err(EngineError::Config(ConfigError::ZeroBatchSize))
        ));

        let too_many = PolicyConfig::SeuError(ErrorSamplingParams { es_param: 7 });
        assert!(matches!(
            try_build(working, too_many, 1),
            Err(EngineError::Config(ConfigError::EsParamOutOfRange { .. }))
        ));
    }

    /// Reference oracle that refuses one cell.
    #[derive(Debug)]
    struct Refusing {
        inner: ReferenceOracle,
        refused: Cell,
    }

    impl GroundTruthOracle for Refusing {
        fn value(&self, cell: Cell) -> Result<f64, OracleError> {
            if cell == self.refused {
                return Err(OracleError::Unobserved { cell });
            }
            self.inner.value(cell)
        }
    }

    #[test]
    fn test_failed_round_is_not_committed() {
        let (original, working) = hidden(8, 2);
        let refused = working.missing_cells().next().unwrap();
        let mut afa: AcquisitionLoop<DecisionTreeOracle> = AcquisitionLoop::new(
            working.clone(),
            Box::new(Refusing {
                inner: ReferenceOracle::new(original),
                refused,
            }),
            DecisionTreeOracle::default(),
            PolicyConfig::Random.build().unwrap(),
            AcquisitionConfig {
                batch_size: 100,
                seed: 0,
            },
        )
        .unwrap();

        let pool_before = afa.pool().clone();
        let err = afa.perform(1).unwrap_err();
        assert!(err.is_oracle());
        assert_eq!(afa.dataset(), &working);
        assert_eq!(afa.pool(), &pool_before);
        assert_eq!(afa.rounds_completed(), 0);
    }

    /// Reference oracle whose first request fails.
    #[derive(Debug)]
    struct FailOnce {
        inner: ReferenceOracle,
        failed: AtomicBool,
    }

    impl GroundTruthOracle for FailOnce {
        fn value(&self, cell: Cell) -> Result<f64, OracleError> {
            if !self.failed.swap(true, Ordering::Relaxed) {
                return Err(OracleError::Unobserved { cell });
            }
            self.inner.value(cell)
        }
    }

    #[test]
    fn test_retry_after_failed_round_picks_same_batch() {
        for policy in [
            PolicyConfig::Random,
            PolicyConfig::SeuError(ErrorSamplingParams { es_param: 1 }),
        ] {
            let (original, working) = hidden(10, 7);
            let mut retried: AcquisitionLoop<DecisionTreeOracle> = AcquisitionLoop::new(
                working.clone(),
                Box::new(FailOnce {
                    inner: ReferenceOracle::new(original.clone()),
                    failed: AtomicBool::new(false),
                }),
                DecisionTreeOracle::default(),
                policy.build().unwrap(),
                AcquisitionConfig {
                    batch_size: 2,
                    seed: 7,
                },
            )
            .unwrap();
            assert!(retried.perform(1).is_err());
            let after_retry = retried.perform(1).unwrap();

            let mut fresh = build(original, working, policy, 2, 7);
            let uninterrupted = fresh.perform(1).unwrap();
            assert_eq!(after_retry[0].cells, uninterrupted[0].cells);
        }
    }

    #[test]
    fn test_pool_matches_dataset_after_every_round() {
        for policy in all_policies() {
            let (original, working) = hidden(12, 4);
            let mut afa = build(original, working, policy, 2, 3);
            let mut remaining = afa.pool().remaining_count();
            while !afa.status().is_exhausted() {
                afa.perform(1).unwrap();
                assert_eq!(
                    afa.pool().cells().collect::<Vec<_>>(),
                    afa.dataset().missing_cells().collect::<Vec<_>>()
                );
                assert!(afa.pool().remaining_count() <= remaining);
                remaining = afa.pool().remaining_count();
            }
        }
    }

    #[test]
    fn test_round_classifier_is_current() {
        let (original, working) = hidden(10, 6);
        let mut afa = build(original, working, PolicyConfig::Random, 5, 1);
        let rounds = afa.perform(2).unwrap();
        let last: &DecisionTree = &rounds[rounds.len() - 1].classifier;
        for row in afa.dataset().rows() {
            assert_eq!(last.distribution(row), afa.classifier().distribution(row));
        }
    }
}
