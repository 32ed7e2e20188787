//! Upper-confidence-bound scoring of pool cells.
//!
//! A cell `(i, j)` scores
//!
//! ```text
//! alpha · instance_reward(i) + beta · attribute_reward(j)
//!     + sqrt(2 · ln(total) / (count(i) + count(j)))
//! ```
//!
//! - `instance_reward(i) = (1 + best_other(i) - p_true(i)) / 2`, from the
//!   current classifier's distribution for instance `i`. `best_other` is the
//!   highest probability of any class other than the true one, which is the
//!   runner-up when `i` is classified correctly and the winning wrong class
//!   otherwise. The reward is high when the classifier is unsure or wrong.
//! - `attribute_reward(j)` is the information gain of attribute `j` with
//!   respect to the class over the current dataset.
//! - `count(i)`, `count(j)` and `total` are [`QueryCounters`]: values known
//!   per instance, per attribute and overall, including values present from
//!   the start.
//!
//! The whole pool is scored every round; rewards are never carried over.

use afa_classifier::{Classifier, ClassifierOracle, attribute_eval, distribution};
use afa_data::{Cell, Dataset};
use rand_pcg::Pcg64;
use tracing::debug;

use super::{BatchSelector, Selection, SelectionContext, rank};
use crate::{EngineError, config::BanditParams, pool::CellPool};

/// Counts of known feature values per instance, per attribute and overall.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryCounters {
    instances: Vec<usize>,
    attributes: Vec<usize>,
    total: usize,
}

impl QueryCounters {
    /// Counts every present non-class value of `dataset`.
    #[must_use]
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut counters = Self {
            instances: vec![0; dataset.num_instances()],
            attributes: vec![0; dataset.num_attributes()],
            total: 0,
        };
        for (i, row) in dataset.rows().enumerate() {
            for j in dataset.feature_indices() {
                if row[j].is_some() {
                    counters.record(Cell::new(i, j));
                }
            }
        }
        counters
    }

    /// Counts one more known value at `cell`.
    pub fn record(&mut self, cell: Cell) {
        self.instances[cell.instance] += 1;
        self.attributes[cell.attribute] += 1;
        self.total += 1;
    }

    #[must_use]
    pub fn instance(&self, instance: usize) -> usize {
        self.instances[instance]
    }

    #[must_use]
    pub fn attribute(&self, attribute: usize) -> usize {
        self.attributes[attribute]
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Exploration bonus `sqrt(2 · ln(total) / (count(i) + count(j)))`.
    ///
    /// The divisor is at least 1 and `ln` is taken of at least 1, so the
    /// bonus is always finite and non-negative.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn exploration(&self, cell: Cell) -> f64 {
        let divisor = (self.instance(cell.instance) + self.attribute(cell.attribute)).max(1);
        let log_total = (self.total.max(1) as f64).ln();
        (2.0 * log_total / divisor as f64).sqrt()
    }
}

/// Bandit policy over the whole pool.
#[derive(Debug, Clone)]
pub struct BanditPolicy {
    params: BanditParams,
    counters: QueryCounters,
}

impl BanditPolicy {
    #[must_use]
    pub fn new(params: BanditParams) -> Self {
        Self {
            params,
            counters: QueryCounters::default(),
        }
    }

    #[must_use]
    pub fn params(&self) -> &BanditParams {
        &self.params
    }

    #[must_use]
    pub fn counters(&self) -> &QueryCounters {
        &self.counters
    }

    /// Scores every pooled cell.
    pub fn score<C>(&self, dataset: &Dataset, classifier: &C, pool: &CellPool) -> Vec<(f64, Cell)>
    where
        C: Classifier + ?Sized,
    {
        let attribute_rewards = (0..dataset.num_attributes())
            .map(|j| attribute_eval::information_gain(dataset, j))
            .collect::<Vec<_>>();

        pool.instances()
            .flat_map(|i| {
                let reward = instance_reward(dataset, classifier, i);
                pool.attributes_of(i).map(move |j| (reward, Cell::new(i, j)))
            })
            .map(|(instance_reward, cell)| {
                let score = self.params.alpha * instance_reward
                    + self.params.beta * attribute_rewards[cell.attribute]
                    + self.counters.exploration(cell);
                (score, cell)
            })
            .collect()
    }
}

/// Reward of querying a value of `instance`; in `[0, 1]`.
#[must_use]
pub fn instance_reward<C>(dataset: &Dataset, classifier: &C, instance: usize) -> f64
where
    C: Classifier + ?Sized,
{
    let Some(class) = dataset.class_value(instance) else {
        return 0.0;
    };
    let probs = classifier.distribution(dataset.row(instance));
    let truth = probs.get(class).copied().unwrap_or(0.0);
    (1.0 + distribution::best_other(&probs, class) - truth) / 2.0
}

impl BatchSelector for BanditPolicy {
    fn name(&self) -> &'static str {
        "bandit"
    }

    fn initialize(
        &mut self,
        dataset: &Dataset,
        _pool: &CellPool,
        _batch_size: usize,
        _rng: &mut Pcg64,
    ) -> Result<(), EngineError> {
        self.params.validate()?;
        self.counters = QueryCounters::from_dataset(dataset);
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
        let scored = self.score(ctx.dataset, ctx.classifier, pool);
        if let Some((best, cell)) = scored
            .iter()
            .copied()
            .max_by(|a, b| a.0.total_cmp(&b.0))
        {
            debug!(candidates = scored.len(), best, %cell, "bandit scores");
        }
        Ok(Selection::top(rank(scored), batch_size))
    }

    fn on_acquired(&mut self, cells: &[Cell]) {
        for cell in cells {
            self.counters.record(*cell);
        }
    }
}

#[cfg(test)]
mod tests {
    use afa_data::Attribute;
    use rand::SeedableRng as _;

    use super::*;

    /// Always predicts the same distribution.
    #[derive(Debug)]
    struct Fixed(Vec<f64>);

    impl Classifier for Fixed {
        fn num_classes(&self) -> usize {
            self.0.len()
        }

        fn distribution(&self, _row: &[Option<f64>]) -> Vec<f64> {
            self.0.clone()
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(
            vec![
                Attribute::nominal("a", ["0", "1"]),
                Attribute::nominal("b", ["0", "1"]),
                Attribute::nominal("class", ["n", "y"]),
            ],
            vec![
                vec![None, None, Some(0.0)],
                vec![Some(1.0), Some(0.0), Some(1.0)],
                vec![Some(0.0), Some(1.0), Some(0.0)],
                vec![Some(1.0), Some(1.0), Some(1.0)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_counters_include_initial_values() {
        let counters = QueryCounters::from_dataset(&dataset());
        assert_eq!(counters.total(), 6);
        assert_eq!(counters.instance(0), 0);
        assert_eq!(counters.instance(1), 2);
        assert_eq!(counters.attribute(0), 3);
        assert_eq!(counters.attribute(2), 0);
    }

    #[test]
    fn test_exploration_decreases_with_count() {
        let mut counters = QueryCounters::from_dataset(&dataset());
        let cell = Cell::new(0, 0);
        let mut previous = counters.exploration(cell);
        for _ in 0..5 {
            counters.instances[0] += 1;
            let next = counters.exploration(cell);
            assert!(next < previous);
            previous = next;
        }
    }

    #[test]
    fn test_exploration_divisor_never_zero() {
        let d = Dataset::new(
            vec![Attribute::numeric("x"), Attribute::nominal("y", ["a"])],
            vec![vec![None, Some(0.0)]],
        )
        .unwrap();
        let counters = QueryCounters::from_dataset(&d);
        assert_eq!(counters.exploration(Cell::new(0, 0)), 0.0);
    }

    #[test]
    fn test_instance_reward() {
        let d = dataset();
        // instance 0 is class 0: correct with margin 0.6
        assert!((instance_reward(&d, &Fixed(vec![0.8, 0.2]), 0) - 0.2).abs() < 1e-12);
        // instance 1 is class 1: misclassified
        assert!((instance_reward(&d, &Fixed(vec![0.8, 0.2]), 1) - 0.8).abs() < 1e-12);
        // fully uncertain
        assert!((instance_reward(&d, &Fixed(vec![0.5, 0.5]), 0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_instance_weight_only_ties_attributes() {
        let d = dataset();
        let mut policy = BanditPolicy::new(BanditParams {
            alpha: 1.0,
            beta: 0.0,
        });
        let pool = CellPool::from_dataset(&d);
        policy
            .initialize(&d, &pool, 1, &mut Pcg64::seed_from_u64(0))
            .unwrap();
        // both attributes have been observed three times
        let scores = policy.score(&d, &Fixed(vec![0.6, 0.4]), &pool);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].0, scores[1].0);
        assert_eq!(rank(scores), [Cell::new(0, 0), Cell::new(0, 1)]);
    }

    #[test]
    fn test_on_acquired_updates_counters() {
        let d = dataset();
        let mut policy = BanditPolicy::new(BanditParams::default());
        policy
            .initialize(&d, &CellPool::from_dataset(&d), 1, &mut Pcg64::seed_from_u64(0))
            .unwrap();
        policy.on_acquired(&[Cell::new(0, 1)]);
        assert_eq!(policy.counters().total(), 7);
        assert_eq!(policy.counters().instance(0), 1);
        assert_eq!(policy.counters().attribute(1), 4);
    }
}
