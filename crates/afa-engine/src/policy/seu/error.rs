use afa_classifier::{Classifier, distribution::Margin};
use afa_data::{Cell, Dataset};
use rand::seq::SliceRandom as _;
use rand_pcg::Pcg64;
use tracing::debug;

use super::CandidateSampler;
use crate::{EngineError, config::ErrorSamplingParams, pool::CellPool};

/// Candidates from the instances the classifier gets wrong or is unsure of.
///
/// Each round, among instances that still have pooled cells:
///
/// 1. misclassified instances are shuffled and up to `es_param` are taken
/// 2. if fewer than `es_param` were found, correctly classified instances
///    fill the rest, smallest `best - second` probability margin first
///    (lower instance index among equal margins)
///
/// Every pooled cell of the chosen instances is a candidate.
#[derive(Debug, Clone, Default)]
pub struct ErrorSampling {
    params: ErrorSamplingParams,
}

impl ErrorSampling {
    #[must_use]
    pub fn new(params: ErrorSamplingParams) -> Self {
        Self { params }
    }

    #[must_use]
    pub fn params(&self) -> &ErrorSamplingParams {
        &self.params
    }

    /// Instances whose cells are scored this round, in ascending order.
    pub fn choose_instances<C>(
        &self,
        dataset: &Dataset,
        classifier: &C,
        pool: &CellPool,
        rng: &mut Pcg64,
    ) -> Vec<usize>
    where
        C: Classifier + ?Sized,
    {
        let limit = self.params.es_param;
        let mut misclassified = vec![];
        let mut uncertain = vec![];
        for i in pool.instances() {
            let Some(class) = dataset.class_value(i) else {
                continue;
            };
            let Some(margin) = Margin::of(&classifier.distribution(dataset.row(i))) else {
                continue;
            };
            if margin.predicted == class {
                uncertain.push((margin.uncertainty(), i));
            } else {
                misclassified.push(i);
            }
        }

        let num_misclassified = misclassified.len();
        misclassified.shuffle(rng);
        misclassified.truncate(limit);
        if misclassified.len() < limit {
            uncertain.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            let rest = limit - misclassified.len();
            misclassified.extend(uncertain.iter().take(rest).map(|(_, i)| *i));
        }
        debug!(
            misclassified = num_misclassified,
            chosen = misclassified.len(),
            "error sampling"
        );
        misclassified.sort_unstable();
        misclassified
    }
}

impl CandidateSampler for ErrorSampling {
    fn name(&self) -> &'static str {
        "seu-error"
    }

    fn initialize(
        &mut self,
        dataset: &Dataset,
        _pool: &CellPool,
        _batch_size: usize,
        _rng: &mut Pcg64,
    ) -> Result<(), EngineError> {
        self.params.validate(dataset.num_instances())?;
        Ok(())
    }

    fn candidates<C>(
        &mut self,
        dataset: &Dataset,
        classifier: &C,
        pool: &CellPool,
        rng: &mut Pcg64,
    ) -> Vec<Cell>
    where
        C: Classifier + ?Sized,
    {
        self.choose_instances(dataset, classifier, pool, rng)
            .into_iter()
            .flat_map(|i| pool.attributes_of(i).map(move |j| Cell::new(i, j)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use afa_data::Attribute;
    use rand::SeedableRng as _;

    use super::*;

    /// Believes in class 1 with the confidence stored in the first attribute.
    #[derive(Debug)]
    struct Confidence;

    impl Classifier for Confidence {
        fn num_classes(&self) -> usize {
            2
        }

        fn distribution(&self, row: &[Option<f64>]) -> Vec<f64> {
            let p = row[0].unwrap_or(0.5);
            vec![1.0 - p, p]
        }
    }

    fn dataset() -> Dataset {
        // (confidence of class 1, missing, class)
        let rows = [
            (0.9, 1.0), // correct, margin 0.8
            (0.9, 0.0), // wrong
            (0.6, 1.0), // correct, margin 0.2
            (0.2, 1.0), // wrong
            (0.7, 1.0), // correct, margin 0.4
            (0.6, 1.0), // correct, margin 0.2
        ];
        Dataset::new(
            vec![
                Attribute::numeric("confidence"),
                Attribute::nominal("extra", ["a", "b"]),
                Attribute::nominal("class", ["n", "y"]),
            ],
            rows.iter()
                .map(|(p, c)| vec![Some(*p), None, Some(*c)])
                .collect(),
        )
        .unwrap()
    }

    fn sampler(es_param: usize) -> ErrorSampling {
        ErrorSampling::new(ErrorSamplingParams { es_param })
    }

    #[test]
    fn test_misclassified_then_least_certain() {
        let d = dataset();
        let pool = CellPool::from_dataset(&d);
        let mut rng = Pcg64::seed_from_u64(0);
        let chosen = sampler(4).choose_instances(&d, &Confidence, &pool, &mut rng);
        // both wrong instances, then the two with margin 0.2
        assert_eq!(chosen, [1, 2, 3, 5]);
    }

    #[test]
    fn test_misclassified_are_capped() {
        let d = dataset();
        let pool = CellPool::from_dataset(&d);
        let mut rng = Pcg64::seed_from_u64(0);
        let chosen = sampler(1).choose_instances(&d, &Confidence, &pool, &mut rng);
        assert_eq!(chosen.len(), 1);
        assert!(chosen[0] == 1 || chosen[0] == 3);
    }

    #[test]
    fn test_fixed_seed_reproduces_candidates() {
        let d = dataset();
        let pool = CellPool::from_dataset(&d);
        let run = |seed| {
            sampler(1).candidates(&d, &Confidence, &pool, &mut Pcg64::seed_from_u64(seed))
        };
        assert_eq!(run(5), run(5));
        assert_eq!(run(5).len(), 1);
    }

    #[test]
    fn test_only_pooled_instances() {
        let d = dataset();
        let mut pool = CellPool::from_dataset(&d);
        pool.remove_cell(Cell::new(1, 1));
        pool.prune_completed_instances();
        let candidates =
            sampler(6).candidates(&d, &Confidence, &pool, &mut Pcg64::seed_from_u64(0));
        assert_eq!(candidates.len(), 5);
        assert!(!candidates.iter().any(|c| c.instance == 1));
    }

    #[test]
    fn test_es_param_checked_against_instances() {
        let d = dataset();
        let pool = CellPool::from_dataset(&d);
        let mut rng = Pcg64::seed_from_u64(0);
        assert!(sampler(7).initialize(&d, &pool, 1, &mut rng).is_err());
        assert!(sampler(6).initialize(&d, &pool, 1, &mut rng).is_ok());
    }
}
