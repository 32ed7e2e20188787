//! Sequential expected utility (SEU) scoring.
//!
//! The utility of a candidate cell `(i, j)` is the expected accuracy gain of
//! learning its value:
//!
//! ```text
//! utility(i, j) = Σ_v P(j = v | i) · (accuracy(train(D[i, j := v])) - accuracy(current))
//! ```
//!
//! - `P(j = v | i)` comes from a [`Surrogate`] of attribute `j`, trained each
//!   round on the instances where `j` is present
//! - `D[i, j := v]` is the discretized working dataset with the cell filled
//!   in; the retrained model is measured on that same dataset, then the cell
//!   is reverted
//! - `accuracy(current)` is a model trained on the discretized working
//!   dataset, measured on it, so both terms see the same representation
//!
//! Only values with non-zero probability are tried.
//!
//! # Candidates
//!
//! Scoring every pooled cell costs one retraining per cell and value, so a
//! [`CandidateSampler`] restricts each round to a subset:
//!
//! - [`UniformSampling`] - a uniform sample of `alpha × batch_size` cells
//!   drawn once at construction, shrinking as cells are acquired
//! - [`ErrorSampling`] - every missing cell of up to `es_param` instances,
//!   misclassified ones first, then the least certain correct ones
//!
//! # Discretization
//!
//! Surrogates and counterfactual models need nominal features. The policy
//! holds a [`Discretize`] transform and applies it to the working dataset at
//! the start of every round, so acquired raw values are bucketed exactly like
//! values that were present from the start. Without an explicit transform an
//! [`EqualFrequencyDiscretizer`] is fitted on the starting dataset.
//!
//! # Parallelism
//!
//! Counterfactual evaluations are independent. They fan out over a
//! [`TaskGroup`]; each worker owns a copy of the discretized dataset, fills
//! and reverts cells in it, and returns `(utility, cell)`. The round waits
//! for every worker, then ranks. The working dataset is never touched.

use std::collections::BTreeMap;

use afa_classifier::{Classifier, ClassifierOracle, metrics};
use afa_data::{Cell, Dataset, Discretize, EqualFrequencyDiscretizer};
use afa_stats::summary::ScoreSummary;
use rand_pcg::Pcg64;
use tracing::{debug, trace, warn};

pub use self::{error::ErrorSampling, surrogate::Surrogate, uniform::UniformSampling};
use super::{BatchSelector, Selection, SelectionContext, rank};
use crate::{
    ConfigError, EngineError,
    config::{ErrorSamplingParams, UniformSamplingParams},
    pool::CellPool,
    task_group::TaskGroup,
};

mod error;
mod surrogate;
mod uniform;

/// Chooses the cells an SEU policy scores in a round.
pub trait CandidateSampler: std::fmt::Debug {
    /// Short name used in logs and configuration.
    fn name(&self) -> &'static str;

    /// Prepares the sampler for a run starting from `dataset` and `pool`.
    fn initialize(
        &mut self,
        dataset: &Dataset,
        pool: &CellPool,
        batch_size: usize,
        rng: &mut Pcg64,
    ) -> Result<(), EngineError>;

    /// Candidate cells of this round, all of them in `pool`, instance-major.
    fn candidates<C>(
        &mut self,
        dataset: &Dataset,
        classifier: &C,
        pool: &CellPool,
        rng: &mut Pcg64,
    ) -> Vec<Cell>
    where
        C: Classifier + ?Sized;

    /// Observes cells the loop acquired.
    fn on_acquired(&mut self, _cells: &[Cell]) {}
}

/// SEU policy with candidates chosen by `S`.
#[derive(Debug)]
pub struct SeuPolicy<S> {
    sampler: S,
    discretizer: Option<Box<dyn Discretize>>,
    numeric_attributes: Vec<usize>,
    task_group: TaskGroup,
}

impl SeuPolicy<UniformSampling> {
    /// SEU over a uniform sample of the starting pool.
    #[must_use]
    pub fn uniform(params: UniformSamplingParams) -> Self {
        Self::new(UniformSampling::new(params))
    }
}

impl SeuPolicy<ErrorSampling> {
    /// SEU over the missing cells of misclassified and uncertain instances.
    #[must_use]
    pub fn error(params: ErrorSamplingParams) -> Self {
        Self::new(ErrorSampling::new(params))
    }
}

impl<S> SeuPolicy<S>
where
    S: CandidateSampler,
{
    #[must_use]
    pub fn new(sampler: S) -> Self {
        Self {
            sampler,
            discretizer: None,
            numeric_attributes: vec![],
            task_group: TaskGroup::default(),
        }
    }

    /// Uses `discretizer` instead of fitting one on the starting dataset.
    #[must_use]
    pub fn with_discretizer(mut self, discretizer: Box<dyn Discretize>) -> Self {
        self.discretizer = Some(discretizer);
        self
    }

    #[must_use]
    pub fn with_task_group(mut self, task_group: TaskGroup) -> Self {
        self.task_group = task_group;
        self
    }

    #[must_use]
    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    /// Non-class attributes that were numeric in the starting dataset.
    #[must_use]
    pub fn numeric_attributes(&self) -> &[usize] {
        &self.numeric_attributes
    }

    /// The working dataset with every feature made nominal.
    pub fn discretize(&self, dataset: &Dataset) -> Result<Dataset, EngineError> {
        let discretized = match &self.discretizer {
            Some(discretizer) => discretizer.apply(dataset)?,
            None => dataset.clone(),
        };
        if let Some(attribute) = discretized
            .feature_indices()
            .find(|j| discretized.attribute(*j).is_numeric())
        {
            return Err(ConfigError::NumericAfterDiscretization { attribute }.into());
        }
        Ok(discretized)
    }

    /// Expected utility of every cell in `candidates`, in the same order.
    pub fn utilities<O>(
        &self,
        oracle: &O,
        dataset: &Dataset,
        candidates: &[Cell],
    ) -> Result<Vec<(f64, Cell)>, EngineError>
    where
        O: ClassifierOracle,
    {
        let discretized = self.discretize(dataset)?;
        let base_accuracy = metrics::accuracy(&oracle.train(&discretized)?, &discretized);

        let mut surrogates = BTreeMap::new();
        for cell in candidates {
            if !surrogates.contains_key(&cell.attribute) {
                let surrogate = Surrogate::train(oracle, &discretized, cell.attribute)?;
                surrogates.insert(cell.attribute, surrogate);
            }
        }
        let jobs = candidates
            .iter()
            .filter_map(|cell| surrogates.get(&cell.attribute).map(|s| (*cell, s)))
            .collect::<Vec<_>>();

        self.task_group.map_with(
            &jobs,
            || discretized.clone(),
            |working, _, (cell, surrogate)| -> Result<_, EngineError> {
                let utility = expected_utility(oracle, working, surrogate, *cell, base_accuracy)?;
                trace!(%cell, utility, "counterfactual evaluated");
                Ok((utility, *cell))
            },
        )
    }
}

/// Expected accuracy gain of acquiring `cell` in `working`.
///
/// `working` is modified while evaluating and restored before returning,
/// whether or not evaluation succeeds.
#[expect(clippy::cast_precision_loss)]
pub fn expected_utility<O>(
    oracle: &O,
    working: &mut Dataset,
    surrogate: &Surrogate<O::Model>,
    cell: Cell,
    base_accuracy: f64,
) -> Result<f64, EngineError>
where
    O: ClassifierOracle,
{
    let original = working.value(cell);
    let probs = surrogate.distribution(working.row(cell.instance));
    let mut utility = 0.0;
    for (value, p) in probs.iter().enumerate() {
        if *p <= 0.0 {
            continue;
        }
        working.set_value(cell, value as f64)?;
        let accuracy = oracle
            .train(working)
            .map(|model| metrics::accuracy(&model, working));
        match original {
            Some(v) => working.set_value(cell, v)?,
            None => working.set_missing(cell)?,
        }
        utility += p * (accuracy? - base_accuracy);
    }
    Ok(utility)
}

impl<S> BatchSelector for SeuPolicy<S>
where
    S: CandidateSampler,
{
    fn name(&self) -> &'static str {
        self.sampler.name()
    }

    fn initialize(
        &mut self,
        dataset: &Dataset,
        pool: &CellPool,
        batch_size: usize,
        rng: &mut Pcg64,
    ) -> Result<(), EngineError> {
        self.numeric_attributes = dataset
            .feature_indices()
            .filter(|j| dataset.attribute(*j).is_numeric())
            .collect();
        if !self.numeric_attributes.is_empty() {
            warn!(
                attributes = ?self.numeric_attributes,
                "numeric attributes are discretized before SEU scoring"
            );
        }
        if self.discretizer.is_none() {
            self.discretizer = Some(Box::new(EqualFrequencyDiscretizer::fit(
                dataset,
                EqualFrequencyDiscretizer::DEFAULT_BINS,
            )));
        }
        self.discretize(dataset)?;
        self.sampler.initialize(dataset, pool, batch_size, rng)
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
        let candidates = self
            .sampler
            .candidates(ctx.dataset, ctx.classifier, pool, ctx.rng);
        if candidates.is_empty() {
            return Ok(Selection::top(candidates, batch_size));
        }
        let scored = self.utilities(ctx.classifier_oracle, ctx.dataset, &candidates)?;
        if let Some(summary) = ScoreSummary::new(scored.iter().map(|(u, _)| *u)) {
            debug!(
                policy = self.name(),
                candidates = summary.count,
                min = summary.min,
                mean = summary.mean,
                max = summary.max,
                "expected utilities"
            );
        }
        Ok(Selection::top(rank(scored), batch_size))
    }

    fn on_acquired(&mut self, cells: &[Cell]) {
        self.sampler.on_acquired(cells);
    }
}
