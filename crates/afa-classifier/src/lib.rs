//! Classifier contracts used by the acquisition engine.
//!
//! The engine never looks inside a classifier. It needs exactly two
//! capabilities, expressed as traits:
//!
//! - [`ClassifierOracle`] - induces a model from a [`Dataset`] (which may
//!   contain missing cells), targeting [`Dataset::class_index`]
//! - [`Classifier`] - a trained model that returns a class-probability
//!   distribution for a row and classifies it
//!
//! Induction must be deterministic for a fixed input: counterfactual
//! evaluation compares models trained on datasets that differ in one cell,
//! and reproducible runs depend on identical inputs yielding identical models.
//!
//! # Supporting Modules
//!
//! - [`distribution`] - argmax and best/second-best margins of a distribution
//! - [`metrics`] - accuracy and mean per-class accuracy on a dataset
//! - [`attribute_eval`] - supervised information gain of an attribute
//! - [`tree`] - [`DecisionTreeOracle`](tree::DecisionTreeOracle), a reference
//!   oracle inducing information-gain decision trees with Laplace leaves
//!
//! # Example
//!
//! ```
//! use afa_classifier::{Classifier, ClassifierOracle, metrics, tree::DecisionTreeOracle};
//! use afa_data::{Attribute, Dataset};
//!
//! let dataset = Dataset::new(
//!     vec![Attribute::nominal("windy", ["no", "yes"]), Attribute::nominal("play", ["no", "yes"])],
//!     vec![
//!         vec![Some(0.0), Some(1.0)],
//!         vec![Some(0.0), Some(1.0)],
//!         vec![Some(1.0), Some(0.0)],
//!         vec![Some(1.0), Some(0.0)],
//!     ],
//! )?;
//! let model = DecisionTreeOracle::default().train(&dataset)?;
//! assert_eq!(model.classify(&[Some(1.0), None]), 0);
//! assert_eq!(metrics::accuracy(&model, &dataset), 1.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;

use afa_data::Dataset;

pub mod attribute_eval;
pub mod distribution;
pub mod metrics;
pub mod tree;

/// Errors raised while inducing a classifier.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum InductionError {
    #[display("target attribute {attribute} is not nominal")]
    NonNominalTarget { attribute: usize },
    #[display("no labelled instances to learn from")]
    NoLabelledInstances,
    #[display("induction failed: {message}")]
    Failed { message: String },
}

/// A trained model over the rows of the dataset it was induced from.
pub trait Classifier: fmt::Debug + Send + Sync {
    /// Number of classes in the distributions returned by this model.
    fn num_classes(&self) -> usize;

    /// Class-probability distribution for `row`.
    ///
    /// The value at the target position of `row` is ignored. The returned
    /// vector has [`Classifier::num_classes`] entries summing to 1.
    fn distribution(&self, row: &[Option<f64>]) -> Vec<f64>;

    /// Most probable class for `row`; ties go to the lowest class index.
    fn classify(&self, row: &[Option<f64>]) -> usize {
        distribution::argmax(&self.distribution(row)).unwrap_or(0)
    }
}

/// Induces classifiers from datasets.
pub trait ClassifierOracle: fmt::Debug + Send + Sync {
    /// Model produced by this oracle.
    type Model: Classifier + Clone + 'static;

    /// Trains a model that predicts `dataset.class_index()` from the other
    /// attributes.
    fn train(&self, dataset: &Dataset) -> Result<Self::Model, InductionError>;
}
