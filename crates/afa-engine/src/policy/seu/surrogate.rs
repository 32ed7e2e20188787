use std::collections::BTreeSet;

use afa_classifier::{Classifier, ClassifierOracle};
use afa_data::Dataset;

use crate::{ConfigError, EngineError};

/// Predicts the value of one feature attribute from the others.
#[derive(Debug, Clone)]
pub enum Surrogate<M> {
    /// Model trained on the instances where the attribute is present.
    Model(M),
    /// Every observed instance has this value.
    Constant { value: usize, num_values: usize },
    /// The attribute is never observed; all values are equally likely.
    Uniform { num_values: usize },
}

impl<M> Surrogate<M>
where
    M: Classifier,
{
    /// Trains the surrogate of `attribute` on a nominal `dataset`.
    ///
    /// Instances where `attribute` is missing are left out. When all
    /// remaining instances share one value the surrogate is
    /// [`Surrogate::Constant`], without training.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn train<O>(oracle: &O, dataset: &Dataset, attribute: usize) -> Result<Self, EngineError>
    where
        O: ClassifierOracle<Model = M>,
    {
        let num_values = dataset
            .attribute(attribute)
            .num_values()
            .ok_or(ConfigError::NumericAfterDiscretization { attribute })?;
        let observed = (0..dataset.num_instances())
            .filter(|i| dataset.row(*i)[attribute].is_some())
            .collect::<Vec<_>>();
        let values = observed
            .iter()
            .filter_map(|i| dataset.row(*i)[attribute])
            .map(|v| v as usize)
            .collect::<BTreeSet<_>>();

        let mut values = values.into_iter();
        Ok(match (values.next(), values.next()) {
            (None, _) => Self::Uniform { num_values },
            (Some(value), None) => Self::Constant { value, num_values },
            (Some(_), Some(_)) => {
                let training = dataset.select_rows(observed).with_class_index(attribute)?;
                Self::Model(oracle.train(&training)?)
            }
        })
    }

    /// Distribution over the attribute's values for `row`.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn distribution(&self, row: &[Option<f64>]) -> Vec<f64> {
        match self {
            Self::Model(model) => model.distribution(row),
            Self::Constant { value, num_values } => {
                let mut probs = vec![0.0; *num_values];
                probs[*value] = 1.0;
                probs
            }
            Self::Uniform { num_values } => vec![1.0 / *num_values as f64; *num_values],
        }
    }

    #[must_use]
    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Constant { .. })
    }
}
