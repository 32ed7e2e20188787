use std::{collections::BTreeMap, fmt};

use afa_stats::cut_points::{bucket_of, equal_frequency_cut_points};

use crate::{Attribute, DataError, Dataset};

/// Transform that makes every non-class attribute nominal.
///
/// Implementations are fitted once and applied to the working dataset every
/// round, so values acquired in raw form are bucketed the same way as values
/// that were present from the start.
pub trait Discretize: fmt::Debug + Send + Sync {
    /// Returns a copy of `dataset` with numeric non-class attributes replaced
    /// by nominal bucket attributes. Nominal attributes pass through.
    fn apply(&self, dataset: &Dataset) -> Result<Dataset, DataError>;
}

/// Buckets numeric attributes so that each bucket holds about the same number
/// of observed values.
///
/// Bucket labels follow the interval notation `(-inf-2.5]`, `(2.5-4]`,
/// `(4-inf)`. An attribute with fewer than two distinct observed values gets a
/// single bucket labelled `'All'`.
///
/// # Example
///
/// ```
/// use afa_data::{Attribute, Dataset, Discretize, EqualFrequencyDiscretizer};
///
/// let dataset = Dataset::new(
///     vec![Attribute::numeric("x"), Attribute::nominal("y", ["a", "b"])],
///     vec![
///         vec![Some(1.0), Some(0.0)],
///         vec![Some(2.0), Some(0.0)],
///         vec![Some(3.0), Some(1.0)],
///         vec![None, Some(1.0)],
///     ],
/// )?;
/// let discretizer = EqualFrequencyDiscretizer::fit(&dataset, 2);
/// let nominal = discretizer.apply(&dataset)?;
/// assert_eq!(nominal.attribute(0).num_values(), Some(2));
/// assert_eq!(nominal.row(2)[0], Some(1.0));
/// assert_eq!(nominal.row(3)[0], None);
/// # Ok::<(), afa_data::DataError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EqualFrequencyDiscretizer {
    cut_points: BTreeMap<usize, Vec<f64>>,
}

impl EqualFrequencyDiscretizer {
    /// Bucket count used when the caller has no preference.
    pub const DEFAULT_BINS: usize = 10;

    /// Learns cut points for every numeric non-class attribute of `dataset`
    /// from its observed values.
    #[must_use]
    pub fn fit(dataset: &Dataset, bins: usize) -> Self {
        let cut_points = dataset
            .feature_indices()
            .filter(|j| dataset.attribute(*j).is_numeric())
            .map(|j| {
                let values = dataset.rows().filter_map(|row| row[j]).collect::<Vec<_>>();
                (j, equal_frequency_cut_points(&values, bins))
            })
            .collect();
        Self { cut_points }
    }

    /// Cut points learned for `attribute`, if it was numeric when fitted.
    #[must_use]
    pub fn cut_points(&self, attribute: usize) -> Option<&[f64]> {
        self.cut_points.get(&attribute).map(Vec::as_slice)
    }

    /// Bucket of a raw `value` of `attribute`.
    #[must_use]
    pub fn bucket(&self, attribute: usize, value: f64) -> Option<usize> {
        self.cut_points(attribute).map(|cuts| bucket_of(cuts, value))
    }

    fn bucket_labels(cuts: &[f64]) -> Vec<String> {
        if cuts.is_empty() {
            return vec!["'All'".to_owned()];
        }
        let mut labels = Vec::with_capacity(cuts.len() + 1);
        labels.push(format!("(-inf-{}]", cuts[0]));
        for w in cuts.windows(2) {
            labels.push(format!("({}-{}]", w[0], w[1]));
        }
        labels.push(format!("({}-inf)", cuts[cuts.len() - 1]));
        labels
    }
}

impl Discretize for EqualFrequencyDiscretizer {
    fn apply(&self, dataset: &Dataset) -> Result<Dataset, DataError> {
        let mut attributes = dataset.attributes().to_vec();
        let mut converted = vec![];
        for j in dataset.feature_indices() {
            if !attributes[j].is_numeric() {
                continue;
            }
            let cuts = self
                .cut_points(j)
                .ok_or(DataError::NotFitted { attribute: j })?;
            let name = attributes[j].name().to_owned();
            attributes[j] = Attribute::nominal(name, Self::bucket_labels(cuts));
            converted.push((j, cuts));
        }

        #[expect(clippy::cast_precision_loss)]
        let rows = dataset
            .rows()
            .map(|row| {
                let mut row = row.to_vec();
                for (j, cuts) in &converted {
                    row[*j] = row[*j].map(|v| bucket_of(cuts, v) as f64);
                }
                row
            })
            .collect();

        Dataset::from_parts(attributes, dataset.class_index(), rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cell;

    fn mixed() -> Dataset {
        Dataset::new(
            vec![
                Attribute::numeric("x"),
                Attribute::nominal("colour", ["red", "blue"]),
                Attribute::numeric("constant"),
                Attribute::nominal("y", ["a", "b"]),
            ],
            (0..8)
                .map(|i| {
                    vec![
                        Some(f64::from(i)),
                        Some(f64::from(i % 2)),
                        Some(7.0),
                        Some(f64::from(i / 4)),
                    ]
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_only_numeric_features_are_fitted() {
        let d = EqualFrequencyDiscretizer::fit(&mixed(), 4);
        assert_eq!(d.cut_points(0), Some(&[1.5, 3.5, 5.5][..]));
        assert_eq!(d.cut_points(1), None);
        assert_eq!(d.cut_points(2), Some(&[][..]));
        assert_eq!(d.cut_points(3), None);
    }

    #[test]
    fn test_apply_makes_features_nominal() {
        let data = mixed();
        let d = EqualFrequencyDiscretizer::fit(&data, 4);
        let out = d.apply(&data).unwrap();
        assert!(out.attributes().iter().all(Attribute::is_nominal));
        assert_eq!(out.attribute(0).num_values(), Some(4));
        assert_eq!(out.attribute(2).num_values(), Some(1));
        assert_eq!(out.value(Cell::new(5, 0)), Some(2.0));
        assert_eq!(out.value(Cell::new(5, 1)), Some(1.0));
        assert_eq!(out.value(Cell::new(5, 2)), Some(0.0));
    }

    #[test]
    fn test_values_acquired_later_use_fitted_cuts() {
        let mut data = mixed();
        data.set_missing(Cell::new(0, 0)).unwrap();
        let d = EqualFrequencyDiscretizer::fit(&data, 4);
        data.set_value(Cell::new(0, 0), 100.0).unwrap();
        let out = d.apply(&data).unwrap();
        let last = out.attribute(0).num_values().unwrap() - 1;
        assert_eq!(out.value(Cell::new(0, 0)), Some(last as f64));
    }

    #[test]
    fn test_unfitted_numeric_attribute_is_an_error() {
        let d = EqualFrequencyDiscretizer::default();
        assert!(matches!(
            d.apply(&mixed()),
            Err(DataError::NotFitted { attribute: 0 })
        ));
    }

    #[test]
    fn test_labels() {
        assert_eq!(
            EqualFrequencyDiscretizer::bucket_labels(&[1.5, 3.0]),
            ["(-inf-1.5]", "(1.5-3]", "(3-inf)"]
        );
    }
}
