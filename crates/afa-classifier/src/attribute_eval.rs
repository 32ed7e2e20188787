//! Supervised evaluation of single attributes.

use afa_data::{AttributeKind, Dataset, EqualFrequencyDiscretizer};
use afa_stats::{
    cut_points::{bucket_of, equal_frequency_cut_points},
    entropy::Contingency,
};

/// Information gain of `attribute` with respect to the class of `dataset`.
///
/// Only rows with a class label take part. Rows where the attribute is
/// missing are spread over the observed values in proportion to their
/// frequency, so the score reflects what is actually known. Numeric
/// attributes are bucketed by equal-frequency cut points first
/// ([`EqualFrequencyDiscretizer::DEFAULT_BINS`] buckets).
///
/// Returns `0.0` for the class attribute itself and for attributes with no
/// observed value.
///
/// # Panics
///
/// Panics if `attribute` is out of range.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn information_gain(dataset: &Dataset, attribute: usize) -> f64 {
    let num_classes = dataset.num_classes();
    if attribute == dataset.class_index() || num_classes == 0 {
        return 0.0;
    }

    let bucket: Box<dyn Fn(f64) -> usize> = match dataset.attribute(attribute).kind() {
        AttributeKind::Nominal { .. } => Box::new(|v| v as usize),
        AttributeKind::Numeric => {
            let values = dataset
                .rows()
                .filter_map(|row| row[attribute])
                .collect::<Vec<_>>();
            let cuts =
                equal_frequency_cut_points(&values, EqualFrequencyDiscretizer::DEFAULT_BINS);
            Box::new(move |v| bucket_of(&cuts, v))
        }
    };
    let num_values = dataset
        .attribute(attribute)
        .num_values()
        .unwrap_or(EqualFrequencyDiscretizer::DEFAULT_BINS);

    let mut table = Contingency::new(num_values, num_classes);
    for (i, row) in dataset.rows().enumerate() {
        if let Some(class) = dataset.class_value(i) {
            table.add(row[attribute].map(&bucket), class, 1.0);
        }
    }
    table.information_gain()
}
