//! Evaluation of a model on a labelled dataset.
//!
//! Rows without a class label are skipped by every metric here.

use afa_data::Dataset;

use crate::Classifier;

fn labelled(dataset: &Dataset) -> impl Iterator<Item = (&[Option<f64>], usize)> + '_ {
    dataset
        .rows()
        .enumerate()
        .filter_map(|(i, row)| dataset.class_value(i).map(|c| (row, c)))
}

/// Fraction of labelled rows the model classifies correctly.
///
/// Returns `0.0` when no row is labelled.
#[expect(clippy::cast_precision_loss)]
pub fn accuracy<C>(model: &C, dataset: &Dataset) -> f64
where
    C: Classifier + ?Sized,
{
    let (mut total, mut correct) = (0_usize, 0_usize);
    for (row, class) in labelled(dataset) {
        total += 1;
        if model.classify(row) == class {
            correct += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64
}

/// Average over classes of the one-vs-rest accuracy.
///
/// For class `c` a row counts as correct when it is a true positive or a
/// true negative with respect to `c`.
#[expect(clippy::cast_precision_loss)]
pub fn mean_class_accuracy<C>(model: &C, dataset: &Dataset) -> f64
where
    C: Classifier + ?Sized,
{
    let num_classes = dataset.num_classes();
    let predictions = labelled(dataset)
        .map(|(row, class)| (class, model.classify(row)))
        .collect::<Vec<_>>();
    if num_classes == 0 || predictions.is_empty() {
        return 0.0;
    }
    let per_class = (0..num_classes).map(|c| {
        let agree = predictions
            .iter()
            .filter(|(actual, predicted)| (*actual == c) == (*predicted == c))
            .count();
        agree as f64 / predictions.len() as f64
    });
    per_class.sum::<f64>() / num_classes as f64
}
