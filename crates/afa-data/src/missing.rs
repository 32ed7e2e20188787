//! Hiding values of a complete dataset.
//!
//! Acquisition experiments start from a fully observed dataset, hide part of
//! it, and let a policy buy the hidden values back through a
//! [`ReferenceOracle`](crate::ReferenceOracle) built from the original. The
//! class attribute is never hidden. Large datasets can first be shrunk with
//! [`subsample_per_class`].

use rand::{Rng, seq::SliceRandom};

use crate::{Cell, DataError, Dataset};

fn check_fraction(fraction: f64) -> Result<(), DataError> {
    if fraction > 0.0 && fraction < 1.0 {
        Ok(())
    } else {
        Err(DataError::InvalidFraction { fraction })
    }
}

#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn portion(len: usize, fraction: f64) -> usize {
    (len as f64 * fraction).floor() as usize
}

/// Returns a copy of `original` with `floor(fraction × n × m)` non-class
/// cells hidden, chosen uniformly over the whole table.
///
/// `fraction` must lie strictly between 0 and 1.
///
/// # Example
///
/// ```
/// use afa_data::{Attribute, Dataset, missing};
/// use rand::SeedableRng as _;
///
/// let complete = Dataset::new(
///     vec![Attribute::numeric("a"), Attribute::numeric("b"), Attribute::nominal("y", ["n", "p"])],
///     (0..10).map(|i| vec![Some(f64::from(i)), Some(1.0), Some(0.0)]).collect(),
/// )?;
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let hidden = missing::hide_uniformly(&complete, 0.25, &mut rng)?;
/// assert_eq!(hidden.missing_cells().count(), 5);
/// # Ok::<(), afa_data::DataError>(())
/// ```
pub fn hide_uniformly<R>(
    original: &Dataset,
    fraction: f64,
    rng: &mut R,
) -> Result<Dataset, DataError>
where
    R: Rng + ?Sized,
{
    check_fraction(fraction)?;
    let mut cells = (0..original.num_instances())
        .flat_map(move |i| original.feature_indices().map(move |j| Cell::new(i, j)))
        .collect::<Vec<_>>();
    let count = portion(cells.len(), fraction);
    cells.shuffle(rng);

    let mut hidden = original.clone();
    for cell in &cells[..count] {
        hidden.set_missing(*cell)?;
    }
    Ok(hidden)
}

/// Returns a copy of `original` with `floor(fraction × m)` non-class cells
/// hidden in every instance.
///
/// `fraction` must lie strictly between 0 and 1.
pub fn hide_per_instance<R>(
    original: &Dataset,
    fraction: f64,
    rng: &mut R,
) -> Result<Dataset, DataError>
where
    R: Rng + ?Sized,
{
    check_fraction(fraction)?;
    let mut features = original.feature_indices().collect::<Vec<_>>();
    let count = portion(features.len(), fraction);

    let mut hidden = original.clone();
    for i in 0..original.num_instances() {
        features.shuffle(rng);
        for j in &features[..count] {
            hidden.set_missing(Cell::new(i, *j))?;
        }
    }
    Ok(hidden)
}

/// Returns a dataset keeping `floor(fraction × count)` randomly chosen
/// instances of every class, grouped by class in class order.
///
/// Instances without a class label are dropped. `fraction` must lie strictly
/// between 0 and 1.
pub fn subsample_per_class<R>(
    original: &Dataset,
    fraction: f64,
    rng: &mut R,
) -> Result<Dataset, DataError>
where
    R: Rng + ?Sized,
{
    check_fraction(fraction)?;
    let mut by_class = vec![vec![]; original.num_classes()];
    for i in 0..original.num_instances() {
        if let Some(class) = original.class_value(i) {
            by_class[class].push(i);
        }
    }
    let mut kept = vec![];
    for instances in &mut by_class {
        instances.shuffle(rng);
        let count = portion(instances.len(), fraction);
        kept.extend_from_slice(&instances[..count]);
    }
    Ok(original.select_rows(kept))
}
