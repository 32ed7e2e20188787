//! Entropy and information gain over weighted counts.
//!
//! All functions work on `f64` weights rather than integer counts because the
//! tree inducer distributes instances with missing values fractionally across
//! branches.
//!
//! # Missing values
//!
//! [`Contingency`] keeps the class counts of rows whose attribute value is
//! missing in a separate column. [`Contingency::information_gain`] merges that
//! column into the observed values proportionally to how often each value was
//! seen, so a mostly-missing attribute is not rewarded for the rows it never
//! observed.

/// Shannon entropy (in bits) of a weighted distribution.
///
/// Zero and negative weights are ignored. Returns `0.0` for an empty or
/// all-zero distribution.
///
/// # Examples
///
/// ```
/// use afa_stats::entropy::entropy;
///
/// assert_eq!(entropy(&[4.0, 0.0]), 0.0);
/// assert!((entropy(&[1.0, 1.0]) - 1.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn entropy(counts: &[f64]) -> f64 {
    let total = counts.iter().filter(|c| **c > 0.0).sum::<f64>();
    if total <= 0.0 {
        return 0.0;
    }
    counts
        .iter()
        .filter(|c| **c > 0.0)
        .map(|c| {
            let p = c / total;
            -p * p.log2()
        })
        .sum()
}

/// Expected entropy after splitting into `branches`, weighted by branch size.
#[must_use]
pub fn conditional_entropy<B>(branches: &[B]) -> f64
where
    B: AsRef<[f64]>,
{
    let weights = branches
        .iter()
        .map(|b| b.as_ref().iter().sum::<f64>())
        .collect::<Vec<_>>();
    let total = weights.iter().sum::<f64>();
    if total <= 0.0 {
        return 0.0;
    }
    branches
        .iter()
        .zip(&weights)
        .map(|(b, w)| w / total * entropy(b.as_ref()))
        .sum()
}

/// Reduction of entropy from `parent` to the weighted `branches`.
#[must_use]
pub fn split_gain<B>(parent: &[f64], branches: &[B]) -> f64
where
    B: AsRef<[f64]>,
{
    entropy(parent) - conditional_entropy(branches)
}

/// Weighted value-by-class contingency table of one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Contingency {
    cells: Vec<Vec<f64>>,
    missing: Vec<f64>,
}

impl Contingency {
    /// Creates an empty table for an attribute with `num_values` values and a
    /// target with `num_classes` classes.
    #[must_use]
    pub fn new(num_values: usize, num_classes: usize) -> Self {
        Self {
            cells: vec![vec![0.0; num_classes]; num_values],
            missing: vec![0.0; num_classes],
        }
    }

    /// Adds `weight` to the cell at (`value`, `class`).
    ///
    /// `None` records a row whose attribute value is missing.
    ///
    /// # Panics
    ///
    /// Panics if `value` or `class` is out of range.
    pub fn add(&mut self, value: Option<usize>, class: usize, weight: f64) {
        match value {
            Some(v) => self.cells[v][class] += weight,
            None => self.missing[class] += weight,
        }
    }

    /// Total weight per attribute value, excluding missing rows.
    #[must_use]
    pub fn value_totals(&self) -> Vec<f64> {
        self.cells.iter().map(|row| row.iter().sum()).collect()
    }

    /// Total weight per class, including missing rows.
    #[must_use]
    pub fn class_totals(&self) -> Vec<f64> {
        let mut totals = self.missing.clone();
        for row in &self.cells {
            for (t, c) in totals.iter_mut().zip(row) {
                *t += c;
            }
        }
        totals
    }

    /// Returns the table with missing rows spread over the observed values
    /// in proportion to each value's total weight.
    ///
    /// If no value was ever observed the table is returned unchanged.
    #[must_use]
    pub fn merge_missing(&self) -> Self {
        let value_totals = self.value_totals();
        let known = value_totals.iter().sum::<f64>();
        if known <= 0.0 {
            return self.clone();
        }
        let cells = self
            .cells
            .iter()
            .zip(&value_totals)
            .map(|(row, vt)| {
                row.iter()
                    .zip(&self.missing)
                    .map(|(c, m)| c + m * vt / known)
                    .collect()
            })
            .collect();
        Self {
            cells,
            missing: vec![0.0; self.missing.len()],
        }
    }

    /// Information gain of the attribute with respect to the class.
    ///
    /// Missing rows are merged first (see [`Contingency::merge_missing`]).
    /// Returns `0.0` when the attribute was never observed.
    #[must_use]
    pub fn information_gain(&self) -> f64 {
        if self.value_totals().iter().sum::<f64>() <= 0.0 {
            return 0.0;
        }
        let merged = self.merge_missing();
        split_gain(&merged.class_totals(), &merged.cells).max(0.0)
    }
}
