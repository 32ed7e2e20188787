//! Equal-frequency cut points for bucketing numeric values.
//!
//! Cut points are placed so that each bucket receives roughly the same number
//! of samples. Runs of identical values are never split: a boundary that would
//! fall inside a run is moved to the end of the run, and boundaries that
//! collapse onto each other are dropped. This keeps heavily repeated values
//! in a single bucket.
//!
//! Buckets are right-closed: bucket `k` holds values in
//! `(cuts[k - 1], cuts[k]]`, with open ends at both infinities.

/// Computes up to `bins - 1` strictly increasing cut points for `values`.
///
/// Non-finite values are ignored. Returns an empty vector when fewer than two
/// distinct values are present or `bins < 2`.
///
/// # Examples
///
/// ```
/// use afa_stats::cut_points::equal_frequency_cut_points;
///
/// let values = [1.0, 1.0, 1.0, 1.0, 2.0, 3.0];
/// // the first boundary would split the run of ones, so it moves past it
/// assert_eq!(equal_frequency_cut_points(&values, 2), vec![1.5]);
/// ```
#[must_use]
pub fn equal_frequency_cut_points(values: &[f64], bins: usize) -> Vec<f64> {
    let mut sorted = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect::<Vec<_>>();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let mut cuts: Vec<f64> = vec![];
    if n < 2 || bins < 2 {
        return cuts;
    }

    for k in 1..bins {
        let target = k * n / bins;
        if target == 0 {
            continue;
        }
        let lower = sorted[target - 1];
        // first value strictly above the run containing `lower`
        let upper_index = target + sorted[target..].partition_point(|v| *v <= lower);
        let Some(&upper) = sorted.get(upper_index) else {
            break;
        };
        let cut = lower + (upper - lower) / 2.0;
        if cuts.last().is_none_or(|last| *last < cut) {
            cuts.push(cut);
        }
    }
    cuts
}

/// Returns the bucket index of `value` for the given cut points.
///
/// The result is in `0..=cuts.len()`.
#[must_use]
pub fn bucket_of(cuts: &[f64], value: f64) -> usize {
    cuts.partition_point(|c| *c < value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        assert!(equal_frequency_cut_points(&[], 4).is_empty());
    }

    #[test]
    fn test_single_distinct_value() {
        assert!(equal_frequency_cut_points(&[3.0; 10], 4).is_empty());
    }

    #[test]
    fn test_single_bin() {
        assert!(equal_frequency_cut_points(&[1.0, 2.0, 3.0], 1).is_empty());
    }

    #[test]
    fn test_uniform_values_quartiles() {
        let values = (1..=8).map(f64::from).collect::<Vec<_>>();
        let cuts = equal_frequency_cut_points(&values, 4);
        assert_eq!(cuts, vec![2.5, 4.5, 6.5]);
    }

    #[test]
    fn test_cuts_are_strictly_increasing() {
        let mut values = vec![0.0; 50];
        values.extend([1.0; 20]);
        values.extend([2.0, 3.0, 4.0, 5.0, 6.0]);
        let cuts = equal_frequency_cut_points(&values, 10);
        assert!(cuts.windows(2).all(|w| w[0] < w[1]));
        // zeros are never split across buckets
        assert!(cuts.iter().all(|c| *c > 0.0));
    }

    #[test]
    fn test_ignores_non_finite() {
        let values = [1.0, f64::NAN, 2.0, f64::INFINITY];
        assert_eq!(equal_frequency_cut_points(&values, 2), vec![1.5]);
    }

    #[test]
    fn test_bucket_of_is_right_closed() {
        let cuts = [1.0, 2.0];
        assert_eq!(bucket_of(&cuts, 0.5), 0);
        assert_eq!(bucket_of(&cuts, 1.0), 0);
        assert_eq!(bucket_of(&cuts, 1.5), 1);
        assert_eq!(bucket_of(&cuts, 2.0), 1);
        assert_eq!(bucket_of(&cuts, 9.0), 2);
    }
}
