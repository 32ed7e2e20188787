//! Summaries of score sets.

/// Minimum, maximum and mean of a set of scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSummary {
    /// Number of scores summarized.
    pub count: usize,
    /// The smallest score.
    pub min: f64,
    /// The largest score.
    pub max: f64,
    /// The arithmetic mean.
    pub mean: f64,
}

impl ScoreSummary {
    /// Summarizes `scores`.
    ///
    /// # Returns
    ///
    /// * `Some(ScoreSummary)` - if at least one score is given
    /// * `None` - if `scores` is empty
    ///
    /// # Examples
    ///
    /// ```
    /// # use afa_stats::summary::ScoreSummary;
    /// let summary = ScoreSummary::new([0.5, -1.0, 2.5]).unwrap();
    /// assert_eq!(summary.count, 3);
    /// assert_eq!(summary.min, -1.0);
    /// assert_eq!(summary.max, 2.5);
    /// assert_eq!(summary.mean, 2.0 / 3.0);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new<I>(scores: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for score in scores {
            count += 1;
            min = min.min(score);
            max = max.max(score);
            sum += score;
        }
        (count > 0).then(|| Self {
            count,
            min,
            max,
            mean: sum / count as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(ScoreSummary::new([]), None);
    }

    #[test]
    fn test_single() {
        let s = ScoreSummary::new([0.25]).unwrap();
        assert_eq!(s.min, 0.25);
        assert_eq!(s.max, 0.25);
        assert_eq!(s.mean, 0.25);
    }
}
