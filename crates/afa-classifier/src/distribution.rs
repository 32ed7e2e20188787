//! Helpers over class-probability distributions.

/// Index of the largest probability; the first one wins ties.
///
/// Returns `None` for an empty distribution.
#[must_use]
pub fn argmax(probs: &[f64]) -> Option<usize> {
    probs
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, p)| match best {
            Some((_, b)) if *p <= b => best,
            _ => Some((i, *p)),
        })
        .map(|(i, _)| i)
}

/// Largest probability among classes other than `class`, `0.0` if there is
/// no other class.
#[must_use]
pub fn best_other(probs: &[f64], class: usize) -> f64 {
    probs
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != class)
        .map(|(_, p)| *p)
        .fold(0.0, f64::max)
}

/// The predicted class of a distribution together with the two highest
/// probabilities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margin {
    pub predicted: usize,
    pub best: f64,
    pub second: f64,
}

impl Margin {
    /// # Examples
    ///
    /// ```
    /// use afa_classifier::distribution::Margin;
    ///
    /// let m = Margin::of(&[0.2, 0.5, 0.3]).unwrap();
    /// assert_eq!(m.predicted, 1);
    /// assert_eq!(m.second, 0.3);
    /// ```
    #[must_use]
    pub fn of(probs: &[f64]) -> Option<Self> {
        let predicted = argmax(probs)?;
        Some(Self {
            predicted,
            best: probs[predicted],
            second: best_other(probs, predicted),
        })
    }

    /// Gap between the two most probable classes; small means uncertain.
    #[must_use]
    pub fn uncertainty(&self) -> f64 {
        self.best - self.second
    }
}
