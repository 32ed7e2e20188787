use std::fmt;

use serde::{Deserialize, Serialize};

/// Coordinate of a single value in a [`Dataset`](crate::Dataset).
///
/// Cells order by instance first and attribute second, which is the order
/// used to break ties between equally scored cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Index of the instance (row).
    pub instance: usize,
    /// Index of the attribute (column).
    pub attribute: usize,
}

impl Cell {
    #[must_use]
    pub const fn new(instance: usize, attribute: usize) -> Self {
        Self {
            instance,
            attribute,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.instance, self.attribute)
    }
}
