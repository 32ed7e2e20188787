use std::fmt;

use crate::{Cell, Dataset};

/// Errors raised when the ground truth for a cell cannot be produced.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum OracleError {
    #[display("cell {cell} is outside the reference dataset")]
    OutOfRange { cell: Cell },
    #[display("reference value for cell {cell} is not observed")]
    Unobserved { cell: Cell },
}

/// Reveals the true value of a cell.
///
/// The acquisition loop calls this exactly once for every cell it acquires.
pub trait GroundTruthOracle: fmt::Debug + Send + Sync {
    /// Returns the true value of `cell`, encoded as in [`Dataset`].
    fn value(&self, cell: Cell) -> Result<f64, OracleError>;
}

/// Ground truth backed by a fully observed copy of the dataset.
#[derive(Debug, Clone)]
pub struct ReferenceOracle {
    reference: Dataset,
}

impl ReferenceOracle {
    #[must_use]
    pub fn new(reference: Dataset) -> Self {
        Self { reference }
    }

    #[must_use]
    pub fn reference(&self) -> &Dataset {
        &self.reference
    }
}

impl GroundTruthOracle for ReferenceOracle {
    fn value(&self, cell: Cell) -> Result<f64, OracleError> {
        if cell.instance >= self.reference.num_instances()
            || cell.attribute >= self.reference.num_attributes()
        {
            return Err(OracleError::OutOfRange { cell });
        }
        self.reference
            .value(cell)
            .ok_or(OracleError::Unobserved { cell })
    }
}
