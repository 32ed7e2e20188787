//! Datasets with missing values and the ground truth behind them.
//!
//! This crate holds the data side of active feature-value acquisition:
//!
//! - [`Dataset`] - instances × attributes with per-cell missingness; the class
//!   attribute is selected by index
//! - [`Cell`] - an (instance, attribute) coordinate
//! - [`GroundTruthOracle`] - capability that reveals the true value of a cell,
//!   with [`ReferenceOracle`] backed by a fully observed copy
//! - [`Discretize`] - transform that turns numeric attributes into nominal
//!   buckets, with [`EqualFrequencyDiscretizer`]
//! - [`missing`] - helpers that hide values of a complete dataset to set up an
//!   acquisition experiment
//!
//! # Value encoding
//!
//! Every cell holds an `Option<f64>`. Numeric attributes store the number
//! itself; nominal attributes store the index of the value in the attribute's
//! value list. `None` means missing.
//!
//! # Example
//!
//! ```
//! use afa_data::{Attribute, Cell, Dataset, GroundTruthOracle, ReferenceOracle};
//!
//! let attributes = vec![
//!     Attribute::nominal("outlook", ["sunny", "rainy"]),
//!     Attribute::numeric("temperature"),
//!     Attribute::nominal("play", ["no", "yes"]),
//! ];
//! let complete = Dataset::new(
//!     attributes,
//!     vec![
//!         vec![Some(0.0), Some(30.0), Some(0.0)],
//!         vec![Some(1.0), Some(18.0), Some(1.0)],
//!     ],
//! )?;
//!
//! let mut working = complete.clone();
//! working.set_missing(Cell::new(1, 0))?;
//! assert_eq!(working.missing_cells().collect::<Vec<_>>(), [Cell::new(1, 0)]);
//!
//! let oracle = ReferenceOracle::new(complete);
//! assert_eq!(oracle.value(Cell::new(1, 0))?, 1.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use self::{cell::*, dataset::*, discretize::*, oracle::*};

mod cell;
mod dataset;
mod discretize;
pub mod missing;
mod oracle;

/// Errors raised when building or editing a [`Dataset`].
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum DataError {
    #[display("dataset has no attributes")]
    NoAttributes,
    #[display("row {row} has {actual} values but the dataset has {expected} attributes")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[display("value {value} is not a valid index for nominal attribute {attribute} with {num_values} values")]
    NominalOutOfRange {
        attribute: usize,
        value: f64,
        num_values: usize,
    },
    #[display("value of attribute {attribute} is not finite")]
    NotFinite { attribute: usize },
    #[display("class index {index} is out of range for {num_attributes} attributes")]
    ClassIndexOutOfRange { index: usize, num_attributes: usize },
    #[display("cell {cell} is out of range")]
    CellOutOfRange { cell: Cell },
    #[display("fraction {fraction} must lie strictly between 0 and 1")]
    InvalidFraction { fraction: f64 },
    #[display("numeric attribute {attribute} has no fitted cut points")]
    NotFitted { attribute: usize },
}
