use serde::{Deserialize, Serialize};

use crate::{Cell, DataError};

/// Value domain of an [`Attribute`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttributeKind {
    /// Finite set of labelled values; cells store the label index.
    Nominal { values: Vec<String> },
    /// Real-valued attribute.
    Numeric,
}

/// A named column of a [`Dataset`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    kind: AttributeKind,
}

impl Attribute {
    /// Creates a nominal attribute with the given value labels.
    pub fn nominal<S, I>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: AttributeKind::Nominal {
                values: values.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// Creates a numeric attribute.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Numeric,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> &AttributeKind {
        &self.kind
    }

    #[must_use]
    pub fn is_nominal(&self) -> bool {
        matches!(self.kind, AttributeKind::Nominal { .. })
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, AttributeKind::Numeric)
    }

    /// Number of labels of a nominal attribute, `None` for numeric ones.
    #[must_use]
    pub fn num_values(&self) -> Option<usize> {
        match &self.kind {
            AttributeKind::Nominal { values } => Some(values.len()),
            AttributeKind::Numeric => None,
        }
    }

    fn check(&self, attribute: usize, value: f64) -> Result<(), DataError> {
        if !value.is_finite() {
            return Err(DataError::NotFinite { attribute });
        }
        if let Some(num_values) = self.num_values() {
            #[expect(clippy::cast_precision_loss)]
            let in_range = value >= 0.0 && value.fract() == 0.0 && value < num_values as f64;
            if !in_range {
                return Err(DataError::NominalOutOfRange {
                    attribute,
                    value,
                    num_values,
                });
            }
        }
        Ok(())
    }
}

/// A table of instances over a fixed list of attributes.
///
/// One attribute is the class (target) attribute, selected by
/// [`Dataset::class_index`]. [`Dataset::new`] makes the last attribute the
/// class; [`Dataset::with_class_index`] re-targets a copy, which is how
/// surrogate models learn to predict a feature attribute.
///
/// Every stored value is validated against its attribute: nominal values must
/// be label indices and numeric values must be finite.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    attributes: Vec<Attribute>,
    class_index: usize,
    rows: Vec<Vec<Option<f64>>>,
}

impl Dataset {
    /// Creates a dataset whose class attribute is the last attribute.
    pub fn new(
        attributes: Vec<Attribute>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, DataError> {
        let class_index = attributes
            .len()
            .checked_sub(1)
            .ok_or(DataError::NoAttributes)?;
        Self::from_parts(attributes, class_index, rows)
    }

    /// Creates a dataset with an explicit class attribute.
    pub fn from_parts(
        attributes: Vec<Attribute>,
        class_index: usize,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, DataError> {
        if attributes.is_empty() {
            return Err(DataError::NoAttributes);
        }
        if class_index >= attributes.len() {
            return Err(DataError::ClassIndexOutOfRange {
                index: class_index,
                num_attributes: attributes.len(),
            });
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != attributes.len() {
                return Err(DataError::RowWidth {
                    row: i,
                    expected: attributes.len(),
                    actual: row.len(),
                });
            }
            for (j, value) in row.iter().enumerate() {
                if let Some(value) = value {
                    attributes[j].check(j, *value)?;
                }
            }
        }
        Ok(Self {
            attributes,
            class_index,
            rows,
        })
    }

    /// Returns a copy of this dataset that uses `class_index` as the class.
    pub fn with_class_index(&self, class_index: usize) -> Result<Self, DataError> {
        let mut dataset = self.clone();
        dataset.set_class_index(class_index)?;
        Ok(dataset)
    }

    pub fn set_class_index(&mut self, class_index: usize) -> Result<(), DataError> {
        if class_index >= self.attributes.len() {
            return Err(DataError::ClassIndexOutOfRange {
                index: class_index,
                num_attributes: self.attributes.len(),
            });
        }
        self.class_index = class_index;
        Ok(())
    }

    /// Returns a dataset with the same attributes holding only the given rows.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of range.
    #[must_use]
    pub fn select_rows<I>(&self, indices: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        Self {
            attributes: self.attributes.clone(),
            class_index: self.class_index,
            rows: indices.into_iter().map(|i| self.rows[i].clone()).collect(),
        }
    }

    #[must_use]
    pub fn num_instances(&self) -> usize {
        self.rows.len()
    }

    /// Number of attributes, class attribute included.
    #[must_use]
    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    /// Number of attributes other than the class attribute.
    #[must_use]
    pub fn num_features(&self) -> usize {
        self.attributes.len() - 1
    }

    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn attribute(&self, index: usize) -> &Attribute {
        &self.attributes[index]
    }

    #[must_use]
    pub fn class_index(&self) -> usize {
        self.class_index
    }

    #[must_use]
    pub fn class_attribute(&self) -> &Attribute {
        &self.attributes[self.class_index]
    }

    /// Number of class labels; zero when the class attribute is numeric.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.class_attribute().num_values().unwrap_or(0)
    }

    /// Indices of every attribute except the class attribute.
    pub fn feature_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.attributes.len()).filter(|j| *j != self.class_index)
    }

    /// # Panics
    ///
    /// Panics if `instance` is out of range.
    #[must_use]
    pub fn row(&self, instance: usize) -> &[Option<f64>] {
        &self.rows[instance]
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[Option<f64>]> + '_ {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Value of `cell`, `None` when missing or out of range.
    #[must_use]
    pub fn value(&self, cell: Cell) -> Option<f64> {
        self.rows
            .get(cell.instance)
            .and_then(|row| row.get(cell.attribute))
            .copied()
            .flatten()
    }

    /// Whether `cell` is inside the dataset and holds no value.
    #[must_use]
    pub fn is_missing(&self, cell: Cell) -> bool {
        self.rows
            .get(cell.instance)
            .and_then(|row| row.get(cell.attribute))
            .is_some_and(Option::is_none)
    }

    /// Class label index of `instance`, `None` when missing.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn class_value(&self, instance: usize) -> Option<usize> {
        if self.class_attribute().is_numeric() {
            return None;
        }
        self.rows
            .get(instance)
            .and_then(|row| row[self.class_index])
            .map(|v| v as usize)
    }

    /// Stores `value` in `cell`.
    pub fn set_value(&mut self, cell: Cell, value: f64) -> Result<(), DataError> {
        let attribute = self
            .attributes
            .get(cell.attribute)
            .ok_or(DataError::CellOutOfRange { cell })?;
        attribute.check(cell.attribute, value)?;
        *self.slot_mut(cell)? = Some(value);
        Ok(())
    }

    /// Marks `cell` as missing.
    pub fn set_missing(&mut self, cell: Cell) -> Result<(), DataError> {
        *self.slot_mut(cell)? = None;
        Ok(())
    }

    fn slot_mut(&mut self, cell: Cell) -> Result<&mut Option<f64>, DataError> {
        self.rows
            .get_mut(cell.instance)
            .and_then(|row| row.get_mut(cell.attribute))
            .ok_or(DataError::CellOutOfRange { cell })
    }

    /// Whether `instance` has a missing value in any non-class attribute.
    #[must_use]
    pub fn has_missing_feature(&self, instance: usize) -> bool {
        self.missing_features(instance).next().is_some()
    }

    /// Non-class attributes of `instance` that hold no value.
    pub fn missing_features(&self, instance: usize) -> impl Iterator<Item = usize> + '_ {
        let row = &self.rows[instance];
        self.feature_indices().filter(move |j| row[*j].is_none())
    }

    /// Every missing non-class cell, in instance-major order.
    pub fn missing_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.rows.len()).flat_map(move |i| {
            self.missing_features(i).map(move |j| Cell::new(i, j))
        })
    }

    /// Instances whose class label is missing.
    pub fn unlabelled_instances(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row[self.class_index].is_none())
            .map(|(i, _)| i)
    }
}
