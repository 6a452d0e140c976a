//! Encoded training data for the tree ensemble.
//!
//! A [`Dataset`] is a column-oriented table of feature columns plus one
//! binary label per row. Columns are either categorical (stored as level
//! codes, with no ordering assumed between levels) or numeric.
//!
//! # Examples
//!
//! ```
//! use pmiacc_training::dataset::{Dataset, FeatureColumn};
//!
//! let relation = FeatureColumn::categorical("relation", ["nsubj", "dobj", "nsubj"]);
//! let distance = FeatureColumn::numeric("lin_dist", vec![1.0, 2.0, 5.0]);
//! let dataset = Dataset::new(vec![relation, distance], vec![true, false, true]).unwrap();
//!
//! assert_eq!(dataset.len(), 3);
//! assert_eq!(dataset.feature_names(), ["relation", "lin_dist"]);
//! ```

use std::collections::{BTreeSet, HashMap};

/// Errors raised while assembling a dataset or fitting a model on it.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum TrainError {
    #[display("training set contains no rows")]
    EmptyTrainingSet,
    #[display("training set contains no feature columns")]
    NoFeatures,
    #[display("feature column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
    #[display("feature column '{column}' has a NaN value at row {row}")]
    NanValue { column: String, row: usize },
    #[display("number of trees must be positive")]
    NoTrees,
    #[display("mtry must be between 1 and {features}, got {mtry}")]
    InvalidMtry { mtry: usize, features: usize },
}

/// A single feature value as seen by a split rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    /// Level code of a categorical column.
    Category(u32),
    /// Value of a numeric column.
    Number(f64),
}

/// Storage of one feature column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Categorical {
        /// Level code per row (index into `levels`).
        codes: Vec<u32>,
        /// Distinct level labels, sorted.
        levels: Vec<String>,
    },
    Numeric(Vec<f64>),
}

/// A named feature column.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureColumn {
    name: String,
    data: ColumnData,
}

impl FeatureColumn {
    /// Builds a categorical column, encoding each distinct label as a level.
    ///
    /// Levels are sorted so the encoding does not depend on row order.
    #[must_use]
    #[expect(clippy::cast_possible_truncation)]
    pub fn categorical<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let values = values
            .into_iter()
            .map(|v| v.as_ref().to_owned())
            .collect::<Vec<_>>();
        let levels = values
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        let index = levels
            .iter()
            .enumerate()
            .map(|(i, level)| (level.as_str(), i as u32))
            .collect::<HashMap<_, _>>();
        let codes = values.iter().map(|v| index[v.as_str()]).collect();
        Self {
            name: name.into(),
            data: ColumnData::Categorical { codes, levels },
        }
    }

    /// Builds a numeric column.
    #[must_use]
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Categorical { codes, .. } => codes.len(),
            ColumnData::Numeric(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the value at `row`.
    #[must_use]
    pub fn value(&self, row: usize) -> FeatureValue {
        match &self.data {
            ColumnData::Categorical { codes, .. } => FeatureValue::Category(codes[row]),
            ColumnData::Numeric(values) => FeatureValue::Number(values[row]),
        }
    }

    /// Returns the label of a categorical level code.
    #[must_use]
    pub fn level(&self, code: u32) -> Option<&str> {
        match &self.data {
            ColumnData::Categorical { levels, .. } => {
                levels.get(usize::try_from(code).ok()?).map(String::as_str)
            }
            ColumnData::Numeric(_) => None,
        }
    }
}

/// Feature columns plus binary labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<FeatureColumn>,
    labels: Vec<bool>,
}

impl Dataset {
    /// Validates and assembles a dataset.
    ///
    /// Every column must have one value per label, and numeric columns must
    /// not contain NaN.
    pub fn new(columns: Vec<FeatureColumn>, labels: Vec<bool>) -> Result<Self, TrainError> {
        if labels.is_empty() {
            return Err(TrainError::EmptyTrainingSet);
        }
        if columns.is_empty() {
            return Err(TrainError::NoFeatures);
        }
        for column in &columns {
            if column.len() != labels.len() {
                return Err(TrainError::LengthMismatch {
                    column: column.name.clone(),
                    expected: labels.len(),
                    found: column.len(),
                });
            }
            if let ColumnData::Numeric(values) = &column.data
                && let Some(row) = values.iter().position(|v| v.is_nan())
            {
                return Err(TrainError::NanValue {
                    column: column.name.clone(),
                    row,
                });
            }
        }
        Ok(Self { columns, labels })
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub fn num_features(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    #[must_use]
    pub fn column(&self, feature: usize) -> &FeatureColumn {
        &self.columns[feature]
    }

    #[must_use]
    pub fn feature_names(&self) -> Vec<&str> {
        self.columns.iter().map(FeatureColumn::name).collect()
    }

    #[must_use]
    pub fn labels(&self) -> &[bool] {
        &self.labels
    }

    #[must_use]
    pub fn label(&self, row: usize) -> bool {
        self.labels[row]
    }

    #[must_use]
    pub fn value(&self, row: usize, feature: usize) -> FeatureValue {
        self.columns[feature].value(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorical_levels_are_sorted() {
        let column = FeatureColumn::categorical("upos", ["VERB", "NOUN", "VERB", "ADJ"]);
        let ColumnData::Categorical { codes, levels } = column.data() else {
            panic!("expected categorical column");
        };
        assert_eq!(levels, &["ADJ", "NOUN", "VERB"]);
        assert_eq!(codes, &[2, 1, 2, 0]);
        assert_eq!(column.level(1), Some("NOUN"));
        assert_eq!(column.level(3), None);
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let column = FeatureColumn::numeric("lin_dist", vec![1.0, 2.0]);
        let err = Dataset::new(vec![column], vec![true]).unwrap_err();
        assert_eq!(
            err,
            TrainError::LengthMismatch {
                column: "lin_dist".to_owned(),
                expected: 1,
                found: 2,
            }
        );
    }

    #[test]
    fn test_rejects_nan() {
        let column = FeatureColumn::numeric("pmi_sum", vec![0.5, f64::NAN]);
        let err = Dataset::new(vec![column], vec![true, false]).unwrap_err();
        assert_eq!(
            err,
            TrainError::NanValue {
                column: "pmi_sum".to_owned(),
                row: 1,
            }
        );
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(
            Dataset::new(vec![], vec![true]).unwrap_err(),
            TrainError::NoFeatures
        );
        let column = FeatureColumn::numeric("lin_dist", vec![]);
        assert_eq!(
            Dataset::new(vec![column], vec![]).unwrap_err(),
            TrainError::EmptyTrainingSet
        );
    }
}
