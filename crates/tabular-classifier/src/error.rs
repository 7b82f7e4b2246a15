use std::error::Error;
use std::fmt;

use crate::data_handling::{ColumnKind, Split};

/// Errors raised while building tables, encoding columns or scoring a split.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// A column requested by name is not part of the split's schema.
    MissingColumn { split: Option<Split>, column: String },
    DuplicateColumn(String),
    /// Row `row` carries `found` values while the schema declares `expected` columns.
    RowLength { row: usize, expected: usize, found: usize },
    /// The same column is numeric in one table and categorical in another.
    KindMismatch { column: String },
    /// A value does not fit the declared kind of its column.
    TypeMismatch { column: String, row: usize, expected: ColumnKind },
    EmptySplit(Split),
    /// A class value in `split` was never seen in the training table.
    UnknownClass { split: Split, value: String },
    UnseenCategory { column: String, value: String },
    InvalidCode { code: usize, n_classes: usize },
    InvalidFeatures(String),
    /// The ROC partition for `class` holds only positives or only negatives; its curve is undefined.
    DegenerateRoc { class: String },
    InvalidSplit(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClassifierError::MissingColumn { split: Some(split), column } => {
                write!(f, "Column '{}' not found in {} table", column, split)
            }
            ClassifierError::MissingColumn { split: None, column } => {
                write!(f, "Column '{}' not found", column)
            }
            ClassifierError::DuplicateColumn(name) => write!(f, "Duplicate column name '{}'", name),
            ClassifierError::RowLength { row, expected, found } => write!(
                f,
                "Row {} has {} values but the schema declares {} columns",
                row, found, expected
            ),
            ClassifierError::KindMismatch { column } => write!(
                f,
                "Column '{}' is numeric in one table and categorical in another",
                column
            ),
            ClassifierError::TypeMismatch { column, row, expected } => write!(
                f,
                "Value at row {} of column '{}' is not {}",
                row, column, expected
            ),
            ClassifierError::EmptySplit(split) => write!(f, "The {} table has no rows", split),
            ClassifierError::UnknownClass { split, value } => write!(
                f,
                "Class '{}' in the {} table does not occur in the train table",
                value, split
            ),
            ClassifierError::UnseenCategory { column, value } => write!(
                f,
                "Value '{}' of column '{}' was not seen when the encoder was fit",
                value, column
            ),
            ClassifierError::InvalidCode { code, n_classes } => write!(
                f,
                "Code {} is out of range for an encoder with {} classes",
                code, n_classes
            ),
            ClassifierError::InvalidFeatures(msg) => write!(f, "Invalid feature selection: {}", msg),
            ClassifierError::DegenerateRoc { class } => write!(
                f,
                "Cannot compute a ROC curve for class '{}': the partition holds a single outcome",
                class
            ),
            ClassifierError::InvalidSplit(msg) => write!(f, "Invalid split: {}", msg),
        }
    }
}

impl Error for ClassifierError {}
