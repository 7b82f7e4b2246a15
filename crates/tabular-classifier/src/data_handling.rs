//! Typed tables and split helpers.
//!
//! This module defines the cell `Value`, the `Schema` descriptor checked when a
//! `FeatureTable` is built, the `Split` identity used to key per-split state,
//! and the seeded partitioning / one-hot helpers used by the ROC pass.
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::ClassifierError;

/// Identity of one of the three input tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Test,
    Validation,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Test, Split::Validation];
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Train => write!(f, "train"),
            Split::Test => write!(f, "test"),
            Split::Validation => write!(f, "validation"),
        }
    }
}

/// A single table cell.
///
/// Values are totally ordered (by variant, then by value, floats through
/// `f64::total_cmp`) so categorical columns can be sorted and used as map keys.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Numeric view of the value; `None` for booleans and text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Int(_) => 1,
            Value::Float(_) => 2,
            Value::Text(_) => 3,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Bool(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            // total_cmp equality is bit equality
            Value::Float(v) => v.to_bits().hash(state),
            Value::Text(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl ColumnKind {
    /// Kind of a column holding `values`: numeric only if every value is an int or a float.
    pub fn infer<'a, I>(values: I) -> ColumnKind
    where
        I: IntoIterator<Item = &'a Value>,
    {
        if values.into_iter().all(Value::is_numeric) {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Ordered list of named, typed columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self, ClassifierError> {
        for (i, col) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == col.name) {
                return Err(ClassifierError::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.kind)
    }
}

/// Row-major table of named columns, validated against its `Schema`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    schema: Schema,
    rows: Vec<Vec<Value>>,
}

impl FeatureTable {
    /// Build a table from rows laid out in schema order.
    ///
    /// Every row must carry one value per column, and numeric columns may only
    /// hold ints or floats. Categorical columns accept any value.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Result<Self, ClassifierError> {
        for (r, row) in rows.iter().enumerate() {
            if row.len() != schema.len() {
                return Err(ClassifierError::RowLength {
                    row: r,
                    expected: schema.len(),
                    found: row.len(),
                });
            }
            for (value, spec) in row.iter().zip(schema.columns()) {
                if spec.kind == ColumnKind::Numeric && !value.is_numeric() {
                    return Err(ClassifierError::TypeMismatch {
                        column: spec.name.clone(),
                        row: r,
                        expected: ColumnKind::Numeric,
                    });
                }
            }
        }
        Ok(Self { schema, rows })
    }

    /// Build a table from named columns, inferring each column's kind.
    pub fn from_columns<S>(columns: Vec<(S, Vec<Value>)>) -> Result<Self, ClassifierError>
    where
        S: Into<String>,
    {
        let nrows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut specs = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(columns.len());
        for (name, values) in columns {
            if values.len() != nrows {
                return Err(ClassifierError::RowLength {
                    row: nrows.min(values.len()),
                    expected: nrows,
                    found: values.len(),
                });
            }
            specs.push(ColumnSpec::new(name, ColumnKind::infer(values.iter())));
            data.push(values);
        }
        let schema = Schema::new(specs)?;

        let mut rows: Vec<Vec<Value>> = (0..nrows).map(|_| Vec::with_capacity(data.len())).collect();
        for column in data {
            for (row, value) in rows.iter_mut().zip(column) {
                row.push(value);
            }
        }
        Ok(Self { schema, rows })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.schema.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Values of column `idx` in row order.
    pub fn column_at(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// Values of the named column in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>, ClassifierError> {
        let idx = self
            .schema
            .position(name)
            .ok_or_else(|| ClassifierError::MissingColumn {
                split: None,
                column: name.to_string(),
            })?;
        Ok(self.column_at(idx).collect())
    }

    pub fn log_summary(&self, split: Split) {
        let n_categorical = self
            .schema
            .columns()
            .iter()
            .filter(|c| c.kind == ColumnKind::Categorical)
            .count();
        log::debug!(
            "{} table: {} rows, {} columns ({} categorical)",
            split,
            self.nrows(),
            self.ncols(),
            n_categorical
        );
    }
}

/// Shuffle `0..n_samples` with a seeded RNG and cut it into (train, test) index sets.
///
/// The test partition holds `ceil(test_size * n_samples)` rows; both partitions
/// must end up non-empty.
pub fn train_test_split(
    n_samples: usize,
    test_size: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), ClassifierError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(ClassifierError::InvalidSplit(format!(
            "test_size must lie in (0, 1), got {}",
            test_size
        )));
    }
    let n_test = (test_size * n_samples as f64).ceil() as usize;
    if n_test == 0 || n_test >= n_samples {
        return Err(ClassifierError::InvalidSplit(format!(
            "{} samples cannot be split with test_size {}",
            n_samples, test_size
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..n_samples).collect();
    indices.shuffle(&mut rng);

    let train = indices[n_test..].to_vec();
    let mut test = indices;
    test.truncate(n_test);

    log::trace!(
        "Partitioned {} samples into {} train / {} test (seed {})",
        n_samples,
        train.len(),
        test.len(),
        seed
    );
    Ok((train, test))
}

/// One-hot encode class indices: column `j` flags rows whose class is `classes[j]`.
pub fn label_binarize(y: &Array1<usize>, classes: &[usize]) -> Array2<usize> {
    let mut out = Array2::zeros((y.len(), classes.len()));
    for (i, label) in y.iter().enumerate() {
        if let Some(j) = classes.iter().position(|c| c == label) {
            out[(i, j)] = 1;
        }
    }
    out
}
