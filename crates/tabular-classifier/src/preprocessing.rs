//! Categorical encoding for train/test/validation tables.
//!
//! Provides the `LabelEncoder` (sorted distinct values to `0..k-1`), the
//! `ClassLabels` that fix class ordering for every split, and the
//! `TableNormalizer` that turns raw `FeatureTable`s into numeric
//! `EncodedTable`s ready for model fitting.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use ndarray::{Array1, Array2, ArrayView1};

use crate::config::EncodingMode;
use crate::data_handling::{ColumnKind, FeatureTable, Split, Value};
use crate::error::ClassifierError;

/// Bijective mapping from the sorted distinct values of a column to `0..k-1`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelEncoder {
    classes: Vec<Value>,
    index: HashMap<Value, usize>,
}

impl LabelEncoder {
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let classes: Vec<Value> = values
            .into_iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index = classes
            .iter()
            .enumerate()
            .map(|(code, value)| (value.clone(), code))
            .collect();
        Self { classes, index }
    }

    /// Distinct values in code order.
    pub fn classes(&self) -> &[Value] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn code(&self, value: &Value) -> Option<usize> {
        self.index.get(value).copied()
    }

    /// Encode `values` of `column`; a value not seen by `fit` is an error.
    pub fn transform<'a, I>(&self, column: &str, values: I) -> Result<Vec<usize>, ClassifierError>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        values
            .into_iter()
            .map(|v| {
                self.code(v).ok_or_else(|| ClassifierError::UnseenCategory {
                    column: column.to_string(),
                    value: v.to_string(),
                })
            })
            .collect()
    }

    pub fn inverse_transform(&self, codes: &[usize]) -> Result<Vec<Value>, ClassifierError> {
        codes
            .iter()
            .map(|&code| {
                self.classes
                    .get(code)
                    .cloned()
                    .ok_or(ClassifierError::InvalidCode {
                        code,
                        n_classes: self.classes.len(),
                    })
            })
            .collect()
    }
}

/// Sorted distinct class values of the training table.
///
/// Targets of every split are indices into this list, so confusion matrix rows
/// and ROC curves are keyed consistently.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassLabels {
    labels: Vec<Value>,
}

impl ClassLabels {
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let labels = values
            .into_iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self { labels }
    }

    pub fn labels(&self) -> &[Value] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.labels.get(idx)
    }

    pub fn index_of(&self, value: &Value) -> Option<usize> {
        self.labels.binary_search(value).ok()
    }

    /// Map the class values of `split` to label indices.
    pub fn encode<'a, I>(&self, split: Split, values: I) -> Result<Array1<usize>, ClassifierError>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        values
            .into_iter()
            .map(|v| {
                self.index_of(v).ok_or_else(|| ClassifierError::UnknownClass {
                    split,
                    value: v.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Array1::from_vec)
    }
}

/// Label encoders for every categorical column, resolvable per split.
#[derive(Debug, Clone, PartialEq)]
pub enum EncoderSet {
    /// The same encoder serves every split.
    Shared(BTreeMap<String, LabelEncoder>),
    PerSplit(BTreeMap<Split, BTreeMap<String, LabelEncoder>>),
}

impl EncoderSet {
    pub fn get(&self, split: Split, column: &str) -> Option<&LabelEncoder> {
        match self {
            EncoderSet::Shared(encoders) => encoders.get(column),
            EncoderSet::PerSplit(by_split) => by_split.get(&split).and_then(|e| e.get(column)),
        }
    }

    pub fn mode(&self) -> EncodingMode {
        match self {
            EncoderSet::Shared(_) => EncodingMode::Shared,
            EncoderSet::PerSplit(_) => EncodingMode::PerSplit,
        }
    }
}

/// Numeric view of a `FeatureTable`: categorical codes and numeric values as `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedTable {
    names: Vec<String>,
    data: Array2<f64>,
}

impl EncodedTable {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.data.column(idx))
    }

    /// Matrix of the requested columns, in request order.
    pub fn select(&self, split: Split, features: &[&str]) -> Result<Array2<f64>, ClassifierError> {
        let mut out = Array2::zeros((self.nrows(), features.len()));
        for (j, name) in features.iter().enumerate() {
            let column = self
                .column(name)
                .ok_or_else(|| ClassifierError::MissingColumn {
                    split: Some(split),
                    column: name.to_string(),
                })?;
            out.column_mut(j).assign(&column);
        }
        Ok(out)
    }
}

/// One encoded split together with its class targets.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSplit {
    pub split: Split,
    pub table: EncodedTable,
    /// Class indices into the session's `ClassLabels`.
    pub targets: Array1<usize>,
}

impl PreparedSplit {
    /// Feature matrix and class targets for the requested feature columns.
    pub fn x_y(&self, features: &[&str]) -> Result<(Array2<f64>, Array1<usize>), ClassifierError> {
        let x = self.table.select(self.split, features)?;
        Ok((x, self.targets.clone()))
    }
}

/// Output of `TableNormalizer::normalize`.
#[derive(Debug, Clone)]
pub struct NormalizedTables {
    pub class_labels: ClassLabels,
    pub encoders: EncoderSet,
    pub train: PreparedSplit,
    pub test: PreparedSplit,
    pub validation: PreparedSplit,
}

pub struct TableNormalizer {
    class_name: String,
    mode: EncodingMode,
}

impl TableNormalizer {
    pub fn new(class_name: impl Into<String>, mode: EncodingMode) -> Self {
        Self {
            class_name: class_name.into(),
            mode,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Encode the three tables and derive the class labels from the train table.
    pub fn normalize(
        &self,
        train: &FeatureTable,
        test: &FeatureTable,
        validation: &FeatureTable,
    ) -> Result<NormalizedTables, ClassifierError> {
        let tables = [
            (Split::Train, train),
            (Split::Test, test),
            (Split::Validation, validation),
        ];

        for (split, table) in tables.iter() {
            if table.is_empty() {
                return Err(ClassifierError::EmptySplit(*split));
            }
            if !table.schema().contains(&self.class_name) {
                return Err(ClassifierError::MissingColumn {
                    split: Some(*split),
                    column: self.class_name.clone(),
                });
            }
            table.log_summary(*split);
        }

        let class_labels = ClassLabels::fit(train.column(&self.class_name)?);
        log::debug!(
            "Class column '{}' holds {} labels: {:?}",
            self.class_name,
            class_labels.len(),
            class_labels.labels().iter().map(|l| l.to_string()).collect::<Vec<_>>()
        );

        let encoders = match self.mode {
            EncodingMode::Shared => EncoderSet::Shared(fit_shared_encoders(&tables)?),
            EncodingMode::PerSplit => EncoderSet::PerSplit(
                tables
                    .iter()
                    .map(|(split, table)| (*split, fit_table_encoders(table)))
                    .collect(),
            ),
        };

        let train = self.prepare(Split::Train, train, &encoders, &class_labels)?;
        let test = self.prepare(Split::Test, test, &encoders, &class_labels)?;
        let validation = self.prepare(Split::Validation, validation, &encoders, &class_labels)?;

        Ok(NormalizedTables {
            class_labels,
            encoders,
            train,
            test,
            validation,
        })
    }

    fn prepare(
        &self,
        split: Split,
        table: &FeatureTable,
        encoders: &EncoderSet,
        class_labels: &ClassLabels,
    ) -> Result<PreparedSplit, ClassifierError> {
        let table_encoded = encode_table(split, table, encoders)?;
        let targets = class_labels.encode(split, table.column(&self.class_name)?)?;
        Ok(PreparedSplit {
            split,
            table: table_encoded,
            targets,
        })
    }
}

/// Replace categorical columns of `table` with their codes, keeping column order.
pub fn encode_table(
    split: Split,
    table: &FeatureTable,
    encoders: &EncoderSet,
) -> Result<EncodedTable, ClassifierError> {
    let mut data = Array2::zeros((table.nrows(), table.ncols()));
    let mut names = Vec::with_capacity(table.ncols());

    for (j, spec) in table.schema().columns().iter().enumerate() {
        match spec.kind {
            ColumnKind::Categorical => {
                let encoder = encoders
                    .get(split, &spec.name)
                    .ok_or_else(|| ClassifierError::MissingColumn {
                        split: Some(split),
                        column: spec.name.clone(),
                    })?;
                let codes = encoder.transform(&spec.name, table.column_at(j))?;
                for (i, code) in codes.into_iter().enumerate() {
                    data[(i, j)] = code as f64;
                }
            }
            ColumnKind::Numeric => {
                for (i, value) in table.column_at(j).enumerate() {
                    data[(i, j)] = value.as_f64().ok_or_else(|| ClassifierError::TypeMismatch {
                        column: spec.name.clone(),
                        row: i,
                        expected: ColumnKind::Numeric,
                    })?;
                }
            }
        }
        names.push(spec.name.clone());
    }

    Ok(EncodedTable { names, data })
}

fn fit_table_encoders(table: &FeatureTable) -> BTreeMap<String, LabelEncoder> {
    table
        .schema()
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, spec)| spec.kind == ColumnKind::Categorical)
        .map(|(j, spec)| (spec.name.clone(), LabelEncoder::fit(table.column_at(j))))
        .collect()
}

fn fit_shared_encoders(
    tables: &[(Split, &FeatureTable)],
) -> Result<BTreeMap<String, LabelEncoder>, ClassifierError> {
    let mut kinds: BTreeMap<&str, ColumnKind> = BTreeMap::new();
    for (_, table) in tables {
        for spec in table.schema().columns() {
            match kinds.get(spec.name.as_str()).copied() {
                Some(kind) if kind != spec.kind => {
                    return Err(ClassifierError::KindMismatch {
                        column: spec.name.clone(),
                    })
                }
                Some(_) => {}
                None => {
                    kinds.insert(spec.name.as_str(), spec.kind);
                }
            }
        }
    }

    let mut encoders = BTreeMap::new();
    for (name, kind) in kinds {
        if kind != ColumnKind::Categorical {
            continue;
        }
        let values = tables.iter().flat_map(|(_, table)| {
            table
                .schema()
                .position(name)
                .into_iter()
                .flat_map(move |j| table.column_at(j))
        });
        let encoder = LabelEncoder::fit(values);
        log::trace!("Shared encoder for '{}' with {} categories", name, encoder.len());
        encoders.insert(name.to_string(), encoder);
    }
    Ok(encoders)
}
