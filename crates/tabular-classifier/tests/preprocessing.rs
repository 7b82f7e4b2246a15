//! Integration tests for label encoding and table normalization.

use tabular_classifier::config::EncodingMode;
use tabular_classifier::data_handling::{FeatureTable, Split, Value};
use tabular_classifier::error::ClassifierError;
use tabular_classifier::preprocessing::{LabelEncoder, TableNormalizer};

fn texts(values: &[&str]) -> Vec<Value> {
    values.iter().map(|&v| Value::from(v)).collect()
}

fn floats(values: &[f64]) -> Vec<Value> {
    values.iter().map(|&v| Value::from(v)).collect()
}

fn table(colors: &[&str], sizes: &[f64], classes: &[&str]) -> FeatureTable {
    FeatureTable::from_columns(vec![
        ("color", texts(colors)),
        ("size", floats(sizes)),
        ("class", texts(classes)),
    ])
    .unwrap()
}

// ---------------------------------------------------------------------------
// LabelEncoder
// ---------------------------------------------------------------------------

#[test]
fn encoder_round_trip_reproduces_values() {
    let values = texts(&["green", "red", "blue", "green", "red"]);
    let encoder = LabelEncoder::fit(values.iter());
    assert_eq!(encoder.len(), 3);

    let codes = encoder.transform("color", values.iter()).unwrap();
    assert!(codes.iter().all(|&c| c < encoder.len()));
    assert_eq!(codes, vec![1, 2, 0, 1, 2]);
    assert_eq!(encoder.inverse_transform(&codes).unwrap(), values);
}

#[test]
fn encoder_orders_mixed_values() {
    let values = vec![Value::from("b"), Value::from(3i64), Value::from(true), Value::from("a")];
    let encoder = LabelEncoder::fit(values.iter());
    assert_eq!(
        encoder.classes(),
        &[Value::from(true), Value::from(3i64), Value::from("a"), Value::from("b")]
    );
    assert_eq!(encoder.code(&Value::from("a")), Some(2));
    assert_eq!(encoder.code(&Value::from("z")), None);
}

// ---------------------------------------------------------------------------
// TableNormalizer
// ---------------------------------------------------------------------------

#[test]
fn shared_encoding_uses_one_code_per_category() {
    let train = table(&["red", "green", "blue", "red"], &[1.0, 2.0, 3.0, 4.0], &["A", "B", "A", "B"]);
    let test = table(&["red", "green"], &[1.5, 2.5], &["A", "B"]);
    let validation = table(&["red", "blue"], &[0.5, 3.5], &["B", "A"]);

    let normalized = TableNormalizer::new("class", EncodingMode::Shared)
        .normalize(&train, &test, &validation)
        .unwrap();
    assert_eq!(normalized.encoders.mode(), EncodingMode::Shared);

    // blue = 0, green = 1, red = 2 in every split
    let red_train = normalized.train.table.column("color").unwrap()[0];
    let red_test = normalized.test.table.column("color").unwrap()[0];
    let red_validation = normalized.validation.table.column("color").unwrap()[0];
    assert_eq!(red_train, 2.0);
    assert_eq!(red_test, 2.0);
    assert_eq!(red_validation, 2.0);

    for split in Split::ALL {
        let encoder = normalized.encoders.get(split, "color").unwrap();
        assert_eq!(encoder.code(&Value::from("red")), Some(2));
    }
}

#[test]
fn per_split_encoding_fits_each_table_separately() {
    let train = table(&["red", "green", "blue", "red"], &[1.0, 2.0, 3.0, 4.0], &["A", "B", "A", "B"]);
    let test = table(&["red", "green"], &[1.5, 2.5], &["A", "B"]);
    let validation = table(&["red", "blue"], &[0.5, 3.5], &["B", "A"]);

    let normalized = TableNormalizer::new("class", EncodingMode::PerSplit)
        .normalize(&train, &test, &validation)
        .unwrap();
    assert_eq!(normalized.encoders.mode(), EncodingMode::PerSplit);

    let red = Value::from("red");
    assert_eq!(normalized.encoders.get(Split::Train, "color").unwrap().code(&red), Some(2));
    assert_eq!(normalized.encoders.get(Split::Test, "color").unwrap().code(&red), Some(1));
    assert_eq!(
        normalized.encoders.get(Split::Validation, "color").unwrap().code(&red),
        Some(1)
    );
    assert_eq!(normalized.test.table.column("color").unwrap()[0], 1.0);
}

#[test]
fn numeric_columns_pass_through_and_targets_follow_train_labels() {
    let train = table(&["red", "green"], &[1.25, -2.0], &["B", "A"]);
    let test = table(&["red"], &[7.0], &["A"]);
    let validation = table(&["green"], &[0.0], &["B"]);

    let normalizer = TableNormalizer::new("class", EncodingMode::Shared);
    assert_eq!(normalizer.class_name(), "class");
    let normalized = normalizer.normalize(&train, &test, &validation).unwrap();

    assert_eq!(normalized.class_labels.labels(), &texts(&["A", "B"])[..]);
    assert_eq!(normalized.train.targets.to_vec(), vec![1, 0]);
    assert_eq!(normalized.test.targets.to_vec(), vec![0]);
    assert_eq!(normalized.validation.targets.to_vec(), vec![1]);

    let sizes = normalized.train.table.column("size").unwrap();
    assert_eq!(sizes.to_vec(), vec![1.25, -2.0]);
    assert_eq!(normalized.train.table.names(), &["color", "size", "class"]);

    // green = 0, red = 1; the class column is encoded like any categorical column
    let data = normalized.train.table.data();
    assert_eq!(data.shape(), &[2, 3]);
    assert_eq!(data.row(0).to_vec(), vec![1.0, 1.25, 1.0]);
    assert_eq!(data.row(1).to_vec(), vec![0.0, -2.0, 0.0]);
}

#[test]
fn kind_mismatch_between_tables_is_rejected() {
    let train = table(&["red", "green"], &[1.0, 2.0], &["A", "B"]);
    let test = FeatureTable::from_columns(vec![
        ("color", texts(&["red"])),
        ("size", texts(&["big"])),
        ("class", texts(&["A"])),
    ])
    .unwrap();
    let validation = table(&["red"], &[1.0], &["B"]);

    let err = TableNormalizer::new("class", EncodingMode::Shared)
        .normalize(&train, &test, &validation)
        .unwrap_err();
    assert_eq!(
        err,
        ClassifierError::KindMismatch {
            column: "size".to_string()
        }
    );
}

#[test]
fn unknown_class_in_validation_is_rejected() {
    let train = table(&["red", "green"], &[1.0, 2.0], &["A", "B"]);
    let test = table(&["red"], &[1.0], &["A"]);
    let validation = table(&["red"], &[1.0], &["C"]);

    let err = TableNormalizer::new("class", EncodingMode::Shared)
        .normalize(&train, &test, &validation)
        .unwrap_err();
    assert_eq!(
        err,
        ClassifierError::UnknownClass {
            split: Split::Validation,
            value: "C".to_string()
        }
    );
}

#[test]
fn missing_class_column_and_empty_tables_are_rejected() {
    let train = table(&["red", "green"], &[1.0, 2.0], &["A", "B"]);
    let test = table(&["red"], &[1.0], &["A"]);
    let no_class = FeatureTable::from_columns(vec![("color", texts(&["red"]))]).unwrap();
    let normalizer = TableNormalizer::new("class", EncodingMode::Shared);

    let err = normalizer.normalize(&train, &test, &no_class).unwrap_err();
    assert_eq!(
        err,
        ClassifierError::MissingColumn {
            split: Some(Split::Validation),
            column: "class".to_string()
        }
    );

    let empty = table(&[], &[], &[]);
    let err = normalizer.normalize(&train, &empty, &test).unwrap_err();
    assert_eq!(err, ClassifierError::EmptySplit(Split::Test));
}
