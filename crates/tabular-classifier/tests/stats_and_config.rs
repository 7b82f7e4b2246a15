//! Integration tests for metrics (confusion matrix, ROC/AUC) and config types.

use std::str::FromStr;

use tabular_classifier::config::{
    load_session_config, EncodingMode, ModelConfig, ModelType, SessionConfig,
};
use tabular_classifier::stats::{accuracy, auc, mean, roc_curve, round_to, ConfusionMatrix};

// ---------------------------------------------------------------------------
// Confusion matrix
// ---------------------------------------------------------------------------

#[test]
fn confusion_matrix_rows_count_true_instances() {
    let y_true = vec![0, 0, 0, 1, 1, 2, 2, 2, 2];
    let y_pred = vec![0, 1, 0, 1, 1, 2, 0, 2, 2];
    let cm = ConfusionMatrix::from_labels(&y_true, &y_pred).unwrap();

    assert_eq!(cm.labels(), &[0, 1, 2]);
    assert_eq!(cm.row_sums().to_vec(), vec![3, 2, 4]);
    assert_eq!(cm.total(), 9);
    assert_eq!(cm.counts()[(0, 1)], 1);
    assert_eq!(cm.counts()[(2, 0)], 1);
    assert!((cm.accuracy() - accuracy(&y_true, &y_pred).unwrap()).abs() < 1e-12);

    let normalized = cm.normalized();
    for row in normalized.rows() {
        assert!((row.sum() - 1.0).abs() < 1e-12);
    }
    assert!((normalized[(2, 2)] - 0.75).abs() < 1e-12);
}

#[test]
fn confusion_matrix_macro_scores() {
    let y_true = vec![0, 0, 1, 1];
    let y_pred = vec![0, 1, 1, 1];
    let cm = ConfusionMatrix::from_labels(&y_true, &y_pred).unwrap();

    // class 0: precision 1/1, recall 1/2; class 1: precision 2/3, recall 2/2
    assert!((cm.precision(0) - 1.0).abs() < 1e-12);
    assert!((cm.recall(0) - 0.5).abs() < 1e-12);
    assert!((cm.macro_precision() - (1.0 + 2.0 / 3.0) / 2.0).abs() < 1e-12);
    assert!((cm.macro_recall() - 0.75).abs() < 1e-12);
}

#[test]
fn confusion_matrix_includes_predicted_only_labels() {
    let y_true = vec![0, 0, 0];
    let y_pred = vec![0, 1, 0];
    let cm = ConfusionMatrix::from_labels(&y_true, &y_pred).unwrap();

    assert_eq!(cm.labels(), &[0, 1]);
    let normalized = cm.normalized();
    // class 1 never occurs as a true label
    assert_eq!(normalized.row(1).to_vec(), vec![0.0, 0.0]);
    assert!((normalized.row(0).sum() - 1.0).abs() < 1e-12);
}

#[test]
fn confusion_matrix_rejects_bad_input() {
    assert!(ConfusionMatrix::from_labels(&[], &[]).is_err());
    assert!(ConfusionMatrix::from_labels(&[0, 1], &[0]).is_err());
}

// ---------------------------------------------------------------------------
// ROC / AUC
// ---------------------------------------------------------------------------

#[test]
fn roc_curve_is_monotonic_and_bounded() {
    let labels = vec![true, false, true, true, false, false, true, false];
    let scores = vec![0.9, 0.8, 0.7, 0.6, 0.55, 0.4, 0.3, 0.1];
    let curve = roc_curve(&labels, &scores).unwrap();

    let pairs = curve.pairs();
    assert_eq!(pairs.first(), Some(&(0.0, 0.0)));
    assert_eq!(pairs.last(), Some(&(1.0, 1.0)));
    for w in pairs.windows(2) {
        assert!(w[1].0 >= w[0].0);
        assert!(w[1].1 >= w[0].1);
    }
    for w in curve.points.windows(2) {
        assert!(w[1].threshold < w[0].threshold);
    }
    assert!(curve.auc >= 0.0 && curve.auc <= 1.0);
    // 11 of the 16 positive/negative pairs are ranked correctly
    assert!((curve.auc - 11.0 / 16.0).abs() < 1e-12);
}

#[test]
fn roc_curve_inverted_scores_give_zero_auc() {
    let labels = vec![false, false, true, true];
    let scores = vec![0.9, 0.8, 0.2, 0.1];
    let curve = roc_curve(&labels, &scores).unwrap();
    assert!(curve.auc.abs() < 1e-12);
}

#[test]
fn roc_curve_requires_both_classes() {
    assert!(roc_curve(&[true, true], &[0.1, 0.2]).is_err());
    assert!(roc_curve(&[false], &[0.1]).is_err());
    assert!(roc_curve(&[true, false], &[0.1]).is_err());
}

#[test]
fn auc_of_decreasing_x_is_positive() {
    let area = auc(&[1.0, 0.5, 0.0], &[1.0, 1.0, 1.0]).unwrap();
    assert!((area - 1.0).abs() < 1e-12);
}

// ---------------------------------------------------------------------------
// Small helpers
// ---------------------------------------------------------------------------

#[test]
fn accuracy_mean_and_rounding() {
    assert!((accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]).unwrap() - 0.75).abs() < 1e-12);
    assert!(accuracy(&[], &[]).is_err());
    assert_eq!(mean(&[0.5, 1.0]), Some(0.75));
    assert_eq!(mean(&[]), None);
    assert_eq!(round_to(0.666_666, 2), 0.67);
    assert_eq!(round_to(0.125, 0), 0.0);
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

#[test]
fn model_config_default_is_logistic() {
    let cfg = ModelConfig::default();
    match cfg.model_type {
        ModelType::Logistic {
            alpha,
            max_iterations,
            gradient_tolerance,
            fit_intercept,
        } => {
            assert_eq!(alpha, 1.0);
            assert_eq!(max_iterations, 100);
            assert_eq!(gradient_tolerance, 1e-4);
            assert!(fit_intercept);
        }
    }
}

#[test]
fn model_type_from_str() {
    assert_eq!(ModelType::from_str("logistic").unwrap(), ModelType::default());
    assert_eq!(ModelType::from_str("LogReg").unwrap(), ModelType::default());
    assert!(ModelType::from_str("xgboost").is_err());
}

#[test]
fn encoding_mode_from_str() {
    assert_eq!(EncodingMode::from_str("shared").unwrap(), EncodingMode::Shared);
    assert_eq!(EncodingMode::from_str("per_split").unwrap(), EncodingMode::PerSplit);
    assert_eq!(EncodingMode::from_str("Per-Split").unwrap(), EncodingMode::PerSplit);
    assert!(EncodingMode::from_str("column").is_err());
    assert_eq!(EncodingMode::default(), EncodingMode::Shared);
}

#[test]
fn session_config_defaults() {
    let cfg = SessionConfig::default();
    assert_eq!(cfg.model, ModelConfig::default());
    assert_eq!(cfg.encoding, EncodingMode::Shared);
    assert_eq!(cfg.roc_test_size, 0.33);
    assert_eq!(cfg.roc_seed, 0);
    assert_eq!(cfg.score_decimals, 2);
}

#[test]
fn session_config_serde_round_trip() {
    let cfg = SessionConfig {
        encoding: EncodingMode::PerSplit,
        roc_seed: 7,
        ..SessionConfig::default()
    };
    let json = serde_json::to_string(&cfg).unwrap();
    assert!(json.contains("\"per_split\""));
    let back: SessionConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn session_config_partial_json_uses_defaults() {
    let cfg: SessionConfig = serde_json::from_str(r#"{"roc_test_size": 0.25}"#).unwrap();
    assert_eq!(cfg.roc_test_size, 0.25);
    assert_eq!(cfg.encoding, EncodingMode::Shared);
    assert_eq!(cfg.model, ModelConfig::default());
}

#[test]
fn load_session_config_reads_json_file() {
    let path = std::env::temp_dir().join(format!(
        "tabular_classifier_config_{}.json",
        std::process::id()
    ));
    std::fs::write(
        &path,
        r#"{
            "model": {"Logistic": {"alpha": 0.5, "max_iterations": 50, "gradient_tolerance": 0.001, "fit_intercept": false}},
            "encoding": "per_split",
            "score_decimals": 3
        }"#,
    )
    .unwrap();

    let cfg = load_session_config(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.encoding, EncodingMode::PerSplit);
    assert_eq!(cfg.score_decimals, 3);
    assert_eq!(cfg.roc_seed, 0);
    assert_eq!(
        cfg.model.model_type,
        ModelType::Logistic {
            alpha: 0.5,
            max_iterations: 50,
            gradient_tolerance: 0.001,
            fit_intercept: false,
        }
    );
}

#[test]
fn load_session_config_missing_file_fails() {
    let path = std::env::temp_dir().join("tabular_classifier_does_not_exist.json");
    assert!(load_session_config(path).is_err());
}
