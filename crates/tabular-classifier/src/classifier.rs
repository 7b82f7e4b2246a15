//! Classifier session over train/test/validation tables.
//!
//! A `ClassifierSession` encodes the three tables once when it is built and
//! then runs classification passes: fit the primary model on the train split,
//! score every split, and derive a confusion matrix and per-class ROC curves
//! from the test split.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use ndarray::{concatenate, Array1, Array2, Axis};

use crate::config::SessionConfig;
use crate::data_handling::{label_binarize, train_test_split, FeatureTable, Split, Value};
use crate::error::ClassifierError;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::factory::build_model;
use crate::models::one_vs_rest::OneVsRestClassifier;
use crate::preprocessing::{ClassLabels, EncoderSet, PreparedSplit, TableNormalizer};
use crate::stats::{mean, roc_curve, round_to, ConfusionMatrix, RocCurve};

/// Scores of one classification pass.
#[derive(Debug, Clone)]
pub struct EvaluationResults {
    /// Train accuracy, rounded to the configured decimals.
    pub accuracy_train: f64,
    /// Test accuracy, rounded to the configured decimals.
    pub accuracy: f64,
    /// Accuracy on the union of the train and test splits, unrounded.
    pub accuracy_traintest: f64,
    /// Validation accuracy, rounded to the configured decimals.
    pub accuracy_validation: f64,
    /// Macro-averaged precision on the test split.
    pub precision: f64,
    /// Macro-averaged recall on the test split.
    pub recall: f64,
    /// Predicted class of every test row.
    pub predicted: Vec<Value>,
    /// Test-split class probabilities, columns ordered as `proba_classes`.
    pub proba: Array2<f64>,
    pub proba_classes: Vec<Value>,
    pub confusion_matrix: ConfusionMatrix,
    /// Class of each confusion matrix row/column.
    pub confusion_labels: Vec<Value>,
    pub cm_normalized: Array2<f64>,
    pub roc_curves: BTreeMap<Value, RocCurve>,
    /// Classes whose ROC partition held only positives or only negatives; no curve is stored for them.
    pub roc_undefined: Vec<Value>,
}

impl EvaluationResults {
    /// Area under the ROC curve per class.
    pub fn auc(&self) -> BTreeMap<Value, f64> {
        self.roc_curves
            .iter()
            .map(|(label, curve)| (label.clone(), curve.auc))
            .collect()
    }

    pub fn roc_curve(&self, label: &Value) -> Option<&RocCurve> {
        self.roc_curves.get(label)
    }
}

/// Output of the ROC pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RocCurves {
    pub curves: BTreeMap<Value, RocCurve>,
    /// Classes without a curve because their partition held a single outcome.
    pub undefined: Vec<Value>,
}

/// Means of scores collected over several runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AverageScores {
    pub accuracy: f64,
    pub accuracy_train: f64,
    pub precision: f64,
    pub recall: f64,
}

pub struct ClassifierSession {
    filename: PathBuf,
    class_name: String,
    config: SessionConfig,
    class_labels: ClassLabels,
    encoders: EncoderSet,
    train: PreparedSplit,
    test: PreparedSplit,
    validation: PreparedSplit,
    clf: Box<dyn ClassifierModel>,
    clf_roc: OneVsRestClassifier,
    results: Option<EvaluationResults>,
    averages: Option<AverageScores>,
}

impl ClassifierSession {
    /// Create a session with the default `SessionConfig`.
    ///
    /// # Arguments
    ///
    /// * `filename` - Source of the data; kept for reference, never read
    /// * `class_name` - Name of the class label column
    /// * `train`, `test`, `validation` - The three input tables
    pub fn new<P: AsRef<Path>>(
        filename: P,
        class_name: &str,
        train: &FeatureTable,
        test: &FeatureTable,
        validation: &FeatureTable,
    ) -> Result<Self> {
        Self::with_config(
            filename,
            class_name,
            train,
            test,
            validation,
            SessionConfig::default(),
        )
    }

    pub fn with_config<P: AsRef<Path>>(
        filename: P,
        class_name: &str,
        train: &FeatureTable,
        test: &FeatureTable,
        validation: &FeatureTable,
        config: SessionConfig,
    ) -> Result<Self> {
        let normalizer = TableNormalizer::new(class_name, config.encoding);
        let normalized = normalizer
            .normalize(train, test, validation)
            .context("Failed to encode input tables")?;

        let session = ClassifierSession {
            filename: filename.as_ref().to_path_buf(),
            class_name: class_name.to_string(),
            clf: build_model(config.model.clone()),
            clf_roc: OneVsRestClassifier::new(config.model.clone()),
            config,
            class_labels: normalized.class_labels,
            encoders: normalized.encoders,
            train: normalized.train,
            test: normalized.test,
            validation: normalized.validation,
            results: None,
            averages: None,
        };
        session.log_input_data_summary();
        Ok(session)
    }

    pub fn log_input_data_summary(&self) {
        log::info!("----- Input Data Summary -----");
        log::info!(
            "Info: {} train, {} test and {} validation rows ({:?} encoding)",
            self.train.table.nrows(),
            self.test.table.nrows(),
            self.validation.table.nrows(),
            self.encoders.mode()
        );
        for (idx, label) in self.class_labels.labels().iter().enumerate() {
            log::info!(
                "Info: class '{}' has {} train rows",
                label,
                self.train.targets.iter().filter(|&&t| t == idx).count()
            );
        }
        log::info!("-------------------------------");
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn class_labels(&self) -> &ClassLabels {
        &self.class_labels
    }

    pub fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }

    pub fn prepared(&self, split: Split) -> &PreparedSplit {
        match split {
            Split::Train => &self.train,
            Split::Test => &self.test,
            Split::Validation => &self.validation,
        }
    }

    /// The primary model; unfitted until `classify` has run.
    pub fn model(&self) -> &dyn ClassifierModel {
        self.clf.as_ref()
    }

    /// The one-vs-rest model behind the ROC curves of the last pass.
    pub fn roc_model(&self) -> &OneVsRestClassifier {
        &self.clf_roc
    }

    pub fn results(&self) -> Option<&EvaluationResults> {
        self.results.as_ref()
    }

    pub fn averages(&self) -> Option<&AverageScores> {
        self.averages.as_ref()
    }

    /// Fit the primary model on the train split and score every split.
    ///
    /// # Arguments
    ///
    /// * `feature_names` - Ordered feature columns; must exist in every split and
    ///   must not include the class column
    ///
    /// # Returns
    ///
    /// The results of this pass, also kept on the session
    pub fn classify(&mut self, feature_names: &[&str]) -> Result<&EvaluationResults> {
        self.validate_features(feature_names)?;

        let (x_train, y_train) = self.train.x_y(feature_names)?;
        let (x_test, y_test) = self.test.x_y(feature_names)?;
        let (x_validation, y_validation) = self.validation.x_y(feature_names)?;
        let x_traintest = concatenate(Axis(0), &[x_train.view(), x_test.view()])
            .context("Failed to stack train and test features")?;
        let y_traintest = concatenate(Axis(0), &[y_train.view(), y_test.view()])
            .context("Failed to stack train and test targets")?;

        log::debug!(
            "Classifying with {} features: {:?}",
            feature_names.len(),
            feature_names
        );

        let mut clf = build_model(self.config.model.clone());
        clf.fit(&x_train, &y_train)
            .with_context(|| format!("Failed to fit {} on the train split", clf.name()))?;

        let accuracy_train = clf.score(&x_train, &y_train)?;
        let accuracy_test = clf.score(&x_test, &y_test)?;
        let accuracy_traintest = clf.score(&x_traintest, &y_traintest)?;
        let accuracy_validation = clf.score(&x_validation, &y_validation)?;
        log::debug!(
            "Accuracy: train {:.4}, test {:.4}, train+test {:.4}, validation {:.4}",
            accuracy_train,
            accuracy_test,
            accuracy_traintest,
            accuracy_validation
        );

        let predicted = clf.predict(&x_test)?;
        let proba = clf.predict_proba(&x_test)?;
        let proba_classes = self.labels_of(clf.classes());

        let confusion_matrix = self.init_confusion_matrix(&y_test, &predicted)?;
        let cm_normalized = confusion_matrix.normalized();
        let (clf_roc, roc) = self.fit_roc(&x_test, &y_test)?;

        let decimals = self.config.score_decimals;
        let results = EvaluationResults {
            accuracy_train: round_to(accuracy_train, decimals),
            accuracy: round_to(accuracy_test, decimals),
            accuracy_traintest,
            accuracy_validation: round_to(accuracy_validation, decimals),
            precision: confusion_matrix.macro_precision(),
            recall: confusion_matrix.macro_recall(),
            predicted: self.labels_of(&predicted.to_vec()),
            proba,
            proba_classes,
            confusion_labels: self.labels_of(confusion_matrix.labels()),
            confusion_matrix,
            cm_normalized,
            roc_curves: roc.curves,
            roc_undefined: roc.undefined,
        };
        log::info!(
            "Accuracy train {} / test {} / validation {}; precision {:.3}, recall {:.3}",
            results.accuracy_train,
            results.accuracy,
            results.accuracy_validation,
            results.precision,
            results.recall
        );

        self.clf = clf;
        self.clf_roc = clf_roc;
        Ok(self.results.insert(results))
    }

    /// Per-class ROC curves from a one-vs-rest model fit on a seeded resplit of `(x, y)`.
    ///
    /// The classes present in `y` are one-hot encoded, `(x, y_bin)` is split
    /// into internal train/test partitions, and the curve of each class is
    /// computed on the internal test partition. Curves are keyed by class label.
    /// A class whose internal test column holds a single outcome has no curve;
    /// it is logged and listed in `RocCurves::undefined`.
    pub fn get_roc_curve(&mut self, x: &Array2<f64>, y: &Array1<usize>) -> Result<RocCurves> {
        let (clf_roc, roc) = self.fit_roc(x, y)?;
        self.clf_roc = clf_roc;
        Ok(roc)
    }

    fn fit_roc(
        &self,
        x: &Array2<f64>,
        y: &Array1<usize>,
    ) -> Result<(OneVsRestClassifier, RocCurves)> {
        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        let y_bin = label_binarize(y, &classes);

        let (train_idx, test_idx) =
            train_test_split(x.nrows(), self.config.roc_test_size, self.config.roc_seed)?;
        let x_train = x.select(Axis(0), &train_idx);
        let x_test = x.select(Axis(0), &test_idx);
        let y_train = y_bin.select(Axis(0), &train_idx);
        let y_test = y_bin.select(Axis(0), &test_idx);

        let mut clf_roc = OneVsRestClassifier::new(self.config.model.clone());
        clf_roc
            .fit_binarized(&x_train, &y_train)
            .context("Failed to fit the one-vs-rest ROC model")?;
        let y_score = clf_roc.decision_proba(&x_test)?;

        let mut roc = RocCurves::default();
        for (j, &class_idx) in classes.iter().enumerate() {
            let Some(label) = self.class_labels.get(class_idx).cloned() else {
                bail!("Class index {} has no label", class_idx);
            };
            let truth: Vec<bool> = y_test.column(j).iter().map(|&v| v == 1).collect();
            let positives = truth.iter().filter(|&&t| t).count();
            if positives == 0 || positives == truth.len() {
                log::warn!(
                    "{} ({} of {} rows positive); its curve is left undefined",
                    ClassifierError::DegenerateRoc {
                        class: label.to_string()
                    },
                    positives,
                    truth.len()
                );
                roc.undefined.push(label);
                continue;
            }
            let curve = roc_curve(&truth, &y_score.column(j).to_vec())
                .with_context(|| format!("Failed to compute ROC curve for class '{}'", label))?;
            log::trace!(
                "ROC for class '{}': {} points, auc {:.4}",
                label,
                curve.points.len(),
                curve.auc
            );
            roc.curves.insert(label, curve);
        }
        Ok((clf_roc, roc))
    }

    /// Confusion matrix of the true vs predicted test labels.
    pub fn init_confusion_matrix(
        &self,
        y_true: &Array1<usize>,
        y_pred: &Array1<usize>,
    ) -> Result<ConfusionMatrix> {
        ConfusionMatrix::from_labels(&y_true.to_vec(), &y_pred.to_vec())
    }

    /// Store the means of per-run score lists.
    pub fn set_average_scores(
        &mut self,
        accuracy: &[f64],
        accuracy_train: &[f64],
        precision: &[f64],
        recall: &[f64],
    ) -> Result<&AverageScores> {
        let average = |name: &str, scores: &[f64]| {
            Self::get_average(scores)
                .with_context(|| format!("Cannot average an empty list of {} scores", name))
        };
        let scores = AverageScores {
            accuracy: average("accuracy", accuracy)?,
            accuracy_train: average("train accuracy", accuracy_train)?,
            precision: average("precision", precision)?,
            recall: average("recall", recall)?,
        };
        Ok(self.averages.insert(scores))
    }

    pub fn get_average(scores: &[f64]) -> Option<f64> {
        mean(scores)
    }

    fn validate_features(&self, feature_names: &[&str]) -> Result<(), ClassifierError> {
        if feature_names.is_empty() {
            return Err(ClassifierError::InvalidFeatures(
                "at least one feature column is required".to_string(),
            ));
        }
        if feature_names.contains(&self.class_name.as_str()) {
            return Err(ClassifierError::InvalidFeatures(format!(
                "the class column '{}' cannot be used as a feature",
                self.class_name
            )));
        }
        for split in Split::ALL {
            let table = &self.prepared(split).table;
            for name in feature_names {
                if table.column(name).is_none() {
                    return Err(ClassifierError::MissingColumn {
                        split: Some(split),
                        column: name.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn labels_of(&self, indices: &[usize]) -> Vec<Value> {
        indices
            .iter()
            .filter_map(|&i| self.class_labels.get(i).cloned())
            .collect()
    }
}
