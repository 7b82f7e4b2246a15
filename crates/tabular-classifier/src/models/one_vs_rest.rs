//! One-vs-rest wrapper: one binary model per indicator column.
//!
//! `fit_binarized` takes an already one-hot encoded target matrix and
//! `decision_proba` returns the positive-class probability of every column,
//! which is what the ROC pass consumes. The `ClassifierModel` impl binarizes
//! plain class targets itself and normalizes the per-class probabilities.
use anyhow::{bail, Context, Result};
use ndarray::{Array1, Array2, Axis};

use crate::config::ModelConfig;
use crate::data_handling::label_binarize;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::factory::build_model;

enum Estimator {
    Fitted(Box<dyn ClassifierModel>),
    /// Indicator column that held a single value during fit.
    Constant(f64),
}

pub struct OneVsRestClassifier {
    params: ModelConfig,
    estimators: Vec<Estimator>,
    classes: Vec<usize>,
}

impl OneVsRestClassifier {
    pub fn new(params: ModelConfig) -> Self {
        OneVsRestClassifier {
            params,
            estimators: Vec::new(),
            classes: Vec::new(),
        }
    }

    pub fn n_estimators(&self) -> usize {
        self.estimators.len()
    }

    /// Fit one binary model per column of the 0/1 indicator matrix `y_bin`.
    pub fn fit_binarized(&mut self, x: &Array2<f64>, y_bin: &Array2<usize>) -> Result<()> {
        if x.nrows() != y_bin.nrows() {
            bail!(
                "Feature matrix has {} rows but the indicator matrix has {}",
                x.nrows(),
                y_bin.nrows()
            );
        }

        let mut estimators = Vec::with_capacity(y_bin.ncols());
        for (j, column) in y_bin.axis_iter(Axis(1)).enumerate() {
            let column = column.to_owned();
            let positives = column.iter().filter(|&&v| v == 1).count();
            if positives == 0 || positives == column.len() {
                log::warn!(
                    "Indicator column {} is constant ({} of {} positive); predicting it as a constant",
                    j,
                    positives,
                    column.len()
                );
                estimators.push(Estimator::Constant(if positives == 0 { 0.0 } else { 1.0 }));
                continue;
            }
            let mut model = build_model(self.params.clone());
            model
                .fit(x, &column)
                .with_context(|| format!("Failed to fit one-vs-rest model for column {}", j))?;
            estimators.push(Estimator::Fitted(model));
        }

        self.estimators = estimators;
        Ok(())
    }

    /// Positive-class probability per indicator column, shape (n_samples, n_columns).
    pub fn decision_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.estimators.is_empty() {
            bail!("OneVsRestClassifier used before fit");
        }
        let mut out = Array2::zeros((x.nrows(), self.estimators.len()));
        for (j, estimator) in self.estimators.iter().enumerate() {
            match estimator {
                Estimator::Constant(p) => out.column_mut(j).fill(*p),
                Estimator::Fitted(model) => {
                    let proba = model.predict_proba(x)?;
                    let Some(pos) = model.classes().iter().position(|&c| c == 1) else {
                        bail!("One-vs-rest model for column {} never saw the positive class", j);
                    };
                    out.column_mut(j).assign(&proba.column(pos));
                }
            }
        }
        Ok(out)
    }
}

impl ClassifierModel for OneVsRestClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>) -> Result<()> {
        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        let y_bin = label_binarize(y, &classes);
        self.fit_binarized(x, &y_bin)?;
        self.classes = classes;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        let scores = self.decision_proba(x)?;
        Ok(scores
            .rows()
            .into_iter()
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |acc, (j, &p)| if p > acc.1 { (j, p) } else { acc })
                    .0;
                self.classes.get(best).copied().unwrap_or(best)
            })
            .collect())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let mut scores = self.decision_proba(x)?;
        for mut row in scores.axis_iter_mut(Axis(0)) {
            let sum = row.sum();
            if sum > 0.0 {
                row.mapv_inplace(|p| p / sum);
            }
        }
        Ok(scores)
    }

    fn classes(&self) -> &[usize] {
        &self.classes
    }

    fn name(&self) -> &str {
        "one_vs_rest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_blobs() -> (Array2<f64>, Array1<usize>) {
        let mut data = Vec::new();
        let mut y = Vec::new();
        let centers = [(-3.0, 0.0), (3.0, 0.0), (0.0, 4.0)];
        for (class, (cx, cy)) in centers.iter().enumerate() {
            for k in 0..6 {
                let offset = (k as f64 - 2.5) * 0.1;
                data.push(cx + offset);
                data.push(cy - offset);
                y.push(class);
            }
        }
        (
            Array2::from_shape_vec((18, 2), data).unwrap(),
            Array1::from_vec(y),
        )
    }

    #[test]
    fn test_one_vs_rest_fits_each_class() {
        let (x, y) = three_blobs();
        let mut ovr = OneVsRestClassifier::new(ModelConfig::default());
        ovr.fit(&x, &y).unwrap();

        assert_eq!(ovr.n_estimators(), 3);
        assert_eq!(ovr.classes(), &[0, 1, 2]);
        assert_eq!(ovr.predict(&x).unwrap(), y);

        let proba = ovr.predict_proba(&x).unwrap();
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_constant_column_is_predicted_as_constant() {
        let (x, y) = three_blobs();
        let mut y_bin = label_binarize(&y, &[0, 1, 2]);
        y_bin.column_mut(2).fill(0);

        let mut ovr = OneVsRestClassifier::new(ModelConfig::default());
        ovr.fit_binarized(&x, &y_bin).unwrap();
        let scores = ovr.decision_proba(&x).unwrap();
        assert!(scores.column(2).iter().all(|&p| p == 0.0));
        assert!(scores.column(0).iter().all(|&p| (0.0..=1.0).contains(&p)));
    }
}
