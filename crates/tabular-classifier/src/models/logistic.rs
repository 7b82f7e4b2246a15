use anyhow::{bail, Context, Result};
use linfa::traits::{Fit, Predict};
use linfa::DatasetBase;
use linfa_logistic::{MultiFittedLogisticRegression, MultiLogisticRegression};
use ndarray::{Array1, Array2};

use crate::config::{ModelConfig, ModelType};
use crate::models::classifier_trait::ClassifierModel;

/// Multinomial logistic regression classifier
pub struct LogisticClassifier {
    model: Option<MultiFittedLogisticRegression<f64, usize>>,
    classes: Vec<usize>,
    params: ModelConfig,
}

impl LogisticClassifier {
    pub fn new(params: ModelConfig) -> Self {
        LogisticClassifier {
            model: None,
            classes: Vec::new(),
            params,
        }
    }

    fn fitted(&self) -> Result<&MultiFittedLogisticRegression<f64, usize>> {
        match self.model.as_ref() {
            Some(model) => Ok(model),
            None => bail!("LogisticClassifier used before fit"),
        }
    }
}

impl ClassifierModel for LogisticClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>) -> Result<()> {
        if x.nrows() != y.len() {
            bail!(
                "Feature matrix has {} rows but {} targets were given",
                x.nrows(),
                y.len()
            );
        }

        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            bail!(
                "Logistic regression needs at least two classes in the targets, found {:?}",
                classes
            );
        }

        let ModelType::Logistic {
            alpha,
            max_iterations,
            gradient_tolerance,
            fit_intercept,
        } = &self.params.model_type;

        log::trace!(
            "Fitting logistic regression on {} samples x {} features, {} classes (alpha={}, max_iterations={})",
            x.nrows(),
            x.ncols(),
            classes.len(),
            alpha,
            max_iterations
        );

        let dataset = DatasetBase::new(x.to_owned(), y.to_owned());
        let model = MultiLogisticRegression::default()
            .alpha(*alpha)
            .max_iterations(*max_iterations)
            .gradient_tolerance(*gradient_tolerance)
            .with_intercept(*fit_intercept)
            .fit(&dataset)
            .context("Failed to fit logistic regression")?;

        self.classes = model.classes().to_vec();
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        Ok(self.fitted()?.predict(x))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        Ok(self.fitted()?.predict_probabilities(x))
    }

    fn classes(&self) -> &[usize] {
        &self.classes
    }

    fn name(&self) -> &str {
        "logistic_regression"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Array2<f64>, Array1<usize>) {
        let x = Array2::from_shape_vec(
            (8, 2),
            vec![
                -2.0, 0.0, -1.8, 1.0, -2.2, 2.0, -1.5, 0.0, 1.5, 1.0, 2.0, 2.0, 1.8, 0.0, 2.2,
                1.0,
            ],
        )
        .unwrap();
        let y = Array1::from_vec(vec![0, 0, 0, 0, 1, 1, 1, 1]);
        (x, y)
    }

    #[test]
    fn test_logistic_classifier_separates() {
        let (x, y) = separable();
        let mut classifier = LogisticClassifier::new(ModelConfig::default());
        classifier.fit(&x, &y).unwrap();

        assert_eq!(classifier.classes(), &[0, 1]);
        assert_eq!(classifier.predict(&x).unwrap(), y);
        assert!((classifier.score(&x, &y).unwrap() - 1.0).abs() < 1e-12);

        let proba = classifier.predict_proba(&x).unwrap();
        assert_eq!(proba.shape(), &[8, 2]);
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_logistic_classifier_single_class_fails() {
        let (x, _) = separable();
        let y = Array1::from_elem(8, 1usize);
        let mut classifier = LogisticClassifier::new(ModelConfig::default());
        assert!(classifier.fit(&x, &y).is_err());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let (x, _) = separable();
        let classifier = LogisticClassifier::new(ModelConfig::default());
        assert!(classifier.predict(&x).is_err());
    }
}
