use anyhow::Result;
use ndarray::{Array1, Array2};

use crate::stats::accuracy;

/// A small trait abstraction for the classifier models used by the session.
///
/// Targets are class indices (`0..k-1` into the session's class labels). A
/// fitted model only knows the classes present in its training targets; those
/// are reported by `classes` and order the columns of `predict_proba`.
pub trait ClassifierModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<usize>) -> Result<()>;

    /// Predict one class index per row.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>>;

    /// Class probabilities, shape (n_samples, n_classes), columns ordered as `classes`.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Classes seen during `fit`, sorted.
    fn classes(&self) -> &[usize];

    /// Mean accuracy of `predict` on `(x, y)`.
    fn score(&self, x: &Array2<f64>, y: &Array1<usize>) -> Result<f64> {
        let predicted = self.predict(x)?;
        accuracy(&y.to_vec(), &predicted.to_vec())
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
