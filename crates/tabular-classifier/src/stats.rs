//! Classification metrics: accuracy, confusion matrix, ROC curve and AUC.
use anyhow::{bail, Result};
use ndarray::{Array1, Array2, Axis};

/// Fraction of positions where `y_pred` equals `y_true`.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> Result<f64> {
    if y_true.is_empty() {
        bail!("Cannot compute accuracy of an empty label vector");
    }
    if y_true.len() != y_pred.len() {
        bail!(
            "Label vectors must have equal lengths ({} != {})",
            y_true.len(),
            y_pred.len()
        );
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Round `value` to `decimals` decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

/// Row-major confusion matrix.
///
/// Entry `(i, j)` counts samples whose true class is `labels[i]` and predicted
/// class is `labels[j]`. `labels` is the sorted union of the classes seen in
/// either label vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    labels: Vec<usize>,
    counts: Array2<usize>,
}

impl ConfusionMatrix {
    pub fn from_labels(y_true: &[usize], y_pred: &[usize]) -> Result<Self> {
        if y_true.is_empty() {
            bail!("Cannot build a confusion matrix from empty label vectors");
        }
        if y_true.len() != y_pred.len() {
            bail!(
                "Label vectors must have equal lengths ({} != {})",
                y_true.len(),
                y_pred.len()
            );
        }

        let mut labels: Vec<usize> = y_true.iter().chain(y_pred).copied().collect();
        labels.sort_unstable();
        labels.dedup();

        let n = labels.len();
        let mut counts = Array2::zeros((n, n));
        for (t, p) in y_true.iter().zip(y_pred) {
            // both are present by construction
            if let (Ok(i), Ok(j)) = (labels.binary_search(t), labels.binary_search(p)) {
                counts[(i, j)] += 1;
            }
        }

        Ok(Self { labels, counts })
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn counts(&self) -> &Array2<usize> {
        &self.counts
    }

    /// Number of true instances per class.
    pub fn row_sums(&self) -> Array1<usize> {
        self.counts.sum_axis(Axis(1))
    }

    pub fn total(&self) -> usize {
        self.counts.sum()
    }

    /// Each row divided by its row sum.
    ///
    /// A class with no true instances has nothing to normalize by; its row is
    /// left as zeros.
    pub fn normalized(&self) -> Array2<f64> {
        let mut out = self.counts.mapv(|c| c as f64);
        for (i, mut row) in out.axis_iter_mut(Axis(0)).enumerate() {
            let sum = row.sum();
            if sum > 0.0 {
                row.mapv_inplace(|v| v / sum);
            } else {
                log::warn!(
                    "Class index {} has no true instances; its normalized row is left at zero",
                    self.labels[i]
                );
            }
        }
        out
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.counts.diag().sum() as f64 / total as f64
    }

    /// Precision of row/column `i`: `TP / (TP + FP)`, 0.0 when nothing was predicted as `i`.
    pub fn precision(&self, i: usize) -> f64 {
        let predicted = self.counts.column(i).sum();
        if predicted == 0 {
            0.0
        } else {
            self.counts[(i, i)] as f64 / predicted as f64
        }
    }

    /// Recall of row/column `i`: `TP / (TP + FN)`, 0.0 when `i` has no true instances.
    pub fn recall(&self, i: usize) -> f64 {
        let actual = self.counts.row(i).sum();
        if actual == 0 {
            0.0
        } else {
            self.counts[(i, i)] as f64 / actual as f64
        }
    }

    pub fn macro_precision(&self) -> f64 {
        let n = self.labels.len();
        (0..n).map(|i| self.precision(i)).sum::<f64>() / n as f64
    }

    pub fn macro_recall(&self) -> f64 {
        let n = self.labels.len();
        (0..n).map(|i| self.recall(i)).sum::<f64>() / n as f64
    }
}

/// A single point on a ROC curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RocPoint {
    pub fpr: f64,
    pub tpr: f64,
    /// Score at or above which samples are called positive.
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RocCurve {
    pub points: Vec<RocPoint>,
    pub auc: f64,
}

impl RocCurve {
    /// The curve as ordered `(fpr, tpr)` pairs.
    pub fn pairs(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(|p| (p.fpr, p.tpr)).collect()
    }
}

/// ROC curve over every distinct score threshold.
///
/// Scores are swept from highest to lowest; the curve starts at `(0, 0)` with an
/// infinite threshold and gains one point per distinct score. Both classes
/// must be present in `labels`.
pub fn roc_curve(labels: &[bool], scores: &[f64]) -> Result<RocCurve> {
    if labels.len() != scores.len() {
        bail!(
            "Labels and scores must have equal lengths ({} != {})",
            labels.len(),
            scores.len()
        );
    }
    let n_pos = labels.iter().filter(|&&l| l).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        bail!(
            "ROC curve needs both positive and negative samples ({} positive, {} negative)",
            n_pos,
            n_neg
        );
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut points = Vec::with_capacity(scores.len() + 1);
    points.push(RocPoint {
        fpr: 0.0,
        tpr: 0.0,
        threshold: f64::INFINITY,
    });

    let mut tps = 0usize;
    let mut fps = 0usize;
    for (k, &idx) in order.iter().enumerate() {
        if labels[idx] {
            tps += 1;
        } else {
            fps += 1;
        }
        let last_of_threshold = order
            .get(k + 1)
            .map_or(true, |&next| scores[next] != scores[idx]);
        if last_of_threshold {
            points.push(RocPoint {
                fpr: fps as f64 / n_neg as f64,
                tpr: tps as f64 / n_pos as f64,
                threshold: scores[idx],
            });
        }
    }

    let fpr: Vec<f64> = points.iter().map(|p| p.fpr).collect();
    let tpr: Vec<f64> = points.iter().map(|p| p.tpr).collect();
    let auc = auc(&fpr, &tpr)?;

    Ok(RocCurve { points, auc })
}

/// Area under a curve by the trapezoidal rule; `x` must be monotonic.
pub fn auc(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() {
        bail!("x and y must have equal lengths ({} != {})", x.len(), y.len());
    }
    if x.len() < 2 {
        bail!("At least 2 points are needed to compute an area under a curve");
    }
    let increasing = x.windows(2).all(|w| w[1] >= w[0]);
    let decreasing = x.windows(2).all(|w| w[1] <= w[0]);
    if !increasing && !decreasing {
        bail!("x is neither increasing nor decreasing");
    }

    let area: f64 = x
        .windows(2)
        .zip(y.windows(2))
        .map(|(xw, yw)| (xw[1] - xw[0]) * (yw[0] + yw[1]) / 2.0)
        .sum();
    Ok(if decreasing && !increasing { -area } else { area })
}
