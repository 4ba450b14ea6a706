use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Categorical cross-entropy over softmax probabilities.
pub struct CrossEntropyLoss;

/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-12;

/// Numerically stable softmax of one row of logits.
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Reads a class label stored as an `f64` and checks it is a valid index.
fn class_index(label: f64, num_classes: usize) -> Result<usize> {
    if label.fract() != 0.0 || label < 0.0 || label >= num_classes as f64 {
        return Err(Error::InvalidLabel { label, num_classes });
    }
    Ok(label as usize)
}

fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

impl CrossEntropyLoss {
    /// Computes the scalar cross-entropy loss:
    ///   L = -sum(expected[i] * log(predicted[i] + eps))
    ///
    /// `predicted` — softmax probabilities, shape [n_classes]
    /// `expected`  — one-hot (or soft) target distribution, shape [n_classes]
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| -e * (p + EPS).ln())
            .sum()
    }

    /// Gradient of the combined Softmax + cross-entropy w.r.t. the logits:
    ///   ∂L/∂z_i = predicted[i] - expected[i]
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted.iter().zip(expected.iter())
            .map(|(p, e)| p - e)
            .collect()
    }

    /// Row-weighted softmax cross-entropy over a batch of logits.
    ///
    /// `labels` is a `rows × 1` matrix of class indices. Returns the loss,
    /// its gradient with respect to `logits`, and the (unweighted)
    /// accuracy.
    pub fn batch(logits: &Matrix, labels: &Matrix, weights: &[f64]) -> Result<(f64, Matrix, f64)> {
        let num_classes = logits.cols;
        if labels.rows != logits.rows || labels.cols != 1 {
            return Err(Error::ShapeMismatch {
                op: "cross_entropy",
                expected: (logits.rows, 1),
                got: labels.shape(),
            });
        }
        let rows = logits.rows as f64;
        let mut loss = 0.0;
        let mut correct = 0usize;
        let mut grad = Vec::with_capacity(logits.rows);
        for ((z, label), w) in logits.data.iter().zip(labels.data.iter()).zip(weights.iter()) {
            let class = class_index(label[0], num_classes)?;
            let probs = softmax(z);
            let mut one_hot = vec![0.0; num_classes];
            one_hot[class] = 1.0;

            loss += w * CrossEntropyLoss::loss(&probs, &one_hot) / rows;
            if argmax(&probs) == class {
                correct += 1;
            }
            grad.push(
                CrossEntropyLoss::derivative(&probs, &one_hot)
                    .into_iter()
                    .map(|g| w * g / rows)
                    .collect(),
            );
        }
        let grad = Matrix { rows: logits.rows, cols: num_classes, data: grad };
        Ok((loss, grad, correct as f64 / rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn softmax_is_a_distribution() {
        let p = softmax(&[1000.0, 1001.0, 999.0]);
        assert_relative_eq!(p.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(p[1] > p[0] && p[0] > p[2]);
    }

    #[test]
    fn batch_reports_accuracy() {
        let logits = Matrix::from_rows(vec![vec![2.0, 0.0], vec![2.0, 0.0]]).unwrap();
        let labels = Matrix::column(&[0.0, 1.0]).unwrap();
        let (loss, grad, acc) = CrossEntropyLoss::batch(&logits, &labels, &[1.0, 1.0]).unwrap();
        assert_relative_eq!(acc, 0.5);
        assert!(loss > 0.0);
        // Gradient rows sum to zero for softmax cross-entropy.
        for row in &grad.data {
            assert_relative_eq!(row.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn rejects_out_of_range_labels() {
        let logits = Matrix::zeros(1, 3);
        for bad in [3.0, -1.0, 0.5] {
            let labels = Matrix::column(&[bad]).unwrap();
            assert!(matches!(
                CrossEntropyLoss::batch(&logits, &labels, &[1.0]),
                Err(Error::InvalidLabel { num_classes: 3, .. })
            ));
        }
    }
}
