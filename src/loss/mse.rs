use crate::error::Result;
use crate::math::matrix::Matrix;

pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((predicted - expected)²)
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>() / n
    }

    /// Per-output gradient: 2·(predicted - expected) / n
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| 2.0 * (a - b) / n)
            .collect()
    }

    /// Row-weighted MSE over a batch and its gradient with respect to
    /// `predicted`:
    ///   L = (1/rows) · Σ_r w_r · mse(predicted_r, expected_r)
    pub fn batch(predicted: &Matrix, expected: &Matrix, weights: &[f64]) -> Result<(f64, Matrix)> {
        predicted.check_same_shape(expected, "mse")?;
        let rows = predicted.rows as f64;
        let mut loss = 0.0;
        let mut grad = Vec::with_capacity(predicted.rows);
        for ((p, e), w) in predicted.data.iter().zip(expected.data.iter()).zip(weights.iter()) {
            loss += w * MseLoss::loss(p, e) / rows;
            grad.push(MseLoss::derivative(p, e).into_iter().map(|g| w * g / rows).collect());
        }
        Ok((loss, Matrix { rows: predicted.rows, cols: predicted.cols, data: grad }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn batch_loss_weights_rows() {
        let p = Matrix::from_rows(vec![vec![1.0, 3.0], vec![0.0, 0.0]]).unwrap();
        let e = Matrix::from_rows(vec![vec![0.0, 1.0], vec![2.0, 0.0]]).unwrap();
        let (loss, grad) = MseLoss::batch(&p, &e, &[1.0, 0.5]).unwrap();
        // row 0: (1 + 4) / 2 = 2.5; row 1: 4 / 2 = 2 weighted by 0.5
        assert_relative_eq!(loss, (2.5 + 1.0) / 2.0);
        assert_relative_eq!(grad.data[0][1], 2.0 * 2.0 / 2.0 / 2.0);
        assert_relative_eq!(grad.data[1][0], 0.5 * 2.0 * -2.0 / 2.0 / 2.0);
    }
}
