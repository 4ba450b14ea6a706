use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;

/// √(2/π), for the tanh form of GELU.
const GELU_C: f64 = 0.797_884_560_802_865_4;
const GELU_K: f64 = 0.044_715;

/// Hidden-layer nonlinearity of an ensemble member.
///
/// Output layers are always linear; class probabilities come from the
/// softmax inside `XentLoss`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Identity,
    ReLU,
    LeakyReLU { alpha: f64 },
    Sigmoid,
    Tanh,
    Gelu,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match *self {
            ActivationFunction::Identity => x,
            ActivationFunction::ReLU => x.max(0.0),
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::Sigmoid => sigmoid(x),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::Gelu => 0.5 * x * (1.0 + (GELU_C * (x + GELU_K * x.powi(3))).tanh()),
        }
    }

    /// dσ/dx at the pre-activation `x`. ReLU kinks take the left derivative.
    pub fn derivative(&self, x: f64) -> f64 {
        match *self {
            ActivationFunction::Identity => 1.0,
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { 1.0 } else { alpha },
            ActivationFunction::Sigmoid => {
                let s = sigmoid(x);
                s * (1.0 - s)
            }
            ActivationFunction::Tanh => 1.0 - x.tanh().powi(2),
            ActivationFunction::Gelu => {
                let t = (GELU_C * (x + GELU_K * x.powi(3))).tanh();
                let dt = (1.0 - t * t) * GELU_C * (1.0 + 3.0 * GELU_K * x * x);
                0.5 * (1.0 + t) + 0.5 * x * dt
            }
        }
    }

    /// σ applied to every entry of `z`.
    pub fn apply(&self, z: &Matrix) -> Matrix {
        z.map(|v| self.function(v))
    }

    /// σ'(z) entry-wise, for backpropagating through `apply`.
    pub fn gradient(&self, z: &Matrix) -> Matrix {
        z.map(|v| self.derivative(v))
    }

    /// Rectifier-like activations start from He initialization.
    pub fn prefers_he_init(&self) -> bool {
        matches!(
            self,
            ActivationFunction::ReLU | ActivationFunction::LeakyReLU { .. } | ActivationFunction::Gelu
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn derivatives_match_finite_differences() {
        let smooth = [
            ActivationFunction::Identity,
            ActivationFunction::Sigmoid,
            ActivationFunction::Tanh,
            ActivationFunction::Gelu,
        ];
        let h = 1e-6;
        for act in &smooth {
            for &x in &[-1.3, -0.2, 0.4, 2.1] {
                let numeric = (act.function(x + h) - act.function(x - h)) / (2.0 * h);
                assert_relative_eq!(act.derivative(x), numeric, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn rectifiers() {
        let leaky = ActivationFunction::LeakyReLU { alpha: 0.1 };
        assert_eq!(ActivationFunction::ReLU.function(-2.0), 0.0);
        assert_eq!(ActivationFunction::ReLU.derivative(0.0), 0.0);
        assert_relative_eq!(leaky.function(-2.0), -0.2);
        assert_eq!(leaky.derivative(3.0), 1.0);
        assert!(leaky.prefers_he_init());
        assert!(!ActivationFunction::Tanh.prefers_he_init());
    }

    #[test]
    fn apply_is_entrywise() {
        let z = Matrix::from_rows(vec![vec![-1.0, 2.0]]).unwrap();
        assert_eq!(ActivationFunction::ReLU.apply(&z).data, vec![vec![0.0, 2.0]]);
        assert_eq!(ActivationFunction::ReLU.gradient(&z).data, vec![vec![0.0, 1.0]]);
    }
}
