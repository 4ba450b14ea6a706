use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

use crate::error::{Error, Result};

/// Dense row-major matrix of `f64`.
///
/// Batches store one example per row, so a batch of `n` inputs with `d`
/// features is an `n × d` matrix. All binary operations check shapes and
/// return `Error::ShapeMismatch` instead of panicking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix::filled(rows, cols, 0.0)
    }

    pub fn filled(rows: usize, cols: usize, value: f64) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![value; cols]; rows],
        }
    }

    /// Builds a matrix from rows; rejects empty input and ragged rows.
    pub fn from_rows(data: Vec<Vec<f64>>) -> Result<Matrix> {
        let cols = match data.first() {
            Some(row) => row.len(),
            None => return Err(Error::EmptyData("matrix needs at least one row".into())),
        };
        if let Some(bad) = data.iter().find(|row| row.len() != cols) {
            return Err(Error::ShapeMismatch {
                op: "from_rows",
                expected: (data.len(), cols),
                got: (data.len(), bad.len()),
            });
        }
        Ok(Matrix { rows: data.len(), cols, data })
    }

    /// Single-column matrix, one value per row.
    pub fn column(values: &[f64]) -> Result<Matrix> {
        Matrix::from_rows(values.iter().map(|&v| vec![v]).collect())
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().flat_map(|row| row.iter().copied())
    }

    /// Uniform samples on [-1, 1).
    pub fn random<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = rng.gen::<f64>() * 2.0 - 1.0;
            }
        }
        res
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // Both uniforms on (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    fn normal<R: Rng + ?Sized>(rows: usize, cols: usize, std_dev: f64, rng: &mut R) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = Matrix::sample_standard_normal(rng) * std_dev;
            }
        }
        res
    }

    /// He initialization: N(0, sqrt(2 / fan_in)), with `rows` as the fan-in.
    ///
    /// Weight matrices here are `fan_in × fan_out` because inputs are
    /// row vectors multiplied on the left.
    pub fn he<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        Matrix::normal(rows, cols, (2.0 / rows.max(1) as f64).sqrt(), rng)
    }

    /// Xavier (Glorot) initialization: N(0, sqrt(1 / fan_in)).
    pub fn xavier<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        Matrix::normal(rows, cols, (1.0 / rows.max(1) as f64).sqrt(), rng)
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);
        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }
        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    /// Element-wise combination of two same-shape matrices.
    pub fn zip_with<F>(&self, rhs: &Matrix, op: &'static str, functor: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.check_same_shape(rhs, op)?;
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(rhs.data.iter())
                .map(|(a, b)| a.iter().zip(b.iter()).map(|(&x, &y)| functor(x, y)).collect())
                .collect(),
        })
    }

    pub fn add(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "add", |a, b| a + b)
    }

    pub fn sub(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "sub", |a, b| a - b)
    }

    /// Element-wise (Hadamard) product.
    pub fn hadamard(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "hadamard", |a, b| a * b)
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    pub fn matmul(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(Error::ShapeMismatch {
                op: "matmul",
                expected: (self.cols, rhs.cols),
                got: rhs.shape(),
            });
        }
        let mut res = Matrix::zeros(self.rows, rhs.cols);
        for i in 0..res.rows {
            for j in 0..res.cols {
                let mut sum = 0.0;
                for k in 0..self.cols {
                    sum += self.data[i][k] * rhs.data[k][j];
                }
                res.data[i][j] = sum;
            }
        }
        Ok(res)
    }

    /// Adds a `1 × cols` row vector to every row (bias broadcast).
    pub fn add_row(&self, row: &Matrix) -> Result<Matrix> {
        if row.rows != 1 || row.cols != self.cols {
            return Err(Error::ShapeMismatch {
                op: "add_row",
                expected: (1, self.cols),
                got: row.shape(),
            });
        }
        let bias = &row.data[0];
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter()
                .map(|r| r.iter().zip(bias.iter()).map(|(x, b)| x + b).collect())
                .collect(),
        })
    }

    /// Column sums as a `1 × cols` row vector.
    pub fn sum_rows(&self) -> Matrix {
        let mut sums = vec![0.0; self.cols];
        for row in &self.data {
            for (s, x) in sums.iter_mut().zip(row.iter()) {
                *s += x;
            }
        }
        Matrix { rows: 1, cols: self.cols, data: vec![sums] }
    }

    /// Gathers the given rows into a new matrix.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Matrix> {
        let mut data = Vec::with_capacity(indices.len());
        for &i in indices {
            match self.data.get(i) {
                Some(row) => data.push(row.clone()),
                None => return Err(Error::ShapeMismatch {
                    op: "select_rows",
                    expected: (self.rows, self.cols),
                    got: (i + 1, self.cols),
                }),
            }
        }
        Ok(Matrix { rows: indices.len(), cols: self.cols, data })
    }

    pub fn sum(&self) -> f64 {
        self.iter().sum()
    }

    pub fn sum_squares(&self) -> f64 {
        self.iter().map(|x| x * x).sum()
    }

    pub fn check_same_shape(&self, rhs: &Matrix, op: &'static str) -> Result<()> {
        if self.shape() != rhs.shape() {
            return Err(Error::ShapeMismatch { op, expected: self.shape(), got: rhs.shape() });
        }
        Ok(())
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn matmul_multiplies_row_by_column() {
        let a = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let b = Matrix::from_rows(vec![vec![5.0], vec![6.0]]).unwrap();
        let c = a.matmul(&b).unwrap();
        assert_eq!(c, Matrix::from_rows(vec![vec![17.0], vec![39.0]]).unwrap());
    }

    #[test]
    fn matmul_rejects_incompatible_shapes() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(2, 3);
        assert!(matches!(a.matmul(&b), Err(Error::ShapeMismatch { op: "matmul", .. })));
    }

    #[test]
    fn from_rows_rejects_ragged_and_empty_input() {
        assert!(matches!(Matrix::from_rows(vec![]), Err(Error::EmptyData(_))));
        let ragged = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(ragged, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn add_row_broadcasts_bias() {
        let x = Matrix::from_rows(vec![vec![1.0, 1.0], vec![2.0, 2.0]]).unwrap();
        let b = Matrix::from_rows(vec![vec![0.5, -1.0]]).unwrap();
        let y = x.add_row(&b).unwrap();
        assert_eq!(y.data, vec![vec![1.5, 0.0], vec![2.5, 1.0]]);
        assert!(x.add_row(&Matrix::zeros(1, 3)).is_err());
    }

    #[test]
    fn sum_rows_collapses_to_row_vector() {
        let x = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        assert_eq!(x.sum_rows().data, vec![vec![9.0, 12.0]]);
    }

    #[test]
    fn seeded_init_is_reproducible() {
        let a = Matrix::he(4, 3, &mut ChaCha8Rng::seed_from_u64(11));
        let b = Matrix::he(4, 3, &mut ChaCha8Rng::seed_from_u64(11));
        let c = Matrix::he(4, 3, &mut ChaCha8Rng::seed_from_u64(12));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn select_rows_gathers_in_order() {
        let x = Matrix::column(&[10.0, 20.0, 30.0]).unwrap();
        let picked = x.select_rows(&[2, 0]).unwrap();
        assert_eq!(picked.data, vec![vec![30.0], vec![10.0]]);
        assert!(x.select_rows(&[3]).is_err());
    }
}
