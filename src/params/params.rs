use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// A named tree of matrices.
///
/// Used for network parameters, their gradients, optimizer updates and
/// optimizer moments alike. Names are slash-separated paths such as
/// `member_0/linear_1/w`. Iteration is in sorted name order, so every
/// traversal is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Params {
    entries: BTreeMap<String, Matrix>,
}

impl Params {
    pub fn new() -> Params {
        Params::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Matrix) -> Option<Matrix> {
        self.entries.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&Matrix> {
        self.entries.get(name)
    }

    /// Like `get`, but a missing entry is an error.
    pub fn require(&self, name: &str) -> Result<&Matrix> {
        self.entries.get(name).ok_or_else(|| Error::MissingParameter(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Matrix)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of scalars across all leaves.
    pub fn num_elements(&self) -> usize {
        self.entries.values().map(Matrix::len).sum()
    }

    pub fn zeros_like(&self) -> Params {
        self.map(|_| 0.0)
    }

    pub fn map<F>(&self, functor: F) -> Params
    where
        F: Fn(f64) -> f64,
    {
        Params {
            entries: self.entries.iter()
                .map(|(k, v)| (k.clone(), v.map(&functor)))
                .collect(),
        }
    }

    /// Element-wise combination of two trees with identical structure.
    pub fn zip_with<F>(&self, other: &Params, functor: F) -> Result<Params>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.check_same_structure(other)?;
        let mut entries = BTreeMap::new();
        for ((name, a), b) in self.entries.iter().zip(other.entries.values()) {
            entries.insert(name.clone(), a.zip_with(b, "params.zip_with", &functor)?);
        }
        Ok(Params { entries })
    }

    pub fn add(&self, other: &Params) -> Result<Params> {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn scale(&self, factor: f64) -> Params {
        self.map(|x| x * factor)
    }

    /// Adds `other` into `self`, leaf by leaf.
    pub fn accumulate(&mut self, other: &Params) -> Result<()> {
        *self = self.add(other)?;
        Ok(())
    }

    pub fn sum_squares(&self) -> f64 {
        self.entries.values().map(Matrix::sum_squares).sum()
    }

    pub fn l2_norm(&self) -> f64 {
        self.sum_squares().sqrt()
    }

    fn check_same_structure(&self, other: &Params) -> Result<()> {
        if self.entries.len() != other.entries.len()
            || self.entries.keys().zip(other.entries.keys()).any(|(a, b)| a != b)
        {
            let mine: Vec<&str> = self.names().collect();
            let theirs: Vec<&str> = other.names().collect();
            return Err(Error::ParameterTreeMismatch(format!("{mine:?} vs {theirs:?}")));
        }
        Ok(())
    }

    /// Serializes the tree to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a tree from a JSON file previously written by `save_json`.
    pub fn load_json(path: &str) -> Result<Params> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl FromIterator<(String, Matrix)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, Matrix)>>(iter: I) -> Self {
        Params { entries: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(w: f64, b: f64) -> Params {
        let mut p = Params::new();
        p.insert("layer/w", Matrix::filled(2, 2, w));
        p.insert("layer/b", Matrix::filled(1, 2, b));
        p
    }

    #[test]
    fn zip_with_combines_matching_trees() {
        let sum = tree(1.0, 2.0).add(&tree(0.5, -2.0)).unwrap();
        assert_eq!(sum, tree(1.5, 0.0));
        assert_eq!(sum.num_elements(), 6);
    }

    #[test]
    fn zip_with_rejects_different_names() {
        let mut other = Params::new();
        other.insert("layer/w", Matrix::filled(2, 2, 1.0));
        other.insert("other/b", Matrix::filled(1, 2, 1.0));
        assert!(matches!(tree(1.0, 1.0).add(&other), Err(Error::ParameterTreeMismatch(_))));
    }

    #[test]
    fn zip_with_rejects_different_shapes() {
        let mut other = tree(1.0, 1.0);
        other.insert("layer/b", Matrix::filled(1, 3, 1.0));
        assert!(matches!(tree(1.0, 1.0).add(&other), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn require_reports_missing_name() {
        let err = tree(0.0, 0.0).require("nope").unwrap_err();
        assert!(matches!(err, Error::MissingParameter(name) if name == "nope"));
    }

    #[test]
    fn json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        let path = path.to_str().unwrap();
        let original = tree(0.25, -3.0);
        original.save_json(path).unwrap();
        assert_eq!(Params::load_json(path).unwrap(), original);
    }
}
