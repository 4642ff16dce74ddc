use displaydoc::Display;
use itertools::Either;
use ndarray::Array1;
use thiserror::Error;

use crate::sparse::SparseVector;

/// Invalid vector operation.
#[derive(Clone, Debug, Display, Error, PartialEq)]
pub enum VectorError {
    /// Can't combine dense vectors with cardinality {left} and {right}
    CardinalityMismatch { left: usize, right: usize },
    /// Index {index} is out of bounds for a dense vector with cardinality {cardinality}
    IndexOutOfBounds { index: usize, cardinality: usize },
}

/// A numeric vector, either dense with a fixed cardinality or sparse without one.
///
/// Factor vectors are dense, side information and the parameters projecting it are sparse.
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureVector {
    Dense(Array1<f32>),
    Sparse(SparseVector),
}

impl FeatureVector {
    /// Creates an empty sparse vector.
    pub fn empty_sparse() -> Self {
        Self::Sparse(SparseVector::new())
    }

    /// Creates a sparse vector from `(index, value)` pairs.
    pub fn sparse(entries: impl IntoIterator<Item = (usize, f32)>) -> Self {
        Self::Sparse(entries.into_iter().collect())
    }

    /// The cardinality of a dense vector, `None` for sparse vectors.
    pub fn cardinality(&self) -> Option<usize> {
        match self {
            Self::Dense(values) => Some(values.len()),
            Self::Sparse(_) => None,
        }
    }

    pub fn is_dense(&self) -> bool {
        matches!(self, Self::Dense(_))
    }

    /// Gets the value at the index.
    ///
    /// Indices outside of a dense vector read as zero.
    pub fn get(&self, index: usize) -> f32 {
        match self {
            Self::Dense(values) => values.get(index).copied().unwrap_or_default(),
            Self::Sparse(values) => values.get(index),
        }
    }

    /// Sets the value at the index.
    ///
    /// # Errors
    /// Fails if the index is outside of a dense vector.
    pub fn set(&mut self, index: usize, value: f32) -> Result<(), VectorError> {
        match self {
            Self::Dense(values) => {
                let cardinality = values.len();
                let entry = values
                    .get_mut(index)
                    .ok_or(VectorError::IndexOutOfBounds { index, cardinality })?;
                *entry = value;
            }
            Self::Sparse(values) => values.set(index, value),
        }
        Ok(())
    }

    /// Iterates over the nonzero entries in index order.
    pub fn iter_non_zero(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        match self {
            Self::Dense(values) => Either::Left(
                values
                    .iter()
                    .copied()
                    .enumerate()
                    .filter(|(_, value)| *value != 0.),
            ),
            Self::Sparse(values) => Either::Right(values.iter_non_zero()),
        }
    }

    /// The indices of the nonzero entries in index order.
    pub fn non_zero_indices(&self) -> Vec<usize> {
        self.iter_non_zero().map(|(index, _)| index).collect()
    }

    /// Creates a zero vector of the same kind and cardinality.
    pub fn like(&self) -> Self {
        match self {
            Self::Dense(values) => Self::Dense(Array1::zeros(values.len())),
            Self::Sparse(_) => Self::empty_sparse(),
        }
    }

    /// Computes the dot product.
    ///
    /// # Errors
    /// Fails if two dense vectors differ in cardinality or if a sparse vector has nonzero
    /// entries outside of a dense vector.
    pub fn dot(&self, other: &FeatureVector) -> Result<f32, VectorError> {
        match (self, other) {
            (Self::Dense(left), Self::Dense(right)) => {
                if left.len() == right.len() {
                    Ok(left.dot(right))
                } else {
                    Err(VectorError::CardinalityMismatch {
                        left: left.len(),
                        right: right.len(),
                    })
                }
            }
            (Self::Sparse(left), Self::Sparse(right)) => Ok(left.dot(right)),
            (Self::Dense(dense), Self::Sparse(sparse))
            | (Self::Sparse(sparse), Self::Dense(dense)) => {
                sparse.iter_non_zero().try_fold(0., |sum, (index, value)| {
                    dense
                        .get(index)
                        .map(|entry| sum + entry * value)
                        .ok_or(VectorError::IndexOutOfBounds {
                            index,
                            cardinality: dense.len(),
                        })
                })
            }
        }
    }
}

impl From<Array1<f32>> for FeatureVector {
    fn from(values: Array1<f32>) -> Self {
        Self::Dense(values)
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self::Dense(Array1::from(values))
    }
}

impl From<SparseVector> for FeatureVector {
    fn from(values: SparseVector) -> Self {
        Self::Sparse(values)
    }
}
