use std::{collections::BTreeMap, iter::FromIterator};

/// A sparse vector without a cardinality of its own.
///
/// Its indices are only bounded when it is combined with a dense vector, see
/// [`FeatureVector::dot`](crate::FeatureVector::dot).
///
/// Only nonzero entries are stored, every other index reads as `0.0`. Entries are kept in
/// index order, so iteration is deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseVector {
    entries: BTreeMap<usize, f32>,
}

impl SparseVector {
    /// Creates an empty (all zero) sparse vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the value at the index.
    pub fn get(&self, index: usize) -> f32 {
        self.entries.get(&index).copied().unwrap_or_default()
    }

    /// Sets the value at the index.
    ///
    /// Setting an entry to zero removes it.
    pub fn set(&mut self, index: usize, value: f32) {
        if value == 0. {
            self.entries.remove(&index);
        } else {
            self.entries.insert(index, value);
        }
    }

    /// The number of stored nonzero entries.
    pub fn number_of_non_zeros(&self) -> usize {
        self.entries.len()
    }

    /// Iterates over the nonzero entries in index order.
    pub fn iter_non_zero(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.entries.iter().map(|(&index, &value)| (index, value))
    }

    /// Computes the dot product with another sparse vector.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (short, long) = if self.entries.len() <= other.entries.len() {
            (self, other)
        } else {
            (other, self)
        };
        short
            .iter_non_zero()
            .map(|(index, value)| value * long.get(index))
            .sum()
    }
}

impl FromIterator<(usize, f32)> for SparseVector {
    fn from_iter<I: IntoIterator<Item = (usize, f32)>>(iter: I) -> Self {
        let mut vector = Self::new();
        for (index, value) in iter {
            vector.set(index, value);
        }
        vector
    }
}
