//! Dense and sparse numeric vectors used as factors, side information and their parameters.
#![forbid(unsafe_code)]

pub mod sparse;
pub mod vector;

pub use crate::{
    sparse::SparseVector,
    vector::{FeatureVector, VectorError},
};
