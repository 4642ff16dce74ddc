use displaydoc::Display;
use feature_vector::VectorError;
use thiserror::Error;

use crate::{config::ConfigError, data::ItemId, data::UserId};

/// Operations which a learner or one of its parts doesn't provide.
#[derive(Clone, Copy, Debug, Display, PartialEq)]
pub enum Unsupported {
    /// the ordinal hypothesis can't predict from feature and parameter vectors
    OrdinalVectorPrediction,
    /// there is no most probable class as this is a numerical model
    MostProbableClassOfNumericalModel,
    /// the {gradient} gradient can't update {class_vectors} class vectors
    ClassVectors {
        gradient: &'static str,
        class_vectors: usize,
    },
}

/// Errors of the online recommender.
#[derive(Clone, Debug, Display, Error, PartialEq)]
pub enum Error {
    /// {0}
    Vector(#[from] VectorError),
    /// Invalid {name} with {actual} entries: {hint}
    Shape {
        name: &'static str,
        actual: usize,
        hint: &'static str,
    },
    /// The response {response} is not a class of a model with {classes} classes
    InvalidClass { response: f32, classes: usize },
    /// Unsupported operation: {0}
    Unsupported(Unsupported),
    /// {0}
    Config(#[from] ConfigError),
    /// Missing prediction of item {item} for user {user}
    MissingPrediction { user: UserId, item: ItemId },
    /// Can't evaluate without any ratings
    NoRatings,
}

impl Error {
    pub(crate) fn shape(name: &'static str, actual: usize, hint: &'static str) -> Self {
        Self::Shape { name, actual, hint }
    }

    /// Whether the error was caused by arguments of the wrong shape or value.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::Vector(_) | Self::Shape { .. } | Self::InvalidClass { .. },
        )
    }

    /// Whether the error was caused by an operation not supported by the configured variant.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

/// Converts a response into a class index.
///
/// # Errors
/// Fails if the response is not a non-negative integer below the number of classes.
pub(crate) fn class_index(response: f32, classes: usize) -> Result<usize, Error> {
    if response >= 0. && response.fract() == 0. && (response as usize) < classes {
        Ok(response as usize)
    } else {
        Err(Error::InvalidClass { response, classes })
    }
}
