//! An online, regularized, factor-based learner for recommendations.
//!
//! Every observed `(user, item, rating)` triple updates the latent factors of the user and the
//! item (and optionally the parameters projecting their side information) with one step of
//! stochastic gradient descent. Numeric, binary, multinomial, ordinal and count responses are
//! supported through the [`hypothesis`] and [`gradient`] variants.
#![forbid(unsafe_code)]

mod config;
mod data;
mod error;
pub mod eval;
pub mod gradient;
pub mod hypothesis;
pub mod learner;
pub mod model;
mod recommender;
mod side_info;
#[cfg(test)]
mod tests;
mod utils;

pub use feature_vector::{FeatureVector, SparseVector, VectorError};

pub use crate::{
    config::{Config, ConfigError, CutsPolicy, Lambdas},
    data::{ItemId, Ratings, UserId},
    error::{Error, Unsupported},
    recommender::{OnlineFactorizationRecommender, RatingPredictionStrategy},
    side_info::SideInfoSetup,
};
