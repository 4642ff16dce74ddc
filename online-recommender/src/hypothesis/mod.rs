//! Maps linear combinations of parameters to predictions.

pub mod activation;

use std::str::FromStr;

use displaydoc::Display;
use feature_vector::FeatureVector;
use thiserror::Error;

use crate::{
    error::{Error, Unsupported},
    hypothesis::activation::{ordinal_probabilities, sigmoid, softmax},
};

/// Parameters projecting a side information vector into the linear combination.
#[derive(Clone, Copy, Debug)]
pub struct SideInfoTerm<'a> {
    /// One parameter vector per class vector.
    pub parameters: &'a [FeatureVector],
    pub features: &'a FeatureVector,
}

/// The prediction function of a learner.
pub trait Hypothesis {
    /// Predicts from the linear combination.
    ///
    /// Depending on the hypothesis this is the point prediction or the class distribution.
    fn predict(&self, linear_combination: &[f32]) -> Result<Vec<f32>, Error>;

    /// Predicts the full distribution from the linear combination.
    fn predict_full(&self, linear_combination: &[f32]) -> Result<Vec<f32>, Error>;

    /// Combines the user factors with the item factors.
    fn linear_combination(
        &self,
        cuts: &[f32],
        alphas: &[FeatureVector],
        betas: &[FeatureVector],
    ) -> Result<Vec<f32>, Error> {
        self.linear_combination_with_side_info(cuts, alphas, betas, &[])
    }

    /// Combines the user factors with the item factors and adds the projected side information.
    fn linear_combination_with_side_info(
        &self,
        _cuts: &[f32],
        alphas: &[FeatureVector],
        betas: &[FeatureVector],
        side_info: &[SideInfoTerm<'_>],
    ) -> Result<Vec<f32>, Error> {
        class_wise_linear_combination(alphas, betas, side_info)
    }

    /// Predicts from the class wise dot products of features and parameters.
    fn predict_from_vectors(
        &self,
        features: &[FeatureVector],
        parameters: &[FeatureVector],
    ) -> Result<Vec<f32>, Error> {
        self.predict(&dot_products(features, parameters)?)
    }
}

/// The available hypotheses.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum HypothesisKind {
    /// ols
    Ols,
    /// logistic
    Logistic,
    /// poisson
    Poisson,
    /// softmax
    Softmax,
    /// ordinal
    Ordinal,
}

/// Unknown hypothesis {0}, expected one of ols, logistic, poisson, softmax or ordinal
#[derive(Debug, Display, Error)]
pub struct UnknownHypothesis(String);

impl FromStr for HypothesisKind {
    type Err = UnknownHypothesis;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "ols" => Ok(Self::Ols),
            "logistic" => Ok(Self::Logistic),
            "poisson" => Ok(Self::Poisson),
            "softmax" => Ok(Self::Softmax),
            "ordinal" => Ok(Self::Ordinal),
            _ => Err(UnknownHypothesis(name.to_string())),
        }
    }
}

impl HypothesisKind {
    /// Chooses the hypothesis for a number of response classes.
    ///
    /// Numerical responses have `0` or `1` classes.
    pub fn infer(classes: usize, ordinal: bool) -> Self {
        match classes {
            _ if ordinal => Self::Ordinal,
            0 | 1 => Self::Ols,
            2 => Self::Logistic,
            _ => Self::Softmax,
        }
    }

    /// Whether the hypothesis can model the number of response classes.
    pub fn supports_classes(&self, classes: usize) -> bool {
        match self {
            Self::Ols | Self::Poisson => classes <= 1,
            Self::Logistic => classes == 2,
            Self::Softmax => classes >= 3,
            Self::Ordinal => classes >= 2,
        }
    }

    fn first(linear_combination: &[f32]) -> Result<f32, Error> {
        linear_combination.first().copied().ok_or_else(|| {
            Error::shape(
                "linear combination",
                0,
                "expected at least one value",
            )
        })
    }
}

impl Hypothesis for HypothesisKind {
    fn predict(&self, linear_combination: &[f32]) -> Result<Vec<f32>, Error> {
        match self {
            Self::Ols => {
                Self::first(linear_combination)?;
                Ok(linear_combination.to_vec())
            }
            Self::Logistic => Ok(vec![sigmoid(Self::first(linear_combination)?)]),
            Self::Poisson => Ok(vec![Self::first(linear_combination)?.exp()]),
            Self::Softmax => {
                if linear_combination.len() < 3 {
                    return Err(Error::shape(
                        "linear combination",
                        linear_combination.len(),
                        "softmax expects at least 3 classes",
                    ));
                }
                Ok(softmax(linear_combination.into()).to_vec())
            }
            Self::Ordinal => {
                Self::first(linear_combination)?;
                Ok(ordinal_probabilities(linear_combination))
            }
        }
    }

    fn predict_full(&self, linear_combination: &[f32]) -> Result<Vec<f32>, Error> {
        let prediction = self.predict(linear_combination)?;
        match self {
            Self::Logistic => Ok(vec![1. - prediction[0], prediction[0]]),
            _ => Ok(prediction),
        }
    }

    fn linear_combination_with_side_info(
        &self,
        cuts: &[f32],
        alphas: &[FeatureVector],
        betas: &[FeatureVector],
        side_info: &[SideInfoTerm<'_>],
    ) -> Result<Vec<f32>, Error> {
        match self {
            Self::Ordinal => ordinal_linear_combination(cuts, alphas, betas, side_info),
            _ => class_wise_linear_combination(alphas, betas, side_info),
        }
    }

    fn predict_from_vectors(
        &self,
        features: &[FeatureVector],
        parameters: &[FeatureVector],
    ) -> Result<Vec<f32>, Error> {
        match self {
            Self::Ordinal => Err(Error::Unsupported(Unsupported::OrdinalVectorPrediction)),
            _ => self.predict(&dot_products(features, parameters)?),
        }
    }
}

/// Computes one linear combination per class vector.
///
/// Class `c` gets `alpha_c · beta_c` plus the dot products of the class `c` side info
/// parameters with their features.
pub fn class_wise_linear_combination(
    alphas: &[FeatureVector],
    betas: &[FeatureVector],
    side_info: &[SideInfoTerm<'_>],
) -> Result<Vec<f32>, Error> {
    check_class_vectors(alphas, betas, side_info)?;
    alphas
        .iter()
        .zip(betas)
        .enumerate()
        .map(|(class, (alpha, beta))| {
            side_info.iter().try_fold(alpha.dot(beta)?, |sum, term| {
                term.parameters[class]
                    .dot(term.features)
                    .map(|projection| sum + projection)
            })
        })
        .collect::<Result<_, _>>()
        .map_err(Into::into)
}

fn dot_products(
    features: &[FeatureVector],
    parameters: &[FeatureVector],
) -> Result<Vec<f32>, Error> {
    if features.len() != parameters.len() {
        return Err(Error::shape(
            "feature vectors",
            features.len(),
            "expected one feature vector per parameter vector",
        ));
    }
    features
        .iter()
        .zip(parameters)
        .map(|(features, parameters)| features.dot(parameters))
        .collect::<Result<_, _>>()
        .map_err(Into::into)
}

/// Computes the cumulative logits of the proportional odds model.
///
/// All classes share the latent score of the first class vectors, the logit of threshold `i`
/// is the prefix sum of the cuts up to `i` minus that score.
pub fn ordinal_linear_combination(
    cuts: &[f32],
    alphas: &[FeatureVector],
    betas: &[FeatureVector],
    side_info: &[SideInfoTerm<'_>],
) -> Result<Vec<f32>, Error> {
    check_class_vectors(alphas, betas, side_info)?;
    if cuts.is_empty() {
        return Err(Error::shape(
            "cuts",
            0,
            "ordinal models expect at least one cut",
        ));
    }

    let score = side_info
        .iter()
        .try_fold(alphas[0].dot(&betas[0])?, |sum, term| {
            term.parameters[0]
                .dot(term.features)
                .map(|projection| sum + projection)
        })?;

    Ok(cuts
        .iter()
        .scan(0., |threshold, cut| {
            *threshold += cut;
            Some(*threshold - score)
        })
        .collect())
}

fn check_class_vectors(
    alphas: &[FeatureVector],
    betas: &[FeatureVector],
    side_info: &[SideInfoTerm<'_>],
) -> Result<(), Error> {
    if alphas.is_empty() {
        return Err(Error::shape(
            "alpha vectors",
            0,
            "expected at least one class vector",
        ));
    }
    if betas.len() != alphas.len() {
        return Err(Error::shape(
            "beta vectors",
            betas.len(),
            "expected one beta vector per alpha vector",
        ));
    }
    if let Some(term) = side_info
        .iter()
        .find(|term| term.parameters.len() != alphas.len())
    {
        return Err(Error::shape(
            "side info parameters",
            term.parameters.len(),
            "expected one parameter vector per alpha vector",
        ));
    }
    Ok(())
}
