//! Partial derivatives of the regularized log likelihood for the online updates.

mod default;
mod ordinal;
mod softmax;

use feature_vector::FeatureVector;
use log::info;

use crate::{error::Error, hypothesis::HypothesisKind};

pub use self::{default::DefaultGradient, ordinal::OrdinalGradient, softmax::SoftmaxGradient};

/// The features paired with a parameter family.
#[derive(Clone, Copy, Debug)]
pub enum Features<'a> {
    /// One feature vector shared by all class vectors, e.g. side information.
    Shared(&'a FeatureVector),
    /// One feature vector per class vector, e.g. the factors of the other side.
    PerClass(&'a [FeatureVector]),
}

impl<'a> Features<'a> {
    /// The feature vector of the class.
    ///
    /// # Panics
    /// Panics if per class features have no vector for the class.
    pub fn for_class(&self, class: usize) -> &'a FeatureVector {
        match *self {
            Self::Shared(features) => features,
            Self::PerClass(features) => &features[class],
        }
    }

    /// The indices the parameters are updated at.
    ///
    /// For per class features these are the nonzero indices of the first class.
    pub fn non_zero_indices(&self) -> Vec<usize> {
        match self {
            Self::Shared(features) => features.non_zero_indices(),
            Self::PerClass(features) => features
                .first()
                .map(FeatureVector::non_zero_indices)
                .unwrap_or_default(),
        }
    }

    /// Checks that the features fit to the number of class vectors.
    pub(crate) fn check_classes(&self, class_vectors: usize) -> Result<(), Error> {
        match self {
            Self::PerClass(features) if features.len() != class_vectors => Err(Error::shape(
                "feature vectors",
                features.len(),
                "expected one feature vector per parameter vector",
            )),
            _ => Ok(()),
        }
    }
}

/// Computes the learning rate scaled updates of the parameters.
pub trait StochasticGradient {
    /// Computes the update of every class vector at the index.
    ///
    /// The index `0` is the intercept, it isn't regularized.
    ///
    /// # Errors
    /// Fails if the shapes of the arguments don't fit to each other or if the number of class
    /// vectors isn't supported by the gradient.
    fn gradient(
        &self,
        index: usize,
        y: f32,
        parameters: &[FeatureVector],
        features: Features<'_>,
        prediction: &[f32],
        lambda: f32,
    ) -> Result<Vec<f32>, Error>;

    /// Computes the update of the ordinal cuts.
    ///
    /// Only the ordinal gradient moves the cuts, all others leave them untouched.
    fn cuts_gradient(
        &self,
        _y: f32,
        cuts: &[f32],
        _linear_combination: &[f32],
        _lambda: f32,
    ) -> Result<Vec<f32>, Error> {
        Ok(vec![0.; cuts.len()])
    }
}

/// The available gradients.
#[derive(Clone, Copy, Debug)]
pub enum Gradient {
    Default(DefaultGradient),
    Softmax(SoftmaxGradient),
    Ordinal(OrdinalGradient),
}

impl Gradient {
    /// Chooses the gradient of the hypothesis.
    pub fn for_hypothesis(hypothesis: HypothesisKind, learning_rate: f32) -> Self {
        let gradient = match hypothesis {
            HypothesisKind::Ols | HypothesisKind::Logistic | HypothesisKind::Poisson => {
                Self::Default(DefaultGradient::new(learning_rate))
            }
            HypothesisKind::Softmax => Self::Softmax(SoftmaxGradient::new(learning_rate)),
            HypothesisKind::Ordinal => Self::Ordinal(OrdinalGradient::new(learning_rate)),
        };
        info!(
            "using the {:?} gradient for the {} hypothesis with learning rate {}",
            gradient, hypothesis, learning_rate,
        );
        gradient
    }
}

impl StochasticGradient for Gradient {
    fn gradient(
        &self,
        index: usize,
        y: f32,
        parameters: &[FeatureVector],
        features: Features<'_>,
        prediction: &[f32],
        lambda: f32,
    ) -> Result<Vec<f32>, Error> {
        match self {
            Self::Default(gradient) => {
                gradient.gradient(index, y, parameters, features, prediction, lambda)
            }
            Self::Softmax(gradient) => {
                gradient.gradient(index, y, parameters, features, prediction, lambda)
            }
            Self::Ordinal(gradient) => {
                gradient.gradient(index, y, parameters, features, prediction, lambda)
            }
        }
    }

    fn cuts_gradient(
        &self,
        y: f32,
        cuts: &[f32],
        linear_combination: &[f32],
        lambda: f32,
    ) -> Result<Vec<f32>, Error> {
        match self {
            Self::Default(gradient) => gradient.cuts_gradient(y, cuts, linear_combination, lambda),
            Self::Softmax(gradient) => gradient.cuts_gradient(y, cuts, linear_combination, lambda),
            Self::Ordinal(gradient) => gradient.cuts_gradient(y, cuts, linear_combination, lambda),
        }
    }
}

/// The L2 penalty of a parameter, the intercept at index `0` is exempted.
fn penalty(index: usize, lambda: f32, parameter: f32) -> f32 {
    if index == 0 {
        0.
    } else {
        lambda * parameter
    }
}

#[cfg(test)]
mod tests {
    use test_utils::assert_approx_eq;

    use super::*;

    #[test]
    fn test_non_zero_indices() {
        let shared = FeatureVector::sparse(vec![(0, 1.), (7, 3.)]);
        assert_eq!(Features::Shared(&shared).non_zero_indices(), [0, 7]);

        let per_class = [
            FeatureVector::from(vec![0., 1., 2.]),
            FeatureVector::from(vec![3., 0., 0.]),
        ];
        assert_eq!(Features::PerClass(&per_class).non_zero_indices(), [1, 2]);
        assert!(Features::PerClass(&[]).non_zero_indices().is_empty());
    }

    #[test]
    fn test_check_classes() {
        let per_class = [FeatureVector::from(vec![1.]), FeatureVector::from(vec![2.])];
        assert!(Features::PerClass(&per_class).check_classes(2).is_ok());
        assert!(Features::PerClass(&per_class)
            .check_classes(3)
            .unwrap_err()
            .is_invalid_argument());
        assert!(Features::Shared(&per_class[0]).check_classes(3).is_ok());
    }

    #[test]
    fn test_only_ordinal_moves_cuts() {
        let cuts = [0.1, 0.2];
        for hypothesis in [HypothesisKind::Ols, HypothesisKind::Softmax] {
            let gradient = Gradient::for_hypothesis(hypothesis, 0.1);
            assert_approx_eq!(
                f32,
                gradient.cuts_gradient(1., &cuts, &[0.5, 0.5, 0.5], 0.1).unwrap(),
                [0., 0.],
            );
        }

        let gradient = Gradient::for_hypothesis(HypothesisKind::Ordinal, 0.1);
        let update = gradient.cuts_gradient(1., &cuts, &[0.5, 0.6], 0.).unwrap();
        assert!(update.iter().any(|cut| *cut != 0.));
    }

    #[test]
    fn test_penalty() {
        assert_approx_eq!(f32, penalty(0, 0.1, 5.), 0.);
        assert_approx_eq!(f32, penalty(3, 0.1, 5.), 0.5);
    }
}
