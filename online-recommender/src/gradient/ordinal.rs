use std::cmp::Ordering;

use feature_vector::FeatureVector;

use crate::{
    error::{class_index, Error, Unsupported},
    gradient::{penalty, Features, StochasticGradient},
    hypothesis::activation::{cumulative_probs, ordinal_probabilities},
};

/// Lower bound of the observed class probability the gradient is divided by.
const MIN_CLASS_PROBABILITY: f32 = 1e-6;

/// The gradient of the proportional odds model.
///
/// All thresholds share one class vector, the cuts defining the thresholds are learned as well.
#[derive(Clone, Copy, Debug)]
pub struct OrdinalGradient {
    learning_rate: f32,
}

/// The cumulative probabilities around the observed class.
struct Observed {
    /// `P(Y = c)`
    probability: f32,
    /// `F_c (1 - F_c)` with the cumulative probability `F_c = P(Y <= c)`
    current: f32,
    /// `F_{c-1} (1 - F_{c-1})`
    previous: f32,
}

impl Observed {
    fn new(y: f32, distribution: &[f32]) -> Result<(usize, Self), Error> {
        let class = class_index(y, distribution.len())?;
        let cumulative = cumulative_probs(distribution);
        let derivative = |probability: f32| probability * (1. - probability);
        let current = derivative(cumulative[class]);
        let previous = class
            .checked_sub(1)
            .map_or(0., |previous| derivative(cumulative[previous]));

        Ok((
            class,
            Self {
                probability: distribution[class].max(MIN_CLASS_PROBABILITY),
                current,
                previous,
            },
        ))
    }
}

impl OrdinalGradient {
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }

    /// Computes the update of the cuts from the predicted class distribution.
    ///
    /// Cuts below the observed class `c` contribute to both thresholds around `c`, the cut of
    /// `c` only to the upper one and later cuts to none.
    ///
    /// # Errors
    /// Fails if the distribution doesn't have one class more than there are cuts or if the
    /// response isn't one of its classes.
    pub fn cuts_gradient_for_distribution(
        &self,
        y: f32,
        cuts: &[f32],
        distribution: &[f32],
        lambda: f32,
    ) -> Result<Vec<f32>, Error> {
        if distribution.len() != cuts.len() + 1 {
            return Err(Error::shape(
                "distribution",
                distribution.len(),
                "expected one class more than there are cuts",
            ));
        }
        let (class, observed) = Observed::new(y, distribution)?;

        Ok(cuts
            .iter()
            .enumerate()
            .map(|(index, cut)| {
                let derivative = match index.cmp(&class) {
                    Ordering::Less => observed.current - observed.previous,
                    Ordering::Equal => observed.current,
                    Ordering::Greater => 0.,
                } / observed.probability;
                self.learning_rate * (derivative - lambda * cut)
            })
            .collect())
    }
}

impl StochasticGradient for OrdinalGradient {
    fn gradient(
        &self,
        index: usize,
        y: f32,
        parameters: &[FeatureVector],
        features: Features<'_>,
        prediction: &[f32],
        lambda: f32,
    ) -> Result<Vec<f32>, Error> {
        if parameters.len() != 1 {
            return Err(Error::Unsupported(Unsupported::ClassVectors {
                gradient: "ordinal",
                class_vectors: parameters.len(),
            }));
        }
        features.check_classes(1)?;
        let (_, observed) = Observed::new(y, prediction)?;

        // the shared score enters every cumulative logit negatively
        let feature = -features.for_class(0).get(index);
        let derivative =
            (observed.current * feature - observed.previous * feature) / observed.probability;

        Ok(vec![
            self.learning_rate * (derivative - penalty(index, lambda, parameters[0].get(index))),
        ])
    }

    fn cuts_gradient(
        &self,
        y: f32,
        cuts: &[f32],
        linear_combination: &[f32],
        lambda: f32,
    ) -> Result<Vec<f32>, Error> {
        if linear_combination.len() != cuts.len() {
            return Err(Error::shape(
                "linear combination",
                linear_combination.len(),
                "expected one cumulative logit per cut",
            ));
        }
        let distribution = ordinal_probabilities(linear_combination);
        self.cuts_gradient_for_distribution(y, cuts, &distribution, lambda)
    }
}

#[cfg(test)]
mod tests {
    use test_utils::assert_approx_eq;

    use super::*;
    use crate::hypothesis::{Hypothesis, HypothesisKind};

    #[test]
    fn test_shared_factors() {
        let gradient = OrdinalGradient::new(1.);
        let parameters = [FeatureVector::from(vec![2., 3.])];
        let features = FeatureVector::from(vec![2., 3.]);
        let prediction = [0.3, 0.6, 0.1];

        let update = gradient
            .gradient(0, 2., &parameters, Features::Shared(&features), &prediction, 0.001)
            .unwrap();
        assert_approx_eq!(f32, update, [1.8], epsilon = 1e-4);

        let update = gradient
            .gradient(1, 2., &parameters, Features::Shared(&features), &prediction, 0.001)
            .unwrap();
        assert_approx_eq!(f32, update, [2.697], epsilon = 1e-4);
    }

    #[test]
    fn test_per_class_features() {
        let gradient = OrdinalGradient::new(1.);
        let parameters = [FeatureVector::from(vec![2., 3.])];
        let features = [FeatureVector::from(vec![2., 3.])];

        let update = gradient
            .gradient(1, 2., &parameters, Features::PerClass(&features), &[0.3, 0.6, 0.1], 0.001)
            .unwrap();
        assert_approx_eq!(f32, update, [2.697], epsilon = 1e-4);
    }

    #[test]
    fn test_first_class() {
        let gradient = OrdinalGradient::new(1.);
        let parameters = [FeatureVector::from(vec![0., 1.])];
        let features = FeatureVector::from(vec![0., 2.]);

        // F_0 = 0.5, the lower cumulative probability is zero
        let update = gradient
            .gradient(1, 0., &parameters, Features::Shared(&features), &[0.5, 0.5], 0.)
            .unwrap();
        assert_approx_eq!(f32, update, [-1.], epsilon = 1e-6);
    }

    #[test]
    fn test_cuts() {
        let gradient = OrdinalGradient::new(1.);
        let update = gradient
            .cuts_gradient_for_distribution(2., &[0.1, 0.2, 0.1], &[0.1, 0.2, 0.6, 0.1], 0.001)
            .unwrap();
        assert_approx_eq!(f32, update, [-0.2001, -0.2002, 0.1499], epsilon = 1e-5);
    }

    #[test]
    fn test_cuts_from_linear_combination() {
        let gradient = OrdinalGradient::new(0.5);
        let cuts = [0.1, 0.5, 0.2];
        let linear_combination = [-0.3, 0.2, 0.4];
        let distribution = HypothesisKind::Ordinal
            .predict(&linear_combination)
            .unwrap();

        assert_approx_eq!(
            f32,
            gradient
                .cuts_gradient(1., &cuts, &linear_combination, 0.01)
                .unwrap(),
            gradient
                .cuts_gradient_for_distribution(1., &cuts, &distribution, 0.01)
                .unwrap(),
        );
    }

    #[test]
    fn test_cuts_of_last_class() {
        let gradient = OrdinalGradient::new(1.);
        let update = gradient
            .cuts_gradient_for_distribution(2., &[0.1, 0.2], &[0.2, 0.3, 0.5], 0.)
            .unwrap();
        // F_1 = 0.5, F_2 = 1
        assert_approx_eq!(f32, update, [-0.5, -0.5], epsilon = 1e-6);
    }

    #[test]
    fn test_invalid_arguments() {
        let gradient = OrdinalGradient::new(1.);
        assert!(gradient
            .cuts_gradient_for_distribution(3., &[0.1, 0.2], &[0.2, 0.3, 0.5], 0.)
            .unwrap_err()
            .is_invalid_argument());
        assert!(gradient
            .cuts_gradient_for_distribution(1., &[0.1], &[0.2, 0.3, 0.5], 0.)
            .unwrap_err()
            .is_invalid_argument());
        assert!(gradient
            .cuts_gradient(1., &[0.1], &[0.2, 0.3], 0.)
            .unwrap_err()
            .is_invalid_argument());

        let parameters = vec![FeatureVector::from(vec![1.]); 2];
        let features = FeatureVector::from(vec![1.]);
        assert!(gradient
            .gradient(0, 0., &parameters, Features::Shared(&features), &[0.5, 0.5], 0.)
            .unwrap_err()
            .is_unsupported());
    }
}
