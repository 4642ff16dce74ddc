use feature_vector::FeatureVector;

use crate::{
    error::{Error, Unsupported},
    gradient::{penalty, Features, StochasticGradient},
};

/// The gradient of the canonical link models with a point prediction.
///
/// The linear, logistic and Poisson regressions share the `(y - prediction)` form.
#[derive(Clone, Copy, Debug)]
pub struct DefaultGradient {
    learning_rate: f32,
}

impl DefaultGradient {
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }
}

impl StochasticGradient for DefaultGradient {
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
                gradient: "default",
                class_vectors: parameters.len(),
            }));
        }
        features.check_classes(1)?;
        let prediction = prediction
            .first()
            .ok_or_else(|| Error::shape("prediction", 0, "expected a point prediction"))?;

        let residual = y - prediction;
        let gradient = if index == 0 {
            residual
        } else {
            features.for_class(0).get(index) * residual
                - penalty(index, lambda, parameters[0].get(index))
        };

        Ok(vec![self.learning_rate * gradient])
    }
}

#[cfg(test)]
mod tests {
    use test_utils::assert_approx_eq;

    use super::*;

    fn thetas() -> Vec<FeatureVector> {
        vec![FeatureVector::sparse(vec![(0, 3.), (1, 4.), (5, 5.), (7, 2.)])]
    }

    fn t() -> FeatureVector {
        FeatureVector::sparse(vec![(0, 1.), (1, 2.), (5, 4.), (7, 3.)])
    }

    #[test]
    fn test_intercept() {
        let gradient = DefaultGradient::new(0.1);
        let alphas = [FeatureVector::from(vec![1., 2., 3.])];
        let betas = [FeatureVector::from(vec![3., 2., 1.])];

        let update = gradient
            .gradient(0, 20., &alphas, Features::PerClass(&betas), &[10.], 0.01)
            .unwrap();
        assert_approx_eq!(f32, update, [1.]);

        let update = gradient
            .gradient(0, 20., &thetas(), Features::Shared(&t()), &[34.], 0.01)
            .unwrap();
        assert_approx_eq!(f32, update, [-1.4], epsilon = 1e-6);
    }

    #[test]
    fn test_regularized_index() {
        let gradient = DefaultGradient::new(0.1);

        let update = gradient
            .gradient(5, 20., &thetas(), Features::Shared(&t()), &[34.], 0.01)
            .unwrap();
        assert_approx_eq!(f32, update, [-5.605], epsilon = 1e-5);

        // a perfect prediction only leaves the penalty
        let update = gradient
            .gradient(5, 20., &thetas(), Features::Shared(&t()), &[20.], 0.01)
            .unwrap();
        assert_approx_eq!(f32, update, [-0.005], epsilon = 1e-6);
    }

    #[test]
    fn test_logistic() {
        let gradient = DefaultGradient::new(0.1);

        let update = gradient
            .gradient(7, 0., &thetas(), Features::Shared(&t()), &[0.98], 0.01)
            .unwrap();
        assert_approx_eq!(f32, update, [-0.296], epsilon = 1e-5);

        let alphas = [FeatureVector::from(vec![1., 2., 3.])];
        let betas = [FeatureVector::from(vec![3., 2., 1.])];
        let update = gradient
            .gradient(1, 0., &alphas, Features::PerClass(&betas), &[0.98], 0.01)
            .unwrap();
        assert_approx_eq!(f32, update, [-0.198], epsilon = 1e-5);
    }

    #[test]
    fn test_poisson() {
        let gradient = DefaultGradient::new(0.1);
        let update = gradient
            .gradient(1, 10., &thetas(), Features::Shared(&t()), &[3_f32.exp()], 0.01)
            .unwrap();
        assert_approx_eq!(f32, update, [-2.021_107], epsilon = 1e-4);
    }

    #[test]
    fn test_multiple_class_vectors_are_unsupported() {
        let gradient = DefaultGradient::new(0.1);
        let thetas = vec![thetas()[0].clone(); 2];
        let error = gradient
            .gradient(1, 1., &thetas, Features::Shared(&t()), &[0.5], 0.01)
            .unwrap_err();
        assert!(error.is_unsupported());
    }

    #[test]
    fn test_missing_prediction() {
        let gradient = DefaultGradient::new(0.1);
        let error = gradient
            .gradient(1, 1., &thetas(), Features::Shared(&t()), &[], 0.01)
            .unwrap_err();
        assert!(error.is_invalid_argument());
    }
}
