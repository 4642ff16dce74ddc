use feature_vector::FeatureVector;

use crate::{
    error::{class_index, Error, Unsupported},
    gradient::{penalty, Features, StochasticGradient},
};

/// The gradient of the multinomial logistic regression.
///
/// Each class vector moves towards its features by the difference of the class indicator and
/// the predicted class probability.
#[derive(Clone, Copy, Debug)]
pub struct SoftmaxGradient {
    learning_rate: f32,
}

impl SoftmaxGradient {
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }
}

impl StochasticGradient for SoftmaxGradient {
    fn gradient(
        &self,
        index: usize,
        y: f32,
        parameters: &[FeatureVector],
        features: Features<'_>,
        prediction: &[f32],
        lambda: f32,
    ) -> Result<Vec<f32>, Error> {
        let classes = parameters.len();
        if classes < 3 {
            return Err(Error::Unsupported(Unsupported::ClassVectors {
                gradient: "softmax",
                class_vectors: classes,
            }));
        }
        features.check_classes(classes)?;
        if prediction.len() != classes {
            return Err(Error::shape(
                "prediction",
                prediction.len(),
                "expected one probability per class vector",
            ));
        }
        let observed = class_index(y, classes)?;

        Ok(parameters
            .iter()
            .zip(prediction)
            .enumerate()
            .map(|(class, (parameters, probability))| {
                let indicator: f32 = if class == observed { 1. } else { 0. };
                self.learning_rate
                    * (features.for_class(class).get(index) * (indicator - probability)
                        - penalty(index, lambda, parameters.get(index)))
            })
            .collect())
    }
}
