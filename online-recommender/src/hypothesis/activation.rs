use ndarray::{Array1, ArrayView1};

/// The logistic function.
pub fn sigmoid(value: f32) -> f32 {
    1. / (1. + (-value).exp())
}

/// Computes the softmax of the values.
pub fn softmax(values: ArrayView1<'_, f32>) -> Array1<f32> {
    // subtract the max to prevent overflow, this doesn't affect the outcome
    let max = values.fold(f32::MIN, |max, &value| max.max(value));
    let exp = values.mapv(|value| (value - max).exp());
    let sum = exp.sum();
    exp / sum
}

/// Computes the class distribution of the proportional odds model.
///
/// The values are the `K - 1` cumulative logits, the result has one probability for each of
/// the `K` classes: the first class gets the first cumulative probability, each following class
/// the difference to its predecessor and the last class the remainder up to one.
pub fn ordinal_probabilities(cumulative_logits: &[f32]) -> Vec<f32> {
    let cumulative = cumulative_logits
        .iter()
        .map(|&value| sigmoid(value))
        .collect::<Vec<_>>();

    let mut previous = 0.;
    let mut probabilities = cumulative
        .iter()
        .map(|&current| {
            let probability = current - previous;
            previous = current;
            probability
        })
        .collect::<Vec<_>>();
    probabilities.push(1. - previous);
    probabilities
}

/// Computes the cumulative probabilities of a class distribution.
pub fn cumulative_probs(distribution: &[f32]) -> Vec<f32> {
    distribution
        .iter()
        .scan(0., |sum, probability| {
            *sum += probability;
            Some(*sum)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use ndarray::arr1;
    use test_utils::assert_approx_eq;

    use super::*;

    #[test]
    fn test_sigmoid() {
        assert_approx_eq!(f32, sigmoid(0.), 0.5);
        assert_approx_eq!(f32, sigmoid(2.), 0.880_797, epsilon = 1e-6);
        assert_approx_eq!(f32, sigmoid(-2.), 0.119_203, epsilon = 1e-6);
    }

    #[test]
    fn test_softmax() {
        let probabilities = softmax(arr1(&[3., 10., 2.]).view());
        assert_approx_eq!(
            f32,
            probabilities,
            [0.000_910_7, 0.998_754_2, 0.000_335_0],
            epsilon = 1e-6,
        );
        assert_approx_eq!(f32, probabilities.sum(), 1., epsilon = 1e-6);
    }

    #[test]
    fn test_softmax_large_values() {
        let probabilities = softmax(arr1(&[1000., 1000., 1000.]).view());
        assert_approx_eq!(f32, probabilities, [1. / 3.; 3], epsilon = 1e-6);
    }

    #[test]
    fn test_ordinal_probabilities() {
        let probabilities = ordinal_probabilities(&[2., 3., 4.]);
        assert_approx_eq!(
            f32,
            probabilities,
            [0.880_797, 0.071_777, 0.029_440, 0.017_986],
            epsilon = 1e-5,
        );
        assert_approx_eq!(f32, probabilities.iter().sum::<f32>(), 1., epsilon = 1e-6);
    }

    #[test]
    fn test_cumulative_probs() {
        assert_approx_eq!(
            f32,
            cumulative_probs(&[0.1, 0.4, 0.2, 0.3]),
            [0.1, 0.5, 0.7, 1.],
            epsilon = 1e-6,
        );
    }
}
