use feature_vector::FeatureVector;
use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::model::RESERVED_SLOTS;

/// Draws the factor vectors of a user or an item.
///
/// Factors are sampled from `U(0.1, 0.2)`, the reserved slot `0` is zero and the intercept
/// slot holds the constant `1`.
pub(crate) fn random_factors<R>(
    rng: &mut R,
    factor_size: usize,
    class_vectors: usize,
    intercept_index: usize,
) -> Vec<FeatureVector>
where
    R: Rng + ?Sized,
{
    let dist = Uniform::new(0.1_f32, 0.2);
    (0..class_vectors)
        .map(|_| {
            let mut factors =
                Array1::from_shape_simple_fn(factor_size + RESERVED_SLOTS, || dist.sample(rng));
            factors[0] = 0.;
            factors[intercept_index] = 1.;
            factors.into()
        })
        .collect()
}

/// Draws the initial cuts.
///
/// Ordinal models start with a first threshold from `U(0.1, 0.2)` followed by equal increments
/// summing up to `0.9`, all other models carry zero cuts.
pub(crate) fn initial_cuts<R>(rng: &mut R, classes: usize, ordinal: bool) -> Vec<f32>
where
    R: Rng + ?Sized,
{
    let len = classes.saturating_sub(1);
    if !ordinal || len == 0 {
        return vec![0.; len];
    }

    let increment = 0.9 / len as f32;
    let mut cuts = vec![increment; len];
    cuts[0] = Uniform::new(0.1_f32, 0.2).sample(rng);
    cuts
}
