//! Deterministic stand-ins for the hypothesis and gradient traits.

use std::cell::RefCell;

use feature_vector::FeatureVector;

use crate::{
    error::Error,
    gradient::{Features, StochasticGradient},
    hypothesis::Hypothesis,
};

/// Predicts the linear combination itself.
pub(crate) struct IdentityHypothesis;

impl Hypothesis for IdentityHypothesis {
    fn predict(&self, linear_combination: &[f32]) -> Result<Vec<f32>, Error> {
        Ok(linear_combination.to_vec())
    }

    fn predict_full(&self, linear_combination: &[f32]) -> Result<Vec<f32>, Error> {
        self.predict(linear_combination)
    }
}

/// Fails every prediction with a shape error.
pub(crate) struct FailingHypothesis;

impl Hypothesis for FailingHypothesis {
    fn predict(&self, linear_combination: &[f32]) -> Result<Vec<f32>, Error> {
        Err(Error::shape(
            "linear combination",
            linear_combination.len(),
            "always fails",
        ))
    }

    fn predict_full(&self, linear_combination: &[f32]) -> Result<Vec<f32>, Error> {
        self.predict(linear_combination)
    }
}

/// Moves every class vector by the same constant and records the visited indices with their
/// regularization rates.
pub(crate) struct ConstGradient {
    update: f32,
    cuts_update: Option<Vec<f32>>,
    visited: RefCell<Vec<(usize, f32)>>,
}

impl ConstGradient {
    pub(crate) fn new(update: f32) -> Self {
        Self {
            update,
            cuts_update: None,
            visited: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn with_cuts_update(self, cuts_update: Vec<f32>) -> Self {
        Self {
            cuts_update: Some(cuts_update),
            ..self
        }
    }

    pub(crate) fn visited(&self) -> Vec<(usize, f32)> {
        self.visited.borrow().clone()
    }
}

impl StochasticGradient for ConstGradient {
    fn gradient(
        &self,
        index: usize,
        _y: f32,
        parameters: &[FeatureVector],
        _features: Features<'_>,
        _prediction: &[f32],
        lambda: f32,
    ) -> Result<Vec<f32>, Error> {
        self.visited.borrow_mut().push((index, lambda));
        Ok(vec![self.update; parameters.len()])
    }

    fn cuts_gradient(
        &self,
        _y: f32,
        cuts: &[f32],
        _linear_combination: &[f32],
        _lambda: f32,
    ) -> Result<Vec<f32>, Error> {
        Ok(self
            .cuts_update
            .clone()
            .unwrap_or_else(|| vec![0.; cuts.len()]))
    }
}
