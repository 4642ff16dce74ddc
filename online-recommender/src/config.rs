use displaydoc::Display;
use thiserror::Error;

use crate::hypothesis::HypothesisKind;

/// The regularization rates of the parameter families.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lambdas {
    /// Rate of the user and item biases.
    pub bias: f32,
    /// Rate of the latent factors.
    pub factors: f32,
    /// Rate of the item parameters projecting user side information.
    pub user_side: f32,
    /// Rate of the user parameters projecting item side information.
    pub item_side: f32,
    /// Rate of the parameters projecting dynamic side information.
    pub dynamic_side: f32,
    /// Rate of the ordinal cuts.
    pub cuts: f32,
}

impl Default for Lambdas {
    fn default() -> Self {
        Self {
            bias: 0.005,
            factors: 0.025,
            user_side: 0.,
            item_side: 0.,
            dynamic_side: 0.,
            cuts: 0.,
        }
    }
}

impl Lambdas {
    fn iter(&self) -> impl Iterator<Item = f32> {
        IntoIterator::into_iter([
            self.bias,
            self.factors,
            self.user_side,
            self.item_side,
            self.dynamic_side,
            self.cuts,
        ])
    }
}

/// How the ordinal cuts are updated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CutsPolicy {
    /// Adds the gradient and clamps the threshold increments at zero.
    ClampIncrements,
    /// Adds the gradient as is.
    Unclamped,
}

/// The configuration of a learner.
#[derive(Clone, Debug)]
pub struct Config {
    hypothesis: HypothesisKind,
    classes: usize,
    factor_size: usize,
    learning_rate: f32,
    lambdas: Lambdas,
    side_info: bool,
    cuts_policy: CutsPolicy,
}

/// Potential errors of the learner configuration.
#[derive(Copy, Clone, Debug, Display, Error, PartialEq)]
pub enum ConfigError {
    /// Invalid number of classes {classes} for the {hypothesis} hypothesis
    Classes {
        hypothesis: HypothesisKind,
        classes: usize,
    },
    /// Invalid factor size, expected positive value
    FactorSize,
    /// Invalid learning rate, expected positive finite value
    LearningRate,
    /// Invalid regularization rates, expected non-negative finite values
    Lambdas,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hypothesis: HypothesisKind::Ols,
            classes: 1,
            factor_size: 150,
            learning_rate: 0.005,
            lambdas: Lambdas::default(),
            side_info: false,
            cuts_policy: CutsPolicy::ClampIncrements,
        }
    }
}

impl Config {
    /// The hypothesis, which also determines the gradient.
    pub fn hypothesis(&self) -> HypothesisKind {
        self.hypothesis
    }

    /// The number of classes of the response, `1` for numerical responses.
    pub fn classes(&self) -> usize {
        self.classes
    }

    /// Sets the hypothesis together with the number of classes.
    ///
    /// # Errors
    /// Fails if the hypothesis can't model the number of classes.
    pub fn with_hypothesis(
        self,
        hypothesis: HypothesisKind,
        classes: usize,
    ) -> Result<Self, ConfigError> {
        if hypothesis.supports_classes(classes) {
            Ok(Self {
                hypothesis,
                classes,
                ..self
            })
        } else {
            Err(ConfigError::Classes {
                hypothesis,
                classes,
            })
        }
    }

    /// The number of latent factors besides the reserved and bias slots.
    pub fn factor_size(&self) -> usize {
        self.factor_size
    }

    /// Sets the factor size.
    ///
    /// # Errors
    /// Fails if the factor size is zero.
    pub fn with_factor_size(self, factor_size: usize) -> Result<Self, ConfigError> {
        if factor_size > 0 {
            Ok(Self {
                factor_size,
                ..self
            })
        } else {
            Err(ConfigError::FactorSize)
        }
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// Sets the learning rate.
    ///
    /// # Errors
    /// Fails if the learning rate is not positive and finite.
    pub fn with_learning_rate(self, learning_rate: f32) -> Result<Self, ConfigError> {
        if learning_rate.is_finite() && learning_rate > 0. {
            Ok(Self {
                learning_rate,
                ..self
            })
        } else {
            Err(ConfigError::LearningRate)
        }
    }

    /// The regularization rates.
    pub fn lambdas(&self) -> Lambdas {
        self.lambdas
    }

    /// Sets the regularization rates.
    ///
    /// # Errors
    /// Fails if any rate is negative or not finite.
    pub fn with_lambdas(self, lambdas: Lambdas) -> Result<Self, ConfigError> {
        if lambdas.iter().all(|lambda| lambda.is_finite() && lambda >= 0.) {
            Ok(Self { lambdas, ..self })
        } else {
            Err(ConfigError::Lambdas)
        }
    }

    /// Whether side information is learned alongside the factors.
    pub fn side_info(&self) -> bool {
        self.side_info
    }

    pub fn with_side_info(self, side_info: bool) -> Self {
        Self { side_info, ..self }
    }

    pub fn cuts_policy(&self) -> CutsPolicy {
        self.cuts_policy
    }

    pub fn with_cuts_policy(self, cuts_policy: CutsPolicy) -> Self {
        Self {
            cuts_policy,
            ..self
        }
    }
}
