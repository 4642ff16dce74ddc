//! Online learners doing one gradient step per observation.

mod factors;
mod side_info;

use feature_vector::FeatureVector;
use log::debug;
use rand::{rngs::StdRng, Rng};

use crate::{
    config::{Config, CutsPolicy, Lambdas},
    data::{ItemId, UserId},
    error::Error,
    gradient::{Features, Gradient, StochasticGradient},
    hypothesis::HypothesisKind,
    model::{
        FeatureVectorModel,
        InMemoryFeatureVectorModel,
        ITEM_INTERCEPT_INDEX,
        RESERVED_SLOTS,
        USER_INTERCEPT_INDEX,
    },
};

pub use self::{factors::FactorsOnlyLearner, side_info::SideInfoAwareLearner};

/// Learns the preferences of users for items from a stream of observations.
pub trait OnlineRecommenderLearner {
    type Model: FeatureVectorModel;

    /// The parameter store.
    fn model(&self) -> &Self::Model;

    fn model_mut(&mut self) -> &mut Self::Model;

    /// Initializes the factors of the user unless they exist already.
    fn initialize_user_if_needed(&mut self, user: UserId) {
        self.model_mut().initialize_user_if_needed(user);
    }

    /// Initializes the factors of the item unless they exist already.
    fn initialize_item_if_needed(&mut self, item: ItemId) {
        self.model_mut().initialize_item_if_needed(item);
    }

    /// Updates the parameters with the observed response of the user to the item.
    ///
    /// # Errors
    /// Fails if the parameters, features and response don't fit to each other or to the
    /// hypothesis. Nothing is written to the store in that case.
    fn train(&mut self, user: UserId, item: ItemId, y: f32) -> Result<(), Error>;

    /// Predicts the response of the user to the item.
    fn predict(&mut self, user: UserId, item: ItemId) -> Result<Vec<f32>, Error>;

    /// Predicts the full distribution of the response of the user to the item.
    fn predict_full(&mut self, user: UserId, item: ItemId) -> Result<Vec<f32>, Error>;
}

/// The regularization rates of a parameter family by index.
///
/// The reserved slots of factor vectors may have their own rate, all other indices share one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Regularization {
    lambda: f32,
    reserved: [Option<f32>; RESERVED_SLOTS],
}

impl Regularization {
    /// The same rate for every index.
    pub fn uniform(lambda: f32) -> Self {
        Self {
            lambda,
            reserved: [None; RESERVED_SLOTS],
        }
    }

    /// The bias rate for the bias slots, the factor rate everywhere else.
    pub fn factors(lambda: f32, bias_lambda: f32) -> Self {
        let mut reserved = [None; RESERVED_SLOTS];
        reserved[USER_INTERCEPT_INDEX] = Some(bias_lambda);
        reserved[ITEM_INTERCEPT_INDEX] = Some(bias_lambda);
        Self { lambda, reserved }
    }

    /// The rate at the index.
    pub fn lambda(&self, index: usize) -> f32 {
        self.reserved
            .get(index)
            .copied()
            .flatten()
            .unwrap_or(self.lambda)
    }
}

/// Computes the updated parameters of a family.
///
/// Only the nonzero indices of the features are visited, each class vector is moved by the
/// gradient at these indices. The frozen index keeps its value.
pub(crate) fn updated_terms<G>(
    gradient: &G,
    parameters: &[FeatureVector],
    features: Features<'_>,
    y: f32,
    prediction: &[f32],
    frozen: Option<usize>,
    regularization: Regularization,
) -> Result<Vec<FeatureVector>, Error>
where
    G: StochasticGradient + ?Sized,
{
    features.check_classes(parameters.len())?;

    let mut updated = parameters.to_vec();
    for index in features.non_zero_indices() {
        if Some(index) == frozen {
            continue;
        }
        let deltas = gradient.gradient(
            index,
            y,
            parameters,
            features,
            prediction,
            regularization.lambda(index),
        )?;
        if deltas.len() != parameters.len() {
            return Err(Error::shape(
                "gradient",
                deltas.len(),
                "expected one update per parameter vector",
            ));
        }
        for (vector, delta) in updated.iter_mut().zip(deltas) {
            let value = vector.get(index) + delta;
            vector.set(index, value)?;
        }
    }

    Ok(updated)
}

/// Computes the updated cuts.
pub(crate) fn updated_cuts<G>(
    gradient: &G,
    y: f32,
    cuts: &[f32],
    linear_combination: &[f32],
    lambda: f32,
    policy: CutsPolicy,
) -> Result<Vec<f32>, Error>
where
    G: StochasticGradient + ?Sized,
{
    let deltas = gradient.cuts_gradient(y, cuts, linear_combination, lambda)?;
    if deltas.len() != cuts.len() {
        return Err(Error::shape(
            "cuts gradient",
            deltas.len(),
            "expected one update per cut",
        ));
    }

    Ok(cuts
        .iter()
        .zip(deltas)
        .enumerate()
        .map(|(index, (cut, delta))| {
            let cut = cut + delta;
            // increments must stay non-negative for monotone thresholds
            if policy == CutsPolicy::ClampIncrements && index > 0 && cut < 0. {
                debug!("clamping the cut {} at {} to zero", index, cut);
                0.
            } else {
                cut
            }
        })
        .collect())
}

/// The cuts and factors of a user and an item.
pub(crate) struct Factors {
    pub(crate) cuts: Vec<f32>,
    pub(crate) alphas: Vec<FeatureVector>,
    pub(crate) betas: Vec<FeatureVector>,
}

impl Factors {
    /// Gets the factors from the model, unknown users and items are initialized.
    pub(crate) fn fetch<M>(model: &mut M, user: UserId, item: ItemId) -> Self
    where
        M: FeatureVectorModel + ?Sized,
    {
        Self {
            cuts: model.cuts(),
            alphas: model.alphas(user),
            betas: model.betas(item),
        }
    }

    /// Computes the updated cuts and factors.
    ///
    /// The factors of each side are the features of the other side.
    pub(crate) fn updated<G>(
        &self,
        gradient: &G,
        y: f32,
        linear_combination: &[f32],
        prediction: &[f32],
        lambdas: Lambdas,
        policy: CutsPolicy,
    ) -> Result<Self, Error>
    where
        G: StochasticGradient + ?Sized,
    {
        let regularization = Regularization::factors(lambdas.factors, lambdas.bias);
        Ok(Self {
            cuts: updated_cuts(
                gradient,
                y,
                &self.cuts,
                linear_combination,
                lambdas.cuts,
                policy,
            )?,
            alphas: updated_terms(
                gradient,
                &self.alphas,
                Features::PerClass(&self.betas),
                y,
                prediction,
                Some(USER_INTERCEPT_INDEX),
                regularization,
            )?,
            betas: updated_terms(
                gradient,
                &self.betas,
                Features::PerClass(&self.alphas),
                y,
                prediction,
                Some(ITEM_INTERCEPT_INDEX),
                regularization,
            )?,
        })
    }

    /// Writes the cuts and factors to the model.
    pub(crate) fn commit<M>(self, model: &mut M, user: UserId, item: ItemId)
    where
        M: FeatureVectorModel + ?Sized,
    {
        model.set_cuts(self.cuts);
        model.set_alphas(user, self.alphas);
        model.set_betas(item, self.betas);
    }
}

/// A learner built from a [`Config`].
pub enum Learner<R = StdRng> {
    FactorsOnly(FactorsOnlyLearner<HypothesisKind, Gradient, InMemoryFeatureVectorModel<R>>),
    SideInfoAware(SideInfoAwareLearner<HypothesisKind, Gradient, InMemoryFeatureVectorModel<R>>),
}

impl<R> Learner<R>
where
    R: Rng,
{
    /// Creates the configured learner with an empty in-memory model.
    ///
    /// # Errors
    /// Fails if the model can't be created for the configured hypothesis.
    pub fn from_config(config: &Config, rng: R) -> Result<Self, Error> {
        let model = InMemoryFeatureVectorModel::from_config(config, rng)?;
        let hypothesis = config.hypothesis();
        let gradient = Gradient::for_hypothesis(hypothesis, config.learning_rate());

        Ok(if config.side_info() {
            Self::SideInfoAware(
                SideInfoAwareLearner::new(hypothesis, gradient, model, config.lambdas())
                    .with_cuts_policy(config.cuts_policy()),
            )
        } else {
            Self::FactorsOnly(
                FactorsOnlyLearner::new(hypothesis, gradient, model, config.lambdas())
                    .with_cuts_policy(config.cuts_policy()),
            )
        })
    }
}

impl<R> OnlineRecommenderLearner for Learner<R>
where
    R: Rng,
{
    type Model = InMemoryFeatureVectorModel<R>;

    fn model(&self) -> &Self::Model {
        match self {
            Self::FactorsOnly(learner) => learner.model(),
            Self::SideInfoAware(learner) => learner.model(),
        }
    }

    fn model_mut(&mut self) -> &mut Self::Model {
        match self {
            Self::FactorsOnly(learner) => learner.model_mut(),
            Self::SideInfoAware(learner) => learner.model_mut(),
        }
    }

    fn train(&mut self, user: UserId, item: ItemId, y: f32) -> Result<(), Error> {
        match self {
            Self::FactorsOnly(learner) => learner.train(user, item, y),
            Self::SideInfoAware(learner) => learner.train(user, item, y),
        }
    }

    fn predict(&mut self, user: UserId, item: ItemId) -> Result<Vec<f32>, Error> {
        match self {
            Self::FactorsOnly(learner) => learner.predict(user, item),
            Self::SideInfoAware(learner) => learner.predict(user, item),
        }
    }

    fn predict_full(&mut self, user: UserId, item: ItemId) -> Result<Vec<f32>, Error> {
        match self {
            Self::FactorsOnly(learner) => learner.predict_full(user, item),
            Self::SideInfoAware(learner) => learner.predict_full(user, item),
        }
    }
}
