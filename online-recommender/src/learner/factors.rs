use log::{info, trace};

use crate::{
    config::{CutsPolicy, Lambdas},
    data::{ItemId, UserId},
    error::Error,
    gradient::StochasticGradient,
    hypothesis::Hypothesis,
    learner::{Factors, OnlineRecommenderLearner},
    model::FeatureVectorModel,
};

/// Learns the latent factors of users and items from the responses alone.
pub struct FactorsOnlyLearner<H, G, M> {
    hypothesis: H,
    gradient: G,
    model: M,
    lambdas: Lambdas,
    cuts_policy: CutsPolicy,
}

impl<H, G, M> FactorsOnlyLearner<H, G, M>
where
    H: Hypothesis,
    G: StochasticGradient,
    M: FeatureVectorModel,
{
    pub fn new(hypothesis: H, gradient: G, model: M, lambdas: Lambdas) -> Self {
        info!(
            "factors only learner: {} classes, bias lambda {}, factor lambda {}, cuts lambda {}",
            model.number_of_classes(),
            lambdas.bias,
            lambdas.factors,
            lambdas.cuts,
        );
        Self {
            hypothesis,
            gradient,
            model,
            lambdas,
            cuts_policy: CutsPolicy::ClampIncrements,
        }
    }

    /// Sets how the ordinal cuts are updated.
    pub fn with_cuts_policy(self, cuts_policy: CutsPolicy) -> Self {
        Self {
            cuts_policy,
            ..self
        }
    }

    pub fn into_model(self) -> M {
        self.model
    }

    fn linear_combination(&mut self, user: UserId, item: ItemId) -> Result<Vec<f32>, Error> {
        let factors = Factors::fetch(&mut self.model, user, item);
        self.hypothesis
            .linear_combination(&factors.cuts, &factors.alphas, &factors.betas)
    }
}

impl<H, G, M> OnlineRecommenderLearner for FactorsOnlyLearner<H, G, M>
where
    H: Hypothesis,
    G: StochasticGradient,
    M: FeatureVectorModel,
{
    type Model = M;

    fn model(&self) -> &M {
        &self.model
    }

    fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    fn train(&mut self, user: UserId, item: ItemId, y: f32) -> Result<(), Error> {
        let factors = Factors::fetch(&mut self.model, user, item);
        let linear_combination =
            self.hypothesis
                .linear_combination(&factors.cuts, &factors.alphas, &factors.betas)?;
        let prediction = self.hypothesis.predict(&linear_combination)?;
        trace!(
            "training user {} on item {} with {}, predicted {:?}",
            user,
            item,
            y,
            prediction,
        );

        factors
            .updated(
                &self.gradient,
                y,
                &linear_combination,
                &prediction,
                self.lambdas,
                self.cuts_policy,
            )?
            .commit(&mut self.model, user, item);
        Ok(())
    }

    fn predict(&mut self, user: UserId, item: ItemId) -> Result<Vec<f32>, Error> {
        let linear_combination = self.linear_combination(user, item)?;
        self.hypothesis.predict(&linear_combination)
    }

    fn predict_full(&mut self, user: UserId, item: ItemId) -> Result<Vec<f32>, Error> {
        let linear_combination = self.linear_combination(user, item)?;
        self.hypothesis.predict_full(&linear_combination)
    }
}

#[cfg(test)]
mod tests {
    use feature_vector::FeatureVector;
    use mockall::{predicate::eq, Sequence};
    use rand::{rngs::StdRng, SeedableRng};
    use test_utils::assert_approx_eq;

    use super::*;
    use crate::{
        model::{InMemoryFeatureVectorModel, MockFeatureVectorModel},
        tests::stubs::{ConstGradient, FailingHypothesis, IdentityHypothesis},
    };

    fn lambdas() -> Lambdas {
        Lambdas {
            bias: 0.5,
            factors: 0.25,
            cuts: 0.125,
            ..Lambdas::default()
        }
    }

    #[test]
    fn test_train_writes_the_implied_update() {
        let user = UserId(1);
        let item = ItemId(2);
        let alphas = vec![FeatureVector::from(vec![0., 1., 0.5, 0.25])];
        let betas = vec![FeatureVector::from(vec![0., 0.75, 1., 0.5])];

        let mut model = MockFeatureVectorModel::new();
        let mut seq = Sequence::new();
        model.expect_number_of_classes().return_const(1_usize);
        model
            .expect_cuts()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(vec![0.5, 0.25]);
        model
            .expect_alphas()
            .with(eq(user))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(alphas);
        model
            .expect_betas()
            .with(eq(item))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(betas);
        model
            .expect_set_cuts()
            .with(eq(vec![0.75, 0.5]))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        // the user intercept at index 1 stays frozen
        model
            .expect_set_alphas()
            .with(
                eq(user),
                eq(vec![FeatureVector::from(vec![0., 1., 1., 0.75])]),
            )
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        // the item intercept at index 2 stays frozen
        model
            .expect_set_betas()
            .with(
                eq(item),
                eq(vec![FeatureVector::from(vec![0., 1.25, 1., 1.])]),
            )
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let gradient = ConstGradient::new(0.5).with_cuts_update(vec![0.25, 0.25]);
        let mut learner = FactorsOnlyLearner::new(IdentityHypothesis, gradient, model, lambdas());
        learner.train(user, item, 1.).unwrap();

        // alphas are visited at the nonzero betas, betas at the nonzero alphas
        assert_eq!(
            learner.gradient.visited(),
            [(2, 0.5), (3, 0.25), (1, 0.5), (3, 0.25)],
        );
    }

    #[test]
    fn test_failed_train_writes_nothing() {
        let mut model = MockFeatureVectorModel::new();
        model.expect_number_of_classes().return_const(1_usize);
        model.expect_cuts().return_const(Vec::<f32>::new());
        model
            .expect_alphas()
            .return_const(vec![FeatureVector::from(vec![0., 1., 0.5])]);
        model
            .expect_betas()
            .return_const(vec![FeatureVector::from(vec![0., 0.5, 1.])]);
        model.expect_set_cuts().never();
        model.expect_set_alphas().never();
        model.expect_set_betas().never();

        let mut learner =
            FactorsOnlyLearner::new(FailingHypothesis, ConstGradient::new(1.), model, lambdas());
        assert!(learner
            .train(UserId(1), ItemId(1), 1.)
            .unwrap_err()
            .is_invalid_argument());
    }

    #[test]
    fn test_unsupported_gradient_writes_nothing() {
        let model =
            InMemoryFeatureVectorModel::new(2, 3, false, StdRng::seed_from_u64(3)).unwrap();
        let gradient = crate::gradient::DefaultGradient::new(0.1);
        let mut learner = FactorsOnlyLearner::new(IdentityHypothesis, gradient, model, lambdas());

        let user = UserId(1);
        let item = ItemId(1);
        let alphas = learner.model_mut().alphas(user);
        let betas = learner.model_mut().betas(item);

        let error = learner.train(user, item, 1.).unwrap_err();
        assert!(error.is_unsupported());
        assert_eq!(learner.model_mut().alphas(user), alphas);
        assert_eq!(learner.model_mut().betas(item), betas);
    }

    #[test]
    fn test_predict_initializes_unknown_ids() {
        let model =
            InMemoryFeatureVectorModel::new(2, 1, false, StdRng::seed_from_u64(3)).unwrap();
        let mut learner =
            FactorsOnlyLearner::new(IdentityHypothesis, ConstGradient::new(1.), model, lambdas());
        let user = UserId(4);
        let item = ItemId(5);
        assert!(!learner.model().contains_user(user));

        let prediction = learner.predict(user, item).unwrap();
        assert!(learner.model().contains_user(user));
        assert!(learner.model().contains_item(item));

        let alphas = learner.model_mut().alphas(user);
        let betas = learner.model_mut().betas(item);
        assert_approx_eq!(f32, prediction, [alphas[0].dot(&betas[0]).unwrap()]);
        assert_approx_eq!(f32, learner.predict_full(user, item).unwrap(), prediction);
    }
}
