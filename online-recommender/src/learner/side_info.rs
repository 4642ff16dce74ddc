use feature_vector::FeatureVector;
use log::{info, trace};

use crate::{
    config::{CutsPolicy, Lambdas},
    data::{ItemId, UserId},
    error::Error,
    gradient::{Features, StochasticGradient},
    hypothesis::{Hypothesis, SideInfoTerm},
    learner::{updated_terms, Factors, OnlineRecommenderLearner, Regularization},
    model::FeatureVectorModel,
};

/// Learns the latent factors together with the projections of the side information.
///
/// Users project the item side information `t` and the dynamic side information `z`, items
/// project the user side information `x` and `z`.
pub struct SideInfoAwareLearner<H, G, M> {
    hypothesis: H,
    gradient: G,
    model: M,
    lambdas: Lambdas,
    cuts_policy: CutsPolicy,
}

/// The side information of a user and item pair with the parameters projecting it.
struct SideInfo {
    x: FeatureVector,
    t: FeatureVector,
    z: FeatureVector,
    thetas_on_t: Vec<FeatureVector>,
    thetas_on_z: Vec<FeatureVector>,
    gammas_on_x: Vec<FeatureVector>,
    gammas_on_z: Vec<FeatureVector>,
}

impl SideInfo {
    fn fetch<M>(model: &mut M, user: UserId, item: ItemId) -> Self
    where
        M: FeatureVectorModel + ?Sized,
    {
        Self {
            x: model.x(user),
            t: model.t(item),
            z: model.z(user, item),
            thetas_on_t: model.thetas_on_t(user),
            thetas_on_z: model.thetas_on_z(user),
            gammas_on_x: model.gammas_on_x(item),
            gammas_on_z: model.gammas_on_z(item),
        }
    }

    fn terms(&self) -> [SideInfoTerm<'_>; 4] {
        [
            SideInfoTerm {
                parameters: &self.thetas_on_t,
                features: &self.t,
            },
            SideInfoTerm {
                parameters: &self.thetas_on_z,
                features: &self.z,
            },
            SideInfoTerm {
                parameters: &self.gammas_on_x,
                features: &self.x,
            },
            SideInfoTerm {
                parameters: &self.gammas_on_z,
                features: &self.z,
            },
        ]
    }
}

impl<H, G, M> SideInfoAwareLearner<H, G, M>
where
    H: Hypothesis,
    G: StochasticGradient,
    M: FeatureVectorModel,
{
    pub fn new(hypothesis: H, gradient: G, model: M, lambdas: Lambdas) -> Self {
        info!(
            "creating a side info aware learner with {} classes: {:?}",
            model.number_of_classes(),
            lambdas,
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
        let side_info = SideInfo::fetch(&mut self.model, user, item);
        self.hypothesis.linear_combination_with_side_info(
            &factors.cuts,
            &factors.alphas,
            &factors.betas,
            &side_info.terms(),
        )
    }

    /// Computes the updated projections of the side information.
    fn updated_side_info(
        &self,
        side_info: SideInfo,
        y: f32,
        prediction: &[f32],
    ) -> Result<SideInfo, Error> {
        let lambdas = self.lambdas;
        let update = |parameters: &[FeatureVector], features: &FeatureVector, lambda: f32| {
            updated_terms(
                &self.gradient,
                parameters,
                Features::Shared(features),
                y,
                prediction,
                None,
                Regularization::uniform(lambda),
            )
        };

        Ok(SideInfo {
            thetas_on_t: update(&side_info.thetas_on_t, &side_info.t, lambdas.item_side)?,
            thetas_on_z: update(&side_info.thetas_on_z, &side_info.z, lambdas.dynamic_side)?,
            gammas_on_x: update(&side_info.gammas_on_x, &side_info.x, lambdas.user_side)?,
            gammas_on_z: update(&side_info.gammas_on_z, &side_info.z, lambdas.dynamic_side)?,
            ..side_info
        })
    }
}

impl<H, G, M> OnlineRecommenderLearner for SideInfoAwareLearner<H, G, M>
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
        let side_info = SideInfo::fetch(&mut self.model, user, item);
        let linear_combination = self.hypothesis.linear_combination_with_side_info(
            &factors.cuts,
            &factors.alphas,
            &factors.betas,
            &side_info.terms(),
        )?;
        let prediction = self.hypothesis.predict(&linear_combination)?;
        trace!(
            "training user {} on item {} with {}, predicted {:?}",
            user,
            item,
            y,
            prediction,
        );

        let factors = factors.updated(
            &self.gradient,
            y,
            &linear_combination,
            &prediction,
            self.lambdas,
            self.cuts_policy,
        )?;
        let side_info = self.updated_side_info(side_info, y, &prediction)?;

        factors.commit(&mut self.model, user, item);
        self.model.set_thetas_on_t(user, side_info.thetas_on_t);
        self.model.set_thetas_on_z(user, side_info.thetas_on_z);
        self.model.set_gammas_on_x(item, side_info.gammas_on_x);
        self.model.set_gammas_on_z(item, side_info.gammas_on_z);
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
    use rand::{rngs::StdRng, SeedableRng};
    use test_utils::assert_approx_eq;

    use super::*;
    use crate::{
        model::InMemoryFeatureVectorModel,
        tests::stubs::{ConstGradient, FailingHypothesis, IdentityHypothesis},
    };

    fn lambdas() -> Lambdas {
        Lambdas {
            bias: 0.5,
            factors: 0.25,
            user_side: 0.1,
            item_side: 0.2,
            dynamic_side: 0.3,
            cuts: 0.,
        }
    }

    fn model() -> InMemoryFeatureVectorModel {
        let mut model =
            InMemoryFeatureVectorModel::new(2, 1, false, StdRng::seed_from_u64(11)).unwrap();
        model.set_x(UserId(1), FeatureVector::sparse(vec![(0, 1.), (4, 2.)]));
        model.set_t(ItemId(2), FeatureVector::sparse(vec![(1, 1.)]));
        model.set_z(UserId(1), ItemId(2), FeatureVector::sparse(vec![(7, 3.)]));
        model
    }

    #[test]
    fn test_side_info_parameters_follow_their_features() {
        let user = UserId(1);
        let item = ItemId(2);
        let mut learner = SideInfoAwareLearner::new(
            IdentityHypothesis,
            ConstGradient::new(0.5),
            model(),
            lambdas(),
        );

        learner.train(user, item, 1.).unwrap();
        let model = learner.model_mut();
        assert_eq!(
            model.thetas_on_t(user),
            [FeatureVector::sparse(vec![(1, 0.5)])],
        );
        assert_eq!(
            model.thetas_on_z(user),
            [FeatureVector::sparse(vec![(7, 0.5)])],
        );
        assert_eq!(
            model.gammas_on_x(item),
            [FeatureVector::sparse(vec![(0, 0.5), (4, 0.5)])],
        );
        assert_eq!(
            model.gammas_on_z(item),
            [FeatureVector::sparse(vec![(7, 0.5)])],
        );

        // three visits per factor family, then t, z, x and z without any intercept override
        let side_info_visits = learner.gradient.visited()[6..].to_vec();
        assert_eq!(
            side_info_visits,
            [(1, 0.2), (7, 0.3), (0, 0.1), (4, 0.1), (7, 0.3)],
        );
    }

    #[test]
    fn test_side_info_enters_the_prediction() {
        let user = UserId(1);
        let item = ItemId(2);
        let mut learner = SideInfoAwareLearner::new(
            IdentityHypothesis,
            ConstGradient::new(0.5),
            model(),
            lambdas(),
        );

        let factors_only = {
            let alphas = learner.model_mut().alphas(user);
            let betas = learner.model_mut().betas(item);
            alphas[0].dot(&betas[0]).unwrap()
        };
        assert_approx_eq!(
            f32,
            learner.predict(user, item).unwrap(),
            [factors_only],
        );

        learner
            .model_mut()
            .set_gammas_on_x(item, vec![FeatureVector::sparse(vec![(4, 1.5)])]);
        assert_approx_eq!(
            f32,
            learner.predict_full(user, item).unwrap(),
            [factors_only + 3.],
            epsilon = 1e-6,
        );
    }

    #[test]
    fn test_failed_train_writes_nothing() {
        let user = UserId(1);
        let item = ItemId(2);
        let mut learner = SideInfoAwareLearner::new(
            FailingHypothesis,
            ConstGradient::new(0.5),
            model(),
            lambdas(),
        );
        let alphas = learner.model_mut().alphas(user);

        assert!(learner.train(user, item, 1.).is_err());
        assert_eq!(learner.model_mut().alphas(user), alphas);
        assert_eq!(
            learner.model_mut().gammas_on_x(item),
            [FeatureVector::empty_sparse()],
        );
    }
}
