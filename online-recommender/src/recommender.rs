use std::collections::{BTreeSet, HashMap};

use itertools::Itertools;
use log::info;

use crate::{
    data::{ItemId, Ratings, UserId},
    error::{Error, Unsupported},
    learner::OnlineRecommenderLearner,
    model::FeatureVectorModel,
    utils::nan_safe_f32_cmp_desc,
};

/// How a single preference is derived from a predicted class distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RatingPredictionStrategy {
    /// The score on the target class, which is the prediction itself for numerical models.
    ScoreOnTargetClass,
    /// The index of the most probable class, ties go to the higher class.
    MostProbableClass,
}

impl RatingPredictionStrategy {
    /// Derives the preference from the distribution.
    ///
    /// # Errors
    /// Fails if the target class is not part of the distribution or if the most probable class
    /// is asked for a numerical prediction.
    pub fn predict(&self, distribution: &[f32], target_class: usize) -> Result<f32, Error> {
        match self {
            Self::ScoreOnTargetClass => distribution.get(target_class).copied().ok_or_else(|| {
                Error::shape(
                    "class distribution",
                    distribution.len(),
                    "the target class is out of bounds",
                )
            }),
            Self::MostProbableClass => {
                if distribution.len() <= 1 {
                    return Err(Error::Unsupported(
                        Unsupported::MostProbableClassOfNumericalModel,
                    ));
                }
                let (most_probable, _) = distribution.iter().enumerate().fold(
                    (0, f32::NAN),
                    |(best, max), (class, &probability)| {
                        if max.is_nan() || probability >= max {
                            (class, probability)
                        } else {
                            (best, max)
                        }
                    },
                );
                Ok(most_probable as f32)
            }
        }
    }
}

/// Keeps track of the preferences of users and recommends items based on an online learner.
///
/// Every new preference is one training step of the learner.
pub struct OnlineFactorizationRecommender<L> {
    learner: L,
    strategy: RatingPredictionStrategy,
    target_class: usize,
    preferences: Ratings,
    preferred_by: HashMap<ItemId, BTreeSet<UserId>>,
}

impl<L> OnlineFactorizationRecommender<L>
where
    L: OnlineRecommenderLearner,
{
    /// Creates a recommender without any preferences.
    ///
    /// The target class is the highest class, preferences are estimated as the score on it.
    pub fn new(learner: L) -> Self {
        let target_class = learner.model().number_of_classes().saturating_sub(1);
        info!(
            "creating a recommender with target class {} scoring on the target class",
            target_class,
        );
        Self {
            learner,
            strategy: RatingPredictionStrategy::ScoreOnTargetClass,
            target_class,
            preferences: Ratings::new(),
            preferred_by: HashMap::new(),
        }
    }

    pub fn with_strategy(self, strategy: RatingPredictionStrategy) -> Self {
        info!("estimating preferences with {:?}", strategy);
        Self { strategy, ..self }
    }

    /// Sets the class whose score is used for the estimates and the ranking.
    ///
    /// # Errors
    /// Fails if the model doesn't have the class.
    pub fn with_target_class(self, target_class: usize) -> Result<Self, Error> {
        let classes = self.learner.model().number_of_classes();
        if target_class < classes {
            Ok(Self {
                target_class,
                ..self
            })
        } else {
            Err(Error::InvalidClass {
                response: target_class as f32,
                classes,
            })
        }
    }

    pub fn target_class(&self) -> usize {
        self.target_class
    }

    pub fn learner(&self) -> &L {
        &self.learner
    }

    pub fn learner_mut(&mut self) -> &mut L {
        &mut self.learner
    }

    pub fn into_learner(self) -> L {
        self.learner
    }

    /// The recorded preferences.
    pub fn preferences(&self) -> &Ratings {
        &self.preferences
    }

    /// Trains the learner with the preference and records it.
    ///
    /// # Errors
    /// Fails if the learner rejects the preference, which isn't recorded then.
    pub fn set_preference(
        &mut self,
        user: UserId,
        item: ItemId,
        rating: f32,
    ) -> Result<(), Error> {
        self.learner.initialize_user_if_needed(user);
        self.learner.initialize_item_if_needed(item);
        self.learner.train(user, item, rating)?;

        self.preferences
            .entry(user)
            .or_default()
            .insert(item, rating);
        self.preferred_by.entry(item).or_default().insert(user);
        Ok(())
    }

    /// Estimates the preference of the user for the item with the configured strategy.
    pub fn estimate_preference(&mut self, user: UserId, item: ItemId) -> Result<f32, Error> {
        let distribution = self.predict_all(user, item)?;
        self.strategy.predict(&distribution, self.target_class)
    }

    /// Predicts the scores of all classes.
    pub fn predict_all(&mut self, user: UserId, item: ItemId) -> Result<Vec<f32>, Error> {
        self.learner.predict_full(user, item)
    }

    /// Recommends the items with the highest score on the target class.
    ///
    /// Candidates are the items preferred by users sharing a preferred item with the user,
    /// except for the items the user prefers already.
    pub fn recommend(
        &mut self,
        user: UserId,
        how_many: usize,
    ) -> Result<Vec<(ItemId, f32)>, Error> {
        let candidates = self.candidates(user);
        let target_class = self.target_class;
        let scored = candidates
            .into_iter()
            .map(|item| {
                let distribution = self.predict_all(user, item)?;
                RatingPredictionStrategy::ScoreOnTargetClass
                    .predict(&distribution, target_class)
                    .map(|score| (item, score))
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(scored
            .into_iter()
            .sorted_by(|(_, a), (_, b)| nan_safe_f32_cmp_desc(a, b))
            .take(how_many)
            .collect())
    }

    fn candidates(&self, user: UserId) -> BTreeSet<ItemId> {
        let own = match self.preferences.get(&user) {
            Some(own) => own,
            None => return BTreeSet::new(),
        };

        own.keys()
            .filter_map(|item| self.preferred_by.get(item))
            .flatten()
            .filter(|neighbor| **neighbor != user)
            .filter_map(|neighbor| self.preferences.get(neighbor))
            .flat_map(HashMap::keys)
            .filter(|item| !own.contains_key(*item))
            .copied()
            .collect()
    }
}
