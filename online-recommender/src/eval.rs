//! Scores of predicted ratings against held out ratings.

use std::collections::HashMap;

use crate::{
    data::{ItemId, Ratings, UserId},
    error::{class_index, Error},
    learner::OnlineRecommenderLearner,
    recommender::OnlineFactorizationRecommender,
};

/// Estimates the preferences for all held out ratings.
pub fn predict_ratings<L>(
    recommender: &mut OnlineFactorizationRecommender<L>,
    ratings: &Ratings,
) -> Result<Ratings, Error>
where
    L: OnlineRecommenderLearner,
{
    let mut predictions = Ratings::with_capacity(ratings.len());
    for (&user, items) in ratings {
        let predicted = predictions
            .entry(user)
            .or_insert_with(|| HashMap::with_capacity(items.len()));
        for &item in items.keys() {
            predicted.insert(item, recommender.estimate_preference(user, item)?);
        }
    }
    Ok(predictions)
}

fn predicted(
    user: UserId,
    item: ItemId,
    predictions: Option<&HashMap<ItemId, f32>>,
) -> Result<f32, Error> {
    predictions
        .and_then(|predictions| predictions.get(&item))
        .copied()
        .ok_or(Error::MissingPrediction { user, item })
}

/// Error metrics of numerical ratings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumericalMetric {
    /// root mean squared error
    Rmse,
    /// mean absolute error
    Mae,
}

impl NumericalMetric {
    fn rating_error(&self, actual: f32, predicted: f32) -> f32 {
        let error = (actual - predicted).abs();
        match self {
            Self::Rmse => error * error,
            Self::Mae => error,
        }
    }

    fn finish(&self, mean_error: f32) -> f32 {
        match self {
            Self::Rmse => mean_error.sqrt(),
            Self::Mae => mean_error,
        }
    }

    fn total_error(
        &self,
        user: UserId,
        actual: &HashMap<ItemId, f32>,
        predictions: Option<&HashMap<ItemId, f32>>,
    ) -> Result<f32, Error> {
        actual.iter().try_fold(0., |total, (&item, &rating)| {
            predicted(user, item, predictions)
                .map(|prediction| total + self.rating_error(rating, prediction))
        })
    }

    /// The score of the ratings of a single user.
    ///
    /// # Errors
    /// Fails if the user has no ratings or a rating has no prediction.
    pub fn user_score(
        &self,
        user: UserId,
        actual: &HashMap<ItemId, f32>,
        predictions: &HashMap<ItemId, f32>,
    ) -> Result<f32, Error> {
        if actual.is_empty() {
            return Err(Error::NoRatings);
        }
        let total = self.total_error(user, actual, Some(predictions))?;
        Ok(self.finish(total / actual.len() as f32))
    }

    /// The score of all ratings, every rating has the same weight.
    ///
    /// # Errors
    /// Fails if there are no ratings or a rating has no prediction.
    pub fn aggregate_score(&self, actual: &Ratings, predictions: &Ratings) -> Result<f32, Error> {
        let mut total = 0.;
        let mut count = 0;
        for (&user, ratings) in actual {
            total += self.total_error(user, ratings, predictions.get(&user))?;
            count += ratings.len();
        }
        if count == 0 {
            return Err(Error::NoRatings);
        }
        Ok(self.finish(total / count as f32))
    }
}

/// Per class precision and recall.
#[derive(Clone, Debug, PartialEq)]
pub struct PrecisionAndRecall {
    pub precision: Vec<f32>,
    pub recall: Vec<f32>,
}

impl PrecisionAndRecall {
    /// Compares the classes predicted for a user with the actual ones.
    ///
    /// Classes which are never predicted have a precision of `0`, classes which never occur
    /// a recall of `0`.
    ///
    /// # Errors
    /// Fails if a rating has no prediction or a rating or prediction is not a class.
    pub fn of_user(
        classes: usize,
        user: UserId,
        actual: &HashMap<ItemId, f32>,
        predictions: Option<&HashMap<ItemId, f32>>,
    ) -> Result<Self, Error> {
        let mut true_positives = vec![0_usize; classes];
        let mut relevant = vec![0_usize; classes];
        let mut recommended = vec![0_usize; classes];

        for (&item, &rating) in actual {
            let actual = class_index(rating, classes)?;
            let predicted = class_index(predicted(user, item, predictions)?, classes)?;
            relevant[actual] += 1;
            recommended[predicted] += 1;
            if actual == predicted {
                true_positives[predicted] += 1;
            }
        }

        let ratio = |hits: &[usize], totals: &[usize]| -> Vec<f32> {
            hits.iter()
                .zip(totals)
                .map(|(&hits, &total)| {
                    if total > 0 {
                        hits as f32 / total as f32
                    } else {
                        0.
                    }
                })
                .collect()
        };
        Ok(Self {
            precision: ratio(&true_positives, &recommended),
            recall: ratio(&true_positives, &relevant),
        })
    }
}

/// Per class metrics of categorical ratings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CategoricalMetric {
    Precision,
    Recall,
}

impl CategoricalMetric {
    fn select(&self, scores: PrecisionAndRecall) -> Vec<f32> {
        match self {
            Self::Precision => scores.precision,
            Self::Recall => scores.recall,
        }
    }

    /// The per class score of the ratings of a single user.
    ///
    /// # Errors
    /// Fails if a rating has no prediction or a rating or prediction is not a class.
    pub fn user_score(
        &self,
        classes: usize,
        user: UserId,
        actual: &HashMap<ItemId, f32>,
        predictions: &HashMap<ItemId, f32>,
    ) -> Result<Vec<f32>, Error> {
        PrecisionAndRecall::of_user(classes, user, actual, Some(predictions))
            .map(|scores| self.select(scores))
    }

    /// The per class score averaged over all users.
    ///
    /// # Errors
    /// Fails if there are no users, a rating has no prediction or a rating or prediction is not
    /// a class.
    pub fn aggregate_score(
        &self,
        classes: usize,
        actual: &Ratings,
        predictions: &Ratings,
    ) -> Result<Vec<f32>, Error> {
        if actual.is_empty() {
            return Err(Error::NoRatings);
        }

        let mut sum = vec![0.; classes];
        for (&user, ratings) in actual {
            let scores =
                PrecisionAndRecall::of_user(classes, user, ratings, predictions.get(&user))?;
            for (sum, score) in sum.iter_mut().zip(self.select(scores)) {
                *sum += score;
            }
        }
        let users = actual.len() as f32;
        Ok(sum.into_iter().map(|sum| sum / users).collect())
    }
}
