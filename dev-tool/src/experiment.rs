use std::path::PathBuf;

use anyhow::{Context, Error};
use itertools::Itertools;
use log::{info, warn};
use online_recommender::{
    eval::{predict_ratings, CategoricalMetric, NumericalMetric},
    hypothesis::HypothesisKind,
    learner::{Learner, OnlineRecommenderLearner},
    model::FeatureVectorModel,
    Config,
    CutsPolicy,
    ItemId,
    Lambdas,
    OnlineFactorizationRecommender,
    RatingPredictionStrategy,
    Ratings,
    SideInfoSetup,
    UserId,
};
use rand::{rngs::StdRng, SeedableRng};
use structopt::StructOpt;

use crate::{
    data::{
        load_observations,
        load_side_info,
        ratings_by_user,
        separator_byte,
        Observation,
    },
    exit_code::{NON_FATAL_ERROR, NO_ERROR},
    utils::{file_spinner, iteration_progress},
};

/// Trains a recommender on a ratings file and evaluates it on another one.
#[derive(StructOpt, Debug)]
pub struct ExperimentCmd {
    /// Ratings to train on, one `user<sep>item<sep>rating` per line.
    #[structopt(long)]
    train: PathBuf,

    /// Ratings to evaluate on, in the same format as the training ratings.
    #[structopt(long)]
    test: PathBuf,

    /// Separates the fields of a line.
    #[structopt(long, default_value = ",")]
    separator: String,

    /// Is added to every rating, e.g. `-1` maps star ratings `1..=5` to the classes `0..=4`.
    #[structopt(long, default_value = "0", allow_hyphen_values = true)]
    rating_offset: f32,

    /// The number of classes: 1 for numerical, 2 for binary and more for multinomial or
    /// ordinal ratings.
    #[structopt(short, long, default_value = "1")]
    classes: usize,

    /// Treats the classes as ordered.
    #[structopt(short, long)]
    ordinal: bool,

    /// Overrides the hypothesis inferred from the classes, e.g. `poisson` for counts.
    #[structopt(long)]
    hypothesis: Option<HypothesisKind>,

    /// Learns the user and item side information as well.
    #[structopt(short, long)]
    side_info: bool,

    /// Side information of the users, one `id<sep>index:value index:value ...` per line.
    #[structopt(long)]
    user_side_info: Option<PathBuf>,

    /// Side information of the items, in the same format as for the users.
    #[structopt(long)]
    item_side_info: Option<PathBuf>,

    /// The number of passes over the training ratings.
    #[structopt(short, long, default_value = "50")]
    iterations: usize,

    #[structopt(long, default_value = "150")]
    factor_size: usize,

    #[structopt(long, default_value = "0.005")]
    learning_rate: f32,

    /// Regularization rate of the user and item biases.
    #[structopt(long, default_value = "0.005")]
    bias_lambda: f32,

    /// Regularization rate of the latent factors.
    #[structopt(long, default_value = "0.025")]
    factors_lambda: f32,

    #[structopt(long, default_value = "0")]
    user_side_lambda: f32,

    #[structopt(long, default_value = "0")]
    item_side_lambda: f32,

    #[structopt(long, default_value = "0")]
    dynamic_side_lambda: f32,

    /// Regularization rate of the ordinal cuts.
    #[structopt(long, default_value = "0")]
    cuts_lambda: f32,

    /// Lets the increments of the ordinal cuts become negative.
    #[structopt(long)]
    unclamped_cuts: bool,

    /// Evaluates the numerical ratings with the mean absolute error instead of the root mean
    /// squared error.
    #[structopt(long)]
    mae: bool,

    /// Prints the score after every iteration.
    #[structopt(long)]
    see_convergence: bool,

    /// Seeds the initialization of the factors.
    #[structopt(long)]
    seed: Option<u64>,
}

impl ExperimentCmd {
    pub fn run(self) -> Result<i32, Error> {
        let config = self.config()?;
        let separator = separator_byte(&self.separator)?;
        let rng = self
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let mut learner =
            Learner::from_config(&config, rng).context("Creating the learner failed.")?;

        if config.side_info() {
            self.load_side_info(learner.model_mut(), separator)?;
        }

        let loading = file_spinner("Loading ratings");
        let train = load_observations(&self.train, separator, self.rating_offset)?;
        let test = ratings_by_user(&load_observations(
            &self.test,
            separator,
            self.rating_offset,
        )?);
        loading.finish_and_clear();
        info!(
            "loaded {} training ratings and test ratings of {} users",
            train.len(),
            test.len(),
        );

        let numerical = config.classes() <= 1;
        let strategy = if numerical {
            RatingPredictionStrategy::ScoreOnTargetClass
        } else {
            RatingPredictionStrategy::MostProbableClass
        };
        let mut experiment = Experiment {
            recommender: OnlineFactorizationRecommender::new(learner).with_strategy(strategy),
            classes: config.classes(),
            numerical_metric: if self.mae {
                NumericalMetric::Mae
            } else {
                NumericalMetric::Rmse
            },
            skipped: 0,
        };

        let progress = iteration_progress(self.iterations);
        progress.set_message("Training");
        for iteration in 1..=self.iterations {
            experiment.train(&train);
            progress.inc(1);
            info!("iteration {} done", iteration);
            if self.see_convergence {
                let score = experiment.score(&test)?;
                progress.println(format!("Current score: {}", score));
            }
        }
        progress.finish();

        let score = experiment.score(&test)?;
        println!("Final cuts: [{}]", experiment.cuts().iter().join(", "));
        println!("Score\n{}", score);

        Ok(if experiment.skipped > 0 {
            NON_FATAL_ERROR
        } else {
            NO_ERROR
        })
    }

    fn config(&self) -> Result<Config, Error> {
        let hypothesis = self
            .hypothesis
            .unwrap_or_else(|| HypothesisKind::infer(self.classes, self.ordinal));
        let lambdas = Lambdas {
            bias: self.bias_lambda,
            factors: self.factors_lambda,
            user_side: self.user_side_lambda,
            item_side: self.item_side_lambda,
            dynamic_side: self.dynamic_side_lambda,
            cuts: self.cuts_lambda,
        };
        let cuts_policy = if self.unclamped_cuts {
            CutsPolicy::Unclamped
        } else {
            CutsPolicy::ClampIncrements
        };

        Ok(Config::default()
            .with_hypothesis(hypothesis, self.classes)?
            .with_factor_size(self.factor_size)?
            .with_learning_rate(self.learning_rate)?
            .with_lambdas(lambdas)?
            .with_side_info(self.side_info)
            .with_cuts_policy(cuts_policy))
    }

    fn load_side_info<M>(&self, model: &mut M, separator: u8) -> Result<(), Error>
    where
        M: FeatureVectorModel,
    {
        let mut setup = SideInfoSetup::new(model);
        if let Some(path) = &self.user_side_info {
            info!("loading user side information from {}", path.display());
            let xs = load_side_info(path, separator)?;
            let set = setup.set_xs(xs.into_iter().map(|(id, x)| (UserId(id), x)));
            info!("set the side information of {} users", set);
        }
        if let Some(path) = &self.item_side_info {
            info!("loading item side information from {}", path.display());
            let ts = load_side_info(path, separator)?;
            let set = setup.set_ts(ts.into_iter().map(|(id, t)| (ItemId(id), t)));
            info!("set the side information of {} items", set);
        }
        Ok(())
    }
}

struct Experiment {
    recommender: OnlineFactorizationRecommender<Learner>,
    classes: usize,
    numerical_metric: NumericalMetric,
    skipped: usize,
}

impl Experiment {
    /// Trains one pass over the observations, rejected observations are skipped.
    fn train(&mut self, observations: &[Observation]) {
        for observation in observations {
            let Observation { user, item, rating } = *observation;
            if let Err(error) = self.recommender.set_preference(user, item, rating) {
                warn!(
                    "skipping rating {} of user {} for item {}: {}",
                    rating, user, item, error,
                );
                self.skipped += 1;
            }
        }
    }

    fn score(&mut self, test: &Ratings) -> Result<Score, Error> {
        let predictions = predict_ratings(&mut self.recommender, test)
            .context("Predicting the test ratings failed.")?;

        let score = if self.classes <= 1 {
            Score::Numerical {
                metric: self.numerical_metric,
                score: self
                    .numerical_metric
                    .aggregate_score(test, &predictions)?,
            }
        } else {
            Score::Categorical {
                precision: CategoricalMetric::Precision.aggregate_score(
                    self.classes,
                    test,
                    &predictions,
                )?,
                recall: CategoricalMetric::Recall.aggregate_score(
                    self.classes,
                    test,
                    &predictions,
                )?,
            }
        };
        Ok(score)
    }

    fn cuts(&self) -> Vec<f32> {
        self.recommender.learner().model().cuts()
    }
}

/// The evaluation of the test ratings.
#[derive(Debug, PartialEq)]
enum Score {
    Numerical {
        metric: NumericalMetric,
        score: f32,
    },
    Categorical {
        precision: Vec<f32>,
        recall: Vec<f32>,
    },
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Score::Numerical { metric, score } => write!(f, "{:?}: {}", metric, score),
            Score::Categorical { precision, recall } => {
                writeln!(f, "class\tprecision\trecall")?;
                for (class, (precision, recall)) in precision.iter().zip(recall).enumerate() {
                    writeln!(f, "{}\t{}\t{}", class, precision, recall)?;
                }
                Ok(())
            }
        }
    }
}
